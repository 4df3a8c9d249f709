use glam::Vec3;

use crate::geometry::{self, MeshData};

/// Opaque handle to a model registered in a [`ModelLibrary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(usize);

impl ModelId {
    /// Position of the model in library registration order; mesh buffer
    /// tables on the GPU side are indexed the same way.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Renderable model: immutable geometry plus an optional pivot offset.
///
/// The offset re-centers primitives whose local origin is not their pivot
/// (cone, cylinder, disk); the traversal folds it into each emitted draw
/// transform without disturbing the caller's working matrix.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: &'static str,
    pub mesh: MeshData,
    pub pivot_offset: Option<Vec3>,
}

/// All models are created once at startup and immutable afterwards.
#[derive(Debug, Default)]
pub struct ModelLibrary {
    models: Vec<Model>,
}

impl ModelLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &'static str, mesh: MeshData) -> ModelId {
        self.add_with_offset(name, mesh, None)
    }

    pub fn add_with_offset(
        &mut self,
        name: &'static str,
        mesh: MeshData,
        pivot_offset: Option<Vec3>,
    ) -> ModelId {
        let id = ModelId(self.models.len());
        self.models.push(Model {
            name,
            mesh,
            pivot_offset,
        });
        id
    }

    pub fn get(&self, id: ModelId) -> &Model {
        &self.models[id.0]
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelId, &Model)> {
        self.models
            .iter()
            .enumerate()
            .map(|(index, model)| (ModelId(index), model))
    }
}

/// The fixed set of basic models the demo scene draws from.
#[derive(Debug, Clone, Copy)]
pub struct DemoModels {
    pub torus: ModelId,
    pub sphere: ModelId,
    pub cone: ModelId,
    pub cylinder: ModelId,
    pub disk: ModelId,
    pub ring: ModelId,
    pub cube: ModelId,
}

/// Builds the library used by the demo scene.
pub fn demo_library() -> (ModelLibrary, DemoModels) {
    let mut library = ModelLibrary::new();
    let models = DemoModels {
        torus: library.add("torus", geometry::uv_torus(0.5, 1.0, 16, 8)),
        sphere: library.add("sphere", geometry::uv_sphere(1.0, 32, 16)),
        cone: library.add_with_offset(
            "cone",
            geometry::uv_cone(0.5, 1.0, 32),
            Some(Vec3::new(0.0, 0.0, 0.5)),
        ),
        cylinder: library.add_with_offset(
            "cylinder",
            geometry::uv_cylinder(0.5, 1.0, 32),
            Some(Vec3::new(0.0, 0.0, 1.5)),
        ),
        disk: library.add_with_offset(
            "disk",
            geometry::uv_cylinder(5.5, 0.5, 64),
            Some(Vec3::new(0.0, 0.0, 0.25)),
        ),
        ring: library.add("ring", geometry::annulus(3.3, 4.8, 40)),
        cube: library.add("cube", geometry::cube(1.0)),
    };
    (library, models)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_library_registers_seven_models() {
        let (library, models) = demo_library();
        assert_eq!(library.len(), 7);
        assert_eq!(library.get(models.cube).name, "cube");
        assert_eq!(library.get(models.torus).pivot_offset, None);
        assert_eq!(
            library.get(models.cylinder).pivot_offset,
            Some(Vec3::new(0.0, 0.0, 1.5))
        );
    }

    #[test]
    fn ids_resolve_to_distinct_models() {
        let (library, _) = demo_library();
        let names: Vec<_> = library.iter().map(|(_, model)| model.name).collect();
        assert_eq!(
            names,
            ["torus", "sphere", "cone", "cylinder", "disk", "ring", "cube"]
        );
    }
}
