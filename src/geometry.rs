use std::f32::consts::PI;

/// Triangle-list mesh with flat position/normal buffers, the layout the
/// renderer uploads verbatim.  Counter-clockwise winding, unit normals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    fn vertex(&mut self, position: [f32; 3], normal: [f32; 3]) -> u32 {
        let index = self.vertex_count() as u32;
        self.positions.extend_from_slice(&position);
        self.normals.extend_from_slice(&normal);
        index
    }

    fn quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.indices.extend_from_slice(&[a, b, c, a, c, d]);
    }
}

/// Axis-aligned cube of the given side length, centered at the origin.
pub fn cube(side: f32) -> MeshData {
    let h = side / 2.0;
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        // (normal, tangent u, tangent v) per face
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];

    let mut mesh = MeshData::default();
    for (normal, u, v) in faces {
        let center = [normal[0] * h, normal[1] * h, normal[2] * h];
        let corner = |su: f32, sv: f32| {
            [
                center[0] + u[0] * h * su + v[0] * h * sv,
                center[1] + u[1] * h * su + v[1] * h * sv,
                center[2] + u[2] * h * su + v[2] * h * sv,
            ]
        };
        let a = mesh.vertex(corner(-1.0, -1.0), normal);
        let b = mesh.vertex(corner(1.0, -1.0), normal);
        let c = mesh.vertex(corner(1.0, 1.0), normal);
        let d = mesh.vertex(corner(-1.0, 1.0), normal);
        mesh.quad(a, b, c, d);
    }
    mesh
}

/// Latitude/longitude sphere centered at the origin.
pub fn uv_sphere(radius: f32, slices: u32, stacks: u32) -> MeshData {
    let mut mesh = MeshData::default();
    for stack in 0..=stacks {
        let phi = PI * stack as f32 / stacks as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for slice in 0..=slices {
            let theta = 2.0 * PI * slice as f32 / slices as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let normal = [sin_phi * cos_theta, sin_phi * sin_theta, cos_phi];
            let position = [normal[0] * radius, normal[1] * radius, normal[2] * radius];
            mesh.vertex(position, normal);
        }
    }
    let row = slices + 1;
    for stack in 0..stacks {
        for slice in 0..slices {
            let a = stack * row + slice;
            let b = a + row;
            mesh.quad(a, b, b + 1, a + 1);
        }
    }
    mesh
}

/// Torus in the xy plane.  `inner` and `outer` are the hole and overall
/// radii, not the center/tube pair.
pub fn uv_torus(inner: f32, outer: f32, slices: u32, stacks: u32) -> MeshData {
    let center_radius = (inner + outer) / 2.0;
    let tube_radius = (outer - inner) / 2.0;

    let mut mesh = MeshData::default();
    for stack in 0..=stacks {
        let v = 2.0 * PI * stack as f32 / stacks as f32;
        let (sin_v, cos_v) = v.sin_cos();
        for slice in 0..=slices {
            let u = 2.0 * PI * slice as f32 / slices as f32;
            let (sin_u, cos_u) = u.sin_cos();
            let ring = center_radius + tube_radius * cos_v;
            let position = [ring * cos_u, ring * sin_u, tube_radius * sin_v];
            let normal = [cos_v * cos_u, cos_v * sin_u, sin_v];
            mesh.vertex(position, normal);
        }
    }
    let row = slices + 1;
    for stack in 0..stacks {
        for slice in 0..slices {
            let a = stack * row + slice;
            let b = a + row;
            mesh.quad(a, a + 1, b + 1, b);
        }
    }
    mesh
}

/// Capped cylinder along the z axis, centered at the origin.
pub fn uv_cylinder(radius: f32, height: f32, slices: u32) -> MeshData {
    let h = height / 2.0;
    let mut mesh = MeshData::default();

    // Side wall
    for slice in 0..=slices {
        let theta = 2.0 * PI * slice as f32 / slices as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let normal = [cos_theta, sin_theta, 0.0];
        mesh.vertex([radius * cos_theta, radius * sin_theta, -h], normal);
        mesh.vertex([radius * cos_theta, radius * sin_theta, h], normal);
    }
    for slice in 0..slices {
        let a = slice * 2;
        mesh.quad(a, a + 2, a + 3, a + 1);
    }

    // Caps
    for &(z, nz) in &[(h, 1.0f32), (-h, -1.0f32)] {
        let center = mesh.vertex([0.0, 0.0, z], [0.0, 0.0, nz]);
        let first_rim = mesh.vertex_count() as u32;
        for slice in 0..=slices {
            let theta = 2.0 * PI * slice as f32 / slices as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            mesh.vertex([radius * cos_theta, radius * sin_theta, z], [0.0, 0.0, nz]);
        }
        for slice in 0..slices {
            let a = first_rim + slice;
            if nz > 0.0 {
                mesh.indices.extend_from_slice(&[center, a, a + 1]);
            } else {
                mesh.indices.extend_from_slice(&[center, a + 1, a]);
            }
        }
    }
    mesh
}

/// Cone along the z axis: base at `-height/2`, apex at `+height/2`.
pub fn uv_cone(radius: f32, height: f32, slices: u32) -> MeshData {
    let h = height / 2.0;
    let mut mesh = MeshData::default();

    // Slanted wall; normals tilt by the slope of the side.
    let slope = radius / height;
    let normal_scale = 1.0 / (1.0 + slope * slope).sqrt();
    for slice in 0..=slices {
        let theta = 2.0 * PI * slice as f32 / slices as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let normal = [
            cos_theta * normal_scale,
            sin_theta * normal_scale,
            slope * normal_scale,
        ];
        mesh.vertex([radius * cos_theta, radius * sin_theta, -h], normal);
        mesh.vertex([0.0, 0.0, h], normal);
    }
    for slice in 0..slices {
        let a = slice * 2;
        mesh.indices.extend_from_slice(&[a, a + 2, a + 1]);
    }

    // Base cap facing -z
    let center = mesh.vertex([0.0, 0.0, -h], [0.0, 0.0, -1.0]);
    let first_rim = mesh.vertex_count() as u32;
    for slice in 0..=slices {
        let theta = 2.0 * PI * slice as f32 / slices as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();
        mesh.vertex(
            [radius * cos_theta, radius * sin_theta, -h],
            [0.0, 0.0, -1.0],
        );
    }
    for slice in 0..slices {
        let a = first_rim + slice;
        mesh.indices.extend_from_slice(&[center, a + 1, a]);
    }
    mesh
}

/// Flat ring (washer) in the xy plane, facing +z.
pub fn annulus(inner: f32, outer: f32, slices: u32) -> MeshData {
    let mut mesh = MeshData::default();
    for slice in 0..=slices {
        let theta = 2.0 * PI * slice as f32 / slices as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();
        mesh.vertex([inner * cos_theta, inner * sin_theta, 0.0], [0.0, 0.0, 1.0]);
        mesh.vertex([outer * cos_theta, outer * sin_theta, 0.0], [0.0, 0.0, 1.0]);
    }
    for slice in 0..slices {
        let a = slice * 2;
        mesh.quad(a, a + 1, a + 3, a + 2);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(mesh: &MeshData) {
        assert_eq!(mesh.positions.len(), mesh.normals.len());
        assert_eq!(mesh.indices.len() % 3, 0, "triangle list");
        let vertices = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < vertices));
        for normal in mesh.normals.chunks_exact(3) {
            let len = (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-4, "normal length {len}");
        }
    }

    #[test]
    fn cube_has_24_vertices_and_12_triangles() {
        let mesh = cube(1.0);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert_well_formed(&mesh);
    }

    #[test]
    fn sphere_vertices_sit_on_the_radius() {
        let mesh = uv_sphere(2.0, 16, 8);
        assert_well_formed(&mesh);
        for position in mesh.positions.chunks_exact(3) {
            let r = (position[0] * position[0]
                + position[1] * position[1]
                + position[2] * position[2])
                .sqrt();
            assert!((r - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn torus_cylinder_cone_and_annulus_are_well_formed() {
        assert_well_formed(&uv_torus(0.5, 1.0, 16, 8));
        assert_well_formed(&uv_cylinder(0.5, 1.0, 32));
        assert_well_formed(&uv_cone(0.5, 1.0, 32));
        assert_well_formed(&annulus(3.3, 4.8, 40));
    }

    #[test]
    fn torus_radii_match_the_hole_and_overall_radius() {
        let mesh = uv_torus(0.5, 1.0, 32, 16);
        let mut min = f32::MAX;
        let mut max: f32 = 0.0;
        for position in mesh.positions.chunks_exact(3) {
            let r = (position[0] * position[0] + position[1] * position[1]).sqrt();
            // Only rim points in the torus midplane reach the extremes.
            if position[2].abs() < 1e-4 {
                min = min.min(r);
                max = max.max(r);
            }
        }
        assert!((min - 0.5).abs() < 1e-3);
        assert!((max - 1.0).abs() < 1e-3);
    }
}
