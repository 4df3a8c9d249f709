//! A small hierarchical-animation demo: a spinning assembly of basic
//! shapes driven by a matrix-stack scene traversal.
//!
//! The crate keeps the animation core — transform stack, clock, scene
//! tree and camera — free of any GPU types, so the whole per-frame
//! pipeline can be exercised headless; the wgpu renderer only consumes
//! the draw lists the traversal produces.

pub mod app;
pub mod camera;
pub mod clock;
pub mod geometry;
pub mod model;
pub mod render;
pub mod scene;
pub mod transform;

pub use app::Demo;
pub use camera::OrbitCamera;
pub use clock::{AnimationClock, ClockSample};
pub use geometry::MeshData;
pub use model::{demo_library, DemoModels, Model, ModelId, ModelLibrary};
pub use render::{LightRig, LightSlot, MaterialConstants, RenderInitError, Renderer};
pub use scene::{demo_scene, traverse, DrawCall, Drawable, LocalTransform, SceneNode};
pub use transform::MatrixStack;
