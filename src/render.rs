use std::sync::Arc;

use bytemuck::{bytes_of, Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3, Vec4};
use log::warn;
use thiserror::Error;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::geometry::MeshData;
use crate::model::ModelLibrary;
use crate::scene::DrawCall;

pub const MAX_LIGHTS: usize = 4;

/// GPU bring-up failures.  The binary treats these like window-creation
/// failures and falls back to the headless summary mode.
#[derive(Debug, Error)]
pub enum RenderInitError {
    #[error("window has zero area")]
    ZeroArea,
    #[error("failed to create rendering surface")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// One shader light slot.  A position with `w == 0` is directional; light
/// positions are expressed in eye space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSlot {
    pub enabled: bool,
    pub position: Vec4,
    pub color: Vec3,
}

impl Default for LightSlot {
    fn default() -> Self {
        Self {
            enabled: false,
            position: Vec4::new(0.0, 0.0, 1.0, 0.0),
            color: Vec3::ONE,
        }
    }
}

/// The four light slots uploaded with the frame globals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRig {
    slots: [LightSlot; MAX_LIGHTS],
}

impl Default for LightRig {
    /// Blue down the z axis, white down x, yellow down y, fourth slot
    /// dark.
    fn default() -> Self {
        let mut rig = Self {
            slots: [LightSlot::default(); MAX_LIGHTS],
        };
        rig.slots[0] = LightSlot {
            enabled: true,
            position: Vec4::new(0.0, 0.0, 1.0, 0.0),
            color: Vec3::new(0.0, 0.0, 1.0),
        };
        rig.slots[1] = LightSlot {
            enabled: true,
            position: Vec4::new(1.0, 0.0, 0.0, 0.0),
            color: Vec3::new(1.0, 1.0, 1.0),
        };
        rig.slots[2] = LightSlot {
            enabled: true,
            position: Vec4::new(0.0, 1.0, 0.0, 0.0),
            color: Vec3::new(1.0, 1.0, 0.0),
        };
        rig
    }
}

impl LightRig {
    /// Replaces one slot.  An out-of-range index is a programming error.
    pub fn set_slot(&mut self, index: usize, slot: LightSlot) {
        assert!(index < MAX_LIGHTS, "light slot {index} out of range");
        self.slots[index] = slot;
    }

    pub fn slots(&self) -> &[LightSlot; MAX_LIGHTS] {
        &self.slots
    }
}

/// Material constants that rarely change; the diffuse color arrives with
/// each draw call instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialConstants {
    pub specular: Vec3,
    pub specular_exponent: f32,
    pub emissive: Vec3,
}

impl Default for MaterialConstants {
    fn default() -> Self {
        Self {
            specular: Vec3::splat(0.1),
            specular_exponent: 16.0,
            emissive: Vec3::ZERO,
        }
    }
}

/// GPU renderer backed by wgpu that draws the traversal's draw list.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    depth: DepthBuffer,
    pipeline: wgpu::RenderPipeline,
    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    meshes: Vec<MeshBuffers>,
}

impl Renderer {
    /// Initializes the GPU renderer for the window and uploads every mesh
    /// in the library once; the buffers are immutable afterwards.
    pub async fn new(window: Arc<Window>, library: &ModelLibrary) -> Result<Self, RenderInitError> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(RenderInitError::ZeroArea);
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("renderer-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, config.width, config.height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("renderer-shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("global-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(
                        std::num::NonZeroU64::new(std::mem::size_of::<GlobalUniform>() as u64)
                            .unwrap(),
                    ),
                },
                count: None,
            }],
        });

        // Per-draw uniform layout
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(
                        std::num::NonZeroU64::new(std::mem::size_of::<ObjectConstants>() as u64)
                            .unwrap(),
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("renderer-pipeline-layout"),
            bind_group_layouts: &[&global_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let global_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("global-uniform"),
            size: std::mem::size_of::<GlobalUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("global-bind-group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("renderer-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: (6 * std::mem::size_of::<f32>()) as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        },
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: (3 * std::mem::size_of::<f32>()) as u64,
                            shader_location: 1,
                        },
                    ],
                }],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                // Several demo models are seen from both sides (flat
                // rings, flipped tori), so no back-face culling.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        let meshes = library
            .iter()
            .map(|(_, model)| MeshBuffers::from_mesh(&device, &model.mesh, model.name))
            .collect();

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            depth,
            pipeline,
            global_buffer,
            global_bind_group,
            object_layout,
            meshes,
        })
    }

    /// Returns the identifier of the window owned by the renderer.
    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    /// Exposes the inner window for event handling.
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn aspect(&self) -> f32 {
        if self.size.height == 0 {
            1.0
        } else {
            self.size.width as f32 / self.size.height as f32
        }
    }

    /// Resizes the swap chain to match the new dimensions.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, new_size.width, new_size.height);
    }

    /// Updates the projection, light and material uniforms before drawing.
    pub fn update_globals(
        &self,
        projection: Mat4,
        lights: &LightRig,
        material: &MaterialConstants,
    ) {
        let mut raw_lights = [LightRaw::zeroed(); MAX_LIGHTS];
        for (raw, slot) in raw_lights.iter_mut().zip(lights.slots()) {
            *raw = LightRaw {
                position: slot.position.into(),
                color: slot
                    .color
                    .extend(if slot.enabled { 1.0 } else { 0.0 })
                    .into(),
            };
        }
        let uniform = GlobalUniform {
            projection: projection.to_cols_array_2d(),
            lights: raw_lights,
            specular: material.specular.extend(material.specular_exponent).into(),
            emissive: material.emissive.extend(0.0).into(),
        };
        self.queue
            .write_buffer(&self.global_buffer, 0, bytes_of(&uniform));
    }

    /// Draws the traversal's draw list under the given view matrix.
    /// Draws are strictly sequential; the pass mutates pipeline state.
    pub fn render(&mut self, view: Mat4, draws: &[DrawCall]) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let texture_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("renderer-encoder"),
            });

        let mut bind_groups = Vec::with_capacity(draws.len());
        for draw in draws {
            let modelview = view * draw.transform;
            let constants = ObjectConstants {
                modelview: modelview.to_cols_array_2d(),
                normal: mat3_to_3x4(normal_matrix(modelview)),
                color: draw.color,
            };

            let object_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("object-uniform"),
                    contents: bytes_of(&constants),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
            let object_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("object-bind-group"),
                layout: &self.object_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: object_buffer.as_entire_binding(),
                }],
            });
            bind_groups.push(object_bind_group);
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("main-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &texture_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.224,
                        g: 0.224,
                        b: 0.224,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.global_bind_group, &[]);

        for (draw, bind_group) in draws.iter().zip(bind_groups.iter()) {
            let mesh = &self.meshes[draw.model.index()];
            pass.set_vertex_buffer(0, mesh.vertex.slice(..));
            pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
            pass.set_bind_group(1, bind_group, &[]);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }

        drop(pass);
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// Inverse-transpose of the upper 3x3, for lighting under non-uniform
/// scale.  The demo animates some scales through zero, so a singular
/// modelview falls back to the plain upper 3x3 instead of producing NaNs.
fn normal_matrix(modelview: Mat4) -> Mat3 {
    let upper = Mat3::from_mat4(modelview);
    if upper.determinant().abs() < 1e-8 {
        warn!("singular modelview; skipping normal-matrix inversion");
        return upper;
    }
    upper.inverse().transpose()
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn from_mesh(device: &wgpu::Device, mesh: &MeshData, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&interleave(mesh)),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.index_count(),
        }
    }
}

fn interleave(mesh: &MeshData) -> Vec<f32> {
    let mut data = Vec::with_capacity(mesh.positions.len() * 2);
    for (position, normal) in mesh
        .positions
        .chunks_exact(3)
        .zip(mesh.normals.chunks_exact(3))
    {
        data.extend_from_slice(position);
        data.extend_from_slice(normal);
    }
    data
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct LightRaw {
    position: [f32; 4],
    color: [f32; 4], // w carries the enabled flag
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct GlobalUniform {
    projection: [[f32; 4]; 4],
    lights: [LightRaw; MAX_LIGHTS],
    specular: [f32; 4], // rgb + exponent
    emissive: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ObjectConstants {
    modelview: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
    color: [f32; 4],
}

const SHADER: &str = r#"
struct Light {
    position: vec4<f32>, // w == 0 means directional
    color: vec4<f32>,    // w carries the enabled flag
}

struct GlobalUniform {
    projection: mat4x4<f32>,
    lights: array<Light, 4>,
    specular: vec4<f32>, // rgb + exponent
    emissive: vec4<f32>,
}

struct ObjectConstants {
    modelview: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectConstants;

struct VertexInput {
    @location(0) coords: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) eye_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let eye_position = object.modelview * vec4<f32>(input.coords, 1.0);
    out.position = globals.projection * eye_position;
    out.eye_pos = eye_position.xyz;

    let eye_normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;
    out.normal = eye_normal;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let to_viewer = normalize(-input.eye_pos);
    var normal = normalize(input.normal);
    // Light both sides; the flat rings are seen from behind.
    if (dot(normal, to_viewer) < 0.0) {
        normal = -normal;
    }

    var lit = globals.emissive.rgb;
    for (var i = 0; i < 4; i++) {
        let light = globals.lights[i];
        if (light.color.w == 0.0) {
            continue;
        }
        var to_light: vec3<f32>;
        if (light.position.w == 0.0) {
            to_light = normalize(light.position.xyz);
        } else {
            to_light = normalize(light.position.xyz - input.eye_pos);
        }
        let diffuse = max(dot(normal, to_light), 0.0);
        lit += diffuse * object.color.rgb * light.color.rgb;
        if (diffuse > 0.0) {
            let reflected = reflect(-to_light, normal);
            let highlight = pow(max(dot(reflected, to_viewer), 0.0), globals.specular.w);
            lit += highlight * globals.specular.rgb * light.color.rgb;
        }
    }
    return vec4<f32>(lit, object.color.a);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn default_rig_enables_three_directional_lights() {
        let rig = LightRig::default();
        let enabled: Vec<_> = rig.slots().iter().map(|slot| slot.enabled).collect();
        assert_eq!(enabled, [true, true, true, false]);
        assert_eq!(rig.slots()[0].color, Vec3::new(0.0, 0.0, 1.0));
        // All three are directional.
        assert!(rig.slots().iter().take(3).all(|s| s.position.w == 0.0));
    }

    #[test]
    #[should_panic(expected = "light slot 4 out of range")]
    fn out_of_range_light_slot_panics() {
        let mut rig = LightRig::default();
        rig.set_slot(4, LightSlot::default());
    }

    #[test]
    fn normal_matrix_inverts_nonuniform_scale() {
        let modelview = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let normal = normal_matrix(modelview);
        // A +x normal on a surface stretched along x shrinks in x.
        let transformed = normal * Vec3::X;
        assert!(transformed.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn singular_modelview_falls_back_without_nans() {
        let modelview = Mat4::from_scale(Vec3::new(0.9, 0.9, 0.0));
        let normal = normal_matrix(modelview);
        assert!(normal.to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn uniform_blocks_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<ObjectConstants>() % 16, 0);
        assert_eq!(std::mem::size_of::<LightRaw>(), 32);
    }

    #[test]
    fn interleaving_pairs_positions_with_normals() {
        let mesh = crate::geometry::cube(1.0);
        let data = interleave(&mesh);
        assert_eq!(data.len(), mesh.vertex_count() * 6);
        assert_eq!(&data[0..3], &mesh.positions[0..3]);
        assert_eq!(&data[3..6], &mesh.normals[0..3]);
    }
}
