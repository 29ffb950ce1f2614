//! Rendering system with wgpu pipeline and shader management.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use std::path::Path;
use wgpu::util::DeviceExt;

use crate::error::{Result, VisualizerError};
use crate::scene::{Scene, VisualPrimitive, Vertex};

/// Built-in normal-colored material
const NORMAL_SHADER: &str = include_str!("normal.wgsl");

/// Default shader-material sources, used when no file is given
const DEFAULT_VERTEX_SHADER: &str = include_str!("vertex.wgsl");
const DEFAULT_FRAGMENT_SHADER: &str = include_str!("fragment.wgsl");

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
const DISPLACEMENT_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![2 => Float32];
const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 4] =
    wgpu::vertex_attr_array![3 => Float32x4, 4 => Float32x4, 5 => Float32x4, 6 => Float32x4];

/// Uniform buffer shared by every material.
///
/// `view_proj` and `time` come first so shaders may declare just that prefix;
/// `view` is for view-space shading.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub time: f32,
    pub _padding: [f32; 3], // Padding for alignment
    pub view: [[f32; 4]; 4],
}

impl Uniforms {
    pub fn new(view: Mat4, projection: Mat4, time: f32) -> Self {
        Self {
            view_proj: (projection * view).to_cols_array_2d(),
            time,
            _padding: [0.0; 3],
            view: view.to_cols_array_2d(),
        }
    }
}

/// Per-primitive instance data (model matrix columns)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
}

impl From<&VisualPrimitive> for InstanceRaw {
    fn from(primitive: &VisualPrimitive) -> Self {
        Self {
            model: primitive.model_matrix().to_cols_array_2d(),
        }
    }
}

/// Vertex + fragment WGSL program text for the shader material
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    /// Sources compiled into the binary
    pub fn bundled() -> Self {
        Self {
            vertex: DEFAULT_VERTEX_SHADER.to_string(),
            fragment: DEFAULT_FRAGMENT_SHADER.to_string(),
        }
    }

    /// Read each stage from disk, falling back to the bundled source when no path
    /// is given
    pub fn load(vertex: Option<&Path>, fragment: Option<&Path>) -> Result<Self> {
        let read = |path: Option<&Path>, fallback: &str| -> Result<String> {
            match path {
                Some(path) => {
                    let source = std::fs::read_to_string(path).map_err(|source| {
                        VisualizerError::ShaderLoad {
                            path: path.to_path_buf(),
                            source,
                        }
                    })?;
                    log::info!("Loaded shader {}", path.display());
                    Ok(source)
                }
                None => Ok(fallback.to_string()),
            }
        };

        Ok(Self {
            vertex: read(vertex, DEFAULT_VERTEX_SHADER)?,
            fragment: read(fragment, DEFAULT_FRAGMENT_SHADER)?,
        })
    }
}

/// Which program the pipeline is built from
#[derive(Debug, Clone)]
pub enum PipelineSource {
    /// Built-in normal material
    Normal,
    Shader(ShaderSources),
}

/// Rendering system managing wgpu device, pipeline, and buffers
pub struct RenderSystem {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    instance_buffer: wgpu::Buffer,
    /// One per primitive (all zeros for primitives without displacement)
    displacement_buffers: Vec<wgpu::Buffer>,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
}

impl RenderSystem {
    /// Create new rendering system sized to the window's current inner size
    pub async fn new(
        window: std::sync::Arc<winit::window::Window>,
        scene: &Scene,
        source: &PipelineSource,
    ) -> Result<Self> {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        // Create wgpu instance
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Create surface (window must have 'static lifetime via Arc)
        let surface = instance
            .create_surface(window)
            .map_err(|e| VisualizerError::RenderSetup(format!("Failed to create surface: {}", e)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| {
                VisualizerError::RenderSetup("Failed to find suitable GPU adapter".to_string())
            })?;

        log::info!("GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| VisualizerError::RenderSetup(format!("Failed to request device: {}", e)))?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| {
                VisualizerError::RenderSetup("Surface reports no texture formats".to_string())
            })?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, width, height);

        // Create buffers
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&scene.mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&scene.mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let instances: Vec<InstanceRaw> = scene.primitives.iter().map(InstanceRaw::from).collect();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let zeros = vec![0.0f32; scene.mesh.vertex_count()];
        let displacement_buffers = scene
            .primitives
            .iter()
            .map(|p| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Displacement Buffer"),
                    contents: bytemuck::cast_slice(p.displacement.as_deref().unwrap_or(&zeros)),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                })
            })
            .collect();

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[Uniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, 0.0)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        // Load shaders
        let (modules, blend) = match source {
            PipelineSource::Normal => {
                let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("Normal Material Shader"),
                    source: wgpu::ShaderSource::Wgsl(NORMAL_SHADER.into()),
                });
                (vec![module], wgpu::BlendState::REPLACE)
            }
            PipelineSource::Shader(sources) => {
                let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("Vertex Shader"),
                    source: wgpu::ShaderSource::Wgsl(sources.vertex.as_str().into()),
                });
                let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("Fragment Shader"),
                    source: wgpu::ShaderSource::Wgsl(sources.fragment.as_str().into()),
                });
                // Shader material is transparent
                (vec![vertex, fragment], wgpu::BlendState::ALPHA_BLENDING)
            }
        };
        // Normal material uses one module for both stages
        let vertex_module = &modules[0];
        let fragment_module = modules.last().unwrap_or(vertex_module);

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Primitive Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: vertex_module,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &VERTEX_ATTRIBUTES,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<f32>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &DISPLACEMENT_ATTRIBUTES,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &INSTANCE_ATTRIBUTES,
                    },
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: fragment_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            vertex_buffer,
            index_buffer,
            index_count: scene.mesh.indices.len() as u32,
            instance_buffer,
            displacement_buffers,
            uniform_buffer,
            uniform_bind_group,
            depth_view,
        })
    }

    /// Upload model matrices for every primitive
    pub fn update_instances(&self, primitives: &[VisualPrimitive]) {
        let instances: Vec<InstanceRaw> = primitives.iter().map(InstanceRaw::from).collect();
        self.queue
            .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
    }

    /// Upload displacement buffers of primitives that have one
    pub fn update_displacements(&self, primitives: &[VisualPrimitive]) {
        for (primitive, buffer) in primitives.iter().zip(&self.displacement_buffers) {
            if let Some(displacement) = &primitive.displacement {
                self.queue
                    .write_buffer(buffer, 0, bytemuck::cast_slice(displacement));
            }
        }
    }

    pub fn update_uniforms(&self, uniforms: &Uniforms) {
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[*uniforms]));
    }

    /// Upload primitive state and uniforms, then render
    pub fn draw(
        &self,
        primitives: &[VisualPrimitive],
        view: Mat4,
        projection: Mat4,
        time: f32,
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        self.update_instances(primitives);
        self.update_displacements(primitives);
        self.update_uniforms(&Uniforms::new(view, projection, time));
        self.render()
    }

    /// Render a frame
    pub fn render(&self) -> std::result::Result<(), wgpu::SurfaceError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                // Reconfigure at the startup size and skip this frame
                log::warn!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(2, self.instance_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            // One draw per primitive so each can bind its own displacement buffer
            for (i, displacement) in self.displacement_buffers.iter().enumerate() {
                let instance = i as u32;
                render_pass.set_vertex_buffer(1, displacement.slice(..));
                render_pass.draw_indexed(0..self.index_count, 0, instance..instance + 1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniforms_match_wgsl_layout() {
        // view_proj, time padded to 16 bytes, then view (mat4x4 aligns to 16)
        assert_eq!(std::mem::offset_of!(Uniforms, time), 64);
        assert_eq!(std::mem::offset_of!(Uniforms, view), 80);
        assert_eq!(std::mem::size_of::<Uniforms>(), 144);
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 64);
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
    }

    #[test]
    fn test_uniforms_split_camera_matrices() {
        let view = Mat4::from_translation(glam::Vec3::new(0.0, 0.0, -40.0));
        let projection = Mat4::perspective_rh(45f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0);
        let uniforms = Uniforms::new(view, projection, 2.5);

        assert_eq!(uniforms.view, view.to_cols_array_2d());
        assert_eq!(uniforms.view_proj, (projection * view).to_cols_array_2d());
        assert_eq!(uniforms.time, 2.5);
    }

    #[test]
    fn test_normal_material_shades_in_view_space() {
        assert!(NORMAL_SHADER.contains("view: mat4x4<f32>"));
        assert!(NORMAL_SHADER.contains("uniforms.view * model"));
    }

    #[test]
    fn test_bundled_shaders_declare_entry_points_and_time() {
        let sources = ShaderSources::bundled();
        assert!(sources.vertex.contains("fn vs_main"));
        assert!(sources.fragment.contains("fn fs_main"));
        assert!(sources.vertex.contains("time"));
        assert!(NORMAL_SHADER.contains("fn vs_main") && NORMAL_SHADER.contains("fn fs_main"));
    }

    #[test]
    fn test_missing_shader_file_is_load_error() {
        let err = ShaderSources::load(Some(Path::new("/nonexistent/vertex.wgsl")), None)
            .unwrap_err();
        assert!(matches!(err, VisualizerError::ShaderLoad { .. }));
    }

    #[test]
    fn test_load_without_paths_uses_bundled() {
        let sources = ShaderSources::load(None, None).unwrap();
        assert_eq!(sources.vertex, DEFAULT_VERTEX_SHADER);
        assert_eq!(sources.fragment, DEFAULT_FRAGMENT_SHADER);
    }

    #[test]
    fn test_instance_from_primitive_uses_position() {
        let primitive = VisualPrimitive::new(0, glam::Vec3::new(3.0, 0.0, -2.0));
        let raw = InstanceRaw::from(&primitive);
        assert_eq!(raw.model[3], [3.0, 0.0, -2.0, 1.0]);
    }
}
