//! wgpu renderer: surface/device init, depth buffer, one mesh pipeline.
//! wgpu = 26.x, winit = 0.30.x

mod error;
pub mod mesh;

pub use error::{RenderError, RenderResult};
pub use mesh::{GpuMesh, Vertex};

use std::num::NonZeroU64;
use std::sync::Arc;

use asset::{MeshData, ShaderPair};
use bytemuck::{Pod, Zeroable};
use corelib::{Vec3, camera::Camera, transform::Transform, vec3};
use wgpu::{
    Backends, BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindingType, BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState,
    ColorWrites, CommandEncoderDescriptor, DepthBiasState, DepthStencilState, Device,
    DeviceDescriptor, Extent3d, Features, FragmentState, Instance, InstanceDescriptor, Limits,
    LoadOp, Operations, PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor,
    ShaderModule, ShaderModuleDescriptor, ShaderSource, ShaderStages, StoreOp, Surface,
    SurfaceConfiguration, SurfaceError, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages, TextureView, TextureViewDescriptor, VertexState, util::DeviceExt,
};
use winit::{dpi::PhysicalSize, window::Window};

/// Per-frame uniform block (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct FrameUniform {
    proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    /// Light position in world space, w unused.
    light_pos: [f32; 4],
}

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.3,
    b: 0.3,
    a: 1.0,
};

/// The default WGSL sources compiled when no shader files are supplied.
pub fn builtin_shader_pair() -> ShaderPair {
    ShaderPair::new(
        include_str!("shaders/mesh.vert.wgsl"),
        include_str!("shaders/mesh.frag.wgsl"),
    )
}

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipeline & geometry
    pipeline: RenderPipeline,
    mesh: Option<GpuMesh>,

    // Frame uniforms
    frame_bg: BindGroup,
    frame_buf: Buffer,

    // Scene state
    camera: Camera,
    model: Transform,

    // Depth
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window> and compile the pipeline
    /// from the given shader sources.
    pub async fn new(
        window: Arc<Window>,
        backends: Backends,
        shaders: &ShaderPair,
    ) -> RenderResult<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::AdapterNotFound(e.to_string()))?;
        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("objview Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| RenderError::DeviceRequest(e.to_string()))?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);

        // Configure surface
        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        // Depth texture
        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Shaders & pipeline ====
        let (pipeline, frame_bgl) = create_mesh_pipeline(&device, surface_format, shaders)?;

        // ==== Frame uniform buffer/BG ====
        let camera = Camera::new_perspective(
            vec3(0.0, 0.0, 4.0),
            Vec3::ZERO,
            Vec3::Y,
            60f32.to_radians(),
            0.1,
            100.0,
            width as f32 / height as f32,
        );
        let model = Transform::identity();

        let frame_init = frame_uniform(&camera, &model);
        let frame_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame UBO"),
            contents: bytemuck::bytes_of(&frame_init),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let frame_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame BG"),
            layout: &frame_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buf.as_entire_binding(),
            }],
        });

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            pipeline,
            mesh: None,
            frame_bg,
            frame_buf,
            camera,
            model,
            depth_view,
            width,
            height,
        })
    }

    /// Upload mesh data and make it the active draw target.
    pub fn upload_mesh(&mut self, data: &MeshData) -> RenderResult<()> {
        let mesh = GpuMesh::upload(&self.device, data)?;
        self.mesh = Some(mesh);
        Ok(())
    }

    /// Rotate the camera around its target (mouse drag).
    pub fn orbit_camera(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.camera.orbit(yaw_delta, pitch_delta);
    }

    /// Resize: reconfigure surface, recreate depth view, fix camera aspect.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
        self.camera
            .set_aspect(self.width as f32 / self.height as f32);
    }

    /// Render one frame: update uniforms + clear + draw the mesh.
    pub fn render(&mut self) -> Result<(), SurfaceError> {
        let frame_data = frame_uniform(&self.camera, &self.model);
        self.queue
            .write_buffer(&self.frame_buf, 0, bytemuck::bytes_of(&frame_data));

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(CLEAR_COLOR),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(mesh) = &self.mesh {
                rpass.set_pipeline(&self.pipeline);
                rpass.set_bind_group(0, &self.frame_bg, &[]);
                rpass.set_vertex_buffer(0, mesh.vertex_buf.slice(..));
                rpass.set_index_buffer(mesh.index_buf.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}

fn frame_uniform(camera: &Camera, model: &Transform) -> FrameUniform {
    // The camera doubles as the light source, so the lit side always faces
    // the viewer.
    let eye = camera.eye;
    FrameUniform {
        proj: camera.proj().to_cols_array_2d(),
        view: camera.view().to_cols_array_2d(),
        model: model.matrix().to_cols_array_2d(),
        light_pos: [eye.x, eye.y, eye.z, 1.0],
    }
}

/// Build the mesh pipeline targeting the given color format.
///
/// Shader modules are compiled first; a second validation scope covers
/// pipeline creation, where entry-point and interface mismatches (e.g. an
/// empty vertex source) first surface. Either failure is
/// `ShaderCompileFailed`.
fn create_mesh_pipeline(
    device: &Device,
    format: TextureFormat,
    shaders: &ShaderPair,
) -> RenderResult<(RenderPipeline, BindGroupLayout)> {
    let (vs_module, fs_module) = compile_program(device, shaders)?;

    let frame_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("Frame BGL"),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX_FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(std::mem::size_of::<FrameUniform>() as u64),
            },
            count: None,
        }],
    });
    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("Mesh PipelineLayout"),
        bind_group_layouts: &[&frame_bgl],
        push_constant_ranges: &[],
    });

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("Mesh Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: VertexState {
            module: &vs_module,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::LAYOUT],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(FragmentState {
            module: &fs_module,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(RenderError::ShaderCompileFailed(err.to_string()));
    }

    Ok((pipeline, frame_bgl))
}

/// Compile the vertex and fragment modules inside a validation error scope.
/// A bad source fails hard here instead of propagating a null program.
fn compile_program(
    device: &Device,
    shaders: &ShaderPair,
) -> RenderResult<(ShaderModule, ShaderModule)> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let vs_module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("Vertex WGSL"),
        source: ShaderSource::Wgsl(shaders.vertex.as_str().into()),
    });
    let fs_module = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("Fragment WGSL"),
        source: ShaderSource::Wgsl(shaders.fragment.as_str().into()),
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(RenderError::ShaderCompileFailed(err.to_string()));
    }
    Ok((vs_module, fs_module))
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_uniform_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniform>() % 16, 0);
    }

    #[test]
    fn frame_uniform_light_tracks_camera_eye() {
        let camera = Camera::new_perspective(
            vec3(1.0, 2.0, 3.0),
            Vec3::ZERO,
            Vec3::Y,
            60f32.to_radians(),
            0.1,
            100.0,
            1.0,
        );
        let u = frame_uniform(&camera, &Transform::identity());
        assert_eq!(u.light_pos, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(u.model, corelib::Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn builtin_shaders_are_nonempty() {
        let pair = builtin_shader_pair();
        assert!(pair.vertex.contains("vs_main"));
        assert!(pair.fragment.contains("fs_main"));
    }

    /// Headless device for GPU-gated tests. `None` skips the test on
    /// machines without an adapter.
    fn test_device() -> Option<(Device, Queue)> {
        let instance = Instance::new(&InstanceDescriptor::default());
        let adapter =
            pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
                .ok()?;
        pollster::block_on(adapter.request_device(&DeviceDescriptor {
            label: Some("test device"),
            required_features: Features::empty(),
            required_limits: Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
            memory_hints: Default::default(),
            trace: Default::default(),
        }))
        .ok()
    }

    #[test]
    fn garbage_wgsl_is_a_compile_failure() {
        let Some((device, _queue)) = test_device() else {
            return;
        };
        let shaders = ShaderPair::new("this is not wgsl {", "neither is this");
        let err = compile_program(&device, &shaders).expect_err("garbage must not compile");
        assert!(matches!(err, RenderError::ShaderCompileFailed(_)));
    }

    #[test]
    fn empty_vertex_source_is_a_compile_failure_not_a_crash() {
        let Some((device, _queue)) = test_device() else {
            return;
        };
        // An empty module parses cleanly; the failure only appears when the
        // pipeline asks for the missing vs_main entry point.
        let shaders = ShaderPair::new("", builtin_shader_pair().fragment);
        let err = create_mesh_pipeline(&device, TextureFormat::Rgba8UnormSrgb, &shaders)
            .expect_err("missing entry point must fail");
        assert!(matches!(err, RenderError::ShaderCompileFailed(_)));
    }

    #[test]
    fn builtin_shaders_build_and_mesh_uploads() {
        let Some((device, _queue)) = test_device() else {
            return;
        };
        let built = create_mesh_pipeline(
            &device,
            TextureFormat::Rgba8UnormSrgb,
            &builtin_shader_pair(),
        );
        assert!(built.is_ok());

        let mesh = GpuMesh::upload(&device, &MeshData::primitive_triangle()).expect("upload");
        assert_eq!(mesh.index_count(), 3);
    }
}
