//! WebGPU render pipeline setup
//!
//! One lit, fogged, depth-tested triangle pipeline. Scene geometry only
//! changes when a model finishes loading or the level switches, so the
//! vertex buffer is cached against (level, object count); per-frame
//! constants live in a single uniform block.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::camera::Camera;
use super::shapes::level_mesh;
use super::vertex::Vertex;
use crate::sim::level::{Color, Level, LevelId};

/// Point lights the shader evaluates
pub const MAX_POINT_LIGHTS: usize = 4;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub(crate) struct LightData {
    /// xyz position, w intensity
    position: [f32; 4],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Globals {
    view_proj: [[f32; 4]; 4], // offset 0
    eye: [f32; 4],            // offset 64
    ambient: [f32; 4],        // offset 80
    sky: [f32; 4],            // offset 96
    ground: [f32; 4],         // offset 112
    fog_color: [f32; 4],      // offset 128
    /// near, far, enabled, point light count
    fog_params: [f32; 4],     // offset 144
    lights: [LightData; MAX_POINT_LIGHTS], // offset 160
}

/// Scene colors are authored in sRGB; the surface expects linear values
pub(crate) fn linear(color: Color, intensity: f32) -> [f32; 4] {
    let [r, g, b] = color.to_rgb().map(|c| c.powf(2.2) * intensity);
    [r, g, b, 1.0]
}

/// Pack a level's lights, fog and camera into the uniform block
pub(crate) fn scene_globals(level: &Level, camera: &Camera) -> Globals {
    let lights = &level.lights;

    let ambient = lights
        .ambient
        .iter()
        .map(|a| linear(a.color, a.intensity))
        .fold([0.0f32; 4], |acc, c| {
            [acc[0] + c[0], acc[1] + c[1], acc[2] + c[2], 1.0]
        });

    let (sky, ground) = match lights.hemisphere.first() {
        Some(h) => (linear(h.sky, h.intensity), linear(h.ground, h.intensity)),
        None => ([0.0; 4], [0.0; 4]),
    };
    if lights.hemisphere.len() > 1 {
        log::debug!("Only the first hemisphere light is drawn");
    }

    let (fog_color, fog_params) = match lights.fog {
        Some(fog) => (linear(fog.color, 1.0), [fog.near, fog.far, 1.0, 0.0]),
        None => ([0.0; 4], [0.0, 0.0, 0.0, 0.0]),
    };

    let mut packed = [LightData::default(); MAX_POINT_LIGHTS];
    let count = lights.points.len().min(MAX_POINT_LIGHTS);
    for (slot, light) in packed.iter_mut().zip(&lights.points) {
        let p = light.position;
        *slot = LightData {
            position: [p.x, p.y, p.z, light.intensity],
            color: linear(light.color, 1.0),
        };
    }

    let eye = level.player.position;
    Globals {
        view_proj: camera.view_proj(&level.player).to_cols_array_2d(),
        eye: [eye.x, eye.y, eye.z, 1.0],
        ambient,
        sky,
        ground,
        fog_color,
        fog_params: [fog_params[0], fog_params[1], fog_params[2], count as f32],
        lights: packed,
    }
}

/// Uploaded scene triangles and what they were built from
struct SceneBuffer {
    level: LevelId,
    objects: usize,
    buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
}

impl SceneBuffer {
    fn matches(&self, level: &Level) -> bool {
        self.level == level.id && self.objects == level.objects.len()
    }
}

/// Main render state
pub struct RenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,
    pub camera: Camera,

    globals_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    scene: Option<SceneBuffer>,

    /// Viewport size in pixels
    pub size: (u32, u32),
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
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

impl RenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Result<Self, wgpu::RequestDeviceError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("plummet-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
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

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let depth_view = create_depth_view(&device, width, height);

        let mut camera = Camera::default();
        camera.set_viewport(width, height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            camera,
            globals_buffer,
            bind_group,
            depth_view,
            scene: None,
            size: (width, height),
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, new_width, new_height);
            self.camera.set_viewport(new_width, new_height);
        }
    }

    fn upload_scene(&self, level: &Level) -> SceneBuffer {
        let vertices = level_mesh(level);
        log::debug!(
            "{}: uploading {} vertices for {} objects",
            level.id.as_str(),
            vertices.len(),
            level.objects.len()
        );
        let buffer = (!vertices.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("scene_vertices"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });
        SceneBuffer {
            level: level.id,
            objects: level.objects.len(),
            buffer,
            vertex_count: vertices.len() as u32,
        }
    }

    /// Draw a level from its player's eye
    pub fn render(&mut self, level: &Level) -> Result<(), wgpu::SurfaceError> {
        let globals = scene_globals(level, &self.camera);
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        // Objects are only ever appended, so the count identifies the contents
        if !self.scene.as_ref().is_some_and(|scene| scene.matches(level)) {
            self.scene = Some(self.upload_scene(level));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        // Fog color doubles as the sky
        let [r, g, b, _] = globals.fog_color;
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
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
                multiview_mask: None,
            });

            if let Some(SceneBuffer {
                buffer: Some(buffer),
                vertex_count,
                ..
            }) = &self.scene
            {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, &self.bind_group, &[]);
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                render_pass.draw(0..*vertex_count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
