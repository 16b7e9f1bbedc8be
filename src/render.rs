use crate::dom::{self, ContainerMap};
use crate::events::pointer::{self, CanvasListeners};
use glam::{Mat3, Mat4};
use panel3d_core::constants::SHADOW_MAP_SIZE;
use panel3d_core::environment::Environment;
use panel3d_core::lighting::GroundPlane;
use panel3d_core::scene::Primitive;
use panel3d_core::stars::StarField;
use panel3d_core::{
    ContainerId, FrameView, Model, RenderError, RenderSurface, SurfaceError, SurfaceFactory,
    ViewerConfig,
};
use std::cell::RefCell;
use std::rc::Rc;
use web_sys as web;

mod background;
mod helpers;
mod mesh;
mod stars;

use background::{create_background_pipeline, BackgroundPipeline, GpuBackground};
use mesh::{
    create_mesh_pipelines, DrawUniforms, GpuPrimitive, Globals, MeshDraw, MeshPipelines,
    ShadowTarget, DRAW_STRIDE,
};
use stars::{create_stars_pipeline, GpuStars, StarsPipeline};

/// Pipelines compiled for one surface format.
pub(crate) struct Pipelines {
    mesh: MeshPipelines,
    stars: StarsPipeline,
    background: BackgroundPipeline,
}

/// Adapter and device shared by every viewer on the page.
pub struct GpuContext {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipelines: RefCell<Vec<(wgpu::TextureFormat, Rc<Pipelines>)>>,
}

impl GpuContext {
    pub async fn new() -> anyhow::Result<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No WebGPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: Some("panel3d_device"),
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!(format!("request_device error: {:?}", e)))?;
        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            pipelines: RefCell::new(Vec::new()),
        })
    }

    fn pipelines_for(&self, format: wgpu::TextureFormat) -> Rc<Pipelines> {
        let mut cache = self.pipelines.borrow_mut();
        if let Some((_, p)) = cache.iter().find(|(f, _)| *f == format) {
            return p.clone();
        }
        let p = Rc::new(Pipelines {
            mesh: create_mesh_pipelines(&self.device, format),
            stars: create_stars_pipeline(&self.device, format),
            background: create_background_pipeline(&self.device, format),
        });
        cache.push((format, p.clone()));
        p
    }
}

/// Builds one canvas and WebGPU surface per container.
pub struct WebSurfaceFactory {
    gpu: Option<Rc<GpuContext>>,
    containers: Rc<RefCell<ContainerMap>>,
}

impl WebSurfaceFactory {
    pub fn new(gpu: Option<Rc<GpuContext>>, containers: Rc<RefCell<ContainerMap>>) -> Self {
        Self { gpu, containers }
    }
}

impl SurfaceFactory for WebSurfaceFactory {
    fn create(
        &mut self,
        container: ContainerId,
        config: &ViewerConfig,
    ) -> Result<Box<dyn RenderSurface>, SurfaceError> {
        let gpu = self
            .gpu
            .clone()
            .ok_or_else(|| SurfaceError::Unavailable("WebGPU is not available".into()))?;
        let element = self
            .containers
            .borrow()
            .element(container)
            .cloned()
            .ok_or_else(|| SurfaceError::Unavailable("container is not on the page".into()))?;
        let document = dom::window_document()
            .ok_or_else(|| SurfaceError::Unavailable("no document".into()))?;
        let canvas = dom::create_canvas(&document, &element)
            .map_err(|e| SurfaceError::Unavailable(e.to_string()))?;
        match ViewerSurface::new(gpu, container, canvas.clone(), element, config) {
            Ok(surface) => Ok(Box::new(surface)),
            Err(e) => {
                canvas.remove();
                Err(SurfaceError::Unavailable(format!("{:#}", e)))
            }
        }
    }
}

/// GPU resources of one viewer. Dropping it removes the canvas.
pub struct ViewerSurface {
    gpu: Rc<GpuContext>,
    pipelines: Rc<Pipelines>,
    canvas: web::HtmlCanvasElement,
    container: web::Element,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    view_format: wgpu::TextureFormat,
    depth: (wgpu::Texture, wgpu::TextureView),
    shadow: ShadowTarget,
    globals: wgpu::Buffer,
    globals_bg: wgpu::BindGroup,
    shadow_globals: wgpu::Buffer,
    shadow_bg: wgpu::BindGroup,
    draws: wgpu::Buffer,
    draws_bg: wgpu::BindGroup,
    draw_capacity: usize,
    meshes: Vec<MeshDraw>,
    ground: Option<(GpuPrimitive, DrawUniforms)>,
    stars: Option<GpuStars>,
    background: Option<GpuBackground>,
    ambient: Option<[[f32; 4]; 6]>,
    _listeners: CanvasListeners,
}

impl ViewerSurface {
    fn new(
        gpu: Rc<GpuContext>,
        container: ContainerId,
        canvas: web::HtmlCanvasElement,
        element: web::Element,
        viewer_config: &ViewerConfig,
    ) -> anyhow::Result<Self> {
        let surface = gpu
            .instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
        let caps = surface.get_capabilities(&gpu.adapter);
        let format = caps
            .formats
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        // WebGPU canvases are typically non-sRGB; render through an sRGB view.
        let view_format = format.add_srgb_suffix();
        let alpha_mode = if caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            caps.alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: canvas.width().max(1),
            height: canvas.height().max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: if view_format != format {
                vec![view_format]
            } else {
                vec![]
            },
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &config);

        let pipelines = gpu.pipelines_for(view_format);
        let device = &gpu.device;
        let depth =
            helpers::create_depth_target(device, "depth", config.width, config.height, false);
        let shadow = ShadowTarget::new(device, viewer_config.shadow_map_enabled(), SHADOW_MAP_SIZE);

        let globals = helpers::uniform_buffer(
            device,
            "mesh_globals",
            std::mem::size_of::<Globals>() as u64,
        );
        let globals_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh_globals_bg"),
            layout: &pipelines.mesh.globals_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&pipelines.mesh.shadow_sampler),
                },
            ],
        });
        let shadow_globals = helpers::uniform_buffer(device, "shadow_globals", 64);
        let shadow_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_globals_bg"),
            layout: &pipelines.mesh.shadow_globals_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: shadow_globals.as_entire_binding(),
            }],
        });
        let (draws, draws_bg) = create_draw_slots(device, &pipelines.mesh, 1);
        let listeners = pointer::attach(&canvas, container)?;

        Ok(Self {
            gpu,
            pipelines,
            canvas,
            container: element,
            surface,
            config,
            view_format,
            depth,
            shadow,
            globals,
            globals_bg,
            shadow_globals,
            shadow_bg,
            draws,
            draws_bg,
            draw_capacity: 1,
            meshes: Vec::new(),
            ground: None,
            stars: None,
            background: None,
            ambient: None,
            _listeners: listeners,
        })
    }

    fn ensure_draw_capacity(&mut self, slots: usize) {
        if slots <= self.draw_capacity {
            return;
        }
        let (buf, bg) = create_draw_slots(&self.gpu.device, &self.pipelines.mesh, slots);
        self.draws = buf;
        self.draws_bg = bg;
        self.draw_capacity = slots;
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.gpu.device, &self.config);
        self.depth = helpers::create_depth_target(
            &self.gpu.device,
            "depth",
            self.config.width,
            self.config.height,
            false,
        );
    }

    fn write_draw_uniforms(&self, model: Option<&Model>) {
        let mut bytes = vec![0u8; self.draw_capacity * DRAW_STRIDE as usize];
        let mut put = |slot: usize, u: &DrawUniforms| {
            let at = slot * DRAW_STRIDE as usize;
            let src = bytemuck::bytes_of(u);
            bytes[at..at + src.len()].copy_from_slice(src);
        };
        if let Some(model) = model {
            let worlds = model.scene.world_matrices();
            for (i, draw) in self.meshes.iter().enumerate() {
                let world = worlds.get(draw.node.0).copied().unwrap_or(Mat4::IDENTITY);
                put(i, &DrawUniforms::mesh(world, draw.primitive.color));
            }
        }
        if let Some((_, u)) = &self.ground {
            put(self.meshes.len(), u);
        }
        self.gpu.queue.write_buffer(&self.draws, 0, &bytes);
    }
}

fn create_draw_slots(
    device: &wgpu::Device,
    pipelines: &MeshPipelines,
    slots: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buf = helpers::uniform_buffer(device, "mesh_draws", slots.max(1) as u64 * DRAW_STRIDE);
    let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("mesh_draws_bg"),
        layout: &pipelines.draw_bgl,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buf,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
            }),
        }],
    });
    (buf, bg)
}

impl RenderSurface for ViewerSurface {
    fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn resize(&mut self) -> (u32, u32) {
        let (w, h) = dom::sync_canvas_backing_size(&self.canvas, &self.container);
        if (w, h) != (self.config.width, self.config.height) {
            self.config.width = w;
            self.config.height = h;
            self.reconfigure();
        }
        (w, h)
    }

    fn prepare_stars(&mut self, stars: &StarField) {
        self.stars = Some(GpuStars::upload(
            &self.gpu.device,
            &self.pipelines.stars,
            stars,
        ));
    }

    fn prepare_model(&mut self, model: &Model, ground: Option<&GroundPlane>) {
        let device = &self.gpu.device;
        let mut meshes = Vec::new();
        for node in model.mesh_nodes() {
            let Some(mesh) = model
                .scene
                .get(node)
                .and_then(|n| n.mesh)
                .and_then(|i| model.meshes.get(i))
            else {
                continue;
            };
            for (i, p) in mesh.primitives.iter().enumerate() {
                let label = format!("{}#{}", mesh.name.as_deref().unwrap_or("mesh"), i);
                if let Some(primitive) = GpuPrimitive::upload(device, &label, p) {
                    meshes.push(MeshDraw { node, primitive });
                }
            }
        }
        self.ground = ground.and_then(|g| {
            let quad = Primitive::quad_xz(g.size, [g.color[0], g.color[1], g.color[2], 1.0]);
            GpuPrimitive::upload(device, "ground", &quad)
                .map(|p| (p, DrawUniforms::ground(g.y, g.color, g.opacity)))
        });
        log::debug!(
            "[panel3d] uploaded {} primitives (ground: {})",
            meshes.len(),
            self.ground.is_some()
        );
        self.meshes = meshes;
        self.ensure_draw_capacity(self.meshes.len() + 1);
    }

    fn prepare_environment(&mut self, environment: &Environment) {
        self.ambient = Some(
            environment
                .ambient
                .faces
                .map(|[r, g, b]| [r, g, b, 0.0]),
        );
        self.background = environment.background.as_ref().map(|img| {
            GpuBackground::upload(
                &self.gpu.device,
                &self.gpu.queue,
                &self.pipelines.background,
                img,
            )
        });
    }

    fn render(&mut self, frame: &FrameView<'_>) -> Result<(), RenderError> {
        let texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.reconfigure();
                return Err(RenderError::Lost);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => return Err(RenderError::Other(e.to_string())),
        };
        let view = texture.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(self.view_format),
            ..Default::default()
        });

        let queue = &self.gpu.queue;
        let shadows_on = frame.lights.shadows && self.shadow.size > 1;
        let globals = Globals::new(
            frame.proj * frame.view,
            frame.eye,
            frame.exposure,
            frame.lights,
            shadows_on,
            self.shadow.size,
            self.ambient.as_ref(),
        );
        queue.write_buffer(&self.globals, 0, bytemuck::bytes_of(&globals));
        queue.write_buffer(
            &self.shadow_globals,
            0,
            bytemuck::bytes_of(&frame.lights.light_view_proj().to_cols_array_2d()),
        );
        let draw_meshes = frame.model.is_some();
        self.write_draw_uniforms(frame.model);
        if let (Some(gpu_stars), Some(field)) = (&self.stars, frame.stars) {
            gpu_stars.write(queue, frame.view, frame.proj, field.matrix());
        }
        if let Some(bg) = &self.background {
            let rotation_only = Mat4::from_mat3(Mat3::from_mat4(frame.view));
            bg.write(queue, frame.proj * rotation_only);
        }

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("viewer_encoder"),
            });
        let mesh = &self.pipelines.mesh;
        let slot = |i: usize| (i as u64 * DRAW_STRIDE) as u32;

        if shadows_on && draw_meshes && !self.meshes.is_empty() {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow_pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&mesh.shadow);
            pass.set_bind_group(0, &self.shadow_bg, &[]);
            for (i, draw) in self.meshes.iter().enumerate() {
                pass.set_bind_group(1, &self.draws_bg, &[slot(i)]);
                draw.primitive.draw(&mut pass, false);
            }
        }

        {
            let c = frame.clear;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("viewer_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        // Premultiplied, to match the canvas alpha mode.
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: (c.rgb[0] * c.alpha) as f64,
                            g: (c.rgb[1] * c.alpha) as f64,
                            b: (c.rgb[2] * c.alpha) as f64,
                            a: c.alpha as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.1,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some(bg) = &self.background {
                bg.draw(&mut pass, &self.pipelines.background);
            }
            if let (Some(stars), Some(_)) = (&self.stars, frame.stars) {
                stars.draw(&mut pass, &self.pipelines.stars);
            }
            if draw_meshes {
                pass.set_pipeline(&mesh.lit);
                pass.set_bind_group(0, &self.globals_bg, &[]);
                for (i, draw) in self.meshes.iter().enumerate() {
                    pass.set_bind_group(1, &self.draws_bg, &[slot(i)]);
                    draw.primitive.draw(&mut pass, true);
                }
            }
            if let (Some((ground, _)), Some(_)) = (&self.ground, frame.ground) {
                pass.set_pipeline(&mesh.ground);
                pass.set_bind_group(0, &self.globals_bg, &[]);
                pass.set_bind_group(1, &self.draws_bg, &[slot(self.meshes.len())]);
                ground.draw(&mut pass, true);
            }
        }

        queue.submit(Some(encoder.finish()));
        texture.present();
        Ok(())
    }
}

impl Drop for ViewerSurface {
    fn drop(&mut self) {
        self.canvas.remove();
    }
}
