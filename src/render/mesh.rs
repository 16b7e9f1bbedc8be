use super::helpers;
use glam::{Mat4, Vec3};
use panel3d_core::lighting::LightRig;
use panel3d_core::scene::{NodeId, Primitive};
use wgpu;
use wgpu::util::DeviceExt;

// Dynamic uniform offsets must be multiples of 256 on every backend.
pub(crate) const DRAW_STRIDE: u64 = 256;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct Globals {
    pub(crate) view_proj: [[f32; 4]; 4],
    pub(crate) light_view_proj: [[f32; 4]; 4],
    pub(crate) eye_exposure: [f32; 4],
    pub(crate) key_dir: [f32; 4],
    pub(crate) key_color: [f32; 4],
    pub(crate) hemi_sky: [f32; 4],
    pub(crate) hemi_ground: [f32; 4],
    pub(crate) ambient: [[f32; 4]; 6],
    pub(crate) params: [f32; 4],
}

impl Globals {
    pub(crate) fn new(
        view_proj: Mat4,
        eye: Vec3,
        exposure: f32,
        lights: &LightRig,
        shadows_on: bool,
        shadow_size: u32,
        ambient: Option<&[[f32; 4]; 6]>,
    ) -> Self {
        let d = lights.key_direction;
        let c = lights.key_color;
        let sky = lights.hemi_sky;
        let ground = lights.hemi_ground;
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            light_view_proj: lights.light_view_proj().to_cols_array_2d(),
            eye_exposure: [eye.x, eye.y, eye.z, exposure],
            key_dir: [d.x, d.y, d.z, lights.key_intensity],
            key_color: [c[0], c[1], c[2], if shadows_on { 1.0 } else { 0.0 }],
            hemi_sky: [sky[0], sky[1], sky[2], lights.hemi_intensity],
            hemi_ground: [ground[0], ground[1], ground[2], lights.shadow_bias],
            ambient: ambient.copied().unwrap_or([[0.0; 4]; 6]),
            params: [
                1.0 / shadow_size.max(1) as f32,
                if ambient.is_some() { 1.0 } else { 0.0 },
                0.0,
                0.0,
            ],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct DrawUniforms {
    pub(crate) model: [[f32; 4]; 4],
    pub(crate) normal: [[f32; 4]; 4],
    pub(crate) color: [f32; 4],
    pub(crate) kind: [f32; 4],
}

impl DrawUniforms {
    pub(crate) fn mesh(model: Mat4, color: [f32; 4]) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: model.inverse().transpose().to_cols_array_2d(),
            color,
            kind: [0.0; 4],
        }
    }

    pub(crate) fn ground(y: f32, color: [f32; 3], opacity: f32) -> Self {
        let model = Mat4::from_translation(Vec3::new(0.0, y, 0.0));
        Self {
            model: model.to_cols_array_2d(),
            normal: Mat4::IDENTITY.to_cols_array_2d(),
            color: [color[0], color[1], color[2], 1.0],
            kind: [1.0, opacity, 0.0, 0.0],
        }
    }
}

pub(crate) struct MeshPipelines {
    pub(crate) globals_bgl: wgpu::BindGroupLayout,
    pub(crate) draw_bgl: wgpu::BindGroupLayout,
    pub(crate) shadow_globals_bgl: wgpu::BindGroupLayout,
    pub(crate) lit: wgpu::RenderPipeline,
    pub(crate) ground: wgpu::RenderPipeline,
    pub(crate) shadow: wgpu::RenderPipeline,
    pub(crate) shadow_sampler: wgpu::Sampler,
}

const POSITION_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 12,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    }],
};

const NORMAL_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 12,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 1,
    }],
};

pub(crate) fn create_mesh_pipelines(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
) -> MeshPipelines {
    let shader = helpers::shader(device, "mesh_shader", panel3d_core::MESH_WGSL);
    let shadow_shader = helpers::shader(device, "shadow_shader", panel3d_core::SHADOW_WGSL);

    let globals_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("mesh_globals_bgl"),
        entries: &[
            helpers::uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                None,
            ),
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Depth,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
    });
    let draw_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("mesh_draw_bgl"),
        entries: &[helpers::uniform_entry(
            0,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            Some(std::mem::size_of::<DrawUniforms>() as u64),
        )],
    });
    let shadow_globals_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("shadow_globals_bgl"),
        entries: &[helpers::uniform_entry(0, wgpu::ShaderStages::VERTEX, None)],
    });

    let lit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("mesh_pl"),
        bind_group_layouts: &[&globals_bgl, &draw_bgl],
        push_constant_ranges: &[],
    });
    let make_lit = |label: &str, depth_write: bool| {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&lit_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[POSITION_LAYOUT, NORMAL_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(helpers::depth_state(
                depth_write,
                wgpu::CompareFunction::Less,
            )),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[helpers::color_target(color_format)],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        })
    };
    let lit = make_lit("mesh_pipeline", true);
    // The catcher only darkens what is behind it.
    let ground = make_lit("ground_pipeline", false);

    let shadow_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("shadow_pl"),
        bind_group_layouts: &[&shadow_globals_bgl, &draw_bgl],
        push_constant_ranges: &[],
    });
    let mut shadow_depth = helpers::depth_state(true, wgpu::CompareFunction::LessEqual);
    shadow_depth.bias = wgpu::DepthBiasState {
        constant: 2,
        slope_scale: 2.0,
        clamp: 0.0,
    };
    let shadow = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("shadow_pipeline"),
        layout: Some(&shadow_layout),
        vertex: wgpu::VertexState {
            module: &shadow_shader,
            entry_point: Some("vs_main"),
            buffers: &[POSITION_LAYOUT],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: Some(shadow_depth),
        multisample: wgpu::MultisampleState::default(),
        fragment: None,
        cache: None,
        multiview: None,
    });

    let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("shadow_sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        compare: Some(wgpu::CompareFunction::LessEqual),
        ..Default::default()
    });

    MeshPipelines {
        globals_bgl,
        draw_bgl,
        shadow_globals_bgl,
        lit,
        ground,
        shadow,
        shadow_sampler,
    }
}

/// Vertex and index buffers for one primitive.
pub(crate) struct GpuPrimitive {
    pub(crate) positions: wgpu::Buffer,
    pub(crate) normals: wgpu::Buffer,
    pub(crate) indices: wgpu::Buffer,
    pub(crate) index_count: u32,
    pub(crate) color: [f32; 4],
}

impl GpuPrimitive {
    /// `None` for primitives with nothing to draw.
    pub(crate) fn upload(device: &wgpu::Device, label: &str, p: &Primitive) -> Option<Self> {
        if p.positions.is_empty() || p.indices.len() < 3 {
            return None;
        }
        let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&p.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let normals = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&p.normals),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&p.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Some(Self {
            positions,
            normals,
            indices,
            index_count: p.indices.len() as u32,
            color: p.base_color,
        })
    }

    pub(crate) fn draw<'p>(&self, pass: &mut wgpu::RenderPass<'p>, with_normals: bool) {
        pass.set_vertex_buffer(0, self.positions.slice(..));
        if with_normals {
            pass.set_vertex_buffer(1, self.normals.slice(..));
        }
        pass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// A mesh primitive placed by a scene node's world matrix.
pub(crate) struct MeshDraw {
    pub(crate) node: NodeId,
    pub(crate) primitive: GpuPrimitive,
}

/// Depth texture the key light renders into, with the bind groups that read it.
pub(crate) struct ShadowTarget {
    pub(crate) size: u32,
    pub(crate) view: wgpu::TextureView,
    _texture: wgpu::Texture,
}

impl ShadowTarget {
    /// A 1x1 map stands in when shadows are off so the bind group stays valid.
    pub(crate) fn new(device: &wgpu::Device, enabled: bool, size: u32) -> Self {
        let size = if enabled { size.max(1) } else { 1 };
        let (texture, view) = helpers::create_depth_target(device, "shadow_map", size, size, true);
        Self {
            size,
            view,
            _texture: texture,
        }
    }
}
