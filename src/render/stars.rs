use super::helpers;
use glam::Mat4;
use panel3d_core::stars::StarField;
use wgpu;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct StarsUniforms {
    pub(crate) view: [[f32; 4]; 4],
    pub(crate) proj: [[f32; 4]; 4],
    pub(crate) model: [[f32; 4]; 4],
    pub(crate) color_size: [f32; 4],
}

pub(crate) struct StarsPipeline {
    pub(crate) bgl: wgpu::BindGroupLayout,
    pub(crate) pipeline: wgpu::RenderPipeline,
}

pub(crate) fn create_stars_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
) -> StarsPipeline {
    let shader = helpers::shader(device, "stars_shader", panel3d_core::STARS_WGSL);
    let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("stars_bgl"),
        entries: &[helpers::uniform_entry(
            0,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            None,
        )],
    });
    let pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("stars_pl"),
        bind_group_layouts: &[&bgl],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("stars_pipeline"),
        layout: Some(&pl),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: 12,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                }],
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: Some(helpers::depth_state(false, wgpu::CompareFunction::Less)),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[helpers::color_target(color_format)],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        cache: None,
        multiview: None,
    });
    StarsPipeline { bgl, pipeline }
}

pub(crate) struct GpuStars {
    instances: wgpu::Buffer,
    count: u32,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    color: [f32; 3],
    half_size: f32,
}

impl GpuStars {
    pub(crate) fn upload(device: &wgpu::Device, pipeline: &StarsPipeline, stars: &StarField) -> Self {
        let centers: Vec<[f32; 3]> = stars.positions.iter().map(|p| p.to_array()).collect();
        let instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("star_instances"),
            // Zero-length buffers are invalid; one dummy center is never drawn.
            contents: if centers.is_empty() {
                bytemuck::cast_slice(&[[0.0f32; 3]])
            } else {
                bytemuck::cast_slice(&centers)
            },
            usage: wgpu::BufferUsages::VERTEX,
        });
        let uniforms = helpers::uniform_buffer(
            device,
            "stars_uniforms",
            std::mem::size_of::<StarsUniforms>() as u64,
        );
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("stars_bg"),
            layout: &pipeline.bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });
        Self {
            instances,
            count: centers.len() as u32,
            uniforms,
            bind_group,
            color: stars.color,
            half_size: stars.size * 0.5,
        }
    }

    pub(crate) fn write(&self, queue: &wgpu::Queue, view: Mat4, proj: Mat4, model: Mat4) {
        let u = StarsUniforms {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            color_size: [self.color[0], self.color[1], self.color[2], self.half_size],
        };
        queue.write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&u));
    }

    pub(crate) fn draw<'p>(&self, pass: &mut wgpu::RenderPass<'p>, pipeline: &StarsPipeline) {
        if self.count == 0 {
            return;
        }
        pass.set_pipeline(&pipeline.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.instances.slice(..));
        pass.draw(0..6, 0..self.count);
    }
}
