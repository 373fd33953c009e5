use std::{collections::HashMap, rc::Rc};

use pollster::FutureExt as _;

use crate::{
    error::ShaderError,
    scene::{material::ShaderSource, vertex::Vertex},
};

use super::{
    bindgroups::{bones::BonesBinding, draw::DrawBinding, material::MaterialBinding},
    depth::DepthTexture,
    shader,
    shader_cache::ShaderCache,
};

pub struct ModelLayouts {
    pub draw: wgpu::BindGroupLayout,
    pub bones: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
}

impl ModelLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            draw: device.create_bind_group_layout(&DrawBinding::desc()),
            bones: device.create_bind_group_layout(&BonesBinding::desc()),
            material: device.create_bind_group_layout(&MaterialBinding::desc()),
        }
    }
}

/// One render pipeline per distinct material shader, all sharing the same
/// layout: group 0 draw, group 1 bones, group 2 material.
pub struct ModelPipelines {
    pub layouts: ModelLayouts,
    pipeline_layout: wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    shader_cache: ShaderCache,
    pipelines: HashMap<ShaderSource, Rc<wgpu::RenderPipeline>>,
}

impl ModelPipelines {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let layouts = ModelLayouts::new(device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Model Pipeline Layout"),
            bind_group_layouts: &[&layouts.draw, &layouts.bones, &layouts.material],
            push_constant_ranges: &[],
        });
        Self {
            layouts,
            pipeline_layout,
            color_format,
            shader_cache: ShaderCache::default(),
            pipelines: HashMap::new(),
        }
    }

    pub fn get(
        &mut self,
        shader: &ShaderSource,
        device: &wgpu::Device,
    ) -> Result<Rc<wgpu::RenderPipeline>, ShaderError> {
        if let Some(pipeline) = self.pipelines.get(shader) {
            return Ok(pipeline.clone());
        }
        let module = self.shader_cache.get(shader, device)?;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.build_pipeline(&module, device);
        if let Some(e) = device.pop_error_scope().block_on() {
            return Err(ShaderError::Compile {
                label: shader::label(shader),
                message: e.to_string(),
            });
        }
        let pipeline = Rc::new(pipeline);
        self.pipelines.insert(shader.clone(), pipeline.clone());
        Ok(pipeline)
    }

    fn build_pipeline(
        &self,
        shader_module: &wgpu::ShaderModule,
        device: &wgpu::Device,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Model Pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader_module,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthTexture::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }
}
