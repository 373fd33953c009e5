pub mod bindgroups;
pub mod depth;
pub mod frame;
pub mod pipeline;
pub mod shader;
pub mod shader_cache;
pub mod wgpu_context;

use crate::{
    camera::CameraMatrices,
    error::ShaderError,
    scene::{model::RenderStats, texture::Texture, Model},
};

use self::{
    bindgroups::{bones::BonesBinding, draw::DrawBinding},
    depth::DepthTexture,
    frame::FramePass,
    pipeline::ModelPipelines,
    wgpu_context::WgpuContext,
};

pub struct Renderer {
    pipelines: ModelPipelines,
    draws: DrawBinding,
    bones: BonesBinding,
    depth: DepthTexture,
    white: Texture,
    pub clear_color: wgpu::Color,
}

impl Renderer {
    pub fn new(wgpu_context: &WgpuContext, clear_color: wgpu::Color) -> Self {
        let device = &wgpu_context.device;
        let pipelines = ModelPipelines::new(device, wgpu_context.surface_config.format);
        let draws = DrawBinding::new(&pipelines.layouts.draw, device);
        let bones = BonesBinding::new(&pipelines.layouts.bones, device);
        let depth = DepthTexture::new(device, &wgpu_context.surface_config);
        let white = Texture::white();
        white.upload(device, &wgpu_context.queue);
        Self {
            pipelines,
            draws,
            bones,
            depth,
            white,
            clear_color,
        }
    }

    pub fn resize(&mut self, wgpu_context: &WgpuContext) {
        self.depth = DepthTexture::new(&wgpu_context.device, &wgpu_context.surface_config);
    }

    /// Uploads geometry and textures and compiles every assigned material.
    pub fn upload_model(
        &mut self,
        wgpu_context: &WgpuContext,
        model: &mut Model,
    ) -> Result<(), ShaderError> {
        let (device, queue) = (&wgpu_context.device, &wgpu_context.queue);
        model.upload(device, queue);
        for slot in 0..model.material_slot_count() {
            if let Some(material) = model.material(slot) {
                material.upload(device, queue, &mut self.pipelines, &self.white)?;
            }
        }
        Ok(())
    }

    pub fn render(
        &mut self,
        wgpu_context: &WgpuContext,
        models: &mut [Model],
        camera: &CameraMatrices,
    ) -> Result<RenderStats, wgpu::SurfaceError> {
        let output = wgpu_context.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = wgpu_context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let mut stats = RenderStats::default();
        {
            let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Model Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
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
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            let mut frame = FramePass::new(pass, &mut self.draws, &mut self.bones);
            for model in models.iter_mut() {
                let model_stats = model.render(camera, &mut frame);
                stats.draws += model_stats.draws;
                stats.failed += model_stats.failed;
            }
            frame.finish();
        }

        let device = &wgpu_context.device;
        let queue = &wgpu_context.queue;
        self.draws.flush(&self.pipelines.layouts.draw, device, queue);
        self.bones.flush(&self.pipelines.layouts.bones, device, queue);
        queue.submit(Some(encoder.finish()));
        output.present();
        Ok(stats)
    }
}
