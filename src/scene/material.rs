use std::{cell::OnceCell, path::PathBuf, rc::Rc};

use glam::Vec4;

use crate::{
    error::ShaderError,
    renderer::{bindgroups::material::MaterialBinding, pipeline::ModelPipelines},
};

use super::texture::Texture;

/// WGSL program a material draws with. Materials sharing a source share a
/// pipeline.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum ShaderSource {
    Builtin,
    File(PathBuf),
}

pub struct MaterialGpu {
    pub pipeline: Rc<wgpu::RenderPipeline>,
    pub binding: MaterialBinding,
}

pub struct Material {
    pub name: String,
    pub shader: ShaderSource,
    pub base_color: Vec4,
    pub texture: Option<Rc<Texture>>,
    gpu: OnceCell<MaterialGpu>,
}

impl Material {
    pub fn new(name: impl Into<String>, shader: ShaderSource) -> Self {
        Self {
            name: name.into(),
            shader,
            base_color: Vec4::ONE,
            texture: None,
            gpu: OnceCell::new(),
        }
    }

    pub fn with_base_color(mut self, base_color: Vec4) -> Self {
        self.base_color = base_color;
        self
    }

    pub fn with_texture(mut self, texture: Rc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn gpu(&self) -> Option<&MaterialGpu> {
        self.gpu.get()
    }

    /// Compiles (or reuses) the pipeline for this material's shader and
    /// creates its bind group. Later calls return the first binding.
    pub fn upload(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipelines: &mut ModelPipelines,
        fallback_texture: &Texture,
    ) -> Result<&MaterialGpu, ShaderError> {
        if let Some(gpu) = self.gpu.get() {
            return Ok(gpu);
        }
        let pipeline = pipelines.get(&self.shader, device)?;
        let texture = self.texture.as_deref().unwrap_or(fallback_texture);
        let binding = MaterialBinding::new(
            &pipelines.layouts.material,
            device,
            self.base_color,
            texture.upload(device, queue),
        );
        log::debug!("uploaded material {}", self.name);
        Ok(self.gpu.get_or_init(|| MaterialGpu { pipeline, binding }))
    }
}
