use std::{collections::HashMap, rc::Rc};

use crate::{error::ShaderError, scene::material::ShaderSource};

use super::shader;

#[derive(Default)]
pub struct ShaderCache {
    cache: HashMap<ShaderSource, Rc<wgpu::ShaderModule>>,
}

impl ShaderCache {
    pub fn get(
        &mut self,
        source: &ShaderSource,
        device: &wgpu::Device,
    ) -> Result<Rc<wgpu::ShaderModule>, ShaderError> {
        if let Some(module) = self.cache.get(source) {
            return Ok(module.clone());
        }
        let module = Rc::new(shader::create_shader_module(device, source)?);
        self.cache.insert(source.clone(), module.clone());
        Ok(module)
    }
}
