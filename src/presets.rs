//! Ready-made ways to load a model with materials assigned.

use std::{path::Path, rc::Rc};

use crate::{
    config::ModelConfig,
    error::ModelError,
    scene::{Material, Model, ShaderSource, Texture},
};

/// Every slot shares one material with the given texture. A texture that
/// fails to load leaves the material untextured.
pub fn textured(
    path: impl AsRef<Path>,
    shader: ShaderSource,
    texture: Option<&Path>,
) -> Result<Model, ModelError> {
    let mut model = Model::load(path)?;
    let mut material = Material::new("textured", shader);
    if let Some(texture) = texture.and_then(Texture::load_optional) {
        material = material.with_texture(Rc::new(texture));
    }
    model.set_default_material(Rc::new(material));
    Ok(model)
}

/// Materials rebuilt from the asset's own descriptions.
pub fn imported(path: impl AsRef<Path>, shader: ShaderSource) -> Result<Model, ModelError> {
    let mut model = Model::load(path)?;
    let materials = model.materials_from_import(&shader);
    model.set_materials(materials)?;
    Ok(model)
}

pub fn from_config(config: &ModelConfig) -> Result<Model, ModelError> {
    let shader = match &config.shader {
        Some(path) => ShaderSource::File(path.clone()),
        None => ShaderSource::Builtin,
    };
    let mut model = match &config.texture {
        Some(texture) => textured(&config.path, shader, Some(texture.as_path()))?,
        None => imported(&config.path, shader)?,
    };
    model.transform = config.transform();
    Ok(model)
}
