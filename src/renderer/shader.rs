use std::borrow::Cow;

use pollster::FutureExt as _;

use crate::{error::ShaderError, scene::material::ShaderSource};

pub const BUILTIN_MODEL_SHADER: &str = include_str!("../shaders/model.wgsl");

pub fn read_shader(source: &ShaderSource) -> Result<Cow<'static, str>, ShaderError> {
    match source {
        ShaderSource::Builtin => Ok(Cow::Borrowed(BUILTIN_MODEL_SHADER)),
        ShaderSource::File(path) => std::fs::read_to_string(path)
            .map(Cow::Owned)
            .map_err(|source| ShaderError::Read {
                path: path.clone(),
                source,
            }),
    }
}

pub fn label(source: &ShaderSource) -> String {
    match source {
        ShaderSource::Builtin => "builtin model shader".to_string(),
        ShaderSource::File(path) => path.display().to_string(),
    }
}

/// Compiles `source` inside a validation error scope so a broken shader comes
/// back as an error instead of a device panic.
pub fn create_shader_module(
    device: &wgpu::Device,
    source: &ShaderSource,
) -> Result<wgpu::ShaderModule, ShaderError> {
    let code = read_shader(source)?;
    let label = label(source);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&label),
        source: wgpu::ShaderSource::Wgsl(code),
    });
    match device.pop_error_scope().block_on() {
        Some(e) => Err(ShaderError::Compile {
            label,
            message: e.to_string(),
        }),
        None => {
            log::debug!("compiled shader {label}");
            Ok(module)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_shader_is_embedded() {
        let code = read_shader(&ShaderSource::Builtin).unwrap();
        assert!(code.contains("fn vs_main"));
        assert!(code.contains("bone_from_root"));
    }

    #[test]
    fn missing_shader_file_is_a_read_error() {
        let err = read_shader(&ShaderSource::File("no/such/shader.wgsl".into()))
            .err()
            .unwrap();
        assert!(matches!(err, ShaderError::Read { .. }));
    }
}
