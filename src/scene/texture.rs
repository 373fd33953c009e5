use std::{cell::OnceCell, path::Path};

use crate::{error::ModelError, import::ImportedTexture};

pub struct TextureBinding {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// RGBA8 image, uploaded at most once.
pub struct Texture {
    pub name: String,
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    gpu: OnceCell<TextureBinding>,
}

impl Texture {
    pub fn from_rgba(
        name: impl Into<String>,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(ModelError::TextureSize {
                name,
                width,
                height,
                len: rgba.len(),
            });
        }
        Ok(Self {
            name,
            width,
            height,
            rgba,
            gpu: OnceCell::new(),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| ModelError::Texture {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::info!("loaded texture {} ({width}x{height})", path.display());
        Self::from_rgba(path.display().to_string(), width, height, rgba.into_raw())
    }

    /// Like `from_path`, but a missing or unreadable file only logs a warning.
    pub fn load_optional(path: impl AsRef<Path>) -> Option<Self> {
        match Self::from_path(path) {
            Ok(texture) => Some(texture),
            Err(e) => {
                log::warn!("{e}");
                None
            }
        }
    }

    pub fn from_import(imported: ImportedTexture) -> Result<Self, ModelError> {
        Self::from_rgba(imported.name, imported.width, imported.height, imported.rgba)
    }

    /// Single opaque white texel, bound by materials without a texture.
    pub fn white() -> Self {
        Self {
            name: "white".to_string(),
            width: 1,
            height: 1,
            rgba: vec![255; 4],
            gpu: OnceCell::new(),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn gpu(&self) -> Option<&TextureBinding> {
        self.gpu.get()
    }

    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> &TextureBinding {
        self.gpu.get_or_init(|| {
            let size = wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            };
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&self.name),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                },
                &self.rgba,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * self.width),
                    rows_per_image: Some(self.height),
                },
                size,
            );
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                address_mode_u: wgpu::AddressMode::Repeat,
                address_mode_v: wgpu::AddressMode::Repeat,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            });
            TextureBinding {
                texture,
                view,
                sampler,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_data_must_match_size() {
        assert!(Texture::from_rgba("ok", 2, 2, vec![0; 16]).is_ok());
        let err = Texture::from_rgba("short", 2, 2, vec![0; 12]).err().unwrap();
        assert!(matches!(err, ModelError::TextureSize { len: 12, .. }));
    }

    #[test]
    fn missing_optional_texture_is_none() {
        assert!(Texture::load_optional("no/such/texture.png").is_none());
        assert!(matches!(
            Texture::from_path("no/such/texture.png"),
            Err(ModelError::Texture { .. })
        ));
    }

    #[test]
    fn white_is_single_texel() {
        let white = Texture::white();
        assert_eq!(white.size(), (1, 1));
        assert_eq!(white.rgba(), [255, 255, 255, 255]);
        assert!(white.gpu().is_none());
    }
}
