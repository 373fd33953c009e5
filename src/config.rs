use std::path::{Path, PathBuf};

use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::{
    camera::{Camera, FlySettings, Projection},
    error::ConfigError,
};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub clear_color: ClearColor,
    pub camera: CameraConfig,
    pub models: Vec<ModelConfig>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "model viewer".to_string(),
            width: 800,
            height: 800,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct ClearColor(pub [f64; 4]);

impl Default for ClearColor {
    fn default() -> Self {
        Self([0.0, 0.0, 0.0, 1.0])
    }
}

impl From<ClearColor> for wgpu::Color {
    fn from(c: ClearColor) -> Self {
        let [r, g, b, a] = c.0;
        wgpu::Color { r, g, b, a }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ProjectionConfig {
    Perspective { fov_degrees: f32 },
    Orthographic { height: f32 },
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub look_at: [f32; 3],
    pub projection: ProjectionConfig,
    pub znear: f32,
    pub zfar: f32,
    pub move_speed: f32,
    pub mouse_sensitivity: [f32; 2],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 1.0, -1.0],
            look_at: [0.0, 0.0, 0.0],
            projection: ProjectionConfig::Perspective { fov_degrees: 60.0 },
            znear: 0.1,
            zfar: 100.0,
            move_speed: 10.0,
            mouse_sensitivity: [0.1, 0.1],
        }
    }
}

impl CameraConfig {
    pub fn build(&self) -> Camera {
        let projection = match self.projection {
            ProjectionConfig::Perspective { fov_degrees } => Projection::Perspective {
                fovy: fov_degrees.to_radians(),
                znear: self.znear,
                zfar: self.zfar,
            },
            ProjectionConfig::Orthographic { height } => Projection::Orthographic {
                height,
                znear: self.znear,
                zfar: self.zfar,
            },
        };
        let mut camera = Camera::new(self.position.into(), Quat::IDENTITY, projection);
        camera.look_at(self.look_at.into());
        camera
    }

    pub fn fly_settings(&self) -> FlySettings {
        FlySettings {
            move_speed: self.move_speed,
            mouse_sensitivity: Vec2::from_array(self.mouse_sensitivity),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    /// Replaces the asset's own materials with one textured material.
    pub texture: Option<PathBuf>,
    /// WGSL file, the builtin shader when absent.
    pub shader: Option<PathBuf>,
    pub rotation_axis: [f32; 3],
    pub rotation_degrees: f32,
    pub translation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/SM_Deccer_Cubes.glb"),
            texture: Some(PathBuf::from("textures/crate.jpg")),
            shader: None,
            rotation_axis: [0.0, 1.0, 0.0],
            rotation_degrees: 0.0,
            translation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl ModelConfig {
    /// Rotation, then translation in the rotated frame, then scale.
    pub fn transform(&self) -> Mat4 {
        let rotation = match Vec3::from(self.rotation_axis).try_normalize() {
            Some(axis) => Mat4::from_axis_angle(axis, self.rotation_degrees.to_radians()),
            None => Mat4::IDENTITY,
        };
        rotation
            * Mat4::from_translation(self.translation.into())
            * Mat4::from_scale(self.scale.into())
    }
}

impl ViewerConfig {
    /// Two copies of the sample cubes, the second one tilted and offset.
    pub fn sample_scene() -> Self {
        let tilted = ModelConfig {
            rotation_axis: [0.6, 0.8, 0.0],
            rotation_degrees: 33.0,
            translation: [4.0, 8.0, 10.0],
            ..Default::default()
        };
        Self {
            models: vec![ModelConfig::default(), tilted],
            ..Default::default()
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path`, falling back to the sample scene when the file does
    /// not exist. A file that exists but fails to parse is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match Self::load(path) {
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                log::warn!("{} not found, using the sample scene", path.display());
                Ok(Self::sample_scene())
            }
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config: ViewerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.window.width, 800);
        assert!(config.models.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: ViewerConfig = serde_json::from_str(
            r#"{
                "window": { "title": "cubes" },
                "camera": { "projection": { "type": "orthographic", "height": 12.0 } },
                "models": [ { "path": "models/fox.glb", "texture": null } ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.window.title, "cubes");
        assert_eq!(config.window.height, 800);
        assert_eq!(
            config.camera.projection,
            ProjectionConfig::Orthographic { height: 12.0 }
        );
        assert_eq!(config.camera.zfar, 100.0);
        assert_eq!(config.models[0].path, PathBuf::from("models/fox.glb"));
        assert_eq!(config.models[0].texture, None);
        assert_eq!(config.models[0].scale, [1.0; 3]);
    }

    #[test]
    fn missing_file_falls_back_to_sample_scene() {
        let config = ViewerConfig::load_or_default("no/such/viewer.json").unwrap();
        assert_eq!(config.models.len(), 2);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let path = std::env::temp_dir().join("model-viewer-invalid-config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = ViewerConfig::load_or_default(&path).err().unwrap();
        assert!(matches!(err, ConfigError::Parse { .. }));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn model_transform_rotates_translation() {
        let model = ModelConfig {
            rotation_axis: [0.0, 0.0, 1.0],
            rotation_degrees: 90.0,
            translation: [1.0, 0.0, 0.0],
            ..Default::default()
        };
        let origin = model.transform().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn zero_axis_means_no_rotation() {
        let model = ModelConfig {
            rotation_axis: [0.0; 3],
            rotation_degrees: 45.0,
            translation: [2.0, 0.0, 0.0],
            ..Default::default()
        };
        assert_eq!(model.transform(), Mat4::from_translation(Vec3::X * 2.0));
    }
}
