use glam::Mat4;

use crate::{camera::CameraMatrices, error::DrawError};

use super::{material::Material, mesh::Mesh};

/// Matrices for a single draw call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawTransforms {
    pub world_from_model: Mat4,
    pub projection_from_world: Mat4,
}

impl DrawTransforms {
    pub fn new(world_from_model: Mat4, camera: &CameraMatrices) -> Self {
        Self {
            world_from_model,
            projection_from_world: camera.projection * camera.view,
        }
    }

    pub fn projection_from_model(&self) -> Mat4 {
        self.projection_from_world * self.world_from_model
    }
}

/// Receives a model's draw stream for one frame.
///
/// `set_bone_matrices` is called once per model before its first
/// `draw_mesh`. Errors are reported per call and do not end the frame.
pub trait DrawSink {
    fn set_bone_matrices(&mut self, matrices: &[Mat4]) -> Result<(), DrawError>;
    fn draw_mesh(
        &mut self,
        mesh: &Mesh,
        material: &Material,
        transforms: &DrawTransforms,
    ) -> Result<(), DrawError>;
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn projection_from_model_composes_camera_and_world() {
        let camera = CameraMatrices {
            view: Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)),
            projection: Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0),
        };
        let world = Mat4::from_translation(Vec3::X);
        let transforms = DrawTransforms::new(world, &camera);
        let expected = camera.projection * camera.view * world;
        assert!(transforms.projection_from_model().abs_diff_eq(expected, 1e-6));
    }
}
