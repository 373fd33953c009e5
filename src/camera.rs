use glam::{EulerRot, Mat3, Mat4, Quat, Vec2, Vec3};

fn look_at_rotation(eye: Vec3, target: Vec3, world_up: Vec3) -> Option<Quat> {
    let forward = (target - eye).try_normalize()?;
    // looking straight up or down, pick another up
    let world_up = if forward.dot(world_up).abs() > 0.999 {
        Vec3::Z
    } else {
        world_up
    };
    let up = (world_up - forward * world_up.dot(forward)).normalize();
    let right = forward.cross(up);

    // Camera looks down -Z
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, -forward)))
}

/// View and projection for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Perspective { fovy: f32, znear: f32, zfar: f32 },
    /// `height` is the visible extent in world units.
    Orthographic { height: f32, znear: f32, zfar: f32 },
}

impl Projection {
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        match *self {
            Projection::Perspective { fovy, znear, zfar } => {
                Mat4::perspective_rh(fovy, aspect, znear, zfar)
            }
            Projection::Orthographic { height, znear, zfar } => {
                let half_h = height * 0.5;
                let half_w = half_h * aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, znear, zfar)
            }
        }
    }
}

pub struct FlySettings {
    /// Units per second.
    pub move_speed: f32,
    /// Radians per pixel per second, (x, y).
    pub mouse_sensitivity: Vec2,
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
    pub projection: Projection,
    /// Pitch, yaw, roll fed to `set_euler_angles` by the fly controls.
    euler: Vec3,
}

impl Camera {
    pub fn new(position: Vec3, rotation: Quat, projection: Projection) -> Self {
        let mut camera = Self {
            position,
            rotation,
            projection,
            euler: Vec3::ZERO,
        };
        camera.sync_euler();
        camera
    }

    pub fn look_at(&mut self, target: Vec3) {
        match look_at_rotation(self.position, target, Vec3::Y) {
            Some(rotation) => {
                self.rotation = rotation;
                self.sync_euler();
            }
            None => log::debug!("camera already at look-at target"),
        }
    }

    /// Rotation from (pitch, yaw, roll), applied yaw first.
    pub fn set_euler_angles(&mut self, angles: Vec3) {
        self.euler = angles;
        self.rotation = Quat::from_euler(EulerRot::YXZ, angles.y, angles.x, angles.z);
    }

    pub fn euler_angles(&self) -> Vec3 {
        self.euler
    }

    fn sync_euler(&mut self) {
        let (yaw, pitch, roll) = self.rotation.to_euler(EulerRot::YXZ);
        self.euler = Vec3::new(pitch, yaw, roll);
    }

    pub fn view(&self) -> Mat4 {
        let rot_inv = self.rotation.conjugate();
        Mat4::from_rotation_translation(rot_inv, -(rot_inv * self.position))
    }

    pub fn matrices(&self, aspect: f32) -> CameraMatrices {
        CameraMatrices {
            view: self.view(),
            projection: self.projection.matrix(aspect),
        }
    }

    /// `movement` is (right, forward, up) in camera space, each in -1..=1.
    /// Horizontal movement follows the camera orientation, vertical movement
    /// stays on the world Y axis.
    pub fn fly(&mut self, movement: Vec3, mouse_delta: Vec2, dt: f32, settings: &FlySettings) {
        let turn = Vec3::new(
            -mouse_delta.y * settings.mouse_sensitivity.x * dt,
            -mouse_delta.x * settings.mouse_sensitivity.y * dt,
            0.0,
        );
        self.set_euler_angles(self.euler + turn);

        let delta = self.rotation * Vec3::new(movement.x, 0.0, -movement.y) + Vec3::Y * movement.z;
        self.position += delta * settings.move_speed * dt;
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec4;

    use super::*;

    fn perspective() -> Projection {
        Projection::Perspective {
            fovy: 60f32.to_radians(),
            znear: 0.1,
            zfar: 100.0,
        }
    }

    #[test]
    fn look_at_puts_target_on_view_axis() {
        let mut camera = Camera::new(Vec3::new(0.0, 1.0, -1.0), Quat::IDENTITY, perspective());
        camera.look_at(Vec3::ZERO);
        let target_in_view = camera.view().transform_point3(Vec3::ZERO);
        assert!(target_in_view.x.abs() < 1e-5);
        assert!(target_in_view.y.abs() < 1e-5);
        assert!(target_in_view.z < 0.0);
        assert!((target_in_view.length() - 2f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn look_at_straight_down_is_finite() {
        let mut camera = Camera::new(Vec3::Y * 5.0, Quat::IDENTITY, perspective());
        camera.look_at(Vec3::ZERO);
        assert!(camera.view().is_finite());
        let p = camera.view().transform_point3(Vec3::ZERO);
        assert!((p.z + 5.0).abs() < 1e-4);
    }

    #[test]
    fn euler_angles_survive_look_at() {
        let mut camera = Camera::new(Vec3::new(3.0, 2.0, 4.0), Quat::IDENTITY, perspective());
        camera.look_at(Vec3::ZERO);
        let rotation = camera.rotation;
        camera.set_euler_angles(camera.euler_angles());
        assert!(camera.rotation.abs_diff_eq(rotation, 1e-5) || camera.rotation.abs_diff_eq(-rotation, 1e-5));
    }

    #[test]
    fn fly_forward_moves_along_view_direction() {
        let mut camera = Camera::new(Vec3::ZERO, Quat::IDENTITY, perspective());
        let settings = FlySettings {
            move_speed: 10.0,
            mouse_sensitivity: Vec2::ONE,
        };
        camera.fly(Vec3::new(0.0, 1.0, 0.0), Vec2::ZERO, 0.5, &settings);
        assert!(camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-5));
        camera.fly(Vec3::new(0.0, 0.0, 1.0), Vec2::ZERO, 0.1, &settings);
        assert!(camera.position.abs_diff_eq(Vec3::new(0.0, 1.0, -5.0), 1e-5));
    }

    #[test]
    fn mouse_right_turns_right() {
        let mut camera = Camera::new(Vec3::ZERO, Quat::IDENTITY, perspective());
        let settings = FlySettings {
            move_speed: 1.0,
            mouse_sensitivity: Vec2::ONE,
        };
        camera.fly(Vec3::ZERO, Vec2::new(0.5, 0.0), 1.0, &settings);
        let forward = camera.rotation * -Vec3::Z;
        assert!(forward.x > 0.0);
    }

    #[test]
    fn projections_map_near_plane_to_zero_depth() {
        for projection in [
            perspective(),
            Projection::Orthographic {
                height: 10.0,
                znear: 0.1,
                zfar: 100.0,
            },
        ] {
            let clip = projection.matrix(1.5) * Vec4::new(0.0, 0.0, -0.1, 1.0);
            assert!((clip.z / clip.w).abs() < 1e-5);
        }
    }
}
