use crate::scene::draw::DrawTransforms;

use super::DynamicStaging;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniform {
    pub projection_from_model: [[f32; 4]; 4],
    pub world_from_model: [[f32; 4]; 4],
    pub projection_from_world: [[f32; 4]; 4],
}

impl From<&DrawTransforms> for DrawUniform {
    fn from(t: &DrawTransforms) -> Self {
        Self {
            projection_from_model: t.projection_from_model().to_cols_array_2d(),
            world_from_model: t.world_from_model.to_cols_array_2d(),
            projection_from_world: t.projection_from_world.to_cols_array_2d(),
        }
    }
}

/// Per-draw matrices, one 256 byte slot per draw call in the frame.
pub struct DrawBinding {
    pub bind_group: wgpu::BindGroup,
    buffer: wgpu::Buffer,
    pub staging: DynamicStaging,
}

impl DrawBinding {
    pub const INITIAL_CAPACITY: u32 = 256;

    pub fn desc() -> wgpu::BindGroupLayoutDescriptor<'static> {
        wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("Draw Bind Group Layout"),
        }
    }

    fn create(
        staging: &DynamicStaging,
        layout: &wgpu::BindGroupLayout,
        device: &wgpu::Device,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniform Buffer"),
            size: staging.buffer_size(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: Some(staging.record_size()),
                }),
            }],
        });
        (buffer, bind_group)
    }

    pub fn new(layout: &wgpu::BindGroupLayout, device: &wgpu::Device) -> Self {
        let staging = DynamicStaging::new(size_of::<DrawUniform>(), Self::INITIAL_CAPACITY);
        let (buffer, bind_group) = Self::create(&staging, layout, device);
        Self {
            bind_group,
            buffer,
            staging,
        }
    }

    /// Uploads the frame's draws, growing the buffer for the next frame if
    /// some draws did not fit.
    pub fn flush(
        &mut self,
        layout: &wgpu::BindGroupLayout,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        let (bytes, grow) = self.staging.finish();
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, &bytes);
        }
        if grow {
            log::info!("growing draw uniforms to {} slots", self.staging.capacity());
            (self.buffer, self.bind_group) = Self::create(&self.staging, layout, device);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::camera::CameraMatrices;

    #[test]
    fn uniform_is_three_matrices() {
        assert_eq!(size_of::<DrawUniform>(), 192);
        let camera = CameraMatrices {
            view: Mat4::from_translation(Vec3::Z),
            projection: Mat4::from_scale(Vec3::splat(2.0)),
        };
        let world = Mat4::from_translation(Vec3::X);
        let uniform = DrawUniform::from(&DrawTransforms::new(world, &camera));
        assert_eq!(uniform.world_from_model, world.to_cols_array_2d());
        assert_eq!(
            uniform.projection_from_model,
            (camera.projection * camera.view * world).to_cols_array_2d()
        );
    }
}
