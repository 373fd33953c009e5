use glam::Mat4;

use crate::{error::DrawError, scene::armature::MAX_BONES};

use super::DynamicStaging;

/// One full `MAX_BONES` palette per model drawn this frame, in a storage
/// buffer indexed by dynamic offset.
pub struct BonesBinding {
    pub bind_group: wgpu::BindGroup,
    buffer: wgpu::Buffer,
    staging: DynamicStaging,
}

impl BonesBinding {
    pub const INITIAL_CAPACITY: u32 = 8;
    pub const PALETTE_SIZE: usize = MAX_BONES * size_of::<Mat4>();

    pub fn desc() -> wgpu::BindGroupLayoutDescriptor<'static> {
        wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("Bones Bind Group Layout"),
        }
    }

    fn create(
        staging: &DynamicStaging,
        layout: &wgpu::BindGroupLayout,
        device: &wgpu::Device,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Bones SSBO"),
            size: staging.buffer_size(),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bones Bind Group"),
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
        let staging = DynamicStaging::new(Self::PALETTE_SIZE, Self::INITIAL_CAPACITY);
        let (buffer, bind_group) = Self::create(&staging, layout, device);
        Self {
            bind_group,
            buffer,
            staging,
        }
    }

    /// Stages a palette, padding short ones with identity. Returns the
    /// dynamic offset to bind it at.
    pub fn push(&mut self, matrices: &[Mat4]) -> Result<u32, DrawError> {
        stage_palette(&mut self.staging, matrices)
    }

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
            log::info!("growing bone palettes to {}", self.staging.capacity());
            (self.buffer, self.bind_group) = Self::create(&self.staging, layout, device);
        }
    }
}

fn stage_palette(staging: &mut DynamicStaging, matrices: &[Mat4]) -> Result<u32, DrawError> {
    if matrices.len() > MAX_BONES {
        return Err(DrawError::PaletteTooLarge {
            count: matrices.len(),
            max: MAX_BONES,
        });
    }
    let mut palette = [Mat4::IDENTITY; MAX_BONES];
    palette[..matrices.len()].copy_from_slice(matrices);
    staging
        .push(bytemuck::cast_slice(&palette))
        .ok_or(DrawError::PaletteCapacity(staging.capacity()))
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn palette_fills_whole_256_byte_slots() {
        assert_eq!(BonesBinding::PALETTE_SIZE % 256, 0);
    }

    #[test]
    fn short_palette_is_padded_with_identity() {
        let mut staging = DynamicStaging::new(BonesBinding::PALETTE_SIZE, 2);
        let moved = Mat4::from_translation(Vec3::X);
        assert_eq!(stage_palette(&mut staging, &[moved]), Ok(0));
        let (bytes, _) = staging.finish();
        let matrices: Vec<Mat4> = bytes
            .chunks_exact(size_of::<Mat4>())
            .map(bytemuck::pod_read_unaligned)
            .collect();
        assert_eq!(matrices.len(), MAX_BONES);
        assert_eq!(matrices[0], moved);
        assert!(matrices[1..].iter().all(|m| *m == Mat4::IDENTITY));
    }

    #[test]
    fn oversized_palette_is_rejected() {
        let mut staging = DynamicStaging::new(BonesBinding::PALETTE_SIZE, 2);
        let too_many = vec![Mat4::IDENTITY; MAX_BONES + 1];
        assert_eq!(
            stage_palette(&mut staging, &too_many),
            Err(DrawError::PaletteTooLarge { count: MAX_BONES + 1, max: MAX_BONES })
        );
    }

    #[test]
    fn full_staging_reports_capacity() {
        let mut staging = DynamicStaging::new(BonesBinding::PALETTE_SIZE, 1);
        assert_eq!(stage_palette(&mut staging, &[]), Ok(0));
        assert_eq!(stage_palette(&mut staging, &[]), Err(DrawError::PaletteCapacity(1)));
    }
}
