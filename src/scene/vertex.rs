use glam::{Vec2, Vec3};

pub const MAX_BONE_INFLUENCE: usize = 4;

/// Marks an unused influence slot in `Vertex::bone_ids`.
pub const NO_BONE: i32 = -1;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub color: [f32; 3],
    pub bone_ids: [i32; MAX_BONE_INFLUENCE],
    pub weights: [f32; MAX_BONE_INFLUENCE],
}

impl Default for Vertex {
    fn default() -> Self {
        Vertex {
            position: [0.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            tex_coords: [1.0, 1.0],
            color: [1.0, 1.0, 1.0],
            bone_ids: [NO_BONE; MAX_BONE_INFLUENCE],
            weights: [0.0; MAX_BONE_INFLUENCE],
        }
    }
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, tex_coords: Vec2, color: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            tex_coords: tex_coords.to_array(),
            color: color.to_array(),
            ..Default::default()
        }
    }

    /// Writes `(bone, weight)` into the first free influence slot.
    ///
    /// Returns `false` and leaves the vertex untouched when every slot is
    /// already taken.
    pub fn add_bone_influence(&mut self, bone: i32, weight: f32) -> bool {
        match self.bone_ids.iter().position(|&id| id == NO_BONE) {
            Some(slot) => {
                self.bone_ids[slot] = bone;
                self.weights[slot] = weight;
                true
            }
            None => false,
        }
    }

    /// Valid influences, up to the first unused slot.
    pub fn influences(&self) -> impl Iterator<Item = (i32, f32)> + '_ {
        self.bone_ids
            .iter()
            .zip(self.weights.iter())
            .take_while(|(&id, _)| id != NO_BONE)
            .map(|(&id, &weight)| (id, weight))
    }

    pub fn influence_count(&self) -> usize {
        self.influences().count()
    }
}

impl Vertex {
    const OFFSET_POS: wgpu::BufferAddress = 0;
    const OFFSET_NOR: wgpu::BufferAddress =
        Self::OFFSET_POS + size_of::<[f32; 3]>() as wgpu::BufferAddress;
    const OFFSET_TEX: wgpu::BufferAddress =
        Self::OFFSET_NOR + size_of::<[f32; 3]>() as wgpu::BufferAddress;
    const OFFSET_COL: wgpu::BufferAddress =
        Self::OFFSET_TEX + size_of::<[f32; 2]>() as wgpu::BufferAddress;
    const OFFSET_BID: wgpu::BufferAddress =
        Self::OFFSET_COL + size_of::<[f32; 3]>() as wgpu::BufferAddress;
    const OFFSET_WEI: wgpu::BufferAddress =
        Self::OFFSET_BID + size_of::<[i32; MAX_BONE_INFLUENCE]>() as wgpu::BufferAddress;
    const ATTRIBUTES: [wgpu::VertexAttribute; 6] = [
        wgpu::VertexAttribute {
            offset: Self::OFFSET_POS,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: Self::OFFSET_NOR,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: Self::OFFSET_TEX,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x2,
        },
        wgpu::VertexAttribute {
            offset: Self::OFFSET_COL,
            shader_location: 3,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: Self::OFFSET_BID,
            shader_location: 4,
            format: wgpu::VertexFormat::Sint32x4,
        },
        wgpu::VertexAttribute {
            offset: Self::OFFSET_WEI,
            shader_location: 5,
            format: wgpu::VertexFormat::Float32x4,
        },
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_vertex_has_no_influences() {
        let v = Vertex::default();
        assert_eq!(v.influence_count(), 0);
        assert_eq!(v.weights, [0.0; MAX_BONE_INFLUENCE]);
    }

    #[test]
    fn influences_fill_slots_in_order() {
        let mut v = Vertex::default();
        assert!(v.add_bone_influence(3, 0.5));
        assert!(v.add_bone_influence(7, 0.25));
        assert_eq!(v.bone_ids, [3, 7, NO_BONE, NO_BONE]);
        assert_eq!(v.influences().collect::<Vec<_>>(), vec![(3, 0.5), (7, 0.25)]);
    }

    #[test]
    fn full_vertex_drops_extra_influence() {
        let mut v = Vertex::default();
        for bone in 0..MAX_BONE_INFLUENCE as i32 {
            assert!(v.add_bone_influence(bone, 0.25));
        }
        let before = v;
        assert!(!v.add_bone_influence(42, 0.9));
        assert_eq!(v, before);
        assert_eq!(v.influence_count(), MAX_BONE_INFLUENCE);
    }

    #[test]
    fn layout_matches_struct_size() {
        let end = Vertex::OFFSET_WEI + size_of::<[f32; MAX_BONE_INFLUENCE]>() as u64;
        assert_eq!(end, size_of::<Vertex>() as u64);
    }
}
