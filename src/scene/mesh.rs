use wgpu::util::DeviceExt as _;

use crate::error::ModelError;

use super::vertex::Vertex;

pub struct MeshBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// Triangle list geometry. CPU data is always present, GPU buffers only
/// after `upload`.
pub struct Mesh {
    pub name: String,
    pub material_slot: usize,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    gpu: Option<MeshBuffers>,
}

impl Mesh {
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        material_slot: usize,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if indices.len() % 3 != 0 {
            return Err(ModelError::NotTriangulated {
                mesh: name,
                count: indices.len(),
            });
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(ModelError::IndexOutOfRange {
                mesh: name,
                index,
                vertex_count: vertices.len(),
            });
        }
        Ok(Self {
            name,
            material_slot,
            vertices,
            indices,
            gpu: None,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Bone influences are written here during armature construction, before
    /// upload.
    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn gpu(&self) -> Option<&MeshBuffers> {
        self.gpu.as_ref()
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    /// Creates the vertex and index buffers. Calling it again is a no-op.
    pub fn upload(&mut self, device: &wgpu::Device) {
        if self.gpu.is_some() {
            log::debug!("mesh {} already uploaded", self.name);
            return;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.gpu = Some(MeshBuffers {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> (Vec<Vertex>, Vec<u32>) {
        (vec![Vertex::default(); 4], vec![0, 1, 2, 2, 3, 0])
    }

    #[test]
    fn new_mesh_is_cpu_only() {
        let (vertices, indices) = quad();
        let mesh = Mesh::new("quad", vertices, indices, 0).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert!(!mesh.is_uploaded());
    }

    #[test]
    fn rejects_partial_triangles() {
        let (vertices, mut indices) = quad();
        indices.push(1);
        let err = Mesh::new("quad", vertices, indices, 0).err().unwrap();
        assert!(matches!(err, ModelError::NotTriangulated { count: 7, .. }));
    }

    #[test]
    fn rejects_out_of_range_index() {
        let (vertices, mut indices) = quad();
        indices[4] = 4;
        let err = Mesh::new("quad", vertices, indices, 0).err().unwrap();
        assert!(matches!(
            err,
            ModelError::IndexOutOfRange { index: 4, vertex_count: 4, .. }
        ));
    }

    #[test]
    fn empty_mesh_is_valid() {
        let mesh = Mesh::new("empty", vec![], vec![], 0).unwrap();
        assert_eq!(mesh.triangle_count(), 0);
    }
}
