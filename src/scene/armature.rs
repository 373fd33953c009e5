use std::collections::HashMap;

use glam::Mat4;

use crate::{error::ModelError, import::ImportedBone};

use super::{mesh::Mesh, node::NodeEntry};

/// Size of the bone palette the vertex shader indexes into.
pub const MAX_BONES: usize = 100;

/// Bones in shader order. Each resolved bone points at an entry of the
/// model's flattened node array.
pub struct Armature {
    bones: Vec<Option<usize>>,
    matrices: Vec<Mat4>,
}

impl Default for Armature {
    fn default() -> Self {
        Self {
            bones: vec![],
            matrices: vec![Mat4::IDENTITY; MAX_BONES],
        }
    }
}

impl Armature {
    /// Assigns bone indices in mesh order, then per-mesh bone order, and
    /// writes the resulting influences into the mesh vertices.
    ///
    /// Bones whose node cannot be found keep their index but stay unresolved.
    /// Influences beyond `MAX_BONE_INFLUENCE` per vertex and bones beyond
    /// `MAX_BONES` are dropped.
    pub fn build(
        meshes: &mut [Mesh],
        bones_per_mesh: &[Vec<ImportedBone>],
        entries_by_name: &HashMap<String, usize>,
    ) -> Result<Self, ModelError> {
        let mut armature = Self::default();
        let mut dropped_bones = 0usize;
        let mut dropped_influences = 0usize;

        for (mesh, bones) in meshes.iter_mut().zip(bones_per_mesh) {
            for bone in bones {
                let bone_index = armature.bones.len() + dropped_bones;
                if bone_index >= MAX_BONES {
                    dropped_bones += 1;
                    continue;
                }
                let Some(&entry) = entries_by_name.get(&bone.node_name) else {
                    log::debug!("bone {} has no matching node", bone.node_name);
                    armature.bones.push(None);
                    continue;
                };
                armature.bones.push(Some(entry));

                let vertex_count = mesh.vertices().len();
                for weight in &bone.weights {
                    let Some(vertex) = mesh.vertices_mut().get_mut(weight.vertex as usize) else {
                        return Err(ModelError::BoneVertexOutOfRange {
                            mesh: mesh.name.clone(),
                            bone: bone.node_name.clone(),
                            vertex: weight.vertex,
                            vertex_count,
                        });
                    };
                    if !vertex.add_bone_influence(bone_index as i32, weight.weight) {
                        dropped_influences += 1;
                    }
                }
            }
        }

        if dropped_bones > 0 {
            log::warn!("{dropped_bones} bones exceed the palette of {MAX_BONES} and were dropped");
        }
        if dropped_influences > 0 {
            log::warn!("{dropped_influences} bone influences dropped on full vertices");
        }
        log::debug!(
            "armature: {} bones, {} resolved",
            armature.bone_count(),
            armature.resolved_count()
        );
        Ok(armature)
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn resolved_count(&self) -> usize {
        self.bones.iter().filter(|b| b.is_some()).count()
    }

    /// Entry index of bone `index`, `None` if unresolved or out of range.
    pub fn bone(&self, index: usize) -> Option<usize> {
        self.bones.get(index).copied().flatten()
    }

    /// Recomputes the palette from the latest world transforms.
    pub fn update(&mut self, entries: &[NodeEntry]) {
        for (matrix, bone) in self.matrices.iter_mut().zip(&self.bones) {
            *matrix = bone
                .and_then(|entry| entries.get(entry))
                .map(|entry| entry.world)
                .unwrap_or(Mat4::IDENTITY);
        }
    }

    /// Full palette of `MAX_BONES` matrices.
    pub fn matrices(&self) -> &[Mat4] {
        &self.matrices
    }
}
