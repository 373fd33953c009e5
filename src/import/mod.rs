//! Read-only description of a parsed asset, independent of the file format.
//!
//! `gltf_import` fills these from a glTF file; tests build them by hand.
//! A `Model` consumes the whole scene during its build phase.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::{error::ModelError, scene::{animation::Animation, vertex::Vertex}};

pub mod gltf_import;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexWeight {
    pub vertex: u32,
    pub weight: f32,
}

/// Influence list of one bone over one mesh, keyed by node name.
#[derive(Clone, Debug)]
pub struct ImportedBone {
    pub node_name: String,
    pub weights: Vec<VertexWeight>,
}

#[derive(Clone, Debug, Default)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub tex_coords: Option<Vec<Vec2>>,
    pub colors: Option<Vec<Vec3>>,
    pub faces: Vec<[u32; 3]>,
    /// `None` selects the default material slot.
    pub material_index: Option<usize>,
    pub bones: Vec<ImportedBone>,
}

#[derive(Clone, Debug)]
pub struct ImportedNode {
    pub name: String,
    pub transform: Mat4,
    pub meshes: Vec<usize>,
    pub children: Vec<ImportedNode>,
}

#[derive(Clone, Debug)]
pub struct ImportedMaterial {
    pub name: String,
    pub base_color: Vec4,
    pub base_color_texture: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct ImportedTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub struct ImportedScene {
    pub meshes: Vec<ImportedMesh>,
    pub root: ImportedNode,
    pub materials: Vec<ImportedMaterial>,
    pub textures: Vec<ImportedTexture>,
    pub animations: Vec<Animation>,
}

impl ImportedNode {
    pub fn new(name: impl Into<String>, transform: Mat4) -> Self {
        Self {
            name: name.into(),
            transform,
            meshes: vec![],
            children: vec![],
        }
    }

    pub fn with_meshes(mut self, meshes: Vec<usize>) -> Self {
        self.meshes = meshes;
        self
    }

    pub fn with_child(mut self, child: ImportedNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ImportedNode::count).sum::<usize>()
    }
}

impl ImportedScene {
    pub fn new(root: ImportedNode) -> Self {
        Self {
            meshes: vec![],
            root,
            materials: vec![],
            textures: vec![],
            animations: vec![],
        }
    }

    /// One slot per material, plus a trailing default slot when some mesh
    /// names no material.
    pub fn material_slot_count(&self) -> usize {
        let needs_default = self.meshes.iter().any(|m| m.material_index.is_none());
        self.materials.len() + needs_default as usize
    }

    pub fn material_slot(&self, material_index: Option<usize>) -> usize {
        material_index.unwrap_or(self.materials.len())
    }
}

impl ImportedMesh {
    /// Interleaves the attribute streams. Missing texture coordinates and
    /// colors default to ones, missing normals are generated from the faces.
    pub fn vertices(&self) -> Result<Vec<Vertex>, ModelError> {
        let count = self.positions.len();
        self.check_len("normals", self.normals.as_ref().map(Vec::len))?;
        self.check_len("tex_coords", self.tex_coords.as_ref().map(Vec::len))?;
        self.check_len("colors", self.colors.as_ref().map(Vec::len))?;

        let generated;
        let normals = match &self.normals {
            Some(normals) => normals,
            None => {
                generated = generate_normals(&self.positions, &self.faces);
                &generated
            }
        };

        Ok((0..count)
            .map(|i| {
                Vertex::new(
                    self.positions[i],
                    normals[i],
                    self.tex_coords.as_ref().map_or(Vec2::ONE, |t| t[i]),
                    self.colors.as_ref().map_or(Vec3::ONE, |c| c[i]),
                )
            })
            .collect())
    }

    pub fn indices(&self) -> Vec<u32> {
        self.faces.iter().flatten().copied().collect()
    }

    fn check_len(&self, attribute: &'static str, len: Option<usize>) -> Result<(), ModelError> {
        match len {
            Some(actual) if actual != self.positions.len() => Err(ModelError::AttributeLength {
                mesh: self.name.clone(),
                attribute,
                expected: self.positions.len(),
                actual,
            }),
            _ => Ok(()),
        }
    }
}

/// Smooth normals, each face contributing its area-weighted normal to its
/// corners.
pub fn generate_normals(positions: &[Vec3], faces: &[[u32; 3]]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for face in faces {
        let [a, b, c] = face.map(|i| i as usize);
        let (Some(&pa), Some(&pb), Some(&pc)) = (positions.get(a), positions.get(b), positions.get(c))
        else {
            continue;
        };
        let n = (pb - pa).cross(pc - pa);
        normals[a] += n;
        normals[b] += n;
        normals[c] += n;
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Z))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> ImportedMesh {
        ImportedMesh {
            name: "tri".into(),
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            faces: vec![[0, 1, 2]],
            ..Default::default()
        }
    }

    #[test]
    fn missing_attributes_use_defaults() {
        let vertices = triangle().vertices().unwrap();
        assert_eq!(vertices.len(), 3);
        for v in &vertices {
            assert_eq!(v.tex_coords, [1.0, 1.0]);
            assert_eq!(v.color, [1.0, 1.0, 1.0]);
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
            assert_eq!(v.influence_count(), 0);
        }
    }

    #[test]
    fn mismatched_attribute_is_rejected() {
        let mut mesh = triangle();
        mesh.colors = Some(vec![Vec3::ONE; 2]);
        let err = mesh.vertices().err().unwrap();
        assert!(matches!(
            err,
            ModelError::AttributeLength { attribute: "colors", expected: 3, actual: 2, .. }
        ));
    }

    #[test]
    fn default_slot_follows_imported_materials() {
        let mut scene = ImportedScene::new(ImportedNode::new("root", Mat4::IDENTITY));
        scene.materials.push(ImportedMaterial {
            name: "paint".into(),
            base_color: Vec4::ONE,
            base_color_texture: None,
        });
        scene.meshes.push(ImportedMesh { material_index: Some(0), ..triangle() });
        assert_eq!(scene.material_slot_count(), 1);
        scene.meshes.push(triangle());
        assert_eq!(scene.material_slot_count(), 2);
        assert_eq!(scene.material_slot(None), 1);
        assert_eq!(scene.material_slot(Some(0)), 0);
    }

    #[test]
    fn generated_normals_follow_counter_clockwise_winding() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Z, Vec3::new(5.0, 5.0, 5.0)];
        let normals = generate_normals(&positions, &[[0, 2, 1]]);
        assert!(normals[0].abs_diff_eq(Vec3::Y, 1e-6));
        assert!((normals[1].length() - 1.0).abs() < 1e-6);

        // reversed winding flips the normal
        let flipped = generate_normals(&positions, &[[0, 1, 2]]);
        let expected = (positions[1] - positions[0]).cross(positions[2] - positions[0]).normalize();
        assert!(flipped[0].abs_diff_eq(expected, 1e-6));
        assert!(flipped[0].abs_diff_eq(Vec3::NEG_Y, 1e-6));
        // unreferenced vertex falls back
        assert_eq!(normals[3], Vec3::Z);
    }

    #[test]
    fn node_count_includes_descendants() {
        let root = ImportedNode::new("root", Mat4::IDENTITY)
            .with_child(ImportedNode::new("a", Mat4::IDENTITY).with_child(ImportedNode::new("b", Mat4::IDENTITY)))
            .with_child(ImportedNode::new("c", Mat4::IDENTITY));
        assert_eq!(root.count(), 4);
    }
}
