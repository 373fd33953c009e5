use std::{
    collections::{HashMap, HashSet},
    path::Path,
    rc::Rc,
};

use glam::Mat4;

use crate::{
    camera::CameraMatrices,
    error::{DrawError, ModelError},
    import::{gltf_import, ImportedMaterial, ImportedNode, ImportedScene},
};

use super::{
    animation::Animation,
    armature::Armature,
    draw::{DrawSink, DrawTransforms},
    material::{Material, ShaderSource},
    mesh::Mesh,
    node::{NodeEntry, NodeTree},
    texture::Texture,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub draws: usize,
    pub failed: usize,
}

/// Meshes whose last draw failed. A mesh is reported when it starts failing,
/// not on every frame it keeps failing.
#[derive(Default)]
struct DrawFailures {
    meshes: HashSet<usize>,
}

impl DrawFailures {
    /// True the first time `mesh` fails since its last successful draw.
    fn failed(&mut self, mesh: usize) -> bool {
        self.meshes.insert(mesh)
    }

    fn succeeded(&mut self, mesh: usize) {
        self.meshes.remove(&mesh);
    }
}

/// A loaded asset: geometry, hierarchy, skeleton and the materials it is
/// drawn with.
///
/// Fields drop in declaration order, so the node tree goes first and the
/// shared materials last.
pub struct Model {
    pub transform: Mat4,
    tree: NodeTree,
    entries: Vec<NodeEntry>,
    entries_by_name: HashMap<String, usize>,
    meshes: Vec<Mesh>,
    textures: Vec<Rc<Texture>>,
    animations: Vec<Animation>,
    armature: Armature,
    materials: Vec<Option<Rc<Material>>>,
    material_descs: Vec<ImportedMaterial>,
    draw_failures: DrawFailures,
}

impl Model {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        Self::from_import(gltf_import::load(path)?)
    }

    pub fn from_import(scene: ImportedScene) -> Result<Self, ModelError> {
        let slot_count = scene.material_slot_count();

        let mut meshes = Vec::with_capacity(scene.meshes.len());
        let mut bones_per_mesh = Vec::with_capacity(scene.meshes.len());
        for imported in &scene.meshes {
            let slot = scene.material_slot(imported.material_index);
            if slot >= slot_count {
                return Err(ModelError::MaterialSlotOutOfRange {
                    mesh: imported.name.clone(),
                    slot,
                    slots: slot_count,
                });
            }
            meshes.push(Mesh::new(
                imported.name.clone(),
                imported.vertices()?,
                imported.indices(),
                slot,
            )?);
        }
        for imported in scene.meshes {
            bones_per_mesh.push(imported.bones);
        }

        let tree = build_tree(&scene.root, meshes.len())?;
        let entries = tree.flatten();
        let entries_by_name = tree.index_by_name(&entries);
        let armature = Armature::build(&mut meshes, &bones_per_mesh, &entries_by_name)?;

        let textures = scene
            .textures
            .into_iter()
            .map(|t| Texture::from_import(t).map(Rc::new))
            .collect::<Result<Vec<_>, _>>()?;

        let mut animations = scene.animations;
        for animation in &mut animations {
            let missing = animation.resolve_targets(&entries_by_name);
            if missing > 0 {
                log::debug!("animation {}: {missing} tracks target no node", animation.name);
            }
        }

        log::debug!(
            "model built: {} nodes, {} meshes, {} bones, {} material slots",
            entries.len(),
            meshes.len(),
            armature.bone_count(),
            slot_count
        );

        let mut model = Self {
            transform: Mat4::IDENTITY,
            tree,
            entries,
            entries_by_name,
            meshes,
            textures,
            animations,
            armature,
            materials: vec![None; slot_count],
            material_descs: scene.materials,
            draw_failures: DrawFailures::default(),
        };
        model.update_world_transforms();
        Ok(model)
    }

    pub fn material_slot_count(&self) -> usize {
        self.materials.len()
    }

    /// Assigns one material per slot, in slot order.
    pub fn set_materials(&mut self, materials: Vec<Rc<Material>>) -> Result<(), ModelError> {
        if materials.len() != self.materials.len() {
            return Err(ModelError::MaterialCountMismatch {
                expected: self.materials.len(),
                actual: materials.len(),
            });
        }
        self.materials = materials.into_iter().map(Some).collect();
        Ok(())
    }

    /// Puts `material` in every slot.
    pub fn set_default_material(&mut self, material: Rc<Material>) {
        for slot in &mut self.materials {
            *slot = Some(material.clone());
        }
    }

    /// One material per slot, built from the asset's own material
    /// descriptions. The trailing default slot, if any, gets a plain white
    /// material.
    pub fn materials_from_import(&self, shader: &ShaderSource) -> Vec<Rc<Material>> {
        (0..self.materials.len())
            .map(|slot| {
                let material = match self.material_descs.get(slot) {
                    Some(desc) => {
                        let material = Material::new(desc.name.clone(), shader.clone())
                            .with_base_color(desc.base_color);
                        match desc.base_color_texture.and_then(|i| self.textures.get(i)) {
                            Some(texture) => material.with_texture(texture.clone()),
                            None => material,
                        }
                    }
                    None => Material::new("default", shader.clone()),
                };
                Rc::new(material)
            })
            .collect()
    }

    pub fn material(&self, slot: usize) -> Option<&Rc<Material>> {
        self.materials.get(slot).and_then(Option::as_ref)
    }

    /// Creates GPU buffers for every mesh and texture. Materials are uploaded
    /// separately since they need the pipeline cache.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        for mesh in &mut self.meshes {
            mesh.upload(device);
        }
        for texture in &self.textures {
            texture.upload(device, queue);
        }
    }

    pub fn update_world_transforms(&mut self) {
        self.tree.propagate(&mut self.entries, self.transform);
        self.armature.update(&self.entries);
    }

    /// Propagates transforms, hands the bone palette to `sink`, then draws
    /// every mesh of every node in pre-order. Failed draws are skipped and
    /// logged once per mesh until it draws again.
    pub fn render(&mut self, camera: &CameraMatrices, sink: &mut dyn DrawSink) -> RenderStats {
        self.update_world_transforms();
        let mut stats = RenderStats::default();

        if let Err(e) = sink.set_bone_matrices(self.armature.matrices()) {
            log::warn!("bone palette not bound: {e}");
        }

        for entry in &self.entries {
            let Some(node) = self.tree.get(entry.node) else {
                continue;
            };
            let transforms = DrawTransforms::new(entry.world, camera);
            for &mesh_index in &node.meshes {
                let Some(mesh) = self.meshes.get(mesh_index) else {
                    continue;
                };
                let result = match self.material(mesh.material_slot) {
                    Some(material) => sink.draw_mesh(mesh, material, &transforms),
                    None => Err(DrawError::MissingMaterial {
                        mesh: mesh.name.clone(),
                        slot: mesh.material_slot,
                    }),
                };
                match result {
                    Ok(()) => {
                        self.draw_failures.succeeded(mesh_index);
                        stats.draws += 1;
                    }
                    Err(e) => {
                        if self.draw_failures.failed(mesh_index) {
                            log::warn!("skipping {} on node {}: {e}", mesh.name, node.name);
                        }
                        stats.failed += 1;
                    }
                }
            }
        }
        stats
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn entries(&self) -> &[NodeEntry] {
        &self.entries
    }

    /// First entry in pre-order with this name.
    pub fn entry_index(&self, name: &str) -> Option<usize> {
        self.entries_by_name.get(name).copied()
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn textures(&self) -> &[Rc<Texture>] {
        &self.textures
    }

    pub fn armature(&self) -> &Armature {
        &self.armature
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn animation(&self, name: &str) -> Option<&Animation> {
        self.animations.iter().find(|a| a.name == name)
    }
}

/// Copies the imported hierarchy into a `NodeTree`, top-down, checking mesh
/// references on the way.
fn build_tree(root: &ImportedNode, mesh_count: usize) -> Result<NodeTree, ModelError> {
    let check_meshes = |node: &ImportedNode| match node.meshes.iter().find(|&&m| m >= mesh_count) {
        Some(&mesh) => Err(ModelError::MissingMesh {
            node: node.name.clone(),
            mesh,
            mesh_count,
        }),
        None => Ok(()),
    };

    check_meshes(root)?;
    let mut tree = NodeTree::new(root.name.clone(), root.transform, root.meshes.clone());
    let mut stack = vec![(root, tree.root())];
    while let Some((node, id)) = stack.pop() {
        for child in &node.children {
            check_meshes(child)?;
            let Some(child_id) =
                tree.add_child(id, child.name.clone(), child.transform, child.meshes.clone())
            else {
                continue;
            };
            stack.push((child, child_id));
        }
    }
    Ok(tree)
}
