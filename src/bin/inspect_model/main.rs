use std::env;

use anyhow::{bail, Context as _};
use model_viewer::scene::{Model, NodeEntry};

fn depth(entries: &[NodeEntry], index: usize) -> usize {
    let mut depth = 0;
    let mut current = entries[index].parent;
    while let Some(parent) = current {
        depth += 1;
        current = entries[parent].parent;
    }
    depth
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: {} <model.gltf|model.glb>", args[0]);
    }
    let path = &args[1];
    let model = Model::load(path).with_context(|| format!("failed to load {path}"))?;

    let entries = model.entries();
    println!("nodes ({}):", model.tree().len());
    for (i, entry) in entries.iter().enumerate() {
        let Some(node) = model.tree().get(entry.node) else {
            continue;
        };
        let meshes = node
            .meshes
            .iter()
            .filter_map(|&m| model.meshes().get(m))
            .map(|m| format!("{} [{} tris, slot {}]", m.name, m.triangle_count(), m.material_slot))
            .collect::<Vec<_>>();
        println!(
            "{i:4} {:indent$}{} (parent {}){}",
            "",
            node.name,
            entry.parent_index(),
            if meshes.is_empty() {
                String::new()
            } else {
                format!(": {}", meshes.join(", "))
            },
            indent = depth(entries, i) * 2,
        );
    }

    let armature = model.armature();
    println!(
        "bones ({}, {} resolved):",
        armature.bone_count(),
        armature.resolved_count()
    );
    for bone in 0..armature.bone_count() {
        let target = armature
            .bone(bone)
            .and_then(|entry| entries.get(entry))
            .and_then(|entry| model.tree().get(entry.node))
            .map(|node| node.name.as_str())
            .unwrap_or("unresolved");
        println!("{bone:4} -> {target}");
    }

    println!("material slots: {}", model.material_slot_count());
    println!("textures: {}", model.textures().len());
    for texture in model.textures() {
        let (width, height) = texture.size();
        println!("  {} {width}x{height}", texture.name);
    }

    println!("animations ({}):", model.animations().len());
    for animation in model.animations() {
        let resolved = animation.tracks.iter().filter(|t| t.target.is_some()).count();
        println!(
            "  {} {:.2}s, {} tracks ({resolved} resolved)",
            animation.name,
            animation.duration,
            animation.tracks.len()
        );
    }
    Ok(())
}
