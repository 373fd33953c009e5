use std::{collections::HashMap, path::Path};

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::{
    error::ModelError,
    scene::animation::{Animation, Channel, Interpolation, Track},
};

use super::{
    ImportedBone, ImportedMaterial, ImportedMesh, ImportedNode, ImportedScene, ImportedTexture,
    VertexWeight,
};

/// Name of the node inserted above the scene's top-level nodes.
pub const SCENE_ROOT: &str = "scene_root";

/// Reads a `.gltf` or `.glb` file into an `ImportedScene`.
///
/// Every primitive becomes its own mesh. The scene's top-level nodes are
/// gathered under a synthetic root so the model always has one.
pub fn load(path: impl AsRef<Path>) -> Result<ImportedScene, ModelError> {
    let path = path.as_ref();
    let (document, buffers, images) = gltf::import(path).map_err(|source| ModelError::Import {
        path: path.to_path_buf(),
        source,
    })?;
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(ModelError::MissingScene)?;

    // first skin attached to each glTF mesh
    let mut skin_of_mesh = HashMap::new();
    for node in document.nodes() {
        if let (Some(mesh), Some(skin)) = (node.mesh(), node.skin()) {
            skin_of_mesh.entry(mesh.index()).or_insert(skin);
        }
    }

    let mut meshes = vec![];
    // glTF mesh index -> imported mesh indices, one per primitive
    let mut primitives_of_mesh = vec![vec![]; document.meshes().len()];
    for mesh in document.meshes() {
        let skin = skin_of_mesh.get(&mesh.index());
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "skipping primitive {} of mesh {}: mode {:?} is not a triangle list",
                    primitive.index(),
                    mesh.index(),
                    primitive.mode()
                );
                continue;
            }
            primitives_of_mesh[mesh.index()].push(meshes.len());
            meshes.push(read_primitive(&mesh, &primitive, skin, &buffers));
        }
    }

    let mut root = ImportedNode::new(SCENE_ROOT, Mat4::IDENTITY);
    for node in scene.nodes() {
        root.children.push(read_node(&node, &primitives_of_mesh));
    }

    let textures: Vec<_> = images
        .iter()
        .enumerate()
        .map(|(index, image)| read_image(index, image))
        .collect();
    let materials = document.materials().map(read_material).collect();
    let animations = document
        .animations()
        .map(|animation| read_animation(&animation, &buffers))
        .collect();

    log::info!(
        "imported {}: {} nodes, {} meshes, {} materials, {} textures",
        path.display(),
        root.count(),
        meshes.len(),
        document.materials().len(),
        textures.len()
    );
    Ok(ImportedScene {
        meshes,
        root,
        materials,
        textures,
        animations,
    })
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

fn read_node(node: &gltf::Node, primitives_of_mesh: &[Vec<usize>]) -> ImportedNode {
    let meshes = node
        .mesh()
        .map(|mesh| primitives_of_mesh[mesh.index()].clone())
        .unwrap_or_default();
    let mut imported = ImportedNode::new(
        node_name(node),
        Mat4::from_cols_array_2d(&node.transform().matrix()),
    )
    .with_meshes(meshes);
    for child in node.children() {
        imported.children.push(read_node(&child, primitives_of_mesh));
    }
    imported
}

fn read_primitive(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    skin: Option<&gltf::Skin>,
    buffers: &[gltf::buffer::Data],
) -> ImportedMesh {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
    let name = match mesh.name() {
        Some(name) => format!("{name}.{}", primitive.index()),
        None => format!("mesh_{}.{}", mesh.index(), primitive.index()),
    };

    let positions: Vec<Vec3> = reader
        .read_positions()
        .map(|p| p.map(Vec3::from_array).collect())
        .unwrap_or_default();
    let normals = reader
        .read_normals()
        .map(|n| n.map(Vec3::from_array).collect());
    let tex_coords = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().map(Vec2::from_array).collect());
    let colors = reader
        .read_colors(0)
        .map(|c| c.into_rgb_f32().map(Vec3::from_array).collect());
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    if indices.len() % 3 != 0 {
        log::warn!("mesh {name}: dropping {} trailing indices", indices.len() % 3);
    }
    let faces = indices
        .chunks_exact(3)
        .map(|f| [f[0], f[1], f[2]])
        .collect();

    let bones = match (skin, reader.read_joints(0), reader.read_weights(0)) {
        (Some(skin), Some(joints), Some(weights)) => {
            let joints: Vec<[u16; 4]> = joints.into_u16().collect();
            let weights: Vec<[f32; 4]> = weights.into_f32().collect();
            read_bones(skin, &joints, &weights)
        }
        _ => vec![],
    };

    ImportedMesh {
        name,
        positions,
        normals,
        tex_coords,
        colors,
        faces,
        material_index: primitive.material().index(),
        bones,
    }
}

/// Regroups per-vertex joint/weight pairs into per-bone weight lists, in the
/// skin's joint order. Joints influencing no vertex are left out.
fn read_bones(skin: &gltf::Skin, joints: &[[u16; 4]], weights: &[[f32; 4]]) -> Vec<ImportedBone> {
    let mut bones: Vec<ImportedBone> = skin
        .joints()
        .map(|joint| ImportedBone {
            node_name: node_name(&joint),
            weights: vec![],
        })
        .collect();
    for (vertex, (joints, weights)) in joints.iter().zip(weights).enumerate() {
        for (&joint, &weight) in joints.iter().zip(weights) {
            if weight <= 0.0 {
                continue;
            }
            match bones.get_mut(joint as usize) {
                Some(bone) => bone.weights.push(VertexWeight {
                    vertex: vertex as u32,
                    weight,
                }),
                None => log::warn!("vertex {vertex} references joint {joint} outside its skin"),
            }
        }
    }
    bones.retain(|bone| !bone.weights.is_empty());
    bones
}

fn read_material(material: gltf::Material) -> ImportedMaterial {
    let pbr = material.pbr_metallic_roughness();
    ImportedMaterial {
        name: material
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("material_{}", material.index().unwrap_or_default())),
        base_color: Vec4::from_array(pbr.base_color_factor()),
        base_color_texture: pbr
            .base_color_texture()
            .map(|info| info.texture().source().index()),
    }
}

/// Narrows 16 bit channels to their high byte.
fn high_bytes(pixels: &[u8]) -> Vec<u8> {
    pixels
        .chunks_exact(2)
        .map(|c| (u16::from_ne_bytes([c[0], c[1]]) >> 8) as u8)
        .collect()
}

/// Expands 8 bit pixels with `channels` components to RGBA8.
fn expand_to_rgba(pixels: &[u8], channels: usize) -> Vec<u8> {
    match channels {
        4 => pixels.to_vec(),
        3 => pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        2 => pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[1], 0, 255])
            .collect(),
        _ => pixels.iter().flat_map(|&p| [p, p, p, 255]).collect(),
    }
}

/// Converts a decoded glTF image to RGBA8. Float images have no 8 bit
/// mapping and become a single white texel.
fn read_image(index: usize, image: &gltf::image::Data) -> ImportedTexture {
    use gltf::image::Format;

    let name = format!("image_{index}");
    let rgba = match image.format {
        Format::R8 => expand_to_rgba(&image.pixels, 1),
        Format::R8G8 => expand_to_rgba(&image.pixels, 2),
        Format::R8G8B8 => expand_to_rgba(&image.pixels, 3),
        Format::R8G8B8A8 => expand_to_rgba(&image.pixels, 4),
        Format::R16 => expand_to_rgba(&high_bytes(&image.pixels), 1),
        Format::R16G16 => expand_to_rgba(&high_bytes(&image.pixels), 2),
        Format::R16G16B16 => expand_to_rgba(&high_bytes(&image.pixels), 3),
        Format::R16G16B16A16 => expand_to_rgba(&high_bytes(&image.pixels), 4),
        format => {
            log::warn!("{name}: pixel format {format:?} not supported, using white");
            return ImportedTexture {
                name,
                width: 1,
                height: 1,
                rgba: vec![255; 4],
            };
        }
    };
    ImportedTexture {
        name,
        width: image.width,
        height: image.height,
        rgba,
    }
}

fn read_animation(animation: &gltf::Animation, buffers: &[gltf::buffer::Data]) -> Animation {
    use gltf::animation::util::ReadOutputs;

    let mut tracks: Vec<Track> = vec![];
    for channel in animation.channels() {
        let node_name = node_name(&channel.target().node());
        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(times) = reader.read_inputs() else {
            continue;
        };
        let times: Box<[f32]> = times.collect();
        let interpolation = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Linear => Interpolation::Linear,
            gltf::animation::Interpolation::Step => Interpolation::Step,
            gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
        };

        let index = match tracks.iter().position(|t| t.node_name == node_name) {
            Some(index) => index,
            None => {
                tracks.push(Track::new(node_name));
                tracks.len() - 1
            }
        };
        let track = &mut tracks[index];
        match reader.read_outputs() {
            Some(ReadOutputs::Translations(values)) => {
                track.translation = Some(Channel {
                    times,
                    values: values.map(Vec3::from_array).collect(),
                    interpolation,
                });
            }
            Some(ReadOutputs::Rotations(values)) => {
                track.rotation = Some(Channel {
                    times,
                    values: values.into_f32().map(Quat::from_array).collect(),
                    interpolation,
                });
            }
            Some(ReadOutputs::Scales(values)) => {
                track.scale = Some(Channel {
                    times,
                    values: values.map(Vec3::from_array).collect(),
                    interpolation,
                });
            }
            Some(ReadOutputs::MorphTargetWeights(_)) => {
                log::debug!("ignoring morph target channel on {}", track.node_name);
            }
            None => {}
        }
    }

    let name = animation
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("animation_{}", animation.index()));
    Animation::new(name, tracks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_import_error() {
        let err = load("does/not/exist.glb").err().unwrap();
        assert!(matches!(err, ModelError::Import { .. }));
    }

    #[test]
    fn rgb_images_are_expanded_to_rgba() {
        let image = gltf::image::Data {
            pixels: vec![10, 20, 30, 40, 50, 60],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };
        let texture = read_image(0, &image);
        assert_eq!(texture.rgba, [10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn sixteen_bit_rgba_keeps_high_bytes() {
        let pixels = [0x1234u16, 0xff00, 0x00ff, 0x8001]
            .iter()
            .flat_map(|c| c.to_ne_bytes())
            .collect();
        let image = gltf::image::Data {
            pixels,
            format: gltf::image::Format::R16G16B16A16,
            width: 1,
            height: 1,
        };
        let texture = read_image(0, &image);
        assert_eq!((texture.width, texture.height), (1, 1));
        assert_eq!(texture.rgba, [0x12, 0xff, 0x00, 0x80]);
    }

    #[test]
    fn sixteen_bit_gray_is_replicated() {
        let pixels = [0xabcdu16, 0x0100]
            .iter()
            .flat_map(|c| c.to_ne_bytes())
            .collect();
        let image = gltf::image::Data {
            pixels,
            format: gltf::image::Format::R16,
            width: 2,
            height: 1,
        };
        let texture = read_image(0, &image);
        assert_eq!(texture.rgba, [0xab, 0xab, 0xab, 255, 0x01, 0x01, 0x01, 255]);
    }

    #[test]
    fn float_images_fall_back_to_white() {
        let image = gltf::image::Data {
            pixels: vec![0; 24],
            format: gltf::image::Format::R32G32B32FLOAT,
            width: 2,
            height: 1,
        };
        let texture = read_image(3, &image);
        assert_eq!(texture.name, "image_3");
        assert_eq!((texture.width, texture.height), (1, 1));
        assert_eq!(texture.rgba, [255; 4]);
    }
}
