use std::{
    alloc::{GlobalAlloc, Layout, System},
    cell::Cell,
    rc::Rc,
};

use glam::{Mat4, Vec3, Vec4};
use model_viewer::{
    import::{
        ImportedBone, ImportedMaterial, ImportedMesh, ImportedNode, ImportedScene, ImportedTexture,
        VertexWeight,
    },
    scene::{Material, Model, ShaderSource},
};

/// Counts live heap bytes per thread, so tests running in parallel do not
/// see each other's allocations.
struct Counting;

thread_local! {
    static LIVE: Cell<isize> = const { Cell::new(0) };
}

fn track(delta: isize) {
    let _ = LIVE.try_with(|live| live.set(live.get() + delta));
}

fn live_bytes() -> isize {
    LIVE.with(Cell::get)
}

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            track(layout.size() as isize);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        track(-(layout.size() as isize));
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new = unsafe { System.realloc(ptr, layout, new_size) };
        if !new.is_null() {
            track(new_size as isize - layout.size() as isize);
        }
        new
    }
}

#[global_allocator]
static ALLOCATOR: Counting = Counting;

fn scene() -> ImportedScene {
    let root = ImportedNode::new("root", Mat4::IDENTITY).with_child(
        ImportedNode::new("body", Mat4::from_translation(Vec3::Y))
            .with_meshes(vec![0, 1])
            .with_child(ImportedNode::new("bone", Mat4::IDENTITY)),
    );
    let mut skinned = ImportedMesh {
        name: "skinned".into(),
        positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        faces: vec![[0, 1, 2]],
        material_index: Some(0),
        ..Default::default()
    };
    skinned.bones = vec![ImportedBone {
        node_name: "bone".into(),
        weights: vec![VertexWeight { vertex: 0, weight: 1.0 }],
    }];
    let plain = ImportedMesh {
        name: "plain".into(),
        positions: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
        faces: vec![[0, 1, 2]],
        ..Default::default()
    };

    let mut scene = ImportedScene::new(root);
    scene.meshes = vec![skinned, plain];
    scene.materials = vec![ImportedMaterial {
        name: "painted".into(),
        base_color: Vec4::ONE,
        base_color_texture: Some(0),
    }];
    scene.textures = vec![ImportedTexture {
        name: "checker".into(),
        width: 2,
        height: 2,
        rgba: vec![255; 16],
    }];
    scene
}

#[test]
fn dropping_a_model_releases_everything_it_built() {
    let before = live_bytes();
    {
        let mut model = Model::from_import(scene()).unwrap();
        let materials = model.materials_from_import(&ShaderSource::Builtin);
        model.set_materials(materials).unwrap();
        model.update_world_transforms();
        assert!(live_bytes() > before);
    }
    assert_eq!(live_bytes(), before);
}

#[test]
fn shared_material_outlives_model() {
    let mut model = Model::from_import(scene()).unwrap();
    assert_eq!(model.material_slot_count(), 2);

    let shared = Rc::new(Material::new("shared", ShaderSource::Builtin));
    model.set_default_material(shared.clone());
    assert_eq!(Rc::strong_count(&shared), 3);

    drop(model);
    assert_eq!(Rc::strong_count(&shared), 1);
    assert_eq!(shared.name, "shared");
}

#[test]
fn reassigning_materials_releases_the_old_ones() {
    let mut model = Model::from_import(scene()).unwrap();
    let first = Rc::new(Material::new("first", ShaderSource::Builtin));
    model.set_default_material(first.clone());
    let second = Rc::new(Material::new("second", ShaderSource::Builtin));
    model.set_default_material(second.clone());
    assert_eq!(Rc::strong_count(&first), 1);
    assert_eq!(Rc::strong_count(&second), 3);
}

#[test]
fn imported_textures_die_with_their_last_user() {
    let mut model = Model::from_import(scene()).unwrap();
    let texture = Rc::downgrade(&model.textures()[0]);
    let materials = model.materials_from_import(&ShaderSource::Builtin);
    model.set_materials(materials).unwrap();
    assert_eq!(texture.strong_count(), 2);

    let material = model.material(0).unwrap().clone();
    drop(model);
    assert!(texture.upgrade().is_some());
    drop(material);
    assert!(texture.upgrade().is_none());
}
