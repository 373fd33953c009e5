use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to import {path}: {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("asset contains no scene")]
    MissingScene,
    #[error("mesh {mesh}: index count {count} is not a multiple of 3")]
    NotTriangulated { mesh: String, count: usize },
    #[error("mesh {mesh}: index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        mesh: String,
        index: u32,
        vertex_count: usize,
    },
    #[error("mesh {mesh}: attribute {attribute} has {actual} values, expected {expected}")]
    AttributeLength {
        mesh: String,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("mesh {mesh}: material slot {slot} out of range ({slots} slots)")]
    MaterialSlotOutOfRange { mesh: String, slot: usize, slots: usize },
    #[error("node {node} references mesh {mesh}, model has {mesh_count}")]
    MissingMesh {
        node: String,
        mesh: usize,
        mesh_count: usize,
    },
    #[error("mesh {mesh}: bone {bone} weights vertex {vertex}, mesh has {vertex_count}")]
    BoneVertexOutOfRange {
        mesh: String,
        bone: String,
        vertex: u32,
        vertex_count: usize,
    },
    #[error("expected {expected} materials, got {actual}")]
    MaterialCountMismatch { expected: usize, actual: usize },
    #[error("texture {name}: {len} bytes of pixel data for {width}x{height} RGBA")]
    TextureSize {
        name: String,
        width: u32,
        height: u32,
        len: usize,
    },
    #[error("failed to load texture {path}: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Per-frame failures. Logged by the caller, never fatal.
#[derive(Debug, Error, PartialEq)]
pub enum DrawError {
    #[error("mesh {0} has not been uploaded")]
    MeshNotUploaded(String),
    #[error("material {0} has not been uploaded")]
    MaterialNotUploaded(String),
    #[error("mesh {mesh} uses material slot {slot} which is unassigned")]
    MissingMaterial { mesh: String, slot: usize },
    #[error("draw uniform capacity of {0} draws per frame exhausted")]
    DrawCapacity(u32),
    #[error("bone palette capacity of {0} models per frame exhausted")]
    PaletteCapacity(u32),
    #[error("bone palette of {count} matrices exceeds {max}")]
    PaletteTooLarge { count: usize, max: usize },
    #[error("no bone palette bound before draw")]
    PaletteNotBound,
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shader {label} failed to compile: {message}")]
    Compile { label: String, message: String },
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
