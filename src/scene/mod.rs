pub mod animation;
pub mod armature;
pub mod draw;
pub mod material;
pub mod mesh;
pub mod model;
pub mod node;
pub mod texture;
pub mod vertex;

pub use draw::{DrawSink, DrawTransforms};
pub use material::{Material, ShaderSource};
pub use mesh::Mesh;
pub use node::{NodeEntry, NodeTree};
pub use model::{Model, RenderStats};
pub use texture::Texture;
