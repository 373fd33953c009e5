use glam::Mat4;

use crate::{
    error::DrawError,
    scene::{
        draw::{DrawSink, DrawTransforms},
        material::Material,
        mesh::Mesh,
    },
};

use super::bindgroups::{
    bones::BonesBinding,
    draw::{DrawBinding, DrawUniform},
};

/// Records draw calls for one frame into an open render pass.
pub struct FramePass<'a> {
    pass: wgpu::RenderPass<'a>,
    draws: &'a mut DrawBinding,
    bones: &'a mut BonesBinding,
    palette_offset: Option<u32>,
    draw_count: usize,
}

impl<'a> FramePass<'a> {
    pub fn new(
        pass: wgpu::RenderPass<'a>,
        draws: &'a mut DrawBinding,
        bones: &'a mut BonesBinding,
    ) -> Self {
        Self {
            pass,
            draws,
            bones,
            palette_offset: None,
            draw_count: 0,
        }
    }

    /// Ends the pass. Returns the number of draw calls recorded.
    pub fn finish(self) -> usize {
        self.draw_count
    }
}

impl DrawSink for FramePass<'_> {
    fn set_bone_matrices(&mut self, matrices: &[Mat4]) -> Result<(), DrawError> {
        self.palette_offset = None;
        self.palette_offset = Some(self.bones.push(matrices)?);
        Ok(())
    }

    fn draw_mesh(
        &mut self,
        mesh: &Mesh,
        material: &Material,
        transforms: &DrawTransforms,
    ) -> Result<(), DrawError> {
        let buffers = mesh
            .gpu()
            .ok_or_else(|| DrawError::MeshNotUploaded(mesh.name.clone()))?;
        let gpu = material
            .gpu()
            .ok_or_else(|| DrawError::MaterialNotUploaded(material.name.clone()))?;
        let palette_offset = self.palette_offset.ok_or(DrawError::PaletteNotBound)?;
        if buffers.index_count == 0 {
            return Ok(());
        }
        let uniform = DrawUniform::from(transforms);
        let draw_offset = self
            .draws
            .staging
            .push(bytemuck::bytes_of(&uniform))
            .ok_or(DrawError::DrawCapacity(self.draws.staging.capacity()))?;

        self.pass.set_pipeline(&gpu.pipeline);
        self.pass.set_bind_group(0, &self.draws.bind_group, &[draw_offset]);
        self.pass.set_bind_group(1, &self.bones.bind_group, &[palette_offset]);
        self.pass.set_bind_group(2, &gpu.binding.bind_group, &[]);
        self.pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
        self.pass
            .set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.pass.draw_indexed(0..buffers.index_count, 0, 0..1);
        self.draw_count += 1;
        Ok(())
    }
}
