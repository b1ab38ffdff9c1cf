//! Textured-quad pipeline for the rotated image preview.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::{BindGroupLayoutBuilder, PipelineBuilder, ShaderDescriptor};
use crate::bindings::preview::*;
use crate::context::GpuContext;
use crate::texture::Texture;
use crate::uniform::PreviewUniform;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        POSITION_LOCATION => Float32x2,
        TEX_COORD_LOCATION => Float32x2
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Unit quad drawn as a triangle strip; image row 0 maps to the top edge.
pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex { position: [-1.0, -1.0], tex_coords: [0.0, 1.0] }, // Bottom-left
    Vertex { position: [1.0, -1.0], tex_coords: [1.0, 1.0] },  // Bottom-right
    Vertex { position: [-1.0, 1.0], tex_coords: [0.0, 0.0] },  // Top-left
    Vertex { position: [1.0, 1.0], tex_coords: [1.0, 0.0] },   // Top-right
];

pub struct PreviewPipeline {
    pub render_pipeline: wgpu::RenderPipeline,
    pub vertex_buffer: wgpu::Buffer,
    pub uniform_buffer: wgpu::Buffer,
    pub uniform_bind_group: wgpu::BindGroup,
    pub texture_bind_group_layout: wgpu::BindGroupLayout,
}

impl PreviewPipeline {
    /// Build the pipeline. Compilation problems surface as wgpu validation
    /// errors; callers wrap this in an error scope.
    pub fn new(ctx: &GpuContext, shader: &ShaderDescriptor) -> Self {
        let module = shader.create_module(&ctx.device);

        let uniform_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Preview Camera Buffer"),
            contents: bytemuck::cast_slice(&[PreviewUniform::new()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout = BindGroupLayoutBuilder::new(&ctx.device)
            .with_label("Preview Camera Layout")
            .add_uniform_buffer(UNIFORM_CAMERA_BINDING, wgpu::ShaderStages::VERTEX)
            .build();

        let texture_bind_group_layout = BindGroupLayoutBuilder::new(&ctx.device)
            .with_label("Preview Texture Layout")
            .add_texture_2d(TEXTURE_BINDING, wgpu::ShaderStages::FRAGMENT)
            .add_sampler(SAMPLER_BINDING, wgpu::ShaderStages::FRAGMENT)
            .build();

        let uniform_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Preview Camera Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: UNIFORM_CAMERA_BINDING,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let render_pipeline = PipelineBuilder::new(&ctx.device, ctx.format(), &module, shader)
            .with_label("Preview Render Pipeline")
            .with_vertex_buffer(Vertex::desc())
            .with_bind_group_layouts(&[&uniform_bind_group_layout, &texture_bind_group_layout])
            .with_blend_state(wgpu::BlendState::REPLACE)
            .with_topology(wgpu::PrimitiveTopology::TriangleStrip)
            .build();

        let vertex_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Preview Quad Buffer"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            render_pipeline,
            vertex_buffer,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group_layout,
        }
    }

    /// Create bind group for a texture
    pub fn create_texture_bind_group(&self, ctx: &GpuContext, texture: &Texture) -> wgpu::BindGroup {
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Preview Texture Bind Group"),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: TEXTURE_BINDING,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        })
    }

    pub fn update_camera(&self, ctx: &GpuContext, uniform: PreviewUniform) {
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Clear the target and draw the quad.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        texture_bind_group: &wgpu::BindGroup,
        clear_color: wgpu::Color,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Preview Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(UNIFORM_GROUP, &self.uniform_bind_group, &[]);
        render_pass.set_bind_group(TEXTURE_GROUP, texture_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_covers_unit_square() {
        let xs: Vec<f32> = QUAD_VERTICES.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = QUAD_VERTICES.iter().map(|v| v.position[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), -1.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 1.0);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), -1.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 1.0);
    }

    #[test]
    fn test_top_edge_samples_first_image_row() {
        for v in QUAD_VERTICES.iter() {
            let expected_v = if v.position[1] > 0.0 { 0.0 } else { 1.0 };
            assert_eq!(v.tex_coords[1], expected_v);
        }
    }

    #[test]
    fn test_vertex_stride() {
        assert_eq!(Vertex::desc().array_stride, 16);
    }
}
