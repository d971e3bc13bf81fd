//! GPU-resident mesh: vertex/index buffers plus the draw count.

use asset::MeshData;
use bytemuck::{Pod, Zeroable};
use wgpu::{
    Buffer, BufferUsages, Device, VertexBufferLayout, VertexStepMode, util::DeviceExt,
};

use crate::error::{RenderError, RenderResult};

/// Vertex as uploaded: position only, attribute slot 0.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

impl Vertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
    };
}

/// Handle to an uploaded mesh. The buffers are released when the handle
/// drops, so mesh lifetime is scoped rather than leaked at exit.
pub struct GpuMesh {
    pub(crate) vertex_buf: Buffer,
    pub(crate) index_buf: Buffer,
    pub(crate) index_count: u32,
}

impl GpuMesh {
    /// Upload CPU mesh data into fresh vertex/index buffers.
    ///
    /// Allocation runs inside an out-of-memory error scope; on failure no
    /// handle is produced.
    pub fn upload(device: &Device, data: &MeshData) -> RenderResult<Self> {
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let vertices: Vec<Vertex> = data
            .positions
            .iter()
            .map(|&position| Vertex { position })
            .collect();
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh VB"),
            contents: bytemuck::cast_slice(&vertices),
            usage: BufferUsages::VERTEX,
        });
        let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh IB"),
            contents: bytemuck::cast_slice(&data.triangles),
            usage: BufferUsages::INDEX,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::GpuResourceExhausted(err.to_string()));
        }

        log::info!(
            "Uploaded mesh: {} vertices, {} indices",
            vertices.len(),
            data.index_count()
        );
        Ok(Self {
            vertex_buf,
            index_buf,
            index_count: data.index_count(),
        })
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}
