use bytemuck::{Pod, Zeroable};
use gl::types::*;
use std::mem;
use std::ptr;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

pub const TRIANGLE_VERTICES: [Vertex; 3] = [
    Vertex { position: [-0.5, -0.5, 0.0] },
    Vertex { position: [0.0, 0.5, 0.0] },
    Vertex { position: [0.5, -0.5, 0.0] },
];

/// Attribute slot the vertex shader reads positions from.
pub const POSITION_ATTRIBUTE: GLuint = 0;

/// Static triangle living in a VAO/VBO pair.
pub struct TriangleMesh {
    vao: GLuint,
    vbo: GLuint,
    vertex_count: GLsizei,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::from_vertices(&TRIANGLE_VERTICES)
    }

    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);

        let mut vao = 0;
        let mut vbo = 0;
        unsafe {
            gl::GenVertexArrays(1, &mut vao);
            gl::BindVertexArray(vao);

            gl::GenBuffers(1, &mut vbo);
            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                bytes.len() as GLsizeiptr,
                bytes.as_ptr() as *const _,
                gl::STATIC_DRAW,
            );

            gl::VertexAttribPointer(
                POSITION_ATTRIBUTE,
                3,
                gl::FLOAT,
                gl::FALSE,
                mem::size_of::<Vertex>() as GLsizei,
                ptr::null(),
            );
        }

        log::debug!("Uploaded {} vertices (vao {}, vbo {})", vertices.len(), vao, vbo);

        Self {
            vao,
            vbo,
            vertex_count: vertices.len() as GLsizei,
        }
    }

    pub fn vertex_count(&self) -> GLsizei {
        self.vertex_count
    }

    pub fn draw(&self) {
        unsafe {
            gl::BindVertexArray(self.vao);
            gl::EnableVertexAttribArray(POSITION_ATTRIBUTE);
            gl::DrawArrays(gl::TRIANGLES, 0, self.vertex_count);
            gl::DisableVertexAttribArray(POSITION_ATTRIBUTE);
        }
    }
}

impl Drop for TriangleMesh {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteBuffers(1, &self.vbo);
            gl::DeleteVertexArrays(1, &self.vao);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_is_tightly_packed() {
        assert_eq!(mem::size_of::<Vertex>(), 3 * mem::size_of::<f32>());
        let bytes: &[u8] = bytemuck::cast_slice(&TRIANGLE_VERTICES);
        assert_eq!(bytes.len(), 9 * mem::size_of::<f32>());
    }

    #[test]
    fn test_triangle_is_not_degenerate() {
        // Twice the signed area; clockwise from +Z.
        let [a, b, c] = TRIANGLE_VERTICES.map(|v| v.position);
        let area = (b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1]);
        assert_eq!(area.abs(), 1.0);
    }
}
