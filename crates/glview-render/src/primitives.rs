//! Vertex layout and mesh conversion

use bytemuck::{Pod, Zeroable};
use glview_import::ImportedMesh;

/// A vertex with position, normal, color, and UV coordinates
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x4,
        3 => Float32x2,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// A mesh with vertices and indices
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Interleave an imported mesh. Missing attributes default to white and
    /// zero UVs.
    pub fn from_imported(mesh: &ImportedMesh) -> Self {
        let vertices = mesh
            .positions
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex {
                position,
                normal: mesh.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                color: mesh.colors.get(i).copied().unwrap_or([1.0; 4]),
                uv: mesh.uvs.get(i).copied().unwrap_or([0.0; 2]),
            })
            .collect();

        Self {
            vertices,
            indices: mesh.indices.clone(),
        }
    }

    /// Horizontal square centred on the Y axis at height `y`, facing up
    pub fn ground_quad(y: f32, half_size: f32) -> Self {
        let corner = |x: f32, z: f32, u: f32, v: f32| Vertex {
            position: [x, y, z],
            normal: [0.0, 1.0, 0.0],
            color: [1.0; 4],
            uv: [u, v],
        };
        Self {
            vertices: vec![
                corner(-half_size, -half_size, 0.0, 0.0),
                corner(half_size, -half_size, 1.0, 0.0),
                corner(half_size, half_size, 1.0, 1.0),
                corner(-half_size, half_size, 0.0, 1.0),
            ],
            // Counter-clockwise seen from above
            indices: vec![0, 2, 1, 0, 3, 2],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_stride() {
        assert_eq!(std::mem::size_of::<Vertex>(), 48);
        assert_eq!(Vertex::desc().array_stride, 48);
    }

    #[test]
    fn test_from_imported_fills_defaults() {
        let imported = ImportedMesh {
            name: "tri".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            uvs: vec![],
            colors: vec![],
            indices: vec![0, 1, 2],
            material_index: None,
        };
        let mesh = Mesh::from_imported(&imported);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[1].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[1].color, [1.0; 4]);
        assert_eq!(mesh.vertices[1].uv, [0.0, 0.0]);
    }

    #[test]
    fn test_ground_quad_faces_up() {
        let quad = Mesh::ground_quad(-1.4, 5.0);
        assert_eq!(quad.triangle_count(), 2);
        for tri in quad.indices.chunks(3) {
            let p = |i: u32| glam::Vec3::from_array(quad.vertices[i as usize].position);
            let n = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(n.y > 0.0);
        }
        assert!(quad.vertices.iter().all(|v| v.position[1] == -1.4));
    }
}
