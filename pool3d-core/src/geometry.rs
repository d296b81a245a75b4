/// Procedural mesh builders: UV sphere, cube and flat quad
use nalgebra::{Point3, Vector3};
use std::f32::consts::PI;

use crate::error::{Result, SceneError};

/// A 3D vertex with position, normal and texture coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub texcoord: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], texcoord: [f32; 2]) -> Self {
        Self {
            position: Point3::from(position),
            normal: Vector3::from(normal),
            texcoord,
        }
    }
}

/// A triangle face resolved from a mesh's index buffer
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from the winding order; zero for degenerate (pole) triangles.
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1
            .cross(&edge2)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }
}

/// Immutable indexed triangle mesh.
///
/// Indices are grouped in triples and are 16-bit, so a mesh holds at most 65536 vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl Mesh {
    fn from_parts(vertices: Vec<Vertex>, indices: Vec<u16>) -> Self {
        Self { vertices, indices }
    }

    /// UV sphere walking latitude over `[0, pi]` and longitude over `[0, 2pi]`.
    ///
    /// Produces `(lat + 1) * (long + 1)` vertices and `2 * lat * long` triangles; the
    /// triangles touching the poles have zero area.
    pub fn uv_sphere(latitude_bands: u32, longitude_bands: u32, radius: f32) -> Result<Self> {
        let vertex_count = Self::sphere_vertex_count(latitude_bands, longitude_bands)?;

        let mut vertices = Vec::with_capacity(vertex_count);
        for lat in 0..=latitude_bands {
            let theta = lat as f32 * PI / latitude_bands as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();

            for long in 0..=longitude_bands {
                let phi = long as f32 * 2.0 * PI / longitude_bands as f32;
                let (sin_phi, cos_phi) = phi.sin_cos();

                let normal = [cos_phi * sin_theta, cos_theta, sin_phi * sin_theta];
                let u = 1.0 - long as f32 / longitude_bands as f32;
                let v = 1.0 - lat as f32 / latitude_bands as f32;
                vertices.push(Vertex::new(
                    [radius * normal[0], radius * normal[1], radius * normal[2]],
                    normal,
                    [u, v],
                ));
            }
        }

        let mut indices =
            Vec::with_capacity(latitude_bands as usize * longitude_bands as usize * 6);
        for lat in 0..latitude_bands {
            for long in 0..longitude_bands {
                let first = (lat * (longitude_bands + 1) + long) as u16;
                let second = first + longitude_bands as u16 + 1;
                indices.extend_from_slice(&[first, second, first + 1]);
                indices.extend_from_slice(&[second, second + 1, first + 1]);
            }
        }

        Ok(Self::from_parts(vertices, indices))
    }

    /// Vertex count of a UV sphere, checked against the 16-bit index range.
    ///
    /// Counted in `u64`: band counts near `u32::MAX` must not wrap on 32-bit targets.
    pub fn sphere_vertex_count(latitude_bands: u32, longitude_bands: u32) -> Result<usize> {
        if latitude_bands == 0 || longitude_bands == 0 {
            return Err(SceneError::InvalidConfig(format!(
                "sphere bands must be at least 1, got {latitude_bands}x{longitude_bands}"
            )));
        }
        let count = (u64::from(latitude_bands) + 1).saturating_mul(u64::from(longitude_bands) + 1);
        if count > u64::from(u16::MAX) + 1 {
            return Err(SceneError::MeshTooLarge(count));
        }
        Ok(count as usize)
    }

    /// Axis-aligned cube of edge `size` centred on the origin.
    ///
    /// Faces do not share vertices so every face keeps a flat normal: 24 vertices, 12 triangles.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        // (normal, four corners counter-clockwise seen from outside)
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]]),
            ([0.0, 0.0, -1.0], [[-h, -h, -h], [-h, h, -h], [h, h, -h], [h, -h, -h]]),
            ([0.0, 1.0, 0.0], [[-h, h, -h], [-h, h, h], [h, h, h], [h, h, -h]]),
            ([0.0, -1.0, 0.0], [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]]),
            ([1.0, 0.0, 0.0], [[h, -h, -h], [h, h, -h], [h, h, h], [h, -h, h]]),
            ([-1.0, 0.0, 0.0], [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]]),
        ];
        let corner_uv = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (face, (normal, corners)) in faces.iter().enumerate() {
            let base = (face * 4) as u16;
            for (corner, uv) in corners.iter().zip(corner_uv) {
                vertices.push(Vertex::new(*corner, *normal, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::from_parts(vertices, indices)
    }

    /// Horizontal quad at height `y` spanning `[-half_width, half_width] x [-half_depth, half_depth]`,
    /// facing +Y. Used for the table surface.
    pub fn quad(half_width: f32, half_depth: f32, y: f32) -> Self {
        let up = [0.0, 1.0, 0.0];
        let vertices = vec![
            Vertex::new([-half_width, y, half_depth], up, [0.0, 0.0]),
            Vertex::new([half_width, y, half_depth], up, [1.0, 0.0]),
            Vertex::new([half_width, y, -half_depth], up, [1.0, 1.0]),
            Vertex::new([-half_width, y, -half_depth], up, [0.0, 1.0]),
        ];
        Self::from_parts(vertices, vec![0, 1, 2, 0, 2, 3])
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Positions flattened to `[x, y, z, ...]` for buffer upload.
    pub fn positions_flat(&self) -> Vec<f32> {
        self.vertices
            .iter()
            .flat_map(|v| [v.position.x, v.position.y, v.position.z])
            .collect()
    }

    pub fn normals_flat(&self) -> Vec<f32> {
        self.vertices
            .iter()
            .flat_map(|v| [v.normal.x, v.normal.y, v.normal.z])
            .collect()
    }

    pub fn texcoords_flat(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.texcoord).collect()
    }

    /// Resolves the index buffer into triangles.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            Triangle::new(
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_counts() {
        for n in [1u32, 4, 16, 30] {
            let mesh = Mesh::uv_sphere(n, n, 0.2).unwrap();
            let n = n as usize;
            assert_eq!(mesh.vertices.len(), (n + 1) * (n + 1));
            assert_eq!(mesh.triangle_count(), 2 * n * n);
            assert_eq!(mesh.index_count(), 6 * n * n);
        }
    }

    #[test]
    fn test_sphere_vertices_on_surface() {
        let radius = 0.2;
        let mesh = Mesh::uv_sphere(12, 18, radius).unwrap();
        for v in &mesh.vertices {
            assert!((v.position.coords.norm() - radius).abs() < 1e-5);
            assert!((v.normal.norm() - 1.0).abs() < 1e-5);
        }
        // North pole first, south pole last.
        assert!((mesh.vertices[0].position.y - radius).abs() < 1e-6);
        assert!((mesh.vertices.last().unwrap().position.y + radius).abs() < 1e-6);
        assert_eq!(mesh.vertices[0].texcoord, [1.0, 1.0]);
    }

    #[test]
    fn test_sphere_winding_is_consistent() {
        let mesh = Mesh::uv_sphere(8, 8, 1.0).unwrap();
        let signs: Vec<bool> = mesh
            .triangles()
            .filter_map(|tri| {
                let normal = tri.calculate_normal();
                if normal == Vector3::zeros() {
                    return None; // pole
                }
                let centroid = (tri.vertices[0].position.coords
                    + tri.vertices[1].position.coords
                    + tri.vertices[2].position.coords)
                    / 3.0;
                Some(normal.dot(&centroid) > 0.0)
            })
            .collect();
        assert!(!signs.is_empty());
        assert!(signs.iter().all(|s| *s == signs[0]));
    }

    #[test]
    fn test_sphere_too_large() {
        assert!(matches!(
            Mesh::uv_sphere(300, 300, 1.0),
            Err(SceneError::MeshTooLarge(_))
        ));
    }

    #[test]
    fn test_sphere_zero_bands_rejected() {
        assert!(matches!(
            Mesh::uv_sphere(0, 4, 1.0),
            Err(SceneError::InvalidConfig(_))
        ));
        assert!(matches!(
            Mesh::uv_sphere(4, 0, 1.0),
            Err(SceneError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_sphere_max_bands_rejected_without_wrapping() {
        assert!(matches!(
            Mesh::sphere_vertex_count(u32::MAX, 1),
            Err(SceneError::MeshTooLarge(count)) if count == 2 * (u64::from(u32::MAX) + 1)
        ));
        assert!(matches!(
            Mesh::sphere_vertex_count(u32::MAX, u32::MAX),
            Err(SceneError::MeshTooLarge(u64::MAX))
        ));
        assert!(matches!(
            Mesh::uv_sphere(u32::MAX, 30, 1.0),
            Err(SceneError::MeshTooLarge(_))
        ));
        // Largest grid that still fits 16-bit indices.
        assert_eq!(Mesh::sphere_vertex_count(255, 255).unwrap(), 65536);
    }

    #[test]
    fn test_cube_counts_and_normals() {
        let mesh = Mesh::cube(1.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.index_count(), 36);

        let mut normals: Vec<[i32; 3]> = mesh
            .vertices
            .iter()
            .map(|v| [v.normal.x as i32, v.normal.y as i32, v.normal.z as i32])
            .collect();
        normals.sort();
        normals.dedup();
        assert_eq!(normals.len(), 6);
    }

    #[test]
    fn test_cube_winding_matches_face_normal() {
        let mesh = Mesh::cube(2.0);
        for tri in mesh.triangles() {
            let winding = tri.calculate_normal();
            assert!((winding - tri.vertices[0].normal).norm() < 1e-6);
        }
    }

    #[test]
    fn test_quad_faces_up() {
        let mesh = Mesh::quad(3.5, 2.5, 0.1);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        for tri in mesh.triangles() {
            assert!((tri.calculate_normal() - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-6);
        }
        assert!(mesh.vertices.iter().all(|v| v.position.y == 0.1));
    }

    #[test]
    fn test_flat_attributes() {
        let mesh = Mesh::quad(1.0, 1.0, 0.0);
        assert_eq!(mesh.positions_flat().len(), 12);
        assert_eq!(mesh.normals_flat().len(), 12);
        assert_eq!(mesh.texcoords_flat(), vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
    }
}
