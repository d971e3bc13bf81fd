//! CPU-side mesh representation produced by loaders.

/// Indexed triangle mesh: tightly packed positions plus triangle indices.
///
/// Positions are in object space, in file order. Triangle indices are
/// 0-based and validated against `positions.len()` by the loaders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub triangles: Vec<[u32; 3]>,
}

impl MeshData {
    pub fn new(positions: Vec<[f32; 3]>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
        }
    }

    /// Number of indices to feed a draw call (3 per triangle).
    #[inline]
    pub fn index_count(&self) -> u32 {
        (self.triangles.len() * 3) as u32
    }

    /// Returns `true` if every triangle index references an existing position.
    pub fn indices_in_bounds(&self) -> bool {
        let len = self.positions.len() as u32;
        self.triangles
            .iter()
            .all(|tri| tri.iter().all(|&i| i < len))
    }

    /// Single triangle in the XY plane, used when no model file is given.
    pub fn primitive_triangle() -> Self {
        Self {
            positions: vec![[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 0.0]],
            triangles: vec![[0, 1, 2]],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_triangle_is_in_bounds() {
        let mesh = MeshData::primitive_triangle();
        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.index_count(), 3);
        assert!(mesh.indices_in_bounds());
    }

    #[test]
    fn out_of_bounds_index_is_detected() {
        let mesh = MeshData::new(vec![[0.0; 3]; 2], vec![[0, 1, 2]]);
        assert!(!mesh.indices_in_bounds());
    }
}
