//! Naive Wavefront OBJ loader.
//!
//! Recognizes exactly two line shapes: `v x y z` vertex positions and
//! `f a/b/c a/b/c a/b/c` triangle faces. Per-corner texture and normal
//! indices are required by the pattern but discarded; only the position
//! index of each corner is kept. Every other directive (comments, `vt`,
//! `vn`, `usemtl`, groups, quad faces, relative indices) is skipped.
//!
//! The loader makes a single pass, growing the output vectors as it goes,
//! then bounds-checks every stored index against the final position count.
//! OBJ indices are 1-based in the file and corrected to 0-based here.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use crate::mesh::MeshData;
use crate::{AssetError, AssetResult};

/// Load an OBJ mesh from a file path.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> AssetResult<MeshData> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| AssetError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = load_obj_from_reader(BufReader::new(file))?;
    log::info!(
        "Loaded OBJ {}: {} vertices, {} triangles",
        path.display(),
        mesh.positions.len(),
        mesh.triangles.len()
    );
    Ok(mesh)
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(reader: R) -> AssetResult<MeshData> {
    parse_obj(reader)
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> AssetResult<MeshData> {
    parse_obj(io::Cursor::new(contents))
}

fn parse_obj<R: BufRead>(reader: R) -> AssetResult<MeshData> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut triangles: Vec<[u32; 3]> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        match parts.next() {
            Some("v") => {
                if let Some(pos) = parse_position(&mut parts) {
                    positions.push(pos);
                } else {
                    log::debug!("Skipping unparseable vertex line {}", line_no + 1);
                }
            }
            Some("f") => {
                if let Some(tri) = parse_triangle(&mut parts) {
                    triangles.push(tri);
                } else {
                    log::debug!("Skipping unrecognized face line {}", line_no + 1);
                }
            }
            _ => {}
        }
    }

    if positions.is_empty() || triangles.is_empty() {
        return Err(AssetError::MalformedGeometry(
            "no parseable vertex/face lines in OBJ stream".into(),
        ));
    }

    // Faces may precede the vertices they reference, so bounds are checked
    // only after the whole stream has been consumed.
    let vertex_count = positions.len() as u32;
    for tri in &triangles {
        if let Some(&bad) = tri.iter().find(|&&i| i >= vertex_count) {
            return Err(AssetError::MalformedGeometry(format!(
                "face references vertex {} but only {} vertices exist",
                bad + 1,
                vertex_count
            )));
        }
    }

    Ok(MeshData::new(positions, triangles))
}

/// Parse the three coordinates of a `v` line. Extra tokens are ignored,
/// matching the prefix semantics of the classic `v %f %f %f` scan.
fn parse_position<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Option<[f32; 3]> {
    let x = parts.next()?.parse::<f32>().ok()?;
    let y = parts.next()?.parse::<f32>().ok()?;
    let z = parts.next()?.parse::<f32>().ok()?;
    Some([x, y, z])
}

/// Parse a face made of exactly three `v/vt/vn` corners. Returns the
/// 0-corrected position indices; texture/normal indices are validated as
/// integers and dropped.
fn parse_triangle<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Option<[u32; 3]> {
    let a = parse_corner(parts.next()?)?;
    let b = parse_corner(parts.next()?)?;
    let c = parse_corner(parts.next()?)?;
    if parts.next().is_some() {
        // Quads and larger polygons are out of scope.
        return None;
    }
    Some([a, b, c])
}

fn parse_corner(token: &str) -> Option<u32> {
    let mut fields = token.split('/');
    let pos = parse_obj_index(fields.next()?)?;
    parse_obj_index(fields.next()?)?;
    parse_obj_index(fields.next()?)?;
    if fields.next().is_some() {
        return None;
    }
    // 1-based in the file; 0-based in memory.
    Some(pos - 1)
}

/// A single face-corner field: a positive integer. Zero and negative
/// (relative) indices do not match the recognized pattern.
fn parse_obj_index(field: &str) -> Option<u32> {
    match field.parse::<u32>() {
        Ok(i) if i > 0 => Some(i),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_triangle() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1/1 2/2/2 3/3/3\n";
        let mesh = load_obj_from_str(src).expect("parse triangle");
        assert_eq!(
            mesh.positions,
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
        );
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn counts_match_line_counts() {
        let src = r#"
            # a comment
            v 0.0 0.0 0.0
            v 1.0 0.0 0.0
            v 0.0 1.0 0.0
            v 1.0 1.0 0.0
            vn 0.0 0.0 1.0
            vt 0.5 0.5
            f 1/1/1 2/1/1 3/1/1
            f 2/1/1 4/1/1 3/1/1
        "#;
        let mesh = load_obj_from_str(src).expect("parse quad as two tris");
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.triangles.len(), 2);
        assert!(mesh.indices_in_bounds());
    }

    #[test]
    fn parse_is_idempotent() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1/1 2/2/2 3/3/3\n";
        let first = load_obj_from_str(src).expect("first parse");
        let second = load_obj_from_str(src).expect("second parse");
        assert_eq!(first, second);
    }

    #[test]
    fn corner_missing_field_skips_whole_face() {
        // Second corner lacks its normal index, so the face must not be
        // partially filled.
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1/1 2/2 3/3/3\nf 1/1/1 2/2/2 3/3/3\n";
        let mesh = load_obj_from_str(src).expect("parse");
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn quad_faces_are_skipped() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1/1/1 2/2/2 3/3/3 4/4/4\nf 1/1/1 2/2/2 3/3/3\n";
        let mesh = load_obj_from_str(src).expect("parse");
        assert_eq!(mesh.triangles.len(), 1);
    }

    #[test]
    fn negative_indices_are_skipped() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -1/-1/-1 -2/-2/-2 -3/-3/-3\nf 1/1/1 2/2/2 3/3/3\n";
        let mesh = load_obj_from_str(src).expect("parse");
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn out_of_range_index_is_malformed() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1/1 2/2/2 5/5/5\n";
        let err = load_obj_from_str(src).expect_err("index 5 of 3");
        assert!(matches!(err, AssetError::MalformedGeometry(_)));
    }

    #[test]
    fn face_may_precede_its_vertices() {
        let src = "f 1/1/1 2/2/2 3/3/3\nv 0 0 0\nv 1 0 0\nv 0 1 0\n";
        let mesh = load_obj_from_str(src).expect("forward reference");
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn empty_stream_is_malformed() {
        assert!(matches!(
            load_obj_from_str(""),
            Err(AssetError::MalformedGeometry(_))
        ));
        assert!(matches!(
            load_obj_from_str("# only comments\nusemtl none\n"),
            Err(AssetError::MalformedGeometry(_))
        ));
    }

    #[test]
    fn vertices_without_faces_are_malformed() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\n";
        assert!(matches!(
            load_obj_from_str(src),
            Err(AssetError::MalformedGeometry(_))
        ));
    }

    #[test]
    fn extra_tokens_on_vertex_line_are_ignored() {
        // Some exporters emit a w coordinate or vertex colors.
        let src = "v 0 0 0 1.0\nv 1 0 0 1.0\nv 0 1 0 1.0\nf 1/1/1 2/2/2 3/3/3\n";
        let mesh = load_obj_from_str(src).expect("parse");
        assert_eq!(mesh.positions.len(), 3);
    }
}
