//! Shader source loading. Sources are plain WGSL text read whole from disk;
//! compilation happens in the renderer.

use std::{fs, path::Path};

use crate::{AssetError, AssetResult};

/// Vertex + fragment WGSL sources for one pipeline.
#[derive(Clone, Debug)]
pub struct ShaderPair {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderPair {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Read both shader files whole. A missing file fails fast with the
    /// offending path; no sentinel sources are ever produced.
    pub fn from_paths(vertex: impl AsRef<Path>, fragment: impl AsRef<Path>) -> AssetResult<Self> {
        Ok(Self {
            vertex: read_source(vertex.as_ref())?,
            fragment: read_source(fragment.as_ref())?,
        })
    }
}

fn read_source(path: &Path) -> AssetResult<String> {
    let source = fs::read_to_string(path).map_err(|source| AssetError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Read shader source {} ({} bytes)", path.display(), source.len());
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_shader_file_reports_path() {
        let err = ShaderPair::from_paths("/definitely/missing.vs.wgsl", "/also/missing.fs.wgsl")
            .expect_err("missing files");
        match err {
            AssetError::FileNotFound { path, .. } => {
                assert!(path.to_string_lossy().contains("missing.vs.wgsl"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
