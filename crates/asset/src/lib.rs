//! Asset loading: OBJ meshes and WGSL shader sources.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub mod mesh;
pub mod obj;
pub mod shader;

pub use mesh::MeshData;
pub use shader::ShaderPair;

/// Errors produced while loading assets from disk or parsing them.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to open {path}: {source}")]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("i/o error while reading asset: {0}")]
    Io(#[from] io::Error),

    #[error("malformed geometry: {0}")]
    MalformedGeometry(String),
}

pub type AssetResult<T> = Result<T, AssetError>;
