/// Error types for mesh loading, configuration and rendering
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    /// A face references a vertex that does not exist
    #[error("invalid mesh: face {face} references vertex {index} of {vertex_count}")]
    InvalidMesh {
        face: usize,
        index: usize,
        vertex_count: usize,
    },
    #[error("OBJ parse error on line {line}: {message}")]
    MeshParse { line: usize, message: String },
    #[error("{kind} buffer has {len} entries, expected a multiple of 3")]
    MeshBuffer { kind: &'static str, len: usize },
    #[error("unsupported mesh file '{0}', expected .obj or .json")]
    UnsupportedMeshFormat(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to decode texture: {0}")]
    TextureDecode(#[from] image::ImageError),
    #[error("texture data is {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    TextureSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
