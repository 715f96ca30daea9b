/// meshview core - CPU mesh rendering
///
/// Rotates and projects an indexed triangle mesh, culls back faces, orders
/// the rest with the painter's algorithm and rasterizes them, optionally
/// warping a texture into each triangle, into an RGBA surface.

pub mod affine;
pub mod config;
pub mod error;
pub mod geometry;
pub mod lighting;
pub mod obj;
pub mod projection;
pub mod raster;
pub mod render;
pub mod schedule;
pub mod surface;
pub mod texture;
pub mod transform;
pub mod visibility;

// Re-export commonly used types
pub use config::{RenderConfig, RenderMode};
pub use error::{RenderError, Result};
pub use geometry::{Face, Mesh, Vertex};
pub use render::{render_frame, FrameStats, RenderOutcome, Renderer, SkipReason};
pub use schedule::FrameScheduler;
pub use surface::{Color, Surface};
pub use texture::Texture;
pub use transform::{RotationState, Transform, TransformedVertex, ViewState};
