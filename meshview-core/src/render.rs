/// The render cycle: transform, visibility, rasterize
use log::{debug, info, warn};

use crate::config::{RenderConfig, RenderMode};
use crate::error::Result;
use crate::geometry::Mesh;
use crate::projection::ScreenProjection;
use crate::raster::{draw_face, FaceFill};
use crate::surface::Surface;
use crate::texture::Texture;
use crate::transform::{Transform, ViewState};
use crate::visibility::visible_faces;

/// Counters for one render cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub faces: usize,
    pub culled: usize,
    pub drawn: usize,
    pub textured: usize,
    /// Faces drawn flat because their texture mapping was degenerate
    pub flat_fallbacks: usize,
    /// Fill, image and stroke operations issued on the surface
    pub draw_calls: usize,
}

/// Why a render was not performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No surface is attached
    NoTarget,
    /// The renderer waits for a texture and none has been supplied
    TexturePending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Drawn(FrameStats),
    Skipped(SkipReason),
}

/// Render one frame into `surface`, laid out for the surface's own size.
///
/// The mesh is checked before the surface is touched, so an invalid mesh
/// leaves the previous frame in place. Otherwise the surface is cleared and
/// every visible face is drawn back to front.
pub fn render_frame(
    surface: &mut Surface,
    mesh: &Mesh,
    view: &ViewState,
    texture: Option<&Texture>,
    config: &RenderConfig,
) -> Result<FrameStats> {
    let projection =
        ScreenProjection::new(surface.width(), surface.height(), config.layout_divisor);
    let transformed = Transform::apply(mesh, view, &projection);
    let visibility = visible_faces(&mesh.faces, &transformed)?;

    surface.clear();

    let mut stats = FrameStats {
        faces: mesh.faces.len(),
        culled: visibility.culled,
        ..FrameStats::default()
    };

    for face in &visibility.faces {
        match draw_face(surface, face, texture, config) {
            FaceFill::Textured => stats.textured += 1,
            FaceFill::FlatFallback => stats.flat_fallbacks += 1,
            FaceFill::Flat => {}
        }
        stats.drawn += 1;
    }
    stats.draw_calls = surface.draw_calls();

    debug!("Rendered frame: {:?}", stats);
    Ok(stats)
}

/// Owns the render target and applies the configured render mode
pub struct Renderer {
    config: RenderConfig,
    surface: Option<Surface>,
}

impl Renderer {
    /// A renderer with no target; call [`Renderer::attach`] before rendering
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            surface: None,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn set_mode(&mut self, mode: RenderMode) {
        self.config.mode = mode;
    }

    /// Create a target surface of the configured size
    pub fn attach(&mut self) {
        self.attach_sized(self.config.width, self.config.height);
    }

    /// Create a target surface of a given size, replacing any existing one
    pub fn attach_sized(&mut self, width: u32, height: u32) {
        info!("Attaching {}x{} render target", width, height);
        self.config.width = width;
        self.config.height = height;
        self.surface = Some(Surface::new(width, height));
    }

    /// Drop the target; later renders are skipped
    pub fn detach(&mut self) {
        if self.surface.take().is_some() {
            info!("Render target detached");
        }
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn render(
        &mut self,
        mesh: &Mesh,
        view: &ViewState,
        texture: Option<&Texture>,
    ) -> Result<RenderOutcome> {
        let Some(surface) = self.surface.as_mut() else {
            debug!("No render target, skipping frame");
            return Ok(RenderOutcome::Skipped(SkipReason::NoTarget));
        };

        if texture.is_none() && self.config.mode == RenderMode::WaitForTexture {
            debug!("Texture not ready, deferring frame");
            return Ok(RenderOutcome::Skipped(SkipReason::TexturePending));
        }

        match render_frame(surface, mesh, view, texture, &self.config) {
            Ok(stats) => Ok(RenderOutcome::Drawn(stats)),
            Err(e) => {
                warn!("Frame not rendered: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::geometry::Face;
    use crate::transform::RotationState;

    fn small_config() -> RenderConfig {
        RenderConfig {
            width: 64,
            height: 64,
            ..RenderConfig::default()
        }
    }

    #[test_log::test]
    fn test_no_target_is_skipped() {
        let mut renderer = Renderer::new(small_config());
        let outcome = renderer
            .render(&Mesh::cube(2.0), &ViewState::default(), None)
            .unwrap();
        assert_eq!(outcome, RenderOutcome::Skipped(SkipReason::NoTarget));
    }

    #[test_log::test]
    fn test_wait_for_texture() {
        let mut renderer = Renderer::new(small_config());
        renderer.set_mode(RenderMode::WaitForTexture);
        renderer.attach();
        let mesh = Mesh::cube(2.0);
        let view = ViewState::new(RotationState::new(20.0, 45.0), 100.0);

        let outcome = renderer.render(&mesh, &view, None).unwrap();
        assert_eq!(outcome, RenderOutcome::Skipped(SkipReason::TexturePending));
        assert!(renderer.surface().unwrap().pixels().iter().all(|&b| b == 0));

        let texture = Texture::solid(16, 16, crate::surface::Color::WHITE);
        match renderer.render(&mesh, &view, Some(&texture)).unwrap() {
            RenderOutcome::Drawn(stats) => {
                assert_eq!(stats.drawn, 6);
                assert_eq!(stats.textured + stats.flat_fallbacks, 6);
            }
            other => panic!("expected a frame, got {:?}", other),
        }
    }

    #[test_log::test]
    fn test_flat_immediate_draws_without_texture() {
        let mut renderer = Renderer::new(small_config());
        renderer.attach();
        let outcome = renderer
            .render(&Mesh::cube(2.0), &ViewState::new(RotationState::new(20.0, 45.0), 100.0), None)
            .unwrap();
        match outcome {
            RenderOutcome::Drawn(stats) => {
                assert_eq!(stats.faces, 12);
                assert_eq!(stats.culled, 6);
                assert_eq!(stats.textured, 0);
            }
            other => panic!("expected a frame, got {:?}", other),
        }
    }

    #[test_log::test]
    fn test_invalid_mesh_keeps_previous_frame() {
        let mut renderer = Renderer::new(small_config());
        renderer.attach();
        let view = ViewState::new(RotationState::new(20.0, 45.0), 100.0);
        renderer.render(&Mesh::cube(2.0), &view, None).unwrap();
        let before = renderer.surface().unwrap().pixels().to_vec();

        let mut broken = Mesh::cube(2.0);
        broken.add_face(Face::new(0, 1, 42));
        let result = renderer.render(&broken, &view, None);
        assert!(matches!(
            result,
            Err(RenderError::InvalidMesh { face: 12, index: 42, vertex_count: 8 })
        ));
        assert_eq!(renderer.surface().unwrap().pixels(), &before[..]);
    }

    #[test_log::test]
    fn test_detach() {
        let mut renderer = Renderer::new(small_config());
        renderer.attach_sized(32, 16);
        assert_eq!(renderer.surface().map(|s| (s.width(), s.height())), Some((32, 16)));
        renderer.detach();
        assert!(renderer.surface().is_none());
        let outcome = renderer.render(&Mesh::new(), &ViewState::default(), None).unwrap();
        assert_eq!(outcome, RenderOutcome::Skipped(SkipReason::NoTarget));
    }
}
