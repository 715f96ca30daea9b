/// meshview web - the CPU renderer compiled to WASM, presenting into a 2D canvas
///
/// The host page owns the event loop: it forwards input through the setters
/// and calls `render()` once per animation frame. Work is only done when an
/// input changed since the last frame.
use log::{debug, info};
use meshview_core::visibility::check_indices;
use meshview_core::{
    FrameScheduler, Mesh, RenderConfig, RenderOutcome, Renderer, RotationState, Texture, ViewState,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Viewer state that does not depend on the DOM
struct ViewerState {
    mesh: Mesh,
    view: ViewState,
    renderer: Renderer,
    scheduler: FrameScheduler,
    texture: Option<Texture>,
}

impl ViewerState {
    fn new(width: u32, height: u32) -> Self {
        let config = RenderConfig {
            width,
            height,
            ..RenderConfig::default()
        };
        Self {
            mesh: Mesh::relief_grid(20),
            view: ViewState::new(RotationState::new(20.0, 45.0), 100.0),
            renderer: Renderer::new(config),
            scheduler: FrameScheduler::new(),
            texture: None,
        }
    }

    fn set_mesh(&mut self, vertices: &[f32], faces: &[u32]) -> meshview_core::Result<()> {
        let mesh = Mesh::from_buffers(vertices, faces)?;
        check_indices(&mesh.faces, mesh.vertices.len())?;
        info!(
            "Mesh set: {} vertices, {} faces",
            mesh.vertices.len(),
            mesh.faces.len()
        );
        self.mesh = mesh;
        self.scheduler.request();
        Ok(())
    }

    fn set_texture(&mut self, width: u32, height: u32, rgba: Vec<u8>) -> meshview_core::Result<()> {
        self.texture = Some(Texture::from_rgba(width, height, rgba)?);
        self.scheduler.request();
        Ok(())
    }

    fn clear_texture(&mut self) {
        self.texture = None;
        self.scheduler.request();
    }

    fn set_zoom(&mut self, zoom: f32) {
        let range = self.renderer.config().zoom;
        self.view.zoom = zoom.clamp(range.min, range.max);
        self.scheduler.request();
    }

    /// Render if a request is pending. Returns the frame outcome, if rendered.
    fn render(&mut self) -> meshview_core::Result<Option<RenderOutcome>> {
        if !self.scheduler.take() {
            return Ok(None);
        }
        self.renderer
            .render(&self.mesh, &self.view, self.texture.as_ref())
            .map(Some)
    }

    fn shutdown(&mut self) {
        self.scheduler.cancel();
        self.renderer.detach();
    }
}

#[wasm_bindgen]
pub struct WebRenderer {
    state: ViewerState,
    context: Option<CanvasRenderingContext2d>,
}

#[wasm_bindgen]
impl WebRenderer {
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> WebRenderer {
        WebRenderer {
            state: ViewerState::new(width, height),
            context: None,
        }
    }

    /// Initialize the renderer with a canvas element
    pub fn init(&mut self, canvas_id: &str) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document available"))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("canvas '{}' not found", canvas_id)))?
            .dyn_into()?;

        let config = self.state.renderer.config();
        canvas.set_width(config.width);
        canvas.set_height(config.height);

        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into()?;

        self.context = Some(context);
        self.state.renderer.attach();
        self.state.scheduler.request();
        Ok(())
    }

    /// Replace the mesh with flat `xyz` positions and `ijk` face indices
    pub fn set_mesh(&mut self, vertices: Vec<f32>, faces: Vec<u32>) -> Result<(), JsValue> {
        self.state.set_mesh(&vertices, &faces).map_err(js_error)
    }

    /// Supply a decoded RGBA texture
    pub fn set_texture(&mut self, width: u32, height: u32, rgba: Vec<u8>) -> Result<(), JsValue> {
        self.state.set_texture(width, height, rgba).map_err(js_error)
    }

    pub fn clear_texture(&mut self) {
        self.state.clear_texture();
    }

    pub fn set_rotation(&mut self, x: f32, y: f32) {
        self.state.view.rotation = RotationState::new(x, y);
        self.state.scheduler.request();
    }

    /// Update rotation state by a drag delta in degrees
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.state.view.rotation.rotate(dx, dy);
        self.state.scheduler.request();
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.state.set_zoom(zoom);
    }

    /// Render a frame if anything changed. Returns true when the canvas was updated.
    pub fn render(&mut self) -> Result<bool, JsValue> {
        let Some(outcome) = self.state.render().map_err(js_error)? else {
            return Ok(false);
        };

        match outcome {
            RenderOutcome::Drawn(stats) => {
                debug!("Frame drawn: {:?}", stats);
                let (Some(context), Some(surface)) = (&self.context, self.state.renderer.surface())
                else {
                    return Ok(false);
                };
                let image = ImageData::new_with_u8_clamped_array_and_sh(
                    Clamped(surface.pixels()),
                    surface.width(),
                    surface.height(),
                )?;
                context.put_image_data(&image, 0.0, 0.0)?;
                Ok(true)
            }
            RenderOutcome::Skipped(reason) => {
                debug!("Frame skipped: {:?}", reason);
                Ok(false)
            }
        }
    }

    /// Cancel pending renders and release the canvas
    pub fn destroy(&mut self) {
        self.state.shutdown();
        self.context = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshview_core::{RenderError, SkipReason};

    #[test]
    fn test_render_needs_a_request_and_a_target() {
        let mut state = ViewerState::new(64, 64);
        assert!(state.render().unwrap().is_none());

        state.set_zoom(120.0);
        assert_eq!(
            state.render().unwrap(),
            Some(RenderOutcome::Skipped(SkipReason::NoTarget))
        );

        state.renderer.attach();
        state.set_zoom(500.0);
        assert_eq!(state.view.zoom, 200.0);
        assert!(matches!(state.render().unwrap(), Some(RenderOutcome::Drawn(_))));
        assert!(state.render().unwrap().is_none());
    }

    #[test]
    fn test_set_mesh_validates() {
        let mut state = ViewerState::new(64, 64);
        let before = state.mesh.clone();

        let err = state.set_mesh(&[0.0; 9], &[0, 1, 3]).unwrap_err();
        assert!(matches!(err, RenderError::InvalidMesh { index: 3, .. }));
        assert!(state.set_mesh(&[0.0; 8], &[]).is_err());
        assert_eq!(state.mesh, before);
        assert!(!state.scheduler.is_pending());

        state.set_mesh(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], &[0, 1, 2]).unwrap();
        assert_eq!(state.mesh.faces.len(), 1);
        assert!(state.scheduler.is_pending());
    }

    #[test]
    fn test_texture_round_trip() {
        let mut state = ViewerState::new(64, 64);
        assert!(matches!(
            state.set_texture(2, 2, vec![0; 15]),
            Err(RenderError::TextureSize { .. })
        ));
        state.set_texture(2, 2, vec![255; 16]).unwrap();
        assert!(state.texture.is_some());
        state.clear_texture();
        assert!(state.texture.is_none());
    }

    #[test]
    fn test_shutdown_cancels() {
        let mut state = ViewerState::new(64, 64);
        state.renderer.attach();
        state.set_zoom(110.0);
        state.shutdown();
        assert!(state.render().unwrap().is_none());
        assert!(state.renderer.surface().is_none());
    }
}
