/// Per-face drawing: flat or texture-warped fill, lighting tint, wireframe
use log::trace;
use nalgebra::Point2;

use crate::affine::AffineWarp;
use crate::config::RenderConfig;
use crate::lighting::{flat_color, overlay_color};
use crate::surface::{BlendMode, Surface};
use crate::texture::Texture;
use crate::visibility::VisibleFace;

/// How a face ended up being filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceFill {
    Flat,
    Textured,
    /// A texture was available but the mapping was degenerate
    FlatFallback,
}

/// Fill one visible face and stroke its edges
pub fn draw_face(
    surface: &mut Surface,
    face: &VisibleFace,
    texture: Option<&Texture>,
    config: &RenderConfig,
) -> FaceFill {
    let screen = face.vertices.map(|v| Point2::new(v.x, v.y));

    let fill = match texture {
        Some(texture) => {
            if draw_textured(surface, face, &screen, texture, config) {
                FaceFill::Textured
            } else {
                trace!("Face {} has a degenerate texture mapping, drawing flat", face.index);
                draw_flat(surface, face, &screen, config);
                FaceFill::FlatFallback
            }
        }
        None => {
            draw_flat(surface, face, &screen, config);
            FaceFill::Flat
        }
    };

    let stroke = config.wireframe.stroke_color();
    for i in 0..3 {
        surface.stroke_line(screen[i], screen[(i + 1) % 3], stroke, config.wireframe.width);
    }

    fill
}

fn draw_flat(
    surface: &mut Surface,
    face: &VisibleFace,
    screen: &[Point2<f32>; 3],
    config: &RenderConfig,
) {
    let lightness = config.flat_lighting.lightness(face.avg_z);
    let color = flat_color(config.base_color(), lightness);
    surface.fill_triangle(screen, color, BlendMode::SourceOver);
}

/// Warp the texture into the face. Returns false, having drawn nothing, when
/// the texture coordinates are too close to collinear.
fn draw_textured(
    surface: &mut Surface,
    face: &VisibleFace,
    screen: &[Point2<f32>; 3],
    texture: &Texture,
    config: &RenderConfig,
) -> bool {
    let source = face.vertices.map(|v| texture.pixel_coordinate(&v.object));

    let Some(warp) = AffineWarp::solve(&source, screen, config.degenerate_epsilon) else {
        return false;
    };

    {
        let mut clipped = surface.clip_triangle(*screen);
        clipped.draw_image(texture, warp.matrix());
    }

    let lightness = config.textured_lighting.lightness(face.avg_z);
    surface.fill_triangle(
        screen,
        overlay_color(lightness, config.overlay_opacity),
        BlendMode::Multiply,
    );
    true
}
