/// RGBA raster surface that the rasterizer draws into
use std::ops::{Deref, DerefMut};

use nalgebra::{Matrix3, Point2};

use crate::texture::Texture;

/// Straight (non-premultiplied) RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_array([r, g, b]: [u8; 3]) -> Self {
        Self::rgb(r, g, b)
    }

    /// Scale the colour channels by `factor`, rounding down. Alpha is kept.
    pub fn scaled(self, factor: f32) -> Self {
        let scale = |c: u8| (c as f32 * factor).floor().clamp(0.0, 255.0) as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
            a: self.a,
        }
    }

    /// Replace alpha with `opacity` in [0, 1]
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            a: (opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }
}

/// How a source colour combines with the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Plain alpha compositing
    SourceOver,
    /// Darken the destination by the source, then composite
    Multiply,
}

/// Composite `src` over `dst` in straight alpha.
fn blend(dst: Color, src: Color, mode: BlendMode) -> Color {
    let sa = src.a as f32 / 255.0;
    if sa <= 0.0 {
        return dst;
    }
    let da = dst.a as f32 / 255.0;

    let channel = |s: u8, d: u8| -> f32 {
        let s = s as f32 / 255.0;
        let d = d as f32 / 255.0;
        let cs = match mode {
            BlendMode::SourceOver => s,
            // Where the destination is transparent the source shows as is
            BlendMode::Multiply => (1.0 - da) * s + da * (s * d),
        };
        cs * sa + d * da * (1.0 - sa)
    };

    let out_a = sa + da * (1.0 - sa);
    let finish =
        |premultiplied: f32| ((premultiplied / out_a) * 255.0).round().clamp(0.0, 255.0) as u8;

    Color {
        r: finish(channel(src.r, dst.r)),
        g: finish(channel(src.g, dst.g)),
        b: finish(channel(src.b, dst.b)),
        a: (out_a * 255.0).round() as u8,
    }
}

/// Fixed-size RGBA8 raster, row-major, 4 bytes per pixel
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    /// Active clip triangles; a pixel is writable only inside all of them
    clip: Vec<[Point2<f32>; 3]>,
    draw_calls: usize,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
            clip: Vec::new(),
            draw_calls: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let p = &self.pixels[idx..idx + 4];
        Some(Color::rgba(p[0], p[1], p[2], p[3]))
    }

    /// Number of fill, image and stroke operations since the last clear
    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    pub fn is_clipped(&self) -> bool {
        !self.clip.is_empty()
    }

    /// Reset every pixel to transparent black
    pub fn clear(&mut self) {
        self.pixels.fill(0);
        self.clip.clear();
        self.draw_calls = 0;
    }

    /// Restrict drawing to the interior of `triangle` until the guard is dropped
    pub fn clip_triangle(&mut self, triangle: [Point2<f32>; 3]) -> ClipGuard<'_> {
        self.clip.push(triangle);
        ClipGuard { surface: self }
    }

    /// Fill a triangle, whatever its winding
    pub fn fill_triangle(&mut self, triangle: &[Point2<f32>; 3], color: Color, mode: BlendMode) {
        self.draw_calls += 1;

        let Some((min_x, min_y, max_x, max_y)) = self.pixel_bounds(triangle) else {
            return;
        };

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let center = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
                if inside(triangle, &center) && self.clip_allows(&center) {
                    self.blend_pixel(x, y, color, mode);
                }
            }
        }
    }

    /// Draw the whole of `texture` through the affine `transform`, which maps
    /// texture pixel coordinates to surface coordinates. Sampling is nearest
    /// neighbour; only pixels inside the current clip are touched.
    pub fn draw_image(&mut self, texture: &Texture, transform: &Matrix3<f32>) {
        self.draw_calls += 1;

        let Some(inverse) = transform.try_inverse() else {
            return;
        };

        let (tw, th) = (texture.width() as f32, texture.height() as f32);
        let corners = [
            Point2::new(0.0, 0.0),
            Point2::new(tw, 0.0),
            Point2::new(tw, th),
            Point2::new(0.0, th),
        ]
        .map(|p| transform.transform_point(&p));

        let mut bounds = bounds_of(&corners);
        for triangle in &self.clip {
            bounds = intersect(bounds, bounds_of(triangle));
        }
        let Some((min_x, min_y, max_x, max_y)) = self.to_pixel_range(bounds) else {
            return;
        };

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let center = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
                if !self.clip_allows(&center) {
                    continue;
                }
                let source = inverse.transform_point(&center);
                if source.x < 0.0 || source.y < 0.0 || source.x >= tw || source.y >= th {
                    continue;
                }
                let texel = texture.texel(source.x as u32, source.y as u32);
                self.blend_pixel(x, y, texel, BlendMode::SourceOver);
            }
        }
    }

    /// Stroke a straight line. Widths below one pixel are drawn one pixel
    /// wide with proportionally reduced opacity.
    pub fn stroke_line(&mut self, from: Point2<f32>, to: Point2<f32>, color: Color, width: f32) {
        self.draw_calls += 1;

        let coverage = width.clamp(0.0, 1.0);
        let color = Color {
            a: (color.a as f32 * coverage).round() as u8,
            ..color
        };
        let half = ((width - 1.0) / 2.0).max(0.0).round() as i64;

        // Step only the part of the segment that can touch the surface
        let pad = half as f32 + 1.0;
        let Some((from, to)) = clip_segment(
            from,
            to,
            Point2::new(-pad, -pad),
            Point2::new(self.width as f32 + pad, self.height as f32 + pad),
        ) else {
            return;
        };

        let delta = to - from;
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as usize;
        let mut last = None;

        for step in 0..=steps {
            let p = from + delta * (step as f32 / steps as f32);
            let (px, py) = (p.x.floor() as i64, p.y.floor() as i64);
            if last == Some((px, py)) {
                continue;
            }
            last = Some((px, py));

            for oy in -half..=half {
                for ox in -half..=half {
                    let (x, y) = (px + ox, py + oy);
                    if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
                        continue;
                    }
                    let center = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
                    if self.clip_allows(&center) {
                        self.blend_pixel(x as u32, y as u32, color, BlendMode::SourceOver);
                    }
                }
            }
        }
    }

    fn clip_allows(&self, point: &Point2<f32>) -> bool {
        self.clip.iter().all(|triangle| inside(triangle, point))
    }

    fn blend_pixel(&mut self, x: u32, y: u32, color: Color, mode: BlendMode) {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let p = &mut self.pixels[idx..idx + 4];
        let out = blend(Color::rgba(p[0], p[1], p[2], p[3]), color, mode);
        p.copy_from_slice(&[out.r, out.g, out.b, out.a]);
    }

    fn pixel_bounds(&self, triangle: &[Point2<f32>; 3]) -> Option<(u32, u32, u32, u32)> {
        self.to_pixel_range(bounds_of(triangle))
    }

    /// Clamp a float bounding box to pixel indices on this surface
    fn to_pixel_range(
        &self,
        (min, max): (Point2<f32>, Point2<f32>),
    ) -> Option<(u32, u32, u32, u32)> {
        if self.width == 0 || self.height == 0 || !(min.x <= max.x && min.y <= max.y) {
            return None;
        }
        let min_x = min.x.floor().max(0.0);
        let min_y = min.y.floor().max(0.0);
        let max_x = max.x.ceil().min(self.width as f32 - 1.0);
        let max_y = max.y.ceil().min(self.height as f32 - 1.0);
        if min_x > max_x || min_y > max_y {
            return None;
        }
        Some((min_x as u32, min_y as u32, max_x as u32, max_y as u32))
    }
}

/// Scoped clip region. Dropping the guard removes the clip it added.
pub struct ClipGuard<'a> {
    surface: &'a mut Surface,
}

impl Deref for ClipGuard<'_> {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        self.surface
    }
}

impl DerefMut for ClipGuard<'_> {
    fn deref_mut(&mut self) -> &mut Surface {
        self.surface
    }
}

impl Drop for ClipGuard<'_> {
    fn drop(&mut self) {
        self.surface.clip.pop();
    }
}

fn bounds_of(points: &[Point2<f32>]) -> (Point2<f32>, Point2<f32>) {
    points.iter().fold(
        (
            Point2::new(f32::INFINITY, f32::INFINITY),
            Point2::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
        ),
        |(min, max), p| {
            (
                Point2::new(min.x.min(p.x), min.y.min(p.y)),
                Point2::new(max.x.max(p.x), max.y.max(p.y)),
            )
        },
    )
}

fn intersect(
    (a_min, a_max): (Point2<f32>, Point2<f32>),
    (b_min, b_max): (Point2<f32>, Point2<f32>),
) -> (Point2<f32>, Point2<f32>) {
    (
        Point2::new(a_min.x.max(b_min.x), a_min.y.max(b_min.y)),
        Point2::new(a_max.x.min(b_max.x), a_max.y.min(b_max.y)),
    )
}

/// Liang-Barsky clip of a segment against an axis-aligned box.
/// Computed in f64 so far-away endpoints still land on the box edge.
fn clip_segment(
    from: Point2<f32>,
    to: Point2<f32>,
    min: Point2<f32>,
    max: Point2<f32>,
) -> Option<(Point2<f32>, Point2<f32>)> {
    if !from.coords.iter().chain(to.coords.iter()).all(|c| c.is_finite()) {
        return None;
    }

    let (x0, y0) = (from.x as f64, from.y as f64);
    let (dx, dy) = (to.x as f64 - x0, to.y as f64 - y0);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [
        (-dx, x0 - min.x as f64),
        (dx, max.x as f64 - x0),
        (-dy, y0 - min.y as f64),
        (dy, max.y as f64 - y0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    let at = |t: f64| Point2::new((x0 + dx * t) as f32, (y0 + dy * t) as f32);
    Some((at(t0), at(t1)))
}

fn inside(triangle: &[Point2<f32>; 3], p: &Point2<f32>) -> bool {
    matches!(barycentric(triangle, p), Some((w0, w1, w2)) if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0)
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(triangle: &[Point2<f32>; 3], p: &Point2<f32>) -> Option<(f32, f32, f32)> {
    let [v0, v1, v2] = triangle;
    let denom = (v1.y - v2.y) * (v0.x - v2.x) + (v2.x - v1.x) * (v0.y - v2.y);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.y - v2.y) * (p.x - v2.x) + (v2.x - v1.x) * (p.y - v2.y)) / denom;
    let w1 = ((v2.y - v0.y) * (p.x - v2.x) + (v0.x - v2.x) * (p.y - v2.y)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
