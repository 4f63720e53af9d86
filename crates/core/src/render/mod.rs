use image::{Rgba, RgbaImage};

use crate::{
    assets::Texture,
    geometry::Point,
    graph::{NodeId, NodeKind, SceneGraph},
    Result, StageError,
};

/// Pixel target owned by the shell. The frame buffer is sized in physical
/// pixels, i.e. the logical size multiplied by the resolution.
#[derive(Debug, Clone)]
pub struct Surface {
    view: String,
    width: u32,
    height: u32,
    resolution: f32,
    frame: RgbaImage,
}

/// Largest physical frame edge, in pixels, a surface may allocate.
pub const MAX_SURFACE_DIMENSION: u32 = 16_384;

impl Surface {
    /// Allocates the frame buffer. Fails when the physical size would exceed
    /// [`MAX_SURFACE_DIMENSION`] on either axis.
    pub fn new(view: impl Into<String>, width: u32, height: u32, resolution: f32) -> Result<Self> {
        let pixel_width = physical_extent(width, resolution);
        let pixel_height = physical_extent(height, resolution);
        let (pixel_width, pixel_height) = match (pixel_width, pixel_height) {
            (Some(w), Some(h)) => (w, h),
            _ => {
                return Err(StageError::SurfaceTooLarge {
                    width,
                    height,
                    resolution,
                })
            }
        };

        Ok(Self {
            view: view.into(),
            width,
            height,
            resolution,
            frame: RgbaImage::new(pixel_width, pixel_height),
        })
    }

    pub fn view(&self) -> &str {
        &self.view
    }

    /// Logical width in CSS-style pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    /// Writes the last rendered frame to disk; the format follows the extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.frame.save(path)?;
        Ok(())
    }
}

fn physical_extent(logical: u32, resolution: f32) -> Option<u32> {
    let extent = (f64::from(logical) * f64::from(resolution)).round();
    if extent.is_finite() && (0.0..=f64::from(MAX_SURFACE_DIMENSION)).contains(&extent) {
        Some(extent as u32)
    } else {
        None
    }
}

/// Software compositor that paints a scene graph into a [`Surface`].
#[derive(Debug, Clone)]
pub struct Renderer {
    background: Rgba<u8>,
}

impl Renderer {
    pub fn new(background: [u8; 3]) -> Self {
        let [r, g, b] = background;
        Self {
            background: Rgba([r, g, b, 255]),
        }
    }

    /// Clears the surface and draws every sprite reachable from `root`, parents
    /// before children.
    pub fn draw(&self, graph: &SceneGraph, root: NodeId, surface: &mut Surface) -> Result<()> {
        for pixel in surface.frame.pixels_mut() {
            *pixel = self.background;
        }

        let mut sprites = 0usize;
        for id in graph.walk(root)? {
            if let NodeKind::Sprite(texture) = graph.kind(id)? {
                let position = graph.world_position(id)?;
                blit(surface, texture, position);
                sprites += 1;
            }
        }

        tracing::trace!(sprites, view = surface.view(), "frame rendered");
        Ok(())
    }
}

fn blit(surface: &mut Surface, texture: &Texture, position: Point) {
    let scale = surface.resolution;
    let origin_x = (position.x * scale).floor() as i64;
    let origin_y = (position.y * scale).floor() as i64;
    let dest_width = (texture.width() as f32 * scale).round() as i64;
    let dest_height = (texture.height() as f32 * scale).round() as i64;

    let frame_width = i64::from(surface.frame.width());
    let frame_height = i64::from(surface.frame.height());
    let x_range = origin_x.max(0)..(origin_x + dest_width).min(frame_width);
    let y_range = origin_y.max(0)..(origin_y + dest_height).min(frame_height);

    let source = texture.image();
    for y in y_range {
        let sy = (((y - origin_y) as f32 / scale) as u32).min(source.height() - 1);
        for x in x_range.clone() {
            let sx = (((x - origin_x) as f32 / scale) as u32).min(source.width() - 1);
            let src = source.get_pixel(sx, sy);
            let dst = surface.frame.get_pixel_mut(x as u32, y as u32);
            *dst = blend(*src, *dst);
        }
    }
}

/// Source-over compositing of straight-alpha colours.
fn blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let alpha = u32::from(src[3]);
    if alpha == 255 {
        return src;
    }
    if alpha == 0 {
        return dst;
    }

    let inverse = 255 - alpha;
    let channel = |s: u8, d: u8| ((u32::from(s) * alpha + u32::from(d) * inverse + 127) / 255) as u8;
    let out_alpha = alpha + (u32::from(dst[3]) * inverse + 127) / 255;
    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        out_alpha.min(255) as u8,
    ])
}
