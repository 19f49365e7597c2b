// SPDX-License-Identifier: MPL-2.0

//! Poster, spinner and background textures shared by every video layer.
//!
//! The textures are created lazily by the first render pass and live for the
//! rest of the process. Creation happens exactly once even when several
//! layers draw their first frame concurrently.

use std::sync::OnceLock;

use colorgrad::{Color, Gradient};
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use rayon::prelude::*;
use video_layer_config::{Config, MAX_ICON_SIZE};

use crate::geometry::IntRect;
use crate::gpu::{TextureFilter, TextureId, TextureUploader};

/// Edge length of the flat background plate.
const BACKGROUND_EXTENT: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    /// Static poster shown while no frame is available.
    Video,
    SpinnerOuter,
    SpinnerInner,
}

/// Renders media button glyphs into a bitmap.
pub trait IconRenderer {
    fn render_icon(&self, target: &mut RgbaImage, dest: IntRect, kind: IconKind, highlighted: bool);
}

/// The process-wide icon textures.
///
/// A handle is [`TextureId::INVALID`] when its upload failed; drawing with it
/// draws nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconTextureSet {
    pub background: TextureId,
    pub poster: TextureId,
    pub spinner_outer: TextureId,
    pub spinner_inner: TextureId,
}

impl IconTextureSet {
    fn create<U, R>(uploader: &mut U, renderer: &R, config: &Config) -> Self
    where
        U: TextureUploader + ?Sized,
        R: IconRenderer + ?Sized,
    {
        let background = upload_or_invalid(
            &mut *uploader,
            &DynamicImage::ImageRgb8(background_bitmap(config)),
            TextureFilter::Nearest,
            "background",
        );

        let mut icon_texture = |kind: IconKind| {
            let bitmap = icon_bitmap(renderer, kind, config);
            upload_or_invalid(
                &mut *uploader,
                &DynamicImage::ImageRgba8(bitmap),
                TextureFilter::Linear,
                kind,
            )
        };

        let spinner_outer = icon_texture(IconKind::SpinnerOuter);
        let spinner_inner = icon_texture(IconKind::SpinnerInner);
        let poster = icon_texture(IconKind::Video);

        let set = Self {
            background,
            poster,
            spinner_outer,
            spinner_inner,
        };
        tracing::debug!(?set, "created video layer icon textures");
        set
    }
}

fn upload_or_invalid<U>(
    uploader: &mut U,
    bitmap: &DynamicImage,
    filter: TextureFilter,
    what: impl std::fmt::Debug,
) -> TextureId
where
    U: TextureUploader + ?Sized,
{
    match uploader.upload(bitmap, filter) {
        Ok(texture) => texture,
        Err(why) => {
            tracing::warn!(?why, ?what, "icon texture upload failed");
            TextureId::INVALID
        }
    }
}

/// Flat 2x2 plate drawn behind the poster.
pub fn background_bitmap(config: &Config) -> RgbImage {
    RgbImage::from_pixel(
        BACKGROUND_EXTENT,
        BACKGROUND_EXTENT,
        Rgb(config.background_color),
    )
}

/// Transparent square bitmap with the glyph for `kind` rendered into it.
pub fn icon_bitmap<R>(renderer: &R, kind: IconKind, config: &Config) -> RgbaImage
where
    R: IconRenderer + ?Sized,
{
    let size = config.icon_size.min(MAX_ICON_SIZE);
    let mut bitmap = RgbaImage::new(size, size);
    let Ok(extent) = i32::try_from(size) else {
        return bitmap;
    };
    renderer.render_icon(
        &mut bitmap,
        IntRect::new(0, 0, extent, extent),
        kind,
        config.highlighted_icons,
    );
    bitmap
}

/// Lazily created [`IconTextureSet`].
#[derive(Debug, Default)]
pub struct IconTextureCache {
    set: OnceLock<IconTextureSet>,
}

impl IconTextureCache {
    pub const fn new() -> Self {
        Self {
            set: OnceLock::new(),
        }
    }

    /// Returns the icon textures, creating them on the first call.
    ///
    /// Concurrent first callers wait for the single creation to finish and
    /// all observe the same handles.
    pub fn ensure<U, R>(&self, uploader: &mut U, renderer: &R, config: &Config) -> &IconTextureSet
    where
        U: TextureUploader + ?Sized,
        R: IconRenderer + ?Sized,
    {
        self.set
            .get_or_init(|| IconTextureSet::create(uploader, renderer, config))
    }

    #[must_use]
    pub fn get(&self) -> Option<&IconTextureSet> {
        self.set.get()
    }
}

/// Software renderer for the media button glyphs.
///
/// Spinner rings fade along a sweep gradient so the rotation is visible.
#[derive(Debug, Clone)]
pub struct SkinIconRenderer {
    normal: RingShading,
    highlighted: RingShading,
}

#[derive(Debug, Clone)]
struct RingShading {
    color: [u8; 3],
    sweep: colorgrad::LinearGradient,
}

impl RingShading {
    fn new([r, g, b]: [f32; 3]) -> Result<Self, colorgrad::GradientBuilderError> {
        let sweep = colorgrad::GradientBuilder::new()
            .colors(&[
                Color::from_linear_rgba(r, g, b, 0.0),
                Color::from_linear_rgba(r, g, b, 1.0),
            ])
            .mode(colorgrad::BlendMode::LinearRgb)
            .build::<colorgrad::LinearGradient>()?;

        let [r, g, b, _] = Color::from_linear_rgba(r, g, b, 1.0).to_rgba8();

        Ok(Self {
            color: [r, g, b],
            sweep,
        })
    }
}

impl SkinIconRenderer {
    pub fn new(config: &Config) -> Result<Self, colorgrad::GradientBuilderError> {
        Ok(Self {
            normal: RingShading::new(config.glyph_color(false))?,
            highlighted: RingShading::new(config.glyph_color(true))?,
        })
    }
}

impl IconRenderer for SkinIconRenderer {
    fn render_icon(
        &self,
        target: &mut RgbaImage,
        dest: IntRect,
        kind: IconKind,
        highlighted: bool,
    ) {
        if dest.width <= 0 || dest.height <= 0 {
            return;
        }

        let shading = if highlighted {
            &self.highlighted
        } else {
            &self.normal
        };
        let (dmin, dmax) = shading.sweep.domain();
        let width = dest.width as f32;
        let height = dest.height as f32;

        target
            .par_enumerate_pixels_mut()
            .for_each(|(x, y, pixel)| {
                let (x, y) = (x as i32, y as i32);
                if x < dest.x || y < dest.y || x >= dest.right() || y >= dest.bottom() {
                    return;
                }

                // unit coordinates centered on the icon
                let u = ((x - dest.x) as f32 + 0.5) / width - 0.5;
                let v = ((y - dest.y) as f32 + 0.5) / height - 0.5;
                let radius = (u * u + v * v).sqrt();
                let turn = (v.atan2(u) / std::f32::consts::TAU).rem_euclid(1.0);

                let source = match kind {
                    IconKind::SpinnerOuter => ring(radius, 0.36, 0.48).then(|| {
                        shading.sweep.at(dmin + turn * (dmax - dmin)).to_rgba8()
                    }),
                    IconKind::SpinnerInner => ring(radius, 0.20, 0.30).then(|| {
                        shading
                            .sweep
                            .at(dmax - turn * (dmax - dmin))
                            .to_rgba8()
                    }),
                    IconKind::Video => {
                        if play_triangle(u + 0.5, v + 0.5) {
                            let [r, g, b] = shading.color;
                            Some([r, g, b, 0xFF])
                        } else if radius <= 0.46 {
                            Some([0, 0, 0, 0x8C])
                        } else {
                            None
                        }
                    }
                };

                if let Some(source) = source {
                    blend_over(&mut pixel.0, source);
                }
            });
    }
}

fn ring(radius: f32, inner: f32, outer: f32) -> bool {
    (inner..=outer).contains(&radius)
}

/// Right-pointing play glyph, in unit icon coordinates.
fn play_triangle(x: f32, y: f32) -> bool {
    const LEFT: f32 = 0.38;
    const RIGHT: f32 = 0.72;
    const TOP: f32 = 0.30;
    const BOTTOM: f32 = 0.70;

    if !(LEFT..=RIGHT).contains(&x) {
        return false;
    }

    let half = (BOTTOM - TOP) / 2.0 * (1.0 - (x - LEFT) / (RIGHT - LEFT));
    (y - 0.5).abs() <= half
}

/// Straight-alpha source-over.
fn blend_over(dest: &mut [u8; 4], source: [u8; 4]) {
    let sa = f32::from(source[3]) / 255.0;
    let da = f32::from(dest[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dest = [0; 4];
        return;
    }

    for channel in 0..3 {
        let s = f32::from(source[channel]) * sa;
        let d = f32::from(dest[channel]) * da * (1.0 - sa);
        dest[channel] = ((s + d) / out_a).round().clamp(0.0, 255.0) as u8;
    }
    dest[3] = (out_a * 255.0).round() as u8;
}
