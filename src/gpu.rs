// SPDX-License-Identifier: MPL-2.0

//! Capabilities borrowed from the GL context for the duration of a render pass.
//!
//! Draw calls never report failure. A quad drawn with
//! [`TextureId::INVALID`] must be a silent no-op in the implementation.

use image::DynamicImage;

use crate::geometry::{IntRect, IntSize, Rect, SurfaceMatrix, Transform};

/// GL texture name. Zero is never a valid texture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

impl TextureId {
    pub const INVALID: Self = Self(0);

    #[must_use]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Sampling filter for uploaded textures. Mipmaps are never generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

pub trait QuadRenderer {
    /// Draws `texture` over `geometry`, in layer space, through `transform`.
    fn draw_layer_quad(
        &mut self,
        transform: &Transform,
        geometry: &Rect,
        texture: TextureId,
        opacity: f32,
        force_blending: bool,
    );

    /// Draws an external video texture sampled through `sample_matrix`.
    fn draw_video_layer_quad(
        &mut self,
        transform: &Transform,
        sample_matrix: &SurfaceMatrix,
        geometry: &Rect,
        texture: TextureId,
    );

    /// Screen-space rectangle covered by a layer of `size` under `transform`.
    fn rect_in_screen_coord(&self, transform: &Transform, size: IntSize) -> IntRect;
}

pub trait TextureUploader {
    /// Creates a texture from `bitmap`.
    fn upload(&mut self, bitmap: &DynamicImage, filter: TextureFilter) -> eyre::Result<TextureId>;
}

/// The GL context as seen by a render pass.
pub trait Gpu: QuadRenderer + TextureUploader {}

impl<T: QuadRenderer + TextureUploader + ?Sized> Gpu for T {}
