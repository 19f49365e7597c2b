// SPDX-License-Identifier: MPL-2.0

//! Recording collaborators for render-pass tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, RgbaImage};

use crate::geometry::{IntRect, IntSize, Rect, SurfaceMatrix, Transform};
use crate::gpu::{QuadRenderer, TextureFilter, TextureId, TextureUploader};
use crate::icons::{IconKind, IconRenderer};
use crate::observer::VideoLayerObserver;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Layer {
        transform: Transform,
        geometry: Rect,
        texture: TextureId,
    },
    Video {
        transform: Transform,
        sample_matrix: SurfaceMatrix,
        geometry: Rect,
        texture: TextureId,
    },
}

impl DrawCall {
    pub fn texture(&self) -> TextureId {
        match self {
            Self::Layer { texture, .. } | Self::Video { texture, .. } => *texture,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upload {
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
    pub filter: TextureFilter,
}

/// GL context that records every call. Texture names come from a counter
/// that may be shared between several instances.
#[derive(Debug)]
pub struct RecordingGpu {
    pub draws: Vec<DrawCall>,
    pub uploads: Vec<Upload>,
    next_texture: Arc<AtomicU32>,
    fail_uploads: bool,
}

impl Default for RecordingGpu {
    fn default() -> Self {
        Self::sharing(Arc::new(AtomicU32::new(100)))
    }
}

impl RecordingGpu {
    pub fn sharing(next_texture: Arc<AtomicU32>) -> Self {
        Self {
            draws: Vec::new(),
            uploads: Vec::new(),
            next_texture,
            fail_uploads: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn take_draws(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draws)
    }
}

impl QuadRenderer for RecordingGpu {
    fn draw_layer_quad(
        &mut self,
        transform: &Transform,
        geometry: &Rect,
        texture: TextureId,
        opacity: f32,
        force_blending: bool,
    ) {
        assert_eq!(opacity, 1.0);
        assert!(force_blending);
        self.draws.push(DrawCall::Layer {
            transform: *transform,
            geometry: *geometry,
            texture,
        });
    }

    fn draw_video_layer_quad(
        &mut self,
        transform: &Transform,
        sample_matrix: &SurfaceMatrix,
        geometry: &Rect,
        texture: TextureId,
    ) {
        self.draws.push(DrawCall::Video {
            transform: *transform,
            sample_matrix: *sample_matrix,
            geometry: *geometry,
            texture,
        });
    }

    fn rect_in_screen_coord(&self, transform: &Transform, size: IntSize) -> IntRect {
        let mapped = transform.map_rect(&Rect::from_size(size.width as f32, size.height as f32));
        IntRect::new(
            mapped.left.round() as i32,
            mapped.top.round() as i32,
            mapped.width().round() as i32,
            mapped.height().round() as i32,
        )
    }
}

impl TextureUploader for RecordingGpu {
    fn upload(&mut self, bitmap: &DynamicImage, filter: TextureFilter) -> eyre::Result<TextureId> {
        if self.fail_uploads {
            eyre::bail!("glGenTextures failed");
        }

        let texture = TextureId(self.next_texture.fetch_add(1, Ordering::SeqCst));
        self.uploads.push(Upload {
            texture,
            width: bitmap.width(),
            height: bitmap.height(),
            filter,
        });
        Ok(texture)
    }
}

/// Icon renderer that leaves bitmaps untouched.
pub struct BlankIcons;

impl IconRenderer for BlankIcons {
    fn render_icon(&self, _: &mut RgbaImage, _: IntRect, _: IconKind, _: bool) {}
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub rects: Mutex<Vec<IntRect>>,
}

impl RecordingObserver {
    pub fn rects(&self) -> Vec<IntRect> {
        self.rects.lock().unwrap().clone()
    }
}

impl VideoLayerObserver for RecordingObserver {
    fn notify_rect_change(&self, rect: IntRect) {
        self.rects.lock().unwrap().push(rect);
    }
}
