// SPDX-License-Identifier: MPL-2.0

//! Cross-frame cache of video textures and their last sampling matrix.
//!
//! The cache outlives individual layer copies: a layer finds its texture by
//! [`LayerId`], and when no live frame is available the last matrix stored
//! here lets the layer redraw a frozen screenshot.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::geometry::SurfaceMatrix;
use crate::gpu::TextureId;
use crate::layer::LayerId;

/// Texture/matrix cache shared with the rest of the compositor.
///
/// Implementations are called from the render thread while other threads may
/// evict entries, so every method takes `&self`.
pub trait VideoTextureCache {
    /// Texture the layer's frames are drawn from, if it was not evicted.
    fn texture_id(&self, layer: LayerId) -> Option<TextureId>;

    /// Sampling matrix of the last frame rendered for the layer.
    fn matrix(&self, layer: LayerId) -> Option<SurfaceMatrix>;

    fn update_matrix(&self, layer: LayerId, matrix: &SurfaceMatrix);
}

#[derive(Debug, Clone, Default)]
struct CacheEntry {
    texture: Option<TextureId>,
    matrix: Option<SurfaceMatrix>,
}

/// In-process [`VideoTextureCache`].
#[derive(Debug, Default)]
pub struct VideoLayerManager {
    entries: Mutex<HashMap<LayerId, CacheEntry>>,
}

impl VideoLayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<LayerId, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Associates the texture a layer's surface renders into.
    pub fn register_texture(&self, layer: LayerId, texture: TextureId) {
        tracing::debug!(layer = layer.0, texture = texture.0, "registering video texture");
        self.entries().entry(layer).or_default().texture = Some(texture);
    }

    /// Frees the texture of a layer, keeping its last matrix.
    ///
    /// Returns the evicted texture.
    pub fn evict_texture(&self, layer: LayerId) -> Option<TextureId> {
        let evicted = self
            .entries()
            .get_mut(&layer)
            .and_then(|entry| entry.texture.take());
        if let Some(texture) = evicted {
            tracing::debug!(layer = layer.0, texture = texture.0, "evicted video texture");
        }
        evicted
    }

    /// Forgets everything about a layer.
    pub fn remove_layer(&self, layer: LayerId) -> bool {
        self.entries().remove(&layer).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VideoTextureCache for VideoLayerManager {
    fn texture_id(&self, layer: LayerId) -> Option<TextureId> {
        self.entries()
            .get(&layer)
            .and_then(|entry| entry.texture)
            .filter(|texture| texture.is_valid())
    }

    fn matrix(&self, layer: LayerId) -> Option<SurfaceMatrix> {
        self.entries().get(&layer).and_then(|entry| entry.matrix)
    }

    fn update_matrix(&self, layer: LayerId, matrix: &SurfaceMatrix) {
        self.entries().entry(layer).or_default().matrix = Some(*matrix);
    }
}
