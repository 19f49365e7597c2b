// SPDX-License-Identifier: MPL-2.0

//! Compositor node for a single video element.
//!
//! Each frame the layer shows one of:
//! - the live video frame, when the player is prepared, playing or
//!   buffering and a frame source is attached,
//! - the last frame the compositor cached for it (screenshot),
//! - a flat plate with the poster icon,
//!
//! and overlays the progress spinner while preparing or buffering. See
//! [`VideoLayer::draw_gl`].

mod draw;

use std::sync::Arc;

pub use draw::{DrawOutcome, Treatment};

use crate::geometry::{Size, Transform};
use crate::observer::{ObserverRegistry, ObserverSlot, VideoLayerObserver};
use crate::player_state::{PlayerState, PlayerStateCell};
use crate::surface::FrameSource;

/// Stable identity of a layer across frames and copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u32);

pub struct VideoLayer {
    id: LayerId,
    player_state: PlayerStateCell,
    /// Only meaningful on the compositor thread; never carried into copies.
    surface: Option<Arc<dyn FrameSource>>,
    draw_transform: Transform,
    size: Size,
    registry: Arc<ObserverRegistry>,
    observer_slot: ObserverSlot,
}

impl VideoLayer {
    /// Creates a layer whose observer lives in the process-wide registry.
    pub fn new(id: LayerId) -> Self {
        Self::with_registry(id, ObserverRegistry::global())
    }

    pub fn with_registry(id: LayerId, registry: Arc<ObserverRegistry>) -> Self {
        let observer_slot = registry.allocate();
        Self {
            id,
            player_state: PlayerStateCell::new(PlayerState::Initialized),
            surface: None,
            draw_transform: Transform::IDENTITY,
            size: Size::default(),
            registry,
            observer_slot,
        }
    }

    /// Copies the layer for a new scene snapshot.
    ///
    /// The copy keeps the identity, state, transform and size. It starts
    /// without a frame source, which is attached again through
    /// [`set_surface_texture`](Self::set_surface_texture), and without an
    /// observer.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            id: self.id,
            player_state: PlayerStateCell::new(self.player_state()),
            surface: None,
            draw_transform: self.draw_transform,
            size: self.size,
            registry: Arc::clone(&self.registry),
            observer_slot: self.registry.allocate(),
        }
    }

    #[must_use]
    pub fn id(&self) -> LayerId {
        self.id
    }

    #[must_use]
    pub fn player_state(&self) -> PlayerState {
        self.player_state.get()
    }

    /// Overwrites the player state. Transitions are not validated.
    pub fn set_player_state(&self, state: PlayerState) {
        self.player_state.set(state);
    }

    /// Attaches the frame source of the active surface.
    pub fn set_surface_texture(
        &mut self,
        surface: Arc<dyn FrameSource>,
        texture_name: u32,
        state: PlayerState,
    ) {
        self.surface = Some(surface);
        self.player_state.set(state);
        tracing::debug!(
            layer = self.id.0,
            texture_name,
            ?state,
            "attached surface texture"
        );
    }

    pub fn detach_surface(&mut self) -> Option<Arc<dyn FrameSource>> {
        self.surface.take()
    }

    #[must_use]
    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Registers the listener for this layer's screen rectangle.
    ///
    /// Re-registering the current observer does nothing; `None` unregisters.
    pub fn register_observer(&self, observer: Option<Arc<dyn VideoLayerObserver>>) {
        let changed = self.registry.lock().register(self.observer_slot, observer);
        if changed {
            tracing::debug!(layer = self.id.0, "video layer observer changed");
        }
    }

    #[must_use]
    pub fn has_observer(&self) -> bool {
        self.registry.lock().observer(self.observer_slot).is_some()
    }

    #[must_use]
    pub fn draw_transform(&self) -> &Transform {
        &self.draw_transform
    }

    pub fn set_draw_transform(&mut self, transform: Transform) {
        self.draw_transform = transform;
    }

    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    /// The attached frame source, if the current state should show it.
    fn live_surface(&self, state: PlayerState) -> Option<&dyn FrameSource> {
        if !state.shows_video() {
            return None;
        }
        self.surface
            .as_deref()
            .filter(|surface| surface.has_live_frame())
    }
}

impl Drop for VideoLayer {
    fn drop(&mut self) {
        self.registry.lock().release(self.observer_slot);
    }
}

impl std::fmt::Debug for VideoLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoLayer")
            .field("id", &self.id)
            .field("player_state", &self.player_state())
            .field("has_surface", &self.surface.is_some())
            .field("size", &self.size)
            .field("observer_slot", &self.observer_slot)
            .finish()
    }
}

#[cfg(test)]
mod tests;
