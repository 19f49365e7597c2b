// SPDX-License-Identifier: MPL-2.0

//! Compositor-side rendering of embedded video elements.
//!
//! A [`VideoLayer`] draws either the live decoder frame, the last frame the
//! compositor cached for it, or a poster plate, and overlays a spinning
//! progress indicator while the player prepares or buffers. The GL context,
//! the texture cache and the icon artwork are supplied by the embedder
//! through the traits in [`gpu`], [`cache`] and [`icons`].

pub mod cache;
pub mod geometry;
pub mod gpu;
pub mod icons;
pub mod layer;
pub mod observer;
pub mod player_state;
pub mod resources;
pub mod spinner;
pub mod surface;

#[cfg(test)]
mod testing;

pub use cache::{VideoLayerManager, VideoTextureCache};
pub use gpu::{Gpu, QuadRenderer, TextureFilter, TextureId, TextureUploader};
pub use icons::{IconKind, IconRenderer, IconTextureSet, SkinIconRenderer};
pub use layer::{DrawOutcome, LayerId, Treatment, VideoLayer};
pub use observer::{ObserverRegistry, VideoLayerObserver};
pub use player_state::PlayerState;
pub use resources::{RenderContext, SharedRenderResources};
pub use surface::{FrameSource, SurfaceFrame, SurfaceTexture};
pub use video_layer_config::Config;
