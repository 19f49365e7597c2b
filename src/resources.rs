// SPDX-License-Identifier: MPL-2.0

use video_layer_config::Config;

use crate::cache::VideoTextureCache;
use crate::geometry::Rect;
use crate::gpu::Gpu;
use crate::icons::{IconRenderer, IconTextureCache};
use crate::spinner::RotationAngle;

/// State shared by every video layer of a compositor.
///
/// Holds the lazily created icon textures and the spinner rotation. Both
/// tolerate render passes on several threads, although a compositor
/// normally draws from one.
#[derive(Debug, Default)]
pub struct SharedRenderResources {
    config: Config,
    icons: IconTextureCache,
    rotation: RotationAngle,
}

impl SharedRenderResources {
    /// Out-of-range settings are replaced by their defaults.
    pub fn new(config: Config) -> Self {
        Self {
            config: config.validated(),
            icons: IconTextureCache::new(),
            rotation: RotationAngle::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn icons(&self) -> &IconTextureCache {
        &self.icons
    }

    pub fn rotation(&self) -> &RotationAngle {
        &self.rotation
    }

    /// Default-positioned rectangle of the poster and spinner icons.
    #[must_use]
    pub fn icon_rect(&self) -> Rect {
        let extent = self.config.icon_extent();
        Rect::from_size(extent, extent)
    }
}

/// Collaborators borrowed by one render pass.
pub struct RenderContext<'a> {
    pub resources: &'a SharedRenderResources,
    pub cache: &'a dyn VideoTextureCache,
    pub gpu: &'a mut dyn Gpu,
    pub icons: &'a dyn IconRenderer,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        resources: &'a SharedRenderResources,
        cache: &'a dyn VideoTextureCache,
        gpu: &'a mut dyn Gpu,
        icons: &'a dyn IconRenderer,
    ) -> Self {
        Self {
            resources,
            cache,
            gpu,
            icons,
        }
    }
}
