// SPDX-License-Identifier: MPL-2.0

use crate::geometry::{IntSize, Rect, center_inner_rect};
use crate::icons::IconTextureSet;
use crate::player_state::PlayerState;
use crate::resources::RenderContext;
use crate::spinner::show_progress_spinner;

use super::VideoLayer;

/// What a render pass drew for the body of the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Treatment {
    /// The live frame.
    Video,
    /// The live frame should have been drawn but its texture was evicted.
    MissingTexture,
    /// The last cached frame.
    Screenshot,
    /// The background plate, with the poster unless preparing.
    Poster,
    /// Nothing: the layer is smaller than the icon.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOutcome {
    pub treatment: Treatment,
    /// Whether the progress spinner was drawn on top.
    pub spinner: bool,
}

impl DrawOutcome {
    /// The spinner animates, so another frame is wanted.
    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.spinner
    }
}

impl VideoLayer {
    /// Draws the layer and reports its screen rectangle to the observer.
    ///
    /// Children are not drawn here; the caller continues the traversal.
    pub fn draw_gl(&self, ctx: &mut RenderContext<'_>) -> DrawOutcome {
        let resources = ctx.resources;
        let textures = *resources
            .icons()
            .ensure(&mut *ctx.gpu, ctx.icons, resources.config());

        let state = self.player_state();
        let bounds = Rect::from(self.size);
        let mut spinner = false;

        let treatment = if let Some(surface) = self.live_surface(state) {
            surface.update_tex_image();
            let matrix = surface.transform_matrix();

            let treatment = match ctx.cache.texture_id(self.id) {
                Some(texture) => {
                    ctx.gpu
                        .draw_video_layer_quad(&self.draw_transform, &matrix, &bounds, texture);
                    if state == PlayerState::Buffering {
                        spinner = self.overlay_spinner(ctx, &bounds, &textures);
                    }
                    Treatment::Video
                }
                None => {
                    // the cache frees textures under memory pressure
                    tracing::debug!(layer = self.id.0, "video layer has lost its texture");
                    Treatment::MissingTexture
                }
            };

            ctx.cache.update_matrix(self.id, &matrix);
            treatment
        } else {
            let treatment = match (ctx.cache.texture_id(self.id), ctx.cache.matrix(self.id)) {
                (Some(texture), Some(matrix)) => {
                    ctx.gpu
                        .draw_video_layer_quad(&self.draw_transform, &matrix, &bounds, texture);
                    Treatment::Screenshot
                }
                _ => self.draw_poster(ctx, &bounds, state, &textures),
            };

            if state == PlayerState::Preparing {
                spinner = self.overlay_spinner(ctx, &bounds, &textures);
            }
            treatment
        };

        self.notify_observer(ctx);

        let outcome = DrawOutcome { treatment, spinner };
        tracing::trace!(layer = self.id.0, ?state, ?outcome, "drew video layer");
        outcome
    }

    fn draw_poster(
        &self,
        ctx: &mut RenderContext<'_>,
        bounds: &Rect,
        state: PlayerState,
        textures: &IconTextureSet,
    ) -> Treatment {
        let Some(inner) = center_inner_rect(bounds, &ctx.resources.icon_rect()) else {
            return Treatment::Empty;
        };

        ctx.gpu
            .draw_layer_quad(&self.draw_transform, bounds, textures.background, 1.0, true);
        if state != PlayerState::Preparing {
            ctx.gpu
                .draw_layer_quad(&self.draw_transform, &inner, textures.poster, 1.0, true);
        }
        Treatment::Poster
    }

    fn overlay_spinner(
        &self,
        ctx: &mut RenderContext<'_>,
        bounds: &Rect,
        textures: &IconTextureSet,
    ) -> bool {
        let resources = ctx.resources;
        let Some(inner) = center_inner_rect(bounds, &resources.icon_rect()) else {
            return false;
        };

        show_progress_spinner(
            &mut *ctx.gpu,
            &self.draw_transform,
            &inner,
            textures,
            resources.rotation(),
            resources.config().rotate_step,
        );
        true
    }

    fn notify_observer(&self, ctx: &mut RenderContext<'_>) {
        let observer = self.registry.lock().observer(self.observer_slot);
        if let Some(observer) = observer {
            let rect = ctx
                .gpu
                .rect_in_screen_coord(&self.draw_transform, IntSize::from(self.size));
            observer.notify_rect_change(rect);
        }
    }
}
