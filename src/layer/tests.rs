// SPDX-License-Identifier: MPL-2.0

//! Render-pass tests for video layers.

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::sync::{Arc, Barrier};

    use video_layer_config::{Config, DEFAULT_ICON_SIZE};

    use super::super::{DrawOutcome, LayerId, Treatment, VideoLayer};
    use crate::cache::{VideoLayerManager, VideoTextureCache};
    use crate::geometry::{IDENTITY_MATRIX, IntRect, Rect, Size, SurfaceMatrix, Transform};
    use crate::gpu::{TextureFilter, TextureId};
    use crate::icons::IconTextureSet;
    use crate::observer::ObserverRegistry;
    use crate::player_state::PlayerState;
    use crate::resources::{RenderContext, SharedRenderResources};
    use crate::spinner::ring_transforms;
    use crate::surface::{SurfaceFrame, SurfaceTexture};
    use crate::testing::{BlankIcons, DrawCall, RecordingGpu, RecordingObserver};

    const WIDTH: f32 = 320.0;
    const HEIGHT: f32 = 180.0;

    struct Harness {
        resources: SharedRenderResources,
        cache: VideoLayerManager,
        gpu: RecordingGpu,
        registry: Arc<ObserverRegistry>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                resources: SharedRenderResources::default(),
                cache: VideoLayerManager::new(),
                gpu: RecordingGpu::default(),
                registry: ObserverRegistry::new(),
            }
        }

        fn layer(&self, id: u32, width: f32, height: f32) -> VideoLayer {
            let mut layer = VideoLayer::with_registry(LayerId(id), self.registry.clone());
            layer.set_size(Size::new(width, height));
            layer
        }

        fn draw(&mut self, layer: &VideoLayer) -> DrawOutcome {
            let mut ctx =
                RenderContext::new(&self.resources, &self.cache, &mut self.gpu, &BlankIcons);
            layer.draw_gl(&mut ctx)
        }

        fn textures(&self) -> IconTextureSet {
            *self.resources.icons().get().unwrap()
        }

        fn centered_icon(&self) -> Rect {
            Rect::from_xywh(128.0, 58.0, 64.0, 64.0)
        }
    }

    fn sample_matrix(scale: f32) -> SurfaceMatrix {
        let mut matrix = IDENTITY_MATRIX;
        matrix[0] = scale;
        matrix[5] = -scale;
        matrix
    }

    fn live_surface(matrix: SurfaceMatrix) -> Arc<SurfaceTexture> {
        let surface = Arc::new(SurfaceTexture::new(2));
        surface.push(SurfaceFrame::new(matrix, Some(1)));
        surface
    }

    fn body(rect: Rect, texture: TextureId) -> DrawCall {
        DrawCall::Layer {
            transform: Transform::IDENTITY,
            geometry: rect,
            texture,
        }
    }

    fn spinner_textures(draws: &[DrawCall], textures: &IconTextureSet) -> Vec<TextureId> {
        draws
            .iter()
            .map(DrawCall::texture)
            .filter(|t| *t == textures.spinner_outer || *t == textures.spinner_inner)
            .collect()
    }

    #[test]
    fn test_live_video() {
        let mut h = Harness::new();
        let mut layer = h.layer(1, WIDTH, HEIGHT);
        let matrix = sample_matrix(0.5);
        let surface = live_surface(matrix);
        layer.set_surface_texture(surface.clone(), 7, PlayerState::Playing);
        h.cache.register_texture(LayerId(1), TextureId(7));

        let outcome = h.draw(&layer);

        assert_eq!(
            outcome,
            DrawOutcome {
                treatment: Treatment::Video,
                spinner: false
            }
        );
        assert!(!outcome.needs_redraw());
        assert_eq!(
            h.gpu.draws,
            vec![DrawCall::Video {
                transform: Transform::IDENTITY,
                sample_matrix: matrix,
                geometry: Rect::from_size(WIDTH, HEIGHT),
                texture: TextureId(7),
            }]
        );
        assert_eq!(h.cache.matrix(LayerId(1)), Some(matrix));
        assert_eq!(surface.stats().frames_latched, 1);
    }

    #[test]
    fn test_live_video_for_every_showing_state() {
        for state in [PlayerState::Prepared, PlayerState::Playing, PlayerState::Buffering] {
            let mut h = Harness::new();
            let mut layer = h.layer(1, WIDTH, HEIGHT);
            layer.set_surface_texture(live_surface(IDENTITY_MATRIX), 7, state);
            h.cache.register_texture(LayerId(1), TextureId(7));

            assert_eq!(h.draw(&layer).treatment, Treatment::Video, "{state:?}");
        }
    }

    #[test]
    fn test_evicted_texture_draws_nothing_but_updates_matrix() {
        let mut h = Harness::new();
        let mut layer = h.layer(2, WIDTH, HEIGHT);
        let matrix = sample_matrix(2.0);
        layer.set_surface_texture(live_surface(matrix), 9, PlayerState::Playing);

        let observer = Arc::new(RecordingObserver::default());
        layer.register_observer(Some(observer.clone()));

        let outcome = h.draw(&layer);

        assert_eq!(outcome.treatment, Treatment::MissingTexture);
        assert!(!outcome.spinner);
        assert!(h.gpu.draws.is_empty());
        assert_eq!(h.cache.matrix(LayerId(2)), Some(matrix));
        assert_eq!(observer.rects().len(), 1);
    }

    #[test]
    fn test_evicted_texture_while_buffering_has_no_spinner() {
        let mut h = Harness::new();
        let mut layer = h.layer(2, WIDTH, HEIGHT);
        layer.set_surface_texture(live_surface(IDENTITY_MATRIX), 9, PlayerState::Buffering);

        let outcome = h.draw(&layer);
        assert_eq!(outcome.treatment, Treatment::MissingTexture);
        assert!(!outcome.spinner);
        assert_eq!(h.resources.rotation().degrees(), 0.0);
    }

    #[test]
    fn test_buffering_overlays_spinner_on_video() {
        let mut h = Harness::new();
        let mut layer = h.layer(3, WIDTH, HEIGHT);
        layer.set_surface_texture(live_surface(IDENTITY_MATRIX), 4, PlayerState::Buffering);
        h.cache.register_texture(LayerId(3), TextureId(4));

        let outcome = h.draw(&layer);
        let textures = h.textures();

        assert_eq!(outcome.treatment, Treatment::Video);
        assert!(outcome.spinner);
        assert!(outcome.needs_redraw());
        assert_eq!(h.gpu.draws.len(), 3);
        assert_eq!(h.gpu.draws[0].texture(), TextureId(4));

        let inner = h.centered_icon();
        let (outer, reverse) = ring_transforms(&Transform::IDENTITY, &inner, 0.0);
        let ring = Rect::from_size(64.0, 64.0);
        assert_eq!(
            h.gpu.draws[1..],
            [
                DrawCall::Layer {
                    transform: outer,
                    geometry: ring,
                    texture: textures.spinner_outer,
                },
                DrawCall::Layer {
                    transform: reverse,
                    geometry: ring,
                    texture: textures.spinner_inner,
                },
            ]
        );
        assert_eq!(h.resources.rotation().degrees(), 12.0);
    }

    #[test]
    fn test_buffering_small_layer_has_no_spinner() {
        let mut h = Harness::new();
        let mut layer = h.layer(3, 48.0, 48.0);
        layer.set_surface_texture(live_surface(IDENTITY_MATRIX), 4, PlayerState::Buffering);
        h.cache.register_texture(LayerId(3), TextureId(4));

        let outcome = h.draw(&layer);

        assert_eq!(outcome.treatment, Treatment::Video);
        assert!(!outcome.spinner);
        assert_eq!(h.gpu.draws.len(), 1);
    }

    #[test]
    fn test_screenshot_fallback() {
        for state in [PlayerState::Initialized, PlayerState::Resetting, PlayerState::Released] {
            let mut h = Harness::new();
            let layer = h.layer(5, WIDTH, HEIGHT);
            let frozen = sample_matrix(0.25);
            h.cache.register_texture(LayerId(5), TextureId(11));
            h.cache.update_matrix(LayerId(5), &frozen);
            layer.set_player_state(state);

            let outcome = h.draw(&layer);

            assert_eq!(outcome.treatment, Treatment::Screenshot, "{state:?}");
            assert_eq!(
                h.gpu.draws,
                vec![DrawCall::Video {
                    transform: Transform::IDENTITY,
                    sample_matrix: frozen,
                    geometry: Rect::from_size(WIDTH, HEIGHT),
                    texture: TextureId(11),
                }]
            );
        }
    }

    #[test]
    fn test_playing_without_surface_uses_screenshot() {
        let mut h = Harness::new();
        let layer = h.layer(5, WIDTH, HEIGHT);
        layer.set_player_state(PlayerState::Playing);
        h.cache.register_texture(LayerId(5), TextureId(11));
        h.cache.update_matrix(LayerId(5), &IDENTITY_MATRIX);

        assert_eq!(h.draw(&layer).treatment, Treatment::Screenshot);
    }

    #[test]
    fn test_abandoned_surface_uses_screenshot() {
        let mut h = Harness::new();
        let mut layer = h.layer(5, WIDTH, HEIGHT);
        let surface = live_surface(IDENTITY_MATRIX);
        layer.set_surface_texture(surface.clone(), 11, PlayerState::Playing);
        h.cache.register_texture(LayerId(5), TextureId(11));
        h.cache.update_matrix(LayerId(5), &IDENTITY_MATRIX);

        surface.abandon();

        assert_eq!(h.draw(&layer).treatment, Treatment::Screenshot);
        assert_eq!(surface.stats().frames_latched, 0);
    }

    #[test]
    fn test_screenshot_needs_texture_and_matrix() {
        let mut h = Harness::new();
        let layer = h.layer(6, WIDTH, HEIGHT);
        h.cache.register_texture(LayerId(6), TextureId(12));
        assert_eq!(h.draw(&layer).treatment, Treatment::Poster);

        let mut h = Harness::new();
        let layer = h.layer(6, WIDTH, HEIGHT);
        h.cache.update_matrix(LayerId(6), &IDENTITY_MATRIX);
        assert_eq!(h.draw(&layer).treatment, Treatment::Poster);
    }

    #[test]
    fn test_poster_fallback() {
        let mut h = Harness::new();
        let layer = h.layer(7, WIDTH, HEIGHT);

        let outcome = h.draw(&layer);
        let textures = h.textures();

        assert_eq!(
            outcome,
            DrawOutcome {
                treatment: Treatment::Poster,
                spinner: false
            }
        );
        assert_eq!(
            h.gpu.draws,
            vec![
                body(Rect::from_size(WIDTH, HEIGHT), textures.background),
                body(h.centered_icon(), textures.poster),
            ]
        );
    }

    #[test]
    fn test_preparing_shows_spinner_instead_of_poster() {
        let mut h = Harness::new();
        let layer = h.layer(8, WIDTH, HEIGHT);
        layer.set_player_state(PlayerState::Preparing);

        let outcome = h.draw(&layer);
        let textures = h.textures();

        assert_eq!(outcome.treatment, Treatment::Poster);
        assert!(outcome.spinner);
        assert_eq!(h.gpu.draws.len(), 3);
        assert_eq!(h.gpu.draws[0], body(Rect::from_size(WIDTH, HEIGHT), textures.background));
        assert!(h.gpu.draws.iter().all(|d| d.texture() != textures.poster));
        assert_eq!(
            spinner_textures(&h.gpu.draws, &textures),
            vec![textures.spinner_outer, textures.spinner_inner]
        );
    }

    #[test]
    fn test_preparing_overlays_spinner_on_screenshot() {
        let mut h = Harness::new();
        let layer = h.layer(9, WIDTH, HEIGHT);
        layer.set_player_state(PlayerState::Preparing);
        h.cache.register_texture(LayerId(9), TextureId(13));
        h.cache.update_matrix(LayerId(9), &IDENTITY_MATRIX);

        let outcome = h.draw(&layer);
        let textures = h.textures();

        assert_eq!(outcome.treatment, Treatment::Screenshot);
        assert!(outcome.spinner);
        assert_eq!(h.gpu.draws[0].texture(), TextureId(13));
        assert_eq!(spinner_textures(&h.gpu.draws, &textures).len(), 2);
    }

    #[test]
    fn test_small_layer_draws_no_icons() {
        let sizes = [(63.0, 400.0), (400.0, 63.0), (10.0, 10.0), (0.0, 0.0)];
        for (width, height) in sizes {
            for state in [PlayerState::Initialized, PlayerState::Preparing] {
                let mut h = Harness::new();
                let layer = h.layer(10, width, height);
                layer.set_player_state(state);

                let outcome = h.draw(&layer);

                assert_eq!(
                    outcome,
                    DrawOutcome {
                        treatment: Treatment::Empty,
                        spinner: false
                    },
                    "{width}x{height} {state:?}"
                );
                assert!(h.gpu.draws.is_empty());
            }
        }
    }

    #[test]
    fn test_exact_fit_draws_icons() {
        let mut h = Harness::new();
        let layer = h.layer(10, 64.0, 64.0);
        assert_eq!(h.draw(&layer).treatment, Treatment::Poster);
        assert_eq!(h.gpu.draws.len(), 2);
    }

    #[test]
    fn test_spinners_share_rotation() {
        let mut h = Harness::new();
        let first = h.layer(11, WIDTH, HEIGHT);
        let second = h.layer(12, WIDTH, HEIGHT);
        first.set_player_state(PlayerState::Preparing);
        second.set_player_state(PlayerState::Preparing);

        h.draw(&first);
        let first_draws = h.gpu.take_draws();
        h.draw(&second);
        let second_draws = h.gpu.take_draws();
        let textures = h.textures();

        let outer_ring = |draws: &[DrawCall]| {
            draws.iter().find_map(|d| match d {
                DrawCall::Layer {
                    transform, texture, ..
                } if *texture == textures.spinner_outer => Some(*transform),
                _ => None,
            })
        };

        let inner = h.centered_icon();
        assert_eq!(
            outer_ring(&first_draws),
            Some(ring_transforms(&Transform::IDENTITY, &inner, 0.0).0)
        );
        assert_eq!(
            outer_ring(&second_draws),
            Some(ring_transforms(&Transform::IDENTITY, &inner, 12.0).0)
        );
        assert_eq!(h.resources.rotation().degrees(), 24.0);
    }

    #[test]
    fn test_icon_textures_created_on_first_draw() {
        let mut h = Harness::new();
        assert!(h.resources.icons().get().is_none());

        let layer = h.layer(13, WIDTH, HEIGHT);
        h.draw(&layer);
        h.draw(&layer);
        let other = h.layer(14, WIDTH, HEIGHT);
        h.draw(&other);

        assert_eq!(h.gpu.uploads.len(), 4);
        let background = h.gpu.uploads[0];
        assert_eq!((background.width, background.height), (2, 2));
        assert_eq!(background.filter, TextureFilter::Nearest);
        assert!(
            h.gpu.uploads[1..]
                .iter()
                .all(|u| (u.width, u.height, u.filter) == (64, 64, TextureFilter::Linear))
        );
    }

    #[test]
    fn test_concurrent_first_frames_share_textures() {
        const LAYERS: u32 = 8;

        let resources = SharedRenderResources::default();
        let cache = VideoLayerManager::new();
        let registry = ObserverRegistry::new();
        let next_texture = Arc::new(AtomicU32::new(1));
        let barrier = Barrier::new(LAYERS as usize);

        let results: Vec<(usize, TextureId)> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..LAYERS)
                .map(|id| {
                    let (resources, cache, barrier) = (&resources, &cache, &barrier);
                    let registry = registry.clone();
                    let next_texture = next_texture.clone();
                    scope.spawn(move || {
                        let mut gpu = RecordingGpu::sharing(next_texture);
                        let mut layer = VideoLayer::with_registry(LayerId(id), registry);
                        layer.set_size(Size::new(WIDTH, HEIGHT));

                        barrier.wait();
                        let mut ctx = RenderContext::new(resources, cache, &mut gpu, &BlankIcons);
                        layer.draw_gl(&mut ctx);
                        (gpu.uploads.len(), gpu.draws[0].texture())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let total_uploads: usize = results.iter().map(|(uploads, _)| uploads).sum();
        assert_eq!(total_uploads, 4);

        let background = resources.icons().get().unwrap().background;
        assert!(results.iter().all(|(_, texture)| *texture == background));
    }

    #[test]
    fn test_oversized_icon_config_draws_default_icons() {
        let mut h = Harness::new();
        h.resources = SharedRenderResources::new(Config::default().icon_size(4_000_000_000));
        let layer = h.layer(24, WIDTH, HEIGHT);

        let outcome = h.draw(&layer);
        let textures = h.textures();

        assert_eq!(outcome.treatment, Treatment::Poster);
        assert_eq!(h.gpu.draws[1], body(h.centered_icon(), textures.poster));
        assert!(
            h.gpu.uploads[1..]
                .iter()
                .all(|u| (u.width, u.height) == (DEFAULT_ICON_SIZE, DEFAULT_ICON_SIZE))
        );
    }

    #[test]
    fn test_failed_uploads_degrade_to_invalid_draws() {
        let mut h = Harness::new();
        h.gpu = RecordingGpu::failing();
        let layer = h.layer(15, WIDTH, HEIGHT);

        let outcome = h.draw(&layer);

        assert_eq!(outcome.treatment, Treatment::Poster);
        assert!(h.gpu.draws.iter().all(|d| d.texture() == TextureId::INVALID));
        assert_eq!(h.gpu.draws.len(), 2);
    }

    #[test]
    fn test_observer_notified_each_pass() {
        let mut h = Harness::new();
        let mut layer = h.layer(16, WIDTH, HEIGHT);
        layer.set_draw_transform(Transform::translation(10.0, 20.0));
        let observer = Arc::new(RecordingObserver::default());
        layer.register_observer(Some(observer.clone()));

        h.draw(&layer);
        layer.set_size(Size::new(640.5, 360.9));
        h.draw(&layer);

        assert_eq!(
            observer.rects(),
            vec![
                IntRect::new(10, 20, 320, 180),
                IntRect::new(10, 20, 640, 360),
            ]
        );
    }

    #[test]
    fn test_observer_reference_counting() {
        let h = Harness::new();
        let layer = h.layer(17, WIDTH, HEIGHT);
        let first = Arc::new(RecordingObserver::default());
        let second = Arc::new(RecordingObserver::default());

        layer.register_observer(Some(first.clone()));
        layer.register_observer(Some(first.clone()));
        assert_eq!(Arc::strong_count(&first), 2);

        layer.register_observer(Some(second.clone()));
        assert_eq!(Arc::strong_count(&first), 1);
        assert_eq!(Arc::strong_count(&second), 2);

        drop(layer);
        assert_eq!(Arc::strong_count(&second), 1);
        assert!(h.registry.lock().is_empty());
    }

    #[test]
    fn test_observer_moves_between_layers() {
        let mut h = Harness::new();
        let a = h.layer(18, WIDTH, HEIGHT);
        let b = h.layer(19, 100.0, 100.0);
        let observer = Arc::new(RecordingObserver::default());

        a.register_observer(Some(observer.clone()));
        h.draw(&a);
        a.register_observer(None);
        b.register_observer(Some(observer.clone()));
        h.draw(&a);
        h.draw(&b);

        assert_eq!(
            observer.rects(),
            vec![IntRect::new(0, 0, 320, 180), IntRect::new(0, 0, 100, 100)]
        );
        assert_eq!(Arc::strong_count(&observer), 2);
    }

    #[test]
    fn test_duplicate_drops_surface_and_observer() {
        let mut h = Harness::new();
        let mut layer = h.layer(20, WIDTH, HEIGHT);
        layer.set_draw_transform(Transform::translation(3.0, 4.0));
        layer.set_surface_texture(live_surface(IDENTITY_MATRIX), 21, PlayerState::Playing);
        let observer = Arc::new(RecordingObserver::default());
        layer.register_observer(Some(observer.clone()));

        let copy = layer.duplicate();

        assert_eq!(copy.id(), layer.id());
        assert_eq!(copy.player_state(), PlayerState::Playing);
        assert_eq!(copy.size(), layer.size());
        assert_eq!(copy.draw_transform(), layer.draw_transform());
        assert!(!copy.has_surface());
        assert!(!copy.has_observer());
        assert!(layer.has_observer());

        // without a surface the copy falls back to the poster
        assert_eq!(h.draw(&copy).treatment, Treatment::Poster);
        assert!(observer.rects().is_empty());

        drop(copy);
        assert!(layer.has_observer());
        assert_eq!(Arc::strong_count(&observer), 2);
    }

    #[test]
    fn test_state_set_from_another_thread() {
        let h = Harness::new();
        let layer = h.layer(22, WIDTH, HEIGHT);

        std::thread::scope(|scope| {
            scope.spawn(|| layer.set_player_state(PlayerState::Buffering));
        });

        assert_eq!(layer.player_state(), PlayerState::Buffering);
    }

    #[test]
    fn test_detach_surface() {
        let mut h = Harness::new();
        let mut layer = h.layer(23, WIDTH, HEIGHT);
        layer.set_surface_texture(live_surface(IDENTITY_MATRIX), 1, PlayerState::Playing);
        h.cache.register_texture(LayerId(23), TextureId(1));
        assert_eq!(h.draw(&layer).treatment, Treatment::Video);

        assert!(layer.detach_surface().is_some());
        // the matrix stored by the live frame now backs the screenshot
        assert_eq!(h.draw(&layer).treatment, Treatment::Screenshot);
    }
}
