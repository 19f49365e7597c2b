// SPDX-License-Identifier: MPL-2.0

//! Drives a few video layers through a player's lifecycle against a GL
//! context that only logs what it would draw.

use std::path::PathBuf;
use std::sync::Arc;

use eyre::{WrapErr, eyre};
use image::DynamicImage;
use tracing::Level;
use video_layer::geometry::{
    IDENTITY_MATRIX, IntRect, IntSize, Rect, Size, SurfaceMatrix, Transform,
};
use video_layer::{
    Config, DrawOutcome, LayerId, PlayerState, QuadRenderer, RenderContext, SharedRenderResources,
    SkinIconRenderer, SurfaceFrame, SurfaceTexture, TextureFilter, TextureId, TextureUploader,
    VideoLayer, VideoLayerManager, VideoLayerObserver,
};

/// Nanoseconds between frames of a 60 Hz stream.
const FRAME_INTERVAL_NS: u64 = 16_666_667;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    init_logger();

    let config = load_config(std::env::args_os().nth(1).map(PathBuf::from))?;
    let renderer = SkinIconRenderer::new(&config).wrap_err("failed to build icon shading")?;
    let resources = SharedRenderResources::new(config);
    let cache = VideoLayerManager::new();
    let mut gpu = LoggingGpu::default();

    let mut demo = Demo {
        resources: &resources,
        cache: &cache,
        gpu: &mut gpu,
        renderer: &renderer,
        pts: 0,
    };

    let id = LayerId(1);
    let mut layer = VideoLayer::new(id);
    layer.set_size(Size::new(640.0, 360.0));
    layer.set_draw_transform(Transform::translation(32.0, 48.0));
    layer.register_observer(Some(Arc::new(LoggingObserver)));

    // nothing decoded yet
    demo.frame("initialized", &layer);
    layer.set_player_state(PlayerState::Preparing);
    for _ in 0..3 {
        demo.frame("preparing", &layer);
    }

    let surface = Arc::new(SurfaceTexture::with_default_capacity());
    layer.set_surface_texture(surface.clone(), 7, PlayerState::Prepared);
    cache.register_texture(id, TextureId(7));
    demo.decode(&surface, IDENTITY_MATRIX);
    demo.frame("prepared", &layer);

    layer.set_player_state(PlayerState::Playing);
    let flipped = flip_y(IDENTITY_MATRIX);
    for _ in 0..3 {
        demo.decode(&surface, flipped);
        demo.frame("playing", &layer);
    }

    layer.set_player_state(PlayerState::Buffering);
    for _ in 0..2 {
        demo.frame("buffering", &layer);
    }

    if let Some(evicted) = cache.evict_texture(id) {
        tracing::info!(texture = evicted.0, "cache evicted the video texture");
    }
    layer.set_player_state(PlayerState::Playing);
    demo.decode(&surface, flipped);
    demo.frame("evicted", &layer);

    cache.register_texture(id, TextureId(8));
    demo.decode(&surface, flipped);
    demo.frame("restored", &layer);

    // a scene snapshot carries no surface, so it shows the cached frame
    let snapshot = layer.duplicate();
    demo.frame("snapshot", &snapshot);

    surface.abandon();
    layer.set_player_state(PlayerState::Released);
    demo.frame("released", &layer);

    let tiny = {
        let mut tiny = VideoLayer::new(LayerId(2));
        tiny.set_size(Size::new(40.0, 30.0));
        tiny.set_player_state(PlayerState::Preparing);
        tiny
    };
    demo.frame("tiny", &tiny);

    let stats = surface.stats();
    tracing::info!(
        pushed = stats.frames_pushed,
        dropped = stats.frames_dropped,
        latched = stats.frames_latched,
        reused = stats.frames_reused,
        quads = gpu.quads,
        textures = gpu.next_texture - 1,
        "demo finished"
    );

    Ok(())
}

fn init_logger() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Reads the RON file given on the command line, or the cosmic-config entry.
fn load_config(path: Option<PathBuf>) -> eyre::Result<Config> {
    if let Some(path) = path {
        let text = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        return Config::from_ron(&text).map_err(|why| eyre!("{}: {why}", path.display()));
    }

    match Config::helper() {
        Ok(context) => Ok(Config::load_or_default(&context)),
        Err(why) => {
            tracing::warn!(?why, "cosmic-config unavailable, using defaults");
            Ok(Config::default())
        }
    }
}

fn flip_y(mut matrix: SurfaceMatrix) -> SurfaceMatrix {
    matrix[5] = -1.0;
    matrix[13] = 1.0;
    matrix
}

struct Demo<'a> {
    resources: &'a SharedRenderResources,
    cache: &'a VideoLayerManager,
    gpu: &'a mut LoggingGpu,
    renderer: &'a SkinIconRenderer,
    pts: u64,
}

impl Demo<'_> {
    fn decode(&mut self, surface: &SurfaceTexture, matrix: SurfaceMatrix) {
        if !surface.push(SurfaceFrame::new(matrix, Some(self.pts))) {
            tracing::warn!(pts = self.pts, "decoder frame rejected");
        }
        self.pts += FRAME_INTERVAL_NS;
    }

    fn frame(&mut self, label: &str, layer: &VideoLayer) -> DrawOutcome {
        let mut ctx = RenderContext::new(self.resources, self.cache, &mut *self.gpu, self.renderer);
        let outcome = layer.draw_gl(&mut ctx);
        tracing::info!(
            label,
            layer = layer.id().0,
            treatment = ?outcome.treatment,
            redraw = outcome.needs_redraw(),
            "drew frame"
        );
        outcome
    }
}

/// GL context stand-in that logs draw calls and hands out texture names.
struct LoggingGpu {
    next_texture: u32,
    quads: usize,
}

impl Default for LoggingGpu {
    fn default() -> Self {
        Self {
            next_texture: 1,
            quads: 0,
        }
    }
}

impl QuadRenderer for LoggingGpu {
    fn draw_layer_quad(
        &mut self,
        transform: &Transform,
        geometry: &Rect,
        texture: TextureId,
        opacity: f32,
        force_blending: bool,
    ) {
        if !texture.is_valid() {
            return;
        }
        self.quads += 1;
        let (x, y) = transform.map_point(f64::from(geometry.left), f64::from(geometry.top));
        tracing::debug!(
            texture = texture.0,
            x,
            y,
            width = geometry.width(),
            height = geometry.height(),
            opacity,
            force_blending,
            "layer quad"
        );
    }

    fn draw_video_layer_quad(
        &mut self,
        transform: &Transform,
        sample_matrix: &SurfaceMatrix,
        geometry: &Rect,
        texture: TextureId,
    ) {
        if !texture.is_valid() {
            return;
        }
        self.quads += 1;
        let screen = transform.map_rect(geometry);
        tracing::debug!(
            texture = texture.0,
            ?screen,
            flipped = sample_matrix[5] < 0.0,
            "video quad"
        );
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

impl TextureUploader for LoggingGpu {
    fn upload(&mut self, bitmap: &DynamicImage, filter: TextureFilter) -> eyre::Result<TextureId> {
        let texture = TextureId(self.next_texture);
        self.next_texture += 1;
        tracing::debug!(
            texture = texture.0,
            width = bitmap.width(),
            height = bitmap.height(),
            ?filter,
            "uploaded texture"
        );
        Ok(texture)
    }
}

struct LoggingObserver;

impl VideoLayerObserver for LoggingObserver {
    fn notify_rect_change(&self, rect: IntRect) {
        tracing::debug!(?rect, "video layer moved");
    }
}
