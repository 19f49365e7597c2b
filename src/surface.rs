// SPDX-License-Identifier: MPL-2.0

//! Live frame sources for video layers.
//!
//! The decoder and the compositor run on different threads. Frames are
//! handed over through a small bounded queue owned by a [`SurfaceTexture`]:
//!
//! ```text
//! ┌─────────────┐
//! │ decoder     │
//! └─────┬───────┘
//!       │ push() - drops oldest if full
//!       ▼
//! ┌────────────────┐
//! │ SurfaceTexture │  ← bounded (2-4 frames)
//! └─────┬──────────┘
//!       │ update_tex_image() - keeps current frame if empty
//!       ▼
//! ┌─────────────┐
//! │ VideoLayer  │
//! └─────────────┘
//! ```
//!
//! - **Compositor never blocks on the queue**: contention or an empty queue
//!   keeps the currently latched frame.
//! - **Decoder never blocks**: the oldest frame is dropped when the queue is
//!   full.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::geometry::{IDENTITY_MATRIX, SurfaceMatrix};

/// Number of frames buffered between the decoder and the compositor.
pub const DEFAULT_QUEUE_CAPACITY: usize = 3;

/// Platform source of the most recent decoded frame.
pub trait FrameSource: Send + Sync {
    /// Whether the source can still produce frames.
    fn has_live_frame(&self) -> bool {
        true
    }

    /// Latches the latest frame into the layer's video texture.
    fn update_tex_image(&self);

    /// Sampling matrix of the latched frame.
    fn transform_matrix(&self) -> SurfaceMatrix;
}

/// A decoded frame waiting to be latched.
#[derive(Debug, Clone)]
pub struct SurfaceFrame {
    /// Sampling matrix the frame must be drawn with (crop, flip, rotation).
    pub transform: SurfaceMatrix,
    /// Presentation timestamp (nanoseconds from video start).
    pub pts_ns: Option<u64>,
    /// When this frame was queued.
    pub queued_at: Instant,
}

impl SurfaceFrame {
    pub fn new(transform: SurfaceMatrix, pts_ns: Option<u64>) -> Self {
        Self {
            transform,
            pts_ns,
            queued_at: Instant::now(),
        }
    }
}

/// Statistics about surface queue operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    /// Total frames pushed by the decoder.
    pub frames_pushed: u64,
    /// Frames dropped because the queue was full or contended.
    pub frames_dropped: u64,
    /// Frames latched by the compositor.
    pub frames_latched: u64,
    /// Times the compositor kept the current frame.
    pub frames_reused: u64,
}

/// Bounded single-producer, single-consumer frame source.
#[derive(Debug)]
pub struct SurfaceTexture {
    frames: Mutex<VecDeque<SurfaceFrame>>,
    capacity: usize,
    current: Mutex<Option<SurfaceFrame>>,
    abandoned: AtomicBool,
    stats_pushed: AtomicU64,
    stats_dropped: AtomicU64,
    stats_latched: AtomicU64,
    stats_reused: AtomicU64,
}

impl SurfaceTexture {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);

        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            current: Mutex::new(None),
            abandoned: AtomicBool::new(false),
            stats_pushed: AtomicU64::new(0),
            stats_dropped: AtomicU64::new(0),
            stats_latched: AtomicU64::new(0),
            stats_reused: AtomicU64::new(0),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }

    /// Queues a decoded frame (producer side).
    ///
    /// Returns `false` once the surface has been abandoned.
    pub fn push(&self, frame: SurfaceFrame) -> bool {
        if self.abandoned.load(Ordering::Acquire) {
            return false;
        }

        let Ok(mut frames) = self.frames.try_lock() else {
            self.stats_dropped.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(pts_ns = ?frame.pts_ns, "frame dropped: lock contention");
            return true;
        };

        if frames.len() >= self.capacity {
            if let Some(dropped) = frames.pop_front() {
                self.stats_dropped.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(
                    pts_ns = ?dropped.pts_ns,
                    age_ms = dropped.queued_at.elapsed().as_millis(),
                    "frame dropped: queue full"
                );
            }
        }

        frames.push_back(frame);
        self.stats_pushed.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Stops accepting frames; the surface no longer counts as live.
    pub fn abandon(&self) {
        self.abandoned.store(true, Ordering::Release);
    }

    pub fn len(&self) -> usize {
        self.frames.try_lock().map_or(0, |frames| frames.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Presentation timestamp of the latched frame.
    pub fn current_pts(&self) -> Option<u64> {
        self.current().as_ref().and_then(|frame| frame.pts_ns)
    }

    /// The latched frame. Waits for readers such as
    /// [`current_pts`](Self::current_pts) instead of skipping the latch.
    fn current(&self) -> MutexGuard<'_, Option<SurfaceFrame>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stats(&self) -> SurfaceStats {
        SurfaceStats {
            frames_pushed: self.stats_pushed.load(Ordering::Relaxed),
            frames_dropped: self.stats_dropped.load(Ordering::Relaxed),
            frames_latched: self.stats_latched.load(Ordering::Relaxed),
            frames_reused: self.stats_reused.load(Ordering::Relaxed),
        }
    }
}

impl Default for SurfaceTexture {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl FrameSource for SurfaceTexture {
    fn has_live_frame(&self) -> bool {
        !self.abandoned.load(Ordering::Acquire)
    }

    fn update_tex_image(&self) {
        let next = self
            .frames
            .try_lock()
            .ok()
            .and_then(|mut frames| frames.pop_front());

        let Some(next) = next else {
            self.stats_reused.fetch_add(1, Ordering::Relaxed);
            return;
        };

        *self.current() = Some(next);
        self.stats_latched.fetch_add(1, Ordering::Relaxed);
    }

    fn transform_matrix(&self) -> SurfaceMatrix {
        self.current()
            .as_ref()
            .map_or(IDENTITY_MATRIX, |frame| frame.transform)
    }
}
