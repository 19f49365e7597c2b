// SPDX-License-Identifier: MPL-2.0

//! Playback state driven by the media controller.
//!
//! The expected sequence is
//! `Initialized → Preparing → Prepared → Playing ⇄ Buffering`, but nothing
//! here enforces it: the controller is trusted, and any jump is stored as-is.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PlayerState {
    #[default]
    Initialized = 0,
    Preparing = 1,
    Prepared = 2,
    Playing = 3,
    Buffering = 4,
    Resetting = 5,
    Released = 6,
}

impl PlayerState {
    /// States in which a live frame is expected to be attached.
    #[must_use]
    pub fn shows_video(self) -> bool {
        matches!(self, Self::Prepared | Self::Playing | Self::Buffering)
    }
}

impl TryFrom<u8> for PlayerState {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Ok(match raw {
            0 => Self::Initialized,
            1 => Self::Preparing,
            2 => Self::Prepared,
            3 => Self::Playing,
            4 => Self::Buffering,
            5 => Self::Resetting,
            6 => Self::Released,
            other => return Err(other),
        })
    }
}

/// Player state shared between the media controller and the render thread.
///
/// Reads and writes are relaxed: a render pass may see the previous state
/// for one frame.
#[derive(Debug, Default)]
pub struct PlayerStateCell(AtomicU8);

impl PlayerStateCell {
    pub fn new(state: PlayerState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn set(&self, state: PlayerState) {
        self.0.store(state as u8, Ordering::Relaxed);
    }

    #[must_use]
    pub fn get(&self) -> PlayerState {
        // only valid discriminants are ever stored
        PlayerState::try_from(self.0.load(Ordering::Relaxed)).unwrap_or_default()
    }
}
