// SPDX-License-Identifier: MPL-2.0

//! Progress spinner: two rings turning in opposite directions.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::geometry::{Rect, Transform};
use crate::gpu::QuadRenderer;
use crate::icons::IconTextureSet;

/// Rotation shared by every spinner on screen, in degrees.
///
/// The value only grows; consumers reduce it through the trigonometric
/// functions. All spinners animate in lockstep because each draw advances
/// the same accumulator.
#[derive(Debug, Default)]
pub struct RotationAngle(AtomicU64);

impl RotationAngle {
    pub fn new(degrees: f64) -> Self {
        Self(AtomicU64::new(degrees.to_bits()))
    }

    #[must_use]
    pub fn degrees(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Returns the angle to draw with and moves the accumulator by `step`.
    pub fn advance(&self, step: f64) -> f64 {
        let previous = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) + step).to_bits())
            })
            .unwrap_or_else(|bits| bits);
        f64::from_bits(previous)
    }
}

/// Ring transforms for a spinner placed at `inner` and turned by `degrees`.
///
/// Returns `(outer, inner)`: both rotate about the center of `inner`, the
/// outer ring clockwise and the inner ring counter-clockwise.
#[must_use]
pub fn ring_transforms(
    draw_transform: &Transform,
    inner: &Rect,
    degrees: f64,
) -> (Transform, Transform) {
    let half_width = f64::from(inner.width()) / 2.0;
    let half_height = f64::from(inner.height()) / 2.0;

    let mut center = *draw_transform;
    center
        .translate(inner.left.into(), inner.top.into())
        .translate(half_width, half_height);

    let mut outer = center;
    outer.rotate(degrees).translate(-half_width, -half_height);

    let mut reverse = center;
    reverse.rotate(-degrees).translate(-half_width, -half_height);

    (outer, reverse)
}

/// Draws the spinner over whatever is beneath `inner`.
///
/// Returns the angle the rings were drawn at.
pub fn show_progress_spinner<Q>(
    quads: &mut Q,
    draw_transform: &Transform,
    inner: &Rect,
    textures: &IconTextureSet,
    rotation: &RotationAngle,
    step: f64,
) -> f64
where
    Q: QuadRenderer + ?Sized,
{
    let degrees = rotation.advance(step);
    let (outer, reverse) = ring_transforms(draw_transform, inner, degrees);
    let size = Rect::from_size(inner.width(), inner.height());

    quads.draw_layer_quad(&outer, &size, textures.spinner_outer, 1.0, true);
    quads.draw_layer_quad(&reverse, &size, textures.spinner_inner, 1.0, true);

    degrees
}
