// SPDX-License-Identifier: MPL-2.0

//! Layer-space and screen-space geometry used by the render pass.

use std::ops::Mul;

/// Column-major 4x4 texture sampling matrix reported by a frame source.
pub type SurfaceMatrix = [f32; 16];

pub const IDENTITY_MATRIX: SurfaceMatrix = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Floating point size of a layer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Integer size handed to the screen-space mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IntSize {
    pub width: i32,
    pub height: i32,
}

impl IntSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl From<Size> for IntSize {
    fn from(size: Size) -> Self {
        Self::new(size.width as i32, size.height as i32)
    }
}

/// Integer rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IntRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl IntRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

/// Edge-based rectangle in layer coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_ltrb(x, y, x + width, y + height)
    }

    /// Rectangle anchored at the origin.
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::from_ltrb(0.0, 0.0, width, height)
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// True unless both extents are strictly positive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.left < self.right && self.top < self.bottom)
    }

    /// Whether `other` lies entirely inside `self`. Edges may coincide;
    /// empty rectangles are never contained and never contain.
    #[must_use]
    pub fn contains(&self, other: &Rect) -> bool {
        !other.is_empty()
            && !self.is_empty()
            && self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    pub fn offset(&mut self, dx: f32, dy: f32) {
        self.left += dx;
        self.right += dx;
        self.top += dy;
        self.bottom += dy;
    }
}

impl From<Size> for Rect {
    fn from(size: Size) -> Self {
        Rect::from_size(size.width, size.height)
    }
}

/// Centers `inner` inside `bounds`.
///
/// The icon is only placed when `bounds` fully contains `inner` at its
/// default position; it is never clipped or scaled to fit.
#[must_use]
pub fn center_inner_rect(bounds: &Rect, inner: &Rect) -> Option<Rect> {
    if !bounds.contains(inner) {
        return None;
    }

    let mut centered = *inner;
    centered.offset(
        (bounds.width() - inner.width()) / 2.0,
        (bounds.height() - inner.height()) / 2.0,
    );
    Some(centered)
}

/// Drawing transform of a layer, row-major, applied to column vectors.
///
/// `translate` and `rotate` post-multiply, so the last call acts first on
/// the geometry being drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    m: [[f64; 4]; 4],
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn translation(tx: f64, ty: f64) -> Self {
        let mut t = Self::IDENTITY;
        t.m[0][3] = tx;
        t.m[1][3] = ty;
        t
    }

    pub fn rotation(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let mut r = Self::IDENTITY;
        r.m[0][0] = cos;
        r.m[0][1] = -sin;
        r.m[1][0] = sin;
        r.m[1][1] = cos;
        r
    }

    pub fn translate(&mut self, tx: f64, ty: f64) -> &mut Self {
        *self = *self * Self::translation(tx, ty);
        self
    }

    /// Rotates about the z axis. Any angle is accepted; it is reduced by the
    /// trigonometric functions.
    pub fn rotate(&mut self, degrees: f64) -> &mut Self {
        *self = *self * Self::rotation(degrees);
        self
    }

    #[must_use]
    pub fn multiply(&self, other: &Transform) -> Transform {
        let mut out = [[0.0; 4]; 4];
        for (row, out_row) in out.iter_mut().enumerate() {
            for (col, cell) in out_row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.m[row][k] * other.m[k][col]).sum();
            }
        }
        Transform { m: out }
    }

    #[must_use]
    pub fn map_point(&self, x: f64, y: f64) -> (f64, f64) {
        let m = &self.m;
        let mx = m[0][0] * x + m[0][1] * y + m[0][3];
        let my = m[1][0] * x + m[1][1] * y + m[1][3];
        let w = m[3][0] * x + m[3][1] * y + m[3][3];
        if w == 1.0 || w == 0.0 {
            (mx, my)
        } else {
            (mx / w, my / w)
        }
    }

    /// Bounding box of `rect` after mapping its four corners.
    #[must_use]
    pub fn map_rect(&self, rect: &Rect) -> Rect {
        let corners = [
            self.map_point(rect.left.into(), rect.top.into()),
            self.map_point(rect.right.into(), rect.top.into()),
            self.map_point(rect.right.into(), rect.bottom.into()),
            self.map_point(rect.left.into(), rect.bottom.into()),
        ];

        let (mut left, mut top) = (f64::INFINITY, f64::INFINITY);
        let (mut right, mut bottom) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in corners {
            left = left.min(x);
            top = top.min(y);
            right = right.max(x);
            bottom = bottom.max(y);
        }

        Rect::from_ltrb(left as f32, top as f32, right as f32, bottom as f32)
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.multiply(&rhs)
    }
}
