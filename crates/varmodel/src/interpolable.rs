//! Values that can be blended.

use kurbo::{Point, Vec2};

/// A value supporting the two operations interpolation needs.
///
/// Implementations must be linear: `a.scale(f).add(&b.scale(g))` is the
/// weighted blend of `a` and `b`. Structural compatibility between masters
/// (same point count, same keys) is the implementor's concern.
pub trait Interpolable: Clone {
    fn scale(&self, factor: f64) -> Self;

    fn add(&self, other: &Self) -> Self;

    fn sub(&self, other: &Self) -> Self {
        self.add(&other.scale(-1.0))
    }

    /// Combines a value computed at the horizontal side of an anisotropic
    /// location with one computed at the vertical side.
    ///
    /// The default blends them evenly. Geometric types take horizontal
    /// coordinates from `x` and vertical ones from `y`.
    fn combine_anisotropic(x: &Self, y: &Self) -> Self {
        x.scale(0.5).add(&y.scale(0.5))
    }
}

impl Interpolable for f64 {
    fn scale(&self, factor: f64) -> Self {
        self * factor
    }

    fn add(&self, other: &Self) -> Self {
        self + other
    }
}

impl Interpolable for f32 {
    fn scale(&self, factor: f64) -> Self {
        (f64::from(*self) * factor) as f32
    }

    fn add(&self, other: &Self) -> Self {
        self + other
    }
}

/// Element-wise. A shorter vector is treated as padded with zeros.
impl Interpolable for Vec<f64> {
    fn scale(&self, factor: f64) -> Self {
        self.iter().map(|v| v * factor).collect()
    }

    fn add(&self, other: &Self) -> Self {
        let len = self.len().max(other.len());
        (0..len)
            .map(|i| self.get(i).copied().unwrap_or(0.0) + other.get(i).copied().unwrap_or(0.0))
            .collect()
    }
}

impl Interpolable for Vec2 {
    fn scale(&self, factor: f64) -> Self {
        *self * factor
    }

    fn add(&self, other: &Self) -> Self {
        *self + *other
    }

    fn combine_anisotropic(x: &Self, y: &Self) -> Self {
        Vec2::new(x.x, y.y)
    }
}

impl Interpolable for Point {
    fn scale(&self, factor: f64) -> Self {
        Point::new(self.x * factor, self.y * factor)
    }

    fn add(&self, other: &Self) -> Self {
        Point::new(self.x + other.x, self.y + other.y)
    }

    fn combine_anisotropic(x: &Self, y: &Self) -> Self {
        Point::new(x.x, y.y)
    }
}

/// Blends `values` with `weights`, skipping zero weights. Returns `None`
/// when every weight is zero.
pub fn weighted_sum<'a, V, I>(items: I) -> Option<V>
where
    V: Interpolable + 'a,
    I: IntoIterator<Item = (f64, &'a V)>,
{
    items.into_iter().filter(|(weight, _)| *weight != 0.0).fold(None, |acc, (weight, value)| {
        let term = value.scale(weight);
        Some(match acc {
            Some(sum) => sum.add(&term),
            None => term,
        })
    })
}
