//! Points in the design space.

use std::fmt;

use indexmap::IndexMap;

/// The coordinate of a location on a single axis.
///
/// Anisotropic values carry separate horizontal and vertical coordinates.
/// Everything that needs a single number (normalization, rule conditions)
/// uses the horizontal one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisValue {
    Scalar(f64),
    Anisotropic(f64, f64),
}

impl AxisValue {
    /// Horizontal component, or the scalar itself.
    pub fn x(self) -> f64 {
        match self {
            AxisValue::Scalar(v) | AxisValue::Anisotropic(v, _) => v,
        }
    }

    /// Vertical component, or the scalar itself.
    pub fn y(self) -> f64 {
        match self {
            AxisValue::Scalar(v) | AxisValue::Anisotropic(_, v) => v,
        }
    }

    pub fn is_anisotropic(self) -> bool {
        matches!(self, AxisValue::Anisotropic(..))
    }

    /// Applies `f` to every component, keeping the shape.
    pub fn map(self, mut f: impl FnMut(f64) -> f64) -> Self {
        match self {
            AxisValue::Scalar(v) => AxisValue::Scalar(f(v)),
            AxisValue::Anisotropic(x, y) => AxisValue::Anisotropic(f(x), f(y)),
        }
    }
}

impl From<f64> for AxisValue {
    fn from(value: f64) -> Self {
        AxisValue::Scalar(value)
    }
}

impl From<(f64, f64)> for AxisValue {
    fn from((x, y): (f64, f64)) -> Self {
        AxisValue::Anisotropic(x, y)
    }
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Scalar(v) => write!(f, "{v}"),
            AxisValue::Anisotropic(x, y) => write!(f, "({x}, {y})"),
        }
    }
}

/// A mapping from axis name to coordinate.
///
/// Insertion order is preserved for display and serialization, equality
/// ignores it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location(IndexMap<String, AxisValue>);

impl Location {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, axis: &str) -> Option<AxisValue> {
        self.0.get(axis).copied()
    }

    /// Horizontal coordinate on `axis`.
    pub fn value(&self, axis: &str) -> Option<f64> {
        self.get(axis).map(AxisValue::x)
    }

    pub fn insert(&mut self, axis: impl Into<String>, value: impl Into<AxisValue>) {
        self.0.insert(axis.into(), value.into());
    }

    pub fn with(mut self, axis: impl Into<String>, value: impl Into<AxisValue>) -> Self {
        self.insert(axis, value);
        self
    }

    pub fn remove(&mut self, axis: &str) -> Option<AxisValue> {
        self.0.shift_remove(axis)
    }

    pub fn contains(&self, axis: &str) -> bool {
        self.0.contains_key(axis)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, AxisValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn axis_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_anisotropic(&self) -> bool {
        self.0.values().any(|v| v.is_anisotropic())
    }

    /// Splits into a horizontal and a vertical location. Scalar coordinates
    /// appear unchanged in both halves.
    pub fn split(&self) -> (Location, Location) {
        let x = self.0.iter().map(|(k, v)| (k.clone(), AxisValue::Scalar(v.x()))).collect();
        let y = self.0.iter().map(|(k, v)| (k.clone(), AxisValue::Scalar(v.y()))).collect();
        (Location(x), Location(y))
    }

    /// Returns a copy where every axis of `defaults` missing here is filled in.
    pub fn merged_over(&self, defaults: &Location) -> Location {
        let mut merged = defaults.clone();
        for (name, value) in &self.0 {
            merged.0.insert(name.clone(), *value);
        }
        merged
    }

    /// Removes every axis whose name `keep` rejects, returning the removed names.
    pub fn retain_axes(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let mut dropped = Vec::new();
        self.0.retain(|name, _| {
            let kept = keep(name);
            if !kept {
                dropped.push(name.clone());
            }
            kept
        });
        dropped
    }

    /// Compares against another location with a tolerance, treating each
    /// missing axis as equal to `defaults`.
    pub fn approx_eq(&self, other: &Location, defaults: &Location, epsilon: f64) -> bool {
        let a = self.merged_over(defaults);
        let b = other.merged_over(defaults);
        a.len() == b.len()
            && a.0.iter().all(|(name, va)| match b.0.get(name) {
                Some(vb) => {
                    va.is_anisotropic() == vb.is_anisotropic()
                        && (va.x() - vb.x()).abs() <= epsilon
                        && (va.y() - vb.y()).abs() <= epsilon
                }
                None => false,
            })
    }
}

impl<K: Into<String>, V: Into<AxisValue>> FromIterator<(K, V)> for Location {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Location(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}
