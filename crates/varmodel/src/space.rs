//! The normalized coordinate frame a model works in.

use mutatio_designspace::{
    AxisModel, Location,
    axis::{normalize_value, piecewise_linear_map},
};

use crate::error::{ModelError, Result};

/// Values closer to zero than this are snapped to zero.
pub(crate) const EPSILON: f64 = 1e-9;

/// An axis as the model sees it: bounds are taken after the axis map.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAxis {
    pub name: String,
    pub minimum: f64,
    pub default: f64,
    pub maximum: f64,
    map: Vec<(f64, f64)>,
}

impl ModelAxis {
    /// Warps a design coordinate and normalizes it to `[-1, 1]`.
    pub fn normalize(&self, value: f64) -> f64 {
        let mapped = piecewise_linear_map(value, &self.map);
        snap(normalize_value(mapped, self.minimum, self.default, self.maximum))
    }
}

/// Ordered model axes.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpace {
    axes: Vec<ModelAxis>,
}

impl ModelSpace {
    pub fn new(axes: &AxisModel) -> Self {
        let axes = axes
            .iter()
            .map(|axis| {
                let (minimum, default, maximum) = axis.mapped_bounds();
                ModelAxis { name: axis.name.clone(), minimum, default, maximum, map: axis.map.clone() }
            })
            .collect();
        Self { axes }
    }

    pub fn axes(&self) -> &[ModelAxis] {
        &self.axes
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Fails if `location` names an axis outside this space.
    pub fn check(&self, location: &Location, context: &str) -> Result<()> {
        match location.axis_names().find(|name| !self.axes.iter().any(|axis| axis.name == *name)) {
            Some(axis) => Err(ModelError::UnknownAxis { axis: axis.to_string(), context: context.to_string() }),
            None => Ok(()),
        }
    }

    /// Normalized coordinates in axis order. Missing axes sit at their
    /// default, unknown axes are ignored, anisotropic values use their
    /// horizontal component.
    pub fn normalize(&self, location: &Location) -> Vec<f64> {
        self.axes.iter().map(|axis| location.value(&axis.name).map_or(0.0, |v| axis.normalize(v))).collect()
    }

    /// Renders normalized coordinates back into a location keyed by axis name.
    pub fn describe(&self, coords: &[f64]) -> Location {
        self.axes.iter().zip(coords).map(|(axis, v)| (axis.name.clone(), *v)).collect()
    }
}

pub(crate) fn snap(value: f64) -> f64 {
    if value.abs() < EPSILON { 0.0 } else { value }
}

pub(crate) fn same_coords(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < EPSILON)
}

#[cfg(test)]
mod tests {
    use mutatio_designspace::{Axis, Tag};

    use super::*;

    fn space() -> ModelSpace {
        let weight = Axis::new("weight", Tag::new(b"wght"), 100.0, 400.0, 900.0)
            .with_map([(100.0, 20.0), (400.0, 66.0), (900.0, 180.0)]);
        let width = Axis::new("width", Tag::new(b"wdth"), 50.0, 100.0, 100.0);
        ModelSpace::new(&AxisModel::from_axes([weight, width]).unwrap())
    }

    #[test]
    fn warped_bounds() {
        let space = space();
        let weight = &space.axes()[0];
        assert_eq!((weight.minimum, weight.default, weight.maximum), (20.0, 66.0, 180.0));
    }

    #[test]
    fn normalize_through_map() {
        let space = space();
        assert_eq!(space.normalize(&Location::new().with("weight", 900.0)), vec![1.0, 0.0]);
        // 650 maps to 66 + (180 - 66) * 0.5 = 123, halfway between default and maximum.
        assert_eq!(space.normalize(&Location::new().with("weight", 650.0)), vec![0.5, 0.0]);
        assert_eq!(space.normalize(&Location::new().with("width", 75.0)), vec![0.0, -0.5]);
    }

    #[test]
    fn unknown_axes() {
        let space = space();
        let location = Location::new().with("spooky", 1.0);
        assert_eq!(space.normalize(&location), vec![0.0, 0.0]);
        assert!(space.check(&location, "master 0").is_err());
    }
}
