//! Axes and the normalization of design coordinates.

use std::{ops::Deref, slice};

use font_types::Tag;
use indexmap::IndexMap;
use log::warn;

use crate::{
    error::{Error, Result},
    location::{AxisValue, Location},
};

/// Registered axes with their tags and default bounds.
const REGISTERED_AXES: &[(&str, &[u8; 4], f64, f64, f64)] = &[
    ("weight", b"wght", 1.0, 400.0, 1000.0),
    ("width", b"wdth", 50.0, 100.0, 200.0),
    ("optical", b"opsz", 6.0, 12.0, 1000.0),
    ("slant", b"slnt", -90.0, 0.0, 90.0),
    ("italic", b"ital", 0.0, 0.0, 1.0),
];

/// A single variation axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    pub tag: Tag,
    pub minimum: f64,
    pub default: f64,
    pub maximum: f64,
    /// Piecewise-linear warp as `(input, output)` pairs. Inputs are design
    /// coordinates, outputs are the coordinates the variation model sees.
    pub map: Vec<(f64, f64)>,
    pub hidden: bool,
    /// Localised display names keyed by language code.
    pub label_names: IndexMap<String, String>,
}

impl Axis {
    pub fn new(name: impl Into<String>, tag: Tag, minimum: f64, default: f64, maximum: f64) -> Self {
        Self {
            name: name.into(),
            tag,
            minimum,
            default,
            maximum,
            map: Vec::new(),
            hidden: false,
            label_names: IndexMap::new(),
        }
    }

    /// Creates an axis with the registered tag and bounds for `name`, or a
    /// derived tag and a 0..1000 range for unregistered names.
    pub fn registered(name: &str) -> Self {
        let (tag, _) = tag_for_axis_name(name);
        match REGISTERED_AXES.iter().find(|(n, ..)| *n == name) {
            Some(&(_, _, min, def, max)) => Self::new(name, tag, min, def, max),
            None => Self::new(name, tag, 0.0, 0.0, 1000.0),
        }
    }

    pub fn with_map(mut self, map: impl IntoIterator<Item = (f64, f64)>) -> Self {
        self.map = map.into_iter().collect();
        self
    }

    pub fn with_label_name(mut self, language: impl Into<String>, name: impl Into<String>) -> Self {
        self.label_names.insert(language.into(), name.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Checks that the name is set and the bounds are ordered.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidAxis { name: self.name.clone(), reason: "empty name".into() });
        }
        if !(self.minimum <= self.default && self.default <= self.maximum) {
            return Err(Error::InvalidAxis {
                name: self.name.clone(),
                reason: format!(
                    "bounds are not ordered: minimum {}, default {}, maximum {}",
                    self.minimum, self.default, self.maximum
                ),
            });
        }
        Ok(())
    }

    /// Maps a design coordinate to `[-1, 1]` using this axis' unwarped bounds.
    pub fn normalize_value(&self, value: f64) -> f64 {
        normalize_value(value, self.minimum, self.default, self.maximum)
    }

    /// Applies the axis map to a design coordinate.
    pub fn map_forward(&self, value: f64) -> f64 {
        piecewise_linear_map(value, &self.map)
    }

    /// Bounds after the axis map is applied, as `(minimum, default, maximum)`.
    pub fn mapped_bounds(&self) -> (f64, f64, f64) {
        (self.map_forward(self.minimum), self.map_forward(self.default), self.map_forward(self.maximum))
    }
}

/// Normalizes `value` against an axis' bounds.
///
/// The default maps to 0, the minimum to -1 and the maximum to 1, linearly on
/// each side. Values outside the bounds are clamped. A side with zero width
/// normalizes to 0.
pub fn normalize_value(value: f64, minimum: f64, default: f64, maximum: f64) -> f64 {
    if value == default {
        0.0
    } else if value < default {
        if default == minimum {
            return 0.0;
        }
        (value.max(minimum) - default) / (default - minimum)
    } else {
        if default == maximum {
            return 0.0;
        }
        (value.min(maximum) - default) / (maximum - default)
    }
}

/// Maps `value` through a piecewise-linear function given as `(input, output)`
/// pairs.
///
/// Outside the covered range the nearest end segment is continued with slope 1,
/// so values keep their offset from the closest key.
pub fn piecewise_linear_map(value: f64, mapping: &[(f64, f64)]) -> f64 {
    if mapping.is_empty() {
        return value;
    }
    if let Some(&(_, out)) = mapping.iter().find(|(input, _)| *input == value) {
        return out;
    }
    let mut keys: Vec<(f64, f64)> = mapping.to_vec();
    keys.sort_by(|a, b| a.0.total_cmp(&b.0));
    let (first_in, first_out) = keys[0];
    let (last_in, last_out) = keys[keys.len() - 1];
    if value < first_in {
        return value + first_out - first_in;
    }
    if value > last_in {
        return value + last_out - last_in;
    }
    let upper = keys.iter().position(|(input, _)| *input > value).unwrap_or(keys.len() - 1);
    let (a_in, a_out) = keys[upper - 1];
    let (b_in, b_out) = keys[upper];
    a_out + (b_out - a_out) * (value - a_in) / (b_in - a_in)
}

/// Returns the tag for a registered axis name or derives one from the name,
/// together with the registered display name when there is one.
///
/// Derived tags take the first four characters, padding short names with `*`.
pub fn tag_for_axis_name(name: &str) -> (Tag, Option<&'static str>) {
    if let Some(&(registered, tag, ..)) = REGISTERED_AXES.iter().find(|(n, ..)| *n == name) {
        return (Tag::new(tag), Some(registered));
    }
    let mut raw = [b'*'; 4];
    for (slot, byte) in raw.iter_mut().zip(name.bytes().filter(|b| (0x21..=0x7e).contains(b))) {
        *slot = byte;
    }
    (Tag::new(&raw), None)
}

/// Parses an axis tag of one to four printable characters.
pub fn parse_tag(raw: &str) -> Result<Tag> {
    raw.parse::<Tag>().map_err(|_| Error::InvalidTag(raw.to_string()))
}

/// The ordered set of axes of a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisModel {
    axes: Vec<Axis>,
}

impl AxisModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a model from `axes`, validating each and rejecting duplicates.
    pub fn from_axes(axes: impl IntoIterator<Item = Axis>) -> Result<Self> {
        let mut model = Self::new();
        for axis in axes {
            model.push(axis)?;
        }
        Ok(model)
    }

    pub fn push(&mut self, axis: Axis) -> Result<()> {
        axis.validate()?;
        if self.get(&axis.name).is_some() {
            return Err(Error::DuplicateAxis(axis.name));
        }
        self.axes.push(axis);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Axis> {
        self.axes.iter().find(|axis| axis.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Axis> {
        self.axes.iter_mut().find(|axis| axis.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.axes.iter().position(|axis| axis.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|axis| axis.name.as_str())
    }

    pub(crate) fn axes_mut(&mut self) -> slice::IterMut<'_, Axis> {
        self.axes.iter_mut()
    }

    /// Every axis at its default.
    pub fn default_location(&self) -> Location {
        self.axes.iter().map(|axis| (axis.name.clone(), axis.default)).collect()
    }

    /// Normalizes the axes present in `location` using the unwarped bounds.
    ///
    /// Axes missing from `location` are missing from the result; merge with
    /// [`AxisModel::default_location`] first for a full location. Anisotropic
    /// values normalize their horizontal component.
    pub fn normalize(&self, location: &Location) -> Location {
        self.axes
            .iter()
            .filter_map(|axis| {
                let value = location.get(&axis.name)?;
                Some((axis.name.clone(), axis.normalize_value(value.x())))
            })
            .collect()
    }

    /// Like [`AxisModel::normalize`], but normalizes both components of
    /// anisotropic values.
    pub fn normalize_components(&self, location: &Location) -> Location {
        self.axes
            .iter()
            .filter_map(|axis| {
                let value = location.get(&axis.name)?;
                Some((axis.name.clone(), value.map(|v| axis.normalize_value(v))))
            })
            .collect()
    }

    /// Removes axes not declared here. In strict mode the first undeclared
    /// axis is an error instead.
    pub fn validate_location(&self, location: &mut Location, strict: bool, context: &str) -> Result<()> {
        if strict && let Some(axis) = location.axis_names().find(|name| self.get(name).is_none()) {
            return Err(Error::UndeclaredAxis { axis: axis.to_string(), context: context.to_string() });
        }
        for axis in location.retain_axes(|name| self.get(name).is_some()) {
            warn!("{context} references undeclared axis '{axis}', ignoring it");
        }
        Ok(())
    }

    /// Applies each axis' map to the coordinates in `location`.
    pub fn map_forward(&self, location: &Location) -> Location {
        location
            .iter()
            .map(|(name, value)| {
                let value: AxisValue = match self.get(name) {
                    Some(axis) => value.map(|v| axis.map_forward(v)),
                    None => value,
                };
                (name.to_string(), value)
            })
            .collect()
    }
}

impl Deref for AxisModel {
    type Target = [Axis];

    fn deref(&self) -> &[Axis] {
        &self.axes
    }
}

impl<'a> IntoIterator for &'a AxisModel {
    type Item = &'a Axis;
    type IntoIter = slice::Iter<'a, Axis>;

    fn into_iter(self) -> Self::IntoIter {
        self.axes.iter()
    }
}
