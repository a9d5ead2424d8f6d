//! Variation models: per-master weights at arbitrary locations.

use log::debug;
use mutatio_designspace::{AxisModel, Location};

use crate::{
    error::{ModelError, Result},
    interpolable::{Interpolable, weighted_sum},
    mutator::MutatorEngine,
    space::{ModelSpace, same_coords, snap},
    supports::SupportEngine,
};

/// How masters are turned into weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Neutral master plus one delta per master, anchored at the bias.
    #[default]
    Mutator,
    /// Support regions per master, narrowed against earlier masters.
    Supports,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Mutator => "mutator",
            Strategy::Supports => "supports",
        }
    }
}

/// How the two halves of an anisotropic location are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum AnisotropyPolicy {
    /// Blend the horizontal and vertical results evenly.
    #[default]
    Even,
    /// Blend with `x` for the horizontal side and `1 - x` for the vertical.
    Weighted { x: f64 },
    /// Compute both sides in full and let the value type combine them.
    Componentwise,
}

impl AnisotropyPolicy {
    fn x_share(self) -> f64 {
        match self {
            AnisotropyPolicy::Even | AnisotropyPolicy::Componentwise => 0.5,
            AnisotropyPolicy::Weighted { x } => x,
        }
    }
}

/// Options for [`VariationModel::build`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelOptions {
    /// How master weights are computed.
    pub strategy: Strategy,
    /// How anisotropic locations are resolved.
    pub anisotropy: AnisotropyPolicy,
    /// Continue the outermost segments past the masters.
    pub extrapolate: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self { strategy: Strategy::default(), anisotropy: AnisotropyPolicy::default(), extrapolate: true }
    }
}

impl ModelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the weighting engine.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets how anisotropic locations are blended.
    pub fn anisotropy(mut self, anisotropy: AnisotropyPolicy) -> Self {
        self.anisotropy = anisotropy;
        self
    }

    /// With `false`, locations outside the masters are clamped to them.
    pub fn extrapolate(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Engine {
    Mutator(MutatorEngine),
    Supports(SupportEngine),
}

impl Engine {
    fn weights(&self, coords: &[f64]) -> Vec<f64> {
        match self {
            Engine::Mutator(engine) => engine.weights(coords),
            Engine::Supports(engine) => engine.weights(coords),
        }
    }
}

/// Masters placed in a design space, ready to produce instances.
#[derive(Debug, Clone)]
pub struct VariationModel<V> {
    space: ModelSpace,
    options: ModelOptions,
    bias: Vec<f64>,
    /// Normalized master coordinates, not bias-relative.
    locations: Vec<Vec<f64>>,
    masters: Vec<V>,
    neutral: usize,
    engine: Engine,
}

impl<V> VariationModel<V> {
    /// Builds a model from `(location, value)` masters.
    ///
    /// `bias` is the reference location, in design coordinates. The master
    /// there is the neutral and is reproduced exactly. Without a bias the
    /// [`Strategy::Mutator`] engine picks one from the master locations and
    /// [`Strategy::Supports`] uses the axis defaults.
    pub fn build(
        items: impl IntoIterator<Item = (Location, V)>,
        axes: &AxisModel,
        bias: Option<&Location>,
        options: ModelOptions,
    ) -> Result<Self> {
        let space = ModelSpace::new(axes);
        let mut locations = Vec::new();
        let mut masters = Vec::new();
        for (index, (location, value)) in items.into_iter().enumerate() {
            if location.is_anisotropic() {
                return Err(ModelError::AnisotropicMaster(index));
            }
            space.check(&location, &format!("master {index}"))?;
            locations.push(space.normalize(&location));
            masters.push(value);
        }
        if masters.is_empty() {
            return Err(ModelError::NoMasters);
        }
        for (second, b) in locations.iter().enumerate() {
            if let Some(first) = locations[..second].iter().position(|a| same_coords(a, b)) {
                return Err(ModelError::DuplicateLocation { first, second });
            }
        }

        let bias = match bias {
            Some(bias) => {
                space.check(bias, "bias")?;
                space.normalize(bias)
            }
            None if options.strategy == Strategy::Mutator => bias_from_locations(&locations),
            None => vec![0.0; space.len()],
        };
        let relative: Vec<Vec<f64>> = locations.iter().map(|loc| subtract(loc, &bias)).collect();
        let neutral = relative
            .iter()
            .position(|loc| loc.iter().all(|v| *v == 0.0))
            .ok_or_else(|| ModelError::NoNeutral(space.describe(&bias).to_string()))?;

        let engine = match options.strategy {
            Strategy::Mutator => Engine::Mutator(MutatorEngine::new(&relative, neutral, options.extrapolate)),
            Strategy::Supports => Engine::Supports(SupportEngine::new(&relative, options.extrapolate)),
        };
        debug!(
            "built {} model with {} masters, neutral {neutral} at {}",
            options.strategy.name(),
            masters.len(),
            space.describe(&bias)
        );
        Ok(Self { space, options, bias, locations, masters, neutral, engine })
    }

    /// Number of masters.
    pub fn len(&self) -> usize {
        self.masters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masters.is_empty()
    }

    /// Master values in build order.
    pub fn masters(&self) -> &[V] {
        &self.masters
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// The axes the model normalizes against.
    pub fn space(&self) -> &ModelSpace {
        &self.space
    }

    /// Index of the master at the bias location.
    pub fn neutral_index(&self) -> usize {
        self.neutral
    }

    /// The master at the bias location.
    pub fn neutral(&self) -> &V {
        &self.masters[self.neutral]
    }

    /// The master stored exactly at `location`, if any. Missing axes count as
    /// their defaults.
    pub fn get(&self, location: &Location) -> Option<&V> {
        if location.is_anisotropic() {
            return None;
        }
        let coords = self.space.normalize(location);
        self.locations.iter().position(|loc| same_coords(loc, &coords)).map(|i| &self.masters[i])
    }

    fn weights_at(&self, location: &Location) -> Vec<f64> {
        let coords = subtract(&self.space.normalize(location), &self.bias);
        self.engine.weights(&coords)
    }

    /// Per-master weights at `location`, indexed like the masters given to
    /// [`VariationModel::build`].
    ///
    /// For anisotropic locations the horizontal and vertical weights are
    /// blended according to the model's [`AnisotropyPolicy`].
    pub fn get_factors(&self, location: &Location) -> Vec<f64> {
        if !location.is_anisotropic() {
            return self.weights_at(location);
        }
        let (x, y) = location.split();
        let share = self.options.anisotropy.x_share();
        self.weights_at(&x)
            .iter()
            .zip(self.weights_at(&y))
            .map(|(wx, wy)| snap(wx * share + wy * (1.0 - share)))
            .collect()
    }
}

impl<V: Interpolable> VariationModel<V> {
    fn blend(&self, weights: &[f64]) -> V {
        weighted_sum(weights.iter().copied().zip(&self.masters))
            .unwrap_or_else(|| self.masters[self.neutral].scale(0.0))
    }

    /// Interpolates (or extrapolates) a value at `location`.
    pub fn make_instance(&self, location: &Location) -> V {
        if location.is_anisotropic() && self.options.anisotropy == AnisotropyPolicy::Componentwise {
            let (x, y) = location.split();
            let vx = self.blend(&self.weights_at(&x));
            let vy = self.blend(&self.weights_at(&y));
            return V::combine_anisotropic(&vx, &vy);
        }
        self.blend(&self.get_factors(location))
    }
}

fn subtract(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| snap(x - y)).collect()
}

/// Picks a reference location when none is given: the origin if a master
/// sits there, otherwise the master location that leaves the fewest other
/// masters off-axis relative to it.
pub(crate) fn bias_from_locations(locations: &[Vec<f64>]) -> Vec<f64> {
    if let Some(origin) = locations.iter().find(|loc| loc.iter().all(|v| *v == 0.0)) {
        return origin.clone();
    }
    let off_axis_count = |candidate: &Vec<f64>| {
        locations
            .iter()
            .filter(|loc| {
                let differing = loc.iter().zip(candidate).filter(|(a, b)| (*a - *b).abs() > 0.0).count();
                differing > 1
            })
            .count()
    };
    locations.iter().min_by_key(|candidate| off_axis_count(candidate)).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use mutatio_designspace::{Axis, Tag};
    use pretty_assertions::assert_eq;

    use super::*;

    fn axes() -> AxisModel {
        AxisModel::from_axes([
            Axis::new("weight", Tag::new(b"wght"), 100.0, 400.0, 900.0),
            Axis::new("width", Tag::new(b"wdth"), 50.0, 100.0, 100.0),
        ])
        .unwrap()
    }

    fn weight(value: f64) -> Location {
        Location::new().with("weight", value)
    }

    #[test]
    fn needs_masters() {
        let err = VariationModel::<f64>::build([], &axes(), None, ModelOptions::default()).unwrap_err();
        assert_eq!(err, ModelError::NoMasters);
    }

    #[test]
    fn duplicate_locations() {
        let items = [(weight(400.0), 1.0), (Location::new(), 2.0)];
        let err = VariationModel::build(items, &axes(), None, ModelOptions::default()).unwrap_err();
        assert_eq!(err, ModelError::DuplicateLocation { first: 0, second: 1 });
    }

    #[test]
    fn missing_neutral() {
        let items = [(weight(100.0), 1.0), (weight(900.0), 2.0)];
        let bias = weight(400.0);
        for strategy in [Strategy::Mutator, Strategy::Supports] {
            let err = VariationModel::build(items.clone(), &axes(), Some(&bias), ModelOptions::new().strategy(strategy))
                .unwrap_err();
            assert!(matches!(err, ModelError::NoNeutral(_)));
        }
    }

    #[test]
    fn anisotropic_master_rejected() {
        let items = [(Location::new().with("weight", (400.0, 500.0)), 1.0)];
        let err = VariationModel::build(items, &axes(), None, ModelOptions::default()).unwrap_err();
        assert_eq!(err, ModelError::AnisotropicMaster(0));
    }

    #[test]
    fn unknown_axis_rejected() {
        let items = [(Location::new().with("spooky", 1.0), 1.0)];
        let err = VariationModel::build(items, &axes(), None, ModelOptions::default()).unwrap_err();
        assert!(matches!(err, ModelError::UnknownAxis { axis, .. } if axis == "spooky"));
    }

    #[test]
    fn derived_bias_without_origin() {
        let locations = vec![vec![-1.0, 0.0], vec![1.0, 0.0], vec![-1.0, 1.0]];
        assert_eq!(bias_from_locations(&locations), vec![-1.0, 0.0]);
    }

    #[test]
    fn mutator_without_origin_master() {
        let items = [(weight(100.0), 10.0), (weight(900.0), 30.0)];
        let model = VariationModel::build(items, &axes(), None, ModelOptions::default()).unwrap();
        assert_eq!(*model.neutral(), 10.0);
        assert_eq!(model.make_instance(&weight(400.0)), 20.0);
    }

    #[test]
    fn get_exact_master() {
        let items = [(weight(400.0), 1.0), (weight(900.0), 2.0)];
        let model = VariationModel::build(items, &axes(), None, ModelOptions::default()).unwrap();
        assert_eq!(model.get(&weight(900.0)), Some(&2.0));
        assert_eq!(model.get(&Location::new()), Some(&1.0));
        assert_eq!(model.get(&weight(650.0)), None);
    }
}
