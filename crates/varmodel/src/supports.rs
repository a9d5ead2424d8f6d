//! Region-support weighting for scattered masters.
//!
//! Each master gets a support region: a tent per non-zero axis, peaking at
//! the master. Regions are narrowed against earlier masters that fall inside
//! them, so every master is reached exactly. Instance weights are the support
//! scalars folded back through the delta weights of earlier masters.

use std::cmp::Ordering;

use log::trace;

/// `(lower, peak, upper)` per axis; `None` for axes the region ignores.
type Region = Vec<Option<(f64, f64, f64)>>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SupportEngine {
    /// Sorted position to master index.
    order: Vec<usize>,
    /// Master index to sorted position.
    position: Vec<usize>,
    supports: Vec<Region>,
    /// Per sorted position, `(earlier position, weight)` pairs.
    delta_weights: Vec<Vec<(usize, f64)>>,
    axis_ranges: Vec<(f64, f64)>,
    extrapolate: bool,
}

impl SupportEngine {
    /// `locations` are bias-relative normalized coordinates with exactly one
    /// master at the origin.
    pub(crate) fn new(locations: &[Vec<f64>], extrapolate: bool) -> Self {
        let axis_count = locations.first().map_or(0, Vec::len);

        let mut axis_points: Vec<Vec<f64>> = vec![Vec::new(); axis_count];
        for location in locations {
            let active: Vec<usize> = (0..axis_count).filter(|&a| location[a] != 0.0).collect();
            if let [axis] = active.as_slice() {
                if axis_points[*axis].is_empty() {
                    axis_points[*axis].push(0.0);
                }
                axis_points[*axis].push(location[*axis]);
            }
        }

        let mut order: Vec<usize> = (0..locations.len()).collect();
        order.sort_by(|&a, &b| compare_locations(&locations[a], &locations[b], &axis_points));
        let mut position = vec![0; order.len()];
        for (sorted, &master) in order.iter().enumerate() {
            position[master] = sorted;
        }
        let sorted: Vec<&[f64]> = order.iter().map(|&i| locations[i].as_slice()).collect();

        let axis_ranges = (0..axis_count)
            .map(|a| {
                sorted.iter().fold((0.0_f64, 0.0_f64), |(lo, hi), loc| (lo.min(loc[a]), hi.max(loc[a])))
            })
            .collect();

        let supports = master_supports(&sorted, axis_count);
        let delta_weights = sorted
            .iter()
            .enumerate()
            .map(|(i, location)| {
                supports[..i]
                    .iter()
                    .enumerate()
                    .filter_map(|(j, support)| {
                        let scalar = support_scalar(location, support, None);
                        (scalar != 0.0).then_some((j, scalar))
                    })
                    .collect()
            })
            .collect();
        trace!("master order {order:?}, supports {supports:?}");

        Self { order, position, supports, delta_weights, axis_ranges, extrapolate }
    }

    fn scalars(&self, coords: &[f64]) -> Vec<f64> {
        let ranges = self.extrapolate.then_some(self.axis_ranges.as_slice());
        self.supports.iter().map(|support| support_scalar(coords, support, ranges)).collect()
    }

    /// Per-master weights at bias-relative normalized `coords`.
    pub(crate) fn weights(&self, coords: &[f64]) -> Vec<f64> {
        let mut out = self.scalars(coords);
        for i in (0..out.len()).rev() {
            for &(j, weight) in &self.delta_weights[i] {
                out[j] -= out[i] * weight;
            }
        }
        (0..self.order.len()).map(|master| out[self.position[master]]).collect()
    }
}

/// Orders by number of non-zero axes, then by how many of those sit on
/// on-axis master points (more first), then by axis indices, signs and
/// magnitudes.
fn compare_locations(a: &[f64], b: &[f64], axis_points: &[Vec<f64>]) -> Ordering {
    let key = |loc: &[f64]| {
        let axes: Vec<usize> = (0..loc.len()).filter(|&i| loc[i] != 0.0).collect();
        let on_point = axes.iter().filter(|&&i| axis_points[i].contains(&loc[i])).count();
        let signs: Vec<i8> = axes.iter().map(|&i| if loc[i] < 0.0 { -1 } else { 1 }).collect();
        let magnitudes: Vec<f64> = axes.iter().map(|&i| loc[i].abs()).collect();
        (axes, on_point, signs, magnitudes)
    };
    let (axes_a, on_a, signs_a, mag_a) = key(a);
    let (axes_b, on_b, signs_b, mag_b) = key(b);
    axes_a
        .len()
        .cmp(&axes_b.len())
        .then(on_b.cmp(&on_a))
        .then_with(|| axes_a.cmp(&axes_b))
        .then_with(|| signs_a.cmp(&signs_b))
        .then_with(|| {
            mag_a
                .iter()
                .zip(&mag_b)
                .map(|(x, y)| x.total_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| mag_a.len().cmp(&mag_b.len()))
        })
}

fn locations_to_regions(locations: &[&[f64]], axis_count: usize) -> Vec<Region> {
    let mut min_v = vec![f64::INFINITY; axis_count];
    let mut max_v = vec![f64::NEG_INFINITY; axis_count];
    for location in locations {
        for (axis, &v) in location.iter().enumerate() {
            if v != 0.0 {
                min_v[axis] = min_v[axis].min(v);
                max_v[axis] = max_v[axis].max(v);
            }
        }
    }
    locations
        .iter()
        .map(|location| {
            location
                .iter()
                .enumerate()
                .map(|(axis, &v)| {
                    if v == 0.0 {
                        None
                    } else if v > 0.0 {
                        Some((0.0, v, max_v[axis]))
                    } else {
                        Some((min_v[axis], v, 0.0))
                    }
                })
                .collect()
        })
        .collect()
}

fn master_supports(locations: &[&[f64]], axis_count: usize) -> Vec<Region> {
    let mut regions = locations_to_regions(locations, axis_count);
    for i in 0..regions.len() {
        let (previous, rest) = regions.split_at_mut(i);
        let region = &mut rest[0];
        for prev in previous.iter() {
            let same_axes = prev.iter().zip(region.iter()).all(|(p, r)| p.is_some() == r.is_some());
            if !same_axes {
                continue;
            }
            let inside = region.iter().zip(prev.iter()).all(|(r, p)| match (r, p) {
                (Some((lower, peak, upper)), Some((_, prev_peak, _))) => {
                    prev_peak == peak || (lower < prev_peak && prev_peak < upper)
                }
                _ => true,
            });
            if !inside {
                continue;
            }

            let mut best_axes: Vec<(usize, (f64, f64, f64))> = Vec::new();
            let mut best_ratio = -1.0;
            for (axis, p) in prev.iter().enumerate() {
                let (Some((_, val, _)), Some((lower, peak, upper))) = (*p, region[axis]) else {
                    continue;
                };
                let (new_lower, new_upper, ratio) = if val < peak {
                    (val, upper, (val - peak) / (lower - peak))
                } else if peak < val {
                    (lower, val, (val - peak) / (upper - peak))
                } else {
                    continue;
                };
                if ratio > best_ratio {
                    best_axes.clear();
                    best_ratio = ratio;
                }
                if ratio == best_ratio {
                    best_axes.push((axis, (new_lower, peak, new_upper)));
                }
            }
            for (axis, triple) in best_axes {
                region[axis] = Some(triple);
            }
        }
    }
    regions
}

/// Scalar of a support region at `coords`. With `axis_ranges`, values beyond
/// the range of master locations extrapolate along the outermost slope.
pub(crate) fn support_scalar(coords: &[f64], support: &Region, axis_ranges: Option<&[(f64, f64)]>) -> f64 {
    let mut scalar = 1.0;
    for (axis, triple) in support.iter().enumerate() {
        let Some((lower, peak, upper)) = *triple else { continue };
        if peak == 0.0 || lower > peak || peak > upper || (lower < 0.0 && upper > 0.0) {
            continue;
        }
        let v = coords[axis];
        if v == peak {
            continue;
        }

        if let Some(ranges) = axis_ranges {
            let (axis_min, axis_max) = ranges[axis];
            if v < axis_min && lower <= axis_min {
                if peak <= axis_min && peak < upper {
                    scalar *= (v - upper) / (peak - upper);
                    continue;
                } else if axis_min < peak {
                    scalar *= (v - lower) / (peak - lower);
                    continue;
                }
            } else if axis_max < v && axis_max <= upper {
                if axis_max <= peak && lower < peak {
                    scalar *= (v - lower) / (peak - lower);
                    continue;
                } else if peak < axis_max {
                    scalar *= (v - upper) / (peak - upper);
                    continue;
                }
            }
        }

        if v <= lower || upper <= v {
            return 0.0;
        }
        scalar *= if v < peak { (v - lower) / (peak - lower) } else { (v - upper) / (peak - upper) };
    }
    scalar
}
