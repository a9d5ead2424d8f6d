//! Neutral-plus-deltas weighting.
//!
//! Every non-neutral master contributes a delta: its value minus the
//! neutral, minus whatever the deltas before it already produce at its
//! location. Deltas are tracked as coefficient vectors over the masters, so
//! the engine yields per-master weights and never touches values.
//!
//! On-axis masters (one non-zero coordinate) are weighted by a 1-D hat
//! function over the points on their axis. Off-axis masters are weighted by
//! the product of hat functions over their non-zero axes. On-axis masters
//! come first, then off-axis ones by increasing number of non-zero axes,
//! which keeps every master reproduced exactly.

use log::trace;

use crate::space::{EPSILON, snap};

#[derive(Debug, Clone, PartialEq)]
enum Peak {
    OnAxis { axis: usize, value: f64 },
    OffAxis(Vec<(usize, f64)>),
}

#[derive(Debug, Clone, PartialEq)]
struct Delta {
    peak: Peak,
    /// Per-master coefficients; they sum to zero.
    coefficients: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MutatorEngine {
    neutral: usize,
    master_count: usize,
    /// Per axis, sorted coordinates of on-axis masters plus zero.
    on_axis_points: Vec<Vec<f64>>,
    /// Per axis, sorted coordinates of all masters plus zero.
    all_points: Vec<Vec<f64>>,
    deltas: Vec<Delta>,
    extrapolate: bool,
}

impl MutatorEngine {
    /// `locations` are bias-relative normalized coordinates; the master at
    /// `neutral` sits at the origin.
    pub(crate) fn new(locations: &[Vec<f64>], neutral: usize, extrapolate: bool) -> Self {
        let axis_count = locations.first().map_or(0, Vec::len);
        let mut on_axis_points = vec![vec![0.0]; axis_count];
        let mut all_points = vec![vec![0.0]; axis_count];
        for location in locations {
            let active = non_zero(location);
            for &(axis, value) in &active {
                all_points[axis].push(value);
                if active.len() == 1 {
                    on_axis_points[axis].push(value);
                }
            }
        }
        on_axis_points.iter_mut().chain(all_points.iter_mut()).for_each(|points| sort_dedup(points));

        let mut engine = Self {
            neutral,
            master_count: locations.len(),
            on_axis_points,
            all_points,
            deltas: Vec::new(),
            extrapolate,
        };

        let mut order: Vec<usize> = (0..locations.len()).filter(|&i| i != neutral).collect();
        order.sort_by_key(|&i| non_zero(&locations[i]).len());
        for index in order {
            let active = non_zero(&locations[index]);
            let peak = match active.as_slice() {
                [(axis, value)] => Peak::OnAxis { axis: *axis, value: *value },
                _ => Peak::OffAxis(active),
            };
            let mut coefficients = engine.weights(&locations[index]);
            for c in coefficients.iter_mut() {
                *c = -*c;
            }
            coefficients[index] += 1.0;
            trace!("delta for master {index}: {coefficients:?}");
            engine.deltas.push(Delta { peak, coefficients });
        }
        engine
    }

    fn factor(&self, peak: &Peak, coords: &[f64]) -> f64 {
        match peak {
            Peak::OnAxis { axis, value } => self.hat(&self.on_axis_points[*axis], *value, coords[*axis]),
            Peak::OffAxis(peaks) => peaks
                .iter()
                .map(|&(axis, value)| self.hat(&self.all_points[axis], value, coords[axis]))
                .product(),
        }
    }

    fn hat(&self, points: &[f64], node: f64, x: f64) -> f64 {
        let (first, last) = (points[0], points[points.len() - 1]);
        let x = if self.extrapolate { x } else { x.clamp(first, last) };
        hat(points, node, x)
    }

    /// Per-master weights at bias-relative normalized `coords`.
    pub(crate) fn weights(&self, coords: &[f64]) -> Vec<f64> {
        let mut weights = vec![0.0; self.master_count];
        weights[self.neutral] = 1.0;
        for delta in &self.deltas {
            let factor = self.factor(&delta.peak, coords);
            if factor == 0.0 {
                continue;
            }
            for (w, c) in weights.iter_mut().zip(&delta.coefficients) {
                *w += factor * c;
            }
        }
        weights.into_iter().map(snap).collect()
    }
}

fn non_zero(location: &[f64]) -> Vec<(usize, f64)> {
    location.iter().enumerate().filter(|(_, v)| v.abs() >= EPSILON).map(|(i, v)| (i, *v)).collect()
}

fn sort_dedup(points: &mut Vec<f64>) {
    points.sort_by(f64::total_cmp);
    points.dedup_by(|a, b| (*a - *b).abs() < EPSILON);
}

/// Piecewise-linear basis function over sorted `points` that is 1 at `node`
/// and 0 at every other point. Beyond the outermost points the end segments
/// continue linearly.
pub(crate) fn hat(points: &[f64], node: f64, x: f64) -> f64 {
    let n = points.len();
    if n < 2 {
        return if (x - node).abs() < EPSILON { 1.0 } else { 0.0 };
    }
    let segment = if x <= points[0] {
        0
    } else if x >= points[n - 1] {
        n - 2
    } else {
        points.partition_point(|&p| p <= x) - 1
    };
    let (lo, hi) = (points[segment], points[segment + 1]);
    let t = (x - lo) / (hi - lo);
    if (node - lo).abs() < EPSILON {
        1.0 - t
    } else if (node - hi).abs() < EPSILON {
        t
    } else {
        0.0
    }
}
