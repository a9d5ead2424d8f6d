//! Conditional glyph substitution rules.
//!
//! A rule holds condition sets (OR-ed) of conditions (AND-ed) and an ordered
//! list of substitutions. Rules are evaluated against a location in design
//! coordinates.

use log::debug;

use crate::location::Location;

/// A bound on a single axis. Either side may be open.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub name: String,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

impl Condition {
    pub fn new(name: impl Into<String>, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        Self { name: name.into(), minimum, maximum }
    }

    pub fn between(name: impl Into<String>, minimum: f64, maximum: f64) -> Self {
        Self::new(name, Some(minimum), Some(maximum))
    }

    pub fn is_bounded(&self) -> bool {
        self.minimum.is_some() || self.maximum.is_some()
    }

    /// Whether `value` lies within the inclusive bounds.
    pub fn contains(&self, value: f64) -> bool {
        self.minimum.is_none_or(|min| min <= value) && self.maximum.is_none_or(|max| value <= max)
    }
}

/// Conditions that must all hold.
pub type ConditionSet = Vec<Condition>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rule {
    pub name: Option<String>,
    pub condition_sets: Vec<ConditionSet>,
    /// `(from, to)` glyph name substitutions, applied in order.
    pub subs: Vec<(String, String)>,
}

impl Rule {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Default::default() }
    }

    pub fn with_condition_set(mut self, conditions: ConditionSet) -> Self {
        self.condition_sets.push(conditions);
        self
    }

    pub fn with_sub(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.subs.push((from.into(), to.into()));
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    /// Whether any condition set holds at `location`.
    pub fn matches(&self, location: &Location) -> bool {
        self.condition_sets.iter().any(|set| evaluate_condition_set(set, location))
    }

    /// The substitute for `name`, taken from the first matching sub.
    pub fn substitute(&self, name: &str) -> Option<&str> {
        self.subs.iter().find(|(from, _)| from == name).map(|(_, to)| to.as_str())
    }
}

/// Whether every condition holds at `location`.
///
/// A condition on an axis absent from `location` does not hold. Callers that
/// want absent axes treated as their defaults merge the location with the
/// default location first. Anisotropic coordinates are compared by their
/// horizontal component.
///
/// Unbounded conditions are ignored. A set without a bounded condition never
/// holds.
pub fn evaluate_condition_set(conditions: &[Condition], location: &Location) -> bool {
    let mut bounded = conditions.iter().filter(|condition| condition.is_bounded()).peekable();
    bounded.peek().is_some()
        && bounded.all(|condition| match location.value(&condition.name) {
            Some(value) => condition.contains(value),
            None => false,
        })
}

pub fn evaluate_rule(rule: &Rule, location: &Location) -> bool {
    rule.matches(location)
}

/// Applies each rule that matches `location`, in order, to every name.
///
/// Each rule makes a single pass: the output of one rule is the input of the
/// next, but a rule never re-applies to its own output.
pub fn process_rules<S: AsRef<str>>(rules: &[Rule], location: &Location, names: &[S]) -> Vec<String> {
    let mut names: Vec<String> = names.iter().map(|name| name.as_ref().to_string()).collect();
    for rule in rules {
        if !rule.matches(location) {
            continue;
        }
        debug!("rule '{}' matches at {location}", rule.display_name());
        for name in names.iter_mut() {
            if let Some(substitute) = rule.substitute(name) {
                *name = substitute.to_string();
            }
        }
    }
    names
}
