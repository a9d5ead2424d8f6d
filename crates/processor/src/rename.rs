//! Name swaps driven by substitution rules.
//!
//! A rule that maps `a` to `a.alt` is applied to a built instance by
//! exchanging the two names, so the shape drawn under `a.alt` becomes `a`.
//! Everything that refers to the glyphs by name follows the shapes.

use log::debug;

use crate::{config::SWAP_SUFFIX, error::SwapError};

/// Something holding named entries that can be renamed in place.
pub trait Rename {
    fn contains(&self, name: &str) -> bool;

    /// Renames `old` to `new` everywhere it appears. `new` must be unused.
    fn rename(&mut self, old: &str, new: &str);
}

/// Exchanges `a` and `b` in three renames through `scratch`: `a` to
/// `scratch`, `b` to `a`, then `scratch` to `b`.
pub fn swap_names<T: Rename + ?Sized>(target: &mut T, a: &str, b: &str, scratch: &str) -> Result<(), SwapError> {
    for name in [a, b] {
        if !target.contains(name) {
            return Err(SwapError::Missing(name.to_string()));
        }
    }
    if target.contains(scratch) {
        return Err(SwapError::ScratchInUse(scratch.to_string()));
    }
    target.rename(a, scratch);
    target.rename(b, a);
    target.rename(scratch, b);
    debug!("swapped '{a}' and '{b}'");
    Ok(())
}

/// An unused name to park `name` under during a swap.
pub fn scratch_name<T: Rename + ?Sized>(name: &str, target: &T) -> String {
    let base = format!("{name}{SWAP_SUFFIX}");
    if !target.contains(&base) {
        return base;
    }
    (1..)
        .map(|n| format!("{base}.{n}"))
        .find(|candidate| !target.contains(candidate))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, Default)]
    struct Names(IndexMap<String, u32>);

    impl Rename for Names {
        fn contains(&self, name: &str) -> bool {
            self.0.contains_key(name)
        }

        fn rename(&mut self, old: &str, new: &str) {
            if let Some(value) = self.0.shift_remove(old) {
                self.0.insert(new.to_string(), value);
            }
        }
    }

    fn names() -> Names {
        Names(IndexMap::from([("a".to_string(), 1), ("a.alt".to_string(), 2)]))
    }

    #[test]
    fn swaps() {
        let mut target = names();
        swap_names(&mut target, "a", "a.alt", "a.tmp").unwrap();
        assert_eq!(target.0.get("a"), Some(&2));
        assert_eq!(target.0.get("a.alt"), Some(&1));
        assert!(!target.contains("a.tmp"));
    }

    #[test]
    fn missing_name() {
        let mut target = names();
        assert_eq!(swap_names(&mut target, "a", "b", "x"), Err(SwapError::Missing("b".to_string())));
    }

    #[test]
    fn scratch_guard() {
        let mut target = names();
        target.0.insert("x".to_string(), 3);
        assert_eq!(swap_names(&mut target, "a", "a.alt", "x"), Err(SwapError::ScratchInUse("x".to_string())));
        assert_eq!(target.0.get("a"), Some(&1));
    }

    #[test]
    fn scratch_names_avoid_collisions() {
        let mut target = names();
        assert_eq!(scratch_name("a", &target), "a_______________swap");
        target.0.insert("a_______________swap".to_string(), 3);
        target.0.insert("a_______________swap.1".to_string(), 4);
        assert_eq!(scratch_name("a", &target), "a_______________swap.2");
    }
}
