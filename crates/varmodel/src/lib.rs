//! # Variation models
//!
//! Interpolates values stored at master locations of a design space. A
//! [`VariationModel`] turns a location into per-master weights, and any
//! [`Interpolable`] value can be blended with them.
//!
//! ```
//! use mutatio_designspace::{Axis, AxisModel, Location, Tag};
//! use mutatio_varmodel::{ModelOptions, VariationModel};
//!
//! let axes = AxisModel::from_axes([Axis::new("weight", Tag::new(b"wght"), 100.0, 400.0, 900.0)]).unwrap();
//! let masters = [
//!     (Location::new().with("weight", 400.0), 10.0),
//!     (Location::new().with("weight", 900.0), 20.0),
//! ];
//! let model = VariationModel::build(masters, &axes, None, ModelOptions::default()).unwrap();
//! assert_eq!(model.make_instance(&Location::new().with("weight", 650.0)), 15.0);
//! ```

pub mod cache;
mod error;
mod interpolable;
mod model;
mod mutator;
mod space;
mod supports;

pub use cache::{CacheKey, MutatorCache, SharedMutatorCache};
pub use error::{ModelError, Result};
pub use interpolable::{Interpolable, weighted_sum};
pub use model::{AnisotropyPolicy, ModelOptions, Strategy, VariationModel};
pub use space::{ModelAxis, ModelSpace};
