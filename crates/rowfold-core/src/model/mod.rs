//! Module: model
//! Responsibility: graph element vocabulary shared by every pipeline layer.
//! Does not own: key layout or row serialization.

mod element;
mod properties;
mod seed;


pub use element::{Element, ElementKind};
pub use properties::Properties;
pub use seed::{ElementSeed, SeedRangePair};
