//! Property links.
//!
//! Links keep properties of different processors in sync. Each link owns a
//! [`LinkEvaluator`] deciding how the source value is carried over.

pub mod evaluator;
pub mod evaluators;
pub mod property_link;

pub use evaluator::{accept_or_keep, LinkEvaluator, LinkInput};
pub use evaluators::{
    AffineEvaluator, EnumMapEvaluator, IdEvaluator, IdNormalizedEvaluator, SelectionEvaluator,
};
pub use property_link::{PropertyKey, PropertyLink};
