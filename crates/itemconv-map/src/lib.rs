//! Identifier resolution: normalization policies, the key index and the
//! tiered exact/prefix/substring/fuzzy engine.

pub mod engine;
pub mod error;
pub mod index;
pub mod normalize;
pub mod score;

pub use engine::ResolutionEngine;
pub use error::{MapError, Result};
pub use index::{IndexedKey, KeyIndex};
pub use normalize::normalize;
pub use score::{partial_ratio, ratio, token_sort_ratio, weighted_ratio};
