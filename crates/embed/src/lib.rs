//! Placeholder text embeddings.
//!
//! Turns any string into a fixed-dimension unit vector without a model.
//! The same text always produces the bit-identical vector, which is all the
//! search service needs to round-trip documents through a vector backend.
//!
//! These vectors carry no semantic signal. Two distinct texts land on
//! near-orthogonal directions, so nearest-neighbor search only finds
//! identical or near-duplicate text.
//!
//! ```
//! use embed::{embed, DEFAULT_DIMENSION};
//!
//! let v = embed("hello world", DEFAULT_DIMENSION);
//! assert_eq!(v.len(), 384);
//! assert_eq!(v, embed("hello world", DEFAULT_DIMENSION));
//! ```

mod generator;
mod normalize;

pub use crate::generator::{embed, seed_for, EmbeddingGenerator, EmbeddingVector};

/// Process-wide default vector dimension.
pub const DEFAULT_DIMENSION: usize = 384;
