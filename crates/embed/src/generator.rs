use fxhash::hash64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::normalize::l2_normalize_in_place;
use crate::DEFAULT_DIMENSION;

/// Fixed-length unit vector produced for a piece of text.
pub type EmbeddingVector = Vec<f32>;

/// Derives the 32-bit generator seed for `text`.
///
/// `fxhash` is stable across runs (unlike `std`'s randomly keyed hasher), so
/// the same text seeds the same sequence after a restart.
pub fn seed_for(text: &str) -> u32 {
    (hash64(text.as_bytes()) % (1u64 << 32)) as u32
}

/// Embeds `text` into a `dim`-dimensional unit vector.
///
/// Components are standard-normal draws from a generator seeded with
/// [`seed_for`], divided by their L2 norm. A zero norm falls back to the
/// first basis vector. `dim == 0` yields an empty vector.
pub fn embed(text: &str, dim: usize) -> EmbeddingVector {
    if dim == 0 {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(u64::from(seed_for(text)));
    let samples: Vec<f64> = (0..dim).map(|_| rng.sample(StandardNormal)).collect();
    unit_or_basis(samples)
}

fn unit_or_basis(mut samples: Vec<f64>) -> EmbeddingVector {
    if l2_normalize_in_place(&mut samples) {
        samples.into_iter().map(|x| x as f32).collect()
    } else {
        let mut fallback = vec![0f32; samples.len()];
        if let Some(first) = fallback.first_mut() {
            *first = 1.0;
        }
        fallback
    }
}

/// Dimension-bound embedder held by the service context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingGenerator {
    dimension: usize,
}

impl EmbeddingGenerator {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn generate(&self, text: &str) -> EmbeddingVector {
        embed(text, self.dimension)
    }
}

impl Default for EmbeddingGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f64 {
        v.iter()
            .map(|&x| f64::from(x) * f64::from(x))
            .sum::<f64>()
            .sqrt()
    }

    #[test]
    fn embed_has_default_dimension_and_unit_norm() {
        for text in ["hello world", "", "Hello 世界 🌍", "!@#$%^&*()"] {
            let v = embed(text, DEFAULT_DIMENSION);
            assert_eq!(v.len(), 384);
            let n = norm(&v);
            assert!((n - 1.0).abs() < 1e-6, "norm for {text:?} was {n}");
        }
    }

    #[test]
    fn embed_is_deterministic() {
        let a = embed("same text", 384);
        let b = embed("same text", 384);
        assert_eq!(a, b);
        assert_eq!(seed_for("same text"), seed_for("same text"));
    }

    #[test]
    fn seed_and_components_are_pinned_across_builds() {
        assert_eq!(seed_for("hello world"), 2_064_225_162);
        assert_eq!(seed_for(""), 0);

        let v = embed("hello world", 384);
        let expected = [
            0.032_021_016_f32,
            -0.035_397_578,
            -0.050_210_353,
            -0.009_146_516,
        ];
        for (i, (got, want)) in v.iter().zip(expected).enumerate() {
            assert!((got - want).abs() < 1e-7, "component {i}: {got} != {want}");
        }
    }

    #[test]
    fn distinct_texts_yield_distinct_vectors() {
        let a = embed("first document", 384);
        let b = embed("second document", 384);
        assert_ne!(a, b);

        let dot: f64 = a
            .iter()
            .zip(&b)
            .map(|(x, y)| f64::from(*x) * f64::from(*y))
            .sum();
        assert!(dot.abs() < 0.5, "expected near-orthogonal vectors, dot={dot}");
    }

    #[test]
    fn embed_respects_custom_dimension() {
        assert_eq!(embed("text", 768).len(), 768);
        assert_eq!(embed("text", 1).len(), 1);
        assert!((norm(&embed("text", 1)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_dimension_is_empty() {
        assert!(embed("text", 0).is_empty());
    }

    #[test]
    fn zero_norm_falls_back_to_first_basis_vector() {
        let v = unit_or_basis(vec![0.0; 4]);
        assert_eq!(v, vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn generator_uses_its_dimension() {
        let generator = EmbeddingGenerator::new(16);
        assert_eq!(generator.dimension(), 16);
        assert_eq!(generator.generate("abc"), embed("abc", 16));
        assert_eq!(EmbeddingGenerator::default().dimension(), DEFAULT_DIMENSION);
    }
}
