/// Hashed bag-of-words text embedding
///
/// Both index implementations embed text the same way: lowercase
/// alphanumeric tokens hashed into a fixed-width vector, L2-normalized.
/// This is deliberately cheap and deterministic; ranking quality comes
/// from token overlap, which is enough for short project and task text.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Embedding width; small enough to ship in query payloads
pub const EMBEDDING_DIM: usize = 256;

/// Embeds text into a unit-length vector
///
/// Empty or non-alphanumeric input yields the zero vector, which has
/// distance 1.0 to everything.
pub fn embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; EMBEDDING_DIM];

    for token in tokenize(text) {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let slot = (hasher.finish() as usize) % EMBEDDING_DIM;
        vector[slot] += 1.0;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }

    vector
}

/// Cosine distance between two embeddings: 0.0 identical, 1.0 orthogonal
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    // Inputs are unit vectors (or zero), so the dot product is the cosine.
    1.0 - dot.clamp(-1.0, 1.0)
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_is_deterministic() {
        assert_eq!(embed("fix the login page"), embed("fix the login page"));
    }

    #[test]
    fn test_embed_is_unit_length() {
        let v = embed("inspect bridge deck for cracks");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_embed_empty_is_zero() {
        let v = embed("");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_identical_text_has_zero_distance() {
        let a = embed("repair guardrail");
        let b = embed("repair guardrail");
        assert!(cosine_distance(&a, &b) < 1e-5);
    }

    #[test]
    fn test_overlapping_text_is_closer_than_disjoint() {
        let query = embed("repair the north guardrail");
        let related = embed("guardrail repair scheduled");
        let unrelated = embed("quarterly budget review meeting");

        assert!(cosine_distance(&query, &related) < cosine_distance(&query, &unrelated));
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        assert_eq!(embed("Fix: Login-Page!"), embed("fix login page"));
    }
}
