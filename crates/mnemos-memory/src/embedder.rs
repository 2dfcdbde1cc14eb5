//! Text embedding interface and a local feature-hashing embedder.

use crate::error::MemoryError;
use async_trait::async_trait;
use regex::Regex;

#[async_trait]
/// Turns text into fixed-width vectors.
pub trait Embedder: Send + Sync {
    /// Width of every vector this embedder returns.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError>;

    /// Embed several texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MemoryError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Weight applied to adjacent-token bigram features.
const BIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic embedder hashing word unigrams and bigrams into signed
/// buckets, L2-normalized.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    token_pattern: Regex,
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of `dimension` components.
    pub fn new(dimension: usize) -> Result<Self, MemoryError> {
        if dimension == 0 {
            return Err(MemoryError::Embedding(
                "dimension must be a positive integer".to_string(),
            ));
        }
        let token_pattern = Regex::new(r"[\p{L}\p{N}]+")
            .map_err(|err| MemoryError::Embedding(err.to_string()))?;
        Ok(Self {
            dimension,
            token_pattern,
        })
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = self
            .token_pattern
            .find_iter(&lowered)
            .map(|token| token.as_str())
            .collect();
        let mut vector = vec![0.0f32; self.dimension];
        for token in &tokens {
            self.accumulate(&mut vector, token.as_bytes(), 1.0);
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut vector, bigram.as_bytes(), BIGRAM_WEIGHT);
        }
        normalize(&mut vector);
        vector
    }

    fn accumulate(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        Ok(self.vectorize(text))
    }
}

/// 64-bit FNV-1a; stable across processes and platforms.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Cosine similarity; zero for mismatched widths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
