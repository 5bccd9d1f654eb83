//! In-memory similarity store
//!
//! Hashed bag-of-words embeddings with cosine scoring. Good enough to catch
//! resubmitted and near-identical text without a network collaborator; used
//! by the offline CLI path and by tests.

use crate::store::{QueryMatch, SimilarityStore, StoreResult, VectorRecord};
use dashmap::DashMap;
use std::hash::{Hash, Hasher};

const DIM: usize = 256;

#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, VectorRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn embed_one(text: &str) -> Vec<f32> {
        let mut buckets = vec![0f32; DIM];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            buckets[(hasher.finish() as usize) % DIM] += 1.0;
        }
        let norm = buckets.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut buckets {
                *v /= norm;
            }
        }
        buckets
    }

    fn cosine(a: &[f32], b: &[f32]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x * y) as f64).sum()
    }
}

#[async_trait::async_trait]
impl SimilarityStore for MemoryStore {
    async fn embed(&self, texts: &[String]) -> StoreResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::embed_one(t)).collect())
    }

    async fn query(
        &self,
        vector: &[f32],
        _filter: Option<&serde_json::Value>,
        top_k: usize,
    ) -> StoreResult<Vec<QueryMatch>> {
        let mut matches: Vec<QueryMatch> = self
            .records
            .iter()
            .map(|r| QueryMatch {
                id: r.id.clone(),
                score: Self::cosine(vector, &r.vector),
                metadata: r.metadata.clone(),
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> StoreResult<()> {
        for record in records {
            self.records.insert(record.id.clone(), record);
        }
        Ok(())
    }
}
