//! In-memory store with the same contract as the LanceDB one. Used by
//! tests and small demos; exact brute-force cosine scan.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use stylesearch_core::traits::{check_dim, VectorStore};
use stylesearch_core::types::{Product, ScoredProduct};
use stylesearch_core::Category;

pub struct MemoryVectorStore {
    dim: usize,
    rows: RwLock<HashMap<String, (Vec<f32>, Product)>>,
}

impl MemoryVectorStore {
    pub fn new(dim: usize) -> Self {
        Self { dim, rows: RwLock::new(HashMap::new()) }
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn upsert(&self, id: &str, vector: &[f32], product: &Product) -> Result<()> {
        check_dim(self.dim, vector)?;
        if product.product_id != id {
            anyhow::bail!("payload id '{}' does not match key '{}'", product.product_id, id);
        }
        let mut rows = self.rows.write().map_err(|_| anyhow!("store lock poisoned"))?;
        rows.insert(id.to_string(), (vector.to_vec(), product.clone()));
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut rows = self.rows.write().map_err(|_| anyhow!("store lock poisoned"))?;
        rows.remove(id);
        Ok(())
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let rows = self.rows.read().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(rows.contains_key(id))
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        category: Option<Category>,
    ) -> Result<Vec<ScoredProduct>> {
        check_dim(self.dim, vector)?;
        let rows = self.rows.read().map_err(|_| anyhow!("store lock poisoned"))?;
        let mut hits: Vec<ScoredProduct> = rows
            .values()
            .filter(|(_, p)| category.map_or(true, |c| p.category == c))
            .map(|(v, p)| ScoredProduct {
                score: cosine_similarity(vector, v),
                product: p.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }

    async fn scan_payloads(&self) -> Result<Vec<Product>> {
        let rows = self.rows.read().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(rows.values().map(|(_, p)| p.clone()).collect())
    }

    async fn count(&self) -> Result<usize> {
        let rows = self.rows.read().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(rows.len())
    }
}
