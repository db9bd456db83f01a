//! LanceDB-backed product store.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use arrow_array::{
    Array, BooleanArray, FixedSizeListArray, Float32Array, Float64Array, RecordBatch,
    RecordBatchIterator, StringArray,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType, Table};
use tracing::debug;

use stylesearch_core::traits::{check_dim, VectorStore};
use stylesearch_core::types::{Product, ScoredProduct};
use stylesearch_core::Category;

use crate::schema::build_products_schema;

pub struct LanceVectorStore {
    db: Connection,
    table_name: String,
    dim: usize,
}

impl LanceVectorStore {
    /// Open (and create if absent) the products table at `db_path`.
    pub async fn open(db_path: &Path, table_name: &str, dim: usize) -> Result<Self> {
        let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
        let store = Self { db, table_name: table_name.to_string(), dim };
        store.ensure_table().await?;
        Ok(store)
    }

    async fn ensure_table(&self) -> Result<()> {
        let names = self.db.table_names().execute().await?;
        if names.contains(&self.table_name) {
            return Ok(());
        }
        let schema = build_products_schema(self.dim);
        let iter = RecordBatchIterator::new(vec![].into_iter(), schema);
        self.db.create_table(&self.table_name, Box::new(iter)).execute().await?;
        debug!(table = %self.table_name, "created products table");
        Ok(())
    }

    async fn table(&self) -> Result<Table> {
        Ok(self.db.open_table(&self.table_name).execute().await?)
    }

    fn to_record_batch(&self, vector: &[f32], product: &Product) -> Result<RecordBatch> {
        let schema = build_products_schema(self.dim);
        let vectors: Vec<Option<Vec<Option<f32>>>> =
            vec![Some(vector.iter().map(|&x| Some(x)).collect())];
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![product.product_id.clone()])),
                Arc::new(StringArray::from(vec![product.name.clone()])),
                Arc::new(StringArray::from(vec![product.brand.clone()])),
                Arc::new(StringArray::from(vec![product.description.clone()])),
                Arc::new(StringArray::from(vec![product.category.as_str().to_string()])),
                Arc::new(StringArray::from(vec![product.subcategory.clone()])),
                Arc::new(Float64Array::from(vec![product.price])),
                Arc::new(StringArray::from(vec![product.currency.clone()])),
                Arc::new(StringArray::from(vec![serde_json::to_string(&product.colors)?])),
                Arc::new(StringArray::from(vec![serde_json::to_string(&product.style_tags)?])),
                Arc::new(StringArray::from(vec![product.image_url.clone()])),
                Arc::new(BooleanArray::from(vec![product.in_stock])),
                Arc::new(StringArray::from(vec![product.source_category.clone()])),
                Arc::new(BooleanArray::from(vec![product.category_corrected])),
                Arc::new(StringArray::from(vec![serde_json::to_string(&product.metadata)?])),
                Arc::new(FixedSizeListArray::from_iter_primitive::<
                    arrow_array::types::Float32Type,
                    _,
                    _,
                >(vectors.into_iter(), self.dim as i32)),
            ],
        )?;
        Ok(batch)
    }
}

fn id_predicate(id: &str) -> String {
    // Single quotes double up inside SQL string literals
    format!("product_id = '{}'", id.replace('\'', "''"))
}

fn str_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("column '{}' missing or not Utf8", name))
}

fn bool_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a BooleanArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<BooleanArray>())
        .ok_or_else(|| anyhow!("column '{}' missing or not Boolean", name))
}

fn opt_str(col: &StringArray, i: usize) -> Option<String> {
    if col.is_null(i) {
        None
    } else {
        Some(col.value(i).to_string())
    }
}

fn row_to_product(batch: &RecordBatch, i: usize) -> Result<Product> {
    let price = batch
        .column_by_name("price")
        .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
        .ok_or_else(|| anyhow!("column 'price' missing or not Float64"))?
        .value(i);
    Ok(Product {
        product_id: str_col(batch, "product_id")?.value(i).to_string(),
        name: str_col(batch, "name")?.value(i).to_string(),
        brand: opt_str(str_col(batch, "brand")?, i),
        description: opt_str(str_col(batch, "description")?, i),
        category: Category::normalize(str_col(batch, "category")?.value(i)),
        subcategory: str_col(batch, "subcategory")?.value(i).to_string(),
        price,
        currency: str_col(batch, "currency")?.value(i).to_string(),
        colors: serde_json::from_str(str_col(batch, "colors")?.value(i))?,
        style_tags: serde_json::from_str(str_col(batch, "style_tags")?.value(i))?,
        image_url: opt_str(str_col(batch, "image_url")?, i),
        in_stock: bool_col(batch, "in_stock")?.value(i),
        source_category: opt_str(str_col(batch, "source_category")?, i),
        category_corrected: bool_col(batch, "category_corrected")?.value(i),
        metadata: serde_json::from_str(str_col(batch, "metadata")?.value(i))?,
    })
}

fn row_score(batch: &RecordBatch, i: usize) -> f32 {
    // Cosine distance comes back as `_distance`; similarity is its
    // complement.
    batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
        .map(|d| 1.0 - d.value(i))
        .unwrap_or(0.0)
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn upsert(&self, id: &str, vector: &[f32], product: &Product) -> Result<()> {
        check_dim(self.dim, vector)?;
        if product.product_id != id {
            anyhow::bail!("payload id '{}' does not match key '{}'", product.product_id, id);
        }
        let batch = self.to_record_batch(vector, product)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let table = self.table().await?;
        let mut mi = table.merge_insert(&["product_id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        mi.execute(reader).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let table = self.table().await?;
        table.delete(&id_predicate(id)).await?;
        Ok(())
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let table = self.table().await?;
        let mut stream = table.query().only_if(id_predicate(id)).limit(1).execute().await?;
        while let Some(batch) = stream.try_next().await? {
            if batch.num_rows() > 0 {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        category: Option<Category>,
    ) -> Result<Vec<ScoredProduct>> {
        check_dim(self.dim, vector)?;
        if k == 0 {
            return Ok(Vec::new());
        }
        let table = self.table().await?;
        let mut query = table
            .vector_search(vector.to_vec())?
            .distance_type(DistanceType::Cosine)
            .limit(k);
        if let Some(cat) = category {
            query = query.only_if(format!("category = '{}'", cat.as_str()));
        }
        let mut stream = query.execute().await?;
        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            for i in 0..batch.num_rows() {
                hits.push(ScoredProduct {
                    score: row_score(&batch, i),
                    product: row_to_product(&batch, i)?,
                });
            }
        }
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }

    async fn scan_payloads(&self) -> Result<Vec<Product>> {
        let table = self.table().await?;
        let mut stream = table.query().execute().await?;
        let mut products = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            for i in 0..batch.num_rows() {
                products.push(row_to_product(&batch, i)?);
            }
        }
        Ok(products)
    }

    async fn count(&self) -> Result<usize> {
        let table = self.table().await?;
        Ok(table.count_rows(None).await?)
    }
}
