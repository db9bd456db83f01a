use stylesearch_core::traits::VectorStore;
use stylesearch_core::types::Product;
use stylesearch_core::Category;
use stylesearch_vector::{LanceVectorStore, MemoryVectorStore};

const DIM: usize = 8;

fn product(id: &str, name: &str, category: Category) -> Product {
    Product {
        product_id: id.to_string(),
        name: name.to_string(),
        brand: Some("Acme".to_string()),
        description: Some(format!("{name} description")),
        category,
        subcategory: "unknown".to_string(),
        price: 999.0,
        currency: "INR".to_string(),
        colors: vec!["red".to_string()],
        style_tags: vec!["casual".to_string()],
        image_url: None,
        in_stock: true,
        source_category: Some(category.as_str().to_string()),
        category_corrected: false,
        metadata: serde_json::Map::new(),
    }
}

fn unit(axis: usize) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    v[axis] = 1.0;
    v
}

async fn exercise_store(store: &dyn VectorStore) -> anyhow::Result<()> {
    let shoe = product("p1", "Runner X", Category::Shoes);
    let bag = product("p2", "Tote Y", Category::Bags);
    store.upsert("p1", &unit(0), &shoe).await?;
    store.upsert("p2", &unit(1), &bag).await?;
    assert_eq!(store.count().await?, 2);
    assert!(store.exists("p1").await?);
    assert!(!store.exists("p3").await?);

    // Nearest to axis 0 is the shoe
    let hits = store.query(&unit(0), 10, None).await?;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].product.product_id, "p1");
    assert!(hits[0].score > hits[1].score);

    // Category filter excludes the nearest neighbor
    let hits = store.query(&unit(0), 10, Some(Category::Bags)).await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].product.product_id, "p2");

    // Upsert replaces, never duplicates
    let mut updated = shoe.clone();
    updated.price = 1234.0;
    store.upsert("p1", &unit(2), &updated).await?;
    assert_eq!(store.count().await?, 2);
    let payloads = store.scan_payloads().await?;
    let p1 = payloads
        .iter()
        .find(|p| p.product_id == "p1")
        .expect("p1 present");
    assert_eq!(p1.price, 1234.0);

    store.delete("p1").await?;
    assert_eq!(store.count().await?, 1);
    assert!(!store.exists("p1").await?);

    // Wrong-width vectors are rejected before touching storage
    assert!(store.upsert("p9", &[0.0; 3], &product("p9", "Bad", Category::Shoes)).await.is_err());
    assert!(store.query(&[0.0; 3], 5, None).await.is_err());
    Ok(())
}

#[tokio::test]
async fn memory_store_contract() -> anyhow::Result<()> {
    let store = MemoryVectorStore::new(DIM);
    exercise_store(&store).await
}

#[tokio::test]
async fn lance_store_contract() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = LanceVectorStore::open(tmp.path(), "products", DIM).await?;
    exercise_store(&store).await
}

#[tokio::test]
async fn lance_store_escapes_quoted_ids() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = LanceVectorStore::open(tmp.path(), "products", DIM).await?;
    let mut p = product("it's-a-bag", "O'Leary Tote", Category::Bags);
    p.product_id = "it's-a-bag".to_string();
    store.upsert("it's-a-bag", &unit(0), &p).await?;
    assert!(store.exists("it's-a-bag").await?);
    store.delete("it's-a-bag").await?;
    assert!(!store.exists("it's-a-bag").await?);
    Ok(())
}

#[tokio::test]
async fn lance_store_round_trips_payload_fields() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = LanceVectorStore::open(tmp.path(), "products", DIM).await?;
    let mut p = product("p1", "Runner X", Category::Shoes);
    p.brand = None;
    p.image_url = Some("https://example.com/a.jpg".to_string());
    p.metadata.insert("fit".to_string(), serde_json::json!({ "width": "narrow" }));
    store.upsert("p1", &unit(0), &p).await?;

    let payloads = store.scan_payloads().await?;
    assert_eq!(payloads.len(), 1);
    let back = &payloads[0];
    assert_eq!(back.brand, None);
    assert_eq!(back.image_url.as_deref(), Some("https://example.com/a.jpg"));
    assert_eq!(back.category, Category::Shoes);
    assert_eq!(back.metadata["fit"]["width"], "narrow");
    Ok(())
}
