use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, Rgb, RgbImage};

use stylesearch_core::traits::VectorStore;
use stylesearch_core::types::{BoundingBox, DetectedRegion};
use stylesearch_core::{AppConfig, Category};
use stylesearch_detect::ScriptedDetector;
use stylesearch_embed::HashEmbedder;
use stylesearch_ingest::{derive_product_id, IngestOptions, IngestionPipeline, RawRecord};
use stylesearch_vector::MemoryVectorStore;

const DIM: usize = 16;

fn config() -> AppConfig {
    AppConfig { embedding_dim: DIM, ..AppConfig::default() }
}

fn save_image(dir: &Path, name: &str) -> String {
    let mut img = RgbImage::new(32, 32);
    for pixel in img.pixels_mut() {
        *pixel = Rgb([180, 40, 40]);
    }
    let path = dir.join(name);
    DynamicImage::ImageRgb8(img).save(&path).expect("save image");
    path.to_string_lossy().to_string()
}

fn region(label: &str, confidence: f32) -> DetectedRegion {
    DetectedRegion {
        label: label.to_string(),
        confidence,
        bbox: BoundingBox { x: 0.0, y: 0.0, w: 32.0, h: 32.0 },
        colors: vec!["red".to_string()],
        style_tags: vec!["footwear".to_string()],
    }
}

fn pipeline(
    store: Arc<MemoryVectorStore>,
    detector: ScriptedDetector,
) -> IngestionPipeline {
    IngestionPipeline::new(
        store,
        Arc::new(HashEmbedder::new(DIM)),
        Arc::new(detector),
        &config(),
    )
    .expect("pipeline")
}

fn row(name: &str, image: &str, category: &str) -> RawRecord {
    RawRecord::from_pairs([("product_name", name), ("image_url", image), ("category", category)])
}

#[tokio::test]
async fn confident_detection_corrects_mislabeled_category() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let image = save_image(tmp.path(), "item.png");
    let store = Arc::new(MemoryVectorStore::new(DIM));
    let pipeline = pipeline(store.clone(), ScriptedDetector::fixed(vec![region("shoes", 0.85)]));

    let records = vec![
        row("Runner A", &image, "shoes"),
        row("Runner B", &image, "apparel"),
        row("Runner C", &image, "shoes"),
    ];
    let options = IngestOptions { skip_existing: false, ..IngestOptions::default() };
    let stats = pipeline.ingest(records, &options).await?;

    assert_eq!(stats.total, 3);
    assert_eq!(stats.successful, 3);
    assert_eq!(stats.category_corrected, 1);
    assert_eq!(stats.corrections.len(), 1);
    assert_eq!(stats.corrections[0].product_ref, "Runner B");
    assert_eq!(stats.corrections[0].source_category, "apparel");
    assert_eq!(stats.corrections[0].detected_category, Category::Shoes);

    let id = derive_product_id("Runner B", &image);
    let stored = store
        .scan_payloads()
        .await?
        .into_iter()
        .find(|p| p.product_id == id)
        .expect("Runner B stored");
    assert_eq!(stored.category, Category::Shoes);
    assert!(stored.category_corrected);
    assert_eq!(stored.source_category.as_deref(), Some("apparel"));
    Ok(())
}

#[tokio::test]
async fn correction_threshold_is_strict() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let image = save_image(tmp.path(), "item.png");
    let store = Arc::new(MemoryVectorStore::new(DIM));
    // Exactly at the 0.7 threshold the catalog label wins
    let pipeline = pipeline(store.clone(), ScriptedDetector::fixed(vec![region("shoes", 0.7)]));

    let stats = pipeline
        .ingest(vec![row("Jacket", &image, "apparel")], &IngestOptions::default())
        .await?;
    assert_eq!(stats.successful, 1);
    assert_eq!(stats.category_corrected, 0);

    let stored = store.scan_payloads().await?;
    assert_eq!(stored[0].category, Category::Clothing);
    assert!(!stored[0].category_corrected);
    Ok(())
}

#[tokio::test]
async fn second_run_skips_every_existing_product() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let image_a = save_image(tmp.path(), "a.png");
    let image_b = save_image(tmp.path(), "b.png");
    let store = Arc::new(MemoryVectorStore::new(DIM));
    let pipeline = pipeline(store.clone(), ScriptedDetector::fixed(vec![region("shoes", 0.9)]));

    let records = || vec![row("Runner A", &image_a, "shoes"), row("Runner B", &image_b, "shoes")];
    let options = IngestOptions::default();

    let first = pipeline.ingest(records(), &options).await?;
    assert_eq!(first.successful, 2);
    assert_eq!(store.count().await?, 2);

    let second = pipeline.ingest(records(), &options).await?;
    assert_eq!(second.skipped, second.total);
    assert_eq!(second.successful, 0);
    assert_eq!(store.count().await?, 2);
    Ok(())
}

#[tokio::test]
async fn bad_rows_fail_without_aborting_the_run() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let image = save_image(tmp.path(), "ok.png");
    let store = Arc::new(MemoryVectorStore::new(DIM));
    let pipeline = pipeline(store.clone(), ScriptedDetector::fixed(vec![region("shoes", 0.9)]));

    let records = vec![
        row("Good", &image, "shoes"),
        RawRecord::from_pairs([("image_url", image.as_str()), ("category", "shoes")]),
        row("No image", "", "shoes"),
        row("Broken image", "/nonexistent/path.png", "shoes"),
    ];
    let options = IngestOptions { skip_existing: false, ..IngestOptions::default() };
    let stats = pipeline.ingest(records, &options).await?;

    assert_eq!(stats.total, 4);
    assert_eq!(stats.successful, 1);
    assert_eq!(stats.failed, 3);
    assert_eq!(stats.errors.len(), 3);
    assert_eq!(store.count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn unmappable_category_without_validation_fails_the_row() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let image = save_image(tmp.path(), "item.png");
    let store = Arc::new(MemoryVectorStore::new(DIM));
    let pipeline = pipeline(store.clone(), ScriptedDetector::fixed(vec![region("shoes", 0.9)]));

    let options = IngestOptions { validate_categories: false, ..IngestOptions::default() };
    let stats = pipeline.ingest(vec![row("Mystery", &image, "furniture")], &options).await?;
    assert_eq!(stats.failed, 1);
    assert_eq!(store.count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn detection_fills_unknown_source_category() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let image = save_image(tmp.path(), "item.png");
    let store = Arc::new(MemoryVectorStore::new(DIM));
    let pipeline = pipeline(store.clone(), ScriptedDetector::fixed(vec![region("bags", 0.9)]));

    let stats = pipeline
        .ingest(vec![row("Mystery tote", &image, "furniture")], &IngestOptions::default())
        .await?;
    assert_eq!(stats.successful, 1);
    assert_eq!(stats.category_corrected, 1);
    let stored = store.scan_payloads().await?;
    assert_eq!(stored[0].category, Category::Bags);
    Ok(())
}

#[tokio::test]
async fn assembled_product_carries_price_metadata_and_region_attributes() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let image = save_image(tmp.path(), "item.png");
    let store = Arc::new(MemoryVectorStore::new(DIM));
    let pipeline = pipeline(store.clone(), ScriptedDetector::fixed(vec![region("shoes", 0.9)]));

    let record = RawRecord::from_pairs([
        ("product_name", "Runner X"),
        ("image_url", image.as_str()),
        ("category", "footwear"),
        ("brand", "Nike"),
        ("model", "Air Max 90"),
        ("tags.visual.color.primary", "red"),
    ]);
    let stats = pipeline.ingest(vec![record], &IngestOptions::default()).await?;
    assert_eq!(stats.successful, 1);

    let stored = store.scan_payloads().await?;
    let p = &stored[0];
    assert_eq!(p.brand.as_deref(), Some("Nike"));
    // No price column anywhere: sports-brand footwear estimate applies
    assert_eq!(p.price, 8000.0);
    assert_eq!(p.currency, "INR");
    assert_eq!(p.subcategory, "Air Max 90");
    assert_eq!(p.colors, vec!["red".to_string()]);
    assert_eq!(p.metadata["tags"]["visual"]["color"]["primary"], "red");
    assert!(p.description.as_deref().unwrap_or_default().contains("by Nike"));
    Ok(())
}

#[tokio::test]
async fn stats_are_identical_across_batch_sizes() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let image = save_image(tmp.path(), "item.png");

    // Mixed outcomes: three good rows (one corrected), a nameless row,
    // a broken image path, and one product ingested beforehand so the
    // skip path fires too.
    let records = || {
        vec![
            row("Runner A", &image, "shoes"),
            row("Runner B", &image, "apparel"),
            RawRecord::from_pairs([("image_url", image.as_str()), ("category", "shoes")]),
            row("Broken", "/nonexistent/path.png", "shoes"),
            row("Runner C", &image, "shoes"),
        ]
    };

    let mut runs = Vec::new();
    for batch_size in [1, 4] {
        let store = Arc::new(MemoryVectorStore::new(DIM));
        let pipeline =
            pipeline(store.clone(), ScriptedDetector::fixed(vec![region("shoes", 0.85)]));
        pipeline
            .ingest(vec![row("Runner A", &image, "shoes")], &IngestOptions::default())
            .await?;

        let options = IngestOptions { batch_size, ..IngestOptions::default() };
        let stats = pipeline.ingest(records(), &options).await?;
        assert_eq!(store.count().await? as u64, 1 + stats.successful, "batch_size={batch_size}");
        runs.push(stats);
    }

    let (serial, batched) = (&runs[0], &runs[1]);
    assert_eq!(serial.total, 5);
    assert_eq!(serial.successful, 2);
    assert_eq!(serial.failed, 2);
    assert_eq!(serial.skipped, 1);
    assert_eq!(serial.category_corrected, 1);

    assert_eq!(serial.total, batched.total);
    assert_eq!(serial.successful, batched.successful);
    assert_eq!(serial.failed, batched.failed);
    assert_eq!(serial.skipped, batched.skipped);
    assert_eq!(serial.category_corrected, batched.category_corrected);
    assert_eq!(serial.errors.len(), batched.errors.len());
    assert_eq!(serial.corrections.len(), batched.corrections.len());
    Ok(())
}

#[tokio::test]
async fn csv_file_round_trip() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let image = save_image(tmp.path(), "item.png");
    let csv_path = tmp.path().join("catalog.csv");
    std::fs::write(
        &csv_path,
        format!(
            "product_name,image_url,category,price\nRunner A,{image},shoes,2999\nTote B,{image},handbags,\n"
        ),
    )?;

    let store = Arc::new(MemoryVectorStore::new(DIM));
    let pipeline = pipeline(store.clone(), ScriptedDetector::fixed(vec![region("shoes", 0.2)]));
    let stats = pipeline.ingest_csv(&csv_path, &IngestOptions::default()).await?;

    assert_eq!(stats.total, 2);
    assert_eq!(stats.successful, 2);
    let mut stored = store.scan_payloads().await?;
    stored.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(stored[0].price, 2999.0);
    assert_eq!(stored[1].category, Category::Bags);
    // Empty price column falls back to the bags estimate
    assert_eq!(stored[1].price, 10000.0);
    Ok(())
}
