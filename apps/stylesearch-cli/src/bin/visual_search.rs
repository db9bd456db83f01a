use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use stylesearch_core::{AppConfig, Category};
use stylesearch_detect::default_detector;
use stylesearch_embed::default_embedders;
use stylesearch_vector::LanceVectorStore;
use stylesearch_visual::VisualSearchEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image-path> [--limit N] [--category C]", args[0]);
        std::process::exit(1);
    }
    let image_path = PathBuf::from(&args[1]);
    let mut limit = 10usize;
    let mut category_filter = None;
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" => limit = take_value(&args, &mut i)?.parse()?,
            "--category" => {
                let category = Category::normalize(&take_value(&args, &mut i)?);
                if !category.is_canonical() {
                    anyhow::bail!("Unknown category");
                }
                category_filter = Some(category);
            }
            other => anyhow::bail!("Unknown option: {other}"),
        }
        i += 1;
    }

    let config = AppConfig::load()?;
    let store = Arc::new(
        LanceVectorStore::open(&config.db_path(), &config.products_table, config.embedding_dim)
            .await?,
    );
    let (image_embedder, text_embedder) = default_embedders(&config)?;
    let detector = default_detector(image_embedder.clone(), text_embedder.as_ref())?;
    let engine =
        VisualSearchEngine::new(store, image_embedder, detector, config.correction_threshold);

    let bytes = std::fs::read(&image_path)?;
    let response = engine.search_by_image(&bytes, limit, category_filter).await?;

    println!("Detected {} item(s)", response.detected_items);
    for (r, region) in response.regions.iter().enumerate() {
        println!(
            "\nRegion {} [{}] confidence {:.2}: {} match(es)",
            r + 1,
            region.category,
            region.region.confidence,
            region.matches.len()
        );
        for (i, result) in region.matches.iter().enumerate() {
            println!(
                "  {}. [{:.4}] {} ({})",
                i + 1,
                result.similarity_score,
                result.product.name,
                result.product.category
            );
            println!("     {}", result.match_reasoning);
        }
    }
    Ok(())
}

fn take_value(args: &[String], i: &mut usize) -> anyhow::Result<String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("{} requires a value", args[*i - 1]))
}
