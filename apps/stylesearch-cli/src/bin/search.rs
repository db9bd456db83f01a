use std::env;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use stylesearch_core::{AppConfig, Category};
use stylesearch_embed::default_embedders;
use stylesearch_text::{HybridTextEngine, SearchOptions};
use stylesearch_vector::LanceVectorStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage: {} <query> [--limit N] [--category C] [--bm25-weight W] [--semantic-weight W] [--min-score S]",
            args[0]
        );
        std::process::exit(1);
    }
    let query = &args[1];
    let mut options = SearchOptions::default();
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" => options.limit = take_value(&args, &mut i)?.parse()?,
            "--category" => {
                let category = Category::normalize(&take_value(&args, &mut i)?);
                if !category.is_canonical() {
                    anyhow::bail!("Unknown category");
                }
                options.category = Some(category);
            }
            "--bm25-weight" => options.bm25_weight = take_value(&args, &mut i)?.parse()?,
            "--semantic-weight" => options.semantic_weight = take_value(&args, &mut i)?.parse()?,
            "--min-score" => options.min_score = take_value(&args, &mut i)?.parse()?,
            other => anyhow::bail!("Unknown option: {other}"),
        }
        i += 1;
    }

    let config = AppConfig::load()?;
    let store = Arc::new(
        LanceVectorStore::open(&config.db_path(), &config.products_table, config.embedding_dim)
            .await?,
    );
    let (_, text_embedder) = default_embedders(&config)?;
    let engine = HybridTextEngine::new(store, text_embedder);
    let indexed = engine.refresh_indices().await?;
    println!("Indexed {indexed} products");

    let results = engine.search(query, &options)?;
    println!("Found {} results for: \"{}\"", results.len(), query);
    for (i, result) in results.iter().enumerate() {
        println!(
            "\n  {}. [{:.4}] {} ({} {} {})",
            i + 1,
            result.similarity_score,
            result.product.name,
            result.product.category,
            result.product.price,
            result.product.currency,
        );
        println!("     {}", result.match_reasoning);
    }
    Ok(())
}

fn take_value(args: &[String], i: &mut usize) -> anyhow::Result<String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("{} requires a value", args[*i - 1]))
}
