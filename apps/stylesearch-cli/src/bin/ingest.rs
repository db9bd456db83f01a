use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use stylesearch_core::AppConfig;
use stylesearch_detect::default_detector;
use stylesearch_embed::default_embedders;
use stylesearch_ingest::{write_report, IngestOptions, IngestionPipeline};
use stylesearch_vector::LanceVectorStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <catalog.csv> [options]", args[0]);
        eprintln!("Options:");
        eprintln!("  --image-column NAME     (default: image_url)");
        eprintln!("  --name-column NAME      (default: product_name)");
        eprintln!("  --category-column NAME  (default: category)");
        eprintln!("  --batch-size N          (default: from config)");
        eprintln!("  --no-validate           skip detection-based category correction");
        eprintln!("  --no-skip-existing      re-ingest products that already exist");
        eprintln!("  --report PATH           (default: ingestion_report.json)");
        std::process::exit(1);
    }
    let csv_path = PathBuf::from(&args[1]);

    let config = AppConfig::load()?;
    let mut options = IngestOptions { batch_size: config.batch_size, ..IngestOptions::default() };
    let mut report_path = PathBuf::from("ingestion_report.json");
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--image-column" => options.image_column = take_value(&args, &mut i)?,
            "--name-column" => options.name_column = take_value(&args, &mut i)?,
            "--category-column" => options.category_column = take_value(&args, &mut i)?,
            "--batch-size" => options.batch_size = take_value(&args, &mut i)?.parse()?,
            "--report" => report_path = PathBuf::from(take_value(&args, &mut i)?),
            "--no-validate" => options.validate_categories = false,
            "--no-skip-existing" => options.skip_existing = false,
            other => anyhow::bail!("Unknown option: {other}"),
        }
        i += 1;
    }

    let store = Arc::new(
        LanceVectorStore::open(&config.db_path(), &config.products_table, config.embedding_dim)
            .await?,
    );
    let (image_embedder, text_embedder) = default_embedders(&config)?;
    let detector = default_detector(image_embedder.clone(), text_embedder.as_ref())?;
    let pipeline = IngestionPipeline::new(store, image_embedder, detector, &config)?;

    let stats = pipeline.ingest_csv(&csv_path, &options).await?;
    write_report(&stats, &report_path)?;

    println!("Ingestion complete:");
    println!("  total:              {}", stats.total);
    println!("  successful:         {}", stats.successful);
    println!("  failed:             {}", stats.failed);
    println!("  skipped:            {}", stats.skipped);
    println!("  category corrected: {}", stats.category_corrected);
    println!("Report written to {}", report_path.display());
    Ok(())
}

fn take_value(args: &[String], i: &mut usize) -> anyhow::Result<String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("{} requires a value", args[*i - 1]))
}
