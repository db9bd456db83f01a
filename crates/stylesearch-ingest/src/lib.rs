#![deny(warnings)]
#![deny(unused_imports)]

pub mod fetch;
pub mod metadata;
pub mod pipeline;
pub mod price;
pub mod source;

pub use fetch::ImageFetcher;
pub use pipeline::{derive_product_id, write_report, IngestOptions, IngestionPipeline};
pub use source::{read_csv, RawRecord};
