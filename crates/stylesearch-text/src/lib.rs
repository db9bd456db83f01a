#![deny(warnings)]
#![deny(unused_imports)]

pub mod bm25;
pub mod engine;

pub use bm25::{tokenize, Bm25Index};
pub use engine::{HybridTextEngine, SearchOptions};
