#![deny(warnings)]
#![deny(unused_imports)]

pub mod lance;
pub mod memory;
pub mod schema;

pub use lance::LanceVectorStore;
pub use memory::{cosine_similarity, MemoryVectorStore};
