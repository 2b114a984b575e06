//! Qdrant REST adapter.

mod client;

pub use client::{QdrantConfig, QdrantRestClient};
