pub mod qdrant;

pub use qdrant::{QdrantStore, DEFAULT_TIMEOUT};
