pub mod config;
pub mod error;
pub mod extractor;
pub mod sampler;
pub mod worker_pool;
