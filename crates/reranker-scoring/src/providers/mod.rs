pub mod cohere;
pub mod jina;
#[cfg(feature = "local-model")]
pub mod local;
pub mod pinecone;

pub use cohere::CohereScoringFunction;
pub use jina::JinaScoringFunction;
#[cfg(feature = "local-model")]
pub use local::LocalCrossEncoder;
pub use pinecone::PineconeScoringFunction;
