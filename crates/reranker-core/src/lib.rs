pub mod error;
pub mod service;
pub mod types;

pub use error::RerankError;
pub use service::*;
pub use types::*;
