//! Summary pipeline: chunking, retries, caching, and service orchestration.

pub mod cache;
pub mod chunking;
pub mod retry;
mod service;
pub mod types;

pub use cache::SummaryCache;
pub use chunking::{ChunkPolicy, Segment};
pub use retry::RetryPolicy;
pub use service::{SummaryApi, SummaryService};
pub use types::{
    ChunkingError, PipelineSettings, SummaryError, SummaryOptions, SummaryOutcome,
    SummaryVariant,
};
