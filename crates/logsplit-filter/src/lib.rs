//! Line filtering for logsplit
//!
//! This crate provides compiled keyword/regex filters, the ordered filter
//! registry, bounded per-channel buffers and the line router that ties them
//! together.

mod buffer;
mod error;
mod filter;
pub mod input;
mod registry;
mod router;

pub use buffer::BoundedBuffer;
pub use error::{FilterError, Result};
pub use filter::{CompiledRule, Filter};
pub use registry::{FilterRegistry, RegistryEntry};
pub use router::{LineRouter, RouteStats, Routed, Sink, route_lines};

// Re-export types used in our public API
pub use logsplit_types::{
    Combinator, FilterSetConfig, MatchRule, PASSTHROUGH_CHANNEL, RetentionPolicy, RuleKind,
};
