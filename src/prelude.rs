//! Convenience re-exports for embedding the crawler.
//!
//! ```
//! use scuttle::prelude::*;
//! ```

pub use crate::blacklist::UrlBlacklist;
pub use crate::builder::{CrawlerBuilder, CrawlerConfig};
pub use crate::crawler::{Crawler, RetryPolicy};
pub use crate::error::CrawlError;
pub use crate::job::{Job, PageRole};
pub use crate::loader::{HttpLoader, Loader};
pub use crate::parser::{ContentParser, CssContentParser, CssLinkParser, LinkParser};
pub use crate::queue::JobQueue;
pub use crate::schema::{FieldKind, Record, Schema, SchemaField};
pub use crate::selector::{LinkSelector, PageKind, SelectorPath};
pub use crate::sink::{CallbackSink, ConsoleSink, JsonLinesSink, Sink};
pub use crate::stats::StatCollector;
pub use crate::tracker::{InMemoryLinkTracker, LinkTracker};

pub use async_trait::async_trait;
pub use url::Url;
