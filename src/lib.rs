//! A selector-driven web crawling and scraping engine.
//!
//! # Overview
//!
//! A crawl is described declaratively: one or more seed URLs, a path of CSS
//! link selectors leading from the seeds to the pages worth scraping, and a
//! schema of fields to extract there. The engine walks the site
//! breadth-first with a pool of async workers, follows pagination on listing
//! pages, fetches every URL at most once per crawl, retries transient
//! failures with exponential backoff and fans extracted records out to
//! pluggable sinks.
//!
//! # Example
//!
//! ```no_run
//! use scuttle::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CrawlError> {
//!     let crawler = CrawlerBuilder::new()
//!         .seed("https://books.example/")
//!         .follow_links(".category a")
//!         .follow_links_paginated(".product a", "a[rel=next]")
//!         .schema(
//!             Schema::new()
//!                 .field("title", "h1")
//!                 .field("price", ".price")
//!                 .attr_field("cover", "img.cover", "src"),
//!         )
//!         .ignore_urls(["https://books.example/account"])
//!         .limit(5_000)
//!         .add_sink(JsonLinesSink::new("books.jsonl"))
//!         .build()?;
//!
//!     crawler.run().await
//! }
//! ```
//!
//! Every collaborator sits behind a trait: [`Loader`](loader::Loader) for
//! fetching (plug in a headless browser for script-heavy pages),
//! [`LinkTracker`](tracker::LinkTracker) for dedup state (swap in a shared
//! store to resume or distribute crawls), the parsers for non-CSS extraction
//! and [`Sink`](sink::Sink) for outputs.

pub mod blacklist;
pub mod builder;
pub mod crawler;
pub mod error;
pub mod job;
pub mod loader;
pub mod parser;
pub mod prelude;
pub mod queue;
pub mod schema;
pub mod selector;
pub mod sink;
pub mod stats;
pub mod tracker;

pub use builder::CrawlerBuilder;
pub use crawler::{Crawler, RetryPolicy};
pub use error::CrawlError;
pub use job::{Job, PageRole};
pub use schema::{Record, Schema};
pub use selector::{LinkSelector, PageKind, SelectorPath};
