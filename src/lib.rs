//! Fetch a remote RSS 2.0 or Atom feed and normalize it into a uniform,
//! dialect-independent article model.
//!
//! The pipeline is deliberately small: [`fetch_articles`] issues a
//! single GET for the configured feed URL, detects whether the returned
//! document is RSS 2.0 or Atom, and extracts each `item`/`entry` into an
//! [`Article`] with cleaned text fields. [`format_date`] renders raw
//! feed dates for display.
//!
//! Failures come in two shapes. The `try_*` functions return typed
//! errors so callers can distinguish an unreachable or malformed feed
//! from an empty one; the plain [`fetch_articles`]/[`parse`] functions
//! collapse every failure to an empty list after logging it, for callers
//! that prefer the fail-soft contract.
//!
//! Nothing is cached or persisted: every call produces fresh articles
//! with ids assigned by document position (`article-1`, `article-2`, …),
//! stable within a single parse pass only.

pub mod config;
pub mod feed;
pub mod util;

pub use config::{ConfigError, FeedConfig};
pub use feed::{
    fetch_articles, parse, try_fetch_articles, try_parse, Article, FetchError, ParseError,
};
pub use util::{clean_text, format_date};
