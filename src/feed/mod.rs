//! Feed retrieval and normalization.
//!
//! Two layers:
//!
//! - **Parsing**: dialect detection (RSS 2.0 vs Atom) and per-dialect
//!   field extraction into the common [`Article`] model
//! - **Fetching**: single-shot HTTP retrieval with a timeout and a
//!   response size cap, feeding the parser
//!
//! Both layers expose a typed `try_*` surface and a fail-soft surface
//! that logs failures and returns an empty list.
//!
//! # Example
//!
//! ```no_run
//! # async fn run() {
//! use newsprint::{fetch_articles, FeedConfig};
//!
//! let client = reqwest::Client::new();
//! let config = FeedConfig::default();
//! let articles = fetch_articles(&client, &config).await;
//! for article in &articles {
//!     println!("{}: {}", article.id, article.title);
//! }
//! # }
//! ```

mod fetcher;
mod parser;

pub use fetcher::{fetch_articles, try_fetch_articles, FetchError};
pub use parser::{parse, try_parse, Article, ParseError};
