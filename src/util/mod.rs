//! Text and date helpers shared by the feed pipeline.
//!
//! - **Text cleaning**: best-effort reduction of feed markup to plain
//!   display text (tag stripping plus a fixed entity table)
//! - **Date formatting**: display-time rendering of raw feed date strings
//!
//! # Examples
//!
//! ```
//! use newsprint::util::{clean_text, format_date};
//!
//! let text = clean_text("<p>Hello &amp; welcome</p>");
//! assert_eq!(text, "Hello & welcome");
//!
//! let date = format_date("2024-03-05T00:00:00Z");
//! assert_eq!(date, "March 5, 2024");
//! ```

mod date;
mod text;

pub use date::format_date;
pub use text::clean_text;
