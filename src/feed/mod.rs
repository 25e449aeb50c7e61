//! Unread-mail feed retrieval and decoding.
//!
//! - [`fetcher`] - HTTP retrieval, answering a Basic authentication challenge
//! - [`parser`] - Atom decoding with `feed-rs`, reduced to an entry count
//!
//! # Example
//!
//! ```ignore
//! use crate::feed::{count_entries, fetch_feed};
//!
//! let body = fetch_feed(&client, url, &credentials, None).await?;
//! let unread = count_entries(&body);
//! ```

mod fetcher;
mod parser;

pub use fetcher::{fetch_feed, Challenge, FetchError};
pub use parser::count_entries;
