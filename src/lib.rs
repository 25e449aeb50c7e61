//! Unread-mail feed checker.
//!
//! Fetches an Atom feed of unread messages (answering the server's Basic
//! authentication challenge with a username and a password read from a
//! file), counts its entries, and reduces the result to an exit status:
//! 0 when there is new mail, 1 when there is none or anything went wrong.

pub mod check;
pub mod config;
pub mod credentials;
pub mod feed;
pub mod status;

pub use check::{build_client, run, unread_count, CheckError};
pub use config::Config;
pub use credentials::Credentials;
pub use status::{decide, MailStatus};
