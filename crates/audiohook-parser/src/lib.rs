//! # audiohook-parser
//!
//! Pure text helpers for turning a webhook's release name and URL into
//! lookup keys.
//!
//! ## Quick Start
//!
//! ```
//! use audiohook_parser::{extract_mam_id, find_asin, guess_title_author};
//!
//! let guess = guess_title_author("Project Hail Mary by Andy Weir [M4B] (Unabridged)");
//! assert_eq!(guess.title, "Project Hail Mary");
//! assert_eq!(guess.author.as_deref(), Some("Andy Weir"));
//!
//! assert_eq!(extract_mam_id("https://www.myanonamouse.net/t/1234567"), Some(1234567));
//! assert_eq!(find_asin("ASIN: B0F67KLM54").as_deref(), Some("B0F67KLM54"));
//! ```

pub mod asin;
pub mod mam;
pub mod title;

pub use asin::{find_asin, normalize_asin};
pub use mam::{extract_mam_id, is_mam_url};
pub use title::{clean_title, guess_title_author, TitleGuess};
