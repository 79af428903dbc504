//! PDF Link Tagger Library
//!
//! A library for rewriting tracking-tag query parameters in the hyperlink
//! annotations of a PDF document. This library provides functionality to:
//! - Walk every link annotation across a document's pages
//! - Rewrite the `tag` query parameter of links under a given base URL
//! - Report how many links were found versus actually updated
//! - List the hyperlinks a document contains
//!
//! All other document content is left structurally intact.
//!
//! # Example
//!
//! ```no_run
//! use pdf_link_tagger::pdf::{retag_pdf, RetagOptions};
//! use std::path::Path;
//!
//! let options = RetagOptions {
//!     base_url: "https://link.example.com/link/".to_string(),
//!     tag: "acme-2024".to_string(),
//! };
//!
//! let report = retag_pdf(
//!     Path::new("resume.pdf"),
//!     Path::new("tagged_resume.pdf"),
//!     &options,
//! ).expect("Failed to retag PDF");
//!
//! println!("{} links found, {} updated", report.total, report.updated);
//! ```

pub mod error;
pub mod pdf;

// Re-export commonly used items
pub use error::{Error, Result};
