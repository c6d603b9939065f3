//! Documentation files
//!
//! - [`DocumentStore`]: load and backup-then-write of one directory's document
//! - [`MergeEngine`]: lossless merge of prior and generated text

pub mod markdown;
mod merge;
mod store;

pub use merge::{MergeEngine, MergedDocument, strip_children_section};
pub use store::{DocumentStore, ExistingDocument, SaveOutcome};
