//! Hierarchical Build
//!
//! [`BuildDriver`] ties scanning, analysis, merging and persistence together
//! and returns a [`BuildReport`].

mod driver;
mod report;

pub use driver::{BuildDriver, BuildOptions};
pub use report::{BuildReport, DirectoryFailure, DirectoryOutcome, DocumentAction};
