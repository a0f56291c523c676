//! Loading raw tables from disk.
//!
//! Most callers should use [`load_raw_table`] or [`load_raw_source`] (from [`unified`]) which:
//!
//! - auto-detect format by file extension (or you can override via [`LoadOptions`])
//! - keep every cell as the string the agency published
//! - optionally report success/failure/alerts to a [`crate::observability::PipelineObserver`]
//!
//! Format-specific functions are also available under [`csv`] and, with the `excel`
//! feature, `excel`.

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod unified;

pub use unified::{load_raw_source, load_raw_table, LoadOptions, LoadRequest, SourceFormat};
