//! Document Store for redline.
//!
//! Flat-file persistence for a pipeline run:
//! - **input.md**: the document to revise (read once, trimmed)
//! - **intermediate/NN_name.md**: snapshot after every pass
//! - **output.md**: the final document
//! - **processing_log.json**: the run log
//!
//! # Example
//!
//! ```ignore
//! use redline::store::{DocumentStore, StorePaths};
//!
//! let store = DocumentStore::new(StorePaths::under("."));
//! let text = store.load_initial_document()?;
//! store.save_intermediate(1, "Basic Typo Reviewer", &text)?;
//! store.save_final(&text)?;
//! ```

mod clock;
mod document_store;
mod records;

pub use clock::{Clock, FixedClock, SystemClock};
pub use document_store::{DocumentStore, StorePaths, snapshot_file_name};
pub use records::{RunLog, StepRecord, content_digest};
