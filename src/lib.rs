//! fragstat-rs: fragment-level classification of name-sorted alignments.
//!
//! For every read-pair (or single read) the library decides one alignment
//! category, reports chimeric breakpoints and decodes mismatch positions
//! relative to the read.
//!
//! # Library usage
//!
//! ```no_run
//! use fragstat_rs::{AlignmentRecord, AnnotatedRecord, Config, Emission, FragmentReconciler, Mode};
//!
//! # fn main() -> Result<(), fragstat_rs::FragError> {
//! let config = Config::new(Mode::Paired, 100);
//! let mut reconciler = FragmentReconciler::new(config.max_mate_distance);
//!
//! // Records must arrive grouped by name.
//! let records: Vec<AlignmentRecord> = /* from noodles or elsewhere */ Vec::new();
//! for record in records {
//!     let annotated = AnnotatedRecord::annotate(record, &config)?;
//!     for emission in reconciler.push(annotated)? {
//!         if let Emission::Fragment(outcome) = emission {
//!             println!("{outcome}");
//!         }
//!     }
//! }
//! let summary = reconciler.finish();
//! println!("{} fragments", summary.stats.reads);
//! # Ok(())
//! # }
//! ```

pub mod bam_input;
pub mod breakpoint;
pub mod cigar;
pub mod config;
pub mod error;
pub mod mismatch;
pub mod pipeline;
pub mod reconcile;
pub mod record;
pub mod single_end;
pub mod sinks;
pub mod stats;
pub mod types;

// Flat re-exports for the most commonly used types.
pub use config::{Config, Mode};
pub use error::FragError;
pub use reconcile::{Emission, FragmentCategory, FragmentOutcome, FragmentReconciler};
pub use record::{AlignmentRecord, AnnotatedRecord};
pub use single_end::SingleEndTracker;
pub use stats::RunningStats;
pub use types::{Mate, Strand};
