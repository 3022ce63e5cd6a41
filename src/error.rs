//! Error types for record decoding and fragment reconciliation.

use noodles::sam::alignment::record::cigar::op::Kind as CigarKind;
use thiserror::Error;

/// Result type alias for the classification core.
pub type Result<T> = std::result::Result<T, FragError>;

/// Every error the core can raise. All of them abort the run.
#[derive(Error, Debug)]
pub enum FragError {
    /// A CIGAR operation outside the supported set
    #[error("unsupported CIGAR operation {kind:?} in read '{read}'")]
    UnsupportedCigarOp {
        /// The offending read name
        read: String,
        /// The operation kind
        kind: CigarKind,
    },

    /// An MD tag that does not follow the `[0-9]+(([A-Z]|\^[A-Z]+)[0-9]+)*` grammar
    #[error("malformed MD string '{md}' in read '{read}': {reason}")]
    MalformedMismatchString {
        /// The offending read name
        read: String,
        /// The full MD string
        md: String,
        /// What was wrong at the failing offset
        reason: String,
    },

    /// A record field that could not be decoded from the input
    #[error("malformed record '{read}': {source}")]
    MalformedRecord {
        /// The offending read name
        read: String,
        /// The underlying decode error
        #[source]
        source: std::io::Error,
    },

    /// A single-operation re-alignment of a mate already resolved as unique
    #[error(
        "mate{mate} unique inconsistency in read '{read}': \
         re-alignment with {cigar_ops} CIGAR operation(s)"
    )]
    UniqueMateInconsistency {
        /// The offending read name
        read: String,
        /// Mate number (1 or 2)
        mate: u8,
        /// CIGAR operation count of the contradicting record
        cigar_ops: usize,
    },

    /// Reading the input or writing a sink failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
