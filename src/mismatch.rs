//! MD-tag decoding into read-relative substitution and indel positions.
//!
//! Positions are 1-based and always expressed in read 5'->3' orientation:
//! for reverse-strand alignments every position `p` is reported as
//! `read_length + 1 - p`.

use crate::error::{FragError, Result};
use crate::types::Strand;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    Substitution,
    Insertion,
    Deletion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub position: u32,
    pub kind: MismatchKind,
    /// Number of bases involved (1 for substitutions).
    pub length: u32,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MismatchKind::Substitution => write!(f, "{}", self.position),
            MismatchKind::Insertion => write!(f, "{}I", self.position),
            MismatchKind::Deletion => write!(f, "{}D", self.position),
        }
    }
}

/// Decoded mismatches of one record plus their summed cost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MismatchList {
    pub entries: Vec<Mismatch>,
    /// Substitutions count 1, indels count their length.
    pub cost: u32,
}

impl MismatchList {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for MismatchList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("none");
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

/// Decode the MD string of `read`, merging in the CIGAR insertions.
///
/// `insertions` maps the 1-based read offset of each insertion to its length,
/// as produced by [`crate::cigar::decode_cigar`]. Positions past `read_length`
/// are rejected.
pub fn decode_mismatches(
    read: &str,
    md: &str,
    insertions: &BTreeMap<u32, u32>,
    strand: Strand,
    read_length: u32,
) -> Result<MismatchList> {
    let malformed = |reason: String| FragError::MalformedMismatchString {
        read: read.to_string(),
        md: md.to_string(),
        reason,
    };
    let orient = |pos: u32| -> Result<u32> {
        if pos == 0 || pos > read_length {
            return Err(malformed(format!(
                "position {pos} lies outside a read of length {read_length}"
            )));
        }
        Ok(match strand {
            Strand::Forward => pos,
            Strand::Reverse => read_length + 1 - pos,
        })
    };
    let advance = |cursor: u32, by: u32| -> Result<u32> {
        cursor
            .checked_add(by)
            .ok_or_else(|| malformed("match count overflows read position".to_string()))
    };

    let mut list = MismatchList::default();
    let mut pending = insertions.iter().peekable();
    let mut cursor: u32 = 1;
    let bytes = md.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let digits_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == digits_start {
            return Err(malformed(format!(
                "expected a match count at offset {i}, found '{}'",
                bytes[i] as char
            )));
        }
        let run: u32 = md[digits_start..i].parse().map_err(|e| {
            malformed(format!("bad match count at offset {digits_start}: {e}"))
        })?;
        cursor = advance(cursor, run)?;

        // An insertion starting at or before the cursor sits between the
        // matched run and the next reference base.
        while let Some(&(&pos, &len)) = pending.peek() {
            if pos > cursor {
                break;
            }
            list.entries.push(Mismatch {
                position: orient(pos)?,
                kind: MismatchKind::Insertion,
                length: len,
            });
            list.cost += len;
            cursor = advance(cursor, len)?;
            pending.next();
        }

        if i == bytes.len() {
            break;
        }

        if bytes[i] == b'^' {
            let run_start = i + 1;
            i = run_start;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            let deleted = (i - run_start) as u32;
            if deleted == 0 {
                return Err(malformed(format!("empty deletion at offset {}", run_start - 1)));
            }
            list.entries.push(Mismatch {
                position: orient(cursor)?,
                kind: MismatchKind::Deletion,
                length: deleted,
            });
            list.cost += deleted;
        } else if bytes[i].is_ascii_alphabetic() {
            list.entries.push(Mismatch {
                position: orient(cursor)?,
                kind: MismatchKind::Substitution,
                length: 1,
            });
            list.cost += 1;
            cursor = advance(cursor, 1)?;
            i += 1;
        } else {
            return Err(malformed(format!(
                "unexpected character '{}' at offset {i}",
                bytes[i] as char
            )));
        }
    }

    for (&pos, &len) in pending {
        list.entries.push(Mismatch {
            position: orient(pos)?,
            kind: MismatchKind::Insertion,
            length: len,
        });
        list.cost += len;
    }

    Ok(list)
}
