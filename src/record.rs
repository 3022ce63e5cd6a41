//! The alignment record consumed by the classification core.
//!
//! `AlignmentRecord` carries plain values only (reference names already
//! resolved); `bam_input` builds these from noodles records.

use crate::breakpoint::{self, Breakpoint};
use crate::cigar::{self, DecodedGeometry};
use crate::config::Config;
use crate::error::Result;
use crate::mismatch::{self, MismatchList};
use crate::types::{Mate, Strand};
use noodles::sam::alignment::record::cigar::Op as CigarOp;

/// One alignment of one read, as reported by the mapper.
#[derive(Debug, Clone, Default)]
pub struct AlignmentRecord {
    pub name: String,
    /// `None` for single-end input.
    pub mate: Option<Mate>,
    pub is_mapped: bool,
    pub is_mate_mapped: bool,
    pub is_primary: bool,
    pub is_duplicate: bool,
    pub is_qc_fail: bool,
    pub is_proper_pair: bool,
    /// Reference sequence name; `None` when unplaced.
    pub reference: Option<String>,
    /// 1-based alignment start (0 when unplaced).
    pub start: u32,
    pub cigar: Vec<CigarOp>,
    /// Raw MD tag value.
    pub md: Option<String>,
    /// NH tag: number of equally-best alignments reported for this read.
    pub multiplicity: Option<u32>,
    pub read_length: u32,
    pub strand: Strand,
    pub mate_reference: Option<String>,
    /// 1-based mate alignment start (0 when unplaced).
    pub mate_start: u32,
}

impl AlignmentRecord {
    /// A missing NH tag is taken to mean a single reported alignment.
    pub fn is_unique(&self) -> bool {
        self.multiplicity.unwrap_or(1) <= 1
    }

    pub fn is_multi(&self) -> bool {
        !self.is_unique()
    }

    /// Paired-mode mate number; records without the first-segment flag are mate 2.
    pub fn mate_or_second(&self) -> Mate {
        self.mate.unwrap_or(Mate::Second)
    }
}

/// A record together with everything decoded from it.
///
/// Decoded fields are `None` for unmapped records.
#[derive(Debug, Clone)]
pub struct AnnotatedRecord {
    pub record: AlignmentRecord,
    pub geometry: Option<DecodedGeometry>,
    pub mismatches: Option<MismatchList>,
    pub breakpoint: Option<Breakpoint>,
}

impl AnnotatedRecord {
    /// Decode CIGAR, MD and breakpoint evidence for a mapped record.
    pub fn annotate(record: AlignmentRecord, config: &Config) -> Result<Self> {
        if !record.is_mapped {
            return Ok(Self { record, geometry: None, mismatches: None, breakpoint: None });
        }

        let geometry = cigar::decode_cigar(&record.name, &record.cigar, config.clip_threshold())?;
        let mismatches = mismatch::decode_mismatches(
            &record.name,
            record.md.as_deref().unwrap_or(""),
            &geometry.insertions,
            record.strand,
            record.read_length,
        )?;
        let breakpoint = breakpoint::detect_breakpoint(
            &record,
            &geometry,
            config.is_paired(),
            config.max_mate_distance,
        );

        Ok(Self { record, geometry: Some(geometry), mismatches: Some(mismatches), breakpoint })
    }

    /// Whether the alignment crosses a reference skip.
    pub fn junction(&self) -> bool {
        self.geometry.as_ref().is_some_and(|g| g.junction)
    }

    /// 1-based inclusive end on the reference, or 0 when unplaced.
    pub fn alignment_end(&self) -> u32 {
        match &self.geometry {
            Some(g) if self.record.start > 0 && g.alignment_end > 0 => {
                self.record.start + g.alignment_end - 1
            }
            _ => 0,
        }
    }

    pub fn mismatch_cost(&self) -> u32 {
        self.mismatches.as_ref().map_or(0, |m| m.cost)
    }
}
