use crate::cigar::{ClipType, DecodedGeometry};
use crate::record::AlignmentRecord;
use std::fmt;

/// Default distance beyond which two mates are not considered the same locus.
pub const DEFAULT_MAX_MATE_DISTANCE: u32 = 230_000;

/// Whether the mate of a chimeric read agrees with its placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MateStatus {
    /// Mate nearby on the same reference, or not applicable.
    #[default]
    Proper,
    /// Mate on another reference or too far away; hints at a real breakpoint.
    Wrong,
}

impl fmt::Display for MateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MateStatus::Proper => f.write_str("p"),
            MateStatus::Wrong => f.write_str("w"),
        }
    }
}

/// One breakpoint observation; `Display` renders the TSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub chrom: String,
    pub position: u32,
    pub name: String,
    pub mate_status: MateStatus,
    pub clip: ClipType,
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.chrom, self.position, self.name, self.mate_status, self.clip
        )
    }
}

/// True when two placements are on different references or further apart than `max_distance`.
pub fn is_discordant(
    chrom1: &str,
    start1: u32,
    chrom2: &str,
    start2: u32,
    max_distance: u32,
) -> bool {
    chrom1 != chrom2 || start1.abs_diff(start2) > max_distance
}

/// Breakpoint of a uniquely mapped, chimeric record.
///
/// A clip at the head puts the breakpoint at the alignment start, a clip at
/// the tail right after the last aligned block. Mate agreement is only
/// checked in paired mode.
pub fn detect_breakpoint(
    record: &AlignmentRecord,
    geometry: &DecodedGeometry,
    paired: bool,
    max_mate_distance: u32,
) -> Option<Breakpoint> {
    if !record.is_mapped || !record.is_unique() || !geometry.chimeric {
        return None;
    }
    let chrom = record.reference.as_deref()?;

    let mut mate_status = MateStatus::Proper;
    if paired && record.is_mate_mapped {
        let mate_chrom = record.mate_reference.as_deref().unwrap_or("");
        if is_discordant(chrom, record.start, mate_chrom, record.mate_start, max_mate_distance) {
            mate_status = MateStatus::Wrong;
        }
    }

    let position = if geometry.clipped_at_head {
        record.start
    } else {
        record.start + geometry.last_block_end()
    };

    Some(Breakpoint {
        chrom: chrom.to_string(),
        position,
        name: record.name.clone(),
        mate_status,
        clip: geometry.clip,
    })
}
