use crate::error::{FragError, Result};
use noodles::sam::alignment::record::cigar::{op::Kind as CigarKind, Op as CigarOp};
use std::collections::BTreeMap;
use std::fmt;

/// Shortest clip the threshold may be clamped to.
pub const MIN_CLIP_THRESHOLD: u32 = 15;
/// Longest clip the threshold may be clamped to.
pub const MAX_CLIP_THRESHOLD: u32 = 21;

/// Kind of terminal clip that made a record chimeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipType {
    #[default]
    None,
    Soft,
    Hard,
}

impl fmt::Display for ClipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipType::None => f.write_str("N"),
            ClipType::Soft => f.write_str("S"),
            ClipType::Hard => f.write_str("H"),
        }
    }
}

/// Alignment geometry derived from a CIGAR.
///
/// Block starts are offsets from the alignment start; the first block always
/// starts at 0 and every reference skip opens a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedGeometry {
    pub block_starts: Vec<u32>,
    pub block_lengths: Vec<u32>,
    /// Reference span of the alignment.
    pub alignment_end: u32,
    pub junction: bool,
    pub chimeric: bool,
    /// The chimeric clip is the first operation.
    pub clipped_at_head: bool,
    pub clip: ClipType,
    pub leading_soft_clip: u32,
    /// 1-based read offset of the first inserted base -> insertion length.
    pub insertions: BTreeMap<u32, u32>,
}

impl DecodedGeometry {
    /// End offset of the last block (start + length).
    pub fn last_block_end(&self) -> u32 {
        let start = self.block_starts.last().copied().unwrap_or(0);
        let len = self.block_lengths.last().copied().unwrap_or(0);
        start + len
    }
}

/// Minimum terminal clip length that marks a read as chimeric.
///
/// `round(fraction * read_length)` clamped to `[15, 21]`.
pub fn clip_threshold(read_length: u32, fraction: f64) -> u32 {
    let raw = (f64::from(read_length) * fraction + 0.5).floor();
    let raw = if raw.is_finite() && raw > 0.0 { raw as u32 } else { 0 };
    raw.clamp(MIN_CLIP_THRESHOLD, MAX_CLIP_THRESHOLD)
}

/// Walk the CIGAR of `read` and derive its block structure, clipping and insertions.
pub fn decode_cigar(read: &str, ops: &[CigarOp], clip_threshold: u32) -> Result<DecodedGeometry> {
    let mut geometry = DecodedGeometry { block_starts: vec![0], ..Default::default() };

    let mut ref_offset: u32 = 0;
    let mut read_offset: u32 = 0;
    let mut block_len: u32 = 0;
    let last = ops.len().saturating_sub(1);

    for (i, op) in ops.iter().enumerate() {
        let len = op.len() as u32;
        match op.kind() {
            CigarKind::Match => {
                block_len += len;
                ref_offset += len;
                read_offset += len;
            }
            CigarKind::Insertion => {
                geometry.insertions.insert(read_offset + 1, len);
                read_offset += len;
            }
            CigarKind::Deletion => {
                block_len += len;
                ref_offset += len;
            }
            CigarKind::Skip => {
                geometry.block_starts.push(ref_offset + len);
                geometry.block_lengths.push(block_len);
                ref_offset += len;
                block_len = 0;
                geometry.junction = true;
            }
            CigarKind::SoftClip => {
                if ref_offset == 0 && read_offset == 0 {
                    geometry.leading_soft_clip = len;
                }
                mark_clip(&mut geometry, ClipType::Soft, len, clip_threshold, i == 0, i == last);
            }
            CigarKind::HardClip => {
                mark_clip(&mut geometry, ClipType::Hard, len, clip_threshold, i == 0, i == last);
            }
            CigarKind::Pad => {}
            // `=` and `X` are not produced by the supported mappers.
            kind => {
                return Err(FragError::UnsupportedCigarOp { read: read.to_string(), kind });
            }
        }
    }

    geometry.block_lengths.push(block_len);
    geometry.alignment_end = ref_offset;
    Ok(geometry)
}

fn mark_clip(
    geometry: &mut DecodedGeometry,
    clip: ClipType,
    len: u32,
    threshold: u32,
    is_first: bool,
    is_last: bool,
) {
    if len < threshold {
        return;
    }
    if is_first {
        geometry.chimeric = true;
        geometry.clipped_at_head = true;
        geometry.clip = clip;
    } else if is_last {
        geometry.chimeric = true;
        geometry.clip = clip;
    }
}
