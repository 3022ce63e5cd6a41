use crate::error::FragError;
use crate::record::AlignmentRecord;
use crate::types::{Mate, Strand};
use anyhow::{Context, Result, bail};
use noodles::bam;
use noodles::sam;
use noodles::sam::alignment::record::data::field::{Tag, Value};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

const MD_TAG: Tag = Tag::new(b'M', b'D');
const NH_TAG: Tag = Tag::new(b'N', b'H');

/// One opened BAM file with its next record buffered.
pub struct BamInput<R> {
    pub path: PathBuf,
    pub header: sam::Header,
    reader: bam::io::Reader<R>,
    next: Option<bam::Record>,
}

pub fn open_bam(path: &Path) -> Result<BamInput<impl Read>> {
    let mut reader = bam::io::reader::Builder
        .build_from_path(path)
        .with_context(|| format!("failed to open BAM {}", path.display()))?;
    let header = reader
        .read_header()
        .with_context(|| format!("failed to read BAM header of {}", path.display()))?;
    let mut input = BamInput { path: path.to_path_buf(), header, reader, next: None };
    input.advance()?;
    Ok(input)
}

impl<R: Read> BamInput<R> {
    fn advance(&mut self) -> Result<()> {
        let mut record = bam::Record::default();
        let n = self
            .reader
            .read_record(&mut record)
            .map_err(FragError::from)
            .with_context(|| format!("failed to read record from {}", self.path.display()))?;
        self.next = if n == 0 { None } else { Some(record) };
        Ok(())
    }

    fn peek_name(&self) -> Option<&[u8]> {
        let record = self.next.as_ref()?;
        let name: &[u8] = match record.name() {
            Some(name) => name,
            None => b"",
        };
        Some(name)
    }
}

/// Name-ordered merge over several name-sorted BAM files.
///
/// Ties go to the earlier input so records of one fragment stay contiguous.
pub struct MergedInput<R> {
    inputs: Vec<BamInput<R>>,
}

impl<R: Read> MergedInput<R> {
    /// All inputs must carry the same reference dictionary, in the same order.
    pub fn new(inputs: Vec<BamInput<R>>) -> Result<Self> {
        let Some(first) = inputs.first() else {
            bail!("no input BAM files given");
        };
        let names = reference_names(&first.header);
        for input in &inputs[1..] {
            if reference_names(&input.header) != names {
                bail!(
                    "reference sequences of {} differ from {}",
                    input.path.display(),
                    first.path.display()
                );
            }
        }
        Ok(Self { inputs })
    }

    /// Header of the first input; shared by all of them.
    pub fn header(&self) -> &sam::Header {
        &self.inputs[0].header
    }

    pub fn next_record(&mut self) -> Result<Option<bam::Record>> {
        let mut best: Option<usize> = None;
        for (i, input) in self.inputs.iter().enumerate() {
            let Some(name) = input.peek_name() else { continue };
            match best {
                Some(b)
                    if self.inputs[b].peek_name().is_some_and(|best_name| best_name <= name) => {}
                _ => best = Some(i),
            }
        }
        let Some(i) = best else { return Ok(None) };
        let input = &mut self.inputs[i];
        let record = input.next.take();
        input.advance()?;
        Ok(record)
    }
}

fn reference_names(header: &sam::Header) -> Vec<String> {
    header.reference_sequences().keys().map(|name| name.to_string()).collect()
}

/// Expand the positional inputs and an optional file-of-filenames into a path list.
///
/// File-of-filenames lines starting with `#` and blank lines are skipped.
pub fn collect_input_paths(inputs: &[PathBuf], fof: Option<&Path>) -> Result<Vec<PathBuf>> {
    let mut paths = inputs.to_vec();
    if let Some(fof) = fof {
        let file = File::open(fof)
            .with_context(|| format!("failed to open file of filenames {}", fof.display()))?;
        for line in BufReader::new(file).lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            paths.push(PathBuf::from(line));
        }
    }
    if paths.is_empty() {
        bail!("no input BAM files given");
    }
    Ok(paths)
}

pub fn open_inputs(paths: &[PathBuf]) -> Result<MergedInput<impl Read>> {
    let inputs = paths.iter().map(|p| open_bam(p)).collect::<Result<Vec<_>>>()?;
    MergedInput::new(inputs)
}

/// Build the core's view of a BAM record.
///
/// Reference ids are resolved against `header`; in paired mode records without
/// the first-segment flag are mate 2.
pub fn to_alignment_record(
    record: &bam::Record,
    header: &sam::Header,
    paired: bool,
) -> Result<AlignmentRecord, FragError> {
    let name = record.name().map(|n| n.to_string()).unwrap_or_default();
    let malformed =
        |source: std::io::Error| FragError::MalformedRecord { read: name.clone(), source };
    let flags = record.flags();

    let reference = resolve_reference(record.reference_sequence_id(), header).map_err(malformed)?;
    let mate_reference =
        resolve_reference(record.mate_reference_sequence_id(), header).map_err(malformed)?;
    let start = match record.alignment_start() {
        Some(pos) => pos.map_err(malformed)?.get() as u32,
        None => 0,
    };
    let mate_start = match record.mate_alignment_start() {
        Some(pos) => pos.map_err(malformed)?.get() as u32,
        None => 0,
    };

    let cigar = record.cigar().iter().collect::<std::io::Result<Vec<_>>>().map_err(malformed)?;

    let data = record.data();
    let md = match data.get(&MD_TAG) {
        Some(value) => match value.map_err(malformed)? {
            Value::String(s) => Some(s.to_string()),
            _ => None,
        },
        None => None,
    };
    let multiplicity = match data.get(&NH_TAG) {
        Some(value) => value.map_err(malformed)?.as_int().map(|n| n.max(0) as u32),
        None => None,
    };

    let mut read_length = record.sequence().len() as u32;
    if read_length == 0 {
        read_length = cigar
            .iter()
            .filter(|op| op.kind().consumes_read())
            .map(|op| op.len() as u32)
            .sum();
    }

    let mate = if !paired {
        None
    } else if flags.is_first_segment() {
        Some(Mate::First)
    } else {
        Some(Mate::Second)
    };

    Ok(AlignmentRecord {
        mate,
        is_mapped: !flags.is_unmapped(),
        is_mate_mapped: flags.is_segmented() && !flags.is_mate_unmapped(),
        is_primary: !flags.is_secondary() && !flags.is_supplementary(),
        is_duplicate: flags.is_duplicate(),
        is_qc_fail: flags.is_qc_fail(),
        is_proper_pair: flags.is_properly_segmented(),
        reference,
        start,
        cigar,
        md,
        multiplicity,
        read_length,
        strand: if flags.is_reverse_complemented() { Strand::Reverse } else { Strand::Forward },
        mate_reference,
        mate_start,
        name,
    })
}

fn resolve_reference(
    id: Option<std::io::Result<usize>>,
    header: &sam::Header,
) -> std::io::Result<Option<String>> {
    let Some(id) = id else { return Ok(None) };
    let id = id?;
    header
        .reference_sequences()
        .get_index(id)
        .map(|(name, _)| Some(name.to_string()))
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("reference sequence id {id} not in header"),
            )
        })
}
