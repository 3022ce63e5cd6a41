//! Single-end mode: best alignment per read name.

use crate::record::AnnotatedRecord;
use crate::stats::RunningStats;
use crate::types::Strand;
use std::fmt;

/// Best alignment seen for one read; `Display` renders the summary TSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSummary {
    pub name: String,
    /// `None` when the read is unmapped.
    pub chrom: Option<String>,
    pub start: u32,
    pub end: u32,
    pub strand: Strand,
    pub best_cost: u32,
    /// Later alignments at least as good as the best.
    pub repeats: u32,
    /// Every alignment's mismatch list, each terminated by `,`.
    pub mismatches: String,
}

impl ReadSummary {
    fn from_record(record: &AnnotatedRecord) -> Self {
        let r = &record.record;
        let mut summary = Self {
            name: r.name.clone(),
            chrom: None,
            start: 0,
            end: 0,
            strand: r.strand,
            best_cost: 0,
            repeats: 0,
            mismatches: String::new(),
        };
        summary.take_position(record);
        summary.append_mismatches(record);
        summary
    }

    fn take_position(&mut self, record: &AnnotatedRecord) {
        let r = &record.record;
        if r.is_mapped {
            self.chrom = r.reference.clone();
            self.start = r.start;
            self.end = record.alignment_end();
        }
        self.strand = r.strand;
        self.best_cost = record.mismatch_cost();
    }

    fn append_mismatches(&mut self, record: &AnnotatedRecord) {
        match &record.mismatches {
            Some(list) => self.mismatches.push_str(&list.to_string()),
            None => self.mismatches.push_str("none"),
        }
        self.mismatches.push(',');
    }
}

impl fmt::Display for ReadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.name,
            self.chrom.as_deref().unwrap_or("*"),
            self.start,
            self.end,
            self.strand,
            self.best_cost,
            self.repeats,
            self.mismatches,
        )
    }
}

/// Tracks the open read and the running totals.
#[derive(Debug, Default)]
pub struct SingleEndTracker {
    current: Option<ReadSummary>,
    stats: RunningStats,
}

impl SingleEndTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next record; returns the previous read's summary when the name changes.
    pub fn push(&mut self, record: &AnnotatedRecord) -> Option<ReadSummary> {
        if let Some(current) = self.current.as_mut() {
            if current.name == record.record.name {
                let cost = record.mismatch_cost();
                if cost <= current.best_cost {
                    current.repeats += 1;
                }
                if cost < current.best_cost {
                    current.take_position(record);
                }
                current.append_mismatches(record);
                return None;
            }
        }

        self.count(record);
        self.current.replace(ReadSummary::from_record(record))
    }

    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }

    /// Close the stream, returning the last open summary.
    pub fn finish(self) -> (Option<ReadSummary>, RunningStats) {
        (self.current, self.stats)
    }

    fn count(&mut self, record: &AnnotatedRecord) {
        let r = &record.record;
        self.stats.reads += 1;
        if r.is_mapped {
            self.stats.mapped += 1;
            if r.is_unique() {
                self.stats.unique += 1;
            } else {
                self.stats.multi += 1;
            }
        } else {
            self.stats.unmapped += 1;
        }
        self.stats.duplicates += u64::from(r.is_duplicate);
        self.stats.failed_qc += u64::from(r.is_qc_fail);
        self.stats.spliced += u64::from(record.junction());
    }
}
