use std::io::{self, Write};
use std::ops::AddAssign;

/// Fragment-level counters.
///
/// Each fragment (or single-end read) contributes exactly once, when its
/// classification is finalized. Transitions return a delta of this type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningStats {
    pub reads: u64,
    pub duplicates: u64,
    pub failed_qc: u64,
    pub mapped: u64,
    pub unique: u64,
    pub spliced: u64,
    pub singletons: u64,
    pub proper_pairs: u64,
    pub wrong_pairs: u64,
    pub multi: u64,
    pub unmapped: u64,
    pub unique_half: u64,
}

impl AddAssign for RunningStats {
    fn add_assign(&mut self, rhs: Self) {
        self.reads += rhs.reads;
        self.duplicates += rhs.duplicates;
        self.failed_qc += rhs.failed_qc;
        self.mapped += rhs.mapped;
        self.unique += rhs.unique;
        self.spliced += rhs.spliced;
        self.singletons += rhs.singletons;
        self.proper_pairs += rhs.proper_pairs;
        self.wrong_pairs += rhs.wrong_pairs;
        self.multi += rhs.multi;
        self.unmapped += rhs.unmapped;
        self.unique_half += rhs.unique_half;
    }
}

impl RunningStats {
    /// Counter names and values, in report order.
    pub fn rows(&self) -> [(&'static str, u64); 12] {
        [
            ("reads", self.reads),
            ("mapped", self.mapped),
            ("unmapped", self.unmapped),
            ("unique", self.unique),
            ("unique_half", self.unique_half),
            ("duplicates", self.duplicates),
            ("failed_qc", self.failed_qc),
            ("singletons", self.singletons),
            ("proper_pairs", self.proper_pairs),
            ("wrong_pairs", self.wrong_pairs),
            ("spliced", self.spliced),
            ("multi", self.multi),
        ]
    }

    /// Write a two-column `metric\tcount` table.
    pub fn write_tsv<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "metric\tcount")?;
        for (name, value) in self.rows() {
            writeln!(out, "{name}\t{value}")?;
        }
        Ok(())
    }
}
