//! Paired-end fragment reconciliation.
//!
//! Records of one fragment arrive contiguously (name-sorted input) in no
//! particular mate order, possibly with several alignments per mate. The
//! reconciler keeps exactly one open [`FragmentState`] and moves it through
//! the ten [`FragmentCategory`] values until a terminal category is reached.
//! Every step is a call to [`transition`], which returns the new state, the
//! stats delta and what to emit, so each row of the state table can be
//! exercised on its own.

use crate::breakpoint::is_discordant;
use crate::error::{FragError, Result};
use crate::mismatch::MismatchList;
use crate::record::{AlignmentRecord, AnnotatedRecord};
use crate::stats::RunningStats;
use crate::types::Mate;
use std::fmt;

/// Fragment classification. Codes 5-9 wait for the other mate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentCategory {
    Unmapped = 1,
    BothMultiOrOneUnmappableMulti = 2,
    Singleton = 3,
    BothUnique = 4,
    OneEndUndecidedUnmappable = 5,
    Mate1UniqueMate2Pending = 6,
    Mate2UniqueMate1Pending = 7,
    Mate1MultiPrimaryPending = 8,
    Mate2MultiPrimaryPending = 9,
    OneEndUniqueHalfResolved = 10,
}

impl FragmentCategory {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FragmentCategory::Unmapped
                | FragmentCategory::BothMultiOrOneUnmappableMulti
                | FragmentCategory::Singleton
                | FragmentCategory::BothUnique
                | FragmentCategory::OneEndUniqueHalfResolved
        )
    }

    fn unique_pending(mate: Mate) -> Self {
        match mate {
            Mate::First => FragmentCategory::Mate1UniqueMate2Pending,
            Mate::Second => FragmentCategory::Mate2UniqueMate1Pending,
        }
    }

    fn multi_pending(mate: Mate) -> Self {
        match mate {
            Mate::First => FragmentCategory::Mate1MultiPrimaryPending,
            Mate::Second => FragmentCategory::Mate2MultiPrimaryPending,
        }
    }
}

impl fmt::Display for FragmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A placement on the reference. `end` is unknown when the placement comes
/// from the mate fields of the other record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locus {
    pub chrom: String,
    pub start: u32,
    pub end: Option<u32>,
}

/// What is known about one mate of the open fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MateLocus {
    Unmapped,
    Multi,
    /// Mapped, but its primary alignment has not been seen yet.
    #[default]
    Undecided,
    Placed(Locus),
}

impl MateLocus {
    fn of_record(record: &AnnotatedRecord) -> Self {
        MateLocus::Placed(Locus {
            chrom: record.record.reference.clone().unwrap_or_default(),
            start: record.record.start,
            end: Some(record.alignment_end()),
        })
    }

    fn mate_pointer(record: &AlignmentRecord) -> Self {
        MateLocus::Placed(Locus {
            chrom: record.mate_reference.clone().unwrap_or_default(),
            start: record.mate_start,
            end: None,
        })
    }
}

impl fmt::Display for MateLocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MateLocus::Unmapped => f.write_str("UM\t0\t0"),
            MateLocus::Multi => f.write_str("MM\t0\t0"),
            MateLocus::Undecided => f.write_str("*\t0\t0"),
            MateLocus::Placed(locus) => {
                write!(f, "{}\t{}\t{}", locus.chrom, locus.start, locus.end.unwrap_or(0))
            }
        }
    }
}

/// The single open fragment.
#[derive(Debug, Clone)]
pub struct FragmentState {
    pub name: String,
    pub category: FragmentCategory,
    pub mate1: MateLocus,
    pub mate2: MateLocus,
    pub junction: bool,
    pub held1: Option<AnnotatedRecord>,
    pub held2: Option<AnnotatedRecord>,
    first_seen: Mate,
}

impl FragmentState {
    fn new(name: String, category: FragmentCategory, first_seen: Mate) -> Self {
        Self {
            name,
            category,
            mate1: MateLocus::Undecided,
            mate2: MateLocus::Undecided,
            junction: false,
            held1: None,
            held2: None,
            first_seen,
        }
    }

    pub fn locus(&self, mate: Mate) -> &MateLocus {
        match mate {
            Mate::First => &self.mate1,
            Mate::Second => &self.mate2,
        }
    }

    pub fn held(&self, mate: Mate) -> Option<&AnnotatedRecord> {
        match mate {
            Mate::First => self.held1.as_ref(),
            Mate::Second => self.held2.as_ref(),
        }
    }

    /// The mate whose record opened this fragment.
    pub fn first_seen(&self) -> Mate {
        self.first_seen
    }

    fn set_locus(&mut self, mate: Mate, locus: MateLocus) {
        match mate {
            Mate::First => self.mate1 = locus,
            Mate::Second => self.mate2 = locus,
        }
    }

    fn hold(&mut self, mate: Mate, record: AnnotatedRecord) {
        match mate {
            Mate::First => self.held1 = Some(record),
            Mate::Second => self.held2 = Some(record),
        }
    }

    fn place(&mut self, mate: Mate, record: AnnotatedRecord) {
        self.set_locus(mate, MateLocus::of_record(&record));
        self.hold(mate, record);
    }

    /// Mates on different references, too far apart, or not both placed.
    fn loci_disagree(&self, max_mate_distance: u32) -> bool {
        match (&self.mate1, &self.mate2) {
            (MateLocus::Placed(a), MateLocus::Placed(b)) => {
                is_discordant(&a.chrom, a.start, &b.chrom, b.start, max_mate_distance)
            }
            _ => true,
        }
    }
}

/// Result of feeding one record to the state table.
#[derive(Debug)]
pub struct Transition {
    pub state: FragmentState,
    /// Counters to add to the running totals.
    pub stats: RunningStats,
    /// The fragment name goes to the anomalous-pair sink.
    pub anomalous: bool,
    /// A terminal category was reached on this step.
    pub completed: bool,
}

/// Advance `state` with `record`.
///
/// A missing state, or one for a different name, opens a new fragment.
pub fn transition(
    state: Option<FragmentState>,
    record: AnnotatedRecord,
    max_mate_distance: u32,
) -> Result<Transition> {
    match state {
        Some(state) if state.name == record.record.name => {
            advance(state, record, max_mate_distance)
        }
        _ => Ok(open(record)),
    }
}

fn open(record: AnnotatedRecord) -> Transition {
    let r = &record.record;
    let mate = r.mate_or_second();
    let junction = record.junction();
    let (mapped, mate_mapped, multi, primary) =
        (r.is_mapped, r.is_mate_mapped, r.is_multi(), r.is_primary);
    let pointer = MateLocus::mate_pointer(r);
    let mut state = FragmentState::new(r.name.clone(), FragmentCategory::Unmapped, mate);
    state.junction = junction;

    let mut stats = RunningStats::default();
    let mut anomalous = false;

    match (mapped, mate_mapped) {
        (false, false) => {
            state.mate1 = MateLocus::Unmapped;
            state.mate2 = MateLocus::Unmapped;
            stats = RunningStats { reads: 1, unmapped: 1, ..Default::default() };
        }
        (false, true) => {
            state.category = FragmentCategory::OneEndUndecidedUnmappable;
            state.set_locus(mate, MateLocus::Unmapped);
            state.hold(mate, record);
        }
        (true, false) if multi => {
            state.category = FragmentCategory::BothMultiOrOneUnmappableMulti;
            state.set_locus(mate, MateLocus::Multi);
            state.set_locus(mate.other(), MateLocus::Unmapped);
            stats = RunningStats { reads: 1, mapped: 1, multi: 1, ..Default::default() };
        }
        (true, false) => {
            state.category = FragmentCategory::Singleton;
            state.set_locus(mate.other(), MateLocus::Unmapped);
            state.place(mate, record);
            stats = singleton_stats(junction);
            anomalous = true;
        }
        (true, true) if !multi => {
            state.category = FragmentCategory::unique_pending(mate);
            state.set_locus(mate.other(), pointer);
            state.place(mate, record);
        }
        (true, true) => {
            state.category = FragmentCategory::multi_pending(mate);
            if primary {
                state.set_locus(mate.other(), pointer);
                state.place(mate, record);
            }
        }
    }

    let completed = state.category.is_terminal();
    Transition { state, stats, anomalous, completed }
}

fn advance(
    mut state: FragmentState,
    record: AnnotatedRecord,
    max_mate_distance: u32,
) -> Result<Transition> {
    let before = state.category;
    let mate = record.record.mate_or_second();
    let mapped = record.record.is_mapped;
    let multi = record.record.is_multi();
    let primary = record.record.is_primary;

    let mut stats = RunningStats::default();
    let mut anomalous = false;

    match before {
        FragmentCategory::OneEndUndecidedUnmappable if mapped => {
            // The first-seen mate's locus stays authoritative.
            let may_write = mate != state.first_seen;
            if multi {
                if may_write {
                    state.set_locus(mate, MateLocus::Multi);
                }
                state.category = FragmentCategory::BothMultiOrOneUnmappableMulti;
                stats = RunningStats { reads: 1, mapped: 1, multi: 1, ..Default::default() };
            } else {
                let junction = record.junction();
                state.junction = junction;
                if may_write {
                    state.place(mate, record);
                }
                state.category = FragmentCategory::Singleton;
                stats = singleton_stats(junction);
                anomalous = true;
            }
        }
        FragmentCategory::Mate1UniqueMate2Pending | FragmentCategory::Mate2UniqueMate1Pending => {
            let unique_mate = if before == FragmentCategory::Mate1UniqueMate2Pending {
                Mate::First
            } else {
                Mate::Second
            };
            if mate == unique_mate {
                // Further alignments of the resolved mate are only reported.
                let cigar_ops = record.record.cigar.len();
                if cigar_ops == 1 {
                    return Err(FragError::UniqueMateInconsistency {
                        read: state.name.clone(),
                        mate: mate.number(),
                        cigar_ops,
                    });
                }
                anomalous = true;
            } else if mapped && !multi {
                let r = &record.record;
                let junction = record.junction() || state.junction;
                stats = RunningStats {
                    reads: 1,
                    mapped: 1,
                    unique: 1,
                    duplicates: u64::from(r.is_duplicate),
                    failed_qc: u64::from(r.is_qc_fail),
                    proper_pairs: u64::from(r.is_proper_pair),
                    wrong_pairs: u64::from(!r.is_proper_pair),
                    spliced: u64::from(junction),
                    ..Default::default()
                };
                state.junction = junction;
                state.place(mate, record);
                state.category = FragmentCategory::BothUnique;
                anomalous = state.loci_disagree(max_mate_distance);
            } else if mapped && primary {
                state.place(mate, record);
                state.category = FragmentCategory::OneEndUniqueHalfResolved;
                stats = RunningStats { reads: 1, mapped: 1, unique_half: 1, ..Default::default() };
                anomalous = state.loci_disagree(max_mate_distance);
            }
        }
        FragmentCategory::Mate1MultiPrimaryPending | FragmentCategory::Mate2MultiPrimaryPending => {
            let multi_mate = if before == FragmentCategory::Mate1MultiPrimaryPending {
                Mate::First
            } else {
                Mate::Second
            };
            if mate == multi_mate {
                if mapped && primary && *state.locus(mate) == MateLocus::Undecided {
                    state.place(mate, record);
                }
            } else if mapped && !multi {
                state.place(mate, record);
                state.category = FragmentCategory::OneEndUniqueHalfResolved;
                stats = RunningStats { reads: 1, mapped: 1, unique_half: 1, ..Default::default() };
                anomalous = state.loci_disagree(max_mate_distance);
            } else if mapped {
                state.category = FragmentCategory::BothMultiOrOneUnmappableMulti;
                stats = RunningStats { reads: 1, mapped: 1, multi: 1, ..Default::default() };
            }
        }
        _ => {}
    }

    let completed = !before.is_terminal() && state.category.is_terminal();
    Ok(Transition { state, stats, anomalous, completed })
}

fn singleton_stats(junction: bool) -> RunningStats {
    RunningStats {
        reads: 1,
        mapped: 1,
        unique: 1,
        singletons: 1,
        wrong_pairs: 1,
        spliced: u64::from(junction),
        ..Default::default()
    }
}

/// A finalized fragment; `Display` renders the fragment-sink TSV row.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentOutcome {
    pub name: String,
    pub category: FragmentCategory,
    pub mate1: MateLocus,
    pub mate2: MateLocus,
    pub junction: bool,
    pub mismatches1: Option<MismatchList>,
    pub mismatches2: Option<MismatchList>,
}

impl From<&FragmentState> for FragmentOutcome {
    fn from(state: &FragmentState) -> Self {
        let mismatches =
            |held: &Option<AnnotatedRecord>| held.as_ref().and_then(|r| r.mismatches.clone());
        Self {
            name: state.name.clone(),
            category: state.category,
            mate1: state.mate1.clone(),
            mate2: state.mate2.clone(),
            junction: state.junction,
            mismatches1: mismatches(&state.held1),
            mismatches2: mismatches(&state.held2),
        }
    }
}

impl fmt::Display for FragmentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |m: &Option<MismatchList>| {
            m.as_ref().map_or_else(|| "*".to_string(), |m| m.to_string())
        };
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.name,
            self.category,
            self.mate1,
            self.mate2,
            u8::from(self.junction),
            list(&self.mismatches1),
            list(&self.mismatches2),
        )
    }
}

/// Output produced while reconciling.
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    /// Name for the anomalous-pair sink.
    AnomalousPair(String),
    Fragment(FragmentOutcome),
}

/// Totals returned when the stream ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub stats: RunningStats,
    /// Fragments dropped while still waiting for their other mate.
    pub incomplete_fragments: u64,
}

/// Owns the open fragment and the running totals for one input stream.
#[derive(Debug)]
pub struct FragmentReconciler {
    max_mate_distance: u32,
    current: Option<FragmentState>,
    stats: RunningStats,
    incomplete_fragments: u64,
}

impl FragmentReconciler {
    pub fn new(max_mate_distance: u32) -> Self {
        Self {
            max_mate_distance,
            current: None,
            stats: RunningStats::default(),
            incomplete_fragments: 0,
        }
    }

    /// Feed the next record of the stream.
    pub fn push(&mut self, record: AnnotatedRecord) -> Result<Vec<Emission>> {
        let previous = match self.current.take() {
            Some(state) if state.name != record.record.name => {
                self.retire(&state);
                None
            }
            other => other,
        };

        let step = transition(previous, record, self.max_mate_distance)?;
        self.stats += step.stats;

        let mut emissions = Vec::new();
        if step.anomalous {
            emissions.push(Emission::AnomalousPair(step.state.name.clone()));
        }
        if step.completed {
            emissions.push(Emission::Fragment(FragmentOutcome::from(&step.state)));
        }
        self.current = Some(step.state);
        Ok(emissions)
    }

    pub fn current(&self) -> Option<&FragmentState> {
        self.current.as_ref()
    }

    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }

    /// Close the stream, dropping a fragment still waiting for its mate.
    pub fn finish(mut self) -> ReconcileSummary {
        if let Some(state) = self.current.take() {
            self.retire(&state);
        }
        ReconcileSummary { stats: self.stats, incomplete_fragments: self.incomplete_fragments }
    }

    fn retire(&mut self, state: &FragmentState) {
        if !state.category.is_terminal() {
            self.incomplete_fragments += 1;
            tracing::debug!(
                fragment = %state.name,
                category = state.category.code(),
                "dropping fragment whose other mate never arrived"
            );
        }
    }
}
