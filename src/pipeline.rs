use crate::bam_input::{MergedInput, to_alignment_record};
use crate::config::{Config, Mode};
use crate::reconcile::{Emission, FragmentReconciler};
use crate::record::AnnotatedRecord;
use crate::single_end::SingleEndTracker;
use crate::sinks::Sinks;
use crate::stats::RunningStats;
use anyhow::Result;
use std::io::Read;

const PROGRESS_EVERY: u64 = 1_000_000;

#[derive(Debug, Default, Clone, Copy)]
pub struct RunOutcome {
    pub stats: RunningStats,
    pub records: u64,
    /// Paired fragments whose other mate never arrived.
    pub incomplete_fragments: u64,
}

enum Classifier {
    Paired(FragmentReconciler),
    Single(SingleEndTracker),
}

/// Stream every record of `input` once, writing to `sinks` as evidence appears.
pub fn run<R: Read>(
    config: &Config,
    input: &mut MergedInput<R>,
    sinks: &mut Sinks,
) -> Result<RunOutcome> {
    let header = input.header().clone();
    let mut classifier = match config.mode {
        Mode::Paired => Classifier::Paired(FragmentReconciler::new(config.max_mate_distance)),
        Mode::Single => Classifier::Single(SingleEndTracker::new()),
    };

    let mut records: u64 = 0;
    while let Some(raw) = input.next_record()? {
        records += 1;
        if records % PROGRESS_EVERY == 0 {
            tracing::debug!(records, "processing");
        }

        let record = to_alignment_record(&raw, &header, config.is_paired())?;
        if record.is_mapped {
            sinks.write_filtered(&header, &raw)?;
        } else {
            sinks.write_unmapped(&record.name)?;
        }

        let annotated = AnnotatedRecord::annotate(record, config)?;
        if let Some(breakpoint) = &annotated.breakpoint {
            sinks.write_breakpoint(breakpoint)?;
        }

        match &mut classifier {
            Classifier::Paired(reconciler) => {
                for emission in reconciler.push(annotated)? {
                    match emission {
                        Emission::AnomalousPair(name) => sinks.write_anomalous(&name)?,
                        Emission::Fragment(outcome) => sinks.write_fragment(&outcome)?,
                    }
                }
            }
            Classifier::Single(tracker) => {
                if let Some(summary) = tracker.push(&annotated) {
                    sinks.write_summary(&summary)?;
                }
            }
        }
    }

    let outcome = match classifier {
        Classifier::Paired(reconciler) => {
            let summary = reconciler.finish();
            RunOutcome {
                stats: summary.stats,
                records,
                incomplete_fragments: summary.incomplete_fragments,
            }
        }
        Classifier::Single(tracker) => {
            let (last, stats) = tracker.finish();
            if let Some(summary) = last {
                sinks.write_summary(&summary)?;
            }
            RunOutcome { stats, records, incomplete_fragments: 0 }
        }
    };

    sinks.finish(&header)?;
    Ok(outcome)
}
