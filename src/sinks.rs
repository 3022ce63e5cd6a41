//! Output files written while streaming.
//!
//! Every sink is optional except the single-end summary, which falls back to
//! stdout. Any write failure aborts the run.

use crate::breakpoint::Breakpoint;
use crate::reconcile::FragmentOutcome;
use crate::single_end::ReadSummary;
use anyhow::{Context, Result};
use noodles::bam;
use noodles::sam;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Where each sink goes; `None` disables it.
#[derive(Debug, Clone, Default)]
pub struct SinkPaths {
    pub out_bam: Option<PathBuf>,
    pub unmapped: Option<PathBuf>,
    pub arp: Option<PathBuf>,
    pub breakpoints: Option<PathBuf>,
    pub fragments: Option<PathBuf>,
    /// Single-end summaries; stdout when unset.
    pub summary: Option<PathBuf>,
}

pub struct Sinks {
    filtered: Option<Box<dyn AlignmentWrite>>,
    unmapped: Option<Box<dyn Write>>,
    arp: Option<Box<dyn Write>>,
    breakpoints: Option<Box<dyn Write>>,
    fragments: Option<Box<dyn Write>>,
    summary: Option<Box<dyn Write>>,
}

impl Sinks {
    /// Create every configured file. The filtered BAM gets `header`.
    pub fn create(paths: &SinkPaths, header: &sam::Header, single_end: bool) -> Result<Self> {
        let filtered = match &paths.out_bam {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create output BAM {}", path.display()))?;
                let mut writer: Box<dyn AlignmentWrite> = Box::new(bam::io::Writer::new(file));
                writer.write_alignment_header(header)?;
                Some(writer)
            }
            None => None,
        };

        let summary = if !single_end {
            None
        } else if let Some(path) = &paths.summary {
            Some(text_file(path)?)
        } else {
            Some(Box::new(BufWriter::new(io::stdout().lock())) as Box<dyn Write>)
        };

        Ok(Self {
            filtered,
            unmapped: paths.unmapped.as_deref().map(text_file).transpose()?,
            arp: paths.arp.as_deref().map(text_file).transpose()?,
            breakpoints: paths.breakpoints.as_deref().map(text_file).transpose()?,
            fragments: paths.fragments.as_deref().map(text_file).transpose()?,
            summary,
        })
    }

    pub fn write_filtered(&mut self, header: &sam::Header, record: &bam::Record) -> io::Result<()> {
        match self.filtered.as_mut() {
            Some(writer) => writer.write_alignment_record(header, record),
            None => Ok(()),
        }
    }

    pub fn write_unmapped(&mut self, name: &str) -> io::Result<()> {
        write_line(&mut self.unmapped, name)
    }

    pub fn write_anomalous(&mut self, name: &str) -> io::Result<()> {
        write_line(&mut self.arp, name)
    }

    pub fn write_breakpoint(&mut self, breakpoint: &Breakpoint) -> io::Result<()> {
        write_line(&mut self.breakpoints, breakpoint)
    }

    pub fn write_fragment(&mut self, outcome: &FragmentOutcome) -> io::Result<()> {
        write_line(&mut self.fragments, outcome)
    }

    pub fn write_summary(&mut self, summary: &ReadSummary) -> io::Result<()> {
        write_line(&mut self.summary, summary)
    }

    /// Flush text sinks and finalize the filtered BAM.
    pub fn finish(&mut self, header: &sam::Header) -> io::Result<()> {
        if let Some(writer) = self.filtered.as_mut() {
            writer.finish(header)?;
        }
        let text_sinks = [
            &mut self.unmapped,
            &mut self.arp,
            &mut self.breakpoints,
            &mut self.fragments,
            &mut self.summary,
        ];
        for sink in text_sinks.into_iter().flatten() {
            sink.flush()?;
        }
        Ok(())
    }
}

fn text_file(path: &Path) -> Result<Box<dyn Write>> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn write_line(sink: &mut Option<Box<dyn Write>>, value: impl Display) -> io::Result<()> {
    match sink.as_mut() {
        Some(out) => writeln!(out, "{value}"),
        None => Ok(()),
    }
}
