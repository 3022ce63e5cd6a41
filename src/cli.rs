use clap::Parser;
use fragstat_rs::breakpoint::DEFAULT_MAX_MATE_DISTANCE;
use fragstat_rs::config::{Config, DEFAULT_CLIP_FRACTION, Mode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fragstat-rs",
    about = "Classify name-sorted alignments per fragment and extract breakpoints and mismatches",
    version
)]
pub struct Args {
    /// Name-sorted input BAM file(s); several files are merged by read name
    #[arg(value_name = "BAM")]
    pub inputs: Vec<PathBuf>,

    /// File listing input BAM paths, one per line
    #[arg(long = "fof", value_name = "FILE")]
    pub fof: Option<PathBuf>,

    /// Nominal read length (drives the chimeric clip threshold)
    #[arg(short = 'l', long = "read-length")]
    pub read_length: u32,

    /// Library layout
    #[arg(short = 't', long = "type", value_enum, default_value_t = Mode::Paired)]
    pub mode: Mode,

    /// Write all mapped records to this BAM
    #[arg(short = 'o', long = "out", value_name = "BAM")]
    pub out_bam: Option<PathBuf>,

    /// Write names of unmapped records here
    #[arg(long, value_name = "FILE")]
    pub unmapped: Option<PathBuf>,

    /// Write names of anomalous read pairs here
    #[arg(long, value_name = "FILE")]
    pub arp: Option<PathBuf>,

    /// Write chimeric breakpoints here
    #[arg(long, value_name = "FILE")]
    pub breakpoints: Option<PathBuf>,

    /// Write one row per finalized fragment here (paired mode)
    #[arg(long, value_name = "FILE")]
    pub fragments: Option<PathBuf>,

    /// Write single-end read summaries here instead of stdout
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Write final counters here
    #[arg(long, value_name = "FILE")]
    pub stats: Option<PathBuf>,

    /// Fraction of the read length a terminal clip must cover to be chimeric
    #[arg(long, default_value_t = DEFAULT_CLIP_FRACTION)]
    pub clip_fraction: f64,

    /// Mates further apart than this are anomalous
    #[arg(long, default_value_t = DEFAULT_MAX_MATE_DISTANCE)]
    pub max_mate_distance: u32,

    /// Set logging level to WARN
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Args {
    pub fn config(&self) -> Config {
        Config {
            mode: self.mode,
            read_length: self.read_length,
            clip_fraction: self.clip_fraction,
            max_mate_distance: self.max_mate_distance,
        }
    }
}
