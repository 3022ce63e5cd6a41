use crate::breakpoint::DEFAULT_MAX_MATE_DISTANCE;
use crate::cigar;

/// Default fraction of the read length a terminal clip must cover.
pub const DEFAULT_CLIP_FRACTION: f64 = 0.25;

/// Library layout; selected once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Mode {
    /// One record per read, best hit per name
    #[value(name = "single", alias = "s")]
    Single,
    /// Read-pairs reconciled into fragments
    #[default]
    #[value(name = "paired", alias = "p")]
    Paired,
}

/// Parameters consumed by the classification core.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    /// Nominal read length; drives the chimeric clip threshold.
    pub read_length: u32,
    pub clip_fraction: f64,
    pub max_mate_distance: u32,
}

impl Config {
    pub fn new(mode: Mode, read_length: u32) -> Self {
        Self { mode, read_length, ..Self::default() }
    }

    pub fn clip_threshold(&self) -> u32 {
        cigar::clip_threshold(self.read_length, self.clip_fraction)
    }

    pub fn is_paired(&self) -> bool {
        self.mode == Mode::Paired
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Paired,
            read_length: 100,
            clip_fraction: DEFAULT_CLIP_FRACTION,
            max_mate_distance: DEFAULT_MAX_MATE_DISTANCE,
        }
    }
}
