mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use fragstat_rs::bam_input;
use fragstat_rs::pipeline;
use fragstat_rs::sinks::{SinkPaths, Sinks};
use mimalloc::MiMalloc;
use std::fs::File;
use std::io::BufWriter;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    // Initialize tracing subscriber
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            if args.quiet {
                EnvFilter::new("warn")
            } else {
                EnvFilter::new("info")
            }
        });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = args.config();
    let paths = bam_input::collect_input_paths(&args.inputs, args.fof.as_deref())?;
    for path in &paths {
        tracing::info!(input = %path.display(), "input mapping file");
    }
    tracing::info!(
        read_length = config.read_length,
        clip_threshold = config.clip_threshold(),
        mode = ?config.mode,
        "fragstat-rs: starting"
    );

    let mut input = bam_input::open_inputs(&paths)?;
    let sink_paths = SinkPaths {
        out_bam: args.out_bam.clone(),
        unmapped: args.unmapped.clone(),
        arp: args.arp.clone(),
        breakpoints: args.breakpoints.clone(),
        fragments: args.fragments.clone(),
        summary: args.summary.clone(),
    };
    let mut sinks = Sinks::create(&sink_paths, input.header(), !config.is_paired())?;

    let outcome = pipeline::run(&config, &mut input, &mut sinks)?;

    if let Some(path) = &args.stats {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        outcome.stats.write_tsv(&mut out)?;
    }

    let stats = &outcome.stats;
    if outcome.incomplete_fragments > 0 {
        tracing::warn!(
            incomplete_fragments = outcome.incomplete_fragments,
            "fragments dropped without their other mate"
        );
    }
    tracing::info!(
        records = outcome.records,
        reads = stats.reads,
        mapped = stats.mapped,
        unmapped = stats.unmapped,
        unique = stats.unique,
        unique_half = stats.unique_half,
        multi = stats.multi,
        singletons = stats.singletons,
        proper_pairs = stats.proper_pairs,
        wrong_pairs = stats.wrong_pairs,
        spliced = stats.spliced,
        duplicates = stats.duplicates,
        failed_qc = stats.failed_qc,
        "fragstat-rs: processing complete"
    );
    Ok(())
}
