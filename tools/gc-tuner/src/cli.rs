//! Command line surface
//!
//! Flags override whatever the TOML file (if any) configured.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use vm_gc_tuner::TunerConfig;

/// Memory budget used when neither the file nor the flags set one
pub const DEFAULT_MEMORY_LIMIT_MIB: u64 = 256;

/// Default number of workload steps per phase
pub const DEFAULT_STEPS: u64 = 64;

const MIB: u64 = 1024 * 1024;

/// Parsed invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Effective tuner configuration
    pub config: TunerConfig,
    /// Workload steps per phase
    pub steps: u64,
    /// Print the report as JSON
    pub json: bool,
}

/// Build the clap command
pub fn command() -> Command {
    Command::new("gc-tuner-sim")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Drive the simulated collector through a ramp-up/ramp-down workload with the GC tuner attached")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Tuner configuration file (TOML)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("memory-limit-mib")
                .short('m')
                .long("memory-limit-mib")
                .value_name("MIB")
                .help("Total memory budget in MiB")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("ceiling-ratio")
                .short('r')
                .long("ceiling-ratio")
                .value_name("RATIO")
                .help("Fraction of the memory budget the tuner steers toward")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("cycles")
                .short('n')
                .long("cycles")
                .value_name("STEPS")
                .help("Workload steps per phase")
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("poll-interval-ms")
                .long("poll-interval-ms")
                .value_name("MS")
                .help("Drive the tuner by polling instead of collection hooks")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("disable")
                .long("disable")
                .help("Start with tuning disabled")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the phase report as JSON")
                .action(ArgAction::SetTrue),
        )
}

/// Resolve the effective configuration from parsed arguments
pub fn resolve(matches: &ArgMatches) -> Result<Invocation> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => TunerConfig::load(path)
            .with_context(|| format!("loading tuner config from {}", path.display()))?,
        None => TunerConfig::default(),
    };

    if let Some(&mib) = matches.get_one::<u64>("memory-limit-mib") {
        config.memory_limit_bytes = mib
            .checked_mul(MIB)
            .ok_or_else(|| anyhow!("memory limit of {mib} MiB does not fit in 64-bit bytes"))?;
    }
    if config.memory_limit_bytes == 0 && config.ceiling_bytes.is_none() {
        config.memory_limit_bytes = DEFAULT_MEMORY_LIMIT_MIB * MIB;
    }
    if let Some(&ratio) = matches.get_one::<f64>("ceiling-ratio") {
        config.ceiling_ratio = ratio;
    }
    if let Some(&interval) = matches.get_one::<u64>("poll-interval-ms") {
        config.poll_interval_ms = interval;
    }
    if matches.get_flag("disable") {
        config.enable = false;
    }
    config.validate()?;

    Ok(Invocation {
        config,
        steps: matches
            .get_one::<u64>("cycles")
            .copied()
            .unwrap_or(DEFAULT_STEPS),
        json: matches.get_flag("json"),
    })
}
