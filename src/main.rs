//! ringbuf_stress - command-line entry point
//!
//! ```text
//! ringbuf_stress [seconds]
//! ```
//!
//! Prints `stress test`, runs the stress loop against [`MpscRing`] for the
//! given duration (default from config, 10s), then prints `ok`. An invariant
//! violation aborts the process.

use std::process::ExitCode;

use anyhow::Context;

use ringbuf_stress::config::StressConfig;
use ringbuf_stress::logging::{flush_logs, init_logging};
use ringbuf_stress::{MpscRing, run_stress};

const USAGE: &str = "usage: ringbuf_stress [seconds]";

/// Parse the optional positional duration. No flags are accepted.
fn parse_duration<I: Iterator<Item = String>>(mut args: I) -> Result<Option<u64>, String> {
    let Some(arg) = args.next() else {
        return Ok(None);
    };
    if let Some(extra) = args.next() {
        return Err(format!("unexpected argument: {}", extra));
    }
    arg.parse::<u64>()
        .map(Some)
        .map_err(|_| format!("invalid duration in seconds: {}", arg))
}

fn run(duration_secs: Option<u64>) -> anyhow::Result<()> {
    let mut config = StressConfig::load().context("Failed to load stress config")?;
    if let Some(secs) = duration_secs {
        config.duration_secs = secs;
    }
    config.validate().context("Invalid stress config")?;

    init_logging(&config);
    tracing::info!(
        git = env!("GIT_HASH"),
        "ringbuf_stress {}",
        env!("CARGO_PKG_VERSION")
    );

    println!("stress test");
    let report = run_stress::<MpscRing>(&config).context("Stress run failed")?;
    tracing::info!(
        workers = report.workers,
        frames = report.stats.frames_consumed,
        "all frames verified"
    );
    println!("ok");
    Ok(())
}

fn main() -> ExitCode {
    let duration_secs = match parse_duration(std::env::args().skip(1)) {
        Ok(secs) => secs,
        Err(msg) => {
            eprintln!("{}", msg);
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    let code = match run(duration_secs) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    };
    flush_logs();
    code
}
