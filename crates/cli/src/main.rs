//! tasrig: run the reference simulation under the input harness.
//!
//! ```text
//! tasrig <seed> <filename> <record_mode> [--info PATH] [--frames N] [--report [PATH]]
//! ```

#![deny(unsafe_code)]

mod info_file;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tasrig_harness::config::FRAME_RATE_HZ;
use tasrig_harness::{
    Driver, END_REASON_COMPLETE, END_REASON_FRAME_LIMIT, Harness, HarnessConfig, Mode,
    NeutralInput, Pacer, StopReason,
};
use tasrig_replay::{RecordReader, default_report_path, write_report};
use tasrig_sim::World;
use tasrig_wire::RunReport;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "tasrig",
    about = "Deterministic input playback/record harness",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// PRNG seed for exploration
    seed: u32,

    /// Input stream to play back from and record to (created if missing)
    filename: PathBuf,

    /// 1 to keep recording once playback ends, 0 to evaluate the stream
    #[arg(value_parser = clap::value_parser!(u32).range(0..=1))]
    record_mode: u32,

    /// Legacy info file overriding seed, mode, budget and window settings
    #[arg(long)]
    info: Option<PathBuf>,

    /// Stop cleanly after this many frames, keeping any unplayed records
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    frames: Option<u32>,

    /// Write a run report on exit (defaults to `<filename>.report`)
    #[arg(long, num_args = 0..=1)]
    report: Option<Option<PathBuf>>,

    /// Simulation frames per second at 1x speed
    #[arg(long, default_value_t = FRAME_RATE_HZ)]
    fps: u32,

    /// Run as fast as possible
    #[arg(long, default_value_t = false)]
    headless: bool,

    /// Log every record of the stream and exit
    #[arg(long, default_value_t = false)]
    dump: bool,

    /// With --dump: skip a 0x400-byte .m64 header
    #[arg(long, default_value_t = false, requires = "dump")]
    m64: bool,
}

impl Cli {
    fn report_path(&self) -> Option<PathBuf> {
        self.report
            .as_ref()
            .map(|path| path.clone().unwrap_or_else(|| default_report_path(&self.filename)))
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.dump {
        return dump(&cli.filename, cli.m64);
    }

    let mut config = HarnessConfig {
        seed: cli.seed,
        mode: Mode::from_flag(cli.record_mode),
        ..Default::default()
    };
    if let Some(info) = &cli.info {
        info_file::apply(info, &mut config)?;
    }

    let harness = Harness::init(config, &cli.filename)
        .with_context(|| format!("starting harness on {}", cli.filename.display()))?;
    let mut driver = Driver::new(
        harness,
        World::new(),
        NeutralInput,
        Pacer::new(cli.fps, cli.headless),
    );

    let result = driver.run(cli.frames);
    let (mut harness, world) = driver.into_parts();
    let report_path = cli.report_path();

    match result {
        Ok(end) => {
            // A frame-limited run may stop mid-playback; keep what it has not
            // reached so the next run can continue from the same stream.
            let report = match end.reason {
                StopReason::Complete => harness.finish(END_REASON_COMPLETE, 0)?,
                StopReason::FrameLimit => harness.pause(END_REASON_FRAME_LIMIT)?,
            };
            info!(
                frames = end.frames,
                reason = %report.end_reason,
                bytes = report.stream_length,
                sha256 = %report.stream_sha256,
                world_digest = format_args!("{:016x}", world.state_digest()),
                "run finished"
            );
            if let Some(path) = report_path {
                save_report(&report, &path)?;
            }
            Ok(())
        }
        Err(err) => {
            let code = err.exit_code();
            if let Some(path) = report_path {
                match harness.finish(err.end_reason(), code) {
                    Ok(report) => {
                        if let Err(report_err) = save_report(&report, &path) {
                            error!(err = %report_err, "failed to write run report");
                        }
                    }
                    Err(finish_err) => error!(err = %finish_err, "failed to build run report"),
                }
            }
            harness.terminate(code)
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn save_report(report: &RunReport, path: &Path) -> Result<()> {
    write_report(report, path).with_context(|| format!("writing report {}", path.display()))?;
    info!(path = %path.display(), "run report written");
    Ok(())
}

fn dump(path: &Path, m64_header: bool) -> Result<()> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let reader = if m64_header {
        RecordReader::with_m64_header(data)
    } else {
        RecordReader::new(data)
    };

    info!(path = %path.display(), records = reader.remaining(), "dumping stream");
    for (frame, pad) in reader.enumerate() {
        info!(frame, %pad);
    }
    Ok(())
}
