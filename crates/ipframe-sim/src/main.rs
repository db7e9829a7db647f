//! Command-line driver for the encapsulator verification matrix.
//!
//! Runs every matrix case over a range of payload lengths and pause modes,
//! optionally followed by seeded random runs checked against the reference
//! model. Exits non-zero on the first failure. Set `RUST_LOG` to see
//! per-frame detail.

use std::{path::PathBuf, process::ExitCode};

use arbitrary::Unstructured;
use clap::{Parser, ValueEnum};
use ipframe_core::{ConfigError, EncapsulatorConfig};
use ipframe_harness::{
    FrameSpec, FrameTemplate, HarnessError, MatrixCase, PauseSchedule, Transmission,
    check_against_model, run_case,
};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod capture;

/// Bytes of entropy behind each random run.
const RANDOM_RUN_ENTROPY: usize = 512;

#[derive(Debug, thiserror::Error)]
enum SimError {
    #[error("invalid payload length range {min}..={max}")]
    LengthRange { min: usize, max: usize },
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{case}, length {payload_len}, {schedule}: {source}")]
    Case { case: MatrixCase, payload_len: usize, schedule: PauseSchedule, source: HarnessError },
    #[error("random run {run}: {source}")]
    Random { run: u32, source: HarnessError },
    #[error("random input: {0}")]
    Arbitrary(#[from] arbitrary::Error),
    #[error("capture file: {0}")]
    Io(#[from] std::io::Error),
    #[error("capture encoding: {0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),
}

/// Which pause schedules to run each case under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PauseMode {
    /// Both sides always ready
    Normal,
    /// Source paused three ticks of four
    Source,
    /// Sink paused three ticks of four
    Sink,
    /// Both sides paused at random, seeded by --seed
    Random,
    /// Normal, source and sink in turn
    All,
}

impl PauseMode {
    fn schedules(self, seed: u64) -> Vec<PauseSchedule> {
        match self {
            Self::Normal => vec![PauseSchedule::Never],
            Self::Source => vec![PauseSchedule::Source],
            Self::Sink => vec![PauseSchedule::Sink],
            Self::Random => vec![PauseSchedule::Random { seed }],
            Self::All => PauseSchedule::MATRIX.to_vec(),
        }
    }
}

#[derive(Debug, Parser)]
#[command(version, about = "Run the UDP to IP encapsulator verification matrix")]
struct Cli {
    /// Shortest payload length
    #[arg(long, default_value_t = 1)]
    min_len: usize,

    /// Longest payload length
    #[arg(long, default_value_t = 17)]
    max_len: usize,

    /// Pause schedules to run under
    #[arg(long, value_enum, default_value_t = PauseMode::All)]
    pause: PauseMode,

    /// Seed for random pauses and random runs
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Extra random frame sequences checked against the reference model
    #[arg(long, default_value_t = 0)]
    random_runs: u32,

    /// Payload input channel depth
    #[arg(long, default_value_t = 1)]
    payload_in_depth: usize,

    /// Payload output channel depth
    #[arg(long, default_value_t = 2)]
    payload_out_depth: usize,

    /// Header output channel depth
    #[arg(long, default_value_t = 1)]
    header_out_depth: usize,

    /// Write every received frame to this file as CBOR
    #[arg(long, value_name = "PATH")]
    capture: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> EncapsulatorConfig {
        EncapsulatorConfig {
            payload_in_depth: self.payload_in_depth,
            payload_out_depth: self.payload_out_depth,
            header_out_depth: self.header_out_depth,
        }
    }
}

fn run(cli: &Cli) -> Result<(), SimError> {
    if cli.min_len > cli.max_len {
        return Err(SimError::LengthRange { min: cli.min_len, max: cli.max_len });
    }

    let config = cli.config();
    config.validate()?;
    let schedules = cli.pause.schedules(cli.seed);

    let mut records = Vec::new();
    let mut passed = 0u64;
    for case in MatrixCase::ALL {
        for payload_len in cli.min_len..=cli.max_len {
            for &schedule in &schedules {
                let report = run_case(case, payload_len, schedule, config)
                    .map_err(|source| SimError::Case { case, payload_len, schedule, source })?;
                passed += 1;

                if cli.capture.is_some() {
                    records.push(capture::CaptureRecord::from(&report));
                }
            }
        }
        info!(%case, "case passed");
    }

    for run in 0..cli.random_runs {
        random_run(config, cli.seed, run)?;
    }

    info!(passed, random_runs = cli.random_runs, "all cases passed");

    if let Some(path) = &cli.capture {
        capture::write(path, &records)?;
        info!(path = %path.display(), records = records.len(), "capture written");
    }
    Ok(())
}

fn random_run(config: EncapsulatorConfig, seed: u64, run: u32) -> Result<(), SimError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(u64::from(run)));
    let mut entropy = [0u8; RANDOM_RUN_ENTROPY];
    rng.fill_bytes(&mut entropy);

    let specs: Vec<FrameSpec> = Unstructured::new(&entropy).arbitrary()?;
    let schedule = PauseSchedule::Random { seed: rng.next_u64() };

    let template = FrameTemplate::standard();
    let transmissions: Vec<Transmission> =
        specs.iter().map(|spec| spec.transmission(&template)).collect();

    check_against_model(config, schedule, &transmissions)
        .map_err(|source| SimError::Random { run, source })?;
    debug!(run, frames = transmissions.len(), %schedule, "random run passed");
    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        },
    }
}
