//! Pause schedules for the source and sink sides.
//!
//! A paused side skips its handshakes for that tick. The fixed schedules
//! pause one side for three ticks out of every four; the random schedule
//! pauses each side independently with even odds, seeded so that a failing
//! run can be replayed.

use std::fmt;

use arbitrary::Arbitrary;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Which side stalls, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum PauseSchedule {
    /// Both sides always ready
    Never,
    /// Source paused three ticks of every four
    Source,
    /// Sink paused three ticks of every four
    Sink,
    /// Each side paused at random
    Random {
        /// RNG seed
        seed: u64,
    },
}

impl PauseSchedule {
    /// The three modes every verification case runs under.
    pub const MATRIX: [Self; 3] = [Self::Never, Self::Source, Self::Sink];
}

impl fmt::Display for PauseSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("normal"),
            Self::Source => f.write_str("source pause"),
            Self::Sink => f.write_str("sink pause"),
            Self::Random { seed } => write!(f, "random pause (seed {seed})"),
        }
    }
}

/// Which sides are paused on one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pauses {
    /// Source skips its handshakes
    pub source: bool,
    /// Sink skips its handshakes
    pub sink: bool,
}

/// Runs a [`PauseSchedule`] one tick at a time.
#[derive(Debug, Clone)]
pub struct Pauser {
    schedule: PauseSchedule,
    phase: u64,
    rng: ChaCha8Rng,
}

impl Pauser {
    /// Start `schedule` from its first tick.
    pub fn new(schedule: PauseSchedule) -> Self {
        let seed = match schedule {
            PauseSchedule::Random { seed } => seed,
            _ => 0,
        };
        Self { schedule, phase: 0, rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// Pauses for the next tick.
    pub fn next_tick(&mut self) -> Pauses {
        let cycle_paused = self.phase % 4 != 3;
        self.phase += 1;

        match self.schedule {
            PauseSchedule::Never => Pauses::default(),
            PauseSchedule::Source => Pauses { source: cycle_paused, sink: false },
            PauseSchedule::Sink => Pauses { source: false, sink: cycle_paused },
            PauseSchedule::Random { .. } => {
                Pauses { source: self.rng.gen_bool(0.5), sink: self.rng.gen_bool(0.5) }
            },
        }
    }
}
