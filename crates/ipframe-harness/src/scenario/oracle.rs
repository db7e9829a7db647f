//! Reusable oracles.

use crate::{model::ReferenceModel, scenario::OracleFn};

/// Every received frame, the alarm and the frame counters match the
/// reference model run over the sent transmissions.
pub fn matches_model() -> OracleFn {
    Box::new(|world| {
        let mut model = ReferenceModel::new();
        let expected: Vec<_> = world.sent().iter().map(|tx| model.encapsulate(tx)).collect();

        if world.received().len() != expected.len() {
            return Err(format!(
                "received {} frames, model expects {}",
                world.received().len(),
                expected.len()
            ));
        }

        for (index, (actual, expected)) in world.received().iter().zip(&expected).enumerate() {
            if actual != expected {
                return Err(format!("frame {index}: expected {expected:?}, got {actual:?}"));
            }
        }

        if world.early_termination() != model.alarm() {
            return Err(format!(
                "alarm {} but model says {}",
                world.early_termination(),
                model.alarm()
            ));
        }

        if world.stats().truncated_frames != model.truncated_frames() {
            return Err(format!(
                "{} truncated frames counted, model has {}",
                world.stats().truncated_frames,
                model.truncated_frames()
            ));
        }

        Ok(())
    })
}

/// Exactly `count` frames were received.
pub fn frame_count(count: usize) -> OracleFn {
    Box::new(move |world| {
        if world.received().len() == count {
            Ok(())
        } else {
            Err(format!("received {} frames, expected {count}", world.received().len()))
        }
    })
}

/// No idle payload tick between consecutive frames.
pub fn no_idle_gap() -> OracleFn {
    Box::new(|world| match world.max_interframe_gap() {
        Some(0) | None => Ok(()),
        Some(gap) => Err(format!("{gap} idle ticks between frames")),
    })
}

/// The alarm ended up in the given state.
pub fn alarm(raised: bool) -> OracleFn {
    Box::new(move |world| {
        if world.early_termination() == raised {
            Ok(())
        } else {
            Err(format!("alarm is {}, expected {raised}", world.early_termination()))
        }
    })
}

/// Every oracle in `oracles` passes. Stops at the first failure.
pub fn all_of(oracles: Vec<OracleFn>) -> OracleFn {
    Box::new(move |world| oracles.iter().try_for_each(|oracle| oracle(world)))
}
