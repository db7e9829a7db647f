//! Drives arbitrary frame sequences, faults, pause schedules and channel
//! depths through the engine and checks every output against the reference
//! model.

#![no_main]

use arbitrary::Arbitrary;
use ipframe_core::EncapsulatorConfig;
use ipframe_harness::{FrameSpec, FrameTemplate, PauseSchedule, Transmission, check_against_model};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    schedule: PauseSchedule,
    payload_in_depth: u8,
    payload_out_depth: u8,
    header_out_depth: u8,
    frames: Vec<FrameSpec>,
}

fuzz_target!(|input: Input| {
    let config = EncapsulatorConfig {
        payload_in_depth: usize::from(input.payload_in_depth % 4) + 1,
        payload_out_depth: usize::from(input.payload_out_depth % 4) + 1,
        header_out_depth: usize::from(input.header_out_depth % 2) + 1,
    };

    let template = FrameTemplate::standard();
    let transmissions: Vec<Transmission> =
        input.frames.iter().take(32).map(|spec| spec.transmission(&template)).collect();

    if let Err(e) = check_against_model(config, input.schedule, &transmissions) {
        panic!("{:?} under {}: {}", config, input.schedule, e);
    }
});
