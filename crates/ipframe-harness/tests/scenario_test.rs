//! Scenario tests: back-to-back timing, error propagation and the alarm,
//! each verified through an oracle.

use ipframe_core::SequencerEvent;
use ipframe_harness::{
    Fault, FrameTemplate, PauseSchedule,
    frame::sequence_payload,
    scenario::{OracleFn, Scenario, oracle},
};

#[test]
fn back_to_back_frames_leave_no_gap() {
    let template = FrameTemplate::standard();
    let first = template.build(sequence_payload(17));
    let second = template.build(sequence_payload(9));

    let handoff: OracleFn = Box::new(|world| {
        let completed = world
            .events()
            .iter()
            .find(|(_, event)| matches!(event, SequencerEvent::FrameCompleted { .. }))
            .map(|&(tick, _)| tick)
            .ok_or("first frame never completed")?;
        let second_header = world
            .events()
            .iter()
            .filter(|(_, event)| matches!(event, SequencerEvent::HeaderEmitted { .. }))
            .nth(1)
            .map(|&(tick, _)| tick)
            .ok_or("second header never emitted")?;

        if completed != second_header {
            return Err(format!(
                "second header on tick {second_header}, first frame done on {completed}"
            ));
        }
        if world.ticks() < second_header {
            return Err("run ended before the second header".into());
        }
        Ok(())
    });

    let result = Scenario::new("back to back")
        .frame(&first)
        .frame(&second)
        .oracle(oracle::all_of(vec![
            oracle::frame_count(2),
            oracle::no_idle_gap(),
            oracle::matches_model(),
            handoff,
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn long_stream_under_random_pauses() {
    let template = FrameTemplate::standard();
    let mut scenario = Scenario::new("random pauses").pauses(PauseSchedule::Random { seed: 0x5EED });
    for len in 0..32 {
        scenario = scenario.frame(&template.build(sequence_payload(len)));
    }

    let result = scenario
        .oracle(oracle::all_of(vec![oracle::frame_count(32), oracle::matches_model(), oracle::alarm(false)]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn truncation_sets_alarm_and_next_frame_survives() {
    let template = FrameTemplate::standard();
    let short = template.build(sequence_payload(12)).transmission().with_fault(Fault::Truncated(10));
    let clean = template.build(sequence_payload(12));

    let flags: OracleFn = Box::new(|world| {
        let received = world.received();
        assert!(received[0].error, "short frame should carry the error flag");
        assert!(!received[1].error, "clean frame should not");
        assert_eq!(world.stats().truncated_frames, 1);
        Ok(())
    });

    let result = Scenario::new("truncated then clean")
        .pauses(PauseSchedule::Sink)
        .send(short)
        .frame(&clean)
        .oracle(oracle::all_of(vec![oracle::alarm(true), oracle::matches_model(), flags]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn trailing_error_flag_propagates() {
    let template = FrameTemplate::standard();
    let tx = template.build(sequence_payload(5)).transmission().with_fault(Fault::TrailingWithError(10));

    let carved: OracleFn = Box::new(|world| {
        let frame = &world.received()[0];
        assert!(frame.error);
        assert_eq!(frame.payload.len(), 8 + 5);
        assert!(world.stats().trailing_beats_discarded >= 1);
        Ok(())
    });

    let result = Scenario::new("trailing with error")
        .pauses(PauseSchedule::Source)
        .send(tx)
        .oracle(oracle::all_of(vec![oracle::alarm(false), oracle::matches_model(), carved]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn zero_length_payload() {
    let frame = FrameTemplate::standard().build(sequence_payload(0));

    let lengths: OracleFn = Box::new(|world| {
        assert_eq!(world.received()[0].header.total_length, 28);
        assert_eq!(world.received()[0].payload.len(), 8);
        Ok(())
    });

    let result = Scenario::new("empty datagram")
        .frame(&frame)
        .oracle(oracle::all_of(vec![oracle::matches_model(), lengths]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn failed_oracle_is_reported() {
    let frame = FrameTemplate::standard().build(sequence_payload(3));

    let result = Scenario::new("wrong count").frame(&frame).oracle(oracle::frame_count(2)).run();

    assert!(result.is_err());
}
