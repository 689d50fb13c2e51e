//! Integration tests for the `SpeechPipeline` scheduler.
//!
//! A fake engine with per-chunk delays and failures drives the pipeline; a
//! recording sink captures the order in which chunks reach the player. No
//! engine, audio device or network is needed.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeSynth, RecordingSink, chunks};
use tokio_util::sync::CancellationToken;
use vvmcp_core::{SpeakerId, Turn};
use vvmcp_voice::{PipelineConfig, SpeechPipeline};

fn pipeline(synth: &Arc<FakeSynth>, sink: &Arc<RecordingSink>) -> SpeechPipeline {
    SpeechPipeline::new(synth.clone(), sink.clone())
}

#[tokio::test]
async fn empty_input_succeeds_without_engine_calls() {
    let synth = Arc::new(FakeSynth::new());
    let sink = Arc::new(RecordingSink::new());

    let outcome = pipeline(&synth, &sink)
        .run(&[], SpeakerId(1), &CancellationToken::new())
        .await;

    assert!(outcome.succeeded());
    assert!(synth.calls().is_empty());
    assert!(sink.played().is_empty());
}

#[tokio::test]
async fn plays_in_order_regardless_of_synthesis_completion() {
    let synth = Arc::new(
        FakeSynth::new()
            .with_delay("c0", 30)
            .with_delay("c1", 60)
            .with_delay("c2", 5)
            .with_delay("c3", 45)
            .with_delay("c4", 1)
            .with_delay("c5", 20),
    );
    let sink = Arc::new(RecordingSink::new().with_play_delay(5));
    let input = chunks(&["c0", "c1", "c2", "c3", "c4", "c5"]);

    let outcome = pipeline(&synth, &sink)
        .run(&input, SpeakerId(3), &CancellationToken::new())
        .await;

    assert!(outcome.succeeded());
    assert_eq!(outcome.played, 6);
    assert_eq!(sink.played(), input);
    assert!(synth.calls().iter().all(|(_, speaker)| *speaker == SpeakerId(3)));
}

#[tokio::test]
async fn first_chunk_failure_aborts_the_turn() {
    let synth = Arc::new(FakeSynth::new().failing_on("c0"));
    let sink = Arc::new(RecordingSink::new());

    let outcome = pipeline(&synth, &sink)
        .run(&chunks(&["c0", "c1", "c2"]), SpeakerId(1), &CancellationToken::new())
        .await;

    assert!(!outcome.succeeded());
    assert_eq!(outcome.failed, 1);
    assert_eq!(synth.called_texts(), vec!["c0"]);
    assert!(sink.played().is_empty());
}

#[tokio::test]
async fn failed_middle_chunk_is_skipped_and_the_rest_play() {
    let synth = Arc::new(FakeSynth::new().failing_on("c2"));
    let sink = Arc::new(RecordingSink::new().with_play_delay(2));

    let outcome = pipeline(&synth, &sink)
        .run(
            &chunks(&["c0", "c1", "c2", "c3", "c4"]),
            SpeakerId(1),
            &CancellationToken::new(),
        )
        .await;

    assert!(!outcome.succeeded());
    assert!(!outcome.cancelled);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.played, 4);
    assert_eq!(sink.played(), vec!["c0", "c1", "c3", "c4"]);
}

#[tokio::test]
async fn failed_lookahead_units_fall_back_to_sequential() {
    // Both initial lookahead units fail, leaving the buffer empty.
    let synth = Arc::new(FakeSynth::new().failing_on("c1").failing_on("c2"));
    let sink = Arc::new(RecordingSink::new());

    let outcome = pipeline(&synth, &sink)
        .run(
            &chunks(&["c0", "c1", "c2", "c3", "c4"]),
            SpeakerId(1),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(outcome.failed, 2);
    assert_eq!(sink.played(), vec!["c0", "c3", "c4"]);
}

#[tokio::test]
async fn playback_failure_is_recorded_and_playback_continues() {
    let synth = Arc::new(FakeSynth::new());
    let sink = Arc::new(RecordingSink::new().failing_on("c1"));

    let outcome = pipeline(&synth, &sink)
        .run(
            &chunks(&["c0", "c1", "c2", "c3"]),
            SpeakerId(1),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.played, 3);
    assert_eq!(sink.played(), vec!["c0", "c1", "c2", "c3"]);
}

#[tokio::test]
async fn cancellation_mid_stream_stops_further_playback() {
    let synth = Arc::new(FakeSynth::new().with_delay("c3", 10));
    let sink = Arc::new(RecordingSink::new().with_play_delay(20).cancelling_on("c1"));

    let outcome = pipeline(&synth, &sink)
        .run(
            &chunks(&["c0", "c1", "c2", "c3", "c4", "c5"]),
            SpeakerId(1),
            &CancellationToken::new(),
        )
        .await;

    assert!(outcome.cancelled);
    assert!(!outcome.succeeded());
    assert_eq!(outcome.failed, 0);
    assert_eq!(sink.played(), vec!["c0", "c1"]);
}

#[tokio::test]
async fn cancelled_token_prevents_any_work() {
    let synth = Arc::new(FakeSynth::new());
    let sink = Arc::new(RecordingSink::new());
    let token = CancellationToken::new();
    token.cancel();

    let outcome = pipeline(&synth, &sink)
        .run(&chunks(&["c0", "c1"]), SpeakerId(1), &token)
        .await;

    assert!(outcome.cancelled);
    assert!(synth.calls().is_empty());
    assert!(sink.played().is_empty());
}

#[tokio::test]
async fn concurrent_synthesis_stays_within_lookahead() {
    let mut synth = FakeSynth::new();
    for i in 0..8 {
        synth = synth.with_delay(&format!("c{i}"), 15);
    }
    let synth = Arc::new(synth);
    let sink = Arc::new(RecordingSink::new().with_play_delay(10));
    let input: Vec<String> = (0..8).map(|i| format!("c{i}")).collect();

    let outcome = pipeline(&synth, &sink)
        .run(&input, SpeakerId(1), &CancellationToken::new())
        .await;

    assert!(outcome.succeeded());
    assert_eq!(sink.played(), input);
    // One unit is always the one being played or awaited in order.
    assert_eq!(synth.max_in_flight(), 2);
}

#[tokio::test]
async fn lookahead_of_one_is_fully_sequential() {
    let synth = Arc::new(FakeSynth::new().with_delay("c0", 5).with_delay("c1", 5));
    let sink = Arc::new(RecordingSink::new().with_play_delay(5));
    let pipeline = SpeechPipeline::with_config(synth.clone(), sink.clone(), PipelineConfig::new(1));
    let input = chunks(&["c0", "c1", "c2", "c3"]);

    let outcome = pipeline
        .run(&input, SpeakerId(1), &CancellationToken::new())
        .await;

    assert!(outcome.succeeded());
    assert_eq!(synth.max_in_flight(), 1);
    assert_eq!(sink.played(), input);
}

#[tokio::test]
async fn speak_turn_chunks_text_by_sentence() {
    let synth = Arc::new(FakeSynth::new());
    let sink = Arc::new(RecordingSink::new());
    let turn = Turn::new("一つ目。二つ目！三つ目？", SpeakerId(8)).unwrap();

    let outcome = pipeline(&synth, &sink)
        .speak_turn(&turn, 100, &CancellationToken::new())
        .await;

    assert!(outcome.succeeded());
    assert_eq!(sink.played(), vec!["一つ目。", "二つ目！", "三つ目？"]);
    assert!(synth.calls().iter().all(|(_, speaker)| *speaker == SpeakerId(8)));
}

#[tokio::test]
async fn cancellation_during_initial_batch_plays_nothing() {
    let token = CancellationToken::new();
    let synth = Arc::new(FakeSynth::new().cancelling_on("c1", &token));
    let sink = Arc::new(RecordingSink::new());

    let outcome = pipeline(&synth, &sink)
        .run(&chunks(&["c0", "c1", "c2", "c3", "c4"]), SpeakerId(1), &token)
        .await;

    assert!(outcome.cancelled);
    assert_eq!(outcome.played, 0);
    assert_eq!(outcome.failed, 0);
    assert_eq!(sink.play_calls(), 0);
}

#[tokio::test]
async fn cancellation_during_sequential_tail_stops_playback() {
    // c1 and c2 fail, so c3 onwards is synthesized one at a time.
    let token = CancellationToken::new();
    let synth = Arc::new(
        FakeSynth::new()
            .failing_on("c1")
            .failing_on("c2")
            .cancelling_on("c3", &token),
    );
    let sink = Arc::new(RecordingSink::new());

    let outcome = pipeline(&synth, &sink)
        .run(&chunks(&["c0", "c1", "c2", "c3", "c4"]), SpeakerId(1), &token)
        .await;

    assert!(outcome.cancelled);
    assert_eq!(outcome.played, 1);
    assert_eq!(outcome.failed, 2);
    assert_eq!(sink.play_calls(), 1);
    assert_eq!(synth.called_texts(), vec!["c0", "c1", "c2", "c3"]);
}

#[tokio::test]
async fn cancellation_abandons_synthesis_in_flight() {
    let synth = Arc::new(FakeSynth::new().with_delay("c0", 10_000));
    let sink = Arc::new(RecordingSink::new());
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        pipeline(&synth, &sink).run(&chunks(&["c0", "c1"]), SpeakerId(1), &token),
    )
    .await
    .expect("run should return once the token fires");

    assert!(outcome.cancelled);
    assert_eq!(outcome.failed, 0);
    assert_eq!(sink.play_calls(), 0);
}
