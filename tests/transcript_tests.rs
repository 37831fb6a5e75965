// Unit tests for the transcript aggregator
//
// These verify the partial/final accumulation rules: snapshots contain
// exactly the final utterances in emission order, and partials are
// transient per-speaker state.

use medvoice::{Speaker, TranscriptAggregator, Utterance};

#[test]
fn test_snapshot_contains_only_finals_in_order() {
    let mut aggregator = TranscriptAggregator::new();

    aggregator.set_partial(Speaker::Assistant, "Hel");
    aggregator.append_final(Utterance::new(Speaker::Assistant, "Hello, how can I help?"));
    aggregator.set_partial(Speaker::Patient, "I ha");
    aggregator.append_final(Utterance::new(Speaker::Patient, "I have a headache"));
    aggregator.append_final(Utterance::new(Speaker::Assistant, "Since when?"));

    let snapshot = aggregator.snapshot();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot[0].text, "Hello, how can I help?");
    assert_eq!(snapshot[0].speaker, Speaker::Assistant);
    assert_eq!(snapshot[1].text, "I have a headache");
    assert_eq!(snapshot[1].speaker, Speaker::Patient);
    assert_eq!(snapshot[2].text, "Since when?");
}

#[test]
fn test_partial_replaced_by_next_partial() {
    let mut aggregator = TranscriptAggregator::new();

    aggregator.set_partial(Speaker::Patient, "I");
    aggregator.set_partial(Speaker::Patient, "I have");
    aggregator.set_partial(Speaker::Patient, "I have a fever");

    assert_eq!(aggregator.peek_partial(Speaker::Patient), "I have a fever");
    assert!(aggregator.is_empty(), "partials must never reach the transcript");
}

#[test]
fn test_final_clears_partial_for_that_speaker() {
    let mut aggregator = TranscriptAggregator::new();

    aggregator.set_partial(Speaker::Patient, "I have a fev");
    aggregator.append_final(Utterance::new(Speaker::Patient, "I have a fever"));

    assert_eq!(aggregator.peek_partial(Speaker::Patient), "");
    assert_eq!(aggregator.len(), 1);
}

#[test]
fn test_partials_are_per_speaker() {
    let mut aggregator = TranscriptAggregator::new();

    aggregator.set_partial(Speaker::Assistant, "Let me expl");
    aggregator.set_partial(Speaker::Patient, "ok th");

    // Finalizing one speaker's turn leaves the other's partial alone
    aggregator.append_final(Utterance::new(Speaker::Assistant, "Let me explain"));

    assert_eq!(aggregator.peek_partial(Speaker::Assistant), "");
    assert_eq!(aggregator.peek_partial(Speaker::Patient), "ok th");
}

#[test]
fn test_peek_partial_defaults_empty() {
    let aggregator = TranscriptAggregator::new();

    assert_eq!(aggregator.peek_partial(Speaker::Assistant), "");
    assert_eq!(aggregator.peek_partial(Speaker::Patient), "");
    assert!(aggregator.is_empty());
    assert_eq!(aggregator.len(), 0);
}

#[test]
fn test_clear_resets_everything() {
    let mut aggregator = TranscriptAggregator::new();

    aggregator.append_final(Utterance::new(Speaker::Assistant, "Hello"));
    aggregator.set_partial(Speaker::Patient, "hi th");

    aggregator.clear();

    assert!(aggregator.is_empty());
    assert_eq!(aggregator.peek_partial(Speaker::Patient), "");
}

#[test]
fn test_interleaved_sequence_preserves_emission_order() {
    let mut aggregator = TranscriptAggregator::new();

    let turns = [
        (Speaker::Assistant, "What brings you in today?"),
        (Speaker::Patient, "Fever for three days"),
        (Speaker::Assistant, "Any cough?"),
        (Speaker::Patient, "Yes, a dry one"),
        (Speaker::Assistant, "I recommend rest and fluids"),
        (Speaker::Patient, "ok thank you"),
    ];

    for (speaker, text) in turns {
        // Every final is preceded by a couple of partial fragments
        aggregator.set_partial(speaker, &text[..1]);
        aggregator.set_partial(speaker, &text[..text.len() / 2]);
        aggregator.append_final(Utterance::new(speaker, text));
    }

    let snapshot = aggregator.snapshot();
    assert_eq!(snapshot.len(), turns.len());
    for (utterance, (speaker, text)) in snapshot.iter().zip(turns) {
        assert_eq!(utterance.speaker, speaker);
        assert_eq!(utterance.text, text);
    }
    assert_eq!(aggregator.peek_partial(Speaker::Assistant), "");
    assert_eq!(aggregator.peek_partial(Speaker::Patient), "");
}
