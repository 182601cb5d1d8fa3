use std::sync::Arc;

use ircquote::irc::reply::Replier;
use ircquote::utils::chunker::{DEFAULT_CHUNK_LIMIT, MessageChunker};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::mocks::Recorder;

fn texts(message: &str, limit: usize) -> Vec<String> {
    MessageChunker::new(limit)
        .unwrap()
        .chunks(message)
        .map(|chunk| chunk.text.to_string())
        .collect()
}

#[test]
fn test_unbroken_text_is_hard_cut() {
    let message = "a".repeat(450);

    let chunks = texts(&message, DEFAULT_CHUNK_LIMIT);

    assert_eq!(chunks, vec!["a".repeat(399), "a".repeat(51)]);
}

#[test]
fn test_prose_splits_on_word_boundaries() {
    let message = "The quick brown fox. ".repeat(30);

    let chunks = texts(&message, DEFAULT_CHUNK_LIMIT);

    assert_eq!(chunks.len(), 2);
    assert!(chunks[0].ends_with("brown fox."));
    assert!(chunks.iter().all(|c| c.chars().count() <= DEFAULT_CHUNK_LIMIT));
    assert_eq!(chunks.join(" "), message.trim());
}

#[test]
fn test_empty_message_is_one_empty_chunk() {
    assert_eq!(texts("", DEFAULT_CHUNK_LIMIT), vec![""]);
}

#[test]
fn test_message_at_limit_is_untouched() {
    let message = "b".repeat(DEFAULT_CHUNK_LIMIT);

    assert_eq!(texts(&message, DEFAULT_CHUNK_LIMIT), vec![message]);
}

#[rstest]
#[case(10)]
#[case(37)]
#[case(100)]
fn test_chunks_rebuild_the_message(#[case] limit: usize) {
    let message = "Price update. ".repeat(50);

    let chunks = texts(&message, limit);

    assert!(chunks.iter().all(|c| c.chars().count() <= limit));
    assert_eq!(chunks.join(" "), message.trim());
}

#[tokio::test]
async fn test_only_first_line_is_addressed() {
    crate::test_utils::init();
    let recorder = Arc::new(Recorder::default());
    let replier = Replier::new(recorder.clone(), "#stocks", "alice", 40).unwrap();

    replier
        .reply("Rust is a systems programming language focused on safety, speed and concurrency.")
        .await
        .unwrap();

    assert_eq!(
        recorder.texts(),
        vec![
            "alice: Rust is a systems programming language",
            "focused on safety, speed and",
            "concurrency.",
        ]
    );
    assert_eq!(recorder.targets(), vec!["#stocks"; 3]);
}
