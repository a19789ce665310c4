//! Behavior of the debounce state machine over observation sequences

use proptest::prelude::*;
use qr_watch::{DecodeResult, Debouncer, Update};

fn seen(code: &str) -> Option<&[u8]> {
    Some(code.as_bytes())
}

fn feed(debouncer: &mut Debouncer, obs: Option<&[u8]>, times: usize) -> Vec<Update> {
    (0..times).filter_map(|_| debouncer.observe(obs)).collect()
}

#[test]
fn test_first_code_commits_immediately() {
    let mut debouncer = Debouncer::new(8);
    assert_eq!(debouncer.update(&DecodeResult::NoSymbol), None);
    assert_eq!(
        debouncer.update(&DecodeResult::code("ABC")),
        Some(Update::Appeared("ABC".into()))
    );
    assert_eq!(debouncer.last_code(), seen("ABC"));
    assert_eq!(debouncer.retry_count(), 0);
}

#[test]
fn test_replacement_needs_threshold_plus_one_frames() {
    let mut debouncer = Debouncer::with_active(8, "ABC");

    for expected in 1..=8 {
        assert_eq!(debouncer.observe(seen("XYZ")), None);
        assert_eq!(debouncer.retry_count(), expected);
        assert_eq!(debouncer.last_code(), seen("ABC"));
    }

    assert_eq!(
        debouncer.observe(seen("XYZ")),
        Some(Update::Replaced {
            previous: "ABC".into(),
            current: "XYZ".into(),
        })
    );
    assert_eq!(debouncer.retry_count(), 0);
    assert_eq!(debouncer.last_code(), seen("XYZ"));
}

#[test]
fn test_matching_frame_resets_counter() {
    let mut debouncer = Debouncer::with_active(8, "ABC");
    assert!(feed(&mut debouncer, seen("XYZ"), 3).is_empty());
    assert_eq!(debouncer.retry_count(), 3);

    assert_eq!(debouncer.observe(seen("ABC")), None);
    assert_eq!(debouncer.retry_count(), 0);
    assert_eq!(debouncer.last_code(), seen("ABC"));
}

#[test]
fn test_clear_writes_empty_payload() {
    let mut debouncer = Debouncer::with_active(8, "ABC");
    assert!(feed(&mut debouncer, None, 8).is_empty());

    let update = debouncer.observe(None).unwrap();
    assert_eq!(update, Update::Cleared { previous: "ABC".into() });
    assert!(update.payload().is_empty());
    assert_eq!(debouncer.last_code(), None);
}

#[test]
fn test_mixed_disagreement_commits_latest_observation() {
    let mut debouncer = Debouncer::with_active(2, "ABC");
    assert_eq!(debouncer.observe(None), None);
    assert_eq!(debouncer.observe(seen("XYZ")), None);
    assert_eq!(
        debouncer.observe(seen("QRS")),
        Some(Update::Replaced {
            previous: "ABC".into(),
            current: "QRS".into(),
        })
    );
}

#[test]
fn test_decode_error_counts_as_absent() {
    let mut debouncer = Debouncer::with_active(1, "ABC");
    assert_eq!(debouncer.update(&DecodeResult::Error("boom".into())), None);
    assert_eq!(
        debouncer.update(&DecodeResult::Error("boom".into())),
        Some(Update::Cleared { previous: "ABC".into() })
    );
}

#[test]
fn test_zero_threshold_commits_every_change() {
    let mut debouncer = Debouncer::with_active(0, "ABC");
    assert!(matches!(
        debouncer.observe(seen("XYZ")),
        Some(Update::Replaced { .. })
    ));
    assert!(matches!(debouncer.observe(None), Some(Update::Cleared { .. })));
}

#[test]
fn test_repeated_code_after_commit_is_noop() {
    let mut debouncer = Debouncer::new(8);
    assert!(debouncer.observe(seen("ABC")).is_some());
    assert!(feed(&mut debouncer, seen("ABC"), 50).is_empty());
    assert_eq!(debouncer.retry_count(), 0);
}

fn observation() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("A".to_string())),
        Just(Some("B".to_string())),
        Just(Some("C".to_string())),
    ]
}

proptest! {
    #[test]
    fn prop_active_code_changes_only_at_threshold(
        max_retry in 0u32..6,
        stream in prop::collection::vec(observation(), 0..200),
    ) {
        let mut debouncer = Debouncer::new(max_retry);
        for obs in &stream {
            let before_code = debouncer.last_code().map(<[u8]>::to_vec);
            let before_retry = debouncer.retry_count();
            let update = debouncer.observe(obs.as_deref().map(str::as_bytes));

            prop_assert!(debouncer.retry_count() <= max_retry);
            prop_assert!(debouncer.last_code().is_none_or(|code| !code.is_empty()));
            prop_assert_eq!(update.is_some(), debouncer.last_code() != before_code.as_deref());
            if before_code.is_some() && update.is_some() {
                prop_assert_eq!(before_retry, max_retry);
            }
            if update.is_some() {
                prop_assert_eq!(debouncer.retry_count(), 0);
            }
        }
    }

    #[test]
    fn prop_stable_observation_never_recommits(
        max_retry in 0u32..10,
        code in "[A-Z0-9]{1,12}",
        repeats in 1usize..40,
    ) {
        let mut debouncer = Debouncer::new(max_retry);
        prop_assert!(debouncer.observe(Some(code.as_bytes())).is_some());
        for _ in 0..repeats {
            prop_assert_eq!(debouncer.observe(Some(code.as_bytes())), None);
            prop_assert_eq!(debouncer.retry_count(), 0);
        }
    }
}
