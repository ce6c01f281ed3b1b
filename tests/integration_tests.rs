use rand::rngs::StdRng;
use rand::SeedableRng;
use smsguard::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn limiter_with_clock(max_requests: u32, window_ms: u64) -> (Arc<RateLimiter<MockClock>>, MockClock) {
    let clock = MockClock::default();
    let config = RateLimitConfig {
        max_requests,
        window_ms,
        ..RateLimitConfig::default()
    };
    (
        Arc::new(RateLimiter::with_clock(config, clock.clone())),
        clock,
    )
}

#[tokio::test]
async fn test_limiter_admits_exactly_n_then_recovers() {
    let (limiter, clock) = limiter_with_clock(3, 1000);

    for _ in 0..3 {
        assert!(limiter.is_allowed("campaign:7").allowed);
    }
    let denied = limiter.is_allowed("campaign:7");
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);

    clock.advance(Duration::from_millis(1000));
    let decision = limiter.is_allowed("campaign:7");
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 2);
}

#[tokio::test]
async fn test_concurrent_admission_checks_on_one_key() {
    use futures::future;

    let (limiter, _) = limiter_with_clock(10, 60_000);

    let futures = (0..50).map(|_| {
        let limiter = Arc::clone(&limiter);
        tokio::spawn(async move { limiter.is_allowed("sender:shared").allowed })
    });

    let results = future::join_all(futures).await;

    assert_eq!(results.len(), 50);
    let admitted = results
        .into_iter()
        .map(|r| r.expect("admission task panicked"))
        .filter(|allowed| *allowed)
        .count();
    assert_eq!(admitted, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_admission_across_keys() {
    use futures::future;

    let (limiter, _) = limiter_with_clock(5, 60_000);

    let futures = (0..60).map(|i| {
        let limiter = Arc::clone(&limiter);
        let key = format!("campaign:{}", i % 3);
        tokio::spawn(async move { (i % 3, limiter.is_allowed(&key).allowed) })
    });

    let mut admitted = [0usize; 3];
    for result in future::join_all(futures).await {
        let (key, allowed) = result.expect("admission task panicked");
        if allowed {
            admitted[key] += 1;
        }
    }

    assert_eq!(admitted, [5, 5, 5]);
    assert_eq!(limiter.key_count(), 3);
}

#[test]
fn test_backoff_band_from_seeded_source() {
    let config = BackoffConfig::new(100, 10_000, 2.0);
    let mut rng = StdRng::seed_from_u64(2024);

    for _ in 0..200 {
        let first = compute_delay_with(0, &config, &mut rng).as_millis();
        assert!((75..=125).contains(&first));

        let capped = compute_delay_with(10, &config, &mut rng).as_millis();
        assert!(capped <= 11_250, "delay {}ms above jitter ceiling", capped);
        assert!(capped >= 8_750);
    }
}

#[test]
fn test_message_normalization_end_to_end() {
    let text = sanitize("  \u{2018}Final\u{2019} call \u{2013} reply STOP to opt out\x1b  ").unwrap();
    assert_eq!(text.as_str(), "'Final' call - reply STOP to opt out");
    assert_eq!(estimate_segments(text.as_str()), 1);
    assert_eq!(sanitize(text.as_str()).unwrap(), text);

    assert_eq!(sanitize(""), Err(ValidationError::EmptyAfterSanitization));
    assert!(matches!(
        sanitize(&"a".repeat(1601)),
        Err(ValidationError::TooLong { .. })
    ));
}

#[test]
fn test_segment_thresholds() {
    assert_eq!(estimate_segments(&"a".repeat(160)), 1);
    assert_eq!(estimate_segments(&"a".repeat(161)), 2);
    assert_eq!(estimate_segments(&"\u{e9}".repeat(71)), 2);
}

#[test]
fn test_duplicate_recipients_in_batch() {
    let dups = find_duplicates(&["+1 555-1234", "15551234", "+1-555-5678"]);
    assert_eq!(dups.len(), 1);
    assert!(dups.contains(&canonicalize("+15551234")));
}

#[tokio::test]
async fn test_pipeline_prepares_and_admits_batch() {
    let (limiter, clock) = limiter_with_clock(2, 1000);
    let pipeline = AdmissionPipeline::new(
        limiter,
        PhoneValidator::from_region_code("US").unwrap(),
        RetryPolicy::default(),
    );

    let batch = [
        SendCandidate {
            to: "201-555-0123",
            text: "Doors open at 7\u{2026}",
        },
        SendCandidate {
            to: "+1 (201) 555-0123",
            text: "duplicate",
        },
        SendCandidate {
            to: "+1 201 555 0150",
            text: "See you there",
        },
        SendCandidate {
            to: "+1 201 555 0151",
            text: "And you",
        },
        SendCandidate {
            to: "12",
            text: "bad number",
        },
    ];

    let plan = pipeline.prepare_batch(&batch);
    assert_eq!(plan.ready.len(), 3);
    assert_eq!(plan.rejected.len(), 2);
    assert_eq!(plan.ready[0].text, "Doors open at 7...");

    let verdicts: Vec<bool> = plan
        .ready
        .iter()
        .map(|_| pipeline.admit("campaign:launch").allowed)
        .collect();
    assert_eq!(verdicts, vec![true, true, false]);

    clock.advance(Duration::from_secs(1));
    assert!(pipeline.admit("campaign:launch").allowed);
}

#[test]
fn test_guards_never_error_outward() {
    let validator = PhoneValidator::from_region_code("US").unwrap();
    for raw in ["", "+", "911", "+1 201 555 0911", "\u{1F4DE}"] {
        let verdict = validator.validate(raw);
        assert!(!verdict.is_valid, "{:?} should be invalid", raw);
        assert!(verdict.error.is_some());
    }

    assert!(validate_media_url("https://cdn.example.com/a.gif").is_valid);
    assert!(!validate_media_url("ftp://cdn.example.com/a.gif").is_valid);
}

#[test]
fn test_pagination_from_query() {
    let page = Pagination::from_query(Some("2"), None);
    assert_eq!((page.page, page.limit, page.skip), (2, 10, 10));
}
