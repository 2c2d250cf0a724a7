use std::cell::Cell;
use std::time::Duration;

use scrape_engine::{RetryExhausted, RetryGovernor, RetryPolicy};
use tokio::time::Instant;

fn governor(max_attempts: u32, delay_secs: u64) -> RetryGovernor {
    RetryGovernor::new(RetryPolicy::new(max_attempts, Duration::from_secs(delay_secs)))
}

#[tokio::test(start_paused = true)]
async fn returns_first_success_after_sleeping_between_failures() {
    scrape_logging::initialize_for_tests();
    let calls = Cell::new(0u32);
    let started = Instant::now();

    let result: Result<u32, RetryExhausted<String>> = governor(3, 1)
        .run("flaky", || {
            calls.set(calls.get() + 1);
            let call = calls.get();
            async move {
                if call < 3 {
                    Err(format!("failure {call}"))
                } else {
                    Ok(call * 10)
                }
            }
        })
        .await;

    assert_eq!(result, Ok(30));
    assert_eq!(calls.get(), 3);
    assert!(started.elapsed() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn immediate_success_does_not_sleep() {
    let started = Instant::now();
    let result: Result<&str, RetryExhausted<String>> =
        governor(3, 5).run("steady", || async { Ok("done") }).await;

    assert_eq!(result, Ok("done"));
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn exhaustion_reports_attempts_and_last_error() {
    let calls = Cell::new(0u32);
    let started = Instant::now();

    let result: Result<(), RetryExhausted<String>> = governor(3, 1)
        .run("doomed", || {
            calls.set(calls.get() + 1);
            let call = calls.get();
            async move { Err(format!("failure {call}")) }
        })
        .await;

    let exhausted = result.unwrap_err();
    assert_eq!(exhausted.label, "doomed");
    assert_eq!(exhausted.attempts, 3);
    assert_eq!(exhausted.last_error, "failure 3");
    assert_eq!(calls.get(), 3);
    // No sleep after the final attempt.
    assert_eq!(started.elapsed(), Duration::from_secs(2));
    assert_eq!(
        exhausted.to_string(),
        "doomed: gave up after 3 attempts: failure 3"
    );
}

#[tokio::test(start_paused = true)]
async fn zero_attempts_still_tries_once() {
    let calls = Cell::new(0u32);
    let policy = RetryPolicy::new(0, Duration::from_secs(1));
    assert_eq!(policy.max_attempts, 1);

    let result: Result<(), RetryExhausted<&str>> = RetryGovernor::new(policy)
        .run("once", || {
            calls.set(calls.get() + 1);
            async { Err("nope") }
        })
        .await;

    assert_eq!(result.unwrap_err().attempts, 1);
    assert_eq!(calls.get(), 1);
}
