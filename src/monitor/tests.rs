use super::callsign::active_set;
use super::*;
use crate::feed::SnapshotSource;
use crate::notify::DeliveryReport;
use crate::test_support::{RecordingNotifier, ScriptedSource, status_error};
use crate::utils::error::FetchError;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn users(ids: &[&str]) -> std::collections::BTreeSet<UserId> {
    ids.iter().map(|s| s.to_string()).collect()
}

// --- callsign ---

#[test]
fn test_callsign_normalizes() {
    assert_eq!(Callsign::new(" ml_twr "), Callsign::new("ML_TWR"));
    assert_eq!(Callsign::new("ml_twr").as_str(), "ML_TWR");
    assert_eq!(Callsign::from("sy_gnd").to_string(), "SY_GND");
}

#[test]
fn test_callsign_deserializes_normalized() {
    let callsign: Callsign = serde_json::from_str("\"ml_app\"").unwrap();
    assert_eq!(callsign.as_str(), "ML_APP");
}

// --- diff ---

#[test]
fn test_diff_identical_sets_is_empty() {
    let a = active_set(["ML_GND", "SY_GND"]);
    let delta = diff(&a, &a);
    assert!(delta.is_empty());
    assert!(diff(&ActiveSet::new(), &ActiveSet::new()).is_empty());
}

#[test]
fn test_diff_computes_both_directions() {
    let previous = active_set(["ML_GND", "ML_TWR"]);
    let current = active_set(["ML_GND", "SY_GND"]);

    let delta = diff(&previous, &current);
    assert_eq!(delta.logged_on, active_set(["SY_GND"]));
    assert_eq!(delta.logged_off, active_set(["ML_TWR"]));
}

#[test]
fn test_diff_deltas_are_disjoint() {
    let pairs = [
        (active_set(["A", "B"]), active_set(["B", "C"])),
        (active_set(Vec::<&str>::new()), active_set(["A"])),
        (active_set(["A", "B", "C"]), active_set(Vec::<&str>::new())),
    ];
    for (a, b) in &pairs {
        let delta = diff(a, b);
        assert!(delta.logged_on.is_disjoint(&delta.logged_off));
    }
}

#[test]
fn test_diff_is_symmetric() {
    let a = active_set(["ML_GND", "ML_TWR"]);
    let b = active_set(["ML_TWR", "SY_GND", "SY_APP"]);

    let forward = diff(&a, &b);
    let backward = diff(&b, &a);
    assert_eq!(forward.logged_on, backward.logged_off);
    assert_eq!(forward.logged_off, backward.logged_on);
}

// --- registry ---

#[test]
fn test_subscribe_normalizes_identifier() {
    let mut registry = SubscriptionRegistry::new();
    let outcome = registry.subscribe("u1", "ml_twr");

    assert_eq!(outcome, SubscribeOutcome::Subscribed(Callsign::new("ML_TWR")));
    assert_eq!(registry.subscribers_of(&Callsign::new("ML_TWR")), users(&["u1"]));
}

#[test]
fn test_subscribe_is_idempotent() {
    let mut registry = SubscriptionRegistry::new();
    registry.subscribe("u1", "ML_GND");
    let outcome = registry.subscribe("u1", "ml_gnd");

    assert_eq!(outcome, SubscribeOutcome::Subscribed(Callsign::new("ML_GND")));
    assert_eq!(registry.subscriptions_of("u1").len(), 1);
}

#[test]
fn test_subscribe_clear_empties_existing_set() {
    let mut registry = SubscriptionRegistry::new();
    registry.subscribe("u1", "ML_GND");
    registry.subscribe("u1", "SY_GND");

    assert_eq!(registry.subscribe("u1", "clear"), SubscribeOutcome::Cleared);
    assert!(registry.subscriptions_of("u1").is_empty());
    assert!(registry.contains_user("u1"));
    assert!(registry.subscribers_of(&Callsign::new("ML_GND")).is_empty());
}

#[test]
fn test_subscribe_clear_for_unknown_user() {
    let mut registry = SubscriptionRegistry::new();
    assert_eq!(registry.subscribe("ghost", "CLEAR"), SubscribeOutcome::Cleared);
    assert!(registry.subscriptions_of("ghost").is_empty());
}

#[test]
fn test_clear_unknown_user_is_noop() {
    let mut registry = SubscriptionRegistry::new();
    registry.clear("nobody");
    assert!(registry.is_empty());
}

#[test]
fn test_clear_only_affects_that_user() {
    let mut registry = SubscriptionRegistry::new();
    registry.subscribe("u1", "ML_GND");
    registry.subscribe("u2", "ML_GND");
    registry.clear("u1");

    assert_eq!(registry.subscribers_of(&Callsign::new("ML_GND")), users(&["u2"]));
}

#[test]
fn test_subscribers_of_lists_every_user() {
    let mut registry = SubscriptionRegistry::new();
    registry.subscribe("u2", "ML_GND");
    registry.subscribe("u1", "ML_GND");
    registry.subscribe("u3", "SY_GND");

    assert_eq!(
        registry.subscribers_of(&Callsign::new("ML_GND")),
        users(&["u1", "u2"])
    );
    assert!(registry.subscribers_of(&Callsign::new("ML_TWR")).is_empty());
}

// --- dispatch ---

#[test]
fn test_dispatch_empty_delta_sends_nothing() {
    let mut registry = SubscriptionRegistry::new();
    registry.subscribe("u1", "ML_GND");

    let messages = dispatch(&Delta::default(), &registry, &MessageFormat::new(Some(5)));
    assert!(messages.is_empty());
}

#[test]
fn test_dispatch_logged_on_without_subscribers() {
    let registry = SubscriptionRegistry::new();
    let delta = diff(&active_set(["ML_GND"]), &active_set(["ML_GND", "SY_GND"]));

    let messages = dispatch(&delta, &registry, &MessageFormat::default());
    assert_eq!(
        messages,
        vec![OutboundMessage::Broadcast {
            text: ":green_circle: SY_GND has just logged **ON**!".to_string()
        }]
    );
}

#[test]
fn test_dispatch_logged_off_with_subscriber() {
    let mut registry = SubscriptionRegistry::new();
    registry.subscribe("u1", "ML_GND");
    let delta = diff(&active_set(["ML_GND"]), &ActiveSet::new());

    let messages = dispatch(&delta, &registry, &MessageFormat::default());
    assert_eq!(
        messages,
        vec![
            OutboundMessage::Broadcast {
                text: ":red_circle: ML_GND has just logged **OFF**!".to_string()
            },
            OutboundMessage::Mention {
                user: "u1".to_string(),
                text: "<@u1> ML_GND is now OFFLINE".to_string()
            },
        ]
    );
}

#[test]
fn test_dispatch_tags_role_on_broadcasts() {
    let registry = SubscriptionRegistry::new();
    let delta = diff(&ActiveSet::new(), &active_set(["ML_GND"]));

    let messages = dispatch(&delta, &registry, &MessageFormat::new(Some(1445293106403737650)));
    assert_eq!(
        messages[0].text(),
        ":green_circle: ML_GND has just logged **ON**! <@&1445293106403737650>"
    );
}

#[test]
fn test_dispatch_broadcast_precedes_mentions_per_callsign() {
    let mut registry = SubscriptionRegistry::new();
    registry.subscribe("u2", "ML_GND");
    registry.subscribe("u1", "ML_GND");
    registry.subscribe("u1", "SY_GND");
    registry.subscribe("u3", "ML_TWR");

    let delta = diff(
        &active_set(["ML_TWR"]),
        &active_set(["ML_GND", "SY_GND"]),
    );
    let messages = dispatch(&delta, &registry, &MessageFormat::default());
    let texts: Vec<&str> = messages.iter().map(|m| m.text()).collect();

    assert_eq!(
        texts,
        vec![
            ":green_circle: ML_GND has just logged **ON**!",
            "<@u1> ML_GND is now ONLINE",
            "<@u2> ML_GND is now ONLINE",
            ":green_circle: SY_GND has just logged **ON**!",
            "<@u1> SY_GND is now ONLINE",
            ":red_circle: ML_TWR has just logged **OFF**!",
            "<@u3> ML_TWR is now OFFLINE",
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dispatch_sees_whole_subscriptions_while_users_subscribe() {
    const WRITERS: usize = 4;
    const PER_WRITER: usize = 50;

    let shared = SubscriptionRegistry::shared();
    let delta = diff(&ActiveSet::new(), &active_set(["ML_GND"]));

    let mut writers = Vec::new();
    for w in 0..WRITERS {
        let shared = shared.clone();
        writers.push(tokio::spawn(async move {
            for i in 0..PER_WRITER {
                registry::lock(&shared).subscribe(&format!("w{w}-{i:03}"), "ML_GND");
                tokio::task::yield_now().await;
            }
        }));
    }

    let reader = {
        let shared = shared.clone();
        let delta = delta.clone();
        tokio::spawn(async move {
            let mut last_seen = 0;
            for _ in 0..100 {
                let messages = dispatch(&delta, &registry::lock(&shared), &MessageFormat::default());
                assert!(messages[0].user().is_none());
                let mentioned: Vec<&str> = messages[1..]
                    .iter()
                    .map(|m| m.user().expect("mention"))
                    .collect();
                assert!(mentioned.windows(2).all(|pair| pair[0] < pair[1]));
                assert!(mentioned.len() >= last_seen);
                last_seen = mentioned.len();
                tokio::task::yield_now().await;
            }
        })
    };

    for writer in writers {
        writer.await.unwrap();
    }
    reader.await.unwrap();

    let messages = dispatch(&delta, &registry::lock(&shared), &MessageFormat::default());
    assert_eq!(messages.len(), 1 + WRITERS * PER_WRITER);
}

// --- poll loop ---

/// Source that takes longer than the poll period and counts overlapping fetches.
#[derive(Default)]
struct SlowSource {
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

#[async_trait]
impl SnapshotSource for SlowSource {
    fn name(&self) -> &str {
        "slow"
    }

    async fn fetch(&self) -> Result<ActiveSet, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(75)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(active_set(["ML_GND"]))
    }
}

fn poll_loop(
    script: Vec<Result<ActiveSet, crate::utils::error::FetchError>>,
    registry: SharedRegistry,
) -> (PollLoop, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let poll = PollLoop::new(
        Arc::new(ScriptedSource::new(script)),
        notifier.clone(),
        registry,
        MessageFormat::default(),
    );
    (poll, notifier)
}

#[tokio::test]
async fn test_poll_first_cycle_reports_everything_online() {
    let (mut poll, notifier) = poll_loop(
        vec![Ok(active_set(["ML_GND", "SY_GND"]))],
        SubscriptionRegistry::shared(),
    );

    let outcome = poll.run_cycle().await;
    assert!(matches!(outcome, CycleOutcome::Completed { .. }));
    assert_eq!(notifier.messages().len(), 2);
    assert_eq!(poll.state().previous(), &active_set(["ML_GND", "SY_GND"]));
}

#[tokio::test]
async fn test_poll_fetch_failure_keeps_state() {
    let (poll, notifier) = poll_loop(
        vec![Err(status_error(502))],
        SubscriptionRegistry::shared(),
    );
    let mut poll = poll.with_state(PollState::with_previous(active_set(["ML_GND"])));

    let outcome = poll.run_cycle().await;
    assert_eq!(outcome, CycleOutcome::FetchFailed);
    assert_eq!(poll.state().previous(), &active_set(["ML_GND"]));
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_poll_identical_cycles_send_nothing_the_second_time() {
    let (mut poll, notifier) = poll_loop(
        vec![Ok(active_set(["ML_GND"])), Ok(active_set(["ML_GND"]))],
        SubscriptionRegistry::shared(),
    );

    poll.run_cycle().await;
    let sent_after_first = notifier.messages().len();
    let outcome = poll.run_cycle().await;

    assert_eq!(sent_after_first, 1);
    assert_eq!(notifier.messages().len(), 1);
    assert_eq!(
        outcome,
        CycleOutcome::Completed {
            delta: Delta::default(),
            report: DeliveryReport::default(),
        }
    );
}

#[tokio::test]
async fn test_poll_failure_between_cycles_is_not_a_logoff() {
    let (mut poll, notifier) = poll_loop(
        vec![
            Ok(active_set(["ML_GND"])),
            Err(status_error(500)),
            Ok(active_set(["ML_GND"])),
        ],
        SubscriptionRegistry::shared(),
    );

    poll.run_cycle().await;
    poll.run_cycle().await;
    poll.run_cycle().await;

    let texts: Vec<String> = notifier.messages().iter().map(|m| m.text().to_string()).collect();
    assert_eq!(texts, vec![":green_circle: ML_GND has just logged **ON**!"]);
}

#[tokio::test]
async fn test_poll_mentions_subscribers_on_logoff() {
    let registry = SubscriptionRegistry::shared();
    registry::lock(&registry).subscribe("u1", "ml_gnd");

    let (poll, notifier) = poll_loop(vec![Ok(ActiveSet::new())], registry);
    let mut poll = poll.with_state(PollState::with_previous(active_set(["ML_GND"])));

    poll.run_cycle().await;

    let messages = notifier.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].text().contains("ML_GND has just logged **OFF**"));
    assert_eq!(messages[1].user(), Some("u1"));
    assert!(messages[1].text().contains("now OFFLINE"));
    assert!(poll.state().previous().is_empty());
}

#[tokio::test]
async fn test_poll_state_advances_even_when_delivery_fails() {
    let registry = SubscriptionRegistry::shared();
    registry::lock(&registry).subscribe("u1", "ML_GND");
    let notifier = Arc::new(RecordingNotifier::failing_mentions());
    let mut poll = PollLoop::new(
        Arc::new(ScriptedSource::new(vec![Ok(active_set(["ML_GND"]))])),
        notifier.clone(),
        registry,
        MessageFormat::default(),
    );

    let outcome = poll.run_cycle().await;
    match outcome {
        CycleOutcome::Completed { report, .. } => {
            assert_eq!(report, DeliveryReport { delivered: 1, failed: 1 });
        }
        other => panic!("Expected Completed, got {other:?}"),
    }
    assert_eq!(poll.state().previous(), &active_set(["ML_GND"]));
}

#[tokio::test(start_paused = true)]
async fn test_poll_loop_runs_until_shutdown() {
    let (poll, notifier) = poll_loop(
        vec![Ok(active_set(["ML_GND"])), Ok(active_set(["SY_GND"]))],
        SubscriptionRegistry::shared(),
    );

    let handle = poll.spawn(Duration::from_secs(30));
    // First tick fires immediately, the second after one period.
    tokio::time::sleep(Duration::from_secs(45)).await;
    let state = handle.shutdown().await.expect("poll task");

    assert_eq!(state.previous(), &active_set(["SY_GND"]));
    let texts: Vec<String> = notifier.messages().iter().map(|m| m.text().to_string()).collect();
    assert_eq!(
        texts,
        vec![
            ":green_circle: ML_GND has just logged **ON**!",
            ":green_circle: SY_GND has just logged **ON**!",
            ":red_circle: ML_GND has just logged **OFF**!",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_poll_loop_never_overlaps_slow_cycles() {
    let source = Arc::new(SlowSource::default());
    let poll = PollLoop::new(
        source.clone(),
        Arc::new(RecordingNotifier::new()),
        SubscriptionRegistry::shared(),
        MessageFormat::default(),
    );

    let handle = poll.spawn(Duration::from_secs(30));
    tokio::time::sleep(Duration::from_secs(400)).await;
    handle.shutdown().await.expect("poll task");

    assert_eq!(source.peak_in_flight.load(Ordering::SeqCst), 1);
    // Late ticks are delayed, so cycles run back to back every 75s.
    let fetches = source.fetches.load(Ordering::SeqCst);
    assert!((5..=6).contains(&fetches), "fetches = {fetches}");
}
