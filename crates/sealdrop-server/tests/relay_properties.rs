//! Property-based tests for relay operations.
//!
//! These verify the relay's invariants for arbitrary handles, keys and upload
//! schedules:
//! - A registered handle always returns the key it was registered with
//! - Registration is first-writer-wins, also under concurrency
//! - Every upload appears exactly once in its recipient's inbox, sorted by time
//! - Recipients never see each other's entries

use std::{collections::HashSet, sync::Barrier, thread};

use proptest::prelude::*;
use sealdrop_core::EnvelopeBody;
use sealdrop_harness::SimEnv;
use sealdrop_server::{MemoryStorage, Relay, RelayConfig, RelayError};

fn relay(seed: u64) -> Relay<SimEnv, MemoryStorage> {
    Relay::new(SimEnv::with_seed(seed), MemoryStorage::new(), RelayConfig::default())
}

fn upload_to(recipient: &str, n: usize) -> EnvelopeBody {
    [
        (EnvelopeBody::SENDER, "neo".to_string()),
        (EnvelopeBody::RECIPIENT, recipient.to_string()),
        (EnvelopeBody::FILE_NAME, format!("file-{n}")),
    ]
    .into_iter()
    .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: a registered handle returns the key it was registered with
    #[test]
    fn prop_registered_key_is_returned(
        handle in "[a-zA-Z0-9_.@-]{1,32}",
        public_key in "[A-Za-z0-9+/=]{1,128}"
    ) {
        let relay = relay(1);

        relay.register(&handle, &public_key, None)?;

        prop_assert_eq!(relay.get_public_key(&handle)?, public_key);
    }

    /// Property: a second registration of a handle always conflicts
    #[test]
    fn prop_second_registration_conflicts(
        handle in "\\PC{1,24}",
        first in "\\PC{1,64}",
        second in "\\PC{1,64}"
    ) {
        let relay = relay(2);

        relay.register(&handle, &first, None)?;
        let result = relay.register(&handle, &second, None);

        prop_assert_eq!(result, Err(RelayError::Conflict(handle.clone())));
        prop_assert_eq!(relay.get_public_key(&handle)?, first);
    }

    /// Property: every upload is listed once, in (timestamp, id) order
    #[test]
    fn prop_every_upload_listed_once_in_order(
        seed in any::<u64>(),
        // Clock steps, including zero (same-millisecond uploads)
        steps in prop::collection::vec(0u64..50, 1..40),
        recipients in prop::collection::vec(prop::sample::select(vec!["a", "ab", "b"]), 40)
    ) {
        let env = SimEnv::with_seed(seed);
        let relay = Relay::new(env.clone(), MemoryStorage::new(), RelayConfig::default());

        let mut expected: Vec<(&str, _)> = Vec::new();
        for (n, step) in steps.iter().enumerate() {
            env.advance_millis(*step);
            let recipient = recipients[n];
            let id = relay.upload_envelope(&upload_to(recipient, n))?;
            expected.push((recipient, id));
        }

        let mut seen = HashSet::new();
        for recipient in ["a", "ab", "b"] {
            let inbox = relay.list_inbox(recipient)?;

            // ORACLE: sorted by (timestamp, id)
            for pair in inbox.windows(2) {
                prop_assert!((pair[0].timestamp, pair[0].id) <= (pair[1].timestamp, pair[1].id));
            }

            let wanted: HashSet<_> =
                expected.iter().filter(|(r, _)| *r == recipient).map(|(_, id)| *id).collect();
            let listed: HashSet<_> = inbox.iter().map(|e| e.id).collect();
            prop_assert_eq!(inbox.len(), listed.len());
            prop_assert_eq!(&listed, &wanted);

            seen.extend(listed);
        }

        prop_assert_eq!(seen.len(), steps.len());
    }
}

#[test]
fn concurrent_registration_has_single_winner() {
    const THREADS: usize = 8;

    for round in 0..20u64 {
        let relay = relay(round);
        let barrier = Barrier::new(THREADS);

        let results: Vec<Result<(), RelayError>> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|t| {
                    let relay = relay.clone();
                    let barrier = &barrier;
                    s.spawn(move || {
                        barrier.wait();
                        relay.register("neo", &format!("PK{t}"), None)
                    })
                })
                .collect();

            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<usize> =
            results.iter().enumerate().filter(|(_, r)| r.is_ok()).map(|(t, _)| t).collect();
        assert_eq!(winners.len(), 1, "round {round}: {results:?}");

        for result in &results {
            if let Err(e) = result {
                assert_eq!(e, &RelayError::Conflict("neo".into()));
            }
        }

        assert_eq!(relay.get_public_key("neo").unwrap(), format!("PK{}", winners[0]));
    }
}

#[test]
fn concurrent_uploads_all_listed() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 25;

    let relay = relay(9);

    let ids: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let relay = relay.clone();
                s.spawn(move || {
                    (0..PER_THREAD)
                        .map(|n| relay.upload_envelope(&upload_to("trinity", t * 100 + n)).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    });

    let listed: HashSet<_> =
        relay.list_inbox("trinity").unwrap().into_iter().map(|e| e.id).collect();
    assert_eq!(listed.len(), THREADS * PER_THREAD);
    assert_eq!(listed, ids.into_iter().collect::<HashSet<_>>());
}
