//! Fuzz target for the relay under storage failures
//!
//! Drives arbitrary register/upload/lookup sequences through a relay backed
//! by ChaoticStorage and checks the result against a model of what succeeded.
//!
//! # Strategy
//!
//! - Variable failure rates (0% to 90%)
//! - Handles drawn from a small pool, including prefix-sharing names
//! - Clock steps of zero so uploads share timestamps
//!
//! # Invariants
//!
//! - The relay NEVER panics on storage errors
//! - A successful registration is never overwritten
//! - Every successful upload is listed exactly once in its recipient's inbox
//! - Every inbox entry resolves to an envelope
//! - Inbox listings are sorted by (timestamp, id)

#![no_main]

use std::collections::HashMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealdrop_core::{EnvelopeBody, EnvelopeId};
use sealdrop_harness::SimEnv;
use sealdrop_server::{ChaoticStorage, MemoryStorage, Relay, RelayConfig, RelayError};

const HANDLES: [&str; 5] = ["neo", "neon", "trinity", "", "n"];

#[derive(Debug, Clone, Arbitrary)]
struct ChaosScenario {
    /// Seed for ChaoticStorage and SimEnv
    seed: u64,
    /// Failure rate 0-9 maps to 0%-90%
    failure_rate_tenth: u8,
    /// Reject uploads to unknown recipients
    require_known_recipient: bool,
    /// Sequence of operations to perform
    operations: Vec<RelayOperation>,
}

#[derive(Debug, Clone, Arbitrary)]
enum RelayOperation {
    Register { handle: u8, public_key: String },
    Upload { sender: u8, recipient: u8, file_name: String, clock_step: u8 },
    GetPublicKey { handle: u8 },
    ListInbox { handle: u8 },
    GetEnvelope { upload: u8 },
}

fn handle(idx: u8) -> &'static str {
    HANDLES[idx as usize % HANDLES.len()]
}

fuzz_target!(|scenario: ChaosScenario| {
    let failure_rate = (scenario.failure_rate_tenth % 10) as f64 / 10.0;
    let config = RelayConfig { require_known_recipient: scenario.require_known_recipient };

    let env = SimEnv::with_seed(scenario.seed);
    let inner = MemoryStorage::new();
    let storage = ChaoticStorage::with_seed(inner.clone(), failure_rate, scenario.seed);
    let relay = Relay::new(env.clone(), storage, config);
    let oracle = Relay::new(env.clone(), inner, config);

    let mut keys: HashMap<&str, String> = HashMap::new();
    let mut uploads: Vec<(&str, EnvelopeId)> = Vec::new();

    for op in scenario.operations.into_iter().take(64) {
        match op {
            RelayOperation::Register { handle: idx, public_key } => {
                let name = handle(idx);
                match relay.register(name, &public_key, None) {
                    Ok(()) => {
                        assert!(!keys.contains_key(name), "handle {name:?} registered twice");
                        keys.insert(name, public_key);
                    }
                    Err(RelayError::Conflict(_)) => assert!(keys.contains_key(name)),
                    Err(RelayError::InvalidInput(_)) => {
                        assert!(name.is_empty() || public_key.is_empty())
                    }
                    Err(e) => assert!(!e.is_client_error(), "unexpected {e:?}"),
                }
            }
            RelayOperation::Upload { sender, recipient, file_name, clock_step } => {
                env.advance_millis(u64::from(clock_step % 4));
                let body: EnvelopeBody = [
                    (EnvelopeBody::SENDER, handle(sender).to_string()),
                    (EnvelopeBody::RECIPIENT, handle(recipient).to_string()),
                    (EnvelopeBody::FILE_NAME, file_name),
                ]
                .into_iter()
                .collect();
                match relay.upload_envelope(&body) {
                    Ok(id) => uploads.push((handle(recipient), id)),
                    Err(RelayError::NotFound { .. }) => assert!(config.require_known_recipient),
                    Err(e) => assert!(!e.is_client_error(), "unexpected {e:?}"),
                }
            }
            RelayOperation::GetPublicKey { handle: idx } => {
                if let Ok(pk) = relay.get_public_key(handle(idx)) {
                    assert_eq!(Some(&pk), keys.get(handle(idx)));
                }
            }
            RelayOperation::ListInbox { handle: idx } => {
                let _ = relay.list_inbox(handle(idx));
            }
            RelayOperation::GetEnvelope { upload } => {
                if let Some((_, id)) = uploads.get(upload as usize) {
                    if let Ok(envelope) = relay.get_envelope(*id) {
                        assert_eq!(envelope.id, *id);
                    }
                }
            }
        }
    }

    // Model check against the inner storage, without injected failures
    for (name, pk) in &keys {
        assert_eq!(oracle.get_public_key(name).ok().as_ref(), Some(pk));
    }

    for name in HANDLES {
        let inbox = oracle.list_inbox(name).expect("clean list failed");

        for pair in inbox.windows(2) {
            assert!((pair[0].timestamp, pair[0].id) <= (pair[1].timestamp, pair[1].id));
        }
        for entry in &inbox {
            oracle.get_envelope(entry.id).expect("inbox entry without envelope");
        }

        let expected = uploads.iter().filter(|(r, _)| *r == name).count();
        assert_eq!(inbox.len(), expected, "inbox of {name:?}");
    }
});
