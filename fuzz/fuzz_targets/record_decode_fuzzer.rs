//! Fuzz target for decoding stored records
//!
//! Plants arbitrary bytes directly in storage, bypassing the relay's writers,
//! then reads them back through the relay.
//!
//! # Strategy
//!
//! - Random bytes as envelope bodies, inbox entries and public keys
//! - Truncated and bit-flipped copies of valid records
//! - Random inbox keys that may or may not land in a recipient's partition
//!
//! # Invariants
//!
//! - Corrupt records surface as storage errors, NEVER panics
//! - A corrupt record is never reported as a client error

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealdrop_core::{EnvelopeBody, EnvelopeId};
use sealdrop_harness::SimEnv;
use sealdrop_server::{MemoryStorage, Namespace, Relay, RelayConfig, Storage};

#[derive(Debug, Clone, Arbitrary)]
enum Corruption {
    /// Replace a stored record with random bytes
    Replace { bytes: Vec<u8> },
    /// Keep a prefix of the stored record
    Truncate { keep: u16 },
    /// Flip one bit of the stored record
    FlipBit { position: u16 },
}

#[derive(Debug, Clone, Arbitrary)]
struct DecodeScenario {
    seed: u64,
    file_name: String,
    envelope: Corruption,
    inbox: Corruption,
    public_key: Vec<u8>,
    backup: Vec<u8>,
    /// Extra raw inbox record under an arbitrary key
    stray_key: Vec<u8>,
    stray_value: Vec<u8>,
}

fn corrupt(original: Vec<u8>, corruption: &Corruption) -> Vec<u8> {
    match corruption {
        Corruption::Replace { bytes } => bytes.clone(),
        Corruption::Truncate { keep } => {
            original[..(*keep as usize).min(original.len())].to_vec()
        }
        Corruption::FlipBit { position } => {
            let mut bytes = original;
            if !bytes.is_empty() {
                let bit = *position as usize % (bytes.len() * 8);
                bytes[bit / 8] ^= 1 << (bit % 8);
            }
            bytes
        }
    }
}

fuzz_target!(|scenario: DecodeScenario| {
    let storage = MemoryStorage::new();
    let relay = Relay::new(SimEnv::with_seed(scenario.seed), storage.clone(), RelayConfig::default());

    let body: EnvelopeBody = [
        (EnvelopeBody::SENDER, "neo".to_string()),
        (EnvelopeBody::RECIPIENT, "trinity".to_string()),
        (EnvelopeBody::FILE_NAME, scenario.file_name),
    ]
    .into_iter()
    .collect();
    let Ok(id) = relay.upload_envelope(&body) else {
        return;
    };

    let (inbox_key, inbox_value) = storage
        .scan_prefix(Namespace::Inbox, b"")
        .expect("scan failed")
        .into_iter()
        .next()
        .expect("upload left no inbox entry");
    let envelope_value = storage
        .get(Namespace::Envelopes, id.as_bytes())
        .expect("get failed")
        .expect("upload left no envelope");

    let planted = [
        (Namespace::Envelopes, id.as_bytes().to_vec(), corrupt(envelope_value, &scenario.envelope)),
        (Namespace::Inbox, inbox_key, corrupt(inbox_value, &scenario.inbox)),
        (Namespace::PublicKeys, b"neo".to_vec(), scenario.public_key),
        (Namespace::PrivateKeyBackups, b"neo".to_vec(), scenario.backup),
        (Namespace::Inbox, scenario.stray_key, scenario.stray_value),
    ];
    for (ns, key, value) in planted {
        storage.put(ns, &key, &value).expect("put failed");
    }

    // Reads either decode or fail with a storage error
    if let Err(e) = relay.get_envelope(id) {
        assert!(!e.is_client_error(), "corrupt envelope reported as {e:?}");
    }
    if let Err(e) = relay.list_inbox("trinity") {
        assert!(!e.is_client_error(), "corrupt inbox reported as {e:?}");
    }
    if let Err(e) = relay.get_public_key("neo") {
        assert!(!e.is_client_error(), "corrupt public key reported as {e:?}");
    }
    if let Err(e) = relay.get_encrypted_private_key("neo") {
        assert!(!e.is_client_error(), "corrupt backup reported as {e:?}");
    }
    let _ = relay.list_keys();

    // An unrelated id is still cleanly absent
    let other = EnvelopeId::generate(&SimEnv::with_seed(scenario.seed.wrapping_add(1)));
    if other != id {
        assert!(relay.get_envelope(other).is_err_and(|e| e.is_client_error()));
    }
});
