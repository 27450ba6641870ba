//! # Vault Events
//!
//! The audit trail. Every state change the vault commits is recorded as a
//! [`VaultEvent`], wrapped in an [`EventRecord`] carrying a global sequence
//! number, the id of the call that produced it, and a UTC timestamp.
//!
//! Events are staged while a call executes and appended only when the call
//! commits. A failed call leaves no trace in the log; a batch of ten legs
//! leaves ten records sharing one `tx_id`.

use chrono::{DateTime, Utc};
use gamevault_protocol::ledger::amount_string;
use gamevault_protocol::{Address, Amount, TokenId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Something the vault did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VaultEvent {
    /// An address was (re-)enabled as withdraw admin.
    AdminEnabled {
        /// The admin.
        admin: Address,
    },
    /// An address was revoked as withdraw admin.
    AdminRevoked {
        /// The former admin.
        admin: Address,
    },
    /// A two-phase ownership handoff was proposed.
    OwnershipTransferProposed {
        /// The current owner.
        owner: Address,
        /// The candidate who may claim.
        candidate: Address,
    },
    /// Ownership changed hands.
    OwnershipTransferred {
        /// The previous owner.
        previous: Address,
        /// The new owner (zero if renounced).
        new: Address,
    },
    /// The active risk control strategy was replaced.
    RiskControlStrategyChanged {
        /// Name of the previous strategy, if any.
        previous: Option<String>,
        /// Name of the new strategy, if any.
        current: Option<String>,
    },
    /// Native coin arrived.
    NativeReceived {
        /// The sender.
        from: Address,
        /// Amount received.
        #[serde(with = "amount_string")]
        amount: Amount,
    },
    /// A fungible amount left the vault.
    Withdrawn {
        /// The owner or admin who ordered it.
        operator: Address,
        /// Token address, zero for native.
        asset: Address,
        /// Recipient.
        to: Address,
        /// Amount sent.
        #[serde(with = "amount_string")]
        amount: Amount,
    },
    /// An NFT left the vault.
    NftWithdrawn {
        /// The owner or admin who ordered it.
        operator: Address,
        /// Collection address.
        collection: Address,
        /// Recipient.
        to: Address,
        /// Token released.
        token_id: TokenId,
    },
}

/// A committed event with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the vault's log, starting at 0.
    pub sequence: u64,
    /// Id of the call that emitted this event.
    pub tx_id: Uuid,
    /// When the call committed.
    pub emitted_at: DateTime<Utc>,
    /// The event itself.
    pub event: VaultEvent,
}

/// Append-only event log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the events of one committed call. Returns the number appended.
    pub fn commit(&mut self, tx_id: Uuid, events: Vec<VaultEvent>) -> usize {
        let emitted_at = Utc::now();
        let count = events.len();
        let mut sequence = self.records.len() as u64;
        for event in events {
            self.records.push(EventRecord {
                sequence,
                tx_id,
                emitted_at,
                event,
            });
            sequence += 1;
        }
        count
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `sequence >= from`.
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = (from as usize).min(self.records.len());
        &self.records[start..]
    }

    /// Records emitted by call `tx_id`.
    pub fn for_tx(&self, tx_id: Uuid) -> impl Iterator<Item = &EventRecord> {
        self.records.iter().filter(move |r| r.tx_id == tx_id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
