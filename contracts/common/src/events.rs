//! Pool Events
//!
//! Every successful pool operation emits one event. Events are the pool's
//! audit trail and can be indexed off-chain. Failed calls emit nothing.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{Address, Price, RoundId, Timestamp};
use crate::Vec;

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Ledger Events (0x01 - 0x1F)
    Contributed = 0x01,
    Withdrawn = 0x02,

    // Settlement Events (0x20 - 0x3F)
    Listed = 0x20,
    Settled = 0x21,

    // Distribution Events (0x40 - 0x5F)
    Claimed = 0x40,
}

/// Main event enum containing all pool events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PoolEvent {
    /// Emitted when a contributor adds funds
    Contributed {
        contributor: Address,
        asset1_amount: u64,
        asset2_amount: u64,
        asset1_total: u64,
        asset2_total: u64,
        timestamp: Timestamp,
    },

    /// Emitted when a contributor takes a full refund before listing
    Withdrawn {
        contributor: Address,
        asset1_amount: u64,
        asset2_amount: u64,
        asset1_total: u64,
        asset2_total: u64,
        timestamp: Timestamp,
    },

    /// Emitted when pooled funds are posted to the exchange
    Listed {
        caller: Address,
        round: RoundId,
        asset1_sold: u64,
        asset2_sold: u64,
        reference_price: Price,
        timestamp: Timestamp,
    },

    /// Emitted when proceeds are pulled back from the exchange
    Settled {
        caller: Address,
        round: RoundId,
        asset1_proceeds: u64,
        asset2_proceeds: u64,
        timestamp: Timestamp,
    },

    /// Emitted when a contributor claims their share
    Claimed {
        contributor: Address,
        asset1_paid: u64,
        asset2_paid: u64,
        timestamp: Timestamp,
    },
}

impl PoolEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Contributed { .. } => EventType::Contributed,
            Self::Withdrawn { .. } => EventType::Withdrawn,
            Self::Listed { .. } => EventType::Listed,
            Self::Settled { .. } => EventType::Settled,
            Self::Claimed { .. } => EventType::Claimed,
        }
    }

    /// Get the time the event occurred
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Contributed { timestamp, .. }
            | Self::Withdrawn { timestamp, .. }
            | Self::Listed { timestamp, .. }
            | Self::Settled { timestamp, .. }
            | Self::Claimed { timestamp, .. } => *timestamp,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log collecting events across calls
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<PoolEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: PoolEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<PoolEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&PoolEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = PoolEvent::Listed {
            caller: [1u8; 32],
            round: 3,
            asset1_sold: 100,
            asset2_sold: 0,
            reference_price: Price::new(1, 1),
            timestamp: 1_000,
        };

        assert_eq!(event.event_type(), EventType::Listed);
        assert_eq!(event.timestamp(), 1_000);
    }

    #[test]
    fn test_event_serialization() {
        let event = PoolEvent::Claimed {
            contributor: [2u8; 32],
            asset1_paid: 0,
            asset2_paid: 200,
            timestamp: 2_000,
        };

        let bytes = event.to_bytes();
        let restored = PoolEvent::from_bytes(&bytes).unwrap();

        assert_eq!(event, restored);
    }

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();

        log.emit(PoolEvent::Contributed {
            contributor: [2u8; 32],
            asset1_amount: 100,
            asset2_amount: 0,
            asset1_total: 100,
            asset2_total: 0,
            timestamp: 10,
        });
        log.emit(PoolEvent::Withdrawn {
            contributor: [2u8; 32],
            asset1_amount: 100,
            asset2_amount: 0,
            asset1_total: 0,
            asset2_total: 0,
            timestamp: 11,
        });

        assert_eq!(log.len(), 2);
        assert!(!log.is_empty());
        assert_eq!(log.filter_by_type(EventType::Withdrawn).len(), 1);

        log.clear();
        assert!(log.is_empty());
    }
}
