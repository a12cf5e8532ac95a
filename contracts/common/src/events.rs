//! Protocol Events
//!
//! Events are collected during execution and can be indexed off-chain for
//! observability. They carry no behaviour: a rejected operation emits
//! nothing and surfaces an error instead.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::access_control::Role;
use crate::emergency::RedeemPausePolicy;
use crate::types::Address;

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Swap Events (0x01 - 0x1F)
    Mint = 0x01,
    Redeem = 0x02,
    AllocateSurplus = 0x03,
    WithdrawReserve = 0x04,

    // Pause Events (0x20 - 0x3F)
    Paused = 0x20,
    Unpaused = 0x21,
    RedemptionsPaused = 0x22,
    RedemptionsUnpaused = 0x23,
    RedeemPausePolicyUpdate = 0x24,

    // Parameter Events (0x40 - 0x5F)
    MintFeeUpdate = 0x40,
    RedeemFeeUpdate = 0x41,
    MaxFeeUpdate = 0x42,
    ReservesThresholdUpdate = 0x43,
    SurplusTargetUpdate = 0x44,
    OracleFloorUpdate = 0x45,
    OracleCeilingUpdate = 0x46,

    // Rate Limit Events (0x60 - 0x7F)
    BufferUsed = 0x60,
    BufferReplenished = 0x61,
    BufferCapUpdate = 0x62,
    RateLimitPerSecondUpdate = 0x63,

    // Oracle Events (0x80 - 0x9F)
    OracleUpdate = 0x80,
    BackupOracleUpdate = 0x81,
    InvertUpdate = 0x82,
    DecimalsNormalizerUpdate = 0x83,

    // Access Events (0xA0 - 0xBF)
    RoleGranted = 0xA0,
    RoleRevoked = 0xA1,

    // Token Events (0xC0 - 0xDF)
    TokenTransfer = 0xC0,
    TokenMint = 0xC1,
    TokenBurn = 0xC2,
    Approval = 0xC3,
    MinterGranted = 0xC4,
    MinterRevoked = 0xC5,
}

/// Main event enum containing all possible events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PegEvent {
    // ============ Swap Events ============

    /// Reserve asset swapped into the token
    Mint {
        caller: Address,
        to: Address,
        amount_in: u128,
        amount_out: u128,
        timestamp: u64,
    },

    /// Token swapped back into the reserve asset
    Redeem {
        caller: Address,
        to: Address,
        amount_in: u128,
        amount_out: u128,
        timestamp: u64,
    },

    /// Reserve surplus swept to the PCV deposit
    AllocateSurplus {
        caller: Address,
        target: Address,
        amount: u128,
        timestamp: u64,
    },

    /// Reserve moved out by the PCV controller
    WithdrawReserve {
        caller: Address,
        to: Address,
        amount: u128,
        timestamp: u64,
    },

    // ============ Pause Events ============

    Paused { by: Address, timestamp: u64 },

    Unpaused { by: Address, timestamp: u64 },

    RedemptionsPaused { by: Address, timestamp: u64 },

    RedemptionsUnpaused { by: Address, timestamp: u64 },

    RedeemPausePolicyUpdate {
        old_policy: RedeemPausePolicy,
        new_policy: RedeemPausePolicy,
        timestamp: u64,
    },

    // ============ Parameter Events ============

    MintFeeUpdate { old_fee_bps: u64, new_fee_bps: u64, timestamp: u64 },

    RedeemFeeUpdate { old_fee_bps: u64, new_fee_bps: u64, timestamp: u64 },

    MaxFeeUpdate { old_max_fee_bps: u64, new_max_fee_bps: u64, timestamp: u64 },

    ReservesThresholdUpdate { old_threshold: u128, new_threshold: u128, timestamp: u64 },

    SurplusTargetUpdate { old_target: Address, new_target: Address, timestamp: u64 },

    OracleFloorUpdate { old_floor_bps: u64, new_floor_bps: u64, timestamp: u64 },

    OracleCeilingUpdate { old_ceiling_bps: u64, new_ceiling_bps: u64, timestamp: u64 },

    // ============ Rate Limit Events ============

    /// Minting capacity consumed
    BufferUsed { amount_used: u128, buffer_remaining: u128, timestamp: u64 },

    /// Minting capacity returned by a burn
    BufferReplenished { amount: u128, buffer_remaining: u128, timestamp: u64 },

    BufferCapUpdate { old_cap: u128, new_cap: u128, timestamp: u64 },

    RateLimitPerSecondUpdate { old_rate: u128, new_rate: u128, timestamp: u64 },

    // ============ Oracle Events ============

    OracleUpdate { old_oracle: Address, new_oracle: Address, timestamp: u64 },

    BackupOracleUpdate {
        old_oracle: Option<Address>,
        new_oracle: Option<Address>,
        timestamp: u64,
    },

    InvertUpdate { old_do_invert: bool, new_do_invert: bool, timestamp: u64 },

    DecimalsNormalizerUpdate { old_normalizer: i32, new_normalizer: i32, timestamp: u64 },

    // ============ Access Events ============

    RoleGranted { role: Role, account: Address, by: Address, timestamp: u64 },

    RoleRevoked { role: Role, account: Address, by: Address, timestamp: u64 },

    // ============ Token Events ============
    // The token ledger has no clock; these carry no timestamp.

    TokenTransfer { asset: Address, from: Address, to: Address, amount: u128 },

    TokenMint { asset: Address, to: Address, amount: u128, new_total_supply: u128 },

    TokenBurn { asset: Address, from: Address, amount: u128, new_total_supply: u128 },

    Approval { asset: Address, owner: Address, spender: Address, amount: u128 },

    MinterGranted { asset: Address, minter: Address },

    MinterRevoked { asset: Address, minter: Address },
}

impl PegEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Mint { .. } => EventType::Mint,
            Self::Redeem { .. } => EventType::Redeem,
            Self::AllocateSurplus { .. } => EventType::AllocateSurplus,
            Self::WithdrawReserve { .. } => EventType::WithdrawReserve,
            Self::Paused { .. } => EventType::Paused,
            Self::Unpaused { .. } => EventType::Unpaused,
            Self::RedemptionsPaused { .. } => EventType::RedemptionsPaused,
            Self::RedemptionsUnpaused { .. } => EventType::RedemptionsUnpaused,
            Self::RedeemPausePolicyUpdate { .. } => EventType::RedeemPausePolicyUpdate,
            Self::MintFeeUpdate { .. } => EventType::MintFeeUpdate,
            Self::RedeemFeeUpdate { .. } => EventType::RedeemFeeUpdate,
            Self::MaxFeeUpdate { .. } => EventType::MaxFeeUpdate,
            Self::ReservesThresholdUpdate { .. } => EventType::ReservesThresholdUpdate,
            Self::SurplusTargetUpdate { .. } => EventType::SurplusTargetUpdate,
            Self::OracleFloorUpdate { .. } => EventType::OracleFloorUpdate,
            Self::OracleCeilingUpdate { .. } => EventType::OracleCeilingUpdate,
            Self::BufferUsed { .. } => EventType::BufferUsed,
            Self::BufferReplenished { .. } => EventType::BufferReplenished,
            Self::BufferCapUpdate { .. } => EventType::BufferCapUpdate,
            Self::RateLimitPerSecondUpdate { .. } => EventType::RateLimitPerSecondUpdate,
            Self::OracleUpdate { .. } => EventType::OracleUpdate,
            Self::BackupOracleUpdate { .. } => EventType::BackupOracleUpdate,
            Self::InvertUpdate { .. } => EventType::InvertUpdate,
            Self::DecimalsNormalizerUpdate { .. } => EventType::DecimalsNormalizerUpdate,
            Self::RoleGranted { .. } => EventType::RoleGranted,
            Self::RoleRevoked { .. } => EventType::RoleRevoked,
            Self::TokenTransfer { .. } => EventType::TokenTransfer,
            Self::TokenMint { .. } => EventType::TokenMint,
            Self::TokenBurn { .. } => EventType::TokenBurn,
            Self::Approval { .. } => EventType::Approval,
            Self::MinterGranted { .. } => EventType::MinterGranted,
            Self::MinterRevoked { .. } => EventType::MinterRevoked,
        }
    }

    /// Get the host timestamp when the event occurred, if it carries one
    pub fn timestamp(&self) -> Option<u64> {
        match self {
            Self::Mint { timestamp, .. }
            | Self::Redeem { timestamp, .. }
            | Self::AllocateSurplus { timestamp, .. }
            | Self::WithdrawReserve { timestamp, .. }
            | Self::Paused { timestamp, .. }
            | Self::Unpaused { timestamp, .. }
            | Self::RedemptionsPaused { timestamp, .. }
            | Self::RedemptionsUnpaused { timestamp, .. }
            | Self::RedeemPausePolicyUpdate { timestamp, .. }
            | Self::MintFeeUpdate { timestamp, .. }
            | Self::RedeemFeeUpdate { timestamp, .. }
            | Self::MaxFeeUpdate { timestamp, .. }
            | Self::ReservesThresholdUpdate { timestamp, .. }
            | Self::SurplusTargetUpdate { timestamp, .. }
            | Self::OracleFloorUpdate { timestamp, .. }
            | Self::OracleCeilingUpdate { timestamp, .. }
            | Self::BufferUsed { timestamp, .. }
            | Self::BufferReplenished { timestamp, .. }
            | Self::BufferCapUpdate { timestamp, .. }
            | Self::RateLimitPerSecondUpdate { timestamp, .. }
            | Self::OracleUpdate { timestamp, .. }
            | Self::BackupOracleUpdate { timestamp, .. }
            | Self::InvertUpdate { timestamp, .. }
            | Self::DecimalsNormalizerUpdate { timestamp, .. }
            | Self::RoleGranted { timestamp, .. }
            | Self::RoleRevoked { timestamp, .. } => Some(*timestamp),
            Self::TokenTransfer { .. }
            | Self::TokenMint { .. }
            | Self::TokenBurn { .. }
            | Self::Approval { .. }
            | Self::MinterGranted { .. }
            | Self::MinterRevoked { .. } => None,
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

/// Event log for collecting multiple events during execution
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<PegEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: PegEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[PegEvent] {
        &self.events
    }

    /// Take all events, leaving the log empty
    pub fn drain(&mut self) -> Vec<PegEvent> {
        std::mem::take(&mut self.events)
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<PegEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&PegEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<&PegEvent> {
        self.events.last()
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
