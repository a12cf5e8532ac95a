//! Error Types for the peg stability core
//!
//! Typed errors with stable codes for logging and indexing. Every error
//! aborts the call that produced it; nothing is retried internally.

use crate::types::Address;

/// Result type alias for peg stability operations
pub type PegResult<T> = Result<T, PegError>;

/// Main error enum for all peg stability errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PegError {
    // ============ Administrative State ============
    /// Engine is globally paused
    #[error("engine is paused")]
    Paused,

    /// Redemptions are paused
    #[error("redemptions are paused")]
    RedeemPaused,

    /// Pause transition not allowed from the current state
    #[error("cannot {transition} while {from}")]
    InvalidStateTransition {
        from: &'static str,
        transition: &'static str,
    },

    // ============ Oracle ============
    /// Neither the primary nor the backup oracle produced a usable price
    #[error("no valid oracle price")]
    PriceInvalid,

    /// Oracle price outside the configured floor/ceiling
    #[error("oracle price {price} outside bounds [{floor}, {ceiling}]")]
    PriceOutOfBounds { price: u128, floor: u128, ceiling: u128 },

    /// Oracle is paused and cannot be refreshed
    #[error("oracle is paused")]
    OraclePaused,

    /// Oracle has been deactivated
    #[error("oracle is inactive")]
    OracleInactive,

    /// Oracle update moved the price too far in one step
    #[error("price move {old_price} -> {new_price} exceeds {max_deviation_bps}bp")]
    OraclePriceDeviation {
        old_price: u128,
        new_price: u128,
        max_deviation_bps: u64,
    },

    // ============ Swap Limits ============
    /// Computed output below the caller's minimum
    #[error("slippage: amount out {amount_out} below minimum {min_amount_out}")]
    SlippageExceeded { amount_out: u128, min_amount_out: u128 },

    /// Minting buffer cannot cover the request
    #[error("rate limit exceeded: requested {requested}, available {available}")]
    RateLimitExceeded { requested: u128, available: u128 },

    /// Engine does not hold enough of the reserve asset
    #[error("insufficient reserves: available {available}, requested {requested}")]
    InsufficientReserves { available: u128, requested: u128 },

    /// No reserve surplus above the threshold
    #[error("no surplus to allocate (surplus {surplus})")]
    NoSurplus { surplus: i128 },

    // ============ Authorization ============
    /// Caller lacks the role required for this operation
    #[error("account {account:?} lacks role {required}")]
    Unauthorized {
        account: Address,
        required: &'static str,
    },

    /// Caller holds no minting grant on the token
    #[error("account {caller:?} is not an authorized minter")]
    MintUnauthorized { caller: Address },

    // ============ Parameters ============
    /// Fee above the governance cap
    #[error("fee {fee_bps}bp exceeds max fee {max_fee_bps}bp")]
    FeeExceedsMax { fee_bps: u64, max_fee_bps: u64 },

    /// Invalid parameter value
    #[error("invalid {param}: {reason}")]
    InvalidParameter {
        param: &'static str,
        reason: &'static str,
    },

    /// Invalid address (e.g., zero address)
    #[error("invalid address: {reason}")]
    InvalidAddress { reason: &'static str },

    // ============ Token Ledger ============
    /// Insufficient balance for a transfer or burn
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: u128, requested: u128 },

    /// Spender allowance too small
    #[error("insufficient allowance: available {available}, requested {requested}")]
    InsufficientAllowance { available: u128, requested: u128 },

    /// Zero amount not allowed
    #[error("zero amount")]
    ZeroAmount,

    // ============ Math ============
    /// Arithmetic overflow occurred
    #[error("arithmetic overflow")]
    Overflow,

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,
}

impl PegError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::Paused => "E100_PAUSED",
            Self::RedeemPaused => "E101_REDEEM_PAUSED",
            Self::InvalidStateTransition { .. } => "E102_INVALID_STATE",
            Self::PriceInvalid => "E030_PRICE_INVALID",
            Self::PriceOutOfBounds { .. } => "E031_PRICE_OUT_OF_BOUNDS",
            Self::OraclePaused => "E032_ORACLE_PAUSED",
            Self::OracleInactive => "E033_ORACLE_INACTIVE",
            Self::OraclePriceDeviation { .. } => "E034_ORACLE_DEVIATION",
            Self::SlippageExceeded { .. } => "E040_SLIPPAGE",
            Self::RateLimitExceeded { .. } => "E041_RATE_LIMIT",
            Self::InsufficientReserves { .. } => "E042_INSUFFICIENT_RESERVES",
            Self::NoSurplus { .. } => "E043_NO_SURPLUS",
            Self::Unauthorized { .. } => "E020_UNAUTHORIZED",
            Self::MintUnauthorized { .. } => "E021_MINT_UNAUTH",
            Self::FeeExceedsMax { .. } => "E090_FEE_EXCEEDS_MAX",
            Self::InvalidParameter { .. } => "E091_INVALID_PARAM",
            Self::InvalidAddress { .. } => "E092_INVALID_ADDRESS",
            Self::InsufficientBalance { .. } => "E010_INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "E011_INSUFFICIENT_ALLOWANCE",
            Self::ZeroAmount => "E012_ZERO_AMOUNT",
            Self::Overflow => "E080_OVERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
        }
    }

    /// Returns true if the caller can succeed later without governance action
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::PriceInvalid => true,                 // Wait for the oracle
            Self::SlippageExceeded { .. } => true,      // Resubmit with new minimum
            Self::RateLimitExceeded { .. } => true,     // Wait for replenishment
            Self::InsufficientReserves { .. } => true,  // Wait for reserve inflow
            Self::InsufficientBalance { .. } => true,   // Get more funds
            Self::InsufficientAllowance { .. } => true, // Approve more
            _ => false,
        }
    }
}
