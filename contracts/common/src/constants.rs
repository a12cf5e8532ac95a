//! Protocol Constants
//!
//! All magic numbers and default configuration values for the peg
//! stability core. Amounts are 18-decimal fixed-point integers.
//!
//! # Network Configuration
//!
//! Use feature flags to compile for different networks:
//! - `mainnet` - Production rate limits (large buffer, slow replenishment)
//! - Default (no feature) - Testnet values (small buffer for testing)
//!
//! ```toml
//! # For mainnet deployment:
//! pegkeeper-common = { path = "...", features = ["mainnet"] }
//! ```

/// Fixed-point precision
pub mod precision {
    /// Decimals of the canonical fixed-point representation
    pub const DECIMALS: u8 = 18;

    /// 1.0 in 18-decimal fixed point
    pub const SCALE: u128 = 1_000_000_000_000_000_000; // 1e18

    /// 1.0 squared, the numerator used when inverting a price
    pub const DOUBLE_SCALE: u128 = SCALE * SCALE; // 1e36
}

/// Fee Configuration (in basis points, 100 = 1%)
pub mod fees {
    /// Basis points granularity (1.0 == 10_000 bp)
    pub const BASIS_POINTS_GRANULARITY: u64 = 10_000;

    /// Default fee for swapping the reserve asset into the token
    pub const DEFAULT_MINT_FEE_BPS: u64 = 0;

    /// Default fee for swapping the token back into the reserve asset
    pub const DEFAULT_REDEEM_FEE_BPS: u64 = 0;

    /// Default governance cap on either fee (3%)
    pub const DEFAULT_MAX_FEE_BPS: u64 = 300;
}

/// Acceptable oracle price band around the peg
pub mod price_bounds {
    /// The peg itself, expressed in basis points
    pub const PEG_BPS: u64 = super::fees::BASIS_POINTS_GRANULARITY;

    /// Default floor (0.98)
    pub const DEFAULT_FLOOR_BPS: u64 = 9_800;

    /// Default ceiling (1.02)
    pub const DEFAULT_CEILING_BPS: u64 = 10_200;
}

/// Rate-limited minting buffer
///
/// Values differ between mainnet and testnet to allow easier testing.
pub mod rate_limit {
    use super::precision::SCALE;

    /// Maximum buffer capacity
    /// - Mainnet: 10M tokens
    /// - Testnet: 10k tokens
    #[cfg(feature = "mainnet")]
    pub const DEFAULT_BUFFER_CAP: u128 = 10_000_000 * SCALE;
    #[cfg(not(feature = "mainnet"))]
    pub const DEFAULT_BUFFER_CAP: u128 = 10_000 * SCALE;

    /// Replenishment per second, the same on every network
    pub const DEFAULT_RATE_LIMIT_PER_SECOND: u128 = 10_000 * SCALE;

    /// Hard ceiling on the replenishment rate, fixed at construction
    pub const DEFAULT_MAX_RATE_LIMIT_PER_SECOND: u128 = 1_000_000 * SCALE;
}

/// Reserve management
pub mod reserves {
    use super::precision::SCALE;

    /// Default reserve balance the engine keeps before sweeping surplus
    pub const DEFAULT_RESERVES_THRESHOLD: u128 = 10_000_000 * SCALE;
}

/// Oracle Configuration
pub mod oracle {
    /// Largest magnitude accepted for the decimals normalizer
    pub const MAX_DECIMALS_NORMALIZER: i32 = 36;

    /// Maximum allowed price move per operator update (5%)
    pub const MAX_PRICE_DEVIATION_BPS: u64 = 500;

    /// Default maximum age of an operator price, in seconds
    pub const DEFAULT_MAX_PRICE_AGE_SECS: u64 = 3_600;
}

/// Address derivation domains
pub mod domains {
    /// Domain for engine addresses
    pub const ENGINE: &[u8] = b"pegkeeper/psm";

    /// Domain for token asset identifiers
    pub const ASSET: &[u8] = b"pegkeeper/asset";

    /// Domain for oracle identifiers
    pub const ORACLE: &[u8] = b"pegkeeper/oracle";

    /// Domain for PCV deposit addresses
    pub const PCV_DEPOSIT: &[u8] = b"pegkeeper/pcv-deposit";
}
