//! Price Oracle Contract
//!
//! Concrete price sources for the peg stability engine.
//!
//! - [`OperatorOracle`]: a trusted operator pushes prices. Each push may
//!   move the price by at most `MAX_PRICE_DEVIATION_BPS`; a price older
//!   than `max_age` reads as invalid.
//! - [`FixedPriceOracle`]: a constant price, useful for a reserve asset
//!   that is pegged by construction and for tests.
//!
//! Prices are raw feed values; the engine's oracle reader applies the
//! decimals normalizer and inversion.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use pegkeeper_common::{
    constants::{
        domains,
        fees::BASIS_POINTS_GRANULARITY,
        oracle::{DEFAULT_MAX_PRICE_AGE_SECS, MAX_PRICE_DEVIATION_BPS},
    },
    errors::{PegError, PegResult},
    math::mul_div,
    oracle::{OracleReading, PriceOracle},
    types::{derive_address, Address, ParamUpdate},
};

// ============ Operator Oracle ============

/// Operator-fed oracle state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct OperatorOracle {
    /// Oracle identifier
    pub id: Address,
    /// Can change operator, pause and deactivate
    pub admin: Address,
    /// Authorized operator (can update price)
    pub operator: Address,
    /// Latest raw price
    pub price: u128,
    /// Timestamp of the latest price
    pub last_update: u64,
    /// Seconds after which the price reads as invalid
    pub max_age: u64,
    /// Whether oracle is active; deactivation is permanent
    pub is_active: bool,
    /// Whether oracle is paused
    pub is_paused: bool,
}

impl OperatorOracle {
    /// Create an oracle whose id is derived from `seed`
    pub fn new(seed: &[u8], admin: Address, operator: Address, initial_price: u128, now: u64) -> PegResult<Self> {
        if initial_price == 0 {
            return Err(PegError::InvalidParameter {
                param: "initial_price",
                reason: "must be positive",
            });
        }

        Ok(Self {
            id: derive_address(domains::ORACLE, seed),
            admin,
            operator,
            price: initial_price,
            last_update: now,
            max_age: DEFAULT_MAX_PRICE_AGE_SECS,
            is_active: true,
            is_paused: false,
        })
    }

    fn require_admin(&self, caller: &Address) -> PegResult<()> {
        if *caller != self.admin {
            return Err(PegError::Unauthorized {
                account: *caller,
                required: "ORACLE_ADMIN",
            });
        }
        Ok(())
    }

    /// Push a new price
    ///
    /// # Errors
    /// - `Unauthorized` if `signer` is not the operator
    /// - `OracleInactive` / `OraclePaused`
    /// - `ZeroAmount` for a zero price
    /// - `OraclePriceDeviation` if the move exceeds `MAX_PRICE_DEVIATION_BPS`
    pub fn update_price(&mut self, signer: Address, new_price: u128, now: u64) -> PegResult<ParamUpdate<u128>> {
        if signer != self.operator {
            return Err(PegError::Unauthorized {
                account: signer,
                required: "ORACLE_OPERATOR",
            });
        }
        if !self.is_active {
            return Err(PegError::OracleInactive);
        }
        if self.is_paused {
            return Err(PegError::OraclePaused);
        }
        if new_price == 0 {
            return Err(PegError::ZeroAmount);
        }

        let old_price = self.price;
        if calculate_price_deviation(old_price, new_price) > MAX_PRICE_DEVIATION_BPS {
            return Err(PegError::OraclePriceDeviation {
                old_price,
                new_price,
                max_deviation_bps: MAX_PRICE_DEVIATION_BPS,
            });
        }

        self.price = new_price;
        self.last_update = now;
        info!(old_price, new_price, now, "oracle price updated");
        Ok(ParamUpdate::new(old_price, new_price))
    }

    /// Change the operator
    pub fn set_operator(&mut self, caller: Address, new_operator: Address) -> PegResult<ParamUpdate<Address>> {
        self.require_admin(&caller)?;
        if new_operator == self.operator {
            return Err(PegError::InvalidParameter {
                param: "operator",
                reason: "same as current",
            });
        }
        let old = self.operator;
        self.operator = new_operator;
        Ok(ParamUpdate::new(old, new_operator))
    }

    /// Change the staleness window
    pub fn set_max_age(&mut self, caller: Address, max_age: u64) -> PegResult<ParamUpdate<u64>> {
        self.require_admin(&caller)?;
        if max_age == 0 {
            return Err(PegError::InvalidParameter {
                param: "max_age",
                reason: "must be positive",
            });
        }
        let old = self.max_age;
        self.max_age = max_age;
        Ok(ParamUpdate::new(old, max_age))
    }

    pub fn pause(&mut self, caller: Address) -> PegResult<()> {
        self.require_admin(&caller)?;
        self.is_paused = true;
        Ok(())
    }

    pub fn resume(&mut self, caller: Address) -> PegResult<()> {
        self.require_admin(&caller)?;
        self.is_paused = false;
        Ok(())
    }

    /// Permanently retire the oracle
    pub fn deactivate(&mut self, caller: Address) -> PegResult<()> {
        self.require_admin(&caller)?;
        self.is_active = false;
        info!(oracle = ?self.id, "oracle deactivated");
        Ok(())
    }

    /// Whether the latest price is older than `max_age`
    pub fn is_stale(&self, now: u64) -> bool {
        now.saturating_sub(self.last_update) > self.max_age
    }

    /// Latest price and its staleness, for display only
    pub fn price_for_display(&self, now: u64) -> (u128, bool) {
        (self.price, self.is_stale(now))
    }
}

impl PriceOracle for OperatorOracle {
    fn oracle_id(&self) -> Address {
        self.id
    }

    fn read(&self, now: u64) -> OracleReading {
        let valid = self.is_active && !self.is_paused && self.price > 0 && !self.is_stale(now);
        OracleReading {
            price: self.price,
            valid,
        }
    }

    fn update(&mut self, now: u64) -> PegResult<()> {
        if !self.is_active {
            return Err(PegError::OracleInactive);
        }
        if self.is_paused {
            return Err(PegError::OraclePaused);
        }
        debug!(oracle = ?self.id, age = now.saturating_sub(self.last_update), "operator oracle polled");
        Ok(())
    }

    fn paused(&self) -> bool {
        self.is_paused
    }
}

// ============ Fixed Price Oracle ============

/// Oracle that always reports the same price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FixedPriceOracle {
    pub id: Address,
    pub price: u128,
}

impl FixedPriceOracle {
    pub fn new(seed: &[u8], price: u128) -> Self {
        Self {
            id: derive_address(domains::ORACLE, seed),
            price,
        }
    }
}

impl PriceOracle for FixedPriceOracle {
    fn oracle_id(&self) -> Address {
        self.id
    }

    fn read(&self, _now: u64) -> OracleReading {
        OracleReading {
            price: self.price,
            valid: self.price > 0,
        }
    }

    fn update(&mut self, _now: u64) -> PegResult<()> {
        Ok(())
    }

    fn paused(&self) -> bool {
        false
    }
}

// ============ Helper Functions ============

/// Price deviation in basis points (100 bps = 1%)
///
/// Saturates at `u64::MAX`; a zero old price counts as a 100% move.
pub fn calculate_price_deviation(old_price: u128, new_price: u128) -> u64 {
    if old_price == 0 {
        return BASIS_POINTS_GRANULARITY;
    }

    let diff = old_price.abs_diff(new_price);
    mul_div(diff, BASIS_POINTS_GRANULARITY as u128, old_price)
        .map(|d| d.min(u64::MAX as u128) as u64)
        .unwrap_or(u64::MAX)
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use pegkeeper_common::constants::precision::SCALE;

    const ADMIN: Address = [0u8; 32];
    const OPERATOR: Address = [1u8; 32];

    fn create_test_oracle() -> OperatorOracle {
        OperatorOracle::new(b"RSV/pUSD", ADMIN, OPERATOR, SCALE, 100).unwrap()
    }

    #[test]
    fn test_update_price_success() {
        let mut oracle = create_test_oracle();
        let new_price = 101 * SCALE / 100; // 1% move

        let update = oracle.update_price(OPERATOR, new_price, 160).unwrap();

        assert_eq!(update, ParamUpdate::new(SCALE, new_price));
        assert_eq!(oracle.read(160), OracleReading { price: new_price, valid: true });
        assert_eq!(oracle.last_update, 160);
    }

    #[test]
    fn test_update_price_too_large_deviation() {
        let mut oracle = create_test_oracle();
        let new_price = 120 * SCALE / 100; // 20% move

        let result = oracle.update_price(OPERATOR, new_price, 101);
        assert!(matches!(result, Err(PegError::OraclePriceDeviation { max_deviation_bps: 500, .. })));
        assert_eq!(oracle.price, SCALE);
    }

    #[test]
    fn test_update_price_unauthorized() {
        let mut oracle = create_test_oracle();

        let result = oracle.update_price([99u8; 32], SCALE, 101);
        assert!(matches!(result, Err(PegError::Unauthorized { required: "ORACLE_OPERATOR", .. })));
    }

    #[test]
    fn test_zero_price_rejected() {
        let mut oracle = create_test_oracle();
        assert_eq!(oracle.update_price(OPERATOR, 0, 101), Err(PegError::ZeroAmount));
        assert!(OperatorOracle::new(b"x", ADMIN, OPERATOR, 0, 0).is_err());
    }

    #[test]
    fn test_price_staleness() {
        let oracle = create_test_oracle();

        assert!(oracle.read(100 + DEFAULT_MAX_PRICE_AGE_SECS).valid);
        assert!(!oracle.read(101 + DEFAULT_MAX_PRICE_AGE_SECS).valid);
        assert_eq!(oracle.price_for_display(10_000), (SCALE, true));

        // Clock behind the last update is not stale
        assert!(oracle.read(50).valid);
    }

    #[test]
    fn test_pause_blocks_reads_and_updates() {
        let mut oracle = create_test_oracle();
        oracle.pause(ADMIN).unwrap();

        assert!(oracle.paused());
        assert!(!oracle.read(100).valid);
        assert_eq!(oracle.update(100), Err(PegError::OraclePaused));
        assert_eq!(oracle.update_price(OPERATOR, SCALE, 101), Err(PegError::OraclePaused));

        oracle.resume(ADMIN).unwrap();
        assert!(oracle.read(100).valid);
        assert!(oracle.update(100).is_ok());
    }

    #[test]
    fn test_deactivate_is_permanent() {
        let mut oracle = create_test_oracle();
        assert!(oracle.deactivate(OPERATOR).is_err());
        oracle.deactivate(ADMIN).unwrap();

        assert!(!oracle.read(100).valid);
        assert_eq!(oracle.update(100), Err(PegError::OracleInactive));
        oracle.resume(ADMIN).unwrap();
        assert!(!oracle.read(100).valid);
    }

    #[test]
    fn test_set_operator() {
        let mut oracle = create_test_oracle();
        let new_operator = [2u8; 32];

        assert!(oracle.set_operator(OPERATOR, new_operator).is_err());
        assert!(oracle.set_operator(ADMIN, OPERATOR).is_err());
        oracle.set_operator(ADMIN, new_operator).unwrap();

        assert!(oracle.update_price(OPERATOR, SCALE, 101).is_err());
        assert!(oracle.update_price(new_operator, SCALE, 101).is_ok());
    }

    #[test]
    fn test_set_max_age() {
        let mut oracle = create_test_oracle();
        assert!(oracle.set_max_age(ADMIN, 0).is_err());
        assert_eq!(oracle.set_max_age(ADMIN, 10).unwrap(), ParamUpdate::new(DEFAULT_MAX_PRICE_AGE_SECS, 10));
        assert!(!oracle.read(111).valid);
    }

    #[test]
    fn test_fixed_price_oracle() {
        let mut oracle = FixedPriceOracle::new(b"peg", SCALE);
        assert_eq!(oracle.read(u64::MAX), OracleReading { price: SCALE, valid: true });
        assert!(oracle.update(0).is_ok());
        assert!(!FixedPriceOracle::new(b"zero", 0).read(0).valid);
        assert_ne!(oracle.oracle_id(), FixedPriceOracle::new(b"other", SCALE).oracle_id());
    }

    #[test]
    fn test_price_deviation_calculation() {
        assert_eq!(calculate_price_deviation(100_000, 100_000), 0);
        assert_eq!(calculate_price_deviation(100_000, 101_000), 100);
        assert_eq!(calculate_price_deviation(100_000, 95_000), 500);
        assert_eq!(calculate_price_deviation(100_000, 110_000), 1000);
        assert_eq!(calculate_price_deviation(0, 1), 10_000);
        assert_eq!(calculate_price_deviation(1, u128::MAX), u64::MAX);
    }
}
