//! Engine configuration
//!
//! [`PsmParams`] is the construction-time bundle, deserialisable with every
//! field defaulted from `constants`. [`PsmConfig`] is the live copy owned by
//! one engine; governance setters mutate it and bump its version.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use pegkeeper_common::{
    constants::{
        fees::{BASIS_POINTS_GRANULARITY, DEFAULT_MAX_FEE_BPS, DEFAULT_MINT_FEE_BPS, DEFAULT_REDEEM_FEE_BPS},
        oracle::MAX_DECIMALS_NORMALIZER,
        price_bounds::{DEFAULT_CEILING_BPS, DEFAULT_FLOOR_BPS, PEG_BPS},
        rate_limit::{DEFAULT_BUFFER_CAP, DEFAULT_MAX_RATE_LIMIT_PER_SECOND, DEFAULT_RATE_LIMIT_PER_SECOND},
        reserves::DEFAULT_RESERVES_THRESHOLD,
    },
    emergency::RedeemPausePolicy,
    errors::{PegError, PegResult},
    math::bps_to_price,
    types::Address,
};

// ============ Static bounds ============

pub(crate) fn check_max_fee(max_fee_bps: u64) -> PegResult<()> {
    if max_fee_bps > BASIS_POINTS_GRANULARITY {
        return Err(PegError::InvalidParameter {
            param: "max_fee_bps",
            reason: "exceeds basis point granularity",
        });
    }
    Ok(())
}

pub(crate) fn check_fee(fee_bps: u64, max_fee_bps: u64) -> PegResult<()> {
    if fee_bps > max_fee_bps {
        return Err(PegError::FeeExceedsMax { fee_bps, max_fee_bps });
    }
    Ok(())
}

pub(crate) fn check_floor(floor_bps: u64, ceiling_bps: u64) -> PegResult<()> {
    let reason = if floor_bps == 0 {
        "must be positive"
    } else if floor_bps >= ceiling_bps {
        "must be below ceiling"
    } else if floor_bps >= PEG_BPS {
        "must be below peg"
    } else {
        return Ok(());
    };
    Err(PegError::InvalidParameter { param: "floor_bps", reason })
}

pub(crate) fn check_ceiling(ceiling_bps: u64, floor_bps: u64) -> PegResult<()> {
    let reason = if ceiling_bps <= floor_bps {
        "must be above floor"
    } else if ceiling_bps <= PEG_BPS {
        "must be above peg"
    } else {
        return Ok(());
    };
    Err(PegError::InvalidParameter { param: "ceiling_bps", reason })
}

pub(crate) fn check_reserves_threshold(threshold: u128) -> PegResult<()> {
    if threshold == 0 {
        return Err(PegError::InvalidParameter {
            param: "reserves_threshold",
            reason: "must be positive",
        });
    }
    Ok(())
}

// ============ Construction parameters ============

/// Initial tunables for a new engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsmParams {
    pub mint_fee_bps: u64,
    pub redeem_fee_bps: u64,
    pub max_fee_bps: u64,
    pub floor_bps: u64,
    pub ceiling_bps: u64,
    /// Reserve kept on hand before surplus is swept
    pub reserves_threshold: u128,
    pub buffer_cap: u128,
    pub rate_limit_per_second: u128,
    /// Fixed for the engine's lifetime
    pub max_rate_limit_per_second: u128,
    /// Feed quotes reserve per token and must be inverted
    pub do_invert: bool,
    /// Rescales the feed to 18 decimals; see `decimals_normalizer_for`
    pub decimals_normalizer: i32,
    pub redeem_pause_policy: RedeemPausePolicy,
}

impl Default for PsmParams {
    fn default() -> Self {
        Self {
            mint_fee_bps: DEFAULT_MINT_FEE_BPS,
            redeem_fee_bps: DEFAULT_REDEEM_FEE_BPS,
            max_fee_bps: DEFAULT_MAX_FEE_BPS,
            floor_bps: DEFAULT_FLOOR_BPS,
            ceiling_bps: DEFAULT_CEILING_BPS,
            reserves_threshold: DEFAULT_RESERVES_THRESHOLD,
            buffer_cap: DEFAULT_BUFFER_CAP,
            rate_limit_per_second: DEFAULT_RATE_LIMIT_PER_SECOND,
            max_rate_limit_per_second: DEFAULT_MAX_RATE_LIMIT_PER_SECOND,
            do_invert: false,
            decimals_normalizer: 0,
            redeem_pause_policy: RedeemPausePolicy::default(),
        }
    }
}

impl PsmParams {
    /// Check every static bound
    pub fn validate(&self) -> PegResult<()> {
        check_max_fee(self.max_fee_bps)?;
        check_fee(self.mint_fee_bps, self.max_fee_bps)?;
        check_fee(self.redeem_fee_bps, self.max_fee_bps)?;
        check_floor(self.floor_bps, self.ceiling_bps)?;
        check_ceiling(self.ceiling_bps, self.floor_bps)?;
        check_reserves_threshold(self.reserves_threshold)?;

        if self.rate_limit_per_second > self.max_rate_limit_per_second {
            return Err(PegError::InvalidParameter {
                param: "rate_limit_per_second",
                reason: "exceeds max rate limit",
            });
        }
        if self.decimals_normalizer.unsigned_abs() > MAX_DECIMALS_NORMALIZER as u32 {
            return Err(PegError::InvalidParameter {
                param: "decimals_normalizer",
                reason: "magnitude exceeds 36",
            });
        }
        Ok(())
    }
}

// ============ Live configuration ============

/// Versioned configuration owned by one engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PsmConfig {
    /// Incremented by every governance parameter change
    pub version: u64,
    pub mint_fee_bps: u64,
    pub redeem_fee_bps: u64,
    pub max_fee_bps: u64,
    pub floor_bps: u64,
    pub ceiling_bps: u64,
    pub reserves_threshold: u128,
    /// Identity of the reserve asset; immutable
    pub underlying_asset: Address,
    /// Address of the PCV deposit receiving surplus
    pub surplus_target: Address,
    pub redeem_pause_policy: RedeemPausePolicy,
}

impl PsmConfig {
    pub(crate) fn from_params(params: &PsmParams, underlying_asset: Address, surplus_target: Address) -> Self {
        Self {
            version: 0,
            mint_fee_bps: params.mint_fee_bps,
            redeem_fee_bps: params.redeem_fee_bps,
            max_fee_bps: params.max_fee_bps,
            floor_bps: params.floor_bps,
            ceiling_bps: params.ceiling_bps,
            reserves_threshold: params.reserves_threshold,
            underlying_asset,
            surplus_target,
            redeem_pause_policy: params.redeem_pause_policy,
        }
    }

    /// Lowest acceptable oracle price, 18 decimals
    pub fn floor_price(&self) -> u128 {
        bps_to_price(self.floor_bps)
    }

    /// Highest acceptable oracle price, 18 decimals
    pub fn ceiling_price(&self) -> u128 {
        bps_to_price(self.ceiling_bps)
    }

    /// Inclusive band check
    pub fn price_in_bounds(&self, price: u128) -> bool {
        price >= self.floor_price() && price <= self.ceiling_price()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pegkeeper_common::constants::precision::SCALE;

    #[test]
    fn test_default_params_valid() {
        assert!(PsmParams::default().validate().is_ok());
    }

    #[test]
    fn test_fee_above_max_rejected() {
        let params = PsmParams { mint_fee_bps: 301, ..Default::default() };
        assert_eq!(params.validate(), Err(PegError::FeeExceedsMax { fee_bps: 301, max_fee_bps: 300 }));

        let params = PsmParams { max_fee_bps: 10_001, ..Default::default() };
        assert!(matches!(params.validate(), Err(PegError::InvalidParameter { param: "max_fee_bps", .. })));
    }

    #[test]
    fn test_bounds_must_straddle_peg() {
        for (floor_bps, ceiling_bps) in [(0, 10_200), (10_000, 10_200), (9_800, 10_000), (9_800, 9_700), (10_300, 10_200)] {
            let params = PsmParams { floor_bps, ceiling_bps, ..Default::default() };
            assert!(params.validate().is_err(), "floor {} ceiling {}", floor_bps, ceiling_bps);
        }
        let params = PsmParams { floor_bps: 1, ceiling_bps: 10_001, ..Default::default() };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_rate_and_normalizer_bounds() {
        let params = PsmParams {
            rate_limit_per_second: 2,
            max_rate_limit_per_second: 1,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = PsmParams { decimals_normalizer: -37, ..Default::default() };
        assert!(params.validate().is_err());

        let params = PsmParams { reserves_threshold: 0, ..Default::default() };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_price_bounds_inclusive() {
        let config = PsmConfig::from_params(&PsmParams::default(), [1u8; 32], [2u8; 32]);
        assert!(config.price_in_bounds(98 * SCALE / 100));
        assert!(config.price_in_bounds(102 * SCALE / 100));
        assert!(!config.price_in_bounds(98 * SCALE / 100 - 1));
        assert!(!config.price_in_bounds(102 * SCALE / 100 + 1));
    }

    #[test]
    fn test_params_from_json_with_defaults() {
        let json = r#"{
            "mint_fee_bps": 50,
            "buffer_cap": 5000000000000000000,
            "decimals_normalizer": 12,
            "redeem_pause_policy": "locked_while_globally_paused"
        }"#;
        let params: PsmParams = serde_json::from_str(json).unwrap();

        assert_eq!(params.mint_fee_bps, 50);
        assert_eq!(params.buffer_cap, 5 * SCALE);
        assert_eq!(params.decimals_normalizer, 12);
        assert_eq!(params.redeem_pause_policy, RedeemPausePolicy::LockedWhileGloballyPaused);
        assert_eq!(params.ceiling_bps, DEFAULT_CEILING_BPS);
        assert_eq!(params.reserves_threshold, DEFAULT_RESERVES_THRESHOLD);
        assert!(params.validate().is_ok());
    }
}
