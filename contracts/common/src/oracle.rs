//! Oracle Module
//!
//! Reads a reserve-asset price from a primary oracle with an optional
//! backup, and converts it into the engine's 18-decimal fixed-point unit.
//!
//! ## Conversion
//!
//! ```text
//! n     = raw * 10^dn          (dn >= 0)
//! n     = raw / 10^-dn         (dn <  0)
//! price = n                    (no inversion)
//! price = 10^36 / n            (inverted)
//! ```
//!
//! `dn` (the decimals normalizer) compensates for a reserve asset that does
//! not use 18 decimals. Inversion turns a "reserve per token" feed into a
//! "token per reserve" price. All divisions truncate.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{oracle::MAX_DECIMALS_NORMALIZER, precision::{DECIMALS, DOUBLE_SCALE}};
use crate::errors::{PegError, PegResult};
use crate::math::pow10;
use crate::types::{Address, ParamUpdate};

// ============================================================================
// Types
// ============================================================================

/// A price together with the oracle's validity flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct OracleReading {
    /// 18-decimal fixed-point price
    pub price: u128,
    /// Whether the source vouches for the price
    pub valid: bool,
}

impl OracleReading {
    pub fn valid(price: u128) -> Self {
        Self { price, valid: true }
    }

    pub fn invalid() -> Self {
        Self { price: 0, valid: false }
    }
}

/// A price source the engine can read and refresh
pub trait PriceOracle {
    /// Stable identifier of this oracle
    fn oracle_id(&self) -> Address;

    /// Current raw reading; never fails, an unusable price is reported invalid
    fn read(&self, now: u64) -> OracleReading;

    /// Refresh the source
    fn update(&mut self, now: u64) -> PegResult<()>;

    /// Whether the source is paused
    fn paused(&self) -> bool;
}

impl<O: PriceOracle + ?Sized> PriceOracle for Rc<RefCell<O>> {
    fn oracle_id(&self) -> Address {
        self.borrow().oracle_id()
    }

    fn read(&self, now: u64) -> OracleReading {
        self.borrow().read(now)
    }

    fn update(&mut self, now: u64) -> PegResult<()> {
        self.borrow_mut().update(now)
    }

    fn paused(&self) -> bool {
        self.borrow().paused()
    }
}

/// Decimals normalizer for a reserve asset with `token_decimals` decimals
pub fn decimals_normalizer_for(token_decimals: u8) -> i32 {
    DECIMALS as i32 - token_decimals as i32
}

fn check_normalizer(decimals_normalizer: i32) -> PegResult<()> {
    if decimals_normalizer.unsigned_abs() > MAX_DECIMALS_NORMALIZER as u32 {
        return Err(PegError::InvalidParameter {
            param: "decimals_normalizer",
            reason: "magnitude exceeds 36",
        });
    }
    Ok(())
}

// ============================================================================
// Oracle Reader
// ============================================================================

/// Primary/backup oracle pair with price conversion
pub struct OracleReader {
    oracle: Box<dyn PriceOracle>,
    backup_oracle: Option<Box<dyn PriceOracle>>,
    do_invert: bool,
    decimals_normalizer: i32,
}

impl fmt::Debug for OracleReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleReader")
            .field("oracle", &self.oracle.oracle_id())
            .field("backup_oracle", &self.backup_oracle_id())
            .field("do_invert", &self.do_invert)
            .field("decimals_normalizer", &self.decimals_normalizer)
            .finish()
    }
}

impl OracleReader {
    /// # Errors
    /// * `InvalidParameter` if `|decimals_normalizer| > 36`
    pub fn new(
        oracle: Box<dyn PriceOracle>,
        backup_oracle: Option<Box<dyn PriceOracle>>,
        do_invert: bool,
        decimals_normalizer: i32,
    ) -> PegResult<Self> {
        check_normalizer(decimals_normalizer)?;
        Ok(Self {
            oracle,
            backup_oracle,
            do_invert,
            decimals_normalizer,
        })
    }

    pub fn oracle_id(&self) -> Address {
        self.oracle.oracle_id()
    }

    pub fn backup_oracle_id(&self) -> Option<Address> {
        self.backup_oracle.as_ref().map(|o| o.oracle_id())
    }

    pub fn do_invert(&self) -> bool {
        self.do_invert
    }

    pub fn decimals_normalizer(&self) -> i32 {
        self.decimals_normalizer
    }

    /// Scale a raw price by the decimals normalizer; `None` on overflow
    pub fn normalize(&self, raw: u128) -> Option<u128> {
        let factor = pow10(self.decimals_normalizer.unsigned_abs()).ok()?;
        if self.decimals_normalizer >= 0 {
            raw.checked_mul(factor)
        } else {
            Some(raw / factor)
        }
    }

    /// `10^36 / value`; `None` for zero
    pub fn invert(value: u128) -> Option<u128> {
        DOUBLE_SCALE.checked_div(value)
    }

    fn convert(&self, raw: u128) -> Option<u128> {
        let normalized = self.normalize(raw)?;
        if self.do_invert {
            Self::invert(normalized)
        } else {
            Some(normalized)
        }
    }

    fn read_source(&self, source: &dyn PriceOracle, now: u64) -> Option<u128> {
        let reading = source.read(now);
        if !reading.valid {
            return None;
        }
        self.convert(reading.price)
    }

    /// Converted price from the primary, falling back to the backup
    ///
    /// Never fails; if neither source yields a usable price the reading is
    /// invalid.
    pub fn read(&self, now: u64) -> OracleReading {
        if let Some(price) = self.read_source(self.oracle.as_ref(), now) {
            debug!(price, "primary oracle read");
            return OracleReading::valid(price);
        }

        let Some(backup) = self.backup_oracle.as_deref() else {
            warn!("primary oracle invalid and no backup configured");
            return OracleReading::invalid();
        };

        warn!("primary oracle invalid, falling back to backup");
        match self.read_source(backup, now) {
            Some(price) => OracleReading::valid(price),
            None => {
                warn!("backup oracle invalid");
                OracleReading::invalid()
            }
        }
    }

    /// Refresh primary and backup
    ///
    /// Paused sources are skipped and update failures are logged, not
    /// propagated. Returns how many sources were refreshed.
    pub fn update(&mut self, now: u64) -> usize {
        let mut refreshed = 0;
        let sources = std::iter::once(&mut self.oracle).chain(self.backup_oracle.as_mut());

        for source in sources {
            let id = source.oracle_id();
            if source.paused() {
                warn!(oracle = ?id, "skipping paused oracle");
                continue;
            }
            match source.update(now) {
                Ok(()) => refreshed += 1,
                Err(err) => warn!(oracle = ?id, code = err.code(), %err, "oracle update failed"),
            }
        }
        refreshed
    }

    /// Replace the primary oracle
    pub fn set_oracle(&mut self, oracle: Box<dyn PriceOracle>) -> ParamUpdate<Address> {
        let old = self.oracle.oracle_id();
        self.oracle = oracle;
        ParamUpdate::new(old, self.oracle.oracle_id())
    }

    /// Replace or clear the backup oracle
    pub fn set_backup_oracle(&mut self, backup_oracle: Option<Box<dyn PriceOracle>>) -> ParamUpdate<Option<Address>> {
        let old = self.backup_oracle_id();
        self.backup_oracle = backup_oracle;
        ParamUpdate::new(old, self.backup_oracle_id())
    }

    pub fn set_do_invert(&mut self, do_invert: bool) -> ParamUpdate<bool> {
        let old = self.do_invert;
        self.do_invert = do_invert;
        ParamUpdate::new(old, do_invert)
    }

    /// # Errors
    /// * `InvalidParameter` if `|decimals_normalizer| > 36`
    pub fn set_decimals_normalizer(&mut self, decimals_normalizer: i32) -> PegResult<ParamUpdate<i32>> {
        check_normalizer(decimals_normalizer)?;
        let old = self.decimals_normalizer;
        self.decimals_normalizer = decimals_normalizer;
        Ok(ParamUpdate::new(old, decimals_normalizer))
    }
}

// ============================================================================
// Tests
// ============================================================================
