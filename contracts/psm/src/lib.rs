//! Peg Stability Engine
//!
//! Swaps a reserve asset for the protocol token and back at an
//! oracle-anchored price.
//!
//! ## Peg Defense Mechanism
//!
//! When the token trades above peg:
//! - Users swap the reserve asset for the token (arbitrage opportunity)
//! - The engine hands out idle inventory or mints, increasing supply
//!
//! When the token trades below peg:
//! - Users swap the token for the reserve asset
//! - The engine burns the token, decreasing supply
//!
//! ## Limits
//!
//! - Swaps only execute while the oracle price sits inside `[floor, ceiling]`
//! - New supply is bounded by a token-bucket buffer; handing out inventory
//!   the engine already holds does not touch it
//! - Redemptions are bounded by reserves on hand
//! - Reserve above `reserves_threshold` is swept to a PCV deposit
//!
//! Every mutating call takes `&mut self` and undoes its earlier steps if a
//! later external step fails.

use std::fmt;

use tracing::{debug, error, info, warn};

use pegkeeper_common::{
    access_control::{self, AccessControlState, Role},
    constants::domains,
    emergency::{PauseState, PauseTransition, RedeemPausePolicy},
    errors::{PegError, PegResult},
    events::{EventLog, PegEvent},
    math::{calculate_mint_amount_out, calculate_redeem_amount_out, signed_surplus},
    oracle::{OracleReader, OracleReading, PriceOracle},
    rate_limiter::RateLimitedBuffer,
    token_ops::{FungibleAsset, MintableToken, PcvDeposit},
    types::{derive_address, is_zero_address, Address, CallContext, ParamUpdate},
};

pub mod params;

pub use params::{PsmConfig, PsmParams};

use params::{check_ceiling, check_fee, check_floor, check_max_fee, check_reserves_threshold};

#[cfg(test)]
mod testing;


/// Roles allowed to pause
const PAUSERS: [Role; 2] = [Role::Governor, Role::Guardian];

// ============ Collaborators ============

/// External components injected at construction
pub struct PsmCollaborators {
    /// Protocol token; the engine needs a minter grant on it
    pub token: Box<dyn MintableToken>,
    /// Reserve asset
    pub reserve: Box<dyn FungibleAsset>,
    pub oracle: Box<dyn PriceOracle>,
    pub backup_oracle: Option<Box<dyn PriceOracle>>,
    /// Receives swept surplus
    pub surplus_target: Box<dyn PcvDeposit>,
}

// ============ Engine ============

/// Peg stability engine for one reserve asset
pub struct PegStabilityEngine {
    address: Address,
    config: PsmConfig,
    pause_state: PauseState,
    buffer: RateLimitedBuffer,
    oracle: OracleReader,
    access: AccessControlState,
    token: Box<dyn MintableToken>,
    reserve: Box<dyn FungibleAsset>,
    surplus_target: Box<dyn PcvDeposit>,
    events: EventLog,
}

impl fmt::Debug for PegStabilityEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PegStabilityEngine")
            .field("address", &self.address)
            .field("config", &self.config)
            .field("pause_state", &self.pause_state)
            .field("buffer", &self.buffer)
            .field("oracle", &self.oracle)
            .finish_non_exhaustive()
    }
}

impl PegStabilityEngine {
    /// Build an engine whose address is derived from `seed`
    ///
    /// `governor` receives the Governor role.
    ///
    /// # Errors
    /// * Any static bound violated by `params`
    /// * `InvalidAddress` if the surplus target is the zero address
    pub fn new(
        seed: &[u8],
        governor: Address,
        params: PsmParams,
        collaborators: PsmCollaborators,
        now: u64,
    ) -> PegResult<Self> {
        params.validate()?;

        let PsmCollaborators {
            token,
            reserve,
            oracle,
            backup_oracle,
            surplus_target,
        } = collaborators;

        let surplus_address = surplus_target.address();
        if is_zero_address(&surplus_address) {
            return Err(PegError::InvalidAddress {
                reason: "surplus target is the zero address",
            });
        }

        let oracle = OracleReader::new(oracle, backup_oracle, params.do_invert, params.decimals_normalizer)?;
        let buffer = RateLimitedBuffer::new(
            params.max_rate_limit_per_second,
            params.rate_limit_per_second,
            params.buffer_cap,
            now,
            false,
        )?;

        let address = derive_address(domains::ENGINE, seed);
        let config = PsmConfig::from_params(&params, reserve.asset_id(), surplus_address);
        info!(engine = ?address, asset = ?config.underlying_asset, "peg stability engine created");

        Ok(Self {
            address,
            config,
            pause_state: PauseState::default(),
            buffer,
            oracle,
            access: AccessControlState::new(governor, now),
            token,
            reserve,
            surplus_target,
            events: EventLog::new(),
        })
    }

    // ============ Views ============

    /// Address holding the engine's balances
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn config(&self) -> &PsmConfig {
        &self.config
    }

    pub fn pause_state(&self) -> PauseState {
        self.pause_state
    }

    pub fn is_paused(&self) -> bool {
        self.pause_state.is_paused()
    }

    pub fn is_redeem_paused(&self) -> bool {
        self.pause_state.is_redeem_paused()
    }

    pub fn rate_limiter(&self) -> &RateLimitedBuffer {
        &self.buffer
    }

    /// Minting capacity at `now`
    pub fn buffer(&self, now: u64) -> u128 {
        self.buffer.buffer(now)
    }

    pub fn oracle_reader(&self) -> &OracleReader {
        &self.oracle
    }

    /// Converted oracle reading, without the bounds check
    pub fn read_oracle(&self, now: u64) -> OracleReading {
        self.oracle.read(now)
    }

    pub fn access(&self) -> &AccessControlState {
        &self.access
    }

    pub fn has_role(&self, account: &Address, role: Role) -> bool {
        access_control::has_role(&self.access, account, role)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Take all emitted events
    pub fn drain_events(&mut self) -> Vec<PegEvent> {
        self.events.drain()
    }

    /// Reserve asset held by the engine
    pub fn balance(&self) -> u128 {
        self.reserve.balance_of(&self.address)
    }

    /// Asset `balance` is denominated in
    pub fn balance_reported_in(&self) -> Address {
        self.config.underlying_asset
    }

    /// (reserve balance, token balance) held by the engine
    pub fn resistant_balance_and_stablecoin(&self) -> (u128, u128) {
        (self.balance(), self.token.balance_of(&self.address))
    }

    /// Reserve balance minus the threshold; negative when below it
    pub fn reserves_surplus(&self) -> i128 {
        signed_surplus(self.balance(), self.config.reserves_threshold)
    }

    /// True iff there is a positive surplus and the engine is not paused
    pub fn has_surplus(&self) -> bool {
        self.reserves_surplus() > 0 && !self.is_paused()
    }

    /// Largest mint that can succeed at `now`: idle inventory plus buffer
    pub fn get_max_mint_amount_out(&self, now: u64) -> u128 {
        self.buffer
            .buffer(now)
            .saturating_add(self.token.balance_of(&self.address))
    }

    // ============ Quotes ============

    fn checked_price(&self, now: u64) -> PegResult<u128> {
        let reading = self.oracle.read(now);
        if !reading.valid {
            return Err(PegError::PriceInvalid);
        }
        if !self.config.price_in_bounds(reading.price) {
            warn!(price = reading.price, "oracle price outside bounds");
            return Err(PegError::PriceOutOfBounds {
                price: reading.price,
                floor: self.config.floor_price(),
                ceiling: self.config.ceiling_price(),
            });
        }
        Ok(reading.price)
    }

    /// Token out for `amount_in` of the reserve asset
    ///
    /// # Errors
    /// * `PriceInvalid` if no oracle yields a price
    /// * `PriceOutOfBounds` outside `[floor, ceiling]`
    pub fn get_mint_amount_out(&self, amount_in: u128, now: u64) -> PegResult<u128> {
        if amount_in == 0 {
            return Ok(0);
        }
        let price = self.checked_price(now)?;
        let amount_out = calculate_mint_amount_out(amount_in, price, self.config.mint_fee_bps)?;
        debug!(amount_in, amount_out, price, "mint quote");
        Ok(amount_out)
    }

    /// Reserve asset out for `amount_in` of the token
    ///
    /// Same errors as [`Self::get_mint_amount_out`].
    pub fn get_redeem_amount_out(&self, amount_in: u128, now: u64) -> PegResult<u128> {
        if amount_in == 0 {
            return Ok(0);
        }
        let price = self.checked_price(now)?;
        let amount_out = calculate_redeem_amount_out(amount_in, price, self.config.redeem_fee_bps)?;
        debug!(amount_in, amount_out, price, "redeem quote");
        Ok(amount_out)
    }

    // ============ Swaps ============

    /// Swap `amount_in` of the reserve asset from the caller for the token
    ///
    /// The caller must have approved the engine for `amount_in`. Idle token
    /// inventory is handed out first; otherwise the buffer is consumed and
    /// new supply minted.
    ///
    /// # Errors
    /// * `Paused`, `ZeroAmount`
    /// * `PriceInvalid`, `PriceOutOfBounds`, `SlippageExceeded`
    /// * `RateLimitExceeded` when minting is needed and the buffer is short
    /// * Any transfer or mint failure, after undoing earlier steps
    pub fn mint(&mut self, ctx: CallContext, to: Address, amount_in: u128, min_amount_out: u128) -> PegResult<u128> {
        if self.is_paused() {
            return Err(PegError::Paused);
        }
        if amount_in == 0 {
            return Err(PegError::ZeroAmount);
        }

        let now = ctx.timestamp;
        let amount_out = self.get_mint_amount_out(amount_in, now)?;
        if amount_out < min_amount_out {
            return Err(PegError::SlippageExceeded { amount_out, min_amount_out });
        }

        let prefunded = self.token.balance_of(&self.address) >= amount_out;
        let buffer_before = self.buffer.clone();
        if !prefunded {
            if let Err(err) = self.buffer.consume(amount_out, now) {
                self.buffer = buffer_before;
                return Err(err);
            }
        }

        if let Err(err) = self.reserve.transfer_from(self.address, ctx.caller, self.address, amount_in) {
            self.buffer = buffer_before;
            return Err(err);
        }

        let delivered = if amount_out == 0 {
            Ok(())
        } else if prefunded {
            self.token.transfer(self.address, to, amount_out)
        } else {
            self.token.mint(self.address, to, amount_out)
        };
        if let Err(err) = delivered {
            self.buffer = buffer_before;
            if let Err(refund_err) = self.reserve.transfer(self.address, ctx.caller, amount_in) {
                error!(code = refund_err.code(), %refund_err, "reserve refund failed after aborted mint");
            }
            return Err(err);
        }

        if !prefunded {
            self.events.emit(PegEvent::BufferUsed {
                amount_used: amount_out,
                buffer_remaining: self.buffer.buffer(now),
                timestamp: now,
            });
        }
        self.events.emit(PegEvent::Mint {
            caller: ctx.caller,
            to,
            amount_in,
            amount_out,
            timestamp: now,
        });
        info!(caller = ?ctx.caller, amount_in, amount_out, prefunded, "mint");
        Ok(amount_out)
    }

    /// Swap `amount_in` of the token from the caller for the reserve asset
    ///
    /// The caller must have approved the engine for `amount_in`. After the
    /// payout the token is burned and the burned amount returned to the
    /// buffer; if the burn fails the engine keeps it as inventory.
    ///
    /// # Errors
    /// * `Paused`, `RedeemPaused`, `ZeroAmount`
    /// * `PriceInvalid`, `PriceOutOfBounds`, `SlippageExceeded`
    /// * `InsufficientReserves`, checked before any transfer
    /// * Any transfer failure, after returning the pulled token
    pub fn redeem(&mut self, ctx: CallContext, to: Address, amount_in: u128, min_amount_out: u128) -> PegResult<u128> {
        if self.is_paused() {
            return Err(PegError::Paused);
        }
        if self.is_redeem_paused() {
            return Err(PegError::RedeemPaused);
        }
        if amount_in == 0 {
            return Err(PegError::ZeroAmount);
        }

        let now = ctx.timestamp;
        let amount_out = self.get_redeem_amount_out(amount_in, now)?;
        if amount_out < min_amount_out {
            return Err(PegError::SlippageExceeded { amount_out, min_amount_out });
        }

        let available = self.balance();
        if available < amount_out {
            return Err(PegError::InsufficientReserves {
                available,
                requested: amount_out,
            });
        }

        self.token.transfer_from(self.address, ctx.caller, self.address, amount_in)?;

        if amount_out > 0 {
            if let Err(err) = self.reserve.transfer(self.address, to, amount_out) {
                if let Err(refund_err) = self.token.transfer(self.address, ctx.caller, amount_in) {
                    error!(code = refund_err.code(), %refund_err, "token refund failed after aborted redeem");
                }
                return Err(err);
            }
        }

        // An unburnable amount stays as idle inventory for later mints
        match self.token.burn(self.address, amount_in) {
            Ok(()) => {
                let buffer_remaining = self.buffer.replenish(amount_in, now);
                self.events.emit(PegEvent::BufferReplenished {
                    amount: amount_in,
                    buffer_remaining,
                    timestamp: now,
                });
            }
            Err(err) => warn!(code = err.code(), %err, amount_in, "burn failed, redeemed token held as inventory"),
        }

        self.events.emit(PegEvent::Redeem {
            caller: ctx.caller,
            to,
            amount_in,
            amount_out,
            timestamp: now,
        });
        info!(caller = ?ctx.caller, amount_in, amount_out, "redeem");
        Ok(amount_out)
    }

    // ============ Surplus ============

    /// Sweep exactly the reserve surplus to the surplus target
    ///
    /// Returns the amount swept. The sweep is final once the transfer lands;
    /// a failing `deposit` hook on the target is logged and does not undo it.
    ///
    /// # Errors
    /// * `Paused`
    /// * `NoSurplus` if the balance is at or below the threshold
    /// * Transfer failure, with nothing moved
    pub fn allocate_surplus(&mut self, ctx: CallContext) -> PegResult<u128> {
        if self.is_paused() {
            return Err(PegError::Paused);
        }
        let surplus = self.reserves_surplus();
        if surplus <= 0 {
            return Err(PegError::NoSurplus { surplus });
        }

        let amount = surplus.unsigned_abs();
        let target = self.surplus_target.address();
        self.reserve.transfer(self.address, target, amount)?;

        if let Err(err) = self.surplus_target.deposit() {
            warn!(target = ?target, code = err.code(), %err, "surplus target deposit hook failed");
        }

        self.events.emit(PegEvent::AllocateSurplus {
            caller: ctx.caller,
            target,
            amount,
            timestamp: ctx.timestamp,
        });
        info!(target = ?target, amount, "surplus allocated");
        Ok(amount)
    }

    /// Sweep surplus if there is any; otherwise succeed without effect
    pub fn deposit(&mut self, ctx: CallContext) -> PegResult<u128> {
        if !self.has_surplus() {
            debug!(surplus = self.reserves_surplus(), "deposit skipped");
            return Ok(0);
        }
        self.allocate_surplus(ctx)
    }

    /// Move reserve out of the engine (PCV controller only)
    ///
    /// Allowed while paused.
    pub fn withdraw(&mut self, ctx: CallContext, to: Address, amount: u128) -> PegResult<()> {
        self.require_role(&ctx, Role::PcvController)?;
        if amount == 0 {
            return Err(PegError::ZeroAmount);
        }
        if is_zero_address(&to) {
            return Err(PegError::InvalidAddress {
                reason: "withdrawal to the zero address",
            });
        }

        let available = self.balance();
        if available < amount {
            return Err(PegError::InsufficientReserves {
                available,
                requested: amount,
            });
        }

        self.reserve.transfer(self.address, to, amount)?;
        self.events.emit(PegEvent::WithdrawReserve {
            caller: ctx.caller,
            to,
            amount,
            timestamp: ctx.timestamp,
        });
        info!(caller = ?ctx.caller, to = ?to, amount, "reserve withdrawn");
        Ok(())
    }

    /// Refresh the oracles; returns how many were refreshed
    pub fn update_oracle(&mut self, now: u64) -> usize {
        self.oracle.update(now)
    }

    // ============ Pause Controls ============

    fn apply_transition(&mut self, transition: PauseTransition) -> PegResult<()> {
        let next = self
            .pause_state
            .transition(transition, self.config.redeem_pause_policy)?;
        info!(from = self.pause_state.name(), to = next.name(), "pause state changed");
        self.pause_state = next;
        Ok(())
    }

    /// Halt mint, redeem and surplus sweeps (Governor or Guardian)
    pub fn pause(&mut self, ctx: CallContext) -> PegResult<()> {
        access_control::require_any_role(&self.access, &ctx.caller, &PAUSERS)?;
        self.apply_transition(PauseTransition::Pause)?;
        self.events.emit(PegEvent::Paused { by: ctx.caller, timestamp: ctx.timestamp });
        Ok(())
    }

    /// Resume after a global pause (Governor)
    pub fn unpause(&mut self, ctx: CallContext) -> PegResult<()> {
        self.require_role(&ctx, Role::Governor)?;
        self.apply_transition(PauseTransition::Unpause)?;
        self.events.emit(PegEvent::Unpaused { by: ctx.caller, timestamp: ctx.timestamp });
        Ok(())
    }

    /// Halt redemptions only (Governor or Guardian)
    pub fn pause_redeem(&mut self, ctx: CallContext) -> PegResult<()> {
        access_control::require_any_role(&self.access, &ctx.caller, &PAUSERS)?;
        self.apply_transition(PauseTransition::PauseRedeem)?;
        self.events.emit(PegEvent::RedemptionsPaused { by: ctx.caller, timestamp: ctx.timestamp });
        Ok(())
    }

    /// Resume redemptions (Governor)
    pub fn unpause_redeem(&mut self, ctx: CallContext) -> PegResult<()> {
        self.require_role(&ctx, Role::Governor)?;
        self.apply_transition(PauseTransition::UnpauseRedeem)?;
        self.events.emit(PegEvent::RedemptionsUnpaused { by: ctx.caller, timestamp: ctx.timestamp });
        Ok(())
    }

    // ============ Governance ============

    fn require_role(&self, ctx: &CallContext, role: Role) -> PegResult<()> {
        access_control::require_role(&self.access, &ctx.caller, role)
    }

    /// Record a committed parameter change
    fn commit(&mut self, event: PegEvent) {
        self.config.version += 1;
        debug!(version = self.config.version, event = ?event.event_type(), "parameter updated");
        self.events.emit(event);
    }

    pub fn set_mint_fee(&mut self, ctx: CallContext, new_fee_bps: u64) -> PegResult<ParamUpdate<u64>> {
        self.require_role(&ctx, Role::Governor)?;
        check_fee(new_fee_bps, self.config.max_fee_bps)?;

        let update = ParamUpdate::new(self.config.mint_fee_bps, new_fee_bps);
        self.config.mint_fee_bps = new_fee_bps;
        self.commit(PegEvent::MintFeeUpdate {
            old_fee_bps: update.old,
            new_fee_bps,
            timestamp: ctx.timestamp,
        });
        Ok(update)
    }

    pub fn set_redeem_fee(&mut self, ctx: CallContext, new_fee_bps: u64) -> PegResult<ParamUpdate<u64>> {
        self.require_role(&ctx, Role::Governor)?;
        check_fee(new_fee_bps, self.config.max_fee_bps)?;

        let update = ParamUpdate::new(self.config.redeem_fee_bps, new_fee_bps);
        self.config.redeem_fee_bps = new_fee_bps;
        self.commit(PegEvent::RedeemFeeUpdate {
            old_fee_bps: update.old,
            new_fee_bps,
            timestamp: ctx.timestamp,
        });
        Ok(update)
    }

    /// Change the fee cap; it may not drop below either current fee
    pub fn set_max_fee(&mut self, ctx: CallContext, new_max_fee_bps: u64) -> PegResult<ParamUpdate<u64>> {
        self.require_role(&ctx, Role::Governor)?;
        check_max_fee(new_max_fee_bps)?;
        if new_max_fee_bps < self.config.mint_fee_bps || new_max_fee_bps < self.config.redeem_fee_bps {
            return Err(PegError::InvalidParameter {
                param: "max_fee_bps",
                reason: "below a current fee",
            });
        }

        let update = ParamUpdate::new(self.config.max_fee_bps, new_max_fee_bps);
        self.config.max_fee_bps = new_max_fee_bps;
        self.commit(PegEvent::MaxFeeUpdate {
            old_max_fee_bps: update.old,
            new_max_fee_bps,
            timestamp: ctx.timestamp,
        });
        Ok(update)
    }

    pub fn set_reserves_threshold(&mut self, ctx: CallContext, new_threshold: u128) -> PegResult<ParamUpdate<u128>> {
        self.require_role(&ctx, Role::Governor)?;
        check_reserves_threshold(new_threshold)?;

        let update = ParamUpdate::new(self.config.reserves_threshold, new_threshold);
        self.config.reserves_threshold = new_threshold;
        self.commit(PegEvent::ReservesThresholdUpdate {
            old_threshold: update.old,
            new_threshold,
            timestamp: ctx.timestamp,
        });
        Ok(update)
    }

    pub fn set_oracle_floor_bps(&mut self, ctx: CallContext, new_floor_bps: u64) -> PegResult<ParamUpdate<u64>> {
        self.require_role(&ctx, Role::Governor)?;
        check_floor(new_floor_bps, self.config.ceiling_bps)?;

        let update = ParamUpdate::new(self.config.floor_bps, new_floor_bps);
        self.config.floor_bps = new_floor_bps;
        self.commit(PegEvent::OracleFloorUpdate {
            old_floor_bps: update.old,
            new_floor_bps,
            timestamp: ctx.timestamp,
        });
        Ok(update)
    }

    pub fn set_oracle_ceiling_bps(&mut self, ctx: CallContext, new_ceiling_bps: u64) -> PegResult<ParamUpdate<u64>> {
        self.require_role(&ctx, Role::Governor)?;
        check_ceiling(new_ceiling_bps, self.config.floor_bps)?;

        let update = ParamUpdate::new(self.config.ceiling_bps, new_ceiling_bps);
        self.config.ceiling_bps = new_ceiling_bps;
        self.commit(PegEvent::OracleCeilingUpdate {
            old_ceiling_bps: update.old,
            new_ceiling_bps,
            timestamp: ctx.timestamp,
        });
        Ok(update)
    }

    /// Replace the PCV deposit receiving surplus
    pub fn set_surplus_target(&mut self, ctx: CallContext, target: Box<dyn PcvDeposit>) -> PegResult<ParamUpdate<Address>> {
        self.require_role(&ctx, Role::Governor)?;
        let new_target = target.address();
        if is_zero_address(&new_target) {
            return Err(PegError::InvalidAddress {
                reason: "surplus target is the zero address",
            });
        }

        let update = ParamUpdate::new(self.config.surplus_target, new_target);
        self.surplus_target = target;
        self.config.surplus_target = new_target;
        self.commit(PegEvent::SurplusTargetUpdate {
            old_target: update.old,
            new_target,
            timestamp: ctx.timestamp,
        });
        Ok(update)
    }

    pub fn set_buffer_cap(&mut self, ctx: CallContext, new_cap: u128) -> PegResult<ParamUpdate<u128>> {
        self.require_role(&ctx, Role::Governor)?;

        let update = self.buffer.set_buffer_cap(new_cap, ctx.timestamp);
        self.commit(PegEvent::BufferCapUpdate {
            old_cap: update.old,
            new_cap,
            timestamp: ctx.timestamp,
        });
        Ok(update)
    }

    pub fn set_rate_limit_per_second(&mut self, ctx: CallContext, new_rate: u128) -> PegResult<ParamUpdate<u128>> {
        self.require_role(&ctx, Role::Governor)?;

        let update = self.buffer.set_rate_limit_per_second(new_rate, ctx.timestamp)?;
        self.commit(PegEvent::RateLimitPerSecondUpdate {
            old_rate: update.old,
            new_rate,
            timestamp: ctx.timestamp,
        });
        Ok(update)
    }

    pub fn set_oracle(&mut self, ctx: CallContext, oracle: Box<dyn PriceOracle>) -> PegResult<ParamUpdate<Address>> {
        self.require_role(&ctx, Role::Governor)?;

        let update = self.oracle.set_oracle(oracle);
        self.commit(PegEvent::OracleUpdate {
            old_oracle: update.old,
            new_oracle: update.new,
            timestamp: ctx.timestamp,
        });
        Ok(update)
    }

    /// Replace or clear the backup oracle
    pub fn set_backup_oracle(
        &mut self,
        ctx: CallContext,
        backup_oracle: Option<Box<dyn PriceOracle>>,
    ) -> PegResult<ParamUpdate<Option<Address>>> {
        self.require_role(&ctx, Role::Governor)?;

        let update = self.oracle.set_backup_oracle(backup_oracle);
        self.commit(PegEvent::BackupOracleUpdate {
            old_oracle: update.old,
            new_oracle: update.new,
            timestamp: ctx.timestamp,
        });
        Ok(update)
    }

    pub fn set_do_invert(&mut self, ctx: CallContext, do_invert: bool) -> PegResult<ParamUpdate<bool>> {
        self.require_role(&ctx, Role::Governor)?;

        let update = self.oracle.set_do_invert(do_invert);
        self.commit(PegEvent::InvertUpdate {
            old_do_invert: update.old,
            new_do_invert: do_invert,
            timestamp: ctx.timestamp,
        });
        Ok(update)
    }

    pub fn set_decimals_normalizer(&mut self, ctx: CallContext, decimals_normalizer: i32) -> PegResult<ParamUpdate<i32>> {
        self.require_role(&ctx, Role::Governor)?;

        let update = self.oracle.set_decimals_normalizer(decimals_normalizer)?;
        self.commit(PegEvent::DecimalsNormalizerUpdate {
            old_normalizer: update.old,
            new_normalizer: decimals_normalizer,
            timestamp: ctx.timestamp,
        });
        Ok(update)
    }

    /// Choose whether redeem toggles work while globally paused
    pub fn set_redeem_pause_policy(
        &mut self,
        ctx: CallContext,
        policy: RedeemPausePolicy,
    ) -> PegResult<ParamUpdate<RedeemPausePolicy>> {
        self.require_role(&ctx, Role::Governor)?;

        let update = ParamUpdate::new(self.config.redeem_pause_policy, policy);
        self.config.redeem_pause_policy = policy;
        self.commit(PegEvent::RedeemPausePolicyUpdate {
            old_policy: update.old,
            new_policy: policy,
            timestamp: ctx.timestamp,
        });
        Ok(update)
    }

    /// Grant `role` to `account` (Governor); `false` if already held
    pub fn grant_role(&mut self, ctx: CallContext, role: Role, account: Address) -> PegResult<bool> {
        let granted = access_control::grant_role(&mut self.access, ctx.caller, account, role, ctx.timestamp)?;
        if granted {
            self.events.emit(PegEvent::RoleGranted {
                role,
                account,
                by: ctx.caller,
                timestamp: ctx.timestamp,
            });
        }
        Ok(granted)
    }

    /// Revoke `role` from `account` (Governor); `false` if not held
    pub fn revoke_role(&mut self, ctx: CallContext, role: Role, account: Address) -> PegResult<bool> {
        let revoked = access_control::revoke_role(&mut self.access, ctx.caller, account, role, ctx.timestamp)?;
        if revoked {
            self.events.emit(PegEvent::RoleRevoked {
                role,
                account,
                by: ctx.caller,
                timestamp: ctx.timestamp,
            });
        }
        Ok(revoked)
    }
}

// ============ Tests ============
