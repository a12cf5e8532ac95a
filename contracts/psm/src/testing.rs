//! Shared fixture for engine tests
//!
//! Wires an engine to real token ledgers, a fixed-price oracle and a reserve
//! PCV deposit, keeping `Rc` handles so tests can inspect and poke them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pegkeeper_common::{
    access_control::Role,
    constants::precision::SCALE,
    errors::{PegError, PegResult},
    token_ops::{FungibleAsset, MintableToken, PcvDeposit},
    types::{Address, CallContext},
};
use pegkeeper_price_oracle::FixedPriceOracle;
use pegkeeper_token::{ReservePcvDeposit, TokenLedger, TokenMetadata, UNLIMITED_ALLOWANCE};

use crate::{PegStabilityEngine, PsmCollaborators, PsmParams};

// ============ Accounts ============

pub const GOVERNOR: Address = [1u8; 32];
pub const GUARDIAN: Address = [2u8; 32];
pub const PCV_CONTROLLER: Address = [3u8; 32];
pub const ALICE: Address = [4u8; 32];
pub const BOB: Address = [5u8; 32];
pub const TOKEN_ADMIN: Address = [6u8; 32];

pub const ENGINE_SEED: &[u8] = b"rsv-psm";
pub const T0: u64 = 1_700_000_000;

pub fn ctx(caller: Address, timestamp: u64) -> CallContext {
    CallContext::new(caller, timestamp)
}

// ============ Test Doubles ============

/// Surplus target with the zero address
pub struct ZeroAddressDeposit;

impl PcvDeposit for ZeroAddressDeposit {
    fn address(&self) -> Address {
        [0u8; 32]
    }

    fn deposit(&mut self) -> PegResult<u128> {
        Ok(0)
    }
}

/// Surplus target that forwards what it holds onward, then fails its hook
pub struct ForwardingDeposit {
    pub address: Address,
    pub onward: Address,
    pub reserve: Rc<RefCell<TokenLedger>>,
}

impl PcvDeposit for ForwardingDeposit {
    fn address(&self) -> Address {
        self.address
    }

    fn deposit(&mut self) -> PegResult<u128> {
        let held = self.reserve.borrow().balance_of(&self.address);
        self.reserve.borrow_mut().transfer(self.address, self.onward, held)?;
        Err(PegError::InvalidParameter {
            param: "deposit",
            reason: "rejected",
        })
    }
}

/// Switches that make a wrapped ledger fail on demand
#[derive(Debug, Default)]
pub struct Faults {
    pub transfer: Cell<bool>,
    pub burn: Cell<bool>,
}

fn injected(op: &'static str) -> PegError {
    PegError::InvalidParameter {
        param: op,
        reason: "injected failure",
    }
}

/// Ledger handle whose `transfer` and `burn` fail while the switch is on
pub struct FaultyLedger {
    pub inner: Rc<RefCell<TokenLedger>>,
    pub faults: Rc<Faults>,
}

impl FungibleAsset for FaultyLedger {
    fn asset_id(&self) -> Address {
        self.inner.borrow().asset_id()
    }

    fn decimals(&self) -> u8 {
        self.inner.borrow().decimals()
    }

    fn balance_of(&self, account: &Address) -> u128 {
        self.inner.borrow().balance_of(account)
    }

    fn total_supply(&self) -> u128 {
        self.inner.borrow().total_supply()
    }

    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> PegResult<()> {
        if self.faults.transfer.get() {
            return Err(injected("transfer"));
        }
        self.inner.borrow_mut().transfer(from, to, amount)
    }

    fn transfer_from(&mut self, spender: Address, from: Address, to: Address, amount: u128) -> PegResult<()> {
        self.inner.borrow_mut().transfer_from(spender, from, to, amount)
    }
}

impl MintableToken for FaultyLedger {
    fn mint(&mut self, minter: Address, to: Address, amount: u128) -> PegResult<()> {
        self.inner.borrow_mut().mint(minter, to, amount)
    }

    fn burn(&mut self, holder: Address, amount: u128) -> PegResult<()> {
        if self.faults.burn.get() {
            return Err(injected("burn"));
        }
        self.inner.borrow_mut().burn(holder, amount)
    }
}

// ============ Fixture ============

pub struct Fixture {
    pub engine: PegStabilityEngine,
    pub token: Rc<RefCell<TokenLedger>>,
    pub reserve: Rc<RefCell<TokenLedger>>,
    pub oracle: Rc<RefCell<FixedPriceOracle>>,
    pub pcv: Rc<RefCell<ReservePcvDeposit>>,
    /// Failure switches on the engine's token handle
    pub token_faults: Rc<Faults>,
    /// Failure switches on the engine's reserve handle
    pub reserve_faults: Rc<Faults>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new(PsmParams::default())
    }
}

impl Fixture {
    pub fn new(params: PsmParams) -> Self {
        Self::try_new(params).unwrap()
    }

    /// Engine at price 1.0 with Guardian and PCV controller granted
    pub fn try_new(params: PsmParams) -> PegResult<Self> {
        let token = Rc::new(RefCell::new(TokenLedger::new(
            TokenMetadata::new("Peg USD", "pUSD", 18),
            TOKEN_ADMIN,
        )));
        let reserve = Rc::new(RefCell::new(TokenLedger::new(
            TokenMetadata::new("Reserve", "RSV", 18),
            TOKEN_ADMIN,
        )));
        let oracle = Rc::new(RefCell::new(FixedPriceOracle::new(b"primary", SCALE)));
        let pcv = Rc::new(RefCell::new(ReservePcvDeposit::new(b"treasury", Box::new(reserve.clone()))));

        let token_faults = Rc::new(Faults::default());
        let reserve_faults = Rc::new(Faults::default());

        let collaborators = PsmCollaborators {
            token: Box::new(FaultyLedger { inner: token.clone(), faults: token_faults.clone() }),
            reserve: Box::new(FaultyLedger { inner: reserve.clone(), faults: reserve_faults.clone() }),
            oracle: Box::new(oracle.clone()),
            backup_oracle: None,
            surplus_target: Box::new(pcv.clone()),
        };
        let mut engine = PegStabilityEngine::new(ENGINE_SEED, GOVERNOR, params, collaborators, T0)?;

        engine.grant_role(ctx(GOVERNOR, T0), Role::Guardian, GUARDIAN)?;
        engine.grant_role(ctx(GOVERNOR, T0), Role::PcvController, PCV_CONTROLLER)?;
        engine.drain_events();

        token.borrow_mut().grant_minter(TOKEN_ADMIN, engine.address())?;
        token.borrow_mut().grant_minter(TOKEN_ADMIN, TOKEN_ADMIN)?;
        reserve.borrow_mut().grant_minter(TOKEN_ADMIN, TOKEN_ADMIN)?;

        Ok(Self {
            engine,
            token,
            reserve,
            oracle,
            pcv,
            token_faults,
            reserve_faults,
        })
    }

    pub fn set_price(&self, price: u128) {
        self.oracle.borrow_mut().price = price;
    }

    /// Make the primary oracle report an invalid reading
    pub fn invalidate_price(&self) {
        self.set_price(0);
    }

    pub fn new_oracle(&self, seed: &[u8], price: u128) -> Rc<RefCell<FixedPriceOracle>> {
        Rc::new(RefCell::new(FixedPriceOracle::new(seed, price)))
    }

    pub fn new_pcv(&self, seed: &[u8]) -> Rc<RefCell<ReservePcvDeposit>> {
        Rc::new(RefCell::new(ReservePcvDeposit::new(seed, Box::new(self.reserve.clone()))))
    }

    pub fn pcv_address(&self) -> Address {
        self.pcv.borrow().address()
    }

    /// Mint reserve to `account` and approve the engine to pull it
    pub fn fund_reserve(&self, account: Address, amount: u128) {
        let mut reserve = self.reserve.borrow_mut();
        reserve.mint(TOKEN_ADMIN, account, amount).unwrap();
        if account != self.engine.address() {
            reserve.approve(account, self.engine.address(), UNLIMITED_ALLOWANCE);
        }
    }

    /// Mint the token to `account` and approve the engine to pull it
    pub fn fund_token(&self, account: Address, amount: u128) {
        let mut token = self.token.borrow_mut();
        token.mint(TOKEN_ADMIN, account, amount).unwrap();
        if account != self.engine.address() {
            token.approve(account, self.engine.address(), UNLIMITED_ALLOWANCE);
        }
    }

    pub fn reserve_balance(&self, account: &Address) -> u128 {
        self.reserve.borrow().balance_of(account)
    }

    pub fn token_balance(&self, account: &Address) -> u128 {
        self.token.borrow().balance_of(account)
    }

    pub fn token_supply(&self) -> u128 {
        self.token.borrow().total_supply()
    }
}
