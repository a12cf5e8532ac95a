//! pegkeeper Token Ledger
//!
//! Account-based fungible token used both as the protocol token and as a
//! reserve asset. Only accounts holding a minter grant can create supply;
//! any holder can burn its own balance.
//!
//! The ledger collects its own events; hosts drain them after each call.

use std::collections::{BTreeMap, BTreeSet};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::debug;

use pegkeeper_common::{
    constants::domains,
    errors::{PegError, PegResult},
    events::{EventLog, PegEvent},
    token_ops::{FungibleAsset, MintableToken},
    types::{derive_address, Address},
};

pub mod pcv_deposit;

pub use pcv_deposit::ReservePcvDeposit;

/// Allowance that is never decremented
pub const UNLIMITED_ALLOWANCE: u128 = u128::MAX;

// ============ Token Metadata ============

/// Static description of a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMetadata {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }

    /// Asset identifier derived from the symbol
    pub fn asset_id(&self) -> Address {
        derive_address(domains::ASSET, self.symbol.as_bytes())
    }
}

// ============ Token Ledger ============

/// Balances, allowances and minter grants for one token
#[derive(Debug, Clone)]
pub struct TokenLedger {
    metadata: TokenMetadata,
    asset_id: Address,
    /// Can grant and revoke minters
    admin: Address,
    minters: BTreeSet<Address>,
    balances: BTreeMap<Address, u128>,
    /// (owner, spender) -> remaining allowance
    allowances: BTreeMap<(Address, Address), u128>,
    total_supply: u128,
    events: EventLog,
}

impl TokenLedger {
    /// Create an empty ledger administered by `admin`
    pub fn new(metadata: TokenMetadata, admin: Address) -> Self {
        let asset_id = metadata.asset_id();
        Self {
            metadata,
            asset_id,
            admin,
            minters: BTreeSet::new(),
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            total_supply: 0,
            events: EventLog::new(),
        }
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn is_minter(&self, account: &Address) -> bool {
        self.minters.contains(account)
    }

    /// Events emitted so far
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Take all emitted events
    pub fn drain_events(&mut self) -> Vec<PegEvent> {
        self.events.drain()
    }

    fn require_admin(&self, caller: &Address) -> PegResult<()> {
        if *caller != self.admin {
            return Err(PegError::Unauthorized {
                account: *caller,
                required: "TOKEN_ADMIN",
            });
        }
        Ok(())
    }

    /// Allow `minter` to create supply
    pub fn grant_minter(&mut self, caller: Address, minter: Address) -> PegResult<()> {
        self.require_admin(&caller)?;
        if self.minters.insert(minter) {
            self.events.emit(PegEvent::MinterGranted {
                asset: self.asset_id,
                minter,
            });
        }
        Ok(())
    }

    /// Withdraw a minter grant
    pub fn revoke_minter(&mut self, caller: Address, minter: Address) -> PegResult<()> {
        self.require_admin(&caller)?;
        if self.minters.remove(&minter) {
            self.events.emit(PegEvent::MinterRevoked {
                asset: self.asset_id,
                minter,
            });
        }
        Ok(())
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Set `spender`'s allowance over `owner`'s balance
    pub fn approve(&mut self, owner: Address, spender: Address, amount: u128) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
        self.events.emit(PegEvent::Approval {
            asset: self.asset_id,
            owner,
            spender,
            amount,
        });
    }

    fn debit(&mut self, from: &Address, amount: u128) -> PegResult<()> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(PegError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(from);
        } else {
            self.balances.insert(*from, remaining);
        }
        Ok(())
    }

    fn credit(&mut self, to: Address, amount: u128) -> PegResult<()> {
        let balance = self.balances.entry(to).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(PegError::Overflow)?;
        Ok(())
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: u128) -> PegResult<()> {
        if amount == 0 {
            return Err(PegError::ZeroAmount);
        }
        if from != to {
            self.debit(&from, amount)?;
            self.credit(to, amount)?;
        } else if self.balance_of(&from) < amount {
            return Err(PegError::InsufficientBalance {
                available: self.balance_of(&from),
                requested: amount,
            });
        }

        debug!(amount, symbol = %self.metadata.symbol, "token transfer");
        self.events.emit(PegEvent::TokenTransfer {
            asset: self.asset_id,
            from,
            to,
            amount,
        });
        Ok(())
    }
}

impl FungibleAsset for TokenLedger {
    fn asset_id(&self) -> Address {
        self.asset_id
    }

    fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> u128 {
        self.total_supply
    }

    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> PegResult<()> {
        self.move_balance(from, to, amount)
    }

    fn transfer_from(&mut self, spender: Address, from: Address, to: Address, amount: u128) -> PegResult<()> {
        if spender == from {
            return self.move_balance(from, to, amount);
        }

        let allowed = self.allowance(&from, &spender);
        if allowed < amount {
            return Err(PegError::InsufficientAllowance {
                available: allowed,
                requested: amount,
            });
        }

        self.move_balance(from, to, amount)?;
        if allowed != UNLIMITED_ALLOWANCE {
            let remaining = allowed - amount;
            if remaining == 0 {
                self.allowances.remove(&(from, spender));
            } else {
                self.allowances.insert((from, spender), remaining);
            }
        }
        Ok(())
    }
}

impl MintableToken for TokenLedger {
    fn mint(&mut self, minter: Address, to: Address, amount: u128) -> PegResult<()> {
        if !self.is_minter(&minter) {
            return Err(PegError::MintUnauthorized { caller: minter });
        }
        if amount == 0 {
            return Err(PegError::ZeroAmount);
        }

        let new_supply = self.total_supply.checked_add(amount).ok_or(PegError::Overflow)?;
        self.credit(to, amount)?;
        self.total_supply = new_supply;

        self.events.emit(PegEvent::TokenMint {
            asset: self.asset_id,
            to,
            amount,
            new_total_supply: new_supply,
        });
        Ok(())
    }

    fn burn(&mut self, holder: Address, amount: u128) -> PegResult<()> {
        if amount == 0 {
            return Err(PegError::ZeroAmount);
        }

        let new_supply = self.total_supply.checked_sub(amount).ok_or(PegError::Overflow)?;
        self.debit(&holder, amount)?;
        self.total_supply = new_supply;

        self.events.emit(PegEvent::TokenBurn {
            asset: self.asset_id,
            from: holder,
            amount,
            new_total_supply: new_supply,
        });
        Ok(())
    }
}

// ============ Tests ============
