//! Token Operations Module
//!
//! Interfaces to the assets the engine moves: the reserve asset, the
//! protocol token it mints and burns, and the PCV deposit that receives
//! swept surplus. The engine only ever talks to these traits.
//!
//! Each trait has a blanket impl for `Rc<RefCell<T>>`, so a host can hand
//! the engine one handle and keep another for inspection.

use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::PegResult;
use crate::types::Address;

// ============================================================================
// Traits
// ============================================================================

/// A fungible asset with balances and delegated transfers
pub trait FungibleAsset {
    /// Identifier of the asset
    fn asset_id(&self) -> Address;

    /// Decimals of the smallest unit
    fn decimals(&self) -> u8;

    fn balance_of(&self, account: &Address) -> u128;

    fn total_supply(&self) -> u128;

    /// Move `amount` from `from` to `to`; `from` authorises directly
    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> PegResult<()>;

    /// Move `amount` from `from` to `to` on `spender`'s allowance
    fn transfer_from(&mut self, spender: Address, from: Address, to: Address, amount: u128) -> PegResult<()>;
}

/// The protocol token: a fungible asset with gated minting
pub trait MintableToken: FungibleAsset {
    /// Create `amount` for `to`; `minter` must hold a minting grant
    fn mint(&mut self, minter: Address, to: Address, amount: u128) -> PegResult<()>;

    /// Destroy `amount` held by `holder`
    fn burn(&mut self, holder: Address, amount: u128) -> PegResult<()>;
}

/// Destination for swept reserve surplus
pub trait PcvDeposit {
    /// Address that receives the surplus transfer
    fn address(&self) -> Address;

    /// Put newly received funds to work; returns the amount deposited
    fn deposit(&mut self) -> PegResult<u128>;
}

// ============================================================================
// Shared handles
// ============================================================================

impl<T: FungibleAsset + ?Sized> FungibleAsset for Rc<RefCell<T>> {
    fn asset_id(&self) -> Address {
        self.borrow().asset_id()
    }

    fn decimals(&self) -> u8 {
        self.borrow().decimals()
    }

    fn balance_of(&self, account: &Address) -> u128 {
        self.borrow().balance_of(account)
    }

    fn total_supply(&self) -> u128 {
        self.borrow().total_supply()
    }

    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> PegResult<()> {
        self.borrow_mut().transfer(from, to, amount)
    }

    fn transfer_from(&mut self, spender: Address, from: Address, to: Address, amount: u128) -> PegResult<()> {
        self.borrow_mut().transfer_from(spender, from, to, amount)
    }
}

impl<T: MintableToken + ?Sized> MintableToken for Rc<RefCell<T>> {
    fn mint(&mut self, minter: Address, to: Address, amount: u128) -> PegResult<()> {
        self.borrow_mut().mint(minter, to, amount)
    }

    fn burn(&mut self, holder: Address, amount: u128) -> PegResult<()> {
        self.borrow_mut().burn(holder, amount)
    }
}

impl<T: PcvDeposit + ?Sized> PcvDeposit for Rc<RefCell<T>> {
    fn address(&self) -> Address {
        self.borrow().address()
    }

    fn deposit(&mut self) -> PegResult<u128> {
        self.borrow_mut().deposit()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PegError;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct Points {
        balances: BTreeMap<Address, u128>,
    }

    impl FungibleAsset for Points {
        fn asset_id(&self) -> Address {
            [0xAA; 32]
        }

        fn decimals(&self) -> u8 {
            0
        }

        fn balance_of(&self, account: &Address) -> u128 {
            self.balances.get(account).copied().unwrap_or(0)
        }

        fn total_supply(&self) -> u128 {
            self.balances.values().sum()
        }

        fn transfer(&mut self, from: Address, to: Address, amount: u128) -> PegResult<()> {
            let available = self.balance_of(&from);
            if available < amount {
                return Err(PegError::InsufficientBalance { available, requested: amount });
            }
            self.balances.insert(from, available - amount);
            *self.balances.entry(to).or_insert(0) += amount;
            Ok(())
        }

        fn transfer_from(&mut self, _spender: Address, from: Address, to: Address, amount: u128) -> PegResult<()> {
            self.transfer(from, to, amount)
        }
    }

    #[test]
    fn test_shared_handle_sees_writes() {
        let ledger = Rc::new(RefCell::new(Points::default()));
        ledger.borrow_mut().balances.insert([1u8; 32], 50);

        let mut handle: Box<dyn FungibleAsset> = Box::new(ledger.clone());
        handle.transfer([1u8; 32], [2u8; 32], 20).unwrap();

        assert_eq!(ledger.borrow().balance_of(&[2u8; 32]), 20);
        assert_eq!(handle.balance_of(&[1u8; 32]), 30);
        assert_eq!(handle.total_supply(), 50);
        assert!(matches!(
            handle.transfer([1u8; 32], [2u8; 32], 31),
            Err(PegError::InsufficientBalance { available: 30, requested: 31 })
        ));
    }
}
