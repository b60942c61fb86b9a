//! # Value Ledger
//!
//! Balance accounting keyed by entity ID. The ledger enforces the two
//! invariants everything else leans on:
//!
//! 1. **No negative balances.** Amounts are `u64` and every debit is
//!    checked before it is applied.
//! 2. **Conservation.** A transfer moves value atomically between two
//!    entities; the sum of all balances only changes through the explicit
//!    supply operations [`mint`](Ledger::mint) and [`burn`](Ledger::burn).
//!
//! Reserve-backed issuance — "minting to a user" in platform parlance — is
//! deliberately *not* a supply operation: it is a plain transfer out of the
//! reserve entity, so the conservation law holds by construction. Callers
//! that want new supply must go through `mint`, which is gated behind
//! governance at the treasury layer.
//!
//! The ledger itself performs no authorization. It is a dumb, correct book;
//! the treasury facade decides who may ask it to move what.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RESERVE_ENTITY;
use crate::entity::EntityId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Zero-amount operations are rejected: they are no-ops and almost
    /// always indicate a bug in the caller.
    #[error("invalid amount: value operations require a non-zero amount")]
    InvalidAmount,

    /// A debit exceeds the entity's available balance.
    #[error(
        "insufficient balance: entity {entity} holds {available}, requested {requested}"
    )]
    InsufficientBalance {
        /// The entity being debited.
        entity: EntityId,
        /// Balance at the time of the attempt.
        available: u64,
        /// Amount the caller tried to move.
        requested: u64,
    },

    /// A credit would overflow `u64`. Either a bug or an attack; both
    /// deserve a hard stop.
    #[error("balance overflow: entity {entity} at {current}, credit {credit}")]
    Overflow {
        /// The entity being credited.
        entity: EntityId,
        /// Balance before the failed credit.
        current: u64,
        /// The amount that caused the overflow.
        credit: u64,
    },
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The balance book: entity ID to non-negative value amount.
///
/// Total supply is tracked alongside the balances so conservation can be
/// asserted in O(1); [`circulating`](Ledger::circulating) recomputes it from
/// scratch for audits and tests.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ledger {
    /// Balances in smallest units. Entities absent from the map hold zero.
    balances: HashMap<EntityId, u64>,
    /// Sum of all balances. Changes only in `mint` and `burn`.
    total_supply: u64,
}

impl Ledger {
    /// Creates a ledger with the entire genesis supply credited to the
    /// reserve entity.
    pub fn genesis(initial_supply: u64) -> Self {
        let mut balances = HashMap::new();
        balances.insert(RESERVE_ENTITY, initial_supply);
        Self {
            balances,
            total_supply: initial_supply,
        }
    }

    /// Returns the balance of `entity`. Never-seen entities hold zero.
    pub fn balance_of(&self, entity: EntityId) -> u64 {
        self.balances.get(&entity).copied().unwrap_or(0)
    }

    /// Current total supply.
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Recomputes the sum of all balances. Audit helper; always equals
    /// [`total_supply`](Ledger::total_supply).
    pub fn circulating(&self) -> u64 {
        self.balances.values().sum()
    }

    /// Creates new supply and credits it to `entity`.
    ///
    /// This is the only operation (besides `burn`) that changes total
    /// supply. Authorization is the treasury's problem, not the ledger's.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] if `amount` is 0.
    /// Returns [`LedgerError::Overflow`] if the credit would exceed `u64::MAX`.
    pub fn mint(&mut self, entity: EntityId, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let current = self.balance_of(entity);
        let new_balance = current.checked_add(amount).ok_or(LedgerError::Overflow {
            entity,
            current,
            credit: amount,
        })?;
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow {
                entity,
                current: self.total_supply,
                credit: amount,
            })?;

        self.balances.insert(entity, new_balance);
        self.total_supply = new_supply;
        Ok(new_balance)
    }

    /// Destroys `amount` of `entity`'s balance, shrinking total supply.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] if `amount` is 0.
    /// Returns [`LedgerError::InsufficientBalance`] if the entity holds less
    /// than `amount`.
    pub fn burn(&mut self, entity: EntityId, amount: u64) -> Result<u64, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let available = self.balance_of(entity);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                entity,
                available,
                requested: amount,
            });
        }

        let remaining = available - amount;
        self.balances.insert(entity, remaining);
        self.total_supply -= amount;
        Ok(remaining)
    }

    /// Moves `amount` from `from` to `to` atomically.
    ///
    /// Both sides commit or neither does: the debit is validated and the
    /// credit overflow-checked before either balance is written. A transfer
    /// to self validates the same preconditions and then changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] if `amount` is 0.
    /// Returns [`LedgerError::InsufficientBalance`] if `from` lacks funds.
    /// Returns [`LedgerError::Overflow`] if `to` would exceed `u64::MAX`.
    pub fn transfer(
        &mut self,
        from: EntityId,
        to: EntityId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(LedgerError::InsufficientBalance {
                entity: from,
                available: from_balance,
                requested: amount,
            });
        }

        if from == to {
            return Ok(());
        }

        let to_balance = self.balance_of(to);
        let to_after = to_balance.checked_add(amount).ok_or(LedgerError::Overflow {
            entity: to,
            current: to_balance,
            credit: amount,
        })?;

        self.balances.insert(from, from_balance - amount);
        self.balances.insert(to, to_after);
        Ok(())
    }
}
