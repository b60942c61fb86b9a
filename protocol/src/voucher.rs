//! # Voucher Store
//!
//! Single-use value vouchers: transferable claims for a fixed amount of
//! ledger value. A voucher is a multi-token position — the holder's
//! *quantity* can be split and merged across addresses like any fungible
//! token — but redemption is all-or-nothing: whoever holds a non-zero
//! quantity may consume the voucher's entire face value exactly once.
//!
//! The store is pure inventory. It knows nothing about the ledger; the
//! treasury facade pairs [`redeemable`](VoucherStore::redeemable) /
//! [`mark_used`](VoucherStore::mark_used) with the corresponding ledger
//! transfer inside one atomic operation, so a failed credit can never leave
//! a voucher half-burned.
//!
//! Once used, a voucher record is frozen: the value fields stay readable as
//! a historical receipt, but quantity transfers and second redemptions are
//! refused.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DEFAULT_VOUCHER_MIN_VALUE;
use crate::entity::Address;

/// Voucher token identifier. Monotonically increasing from 1; never reused.
pub type VoucherId = u64;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during voucher operations.
#[derive(Debug, Error)]
pub enum VoucherError {
    /// The referenced voucher ID was never generated.
    #[error("voucher {0} does not exist")]
    VoucherNotExists(VoucherId),

    /// The voucher has already been redeemed. Used is a one-way flag.
    #[error("voucher {0} is already used")]
    VoucherIsUsed(VoucherId),

    /// The caller holds zero quantity of this voucher.
    #[error("{holder} is not a holder of voucher {voucher}")]
    NotOwnerOfVoucher {
        /// The voucher being redeemed.
        voucher: VoucherId,
        /// The address that attempted the redemption.
        holder: Address,
    },

    /// Zero-value vouchers are meaningless and rejected outright.
    #[error("voucher amount is zero")]
    AmountIsZero,

    /// A quantity transfer exceeds what the sender holds.
    #[error(
        "insufficient quantity: {holder} holds {available} of voucher {voucher}, requested {requested}"
    )]
    InsufficientQuantity {
        /// The voucher being transferred.
        voucher: VoucherId,
        /// The sending address.
        holder: Address,
        /// Quantity held at the time of the attempt.
        available: u64,
        /// Quantity the caller tried to move.
        requested: u64,
    },

    /// The value being converted into a voucher is below the configured floor.
    #[error("value {value} is below the voucher minimum of {minimum}")]
    BelowMinimumValue {
        /// The offered value.
        value: u64,
        /// The configured floor.
        minimum: u64,
    },
}

// ---------------------------------------------------------------------------
// Voucher
// ---------------------------------------------------------------------------

/// A single voucher record.
///
/// `value` is the face value fixed at generation; it is what redemption
/// credits to the target entity regardless of how the holder quantity has
/// been split in the meantime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    /// Token ID assigned at generation.
    pub id: VoucherId,
    /// Face value in ledger units.
    pub value: u64,
    /// Whether the voucher has been redeemed. Monotonic false → true.
    pub used: bool,
    /// Address the initial quantity was issued to.
    pub issued_to: Address,
    /// Timestamp of generation.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// VoucherStore
// ---------------------------------------------------------------------------

/// Inventory of all vouchers ever generated, plus per-address quantity
/// holdings.
///
/// Generation credits the recipient with a quantity equal to the face
/// value, mirroring the platform's multi-token semantics where one unit of
/// quantity represents one unit of claimed value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoucherStore {
    /// Voucher records by ID. BTreeMap keeps audit iteration ordered.
    vouchers: BTreeMap<VoucherId, Voucher>,
    /// Quantity held per address, per voucher.
    holdings: HashMap<VoucherId, HashMap<Address, u64>>,
    /// Next token ID to assign.
    next_id: VoucherId,
    /// Minimum ledger value convertible into a single voucher.
    min_issue_value: u64,
}

impl VoucherStore {
    /// Creates an empty store with the default conversion floor.
    pub fn new() -> Self {
        Self {
            vouchers: BTreeMap::new(),
            holdings: HashMap::new(),
            next_id: 1,
            min_issue_value: DEFAULT_VOUCHER_MIN_VALUE,
        }
    }

    /// Generates a new voucher of face value `value` and credits the full
    /// quantity to `recipient`. Returns the new token ID.
    ///
    /// # Errors
    ///
    /// Returns [`VoucherError::AmountIsZero`] if `value` is 0.
    pub fn generate(&mut self, value: u64, recipient: &str) -> Result<VoucherId, VoucherError> {
        if value == 0 {
            return Err(VoucherError::AmountIsZero);
        }

        let id = self.next_id;
        self.next_id += 1;

        self.vouchers.insert(
            id,
            Voucher {
                id,
                value,
                used: false,
                issued_to: recipient.to_string(),
                created_at: Utc::now(),
            },
        );
        self.holdings
            .entry(id)
            .or_default()
            .insert(recipient.to_string(), value);

        Ok(id)
    }

    /// Moves `quantity` of voucher `id` from `from` to `to`.
    ///
    /// Quantity transfers never touch the `used` flag or the face value.
    ///
    /// # Errors
    ///
    /// Returns [`VoucherError::VoucherNotExists`] for unknown IDs.
    /// Returns [`VoucherError::VoucherIsUsed`] — used vouchers are frozen.
    /// Returns [`VoucherError::InsufficientQuantity`] if `from` holds less
    /// than `quantity`.
    pub fn transfer(
        &mut self,
        id: VoucherId,
        from: &str,
        to: &str,
        quantity: u64,
    ) -> Result<(), VoucherError> {
        let voucher = self
            .vouchers
            .get(&id)
            .ok_or(VoucherError::VoucherNotExists(id))?;
        if voucher.used {
            return Err(VoucherError::VoucherIsUsed(id));
        }

        let holders = self.holdings.entry(id).or_default();
        let available = holders.get(from).copied().unwrap_or(0);
        if available < quantity {
            return Err(VoucherError::InsufficientQuantity {
                voucher: id,
                holder: from.to_string(),
                available,
                requested: quantity,
            });
        }

        if from == to || quantity == 0 {
            return Ok(());
        }

        holders.insert(from.to_string(), available - quantity);
        *holders.entry(to.to_string()).or_insert(0) += quantity;
        Ok(())
    }

    /// Quantity of voucher `id` held by `holder`. Unknown vouchers and
    /// non-holders read as 0.
    pub fn holder_balance(&self, id: VoucherId, holder: &str) -> u64 {
        self.holdings
            .get(&id)
            .and_then(|h| h.get(holder))
            .copied()
            .unwrap_or(0)
    }

    /// Returns the voucher record, or `None` if never generated.
    pub fn get(&self, id: VoucherId) -> Option<&Voucher> {
        self.vouchers.get(&id)
    }

    /// Validates a redemption without mutating anything and returns the
    /// face value that would be credited.
    ///
    /// Check order is part of the contract: existence, then used-state,
    /// then holdership — a second redemption by the original holder reports
    /// [`VoucherError::VoucherIsUsed`], not a holdership failure.
    pub fn redeemable(&self, id: VoucherId, holder: &str) -> Result<u64, VoucherError> {
        let voucher = self
            .vouchers
            .get(&id)
            .ok_or(VoucherError::VoucherNotExists(id))?;
        if voucher.used {
            return Err(VoucherError::VoucherIsUsed(id));
        }
        if self.holder_balance(id, holder) == 0 {
            return Err(VoucherError::NotOwnerOfVoucher {
                voucher: id,
                holder: holder.to_string(),
            });
        }
        Ok(voucher.value)
    }

    /// Irreversibly marks a voucher as used. Called by the treasury after
    /// the ledger credit has committed.
    ///
    /// # Errors
    ///
    /// Returns [`VoucherError::VoucherNotExists`] / [`VoucherError::VoucherIsUsed`]
    /// under the same conditions as [`redeemable`](Self::redeemable).
    pub fn mark_used(&mut self, id: VoucherId) -> Result<(), VoucherError> {
        let voucher = self
            .vouchers
            .get_mut(&id)
            .ok_or(VoucherError::VoucherNotExists(id))?;
        if voucher.used {
            return Err(VoucherError::VoucherIsUsed(id));
        }
        voucher.used = true;
        Ok(())
    }

    /// Rejects conversion values under the configured floor.
    pub fn check_issue_value(&self, value: u64) -> Result<(), VoucherError> {
        if value == 0 {
            return Err(VoucherError::AmountIsZero);
        }
        if value < self.min_issue_value {
            return Err(VoucherError::BelowMinimumValue {
                value,
                minimum: self.min_issue_value,
            });
        }
        Ok(())
    }

    /// Updates the conversion floor. Gating is the treasury's concern.
    pub fn set_min_issue_value(&mut self, minimum: u64) {
        self.min_issue_value = minimum;
    }

    /// The configured conversion floor.
    pub fn min_issue_value(&self) -> u64 {
        self.min_issue_value
    }

    /// Number of vouchers ever generated, used ones included.
    pub fn count(&self) -> usize {
        self.vouchers.len()
    }
}

impl Default for VoucherStore {
    fn default() -> Self {
        Self::new()
    }
}
