//! # Protocol Configuration & Constants
//!
//! Every magic number in the Tessera core lives here. If you're hardcoding
//! a constant somewhere else, you're doing it wrong.
//!
//! These values define the economics of the platform. The fee ceiling and
//! the reserve entity binding in particular are load-bearing: other modules
//! validate against them at construction time, not just at mutation time.

use crate::entity::EntityId;

// ---------------------------------------------------------------------------
// Reserve & Supply
// ---------------------------------------------------------------------------

/// The entity that acts as source and sink for system-level value movements.
/// Entity ID 1 is bound to the bank treasury's own address at directory
/// construction and is never reassigned.
pub const RESERVE_ENTITY: EntityId = 1;

/// Genesis balance credited to the reserve entity. All reserve-backed
/// issuance (withdrawals, voucher redemptions) draws down from this pool;
/// conversions of user balances into vouchers flow back into it.
pub const INITIAL_SUPPLY: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Fee Parameters
// ---------------------------------------------------------------------------

/// Basis-point denominator. 10_000 bps = 100%.
pub const BPS_MAX: u16 = 10_000;

/// Ceiling for the treasury fee. Half of everything is already an offensive
/// amount to charge; anything above it is a configuration bug.
pub const MAX_TREASURY_FEE_BPS: u16 = BPS_MAX / 2;

/// Default treasury fee applied at registry construction: 0.50%.
pub const DEFAULT_TREASURY_FEE_BPS: u16 = 50;

/// Default flat royalty (in value units) charged per publication by the
/// publishing collaborators. The core only stores and gates this parameter.
pub const DEFAULT_PUBLISH_ROYALTY: u64 = 100;

// ---------------------------------------------------------------------------
// Vouchers
// ---------------------------------------------------------------------------

/// Minimum ledger value a user may convert into a single voucher. Keeps the
/// voucher table from filling up with dust claims.
pub const DEFAULT_VOUCHER_MIN_VALUE: u64 = 100;

// ---------------------------------------------------------------------------
// Treasury Multisig
// ---------------------------------------------------------------------------

/// Default confirmation quorum for queued treasury transactions. Deployments
/// pass their own signer set and threshold at treasury construction; this is
/// the reference configuration used across the test suites.
pub const DEFAULT_CONFIRMATIONS_REQUIRED: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_entity_is_one() {
        // The directory, the ledger genesis, and the treasury all assume this.
        assert_eq!(RESERVE_ENTITY, 1);
    }

    #[test]
    fn fee_ceiling_is_half_of_bps_max() {
        assert_eq!(MAX_TREASURY_FEE_BPS, 5_000);
        assert!(MAX_TREASURY_FEE_BPS < BPS_MAX);
    }

    #[test]
    fn default_fee_is_under_ceiling() {
        assert!(DEFAULT_TREASURY_FEE_BPS <= MAX_TREASURY_FEE_BPS);
    }

    #[test]
    fn voucher_floor_is_positive() {
        assert!(DEFAULT_VOUCHER_MIN_VALUE > 0);
    }

    #[test]
    fn initial_supply_covers_voucher_floor() {
        // A fresh reserve must be able to back at least one voucher.
        assert!(INITIAL_SUPPLY >= DEFAULT_VOUCHER_MIN_VALUE);
    }
}
