// Copyright (c) 2026 Tessera Core Contributors. MIT License.
// See LICENSE for details.

//! # Tessera Protocol — Accounting Core
//!
//! The accounting and authorization core of the Tessera tokenized-value
//! platform. This crate holds the leaf subsystems: who can hold value, how
//! much they hold, which single-use vouchers exist, and which global switches
//! gate it all. The privileged operations that *move* value between these
//! subsystems live one layer up, in the `tessera-treasury` crate.
//!
//! ## Architecture
//!
//! ```text
//! config.rs   — Protocol constants: supply, fee ceilings, reserve entity
//! entity.rs   — Entity identifiers and the external owner-resolution oracle
//! ledger.rs   — The value ledger: balance accounting keyed by entity
//! voucher.rs  — Single-use value vouchers with transferable quantity
//! registry.rs — Governance parameters, whitelists, protocol pause state
//! ```
//!
//! ## Design Philosophy
//!
//! 1. **All amounts are `u64` in smallest units.** No floating point, no
//!    decimals in arithmetic. Overflow is checked, never wrapped.
//! 2. **Identity is external.** This core reads entity-to-address ownership
//!    through the [`entity::OwnerResolver`] oracle; it never decides it.
//! 3. **Errors are classified, not recovered.** Every failure aborts the
//!    triggering operation whole and surfaces as a typed condition.
//! 4. **Serializable state.** Every persisted record derives `Serialize` and
//!    `Deserialize` so subsystem state can be snapshotted or shipped.

pub mod config;
pub mod entity;
pub mod ledger;
pub mod registry;
pub mod voucher;

pub use entity::{Address, EntityId, OwnerResolver, ProfileDirectory};
pub use ledger::{Ledger, LedgerError};
pub use registry::{ProtocolState, Registry, RegistryError};
pub use voucher::{Voucher, VoucherError, VoucherId, VoucherStore};
