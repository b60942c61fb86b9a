// Copyright (c) 2026 Tessera Core Contributors. MIT License.
// See LICENSE for details.

//! # Tessera Bank Treasury
//!
//! The privileged-operation layer of the Tessera value platform. Where
//! `tessera-protocol` keeps the books, this crate decides who may write in
//! them:
//!
//! - **Multisig Queue** — M-of-N confirmation tracking for queued treasury
//!   actions: submit, confirm, revoke, execute-once.
//! - **Bank Treasury** — the single atomic facade over the ledger, voucher
//!   store, registry, and queue. Reserve withdrawals, voucher redemption
//!   and issuance, supply minting, and registry administration all enter
//!   here, behind one lock.
//!
//! ## Design Principles
//!
//! 1. Authorization is checked before anything else — unauthorized callers
//!    learn nothing about protocol state.
//! 2. Every public operation commits all of its effects or none of them.
//!    Multi-store operations are ordered so the irreversible step (marking
//!    a voucher used, flagging a transaction executed) happens last.
//! 3. Two authorization tiers, kept distinct on purpose: governance-direct
//!    actions carry a single trusted identity; quorum-gated actions prove
//!    M-of-N confirmation instead. Neither is a special case of the other.

pub mod bank;
pub mod multisig;

pub use bank::{BankError, BankTreasury};
pub use multisig::{MultisigError, MultisigQueue, QueuedTransaction, TreasuryAction, TxId};
