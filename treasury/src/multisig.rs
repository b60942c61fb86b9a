//! # Multisig Confirmation Queue
//!
//! M-of-N confirmation tracking for privileged treasury actions. A signer
//! submits a [`TreasuryAction`]; signers confirm (and may revoke before
//! execution); once the confirmation count reaches the threshold, any signer
//! may execute the transaction exactly once.
//!
//! The queue tracks *authorization state only*. It never applies an action:
//! [`executable`](MultisigQueue::executable) proves quorum and hands the
//! action back to the caller, and [`mark_executed`](MultisigQueue::mark_executed)
//! flips the one-way executed flag afterwards. The bank treasury drives both
//! halves under a single lock so an action can never apply twice.
//!
//! Confirmations are a set, not a tally — the same signer confirming twice
//! is an error, and quorum is insensitive to the order confirmations arrive
//! in.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use tessera_protocol::{Address, EntityId, ProtocolState};

/// Queue-local transaction identifier. Dense indices starting at 0.
pub type TxId = u64;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during multisig queue operations.
#[derive(Debug, Error)]
pub enum MultisigError {
    /// The caller is not one of the configured signers.
    #[error("{caller} is not a treasury signer")]
    NotSigner {
        /// The address that attempted the operation.
        caller: Address,
    },

    /// The referenced transaction ID was never submitted.
    #[error("transaction {0} does not exist")]
    UnknownTransaction(TxId),

    /// The signer already confirmed this transaction.
    #[error("transaction already confirmed by this signer")]
    AlreadyConfirmed,

    /// The signer tried to revoke a confirmation it never gave.
    #[error("transaction not confirmed by this signer")]
    NotConfirmed,

    /// The transaction was already executed. Executed is a one-way flag.
    #[error("transaction {0} already executed")]
    AlreadyExecuted(TxId),

    /// Confirmation count is below the execution threshold.
    #[error("insufficient confirmations: have {have}, need {need}")]
    InsufficientConfirmations {
        /// Confirmations collected so far.
        have: usize,
        /// The configured threshold.
        need: usize,
    },

    /// The signer set or threshold is unusable at construction.
    #[error("invalid signer set: {0}")]
    InvalidSignerSet(&'static str),
}

// ---------------------------------------------------------------------------
// TreasuryAction
// ---------------------------------------------------------------------------

/// A privileged action that requires quorum before the treasury applies it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreasuryAction {
    /// Move value from the reserve to an entity.
    Withdraw {
        /// The receiving entity.
        to: EntityId,
        /// Amount in ledger units.
        amount: u64,
    },
    /// Replace the treasury fee.
    SetTreasuryFee {
        /// New fee in basis points.
        bps: u16,
    },
    /// Replace the governance address.
    SetGovernance {
        /// The new governance address.
        address: Address,
    },
    /// Force the protocol state.
    SetProtocolState {
        /// The target state.
        state: ProtocolState,
    },
}

// ---------------------------------------------------------------------------
// QueuedTransaction
// ---------------------------------------------------------------------------

/// One submitted action and its confirmation state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueuedTransaction {
    /// Queue-local ID.
    pub id: TxId,
    /// The action awaiting quorum.
    pub action: TreasuryAction,
    /// The signer that submitted it.
    pub submitted_by: Address,
    /// Signers that have confirmed. BTreeSet keeps iteration deterministic.
    pub confirmations: BTreeSet<Address>,
    /// Whether the treasury has applied this action.
    pub executed: bool,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Execution timestamp, once applied.
    pub executed_at: Option<DateTime<Utc>>,
}

impl QueuedTransaction {
    /// Number of confirmations collected.
    pub fn confirmation_count(&self) -> usize {
        self.confirmations.len()
    }
}

// ---------------------------------------------------------------------------
// MultisigQueue
// ---------------------------------------------------------------------------

/// The signer set, threshold, and full transaction history.
///
/// Executed transactions stay in the history as receipts; IDs are vector
/// indices and never reused.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultisigQueue {
    /// The fixed signer set. Membership never changes after construction.
    signers: Vec<Address>,
    /// Confirmations required before execution.
    threshold: usize,
    /// Whether submission counts as the submitter's confirmation.
    auto_confirm_on_submit: bool,
    /// Every transaction ever submitted, executed ones included.
    transactions: Vec<QueuedTransaction>,
}

impl MultisigQueue {
    /// Creates a queue over the given signer set.
    ///
    /// # Errors
    ///
    /// Returns [`MultisigError::InvalidSignerSet`] if the set is empty,
    /// contains duplicates, or the threshold is zero or exceeds the set
    /// size.
    pub fn new(signers: Vec<Address>, threshold: usize) -> Result<Self, MultisigError> {
        if signers.is_empty() {
            return Err(MultisigError::InvalidSignerSet(
                "signer set must not be empty",
            ));
        }
        let unique: BTreeSet<&Address> = signers.iter().collect();
        if unique.len() != signers.len() {
            return Err(MultisigError::InvalidSignerSet(
                "signer set contains duplicates",
            ));
        }
        if threshold == 0 || threshold > signers.len() {
            return Err(MultisigError::InvalidSignerSet(
                "threshold must be between 1 and the signer count",
            ));
        }

        Ok(Self {
            signers,
            threshold,
            auto_confirm_on_submit: false,
            transactions: Vec::new(),
        })
    }

    /// Makes submission count as the submitter's own confirmation.
    pub fn with_auto_confirm(mut self) -> Self {
        self.auto_confirm_on_submit = true;
        self
    }

    /// Whether `caller` is in the signer set.
    pub fn is_signer(&self, caller: &str) -> bool {
        self.signers.iter().any(|s| s == caller)
    }

    /// The configured threshold.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of transactions ever submitted.
    pub fn count(&self) -> usize {
        self.transactions.len()
    }

    fn ensure_signer(&self, caller: &str) -> Result<(), MultisigError> {
        if !self.is_signer(caller) {
            return Err(MultisigError::NotSigner {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    /// Queues an action for confirmation and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns [`MultisigError::NotSigner`] for callers outside the set.
    pub fn submit(&mut self, caller: &str, action: TreasuryAction) -> Result<TxId, MultisigError> {
        self.ensure_signer(caller)?;

        let id = self.transactions.len() as TxId;
        let mut confirmations = BTreeSet::new();
        if self.auto_confirm_on_submit {
            confirmations.insert(caller.to_string());
        }
        self.transactions.push(QueuedTransaction {
            id,
            action,
            submitted_by: caller.to_string(),
            confirmations,
            executed: false,
            created_at: Utc::now(),
            executed_at: None,
        });
        info!(tx = id, submitter = caller, "treasury transaction submitted");
        Ok(id)
    }

    /// Records `caller`'s confirmation of transaction `id`.
    ///
    /// # Errors
    ///
    /// Returns [`MultisigError::NotSigner`], [`MultisigError::UnknownTransaction`],
    /// [`MultisigError::AlreadyExecuted`], or [`MultisigError::AlreadyConfirmed`].
    pub fn confirm(&mut self, caller: &str, id: TxId) -> Result<(), MultisigError> {
        self.ensure_signer(caller)?;
        let tx = self.tx_mut(id)?;
        if tx.executed {
            return Err(MultisigError::AlreadyExecuted(id));
        }
        if !tx.confirmations.insert(caller.to_string()) {
            return Err(MultisigError::AlreadyConfirmed);
        }
        debug!(
            tx = id,
            signer = caller,
            have = tx.confirmations.len(),
            "transaction confirmed"
        );
        Ok(())
    }

    /// Withdraws `caller`'s confirmation before execution.
    ///
    /// # Errors
    ///
    /// Returns [`MultisigError::NotConfirmed`] if the caller never confirmed,
    /// plus the same signer/existence/executed checks as
    /// [`confirm`](Self::confirm).
    pub fn revoke(&mut self, caller: &str, id: TxId) -> Result<(), MultisigError> {
        self.ensure_signer(caller)?;
        let tx = self.tx_mut(id)?;
        if tx.executed {
            return Err(MultisigError::AlreadyExecuted(id));
        }
        if !tx.confirmations.remove(caller) {
            return Err(MultisigError::NotConfirmed);
        }
        debug!(tx = id, signer = caller, "confirmation revoked");
        Ok(())
    }

    /// Proves transaction `id` is ready to execute and returns its action.
    ///
    /// The caller applies the action and then calls
    /// [`mark_executed`](Self::mark_executed); holding one lock across both
    /// steps is what makes execute-once hold.
    ///
    /// # Errors
    ///
    /// Returns [`MultisigError::InsufficientConfirmations`] below quorum,
    /// plus the same signer/existence/executed checks as
    /// [`confirm`](Self::confirm).
    pub fn executable(&self, caller: &str, id: TxId) -> Result<&TreasuryAction, MultisigError> {
        self.ensure_signer(caller)?;
        let tx = self
            .transactions
            .get(id as usize)
            .ok_or(MultisigError::UnknownTransaction(id))?;
        if tx.executed {
            return Err(MultisigError::AlreadyExecuted(id));
        }
        let have = tx.confirmations.len();
        if have < self.threshold {
            return Err(MultisigError::InsufficientConfirmations {
                have,
                need: self.threshold,
            });
        }
        Ok(&tx.action)
    }

    /// Flips the one-way executed flag after the action has been applied.
    ///
    /// # Errors
    ///
    /// Returns [`MultisigError::UnknownTransaction`] or
    /// [`MultisigError::AlreadyExecuted`].
    pub fn mark_executed(&mut self, id: TxId) -> Result<(), MultisigError> {
        let tx = self.tx_mut(id)?;
        if tx.executed {
            return Err(MultisigError::AlreadyExecuted(id));
        }
        tx.executed = true;
        tx.executed_at = Some(Utc::now());
        info!(tx = id, "treasury transaction executed");
        Ok(())
    }

    /// Returns the transaction record, or `None` if never submitted.
    pub fn get(&self, id: TxId) -> Option<&QueuedTransaction> {
        self.transactions.get(id as usize)
    }

    fn tx_mut(&mut self, id: TxId) -> Result<&mut QueuedTransaction, MultisigError> {
        self.transactions
            .get_mut(id as usize)
            .ok_or(MultisigError::UnknownTransaction(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "tsr:signer-a";
    const B: &str = "tsr:signer-b";
    const C: &str = "tsr:signer-c";
    const OUTSIDER: &str = "tsr:outsider";

    fn queue() -> MultisigQueue {
        MultisigQueue::new(vec![A.into(), B.into(), C.into()], 3).unwrap()
    }

    fn withdraw() -> TreasuryAction {
        TreasuryAction::Withdraw { to: 2, amount: 500 }
    }

    #[test]
    fn construction_validates_signer_set() {
        assert!(matches!(
            MultisigQueue::new(vec![], 1),
            Err(MultisigError::InvalidSignerSet(_))
        ));
        assert!(matches!(
            MultisigQueue::new(vec![A.into(), A.into()], 1),
            Err(MultisigError::InvalidSignerSet(_))
        ));
        assert!(matches!(
            MultisigQueue::new(vec![A.into(), B.into()], 0),
            Err(MultisigError::InvalidSignerSet(_))
        ));
        assert!(matches!(
            MultisigQueue::new(vec![A.into(), B.into()], 3),
            Err(MultisigError::InvalidSignerSet(_))
        ));
    }

    #[test]
    fn submit_requires_signer() {
        let mut q = queue();
        assert!(matches!(
            q.submit(OUTSIDER, withdraw()),
            Err(MultisigError::NotSigner { .. })
        ));
        assert_eq!(q.count(), 0);
    }

    #[test]
    fn submit_assigns_dense_ids() {
        let mut q = queue();
        assert_eq!(q.submit(A, withdraw()).unwrap(), 0);
        assert_eq!(q.submit(B, withdraw()).unwrap(), 1);
        assert_eq!(q.count(), 2);
        assert_eq!(q.get(0).unwrap().submitted_by, A);
    }

    #[test]
    fn submission_does_not_confirm_by_default() {
        let mut q = queue();
        let id = q.submit(A, withdraw()).unwrap();
        assert_eq!(q.get(id).unwrap().confirmation_count(), 0);
    }

    #[test]
    fn auto_confirm_counts_submitter() {
        let mut q = queue().with_auto_confirm();
        let id = q.submit(A, withdraw()).unwrap();
        assert_eq!(q.get(id).unwrap().confirmation_count(), 1);
        assert!(q.get(id).unwrap().confirmations.contains(A));
    }

    #[test]
    fn double_confirmation_rejected() {
        let mut q = queue();
        let id = q.submit(A, withdraw()).unwrap();
        q.confirm(A, id).unwrap();
        assert!(matches!(
            q.confirm(A, id),
            Err(MultisigError::AlreadyConfirmed)
        ));
        assert_eq!(q.get(id).unwrap().confirmation_count(), 1);
    }

    #[test]
    fn outsider_cannot_confirm() {
        let mut q = queue();
        let id = q.submit(A, withdraw()).unwrap();
        assert!(matches!(
            q.confirm(OUTSIDER, id),
            Err(MultisigError::NotSigner { .. })
        ));
    }

    #[test]
    fn confirm_unknown_transaction_rejected() {
        let mut q = queue();
        assert!(matches!(
            q.confirm(A, 9),
            Err(MultisigError::UnknownTransaction(9))
        ));
    }

    #[test]
    fn executable_below_quorum_rejected() {
        let mut q = queue();
        let id = q.submit(A, withdraw()).unwrap();
        q.confirm(A, id).unwrap();
        q.confirm(B, id).unwrap();
        assert!(matches!(
            q.executable(A, id),
            Err(MultisigError::InsufficientConfirmations { have: 2, need: 3 })
        ));
    }

    #[test]
    fn quorum_is_order_independent() {
        for order in [[A, B, C], [C, A, B], [B, C, A]] {
            let mut q = queue();
            let id = q.submit(A, withdraw()).unwrap();
            for signer in order {
                q.confirm(signer, id).unwrap();
            }
            assert_eq!(q.executable(A, id).unwrap(), &withdraw());
        }
    }

    #[test]
    fn revoke_drops_below_quorum() {
        let mut q = queue();
        let id = q.submit(A, withdraw()).unwrap();
        for signer in [A, B, C] {
            q.confirm(signer, id).unwrap();
        }
        q.revoke(B, id).unwrap();
        assert!(matches!(
            q.executable(A, id),
            Err(MultisigError::InsufficientConfirmations { have: 2, need: 3 })
        ));

        // Re-confirming restores quorum.
        q.confirm(B, id).unwrap();
        assert!(q.executable(A, id).is_ok());
    }

    #[test]
    fn revoke_without_confirmation_rejected() {
        let mut q = queue();
        let id = q.submit(A, withdraw()).unwrap();
        assert!(matches!(q.revoke(B, id), Err(MultisigError::NotConfirmed)));
    }

    #[test]
    fn executed_transactions_are_frozen() {
        let mut q = queue();
        let id = q.submit(A, withdraw()).unwrap();
        for signer in [A, B, C] {
            q.confirm(signer, id).unwrap();
        }
        q.mark_executed(id).unwrap();

        assert!(matches!(
            q.executable(A, id),
            Err(MultisigError::AlreadyExecuted(_))
        ));
        assert!(matches!(
            q.confirm(A, id),
            Err(MultisigError::AlreadyConfirmed) | Err(MultisigError::AlreadyExecuted(_))
        ));
        assert!(matches!(
            q.revoke(A, id),
            Err(MultisigError::AlreadyExecuted(_))
        ));
        assert!(matches!(
            q.mark_executed(id),
            Err(MultisigError::AlreadyExecuted(_))
        ));
        assert!(q.get(id).unwrap().executed_at.is_some());
    }

    #[test]
    fn lower_threshold_executes_earlier() {
        let mut q = MultisigQueue::new(vec![A.into(), B.into(), C.into()], 2).unwrap();
        let id = q.submit(A, withdraw()).unwrap();
        q.confirm(A, id).unwrap();
        q.confirm(C, id).unwrap();
        assert!(q.executable(B, id).is_ok());
    }

    #[test]
    fn queue_serialization_roundtrip() {
        let mut q = queue();
        let id = q.submit(A, withdraw()).unwrap();
        q.confirm(A, id).unwrap();

        let json = serde_json::to_string(&q).expect("serialize");
        let recovered: MultisigQueue = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(recovered.count(), 1);
        assert_eq!(recovered.get(id).unwrap().confirmation_count(), 1);
        assert_eq!(recovered.threshold(), 3);
    }
}
