//! # Bank Treasury
//!
//! The single entry point for every privileged operation: reserve
//! withdrawals, supply minting, voucher issuance and redemption, registry
//! administration, and the multisig surface.
//!
//! All four stores (ledger, voucher inventory, registry, multisig queue)
//! live behind one `RwLock`. Each public operation takes the lock exactly
//! once, runs its checks in a fixed order (authorization, then parameter
//! validation, then protocol state, then resources), and applies every
//! effect before releasing. That single lock is what makes multi-store
//! operations atomic and is why voucher redemption cannot be re-entered
//! between the ledger credit and the used-flag write.
//!
//! Entity-to-address resolution is injected through the [`OwnerResolver`]
//! trait so the profile subsystem can live out of process.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::info;

use tessera_protocol::config::{DEFAULT_TREASURY_FEE_BPS, INITIAL_SUPPLY, RESERVE_ENTITY};
use tessera_protocol::{
    Address, EntityId, Ledger, LedgerError, OwnerResolver, ProtocolState, Registry, RegistryError,
    Voucher, VoucherError, VoucherId, VoucherStore,
};

use crate::multisig::{MultisigError, MultisigQueue, QueuedTransaction, TreasuryAction, TxId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by treasury operations.
///
/// Mostly a transparent union of the subsystem errors, plus the two
/// conditions only the facade can detect: an entity the resolver cannot
/// map, and a caller that does not control the entity it is spending from.
#[derive(Debug, Error)]
pub enum BankError {
    /// Ledger-level failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Voucher-store failure.
    #[error(transparent)]
    Voucher(#[from] VoucherError),

    /// Registry or protocol-state failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Multisig queue failure.
    #[error(transparent)]
    Multisig(#[from] MultisigError),

    /// The resolver has no owner for this entity.
    #[error("entity {0} does not exist")]
    InvalidEntity(EntityId),

    /// The caller's address does not control the entity being spent from.
    #[error("{caller} does not control entity {entity}")]
    NotEntityController {
        /// The address that attempted the operation.
        caller: Address,
        /// The entity it tried to spend from.
        entity: EntityId,
    },
}

// ---------------------------------------------------------------------------
// BankTreasury
// ---------------------------------------------------------------------------

/// Everything guarded by the treasury lock.
#[derive(Debug)]
struct BankState {
    ledger: Ledger,
    vouchers: VoucherStore,
    registry: Registry,
    queue: MultisigQueue,
}

/// The treasury facade.
///
/// Clone-cheap handles are obtained by wrapping in `Arc`; internal state is
/// shared through the single lock.
pub struct BankTreasury {
    /// The treasury's own wallet address. Bound to the reserve entity.
    address: Address,
    /// Entity-to-owner oracle, injected at construction.
    resolver: Arc<dyn OwnerResolver + Send + Sync>,
    inner: RwLock<BankState>,
}

impl BankTreasury {
    /// Boots a treasury: genesis ledger, empty voucher store, paused
    /// registry, and the signer queue.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InitParamsInvalid`] for a bad governance
    /// address and [`MultisigError::InvalidSignerSet`] for a bad signer
    /// configuration.
    pub fn new(
        address: &str,
        governance: &str,
        signers: Vec<Address>,
        threshold: usize,
        resolver: Arc<dyn OwnerResolver + Send + Sync>,
    ) -> Result<Self, BankError> {
        let registry = Registry::new(governance, DEFAULT_TREASURY_FEE_BPS)?;
        let queue = MultisigQueue::new(signers, threshold)?;
        info!(
            address,
            governance,
            supply = INITIAL_SUPPLY,
            "bank treasury initialized"
        );
        Ok(Self {
            address: address.to_string(),
            resolver,
            inner: RwLock::new(BankState {
                ledger: Ledger::genesis(INITIAL_SUPPLY),
                vouchers: VoucherStore::new(),
                registry,
                queue,
            }),
        })
    }

    /// The treasury's own wallet address.
    pub fn address(&self) -> &str {
        &self.address
    }

    fn resolve(&self, entity: EntityId) -> Result<Address, BankError> {
        self.resolver
            .resolve_owner(entity)
            .ok_or(BankError::InvalidEntity(entity))
    }

    // -----------------------------------------------------------------------
    // Value movement
    // -----------------------------------------------------------------------

    /// Pays `amount` out of the reserve to entity `to`. Governance only.
    ///
    /// # Errors
    ///
    /// Fails on a non-governance caller, a paused protocol, an unknown
    /// entity, or an underfunded reserve, in that order.
    pub fn withdraw(&self, caller: &str, to: EntityId, amount: u64) -> Result<(), BankError> {
        let mut state = self.inner.write();
        state.registry.ensure_governance(caller)?;
        state.registry.ensure_unpaused()?;
        self.resolve(to)?;
        state.ledger.transfer(RESERVE_ENTITY, to, amount)?;
        info!(to, amount, "reserve withdrawal");
        Ok(())
    }

    /// Creates new supply credited to entity `to`. Governance only.
    ///
    /// Unlike [`withdraw`](Self::withdraw) this grows total supply; the
    /// reserve balance is untouched. It moves value all the same, so the
    /// pause switch gates it like every other value operation.
    ///
    /// # Errors
    ///
    /// Fails on a non-governance caller, a paused protocol, an unknown
    /// entity, or a ledger rejection, in that order.
    pub fn mint_value(&self, caller: &str, to: EntityId, amount: u64) -> Result<u64, BankError> {
        let mut state = self.inner.write();
        state.registry.ensure_governance(caller)?;
        state.registry.ensure_unpaused()?;
        self.resolve(to)?;
        let balance = state.ledger.mint(to, amount)?;
        info!(to, amount, "supply minted");
        Ok(balance)
    }

    /// Moves value between two entities on behalf of the controller of
    /// `from`.
    ///
    /// # Errors
    ///
    /// Fails if `caller` does not control `from`, the protocol is paused,
    /// either entity is unknown, or the ledger rejects the move.
    pub fn transfer_value(
        &self,
        caller: &str,
        from: EntityId,
        to: EntityId,
        amount: u64,
    ) -> Result<(), BankError> {
        let mut state = self.inner.write();
        self.ensure_controller(caller, from)?;
        state.registry.ensure_unpaused()?;
        self.resolve(to)?;
        state.ledger.transfer(from, to, amount)?;
        Ok(())
    }

    /// Destroys value held by `entity` on behalf of its controller.
    pub fn burn_value(
        &self,
        caller: &str,
        entity: EntityId,
        amount: u64,
    ) -> Result<u64, BankError> {
        let mut state = self.inner.write();
        self.ensure_controller(caller, entity)?;
        state.registry.ensure_unpaused()?;
        let remaining = state.ledger.burn(entity, amount)?;
        info!(entity, amount, "value burned");
        Ok(remaining)
    }

    fn ensure_controller(&self, caller: &str, entity: EntityId) -> Result<(), BankError> {
        let owner = self.resolve(entity)?;
        if owner != caller {
            return Err(BankError::NotEntityController {
                caller: caller.to_string(),
                entity,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Vouchers
    // -----------------------------------------------------------------------

    /// Issues a fresh voucher of face value `value` to `recipient`.
    /// Governance only; the value is a claim on the reserve, no ledger
    /// movement happens until redemption.
    pub fn generate_voucher(
        &self,
        caller: &str,
        value: u64,
        recipient: &str,
    ) -> Result<VoucherId, BankError> {
        let mut state = self.inner.write();
        state.registry.ensure_governance(caller)?;
        state.vouchers.check_issue_value(value)?;
        let id = state.vouchers.generate(value, recipient)?;
        info!(voucher = id, value, recipient, "voucher generated");
        Ok(id)
    }

    /// Converts `amount` of entity `from`'s ledger balance into a voucher
    /// issued to `recipient`.
    ///
    /// The balance moves into the reserve, so the voucher is fully backed:
    /// redemption later pays the same amount back out of the reserve.
    ///
    /// # Errors
    ///
    /// Fails if `caller` does not control `from`, the amount is zero or
    /// below the voucher floor, the protocol is paused, or `from` lacks the
    /// balance.
    pub fn mint_voucher(
        &self,
        caller: &str,
        from: EntityId,
        amount: u64,
        recipient: &str,
    ) -> Result<VoucherId, BankError> {
        let mut state = self.inner.write();
        self.ensure_controller(caller, from)?;
        state.vouchers.check_issue_value(amount)?;
        state.registry.ensure_unpaused()?;
        state.ledger.transfer(from, RESERVE_ENTITY, amount)?;
        let id = state.vouchers.generate(amount, recipient)?;
        info!(voucher = id, from, amount, "voucher minted from balance");
        Ok(id)
    }

    /// Redeems a voucher: pays its face value from the reserve to entity
    /// `target` and burns the voucher.
    ///
    /// `caller` must hold a non-zero quantity of the voucher and `target`
    /// must be a known entity. The used flag is written only after the
    /// ledger transfer commits, and both happen under the one lock hold, so
    /// a failed credit leaves the voucher live and a successful one can
    /// never pay twice.
    pub fn exchange_voucher(
        &self,
        caller: &str,
        id: VoucherId,
        target: EntityId,
    ) -> Result<u64, BankError> {
        let mut state = self.inner.write();
        state.registry.ensure_unpaused()?;
        self.resolve(target)?;
        let value = state.vouchers.redeemable(id, caller)?;
        state.ledger.transfer(RESERVE_ENTITY, target, value)?;
        state.vouchers.mark_used(id)?;
        info!(voucher = id, target, value, "voucher exchanged");
        Ok(value)
    }

    /// Moves voucher quantity between holders. `caller` must be the sender.
    pub fn transfer_voucher(
        &self,
        caller: &str,
        id: VoucherId,
        to: &str,
        quantity: u64,
    ) -> Result<(), BankError> {
        let mut state = self.inner.write();
        state.registry.ensure_unpaused()?;
        state.vouchers.transfer(id, caller, to, quantity)?;
        Ok(())
    }

    /// Updates the voucher conversion floor. Governance only.
    pub fn set_voucher_min_value(&self, caller: &str, minimum: u64) -> Result<(), BankError> {
        let mut state = self.inner.write();
        state.registry.ensure_governance(caller)?;
        state.vouchers.set_min_issue_value(minimum);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Registry administration (governance-direct tier)
    // -----------------------------------------------------------------------

    /// Transitions the protocol state. Governance only.
    pub fn set_protocol_state(&self, caller: &str, state: ProtocolState) -> Result<(), BankError> {
        self.inner.write().registry.set_state(caller, state)?;
        Ok(())
    }

    /// Adds or removes a module address from the whitelist.
    pub fn whitelist_module(
        &self,
        caller: &str,
        module: &str,
        whitelisted: bool,
    ) -> Result<(), BankError> {
        self.inner
            .write()
            .registry
            .whitelist_module(caller, module, whitelisted)?;
        Ok(())
    }

    /// Adds or removes a profile-creator address from the whitelist.
    pub fn whitelist_profile_creator(
        &self,
        caller: &str,
        creator: &str,
        whitelisted: bool,
    ) -> Result<(), BankError> {
        self.inner
            .write()
            .registry
            .whitelist_profile_creator(caller, creator, whitelisted)?;
        Ok(())
    }

    /// Adds or removes a hub-creator entity from the whitelist.
    pub fn whitelist_hub_creator(
        &self,
        caller: &str,
        entity: EntityId,
        whitelisted: bool,
    ) -> Result<(), BankError> {
        self.inner
            .write()
            .registry
            .whitelist_hub_creator(caller, entity, whitelisted)?;
        Ok(())
    }

    /// Adds or removes a template address from the whitelist.
    pub fn whitelist_template(
        &self,
        caller: &str,
        template: &str,
        whitelisted: bool,
    ) -> Result<(), BankError> {
        self.inner
            .write()
            .registry
            .whitelist_template(caller, template, whitelisted)?;
        Ok(())
    }

    /// Updates the treasury fee. Governance only; ceiling-checked.
    pub fn update_treasury_fee(&self, caller: &str, bps: u16) -> Result<(), BankError> {
        self.inner.write().registry.update_treasury_fee(caller, bps)?;
        Ok(())
    }

    /// Updates the flat publish royalty. Governance only.
    pub fn update_publish_royalty(&self, caller: &str, royalty: u64) -> Result<(), BankError> {
        self.inner
            .write()
            .registry
            .update_publish_royalty(caller, royalty)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Multisig surface (quorum tier)
    // -----------------------------------------------------------------------

    /// Queues a [`TreasuryAction`] for confirmation. Signers only.
    pub fn submit_transaction(
        &self,
        caller: &str,
        action: TreasuryAction,
    ) -> Result<TxId, BankError> {
        let id = self.inner.write().queue.submit(caller, action)?;
        Ok(id)
    }

    /// Confirms a queued transaction. Signers only.
    pub fn confirm_transaction(&self, caller: &str, id: TxId) -> Result<(), BankError> {
        self.inner.write().queue.confirm(caller, id)?;
        Ok(())
    }

    /// Revokes the caller's confirmation before execution.
    pub fn revoke_confirmation(&self, caller: &str, id: TxId) -> Result<(), BankError> {
        self.inner.write().queue.revoke(caller, id)?;
        Ok(())
    }

    /// Executes a confirmed transaction: proves quorum, applies the action,
    /// then flips the executed flag, all under one lock hold.
    ///
    /// # Errors
    ///
    /// Propagates queue errors (non-signer, unknown ID, below quorum,
    /// already executed) and any failure applying the action itself, in
    /// which case the transaction stays executable for a later retry.
    pub fn execute_transaction(&self, caller: &str, id: TxId) -> Result<(), BankError> {
        let mut state = self.inner.write();
        let action = state.queue.executable(caller, id)?.clone();

        match action {
            TreasuryAction::Withdraw { to, amount } => {
                self.resolve(to)?;
                state.ledger.transfer(RESERVE_ENTITY, to, amount)?;
                info!(tx = id, to, amount, "quorum withdrawal executed");
            }
            TreasuryAction::SetTreasuryFee { bps } => {
                state.registry.set_treasury_fee_bps(bps)?;
            }
            TreasuryAction::SetGovernance { address } => {
                state.registry.set_governance(&address)?;
            }
            TreasuryAction::SetProtocolState { state: target } => {
                state.registry.force_state(target);
            }
        }

        state.queue.mark_executed(id)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Ledger balance of `entity`.
    pub fn balance_of(&self, entity: EntityId) -> u64 {
        self.inner.read().ledger.balance_of(entity)
    }

    /// Balance of the reserve entity.
    pub fn reserve_balance(&self) -> u64 {
        self.inner.read().ledger.balance_of(RESERVE_ENTITY)
    }

    /// Current total supply.
    pub fn total_supply(&self) -> u64 {
        self.inner.read().ledger.total_supply()
    }

    /// Current protocol mode.
    pub fn protocol_state(&self) -> ProtocolState {
        self.inner.read().registry.state()
    }

    /// Current treasury fee in basis points.
    pub fn treasury_fee_bps(&self) -> u16 {
        self.inner.read().registry.treasury_fee_bps()
    }

    /// Current governance address.
    pub fn governance(&self) -> Address {
        self.inner.read().registry.governance().to_string()
    }

    /// Snapshot of a voucher record, or `None` if never generated.
    pub fn voucher(&self, id: VoucherId) -> Option<Voucher> {
        self.inner.read().vouchers.get(id).cloned()
    }

    /// Quantity of voucher `id` held by `holder`.
    pub fn voucher_holder_balance(&self, id: VoucherId, holder: &str) -> u64 {
        self.inner.read().vouchers.holder_balance(id, holder)
    }

    /// Snapshot of a queued transaction, or `None` if never submitted.
    pub fn transaction(&self, id: TxId) -> Option<QueuedTransaction> {
        self.inner.read().queue.get(id).cloned()
    }

    /// Number of transactions ever submitted.
    pub fn transaction_count(&self) -> usize {
        self.inner.read().queue.count()
    }
}
