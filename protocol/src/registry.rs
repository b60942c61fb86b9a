//! # Registry & Protocol State Machine
//!
//! Process-wide configuration consulted by every entry point: the governance
//! address, the protocol pause state, fee parameters, and the whitelist sets
//! used by the publishing collaborators.
//!
//! The registry is deliberately an explicit object threaded through the
//! treasury facade, not ambient global state. It starts **paused** — a fresh
//! deployment permits nothing value-moving until governance flips the switch,
//! matching the platform's bring-up sequence.
//!
//! Two mutation tiers exist:
//!
//! - the `caller`-checked operations (`set_state`, `whitelist_*`,
//!   `update_*`) enforce governance identity here, and
//! - the bare setters (`force_state`, `set_governance`,
//!   `set_treasury_fee_bps`) carry no identity check because their callers —
//!   executed treasury transactions — have already proven quorum authority.
//!   Parameter validation still applies on both tiers.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{DEFAULT_PUBLISH_ROYALTY, MAX_TREASURY_FEE_BPS};
use crate::entity::{Address, EntityId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The caller is not the governance address.
    #[error("unauthorized: {caller} is not governance")]
    Unauthorized {
        /// The address that attempted the operation.
        caller: Address,
    },

    /// A construction or mutation parameter violates its bounds.
    #[error("invalid init parameters: {0}")]
    InitParamsInvalid(&'static str),

    /// The protocol is paused and the operation moves value.
    #[error("protocol is paused")]
    ProtocolPaused,
}

// ---------------------------------------------------------------------------
// ProtocolState
// ---------------------------------------------------------------------------

/// Global protocol mode.
///
/// `Paused` blocks every value-moving operation; `PublishingPaused` is the
/// partial halt that only blocks the publishing surface while value movement
/// continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolState {
    /// All operations permitted.
    Unpaused,
    /// Publishing blocked; value movement still permitted.
    PublishingPaused,
    /// Only governance-administrative operations permitted.
    Paused,
}

impl std::fmt::Display for ProtocolState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolState::Unpaused => write!(f, "Unpaused"),
            ProtocolState::PublishingPaused => write!(f, "PublishingPaused"),
            ProtocolState::Paused => write!(f, "Paused"),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Global protocol parameters and whitelists.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Registry {
    /// The privileged governance address.
    governance: Address,
    /// Current protocol mode. Fresh registries start `Paused`.
    state: ProtocolState,
    /// Treasury fee in basis points, capped at [`MAX_TREASURY_FEE_BPS`].
    treasury_fee_bps: u16,
    /// Flat per-publication royalty in value units.
    publish_royalty: u64,
    /// Whitelisted publishing/collect module addresses.
    modules: HashSet<Address>,
    /// Addresses allowed to create profiles.
    profile_creators: HashSet<Address>,
    /// Entities allowed to create hubs.
    hub_creators: HashSet<EntityId>,
    /// Whitelisted content template addresses.
    templates: HashSet<Address>,
}

impl Registry {
    /// Creates a registry in the `Paused` state.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InitParamsInvalid`] if `governance` is empty
    /// or `treasury_fee_bps` exceeds [`MAX_TREASURY_FEE_BPS`]. The same
    /// validation re-runs on every later fee mutation.
    pub fn new(governance: &str, treasury_fee_bps: u16) -> Result<Self, RegistryError> {
        if governance.is_empty() {
            return Err(RegistryError::InitParamsInvalid(
                "governance address must not be empty",
            ));
        }
        Self::validate_fee(treasury_fee_bps)?;

        Ok(Self {
            governance: governance.to_string(),
            state: ProtocolState::Paused,
            treasury_fee_bps,
            publish_royalty: DEFAULT_PUBLISH_ROYALTY,
            modules: HashSet::new(),
            profile_creators: HashSet::new(),
            hub_creators: HashSet::new(),
            templates: HashSet::new(),
        })
    }

    fn validate_fee(bps: u16) -> Result<(), RegistryError> {
        if bps > MAX_TREASURY_FEE_BPS {
            return Err(RegistryError::InitParamsInvalid(
                "treasury fee exceeds the protocol ceiling",
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------------

    /// Fails unless `caller` is the governance address. Checked before any
    /// other validation so unauthorized callers learn nothing about state.
    pub fn ensure_governance(&self, caller: &str) -> Result<(), RegistryError> {
        if caller != self.governance {
            return Err(RegistryError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    /// Fails with [`RegistryError::ProtocolPaused`] when value movement is
    /// blocked.
    pub fn ensure_unpaused(&self) -> Result<(), RegistryError> {
        match self.state {
            ProtocolState::Paused => Err(RegistryError::ProtocolPaused),
            ProtocolState::Unpaused | ProtocolState::PublishingPaused => Ok(()),
        }
    }

    /// Fails when the publishing surface is halted, fully or partially.
    pub fn ensure_publishing_allowed(&self) -> Result<(), RegistryError> {
        match self.state {
            ProtocolState::Unpaused => Ok(()),
            ProtocolState::Paused | ProtocolState::PublishingPaused => {
                Err(RegistryError::ProtocolPaused)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Governance-gated mutations
    // -----------------------------------------------------------------------

    /// Transitions the protocol state. Governance only.
    pub fn set_state(&mut self, caller: &str, state: ProtocolState) -> Result<(), RegistryError> {
        self.ensure_governance(caller)?;
        if self.state != state {
            info!(from = %self.state, to = %state, "protocol state changed");
        }
        self.state = state;
        Ok(())
    }

    /// Adds or removes a module address. Idempotent: re-setting the same
    /// flag is not an error and changes nothing.
    pub fn whitelist_module(
        &mut self,
        caller: &str,
        module: &str,
        whitelisted: bool,
    ) -> Result<(), RegistryError> {
        self.ensure_governance(caller)?;
        Self::set_flag(&mut self.modules, module.to_string(), whitelisted);
        Ok(())
    }

    /// Adds or removes a profile-creator address. Idempotent.
    pub fn whitelist_profile_creator(
        &mut self,
        caller: &str,
        creator: &str,
        whitelisted: bool,
    ) -> Result<(), RegistryError> {
        self.ensure_governance(caller)?;
        Self::set_flag(&mut self.profile_creators, creator.to_string(), whitelisted);
        Ok(())
    }

    /// Adds or removes a hub-creator entity. Idempotent.
    pub fn whitelist_hub_creator(
        &mut self,
        caller: &str,
        entity: EntityId,
        whitelisted: bool,
    ) -> Result<(), RegistryError> {
        self.ensure_governance(caller)?;
        Self::set_flag(&mut self.hub_creators, entity, whitelisted);
        Ok(())
    }

    /// Adds or removes a template address. Idempotent.
    pub fn whitelist_template(
        &mut self,
        caller: &str,
        template: &str,
        whitelisted: bool,
    ) -> Result<(), RegistryError> {
        self.ensure_governance(caller)?;
        Self::set_flag(&mut self.templates, template.to_string(), whitelisted);
        Ok(())
    }

    /// Updates the treasury fee. Governance only; ceiling-checked.
    pub fn update_treasury_fee(&mut self, caller: &str, bps: u16) -> Result<(), RegistryError> {
        self.ensure_governance(caller)?;
        self.set_treasury_fee_bps(bps)
    }

    /// Updates the publish royalty. Governance only.
    pub fn update_publish_royalty(
        &mut self,
        caller: &str,
        royalty: u64,
    ) -> Result<(), RegistryError> {
        self.ensure_governance(caller)?;
        self.publish_royalty = royalty;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Quorum-tier mutations (no caller check; authority proven upstream)
    // -----------------------------------------------------------------------

    /// Sets the treasury fee, validating only the ceiling.
    pub fn set_treasury_fee_bps(&mut self, bps: u16) -> Result<(), RegistryError> {
        Self::validate_fee(bps)?;
        self.treasury_fee_bps = bps;
        Ok(())
    }

    /// Replaces the governance address.
    pub fn set_governance(&mut self, governance: &str) -> Result<(), RegistryError> {
        if governance.is_empty() {
            return Err(RegistryError::InitParamsInvalid(
                "governance address must not be empty",
            ));
        }
        info!(new = governance, "governance address replaced");
        self.governance = governance.to_string();
        Ok(())
    }

    /// Forces the protocol state without an identity check.
    pub fn force_state(&mut self, state: ProtocolState) {
        if self.state != state {
            info!(from = %self.state, to = %state, "protocol state changed");
        }
        self.state = state;
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The current governance address.
    pub fn governance(&self) -> &str {
        &self.governance
    }

    /// The current protocol mode.
    pub fn state(&self) -> ProtocolState {
        self.state
    }

    /// The treasury fee in basis points.
    pub fn treasury_fee_bps(&self) -> u16 {
        self.treasury_fee_bps
    }

    /// The flat per-publication royalty.
    pub fn publish_royalty(&self) -> u64 {
        self.publish_royalty
    }

    /// Whether `module` is whitelisted.
    pub fn is_module_whitelisted(&self, module: &str) -> bool {
        self.modules.contains(module)
    }

    /// Whether `creator` may create profiles.
    pub fn is_profile_creator_whitelisted(&self, creator: &str) -> bool {
        self.profile_creators.contains(creator)
    }

    /// Whether `entity` may create hubs.
    pub fn is_hub_creator_whitelisted(&self, entity: EntityId) -> bool {
        self.hub_creators.contains(&entity)
    }

    /// Whether `template` is whitelisted.
    pub fn is_template_whitelisted(&self, template: &str) -> bool {
        self.templates.contains(template)
    }

    fn set_flag<T: std::hash::Hash + Eq>(set: &mut HashSet<T>, key: T, on: bool) {
        if on {
            set.insert(key);
        } else {
            set.remove(&key);
        }
    }
}
