//! # Entities & Owner Resolution
//!
//! A value-holding party in Tessera is an *entity*: a stable integer ID
//! issued by the profile subsystem when a soul-bound profile is created.
//! The mapping from entity ID to the controlling wallet address lives in
//! that external subsystem — this core consumes it strictly as a read-only
//! oracle through [`OwnerResolver`].
//!
//! [`ProfileDirectory`] is the in-memory implementation used by deployments
//! that co-locate the profile table with the core (and by every test in this
//! workspace). It allocates sequential IDs and pins entity 1 to the bank
//! treasury at construction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::RESERVE_ENTITY;

/// Stable identifier for a value-holding party. Allocated by the profile
/// subsystem, never reused.
pub type EntityId = u64;

/// A wallet address, formatted as `tsr:<hex-pubkey>`. Opaque to this core:
/// it is compared for equality and never parsed.
pub type Address = String;

// ---------------------------------------------------------------------------
// OwnerResolver
// ---------------------------------------------------------------------------

/// Read-only oracle mapping an entity to its controlling address.
///
/// One entity maps to exactly one address at any time. The reverse is not
/// true — a single address may control several entities.
pub trait OwnerResolver {
    /// Returns the controlling address for `entity`, or `None` if the entity
    /// was never issued.
    fn resolve_owner(&self, entity: EntityId) -> Option<Address>;
}

// ---------------------------------------------------------------------------
// ProfileDirectory
// ---------------------------------------------------------------------------

/// In-memory profile table: sequential ID allocation plus owner lookup.
///
/// Entity [`RESERVE_ENTITY`] is bound to the treasury address at
/// construction, so the first user profile always receives ID 2.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileDirectory {
    /// Controlling address per entity.
    owners: HashMap<EntityId, Address>,
    /// Next ID to hand out.
    next_id: EntityId,
}

impl ProfileDirectory {
    /// Creates a directory with the reserve entity pre-bound to the
    /// treasury's own address.
    pub fn new(treasury_address: &str) -> Self {
        let mut owners = HashMap::new();
        owners.insert(RESERVE_ENTITY, treasury_address.to_string());
        Self {
            owners,
            next_id: RESERVE_ENTITY + 1,
        }
    }

    /// Allocates the next entity ID and binds it to `owner`.
    pub fn register(&mut self, owner: &str) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        self.owners.insert(id, owner.to_string());
        id
    }

    /// Re-points an existing entity at a new controlling address.
    ///
    /// Returns `false` if the entity does not exist or is the reserve
    /// entity, which is never rebound.
    pub fn rebind(&mut self, entity: EntityId, owner: &str) -> bool {
        if entity == RESERVE_ENTITY || !self.owners.contains_key(&entity) {
            return false;
        }
        self.owners.insert(entity, owner.to_string());
        true
    }

    /// Number of issued entities, reserve included.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Always false: the reserve entity exists from construction.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

impl OwnerResolver for ProfileDirectory {
    fn resolve_owner(&self, entity: EntityId) -> Option<Address> {
        self.owners.get(&entity).cloned()
    }
}
