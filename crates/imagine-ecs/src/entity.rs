use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroU32;

/// An opaque 32-bit entity identifier.
///
/// Ids are handed out in strictly increasing order starting at 1 and are never
/// reissued once destroyed, so an id uniquely names one entity for the whole
/// lifetime of its [`EntityManager`]. Zero is reserved for "no entity".
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(NonZeroU32);

impl EntityId {
    /// Wrap a raw id. Returns `None` for the reserved value 0.
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// The raw numeric value of this id.
    pub fn raw(&self) -> u32 {
        self.0.get()
    }

    pub(crate) fn index(&self) -> usize {
        self.0.get() as usize
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocates entity ids and tracks which ones are alive.
///
/// Destroyed ids are recorded in a removed set until the owner drains it, which
/// lets cached queries prune entries lazily instead of on every destroy.
pub struct EntityManager {
    next_id: u32,
    live: HashSet<EntityId>,
    removed: HashSet<EntityId>,
}

impl EntityManager {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            live: HashSet::new(),
            removed: HashSet::new(),
        }
    }

    /// Allocate a fresh id that has never been issued before.
    ///
    /// # Panics
    /// Panics once all `u32::MAX` ids have been issued.
    pub fn create_entity(&mut self) -> EntityId {
        let Some(raw) = NonZeroU32::new(self.next_id) else {
            panic!("entity id space exhausted");
        };
        // Wraps to 0 after u32::MAX, which the check above treats as exhausted.
        self.next_id = self.next_id.wrapping_add(1);
        let id = EntityId(raw);
        self.live.insert(id);
        id
    }

    /// Destroy an entity. Returns `true` if it was alive; destroying an id that
    /// is not alive is a no-op.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        if !self.live.remove(&id) {
            return false;
        }
        self.removed.insert(id);
        true
    }

    /// Check if an entity is currently alive.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.live.contains(&id)
    }

    /// Every live id exactly once, in no particular order.
    pub fn live_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.live.iter().copied()
    }

    /// Ids destroyed since the removed set was last drained.
    pub fn removed_ids(&self) -> &HashSet<EntityId> {
        &self.removed
    }

    /// Take the removed set, leaving it empty.
    pub fn drain_removed(&mut self) -> HashSet<EntityId> {
        std::mem::take(&mut self.removed)
    }

    /// Number of currently alive entities.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether there are no alive entities.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}
