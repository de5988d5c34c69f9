use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::family::{ShadowNodeFamily, SharedFamily};

pub type SharedState = Arc<State>;
pub type StateData = Arc<dyn Any + Send + Sync>;

/// Immutable, versioned component state.
///
/// Every replacement bumps [`State::revision`] by one. The state keeps a weak
/// link to its family so the newest state can be looked up from any thread
/// without holding on to a particular node revision.
pub struct State {
    revision: u64,
    data: StateData,
    family: Weak<ShadowNodeFamily>,
}

impl State {
    pub fn initial(family: &SharedFamily, data: StateData) -> Self {
        Self {
            revision: 1,
            data,
            family: Arc::downgrade(family),
        }
    }

    /// The state that replaces `self`.
    pub fn next(&self, data: StateData) -> Self {
        Self {
            revision: self.revision + 1,
            data,
            family: Weak::clone(&self.family),
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn data(&self) -> &StateData {
        &self.data
    }

    pub fn data_as<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    pub fn family(&self) -> Option<SharedFamily> {
        self.family.upgrade()
    }

    pub fn most_recent(&self) -> Option<SharedState> {
        self.family.upgrade()?.most_recent_state()
    }

    /// True when the family has committed a newer state than this one.
    pub fn is_obsolete(&self) -> bool {
        self.most_recent()
            .map(|recent| recent.revision > self.revision)
            .unwrap_or(false)
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}
