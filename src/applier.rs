//! State Applier - commits indirect updates to object state under clamping
//!
//! Re-applying a non-zero update compounds; apply each result exactly once.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use crate::sanitize::{finite_or_zero, sanitize_state};
use crate::types::{IndirectUpdate, ObjectPropagationState, ObjectStates};

fn apply_one(state: &mut ObjectPropagationState, update: &IndirectUpdate, now: DateTime<Utc>) {
    state.difficulty += finite_or_zero(update.difficulty_adjustment);
    state.stability += finite_or_zero(update.stability_boost).max(0.0);
    state.priority += finite_or_zero(update.priority_adjustment);
    sanitize_state(state);
    state.last_updated = now;
}

/// Apply updates in order. Targets without a state record are skipped.
///
/// Returns how many updates touched a state record.
pub fn apply_indirect_updates(
    updates: &[IndirectUpdate],
    states: &mut ObjectStates,
    now: DateTime<Utc>,
) -> usize {
    let mut applied = 0;
    for update in updates {
        if let Some(state) = states.get_mut(&update.target_object_id) {
            apply_one(state, update, now);
            applied += 1;
        }
    }
    applied
}

/// Object state store shared between concurrent propagation calls.
///
/// Each object sits behind its own lock, so writes to one id are serialized
/// while different ids proceed in parallel. Racing writers on the same object
/// resolve as last-writer-wins; nothing is merged.
#[derive(Default)]
pub struct SharedObjectStates {
    objects: RwLock<HashMap<String, Arc<Mutex<ObjectPropagationState>>>>,
}

impl SharedObjectStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_states(states: ObjectStates) -> Self {
        let objects = states
            .into_iter()
            .map(|(id, state)| (id, Arc::new(Mutex::new(state))))
            .collect();
        Self {
            objects: RwLock::new(objects),
        }
    }

    /// Insert or replace a record
    pub fn insert(&self, state: ObjectPropagationState) {
        let mut objects = self.objects.write();
        match objects.get(&state.object_id) {
            Some(slot) => *slot.lock() = state,
            None => {
                objects.insert(state.object_id.clone(), Arc::new(Mutex::new(state)));
            }
        }
    }

    pub fn get(&self, object_id: &str) -> Option<ObjectPropagationState> {
        let slot = self.objects.read().get(object_id).cloned()?;
        let state = slot.lock().clone();
        Some(state)
    }

    pub fn contains(&self, object_id: &str) -> bool {
        self.objects.read().contains_key(object_id)
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Point-in-time copy for a read-only traversal
    pub fn snapshot(&self) -> ObjectStates {
        let slots: Vec<(String, Arc<Mutex<ObjectPropagationState>>)> = self
            .objects
            .read()
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
            .collect();

        slots
            .into_iter()
            .map(|(id, slot)| {
                let state = slot.lock().clone();
                (id, state)
            })
            .collect()
    }

    /// Apply updates, locking one object at a time
    pub fn apply(&self, updates: &[IndirectUpdate], now: DateTime<Utc>) -> usize {
        let mut applied = 0;
        for update in updates {
            let slot = self.objects.read().get(&update.target_object_id).cloned();
            if let Some(slot) = slot {
                apply_one(&mut slot.lock(), update, now);
                applied += 1;
            }
        }
        applied
    }
}
