use std::collections::HashMap;

/// Script generation status for one test case.
///
/// `Ready` and `Failed` are stable but re-enterable: requesting again moves
/// the key back to `InFlight` and a later resolution overwrites the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptState {
    NotRequested,
    InFlight,
    Ready(String),
    Failed(String),
}

const NOT_REQUESTED: ScriptState = ScriptState::NotRequested;

/// Per-test-case script states for the currently displayed collection.
///
/// The render loop redraws the whole view after every state change, so the
/// input handler that triggers generation must not issue the network call
/// itself: it would fire again on the very next redraw. Instead the handler
/// performs only the `request` transition, and the loop claims the dispatch
/// through `take_pending` (single-shot) before resolving the state. That
/// keeps the invariant of at most one outstanding request per key and exactly
/// one network call per user-triggered generation, no matter how many redraws
/// happen while a key is `InFlight`.
#[derive(Debug, Default)]
pub struct ScriptStates {
    generation: u64,
    states: HashMap<String, ScriptState>,
    pending: Option<String>,
}

impl ScriptStates {
    /// Collection-generation counter. Bumped on every reset; folded into
    /// fallback keys so id-less cases from different generations never alias.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self, key: &str) -> &ScriptState {
        self.states.get(key).unwrap_or(&NOT_REQUESTED)
    }

    pub fn ready_script(&self, key: &str) -> Option<&str> {
        match self.state(key) {
            ScriptState::Ready(script) => Some(script.as_str()),
            _ => None,
        }
    }

    pub fn in_flight_key(&self) -> Option<&str> {
        self.states.iter().find_map(|(key, state)| {
            matches!(state, ScriptState::InFlight).then_some(key.as_str())
        })
    }

    /// Intent transition performed by the input handler. Moves the key to
    /// `InFlight` and records the pending dispatch. Returns false (and
    /// changes nothing) when the key is already `InFlight`.
    pub fn request(&mut self, key: &str) -> bool {
        if matches!(self.states.get(key), Some(ScriptState::InFlight)) {
            return false;
        }
        self.states.insert(key.to_string(), ScriptState::InFlight);
        self.pending = Some(key.to_string());
        true
    }

    /// Single-shot claim of the pending dispatch. The first caller after a
    /// `request` gets the key and must issue the network call; every later
    /// call returns `None` until the next `request`.
    pub fn take_pending(&mut self) -> Option<String> {
        self.pending.take()
    }

    /// Transition out of `InFlight`. Resolutions for keys that are not in
    /// flight (stale, or cleared by a collection reset) are ignored.
    pub fn resolve(&mut self, key: &str, outcome: Result<String, String>) {
        if !matches!(self.states.get(key), Some(ScriptState::InFlight)) {
            return;
        }
        let next = match outcome {
            Ok(script) => ScriptState::Ready(script),
            Err(message) => ScriptState::Failed(message),
        };
        self.states.insert(key.to_string(), next);
    }

    /// Explicit discard when a new test case collection replaces the old one.
    /// Old keys read `NotRequested` afterwards even if the new collection
    /// reuses the same id strings.
    pub fn reset_for_new_collection(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.states.clear();
        self.pending = None;
    }
}

/// Stable key for a test case the backend returned without an id. Derived
/// from both the item's index and the collection generation so two id-less
/// items can never collide, within one collection or across regenerations.
pub fn fallback_case_key(generation: u64, index: usize) -> String {
    format!("case-{generation}-{}", index + 1)
}

#[cfg(test)]
#[path = "../tests/unit/scripts_tests.rs"]
mod tests;
