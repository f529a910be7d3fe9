/// Visibility state of one character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityState {
    /// Fully visible, no transition running.
    Shown,
    /// Not visible.
    Hidden,
    /// Appearance effects are playing.
    ShowAnimation,
    /// Disappearance effects are playing.
    HideAnimation,
}

impl VisibilityState {
    /// Whether the character contributes anything on screen.
    pub fn is_visible(self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

/// Per-character timing record.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CharacterTimelineEntry {
    visibility_state: VisibilityState,
    state_entry_time: f64,
    visible_since_time: f64,
}

impl CharacterTimelineEntry {
    fn new(state: VisibilityState, now: f64) -> Self {
        Self {
            visibility_state: state,
            state_entry_time: now,
            visible_since_time: now,
        }
    }

    /// Current state.
    pub fn visibility_state(&self) -> VisibilityState {
        self.visibility_state
    }

    /// Time of the last transition.
    pub fn state_entry_time(&self) -> f64 {
        self.state_entry_time
    }

    /// Time the character last left `Hidden`.
    pub fn visible_since_time(&self) -> f64 {
        self.visible_since_time
    }

    /// Seconds spent in the current state.
    pub fn time_in_state(&self, now: f64) -> f64 {
        (now - self.state_entry_time).max(0.0)
    }

    /// Seconds since the character last became visible; zero while hidden.
    pub fn visible_duration(&self, now: f64) -> f64 {
        if self.visibility_state.is_visible() {
            (now - self.visible_since_time).max(0.0)
        } else {
            0.0
        }
    }

    fn set_visibility_state(&mut self, state: VisibilityState, now: f64) {
        if self.visibility_state == VisibilityState::Hidden && state != VisibilityState::Hidden {
            self.visible_since_time = now;
        }
        self.visibility_state = state;
        self.state_entry_time = now;
    }
}

/// Arena of timeline entries addressed by display index.
#[derive(Clone, Debug, Default)]
pub struct CharacterTimeline {
    entries: Vec<CharacterTimelineEntry>,
}

impl CharacterTimeline {
    /// `len` characters, all in `initial` as of `now`.
    pub fn new(len: usize, initial: VisibilityState, now: f64) -> Self {
        let mut t = Self::default();
        t.reset(len, initial, now);
        t
    }

    /// Discard every entry and start over with `len` characters.
    pub fn reset(&mut self, len: usize, initial: VisibilityState, now: f64) {
        self.entries.clear();
        self.entries
            .resize(len, CharacterTimelineEntry::new(initial, now));
    }

    /// Number of characters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when there are no characters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for `index`.
    pub fn get(&self, index: usize) -> Option<&CharacterTimelineEntry> {
        self.entries.get(index)
    }

    /// All entries in index order.
    pub fn entries(&self) -> &[CharacterTimelineEntry] {
        &self.entries
    }

    /// Transition character `index` to `state` at time `now`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set_visibility_state(&mut self, index: usize, state: VisibilityState, now: f64) {
        self.entries[index].set_visibility_state(state, now);
    }

    /// Indices currently in `state`.
    pub fn indices_in(&self, state: VisibilityState) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.visibility_state == state)
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/timeline.rs"]
mod tests;
