//! Snippet slots and the in-memory snippet table.

use std::fmt;

/// Number of snippet slots, one per Alt+digit trigger.
pub const SLOT_COUNT: usize = 9;

/// One of the nine fixed snippet slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    /// Alt+1
    Slot1,
    /// Alt+2
    Slot2,
    /// Alt+3
    Slot3,
    /// Alt+4
    Slot4,
    /// Alt+5
    Slot5,
    /// Alt+6
    Slot6,
    /// Alt+7
    Slot7,
    /// Alt+8
    Slot8,
    /// Alt+9
    Slot9,
}

impl Slot {
    /// Every slot, in trigger order.
    pub const ALL: [Self; SLOT_COUNT] = [
        Self::Slot1,
        Self::Slot2,
        Self::Slot3,
        Self::Slot4,
        Self::Slot5,
        Self::Slot6,
        Self::Slot7,
        Self::Slot8,
        Self::Slot9,
    ];

    /// Zero-based position in [`Slot::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::Slot1 => 0,
            Self::Slot2 => 1,
            Self::Slot3 => 2,
            Self::Slot4 => 3,
            Self::Slot5 => 4,
            Self::Slot6 => 5,
            Self::Slot7 => 6,
            Self::Slot8 => 7,
            Self::Slot9 => 8,
        }
    }

    /// The digit pressed together with Alt, 1 through 9.
    pub const fn number(self) -> u8 {
        match self {
            Self::Slot1 => 1,
            Self::Slot2 => 2,
            Self::Slot3 => 3,
            Self::Slot4 => 4,
            Self::Slot5 => 5,
            Self::Slot6 => 6,
            Self::Slot7 => 7,
            Self::Slot8 => 8,
            Self::Slot9 => 9,
        }
    }

    /// Key used for this slot in the persisted settings file (`Alt1`..`Alt9`).
    pub fn key_name(self) -> String {
        format!("Alt{}", self.number())
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Alt+{}", self.number())
    }
}

/// Table of the nine snippet strings.
///
/// An empty string marks an unbound slot. Content is never validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetStore {
    /// Snippet text indexed by [`Slot::index`]
    slots: [String; SLOT_COUNT],
}

impl SnippetStore {
    /// Create a store holding the given snippets.
    pub fn new(snippets: [String; SLOT_COUNT]) -> Self {
        Self { slots: snippets }
    }

    /// Snippet bound to `slot`.
    #[allow(clippy::indexing_slicing, reason = "Slot::index is bounded by SLOT_COUNT")]
    pub fn get(&self, slot: Slot) -> &str {
        &self.slots[slot.index()]
    }

    /// Replace all nine snippets at once.
    pub fn set_all(&mut self, snippets: [String; SLOT_COUNT]) {
        self.slots = snippets;
    }

    /// Copy of every snippet, in slot order.
    pub fn snapshot(&self) -> [String; SLOT_COUNT] {
        self.slots.clone()
    }

    /// Number of slots holding non-empty text.
    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> [String; SLOT_COUNT] {
        [
            "hello".to_owned(),
            String::new(),
            "你好，世界".to_owned(),
            "line one\nline two".to_owned(),
            "emoji 🎉".to_owned(),
            "   ".to_owned(),
            "tab\there".to_owned(),
            "x".to_owned(),
            "last".to_owned(),
        ]
    }

    #[test]
    fn set_all_then_get_returns_each_slot() {
        let mut store = SnippetStore::default();
        let snippets = sample();
        store.set_all(snippets.clone());
        for slot in Slot::ALL {
            assert_eq!(store.get(slot), snippets[slot.index()], "{slot}");
        }
    }

    #[test]
    fn default_store_is_unbound() {
        let store = SnippetStore::default();
        assert!(Slot::ALL.iter().all(|&slot| store.get(slot).is_empty()));
        assert_eq!(store.bound_count(), 0);
    }

    #[test]
    fn set_all_replaces_every_slot() {
        let mut store = SnippetStore::new(sample());
        store.set_all(Default::default());
        assert_eq!(store, SnippetStore::default());
    }

    #[test]
    fn snapshot_is_detached_from_store() {
        let mut store = SnippetStore::new(sample());
        let before = store.snapshot();
        store.set_all(Default::default());
        assert_eq!(before, sample());
    }

    #[test]
    fn slot_numbers_and_names() {
        assert_eq!(Slot::Slot4.key_name(), "Alt4");
        assert_eq!(Slot::Slot7.to_string(), "Alt+7");
        for (i, slot) in Slot::ALL.into_iter().enumerate() {
            assert_eq!(slot.index(), i);
            assert_eq!(usize::from(slot.number()), i + 1);
        }
    }
}
