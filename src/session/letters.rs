use serde::{Deserialize, Serialize};

/// Letters typed for the current word. Slots can be blanked in place so a
/// learner can fix one letter mid-word without retyping the rest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterBuffer {
    slots: Vec<Option<char>>,
    /// Slot blanked by the last `remove_at`; the next letter goes there.
    #[serde(default)]
    cursor: Option<usize>,
}

impl LetterBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the keystroke was ignored (buffer full, no gaps).
    pub fn type_letter(&mut self, ch: char, capacity: usize) -> bool {
        if let Some(idx) = self.cursor.take() {
            if let Some(slot) = self.slots.get_mut(idx) {
                *slot = Some(ch);
                return true;
            }
        }
        if self.slots.len() >= capacity {
            return match self.slots.iter_mut().find(|s| s.is_none()) {
                Some(slot) => {
                    *slot = Some(ch);
                    true
                }
                None => false,
            };
        }
        self.slots.push(Some(ch));
        true
    }

    /// Drop the last slot, blank or not.
    pub fn delete_last(&mut self) {
        self.cursor = None;
        self.slots.pop();
    }

    pub fn remove_at(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = None;
            self.cursor = Some(index);
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.cursor = None;
    }

    pub fn slots(&self) -> &[Option<char>] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<char> {
        self.slots.get(index).copied().flatten()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Typed text with blank slots skipped.
    pub fn text(&self) -> String {
        self.slots.iter().flatten().collect()
    }
}
