//! Tag and recommended-dish labels.
//!
//! A [`LabelList`] is the committed, duplicate-free list stored on a
//! restaurant. A [`LabelEditor`] wraps one with the pending text of an
//! entry field and implements the keyboard contract: Enter or comma
//! commits, Backspace on an empty field removes the last label.
//!
//! Deduplication is exact and case-sensitive: `"spicy"` and `"Spicy"` are
//! two different labels.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constants::LABEL_DELIMITERS;

/// Ordered list of unique, trimmed, non-empty labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LabelList(Vec<String>);

impl LabelList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Trim `raw` and append it unless it is empty or already present.
    ///
    /// Returns `true` if the list changed.
    pub fn add(&mut self, raw: &str) -> bool {
        let label = raw.trim();
        if label.is_empty() || self.contains(label) {
            return false;
        }
        self.0.push(label.to_string());
        true
    }

    /// Split `raw` on delimiters and add every piece in order, including
    /// the last one. Returns the number of labels added.
    pub fn add_delimited(&mut self, raw: &str) -> usize {
        raw.split(&LABEL_DELIMITERS[..])
            .filter(|piece| self.add(piece))
            .count()
    }

    /// Add every delimiter-terminated piece of `raw` and hand back the
    /// trailing partial token, which has not been committed yet.
    pub fn split_pending(&mut self, raw: &str) -> String {
        match raw.rfind(&LABEL_DELIMITERS[..]) {
            Some(pos) => {
                let (complete, rest) = raw.split_at(pos);
                self.add_delimited(complete);
                // `rest` still starts with the delimiter itself
                rest[1..].trim_start().to_string()
            }
            None => raw.to_string(),
        }
    }

    /// Remove the first exact match. Returns `true` if something was removed.
    pub fn remove(&mut self, target: &str) -> bool {
        match self.0.iter().position(|l| l == target) {
            Some(index) => {
                self.0.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove the label at `index`; out-of-range indices are ignored.
    pub fn remove_at(&mut self, index: usize) -> Option<String> {
        if index < self.0.len() {
            Some(self.0.remove(index))
        } else {
            None
        }
    }

    /// Remove the most recently added label.
    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|l| l == label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for LabelList {
    fn from(labels: Vec<String>) -> Self {
        labels.into_iter().collect()
    }
}

impl From<LabelList> for Vec<String> {
    fn from(list: LabelList) -> Self {
        list.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for LabelList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = LabelList::new();
        for label in iter {
            list.add(label.as_ref());
        }
        list
    }
}

impl<'a> IntoIterator for &'a LabelList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Keys the label entry field reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Comma,
    Backspace,
    Char(char),
}

/// Pending input buffer plus the committed labels it feeds.
#[derive(Debug, Clone, Default)]
pub struct LabelEditor {
    labels: LabelList,
    pending: String,
    suggestions: Vec<String>,
}

impl LabelEditor {
    pub fn new(labels: LabelList) -> Self {
        Self {
            labels,
            pending: String::new(),
            suggestions: Vec::new(),
        }
    }

    /// Seed the editor with previously used labels offered as shortcuts.
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn labels(&self) -> &LabelList {
        &self.labels
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Suggestions that are not in the list yet.
    pub fn open_suggestions(&self) -> impl Iterator<Item = &str> {
        self.suggestions
            .iter()
            .map(String::as_str)
            .filter(|s| !self.labels.contains(s))
    }

    /// Replace the pending text, as when the field's value changes.
    ///
    /// Pasted text containing delimiters commits its complete pieces and
    /// keeps only the trailing partial token pending.
    pub fn set_input(&mut self, text: &str) {
        self.pending = self.labels.split_pending(text);
    }

    pub fn key(&mut self, key: Key) {
        match key {
            Key::Enter | Key::Comma => {
                self.commit();
            }
            Key::Char(c) if LABEL_DELIMITERS.contains(&c) => {
                self.commit();
            }
            Key::Char(c) => self.pending.push(c),
            Key::Backspace => {
                if self.pending.is_empty() {
                    self.labels.pop();
                } else {
                    self.pending.pop();
                }
            }
        }
    }

    /// Focus left the field; behaves like Enter.
    pub fn blur(&mut self) {
        self.commit();
    }

    /// Commit the pending input. The buffer is cleared only when a label
    /// was actually added, so a rejected duplicate stays visible.
    pub fn commit(&mut self) -> bool {
        let added = self.labels.add(&self.pending);
        if added {
            self.pending.clear();
        }
        added
    }

    /// Shortcut click on a suggestion.
    pub fn suggest(&mut self, label: &str) -> bool {
        self.labels.add(label)
    }

    pub fn remove_at(&mut self, index: usize) -> Option<String> {
        self.labels.remove_at(index)
    }

    /// Commit whatever is pending and return the final list, as on submit.
    pub fn finish(mut self) -> LabelList {
        self.commit();
        self.labels
    }
}

/// Distinct labels across several lists, in first-seen order.
pub fn suggestions<'a, I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for label in lists.into_iter().flatten() {
        if seen.insert(label.as_str()) {
            out.push(label.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(labels: &[&str]) -> LabelList {
        labels.iter().collect()
    }

    #[test]
    fn test_add_trims_and_appends() {
        let mut labels = LabelList::new();
        assert!(labels.add("  brunch "));
        assert!(labels.add("vegan"));
        assert_eq!(labels.as_slice(), ["brunch", "vegan"]);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut labels = LabelList::new();
        labels.add("ramen");
        assert!(!labels.add("ramen"));
        assert!(!labels.add(" ramen  "));
        assert_eq!(labels.len(), 1);
    }

    #[test]
    fn test_add_blank_is_noop() {
        let mut labels = list(&["a"]);
        assert!(!labels.add(""));
        assert!(!labels.add("   "));
        assert_eq!(labels.as_slice(), ["a"]);
    }

    #[test]
    fn test_dedup_is_case_sensitive() {
        let mut labels = list(&["spicy"]);
        assert!(labels.add("Spicy"));
        assert_eq!(labels.as_slice(), ["spicy", "Spicy"]);
    }

    #[test]
    fn test_add_delimited() {
        let mut labels = LabelList::new();
        assert_eq!(labels.add_delimited("a, b,c"), 3);
        assert_eq!(labels.as_slice(), ["a", "b", "c"]);

        assert_eq!(labels.add_delimited(",,b,\n d ,"), 1);
        assert_eq!(labels.as_slice(), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_split_pending_keeps_trailing_token() {
        let mut labels = LabelList::new();
        let pending = labels.split_pending("tacos, burritos, que");
        assert_eq!(labels.as_slice(), ["tacos", "burritos"]);
        assert_eq!(pending, "que");

        let pending = labels.split_pending("nachos");
        assert_eq!(pending, "nachos");
        assert_eq!(labels.len(), 2);

        let pending = labels.split_pending("churros,");
        assert_eq!(pending, "");
        assert_eq!(labels.as_slice(), ["tacos", "burritos", "churros"]);
    }

    #[test]
    fn test_remove() {
        let mut labels = list(&["a", "b", "c"]);
        assert!(labels.remove("b"));
        assert!(!labels.remove("b"));
        assert!(!labels.remove("A"));
        assert_eq!(labels.as_slice(), ["a", "c"]);

        assert_eq!(labels.remove_at(5), None);
        assert_eq!(labels.remove_at(0).as_deref(), Some("a"));
        assert_eq!(labels.as_slice(), ["c"]);
    }

    #[test]
    fn test_from_vec_normalizes() {
        let labels = LabelList::from(vec![
            " x ".to_string(),
            "x".to_string(),
            "".to_string(),
            "y".to_string(),
        ]);
        assert_eq!(labels.as_slice(), ["x", "y"]);
    }

    #[test]
    fn test_deserialize_normalizes() {
        let labels: LabelList = serde_json::from_str(r#"["a","a"," b",""]"#).unwrap();
        assert_eq!(labels.as_slice(), ["a", "b"]);
        assert_eq!(serde_json::to_string(&labels).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_editor_enter_commits_and_clears() {
        let mut editor = LabelEditor::default();
        editor.set_input("dim sum");
        editor.key(Key::Enter);
        assert_eq!(editor.labels().as_slice(), ["dim sum"]);
        assert_eq!(editor.pending(), "");
    }

    #[test]
    fn test_editor_typed_comma_commits() {
        let mut editor = LabelEditor::default();
        for c in "pho".chars() {
            editor.key(Key::Char(c));
        }
        editor.key(Key::Char(','));
        editor.key(Key::Char('b'));
        assert_eq!(editor.labels().as_slice(), ["pho"]);
        assert_eq!(editor.pending(), "b");
    }

    #[test]
    fn test_editor_duplicate_stays_pending() {
        let mut editor = LabelEditor::new(list(&["pho"]));
        editor.set_input("pho");
        editor.key(Key::Comma);
        assert_eq!(editor.labels().len(), 1);
        assert_eq!(editor.pending(), "pho");
    }

    #[test]
    fn test_editor_backspace() {
        let mut editor = LabelEditor::new(list(&["a", "b"]));
        editor.set_input("c");
        editor.key(Key::Backspace);
        assert_eq!(editor.pending(), "");
        assert_eq!(editor.labels().len(), 2);

        editor.key(Key::Backspace);
        assert_eq!(editor.labels().as_slice(), ["a"]);
        editor.key(Key::Backspace);
        editor.key(Key::Backspace);
        assert!(editor.labels().is_empty());
    }

    #[test]
    fn test_editor_paste_with_delimiters() {
        let mut editor = LabelEditor::default();
        editor.set_input("laksa\nsatay, roti");
        assert_eq!(editor.labels().as_slice(), ["laksa", "satay"]);
        assert_eq!(editor.pending(), "roti");

        let labels = editor.finish();
        assert_eq!(labels.as_slice(), ["laksa", "satay", "roti"]);
    }

    #[test]
    fn test_editor_blur_commits() {
        let mut editor = LabelEditor::default();
        editor.set_input("  kaya toast ");
        editor.blur();
        assert_eq!(editor.labels().as_slice(), ["kaya toast"]);
    }

    #[test]
    fn test_editor_suggestions() {
        let mut editor = LabelEditor::new(list(&["pancakes"]))
            .with_suggestions(vec!["pancakes".into(), "waffles".into()]);
        assert_eq!(editor.open_suggestions().collect::<Vec<_>>(), ["waffles"]);

        assert!(editor.suggest("waffles"));
        assert!(!editor.suggest("waffles"));
        assert_eq!(editor.open_suggestions().count(), 0);
    }

    #[test]
    fn test_suggestions_first_seen_order() {
        let a = vec!["pancakes".to_string(), "eggs".to_string()];
        let b = vec!["eggs".to_string(), "toast".to_string()];
        let all = suggestions([a.as_slice(), b.as_slice()]);
        assert_eq!(all, ["pancakes", "eggs", "toast"]);
    }
}
