//! Discovery tracker - which internal destinations the user has revealed.
//!
//! The first match on an internal action only reveals its nav link. Once a
//! path is discovered, the next match on it navigates.

use discovery_rules::{label_for_path, NavSlot};
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The set of discovered internal paths, kept sorted for stable rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscoveryTracker {
    paths: BTreeSet<String>,
}

impl DiscoveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a discovery. Returns `true` only the first time a path is seen.
    ///
    /// External URLs are never tracked.
    pub fn unlock(&mut self, path: &str) -> bool {
        if !path.starts_with('/') {
            return false;
        }
        self.paths.insert(path.to_string())
    }

    pub fn is_discovered(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Keep only paths for which `keep` returns true. Returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let before = self.paths.len();
        self.paths.retain(|path| keep(path));
        before - self.paths.len()
    }

    /// Nav links for every discovered path, labelled by stripping the leading `/`.
    pub fn render(&self) -> String {
        self.paths
            .iter()
            .map(|path| nav_link(path, label_for_path(path), true))
            .collect()
    }

    /// Nav links for every declared slot, marking the discovered ones.
    ///
    /// Undiscovered slots are still emitted so a page can keep them hidden and
    /// animate them in later.
    pub fn render_slots(&self, slots: &[NavSlot]) -> String {
        slots
            .iter()
            .map(|slot| nav_link(&slot.path, &slot.label, self.is_discovered(&slot.path)))
            .collect()
    }
}

fn nav_link(path: &str, label: &str, discovered: bool) -> String {
    let class = if discovered {
        "nav-slot discovered"
    } else {
        "nav-slot"
    };
    let path = encode_double_quoted_attribute(path);
    format!(
        "<a href=\"{}\" class=\"{}\" data-path=\"{}\">{}</a>",
        path,
        class,
        path,
        encode_text(label)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_is_idempotent() {
        let mut tracker = DiscoveryTracker::new();

        assert!(tracker.unlock("/essays"));
        assert!(!tracker.unlock("/essays"));
        assert_eq!(tracker.len(), 1);
        assert!(tracker.is_discovered("/essays"));
    }

    #[test]
    fn test_external_urls_are_not_tracked() {
        let mut tracker = DiscoveryTracker::new();

        assert!(!tracker.unlock("https://github.com"));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_render_lists_discovered_paths() {
        let mut tracker = DiscoveryTracker::new();
        tracker.unlock("/essays");
        tracker.unlock("/cave");

        let html = tracker.render();

        assert!(html.contains(r#"href="/cave""#));
        assert!(html.contains(">essays</a>"));
        assert!(html.contains(">cave</a>"));
        assert_eq!(html.matches("nav-slot discovered").count(), 2);
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut a = DiscoveryTracker::new();
        a.unlock("/b");
        a.unlock("/a");
        let mut b = DiscoveryTracker::new();
        b.unlock("/a");
        b.unlock("/b");

        assert_eq!(a.render(), b.render());
    }

    #[test]
    fn test_render_slots_marks_discovered() {
        let mut tracker = DiscoveryTracker::new();
        tracker.unlock("/essays");
        let slots = vec![
            NavSlot::new("/essays", "Essays"),
            NavSlot::new("/cave", "The Cave"),
        ];

        let html = tracker.render_slots(&slots);

        assert!(html.contains(r#"class="nav-slot discovered" data-path="/essays">Essays</a>"#));
        assert!(html.contains(r#"class="nav-slot" data-path="/cave">The Cave</a>"#));
    }

    #[test]
    fn test_labels_are_escaped() {
        let mut tracker = DiscoveryTracker::new();
        tracker.unlock("/<b>");
        assert!(tracker.render().contains("&lt;b&gt;"));
    }

    #[test]
    fn test_serializes_as_list() {
        let mut tracker = DiscoveryTracker::new();
        tracker.unlock("/essays");
        assert_eq!(serde_json::to_string(&tracker).unwrap(), r#"["/essays"]"#);
    }
}
