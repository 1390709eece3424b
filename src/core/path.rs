//! Field path tracking and violation collection.

use crate::error::{Violation, ViolationKind};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// One step in a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Named object field.
    Field(String),
    /// Position inside a list.
    Index(usize),
}

impl PathSegment {
    /// Field segment.
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Index segment.
    pub fn index(index: usize) -> Self {
        Self::Index(index)
    }

    /// Render segments as `a.b[0].c`.
    pub fn render(segments: &[PathSegment]) -> String {
        let mut out = String::new();
        for segment in segments {
            match segment {
                Self::Field(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                Self::Index(i) => {
                    out.push('[');
                    out.push_str(&i.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{name}"),
            Self::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// Current path plus the ordered violations raised so far.
///
/// Each validation call owns one tracker. Segments are pushed through
/// [`Scope`] guards, which pop on drop, so early returns never leave a
/// stale segment behind.
#[derive(Debug, Default)]
pub struct PathTracker {
    segments: Vec<PathSegment>,
    violations: Vec<Violation>,
}

impl PathTracker {
    /// Create a tracker whose paths start with `root` (skipped when empty).
    pub fn new(root: &str) -> Self {
        let segments = if root.is_empty() {
            Vec::new()
        } else {
            root.split('.').map(PathSegment::field).collect()
        };
        Self {
            segments,
            violations: Vec::new(),
        }
    }

    /// Enter a named field.
    pub fn field(&mut self, name: &str) -> Scope<'_> {
        self.segments.push(PathSegment::field(name));
        Scope { tracker: self }
    }

    /// Enter a list element.
    pub fn index(&mut self, index: usize) -> Scope<'_> {
        self.segments.push(PathSegment::index(index));
        Scope { tracker: self }
    }

    /// Rendered current path.
    pub fn current(&self) -> String {
        PathSegment::render(&self.segments)
    }

    /// Current depth in segments, root prefix included.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Record a violation at the current path.
    pub fn reject(&mut self, kind: ViolationKind, message: impl Into<String>) {
        self.violations
            .push(Violation::new(self.segments.clone(), kind, message.into()));
    }

    /// Number of violations recorded so far.
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// Consume the tracker, returning violations in report order.
    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

/// Scoped path segment. Pops on drop.
pub struct Scope<'a> {
    tracker: &'a mut PathTracker,
}

impl Deref for Scope<'_> {
    type Target = PathTracker;

    fn deref(&self) -> &PathTracker {
        self.tracker
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut PathTracker {
        self.tracker
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        self.tracker.segments.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_prefix() {
        let tracker = PathTracker::new("spec.template");
        assert_eq!(tracker.current(), "spec.template");
        assert_eq!(tracker.depth(), 2);

        let tracker = PathTracker::new("");
        assert_eq!(tracker.current(), "");
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn test_scopes_pop_on_drop() {
        let mut tracker = PathTracker::new("spec");
        {
            let mut domains = tracker.field("failureDomains");
            let mut list = domains.field("openstack");
            let element = list.index(1);
            assert_eq!(element.current(), "spec.failureDomains.openstack[1]");
        }
        assert_eq!(tracker.current(), "spec");
    }

    #[test]
    fn test_early_return_releases_segment() {
        fn visit(tracker: &mut PathTracker, fail: bool) -> Option<()> {
            let mut scope = tracker.field("zone");
            if fail {
                scope.reject(ViolationKind::Structural, "Required value");
                return None;
            }
            Some(())
        }

        let mut tracker = PathTracker::new("spec");
        assert!(visit(&mut tracker, true).is_none());
        assert_eq!(tracker.current(), "spec");
        assert_eq!(tracker.violation_count(), 1);
    }

    #[test]
    fn test_reject_stamps_snapshot() {
        let mut tracker = PathTracker::new("spec");
        {
            let mut list = tracker.field("aws");
            let mut first = list.index(0);
            first.reject(ViolationKind::Structural, "one");
        }
        tracker.reject(ViolationKind::Format, "two");

        let violations = tracker.into_violations();
        assert_eq!(violations[0].to_string(), "spec.aws[0]: one");
        assert_eq!(violations[1].to_string(), "spec: two");
        assert_eq!(violations[1].kind(), ViolationKind::Format);
    }

    #[test]
    fn test_segment_display() {
        assert_eq!(PathSegment::field("zone").to_string(), "zone");
        assert_eq!(PathSegment::index(4).to_string(), "[4]");
    }
}
