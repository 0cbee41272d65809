//! Parenthesis nesting tracker.
//!
//! A per-engine stack machine that records where groups open and close in
//! the input buffer, answers whether a close paren may legally be appended,
//! and mirrors backspace deletions. Reset on clear, on a successful equals,
//! and on a base switch.

/// One tracked group. Open while `end` is `None`; the group's content is
/// derived from the buffer slice, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParenGroup {
    pub start: usize,
    pub end: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ParenTracker {
    groups: Vec<ParenGroup>,
}

impl ParenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an open paren appended at byte position `pos`.
    pub fn open(&mut self, pos: usize) {
        self.groups.push(ParenGroup { start: pos, end: None });
    }

    /// Close the innermost open group at byte position `pos`.
    /// Returns false when no group is open.
    pub fn close(&mut self, pos: usize) -> bool {
        match self.groups.iter_mut().rev().find(|g| g.end.is_none()) {
            Some(group) => {
                group.end = Some(pos);
                true
            }
            None => false,
        }
    }

    pub fn open_count(&self) -> usize {
        self.groups.iter().filter(|g| g.end.is_none()).count()
    }

    /// A close paren is legal only if a group is open and the content since
    /// the last open contains at least one numeral or close paren. This
    /// blocks closing straight after an operator or another open.
    pub fn can_close(&self, expr: &str) -> bool {
        let Some(last_open) = self
            .groups
            .iter()
            .rev()
            .find(|g| g.end.is_none())
            .map(|g| g.start)
        else {
            return false;
        };
        expr.get(last_open + 1..)
            .map(|content| content.chars().any(|c| c.is_ascii_alphanumeric() || c == ')'))
            .unwrap_or(false)
    }

    /// Mirror the deletion of the paren `removed` at byte position `pos`:
    /// deleting `(` discards its group, deleting `)` reopens one.
    pub fn handle_backspace(&mut self, pos: usize, removed: char) {
        match removed {
            '(' => {
                if let Some(idx) = self.groups.iter().rposition(|g| g.start == pos) {
                    self.groups.remove(idx);
                }
            }
            ')' => {
                if let Some(group) = self
                    .groups
                    .iter_mut()
                    .rev()
                    .find(|g| g.end == Some(pos))
                {
                    group.end = None;
                }
            }
            _ => {}
        }
    }

    /// Rebuild the group list from a buffer. Used after structural edits
    /// (operand wrapping, recall) that shift positions.
    pub fn rebuild(&mut self, expr: &str) {
        self.groups.clear();
        for (pos, c) in expr.char_indices() {
            match c {
                '(' => self.open(pos),
                ')' => {
                    self.close(pos);
                }
                _ => {}
            }
        }
    }

    pub fn reset(&mut self) {
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_count_tracks_nesting() {
        let mut t = ParenTracker::new();
        t.open(0);
        t.open(1);
        assert_eq!(t.open_count(), 2);
        assert!(t.close(3));
        assert_eq!(t.open_count(), 1);
        assert!(t.close(4));
        assert!(!t.close(5));
        assert_eq!(t.open_count(), 0);
    }

    #[test]
    fn close_is_illegal_without_content() {
        let mut t = ParenTracker::new();
        t.open(0);
        assert!(!t.can_close("("));
        assert!(t.can_close("(5"));
        t.open(2);
        // content since the innermost open is empty again
        assert!(!t.can_close("(5("));
        assert!(t.can_close("(5(2"));
    }

    #[test]
    fn closed_group_counts_as_content() {
        let mut t = ParenTracker::new();
        t.open(0);
        t.open(1);
        t.close(3);
        assert!(t.can_close("((2)"));
    }

    #[test]
    fn backspace_mirrors_deletions() {
        let mut t = ParenTracker::new();
        t.open(0);
        t.close(2);
        // deleting the close paren reopens the group
        t.handle_backspace(2, ')');
        assert_eq!(t.open_count(), 1);
        // deleting the open paren discards it
        t.handle_backspace(0, '(');
        assert_eq!(t.open_count(), 0);
    }

    #[test]
    fn rebuild_matches_buffer() {
        let mut t = ParenTracker::new();
        t.rebuild("(1 + (2 × 3)) + (4");
        assert_eq!(t.open_count(), 1);
        assert!(t.can_close("(1 + (2 × 3)) + (4"));
    }
}
