//! Range grouping for progressive pile selection.
//!
//! A chat keyboard only holds a handful of buttons, so a long pile list is cut
//! into at most `max_groups` contiguous ranges labelled `first..last`. Picking
//! a range shows that range cut the same way, until few enough piles remain to
//! list them one by one.

/// Separator between the first and last pile of a range label.
pub const GROUP_LABEL_DELIMITER: &str = "..";

/// A contiguous run of pile identifiers shown as one menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    members: Vec<String>,
}

impl Group {
    /// Invariant: `members` is non-empty.
    fn new(members: Vec<String>) -> Self {
        debug_assert!(!members.is_empty());
        Self { members }
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }

    pub fn first(&self) -> &str {
        self.members.first().map(String::as_str).unwrap_or_default()
    }

    pub fn last(&self) -> &str {
        self.members.last().map(String::as_str).unwrap_or_default()
    }

    /// `first..last`. Singletons produce `x..x`; menus show the bare id instead.
    pub fn label(&self) -> String {
        format!("{}{GROUP_LABEL_DELIMITER}{}", self.first(), self.last())
    }

    /// Text for the menu button: the range label, or the pile itself for a singleton.
    pub fn button_label(&self) -> String {
        if self.is_singleton() {
            self.first().to_string()
        } else {
            self.label()
        }
    }
}

/// Partition `identifiers` into at most `max_groups` contiguous groups.
///
/// With `n <= max_groups` every identifier becomes its own group. Otherwise
/// exactly `max_groups` groups are produced; each holds `n / max_groups`
/// identifiers and the first `n % max_groups` groups hold one more. Order is
/// preserved and every identifier lands in exactly one group.
pub fn compute_groups(identifiers: &[String], max_groups: usize) -> Vec<Group> {
    let max_groups = max_groups.max(1);
    let n = identifiers.len();

    if n <= max_groups {
        return identifiers
            .iter()
            .map(|id| Group::new(vec![id.clone()]))
            .collect();
    }

    let base = n / max_groups;
    let remainder = n % max_groups;

    let mut groups = Vec::with_capacity(max_groups);
    let mut start = 0;
    for i in 0..max_groups {
        let size = if i < remainder { base + 1 } else { base };
        groups.push(Group::new(identifiers[start..start + size].to_vec()));
        start += size;
    }

    groups
}

/// Find the group whose label equals `label`, searching the newest menu level first.
pub fn find_group_by_label<'a>(history: &'a [Vec<Group>], label: &str) -> Option<&'a Group> {
    history
        .iter()
        .rev()
        .flat_map(|level| level.iter())
        .find(|group| group.label() == label)
}
