//! Path filters over the reference tree.
//!
//! A path pattern is a `/`-separated list of segments anchored at the tree
//! root. A segment matches a node by name or by type; `*` matches exactly
//! one node of any name. `/Grundforløb/*/professionalReference` therefore
//! finds professional references one level below the pathway, while
//! `/Grundforløb/professionalReference` finds those attached directly to it.

use crate::model::Reference;

/// Engagement workflow states that count as currently active.
pub const ACTIVE_ENGAGEMENT_STATES: [&str; 3] = ["Bevilget", "Anvist", "Ændret"];

/// Options for [`filter_engagement_references`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngagementFilter {
    pub active_only: bool,
    pub include_packages: bool,
}

impl EngagementFilter {
    /// Active, non-package engagements: the ones tasks may be placed on.
    pub const TASK_PLACEMENT: Self = Self {
        active_only: true,
        include_packages: false,
    };
}

/// All nodes addressed by `pattern`, in document order.
///
/// With `active_pathways_only`, pathway nodes flagged inactive hide their
/// whole subtree.
pub fn filter_by_path<'a>(
    tree: &'a [Reference],
    pattern: &str,
    active_pathways_only: bool,
) -> Vec<&'a Reference> {
    let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let mut matches = Vec::new();
    if segments.is_empty() {
        return matches;
    }
    for node in tree {
        collect(node, &segments, active_pathways_only, &mut matches);
    }
    matches
}

fn collect<'a>(
    node: &'a Reference,
    segments: &[&str],
    active_pathways_only: bool,
    matches: &mut Vec<&'a Reference>,
) {
    if active_pathways_only && node.is_inactive_pathway() {
        return;
    }
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if !node.matches_segment(head) {
        return;
    }
    if rest.is_empty() {
        matches.push(node);
        return;
    }
    for child in &node.children {
        collect(child, rest, active_pathways_only, matches);
    }
}

pub fn is_active_engagement(reference: &Reference) -> bool {
    reference
        .workflow_state
        .as_ref()
        .is_some_and(|s| ACTIVE_ENGAGEMENT_STATES.contains(&s.name.as_str()))
}

/// Narrow engagement references by workflow state and package membership.
pub fn filter_engagement_references(
    references: Vec<Reference>,
    filter: EngagementFilter,
) -> Vec<Reference> {
    references
        .into_iter()
        .filter(|r| !filter.active_only || is_active_engagement(r))
        .filter(|r| filter.include_packages || !r.is_package())
        .collect()
}
