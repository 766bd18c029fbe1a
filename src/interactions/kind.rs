//! Interaction kinds and their canonical ordering.

use std::fmt;

/// The four interaction kinds a resource type can support.
///
/// The derived ordering is the canonical display order used everywhere an
/// interaction list is rendered, notably in the capability statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InteractionKind {
    Create,
    Read,
    SearchType,
    Update,
}

impl InteractionKind {
    /// All kinds in canonical order.
    pub const ALL: [InteractionKind; 4] = [
        InteractionKind::Create,
        InteractionKind::Read,
        InteractionKind::SearchType,
        InteractionKind::Update,
    ];

    /// Wire label, as it appears in capability statements and route docs.
    pub fn label(&self) -> &'static str {
        match self {
            InteractionKind::Create => "create",
            InteractionKind::Read => "read",
            InteractionKind::SearchType => "search-type",
            InteractionKind::Update => "update",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
