//! Selection mode as mirrored by the panel.

/// Selection mode of the page agent in the focused tab.
///
/// The agent owns the real value; the panel only mirrors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Agent is loaded and not selecting
    Inactive,
    /// Agent highlights page elements for extraction
    Active,
    /// Not resolved yet, or the page cannot be reached
    #[default]
    Unknown,
}

impl SelectionMode {
    /// Mode for an agent-reported `active` flag.
    pub fn from_active(active: bool) -> Self {
        if active {
            SelectionMode::Active
        } else {
            SelectionMode::Inactive
        }
    }

    /// Whether the panel should show selection as running.
    pub fn is_active(&self) -> bool {
        matches!(self, SelectionMode::Active)
    }

    /// Get the display name for this mode.
    pub fn name(&self) -> &'static str {
        match self {
            SelectionMode::Inactive => "Inactive",
            SelectionMode::Active => "Active",
            SelectionMode::Unknown => "Unknown",
        }
    }
}
