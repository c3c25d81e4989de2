//! Panel message types.
//!
//! Every host event and user action reaches the panel as a message, handled
//! one at a time by [`Panel::update`](crate::panel::Panel::update).

use crate::protocol::AgentEvent;

/// Messages that can be sent to update panel state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Lifecycle
    /// Panel document finished loading
    PanelLoaded,
    /// Another tab got focus
    TabActivated,
    /// A tab finished loading a page
    TabNavigated,

    // Page agent
    /// Event pushed by the page agent
    Agent(AgentEvent),

    // Toolbar
    /// Selection mode button clicked
    ToggleSelection,
    /// Clear button clicked
    ClearImages,

    // Image cards
    /// Download button of the card rendered at this index
    Download(usize),
    /// Delete button of the card rendered at this index
    Delete(isize),
}
