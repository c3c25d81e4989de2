//! Messages exchanged between the panel and the page agent.
//!
//! Every message is a JSON object tagged by its `type` field. Status replies
//! are the one exception: they answer `CHECK_STATUS` directly and carry no tag.

use serde::{Deserialize, Serialize};

use crate::model::{ExtractedImage, SelectionMode};

/// Requests the panel sends to the page agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentRequest {
    /// Ask for the agent's load and selection state
    CheckStatus,
    /// Flip selection mode
    ToggleSelectionMode,
}

impl AgentRequest {
    /// Wire tag of this request.
    pub fn tag(&self) -> &'static str {
        match self {
            AgentRequest::CheckStatus => "CHECK_STATUS",
            AgentRequest::ToggleSelectionMode => "TOGGLE_SELECTION_MODE",
        }
    }
}

/// Reply to [`AgentRequest::CheckStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReply {
    #[serde(default)]
    pub is_loaded: bool,
    #[serde(default)]
    pub is_selection_mode: bool,
}

impl StatusReply {
    /// Mode this reply reports. An agent that is not loaded counts as inactive.
    pub fn mode(&self) -> SelectionMode {
        if self.is_loaded {
            SelectionMode::from_active(self.is_selection_mode)
        } else {
            SelectionMode::Inactive
        }
    }
}

/// Events the page agent pushes to the panel without being asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentEvent {
    /// The user picked an image
    ImageExtracted {
        #[serde(rename = "imageData")]
        image_data: ExtractedImage,
    },
    /// Selection mode changed inside the page
    SelectionModeStatus { active: bool },
    /// A freshly injected agent finished initializing
    AgentReady,
}

impl AgentEvent {
    /// Parse a runtime message, ignoring anything that is not an agent event.
    ///
    /// The panel shares its message channel with the rest of the extension,
    /// so unknown tags are expected.
    pub fn parse(value: serde_json::Value) -> Option<Self> {
        match serde_json::from_value(value) {
            Ok(event) => Some(event),
            Err(e) => {
                log::trace!("Ignoring runtime message: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        assert_eq!(
            serde_json::to_value(AgentRequest::CheckStatus).unwrap(),
            json!({"type": "CHECK_STATUS"})
        );
        assert_eq!(
            serde_json::to_value(AgentRequest::ToggleSelectionMode).unwrap(),
            json!({"type": "TOGGLE_SELECTION_MODE"})
        );
        assert_eq!(AgentRequest::ToggleSelectionMode.tag(), "TOGGLE_SELECTION_MODE");
    }

    #[test]
    fn test_status_reply_mode() {
        let reply: StatusReply =
            serde_json::from_value(json!({"isLoaded": true, "isSelectionMode": true})).unwrap();
        assert_eq!(reply.mode(), SelectionMode::Active);

        let reply: StatusReply =
            serde_json::from_value(json!({"isLoaded": false, "isSelectionMode": true})).unwrap();
        assert_eq!(reply.mode(), SelectionMode::Inactive);

        let reply: StatusReply = serde_json::from_value(json!({})).unwrap();
        assert_eq!(reply.mode(), SelectionMode::Inactive);
    }

    #[test]
    fn test_parse_image_extracted() {
        let event = AgentEvent::parse(json!({
            "type": "IMAGE_EXTRACTED",
            "imageData": {
                "src": "https://example.com/cat.jpg",
                "timestamp": 1714566645123_i64,
                "format": "jpg"
            }
        }));

        match event {
            Some(AgentEvent::ImageExtracted { image_data }) => {
                assert_eq!(image_data.src, "https://example.com/cat.jpg");
                assert_eq!(image_data.format.as_deref(), Some("jpg"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_mode_status_and_ready() {
        assert_eq!(
            AgentEvent::parse(json!({"type": "SELECTION_MODE_STATUS", "active": false})),
            Some(AgentEvent::SelectionModeStatus { active: false })
        );
        assert_eq!(
            AgentEvent::parse(json!({"type": "AGENT_READY"})),
            Some(AgentEvent::AgentReady)
        );
    }

    #[test]
    fn test_parse_ignores_unknown() {
        assert!(AgentEvent::parse(json!({"type": "SOMETHING_ELSE"})).is_none());
        assert!(AgentEvent::parse(json!("not an object")).is_none());
    }
}
