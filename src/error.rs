//! Error types for host communication, selection control and storage.

use thiserror::Error;

/// Errors reported by the host runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Nothing is listening in the tab (agent not injected, or page forbids it)
    #[error("Receiving end does not exist: {0}")]
    Unreachable(String),

    /// The extension may not touch this page
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Any other host failure
    #[error("Host error: {0}")]
    Other(String),
}

impl HostError {
    /// Classify a raw host error message.
    ///
    /// Chromium reports missing host permissions as
    /// "Cannot access contents of the page" or "Cannot access a chrome:// URL".
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains("Cannot access") || message.contains("Missing host permission") {
            HostError::PermissionDenied(message)
        } else if message.contains("Receiving end does not exist")
            || message.contains("Could not establish connection")
        {
            HostError::Unreachable(message)
        } else {
            HostError::Other(message)
        }
    }

    /// Whether this is a permission failure.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, HostError::PermissionDenied(_))
    }
}

/// Failures of a selection mode toggle that the user gets to see.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToggleError {
    /// Browser or extension internal page
    #[error("Selection is not available on browser internal pages ({url})")]
    RestrictedPage {
        /// URL of the rejected tab
        url: String,
    },

    /// Host refused injection for lack of permissions
    #[error("Injecting the page agent was denied: {0}")]
    InjectionDenied(HostError),

    /// Injection failed for another reason
    #[error("Injecting the page agent failed: {0}")]
    InjectionFailed(HostError),

    /// Agent injected but did not answer the retried toggle
    #[error("Page agent did not respond after injection: {0}")]
    AgentUnresponsive(HostError),
}

impl ToggleError {
    /// Message shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            ToggleError::RestrictedPage { .. } => {
                "This extension cannot run on browser internal pages."
            }
            ToggleError::InjectionDenied(_) => {
                "Insufficient permissions for this page. Check that the extension has the required permissions."
            }
            ToggleError::InjectionFailed(_) => {
                "Could not inject the selection script. Reload the page and try again."
            }
            ToggleError::AgentUnresponsive(_) => {
                "Error: unable to enable selection mode on this page."
            }
        }
    }
}

/// Errors from the image collection storage layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error in file-backed storage
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key-value backend failure (localStorage in WASM)
    #[error("Storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_host_errors() {
        assert!(
            HostError::classify("Cannot access contents of the page. Extension manifest must request permission to access the respective host.")
                .is_permission_denied()
        );
        assert_eq!(
            HostError::classify("Could not establish connection. Receiving end does not exist."),
            HostError::Unreachable(
                "Could not establish connection. Receiving end does not exist.".to_string()
            )
        );
        assert_eq!(
            HostError::classify("Frame with ID 0 was removed."),
            HostError::Other("Frame with ID 0 was removed.".to_string())
        );
    }

    #[test]
    fn test_injection_messages_differ() {
        let denied = ToggleError::InjectionDenied(HostError::PermissionDenied("x".into()));
        let failed = ToggleError::InjectionFailed(HostError::Other("x".into()));
        assert_ne!(denied.user_message(), failed.user_message());
    }
}
