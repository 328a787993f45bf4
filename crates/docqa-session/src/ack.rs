//! Acknowledgements returned by mutating operations.

use docqa_core::Endpoint;

/// A successful backend mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    /// The endpoint that acknowledged the call.
    pub endpoint: Endpoint,
    /// Whether the collaborator should fully reload its view.
    pub reload_view: bool,
}

impl Ack {
    /// Creates an acknowledgement that needs no view reload.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            reload_view: false,
        }
    }

    /// Creates an acknowledgement asking for a full view reload.
    pub fn with_reload(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            reload_view: true,
        }
    }
}
