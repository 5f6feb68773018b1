//! Connection state machine types.
//!
//! The internal [`LinkState`] carries two sub-states beyond the public
//! status: `PendingLoss`, entered when the link signals an error or close
//! that has not yet survived the debounce window, and `Disconnecting`, the
//! intentional teardown in progress. Modeling these as states instead of
//! boolean flags makes combinations like "intentionally disconnecting while
//! also debouncing a loss signal" unrepresentable.
//!
//! ## State transition diagram
//!
//! ```text
//!              connect()            open ok
//! Disconnected ─────────► Connecting ─────────► Connected ◄──┐
//!      ▲                      │                    │  │      │ spurious
//!      │        open failed   │       loss signal  │  │      │ signal
//!      ├──────────────────────┘                    │  └──► PendingLoss
//!      │                                           │            │
//!      │                            disconnect()   │            │ confirmed
//!      └────────────── Disconnecting ◄─────────────┴────────────┘
//! ```
//!
//! Status notifications fire only when the *public projection* of the state
//! changes: `PendingLoss` and `Disconnecting` both project to `Connected`,
//! so a suppressed spurious loss produces no notification at all, and an
//! intentional disconnect produces exactly one `Disconnected`.

use serde::{Deserialize, Serialize};

/// Externally visible connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// No link open, ready to connect.
    Disconnected,
    /// Opening the link.
    Connecting,
    /// Link open and operational.
    Connected,
}

/// Internal lifecycle state of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    /// A loss signal arrived; waiting out the debounce window before
    /// deciding whether the link is really gone.
    PendingLoss,
    /// Intentional teardown in progress.
    Disconnecting,
}

impl LinkState {
    /// Project the internal state onto the public status.
    pub(crate) fn status(self) -> ConnectionStatus {
        match self {
            LinkState::Disconnected => ConnectionStatus::Disconnected,
            LinkState::Connecting => ConnectionStatus::Connecting,
            LinkState::Connected | LinkState::PendingLoss | LinkState::Disconnecting => {
                ConnectionStatus::Connected
            }
        }
    }

    /// Validate that a transition to `next` is a legal edge.
    pub(crate) fn can_transition_to(self, next: LinkState) -> bool {
        use LinkState::*;

        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, PendingLoss)
                | (Connected, Disconnecting)
                | (PendingLoss, Connected)
                | (PendingLoss, Disconnecting)
                | (Disconnecting, Disconnected)
        )
    }
}
