//! Push channel handshake state machine for inbox-sync.
//!
//! This module provides a pure, side-effect-free state machine for the
//! channel lifecycle. The state machine takes events as input and produces
//! a new state plus a list of actions to execute.
//!
//! The actual I/O (opening the transport, sending the auth frame, clearing
//! credentials) is performed by inbox-client, not by this module.
//!
//! ```text
//! Disconnected ──connect──► HandshakePending ──authorized──► Authorized
//!      ▲                      │        ▲                         │
//!      │                   denied      └──────connect─────┐      │
//!      │                      ▼                           │      │
//!      └──logout/closed─── Denied ────────────────────────┘      │
//!      └─────────────────────logout / closed / 401───────────────┘
//! ```

use inbox_types::Notice;

/// Channel state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    /// No handshake in progress; notices are not delivered.
    #[default]
    Disconnected,
    /// Auth frame sent, waiting for the server's verdict.
    HandshakePending,
    /// Server accepted the token; notices are forwarded.
    Authorized,
    /// Server rejected the token; a fresh token is required.
    Denied,
}

impl ChannelState {
    /// Create a new state machine in the Disconnected state.
    pub fn new() -> Self {
        Self::Disconnected
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (inbox-client)
    /// is responsible for executing the returned actions in order.
    pub fn on_event(self, event: Event) -> (Self, Vec<Action>) {
        match (self, event) {
            // Start (or restart after denial) a handshake
            (Self::Disconnected | Self::Denied, Event::ConnectRequested) => (
                Self::HandshakePending,
                vec![Action::OpenTransport, Action::SendAuth],
            ),
            // Re-entering the handshake must not register a second auth
            (Self::HandshakePending | Self::Authorized, Event::ConnectRequested) => (self, vec![]),

            // Server verdict
            (Self::HandshakePending, Event::ServerAuthorized) => (
                Self::Authorized,
                vec![Action::Emit(ChannelEvent::Authorized)],
            ),
            (Self::HandshakePending | Self::Authorized, Event::ServerDenied) => (
                Self::Denied,
                vec![
                    Action::InvalidateCredentials,
                    Action::Emit(ChannelEvent::Denied),
                ],
            ),

            // Change notices only flow once authorized
            (Self::Authorized, Event::NoticeReceived { notice }) => {
                (Self::Authorized, vec![Action::ForwardNotice(notice)])
            }

            // Transport went away underneath us
            (Self::HandshakePending | Self::Authorized, Event::TransportClosed { reason }) => (
                Self::Disconnected,
                vec![Action::Emit(ChannelEvent::Disconnected { reason })],
            ),
            (Self::Denied, Event::TransportClosed { .. }) => (Self::Disconnected, vec![]),

            // Explicit teardown
            (Self::HandshakePending | Self::Authorized | Self::Denied, Event::LogoutRequested) => {
                (Self::Disconnected, vec![Action::CloseTransport])
            }
            (
                Self::HandshakePending | Self::Authorized | Self::Denied,
                Event::CredentialsRejected,
            ) => (
                Self::Disconnected,
                vec![Action::CloseTransport, Action::InvalidateCredentials],
            ),
            (Self::Disconnected, Event::CredentialsRejected) => {
                (Self::Disconnected, vec![Action::InvalidateCredentials])
            }

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if change notices are currently delivered.
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }
}

/// Events that can occur in the channel lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Caller asked to connect with the current token.
    ConnectRequested,
    /// Server emitted `authorized`.
    ServerAuthorized,
    /// Server emitted `denied`.
    ServerDenied,
    /// Server emitted a change notice.
    NoticeReceived {
        /// The received notice.
        notice: Notice,
    },
    /// Transport-level closure or failure.
    TransportClosed {
        /// Reason for the closure.
        reason: String,
    },
    /// Caller logged out.
    LogoutRequested,
    /// A REST call was answered with an authorization failure.
    CredentialsRejected,
}

/// Actions to be executed by inbox-client.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open the transport if it is not already open.
    OpenTransport,
    /// Send the `auth` frame carrying the current token.
    SendAuth,
    /// Close the transport.
    CloseTransport,
    /// Drop the cached token (memory and credential store).
    InvalidateCredentials,
    /// Hand a notice to the synchronization core.
    ForwardNotice(Notice),
    /// Report a lifecycle change.
    Emit(ChannelEvent),
}

/// Lifecycle changes reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Handshake succeeded.
    Authorized,
    /// Handshake was rejected.
    Denied,
    /// The channel dropped without a logout.
    Disconnected {
        /// Reason for the disconnection.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> Notice {
        Notice::Created("n1".into())
    }

    // ===========================================
    // Handshake Tests
    // ===========================================

    #[test]
    fn starts_disconnected() {
        let state = ChannelState::new();
        assert_eq!(state, ChannelState::Disconnected);
        assert!(!state.is_authorized());
    }

    #[test]
    fn connect_opens_transport_and_sends_auth() {
        let (state, actions) = ChannelState::Disconnected.on_event(Event::ConnectRequested);

        assert_eq!(state, ChannelState::HandshakePending);
        assert_eq!(actions, vec![Action::OpenTransport, Action::SendAuth]);
    }

    #[test]
    fn authorized_verdict_transitions_to_authorized() {
        let (state, actions) = ChannelState::HandshakePending.on_event(Event::ServerAuthorized);

        assert_eq!(state, ChannelState::Authorized);
        assert!(actions
            .iter()
            .any(|a| matches!(a, Action::Emit(ChannelEvent::Authorized))));
    }

    #[test]
    fn denied_verdict_invalidates_credentials() {
        let (state, actions) = ChannelState::HandshakePending.on_event(Event::ServerDenied);

        assert_eq!(state, ChannelState::Denied);
        assert!(actions.contains(&Action::InvalidateCredentials));
    }

    #[test]
    fn connect_from_denied_restarts_handshake() {
        let (state, actions) = ChannelState::Denied.on_event(Event::ConnectRequested);

        assert_eq!(state, ChannelState::HandshakePending);
        assert!(actions.contains(&Action::SendAuth));
    }

    #[test]
    fn connect_while_authorized_is_noop() {
        let (state, actions) = ChannelState::Authorized.on_event(Event::ConnectRequested);

        assert_eq!(state, ChannelState::Authorized);
        assert!(actions.is_empty());
    }

    #[test]
    fn connect_while_pending_does_not_resend_auth() {
        let (state, actions) = ChannelState::HandshakePending.on_event(Event::ConnectRequested);

        assert_eq!(state, ChannelState::HandshakePending);
        assert!(actions.is_empty());
    }

    #[test]
    fn duplicate_authorized_is_ignored() {
        let (state, actions) = ChannelState::Authorized.on_event(Event::ServerAuthorized);

        assert_eq!(state, ChannelState::Authorized);
        assert!(actions.is_empty());
    }

    // ===========================================
    // Notice Gating Tests
    // ===========================================

    #[test]
    fn notices_forwarded_when_authorized() {
        let (_, actions) = ChannelState::Authorized.on_event(Event::NoticeReceived {
            notice: notice(),
        });

        assert_eq!(actions, vec![Action::ForwardNotice(notice())]);
    }

    #[test]
    fn notices_dropped_before_authorization() {
        for state in [
            ChannelState::Disconnected,
            ChannelState::HandshakePending,
            ChannelState::Denied,
        ] {
            let (new_state, actions) = state.on_event(Event::NoticeReceived { notice: notice() });
            assert_eq!(new_state, state);
            assert!(actions.is_empty(), "notice leaked in {:?}", state);
        }
    }

    // ===========================================
    // Teardown Tests
    // ===========================================

    #[test]
    fn transport_closure_disconnects() {
        let (state, actions) = ChannelState::Authorized.on_event(Event::TransportClosed {
            reason: "reset".into(),
        });

        assert_eq!(state, ChannelState::Disconnected);
        assert!(actions.iter().any(|a| matches!(
            a,
            Action::Emit(ChannelEvent::Disconnected { reason }) if reason == "reset"
        )));
    }

    #[test]
    fn closure_requires_fresh_handshake() {
        let (state, _) = ChannelState::Authorized.on_event(Event::TransportClosed {
            reason: "reset".into(),
        });
        let (state, actions) = state.on_event(Event::NoticeReceived { notice: notice() });
        assert!(actions.is_empty());

        let (state, actions) = state.on_event(Event::ConnectRequested);
        assert_eq!(state, ChannelState::HandshakePending);
        assert!(actions.contains(&Action::SendAuth));
    }

    #[test]
    fn logout_closes_transport() {
        let (state, actions) = ChannelState::Authorized.on_event(Event::LogoutRequested);

        assert_eq!(state, ChannelState::Disconnected);
        assert_eq!(actions, vec![Action::CloseTransport]);
    }

    #[test]
    fn logout_when_disconnected_is_noop() {
        let (state, actions) = ChannelState::Disconnected.on_event(Event::LogoutRequested);

        assert_eq!(state, ChannelState::Disconnected);
        assert!(actions.is_empty());
    }

    #[test]
    fn rejected_credentials_close_and_invalidate() {
        let (state, actions) = ChannelState::Authorized.on_event(Event::CredentialsRejected);

        assert_eq!(state, ChannelState::Disconnected);
        assert!(actions.contains(&Action::CloseTransport));
        assert!(actions.contains(&Action::InvalidateCredentials));
    }

    #[test]
    fn rejected_credentials_while_disconnected_still_invalidate() {
        let (state, actions) = ChannelState::Disconnected.on_event(Event::CredentialsRejected);

        assert_eq!(state, ChannelState::Disconnected);
        assert_eq!(actions, vec![Action::InvalidateCredentials]);
    }
}
