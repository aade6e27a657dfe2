//! Push channel handshake.
//!
//! [`ChannelHandshake`] drives the pure [`ChannelState`] machine from
//! inbox-core against a real [`Transport`]: it executes the returned
//! actions and turns incoming frames into [`ChannelUpdate`]s.

use inbox_core::{Action, ChannelEvent, ChannelState, Event};
use inbox_types::{AuthToken, ClientMessage, Notice, ServerMessage};
use std::future::Future;
use tokio::sync::Mutex;

use crate::error::ClientError;
use crate::transport::{Transport, TransportError};

/// Result of processing one incoming frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelUpdate {
    /// The server accepted the token.
    Authorized,
    /// The server rejected the token. Credentials must be invalidated.
    Denied,
    /// A change notice arrived while authorized.
    Notice(Notice),
    /// The frame was dropped (undecodable, unexpected, or not authorized).
    Ignored,
    /// The channel is closed. A fresh handshake is required.
    Closed,
}

/// Push channel connection plus its handshake state.
pub struct ChannelHandshake<T: Transport> {
    transport: T,
    address: String,
    state: Mutex<ChannelState>,
}

impl<T: Transport> ChannelHandshake<T> {
    /// Create a handshake driver for `address`.
    pub fn new(transport: T, address: impl Into<String>) -> Self {
        Self {
            transport,
            address: address.into(),
            state: Mutex::new(ChannelState::new()),
        }
    }

    /// Current state.
    pub async fn state(&self) -> ChannelState {
        *self.state.lock().await
    }

    /// Start the handshake with `token`.
    ///
    /// Calling this while a handshake is pending or already authorized
    /// does nothing; in particular no second `auth` frame is sent.
    pub async fn connect(&self, token: &AuthToken) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        let (next, actions) = state.on_event(Event::ConnectRequested);
        if actions.is_empty() {
            tracing::debug!(state = ?*state, "handshake already in progress");
            return Ok(());
        }
        *state = next;

        for action in actions {
            if let Err(e) = self.execute(&action, token).await {
                tracing::warn!(error = %e, "handshake failed");
                let (next, _) = state.on_event(Event::TransportClosed {
                    reason: e.to_string(),
                });
                *state = next;
                self.close_quietly().await;
                return Err(e.into());
            }
        }

        tracing::debug!(address = %self.address, "auth frame sent");
        Ok(())
    }

    /// Wait for the next frame and apply it to the state machine.
    pub async fn recv_update(&self) -> Result<ChannelUpdate, ClientError> {
        self.recv_update_with(|| async { Ok(()) }).await
    }

    /// Like [`recv_update`](Self::recv_update), running `invalidate` on denial.
    ///
    /// `invalidate` runs while the state lock is held, so the token is gone
    /// by the time any other caller can observe the `Denied` state.
    pub async fn recv_update_with<F, Fut>(
        &self,
        invalidate: F,
    ) -> Result<ChannelUpdate, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ClientError>>,
    {
        // Receive without holding the state lock so logout can proceed
        let frame = self.transport.recv().await;

        let mut state = self.state.lock().await;
        let bytes = match frame {
            Ok(bytes) => bytes,
            Err(e) => {
                if *state == ChannelState::Disconnected {
                    return Ok(ChannelUpdate::Closed);
                }
                let (next, _) = state.on_event(Event::TransportClosed {
                    reason: e.to_string(),
                });
                *state = next;
                self.close_quietly().await;
                return match e {
                    TransportError::ConnectionClosed => {
                        tracing::info!("push channel closed");
                        Ok(ChannelUpdate::Closed)
                    }
                    other => {
                        tracing::warn!(error = %other, "push channel failed");
                        Err(other.into())
                    }
                };
            }
        };

        let message = match ServerMessage::from_bytes(&bytes) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, len = bytes.len(), "dropping undecodable frame");
                return Ok(ChannelUpdate::Ignored);
            }
        };

        let event = match message {
            ServerMessage::Authorized => Event::ServerAuthorized,
            ServerMessage::Denied => Event::ServerDenied,
            other => match other.notice() {
                Some(notice) => Event::NoticeReceived { notice },
                None => return Ok(ChannelUpdate::Ignored),
            },
        };

        let previous = *state;
        let (next, actions) = state.on_event(event);
        *state = next;

        let mut invalidate = Some(invalidate);
        let mut update = ChannelUpdate::Ignored;
        for action in actions {
            match action {
                Action::ForwardNotice(notice) => update = ChannelUpdate::Notice(notice),
                Action::InvalidateCredentials => {
                    if let Some(invalidate) = invalidate.take() {
                        invalidate().await?;
                    }
                    update = ChannelUpdate::Denied;
                }
                Action::Emit(ChannelEvent::Authorized) => {
                    tracing::info!(address = %self.address, "push channel authorized");
                    update = ChannelUpdate::Authorized;
                }
                Action::Emit(ChannelEvent::Denied) => {
                    tracing::warn!(address = %self.address, "push channel denied");
                }
                Action::Emit(ChannelEvent::Disconnected { reason }) => {
                    tracing::info!(%reason, "push channel disconnected");
                }
                Action::OpenTransport | Action::SendAuth | Action::CloseTransport => {}
            }
        }

        if update == ChannelUpdate::Ignored {
            tracing::debug!(state = ?previous, "frame dropped");
        }
        Ok(update)
    }

    /// Tear the channel down after a logout.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.apply_teardown(Event::LogoutRequested).await
    }

    /// Tear the channel down after the server rejected the token on a REST call.
    pub async fn reject(&self) -> Result<(), ClientError> {
        self.apply_teardown(Event::CredentialsRejected).await
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Channel address.
    pub fn address(&self) -> &str {
        &self.address
    }

    async fn apply_teardown(&self, event: Event) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        let (next, actions) = state.on_event(event);
        *state = next;
        if actions.contains(&Action::CloseTransport) {
            self.transport.close().await?;
            tracing::debug!(address = %self.address, "push channel closed");
        }
        Ok(())
    }

    async fn execute(&self, action: &Action, token: &AuthToken) -> Result<(), TransportError> {
        match action {
            Action::OpenTransport => {
                if !self.transport.is_connected() {
                    self.transport.connect(&self.address).await?;
                }
                Ok(())
            }
            Action::SendAuth => {
                let frame = ClientMessage::Auth(token.clone())
                    .to_bytes()
                    .map_err(|e| TransportError::SendFailed(e.to_string()))?;
                self.transport.send(&frame).await
            }
            _ => Ok(()),
        }
    }

    async fn close_quietly(&self) {
        if let Err(e) = self.transport.close().await {
            tracing::debug!(error = %e, "close after failure");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    fn channel() -> (ChannelHandshake<MockTransport>, MockTransport) {
        let transport = MockTransport::new();
        let handle = transport.clone();
        (ChannelHandshake::new(transport, "wss://inbox.test"), handle)
    }

    fn token() -> AuthToken {
        AuthToken::new("tok")
    }

    // ===========================================
    // Handshake Tests
    // ===========================================

    #[tokio::test]
    async fn connect_opens_transport_and_sends_auth() {
        let (channel, mock) = channel();

        channel.connect(&token()).await.unwrap();

        assert_eq!(channel.state().await, ChannelState::HandshakePending);
        assert_eq!(mock.connected_address().as_deref(), Some("wss://inbox.test"));
        assert_eq!(mock.sent_messages(), vec![ClientMessage::Auth(token())]);
    }

    #[tokio::test]
    async fn reentry_sends_no_second_auth() {
        let (channel, mock) = channel();

        channel.connect(&token()).await.unwrap();
        channel.connect(&token()).await.unwrap();
        mock.queue_message(ServerMessage::Authorized);
        assert_eq!(channel.recv_update().await.unwrap(), ChannelUpdate::Authorized);
        channel.connect(&token()).await.unwrap();

        assert_eq!(mock.sent_frames().len(), 1);
        assert_eq!(mock.connect_count(), 1);
    }

    #[tokio::test]
    async fn denial_reports_denied() {
        let (channel, mock) = channel();
        channel.connect(&token()).await.unwrap();
        mock.queue_message(ServerMessage::Denied);

        assert_eq!(channel.recv_update().await.unwrap(), ChannelUpdate::Denied);
        assert_eq!(channel.state().await, ChannelState::Denied);
    }

    #[tokio::test]
    async fn denial_invalidates_under_state_lock() {
        let (channel, mock) = channel();
        channel.connect(&token()).await.unwrap();
        mock.queue_message(ServerMessage::Denied);
        let mut ran = false;

        let update = channel
            .recv_update_with(|| {
                // The Denied state must not be observable before invalidation
                assert!(channel.state.try_lock().is_err());
                ran = true;
                async { Ok(()) }
            })
            .await
            .unwrap();

        assert_eq!(update, ChannelUpdate::Denied);
        assert!(ran);
    }

    #[tokio::test]
    async fn authorization_does_not_invalidate() {
        let (channel, mock) = channel();
        channel.connect(&token()).await.unwrap();
        mock.queue_message(ServerMessage::Authorized);
        let mut ran = false;

        channel
            .recv_update_with(|| {
                ran = true;
                async { Ok(()) }
            })
            .await
            .unwrap();

        assert!(!ran);
    }

    #[tokio::test]
    async fn connect_after_denial_retries_handshake() {
        let (channel, mock) = channel();
        channel.connect(&token()).await.unwrap();
        mock.queue_message(ServerMessage::Denied);
        channel.recv_update().await.unwrap();

        channel.connect(&AuthToken::new("fresh")).await.unwrap();

        assert_eq!(channel.state().await, ChannelState::HandshakePending);
        assert_eq!(
            mock.sent_messages().last(),
            Some(&ClientMessage::Auth(AuthToken::new("fresh")))
        );
        // Transport was still open, so it is reused
        assert_eq!(mock.connect_count(), 1);
    }

    #[tokio::test]
    async fn connect_failure_returns_to_disconnected() {
        let (channel, mock) = channel();
        mock.fail_next_connect("refused");

        let result = channel.connect(&token()).await;

        assert!(matches!(result, Err(ClientError::Transport(_))));
        assert_eq!(channel.state().await, ChannelState::Disconnected);
        assert!(mock.sent_frames().is_empty());
    }

    // ===========================================
    // Frame Handling Tests
    // ===========================================

    #[tokio::test]
    async fn notices_before_authorization_are_ignored() {
        let (channel, mock) = channel();
        channel.connect(&token()).await.unwrap();
        mock.queue_message(ServerMessage::Created("n1".into()));

        assert_eq!(channel.recv_update().await.unwrap(), ChannelUpdate::Ignored);
    }

    #[tokio::test]
    async fn notices_after_authorization_are_forwarded() {
        let (channel, mock) = channel();
        channel.connect(&token()).await.unwrap();
        mock.queue_message(ServerMessage::Authorized);
        mock.queue_message(ServerMessage::Read("n1".into()));

        channel.recv_update().await.unwrap();
        assert_eq!(
            channel.recv_update().await.unwrap(),
            ChannelUpdate::Notice(Notice::Read("n1".into()))
        );
    }

    #[tokio::test]
    async fn undecodable_frame_is_ignored() {
        let (channel, mock) = channel();
        channel.connect(&token()).await.unwrap();
        mock.queue_frame(b"{\"event\":\"bogus\"}".to_vec());
        mock.queue_frame(b"not json".to_vec());

        assert_eq!(channel.recv_update().await.unwrap(), ChannelUpdate::Ignored);
        assert_eq!(channel.recv_update().await.unwrap(), ChannelUpdate::Ignored);
        assert_eq!(channel.state().await, ChannelState::HandshakePending);
    }

    #[tokio::test]
    async fn legacy_event_names_are_understood() {
        let (channel, mock) = channel();
        channel.connect(&token()).await.unwrap();
        mock.queue_message(ServerMessage::Authorized);
        mock.queue_frame(br#"{"event":"push","data":"n9"}"#.to_vec());

        channel.recv_update().await.unwrap();
        assert_eq!(
            channel.recv_update().await.unwrap(),
            ChannelUpdate::Notice(Notice::Created("n9".into()))
        );
    }

    // ===========================================
    // Closure Tests
    // ===========================================

    #[tokio::test]
    async fn closure_requires_fresh_handshake() {
        let (channel, mock) = channel();
        channel.connect(&token()).await.unwrap();
        mock.queue_message(ServerMessage::Authorized);
        channel.recv_update().await.unwrap();

        // Empty queue: the mock reports the connection as closed
        assert_eq!(channel.recv_update().await.unwrap(), ChannelUpdate::Closed);
        assert_eq!(channel.state().await, ChannelState::Disconnected);
        assert!(!mock.is_connected());

        channel.connect(&token()).await.unwrap();
        mock.queue_message(ServerMessage::Read("n1".into()));
        assert_eq!(channel.recv_update().await.unwrap(), ChannelUpdate::Ignored);
        assert_eq!(mock.sent_frames().len(), 2);
    }

    #[tokio::test]
    async fn receive_failure_is_an_error() {
        let (channel, mock) = channel();
        channel.connect(&token()).await.unwrap();
        mock.fail_next_recv("reset by peer");

        let result = channel.recv_update().await;

        assert!(matches!(
            result,
            Err(ClientError::Transport(TransportError::ReceiveFailed(_)))
        ));
        assert_eq!(channel.state().await, ChannelState::Disconnected);
    }

    #[tokio::test]
    async fn disconnect_closes_transport() {
        let (channel, mock) = channel();
        channel.connect(&token()).await.unwrap();

        channel.disconnect().await.unwrap();

        assert_eq!(channel.state().await, ChannelState::Disconnected);
        assert!(!mock.is_connected());
        assert_eq!(channel.recv_update().await.unwrap(), ChannelUpdate::Closed);
    }

    #[tokio::test]
    async fn disconnect_when_idle_is_noop() {
        let (channel, _mock) = channel();
        channel.disconnect().await.unwrap();
        channel.reject().await.unwrap();
        assert_eq!(channel.state().await, ChannelState::Disconnected);
    }
}
