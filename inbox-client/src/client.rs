//! InboxClient - the main interface for inbox-sync.
//!
//! This module provides [`InboxClient`], the synchronization core that
//! applications use to read and mutate the inbox and to receive live
//! changes.
//!
//! # Architecture
//!
//! InboxClient combines three collaborators and fans every change out to
//! the registered [`Subscriber`]s exactly once:
//!
//! ```text
//! Application ──► InboxClient ──► ApiExecutor ──► REST API
//!                   │    ▲
//!                   │    └── ChannelHandshake ◄── Transport ◄── push channel
//!                   ▼
//!              SessionManager ──► CredentialStore
//! ```
//!
//! # Example
//!
//! ```ignore
//! use inbox_sync_client::{ChannelSubscriber, InboxClient, InboxConfig, MemoryCredentialStore};
//!
//! let config = InboxConfig::new("https://inbox.example.com/api", "user-1842");
//! let client = InboxClient::with_http(config, transport, MemoryCredentialStore::new())?;
//!
//! client.authorize(|| async { prompt_for_token().await }).await?;
//! let (subscriber, mut changes) = ChannelSubscriber::new();
//! client.subscribe(Arc::new(subscriber)).await;
//!
//! let inbox = client.list_notifications().await?;
//! client.connect().await?;
//! client.run().await?;
//! ```

use inbox_core::{ChannelState, EchoFilter, LocalChange};
use inbox_types::{
    ChangeEvent, Notice, Notification, NotificationEnvelope, NotificationId, NotificationList,
    NOTIFICATIONS_PATH, NOTIFICATION_PATH,
};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::api::{ApiExecutor, ApiRequest, ApiResponse, Method};
use crate::channel::{ChannelHandshake, ChannelUpdate};
use crate::config::InboxConfig;
use crate::credentials::CredentialStore;
use crate::error::{AcquireError, ClientError};
use crate::session::SessionManager;
use crate::subscriber::{Subscriber, SubscriberId, SubscriberRegistry};
use crate::transport::Transport;

/// Result of one [`InboxClient::poll`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The handshake completed.
    Authorized,
    /// The handshake was rejected; credentials were invalidated.
    Denied,
    /// A change was delivered to subscribers.
    Dispatched,
    /// The change was the echo of a local mutation and was not delivered again.
    Suppressed,
    /// Nothing to deliver.
    Ignored,
    /// The push channel is closed.
    Closed,
}

/// The inbox synchronization core.
pub struct InboxClient<A: ApiExecutor, T: Transport, S: CredentialStore> {
    config: InboxConfig,
    api: A,
    session: SessionManager<S>,
    channel: ChannelHandshake<T>,
    /// Held for the whole fan-out of one event.
    subscribers: Mutex<SubscriberRegistry>,
    echoes: Mutex<EchoFilter>,
    /// Bumped by `logout` under the fan-out lock.
    generation: AtomicU64,
}

impl<A: ApiExecutor, T: Transport, S: CredentialStore> InboxClient<A, T, S> {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the configuration is invalid.
    pub fn new(config: InboxConfig, api: A, transport: T, store: S) -> Result<Self, ClientError> {
        config.validate()?;
        let scope = config.scope_key()?;
        let channel = ChannelHandshake::new(transport, config.channel_address());
        let echoes = EchoFilter::new(config.echo_capacity);

        Ok(Self {
            api,
            session: SessionManager::new(scope, store),
            channel,
            subscribers: Mutex::new(SubscriberRegistry::new()),
            echoes: Mutex::new(echoes),
            generation: AtomicU64::new(0),
            config,
        })
    }

    // ===========================================
    // Session
    // ===========================================

    /// Make sure a token is available, calling `acquire` only if none is cached.
    pub async fn authorize<F, Fut, E>(&self, acquire: F) -> Result<(), ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: Into<AcquireError>,
    {
        self.session.authorize(acquire).await.map(|_| ())
    }

    /// Start the push channel handshake with the current token.
    ///
    /// Does nothing if a handshake is already pending or complete.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let token = self
            .session
            .token()
            .await
            .ok_or(ClientError::NotAuthorized)?;
        self.channel.connect(&token).await
    }

    /// Close the channel and forget the token. Idempotent.
    ///
    /// No change is delivered to subscribers after this returns.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let closed = {
            let _fanout = self.subscribers.lock().await;
            self.generation.fetch_add(1, Ordering::SeqCst);
            self.channel.disconnect().await
        };
        self.session.logout().await?;
        self.echoes.lock().await.clear();
        tracing::info!(scope = %self.session.scope(), "logged out");
        closed
    }

    /// Current push channel state.
    pub async fn state(&self) -> ChannelState {
        self.channel.state().await
    }

    // ===========================================
    // Subscribers
    // ===========================================

    /// Register a subscriber.
    pub async fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        self.subscribers.lock().await.subscribe(subscriber)
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub async fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.subscribers.lock().await.unsubscribe(id)
    }

    // ===========================================
    // REST operations
    // ===========================================

    /// Fetch the full inbox. Emits nothing.
    pub async fn list_notifications(&self) -> Result<Vec<Notification>, ClientError> {
        let response = self
            .send_authorized(ApiRequest::new(Method::Get, NOTIFICATIONS_PATH))
            .await?;
        let list: NotificationList = decode(&response)?;
        tracing::debug!(count = list.notifications.len(), "inbox listed");
        Ok(list.notifications)
    }

    /// Fetch a single notification.
    pub async fn fetch_notification(
        &self,
        id: &NotificationId,
    ) -> Result<Notification, ClientError> {
        let request = ApiRequest::new(Method::Get, NOTIFICATION_PATH).with_id(id);
        let response = self.send_authorized(request).await?;
        let envelope: NotificationEnvelope = decode(&response)?;
        Ok(envelope.notification)
    }

    /// Mark a notification read and tell subscribers.
    ///
    /// Every successful call dispatches, including repeats.
    pub async fn mark_read(&self, id: &NotificationId) -> Result<(), ClientError> {
        let request = ApiRequest::new(Method::Patch, NOTIFICATION_PATH).with_id(id);
        self.mutate(request, LocalChange::Read, ChangeEvent::Read(id.clone()))
            .await
    }

    /// Delete a notification and tell subscribers.
    pub async fn delete_notification(&self, id: &NotificationId) -> Result<(), ClientError> {
        let request = ApiRequest::new(Method::Delete, NOTIFICATION_PATH).with_id(id);
        self.mutate(request, LocalChange::Deleted, ChangeEvent::Deleted(id.clone()))
            .await
    }

    // ===========================================
    // Push channel
    // ===========================================

    /// Process one push channel frame.
    pub async fn poll(&self) -> Result<PollOutcome, ClientError> {
        let update = self
            .channel
            .recv_update_with(|| self.session.invalidate())
            .await?;
        match update {
            ChannelUpdate::Authorized => Ok(PollOutcome::Authorized),
            ChannelUpdate::Denied => {
                self.echoes.lock().await.clear();
                Ok(PollOutcome::Denied)
            }
            ChannelUpdate::Notice(notice) => self.deliver(notice).await,
            ChannelUpdate::Ignored => Ok(PollOutcome::Ignored),
            ChannelUpdate::Closed => Ok(PollOutcome::Closed),
        }
    }

    /// Process frames until the channel closes.
    ///
    /// Returns `Ok(())` on closure and [`ClientError::AuthRejected`] on
    /// denial. A notification that vanished before it could be resolved
    /// is skipped. Any other error ends the loop.
    pub async fn run(&self) -> Result<(), ClientError> {
        loop {
            match self.poll().await {
                Ok(PollOutcome::Closed) => return Ok(()),
                Ok(PollOutcome::Denied) => return Err(ClientError::AuthRejected),
                Ok(_) => {}
                Err(e) if e.is_not_found() => {
                    tracing::warn!(error = %e, "skipping unresolvable notification");
                }
                Err(e) => return Err(e),
            }
        }
    }

    // ===========================================
    // Accessors
    // ===========================================

    /// The configuration.
    pub fn config(&self) -> &InboxConfig {
        &self.config
    }

    /// The REST executor.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// The session manager.
    pub fn session(&self) -> &SessionManager<S> {
        &self.session
    }

    /// The push channel.
    pub fn channel(&self) -> &ChannelHandshake<T> {
        &self.channel
    }

    /// The push channel transport.
    pub fn transport(&self) -> &T {
        self.channel.transport()
    }

    // ===========================================
    // Internals
    // ===========================================

    async fn mutate(
        &self,
        request: ApiRequest,
        change: LocalChange,
        event: ChangeEvent,
    ) -> Result<(), ClientError> {
        let generation = self.generation.load(Ordering::SeqCst);
        self.send_authorized(request).await?;

        let registry = self.subscribers.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(kind = event.kind(), id = %event.id(), "logged out during request");
            return Ok(());
        }
        // An echo that beats this point is delivered as a remote change
        if self.config.suppress_remote_echo {
            self.echoes.lock().await.record(change, event.id().clone());
        }
        tracing::debug!(
            kind = event.kind(),
            id = %event.id(),
            subscribers = registry.len(),
            "dispatching local change"
        );
        registry.dispatch(&event);
        Ok(())
    }

    async fn deliver(&self, notice: Notice) -> Result<PollOutcome, ClientError> {
        let event = match &notice {
            Notice::Created(id) => ChangeEvent::New(self.fetch_notification(id).await?),
            Notice::Read(id) => ChangeEvent::Read(id.clone()),
            Notice::Deleted(id) => ChangeEvent::Deleted(id.clone()),
        };

        let registry = self.subscribers.lock().await;
        // The channel may have been torn down while the notification was fetched
        if !self.channel.state().await.is_authorized() {
            tracing::debug!(kind = event.kind(), id = %event.id(), "channel no longer authorized");
            return Ok(PollOutcome::Ignored);
        }
        if self.config.suppress_remote_echo && self.echoes.lock().await.is_echo(&notice) {
            tracing::debug!(kind = event.kind(), id = %event.id(), "suppressed echo of local change");
            return Ok(PollOutcome::Suppressed);
        }
        tracing::debug!(kind = event.kind(), id = %event.id(), "dispatching remote change");
        registry.dispatch(&event);
        Ok(PollOutcome::Dispatched)
    }

    async fn send_authorized(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let token = self
            .session
            .token()
            .await
            .ok_or(ClientError::NotAuthorized)?;
        let target = request.id().unwrap_or(request.path.as_str()).to_string();

        let response = self.api.execute(request.authorized(token)).await?;
        match response.status {
            200..=299 => Ok(response),
            401 => {
                tracing::warn!(%target, "token rejected by server");
                self.session.invalidate().await?;
                self.echoes.lock().await.clear();
                self.channel.reject().await?;
                Err(ClientError::AuthRejected)
            }
            404 => Err(ClientError::NotFound(target)),
            status => Err(ClientError::UnexpectedStatus { status }),
        }
    }
}

#[cfg(feature = "http")]
impl<T: Transport, S: CredentialStore> InboxClient<crate::api::ReqwestExecutor, T, S> {
    /// Create a client that talks to the REST API over HTTP.
    pub fn with_http(config: InboxConfig, transport: T, store: S) -> Result<Self, ClientError> {
        let api = crate::api::ReqwestExecutor::new(&config.base_url, config.request_timeout())?;
        Self::new(config, api, transport, store)
    }
}

fn decode<T: DeserializeOwned>(response: &ApiResponse) -> Result<T, ClientError> {
    serde_json::from_slice(&response.body).map_err(|e| ClientError::Serialization(e.to_string()))
}
