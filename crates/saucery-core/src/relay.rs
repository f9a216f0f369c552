//! Webhook relay: republish content through a temporary endpoint styled as
//! the original author, then tear the endpoint (and the source message)
//! down.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::payload::ReplyPayload;
use crate::Result;

/// Platform operations behind the relay.
#[async_trait]
pub trait RelayEndpoint: Send + Sync {
    /// Publish one payload through the impersonation endpoint.
    async fn execute(&self, payload: ReplyPayload) -> Result<()>;
    /// Delete the source message the relay was opened for.
    async fn delete_source(&self) -> Result<()>;
    /// Delete the impersonation endpoint.
    async fn delete_endpoint(&self) -> Result<()>;
}

/// One relay per source message.
///
/// Teardown deletes the source message and then, in all cases, the
/// endpoint. Each deletion is guarded by its own flag, so repeated
/// `destroy` calls are no-ops and a failed message deletion never blocks
/// endpoint deletion.
pub struct WebhookRelay<E> {
    endpoint: E,
    source_deleted: AtomicBool,
    endpoint_deleted: AtomicBool,
}

impl<E: RelayEndpoint> WebhookRelay<E> {
    pub fn new(endpoint: E) -> Self {
        Self {
            endpoint,
            source_deleted: AtomicBool::new(false),
            endpoint_deleted: AtomicBool::new(false),
        }
    }

    /// Publish one payload; no side effects on the source message.
    pub async fn send(&self, payload: ReplyPayload) -> Result<()> {
        self.endpoint.execute(payload).await
    }

    /// Publish one payload, then remove the source message and endpoint.
    pub async fn send_once(&self, payload: ReplyPayload) -> Result<()> {
        self.endpoint.execute(payload).await?;
        self.destroy().await
    }

    /// Delete the source message (if not already deleted), then in all
    /// cases the endpoint (if not already deleted).
    pub async fn destroy(&self) -> Result<()> {
        let source = if !self.source_deleted.swap(true, Ordering::SeqCst) {
            self.endpoint.delete_source().await
        } else {
            Ok(())
        };

        let endpoint = if !self.endpoint_deleted.swap(true, Ordering::SeqCst) {
            self.endpoint.delete_endpoint().await
        } else {
            Ok(())
        };

        source.and(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct MockEndpoint {
        executes: AtomicUsize,
        source_deletes: AtomicUsize,
        endpoint_deletes: AtomicUsize,
        fail_source: bool,
    }

    #[async_trait]
    impl RelayEndpoint for MockEndpoint {
        async fn execute(&self, _payload: ReplyPayload) -> Result<()> {
            self.executes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete_source(&self) -> Result<()> {
            self.source_deletes.fetch_add(1, Ordering::SeqCst);
            if self.fail_source {
                return Err(Error::Discord("missing permission".to_string()));
            }
            Ok(())
        }

        async fn delete_endpoint(&self) -> Result<()> {
            self.endpoint_deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn double_destroy_deletes_each_exactly_once() {
        let relay = WebhookRelay::new(MockEndpoint::default());

        relay.destroy().await.unwrap();
        relay.destroy().await.unwrap();

        assert_eq!(relay.endpoint.source_deletes.load(Ordering::SeqCst), 1);
        assert_eq!(relay.endpoint.endpoint_deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn source_failure_still_deletes_endpoint() {
        let relay = WebhookRelay::new(MockEndpoint {
            fail_source: true,
            ..MockEndpoint::default()
        });

        assert!(relay.destroy().await.is_err());
        assert_eq!(relay.endpoint.endpoint_deletes.load(Ordering::SeqCst), 1);

        // The failed source delete is not retried.
        let _ = relay.destroy().await;
        assert_eq!(relay.endpoint.source_deletes.load(Ordering::SeqCst), 1);
        assert_eq!(relay.endpoint.endpoint_deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn send_once_publishes_then_tears_down() {
        let relay = WebhookRelay::new(MockEndpoint::default());

        relay.send_once(ReplyPayload::text("hi")).await.unwrap();

        assert_eq!(relay.endpoint.executes.load(Ordering::SeqCst), 1);
        assert_eq!(relay.endpoint.source_deletes.load(Ordering::SeqCst), 1);
        assert_eq!(relay.endpoint.endpoint_deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn send_has_no_teardown_side_effects() {
        let relay = WebhookRelay::new(MockEndpoint::default());

        relay.send(ReplyPayload::text("hi")).await.unwrap();

        assert_eq!(relay.endpoint.source_deletes.load(Ordering::SeqCst), 0);
        assert_eq!(relay.endpoint.endpoint_deletes.load(Ordering::SeqCst), 0);
    }
}
