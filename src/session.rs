//! Chain client sessions
//!
//! A [`Session`] owns one lazily-connected client. It is created by the
//! caller and passed to the components that need it, so there is no
//! process-wide connection state. The first [`Session::get`] connects;
//! [`Session::disconnect`] drops the client and the next `get` reconnects.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::ClientError;

/// Knows how to open a client for one endpoint
#[async_trait]
pub trait Connector: Send + Sync {
    type Client: Send + Sync;

    /// Endpoint shown in logs
    fn endpoint(&self) -> &str;

    async fn connect(&self) -> eyre::Result<Self::Client>;
}

/// Lazily-initialised client with explicit connect/disconnect
pub struct Session<C: Connector> {
    connector: C,
    client: Mutex<Option<Arc<C::Client>>>,
}

impl<C: Connector> Session<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            client: Mutex::new(None),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Connected client, connecting on first use.
    ///
    /// Concurrent callers wait on the same connection attempt.
    pub async fn get(&self) -> Result<Arc<C::Client>, ClientError> {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }

        let client = self.open().await?;
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Force a fresh connection, replacing any existing client
    pub async fn connect(&self) -> Result<Arc<C::Client>, ClientError> {
        let mut slot = self.client.lock().await;
        let client = self.open().await?;
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Drop the client. In-flight users keep their `Arc` until done.
    pub async fn disconnect(&self) {
        if self.client.lock().await.take().is_some() {
            info!(endpoint = %self.connector.endpoint(), "Session disconnected");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.client.lock().await.is_some()
    }

    async fn open(&self) -> Result<Arc<C::Client>, ClientError> {
        debug!(endpoint = %self.connector.endpoint(), "Connecting");
        let client = self.connector.connect().await.map_err(|e| {
            ClientError::NotConnected(format!("{}: {:#}", self.connector.endpoint(), e))
        })?;
        info!(endpoint = %self.connector.endpoint(), "Session connected");
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingConnector {
        connects: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Connector for CountingConnector {
        type Client = usize;

        fn endpoint(&self) -> &str {
            "mock://node"
        }

        async fn connect(&self) -> eyre::Result<usize> {
            if self.fail {
                return Err(eyre::eyre!("connection refused"));
            }
            Ok(self.connects.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    fn session(fail: bool) -> (Session<CountingConnector>, Arc<AtomicUsize>) {
        let connects = Arc::new(AtomicUsize::new(0));
        let session = Session::new(CountingConnector {
            connects: Arc::clone(&connects),
            fail,
        });
        (session, connects)
    }

    #[tokio::test]
    async fn test_connects_lazily_once() {
        let (session, connects) = session(false);
        assert!(!session.is_connected().await);
        assert_eq!(connects.load(Ordering::SeqCst), 0);

        let first = session.get().await.unwrap();
        let second = session.get().await.unwrap();
        assert_eq!(*first, 1);
        assert_eq!(*second, 1);
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert!(session.is_connected().await);
    }

    #[tokio::test]
    async fn test_disconnect_then_reconnect() {
        let (session, connects) = session(false);
        session.get().await.unwrap();
        session.disconnect().await;
        assert!(!session.is_connected().await);

        let client = session.get().await.unwrap();
        assert_eq!(*client, 2);
        assert_eq!(connects.load(Ordering::SeqCst), 2);

        let forced = session.connect().await.unwrap();
        assert_eq!(*forced, 3);
    }

    #[tokio::test]
    async fn test_connect_failure_is_not_cached() {
        let (session, _) = session(true);
        let err = session.get().await.unwrap_err();
        assert!(matches!(err, ClientError::NotConnected(_)));
        assert!(err.to_string().contains("connection refused"));
        assert!(!session.is_connected().await);
    }
}
