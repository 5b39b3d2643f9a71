//! Both contexts in one process, joined by a local channel.

use std::sync::Arc;
use std::time::Duration;

use lingo_bridge::{channel_pair, Bridge, BridgeConfig, DEFAULT_CAPACITY};
use tokio::sync::Mutex;

use crate::document::{register_handlers, ClientStorage, DocumentHost};
use crate::interface::DocumentClient;

/// A running pair of contexts.
pub struct LocalPlugin<H> {
    /// Interface-side handle
    pub client: DocumentClient,
    /// Document-side bridge; the interface may register handlers it calls
    pub document: Bridge,
    pub host: Arc<Mutex<H>>,
}

impl<H> LocalPlugin<H> {
    /// Clone of the host as it stands now.
    pub async fn snapshot(&self) -> H
    where
        H: Clone,
    {
        self.host.lock().await.clone()
    }
}

/// Start both bridges over a fresh channel and register the document
/// handlers. `timeout` bounds every interface call.
pub async fn connect_local<H: DocumentHost>(
    host: H,
    storage: Arc<dyn ClientStorage>,
    timeout: Option<Duration>,
) -> LocalPlugin<H> {
    let (interface_end, document_end) = channel_pair(DEFAULT_CAPACITY);
    let interface = Bridge::start(
        interface_end,
        BridgeConfig {
            default_timeout: timeout,
            ..BridgeConfig::labeled("interface")
        },
    );
    let document = Bridge::start(
        document_end,
        BridgeConfig {
            default_timeout: timeout,
            ..BridgeConfig::labeled("document")
        },
    );

    let host = Arc::new(Mutex::new(host));
    register_handlers(&document, host.clone(), storage).await;

    LocalPlugin {
        client: DocumentClient::new(interface),
        document,
        host,
    }
}
