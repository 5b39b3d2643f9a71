//! In-process channel primitive connecting two contexts.
//!
//! A channel is a pair of bounded tokio mpsc queues, one per direction.
//! Messages are opaque byte frames delivered in send order.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::protocol::{Envelope, ProtocolError};

/// Default number of frames buffered per direction.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Channel closed")]
    Closed,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// One side of a duplex channel.
#[derive(Debug)]
pub struct ChannelEnd {
    outgoing: mpsc::Sender<Vec<u8>>,
    incoming: mpsc::Receiver<Vec<u8>>,
}

/// Create two connected channel ends.
pub fn channel_pair(capacity: usize) -> (ChannelEnd, ChannelEnd) {
    let capacity = capacity.max(1);
    let (a_tx, b_rx) = mpsc::channel(capacity);
    let (b_tx, a_rx) = mpsc::channel(capacity);
    (
        ChannelEnd {
            outgoing: a_tx,
            incoming: a_rx,
        },
        ChannelEnd {
            outgoing: b_tx,
            incoming: b_rx,
        },
    )
}

impl ChannelEnd {
    pub fn into_parts(self) -> (mpsc::Sender<Vec<u8>>, mpsc::Receiver<Vec<u8>>) {
        (self.outgoing, self.incoming)
    }

    pub async fn send(&self, frame: Vec<u8>) -> Result<(), ChannelError> {
        self.outgoing.send(frame).await.map_err(|_| ChannelError::Closed)
    }

    /// Next frame, or `None` once the other side is gone.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.incoming.recv().await
    }

    pub async fn send_envelope(&self, envelope: &Envelope) -> Result<(), ChannelError> {
        self.send(envelope.encode()?).await
    }

    pub async fn recv_envelope(&mut self) -> Option<Result<Envelope, ChannelError>> {
        let frame = self.recv().await?;
        Some(Envelope::decode(&frame).map_err(ChannelError::from))
    }
}
