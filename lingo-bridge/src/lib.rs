//! # lingo-bridge — Typed RPC between the document and interface contexts
//!
//! The two contexts share nothing but a duplex byte channel. This crate
//! layers named, typed request/response endpoints on top of it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐                         ┌──────────────┐
//! │ interface    │   Envelope (bincode)    │ document     │
//! │ Bridge       │ ◄─────────────────────► │ Bridge       │
//! │ call(EP, x)  │  "EP_IN"  / "EP_OUT"    │ implement(EP)│
//! └──────┬───────┘                         └──────┬───────┘
//!        │                                        │
//!        ▼                                        ▼
//! ┌──────────────┐                         ┌──────────────┐
//! │ pending      │                         │ handlers     │
//! │ id → oneshot │                         │ name → fn    │
//! └──────────────┘                         └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] — envelope wire format and JSON payload codec
//! - [`channel`] — in-process duplex channel primitive
//! - [`endpoint`] — typed endpoint descriptors
//! - [`bridge`] — correlation, timeouts, cancellation, handler dispatch

pub mod protocol;
pub mod channel;
pub mod endpoint;
pub mod bridge;

// Re-exports for convenience
pub use protocol::{Envelope, MessageKind, ProtocolError};
pub use channel::{channel_pair, ChannelEnd, ChannelError, DEFAULT_CAPACITY};
pub use endpoint::Endpoint;
pub use bridge::{Bridge, BridgeConfig, BridgeError, BridgeStats, BUSY_MESSAGE};
