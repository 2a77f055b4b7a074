//! Invoking host actions from a mini-app.
//!
//! A [`MiniAppClient`] negotiates capabilities with the host and invokes
//! typed [`Action`](miniapp_core::Action)s over a [`HostBridge`]. The host
//! side is a [`HostEndpoint`] serving a [`HostActions`] implementation. The
//! two meet over any bridge; [`ChannelBridge`] carries JSON text frames over
//! in-process channels.

mod bridge;
mod client;
mod host;

pub use bridge::{
    BridgeError, ChannelBridge, HostBridge, HostConnection, LIST_CAPABILITIES, RequestFrame,
    ResponseFrame,
};
pub use client::{InvocationError, InvokeError, MiniAppClient};
pub use host::{HostActions, HostEndpoint};
