//! Event dispatch for host lifecycle events.
//!
//! The host POSTs signed [`WebhookEnvelope`]s. Each decodes to a user
//! identity and a raw [`ServerEvent`](miniapp_core::ServerEvent), which
//! [`EventDispatcher`] validates and applies to the notification store.
//! [`DispatchQueue`] runs dispatchers concurrently across identities while
//! keeping each identity's events in delivery order.

mod dispatcher;
mod envelope;
mod queue;

pub use dispatcher::{DispatchError, DispatchOutcome, EventDispatcher, Transition};
pub use envelope::{DecodedEnvelope, WebhookEnvelope};
pub use queue::DispatchQueue;
