//! Push notifications to users who enabled them.
//!
//! [`NotificationSender`] reads a user's details from the
//! [`NotificationStore`](miniapp_store::NotificationStore) and POSTs to the
//! host's notification endpoint. It only reads the store: when the host
//! reports a token as invalid, the host follows up with a
//! `notifications_disabled` event, and the dispatcher clears the record.

mod sender;

pub use sender::{Notification, NotificationSender, SendError, SendOutcome};
