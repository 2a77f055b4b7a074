//! Core types and schemas for the mini-app host-integration protocol.
//!
//! This crate provides the protocol primitives: wire shapes and their
//! validators, the capability set, and the action outcome model. It does no
//! I/O; transports, storage and dispatch live in the other `miniapp-*`
//! crates.

pub mod action;
pub mod actions;
mod capability;
pub mod embed;
mod event;
mod identity;
pub mod manifest;
pub mod notification;
mod registry;
pub mod schema;
pub mod webhook;

pub use action::{Action, ActionErrorKind, ActionFailure, ActionResult};
pub use capability::{CapabilityId, CapabilityRegistry, ProtocolVersion, UnknownCapability};
pub use event::{EventKind, ServerEvent};
pub use identity::{Fid, FidParseError};
pub use notification::NotificationDetails;
pub use registry::{ShapeId, TypedValue, validate_shape};
pub use schema::{ErrorKind, Schema, ValidationError, validate};
