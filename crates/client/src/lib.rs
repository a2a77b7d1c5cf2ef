//! Thin client for the helpdesk HTTP API.
//!
//! [`HelpdeskClient`] wraps one call per endpoint and hands back the raw
//! outcome as a [`Fetched`]. [`Session`] layers the user-facing behaviour on
//! top: rendering, notices, the last asked question, and per-action controls
//! that refuse a second trigger while a request is in flight.

pub mod client;
pub mod notice;
pub mod session;

pub use client::{Fetched, HelpdeskClient, Payload};
pub use notice::{Control, ControlGuard, Notice, NOTICE_LIFETIME};
pub use session::{FilesView, Session};
