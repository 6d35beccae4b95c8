//! Message proxy HTTP API
//!
//! Request/response plumbing, the reqwest transport, and tolerant parsing of
//! the proxy's list responses.

pub mod client;
pub mod request;
pub mod shape;
pub mod types;

pub use client::{ApiClient, Transport};
pub use request::{ApiRequest, ApiResponse, PathTemplate};
pub use shape::{extract, Collection};
pub use types::{Message, MemberSummary, Room, RoomBreakdown};
