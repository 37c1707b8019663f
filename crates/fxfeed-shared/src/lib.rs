//! # Fxfeed Shared
//!
//! Wire types shared by the HTTP backend and its clients: the response
//! envelopes and the request/response bodies that are not domain entities.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse, FieldErrorBody};
