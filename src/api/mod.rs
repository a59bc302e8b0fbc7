//! pCloud API client and types.

pub mod client;
pub mod error;
#[cfg(test)]
pub(crate) mod fake;
mod params;
mod response;

pub use client::{ApiClient, Connection};
pub use error::ApiErrorCode;
pub use params::Params;
pub use response::ApiResponse;
