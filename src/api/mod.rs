//! Fetcher for the Harvard Art Museums object API.
//!
//! Exposes a thin typed client over the paginated `/object` endpoint and
//! a lazy record stream that pages on demand. Failed pages get one
//! immediate retry; a second failure ends the stream with the error while
//! keeping everything already yielded (partial success is deliberate).

pub mod client;
pub mod error;
pub mod types;

pub use client::{ObjectClient, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use types::{ObjectPage, PageInfo, RawColor, RawImage, RawRecord};
