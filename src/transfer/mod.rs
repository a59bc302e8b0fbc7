//! Resumable block transfers between local files and remote descriptors.
//!
//! A [`TransferCursor`] moves one block per step from a [`BlockSource`] to a
//! [`BlockSink`]. A [`Transfer`] wraps the cursor and mirrors every step into a
//! [`ProgressMarker`] so an interrupted run can pick up where it stopped.

mod block;
mod cursor;
mod driver;
mod marker;

pub use block::{BlockSink, BlockSource, Endpoint, LocalFile};
pub use cursor::TransferCursor;
pub use driver::Transfer;
pub use marker::{MARKER_SUFFIX, ProgressMarker};
