//! Session management.

mod account;
mod session;

pub use account::{ServerInfo, UserInfo};
pub use session::Session;
pub(crate) use session::{create_flags, open_flags};
