//! View models shared by the back-office screens.

pub mod notice;
pub mod session;

pub use notice::{Notice, NoticeKind};
pub use session::keys as session_keys;
