//! IMAP command handlers for the fake server.
//!
//! `login` checks credentials, `select` opens folders (SELECT and
//! EXAMINE), and `session` answers the housekeeping commands
//! (CAPABILITY, NOOP, LOGOUT).

mod login;
mod select;
mod session;

pub use login::handle_login;
pub use select::handle_select;
pub use session::{handle_capability, handle_logout, handle_noop};
