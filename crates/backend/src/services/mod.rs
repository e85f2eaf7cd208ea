//! Business logic shared by the HTTP handlers.
//!
//! Services take the store traits directly so they can be exercised against
//! [`crate::repository::MemoryStore`] without a running server.

pub mod entries;
pub mod users;

pub use entries::{find_entry, find_entry_dates, month_calendar, save_entry, EntryError};
pub use users::find_or_create_user;
