//! Cursor-based pagination over the entity store.
//!
//! - [`cursor`] decodes query parameters into a [`PageRequest`].
//! - [`keyset`] fetches pages in `(created_at, uuid)` order.
//! - [`live`] adds indexd-aware backfill for document-backed entities.

pub mod cursor;
pub mod keyset;
pub mod live;

pub use cursor::{Cursor, PageRequest, PaginationQuery};
pub use keyset::{KeysetEntity, Page, after_cursor, fetch_page};
pub use live::{DocumentBacked, fetch_live_page};
