//! # Keyset Pager
//!
//! Bounded, stably ordered page fetches over any entity that exposes a
//! `created_at` timestamp and a `uuid` tie-breaker.

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};
use serde::Serialize;

use super::cursor::Cursor;

/// An entity that can be walked in `(created_at, uuid)` order.
pub trait KeysetEntity: EntityTrait {
    fn created_at_column() -> Self::Column;

    fn uuid_column() -> Self::Column;

    fn cursor_of(model: &Self::Model) -> Cursor;
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Rows matching the filter, regardless of the cursor.
    pub total: u64,
    pub limit: u64,
    /// The cursor this page was fetched with.
    pub cursor: Cursor,
    /// Key of the last row examined; the `cursor` for the following page.
    pub next: Cursor,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            cursor: self.cursor,
            next: self.next,
            has_next: self.has_next,
        }
    }
}

/// Rows strictly after `cursor`: a later `created_at`, or the same
/// `created_at` with a greater `uuid`.
pub fn after_cursor<E: KeysetEntity>(cursor: &Cursor) -> Condition {
    let after = cursor.after_db();
    Condition::any()
        .add(E::created_at_column().gt(after))
        .add(
            Condition::all()
                .add(E::created_at_column().eq(after))
                .add(E::uuid_column().gt(cursor.after_uuid)),
        )
}

/// Fetches up to `limit` rows of `select` that sort after `cursor`.
///
/// `select` carries the caller's filters. One extra row is requested so that
/// `has_next` reflects whether anything remains past this page.
pub async fn fetch_page<E, C>(
    conn: &C,
    select: Select<E>,
    cursor: &Cursor,
    limit: u64,
) -> Result<Page<E::Model>, DbErr>
where
    E: KeysetEntity,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let total = select.clone().count(conn).await?;

    let mut items = select
        .filter(after_cursor::<E>(cursor))
        .order_by_asc(E::created_at_column())
        .order_by_asc(E::uuid_column())
        .limit(limit.saturating_add(1))
        .all(conn)
        .await?;

    let has_next = items.len() as u64 > limit;
    items.truncate(limit as usize);

    let next = items.last().map(E::cursor_of).unwrap_or_default();

    Ok(Page {
        items,
        total,
        limit,
        cursor: *cursor,
        next,
        has_next,
    })
}
