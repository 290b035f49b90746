//! # Indexd-Aware Pager
//!
//! Document-backed rows whose indexd record was deleted must never be
//! returned, and must not eat into the caller's page size either. This pager
//! drives [`fetch_page`] in rounds, discards deleted rows, and tops the page up
//! from further along the ordering until it is full or the source runs dry.

use metrics::counter;
use sea_orm::{ConnectionTrait, Select};

use super::cursor::Cursor;
use super::keyset::{KeysetEntity, Page, fetch_page};
use crate::error::RepositoryError;
use crate::indexd::DocumentIndex;

/// Per-round fetch size stops doubling after this many rounds.
const MAX_GROWTH_SHIFT: u32 = 6;

/// A keyset entity whose rows reference a document in the index.
pub trait DocumentBacked: KeysetEntity {
    fn document_id(model: &Self::Model) -> &str;
}

/// Pages through `select` skipping rows whose document is deleted.
///
/// Each round fetches past the last examined row, so progress is monotone and
/// the loop ends when the page is full or no rows remain. The fetch size
/// doubles every round (up to 64 times the shortfall) to get through long
/// runs of deleted rows quickly. Liveness is resolved only for as many rows
/// as the page still needs, so rows fetched beyond a full page are never
/// looked up.
///
/// After `max_rounds` rounds the page is returned as it stands, possibly
/// short or empty, with `has_next` set and `next` past the last examined row.
/// A client following `next` always makes progress through a run of deleted
/// rows. A failed liveness lookup aborts the whole page.
pub async fn fetch_live_page<E, C>(
    conn: &C,
    index: &dyn DocumentIndex,
    select: Select<E>,
    cursor: &Cursor,
    limit: u64,
    max_rounds: u32,
) -> Result<Page<E::Model>, RepositoryError>
where
    E: DocumentBacked,
    E::Model: Send + Sync,
    C: ConnectionTrait,
{
    if limit == 0 {
        return Ok(fetch_page(conn, select, cursor, 0).await?);
    }

    let mut kept: Vec<E::Model> = Vec::new();
    let mut position = *cursor;
    let mut examined_any = false;
    let mut total = 0;
    let mut has_next = false;
    let mut rounds: u32 = 0;
    let mut discarded: u64 = 0;

    while (kept.len() as u64) < limit {
        if rounds >= max_rounds.max(1) {
            counter!("pagination_backfill_truncated_total").increment(1);
            tracing::warn!(
                rounds,
                kept = kept.len(),
                discarded,
                "Returning a short page after reaching the backfill round limit"
            );
            has_next = true;
            break;
        }

        let shortfall = limit - kept.len() as u64;
        let growth = 1u64 << rounds.min(MAX_GROWTH_SHIFT);
        rounds += 1;

        let batch = fetch_page(
            conn,
            select.clone(),
            &position,
            shortfall.saturating_mul(growth),
        )
        .await?;
        if rounds == 1 {
            total = batch.total;
        }
        has_next = batch.has_next;

        let mut pending = batch.items.into_iter();
        while (kept.len() as u64) < limit {
            let wanted = usize::try_from(limit - kept.len() as u64).unwrap_or(usize::MAX);
            let chunk: Vec<E::Model> = pending.by_ref().take(wanted).collect();
            if chunk.is_empty() {
                break;
            }

            let deleted = {
                let dids: Vec<&str> = chunk.iter().map(E::document_id).collect();
                index.deleted_among(&dids).await?
            };

            for row in chunk {
                examined_any = true;
                position = E::cursor_of(&row);
                if deleted.contains(E::document_id(&row)) {
                    discarded += 1;
                } else {
                    kept.push(row);
                }
            }
        }

        // Rows fetched past a full page were never examined.
        if pending.next().is_some() {
            has_next = true;
        }

        if !has_next {
            break;
        }
    }

    counter!("pagination_backfill_rounds_total").increment(u64::from(rounds));
    if discarded > 0 {
        counter!("pagination_backfill_discarded_total").increment(discarded);
        tracing::debug!(
            discarded,
            rounds,
            "Skipped rows whose indexd document was deleted"
        );
    }

    Ok(Page {
        items: kept,
        total,
        limit,
        cursor: *cursor,
        next: if examined_any {
            position
        } else {
            Cursor::origin()
        },
        has_next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexd::stub::StubDocumentIndex;
    use crate::models::genomic_file::{self, Entity as GenomicFile};
    use crate::test_support::setup_db;
    use chrono::{Duration, TimeZone, Utc};
    use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
    use uuid::Uuid;

    /// Inserts files `did-1..=did-n` in ascending `(created_at, uuid)` order.
    async fn seed_files(db: &DatabaseConnection, n: u32) -> Vec<genomic_file::Model> {
        let base = Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap();
        let mut files = Vec::new();
        for i in 1..=n {
            let created_at = (base + Duration::seconds(i64::from(i))).fixed_offset();
            let file = genomic_file::ActiveModel {
                kf_id: Set(crate::kf_id::generate(crate::kf_id::GENOMIC_FILE_PREFIX)),
                uuid: Set(Uuid::new_v4()),
                latest_did: Set(format!("did-{i}")),
                study_id: Set(None),
                file_name: Set(None),
                data_type: Set(None),
                created_at: Set(created_at),
                modified_at: Set(created_at),
            }
            .insert(db)
            .await
            .unwrap();
            files.push(file);
        }
        files
    }

    fn dids(page: &Page<genomic_file::Model>) -> Vec<&str> {
        page.items.iter().map(|f| f.latest_did.as_str()).collect()
    }

    #[tokio::test]
    async fn test_deleted_rows_are_backfilled() {
        let db = setup_db().await;
        seed_files(&db, 10).await;
        let index = StubDocumentIndex::with_deleted(["did-3", "did-4", "did-5"]);

        let page = fetch_live_page(&db, &index, GenomicFile::find(), &Cursor::origin(), 5, 10)
            .await
            .unwrap();

        assert_eq!(dids(&page), vec!["did-1", "did-2", "did-6", "did-7", "did-8"]);
        assert!(page.has_next);
        assert_eq!(page.total, 10);
        assert_eq!(page.next, GenomicFile::cursor_of(&page.items[4]));

        let rest = fetch_live_page(&db, &index, GenomicFile::find(), &page.next, 5, 10)
            .await
            .unwrap();
        assert_eq!(dids(&rest), vec!["did-9", "did-10"]);
        assert!(!rest.has_next);
    }

    #[tokio::test]
    async fn test_walk_returns_every_live_row_once() {
        let db = setup_db().await;
        seed_files(&db, 12).await;
        let index = StubDocumentIndex::with_deleted(["did-1", "did-5", "did-6", "did-7", "did-12"]);

        let mut walked = Vec::new();
        let mut cursor = Cursor::origin();
        loop {
            let page = fetch_live_page(&db, &index, GenomicFile::find(), &cursor, 2, 10)
                .await
                .unwrap();
            assert!(page.items.len() <= 2);
            walked.extend(page.items.iter().map(|f| f.latest_did.clone()));
            if !page.has_next {
                break;
            }
            cursor = page.next;
        }

        assert_eq!(
            walked,
            vec!["did-2", "did-3", "did-4", "did-8", "did-9", "did-10", "did-11"]
        );
    }

    #[tokio::test]
    async fn test_all_deleted_collection_terminates_empty() {
        let db = setup_db().await;
        seed_files(&db, 25).await;
        let index = StubDocumentIndex::with_deleted((1..=25).map(|i| format!("did-{i}")));

        let page = fetch_live_page(&db, &index, GenomicFile::find(), &Cursor::origin(), 5, 10)
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert!(!page.has_next);
        assert_eq!(index.lookups(), 25);
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let db = setup_db().await;
        let index = StubDocumentIndex::default();

        let page = fetch_live_page(&db, &index, GenomicFile::find(), &Cursor::origin(), 5, 10)
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert!(!page.has_next);
        assert_eq!(page.next, Cursor::origin());
        assert_eq!(index.lookups(), 0);
    }

    #[tokio::test]
    async fn test_round_limit_returns_resumable_page() {
        let db = setup_db().await;
        let files = seed_files(&db, 50).await;
        let index = StubDocumentIndex::with_deleted((1..=50).map(|i| format!("did-{i}")));

        // Rounds fetch 1 then 2 rows; 47 deleted rows remain unexamined.
        let page = fetch_live_page(&db, &index, GenomicFile::find(), &Cursor::origin(), 1, 2)
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert!(page.has_next);
        assert_eq!(page.next, GenomicFile::cursor_of(&files[2]));
        assert_eq!(index.lookups(), 3);
    }

    #[tokio::test]
    async fn test_deleted_run_longer_than_round_limit_can_be_walked() {
        let db = setup_db().await;
        seed_files(&db, 62).await;
        let index = StubDocumentIndex::with_deleted((1..=60).map(|i| format!("did-{i}")));

        let mut walked = Vec::new();
        let mut cursor = Cursor::origin();
        let mut requests = 0;
        loop {
            requests += 1;
            assert!(requests <= 62, "walk did not make progress");
            let page = fetch_live_page(&db, &index, GenomicFile::find(), &cursor, 1, 3)
                .await
                .unwrap();
            walked.extend(page.items.iter().map(|f| f.latest_did.clone()));
            if !page.has_next {
                break;
            }
            cursor = page.next;
        }

        assert_eq!(walked, vec!["did-61", "did-62"]);
        assert_eq!(index.lookups(), 62);
    }

    #[tokio::test]
    async fn test_rows_past_a_full_page_are_not_looked_up() {
        let db = setup_db().await;
        let files = seed_files(&db, 20).await;
        let index = StubDocumentIndex::with_deleted(["did-1", "did-2", "did-3"]);

        // Round one fetches 4 rows and keeps 1; round two fetches 6 rows but
        // only the 3 still needed are looked up.
        let page = fetch_live_page(&db, &index, GenomicFile::find(), &Cursor::origin(), 4, 10)
            .await
            .unwrap();

        assert_eq!(dids(&page), vec!["did-4", "did-5", "did-6", "did-7"]);
        assert!(page.has_next);
        assert_eq!(page.next, GenomicFile::cursor_of(&files[6]));
        assert_eq!(index.lookups(), 7);
    }

    #[tokio::test]
    async fn test_index_failure_aborts_page() {
        let db = setup_db().await;
        seed_files(&db, 3).await;
        let index = StubDocumentIndex::unavailable();

        let result =
            fetch_live_page(&db, &index, GenomicFile::find(), &Cursor::origin(), 5, 10).await;

        assert!(matches!(result, Err(RepositoryError::Indexd(_))));
    }

    #[tokio::test]
    async fn test_no_deletions_needs_one_round() {
        let db = setup_db().await;
        seed_files(&db, 8).await;
        let index = StubDocumentIndex::default();

        let page = fetch_live_page(&db, &index, GenomicFile::find(), &Cursor::origin(), 5, 1)
            .await
            .unwrap();

        assert_eq!(page.items.len(), 5);
        assert!(page.has_next);
        assert_eq!(index.lookups(), 5);
    }
}
