//! # Alias Group Repository
//!
//! Maintains the equivalence classes of participants that are duplicate
//! submissions of the same individual.
//!
//! Invariants held at every commit:
//! - a participant references at most one group, and that group exists;
//! - no group exists without at least one member;
//! - linking is symmetric and transitive: two groups that become connected
//!   are merged into one.
//!
//! Every mutation runs inside a single transaction with the participant rows
//! involved locked for update, so concurrent links touching overlapping
//! groups serialize instead of leaving a participant pointing at a group
//! that a concurrent merge just deleted.

use metrics::counter;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    QueryTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::kf_id;
use crate::models::alias_group::{
    self, ActiveModel as AliasGroupActiveModel, Entity as AliasGroup, Model as AliasGroupModel,
};
use crate::models::participant::{self, Entity as Participant, Model as ParticipantModel};
use crate::pagination::{Page, PageRequest, fetch_page};

pub struct AliasGroupRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> AliasGroupRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, kf_id: &str) -> Result<AliasGroupModel, RepositoryError> {
        AliasGroup::find_by_id(kf_id.to_string())
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("AliasGroup", kf_id))
    }

    pub async fn list(
        &self,
        request: &PageRequest,
    ) -> Result<Page<AliasGroupModel>, RepositoryError> {
        Ok(fetch_page(self.db, AliasGroup::find(), &request.cursor, request.limit).await?)
    }

    /// Members of a group in `(created_at, uuid)` order.
    pub async fn members(&self, kf_id: &str) -> Result<Vec<ParticipantModel>, RepositoryError> {
        let group = self.get(kf_id).await?;
        Ok(members_of(self.db, &group.kf_id).await?)
    }

    /// Every other participant sharing `kf_id`'s group.
    pub async fn aliases_of(&self, kf_id: &str) -> Result<Vec<ParticipantModel>, RepositoryError> {
        let participant = Participant::find_by_id(kf_id.to_string())
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Participant", kf_id))?;

        let Some(group_id) = participant.alias_group_id else {
            return Ok(Vec::new());
        };

        let aliases = Participant::find()
            .filter(participant::Column::AliasGroupId.eq(group_id))
            .filter(participant::Column::KfId.ne(participant.kf_id))
            .order_by_asc(participant::Column::CreatedAt)
            .order_by_asc(participant::Column::Uuid)
            .all(self.db)
            .await?;

        Ok(aliases)
    }

    /// Marks two participants as aliases of each other and returns the group
    /// they end up sharing.
    ///
    /// - neither grouped: a new group is created for both;
    /// - one grouped: the other joins that group;
    /// - both grouped differently: the group with fewer members (`other`'s on
    ///   a tie) is folded into the larger one and deleted;
    /// - already in the same group: nothing changes.
    pub async fn link(
        &self,
        kf_id: &str,
        other_kf_id: &str,
    ) -> Result<AliasGroupModel, RepositoryError> {
        if kf_id == other_kf_id {
            return Err(RepositoryError::validation_error(format!(
                "Participant {} cannot be an alias of itself",
                kf_id
            )));
        }

        let txn = self.db.begin().await?;

        let (this, other) = lock_pair(&txn, kf_id, other_kf_id).await?;
        let (this_group, other_group) = lock_groups(&txn, &this, &other).await?;

        let group = match (this_group, other_group) {
            (None, None) => {
                let group = create_group(&txn).await?;
                assign(&txn, this, &group).await?;
                assign(&txn, other, &group).await?;
                tracing::info!(
                    alias_group = %group.kf_id,
                    participant = kf_id,
                    other = other_kf_id,
                    "Created alias group"
                );
                group
            }
            (Some(group), None) => {
                assign(&txn, other, &group).await?;
                group
            }
            (None, Some(group)) => {
                assign(&txn, this, &group).await?;
                group
            }
            (Some(mine), Some(theirs)) if mine.kf_id == theirs.kf_id => {
                tracing::debug!(
                    alias_group = %mine.kf_id,
                    participant = kf_id,
                    other = other_kf_id,
                    "Participants already share an alias group"
                );
                mine
            }
            (Some(mine), Some(theirs)) => merge(&txn, mine, theirs).await?,
        };

        txn.commit().await?;
        Ok(group)
    }

    /// Takes a participant out of a group, deleting the group if that left it
    /// empty. Returns the group when it survives.
    pub async fn remove_member(
        &self,
        group_kf_id: &str,
        participant_kf_id: &str,
    ) -> Result<Option<AliasGroupModel>, RepositoryError> {
        let txn = self.db.begin().await?;

        // Participant before group, the same order `link` takes its locks in.
        let participant = Participant::find_by_id(participant_kf_id.to_string())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Participant", participant_kf_id))?;

        let group = AliasGroup::find_by_id(group_kf_id.to_string())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::not_found("AliasGroup", group_kf_id))?;

        if participant.alias_group_id.as_deref() != Some(group.kf_id.as_str()) {
            return Err(RepositoryError::validation_error(format!(
                "Participant {} is not a member of alias group {}",
                participant_kf_id, group_kf_id
            )));
        }

        let mut active = participant.into_active_model();
        active.alias_group_id = Set(None);
        active.modified_at = Set(kf_id::now());
        active.update(&txn).await?;

        let remaining = Participant::find()
            .filter(participant::Column::AliasGroupId.eq(group.kf_id.as_str()))
            .count(&txn)
            .await?;

        let survivor = if remaining == 0 {
            AliasGroup::delete_by_id(group.kf_id.clone())
                .exec(&txn)
                .await?;
            counter!("alias_groups_deleted_total").increment(1);
            tracing::info!(alias_group = %group.kf_id, "Deleted emptied alias group");
            None
        } else {
            Some(group)
        };

        txn.commit().await?;
        Ok(survivor)
    }
}

/// Locks the alias groups `participants` belong to, in primary key order.
///
/// Callers must already hold the participant row locks. Any transaction that
/// changes a group's membership takes these locks first, so member counts
/// and the orphan sweep see every concurrent change to the group.
pub async fn lock_groups_of<'p, C, I>(
    conn: &C,
    participants: I,
) -> Result<Vec<AliasGroupModel>, DbErr>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = &'p ParticipantModel>,
{
    let mut ids: Vec<&str> = participants
        .into_iter()
        .filter_map(|p| p.alias_group_id.as_deref())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    AliasGroup::find()
        .filter(alias_group::Column::KfId.is_in(ids))
        .order_by_asc(alias_group::Column::KfId)
        .lock_exclusive()
        .all(conn)
        .await
}

/// Deletes every alias group that no participant references.
///
/// Runs on the caller's connection so that it commits or rolls back together
/// with the delete that emptied the group.
pub async fn delete_orphan_groups<C: ConnectionTrait>(conn: &C) -> Result<u64, DbErr> {
    let result = AliasGroup::delete_many()
        .filter(
            alias_group::Column::KfId.not_in_subquery(
                Participant::find()
                    .select_only()
                    .column(participant::Column::AliasGroupId)
                    .filter(participant::Column::AliasGroupId.is_not_null())
                    .into_query(),
            ),
        )
        .exec(conn)
        .await?;

    if result.rows_affected > 0 {
        counter!("alias_groups_deleted_total").increment(result.rows_affected);
        tracing::debug!(
            deleted = result.rows_affected,
            "Swept alias groups without members"
        );
    }

    Ok(result.rows_affected)
}

async fn members_of<C: ConnectionTrait>(
    conn: &C,
    group_kf_id: &str,
) -> Result<Vec<ParticipantModel>, DbErr> {
    Participant::find()
        .filter(participant::Column::AliasGroupId.eq(group_kf_id))
        .order_by_asc(participant::Column::CreatedAt)
        .order_by_asc(participant::Column::Uuid)
        .all(conn)
        .await
}

// Rows are locked in primary key order so that two links over the same pair
// cannot deadlock against each other.
async fn lock_pair(
    txn: &DatabaseTransaction,
    kf_id: &str,
    other_kf_id: &str,
) -> Result<(ParticipantModel, ParticipantModel), RepositoryError> {
    let mut rows = Participant::find()
        .filter(participant::Column::KfId.is_in([kf_id, other_kf_id]))
        .order_by_asc(participant::Column::KfId)
        .lock_exclusive()
        .all(txn)
        .await?;

    let mut take = |wanted: &str| {
        rows.iter()
            .position(|p| p.kf_id == wanted)
            .map(|idx| rows.swap_remove(idx))
            .ok_or_else(|| RepositoryError::not_found("Participant", wanted))
    };

    let this = take(kf_id)?;
    let other = take(other_kf_id)?;
    Ok((this, other))
}

// Group rows are locked after the participant rows, so links over disjoint
// participant pairs whose groups overlap still serialize.
async fn lock_groups(
    txn: &DatabaseTransaction,
    this: &ParticipantModel,
    other: &ParticipantModel,
) -> Result<(Option<AliasGroupModel>, Option<AliasGroupModel>), RepositoryError> {
    let groups = lock_groups_of(txn, [this, other]).await?;

    let resolve = |participant: &ParticipantModel| -> Result<Option<AliasGroupModel>, RepositoryError> {
        let Some(group_id) = participant.alias_group_id.as_deref() else {
            return Ok(None);
        };
        groups
            .iter()
            .find(|group| group.kf_id == group_id)
            .cloned()
            .map(Some)
            .ok_or_else(|| {
                RepositoryError::Integrity(format!(
                    "Participant {} references alias group {} which no longer exists",
                    participant.kf_id, group_id
                ))
            })
    };

    Ok((resolve(this)?, resolve(other)?))
}

async fn create_group(txn: &DatabaseTransaction) -> Result<AliasGroupModel, DbErr> {
    let now = kf_id::now();
    AliasGroupActiveModel {
        kf_id: Set(kf_id::generate(kf_id::ALIAS_GROUP_PREFIX)),
        uuid: Set(Uuid::new_v4()),
        created_at: Set(now),
        modified_at: Set(now),
    }
    .insert(txn)
    .await
}

async fn assign(
    txn: &DatabaseTransaction,
    participant: ParticipantModel,
    group: &AliasGroupModel,
) -> Result<(), DbErr> {
    let mut active = participant.into_active_model();
    active.alias_group_id = Set(Some(group.kf_id.clone()));
    active.modified_at = Set(kf_id::now());
    active.update(txn).await?;
    Ok(())
}

/// Folds the smaller of two groups into the larger and deletes it.
async fn merge(
    txn: &DatabaseTransaction,
    mine: AliasGroupModel,
    theirs: AliasGroupModel,
) -> Result<AliasGroupModel, RepositoryError> {
    let my_count = count_members(txn, &mine.kf_id).await?;
    let their_count = count_members(txn, &theirs.kf_id).await?;

    let (larger, smaller) = if their_count <= my_count {
        (mine, theirs)
    } else {
        (theirs, mine)
    };

    let moved = Participant::update_many()
        .col_expr(
            participant::Column::AliasGroupId,
            Expr::value(larger.kf_id.clone()),
        )
        .col_expr(participant::Column::ModifiedAt, Expr::value(kf_id::now()))
        .filter(participant::Column::AliasGroupId.eq(smaller.kf_id.as_str()))
        .exec(txn)
        .await?;

    AliasGroup::delete_by_id(smaller.kf_id.clone())
        .exec(txn)
        .await?;

    counter!("alias_group_merges_total").increment(1);
    counter!("alias_groups_deleted_total").increment(1);
    tracing::info!(
        into = %larger.kf_id,
        from = %smaller.kf_id,
        moved = moved.rows_affected,
        "Merged alias groups"
    );

    Ok(larger)
}

async fn count_members(txn: &DatabaseTransaction, group_kf_id: &str) -> Result<u64, DbErr> {
    Participant::find()
        .filter(participant::Column::AliasGroupId.eq(group_kf_id))
        .count(txn)
        .await
}
