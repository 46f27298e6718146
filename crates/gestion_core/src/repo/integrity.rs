//! Referential integrity rules for the company/department/employee tree.
//!
//! # Responsibility
//! - Reject writes whose parent reference does not exist.
//! - Remove every owned descendant before its parent row is deleted.
//!
//! # Invariants
//! - All functions run on the caller's open transaction and never commit;
//!   a failure anywhere aborts the caller's whole unit of work.
//! - Descendants are deleted deepest level first so that foreign keys stay
//!   satisfied after every statement.

use crate::repo::entity::{OwnedRelation, ParentRef};
use crate::repo::{RepoError, RepoResult};
use log::debug;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection};

/// Fails with `ReferenceNotFound` when `parent` is absent.
pub fn ensure_parent_exists(conn: &Connection, parent: &ParentRef) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1);",
            parent.table, parent.id_column
        ),
        [parent.id],
        |row| row.get(0),
    )?;

    if exists == 0 {
        return Err(RepoError::ReferenceNotFound {
            entity: parent.entity,
            id: parent.id.to_string(),
        });
    }
    Ok(())
}

/// Deletes every row owned, directly or transitively, by `parent_id`.
///
/// Returns the number of descendant rows removed. The parent row itself is
/// left for the caller.
pub fn cascade_delete(
    conn: &Connection,
    relations: &[OwnedRelation],
    parent_id: &impl ToSql,
) -> RepoResult<usize> {
    cascade_under(conn, relations, "?1", parent_id)
}

fn cascade_under(
    conn: &Connection,
    relations: &[OwnedRelation],
    parent_selector: &str,
    parent_id: &impl ToSql,
) -> RepoResult<usize> {
    let mut removed = 0;
    for relation in relations {
        let child_selector = format!(
            "SELECT {} FROM {} WHERE {} IN ({parent_selector})",
            relation.child_id_column, relation.child_table, relation.foreign_key
        );
        removed += cascade_under(conn, relation.owned, &child_selector, parent_id)?;

        let deleted = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} IN ({parent_selector});",
                relation.child_table, relation.foreign_key
            ),
            params![parent_id],
        )?;
        debug!(
            "event=cascade_delete module=repo status=ok table={} rows={deleted}",
            relation.child_table
        );
        removed += deleted;
    }
    Ok(removed)
}
