//! Generic repository contract and its SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/update/delete for any `Entity` through one code
//!   path, so every entity gets identical transaction and error semantics.
//! - Invoke the integrity rules on every write.
//!
//! # Invariants
//! - `create`, `update` and `delete` each open one IMMEDIATE transaction and
//!   commit it only after every check and statement succeeded.
//! - `create` checks the id strategy and key uniqueness before the parent
//!   reference, so a reused natural key is always `DuplicateKey`.
//! - `update` rejects unknown ids with `NotFound`; it never upserts.
//! - Read paths reject persisted rows that fail validation.

use crate::db::migrations::latest_version;
use crate::repo::entity::{Entity, IdStrategy};
use crate::repo::integrity::{cascade_delete, ensure_parent_exists};
use crate::repo::{ConstraintViolation, RepoError, RepoResult};
use log::{error, info};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Transaction, TransactionBehavior,
};
use std::marker::PhantomData;
use std::time::Instant;

/// CRUD contract shared by every entity type.
pub trait Repository<E: Entity> {
    /// Persists a new entity and returns its identifier.
    fn create(&self, entity: &E) -> RepoResult<E::Id>;
    /// Loads one entity; `None` when absent.
    fn read(&self, id: &E::Id) -> RepoResult<Option<E>>;
    /// Replaces the stored entity with the same identifier.
    fn update(&self, entity: &E) -> RepoResult<()>;
    /// Removes the entity and everything it owns. Absent ids are a no-op.
    fn delete(&self, id: &E::Id) -> RepoResult<()>;
    /// Lists every stored entity ordered by identifier.
    fn list(&self) -> RepoResult<Vec<E>>;
    fn exists(&self, id: &E::Id) -> RepoResult<bool>;
}

/// SQLite-backed repository for one entity type.
pub struct SqliteRepository<'conn, E> {
    conn: &'conn Connection,
    _entity: PhantomData<fn() -> E>,
}

impl<'conn, E: Entity> SqliteRepository<'conn, E> {
    /// Creates repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not current.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the entity's
    ///   table does not match its descriptor.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready::<E>(conn)?;
        Ok(Self {
            conn,
            _entity: PhantomData,
        })
    }

    fn begin(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    fn create_in_tx(&self, entity: &E) -> RepoResult<E::Id> {
        entity.validate()?;

        let tx = self.begin()?;
        let key = check_new_key(&tx, entity)?;
        if let Some(parent) = entity.parent() {
            ensure_parent_exists(&tx, &parent)?;
        }
        let id = insert_row(&tx, key, entity)?;
        tx.commit()?;
        Ok(id)
    }

    fn update_in_tx(&self, entity: &E) -> RepoResult<()> {
        entity.validate()?;
        let id = entity.id().ok_or_else(|| {
            RepoError::ConstraintViolation(ConstraintViolation::MissingId { entity: E::NAME })
        })?;

        let tx = self.begin()?;
        if !row_exists::<E>(&tx, &id)? {
            return Err(RepoError::NotFound {
                entity: E::NAME,
                id: id.to_string(),
            });
        }
        if let Some(parent) = entity.parent() {
            ensure_parent_exists(&tx, &parent)?;
        }
        replace_row(&tx, id, entity)?;
        tx.commit()?;
        Ok(())
    }

    /// Returns the number of rows removed, parent included.
    fn delete_in_tx(&self, id: &E::Id) -> RepoResult<usize> {
        let tx = self.begin()?;
        if !row_exists::<E>(&tx, id)? {
            return Ok(0);
        }

        let removed = cascade_delete(&tx, E::OWNED, id)?;
        tx.execute(
            &format!("DELETE FROM {} WHERE {} = ?1;", E::TABLE, E::ID_COLUMN),
            params![id],
        )?;
        tx.commit()?;
        Ok(removed + 1)
    }
}

impl<E: Entity> Repository<E> for SqliteRepository<'_, E> {
    fn create(&self, entity: &E) -> RepoResult<E::Id> {
        let started_at = Instant::now();
        let result = self.create_in_tx(entity);
        log_outcome::<E, _>("create", started_at, &result);
        result
    }

    fn read(&self, id: &E::Id) -> RepoResult<Option<E>> {
        let entity = self
            .conn
            .query_row(
                &format!("{} WHERE {} = ?1;", select_sql::<E>(), E::ID_COLUMN),
                params![id],
                |row| E::from_row(row),
            )
            .optional()?;

        entity.map(ensure_persisted_valid).transpose()
    }

    fn update(&self, entity: &E) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.update_in_tx(entity);
        log_outcome::<E, _>("update", started_at, &result);
        result
    }

    fn delete(&self, id: &E::Id) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.delete_in_tx(id);
        log_outcome::<E, _>("delete", started_at, &result);
        result.map(|_| ())
    }

    fn list(&self) -> RepoResult<Vec<E>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} ORDER BY {} ASC;",
            select_sql::<E>(),
            E::ID_COLUMN
        ))?;
        let mut rows = stmt.query([])?;
        let mut entities = Vec::new();

        while let Some(row) = rows.next()? {
            entities.push(ensure_persisted_valid(E::from_row(row)?)?);
        }

        Ok(entities)
    }

    fn exists(&self, id: &E::Id) -> RepoResult<bool> {
        row_exists::<E>(self.conn, id)
    }
}

/// Applies the id strategy to a new entity before anything else is checked.
///
/// Returns the natural key to bind, or `None` when the store generates it.
fn check_new_key<E: Entity>(conn: &Connection, entity: &E) -> RepoResult<Option<E::Id>> {
    match (E::ID_STRATEGY, entity.id()) {
        (IdStrategy::Generated, Some(_)) => Err(RepoError::ConstraintViolation(
            ConstraintViolation::IdAlreadyAssigned { entity: E::NAME },
        )),
        (IdStrategy::Generated, None) => Ok(None),
        (IdStrategy::Natural, Some(id)) => {
            if row_exists::<E>(conn, &id)? {
                return Err(RepoError::ConstraintViolation(
                    ConstraintViolation::DuplicateKey {
                        entity: E::NAME,
                        id: id.to_string(),
                    },
                ));
            }
            Ok(Some(id))
        }
        (IdStrategy::Natural, None) => Err(RepoError::ConstraintViolation(
            ConstraintViolation::MissingId { entity: E::NAME },
        )),
    }
}

fn insert_row<E: Entity>(conn: &Connection, key: Option<E::Id>, entity: &E) -> RepoResult<E::Id> {
    let mut columns: Vec<&str> = Vec::with_capacity(E::COLUMNS.len() + 1);
    let mut values: Vec<Value> = Vec::with_capacity(E::COLUMNS.len() + 1);

    if let Some(id) = key {
        columns.push(E::ID_COLUMN);
        values.push(id.into());
    }
    columns.extend_from_slice(E::COLUMNS);
    values.extend(entity.column_values());

    let placeholders = (1..=values.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let id = conn.query_row(
        &format!(
            "INSERT INTO {} ({}) VALUES ({placeholders}) RETURNING {};",
            E::TABLE,
            columns.join(", "),
            E::ID_COLUMN
        ),
        params_from_iter(values),
        |row| row.get::<_, E::Id>(0),
    )?;
    Ok(id)
}

fn replace_row<E: Entity>(conn: &Connection, id: E::Id, entity: &E) -> RepoResult<()> {
    let assignments = E::COLUMNS
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{column} = ?{}", index + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let mut values = entity.column_values();
    values.push(id.clone().into());

    let changed = conn.execute(
        &format!(
            "UPDATE {} SET {assignments} WHERE {} = ?{};",
            E::TABLE,
            E::ID_COLUMN,
            values.len()
        ),
        params_from_iter(values),
    )?;

    if changed == 0 {
        return Err(RepoError::NotFound {
            entity: E::NAME,
            id: id.to_string(),
        });
    }
    Ok(())
}

fn select_sql<E: Entity>() -> String {
    format!(
        "SELECT {}, {} FROM {}",
        E::ID_COLUMN,
        E::COLUMNS.join(", "),
        E::TABLE
    )
}

fn row_exists<E: Entity>(conn: &Connection, id: &E::Id) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1);",
            E::TABLE,
            E::ID_COLUMN
        ),
        params![id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn ensure_persisted_valid<E: Entity>(entity: E) -> RepoResult<E> {
    entity.validate().map_err(|err| {
        RepoError::InvalidData(format!("{} row failed validation: {err}", E::TABLE))
    })?;
    Ok(entity)
}

// Metadata only: ids and field values never reach the log.
fn log_outcome<E: Entity, T>(operation: &str, started_at: Instant, result: &RepoResult<T>) {
    match result {
        Ok(_) => info!(
            "event={}_{operation} module=repo status=ok duration_ms={}",
            E::NAME,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event={}_{operation} module=repo status=error error_kind={:?} duration_ms={}",
            E::NAME,
            err.kind(),
            started_at.elapsed().as_millis()
        ),
    }
}

fn ensure_connection_ready<E: Entity>(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, E::TABLE)? {
        return Err(RepoError::MissingRequiredTable(E::TABLE));
    }

    for column in std::iter::once(E::ID_COLUMN).chain(E::COLUMNS.iter().copied()) {
        if !table_has_column(conn, E::TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: E::TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
