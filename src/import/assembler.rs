use rusqlite::{Connection, Transaction};

use super::bindings::{Source, NONE_SENTINEL};
use super::plan::{ImportPlan, PlannedTable};
use crate::error::{ImportError, ImportResult};
use crate::parser::Record;
use crate::registry::{NaturalKey, RegistrySet};
use crate::writer::{insert_row, SqlValue};

/// Per-run import context: the plan plus one registry per dimension table.
///
/// Foreign keys are filled from the registries, so a reference to a row that
/// was never registered is reported instead of being stored as NULL.
pub struct Importer {
    plan: ImportPlan,
    registries: RegistrySet,
}

impl Importer {
    pub fn new(plan: ImportPlan) -> Self {
        Self {
            plan,
            registries: RegistrySet::new(),
        }
    }

    pub fn registries(&self) -> &RegistrySet {
        &self.registries
    }

    /// Import one record inside its own savepoint. On error both the
    /// database and the registries are put back as they were before the row.
    pub fn import_row(
        &mut self,
        tx: &mut Transaction,
        record: &Record,
        stat_id: i64,
    ) -> ImportResult<()> {
        let store = |source| ImportError::Store {
            line: record.line,
            source,
        };

        let checkpoint = self.registries.checkpoint();
        let mut savepoint = tx.savepoint().map_err(store)?;

        match self.process(&savepoint, record, stat_id) {
            Ok(()) => savepoint.commit().map_err(store),
            Err(e) => {
                self.registries.rollback(&checkpoint);
                savepoint.rollback().map_err(store)?;
                Err(e)
            }
        }
    }

    /// Resolve every dimension the record references, then insert one row
    /// per fact table with `stat_id` as its key
    pub fn process(
        &mut self,
        conn: &Connection,
        record: &Record,
        stat_id: i64,
    ) -> ImportResult<()> {
        let Self { plan, registries } = self;

        for dimension in &plan.dimensions {
            resolve_dimension(conn, registries, dimension, record)?;
        }

        for fact in &plan.facts {
            let mut values = Vec::with_capacity(fact.columns.len() + 1);
            values.push(SqlValue::Integer(stat_id));
            for (_, source) in &fact.columns {
                values.push(column_value(registries, source, record)?);
            }
            insert_row(conn, &fact.insert_sql, &values).map_err(|source| ImportError::Store {
                line: record.line,
                source,
            })?;
        }

        Ok(())
    }
}

/// Look up or create the surrogate key for one binding. Returns `None` when
/// the binding is skipped for a sentinel value.
fn resolve_dimension(
    conn: &Connection,
    registries: &mut RegistrySet,
    dimension: &PlannedTable,
    record: &Record,
) -> ImportResult<Option<i64>> {
    let parts = dimension
        .key
        .iter()
        .map(|field| record.require(field))
        .collect::<ImportResult<Vec<&str>>>()?;

    if dimension.skip_sentinel && parts.contains(&NONE_SENTINEL) {
        return Ok(None);
    }

    let key = NaturalKey::new(parts);
    if let Some(id) = registries.get(dimension.table, &key) {
        return Ok(Some(id));
    }

    // Evaluate everything that can fail before the key is handed out
    let mut values = Vec::with_capacity(dimension.columns.len() + 1);
    values.push(SqlValue::Null);
    for (_, source) in &dimension.columns {
        values.push(column_value(registries, source, record)?);
    }

    let (id, _) = registries.registry_mut(dimension.table).resolve(key);
    values[0] = SqlValue::Integer(id);

    insert_row(conn, &dimension.insert_sql, &values).map_err(|source| ImportError::Store {
        line: record.line,
        source,
    })?;
    tracing::trace!("{} #{} registered at line {}", dimension.table, id, record.line);

    Ok(Some(id))
}

fn column_value(
    registries: &RegistrySet,
    source: &Source,
    record: &Record,
) -> ImportResult<SqlValue> {
    match *source {
        Source::Text(field) => Ok(SqlValue::Text(record.require(field)?.to_string())),
        Source::Integer(field) => record.integer(field).map(SqlValue::Integer),
        Source::Ref { table, key, optional } => {
            let parts = key
                .iter()
                .map(|field| record.require(field))
                .collect::<ImportResult<Vec<&str>>>()?;

            if optional && parts.contains(&NONE_SENTINEL) {
                return Ok(SqlValue::Null);
            }

            let key = NaturalKey::new(parts);
            registries
                .get(table, &key)
                .map(SqlValue::Integer)
                .ok_or_else(|| ImportError::UnresolvedReference {
                    line: record.line,
                    table,
                    key: key.to_vec(),
                })
        }
    }
}
