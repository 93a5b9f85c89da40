use std::collections::HashSet;

use super::bindings::{all_bindings, Source, FACT_BINDINGS};
use crate::error::{ImportError, ImportResult};
use crate::parser::ColumnMap;
use crate::schema::{get_table, DependencyResolver};
use crate::writer::generate_insert;

/// A binding or fact table narrowed to the columns one header provides
#[derive(Debug)]
pub struct PlannedTable {
    pub table: &'static str,
    /// Natural-key fields; empty for fact tables
    pub key: &'static [&'static str],
    pub skip_sentinel: bool,
    /// Columns after the primary key, in insert order
    pub columns: Vec<(&'static str, Source)>,
    pub insert_sql: String,
}

impl PlannedTable {
    fn new(
        table: &'static str,
        primary_key: &'static str,
        key: &'static [&'static str],
        skip_sentinel: bool,
        columns: Vec<(&'static str, Source)>,
    ) -> Self {
        let names: Vec<&str> = std::iter::once(primary_key)
            .chain(columns.iter().map(|(name, _)| *name))
            .collect();
        let insert_sql = generate_insert(table, &names);

        Self {
            table,
            key,
            skip_sentinel,
            columns,
            insert_sql,
        }
    }
}

/// The dimension bindings and fact tables one header can feed, with the
/// bindings already in dependency order
#[derive(Debug)]
pub struct ImportPlan {
    pub dimensions: Vec<PlannedTable>,
    pub facts: Vec<PlannedTable>,
}

impl ImportPlan {
    pub fn for_header(header: &ColumnMap) -> ImportResult<Self> {
        let active: Vec<_> = all_bindings().filter(|b| header.has_all(b.key)).collect();

        // (table, natural-key fields) pairs some active binding will register
        let producers: HashSet<(&str, &[&str])> =
            active.iter().map(|b| (b.table, b.key)).collect();

        let usable = |table: &str, (column, source): &(&'static str, Source)| {
            if !header.has_all(source.fields()) {
                tracing::debug!("{}.{}: source columns absent, left NULL", table, column);
                return false;
            }
            match source {
                Source::Ref { table: parent, key, .. } => producers.contains(&(*parent, *key)),
                _ => true,
            }
        };

        let facts: Vec<PlannedTable> = FACT_BINDINGS
            .iter()
            .filter(|f| header.has_all(f.requires))
            .map(|f| {
                let columns = f
                    .columns
                    .iter()
                    .filter(|c| usable(f.table, *c))
                    .copied()
                    .collect();
                PlannedTable::new(f.table, "stat_id", &[], false, columns)
            })
            .collect();

        if facts.is_empty() {
            let mut missing: Vec<&'static str> = FACT_BINDINGS
                .iter()
                .flat_map(|f| f.requires.iter().copied())
                .filter(|field| !header.has(field))
                .collect();
            missing.sort_unstable();
            missing.dedup();
            return Err(ImportError::UnsupportedLayout { missing });
        }

        let tables: Vec<&str> = active.iter().map(|b| b.table).collect();
        let order: Vec<&str> = DependencyResolver::new()
            .resolve_includes(&tables)
            .map_err(|reason| ImportError::MalformedHeader { reason })?
            .iter()
            .map(|t| t.name)
            .collect();

        let mut active = active;
        active.sort_by_key(|b| order.iter().position(|&name| name == b.table));

        let dimensions = active
            .into_iter()
            .map(|b| {
                let primary_key = get_table(b.table).map_or("id", |t| t.primary_key);
                let columns = b
                    .columns
                    .iter()
                    .filter(|c| usable(b.table, *c))
                    .copied()
                    .collect();
                PlannedTable::new(b.table, primary_key, b.key, b.skip_sentinel, columns)
            })
            .collect();

        Ok(Self { dimensions, facts })
    }

    /// Tables this plan writes to, dimensions first
    pub fn tables(&self) -> Vec<&'static str> {
        let mut seen = HashSet::new();
        self.dimensions
            .iter()
            .chain(&self.facts)
            .map(|p| p.table)
            .filter(|t| seen.insert(*t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::bindings::DIMENSION_BINDINGS;

    fn plan(header: &[&str]) -> ImportResult<ImportPlan> {
        let header: Vec<String> = header.iter().map(|s| s.to_string()).collect();
        ImportPlan::for_header(&ColumnMap::from_header(&header).unwrap())
    }

    const OBJECTIVES_HEADER: &[&str] = &[
        "platform",
        "gamemode",
        "mapname",
        "role",
        "operator",
        "skillrank",
        "objectivelocation",
        "dateid",
        "nbwins",
        "nbkills",
        "nbdeaths",
        "nbpicks",
    ];

    #[test]
    fn test_objectives_header_plans_objective_facts() {
        let plan = plan(OBJECTIVES_HEADER).unwrap();

        assert_eq!(plan.facts.len(), 1);
        assert_eq!(plan.facts[0].table, "stat_objective");
        assert_eq!(plan.facts[0].columns.len(), 9);

        let tables = plan.tables();
        let expected = [
            "platform",
            "gamemode",
            "map",
            "role",
            "ctu",
            "skillrank",
            "objective",
            "operator",
        ];
        for t in expected {
            assert!(tables.contains(&t), "missing {}", t);
        }
        assert!(!tables.contains(&"weapon"));
        assert!(!tables.contains(&"match"));
    }

    #[test]
    fn test_dimensions_follow_dependency_order() {
        let plan = plan(OBJECTIVES_HEADER).unwrap();
        let tables = plan.tables();
        let pos = |name: &str| tables.iter().position(|&t| t == name).unwrap();

        assert!(pos("map") < pos("objective"));
        assert!(pos("gamemode") < pos("objective"));
        assert!(pos("ctu") < pos("operator"));
        assert!(pos("role") < pos("operator"));
        assert!(pos("operator") < pos("stat_objective"));
    }

    #[test]
    fn test_missing_stat_columns_are_left_out() {
        let plan = plan(&[
            "platform",
            "operator",
            "role",
            "objectivelocation",
            "mapname",
            "gamemode",
        ])
        .unwrap();
        let columns: Vec<_> = plan.facts[0].columns.iter().map(|(c, _)| *c).collect();

        assert_eq!(columns, vec!["platform_id", "objective_id", "operator_id"]);
        assert_eq!(
            plan.facts[0].insert_sql,
            "INSERT INTO \"stat_objective\" (\"stat_id\", \"platform_id\", \"objective_id\", \"operator_id\") VALUES (?, ?, ?, ?)"
        );
    }

    #[test]
    fn test_unknown_layout_is_rejected() {
        let err = plan(&["platform", "mapname"]).unwrap_err();
        match err {
            ImportError::UnsupportedLayout { missing } => {
                assert!(missing.contains(&"operator"));
                assert!(missing.contains(&"objectivelocation"));
                assert!(missing.contains(&"primaryweapon"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_every_reference_has_a_producer_and_a_foreign_key() {
        let producers: HashSet<(&str, &[&str])> =
            all_bindings().map(|b| (b.table, b.key)).collect();

        let consumers = all_bindings()
            .map(|b| (b.table, b.columns))
            .chain(FACT_BINDINGS.iter().map(|f| (f.table, f.columns)));

        for (table, columns) in consumers {
            let schema = get_table(table).unwrap();
            for (column, source) in columns {
                assert!(schema.column(column).is_some(), "{}.{} not in schema", table, column);
                if let Source::Ref { table: parent, key, .. } = source {
                    assert!(
                        producers.contains(&(*parent, *key)),
                        "{}.{} references {} by {:?}, which no binding registers",
                        table, column, parent, key
                    );
                    assert!(
                        schema
                            .foreign_keys
                            .iter()
                            .any(|fk| fk.column == *column && fk.references_table == *parent),
                        "{}.{} has no foreign key to {}",
                        table, column, parent
                    );
                }
            }
        }
        assert!(DIMENSION_BINDINGS.iter().all(|b| !b.key.is_empty()));
    }
}
