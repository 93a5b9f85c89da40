use crate::schema::{get_table, TableSchema};

/// Quote an identifier; `match` and friends are SQL keywords
pub fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE {} (\n", quote(schema.name));
    let mut columns = vec![format!("    {} INTEGER PRIMARY KEY", quote(schema.primary_key))];

    for col in schema.columns {
        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
        columns.push(format!(
            "    {} {}{}",
            quote(col.name),
            col.col_type.sql_type(),
            null_constraint
        ));
    }

    for fk in schema.foreign_keys {
        let references_column = get_table(fk.references_table).map_or(fk.column, |t| t.primary_key);
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({})",
            quote(fk.column),
            quote(fk.references_table),
            quote(references_column)
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements: declared indexes, then one per foreign
/// key column not already leading a declared index
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    let declared = schema.indexes.iter().map(|index| {
        let unique = if index.unique { "UNIQUE " } else { "" };
        let columns: Vec<String> = index.columns.iter().map(|c| quote(c)).collect();
        format!(
            "CREATE {}INDEX {} ON {}({})",
            unique,
            quote(&format!("idx_{}_{}", schema.name, index.columns.join("_"))),
            quote(schema.name),
            columns.join(", ")
        )
    });

    let foreign = schema
        .foreign_keys
        .iter()
        .filter(|fk| {
            !schema
                .indexes
                .iter()
                .any(|index| index.columns.first() == Some(&fk.column))
        })
        .map(|fk| {
            format!(
                "CREATE INDEX {} ON {}({})",
                quote(&format!("idx_{}_{}", schema.name, fk.column)),
                quote(schema.name),
                quote(fk.column)
            )
        });

    declared.chain(foreign).collect()
}

/// Generate a parameterised INSERT for the given columns
pub fn generate_insert(table: &str, columns: &[&str]) -> String {
    let names: Vec<String> = columns.iter().map(|c| quote(c)).collect();
    let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote(table),
        names.join(", "),
        placeholders.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{ATTACHMENT_SIGHT, MATCH, OPERATOR, PLATFORM};

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table(&OPERATOR);
        assert!(sql.contains("CREATE TABLE \"operator\""));
        assert!(sql.contains("\"operator_id\" INTEGER PRIMARY KEY"));
        assert!(sql.contains("\"name\" TEXT NOT NULL"));
        assert!(sql.contains("FOREIGN KEY (\"ctu_id\") REFERENCES \"ctu\"(\"ctu_id\")"));
    }

    #[test]
    fn test_keyword_table_is_quoted() {
        let sql = generate_create_table(&MATCH);
        assert!(sql.starts_with("CREATE TABLE \"match\""));
    }

    #[test]
    fn test_name_dimensions_are_indexed_by_name() {
        let indexes = generate_indexes(&PLATFORM);
        assert_eq!(
            indexes,
            vec!["CREATE INDEX \"idx_platform_name\" ON \"platform\"(\"name\")"]
        );
    }

    #[test]
    fn test_fk_index_not_duplicated() {
        let indexes = generate_indexes(&ATTACHMENT_SIGHT);
        assert_eq!(indexes.len(), 1);
        assert!(indexes[0].starts_with("CREATE UNIQUE INDEX"));
    }

    #[test]
    fn test_generate_insert() {
        assert_eq!(
            generate_insert("map", &["map_id", "name"]),
            "INSERT INTO \"map\" (\"map_id\", \"name\") VALUES (?, ?)"
        );
    }
}
