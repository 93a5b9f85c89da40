//! Export file -> star schema import

pub mod assembler;
pub mod bindings;
pub mod plan;

pub use assembler::Importer;
pub use bindings::{Binding, FactBinding, Source, NONE_SENTINEL};
pub use plan::{ImportPlan, PlannedTable};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::parser::{ColumnMap, RowSource};
use crate::schema::ALL_TABLES;
use crate::ui::{Phase, Ui};
use crate::writer::{remove_database, SqliteWriter};

/// Rows between progress updates
const PROGRESS_INTERVAL: u64 = 1000;

/// Knobs for one import run
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Drop malformed rows with a warning instead of aborting the run
    pub skip_malformed: bool,
}

/// Row counters for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportStats {
    pub rows_read: u64,
    pub rows_imported: u64,
    pub rows_skipped: u64,
}

/// What an import produced
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub stats: ImportStats,
    /// Row count per table, every table in the schema included
    pub tables: BTreeMap<&'static str, u64>,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Created {:?} from {:?}: {} rows imported, {} skipped",
            self.output, self.input, self.stats.rows_imported, self.stats.rows_skipped
        )?;
        for (table, count) in &self.tables {
            writeln!(f, "  {:24} {:>10}", table, count)?;
        }
        Ok(())
    }
}

/// Import `input` into a fresh database at `output`.
///
/// The output file is replaced if it exists. On failure nothing is committed
/// and the partially written database is removed.
pub fn import_file(
    input: &Path,
    output: &Path,
    options: &ImportOptions,
    ui: &mut impl Ui,
) -> Result<ImportSummary> {
    let result = run_import(input, output, options, ui);
    if result.is_err() {
        remove_database(output);
    }
    result
}

fn run_import(
    input: &Path,
    output: &Path,
    options: &ImportOptions,
    ui: &mut impl Ui,
) -> Result<ImportSummary> {
    ui.set_phase(Phase::Reading);
    ui.set_info(format!("{}", input.display()));
    let total = count_data_rows(input)?;
    ui.log(format!("{} data rows in {:?}", total, input));

    let source = RowSource::open(input).with_context(|| format!("Failed to open: {:?}", input))?;

    let mut writer = SqliteWriter::new(output)?;
    writer.create_tables(ALL_TABLES)?;

    let stats = import_rows(source, &mut writer, options, ui, total)
        .with_context(|| format!("Failed to import {:?}", input))?;

    ui.set_phase(Phase::Finalizing);
    let mut tables = BTreeMap::new();
    for schema in ALL_TABLES {
        tables.insert(schema.name, writer.count_rows(schema.name)?);
    }
    writer.finalize()?;

    Ok(ImportSummary {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        stats,
        tables,
    })
}

/// Import an export stream into an already created schema
pub fn import_reader<R: Read>(
    reader: R,
    writer: &mut SqliteWriter,
    options: &ImportOptions,
    ui: &mut impl Ui,
) -> Result<ImportStats> {
    import_rows(RowSource::new(reader), writer, options, ui, 0)
}

fn import_rows<R: Read>(
    mut source: RowSource<R>,
    writer: &mut SqliteWriter,
    options: &ImportOptions,
    ui: &mut impl Ui,
    total: u64,
) -> Result<ImportStats> {
    let header = source
        .next_row()?
        .ok_or_else(|| anyhow!("Input has no header row"))?;
    let columns = ColumnMap::from_header(&header.fields)?;
    let plan = ImportPlan::for_header(&columns)?;

    let fact_tables: Vec<&str> = plan.facts.iter().map(|f| f.table).collect();
    tracing::info!(
        "Importing into {} with {} dimension bindings",
        fact_tables.join(", "),
        plan.dimensions.len()
    );
    ui.log(format!("Importing into {}", fact_tables.join(", ")));
    ui.set_phase(Phase::Importing);

    let mut importer = Importer::new(plan);
    let mut stats = ImportStats::default();
    let mut tx = writer.transaction()?;

    for row in source {
        let row = row?;
        stats.rows_read += 1;

        let stat_id = stats.rows_imported as i64 + 1;
        let outcome = columns
            .decode(row.line, &row.fields)
            .and_then(|record| importer.import_row(&mut tx, &record, stat_id));

        match outcome {
            Ok(()) => stats.rows_imported += 1,
            Err(e) if options.skip_malformed && e.is_row_local() => {
                tracing::warn!("Skipping row: {}", e);
                ui.log(format!("Skipped: {}", e));
                stats.rows_skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }

        if stats.rows_read % PROGRESS_INTERVAL == 0 {
            ui.set_progress(stats.rows_read, total, "Importing rows");
        }
    }

    tx.commit().context("Failed to commit import")?;
    ui.set_progress(stats.rows_read, total, "Importing rows");
    tracing::info!(
        "Imported {} rows ({} skipped)",
        stats.rows_imported,
        stats.rows_skipped
    );

    Ok(stats)
}

/// Count data rows for the progress display; the header is not counted
fn count_data_rows(path: &Path) -> Result<u64> {
    let file = File::open(path).with_context(|| format!("Failed to open: {:?}", path))?;
    let mut lines: u64 = 0;
    for line in BufReader::new(file).split(b'\n') {
        if !line?.iter().all(u8::is_ascii_whitespace) {
            lines += 1;
        }
    }
    Ok(lines.saturating_sub(1))
}
