use std::collections::{HashMap, HashSet};

use crate::error::{ImportError, ImportResult};

/// Compound `CTU-Name` column, split into `ctu` and `operator`
pub const OPERATOR_FIELD: &str = "operator";
pub const CTU_FIELD: &str = "ctu";
const OPERATOR_SEPARATOR: char = '-';

/// `YYYYMMDD` column, rewritten into `date`
pub const DATEID_FIELD: &str = "dateid";
pub const DATE_FIELD: &str = "date";

/// Part of the round key, stored in canonical integer form so `1` and `01`
/// name the same round
pub const ROUND_NUMBER_FIELD: &str = "roundnumber";

/// Column name -> offset mapping taken from the header row
#[derive(Debug, Clone)]
pub struct ColumnMap {
    offsets: HashMap<String, usize>,
    /// Every field a decoded record will carry, derived ones included
    fields: HashSet<String>,
}

impl ColumnMap {
    pub fn from_header(header: &[String]) -> ImportResult<Self> {
        if header.iter().all(|h| h.trim().is_empty()) {
            return Err(ImportError::MalformedHeader {
                reason: "header row is empty".to_string(),
            });
        }

        let mut offsets = HashMap::with_capacity(header.len());
        for (idx, name) in header.iter().enumerate() {
            let name = name.trim();
            if offsets.insert(name.to_string(), idx).is_some() {
                return Err(ImportError::MalformedHeader {
                    reason: format!("duplicate column '{}'", name),
                });
            }
        }

        let mut fields: HashSet<String> = offsets.keys().cloned().collect();
        if fields.contains(OPERATOR_FIELD) {
            fields.insert(CTU_FIELD.to_string());
        }
        if fields.contains(DATEID_FIELD) {
            fields.insert(DATE_FIELD.to_string());
        }

        Ok(Self { offsets, fields })
    }

    /// Whether decoded records carry this field
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn has_all(&self, fields: &[&str]) -> bool {
        fields.iter().all(|f| self.has(f))
    }

    /// Number of columns declared by the header
    pub fn width(&self) -> usize {
        self.offsets.len()
    }

    /// Decode one data row into a named-field record
    pub fn decode(&self, line: u64, raw: &[String]) -> ImportResult<Record> {
        if raw.len() < self.width() {
            return Err(ImportError::malformed(
                line,
                format!("expected {} fields, found {}", self.width(), raw.len()),
            ));
        }

        let mut values: HashMap<String, String> = self
            .offsets
            .iter()
            .map(|(name, &idx)| (name.clone(), raw[idx].trim().to_string()))
            .collect();

        if let Some(compound) = values.get(OPERATOR_FIELD) {
            let (ctu, operator) =
                split_operator(compound).map_err(|r| ImportError::malformed(line, r))?;
            values.insert(CTU_FIELD.to_string(), ctu);
            values.insert(OPERATOR_FIELD.to_string(), operator);
        }

        if let Some(dateid) = values.get(DATEID_FIELD) {
            let date = format_dateid(dateid).map_err(|r| ImportError::malformed(line, r))?;
            values.insert(DATE_FIELD.to_string(), date);
        }

        if let Some(round) = values.get(ROUND_NUMBER_FIELD) {
            let round = round.parse::<i64>().map_err(|_| {
                ImportError::malformed(line, format!("roundnumber '{}' is not an integer", round))
            })?;
            values.insert(ROUND_NUMBER_FIELD.to_string(), round.to_string());
        }

        Ok(Record { line, values })
    }
}

/// A data row keyed by column name
#[derive(Debug, Clone)]
pub struct Record {
    pub line: u64,
    values: HashMap<String, String>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Field value, or a malformed-row error naming the missing field
    pub fn require(&self, field: &str) -> ImportResult<&str> {
        self.get(field)
            .ok_or_else(|| ImportError::malformed(self.line, format!("missing field '{}'", field)))
    }

    /// Field value parsed as an integer
    pub fn integer(&self, field: &str) -> ImportResult<i64> {
        let value = self.require(field)?;
        value.parse::<i64>().map_err(|_| {
            ImportError::malformed(
                self.line,
                format!("field '{}' is not an integer: '{}'", field, value),
            )
        })
    }
}

/// Split `CTU-Name` into `(ctu, name)`
fn split_operator(value: &str) -> Result<(String, String), String> {
    let mut parts = value.split(OPERATOR_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(ctu), Some(name), None) if !ctu.is_empty() && !name.is_empty() => {
            Ok((ctu.to_string(), name.to_string()))
        }
        (_, None, _) => Err(format!(
            "operator '{}' has no '{}' separator",
            value, OPERATOR_SEPARATOR
        )),
        (_, Some(_), Some(_)) => Err(format!(
            "operator '{}' has more than one '{}' separator",
            value, OPERATOR_SEPARATOR
        )),
        _ => Err(format!("operator '{}' has an empty CTU or name", value)),
    }
}

/// Reformat `YYYYMMDD` as `YYYY-MM-DD`
fn format_dateid(value: &str) -> Result<String, String> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("dateid '{}' is not 8 digits (YYYYMMDD)", value));
    }
    Ok(format!("{}-{}-{}", &value[0..4], &value[4..6], &value[6..8]))
}
