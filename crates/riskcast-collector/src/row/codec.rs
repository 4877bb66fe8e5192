//! Versioned flat encoding of [`Row`]s for JSON Lines and CSV.
//!
//! Both formats share one flat column layout:
//!
//! - `schema`, `split`, `session`, `tSec`, `horizonSec`, `groupKey`, `groupName`
//! - `f0` .. `f31`
//! - `s_score`, `s_combo`, `s_misses`, `s_acc`, `s_hitGood`, `s_hitWrong`,
//!   `s_hitJunk`, `s_expireGood`
//! - `p_risk01`, `p_missNext5`, `p_scoreDropNext5` (empty when absent)
//! - one `y_*` column per label
//!
//! CSV headers are the union of all columns present: [`preferred_columns`] first in
//! that order, then every other column sorted by name.
//!
//! Readers skip malformed rows, count them and log a warning with the line number.
//! Text columns round-trip verbatim, including whitespace-only values.

use std::{
    collections::{BTreeMap, BTreeSet},
    io::{self, BufRead, Read, Write},
};

use serde::{Serialize, Serializer};

use super::{CounterTotals, ROW_SCHEMA_VERSION, Row};
use crate::{
    feature::{FEATURE_COUNT, FeatureVector, column_name},
    pending::{ModelOutputs, SampleContext},
    split::{Split, UnknownSplitError},
};

const SCHEMA: &str = "schema";
const SPLIT: &str = "split";
const SESSION: &str = "session";
const T_SEC: &str = "tSec";
const HORIZON_SEC: &str = "horizonSec";
const GROUP_KEY: &str = "groupKey";
const GROUP_NAME: &str = "groupName";
const TOTAL_COLUMNS: [&str; 8] = [
    "s_score",
    "s_combo",
    "s_misses",
    "s_acc",
    "s_hitGood",
    "s_hitWrong",
    "s_hitJunk",
    "s_expireGood",
];
const OUTPUT_COLUMNS: [&str; 3] = ["p_risk01", "p_missNext5", "p_scoreDropNext5"];
const LABEL_PREFIX: &str = "y_";

/// Horizon assumed for rows exported without a `horizonSec` column.
const FALLBACK_HORIZON_SEC: u32 = 5;

/// A single flat cell.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f32),
    Text(String),
    Empty,
}

impl FieldValue {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Int(_) | FieldValue::Float(_) => false,
        }
    }

    /// Integer value, accepting integral floats and numeric text.
    #[expect(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        let from_float = |f: f64| (f.is_finite() && f.fract() == 0.0).then_some(f as i64);
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::Float(f) => from_float(f64::from(*f)),
            FieldValue::Text(s) => {
                let s = s.trim();
                s.parse()
                    .ok()
                    .or_else(|| s.parse().ok().and_then(from_float))
            }
            FieldValue::Empty => None,
        }
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            FieldValue::Int(v) => Some(*v as f32),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Empty => None,
        }
    }

    /// Text as written to a CSV cell, before quoting.
    #[must_use]
    pub fn to_csv_field(&self) -> String {
        match self {
            FieldValue::Int(v) => v.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Empty => String::new(),
        }
    }

    #[expect(clippy::cast_possible_truncation)]
    fn from_json(name: &str, value: serde_json::Value) -> Result<Self, MalformedRowError> {
        use serde_json::Value;
        Ok(match value {
            Value::Null => FieldValue::Empty,
            Value::Bool(b) => FieldValue::Int(i64::from(b)),
            Value::Number(n) => match n.as_i64() {
                Some(v) => FieldValue::Int(v),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN) as f32),
            },
            Value::String(s) => FieldValue::Text(s),
            Value::Array(_) | Value::Object(_) => {
                return Err(MalformedRowError::UnsupportedValue {
                    name: name.to_owned(),
                });
            }
        })
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldValue::Int(v) => serializer.serialize_i64(*v),
            FieldValue::Float(f) if f.is_finite() => serializer.serialize_f32(*f),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Float(_) | FieldValue::Empty => serializer.serialize_none(),
        }
    }
}

/// Flat column map of one row.
pub type Record = BTreeMap<String, FieldValue>;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum MalformedRowError {
    #[display("missing field `{name}`")]
    MissingField { name: String },
    #[display("field `{name}` is not a valid number: `{value}`")]
    InvalidNumber { name: String, value: String },
    #[display("field `{name}` has an unsupported JSON type")]
    UnsupportedValue { name: String },
    #[display("{_0}")]
    InvalidSplit(UnknownSplitError),
    #[display("unsupported row schema version {version}")]
    UnsupportedSchema { version: i64 },
    #[display("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
    #[display("invalid JSON object: {_0}")]
    InvalidJson(serde_json::Error),
    #[display("invalid CSV record: {_0}")]
    InvalidCsv(csv::Error),
}

/// Columns that lead every CSV header, in order.
#[must_use]
pub fn preferred_columns() -> Vec<String> {
    let head = [SCHEMA, SPLIT, SESSION, T_SEC, HORIZON_SEC, GROUP_KEY, GROUP_NAME];
    let tail = TOTAL_COLUMNS
        .iter()
        .chain(&OUTPUT_COLUMNS)
        .chain(&["y_missNext5", "y_scoreDropNext5"]);
    head.iter()
        .map(|s| (*s).to_owned())
        .chain((0..FEATURE_COUNT).map(column_name))
        .chain(tail.map(|s| (*s).to_owned()))
        .collect()
}

/// Stable union of the columns in `records`.
#[must_use]
pub fn csv_columns(records: &[Record]) -> Vec<String> {
    let mut present: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.keys().map(String::as_str))
        .collect();
    let mut columns = vec![];
    for name in preferred_columns() {
        if present.remove(name.as_str()) {
            columns.push(name);
        }
    }
    // BTreeSet iterates sorted
    columns.extend(present.into_iter().map(str::to_owned));
    columns
}

/// Flattens a row.
#[must_use]
pub fn encode(row: &Row) -> Record {
    let mut record = Record::new();
    let mut put = |name: &str, value: FieldValue| {
        record.insert(name.to_owned(), value);
    };

    put(SCHEMA, FieldValue::Int(ROW_SCHEMA_VERSION));
    put(SPLIT, FieldValue::Text(row.split.to_string()));
    put(SESSION, FieldValue::Text(row.session.clone()));
    put(T_SEC, FieldValue::Int(row.t_sec.into()));
    put(HORIZON_SEC, FieldValue::Int(row.horizon_sec.into()));
    put(GROUP_KEY, FieldValue::Text(row.context.group_key.clone()));
    put(GROUP_NAME, FieldValue::Text(row.context.group_name.clone()));
    for (i, value) in row.features.iter().enumerate() {
        put(column_name(i).as_str(), FieldValue::Float(value));
    }

    let t = &row.totals;
    let totals = [
        t.score,
        t.combo,
        t.misses,
        t.acc.into(),
        t.hit_good,
        t.hit_wrong,
        t.hit_junk,
        t.expire_good,
    ];
    for (name, value) in TOTAL_COLUMNS.into_iter().zip(totals) {
        put(name, FieldValue::Int(value));
    }

    let o = &row.model_outputs;
    for (name, value) in OUTPUT_COLUMNS
        .into_iter()
        .zip([o.risk01, o.p_miss_next5, o.p_score_drop_next5])
    {
        put(name, value.map_or(FieldValue::Empty, FieldValue::Float));
    }

    for (name, value) in &row.labels {
        put(name.as_str(), FieldValue::Int(*value));
    }
    record
}

/// Cell of a numeric or enumerated column; blank text counts as absent.
fn non_empty<'a>(record: &'a Record, name: &str) -> Option<&'a FieldValue> {
    record.get(name).filter(|v| !v.is_empty())
}

fn invalid_number(name: &str, value: &FieldValue) -> MalformedRowError {
    MalformedRowError::InvalidNumber {
        name: name.to_owned(),
        value: value.to_csv_field(),
    }
}

fn opt_i64(record: &Record, name: &str) -> Result<Option<i64>, MalformedRowError> {
    non_empty(record, name)
        .map(|v| v.as_i64().ok_or_else(|| invalid_number(name, v)))
        .transpose()
}

fn opt_f32(record: &Record, name: &str) -> Result<Option<f32>, MalformedRowError> {
    non_empty(record, name)
        .map(|v| {
            v.as_f32()
                .filter(|f| f.is_finite())
                .ok_or_else(|| invalid_number(name, v))
        })
        .transpose()
}

fn missing(name: &str) -> MalformedRowError {
    MalformedRowError::MissingField {
        name: name.to_owned(),
    }
}

fn opt_u32(record: &Record, name: &str) -> Result<Option<u32>, MalformedRowError> {
    opt_i64(record, name)?
        .map(|v| u32::try_from(v).map_err(|_| invalid_number(name, &FieldValue::Int(v))))
        .transpose()
}

fn text(record: &Record, name: &str) -> String {
    record
        .get(name)
        .map(FieldValue::to_csv_field)
        .unwrap_or_default()
}

/// Rebuilds a row from its flat form.
///
/// Feature values are clamped into range; optional columns may be absent or empty.
pub fn decode(record: &Record) -> Result<Row, MalformedRowError> {
    if let Some(version) = opt_i64(record, SCHEMA)?
        && version != ROW_SCHEMA_VERSION
    {
        return Err(MalformedRowError::UnsupportedSchema { version });
    }

    let split: Split = non_empty(record, SPLIT)
        .ok_or_else(|| missing(SPLIT))?
        .to_csv_field()
        .parse()
        .map_err(MalformedRowError::InvalidSplit)?;
    let t_sec = opt_u32(record, T_SEC)?.ok_or_else(|| missing(T_SEC))?;
    let horizon_sec = opt_u32(record, HORIZON_SEC)?.unwrap_or(FALLBACK_HORIZON_SEC);

    let mut features = [0.0; FEATURE_COUNT];
    for (i, slot) in features.iter_mut().enumerate() {
        let name = column_name(i);
        *slot = opt_f32(record, &name)?.ok_or_else(|| missing(&name))?;
    }

    let mut totals = [0; TOTAL_COLUMNS.len()];
    for (slot, name) in totals.iter_mut().zip(TOTAL_COLUMNS) {
        *slot = opt_i64(record, name)?.unwrap_or(0);
    }
    let [score, combo, misses, acc, hit_good, hit_wrong, hit_junk, expire_good] = totals;
    let acc = u8::try_from(acc.clamp(0, 100)).unwrap_or(0);

    let [risk01, p_miss_next5, p_score_drop_next5] =
        OUTPUT_COLUMNS.map(|name| opt_f32(record, name));

    let mut labels = BTreeMap::new();
    for name in record.keys().filter(|k| k.starts_with(LABEL_PREFIX)) {
        if let Some(value) = opt_i64(record, name)? {
            labels.insert(name.clone(), value);
        }
    }

    Ok(Row {
        split,
        session: text(record, SESSION),
        t_sec,
        horizon_sec,
        context: SampleContext {
            group_key: text(record, GROUP_KEY),
            group_name: text(record, GROUP_NAME),
        },
        features: FeatureVector::new(features),
        totals: CounterTotals {
            score,
            combo,
            misses,
            acc,
            hit_good,
            hit_wrong,
            hit_junk,
            expire_good,
        },
        model_outputs: ModelOutputs {
            risk01: risk01?,
            p_miss_next5: p_miss_next5?,
            p_score_drop_next5: p_score_drop_next5?,
        },
        labels,
    })
}

/// Rows read from an export plus the number of skipped malformed rows.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub rows: Vec<Row>,
    pub malformed: usize,
}

impl ImportOutcome {
    fn accept(&mut self, line: u64, result: Result<Row, MalformedRowError>) {
        match result {
            Ok(row) => self.rows.push(row),
            Err(e) => {
                tracing::warn!(line, error = %e, "skipping malformed row");
                self.malformed += 1;
            }
        }
    }
}

/// Writes one JSON object per row, each terminated by `\n`.
pub fn write_jsonl<'a, W>(writer: &mut W, rows: impl IntoIterator<Item = &'a Row>) -> io::Result<()>
where
    W: Write,
{
    for row in rows {
        serde_json::to_writer(&mut *writer, &encode(row))?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

fn decode_json_line(line: &str) -> Result<Row, MalformedRowError> {
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(line).map_err(MalformedRowError::InvalidJson)?;
    let mut record = Record::new();
    for (name, value) in object {
        let value = FieldValue::from_json(&name, value)?;
        record.insert(name, value);
    }
    decode(&record)
}

/// Reads JSON Lines, skipping blank lines.
pub fn read_jsonl<R>(reader: R) -> io::Result<ImportOutcome>
where
    R: BufRead,
{
    let mut outcome = ImportOutcome::default();
    for (number, line) in (1..).zip(reader.lines()) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        outcome.accept(number, decode_json_line(&line));
    }
    Ok(outcome)
}

/// Writes a header record followed by one record per row.
///
/// Nothing is written for an empty row set.
pub fn write_csv<'a, W>(writer: &mut W, rows: impl IntoIterator<Item = &'a Row>) -> io::Result<()>
where
    W: Write,
{
    let records: Vec<Record> = rows.into_iter().map(encode).collect();
    if records.is_empty() {
        return Ok(());
    }
    let columns = csv_columns(&records);
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&columns)?;
    for record in &records {
        csv_writer.write_record(columns.iter().map(|c| {
            record
                .get(c)
                .map(FieldValue::to_csv_field)
                .unwrap_or_default()
        }))?;
    }
    csv_writer.flush()
}

fn decode_csv_record(columns: &[String], record: &csv::StringRecord) -> Result<Row, MalformedRowError> {
    if record.len() != columns.len() {
        return Err(MalformedRowError::ColumnCount {
            expected: columns.len(),
            found: record.len(),
        });
    }
    let flat: Record = columns
        .iter()
        .zip(record)
        .map(|(name, field)| {
            let value = if field.is_empty() {
                FieldValue::Empty
            } else {
                FieldValue::Text(field.to_owned())
            };
            (name.clone(), value)
        })
        .collect();
    decode(&flat)
}

/// Reads a CSV export with a header record.
pub fn read_csv<R>(reader: R) -> io::Result<ImportOutcome>
where
    R: Read,
{
    // flexible: rows with a wrong field count are reported per row instead of aborting
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let columns: Vec<String> = csv_reader.headers()?.iter().map(str::to_owned).collect();

    let mut outcome = ImportOutcome::default();
    for result in csv_reader.records() {
        match result {
            Ok(record) => {
                let line = record.position().map_or(0, csv::Position::line);
                outcome.accept(line, decode_csv_record(&columns, &record));
            }
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                let line = e.position().map_or(0, csv::Position::line);
                outcome.accept(line, Err(MalformedRowError::InvalidCsv(e)));
            }
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(t_sec: u32, split: Split) -> Row {
        let mut features = [0.0; FEATURE_COUNT];
        let mut x = 0.0;
        for f in &mut features {
            *f = x;
            x += 0.025;
        }
        features[31] = 1.0;
        Row {
            split,
            session: "abc|42|groups".to_owned(),
            t_sec,
            horizon_sec: 5,
            context: SampleContext {
                group_key: "fruit".to_owned(),
                group_name: "Fruit, \"fresh\"".to_owned(),
            },
            features: FeatureVector::new(features),
            totals: CounterTotals {
                score: 350,
                combo: 4,
                misses: 2,
                acc: 77,
                ..CounterTotals::default()
            },
            model_outputs: ModelOutputs {
                p_miss_next5: Some(0.25),
                ..ModelOutputs::default()
            },
            labels: BTreeMap::from([
                ("y_missNext5".to_owned(), 1),
                ("y_scoreDropNext5".to_owned(), 0),
                ("y_scoreDelta".to_owned(), -15),
            ]),
        }
    }

    mod columns {
        use super::*;

        #[test]
        fn test_preferred_prefix_then_sorted_rest() {
            let records = [encode(&sample_row(1, Split::Train))];
            let columns = csv_columns(&records);
            assert_eq!(columns[..3], ["schema", "split", "session"]);
            assert_eq!(columns.last().map(String::as_str), Some("y_scoreDelta"));
            let f0 = columns.iter().position(|c| c == "f0").unwrap();
            assert_eq!(columns[f0 + 31], "f31");
        }

        #[test]
        fn test_union_across_rows() {
            let mut extra = sample_row(2, Split::Test);
            extra.labels.insert("y_comboDelta".to_owned(), 3);
            let records = [encode(&sample_row(1, Split::Train)), encode(&extra)];
            let columns = csv_columns(&records);
            let combo = columns.iter().position(|c| c == "y_comboDelta").unwrap();
            let score = columns.iter().position(|c| c == "y_scoreDelta").unwrap();
            assert!(combo < score);
        }
    }

    mod jsonl {
        use super::*;

        #[test]
        fn test_round_trip() {
            let rows = vec![sample_row(3, Split::Train), sample_row(4, Split::Val)];
            let mut buf = vec![];
            write_jsonl(&mut buf, &rows).unwrap();
            let outcome = read_jsonl(buf.as_slice()).unwrap();
            assert_eq!(outcome.malformed, 0);
            assert_eq!(outcome.rows, rows);
        }

        #[test]
        fn test_whitespace_text_round_trips() {
            let mut row = sample_row(3, Split::Train);
            row.session = "  ".to_owned();
            row.context.group_key = "\t".to_owned();
            row.context.group_name = " ".to_owned();
            let mut buf = vec![];
            write_jsonl(&mut buf, [&row]).unwrap();
            let outcome = read_jsonl(buf.as_slice()).unwrap();
            assert_eq!(outcome.rows, [row]);
        }

        #[test]
        fn test_malformed_lines_are_skipped() {
            let mut buf = vec![];
            write_jsonl(&mut buf, &[sample_row(3, Split::Train)]).unwrap();
            buf.extend_from_slice(b"{not json\n\n{\"split\":\"train\"}\n");
            let outcome = read_jsonl(buf.as_slice()).unwrap();
            assert_eq!(outcome.rows.len(), 1);
            assert_eq!(outcome.malformed, 2);
        }

        #[test]
        fn test_unsupported_schema() {
            let mut record = encode(&sample_row(3, Split::Train));
            record.insert(SCHEMA.to_owned(), FieldValue::Int(2));
            assert!(matches!(
                decode(&record),
                Err(MalformedRowError::UnsupportedSchema { version: 2 })
            ));
        }
    }

    mod csv_format {
        use super::*;

        #[test]
        fn test_round_trip() {
            let rows = vec![sample_row(3, Split::Train), sample_row(9, Split::Test)];
            let mut buf = vec![];
            write_csv(&mut buf, &rows).unwrap();
            let outcome = read_csv(buf.as_slice()).unwrap();
            assert_eq!(outcome.malformed, 0);
            assert_eq!(outcome.rows, rows);
        }

        #[test]
        fn test_whitespace_and_multiline_text_round_trips() {
            let mut row = sample_row(3, Split::Val);
            row.session = "  ".to_owned();
            row.context.group_key = " key ".to_owned();
            row.context.group_name = "two\nlines, \"quoted\"".to_owned();
            let rows = vec![row, sample_row(4, Split::Val)];
            let mut buf = vec![];
            write_csv(&mut buf, &rows).unwrap();
            let outcome = read_csv(buf.as_slice()).unwrap();
            assert_eq!(outcome.malformed, 0);
            assert_eq!(outcome.rows, rows);
        }

        #[test]
        fn test_wrong_column_count_is_malformed() {
            let mut buf = vec![];
            write_csv(&mut buf, &[sample_row(3, Split::Train)]).unwrap();
            buf.extend_from_slice(b"train,1,2\n");
            let outcome = read_csv(buf.as_slice()).unwrap();
            assert_eq!(outcome.rows.len(), 1);
            assert_eq!(outcome.malformed, 1);
        }

        #[test]
        fn test_empty_input() {
            let outcome = read_csv(&b""[..]).unwrap();
            assert!(outcome.rows.is_empty());
            let mut buf = vec![];
            write_csv(&mut buf, &Vec::new()).unwrap();
            assert!(buf.is_empty());
        }
    }
}
