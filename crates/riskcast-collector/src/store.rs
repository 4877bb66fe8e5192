//! Capacity-bounded, append-only dataset of labeled rows.
//!
//! The store is a FIFO ring: appending beyond capacity evicts the oldest row. Rows are
//! never modified in place; [`DatasetStore::clear`] is the only other way rows leave.
//!
//! Persistence is explicit. [`DatasetStore::save`] writes JSON Lines to a temporary
//! sibling file and renames it over the target, so an interrupted save leaves the
//! previous file intact.

use std::{
    collections::{BTreeMap, VecDeque},
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    row::{
        Row,
        codec::{self, ImportOutcome},
    },
    split::Split,
};

/// Result of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: usize,
    pub malformed: usize,
    /// Rows (old or newly imported) pushed out by the capacity limit.
    pub evicted: usize,
}

#[derive(Debug, Clone)]
pub struct DatasetStore {
    capacity: usize,
    rows: VecDeque<Row>,
    evicted: u64,
}

impl DatasetStore {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            rows: VecDeque::new(),
            evicted: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total rows evicted since creation.
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Appends a row, returning the evicted oldest row if the store was full.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::collections::BTreeMap;
    /// # use riskcast_collector::{feature::FeatureVector, row::{CounterTotals, Row}, split::Split};
    /// # use riskcast_collector::pending::{ModelOutputs, SampleContext};
    /// use riskcast_collector::store::DatasetStore;
    ///
    /// # let row = |t_sec| Row {
    /// #     split: Split::Train, session: String::new(), t_sec, horizon_sec: 5,
    /// #     context: SampleContext::default(), features: FeatureVector::default(),
    /// #     totals: CounterTotals::default(), model_outputs: ModelOutputs::default(),
    /// #     labels: BTreeMap::new(),
    /// # };
    /// let mut store = DatasetStore::new(2);
    /// assert!(store.append(row(0)).is_none());
    /// assert!(store.append(row(1)).is_none());
    /// assert_eq!(store.append(row(2)).map(|r| r.t_sec), Some(0));
    /// assert_eq!(store.len(), 2);
    /// ```
    pub fn append(&mut self, row: Row) -> Option<Row> {
        let evicted = if self.rows.len() >= self.capacity {
            self.evicted += 1;
            self.rows.pop_front()
        } else {
            None
        };
        self.rows.push_back(row);
        evicted
    }

    /// Appends rows in order, returning how many were evicted.
    pub fn extend(&mut self, rows: impl IntoIterator<Item = Row>) -> usize {
        rows.into_iter()
            .filter_map(|row| self.append(row))
            .count()
    }

    /// Owned copy of the current rows, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Row> {
        self.rows.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn export_jsonl<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        codec::write_jsonl(writer, &self.rows)
    }

    pub fn export_csv<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        codec::write_csv(writer, &self.rows)
    }

    fn absorb(&mut self, outcome: ImportOutcome) -> ImportReport {
        let imported = outcome.rows.len();
        let evicted = self.extend(outcome.rows);
        ImportReport {
            imported,
            malformed: outcome.malformed,
            evicted,
        }
    }

    /// Appends every well-formed row of a JSON Lines export.
    pub fn import_jsonl<R>(&mut self, reader: R) -> io::Result<ImportReport>
    where
        R: io::BufRead,
    {
        Ok(self.absorb(codec::read_jsonl(reader)?))
    }

    /// Appends every well-formed row of a CSV export.
    pub fn import_csv<R>(&mut self, reader: R) -> io::Result<ImportReport>
    where
        R: Read,
    {
        Ok(self.absorb(codec::read_csv(reader)?))
    }

    /// Loads a JSON Lines file into a new store. A missing file yields an empty store.
    pub fn load(path: &Path, capacity: usize) -> io::Result<(Self, ImportReport)> {
        let mut store = Self::new(capacity);
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok((store, ImportReport::default()));
            }
            Err(e) => return Err(e),
        };
        let report = store.import_jsonl(BufReader::new(file))?;
        Ok((store, report))
    }

    /// Writes the store as JSON Lines, atomically replacing `path`.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let tmp = temp_path(path);
        if let Err(e) = self.write_file(&tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, path)
    }

    fn write_file(&self, path: &Path) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.export_jsonl(&mut writer)?;
        let file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
        file.sync_all()
    }

    #[must_use]
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary::new(self.rows.iter())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Row counts per split and positive counts per label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub rows: usize,
    pub splits: BTreeMap<Split, usize>,
    /// Rows whose label value is `> 0`, per label name.
    pub positives: BTreeMap<String, usize>,
    /// Rows carrying each label.
    pub labeled: BTreeMap<String, usize>,
}

impl DatasetSummary {
    pub fn new<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Self {
        let mut summary = Self::default();
        for row in rows {
            summary.rows += 1;
            *summary.splits.entry(row.split).or_default() += 1;
            for (name, value) in &row.labels {
                *summary.labeled.entry(name.clone()).or_default() += 1;
                if *value > 0 {
                    *summary.positives.entry(name.clone()).or_default() += 1;
                }
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        feature::FeatureVector,
        pending::{ModelOutputs, SampleContext},
        row::CounterTotals,
    };

    fn row(t_sec: u32, split: Split, miss: i64) -> Row {
        Row {
            split,
            session: format!("s{t_sec}|1|groups"),
            t_sec,
            horizon_sec: 5,
            context: SampleContext::default(),
            features: FeatureVector::default(),
            totals: CounterTotals::default(),
            model_outputs: ModelOutputs::default(),
            labels: BTreeMap::from([("y_missNext5".to_owned(), miss)]),
        }
    }

    #[test]
    fn test_cap_keeps_most_recent_in_order() {
        let mut store = DatasetStore::new(50);
        let evicted = store.extend((0..57).map(|t| row(t, Split::Train, 0)));
        assert_eq!(evicted, 7);
        assert_eq!(store.len(), 50);
        assert_eq!(store.evicted(), 7);
        let times: Vec<_> = store.iter().map(|r| r.t_sec).collect();
        let expected: Vec<u32> = (7..57).collect();
        assert_eq!(times, expected);
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let mut store = DatasetStore::new(10);
        store.append(row(1, Split::Train, 1));
        let copy = store.snapshot();
        store.clear();
        assert_eq!(copy.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut store = DatasetStore::new(10);
        store.extend([row(1, Split::Train, 1), row(2, Split::Val, 0)]);

        let mut jsonl = vec![];
        store.export_jsonl(&mut jsonl).unwrap();
        let mut from_jsonl = DatasetStore::new(10);
        let report = from_jsonl.import_jsonl(jsonl.as_slice()).unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(from_jsonl.snapshot(), store.snapshot());

        let mut csv = vec![];
        store.export_csv(&mut csv).unwrap();
        let mut from_csv = DatasetStore::new(1);
        let report = from_csv.import_csv(csv.as_slice()).unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.evicted, 1);
        assert_eq!(from_csv.snapshot(), store.snapshot()[1..]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("riskcast-store-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dataset.jsonl");

        let mut store = DatasetStore::new(10);
        store.extend([row(1, Split::Train, 1), row(2, Split::Test, 0)]);
        store.save(&path).unwrap();
        assert!(!temp_path(&path).exists());

        let (loaded, report) = DatasetStore::load(&path, 10).unwrap();
        assert_eq!(report.malformed, 0);
        assert_eq!(loaded.snapshot(), store.snapshot());

        let (empty, _) = DatasetStore::load(&dir.join("missing.jsonl"), 10).unwrap();
        assert!(empty.is_empty());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_summary_counts() {
        let rows = [
            row(1, Split::Train, 1),
            row(2, Split::Train, 0),
            row(3, Split::Val, 2),
        ];
        let summary = DatasetSummary::new(&rows);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.splits[&Split::Train], 2);
        assert_eq!(summary.positives["y_missNext5"], 2);
        assert_eq!(summary.labeled["y_missNext5"], 3);
    }
}
