use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, warn};
use masp_api::types::{EpochRecord, MaspEpoch};
use thiserror::Error;

const EPOCH_COLUMNS: [&str; 2] = ["epoch_number", "masp_epoch"];

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Cannot append to {}: unrecognised columns [{header}]", .path.display())]
    Layout { path: PathBuf, header: String },
}

/// A directory of append-only CSV files holding the collected history.
///
/// Runs against the same directory must not overlap: the cursor is read
/// once at the start of a run, so two concurrent runs would both append the
/// epochs above it.
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file a run appends to by default: one per UTC day.
    pub fn default_file(&self) -> PathBuf {
        self.dir.join(format!("{}.csv", Utc::now().format("%Y-%m-%d")))
    }

    /// All CSV files in the directory, sorted by name.
    pub fn files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

            if is_csv && path.is_file() {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Highest epoch present in any file, or `None` for an empty dataset.
    ///
    /// Rows with a missing or unparsable epoch are skipped.
    pub fn scan_cursor(&self) -> Result<Option<MaspEpoch>, StoreError> {
        let mut highest = None;

        for path in self.files()? {
            let found = scan_file(&path)?;
            debug!("Highest MASP epoch in {}: {:?}", path.display(), found);
            highest = highest.max(found);
        }

        Ok(highest)
    }

    /// Reads every record of every file, in file order.
    pub fn read_records(&self) -> Result<Vec<EpochRecord>, StoreError> {
        let mut records = Vec::new();

        for path in self.files()? {
            let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(&path)?;

            for (line, row) in reader.deserialize::<EpochRecord>().enumerate() {
                match row {
                    Ok(record) => records.push(record),
                    Err(e) => warn!("Skipping row {} of {}: {}", line + 1, path.display(), e),
                }
            }
        }

        Ok(records)
    }

    /// Opens `path`, or the default file, for appending.
    pub fn writer(&self, path: Option<PathBuf>) -> Result<HistoryWriter, StoreError> {
        HistoryWriter::open(path.unwrap_or_else(|| self.default_file()))
    }
}

/// A column of the history files, with the legacy names it is also read under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Epoch,
    Token,
    Inflation,
    Locked,
    Height,
    Timestamp,
}

impl Column {
    const ALL: [Column; 6] = [
        Column::Epoch,
        Column::Token,
        Column::Inflation,
        Column::Locked,
        Column::Height,
        Column::Timestamp,
    ];

    const REQUIRED: [Column; 4] = [Column::Epoch, Column::Token, Column::Inflation, Column::Locked];

    fn name(self) -> &'static str {
        match self {
            Column::Epoch => "epoch_number",
            Column::Token => "token_id",
            Column::Inflation => "last_inflation",
            Column::Locked => "last_locked",
            Column::Height => "height",
            Column::Timestamp => "timestamp",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "epoch_number" | "masp_epoch" => Some(Column::Epoch),
            "token_id" | "token_address" => Some(Column::Token),
            "last_inflation" => Some(Column::Inflation),
            "last_locked" => Some(Column::Locked),
            "height" => Some(Column::Height),
            "timestamp" => Some(Column::Timestamp),
            _ => None,
        }
    }

    fn value(self, record: &EpochRecord) -> String {
        match self {
            Column::Epoch => record.epoch_number.to_string(),
            Column::Token => record.token_id.clone(),
            Column::Inflation => record.last_inflation.to_string(),
            Column::Locked => record.last_locked.to_string(),
            Column::Height => record.height.map(|h| h.to_string()).unwrap_or_default(),
            Column::Timestamp => record.timestamp.clone().unwrap_or_default(),
        }
    }
}

/// Maps an existing header onto known columns, or `None` if any column is
/// unknown, repeated, or a required one is absent.
fn parse_header(header: &csv::StringRecord) -> Option<Vec<Column>> {
    let columns: Vec<Column> = header.iter().map(Column::parse).collect::<Option<_>>()?;

    let unique: HashSet<_> = columns.iter().map(|c| c.name()).collect();
    if unique.len() != columns.len() || !Column::REQUIRED.iter().all(|c| columns.contains(c)) {
        return None;
    }

    Some(columns)
}

/// Appends records to a single CSV file.
///
/// The file is created on the first append. When it already has rows, new
/// rows follow its existing column order, legacy column names included.
pub struct HistoryWriter {
    path: PathBuf,
    columns: Vec<Column>,
    inner: Option<csv::Writer<File>>,
}

impl HistoryWriter {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let has_rows = fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);
        let columns = if has_rows {
            let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(&path)?;
            let header = reader.headers()?.clone();

            parse_header(&header).ok_or_else(|| StoreError::Layout {
                path: path.clone(),
                header: header.iter().collect::<Vec<_>>().join(","),
            })?
        } else {
            Column::ALL.to_vec()
        };

        Ok(Self { path, columns, inner: None })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the records and flushes them to disk.
    pub fn append(&mut self, records: &[EpochRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let writer = match self.inner.take() {
            Some(writer) => writer,
            None => Self::create(&self.path, &self.columns)?,
        };
        let writer = self.inner.insert(writer);

        for record in records {
            writer.write_record(self.columns.iter().map(|c| c.value(record)))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn create(path: &Path, columns: &[Column]) -> Result<csv::Writer<File>, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if is_empty {
            writer.write_record(columns.iter().map(|c| c.name()))?;
        }

        Ok(writer)
    }
}

/// Drops repeated `(epoch_number, token_id)` keys, keeping the first
/// occurrence, and orders the result by epoch then token.
///
/// Rows of one key from different runs agree on [`EpochRecord::values`];
/// their `height` and `timestamp` may differ when an epoch was still open
/// during one of the runs.
pub fn dedup_records<I>(records: I) -> Vec<EpochRecord>
where
    I: IntoIterator<Item = EpochRecord>,
{
    let mut seen = HashSet::new();
    let mut unique: Vec<EpochRecord> = records
        .into_iter()
        .filter(|r| seen.insert((r.epoch_number, r.token_id.clone())))
        .collect();

    unique.sort_by(|a, b| a.key().cmp(&b.key()));
    unique
}

/// Writes `records` to a fresh file at `path`, replacing any existing one.
pub fn write_records<P: AsRef<Path>>(path: P, records: &[EpochRecord]) -> Result<(), StoreError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn scan_file(path: &Path) -> Result<Option<MaspEpoch>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let Some(column) = reader
        .headers()?
        .iter()
        .position(|h| EPOCH_COLUMNS.contains(&h.trim()))
    else {
        warn!("No epoch column in {}, skipping", path.display());
        return Ok(None);
    };

    let mut highest = None;
    for row in reader.records() {
        let row = row?;
        match row.get(column).and_then(|v| v.trim().parse::<MaspEpoch>().ok()) {
            Some(epoch) => highest = highest.max(Some(epoch)),
            None => debug!("Skipping row without a valid epoch in {}", path.display()),
        }
    }

    Ok(highest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn setup_store() -> Result<(HistoryStore, TempDir), StoreError> {
        let temp_dir = TempDir::new("masp_history_test")?;
        let store = HistoryStore::new(temp_dir.path())?;
        Ok((store, temp_dir))
    }

    fn record(epoch: MaspEpoch, token: &str, inflation: u128) -> EpochRecord {
        EpochRecord {
            epoch_number: epoch,
            token_id: token.to_string(),
            last_inflation: inflation,
            last_locked: inflation * 10,
            height: Some(1_000 + epoch),
            timestamp: Some("2025-01-01T00:00:00Z".to_string()),
        }
    }

    #[test]
    fn test_empty_store_has_no_cursor() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;
        assert_eq!(store.scan_cursor()?, None);
        assert!(store.read_records()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_append_and_scan() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;
        let path = store.dir().join("run.csv");

        let mut writer = store.writer(Some(path.clone()))?;
        writer.append(&[record(11, "A", 1), record(11, "B", 2)])?;
        writer.append(&[record(12, "A", 3), record(12, "B", 4)])?;
        drop(writer);

        // Reopening appends without a second header
        let mut writer = store.writer(Some(path.clone()))?;
        writer.append(&[record(13, "A", 5)])?;
        drop(writer);

        let contents = fs::read_to_string(&path)?;
        assert_eq!(contents.matches("epoch_number").count(), 1);

        assert_eq!(store.scan_cursor()?, Some(13));
        let records = store.read_records()?;
        assert_eq!(records.len(), 5);
        assert_eq!(records[4], record(13, "A", 5));
        Ok(())
    }

    #[test]
    fn test_cursor_spans_files_and_legacy_layout() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;

        fs::write(
            store.dir().join("2025-01-01.csv"),
            "height,timestamp,masp_epoch,token_address,last_inflation,last_locked\n\
             100,2025-01-01T00:00:00Z,41,tnam1a,5,50\n\
             200,2025-01-02T00:00:00Z,not-a-number,tnam1a,6,60\n",
        )?;
        fs::write(
            store.dir().join("2025-01-02.csv"),
            "epoch_number,token_id,last_inflation,last_locked,height,timestamp\n\
             40,tnam1a,1,10,,\n",
        )?;
        fs::write(store.dir().join("notes.txt"), "epoch_number\n99\n")?;

        assert_eq!(store.scan_cursor()?, Some(41));

        let records = store.read_records()?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].epoch_number, 41);
        assert_eq!(records[0].token_id, "tnam1a");
        assert_eq!(records[0].height, Some(100));
        assert_eq!(records[1].height, None);
        Ok(())
    }

    #[test]
    fn test_append_follows_legacy_header() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;
        let path = store.dir().join("2025-01-01.csv");

        fs::write(
            &path,
            "height,timestamp,masp_epoch,token_address,last_inflation,last_locked\n\
             1100,2025-01-01T00:00:00Z,10,A,10001,10000000\n",
        )?;

        let mut writer = store.writer(Some(path.clone()))?;
        writer.append(&[record(11, "A", 11_001)])?;
        drop(writer);

        let contents = fs::read_to_string(&path)?;
        assert!(contents.ends_with("1011,2025-01-01T00:00:00Z,11,A,11001,110010\n"));

        assert_eq!(store.scan_cursor()?, Some(11));
        let records = store.read_records()?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], record(11, "A", 11_001));
        Ok(())
    }

    #[test]
    fn test_refuses_unknown_header() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;
        let path = store.dir().join("other.csv");
        fs::write(&path, "epoch,token,amount\n1,A,5\n")?;

        let result = store.writer(Some(path.clone()));
        assert!(matches!(result, Err(StoreError::Layout { .. })));
        assert_eq!(fs::read_to_string(&path)?, "epoch,token,amount\n1,A,5\n");
        Ok(())
    }

    #[test]
    fn test_file_created_on_first_append() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;
        let path = store.dir().join("lazy.csv");

        let mut writer = store.writer(Some(path.clone()))?;
        writer.append(&[])?;
        assert!(!path.exists());
        assert!(store.files()?.is_empty());

        writer.append(&[record(5, "A", 1)])?;
        assert!(path.exists());
        assert_eq!(store.scan_cursor()?, Some(5));
        Ok(())
    }

    #[test]
    fn test_dedup_records() {
        let merged = vec![
            record(12, "B", 4),
            record(11, "A", 1),
            record(12, "B", 99),
            record(11, "B", 2),
            record(11, "A", 1),
        ];

        let unique = dedup_records(merged);
        let keys: Vec<_> = unique.iter().map(|r| (r.epoch_number, r.token_id.as_str())).collect();
        assert_eq!(keys, vec![(11, "A"), (11, "B"), (12, "B")]);

        // First occurrence wins
        assert_eq!(unique[2].last_inflation, 4);
    }

    #[test]
    fn test_write_records_replaces_file() -> Result<(), StoreError> {
        let (store, _temp_dir) = setup_store()?;
        let path = store.dir().join("compact.csv");

        write_records(&path, &[record(1, "A", 1), record(2, "A", 2)])?;
        write_records(&path, &[record(3, "A", 3)])?;

        assert_eq!(store.scan_cursor()?, Some(3));
        assert_eq!(store.read_records()?.len(), 1);
        Ok(())
    }
}
