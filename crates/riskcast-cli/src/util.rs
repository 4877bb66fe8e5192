use std::{
    fs::File,
    io::{self, BufReader, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use riskcast_collector::store::{DatasetStore, ImportReport};
use tracing_subscriber::EnvFilter;

/// Installs the log subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.finish()
    }

    /// Writes one compact JSON value followed by a newline.
    pub fn write_json_line<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer(&mut *self, value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self)
            .with_context(|| format!("Failed to write to {}", self.display_path()))
    }

    pub fn finish(&mut self) -> anyhow::Result<()> {
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;
    Ok(value)
}

/// On-disk dataset encoding.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub enum DatasetFormat {
    #[default]
    Jsonl,
    Csv,
}

impl DatasetFormat {
    /// Guesses the format from the file extension; anything but `.csv` is JSON Lines.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => DatasetFormat::Csv,
            _ => DatasetFormat::Jsonl,
        }
    }
}

/// Reads a dataset file into a store of the given capacity.
pub fn load_dataset(
    path: &Path,
    format: Option<DatasetFormat>,
    capacity: usize,
) -> anyhow::Result<(DatasetStore, ImportReport)> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open dataset file: {}", path.display()))?;
    let mut store = DatasetStore::new(capacity);
    let report = match format.unwrap_or_else(|| DatasetFormat::from_path(path)) {
        DatasetFormat::Jsonl => store.import_jsonl(BufReader::new(file)),
        DatasetFormat::Csv => store.import_csv(BufReader::new(file)),
    }
    .with_context(|| format!("Failed to read dataset file: {}", path.display()))?;
    if report.malformed > 0 {
        tracing::warn!(
            malformed = report.malformed,
            path = %path.display(),
            "skipped malformed rows"
        );
    }
    Ok((store, report))
}

/// Writes `store` to `output` in the given format.
pub fn write_dataset(
    store: &DatasetStore,
    output: &mut Output,
    format: DatasetFormat,
) -> anyhow::Result<()> {
    match format {
        DatasetFormat::Jsonl => store.export_jsonl(output),
        DatasetFormat::Csv => store.export_csv(output),
    }
    .with_context(|| format!("Failed to write dataset to {}", output.display_path()))?;
    output.finish()
}
