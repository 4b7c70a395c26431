//! Labeled chat-text corpus and its CSV/TSV reader.
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Label value for messages exhibiting grooming patterns.
pub const GROOMING: u8 = 1;
/// Label value for ordinary messages.
pub const NORMAL: u8 = 0;

/// Source name reported for corpora built in memory rather than read from disk.
const IN_MEMORY: &str = "<in-memory>";

/// One labeled chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub text: String,
    pub label: u8,
}

impl Sample {
    /// Build a sample, rejecting empty text and non-binary labels.
    pub fn new(text: impl Into<String>, label: u8) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::data_load(IN_MEMORY, "sample text must not be empty"));
        }
        if label != GROOMING && label != NORMAL {
            return Err(Error::data_load(
                IN_MEMORY,
                format!("sample label must be 0 or 1, got {}", label),
            ));
        }
        Ok(Self { text, label })
    }
}

/// Ordered, immutable collection of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    samples: Vec<Sample>,
}

impl Corpus {
    pub(crate) fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Build a corpus from parallel text/label slices.
    pub fn from_pairs<S: AsRef<str>>(texts: &[S], labels: &[u8]) -> Result<Self> {
        if texts.len() != labels.len() {
            return Err(Error::data_load(
                IN_MEMORY,
                format!("{} texts but {} labels", texts.len(), labels.len()),
            ));
        }
        let samples = texts
            .iter()
            .zip(labels)
            .map(|(text, &label)| Sample::new(text.as_ref(), label))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn texts(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn labels(&self) -> Vec<u8> {
        self.samples.iter().map(|s| s.label).collect()
    }

    /// Texts at the given positions, in the order given.
    pub fn texts_at(&self, indices: &[usize]) -> Vec<&str> {
        indices.iter().map(|&i| self.samples[i].text.as_str()).collect()
    }

    /// Labels at the given positions, in the order given.
    pub fn labels_at(&self, indices: &[usize]) -> Vec<u8> {
        indices.iter().map(|&i| self.samples[i].label).collect()
    }

    /// (normal, grooming) counts.
    pub fn class_counts(&self) -> (usize, usize) {
        let grooming = self.samples.iter().filter(|s| s.label == GROOMING).count();
        (self.samples.len() - grooming, grooming)
    }

    pub fn log_summary(&self) {
        let (normal, grooming) = self.class_counts();
        log::info!(
            "Corpus holds {} samples: {} grooming, {} normal",
            self.len(),
            grooming,
            normal
        );
    }
}

/// Column names and parsing options for the corpus reader.
#[derive(Debug, Clone)]
pub struct CorpusReaderConfig {
    pub text_column: String,
    pub label_column: String,
    /// Overrides the delimiter inferred from the file extension.
    pub delimiter: Option<u8>,
}

impl Default for CorpusReaderConfig {
    fn default() -> Self {
        Self {
            text_column: "text".to_string(),
            label_column: "label".to_string(),
            delimiter: None,
        }
    }
}

/// Read a labeled corpus using the default `text`/`label` columns.
pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Corpus> {
    load_corpus(path, &CorpusReaderConfig::default())
}

/// Read a labeled corpus from a delimited file with a header row.
pub fn load_corpus<P: AsRef<Path>>(
    path: P,
    config: &CorpusReaderConfig,
) -> Result<Corpus> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::data_load(path, "file does not exist"));
    }

    let delimiter = config.delimiter.unwrap_or_else(|| infer_delimiter(path));
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| Error::data_load(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| Error::data_load(path, format!("failed to read header row: {}", e)))?
        .clone();

    let text_idx = find_column(&headers, &config.text_column).ok_or_else(|| {
        Error::data_load(path, format!("missing required column '{}'", config.text_column))
    })?;
    let label_idx = find_column(&headers, &config.label_column).ok_or_else(|| {
        Error::data_load(path, format!("missing required column '{}'", config.label_column))
    })?;

    let mut samples = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = row_idx + 2;
        let record =
            result.map_err(|e| Error::data_load(path, format!("malformed row {}: {}", line, e)))?;

        let text = record
            .get(text_idx)
            .ok_or_else(|| Error::data_load(path, format!("missing text at row {}", line)))?;
        if text.trim().is_empty() {
            return Err(Error::data_load(path, format!("empty text at row {}", line)));
        }

        let raw_label = record
            .get(label_idx)
            .ok_or_else(|| Error::data_load(path, format!("missing label at row {}", line)))?;
        let label = parse_label(raw_label).ok_or_else(|| {
            Error::data_load(
                path,
                format!("label '{}' at row {} is not 0 or 1", raw_label.trim(), line),
            )
        })?;

        samples.push(Sample {
            text: text.to_string(),
            label,
        });
    }

    if samples.is_empty() {
        return Err(Error::data_load(path, "file contains no samples"));
    }

    log::debug!("Read {} samples from {}", samples.len(), path.display());
    Ok(Corpus::new(samples))
}

fn infer_delimiter(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .as_deref()
    {
        Some("tsv") => b'\t',
        _ => b',',
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

fn parse_label(value: &str) -> Option<u8> {
    match value.trim() {
        "0" => Some(NORMAL),
        "1" => Some(GROOMING),
        _ => None,
    }
}
