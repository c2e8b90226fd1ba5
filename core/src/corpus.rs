//! Loads `(title, text)` pairs from JSON Lines or JSON files.

use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{IndexError, Result};

#[derive(Debug, Deserialize)]
struct InputDoc {
    title: String,
    #[serde(alias = "body")]
    text: String,
}

/// A document that could not be parsed and was left out of the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: PathBuf,
    /// `line N` for JSON Lines, `element N` for JSON arrays (1-based).
    pub location: String,
    pub reason: String,
}

#[derive(Debug, Default, Clone)]
pub struct IngestReport {
    pub files: usize,
    pub skipped: Vec<SkippedDocument>,
}

#[derive(Debug, Default)]
pub struct Corpus {
    pub pairs: Vec<(String, String)>,
    pub report: IngestReport,
}

impl Corpus {
    fn skip(&mut self, path: &Path, location: String, reason: impl ToString) {
        let reason = reason.to_string();
        tracing::warn!(path = %path.display(), %location, %reason, "skipping malformed document");
        self.report.skipped.push(SkippedDocument { path: path.to_path_buf(), location, reason });
    }
}

/// Reads one corpus file, or every `.json`/`.jsonl` file below a directory
/// in file-name order.
pub fn read_corpus<P: AsRef<Path>>(input: P) -> Result<Corpus> {
    let input = input.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = entry.map_err(|e| IndexError::ingest(input, e))?;
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        return Err(IndexError::ingest(input, "no such file or directory"));
    }

    let mut corpus = Corpus::default();
    for file in files {
        if extension(&file) == Some("jsonl") {
            read_jsonl(&file, &mut corpus)?;
        } else {
            read_json(&file, &mut corpus)?;
        }
        corpus.report.files += 1;
    }
    tracing::info!(
        documents = corpus.pairs.len(),
        skipped = corpus.report.skipped.len(),
        files = corpus.report.files,
        "read corpus"
    );
    Ok(corpus)
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}

fn read_jsonl(file: &Path, corpus: &mut Corpus) -> Result<()> {
    let f = File::open(file).map_err(|e| IndexError::ingest(file, e))?;
    let reader = BufReader::new(f);
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| IndexError::ingest(file, e))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<InputDoc>(&line) {
            Ok(doc) => corpus.pairs.push((doc.title, doc.text)),
            Err(e) => corpus.skip(file, format!("line {}", i + 1), e),
        }
    }
    Ok(())
}

fn read_json(file: &Path, corpus: &mut Corpus) -> Result<()> {
    let f = File::open(file).map_err(|e| IndexError::ingest(file, e))?;
    let json: serde_json::Value =
        serde_json::from_reader(BufReader::new(f)).map_err(|e| IndexError::ingest(file, e))?;
    match json {
        serde_json::Value::Array(arr) => {
            for (i, v) in arr.into_iter().enumerate() {
                match serde_json::from_value::<InputDoc>(v) {
                    Ok(doc) => corpus.pairs.push((doc.title, doc.text)),
                    Err(e) => corpus.skip(file, format!("element {}", i + 1), e),
                }
            }
        }
        serde_json::Value::Object(_) => match serde_json::from_value::<InputDoc>(json) {
            Ok(doc) => corpus.pairs.push((doc.title, doc.text)),
            Err(e) => corpus.skip(file, "element 1".to_string(), e),
        },
        _ => return Err(IndexError::ingest(file, "expected a JSON object or array")),
    }
    Ok(())
}
