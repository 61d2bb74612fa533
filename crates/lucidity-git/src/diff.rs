//! Unified diff parsing.
//!
//! [`parse_diff`] walks `git diff` output once and groups it per file. Each
//! [`DiffRecord`] keeps the metadata/hunk headers, the hunk body, and the raw
//! block it came from. [`extract_code`] then splits a hunk body into the
//! pre-image and post-image text.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const FILE_HEADER: &str = "diff --git ";

/// How a file changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    #[default]
    Modified,
    Added,
    Deleted,
    Renamed,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Modified => write!(f, "modified"),
            FileStatus::Added => write!(f, "added"),
            FileStatus::Deleted => write!(f, "deleted"),
            FileStatus::Renamed => write!(f, "renamed"),
        }
    }
}

/// Parsed diff for one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    pub status: FileStatus,
    /// `diff --git` line, metadata lines and `@@` hunk headers, newline-joined
    pub header: String,
    /// Hunk body lines (`+`, `-` or space prefixed), newline-joined
    pub content: String,
    /// Every line of this file's block, each newline-terminated
    pub raw_diff: String,
}

impl DiffRecord {
    pub fn extract_code(&self) -> CodeChangePair {
        extract_code(self)
    }

    pub fn content_lines(&self) -> impl Iterator<Item = &str> {
        self.content.lines()
    }
}

/// Per-file records keyed by post-image path, in diff order
pub type FileDiffs = IndexMap<String, DiffRecord>;

/// Original and modified code recovered from a hunk body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChangePair {
    pub original: String,
    pub modified: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Before the first file header
    Idle,
    /// Between `diff --git` and the first `@@`
    Metadata,
    InHunk,
}

/// Lines gathered for the file currently being read
#[derive(Default)]
struct OpenRecord<'a> {
    path: String,
    status: FileStatus,
    header: Vec<&'a str>,
    content: Vec<&'a str>,
    raw: Vec<&'a str>,
}

impl<'a> OpenRecord<'a> {
    fn new(path: String, header_line: &'a str) -> Self {
        Self {
            path,
            header: vec![header_line],
            raw: vec![header_line],
            ..Default::default()
        }
    }

    fn push_header(&mut self, line: &'a str) {
        self.header.push(line);
        self.raw.push(line);
    }

    fn push_content(&mut self, line: &'a str) {
        self.content.push(line);
        self.raw.push(line);
    }

    fn close(self, files: &mut FileDiffs) {
        let mut raw_diff = String::new();
        for line in &self.raw {
            raw_diff.push_str(line);
            raw_diff.push('\n');
        }

        let record = DiffRecord {
            status: self.status,
            header: self.header.join("\n"),
            content: self.content.join("\n"),
            raw_diff,
        };

        // The same path can show up twice when unstaged and staged diffs are
        // concatenated; keep both blocks rather than dropping one.
        match files.get_mut(&self.path) {
            Some(existing) => {
                debug!(path = %self.path, "Merging repeated diff block");
                if record.status != FileStatus::Modified {
                    existing.status = record.status;
                }
                append_joined(&mut existing.header, &record.header);
                append_joined(&mut existing.content, &record.content);
                existing.raw_diff.push_str(&record.raw_diff);
            }
            None => {
                files.insert(self.path, record);
            }
        }
    }
}

fn append_joined(target: &mut String, addition: &str) {
    if addition.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push('\n');
    }
    target.push_str(addition);
}

/// Post-image path from a `diff --git a/<old> b/<new>` line
fn file_path_from_header(line: &str) -> Option<String> {
    let line = line.trim_end_matches('\r');
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let path = match tokens.len() {
        0..=3 => return None,
        4 => tokens[3].strip_prefix("b/").unwrap_or(tokens[3]),
        // Paths containing spaces
        _ => line.rsplit_once(" b/").map(|(_, path)| path)?,
    };

    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

fn status_from_metadata(line: &str) -> Option<FileStatus> {
    if line.starts_with("new file") {
        Some(FileStatus::Added)
    } else if line.starts_with("deleted file") {
        Some(FileStatus::Deleted)
    } else if line.starts_with("rename from") {
        Some(FileStatus::Renamed)
    } else {
        None
    }
}

/// Parse `git diff` output into per-file records.
pub fn parse_diff(diff_text: &str) -> FileDiffs {
    let mut files = FileDiffs::new();
    let mut current: Option<OpenRecord<'_>> = None;
    let mut state = ParseState::Idle;

    // Split on '\n' only, so CRLF content keeps its '\r' in raw_diff
    let body = diff_text.strip_suffix('\n').unwrap_or(diff_text);

    for line in body.split('\n') {
        if line.starts_with(FILE_HEADER) {
            if let Some(record) = current.take() {
                record.close(&mut files);
            }

            match file_path_from_header(line) {
                Some(path) => {
                    current = Some(OpenRecord::new(path, line));
                    state = ParseState::Metadata;
                }
                None => {
                    warn!(line, "Unparseable diff header, skipping file");
                    state = ParseState::Idle;
                }
            }
            continue;
        }

        let Some(record) = current.as_mut() else {
            continue;
        };

        if line.starts_with("@@") {
            record.push_header(line);
            state = ParseState::InHunk;
            continue;
        }

        match state {
            ParseState::Idle => {}
            ParseState::Metadata => {
                if let Some(status) = status_from_metadata(line) {
                    record.status = status;
                }
                record.push_header(line);
            }
            ParseState::InHunk => {
                if line.starts_with('+') || line.starts_with('-') || line.starts_with(' ') {
                    record.push_content(line);
                } else if !line.trim_end_matches('\r').is_empty() {
                    // e.g. "\ No newline at end of file"
                    record.raw.push(line);
                }
            }
        }
    }

    if let Some(record) = current.take() {
        record.close(&mut files);
    }

    debug!(files = files.len(), "Parsed git diff");
    files
}

/// Split a record's hunk body into original and modified code.
///
/// Context lines go to both sides, `+` lines to the modified side and `-`
/// lines to the original side. `+++`/`---` file markers are ignored, and a
/// trailing `\r` is dropped from every line.
pub fn extract_code(record: &DiffRecord) -> CodeChangePair {
    let mut original: Vec<&str> = Vec::new();
    let mut modified: Vec<&str> = Vec::new();

    for line in record.content.split('\n').map(|l| l.trim_end_matches('\r')) {
        if let Some(added) = line.strip_prefix('+') {
            if !line.starts_with("+++") {
                modified.push(added);
            }
        } else if let Some(removed) = line.strip_prefix('-') {
            if !line.starts_with("---") {
                original.push(removed);
            }
        } else if let Some(context) = line.strip_prefix(' ') {
            original.push(context);
            modified.push(context);
        }
    }

    CodeChangePair {
        original: original.join("\n"),
        modified: modified.join("\n"),
    }
}
