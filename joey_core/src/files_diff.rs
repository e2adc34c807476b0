use crate::json_diff::JsonDiffer;
use crate::loader::{is_json_file, is_yaml_file, load_document};
use joey_common::{FileDiff, JoeyError};
use rayon::prelude::*;
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Progress notifications emitted while diffing files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEvent {
    FilesStart {
        total: usize,
    },
    FileStart {
        source: PathBuf,
        target: PathBuf,
        current: usize,
        total: usize,
    },
    /// `changes` is the number of changes found for the pair
    FileEnd {
        source: PathBuf,
        target: PathBuf,
        current: usize,
        total: usize,
        changes: usize,
    },
    SaveStart {
        output: PathBuf,
    },
    SaveEnd {
        output: PathBuf,
    },
    FilesEnd {
        total: usize,
    },
}

pub type ProgressCallback = Box<dyn Fn(&DiffEvent) + Send + Sync>;

/// One unit of work: two documents and, optionally, where to write their diff
#[derive(Debug, Clone)]
struct FilePair {
    source: PathBuf,
    target: PathBuf,
    output: Option<PathBuf>,
}

/// Diffs documents on disk, file against file or across directories
pub struct FilesDiffer {
    differ: JsonDiffer,
    progress: Option<ProgressCallback>,
}

impl FilesDiffer {
    pub fn new(differ: JsonDiffer) -> Self {
        Self {
            differ,
            progress: None,
        }
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&DiffEvent) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Diff `source` against `target`.
    ///
    /// Files are paired as follows: a file with a file, a file with every file
    /// of a directory (either way round), and two directories by shared file
    /// names. When `output` is an existing directory each pair is saved there
    /// under its file name; any other `output` receives the whole result list.
    pub fn diff(
        &self,
        source: &Path,
        target: &Path,
        output: Option<&Path>,
    ) -> Result<Vec<FileDiff>, JoeyError> {
        let output_dir = output.filter(|path| path.is_dir());

        let pairs = if source.is_file() && target.is_file() {
            if let Some(dir) = output_dir {
                return Err(JoeyError::InvalidInput(format!(
                    "\"{}\" is a directory, please specify an output file!",
                    dir.display()
                )));
            }
            vec![FilePair {
                source: source.to_path_buf(),
                target: target.to_path_buf(),
                output: None,
            }]
        } else if source.is_file() && target.is_dir() {
            list_files(target)?
                .into_iter()
                .map(|name| FilePair {
                    source: source.to_path_buf(),
                    target: target.join(&name),
                    output: output_dir.map(|dir| dir.join(&name)),
                })
                .collect()
        } else if source.is_dir() && target.is_file() {
            list_files(source)?
                .into_iter()
                .map(|name| FilePair {
                    source: source.join(&name),
                    target: target.to_path_buf(),
                    output: output_dir.map(|dir| dir.join(&name)),
                })
                .collect()
        } else if source.is_dir() && target.is_dir() {
            let target_names = list_files(target)?;
            list_files(source)?
                .into_iter()
                .filter(|name| target_names.contains(name))
                .map(|name| FilePair {
                    source: source.join(&name),
                    target: target.join(&name),
                    output: output_dir.map(|dir| dir.join(&name)),
                })
                .collect()
        } else {
            return Err(JoeyError::InvalidInput(
                "Source and target must be either files or directories!".to_string(),
            ));
        };

        let total = pairs.len();
        info!(
            "Diffing {} file pair(s) from {} against {}",
            total,
            source.display(),
            target.display()
        );
        self.emit(DiffEvent::FilesStart { total });

        let results = pairs
            .par_iter()
            .enumerate()
            .map(|(index, pair)| self.diff_pair(pair, index + 1, total))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(output) = output.filter(|_| output_dir.is_none()) {
            self.save_results(output, &results)?;
        }

        info!(
            "Found {} change(s) across {} file pair(s)",
            results.iter().map(|r| r.changes.len()).sum::<usize>(),
            results.len()
        );
        self.emit(DiffEvent::FilesEnd {
            total: results.len(),
        });

        Ok(results)
    }

    fn diff_pair(&self, pair: &FilePair, current: usize, total: usize) -> Result<FileDiff, JoeyError> {
        self.emit(DiffEvent::FileStart {
            source: pair.source.clone(),
            target: pair.target.clone(),
            current,
            total,
        });

        let source = load_document(&pair.source)?;
        let target = load_document(&pair.target)?;
        let changes = self.differ.diff(&source, &target)?;

        debug!(
            "{} vs {}: {} change(s)",
            pair.source.display(),
            pair.target.display(),
            changes.len()
        );
        self.emit(DiffEvent::FileEnd {
            source: pair.source.clone(),
            target: pair.target.clone(),
            current,
            total,
            changes: changes.len(),
        });

        let result = FileDiff {
            source: pair.source.clone(),
            target: pair.target.clone(),
            changes,
        };

        if let Some(output) = &pair.output {
            self.save_results(output, &result)?;
        }

        Ok(result)
    }

    fn save_results<T: Serialize + ?Sized>(&self, output: &Path, results: &T) -> Result<(), JoeyError> {
        self.emit(DiffEvent::SaveStart {
            output: output.to_path_buf(),
        });

        let json = serde_json::to_string_pretty(results)
            .map_err(|e| JoeyError::Serialization(e.to_string()))?;
        fs::write(output, json)?;
        debug!("Saved results to {}", output.display());

        self.emit(DiffEvent::SaveEnd {
            output: output.to_path_buf(),
        });
        Ok(())
    }

    fn emit(&self, event: DiffEvent) {
        if let Some(callback) = &self.progress {
            callback(&event);
        }
    }
}

/// Names of the JSON and YAML documents directly inside `dir`, sorted
fn list_files(dir: &Path) -> Result<Vec<OsString>, JoeyError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() {
            continue;
        }
        if is_json_file(&path) || is_yaml_file(&path) {
            names.push(entry.file_name());
        } else {
            debug!("Skipping {}: not a JSON or YAML document", path.display());
        }
    }
    names.sort();
    Ok(names)
}
