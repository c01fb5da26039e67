use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use regex::Regex;

use crate::config::TranscriptId;

/// The two inputs being compared
///
/// Files - a single pair of dataset files
/// Dirs - a pair of directories containing <id>.xml files
///
#[derive(Debug, Clone)]
pub enum InputMode {
    Files(PathBuf, PathBuf),
    Dirs(PathBuf, PathBuf),
}

impl InputMode {
    pub fn is_single(&self) -> bool {
        matches!(self, Self::Files(_, _))
    }

    /// Locations of the pair of datasets for transcript id
    pub fn dataset_paths(&self, id: &str) -> (PathBuf, PathBuf) {
        match self {
            Self::Files(a, b) => (a.clone(), b.clone()),
            Self::Dirs(a, b) => {
                let name = format!("{}.xml", id);
                (a.join(&name), b.join(&name))
            }
        }
    }
}

/// Determine input mode and collect the transcript ids to be processed
pub fn get_input_transcripts<P: AsRef<Path>>(
    in1: P,
    in2: P,
) -> anyhow::Result<(InputMode, Vec<TranscriptId>)> {
    let (in1, in2) = (in1.as_ref(), in2.as_ref());
    for p in [in1, in2] {
        if !p.exists() {
            return Err(anyhow!("Input path {} does not exist", p.display()));
        }
    }

    if in1.is_file() && in2.is_file() {
        let id = file_id(in1);
        debug!(
            "Single transcript mode: comparing {} and {}",
            in1.display(),
            in2.display()
        );
        Ok((
            InputMode::Files(in1.to_owned(), in2.to_owned()),
            vec![Arc::from(id.as_str())],
        ))
    } else if in1.is_dir() && in2.is_dir() {
        let reg = Regex::new(r"^(.+)\.xml$")?;
        let h1 = get_dir_ids(in1, &reg)?;
        let h2 = get_dir_ids(in2, &reg)?;
        let mut ids: Vec<_> = h1.intersection(&h2).map(|s| Arc::from(s.as_str())).collect();
        if ids.is_empty() {
            return Err(anyhow!(
                "No transcripts in common between {} and {}",
                in1.display(),
                in2.display()
            ));
        }
        ids.sort_unstable();
        debug!(
            "Found {} and {} transcripts in input directories; {} in common",
            h1.len(),
            h2.len(),
            ids.len()
        );
        Ok((InputMode::Dirs(in1.to_owned(), in2.to_owned()), ids))
    } else {
        Err(anyhow!(
            "Inputs {} and {} must be either both files or both directories",
            in1.display(),
            in2.display()
        ))
    }
}

/// Transcript name from a dataset file name, dropping the .xml suffix
/// (and any compression suffix after it)
fn file_id(p: &Path) -> String {
    let name = p
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.find(".xml") {
        Some(i) if i > 0 => name[..i].to_owned(),
        _ => name,
    }
}

fn get_dir_ids(dir: &Path, reg: &Regex) -> anyhow::Result<HashSet<String>> {
    let mut h = HashSet::new();
    for f in dir
        .read_dir()
        .with_context(|| format!("Error checking input directory {}", dir.display()))?
    {
        let entry =
            f.with_context(|| format!("Could not get directory entry from {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                if let Some(c) = reg.captures(name) {
                    let id = &c[1];
                    trace!("Found transcript {} in {}", id, dir.display());
                    h.insert(id.to_owned());
                }
            }
        }
    }
    Ok(h)
}
