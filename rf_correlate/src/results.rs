use std::{collections::HashMap, io::Write, sync::Arc};

use anyhow::Context;
use parking_lot::Mutex;

use crate::{
    config::{Correlation, TranscriptId},
    filter::CommonValues,
};

/// Reason a transcript could not be correlated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    // Either dataset could not be read
    Load,
    // Sequences (or lengths) differ
    DiffSeq,
    // Not enough values present in both datasets
    NoMinValues,
    // Correlation could not be calculated (i.e., no variance)
    Undefined,
}

/// failed includes all failures, so failed >= diffseq + nominvalues
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub failed: usize,
    pub diffseq: usize,
    pub nominvalues: usize,
    pub correlated: usize,
}

impl Counts {
    fn add_failure(&mut self, f: Failure) {
        self.failed += 1;
        match f {
            Failure::DiffSeq => self.diffseq += 1,
            Failure::NoMinValues => self.nominvalues += 1,
            Failure::Load | Failure::Undefined => (),
        }
    }

    pub fn total(&self) -> usize {
        self.correlated + self.failed
    }
}

/// Aggregate state for a run
///
/// counts - success and failure counters
/// table - correlation for each successful transcript
/// global - values from all successful transcripts (if overall correlation is required)
///
#[derive(Debug, Default)]
pub struct Results {
    counts: Counts,
    table: HashMap<TranscriptId, Correlation>,
    global: Option<CommonValues>,
}

impl Results {
    pub fn new(overall: bool) -> Self {
        Self {
            global: if overall {
                Some(CommonValues::default())
            } else {
                None
            },
            ..Default::default()
        }
    }

    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    pub fn table(&self) -> &HashMap<TranscriptId, Correlation> {
        &self.table
    }

    pub fn global(&self) -> Option<&CommonValues> {
        self.global.as_ref()
    }
}

/// Results shared between worker threads.  All updates for a transcript
/// are made under a single lock
pub struct Aggregator {
    inner: Mutex<Results>,
}

impl Aggregator {
    pub fn new(overall: bool) -> Self {
        Self {
            inner: Mutex::new(Results::new(overall)),
        }
    }

    pub fn add_failure(&self, f: Failure) {
        self.inner.lock().counts.add_failure(f)
    }

    pub fn add_result(&self, id: &TranscriptId, cor: Correlation, mut cv: CommonValues) {
        let mut res = self.inner.lock();
        res.counts.correlated += 1;
        let prev = res.table.insert(Arc::clone(id), cor);
        debug_assert!(prev.is_none(), "Transcript {} processed twice", id);
        if let Some(g) = res.global.as_mut() {
            g.x.append(&mut cv.x);
            g.y.append(&mut cv.y);
        }
    }

    pub fn into_results(self) -> Results {
        self.inner.into_inner()
    }
}

/// Output sink shared between worker threads.  Each result is written as one line
/// and flushed so that completed results reach the file as the run progresses
pub struct OutputWriter<W: Write> {
    wrt: Mutex<W>,
}

impl<W: Write> OutputWriter<W> {
    pub fn new(wrt: W) -> Self {
        Self {
            wrt: Mutex::new(wrt),
        }
    }

    pub fn write_result(&self, id: &str, cor: &Correlation) -> anyhow::Result<()> {
        let line = format!("{};{};{}\n", id, cor.coef, cor.p);
        let mut wrt = self.wrt.lock();
        wrt.write_all(line.as_bytes())
            .and_then(|_| wrt.flush())
            .with_context(|| format!("Error writing results for {}", id))
    }

    pub fn finish(self) -> anyhow::Result<W> {
        let mut wrt = self.wrt.into_inner();
        wrt.flush().with_context(|| "Error flushing output")?;
        Ok(wrt)
    }
}
