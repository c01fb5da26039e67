use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::transcript::InputMode;

pub type TranscriptId = Arc<str>;

/// Threshold on the number of usable (non-missing in both profiles) values
/// required for a transcript to be correlated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MinValues {
    // Fraction of reactive bases in the transcript sequence
    Fraction(f64),
    Count(usize),
}

impl MinValues {
    /// Values < 1 are fractions, otherwise they are rounded to an integer count
    pub fn from_f64(x: f64) -> anyhow::Result<Self> {
        if x.is_nan() || x <= 0.0 {
            Err(anyhow!("Minimum number of values must be > 0 (found {})", x))
        } else if x < 1.0 {
            Ok(Self::Fraction(x))
        } else {
            Ok(Self::Count(x.round() as usize))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Pearson,
    Spearman,
}

impl Method {
    pub fn correlate(&self, x: &[f64], y: &[f64]) -> anyhow::Result<Correlation> {
        let (coef, p) = match self {
            Self::Pearson => utils::pearson(x, y)?,
            Self::Spearman => utils::spearman(x, y)?,
        };
        Ok(Correlation { coef, p })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pearson => "Pearson",
            Self::Spearman => "Spearman",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    pub coef: f64,
    pub p: f64,
}

/// Config
///
/// Configuration info for the program
/// This is generated from the command line arguments
/// Once set it is read only
///
/// input - the pair of input files or directories
/// transcripts - identifiers of transcripts found in both inputs
/// output_file - path to output csv file
/// overwrite - allow an existing output file to be replaced
/// min_values - threshold on number of usable values per transcript
/// threads - number of correlation threads
/// skip_overall - do not calculate correlation across all transcripts
/// method - correlation method
/// ignore_sequence - only require sequence lengths (not sequences) to match
///
pub struct Config {
    input: InputMode,
    transcripts: Vec<TranscriptId>,
    output_file: PathBuf,
    overwrite: bool,
    min_values: Option<MinValues>,
    threads: usize,
    skip_overall: bool,
    method: Method,
    ignore_sequence: bool,
}

impl Config {
    pub fn new(input: InputMode, transcripts: Vec<TranscriptId>) -> Self {
        Self {
            input,
            transcripts,
            output_file: PathBuf::from("rf_correlate.csv"),
            overwrite: false,
            min_values: None,
            threads: 1,
            skip_overall: false,
            method: Method::Pearson,
            ignore_sequence: false,
        }
    }

    /// Output file always gets a .csv suffix
    pub fn set_output_file<P: AsRef<Path>>(&mut self, p: P) -> anyhow::Result<()> {
        let p = p.as_ref();
        if p.as_os_str().is_empty() {
            return Err(anyhow!("Output file path is empty"));
        }
        self.output_file = if p.extension().map(|s| s == "csv").unwrap_or(false) {
            p.to_owned()
        } else {
            let mut s = OsString::from(p.as_os_str());
            s.push(".csv");
            PathBuf::from(s)
        };
        Ok(())
    }

    pub fn set_overwrite(&mut self) {
        self.overwrite = true
    }

    pub fn set_min_values(&mut self, x: MinValues) {
        self.min_values = Some(x)
    }

    pub fn set_threads(&mut self, x: usize) -> anyhow::Result<()> {
        if x == 0 {
            Err(anyhow!("Number of threads must be > 0"))
        } else {
            self.threads = x;
            Ok(())
        }
    }

    pub fn set_skip_overall(&mut self) {
        self.skip_overall = true
    }

    pub fn set_method(&mut self, m: Method) {
        self.method = m
    }

    pub fn set_ignore_sequence(&mut self) {
        self.ignore_sequence = true
    }

    pub fn input(&self) -> &InputMode {
        &self.input
    }

    pub fn transcripts(&self) -> &[TranscriptId] {
        &self.transcripts
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn min_values(&self) -> Option<MinValues> {
        self.min_values
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn ignore_sequence(&self) -> bool {
        self.ignore_sequence
    }

    /// Values are only accumulated across transcripts in directory mode
    pub fn overall(&self) -> bool {
        !self.skip_overall && !self.input.is_single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> Config {
        Config::new(InputMode::Files("a.xml".into(), "b.xml".into()), Vec::new())
    }

    #[test]
    fn min_values_policy() {
        assert_eq!(MinValues::from_f64(0.5).unwrap(), MinValues::Fraction(0.5));
        assert_eq!(MinValues::from_f64(1.0).unwrap(), MinValues::Count(1));
        assert_eq!(MinValues::from_f64(4.6).unwrap(), MinValues::Count(5));
        assert!(MinValues::from_f64(0.0).is_err());
        assert!(MinValues::from_f64(-2.0).is_err());
    }

    #[test]
    fn output_suffix() {
        let mut c = cfg();
        assert_eq!(c.output_file(), Path::new("rf_correlate.csv"));
        c.set_output_file("out/results").unwrap();
        assert_eq!(c.output_file(), Path::new("out/results.csv"));
        c.set_output_file("results.csv").unwrap();
        assert_eq!(c.output_file(), Path::new("results.csv"));
        c.set_output_file("results.txt").unwrap();
        assert_eq!(c.output_file(), Path::new("results.txt.csv"));
        assert!(c.set_output_file("").is_err());
    }

    #[test]
    fn threads_and_overall() {
        let mut c = cfg();
        assert!(c.set_threads(0).is_err());
        c.set_threads(4).unwrap();
        assert_eq!(c.threads(), 4);
        // Single file mode never accumulates
        assert!(!c.overall());

        let mut c = Config::new(InputMode::Dirs("a".into(), "b".into()), Vec::new());
        assert!(c.overall());
        c.set_skip_overall();
        assert!(!c.overall());
    }
}
