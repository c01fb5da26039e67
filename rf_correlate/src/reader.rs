use std::{io::Read, path::Path};

use anyhow::Context;
use compress_io::compress::CompressIo;
use regex::Regex;

pub const DEFAULT_REACTIVE: &str = "ACGT";

/// Reactivity profile for a single transcript
///
/// sequence - transcript sequence (upper case)
/// reactivity - per base reactivity; None where the value is missing
/// reactive - bases that are expected to be reactive
///
#[derive(Debug, Clone)]
pub struct Dataset {
    sequence: String,
    reactivity: Vec<Option<f64>>,
    reactive: String,
}

impl Dataset {
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn reactivity(&self) -> &[Option<f64>] {
        &self.reactivity
    }

    pub fn reactive(&self) -> &str {
        &self.reactive
    }

    /// Number of positions in the sequence with a reactive base (T and U are equivalent)
    pub fn n_reactive_bases(&self) -> usize {
        let r = self.reactive().as_bytes();
        let is_reactive = |c: u8| match c {
            b'T' | b'U' => r.contains(&b'T') || r.contains(&b'U'),
            _ => r.contains(&c),
        };
        self.sequence.bytes().filter(|c| is_reactive(*c)).count()
    }
}

/// Reader for XML reactivity files.  The regexes are compiled once and the reader
/// is shared between the worker threads
pub struct DatasetReader {
    reactive: Regex,
    length: Regex,
    sequence: Regex,
    reactivity: Regex,
}

impl DatasetReader {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            reactive: Regex::new(r#"<data\b[^>]*\breactive="([^"]*)""#)?,
            length: Regex::new(r#"<transcript\b[^>]*\blength="([^"]*)""#)?,
            sequence: Regex::new(r"(?s)<sequence>(.*?)</sequence>")?,
            reactivity: Regex::new(r"(?s)<reactivity>(.*?)</reactivity>")?,
        })
    }

    /// Read dataset from (possibly compressed) file
    pub fn read<P: AsRef<Path>>(&self, p: P) -> anyhow::Result<Dataset> {
        let p = p.as_ref();
        trace!("Opening dataset file {} for reading", p.display());
        let mut rdr = CompressIo::new()
            .path(p)
            .bufreader()
            .with_context(|| format!("Could not open dataset file {}", p.display()))?;
        let mut buf = String::new();
        rdr.read_to_string(&mut buf)
            .with_context(|| format!("Error reading from {}", p.display()))?;
        self.parse(&buf)
            .with_context(|| format!("Error parsing dataset file {}", p.display()))
    }

    pub fn parse(&self, s: &str) -> anyhow::Result<Dataset> {
        let reactive = self
            .reactive
            .captures(s)
            .map(|c| c[1].trim().to_ascii_uppercase())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REACTIVE.to_owned());

        let sequence: String = self
            .sequence
            .captures(s)
            .ok_or_else(|| anyhow!("Missing sequence element"))?[1]
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let rstr = self
            .reactivity
            .captures(s)
            .ok_or_else(|| anyhow!("Missing reactivity element"))?;
        let rstr = rstr[1].trim();
        let reactivity = if rstr.is_empty() {
            Vec::new()
        } else {
            rstr.split(',')
                .map(|z| parse_reactivity(z.trim()))
                .collect::<anyhow::Result<Vec<_>>>()?
        };

        if reactivity.len() != sequence.len() {
            return Err(anyhow!(
                "Sequence length ({}) differs from number of reactivity values ({})",
                sequence.len(),
                reactivity.len()
            ));
        }

        if let Some(c) = self.length.captures(s) {
            let l = c[1]
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid transcript length {}", &c[1]))?;
            if l != sequence.len() {
                return Err(anyhow!(
                    "Transcript length attribute ({}) differs from sequence length ({})",
                    l,
                    sequence.len()
                ));
            }
        }

        Ok(Dataset {
            sequence,
            reactivity,
            reactive,
        })
    }
}

fn parse_reactivity(s: &str) -> anyhow::Result<Option<f64>> {
    if s.eq_ignore_ascii_case("nan") {
        Ok(None)
    } else {
        let z = s
            .parse::<f64>()
            .with_context(|| format!("Invalid reactivity value '{}'", s))?;
        Ok(if z.is_finite() { Some(z) } else { None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<data combined="FALSE" reactive="AC" scoring="Siegfried" norm="2-8%" tool="rf-norm">
	<transcript id="RNA_1" length="12">
		<sequence>
			ACGUAC
			guuacg
		</sequence>
		<reactivity>
			0.12,NaN,0.5,nan,1,
			0,0.33,NaN,inf,2.5e-1,0.9,0.01
		</reactivity>
	</transcript>
</data>
"#;

    #[test]
    fn parse_dataset() {
        let rdr = DatasetReader::new().unwrap();
        let d = rdr.parse(XML).unwrap();
        assert_eq!(d.sequence(), "ACGUACGUUACG");
        assert_eq!(d.len(), 12);
        assert_eq!(d.reactive(), "AC");
        assert_eq!(d.n_reactive_bases(), 6);
        let r = d.reactivity();
        assert_eq!(r.len(), 12);
        assert_eq!(r[0], Some(0.12));
        assert_eq!(r[1], None);
        assert_eq!(r[3], None);
        assert_eq!(r[5], Some(0.0));
        assert_eq!(r[8], None);
        assert_eq!(r[9], Some(0.25));
    }

    #[test]
    fn default_reactive_bases() {
        let rdr = DatasetReader::new().unwrap();
        let d = rdr
            .parse("<data><transcript id=\"x\"><sequence>ACGUN</sequence><reactivity>1,2,3,4,5</reactivity></transcript></data>")
            .unwrap();
        assert_eq!(d.reactive(), DEFAULT_REACTIVE);
        // U counted as T
        assert_eq!(d.n_reactive_bases(), 4);
    }

    #[test]
    fn bad_datasets() {
        let rdr = DatasetReader::new().unwrap();
        // Wrong number of values
        assert!(rdr
            .parse("<data><sequence>ACG</sequence><reactivity>1,2</reactivity></data>")
            .is_err());
        // Length attribute mismatch
        assert!(rdr
            .parse("<data><transcript length=\"4\"><sequence>ACG</sequence><reactivity>1,2,3</reactivity></transcript></data>")
            .is_err());
        // Non numeric value
        assert!(rdr
            .parse("<data><sequence>ACG</sequence><reactivity>1,x,3</reactivity></data>")
            .is_err());
        assert!(rdr.parse("<data><sequence>ACG</sequence></data>").is_err());
        assert!(rdr.parse("not a dataset").is_err());
    }

    #[test]
    fn read_missing_file() {
        let rdr = DatasetReader::new().unwrap();
        assert!(rdr.read("/nonexistent/dir/tx.xml").is_err());
    }
}
