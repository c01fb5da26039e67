#[macro_use]
extern crate anyhow;

use std::{fmt, str::FromStr};

use anyhow::Context;
use clap::ArgMatches;
use special::Beta;

/// LogLevel
///
/// Represents minimum level of messages that will be logged
///
#[derive(Debug, Clone, Copy)]
pub struct LogLevel {
    pub level: usize,
}

impl FromStr for LogLevel {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel { level: 0 }),
            "warn" => Ok(LogLevel { level: 1 }),
            "info" => Ok(LogLevel { level: 2 }),
            "debug" => Ok(LogLevel { level: 3 }),
            "trace" => Ok(LogLevel { level: 4 }),
            "none" => Ok(LogLevel { level: 5 }),
            _ => Err("no match"),
        }
    }
}

impl LogLevel {
    pub fn is_none(&self) -> bool {
        self.level > 4
    }
    pub fn get_level(&self) -> usize {
        if self.level > 4 {
            0
        } else {
            self.level
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level_str = ["error", "warn", "info", "debug", "trace", "none"];
        if self.level < 6 {
            write!(f, "{}", level_str[self.level])
        } else {
            write!(f, "unknown")
        }
    }
}

/// Initialize logging from command line arguments
pub fn init_log(m: &ArgMatches) -> anyhow::Result<()> {
    let verbose = m
        .get_one::<LogLevel>("loglevel")
        .copied()
        .unwrap_or(LogLevel { level: 1 });
    let quiet = verbose.is_none() || m.get_flag("quiet");
    let ts = m
        .get_one::<stderrlog::Timestamp>("timestamp")
        .copied()
        .unwrap_or(stderrlog::Timestamp::Off);

    stderrlog::new()
        .quiet(quiet)
        .verbosity(verbose.get_level())
        .timestamp(ts)
        .init()
        .with_context(|| "Could not initialize logging")
}

pub fn pt(t: f64, df: f64, lower_tail: bool) -> anyhow::Result<f64> {
    if df <= 0.0 {
        Err(anyhow!("pt(): Invalid df {}", df))
    } else {
        let a = df * 0.5;
        let lbeta = a.ln_beta(0.5);
        let x = df / (df + t * t);
        let z = 0.5 * x.inc_beta(a, 0.5, lbeta);
        let flip = lower_tail ^ t.is_sign_negative();
        Ok(if flip { 1.0 - z } else { z })
    }
}

fn check_cor_input(x: &[f64], y: &[f64]) -> anyhow::Result<()> {
    if x.len() != y.len() {
        Err(anyhow!(
            "Input vectors differ in length ({} and {})",
            x.len(),
            y.len()
        ))
    } else if x.len() < 2 {
        Err(anyhow!(
            "At least 2 values required for correlation (found {})",
            x.len()
        ))
    } else if x.iter().chain(y.iter()).any(|z| !z.is_finite()) {
        Err(anyhow!("Non finite value in input vectors"))
    } else {
        Ok(())
    }
}

/// Two tailed p-value for correlation coefficient r from n observations using the
/// t distribution on n - 2 df.
///
/// With n == 2 there are no degrees of freedom left, and p is set to 1
pub fn cor_pvalue(r: f64, n: usize) -> anyhow::Result<f64> {
    if n < 3 {
        Ok(1.0)
    } else if r.abs() >= 1.0 {
        Ok(0.0)
    } else {
        let df = (n - 2) as f64;
        let t = r * (df / (1.0 - r * r)).sqrt();
        Ok((2.0 * pt(t.abs(), df, false)?).min(1.0))
    }
}

fn pearson_r(x: &[f64], y: &[f64]) -> anyhow::Result<f64> {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let (sxy, sxx, syy) = x
        .iter()
        .zip(y.iter())
        .fold((0.0, 0.0, 0.0), |(sxy, sxx, syy), (a, b)| {
            let (dx, dy) = (a - mx, b - my);
            (sxy + dx * dy, sxx + dx * dx, syy + dy * dy)
        });
    if sxx <= 0.0 || syy <= 0.0 {
        Err(anyhow!("Correlation undefined: zero variance in input"))
    } else {
        Ok((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
    }
}

/// Pearson product moment correlation.  Returns (r, p)
pub fn pearson(x: &[f64], y: &[f64]) -> anyhow::Result<(f64, f64)> {
    check_cor_input(x, y)?;
    let r = pearson_r(x, y)?;
    Ok((r, cor_pvalue(r, x.len())?))
}

/// Ranks of x (starting at 1).  Tied values get the mean of the ranks they occupy
pub fn rank(x: &[f64]) -> Vec<f64> {
    let mut ix: Vec<usize> = (0..x.len()).collect();
    ix.sort_unstable_by(|a, b| x[*a].total_cmp(&x[*b]));
    let mut rk = vec![0.0; x.len()];
    let mut i = 0;
    while i < ix.len() {
        let z = x[ix[i]];
        let j = i + ix[i..].iter().take_while(|k| x[**k] == z).count();
        // Ranks i+1..=j shared between the tied values
        let r = (i + j + 1) as f64 * 0.5;
        for k in ix[i..j].iter() {
            rk[*k] = r
        }
        i = j;
    }
    rk
}

/// Spearman rank correlation.  Returns (rho, p)
pub fn spearman(x: &[f64], y: &[f64]) -> anyhow::Result<(f64, f64)> {
    check_cor_input(x, y)?;
    let (rx, ry) = (rank(x), rank(y));
    let rho = pearson_r(&rx, &ry)?;
    Ok((rho, cor_pvalue(rho, x.len())?))
}
