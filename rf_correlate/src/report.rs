use std::io::{self, Write};

use crate::{
    config::{Config, Correlation, TranscriptId},
    results::Results,
};

const N_TOP: usize = 10;

/// Correlation across the values of all successful transcripts
pub fn overall_correlation(cfg: &Config, res: &Results) -> Option<Correlation> {
    let g = res.global().filter(|g| g.len() >= 2)?;
    debug!("Calculating overall correlation from {} values", g.len());
    match cfg.method().correlate(&g.x, &g.y) {
        Ok(c) => Some(c),
        Err(e) => {
            warn!("Could not calculate overall correlation: {}", e);
            None
        }
    }
}

/// Best results ordered by decreasing coefficient, ties broken by transcript id
pub fn top_results(res: &Results, n: usize) -> Vec<(&TranscriptId, &Correlation)> {
    let mut v: Vec<_> = res.table().iter().collect();
    v.sort_unstable_by(|a, b| b.1.coef.total_cmp(&a.1.coef).then_with(|| a.0.cmp(b.0)));
    v.truncate(n);
    v
}

fn write_summary<W: Write>(
    wrt: &mut W,
    cfg: &Config,
    res: &Results,
    overall: Option<Correlation>,
) -> io::Result<()> {
    let method = cfg.method().name();
    if cfg.input().is_single() {
        match res.table().values().next() {
            Some(c) => writeln!(
                wrt,
                "{} correlation: {:.3} (p-value: {:.2e})",
                method, c.coef, c.p
            )?,
            None => writeln!(wrt, "Correlation could not be calculated")?,
        }
    } else {
        let top = top_results(res, N_TOP);
        if !top.is_empty() {
            writeln!(wrt, "Top {} transcripts ({} correlation):\n", top.len(), method)?;
            writeln!(wrt, "{:<30}\t{:>8}\t{:>10}", "Transcript", "Coeff.", "p-value")?;
            for (id, c) in top {
                writeln!(wrt, "{:<30}\t{:>8.3}\t{:>10.2e}", id, c.coef, c.p)?
            }
            writeln!(wrt)?;
        }
        if let Some(c) = overall {
            writeln!(
                wrt,
                "Overall correlation: {:.3} (p-value: {:.2e})\n",
                c.coef, c.p
            )?
        }
    }

    let c = res.counts();
    writeln!(wrt, "Transcripts processed: {}", c.total())?;
    writeln!(wrt, "  Correlated: {}", c.correlated)?;
    writeln!(wrt, "  Failed: {}", c.failed)?;
    writeln!(wrt, "    Sequence mismatch: {}", c.diffseq)?;
    writeln!(wrt, "    Insufficient values: {}", c.nominvalues)?;
    writeln!(
        wrt,
        "    Other (unreadable/undefined): {}",
        c.failed - c.diffseq - c.nominvalues
    )
}

/// Print summary of results to stdout
pub fn report(cfg: &Config, res: &Results) -> anyhow::Result<()> {
    let overall = if cfg.overall() && res.counts().correlated > 1 {
        overall_correlation(cfg, res)
    } else {
        None
    };
    let stdout = io::stdout();
    let mut wrt = stdout.lock();
    write_summary(&mut wrt, cfg, res, overall)?;
    Ok(())
}
