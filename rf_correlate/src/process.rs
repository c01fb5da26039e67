use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::PathBuf,
    thread,
};

use anyhow::Context;
use crossbeam_channel::{unbounded, Receiver};

use crate::{
    config::{Config, Correlation, TranscriptId},
    filter::{filter_common, CommonValues},
    reader::DatasetReader,
    results::{Aggregator, Failure, OutputWriter, Results},
};

/// Open output file, refusing to replace an existing file unless overwrite is set
pub fn open_output(cfg: &Config) -> anyhow::Result<BufWriter<File>> {
    let p = cfg.output_file();
    let mut opts = OpenOptions::new();
    opts.write(true);
    if cfg.overwrite() {
        opts.create(true).truncate(true);
    } else {
        if p.exists() {
            return Err(anyhow!(
                "Output file {} already exists (use --overwrite to replace)",
                p.display()
            ));
        }
        opts.create_new(true);
    }
    let f = opts
        .open(p)
        .with_context(|| format!("Could not create output file {}", p.display()))?;
    debug!("Opened output file {}", p.display());
    Ok(BufWriter::new(f))
}

/// Load and correlate the pair of datasets for one transcript.  No shared state is touched
fn correlate_transcript(
    cfg: &Config,
    rdr: &DatasetReader,
    id: &str,
) -> Result<(Correlation, CommonValues), Failure> {
    let (p1, p2) = cfg.input().dataset_paths(id);
    let load = |p: PathBuf| {
        rdr.read(p).map_err(|e| {
            trace!("{}: {:#}", id, e);
            Failure::Load
        })
    };
    let d1 = load(p1)?;
    let d2 = load(p2)?;

    let compatible = if cfg.ignore_sequence() {
        d1.len() == d2.len()
    } else {
        d1.sequence() == d2.sequence()
    };
    if !compatible {
        trace!("{}: sequences differ", id);
        return Err(Failure::DiffSeq);
    }

    let cv = filter_common(
        d1.reactivity(),
        d2.reactivity(),
        d1.n_reactive_bases(),
        cfg.min_values(),
    )
    .ok_or_else(|| {
        trace!("{}: insufficient values", id);
        Failure::NoMinValues
    })?;

    let cor = cfg.method().correlate(&cv.x, &cv.y).map_err(|e| {
        trace!("{}: {}", id, e);
        Failure::Undefined
    })?;

    Ok((cor, cv))
}

fn correlate_task<W: Write + Send>(
    cfg: &Config,
    ix: usize,
    rdr: &DatasetReader,
    agg: &Aggregator,
    out: &OutputWriter<W>,
    rcv: Receiver<TranscriptId>,
) -> anyhow::Result<()> {
    debug!("Correlation task {} starting up", ix);
    let mut n = 0;
    while let Ok(id) = rcv.recv() {
        trace!("Task {} received transcript {}", ix, id);
        n += 1;
        match correlate_transcript(cfg, rdr, &id) {
            Ok((cor, cv)) => {
                agg.add_result(&id, cor, cv);
                out.write_result(&id, &cor)?;
            }
            Err(f) => agg.add_failure(f),
        }
    }
    debug!("Correlation task {} closing down after {} transcripts", ix, n);
    Ok(())
}

/// Correlate all transcripts using a pool of threads.
///
/// The transcript ids are all sent to the job channel before the tasks start, and
/// the sender is dropped so that the tasks exit when the channel is empty
pub fn correlate_transcripts<W: Write + Send>(
    cfg: &Config,
    wrt: W,
) -> anyhow::Result<(Results, W)> {
    let ids = cfg.transcripts();
    let nt = cfg.threads().min(ids.len()).max(1);
    debug!(
        "Correlating {} transcripts using {} threads ({} method)",
        ids.len(),
        nt,
        cfg.method().name()
    );

    let rdr = DatasetReader::new()?;
    let agg = Aggregator::new(cfg.overall());
    let out = OutputWriter::new(wrt);

    let (snd, rcv) = unbounded();
    for id in ids.iter() {
        snd.send(id.clone())
            .with_context(|| "Error sending transcript to job queue")?;
    }
    drop(snd);

    let mut v = Vec::with_capacity(nt);
    thread::scope(|sc| {
        trace!("Spawning {} correlation tasks", nt);
        let jobs: Vec<_> = (0..nt)
            .map(|i| {
                let r = rcv.clone();
                let (rdr, agg, out) = (&rdr, &agg, &out);
                sc.spawn(move || correlate_task(cfg, i + 1, rdr, agg, out, r))
            })
            .collect();
        for jh in jobs {
            v.push(jh.join())
        }
    });
    drop(rcv);

    trace!("Collecting results from correlation tasks");
    for (ix, res) in v.drain(..).enumerate() {
        match res {
            Ok(r) => {
                r.with_context(|| format!("Error returned from correlation task {}", ix + 1))?
            }
            Err(_) => return Err(anyhow!("Correlation task {} panicked", ix + 1)),
        }
    }

    let wrt = out.finish()?;
    let res = agg.into_results();
    let c = res.counts();
    debug!(
        "Correlation finished: {} correlated, {} failed",
        c.correlated, c.failed
    );
    Ok((res, wrt))
}
