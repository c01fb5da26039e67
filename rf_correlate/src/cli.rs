use std::{num::NonZeroUsize, path::PathBuf};

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    Command,
};

use anyhow::Context;

use utils::{init_log, LogLevel};

use crate::{config::*, transcript::get_input_transcripts};

/// Set up definition of command options for clap
fn cli_model() -> Command {
    Command::new(crate_name!())
        .about(crate_description!())
        .version(crate_version!())
        .author(crate_authors!())
        .arg(
            Arg::new("timestamp")
                .short('X')
                .long("timestamp")
                .value_parser(value_parser!(stderrlog::Timestamp))
                .value_name("GRANULARITY")
                .default_value("none")
                .help("Prepend log entries with a timestamp"),
        )
        .arg(
            Arg::new("loglevel")
                .short('l')
                .long("loglevel")
                .value_name("LOGLEVEL")
                .value_parser(value_parser!(LogLevel))
                .ignore_case(true)
                .default_value("warn")
                .help("Set log level"),
        )
        .arg(
            Arg::new("quiet")
                .action(ArgAction::SetTrue)
                .long("quiet")
                .conflicts_with("loglevel")
                .help("Silence all output"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_parser(value_parser!(NonZeroUsize))
                .value_name("INT")
                .default_value("1")
                .help("Set number of calculation threads"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .default_value("rf_correlate.csv")
                .help("Set output file (a .csv suffix is added if missing)"),
        )
        .arg(
            Arg::new("overwrite")
                .action(ArgAction::SetTrue)
                .long("overwrite")
                .help("Overwrite output file if it already exists"),
        )
        .arg(
            Arg::new("min_values")
                .short('m')
                .long("min-values")
                .value_parser(value_parser!(f64))
                .value_name("FLOAT")
                .help("Minimum number of values in common between profiles. Values < 1 are taken as a fraction of the number of reactive bases [default: 2]"),
        )
        .arg(
            Arg::new("skip_overall")
                .action(ArgAction::SetTrue)
                .short('s')
                .long("skip-overall")
                .help("Skip calculation of overall correlation across all transcripts"),
        )
        .arg(
            Arg::new("spearman")
                .action(ArgAction::SetTrue)
                .short('S')
                .long("spearman")
                .help("Use Spearman rank correlation instead of Pearson"),
        )
        .arg(
            Arg::new("ignore_sequence")
                .action(ArgAction::SetTrue)
                .short('i')
                .long("ignore-sequence")
                .help("Only require sequence lengths (not sequences) to match between profiles"),
        )
        .arg(
            Arg::new("inputs")
                .value_parser(value_parser!(PathBuf))
                .value_name("INPUT")
                .num_args(2)
                .required(true)
                .help("Two XML reactivity files or two directories of <transcript>.xml files"),
        )
}

/// Handle command line options.  Set up Config structure
pub fn handle_cli() -> anyhow::Result<Config> {
    // Get matches from command line
    let m = cli_model().get_matches();

    // Setup logging
    init_log(&m)?;

    debug!("Processing command line options");

    let inputs: Vec<_> = m
        .get_many::<PathBuf>("inputs")
        .expect("Missing input paths")
        .collect();
    if inputs.len() != 2 {
        return Err(anyhow!("Two inputs required (found {})", inputs.len()));
    }

    let (mode, transcripts) = get_input_transcripts(inputs[0], inputs[1])
        .with_context(|| "Error collecting input transcripts")?;

    debug!("Number of transcripts found: {}", transcripts.len());

    let mut cfg = Config::new(mode, transcripts);

    cfg.set_output_file(
        m.get_one::<PathBuf>("output")
            .expect("Missing default output file"),
    )?;

    if m.get_flag("overwrite") {
        cfg.set_overwrite()
    }

    if let Some(x) = m.get_one::<f64>("min_values") {
        cfg.set_min_values(MinValues::from_f64(*x)?)
    }

    let nt = m
        .get_one::<NonZeroUsize>("threads")
        .map(|x| usize::from(*x))
        .unwrap_or(1);
    if nt > num_cpus::get() {
        warn!(
            "Number of threads requested ({}) is more than the number of available cores ({})",
            nt,
            num_cpus::get()
        )
    }
    cfg.set_threads(nt)?;

    if m.get_flag("skip_overall") {
        cfg.set_skip_overall()
    }

    if m.get_flag("spearman") {
        cfg.set_method(Method::Spearman)
    }

    if m.get_flag("ignore_sequence") {
        cfg.set_ignore_sequence()
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        cli_model().debug_assert()
    }

    #[test]
    fn input_count() {
        assert!(cli_model()
            .try_get_matches_from(["rf_correlate", "a.xml"])
            .is_err());
        assert!(cli_model()
            .try_get_matches_from(["rf_correlate", "a.xml", "b.xml", "c.xml"])
            .is_err());
        assert!(cli_model()
            .try_get_matches_from(["rf_correlate", "-t", "0", "a.xml", "b.xml"])
            .is_err());
        let m = cli_model()
            .try_get_matches_from(["rf_correlate", "-S", "-m", "0.5", "a.xml", "b.xml"])
            .unwrap();
        assert!(m.get_flag("spearman"));
        assert_eq!(m.get_one::<f64>("min_values").copied(), Some(0.5));
        assert_eq!(m.get_many::<PathBuf>("inputs").unwrap().count(), 2);

        let m = cli_model()
            .try_get_matches_from(["rf_correlate", "--output", "res", "a.xml", "b.xml"])
            .unwrap();
        assert_eq!(
            m.get_one::<PathBuf>("output").map(|p| p.as_path()),
            Some(std::path::Path::new("res"))
        );
    }
}
