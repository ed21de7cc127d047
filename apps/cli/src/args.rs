use std::path::PathBuf;

use clap::Parser;
use flow_app::OutputFormat;

/// Summarize per-device bandwidth usage from gateway flow logs.
///
/// Reads the `combine_and_send` bucket lines of a flow log, totals tx/rx per
/// device by service and by content category, and prints the result.
#[derive(Parser, Debug)]
#[command(name = "flow-tracker", version, about)]
pub struct CliArgs {
    /// Flow log file to summarize.
    #[arg(short = 'l', long = "log-file-path")]
    pub log_file_path: PathBuf,

    /// Local classification definitions; fetched from the registration
    /// server when omitted.
    #[arg(short = 'c', long = "classification-file-path")]
    pub classification_file_path: Option<PathBuf>,

    /// Config file to use instead of the default location.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Skip the bar charts in table output.
    #[arg(long, default_value_t = false)]
    pub no_chart: bool,

    /// Merge every bucket slot instead of slot "0" only.
    #[arg(long, default_value_t = false)]
    pub all_slots: bool,

    /// Enable debug logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let args = CliArgs::try_parse_from([
            "flow-tracker",
            "-l",
            "flow.logs",
            "-c",
            "classification_defs_ext.json",
            "--format",
            "json",
            "--all-slots",
        ])
        .expect("args");
        assert_eq!(args.log_file_path, PathBuf::from("flow.logs"));
        assert_eq!(
            args.classification_file_path,
            Some(PathBuf::from("classification_defs_ext.json"))
        );
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.all_slots);
        assert!(!args.no_chart);
    }

    #[test]
    fn log_file_is_required() {
        assert!(CliArgs::try_parse_from(["flow-tracker"]).is_err());
    }
}
