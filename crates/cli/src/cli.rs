#![forbid(unsafe_code)]

use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::{Path, PathBuf};

/// pfslot: bounded prefetch slot manager
///
/// Reads prefetch commands line by line (from a script file or stdin) and
/// keeps the resulting prefetches in a bounded table that evicts the oldest
/// entry when full. Send SIGUSR1 to print the table and SIGUSR2 to reload the
/// config file.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short, long, value_parser = validate_file)]
    pub conffile: Option<PathBuf>,

    /// Path to log file.
    ///
    /// Overrides the config file. Logs go to stderr when neither is set.
    #[arg(short, long)]
    pub logfile: Option<PathBuf>,

    /// Print the effective configuration as TOML to this path and exit.
    #[arg(long)]
    pub dump_config: Option<PathBuf>,

    /// Script of commands to run instead of reading stdin.
    #[arg(value_parser = validate_file)]
    pub script: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.exists() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn rejects_missing_conffile() {
        let err = Cli::try_parse_from(["pfslot", "--conffile", "/no/such/file.toml"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_script_and_logfile() {
        let script = tempfile::NamedTempFile::new().unwrap();
        let args: Vec<std::ffi::OsString> = vec![
            "pfslot".into(),
            "--logfile".into(),
            "/tmp/pfslot.log".into(),
            script.path().as_os_str().to_owned(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.logfile, Some(PathBuf::from("/tmp/pfslot.log")));
        assert_eq!(cli.script.as_deref(), Some(script.path()));
        assert_eq!(cli.conffile, None);
    }
}
