use std::{
    fs::File,
    io::{self, BufRead as _, Write as _},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};

use anyhow::{bail, Context as _, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// vMix address, as `host`, `host:port` or a full API URL.
    /// Asked for on the terminal if not specified.
    #[clap(long, short, env = "VMIX_ADDRESS")]
    address: Option<String>,
    /// JSON file overriding the overlay configuration (inputs, channels, timings, ...)
    #[clap(long, short)]
    pub config: Option<PathBuf>,
    /// Poll vMix every X seconds
    #[clap(long, short, default_value_t = 1.0)]
    poll_every: f64,
    /// File to write the log to. If not specified, logs will be written to stderr.
    #[clap(long, short)]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Build the tracing subscriber using parameters from the command line arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be created.
    pub fn init_tracing_subscriber(&self) -> Result<()> {
        let builder = tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env());

        match self.log_file.as_ref() {
            None => builder.with_writer(io::stderr).init(),
            Some(f) => builder
                .with_writer(Mutex::new(File::create(f).with_context(|| {
                    format!("Failed to create log file {}", f.display())
                })?))
                .init(),
        }
        Ok(())
    }

    /// Interval between two status polls
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is not a positive number of seconds.
    pub fn poll_period(&self) -> Result<Duration> {
        match Duration::try_from_secs_f64(self.poll_every) {
            Ok(period) if !period.is_zero() => Ok(period),
            _ => bail!("Poll interval must be a positive number of seconds, got {}", self.poll_every),
        }
    }

    /// The vMix address from the command line, or from the operator if none was given.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read or the address is empty.
    pub fn device_address(&self) -> Result<String> {
        let address = match &self.address {
            Some(address) => address.trim().to_owned(),
            None => {
                print!("vMix address (host[:port]): ");
                io::stdout().flush()?;
                let mut line = String::new();
                io::stdin()
                    .lock()
                    .read_line(&mut line)
                    .context("Failed to read vMix address")?;
                line.trim().to_owned()
            }
        };
        if address.is_empty() {
            bail!("No vMix address given");
        }
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["vmix-titles", "--address", "10.0.0.5"]).unwrap();
        assert_eq!(args.device_address().unwrap(), "10.0.0.5");
        assert_eq!(args.poll_period().unwrap(), Duration::from_secs(1));
        assert_eq!(args.config, None);
    }

    #[test]
    fn poll_period() {
        let args = Args::try_parse_from(["vmix-titles", "-a", "x", "-p", "0.5"]).unwrap();
        assert_eq!(args.poll_period().unwrap(), Duration::from_millis(500));

        for bad in ["0", "nan", "inf"] {
            let args =
                Args::try_parse_from(["vmix-titles", "-a", "x", "--poll-every", bad]).unwrap();
            assert!(args.poll_period().is_err(), "{bad}");
        }
    }

    #[test]
    fn blank_address_is_rejected() {
        let args = Args::try_parse_from(["vmix-titles", "--address", "  "]).unwrap();
        assert!(args.device_address().is_err());
    }
}
