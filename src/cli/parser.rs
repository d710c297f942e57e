//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use crate::core::PreferenceForm;
use crate::error::{CommandError, Error, Result};
use crate::protocol::{ProtocolVariant, VariantSelection};
use crate::transport::DEFAULT_BAUD_RATE;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Configurator for the bus-arrival notifier.
///
/// Reads and writes the device's preferences over its serial line protocol.
#[derive(Parser, Debug)]
#[command(name = "busnotify")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Serial port the device is attached to.
    #[arg(short, long, env = "BUSNOTIFY_PORT", global = true)]
    pub port: Option<String>,

    /// Serial symbol rate.
    #[arg(short, long, env = "BUSNOTIFY_BAUD", default_value_t = DEFAULT_BAUD_RATE, global = true)]
    pub baud: u32,

    /// Firmware protocol variant (auto, single, dual).
    #[arg(long, env = "BUSNOTIFY_VARIANT", default_value = "auto", global = true)]
    pub variant: String,

    /// Copy raw device output to stderr.
    #[arg(long, global = true)]
    pub echo: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List serial ports on this machine.
    Ports,

    /// Read the device's current preferences.
    Get {
        /// Seconds to wait for a complete batch (0 waits forever).
        #[arg(short, long, default_value = "10")]
        timeout: u64,

        /// Save the preferences as a JSON profile.
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Write preferences to the device.
    ///
    /// Values not given keep what the device reports, unless --no-refresh
    /// is set, in which case the given values must form a complete set.
    Set {
        /// JSON profile to start from; flags override it.
        #[arg(short, long)]
        from_file: Option<PathBuf>,

        /// Preference values.
        #[command(flatten)]
        values: FormArgs,

        /// Do not read the device's current preferences first.
        #[arg(long)]
        no_refresh: bool,

        /// Seconds to wait for the current preferences (0 waits forever).
        #[arg(short, long, default_value = "10")]
        timeout: u64,
    },

    /// Show device output and parsed preference updates until the port closes.
    Monitor,

    /// Parse a captured device log offline.
    Replay {
        /// Capture file.
        file: PathBuf,

        /// Bytes per simulated read (0 feeds the whole file at once).
        #[arg(long, default_value = "64")]
        chunk_size: usize,
    },
}

/// Preference values given on the command line.
#[derive(Args, Debug, Clone, Default)]
pub struct FormArgs {
    /// Bus stop code.
    #[arg(long)]
    pub bus_stop: Option<String>,

    /// First (or only) service number.
    #[arg(long)]
    pub service: Option<String>,

    /// Second service number (dual-service firmware).
    #[arg(long)]
    pub service2: Option<String>,

    /// Start of the active window, HH:MM.
    #[arg(long)]
    pub start: Option<String>,

    /// End of the active window, HH:MM.
    #[arg(long)]
    pub end: Option<String>,

    /// Minutes of warning before the bus arrives.
    #[arg(long)]
    pub lead_time: Option<String>,

    /// WiFi network name.
    #[arg(long)]
    pub wifi_ssid: Option<String>,

    /// WiFi password.
    #[arg(long, env = "BUSNOTIFY_WIFI_PASSWORD", hide_env_values = true)]
    pub wifi_password: Option<String>,
}

impl FormArgs {
    /// Collects the given values into a form; absent values stay empty.
    #[must_use]
    pub fn to_form(&self) -> PreferenceForm {
        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        PreferenceForm {
            bus_stop: value(&self.bus_stop),
            service_no: value(&self.service),
            service_no_2: value(&self.service2),
            start_time: value(&self.start),
            end_time: value(&self.end),
            lead_time: value(&self.lead_time),
            wifi_ssid: value(&self.wifi_ssid),
            wifi_password: value(&self.wifi_password),
        }
    }
}

impl Cli {
    /// Returns the port name, or an error if none was given.
    pub fn port_name(&self) -> Result<&str> {
        self.port
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| CommandError::MissingArgument("--port (or BUSNOTIFY_PORT)".to_string()).into())
    }

    /// Resolves `--variant` into a selection.
    pub fn variant_selection(&self) -> Result<VariantSelection> {
        if self.variant.eq_ignore_ascii_case("auto") {
            return Ok(VariantSelection::Detect);
        }
        self.variant
            .parse::<ProtocolVariant>()
            .map(VariantSelection::Fixed)
            .map_err(|message| Error::Config { message })
    }

    /// Default log filter for the requested verbosity.
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn make_cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("busnotify").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = make_cli(&["--port", "/dev/ttyUSB0", "get"]);
        assert_eq!(cli.baud, DEFAULT_BAUD_RATE);
        assert_eq!(cli.port_name().unwrap(), "/dev/ttyUSB0");
        assert_eq!(cli.variant_selection().unwrap(), VariantSelection::default());
        assert_eq!(cli.log_level(), "warn");
        assert!(matches!(
            cli.command,
            Commands::Get {
                timeout: 10,
                save: None
            }
        ));
    }

    #[test]
    fn test_variant_selection() {
        let cli = make_cli(&["--variant", "single", "monitor"]);
        assert_eq!(
            cli.variant_selection().unwrap(),
            VariantSelection::Fixed(ProtocolVariant::SingleService)
        );

        let cli = make_cli(&["--variant", "quad", "monitor"]);
        assert!(matches!(cli.variant_selection(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_port() {
        let cli = Cli {
            port: None,
            baud: DEFAULT_BAUD_RATE,
            variant: "auto".to_string(),
            echo: false,
            verbose: 0,
            format: "text".to_string(),
            command: Commands::Monitor,
        };
        assert!(matches!(
            cli.port_name(),
            Err(Error::Command(CommandError::MissingArgument(_)))
        ));
    }

    #[test]
    fn test_set_values_to_form() {
        let cli = make_cli(&[
            "set",
            "--bus-stop",
            "83139",
            "--service",
            "12",
            "--start",
            "06:00",
            "--no-refresh",
        ]);
        let Commands::Set {
            values, no_refresh, ..
        } = cli.command
        else {
            unreachable!("parsed a set command");
        };
        assert!(no_refresh);
        let form = values.to_form();
        assert_eq!(form.bus_stop, "83139");
        assert_eq!(form.service_no, "12");
        assert_eq!(form.start_time, "06:00");
        assert!(form.end_time.is_empty());
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(make_cli(&["-v", "ports"]).log_level(), "info");
        assert_eq!(make_cli(&["-vv", "ports"]).log_level(), "debug");
    }
}
