//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::cli::output::{
    OutputFormat, PreferenceReport, format_event, format_ports, format_report, format_submit,
};
use crate::cli::parser::{Cli, Commands, FormArgs};
use crate::core::PreferenceForm;
use crate::error::{CommandError, Result};
use crate::io::{read_capture, read_profile, write_profile};
use crate::protocol::{ProtocolVariant, VariantSelection};
use crate::session::{BatchStatus, Controller, EchoSink, Request, Session, SessionEvent};
use crate::transport::{ScriptedTransport, SerialTransport, Transport, list_ports};
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

/// Executes the CLI command.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format)?;

    match &cli.command {
        Commands::Ports => cmd_ports(format),
        Commands::Get { timeout, save } => cmd_get(cli, *timeout, save.as_deref(), format),
        Commands::Set {
            from_file,
            values,
            no_refresh,
            timeout,
        } => cmd_set(
            cli,
            from_file.as_deref(),
            values,
            *no_refresh,
            *timeout,
            format,
        ),
        Commands::Monitor => cmd_monitor(cli, format),
        Commands::Replay { file, chunk_size } => {
            cmd_replay(file, *chunk_size, cli.variant_selection()?, format)
        }
    }
}

/// Builds a controller for the serial port named on the command line.
fn serial_controller(cli: &Cli, echo: bool) -> Result<Controller<SerialTransport>> {
    let port = cli.port_name()?.to_string();
    let baud = cli.baud;
    let controller = Controller::new(
        move || SerialTransport::open(&port, baud),
        cli.variant_selection()?,
    );
    Ok(if echo {
        controller.with_echo(stderr_echo)
    } else {
        controller
    })
}

fn stderr_echo() -> EchoSink {
    Box::new(io::stderr())
}

/// Variant to submit with; refuses to guess when the device never revealed it.
fn known_variant<T: Transport>(session: Option<&Session<T>>) -> Result<ProtocolVariant> {
    session.and_then(Session::variant).ok_or_else(|| {
        CommandError::MissingArgument(
            "--variant (the device did not report its firmware variant)".to_string(),
        )
        .into()
    })
}

/// Converts a `--timeout` value into a deadline; zero means none.
fn deadline(timeout_secs: u64) -> Option<Instant> {
    (timeout_secs > 0).then(|| Instant::now() + Duration::from_secs(timeout_secs))
}

// ==================== Command Implementations ====================

fn cmd_ports(format: OutputFormat) -> Result<String> {
    let ports = list_ports()?;
    Ok(format_ports(&ports, format))
}

fn cmd_get(cli: &Cli, timeout: u64, save: Option<&Path>, format: OutputFormat) -> Result<String> {
    let mut controller = serial_controller(cli, cli.echo)?;
    controller.handle(Request::Connect)?;
    let status = controller.read_batch(deadline(timeout))?;

    let (form, variant, batches) = match controller.session() {
        Some(session) => (
            session.form().clone(),
            session.variant(),
            session.batches_completed(),
        ),
        None => (PreferenceForm::default(), None, 0),
    };
    controller.handle(Request::Disconnect)?;

    if matches!(status, BatchStatus::TimedOut) {
        tracing::warn!(timeout, "no complete preference batch before timeout");
    }
    let complete = matches!(status, BatchStatus::Complete(_));

    if let Some(path) = save {
        if !complete {
            return Err(CommandError::ExecutionFailed(
                "device did not report a complete preference set; profile not saved".to_string(),
            )
            .into());
        }
        write_profile(path, &form)?;
        tracing::info!(path = %path.display(), "profile saved");
    }

    let report = PreferenceReport {
        source: cli.port_name()?.to_string(),
        variant,
        complete,
        batches,
        preferences: &form,
    };
    Ok(format_report(&report, format))
}

fn cmd_set(
    cli: &Cli,
    from_file: Option<&Path>,
    values: &FormArgs,
    no_refresh: bool,
    timeout: u64,
    format: OutputFormat,
) -> Result<String> {
    let mut requested = match from_file {
        Some(path) => read_profile(path)?,
        None => PreferenceForm::default(),
    };
    requested.merge(&values.to_form());
    if requested.is_empty() {
        return Err(CommandError::MissingArgument(
            "at least one preference value or --from-file".to_string(),
        )
        .into());
    }

    let mut controller = serial_controller(cli, cli.echo)?;
    controller.handle(Request::Connect)?;

    let mut form = requested.clone();
    if !no_refresh {
        match controller.read_batch(deadline(timeout))? {
            BatchStatus::Complete(_) => {}
            BatchStatus::TimedOut => tracing::warn!(
                timeout,
                "device did not report its preferences in time; sending given values only"
            ),
            BatchStatus::StreamEnded => {
                return Err(CommandError::ExecutionFailed(
                    "device closed the connection before reporting its preferences".to_string(),
                )
                .into());
            }
        }
        if let Some(session) = controller.session() {
            form = session.form().clone();
            form.merge(&requested);
        }
    }

    let variant = known_variant(controller.session())?;
    controller.handle(Request::Submit(form.clone()))?;
    controller.handle(Request::Disconnect)?;

    let commands = variant.key_table().bindings().len();
    Ok(format_submit(&form, variant, commands, format))
}

fn cmd_monitor(cli: &Cli, format: OutputFormat) -> Result<String> {
    let mut controller = serial_controller(cli, true)?;
    let mut stdout = io::stdout();

    let mut emit = |events: &[SessionEvent]| -> Result<()> {
        for event in events {
            writeln!(stdout, "{}", format_event(event, format))?;
        }
        stdout.flush()?;
        Ok(())
    };

    emit(&controller.handle(Request::Connect)?)?;
    let mut batches = 0usize;
    loop {
        let events = controller.pump()?;
        batches += events
            .iter()
            .filter(|e| matches!(e, SessionEvent::BatchComplete(_)))
            .count();
        emit(&events)?;
        if events.contains(&SessionEvent::StreamEnded) || !controller.is_connected() {
            break;
        }
    }

    Ok(match format {
        OutputFormat::Text => format!("{batches} preference batches received\n"),
        OutputFormat::Json => String::new(),
    })
}

fn cmd_replay(
    file: &Path,
    chunk_size: usize,
    selection: VariantSelection,
    format: OutputFormat,
) -> Result<String> {
    let capture = read_capture(file)?;
    let mut session = Session::open(ScriptedTransport::chunked(&capture, chunk_size), selection);

    let mut updates = 0usize;
    while session.is_active() {
        updates += session
            .poll()?
            .iter()
            .filter(|e| matches!(e, SessionEvent::FieldUpdated { .. }))
            .count();
    }
    tracing::info!(updates, batches = session.batches_completed(), "replay finished");

    let report = PreferenceReport {
        source: file.display().to_string(),
        variant: session.variant(),
        complete: session.batches_completed() > 0,
        batches: session.batches_completed(),
        preferences: session.form(),
    };
    Ok(format_report(&report, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn replay_cli(file: &Path, format: &str) -> Cli {
        Cli {
            port: None,
            baud: crate::transport::DEFAULT_BAUD_RATE,
            variant: "auto".to_string(),
            echo: false,
            verbose: 0,
            format: format.to_string(),
            command: Commands::Replay {
                file: file.to_path_buf(),
                chunk_size: 7,
            },
        }
    }

    #[test]
    fn test_replay_dual_service_capture() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("capture.log");
        std::fs::write(
            &path,
            "ets Jun  8 2016 00:22:57\r\nrst:0x1 (POWERON_RESET)\r\nBUSSTOP=83139\r\nSERVICE1=12\r\nSERVICE2=858\r\nSTART=360\r\nEND=1320\r\nLEADTIME=5\r\nWIFI_SSID=Foo\r\nWIFI_PASSWORD=bar\r\n",
        )
        .unwrap();

        let output = execute(&replay_cli(&path, "json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["variant"], "dual_service");
        assert_eq!(json["complete"], true);
        assert_eq!(json["batches"], 1);
        assert_eq!(json["preferences"]["busStop"], "83139");
        assert_eq!(json["preferences"]["startTime"], "06:00");
        assert_eq!(json["preferences"]["endTime"], "22:00");
        assert_eq!(json["preferences"]["wifiPassword"], "bar");
    }

    #[test]
    fn test_replay_truncated_capture() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("partial.log");
        std::fs::write(&path, "BUSSTOP=1\nSERVICE=7\nLEADTI").unwrap();

        let output = execute(&replay_cli(&path, "text")).unwrap();
        assert!(output.contains("single-service, incomplete"));
        assert!(output.contains("Service:"));
    }

    #[test]
    fn test_replay_missing_file() {
        let cli = replay_cli(Path::new("/nonexistent/capture.log"), "text");
        assert!(execute(&cli).is_err());
    }

    #[test]
    fn test_get_requires_port() {
        let cli = Cli {
            port: None,
            baud: crate::transport::DEFAULT_BAUD_RATE,
            variant: "auto".to_string(),
            echo: false,
            verbose: 0,
            format: "text".to_string(),
            command: Commands::Get {
                timeout: 1,
                save: None,
            },
        };
        let err = execute(&cli).unwrap_err();
        assert!(err.to_string().contains("--port"));
    }

    #[test]
    fn test_set_requires_values() {
        let cli = Cli {
            port: Some("/dev/null-port".to_string()),
            baud: crate::transport::DEFAULT_BAUD_RATE,
            variant: "dual".to_string(),
            echo: false,
            verbose: 0,
            format: "text".to_string(),
            command: Commands::Set {
                from_file: None,
                values: FormArgs::default(),
                no_refresh: true,
                timeout: 1,
            },
        };
        let err = execute(&cli).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Command(CommandError::MissingArgument(_))
        ));
    }

    #[test]
    fn test_set_needs_variant_when_device_is_silent() {
        let silent = Session::open(ScriptedTransport::new([""]), VariantSelection::Detect);
        let err = known_variant(Some(&silent)).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Command(CommandError::MissingArgument(_))
        ));
        assert!(err.to_string().contains("--variant"));

        let fixed = Session::open(
            ScriptedTransport::new([""]),
            VariantSelection::Fixed(ProtocolVariant::SingleService),
        );
        assert_eq!(
            known_variant(Some(&fixed)).unwrap(),
            ProtocolVariant::SingleService
        );

        let mut reported = Session::open(
            ScriptedTransport::new(["BUSSTOP=1\nSERVICE=\n"]),
            VariantSelection::Detect,
        );
        reported.poll().unwrap();
        assert_eq!(
            known_variant(Some(&reported)).unwrap(),
            ProtocolVariant::SingleService
        );
        assert!(known_variant::<ScriptedTransport>(None).is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let mut cli = replay_cli(Path::new("/nonexistent/capture.log"), "yaml");
        cli.command = Commands::Ports;
        let err = execute(&cli).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Command(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_deadline() {
        assert!(deadline(0).is_none());
        assert!(deadline(5).is_some_and(|d| d > Instant::now()));
    }
}
