//! A single device connection.
//!
//! A [`Session`] owns the transport and every piece of per-connection parse
//! state. It starts active when opened and becomes closed on request, on
//! stream end, or after a transport failure; closed sessions refuse I/O.

use crate::core::PreferenceForm;
use crate::error::{Result, TransportError, ValidationError};
use crate::protocol::{
    HostCommand, LineOutcome, PreferenceReader, PreferenceSnapshot, ProtocolVariant,
    StreamReassembler, VariantSelection,
};
use crate::transport::{ReadOutcome, Transport, Utf8Decoder};
use std::io::Write;
use std::time::Instant;

/// Read buffer size; serial drivers rarely hand over more per read.
const READ_BUFFER_SIZE: usize = 1024;

/// Destination for the raw device output echo.
pub type EchoSink = Box<dyn Write + Send>;

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Reading and writing are allowed.
    Active,
    /// The transport has been released.
    Closed,
}

/// Something the session observed while reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A form field was written.
    FieldUpdated {
        /// Form field name.
        field: String,
        /// New value.
        value: String,
    },
    /// A full preference batch arrived.
    BatchComplete(PreferenceSnapshot),
    /// The firmware variant became known.
    VariantSelected(ProtocolVariant),
    /// A session was opened.
    Connected {
        /// Transport description.
        transport: String,
    },
    /// The session was closed by request.
    Disconnected,
    /// The device side ended the stream.
    StreamEnded,
}

/// How waiting for a batch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    /// The sentinel arrived.
    Complete(PreferenceSnapshot),
    /// The stream ended first.
    StreamEnded,
    /// The deadline passed first.
    TimedOut,
}

/// An open connection to a device.
pub struct Session<T: Transport> {
    transport: T,
    state: SessionState,
    decoder: Utf8Decoder,
    reassembler: StreamReassembler,
    reader: PreferenceReader,
    form: PreferenceForm,
    echo: Option<EchoSink>,
    read_buf: Vec<u8>,
    batches: usize,
}

impl<T: Transport> Session<T> {
    /// Starts a session over an already opened transport.
    pub fn open(transport: T, selection: VariantSelection) -> Self {
        tracing::info!(transport = %transport.describe(), "session opened");
        Self {
            transport,
            state: SessionState::Active,
            decoder: Utf8Decoder::new(),
            reassembler: StreamReassembler::new(),
            reader: PreferenceReader::new(selection),
            form: PreferenceForm::default(),
            echo: None,
            read_buf: vec![0; READ_BUFFER_SIZE],
            batches: 0,
        }
    }

    /// Copies every raw chunk read from the device to `echo`.
    #[must_use]
    pub fn with_echo(mut self, echo: EchoSink) -> Self {
        self.echo = Some(echo);
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` while the session is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Form as filled in by the device so far.
    #[must_use]
    pub const fn form(&self) -> &PreferenceForm {
        &self.form
    }

    /// Detected or configured variant, if known yet.
    #[must_use]
    pub fn variant(&self) -> Option<ProtocolVariant> {
        self.reader.variant()
    }

    /// Number of completed batches.
    #[must_use]
    pub const fn batches_completed(&self) -> usize {
        self.batches
    }

    /// Underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends one command.
    ///
    /// A write failure closes the session.
    pub fn send(&mut self, command: &HostCommand) -> Result<()> {
        if !self.is_active() {
            return Err(TransportError::NotConnected.into());
        }
        tracing::debug!(%command, "sending command");
        if let Err(e) = self.transport.write_all(&command.encode()) {
            tracing::warn!(error = %e, "write failed, closing session");
            self.close();
            return Err(e.into());
        }
        Ok(())
    }

    /// Asks the device for a preference dump.
    pub fn request_preferences(&mut self) -> Result<()> {
        self.send(&HostCommand::GetPrefs)
    }

    /// Validates `form` and pushes it to the device.
    ///
    /// Commands go out in key-table order. Nothing is sent if validation
    /// fails or the firmware variant is not known yet. Returns the number of
    /// commands written.
    pub fn submit(&mut self, form: &PreferenceForm) -> Result<usize> {
        if !self.is_active() {
            return Err(TransportError::NotConnected.into());
        }
        let variant = self.variant().ok_or(ValidationError::UnknownVariant)?;
        let commands = form.to_commands(variant)?;
        for command in &commands {
            self.send(command)?;
        }
        tracing::info!(commands = commands.len(), "preferences submitted");
        Ok(commands.len())
    }

    /// Performs one read and processes whatever arrived.
    ///
    /// A read failure closes the session; stream end closes it gracefully.
    pub fn poll(&mut self) -> Result<Vec<SessionEvent>> {
        if !self.is_active() {
            return Ok(Vec::new());
        }
        match self.transport.read_chunk(&mut self.read_buf) {
            Ok(ReadOutcome::Data(n)) => {
                let text = self.decoder.decode(&self.read_buf[..n]);
                Ok(self.ingest(&text))
            }
            Ok(ReadOutcome::Idle) => Ok(Vec::new()),
            Ok(ReadOutcome::End) => {
                tracing::info!("device stream ended");
                self.close();
                Ok(vec![SessionEvent::StreamEnded])
            }
            Err(e) => {
                tracing::warn!(error = %e, "read failed, closing session");
                self.close();
                Err(e.into())
            }
        }
    }

    /// Processes decoded device text as if it had just been read.
    pub fn ingest(&mut self, text: &str) -> Vec<SessionEvent> {
        if text.is_empty() || !self.is_active() {
            return Vec::new();
        }
        if let Some(echo) = self.echo.as_mut()
            && let Err(e) = echo.write_all(text.as_bytes()).and_then(|()| echo.flush())
        {
            tracing::debug!(error = %e, "echo sink failed, disabling echo");
            self.echo = None;
        }

        let mut events = Vec::new();
        for line in self.reassembler.feed(text) {
            let was_known = self.reader.variant().is_some();
            let outcome = self.reader.apply_line(&line, &mut self.form);
            if !was_known && let Some(variant) = self.reader.variant() {
                events.push(SessionEvent::VariantSelected(variant));
            }
            match outcome {
                LineOutcome::Ignored => {}
                LineOutcome::Applied { field, value } => {
                    events.push(SessionEvent::FieldUpdated { field, value });
                }
                LineOutcome::BatchComplete {
                    field,
                    value,
                    snapshot,
                } => {
                    self.batches += 1;
                    events.push(SessionEvent::FieldUpdated { field, value });
                    events.push(SessionEvent::BatchComplete(snapshot));
                }
            }
        }
        events
    }

    /// Reads until a batch completes, the stream ends or `deadline` passes.
    pub fn read_batch(&mut self, deadline: Option<Instant>) -> Result<BatchStatus> {
        loop {
            if !self.is_active() {
                return Ok(BatchStatus::StreamEnded);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(BatchStatus::TimedOut);
            }
            for event in self.poll()? {
                match event {
                    SessionEvent::BatchComplete(snapshot) => {
                        return Ok(BatchStatus::Complete(snapshot));
                    }
                    SessionEvent::StreamEnded => return Ok(BatchStatus::StreamEnded),
                    _ => {}
                }
            }
        }
    }

    /// Closes the session, discarding any partial line.
    pub fn close(&mut self) {
        if !self.is_active() {
            return;
        }
        let residual = self.reassembler.flush();
        let undecoded = self.decoder.finish();
        if !residual.is_empty() || !undecoded.is_empty() {
            tracing::debug!(
                partial = %format!("{residual}{undecoded}"),
                "discarding incomplete line on close"
            );
        }
        self.reader.reset();
        self.transport.close();
        self.state = SessionState::Closed;
        tracing::info!("session closed");
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.close();
    }
}
