//! Request-driven connection management.
//!
//! Front ends do not touch sessions directly: they hand a [`Request`] to the
//! [`Controller`], which opens, drives and closes the session and reports
//! what happened as [`SessionEvent`]s.

use super::connection::{BatchStatus, EchoSink, Session, SessionEvent};
use crate::core::PreferenceForm;
use crate::error::{Result, TransportError};
use crate::protocol::VariantSelection;
use crate::transport::Transport;
use std::time::Instant;

/// An action requested by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Open a session and ask for the current preferences.
    Connect,
    /// Close the current session.
    Disconnect,
    /// Ask the device for its preferences again.
    Refresh,
    /// Validate and push a form.
    Submit(PreferenceForm),
}

type Connector<T> = Box<dyn FnMut() -> std::result::Result<T, TransportError>>;

/// Owns at most one session and applies requests to it.
pub struct Controller<T: Transport> {
    connector: Connector<T>,
    selection: VariantSelection,
    echo: Option<fn() -> EchoSink>,
    session: Option<Session<T>>,
}

impl<T: Transport> Controller<T> {
    /// Creates a controller that opens transports with `connector`.
    pub fn new<F>(connector: F, selection: VariantSelection) -> Self
    where
        F: FnMut() -> std::result::Result<T, TransportError> + 'static,
    {
        Self {
            connector: Box::new(connector),
            selection,
            echo: None,
            session: None,
        }
    }

    /// Echoes raw device output of every future session to the sink `make` builds.
    #[must_use]
    pub fn with_echo(mut self, make: fn() -> EchoSink) -> Self {
        self.echo = Some(make);
        self
    }

    /// The current session, if any.
    ///
    /// A session the device closed stays available until the next connect
    /// or disconnect, so what it read can still be inspected.
    #[must_use]
    pub fn session(&self) -> Option<&Session<T>> {
        self.session.as_ref()
    }

    /// Returns `true` while a session is active.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_active)
    }

    /// Applies a request.
    pub fn handle(&mut self, request: Request) -> Result<Vec<SessionEvent>> {
        match request {
            Request::Connect => self.connect(),
            Request::Disconnect => Ok(self.disconnect()),
            Request::Refresh => {
                self.active_mut()?.request_preferences()?;
                Ok(Vec::new())
            }
            Request::Submit(form) => {
                self.active_mut()?.submit(&form)?;
                Ok(Vec::new())
            }
        }
    }

    /// Runs one step of the read loop.
    pub fn pump(&mut self) -> Result<Vec<SessionEvent>> {
        match self.session.as_mut() {
            Some(session) if session.is_active() => session.poll(),
            _ => Ok(Vec::new()),
        }
    }

    /// Reads until the current session completes a batch.
    pub fn read_batch(&mut self, deadline: Option<Instant>) -> Result<BatchStatus> {
        self.active_mut()?.read_batch(deadline)
    }

    fn connect(&mut self) -> Result<Vec<SessionEvent>> {
        if self.is_connected() {
            return Err(TransportError::AlreadyConnected.into());
        }
        let transport = (self.connector)()?;
        let description = transport.describe();
        let mut session = Session::open(transport, self.selection);
        if let Some(make) = self.echo {
            session = session.with_echo(make());
        }
        session.request_preferences()?;
        self.session = Some(session);
        Ok(vec![SessionEvent::Connected {
            transport: description,
        }])
    }

    fn disconnect(&mut self) -> Vec<SessionEvent> {
        match self.session.take() {
            Some(mut session) if session.is_active() => {
                session.close();
                vec![SessionEvent::Disconnected]
            }
            _ => Vec::new(),
        }
    }

    fn active_mut(&mut self) -> Result<&mut Session<T>> {
        self.session
            .as_mut()
            .filter(|s| s.is_active())
            .ok_or_else(|| TransportError::NotConnected.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::transport::ScriptedTransport;

    fn controller(chunks: &'static [&'static str]) -> Controller<ScriptedTransport> {
        Controller::new(
            move || Ok(ScriptedTransport::new(chunks.iter().copied())),
            VariantSelection::default(),
        )
    }

    #[test]
    fn test_connect_requests_preferences() {
        let mut c = controller(&[]);
        let events = c.handle(Request::Connect).unwrap();
        assert_eq!(
            events,
            vec![SessionEvent::Connected {
                transport: "scripted".to_string()
            }]
        );
        let written = c.session().unwrap().transport().written_lines();
        assert_eq!(written, vec!["GET_PREFS"]);
    }

    #[test]
    fn test_connect_twice_rejected() {
        let mut c = controller(&["x"]);
        c.handle(Request::Connect).unwrap();
        let err = c.handle(Request::Connect).unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::AlreadyConnected)));
    }

    #[test]
    fn test_requests_without_session_fail() {
        let mut c = controller(&[]);
        assert!(c.handle(Request::Refresh).is_err());
        assert!(c.handle(Request::Submit(PreferenceForm::default())).is_err());
        assert!(c.handle(Request::Disconnect).unwrap().is_empty());
    }

    #[test]
    fn test_disconnect_then_reconnect() {
        let mut c = controller(&["BUSSTOP=1\nSERV"]);
        c.handle(Request::Connect).unwrap();
        c.pump().unwrap();
        assert_eq!(c.handle(Request::Disconnect).unwrap(), vec![SessionEvent::Disconnected]);
        assert!(!c.is_connected());

        c.handle(Request::Connect).unwrap();
        assert!(c.session().unwrap().form().is_empty());
    }

    #[test]
    fn test_failed_connect_leaves_disconnected() {
        let mut c: Controller<ScriptedTransport> = Controller::new(
            || {
                Err(TransportError::OpenFailed {
                    port: "COM9".to_string(),
                    reason: "busy".to_string(),
                })
            },
            VariantSelection::default(),
        );
        assert!(c.handle(Request::Connect).is_err());
        assert!(!c.is_connected());
    }

    #[test]
    fn test_invalid_submit_sends_nothing() {
        let mut c = controller(&["x"]);
        c.handle(Request::Connect).unwrap();
        let err = c.handle(Request::Submit(PreferenceForm::default())).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(c.session().unwrap().transport().written_lines(), vec!["GET_PREFS"]);
    }
}
