//! Client side of the invitation lookup: the phone-number form controller
//! and the HTTP transport it submits through.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{
    domain::InvitationRecord,
    phone::{normalize_input, precheck, PhoneInputError, PHONE_NUMBER_LEN},
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

pub mod error;
pub mod transport;

pub use error::LookupError;
pub use transport::{HttpLookupClient, LookupTransport};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub phone_number: String,
    pub is_searching: bool,
    pub result: Option<InvitationRecord>,
    pub error: Option<String>,
}

impl FormState {
    pub fn digit_count(&self) -> usize {
        self.phone_number.len()
    }

    /// Mirrors the enabled state of the search button.
    pub fn can_submit(&self) -> bool {
        !self.is_searching && self.digit_count() == PHONE_NUMBER_LEN
    }

    /// The letter link, only when the result has one that is an absolute URL.
    pub fn letter_link(&self) -> Option<Url> {
        let raw = self.result.as_ref()?.letter_url()?;
        Url::parse(raw).ok()
    }
}

/// Key presses delivered to the phone input. The caret is always at the end
/// of the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKey {
    Char(char),
    Backspace,
    Delete,
    Tab,
    Enter,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    /// Ctrl or Cmd held together with a character key.
    Shortcut(char),
}

#[derive(Debug)]
pub enum KeyOutcome {
    /// The value was rewritten; result and error were cleared.
    Edited,
    /// Allowed key with nothing to do.
    Ignored,
    /// Disallowed key, or an edit while a search runs; the value is unchanged.
    Blocked,
    Submitted(Submission),
}

#[derive(Debug)]
pub enum Submission {
    /// The request is in flight on its own task.
    Started(JoinHandle<()>),
    /// Refused before any request was sent; the message is in `FormState::error`.
    Blocked(PhoneInputError),
    /// A previous search has not finished yet.
    Busy,
}

impl Submission {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }

    /// Waits for a started search to settle the form state.
    pub async fn wait(self) {
        if let Self::Started(handle) = self {
            if let Err(error) = handle.await {
                warn!(%error, "lookup task ended abnormally");
            }
        }
    }
}

/// Phone-number lookup form.
///
/// Every edit is normalized to at most ten ASCII digits. Submitting spawns
/// the request on the current tokio runtime, so callers never block on the
/// network and can poll [`LookupForm::snapshot`] while it runs.
#[derive(Clone)]
pub struct LookupForm {
    transport: Arc<dyn LookupTransport>,
    state: Arc<Mutex<FormState>>,
}

impl LookupForm {
    pub fn new(transport: impl LookupTransport + 'static) -> Self {
        Self::with_transport(Arc::new(transport))
    }

    pub fn with_transport(transport: Arc<dyn LookupTransport>) -> Self {
        Self {
            transport,
            state: Arc::new(Mutex::new(FormState::default())),
        }
    }

    pub fn snapshot(&self) -> FormState {
        lock(&self.state).clone()
    }

    /// Replaces the value with `raw`, as a change event on the input would.
    /// The input is disabled while a search runs, so this is then a no-op.
    pub fn input(&self, raw: &str) {
        self.replace_value(raw);
    }

    /// Pasting replaces the whole value with the digits of `text`.
    pub fn paste(&self, text: &str) {
        self.input(text);
    }

    fn replace_value(&self, raw: &str) -> bool {
        let mut state = lock(&self.state);
        if state.is_searching {
            return false;
        }
        state.phone_number = normalize_input(raw);
        state.error = None;
        state.result = None;
        true
    }

    pub fn key_down(&self, key: FormKey) -> KeyOutcome {
        match key {
            FormKey::Enter => KeyOutcome::Submitted(self.submit()),
            FormKey::Char(ch) if ch.is_ascii_digit() => {
                let state = self.snapshot();
                if state.is_searching {
                    return KeyOutcome::Blocked;
                }
                // A full field swallows the key without a change event.
                if state.digit_count() >= PHONE_NUMBER_LEN {
                    return KeyOutcome::Ignored;
                }
                let mut value = state.phone_number;
                value.push(ch);
                self.edited(&value)
            }
            FormKey::Char(_) => KeyOutcome::Blocked,
            FormKey::Backspace => {
                let state = self.snapshot();
                if state.is_searching {
                    return KeyOutcome::Blocked;
                }
                let mut value = state.phone_number;
                if value.pop().is_none() {
                    return KeyOutcome::Ignored;
                }
                self.edited(&value)
            }
            FormKey::Shortcut(ch) if matches!(ch.to_ascii_lowercase(), 'a' | 'c' | 'v' | 'x') => {
                KeyOutcome::Ignored
            }
            FormKey::Shortcut(_) => KeyOutcome::Blocked,
            FormKey::Delete
            | FormKey::Tab
            | FormKey::ArrowLeft
            | FormKey::ArrowRight
            | FormKey::ArrowUp
            | FormKey::ArrowDown
            | FormKey::Home
            | FormKey::End => KeyOutcome::Ignored,
        }
    }

    fn edited(&self, value: &str) -> KeyOutcome {
        if self.replace_value(value) {
            KeyOutcome::Edited
        } else {
            KeyOutcome::Blocked
        }
    }

    /// Validates the current value and, if it passes, starts the lookup.
    ///
    /// On a started search the form ends with exactly one of `result` or
    /// `error` set and `is_searching` back to false, whatever the outcome.
    pub fn submit(&self) -> Submission {
        let phone_number = {
            let mut state = lock(&self.state);
            if state.is_searching {
                return Submission::Busy;
            }
            if let Err(err) = precheck(&state.phone_number) {
                state.error = Some(err.to_string());
                return Submission::Blocked(err);
            }
            state.is_searching = true;
            state.result = None;
            state.error = None;
            state.phone_number.clone()
        };

        let transport = Arc::clone(&self.transport);
        let guard = SearchingGuard(Arc::clone(&self.state));
        Submission::Started(tokio::spawn(async move {
            let outcome = transport.search(&phone_number).await;
            {
                let mut state = lock(&guard.0);
                match outcome {
                    Ok(record) => state.result = Some(record),
                    Err(err) => {
                        debug!(error = %err, "lookup failed");
                        state.error = Some(err.user_message());
                    }
                }
            }
            drop(guard);
        }))
    }
}

/// Clears `is_searching` when the lookup task ends, including by panic or
/// cancellation.
struct SearchingGuard(Arc<Mutex<FormState>>);

impl Drop for SearchingGuard {
    fn drop(&mut self) {
        lock(&self.0).is_searching = false;
    }
}

fn lock(state: &Mutex<FormState>) -> MutexGuard<'_, FormState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
