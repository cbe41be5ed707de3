//! Login flow state machine.
//!
//! Drives the email -> code -> session sequence for a host UI. The machine
//! owns the form fields and the inline error message; every transition is
//! the result of either local validation or an `AuthApi` call. While a
//! call is in flight the machine reports inputs as disabled, preventing
//! duplicate submission.

use crate::auth::otp::valid_code;
use crate::client::{ApiError, AuthApi};

/// Shown when the email field is submitted empty.
pub const EMPTY_EMAIL_ERROR: &str = "Please enter your email address";
/// Shown when the entered code is not exactly 6 digits.
pub const INVALID_CODE_ERROR: &str = "Please enter a valid 6-digit code";

const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoginState {
    /// Waiting for an email address.
    CollectingEmail,
    /// A code was sent; waiting for the user to enter it.
    OtpSent,
    /// An `AuthApi` call is in flight.
    Submitting,
}

/// What the host UI should do after a code submission.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VerifyOutcome {
    /// Signed in: perform a full reload so server-side routing
    /// re-evaluates the session.
    Reload,
    /// Stay on the form; the machine carries the error to display.
    Stay,
}

pub struct LoginFlow<A: AuthApi> {
    api: A,
    state: LoginState,
    email: String,
    code: String,
    error: Option<String>,
}

impl<A: AuthApi> LoginFlow<A> {
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: LoginState::CollectingEmail,
            email: String::new(),
            code: String::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> LoginState {
        self.state
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Input controls are disabled while a call is in flight.
    #[must_use]
    pub fn inputs_disabled(&self) -> bool {
        self.state == LoginState::Submitting
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
    }

    /// Submit the email and request a one-time code.
    ///
    /// An empty email never reaches the API; a send failure keeps the form
    /// on the email step with the reported message.
    pub async fn request_code(&mut self) {
        if self.email.trim().is_empty() {
            self.error = Some(EMPTY_EMAIL_ERROR.to_string());
            return;
        }

        self.state = LoginState::Submitting;
        match self.api.send_one_time_code(self.email.trim()).await {
            Ok(()) => {
                self.state = LoginState::OtpSent;
                self.error = None;
            }
            Err(err) => {
                self.state = LoginState::CollectingEmail;
                self.error = Some(user_message(&err));
            }
        }
    }

    /// Submit the entered code for verification.
    ///
    /// A code that is not exactly 6 digits never reaches the API. On
    /// success the machine is done; the host UI reloads and the session
    /// cookie takes over.
    pub async fn submit_code(&mut self) -> VerifyOutcome {
        let code = self.code.trim().to_string();
        if !valid_code(&code) {
            self.error = Some(INVALID_CODE_ERROR.to_string());
            return VerifyOutcome::Stay;
        }

        self.state = LoginState::Submitting;
        match self.api.verify_one_time_code(self.email.trim(), &code).await {
            Ok(()) => VerifyOutcome::Reload,
            Err(err) => {
                self.state = LoginState::OtpSent;
                self.error = Some(user_message(&err));
                VerifyOutcome::Stay
            }
        }
    }

    /// "Use a different email": back to the email step with a clean slate.
    pub fn use_different_email(&mut self) {
        self.state = LoginState::CollectingEmail;
        self.code.clear();
        self.error = None;
    }
}

fn user_message(err: &ApiError) -> String {
    match err {
        ApiError::Operation(message) => message.clone(),
        ApiError::Transport(_) => GENERIC_ERROR.to_string(),
    }
}
