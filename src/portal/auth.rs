use super::locators::{EMAIL_FIELD, LOGIN_BUTTON, PASSWORD_FIELD, PROFILE_ACTIONS};
use crate::browser::{
    wait_and_click, wait_and_input, wait_until_visible, BrowserSession, InteractionFault,
    Locator, SessionError, DEFAULT_ELEMENT_TIMEOUT, DEFAULT_VISIBILITY_TIMEOUT,
};
use crate::config::{PortalConfig, Secret};
use std::fmt;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Unauthenticated,
    CredentialsEntered,
    Submitted,
    Authenticated,
    Failed,
}

impl LoginState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::CredentialsEntered => "credentials entered",
            Self::Submitted => "submitted",
            Self::Authenticated => "authenticated",
            Self::Failed => "failed",
        }
    }
}

#[derive(Clone)]
pub enum StepAction {
    Navigate { url: String },
    Input { field: Locator, value: Secret },
    Click { target: Locator },
    AwaitVisible { marker: Locator },
}

impl fmt::Debug for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate { url } => write!(f, "Navigate({url})"),
            Self::Input { field, .. } => write!(f, "Input({field})"),
            Self::Click { target } => write!(f, "Click({target})"),
            Self::AwaitVisible { marker } => write!(f, "AwaitVisible({marker})"),
        }
    }
}

/// One login step and the state the flow is in once it has run.
#[derive(Debug, Clone)]
pub struct LoginStep {
    pub action: StepAction,
    pub timeout: Duration,
    pub reaches: LoginState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginTimeouts {
    pub element: Duration,
    pub marker: Duration,
}

impl Default for LoginTimeouts {
    fn default() -> Self {
        Self {
            element: DEFAULT_ELEMENT_TIMEOUT,
            marker: DEFAULT_VISIBILITY_TIMEOUT,
        }
    }
}

/// What a successful login went through. Skipped inputs and clicks did not
/// stop the flow, but they are kept here for callers to inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginReport {
    pub state: LoginState,
    pub faults: Vec<InteractionFault>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("login failed, {marker} is not visible after {timeout:?}")]
    MarkerNotVisible {
        marker: Locator,
        timeout: Duration,
        faults: Vec<InteractionFault>,
    },
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Signs into the portal by running a fixed list of steps.
#[derive(Debug, Clone)]
pub struct Authenticator {
    steps: Vec<LoginStep>,
}

impl Authenticator {
    pub fn new(portal: &PortalConfig) -> Self {
        Self::with_timeouts(portal, LoginTimeouts::default())
    }

    pub fn with_timeouts(portal: &PortalConfig, timeouts: LoginTimeouts) -> Self {
        let steps = vec![
            LoginStep {
                action: StepAction::Navigate {
                    url: portal.domain_url.clone(),
                },
                timeout: Duration::ZERO,
                reaches: LoginState::Unauthenticated,
            },
            LoginStep {
                action: StepAction::Input {
                    field: EMAIL_FIELD,
                    value: Secret::new(portal.email.clone()),
                },
                timeout: timeouts.element,
                reaches: LoginState::Unauthenticated,
            },
            LoginStep {
                action: StepAction::Input {
                    field: PASSWORD_FIELD,
                    value: portal.password.clone(),
                },
                timeout: timeouts.element,
                reaches: LoginState::CredentialsEntered,
            },
            LoginStep {
                action: StepAction::Click {
                    target: LOGIN_BUTTON,
                },
                timeout: timeouts.element,
                reaches: LoginState::Submitted,
            },
            LoginStep {
                action: StepAction::AwaitVisible {
                    marker: PROFILE_ACTIONS,
                },
                timeout: timeouts.marker,
                reaches: LoginState::Authenticated,
            },
        ];
        Self { steps }
    }

    pub fn steps(&self) -> &[LoginStep] {
        &self.steps
    }

    /// Runs every step once. The only fatal outcome besides a dead driver is
    /// the post-login marker staying hidden; there is no second attempt.
    pub fn login<S: BrowserSession>(&self, session: &mut S) -> Result<LoginReport, LoginError> {
        let mut state = LoginState::Unauthenticated;
        let mut faults = Vec::new();

        for step in &self.steps {
            match &step.action {
                StepAction::Navigate { url } => session.navigate(url)?,
                StepAction::Input { field, value } => {
                    let outcome = wait_and_input(session, field, value.expose(), step.timeout)?;
                    faults.extend(outcome.fault().cloned());
                }
                StepAction::Click { target } => {
                    let outcome = wait_and_click(session, target, step.timeout)?;
                    faults.extend(outcome.fault().cloned());
                }
                StepAction::AwaitVisible { marker } => {
                    if !wait_until_visible(session, marker, step.timeout)? {
                        state = LoginState::Failed;
                        error!(state = state.label(), %marker, "login failed");
                        return Err(LoginError::MarkerNotVisible {
                            marker: *marker,
                            timeout: step.timeout,
                            faults,
                        });
                    }
                }
            }

            if step.reaches != state {
                state = step.reaches;
                info!(state = state.label(), "login progressed");
            }
        }

        Ok(LoginReport { state, faults })
    }
}
