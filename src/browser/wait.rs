use super::{BrowserSession, Locator, SessionError};
use std::fmt;
use std::time::Duration;
use tracing::{error, info};

/// Result of a best-effort input or click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Performed,
    Skipped(InteractionFault),
}

impl Interaction {
    pub fn fault(&self) -> Option<&InteractionFault> {
        match self {
            Self::Performed => None,
            Self::Skipped(fault) => Some(fault),
        }
    }
}

/// A UI interaction that did not happen. The flow keeps going, so later steps
/// may act on a page that is not in the expected state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionFault {
    NotFound { locator: Locator, timeout: Duration },
    NotInteractable { locator: Locator, reason: String },
    ClickIntercepted { locator: Locator, reason: String },
}

impl InteractionFault {
    pub fn locator(&self) -> &Locator {
        match self {
            Self::NotFound { locator, .. }
            | Self::NotInteractable { locator, .. }
            | Self::ClickIntercepted { locator, .. } => locator,
        }
    }
}

impl fmt::Display for InteractionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { locator, timeout } => {
                write!(f, "{locator} not present after {timeout:?}")
            }
            Self::NotInteractable { locator, reason } => {
                write!(f, "{locator} did not accept input: {reason}")
            }
            Self::ClickIntercepted { locator, reason } => {
                write!(f, "click on {locator} was intercepted: {reason}")
            }
        }
    }
}

pub fn wait_for_presence<S: BrowserSession>(
    session: &mut S,
    locator: &Locator,
    timeout: Duration,
) -> Result<S::Element, SessionError> {
    session.find(locator, timeout)
}

pub fn wait_and_input<S: BrowserSession>(
    session: &mut S,
    locator: &Locator,
    text: &str,
    timeout: Duration,
) -> Result<Interaction, SessionError> {
    let element = match present_or_fault(session, locator, timeout)? {
        Ok(element) => element,
        Err(fault) => return Ok(skipped(fault)),
    };

    match session.send_keys(&element, text) {
        Ok(()) => Ok(Interaction::Performed),
        Err(SessionError::Rejected(reason)) => Ok(skipped(InteractionFault::NotInteractable {
            locator: *locator,
            reason,
        })),
        Err(err) => Err(err),
    }
}

pub fn wait_and_click<S: BrowserSession>(
    session: &mut S,
    locator: &Locator,
    timeout: Duration,
) -> Result<Interaction, SessionError> {
    let element = match present_or_fault(session, locator, timeout)? {
        Ok(element) => element,
        Err(fault) => return Ok(skipped(fault)),
    };

    match session.click(&element) {
        Ok(()) => Ok(Interaction::Performed),
        Err(SessionError::Rejected(reason)) => Ok(skipped(InteractionFault::ClickIntercepted {
            locator: *locator,
            reason,
        })),
        Err(err) => Err(err),
    }
}

pub fn wait_until_visible<S: BrowserSession>(
    session: &mut S,
    locator: &Locator,
    timeout: Duration,
) -> Result<bool, SessionError> {
    let visible = session.is_visible_within(locator, timeout)?;
    if visible {
        info!(%locator, "element is visible");
    } else {
        error!(%locator, ?timeout, "element is not visible");
    }
    Ok(visible)
}

fn present_or_fault<S: BrowserSession>(
    session: &mut S,
    locator: &Locator,
    timeout: Duration,
) -> Result<Result<S::Element, InteractionFault>, SessionError> {
    match wait_for_presence(session, locator, timeout) {
        Ok(element) => Ok(Ok(element)),
        Err(SessionError::NotFound { locator, timeout }) => {
            Ok(Err(InteractionFault::NotFound { locator, timeout }))
        }
        Err(err) => Err(err),
    }
}

fn skipped(fault: InteractionFault) -> Interaction {
    error!(locator = %fault.locator(), %fault, "interaction skipped");
    Interaction::Skipped(fault)
}
