mod wait;
pub mod webdriver;

use std::fmt;
use std::time::Duration;

pub use wait::{
    wait_and_click, wait_and_input, wait_for_presence, wait_until_visible, Interaction,
    InteractionFault,
};
pub use webdriver::WebDriverSession;

/// Element lookups take 10 seconds before giving up.
pub const DEFAULT_ELEMENT_TIMEOUT: Duration = Duration::from_secs(10);
/// Visibility checks get a little longer because they follow page transitions.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Id,
    XPath,
    Css,
}

impl Strategy {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::XPath => "xpath",
            Self::Css => "css",
        }
    }
}

/// Identifies one element on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locator {
    pub strategy: Strategy,
    pub selector: &'static str,
}

impl Locator {
    pub const fn id(selector: &'static str) -> Self {
        Self {
            strategy: Strategy::Id,
            selector,
        }
    }

    pub const fn xpath(selector: &'static str) -> Self {
        Self {
            strategy: Strategy::XPath,
            selector,
        }
    }

    pub const fn css(selector: &'static str) -> Self {
        Self {
            strategy: Strategy::Css,
            selector,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.label(), self.selector)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no element matched {locator} within {timeout:?}")]
    NotFound { locator: Locator, timeout: Duration },
    #[error("element rejected the action: {0}")]
    Rejected(String),
    #[error("webdriver failure: {0}")]
    Driver(String),
}

/// A browser the portal flow can drive.
///
/// Every method blocks until the browser answers or its own timeout runs out.
/// `close` consumes the session, so a released browser cannot be driven again.
pub trait BrowserSession {
    type Element;

    fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Waits up to `timeout` for an element matching `locator` to be attached to the page.
    fn find(&mut self, locator: &Locator, timeout: Duration)
        -> Result<Self::Element, SessionError>;

    /// Fails with [`SessionError::Rejected`] when the element cannot take keyboard input.
    fn send_keys(&mut self, element: &Self::Element, text: &str) -> Result<(), SessionError>;

    /// Fails with [`SessionError::Rejected`] when another element intercepts the click.
    fn click(&mut self, element: &Self::Element) -> Result<(), SessionError>;

    fn is_visible_within(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<bool, SessionError>;

    fn close(self) -> Result<(), SessionError>
    where
        Self: Sized;
}
