use super::{BrowserSession, Locator, SessionError, Strategy};
use crate::config::WebDriverConfig;
use serde_json::json;
use std::time::Duration;
use thirtyfour::error::WebDriverErrorInner;
use thirtyfour::prelude::*;
use thirtyfour::{ChromeCapabilities, ChromiumLikeCapabilities};
use tokio::runtime::Runtime;
use tracing::{debug, info};

const QUERY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Chrome driven through a chromedriver endpoint.
///
/// Owns a current-thread runtime and blocks on every command, so the portal
/// flow stays synchronous.
pub struct WebDriverSession {
    driver: WebDriver,
    runtime: Runtime,
}

impl WebDriverSession {
    /// Starts a new Chrome session that downloads into `config.download_dir` without prompting.
    pub fn launch(config: &WebDriverConfig) -> Result<Self, SessionError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| SessionError::Driver(format!("runtime unavailable: {err}")))?;

        let capabilities = chrome_capabilities(config)?;
        let driver = runtime
            .block_on(WebDriver::new(config.url.as_str(), capabilities))
            .map_err(driver_error)?;

        info!(
            url = %config.url,
            download_dir = %config.download_dir.display(),
            headless = config.headless,
            "browser session started"
        );
        Ok(Self { driver, runtime })
    }
}

impl std::fmt::Debug for WebDriverSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDriverSession").finish_non_exhaustive()
    }
}

fn chrome_capabilities(config: &WebDriverConfig) -> Result<ChromeCapabilities, SessionError> {
    let mut caps = DesiredCapabilities::chrome();
    let prefs = json!({
        "download.default_directory": config.download_dir.display().to_string(),
        "download.prompt_for_download": false,
        "download.directory_upgrade": true,
        "safebrowsing.enabled": true,
    });
    caps.add_experimental_option("prefs", prefs)
        .map_err(driver_error)?;

    for arg in [
        "--start-maximized",
        "--disable-gpu",
        "--disable-extensions",
        "--disable-features=EnableEphemeralFlashPermission",
    ] {
        caps.add_arg(arg).map_err(driver_error)?;
    }
    if config.headless {
        caps.set_headless().map_err(driver_error)?;
    }

    Ok(caps)
}

fn by(locator: &Locator) -> By {
    let selector = locator.selector.to_string();
    match locator.strategy {
        Strategy::Id => By::Id(selector),
        Strategy::XPath => By::XPath(selector),
        Strategy::Css => By::Css(selector),
    }
}

fn driver_error(err: WebDriverError) -> SessionError {
    SessionError::Driver(err.to_string())
}

/// An exhausted bounded wait surfaces as `NoSuchElement`; anything else is the driver failing.
fn lookup_error(locator: &Locator, timeout: Duration, err: WebDriverError) -> SessionError {
    match &*err {
        WebDriverErrorInner::NoSuchElement(_) => {
            debug!(%locator, %err, "element lookup timed out");
            SessionError::NotFound {
                locator: *locator,
                timeout,
            }
        }
        _ => driver_error(err),
    }
}

fn interaction_error(err: WebDriverError) -> SessionError {
    match &*err {
        WebDriverErrorInner::ElementNotInteractable(_)
        | WebDriverErrorInner::ElementClickIntercepted(_) => {
            SessionError::Rejected(err.to_string())
        }
        _ => driver_error(err),
    }
}

fn visibility<T>(outcome: WebDriverResult<T>) -> Result<bool, SessionError> {
    match outcome {
        Ok(_) => Ok(true),
        Err(err) if matches!(&*err, WebDriverErrorInner::NoSuchElement(_)) => Ok(false),
        Err(err) => Err(driver_error(err)),
    }
}

impl BrowserSession for WebDriverSession {
    type Element = WebElement;

    fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        debug!(%url, "navigating");
        self.runtime
            .block_on(self.driver.goto(url))
            .map_err(driver_error)
    }

    fn find(&mut self, locator: &Locator, timeout: Duration) -> Result<WebElement, SessionError> {
        let query = self
            .driver
            .query(by(locator))
            .wait(timeout, QUERY_POLL_INTERVAL);
        self.runtime
            .block_on(query.first())
            .map_err(|err| lookup_error(locator, timeout, err))
    }

    fn send_keys(&mut self, element: &WebElement, text: &str) -> Result<(), SessionError> {
        self.runtime
            .block_on(element.send_keys(text))
            .map_err(interaction_error)
    }

    fn click(&mut self, element: &WebElement) -> Result<(), SessionError> {
        self.runtime
            .block_on(element.click())
            .map_err(interaction_error)
    }

    fn is_visible_within(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<bool, SessionError> {
        let query = self
            .driver
            .query(by(locator))
            .wait(timeout, QUERY_POLL_INTERVAL)
            .and_displayed();
        visibility(self.runtime.block_on(query.first()))
    }

    fn close(self) -> Result<(), SessionError> {
        let Self { driver, runtime } = self;
        runtime.block_on(driver.quit()).map_err(driver_error)?;
        info!("browser session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thirtyfour::error::{no_such_element, WebDriverErrorInfo};

    const MARKER: Locator = Locator::xpath("//a[@data-cy='profile_actions']");

    fn connection_refused() -> WebDriverError {
        WebDriverError::RequestFailed("connection refused".to_string())
    }

    #[test]
    fn exhausted_lookup_is_not_found() {
        let timeout = Duration::from_secs(10);
        let error = lookup_error(&MARKER, timeout, no_such_element("gone".to_string()));
        match error {
            SessionError::NotFound {
                locator,
                timeout: waited,
            } => {
                assert_eq!(locator, MARKER);
                assert_eq!(waited, timeout);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn dead_driver_during_lookup_is_a_driver_error() {
        let error = lookup_error(&MARKER, Duration::from_secs(10), connection_refused());
        assert!(matches!(
            error,
            SessionError::Driver(message) if message.contains("connection refused")
        ));
    }

    #[test]
    fn refused_interactions_are_rejections() {
        let intercepted = WebDriverError::ElementClickIntercepted(WebDriverErrorInfo::new(
            "overlay".to_string(),
        ));
        let not_interactable = WebDriverError::ElementNotInteractable(WebDriverErrorInfo::new(
            "hidden".to_string(),
        ));

        assert!(matches!(
            interaction_error(intercepted),
            SessionError::Rejected(_)
        ));
        assert!(matches!(
            interaction_error(not_interactable),
            SessionError::Rejected(_)
        ));
        assert!(matches!(
            interaction_error(connection_refused()),
            SessionError::Driver(_)
        ));
    }

    #[test]
    fn only_a_missing_element_counts_as_hidden() {
        assert!(visibility(Ok(())).expect("visible"));
        assert!(!visibility::<()>(Err(no_such_element("hidden".to_string()))).expect("hidden"));
        assert!(matches!(
            visibility::<()>(Err(connection_refused())),
            Err(SessionError::Driver(_))
        ));
    }
}
