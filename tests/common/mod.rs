#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use timeoff_crawler::browser::{BrowserSession, Locator, SessionError};
use timeoff_crawler::config::{PortalConfig, Secret};
use timeoff_crawler::portal::locators::{
    EMAIL_FIELD, EXPORT_TO_EXCEL, LOGIN_BUTTON, PASSWORD_FIELD, PROFILE_ACTIONS,
    REPORT_ACTIONS_DROPDOWN,
};
use timeoff_crawler::portal::ExportTimings;

pub const DOMAIN_URL: &str = "https://portal.example";
pub const REPORTS_URL: &str = "https://portal.example/reports/time-off";

pub fn portal_config() -> PortalConfig {
    PortalConfig {
        domain_url: DOMAIN_URL.to_string(),
        reports_url: REPORTS_URL.to_string(),
        email: "ops@example.com".to_string(),
        password: Secret::new("correct horse"),
    }
}

pub fn fast_timings() -> ExportTimings {
    ExportTimings {
        element_timeout: Duration::from_millis(1),
        settle: Duration::from_millis(5),
        poll_interval: Duration::from_millis(5),
        max_polls: 4,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementBehaviour {
    Accepts,
    Rejects,
}

/// What the fake browser saw; shared so tests can inspect it after the session is closed.
#[derive(Debug, Default)]
pub struct Journal {
    pub navigations: Vec<String>,
    pub typed: Vec<(Locator, String)>,
    pub clicks: Vec<Locator>,
    pub closes: usize,
}

/// A portal whose pages always render the same elements.
pub struct FakePortal {
    elements: HashMap<Locator, ElementBehaviour>,
    marker_visible: bool,
    download: Option<(PathBuf, Vec<u8>)>,
    fail_navigation: bool,
    journal: Rc<RefCell<Journal>>,
}

impl FakePortal {
    /// Every locator the flow uses is present and accepts input; the login marker shows up.
    pub fn cooperative() -> Self {
        let elements = [
            EMAIL_FIELD,
            PASSWORD_FIELD,
            LOGIN_BUTTON,
            REPORT_ACTIONS_DROPDOWN,
            EXPORT_TO_EXCEL,
        ]
        .into_iter()
        .map(|locator| (locator, ElementBehaviour::Accepts))
        .collect();

        Self {
            elements,
            marker_visible: true,
            download: None,
            fail_navigation: false,
            journal: Rc::new(RefCell::new(Journal::default())),
        }
    }

    pub fn without_marker(mut self) -> Self {
        self.marker_visible = false;
        self
    }

    pub fn without_element(mut self, locator: Locator) -> Self {
        self.elements.remove(&locator);
        self
    }

    pub fn rejecting(mut self, locator: Locator) -> Self {
        self.elements.insert(locator, ElementBehaviour::Rejects);
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    /// Clicking "Export to Excel" writes `contents` to `path`.
    pub fn downloading(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.download = Some((path.into(), contents.into()));
        self
    }

    pub fn journal(&self) -> Rc<RefCell<Journal>> {
        Rc::clone(&self.journal)
    }
}

impl BrowserSession for FakePortal {
    type Element = Locator;

    fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        if self.fail_navigation {
            return Err(SessionError::Driver("chrome not reachable".to_string()));
        }
        self.journal.borrow_mut().navigations.push(url.to_string());
        Ok(())
    }

    fn find(&mut self, locator: &Locator, timeout: Duration) -> Result<Locator, SessionError> {
        if self.elements.contains_key(locator) {
            Ok(*locator)
        } else {
            Err(SessionError::NotFound {
                locator: *locator,
                timeout,
            })
        }
    }

    fn send_keys(&mut self, element: &Locator, text: &str) -> Result<(), SessionError> {
        match self.elements.get(element) {
            Some(ElementBehaviour::Accepts) => {
                self.journal
                    .borrow_mut()
                    .typed
                    .push((*element, text.to_string()));
                Ok(())
            }
            _ => Err(SessionError::Rejected("element not interactable".to_string())),
        }
    }

    fn click(&mut self, element: &Locator) -> Result<(), SessionError> {
        match self.elements.get(element) {
            Some(ElementBehaviour::Accepts) => {
                self.journal.borrow_mut().clicks.push(*element);
                if *element == EXPORT_TO_EXCEL {
                    if let Some((path, contents)) = &self.download {
                        std::fs::write(path, contents)
                            .map_err(|err| SessionError::Driver(err.to_string()))?;
                    }
                }
                Ok(())
            }
            _ => Err(SessionError::Rejected(
                "element click intercepted".to_string(),
            )),
        }
    }

    fn is_visible_within(
        &mut self,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<bool, SessionError> {
        Ok(*locator == PROFILE_ACTIONS && self.marker_visible)
    }

    fn close(self) -> Result<(), SessionError> {
        self.journal.borrow_mut().closes += 1;
        Ok(())
    }
}

/// CSV rendering of an export: header row, then one row per employee with
/// names in columns B and D and day 1 in column M.
pub fn export_csv(employees: &[(&str, &str, &[(u32, &str)])]) -> String {
    let mut lines = Vec::new();
    let mut header = vec!["Id", "First Name", "Middle", "Last Name"];
    header.resize(12, "");
    let day_headers: Vec<String> = (1..=31).map(|day| day.to_string()).collect();
    let mut header: Vec<String> = header.into_iter().map(str::to_string).collect();
    header.extend(day_headers);
    lines.push(header.join(","));

    for (index, (first, last, marks)) in employees.iter().enumerate() {
        let mut row = vec![String::new(); 12 + 31];
        row[0] = (index + 1).to_string();
        row[1] = first.to_string();
        row[3] = last.to_string();
        for (day, label) in marks.iter() {
            row[12 + *day as usize - 1] = label.to_string();
        }
        lines.push(row.join(","));
    }

    lines.join("\n") + "\n"
}
