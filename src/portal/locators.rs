use crate::browser::Locator;

pub const EMAIL_FIELD: Locator = Locator::id("user_email");
pub const PASSWORD_FIELD: Locator = Locator::id("user_password");
pub const LOGIN_BUTTON: Locator = Locator::xpath("//button[@type='submit']");
/// Only rendered for a signed-in user.
pub const PROFILE_ACTIONS: Locator = Locator::xpath("//a[@data-cy='profile_actions']");

pub const REPORT_ACTIONS_DROPDOWN: Locator =
    Locator::xpath("//div[@class='col-auto']/a[@data-bs-toggle='dropdown']");
pub const EXPORT_TO_EXCEL: Locator = Locator::xpath("//a[contains(text(),'Export to Excel')]");
