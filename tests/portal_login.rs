mod common;

use std::time::Duration;

use common::{portal_config, FakePortal, DOMAIN_URL};
use timeoff_crawler::browser::InteractionFault;
use timeoff_crawler::portal::locators::{
    EMAIL_FIELD, LOGIN_BUTTON, PASSWORD_FIELD, PROFILE_ACTIONS,
};
use timeoff_crawler::portal::{Authenticator, LoginError, LoginState, LoginTimeouts, StepAction};

#[test]
fn login_walks_the_state_machine_in_order() {
    let authenticator = Authenticator::new(&portal_config());
    let reached: Vec<LoginState> = authenticator.steps().iter().map(|step| step.reaches).collect();
    assert_eq!(
        reached,
        vec![
            LoginState::Unauthenticated,
            LoginState::Unauthenticated,
            LoginState::CredentialsEntered,
            LoginState::Submitted,
            LoginState::Authenticated,
        ]
    );

    let marker_step = authenticator.steps().last().expect("marker step");
    assert!(matches!(
        marker_step.action,
        StepAction::AwaitVisible { marker } if marker == PROFILE_ACTIONS
    ));
    assert_eq!(marker_step.timeout, Duration::from_secs(15));
}

#[test]
fn successful_login_enters_credentials_and_submits() {
    let mut portal = FakePortal::cooperative();
    let journal = portal.journal();

    let report = Authenticator::new(&portal_config())
        .login(&mut portal)
        .expect("login succeeds");

    assert_eq!(report.state, LoginState::Authenticated);
    assert!(report.faults.is_empty());

    let journal = journal.borrow();
    assert_eq!(journal.navigations, vec![DOMAIN_URL.to_string()]);
    assert_eq!(
        journal.typed,
        vec![
            (EMAIL_FIELD, "ops@example.com".to_string()),
            (PASSWORD_FIELD, "correct horse".to_string()),
        ]
    );
    assert_eq!(journal.clicks, vec![LOGIN_BUTTON]);
}

#[test]
fn hidden_marker_is_fatal() {
    let mut portal = FakePortal::cooperative().without_marker();
    let timeouts = LoginTimeouts {
        element: Duration::from_millis(1),
        marker: Duration::from_millis(2),
    };

    let error = Authenticator::with_timeouts(&portal_config(), timeouts)
        .login(&mut portal)
        .expect_err("login must fail");

    match error {
        LoginError::MarkerNotVisible {
            marker,
            timeout,
            faults,
        } => {
            assert_eq!(marker, PROFILE_ACTIONS);
            assert_eq!(timeout, Duration::from_millis(2));
            assert!(faults.is_empty());
        }
        other => panic!("expected MarkerNotVisible, got {other:?}"),
    }
}

#[test]
fn rejected_password_field_is_recorded_but_not_fatal() {
    let mut portal = FakePortal::cooperative().rejecting(PASSWORD_FIELD);
    let journal = portal.journal();

    let report = Authenticator::new(&portal_config())
        .login(&mut portal)
        .expect("marker still shows up");

    assert_eq!(report.state, LoginState::Authenticated);
    assert_eq!(report.faults.len(), 1);
    assert!(matches!(
        &report.faults[0],
        InteractionFault::NotInteractable { locator, .. } if *locator == PASSWORD_FIELD
    ));
    assert_eq!(journal.borrow().typed.len(), 1);
}

#[test]
fn missing_submit_button_surfaces_alongside_the_fatal_marker() {
    let mut portal = FakePortal::cooperative()
        .without_element(LOGIN_BUTTON)
        .without_marker();

    let error = Authenticator::new(&portal_config())
        .login(&mut portal)
        .expect_err("never submitted");

    let LoginError::MarkerNotVisible { faults, .. } = error else {
        panic!("expected MarkerNotVisible");
    };
    assert_eq!(faults.len(), 1);
    assert!(matches!(
        &faults[0],
        InteractionFault::NotFound { locator, .. } if *locator == LOGIN_BUTTON
    ));
}

#[test]
fn debug_output_never_contains_credentials() {
    let authenticator = Authenticator::new(&portal_config());
    let rendered = format!("{authenticator:?}");
    assert!(!rendered.contains("correct horse"));
    assert!(!rendered.contains("ops@example.com"));
    assert!(rendered.contains("id=user_email"));
}
