//! Login/page-creation flows and readiness waits

mod common;

use std::time::Duration;

use common::{test_config, Behavior, FakeCms};
use uitour_e2e::flows::{animated_type, create_page, login, move_pointer_and_click};
use uitour_e2e::wait::{wait_for_selector, wait_until};
use uitour_e2e::{BrowserSession, E2eError, Readiness, TestCase};

const INTERVAL: Duration = Duration::from_millis(50);

async fn opened(behavior: Behavior) -> FakeCms {
    let mut cms = FakeCms::new(behavior);
    cms.goto("http://localhost:8082/structr/#pages").await.unwrap();
    cms
}

#[tokio::test(start_paused = true)]
async fn login_records_one_assertion() {
    let out = tempfile::tempdir().unwrap();
    let config = test_config(out.path());
    let mut cms = opened(Behavior::default()).await;
    let mut case = TestCase::begin("login", 1);

    login(&mut cms, &mut case, &config, "admin", "admin").await.unwrap();

    assert_eq!(case.assertions.len(), 1);
    assert!(case.assertions[0].passed);
    assert_eq!(cms.count(&config.selectors.logged_in_marker).await.unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn login_with_wrong_password_is_a_setup_error() {
    let out = tempfile::tempdir().unwrap();
    let config = test_config(out.path());
    let mut cms = opened(Behavior::default()).await;
    let mut case = TestCase::begin("login", 1);

    let err = login(&mut cms, &mut case, &config, "admin", "nope").await.unwrap_err();

    assert!(matches!(err, E2eError::Setup { ref step, .. } if step == "login"));
    assert_eq!(case.failed_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn create_page_does_not_check_for_duplicates() {
    let out = tempfile::tempdir().unwrap();
    let config = test_config(out.path());
    let mut cms = opened(Behavior::default()).await;
    let mut case = TestCase::begin("create", 3);

    login(&mut cms, &mut case, &config, "admin", "admin").await.unwrap();
    create_page(&mut cms, &mut case, &config, "test-page").await.unwrap();
    create_page(&mut cms, &mut case, &config, "test-page").await.unwrap();

    assert_eq!(cms.pages(), ["test-page", "test-page"]);
    assert_eq!(case.passed_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn create_page_without_login_fails() {
    let out = tempfile::tempdir().unwrap();
    let config = test_config(out.path());
    let mut cms = opened(Behavior::default()).await;
    let mut case = TestCase::begin("create", 1);

    let err = create_page(&mut cms, &mut case, &config, "test-page").await.unwrap_err();

    assert!(matches!(err, E2eError::Setup { ref step, .. } if step == "create_page"));
    assert_eq!(case.assertions[0].message, "page test-page created");
    assert!(!case.assertions[0].passed);
}

#[tokio::test(start_paused = true)]
async fn wait_until_returns_immediately_when_ready() {
    let mut cms = opened(Behavior::default()).await;

    let waited = wait_for_selector(&mut cms, "#usernameField", Duration::from_secs(5), INTERVAL)
        .await
        .unwrap();

    assert_eq!(waited, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn wait_until_is_bounded() {
    let mut cms = opened(Behavior::default()).await;
    let never = Readiness::Present("#does-not-exist".to_string());

    let started = tokio::time::Instant::now();
    let err = wait_until(&mut cms, &never, Duration::from_millis(1000), INTERVAL)
        .await
        .unwrap_err();

    match err {
        E2eError::Timeout { what, waited_ms } => {
            assert_eq!(what, "#does-not-exist to appear");
            assert_eq!(waited_ms, 1000);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(started.elapsed(), Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_checks_once() {
    let mut cms = opened(Behavior::default()).await;

    let absent = Readiness::Absent("#previewTabs li input.new-name".to_string());
    assert!(wait_until(&mut cms, &absent, Duration::ZERO, INTERVAL).await.is_ok());

    let present = Readiness::Present("#previewTabs li input.new-name".to_string());
    let err = wait_until(&mut cms, &present, Duration::ZERO, INTERVAL).await.unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test(start_paused = true)]
async fn animated_type_commits_with_enter() {
    let out = tempfile::tempdir().unwrap();
    let config = test_config(out.path());
    let sel = &config.selectors;
    let mut cms = FakeCms::with_active_page("test-page");
    cms.goto(&config.base_url).await.unwrap();

    move_pointer_and_click(&mut cms, &sel.active_tab, Duration::ZERO, INTERVAL)
        .await
        .unwrap();
    animated_type(&mut cms, &sel.rename_input, "renamed-page", true, true, 0)
        .await
        .unwrap();

    assert_eq!(cms.actions.last().map(String::as_str), Some("press Enter"));
    assert_eq!(cms.pages(), ["renamed-page"]);
    assert_eq!(cms.count(&sel.rename_input).await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn click_with_wait_tolerates_late_elements_only_when_asked() {
    let mut cms = opened(Behavior::default()).await;

    // Not logged in: the add-page button never shows up
    let err = move_pointer_and_click(&mut cms, "#add_page", Duration::ZERO, INTERVAL)
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::ElementNotFound(_)));

    let err = move_pointer_and_click(&mut cms, "#add_page", Duration::from_millis(200), INTERVAL)
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}
