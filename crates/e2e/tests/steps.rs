//! Individual step kinds run through the scenario runner

mod common;

use std::time::Duration;

use common::{test_config, Behavior, FakeCms};
use test_case::test_case;
use uitour_e2e::{Outcome, Scenario, ScenarioRunner};

const NAME_LABEL: &str = "#previewTabs li.page.active .name_";

/// A one-assertion scenario checking the active tab label
fn label_check(expectation: &str) -> Scenario {
    Scenario::from_yaml(&format!(
        r##"
name: label_check
planned_assertions: 1
steps:
  - action: assert_text
    selector: '{}'
    {}
"##,
        NAME_LABEL, expectation
    ))
    .unwrap()
}

#[test_case("  renamed-page \n", "equals: renamed-page", true ; "equals trims label")]
#[test_case("renamed-page", "equals: renamed", false ; "equals needs whole label")]
#[test_case("renamed-page", r"matches: '^renamed-\w+$'", true ; "matches pattern")]
#[test_case("renamed-page", "matches: '^test-'", false ; "pattern does not match")]
#[tokio::test(start_paused = true)]
async fn assert_text_modes(label: &str, expectation: &str, passes: bool) {
    let out = tempfile::tempdir().unwrap();
    let config = test_config(out.path());
    let mut cms = FakeCms::with_active_page(label);

    let case = ScenarioRunner::new(&config).run(&label_check(expectation), &mut cms).await;

    assert_eq!(case.assertions.len(), 1);
    let assertion = &case.assertions[0];
    assert_eq!(assertion.passed, passes);
    if passes {
        assert_eq!(case.outcome, Outcome::Passed);
    } else {
        assert_eq!(case.outcome, Outcome::Failed);
        assert_eq!(
            assertion.detail.as_deref(),
            Some(format!("actual text: {:?}", label).as_str())
        );
    }
}

#[tokio::test(start_paused = true)]
async fn equals_message_names_selector_and_value() {
    let out = tempfile::tempdir().unwrap();
    let config = test_config(out.path());
    let mut cms = FakeCms::with_active_page("renamed-page");

    let case = ScenarioRunner::new(&config)
        .run(&label_check("equals: renamed-page"), &mut cms)
        .await;

    assert_eq!(
        case.assertions[0].message,
        format!("Text of \"{}\" equals \"renamed-page\"", NAME_LABEL)
    );
}

#[tokio::test(start_paused = true)]
async fn navigate_press_sleep_screenshot_and_log_steps() {
    let out = tempfile::tempdir().unwrap();
    let config = test_config(out.path());
    let mut cms = FakeCms::with_active_page("test-page");

    let scenario = Scenario::from_yaml(
        r##"
name: step_kinds
planned_assertions: 1
steps:
  - action: log
    message: renaming through the keyboard
  - action: navigate
    url: '#crud'
  - action: navigate
    url: index.html
  - action: click
    selector: '#previewTabs li.page.active'
  - action: type
    selector: '#previewTabs li input.new-name'
    text: pressed-page
    clear: true
  - action: press
    key: Tab
  - action: sleep
    ms: 250
  - action: screenshot
    name: after-press
  - action: assert_text
    selector: '#previewTabs li.page.active .name_'
    equals: pressed-page
"##,
    )
    .unwrap();

    let started = tokio::time::Instant::now();
    let case = ScenarioRunner::new(&config).run(&scenario, &mut cms).await;

    assert_eq!(case.outcome, Outcome::Passed, "error: {:?}", case.error);
    assert!(started.elapsed() >= Duration::from_millis(250));
    assert_eq!(cms.pages(), ["pressed-page"]);

    let gotos: Vec<_> = cms.actions.iter().filter(|a| a.starts_with("goto ")).collect();
    assert_eq!(
        gotos,
        [
            "goto http://localhost:8082/structr/#pages",
            "goto http://localhost:8082/structr/#crud",
            "goto http://localhost:8082/structr/index.html",
        ]
    );
    assert!(cms.actions.contains(&"press Tab".to_string()));

    let shot = out.path().join("step_kinds/after-press.png");
    assert!(shot.exists());
    assert!(cms.screenshots.contains(&shot));
}

#[tokio::test(start_paused = true)]
async fn settle_that_never_holds_errors_before_the_assertion() {
    let out = tempfile::tempdir().unwrap();
    let config = test_config(out.path());
    let mut cms = FakeCms::new(Behavior {
        input_lingers: true,
        ..Default::default()
    });

    let rename = Scenario::builtin().unwrap().remove(0);
    let started = tokio::time::Instant::now();
    let case = ScenarioRunner::new(&config).run(&rename, &mut cms).await;

    assert_eq!(case.outcome, Outcome::Errored);
    let error = case.error.as_deref().unwrap();
    assert_eq!(
        error,
        "Timeout after 1000 ms waiting for: #previewTabs li input.new-name to disappear"
    );
    assert!(started.elapsed() >= Duration::from_millis(1000));
    // login, page creation and the rename-input wait; the label check never ran
    assert_eq!(case.assertions.len(), 3);
    assert!(case.assertions.iter().all(|a| a.passed));
    assert!(case.walkthrough.is_none());
    assert!(cms.closed);
}
