use std::{cell::RefCell, rc::Rc, time::Duration};

use anyhow::anyhow;
use http::{Method, StatusCode};
use rstest::*;

use super::*;

#[derive(Debug, PartialEq, Clone)]
enum Event {
    SwitchDisabled(String, bool),
    SwitchState(String, bool),
    HookRequest(Method, String),
    SyncRequest,
    BadgeClassesAdded(String, Vec<String>),
    BadgeClassesRemoved(String, Vec<String>),
    BadgeFadeOut(String, Duration),
    BadgeOpacityReset(String),
    Sleep(Duration),
    ButtonDisabled(bool),
    ButtonSpinning(bool),
    ViewContent(String),
}

type EventLog = Rc<RefCell<Vec<Event>>>;

enum FakeResponse {
    Status(StatusCode),
    NetworkError,
}

impl FakeResponse {
    fn to_result(&self) -> Result<StatusCode, PanelError> {
        match self {
            FakeResponse::Status(status) if status.is_success() => Ok(*status),
            FakeResponse::Status(status) => Err(PanelError::UnexpectedStatus(*status)),
            FakeResponse::NetworkError => Err(PanelError::Unexpected(anyhow!("connection reset"))),
        }
    }
}

struct FakeBackend {
    events: EventLog,
    hook_response: FakeResponse,
    sync_response: Result<String, StatusCode>,
}

impl PanelBackend for FakeBackend {
    async fn send_hook_request(
        &self,
        action: HookAction,
        request: &HookRequest,
    ) -> Result<StatusCode, PanelError> {
        self.events
            .borrow_mut()
            .push(Event::HookRequest(action.method(), request.id.to_string()));
        tokio::task::yield_now().await;
        self.hook_response.to_result()
    }

    async fn sync(&self) -> Result<String, PanelError> {
        self.events.borrow_mut().push(Event::SyncRequest);
        tokio::task::yield_now().await;
        self.sync_response
            .clone()
            .map_err(PanelError::UnexpectedStatus)
    }
}

struct FakeTimer {
    events: EventLog,
}

impl Timer for FakeTimer {
    async fn sleep(&self, duration: Duration) {
        self.events.borrow_mut().push(Event::Sleep(duration));
    }
}

struct FakeSwitch {
    events: EventLog,
    repo_id: Option<String>,
}

impl FakeSwitch {
    fn name(&self) -> String {
        self.repo_id.clone().unwrap_or_default()
    }
}

impl RepositorySwitch for FakeSwitch {
    fn repo_id(&self) -> Option<RepoId> {
        self.repo_id.clone().map(RepoId)
    }

    fn set_disabled(&self, disabled: bool) {
        self.events
            .borrow_mut()
            .push(Event::SwitchDisabled(self.name(), disabled));
    }

    fn set_state_silently(&self, state: bool) {
        self.events
            .borrow_mut()
            .push(Event::SwitchState(self.name(), state));
    }
}

struct FakeBadge {
    events: EventLog,
    repo_id: String,
}

fn owned(classes: &[&str]) -> Vec<String> {
    classes.iter().map(|class| class.to_string()).collect()
}

impl StatusBadge for FakeBadge {
    fn add_classes(&self, classes: &[&str]) {
        self.events
            .borrow_mut()
            .push(Event::BadgeClassesAdded(self.repo_id.clone(), owned(classes)));
    }

    fn remove_classes(&self, classes: &[&str]) {
        self.events
            .borrow_mut()
            .push(Event::BadgeClassesRemoved(self.repo_id.clone(), owned(classes)));
    }

    fn fade_out(&self, duration: Duration) {
        self.events
            .borrow_mut()
            .push(Event::BadgeFadeOut(self.repo_id.clone(), duration));
    }

    fn reset_opacity(&self) {
        self.events
            .borrow_mut()
            .push(Event::BadgeOpacityReset(self.repo_id.clone()));
    }
}

struct FakeBadges {
    events: EventLog,
    known_repo_ids: Vec<String>,
}

impl BadgeLocator for FakeBadges {
    type Badge = FakeBadge;

    fn find_badge(&self, repo_id: &RepoId) -> Option<FakeBadge> {
        self.known_repo_ids
            .contains(&repo_id.0)
            .then(|| FakeBadge {
                events: self.events.clone(),
                repo_id: repo_id.0.clone(),
            })
    }
}

struct FakeButton {
    events: EventLog,
}

impl SyncButton for FakeButton {
    fn set_disabled(&self, disabled: bool) {
        self.events
            .borrow_mut()
            .push(Event::ButtonDisabled(disabled));
    }

    fn set_spinning(&self, spinning: bool) {
        self.events
            .borrow_mut()
            .push(Event::ButtonSpinning(spinning));
    }
}

struct FakeView {
    events: EventLog,
}

impl PanelView for FakeView {
    fn replace_content(&self, html: &str) {
        self.events
            .borrow_mut()
            .push(Event::ViewContent(html.to_string()));
    }
}

struct TokioTimer {
    events: EventLog,
}

impl Timer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        self.events.borrow_mut().push(Event::Sleep(duration));
        tokio::time::sleep(duration).await;
    }
}

const FADE: Duration = Duration::from_millis(2000);

#[fixture]
fn events() -> EventLog {
    Rc::new(RefCell::new(vec![]))
}

fn controller(
    events: &EventLog,
    hook_response: FakeResponse,
    sync_response: Result<String, StatusCode>,
) -> PanelController<FakeBackend, FakeTimer> {
    PanelController::new(
        FakeBackend {
            events: events.clone(),
            hook_response,
            sync_response,
        },
        FakeTimer {
            events: events.clone(),
        },
        FADE,
    )
}

fn switch(events: &EventLog, repo_id: &str) -> FakeSwitch {
    FakeSwitch {
        events: events.clone(),
        repo_id: Some(repo_id.to_string()),
    }
}

fn badges(events: &EventLog, known_repo_ids: &[&str]) -> FakeBadges {
    FakeBadges {
        events: events.clone(),
        known_repo_ids: owned(known_repo_ids),
    }
}

mod toggle {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[tokio::test]
    async fn test_enable_hook_confirmed(events: EventLog) {
        let controller = controller(
            &events,
            FakeResponse::Status(StatusCode::CREATED),
            Ok("".to_string()),
        );

        let outcome = controller
            .toggle(&switch(&events, "42"), true, &badges(&events, &["42"]))
            .await;

        assert_eq!(
            outcome,
            ToggleOutcome::Applied {
                repo_id: RepoId::from("42"),
                status: HookStatus::Confirmed
            }
        );
        assert_eq!(
            *events.borrow(),
            vec![
                Event::SwitchDisabled("42".to_string(), true),
                Event::HookRequest(Method::POST, "42".to_string()),
                Event::BadgeClassesAdded("42".to_string(), owned(&["fa-check", "text-success"])),
                Event::BadgeFadeOut("42".to_string(), FADE),
                Event::SwitchDisabled("42".to_string(), false),
                Event::Sleep(FADE),
                Event::BadgeClassesRemoved("42".to_string(), owned(&["fa-check", "text-success"])),
                Event::BadgeOpacityReset("42".to_string()),
            ]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_disable_hook_confirmed(events: EventLog) {
        let controller = controller(
            &events,
            FakeResponse::Status(StatusCode::NO_CONTENT),
            Ok("".to_string()),
        );

        let outcome = controller
            .toggle(&switch(&events, "7"), false, &badges(&events, &["7"]))
            .await;

        assert_eq!(
            outcome,
            ToggleOutcome::Applied {
                repo_id: RepoId::from("7"),
                status: HookStatus::Confirmed
            }
        );
        assert_eq!(
            events.borrow()[1],
            Event::HookRequest(Method::DELETE, "7".to_string())
        );
        assert_eq!(
            events.borrow()[2],
            Event::BadgeClassesAdded("7".to_string(), owned(&["fa-check", "text-success"]))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_unconfirmed_hook_shows_warning(events: EventLog) {
        let controller = controller(
            &events,
            FakeResponse::Status(StatusCode::OK),
            Ok("".to_string()),
        );

        let outcome = controller
            .toggle(&switch(&events, "42"), true, &badges(&events, &["42"]))
            .await;

        assert_eq!(
            outcome,
            ToggleOutcome::Applied {
                repo_id: RepoId::from("42"),
                status: HookStatus::Unconfirmed
            }
        );
        let warning_classes = owned(&["fa-exclamation", "text-warning"]);
        assert!(events
            .borrow()
            .contains(&Event::BadgeClassesAdded("42".to_string(), warning_classes.clone())));
        assert_eq!(
            events.borrow().last(),
            Some(&Event::BadgeOpacityReset("42".to_string()))
        );
        assert!(events
            .borrow()
            .contains(&Event::BadgeClassesRemoved("42".to_string(), warning_classes)));
    }

    #[rstest]
    #[case::server_error(FakeResponse::Status(StatusCode::FORBIDDEN))]
    #[case::network_error(FakeResponse::NetworkError)]
    #[tokio::test]
    async fn test_failed_request_reverts_switch(
        events: EventLog,
        #[case] hook_response: FakeResponse,
    ) {
        let controller = controller(&events, hook_response, Ok("".to_string()));

        let outcome = controller
            .toggle(&switch(&events, "42"), true, &badges(&events, &["42"]))
            .await;

        assert_eq!(outcome, ToggleOutcome::Reverted(RepoId::from("42")));
        assert_eq!(
            *events.borrow(),
            vec![
                Event::SwitchDisabled("42".to_string(), true),
                Event::HookRequest(Method::POST, "42".to_string()),
                Event::SwitchState("42".to_string(), false),
                Event::SwitchDisabled("42".to_string(), false),
            ]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_missing_badge_still_reenables_switch(events: EventLog) {
        let controller = controller(
            &events,
            FakeResponse::Status(StatusCode::CREATED),
            Ok("".to_string()),
        );

        controller
            .toggle(&switch(&events, "42"), true, &badges(&events, &[]))
            .await;

        assert_eq!(
            *events.borrow(),
            vec![
                Event::SwitchDisabled("42".to_string(), true),
                Event::HookRequest(Method::POST, "42".to_string()),
                Event::SwitchDisabled("42".to_string(), false),
            ]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_missing_repo_id_sends_nothing(events: EventLog) {
        let controller = controller(
            &events,
            FakeResponse::Status(StatusCode::CREATED),
            Ok("".to_string()),
        );
        let switch = FakeSwitch {
            events: events.clone(),
            repo_id: None,
        };

        let outcome = controller
            .toggle(&switch, true, &badges(&events, &[]))
            .await;

        assert_eq!(outcome, ToggleOutcome::MissingRepoId);
        assert!(events.borrow().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_single_request_in_flight_per_repository(events: EventLog) {
        let controller = controller(
            &events,
            FakeResponse::Status(StatusCode::CREATED),
            Ok("".to_string()),
        );
        let switch = switch(&events, "42");
        let badges = badges(&events, &[]);

        let (first, second) = tokio::join!(
            controller.toggle(&switch, true, &badges),
            controller.toggle(&switch, false, &badges)
        );

        assert_eq!(
            first,
            ToggleOutcome::Applied {
                repo_id: RepoId::from("42"),
                status: HookStatus::Confirmed
            }
        );
        assert_eq!(second, ToggleOutcome::AlreadyInFlight(RepoId::from("42")));
        let requests_count = events
            .borrow()
            .iter()
            .filter(|event| matches!(event, Event::HookRequest(..)))
            .count();
        assert_eq!(requests_count, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn test_different_repositories_are_independent(events: EventLog) {
        let controller = controller(
            &events,
            FakeResponse::Status(StatusCode::CREATED),
            Ok("".to_string()),
        );
        let first_switch = switch(&events, "1");
        let second_switch = switch(&events, "2");
        let badges = badges(&events, &[]);

        let (first, second) = tokio::join!(
            controller.toggle(&first_switch, true, &badges),
            controller.toggle(&second_switch, true, &badges)
        );

        assert!(matches!(first, ToggleOutcome::Applied { .. }));
        assert!(matches!(second, ToggleOutcome::Applied { .. }));
        assert_eq!(
            &events.borrow()[..4],
            &[
                Event::SwitchDisabled("1".to_string(), true),
                Event::HookRequest(Method::POST, "1".to_string()),
                Event::SwitchDisabled("2".to_string(), true),
                Event::HookRequest(Method::POST, "2".to_string()),
            ]
        );
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_toggle_during_fade_restarts_it(events: EventLog) {
        let controller = PanelController::new(
            FakeBackend {
                events: events.clone(),
                hook_response: FakeResponse::Status(StatusCode::OK),
                sync_response: Ok("".to_string()),
            },
            TokioTimer {
                events: events.clone(),
            },
            FADE,
        );
        let switch = switch(&events, "42");
        let badges = badges(&events, &["42"]);
        let start = tokio::time::Instant::now();

        tokio::join!(controller.toggle(&switch, true, &badges), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            controller.toggle(&switch, false, &badges).await
        });

        let warning = owned(&["fa-exclamation", "text-warning"]);
        assert_eq!(
            *events.borrow(),
            vec![
                Event::SwitchDisabled("42".to_string(), true),
                Event::HookRequest(Method::POST, "42".to_string()),
                Event::BadgeClassesAdded("42".to_string(), warning.clone()),
                Event::BadgeFadeOut("42".to_string(), FADE),
                Event::SwitchDisabled("42".to_string(), false),
                Event::Sleep(FADE),
                Event::SwitchDisabled("42".to_string(), true),
                Event::HookRequest(Method::DELETE, "42".to_string()),
                Event::BadgeClassesRemoved("42".to_string(), warning.clone()),
                Event::BadgeOpacityReset("42".to_string()),
                Event::BadgeClassesAdded("42".to_string(), warning.clone()),
                Event::BadgeFadeOut("42".to_string(), FADE),
                Event::SwitchDisabled("42".to_string(), false),
                Event::Sleep(FADE),
                Event::BadgeClassesRemoved("42".to_string(), warning),
                Event::BadgeOpacityReset("42".to_string()),
            ]
        );
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }
}

mod sync {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[tokio::test]
    async fn test_sync_replaces_view_content(events: EventLog) {
        let controller = controller(
            &events,
            FakeResponse::Status(StatusCode::CREATED),
            Ok("<ul class=\"repositories\"></ul>".to_string()),
        );

        let outcome = controller
            .sync(
                &FakeButton {
                    events: events.clone(),
                },
                &FakeView {
                    events: events.clone(),
                },
            )
            .await;

        assert_eq!(outcome, SyncOutcome::Refreshed);
        assert!(!controller.is_sync_in_flight());
        assert_eq!(
            *events.borrow(),
            vec![
                Event::ButtonDisabled(true),
                Event::ButtonSpinning(true),
                Event::SyncRequest,
                Event::ViewContent("<ul class=\"repositories\"></ul>".to_string()),
                Event::ButtonDisabled(false),
                Event::ButtonSpinning(false),
            ]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_failed_sync_restores_button(events: EventLog) {
        let controller = controller(
            &events,
            FakeResponse::Status(StatusCode::CREATED),
            Err(StatusCode::INTERNAL_SERVER_ERROR),
        );

        let outcome = controller
            .sync(
                &FakeButton {
                    events: events.clone(),
                },
                &FakeView {
                    events: events.clone(),
                },
            )
            .await;

        assert_eq!(outcome, SyncOutcome::Failed);
        assert_eq!(
            *events.borrow(),
            vec![
                Event::ButtonDisabled(true),
                Event::ButtonSpinning(true),
                Event::SyncRequest,
                Event::ButtonDisabled(false),
                Event::ButtonSpinning(false),
            ]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_single_sync_in_flight(events: EventLog) {
        let controller = controller(
            &events,
            FakeResponse::Status(StatusCode::CREATED),
            Ok("".to_string()),
        );
        let button = FakeButton {
            events: events.clone(),
        };
        let view = FakeView {
            events: events.clone(),
        };

        let (first, second) = tokio::join!(
            controller.sync(&button, &view),
            controller.sync(&button, &view)
        );

        assert_eq!(first, SyncOutcome::Refreshed);
        assert_eq!(second, SyncOutcome::AlreadyInFlight);
        let sync_count = events
            .borrow()
            .iter()
            .filter(|event| **event == Event::SyncRequest)
            .count();
        assert_eq!(sync_count, 1);
    }
}
