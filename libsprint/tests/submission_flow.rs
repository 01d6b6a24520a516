//! Integration tests for the submission flow
//!
//! Drives `SprintService` end to end against a mock backend and a real file
//! store in a temporary directory.

use std::sync::Arc;
use std::time::Duration;

use libsprint::backend::mock::{MockBackend, MockCall};
use libsprint::service::events::Event;
use libsprint::service::submission::{RefreshOutcome, ResetStep};
use libsprint::store::{CODE_KEY, TEAM_ID_KEY};
use libsprint::template::DEFAULT_TEMPLATE;
use libsprint::{
    BestTime, Config, FileStore, KeyValueStore, ResetConfirmation, SprintError, SprintService,
    SubmissionState, SubmitOutcome, TeamIdentity,
};
use tempfile::TempDir;

fn setup(backend: MockBackend) -> (SprintService, Arc<dyn KeyValueStore>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(temp_dir.path().join("session.json")).unwrap());
    let service = SprintService::from_parts(Config::default(), Arc::clone(&store), Arc::new(backend)).unwrap();
    (service, store, temp_dir)
}

#[tokio::test]
async fn test_success_without_image_scenario() {
    let backend = MockBackend::success(4.2, "", "ok").with_best_time(Some(4.2));
    let (service, _store, _temp_dir) = setup(backend.clone());

    let code = "def calculate_path(self): ...";
    let outcome = service.controller().submit("T1", code).await.unwrap();

    let result = match outcome {
        SubmitOutcome::Succeeded(result) => result,
        other => panic!("Expected success, got {:?}", other),
    };
    assert_eq!(result.elapsed_seconds, 4.2);
    assert!(result.no_image_produced());
    assert_eq!(result.output.as_deref(), Some("ok"));

    assert_eq!(
        backend.calls(),
        vec![
            MockCall::Submit {
                team_id: "T1".to_string(),
                code: code.to_string()
            },
            MockCall::FastestTime {
                team_id: "T1".to_string()
            },
        ]
    );
    assert_eq!(service.controller().best_time(), BestTime::Seconds(4.2));
}

#[tokio::test]
async fn test_rejected_submission_scenario() {
    let backend = MockBackend::error_payload("SyntaxError: line 3");
    let (service, _store, _temp_dir) = setup(backend.clone());

    let outcome = service.controller().submit("T1", "def calculate_path(self").await.unwrap();

    assert_eq!(outcome, SubmitOutcome::Failed("SyntaxError: line 3".to_string()));
    assert_eq!(
        service.controller().state(),
        SubmissionState::Failed("SyntaxError: line 3".to_string())
    );
    assert_eq!(backend.fastest_time_call_count(), 1);
}

#[tokio::test]
async fn test_submit_current_uses_stored_identity_and_buffer() {
    let backend = MockBackend::default().with_team("9", "Pathfinders");
    let (service, _store, _temp_dir) = setup(backend.clone());

    let team = service.team().register("Pathfinders").await.unwrap();
    service.controller().set_code("def calculate_path(self):\n    return [0]").unwrap();

    service.controller().submit_current(&team.team_id).await.unwrap();

    assert!(backend.calls().contains(&MockCall::Submit {
        team_id: "9".to_string(),
        code: "def calculate_path(self):\n    return [0]".to_string(),
    }));
}

#[tokio::test]
async fn test_missing_team_never_reaches_backend() {
    let backend = MockBackend::default();
    let (service, _store, _temp_dir) = setup(backend.clone());
    let mut events = service.subscribe();

    let err = service.team().require_team_id().unwrap_err();
    assert!(matches!(err, SprintError::MissingTeamIdentity));

    let err = service.controller().submit("", "code").await.unwrap_err();
    assert_eq!(err.exit_code(), 3);
    assert!(backend.calls().is_empty());

    match events.recv().await.unwrap() {
        Event::Error { message } => assert!(message.contains("Team ID not found")),
        other => panic!("Expected error event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_trigger_disabled_while_submitting() {
    let backend = MockBackend::success(1.0, "iVBORw0KGgo=", "").with_submit_delay(Duration::from_millis(50));
    let (service, _store, _temp_dir) = setup(backend.clone());
    let controller = service.controller();

    let observe = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let can_submit = controller.can_submit();
        let second = controller.submit("T1", "again").await.unwrap();
        (can_submit, second)
    };
    let (first, (can_submit_during, second)) = tokio::join!(controller.submit("T1", "first"), observe);

    assert!(!can_submit_during);
    assert_eq!(second, SubmitOutcome::TriggerDisabled);
    assert!(matches!(first.unwrap(), SubmitOutcome::Succeeded(_)));
    assert_eq!(backend.submit_call_count(), 1);
    assert!(controller.can_submit());
}

#[tokio::test]
async fn test_refresh_with_unreachable_backend_keeps_state() {
    let backend = MockBackend::unreachable();
    let (service, _store, _temp_dir) = setup(backend);

    let err = service.controller().refresh_best_time("T1").await.unwrap_err();
    assert_eq!(err.display_message(), "An unexpected error occurred");

    let snapshot = service.controller().snapshot();
    assert_eq!(snapshot.state, SubmissionState::Idle);
    assert_eq!(snapshot.best_time, BestTime::Unset);
    assert_eq!(snapshot.error.as_deref(), Some("An unexpected error occurred"));

    // The guard is released after a failure
    assert!(!snapshot.refreshing);
}

#[tokio::test]
async fn test_initialize_refreshes_best_time() {
    let backend = MockBackend::default().with_best_time(Some(12.5));
    let (service, _store, _temp_dir) = setup(backend.clone());

    service.controller().initialize("T1").await;
    assert_eq!(service.controller().best_time(), BestTime::Seconds(12.5));
    assert_eq!(backend.fastest_time_call_count(), 1);

    let outcome = service.controller().refresh_best_time("T1").await.unwrap();
    assert_eq!(outcome, RefreshOutcome::Updated(BestTime::Seconds(12.5)));
}

#[tokio::test]
async fn test_two_step_reset() {
    let (service, store, _temp_dir) = setup(MockBackend::default());
    let controller = service.controller();
    controller.set_code("scratch work").unwrap();

    let mut confirmation = ResetConfirmation::default();
    assert_eq!(confirmation.press(), ResetStep::Armed);
    assert_eq!(controller.code(), "scratch work");

    assert_eq!(confirmation.press(), ResetStep::Confirmed);
    controller.reset_to_template(&mut confirmation).unwrap();

    assert_eq!(controller.code(), DEFAULT_TEMPLATE);
    assert_eq!(store.get(CODE_KEY).unwrap().as_deref(), Some(DEFAULT_TEMPLATE));
    assert!(!confirmation.is_armed());
}

#[tokio::test]
async fn test_identity_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.json");

    {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).unwrap());
        let service = SprintService::from_parts(
            Config::default(),
            store,
            Arc::new(MockBackend::default().with_team("5", "Night Owls")),
        )
        .unwrap();
        service.team().join("Night Owls").await.unwrap();
        service.controller().set_code("persisted code").unwrap();
    }

    let store = FileStore::open(&path).unwrap();
    assert_eq!(store.get(TEAM_ID_KEY).unwrap().as_deref(), Some("5"));
    assert_eq!(
        TeamIdentity::load(&store).unwrap(),
        Some(TeamIdentity::new("Night Owls", "5"))
    );
    assert_eq!(store.get(CODE_KEY).unwrap().as_deref(), Some("persisted code"));
}
