use std::sync::{Arc, Mutex};
use std::time::Duration;

use toast_dock::{
    DockEvent, EngineConfig, GlobalPatch, LifecycleAction, LifecycleLogger, ListenerError, Logger,
    MemorySink, Notifier, Position, ToastDefaultsPatch, ToastId, ToastPatch, ToastState, ToastType,
};

type Seen = Arc<Mutex<Vec<(LifecycleAction, u64)>>>;

fn watch(notifier: &Notifier) -> Seen {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _ = notifier.subscribe(move |event| {
        sink.lock().unwrap().push((event.action, event.toast.id.0));
        Ok(())
    });
    seen
}

fn active_ids(notifier: &Notifier) -> Vec<u64> {
    notifier.toasts().iter().map(|toast| toast.id.0).collect()
}

#[test]
fn local_timeout_wins_over_global_default() {
    let mut notifier = Notifier::new();
    notifier
        .set_config(Some(&GlobalPatch::new().with_timeout_ms(30_000)), None)
        .unwrap();

    let success = notifier
        .success("Saved", "", &ToastPatch::new().with_timeout_ms(3000))
        .unwrap();
    let bare = notifier.bare("Plain", "", &ToastPatch::default()).unwrap();

    assert_eq!(success.config.timeout, Duration::from_millis(3000));
    assert_eq!(success.config.kind, ToastType::Success);
    assert_eq!(bare.config.timeout, Duration::from_millis(30_000));
}

#[test]
fn seventh_toast_evicts_the_first() {
    let mut notifier = Notifier::new();
    notifier
        .set_config(
            Some(
                &GlobalPatch::new()
                    .with_max_on_screen(6)
                    .with_new_on_top(false),
            ),
            None,
        )
        .unwrap();
    let seen = watch(&notifier);

    for n in 1..=7 {
        let toast = notifier.info(format!("#{n}"), "", &ToastPatch::default()).unwrap();
        assert_eq!(toast.id, ToastId(n));
        assert!(notifier.len() <= 6);
    }

    assert_eq!(active_ids(&notifier), vec![2, 3, 4, 5, 6, 7]);
    assert!(notifier.get(ToastId(1)).unwrap_err().is_not_found());
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (LifecycleAction::BeforeDestroy, 1),
            (LifecycleAction::AfterDestroy, 1)
        ]
    );
}

#[test]
fn eviction_events_precede_new_toast_init() {
    let mut notifier = Notifier::new();
    notifier
        .set_config(Some(&GlobalPatch::new().with_max_on_screen(1)), None)
        .unwrap();
    let seen = watch(&notifier);

    notifier.info("old", "", &ToastPatch::default()).unwrap();
    let fresh = notifier.info("new", "", &ToastPatch::default()).unwrap();
    notifier.on_shown(fresh.id).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (LifecycleAction::BeforeDestroy, 1),
            (LifecycleAction::AfterDestroy, 1),
            (LifecycleAction::OnInit, 2)
        ]
    );
}

#[test]
fn display_order_follows_new_on_top() {
    let mut notifier = Notifier::new();
    for _ in 0..3 {
        notifier.bare("", "", &ToastPatch::default()).unwrap();
    }
    assert_eq!(active_ids(&notifier), vec![3, 2, 1]);

    let mut appended = Notifier::new();
    appended
        .set_config(Some(&GlobalPatch::new().with_new_on_top(false)), None)
        .unwrap();
    for _ in 0..3 {
        appended.bare("", "", &ToastPatch::default()).unwrap();
    }
    assert_eq!(active_ids(&appended), vec![1, 2, 3]);
}

#[test]
fn countdown_expires_once_after_hundred_ticks() {
    let mut notifier = Notifier::new();
    let seen = watch(&notifier);
    let toast = notifier
        .info("Working", "", &ToastPatch::new().with_timeout_ms(1000))
        .unwrap();
    notifier.on_shown(toast.id).unwrap();

    for _ in 0..99 {
        notifier.advance(Duration::from_millis(10));
    }
    assert_eq!(notifier.get(toast.id).unwrap().state, ToastState::Visible);

    notifier.advance(Duration::from_millis(10));
    let removed = notifier.get(toast.id).unwrap();
    assert_eq!(removed.state, ToastState::Removing);
    assert!(removed.progress >= 100.0);

    notifier.advance(Duration::from_secs(5));
    let before_destroy = seen
        .lock()
        .unwrap()
        .iter()
        .filter(|(action, _)| *action == LifecycleAction::BeforeDestroy)
        .count();
    assert_eq!(before_destroy, 1);
}

#[test]
fn hover_pause_resume_keeps_progress() {
    let mut notifier = Notifier::new();
    let toast = notifier
        .warning("Careful", "", &ToastPatch::new().with_timeout_ms(2000))
        .unwrap();

    notifier
        .run_scripted([
            DockEvent::Shown(toast.id),
            DockEvent::tick_ms(500),
            DockEvent::HoverEnter(toast.id),
        ])
        .unwrap();
    let paused_at = notifier.progress(toast.id).unwrap();
    assert!((paused_at - 25.0).abs() < 1e-6);

    notifier
        .run_scripted([DockEvent::tick_ms(10_000), DockEvent::HoverLeave(toast.id)])
        .unwrap();
    assert_eq!(notifier.progress(toast.id).unwrap(), paused_at);
    assert_eq!(notifier.get(toast.id).unwrap().state, ToastState::Visible);

    notifier.advance(Duration::from_millis(1500));
    assert_eq!(notifier.get(toast.id).unwrap().state, ToastState::Removing);
}

#[test]
fn hover_reaches_bus_and_hook() {
    let mut notifier = Notifier::new();
    let seen = watch(&notifier);
    // bus events already delivered each time the hook runs
    let hook_calls = Arc::new(Mutex::new(Vec::new()));
    let calls = Arc::clone(&hook_calls);
    let bus_view = Arc::clone(&seen);
    notifier.set_hover_hook(move |toast| {
        let delivered = bus_view.lock().unwrap().clone();
        calls.lock().unwrap().push((toast.id.0, delivered));
    });

    let toast = notifier.info("Hover me", "", &ToastPatch::default()).unwrap();
    notifier
        .run_scripted([DockEvent::Shown(toast.id), DockEvent::HoverEnter(toast.id)])
        .unwrap();
    assert_eq!(notifier.get(toast.id).unwrap().state, ToastState::Paused);

    notifier.run_scripted([DockEvent::HoverLeave(toast.id)]).unwrap();
    assert_eq!(notifier.get(toast.id).unwrap().state, ToastState::Visible);

    let id = toast.id.0;
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (LifecycleAction::OnInit, id),
            (LifecycleAction::OnHoverEnter, id),
            (LifecycleAction::OnHoverLeave, id)
        ]
    );
    assert_eq!(
        *hook_calls.lock().unwrap(),
        vec![(
            id,
            vec![
                (LifecycleAction::OnInit, id),
                (LifecycleAction::OnHoverEnter, id)
            ]
        )]
    );
}

#[test]
fn async_toast_stays_until_retyped_and_clicked() {
    let mut notifier = Notifier::new();
    let seen = watch(&notifier);
    let pending = notifier
        .async_toast("Uploading", "please wait", &ToastPatch::new().with_timeout_ms(500))
        .unwrap();
    assert_eq!(pending.config.timeout, Duration::ZERO);
    assert!(!pending.config.show_progress_bar);

    notifier.on_shown(pending.id).unwrap();
    notifier.advance(Duration::from_secs(60));
    notifier.on_clicked(pending.id).unwrap();
    assert_eq!(notifier.get(pending.id).unwrap().state, ToastState::Visible);

    notifier
        .set_type(pending.id, ToastType::Success, Some(true))
        .unwrap();
    notifier.on_clicked(pending.id).unwrap();
    assert_eq!(notifier.get(pending.id).unwrap().state, ToastState::Removing);

    let actions: Vec<LifecycleAction> = seen.lock().unwrap().iter().map(|(a, _)| *a).collect();
    assert_eq!(
        actions,
        vec![
            LifecycleAction::OnInit,
            LifecycleAction::OnClick,
            LifecycleAction::TypeChanged,
            LifecycleAction::OnClick,
            LifecycleAction::BeforeDestroy
        ]
    );
}

#[test]
fn unknown_ids_are_benign() {
    let mut notifier = Notifier::new();
    assert!(notifier.remove(ToastId(42)).unwrap_err().is_not_found());
    assert!(notifier.on_hover_enter(ToastId(42)).unwrap_err().is_not_found());
    assert!(notifier.get_config(ToastId(42)).is_err());

    notifier
        .run_scripted([
            DockEvent::Clicked(ToastId(42)),
            DockEvent::Destroyed(ToastId(42)),
            DockEvent::tick_ms(10),
        ])
        .unwrap();
}

#[test]
fn double_removal_and_late_destroy() {
    let mut notifier = Notifier::new();
    let seen = watch(&notifier);
    let toast = notifier.error("Oops", "", &ToastPatch::default()).unwrap();
    notifier.on_shown(toast.id).unwrap();

    let mut exit_styled = 0;
    notifier.remove_with(toast.id, |_| exit_styled += 1).unwrap();
    notifier.remove_with(toast.id, |_| exit_styled += 1).unwrap();
    assert_eq!(exit_styled, 1);
    assert_eq!(notifier.sequence(), vec![toast.id]);
    assert!(notifier.is_empty());

    notifier.on_destroyed(toast.id).unwrap();
    assert!(notifier.sequence().is_empty());
    assert!(notifier.on_destroyed(toast.id).unwrap_err().is_not_found());

    let actions: Vec<LifecycleAction> = seen.lock().unwrap().iter().map(|(a, _)| *a).collect();
    assert_eq!(
        actions,
        vec![
            LifecycleAction::OnInit,
            LifecycleAction::BeforeDestroy,
            LifecycleAction::AfterDestroy
        ]
    );
}

#[test]
fn clear_moves_everything_to_removing() {
    let mut notifier = Notifier::new();
    let ids: Vec<ToastId> = (0..3)
        .map(|_| notifier.info("", "", &ToastPatch::default()).unwrap().id)
        .collect();
    for id in &ids {
        notifier.on_shown(*id).unwrap();
    }

    assert_eq!(notifier.clear(), 3);
    assert!(notifier.is_empty());
    for id in &ids {
        assert_eq!(notifier.get(*id).unwrap().state, ToastState::Removing);
        assert!(notifier.timer_state(*id).is_none());
    }
    assert_eq!(notifier.clear(), 0);
}

#[test]
fn faulty_subscriber_does_not_break_the_dock() {
    let sink = MemorySink::new();
    let mut config = EngineConfig {
        logger: Some(Logger::new(sink.clone())),
        ..EngineConfig::default()
    };
    config.enable_metrics();
    let mut notifier = Notifier::with_config(config);
    notifier
        .set_config(Some(&GlobalPatch::new().with_max_on_screen(2)), None)
        .unwrap();

    let _bad = notifier.subscribe(|_| Err(ListenerError::new("view detached")));
    let seen = watch(&notifier);

    for _ in 0..3 {
        notifier.info("", "", &ToastPatch::default()).unwrap();
    }
    assert_eq!(active_ids(&notifier), vec![3, 2]);
    assert_eq!(seen.lock().unwrap().len(), 2);
    assert_eq!(notifier.metrics_snapshot().unwrap().listener_failures, 2);
    assert!(sink.messages().iter().any(|m| m == "listener_failed"));
}

#[test]
fn lifecycle_logger_writes_json_lines() {
    let sink = MemorySink::new();
    let mut notifier = Notifier::new();
    let _sub = notifier.subscribe_listener(LifecycleLogger::new(Logger::new(sink.clone())));
    notifier
        .set_config(
            None,
            Some(&ToastDefaultsPatch::new().with_show_progress_bar(false)),
        )
        .unwrap();

    let toast = notifier
        .success("Done", "", &ToastPatch::new().with_position(&[Position::Top]))
        .unwrap();
    assert!(!toast.config.show_progress_bar);
    notifier
        .run_scripted([DockEvent::Shown(toast.id), DockEvent::Clicked(toast.id)])
        .unwrap();

    assert_eq!(
        sink.messages(),
        vec![
            "onInit".to_string(),
            "onClick".to_string(),
            "beforeDestroy".to_string()
        ]
    );
    let lines = sink.lines().unwrap();
    assert!(lines[0].contains("\"type\":\"success\""));
}

#[test]
fn invalid_overrides_are_rejected() {
    let mut notifier = Notifier::new();
    assert!(
        notifier
            .info("", "", &ToastPatch::new().with_timeout_ms(-1))
            .is_err()
    );
    assert!(
        notifier
            .info("", "", &ToastPatch::new().with_position(&[Position::Left, Position::Right]))
            .is_err()
    );
    assert!(notifier.set_config(Some(&GlobalPatch::new().with_max_on_screen(0)), None).is_err());
    assert!(Position::from_selector(7).is_err());
    assert!(notifier.is_empty());
}
