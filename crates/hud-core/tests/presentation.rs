use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use hud_core::recording::{RecordingFactory, RecordingSurfaces, SurfaceCall};
use hud_core::{
    Backing, ContentKind, ContentSpec, Element, HudConfig, HudEvent, HudId, HudPhase,
    PresentationManager, SlideUp, TapPolicy,
};

type Manager = PresentationManager<RecordingSurfaces, RecordingFactory>;

/// Manager plus a virtual clock.
struct Harness {
    manager: Manager,
    now: Instant,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(HudConfig::default())
    }

    fn with_config(config: HudConfig) -> Self {
        Self {
            manager: PresentationManager::new(
                RecordingSurfaces::default(),
                RecordingFactory::default(),
                config,
            ),
            now: Instant::now(),
        }
    }

    fn step(&mut self, ms: u64) -> bool {
        self.now += Duration::from_millis(ms);
        self.manager.tick(self.now)
    }

    /// Ticks until no animation runs.
    fn settle(&mut self) {
        self.manager.tick(self.now);
        for _ in 0..100 {
            if !self.step(50) {
                return;
            }
        }
        panic!("animations did not settle");
    }

    fn assert_single_visible(&self) {
        assert!(self.manager.visible_count() <= 1);
        assert!(self.manager.surfaces().shown().len() <= 1);
    }
}

fn buttons(titles: &[&str]) -> Vec<String> {
    titles.iter().map(ToString::to_string).collect()
}

#[test]
fn test_show_loading_then_dismiss() {
    let mut h = Harness::new();
    let hud = h.manager.show_loading();

    let active = h.manager.active().unwrap();
    assert_eq!(active.id(), hud);
    assert!(active.is_visible());
    assert_eq!(active.content_kind(), Some(ContentKind::Loader));

    h.settle();
    h.manager.dismiss(hud);
    assert!(h.manager.active().is_some(), "exit animation still running");

    h.settle();
    assert!(h.manager.active().is_none());
    assert!(h.manager.hud(hud).is_none());
    assert!(h.manager.is_idle());
    assert_eq!(h.manager.factory().live_count(), 0);
}

#[test]
fn test_second_message_waits_for_the_first() {
    let mut h = Harness::new();
    let a = h.manager.show_message("A", Vec::new(), None);
    let b = h.manager.show_message("B", Vec::new(), None);

    assert!(h.manager.is_active(a));
    assert!(h.manager.is_queued(b));
    assert!(!h.manager.hud(b).unwrap().is_visible());
    h.assert_single_visible();

    h.settle();
    h.manager.dismiss(a);
    h.settle();

    assert!(h.manager.is_active(b));
    assert!(h.manager.hud(b).unwrap().is_visible());
    h.assert_single_visible();
}

#[test]
fn test_button_without_action_dismisses() {
    let mut h = Harness::new();
    let hud = h
        .manager
        .show_message("text", buttons(&["Ok", "Cancel"]), None);
    h.settle();

    assert!(h.manager.tap(hud, Element::Button(1)));
    h.settle();

    assert!(h.manager.hud(hud).is_none());
    assert!(h.manager.is_idle());
}

#[test]
fn test_queue_is_served_in_arrival_order() {
    let mut h = Harness::new();
    let first = h.manager.show_loading();
    let queued: Vec<HudId> = ["A", "B", "C"]
        .into_iter()
        .map(|text| h.manager.show_message(text, Vec::new(), None))
        .collect();
    assert_eq!(h.manager.pending().collect::<Vec<_>>(), queued);

    let mut shown = Vec::new();
    h.settle();
    h.manager.dismiss(first);
    for _ in 0..queued.len() {
        h.settle();
        let active = h.manager.active_id().unwrap();
        shown.push(active);
        h.assert_single_visible();
        h.manager.dismiss(active);
    }
    h.settle();

    assert_eq!(shown, queued);
    assert!(h.manager.is_idle());
}

#[test]
fn test_at_most_one_visible_throughout() {
    let mut h = Harness::new();
    let a = h.manager.show_message("A", Vec::new(), None);
    let b = h.manager.show_message("B", Vec::new(), None);
    h.manager.dismiss(a);

    for _ in 0..40 {
        h.step(20);
        h.assert_single_visible();
        if h.manager.is_active(b) {
            break;
        }
    }
    assert!(h.manager.is_active(b));
}

#[test]
fn test_dismiss_twice_is_idempotent() {
    let mut h = Harness::new();
    let a = h.manager.show_message("A", Vec::new(), None);
    let b = h.manager.show_message("B", Vec::new(), None);
    let c = h.manager.show_message("C", Vec::new(), None);
    h.settle();

    h.manager.dismiss(a);
    h.manager.dismiss(a);
    h.settle();
    h.manager.dismiss(a);

    assert!(h.manager.is_active(b));
    assert!(h.manager.is_queued(c));
    assert_eq!(h.manager.surfaces().created_count(), 2);
    assert_eq!(h.manager.surfaces().hidden_count(), 1);

    let dismissed = h
        .manager
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, HudEvent::Dismissed { .. }))
        .count();
    assert_eq!(dismissed, 1);
}

#[test]
fn test_dismiss_unknown_handle_is_noop() {
    let mut h = Harness::new();
    let a = h.manager.show_loading();
    let b = h.manager.show_loading();
    h.manager.drain_events();

    h.manager.dismiss(HudId(999));

    assert!(h.manager.is_active(a));
    assert_eq!(h.manager.pending().collect::<Vec<_>>(), vec![b]);
    assert!(h.manager.drain_events().is_empty());
}

#[test]
fn test_dismiss_queued_hud_withdraws_it() {
    let mut h = Harness::new();
    let a = h.manager.show_loading();
    let b = h.manager.show_message("B", Vec::new(), None);
    let c = h.manager.show_message("C", Vec::new(), None);

    h.manager.dismiss(b);

    assert!(h.manager.is_active(a));
    assert_eq!(h.manager.pending().collect::<Vec<_>>(), vec![c]);
    assert!(h.manager.hud(b).is_none());
    assert_eq!(h.manager.surfaces().created_count(), 1);
    assert!(
        h.manager
            .drain_events()
            .contains(&HudEvent::Withdrawn { hud: b })
    );
}

#[test]
fn test_surface_created_once_per_display() {
    let mut h = Harness::new();
    let a = h.manager.show_loading();
    h.settle();
    h.manager.dismiss(a);
    h.settle();

    assert_eq!(
        h.manager.surfaces().calls(),
        &[
            SurfaceCall::Created(a),
            SurfaceCall::Shown(a),
            SurfaceCall::Hidden(a)
        ]
    );
}

#[test]
fn test_content_matches_request_immediately() {
    let mut h = Harness::new();
    let hud = h.manager.show_loading();
    h.settle();

    let requests = [
        (ContentSpec::message("done"), ContentKind::Message),
        (
            ContentSpec::message_with_buttons("retry?", ["Yes", "No"]),
            ContentKind::MessageWithActions,
        ),
        (
            ContentSpec::Custom {
                tag: 4,
                payload: "x".to_string(),
            },
            ContentKind::Custom(4),
        ),
        (ContentSpec::Loader, ContentKind::Loader),
    ];
    for (spec, kind) in requests {
        for animated in [true, false] {
            h.manager.set_content(hud, spec.clone(), animated);
            let state = h.manager.hud(hud).unwrap();
            assert_eq!(state.content_kind(), Some(kind));
            assert!(state.content().is_some());
        }
    }
}

#[test]
fn test_animated_text_swap_releases_previous_at_end() {
    let mut h = Harness::new();
    let hud = h.manager.show_loading();
    h.settle();

    h.manager.set_text(hud, "Dude", true);
    let state = h.manager.hud(hud).unwrap();
    assert_eq!(state.phase(), HudPhase::Transitioning);
    assert_eq!(state.previous_content().unwrap().label, "loader");
    assert_eq!(h.manager.factory().live_count(), 2);

    h.settle();
    let state = h.manager.hud(hud).unwrap();
    assert_eq!(state.phase(), HudPhase::Showing);
    assert!(state.previous_content().is_none());
    assert_eq!(state.content().unwrap().label, "Dude");
    assert_eq!(h.manager.factory().live_count(), 1);
}

#[test]
fn test_non_animated_swap_releases_immediately() {
    let mut h = Harness::new();
    let hud = h.manager.show_loading();
    h.settle();

    h.manager.set_text(hud, "now", false);

    let state = h.manager.hud(hud).unwrap();
    assert_eq!(state.phase(), HudPhase::Showing);
    assert!(state.previous_content().is_none());
    assert_eq!(h.manager.factory().live_count(), 1);
}

#[test]
fn test_veto_keeps_hud_visible() {
    let mut h = Harness::new();
    let hud = h.manager.show_message(
        "Delete?",
        buttons(&["Ok", "Cancel"]),
        Some(Box::new(|_| false)),
    );
    h.settle();

    assert!(!h.manager.tap(hud, Element::Button(0)));
    assert!(!h.manager.tap(hud, Element::Cover));
    h.settle();

    let state = h.manager.hud(hud).unwrap();
    assert!(state.is_visible());
    assert_eq!(state.phase(), HudPhase::Showing);
    assert!(
        h.manager
            .drain_events()
            .contains(&HudEvent::DismissVetoed {
                hud,
                element: Element::Button(0)
            })
    );
}

#[test]
fn test_action_returning_true_dismisses() {
    let mut h = Harness::new();
    let hud = h
        .manager
        .show_message("Ok?", buttons(&["Ok"]), Some(Box::new(|_| true)));
    h.settle();

    assert!(h.manager.tap(hud, Element::Button(0)));
    assert_eq!(h.manager.hud(hud).unwrap().phase(), HudPhase::Dismissing);
    h.settle();
    assert!(h.manager.hud(hud).is_none());
}

#[test]
fn test_action_sees_tapped_element() {
    let mut h = Harness::new();
    let seen = Rc::new(Cell::new(None));
    let record = Rc::clone(&seen);
    let hud = h.manager.show_message(
        "pick",
        buttons(&["A", "B", "C"]),
        Some(Box::new(move |ctx| {
            record.set(Some(ctx.element().tag()));
            false
        })),
    );
    h.settle();

    h.manager.tap(hud, Element::Button(2));
    assert_eq!(seen.get(), Some(2));
    h.manager.tap(hud, Element::Cover);
    assert_eq!(seen.get(), Some(hud_core::COVER_TAG));
}

#[test]
fn test_loader_ignores_cover_tap_by_default() {
    let mut h = Harness::new();
    let hud = h.manager.show_loading();
    h.settle();

    assert!(!h.manager.tap(hud, Element::Cover));
    h.settle();

    assert!(h.manager.hud(hud).unwrap().is_visible());
    assert!(
        h.manager
            .drain_events()
            .contains(&HudEvent::TapIgnored {
                hud,
                element: Element::Cover
            })
    );
}

#[test]
fn test_message_dismisses_on_cover_tap_by_default() {
    let mut h = Harness::new();
    let hud = h.manager.show_message("hello", Vec::new(), None);
    h.settle();

    assert!(h.manager.tap(hud, Element::Cover));
    h.settle();
    assert!(h.manager.hud(hud).is_none());
}

#[test]
fn test_tap_policy_override_for_loader() {
    let mut h = Harness::new();
    let hud = h.manager.show_loading();
    h.manager.set_tap_policy(hud, TapPolicy::Always);
    h.settle();

    assert!(h.manager.tap(hud, Element::Cover));
}

#[test]
fn test_background_tap_callback_vetoes_cover_only() {
    let mut h = Harness::new();
    let hud = h.manager.show_message("hello", buttons(&["Ok"]), None);
    h.manager.on_background_tap(hud, |_| false);
    h.settle();

    assert!(!h.manager.tap(hud, Element::Cover));
    assert!(h.manager.tap(hud, Element::Button(0)));
}

#[test]
fn test_out_of_range_button_is_ignored() {
    let mut h = Harness::new();
    let hud = h.manager.show_message("hello", buttons(&["Ok"]), None);
    h.settle();

    assert!(!h.manager.tap(hud, Element::Button(3)));
    assert!(h.manager.hud(hud).unwrap().is_visible());
}

#[test]
fn test_taps_on_queued_hud_are_ignored() {
    let mut h = Harness::new();
    let _active = h.manager.show_loading();
    let queued = h.manager.show_message("later", Vec::new(), None);

    assert!(!h.manager.tap(queued, Element::Cover));
    assert!(h.manager.is_queued(queued));
}

#[test]
fn test_action_can_swap_to_loader_and_veto() {
    let mut h = Harness::new();
    let hud = h.manager.show_message(
        "Upload?",
        buttons(&["Upload"]),
        Some(Box::new(|ctx| {
            ctx.set_loading(true);
            false
        })),
    );
    h.settle();

    assert!(!h.manager.tap(hud, Element::Button(0)));
    assert_eq!(
        h.manager.hud(hud).unwrap().content_kind(),
        Some(ContentKind::Loader)
    );

    h.settle();
    assert!(!h.manager.tap(hud, Element::Cover), "loaders ignore cover taps");

    h.manager.set_text(hud, "Uploaded", true);
    h.settle();
    h.manager.dismiss(hud);
    h.settle();
    assert!(h.manager.hud(hud).is_none());
    assert_eq!(h.manager.factory().live_count(), 0);
}

#[test]
fn test_dismiss_during_entrance_waits_for_entrance() {
    let mut h = Harness::new();
    let hud = h.manager.show_loading();
    h.manager.tick(h.now);
    h.step(100);

    h.manager.dismiss(hud);
    assert!(!h.manager.hud(hud).unwrap().has_entered());

    h.step(200);
    let state = h.manager.hud(hud).unwrap();
    assert!(state.has_entered());
    assert_eq!(state.phase(), HudPhase::Dismissing);

    h.settle();
    assert!(h.manager.hud(hud).is_none());
    let events = h.manager.drain_events();
    let entrance = events
        .iter()
        .position(|e| *e == HudEvent::EntranceFinished { hud })
        .unwrap();
    let dismissed = events
        .iter()
        .position(|e| *e == HudEvent::Dismissed { hud })
        .unwrap();
    assert!(entrance < dismissed);
}

#[test]
fn test_plain_entrance_fades_surface() {
    let mut h = Harness::new();
    let hud = h.manager.show_loading();
    let visuals = *h.manager.hud(hud).unwrap().visuals();
    assert!(visuals.surface_alpha.abs() < f32::EPSILON);

    h.settle();
    let visuals = *h.manager.hud(hud).unwrap().visuals();
    assert!((visuals.surface_alpha - 1.0).abs() < f32::EPSILON);
}

#[test]
fn test_backed_entrance_fades_backing_and_content() {
    let mut h = Harness::with_config(HudConfig {
        backing: Backing::Blur("dark".to_string()),
        ..HudConfig::default()
    });
    let hud = h.manager.show_loading();
    let visuals = *h.manager.hud(hud).unwrap().visuals();
    assert!((visuals.surface_alpha - 1.0).abs() < f32::EPSILON);
    assert!(visuals.backing_alpha.abs() < f32::EPSILON);
    assert!(visuals.content_alpha.abs() < f32::EPSILON);

    h.settle();
    let visuals = *h.manager.hud(hud).unwrap().visuals();
    assert!((visuals.backing_alpha - 1.0).abs() < f32::EPSILON);
    assert!((visuals.content_alpha - 1.0).abs() < f32::EPSILON);
}

#[test]
fn test_slide_up_hud_skips_backing() {
    let mut h = Harness::with_config(HudConfig {
        backing: Backing::Dim,
        ..HudConfig::default()
    });
    let hud = h
        .manager
        .build(ContentSpec::message("Name?"))
        .animation(SlideUp)
        .tap_policy(TapPolicy::Always)
        .show();

    let state = h.manager.hud(hud).unwrap();
    assert!(!state.is_backed());
    assert!((state.visuals().content_offset - 1.0).abs() < f32::EPSILON);

    h.settle();
    assert!(h.manager.hud(hud).unwrap().visuals().content_offset.abs() < f32::EPSILON);
}

#[test]
fn test_config_changes_are_not_retroactive() {
    let mut h = Harness::new();
    let before = h.manager.show_loading();
    h.manager.set_config(HudConfig {
        backing: Backing::Dim,
        ..HudConfig::default()
    });
    let after = h.manager.show_loading();

    assert!(!h.manager.hud(before).unwrap().is_backed());
    assert!(h.manager.hud(after).unwrap().is_backed());
}

#[test]
fn test_created_hud_waits_for_display() {
    let mut h = Harness::new();
    let hud = h.manager.build(ContentSpec::message("parked")).create();
    assert!(h.manager.is_idle());

    h.manager.display(hud);
    h.manager.display(hud);
    assert!(h.manager.is_active(hud));
    assert!(h.manager.pending().next().is_none());
}

#[test]
fn test_display_of_active_hud_does_not_requeue() {
    let mut h = Harness::new();
    let a = h.manager.show_loading();
    let b = h.manager.show_loading();
    h.manager.display(a);
    h.manager.display(b);

    assert_eq!(h.manager.pending().collect::<Vec<_>>(), vec![b]);
}

#[test]
fn test_content_change_while_dismissing_is_immediate() {
    let mut h = Harness::new();
    let hud = h.manager.show_loading();
    h.settle();
    h.manager.dismiss(hud);

    h.manager.set_text(hud, "bye", true);
    let state = h.manager.hud(hud).unwrap();
    assert_eq!(state.phase(), HudPhase::Dismissing);
    assert!(state.previous_content().is_none());
    h.settle();
    assert_eq!(h.manager.factory().live_count(), 0);
}

#[test]
#[should_panic(expected = "after it was dismissed")]
fn test_set_text_after_dismissal_panics() {
    let mut h = Harness::new();
    let hud = h.manager.show_loading();
    h.settle();
    h.manager.dismiss(hud);
    h.settle();

    h.manager.set_text(hud, "too late", false);
}

#[test]
fn test_tick_reports_animation_state() {
    let mut h = Harness::with_config(HudConfig {
        animation_ms: 100,
        ..HudConfig::default()
    });
    assert!(!h.manager.tick(h.now));

    h.manager.show_loading();
    assert!(h.manager.tick(h.now));
    assert!(!h.step(100));
}
