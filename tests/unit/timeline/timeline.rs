use super::*;

#[test]
fn leaving_hidden_stamps_visible_since_once() {
    let mut t = CharacterTimeline::new(3, VisibilityState::Hidden, 0.0);
    t.set_visibility_state(1, VisibilityState::ShowAnimation, 1.0);
    t.set_visibility_state(1, VisibilityState::Shown, 1.5);

    let e = t.get(1).unwrap();
    assert_eq!(e.visibility_state(), VisibilityState::Shown);
    assert_eq!(e.visible_since_time(), 1.0);
    assert_eq!(e.state_entry_time(), 1.5);
}

#[test]
fn show_animation_churn_keeps_visible_since() {
    let mut t = CharacterTimeline::new(1, VisibilityState::Hidden, 0.0);
    t.set_visibility_state(0, VisibilityState::ShowAnimation, 2.0);
    t.set_visibility_state(0, VisibilityState::Shown, 2.5);
    t.set_visibility_state(0, VisibilityState::ShowAnimation, 3.0);
    t.set_visibility_state(0, VisibilityState::Shown, 3.5);
    let e = t.get(0).unwrap();
    assert_eq!(e.visible_since_time(), 2.0);
    assert_eq!(e.visible_duration(4.0), 2.0);
    assert_eq!(e.time_in_state(4.0), 0.5);
}

#[test]
fn hide_then_show_restamps() {
    let mut t = CharacterTimeline::new(1, VisibilityState::Shown, 0.0);
    t.set_visibility_state(0, VisibilityState::HideAnimation, 1.0);
    assert_eq!(t.get(0).unwrap().visible_since_time(), 0.0);
    t.set_visibility_state(0, VisibilityState::Hidden, 2.0);
    assert_eq!(t.get(0).unwrap().visible_duration(5.0), 0.0);
    t.set_visibility_state(0, VisibilityState::Shown, 3.0);
    assert_eq!(t.get(0).unwrap().visible_since_time(), 3.0);
}

#[test]
fn hidden_to_hidden_does_not_restamp() {
    let mut t = CharacterTimeline::new(1, VisibilityState::Hidden, 0.0);
    t.set_visibility_state(0, VisibilityState::Hidden, 4.0);
    let e = t.get(0).unwrap();
    assert_eq!(e.visible_since_time(), 0.0);
    assert_eq!(e.state_entry_time(), 4.0);
}

#[test]
fn reset_discards_entries() {
    let mut t = CharacterTimeline::new(2, VisibilityState::Hidden, 0.0);
    t.set_visibility_state(0, VisibilityState::Shown, 1.0);
    t.reset(4, VisibilityState::Hidden, 9.0);
    assert_eq!(t.len(), 4);
    assert!(
        t.entries()
            .iter()
            .all(|e| e.visibility_state() == VisibilityState::Hidden && e.state_entry_time() == 9.0)
    );
    assert_eq!(t.indices_in(VisibilityState::Hidden).count(), 4);
}

#[test]
#[should_panic]
fn out_of_range_transition_panics() {
    let mut t = CharacterTimeline::new(1, VisibilityState::Hidden, 0.0);
    t.set_visibility_state(5, VisibilityState::Shown, 0.0);
}
