// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::{Duration, Instant};

use crate::core::decomposer::CapturedControl;
use crate::core::rebind::{RebindEvent, RebindEventKind, RebindKey};
use crate::core::{
    Action, ActionAsset, ActionMap, ActionMapLinks, ActionRef, Binding, BindingStore, CompositeKind,
    RebindContext, RebindCoordinator, RebindError, RebindOptions, RebindOutcome, RebindState,
    Resolution, RevertReason, SlotLayout,
};

const KB: &str = "Keyboard&Mouse";

/// Helper to create a flexible composite with its three parts
fn flexible(m1: &str, m2: &str, button: &str) -> Vec<Binding> {
    vec![
        Binding::composite(CompositeKind::TwoOptionalModifiers, ""),
        Binding::part("modifier1", m1, KB),
        Binding::part("modifier2", m2, KB),
        Binding::part("button", button, KB),
    ]
}

fn test_asset() -> ActionAsset {
    ActionAsset::new(vec![ActionMap::new(
        "Shortcuts",
        vec![
            Action::new("Jump", vec![Binding::plain("<Keyboard>/j", KB)]),
            Action::new("Dash", flexible("", "", "<Keyboard>/d")),
            Action::new("Sprint", flexible("<Keyboard>/leftShift", "", "<Keyboard>/space")),
        ],
    )])
}

fn jump() -> ActionRef {
    ActionRef::new("Shortcuts", "Jump")
}

fn dash() -> ActionRef {
    ActionRef::new("Shortcuts", "Dash")
}

fn sprint() -> ActionRef {
    ActionRef::new("Shortcuts", "Sprint")
}

fn modifier_layout() -> SlotLayout {
    SlotLayout::with_modifiers(1, 2, 3)
}

fn coordinator(asset: &ActionAsset, action: ActionRef, layout: SlotLayout, context: &RebindContext) -> RebindCoordinator {
    let mut coordinator = RebindCoordinator::new(asset, action, layout, context.clone()).unwrap();
    coordinator.activate();
    coordinator
}

fn path(asset: &ActionAsset, action: &ActionRef, index: usize) -> String {
    asset.action(action).unwrap().bindings[index].effective_path().to_string()
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

// ============================================================================
// Capture Scenarios
// ============================================================================

#[test]
fn test_single_press_without_modifier_slots_commits() {
    let mut asset = test_asset();
    let context = RebindContext::default();
    let mut jump_rebind = coordinator(&asset, jump(), SlotLayout::single(0), &context);

    let t0 = Instant::now();
    jump_rebind.start(&mut asset, t0).unwrap();
    assert_eq!(jump_rebind.state(), RebindState::AwaitingInput);
    assert!(!asset.action(&jump()).unwrap().is_enabled());

    jump_rebind.record(CapturedControl::button("/Keyboard/space"), t0).unwrap();
    let outcome = jump_rebind.tick(&mut asset, t0).unwrap().unwrap();

    // A plain space does not collide with Sprint's shift+space
    let RebindOutcome::Committed(combination) = outcome else {
        panic!("expected commit, got {:?}", outcome);
    };
    assert_eq!(combination.display_string(), "<Keyboard>/space");
    assert_eq!(jump_rebind.display_text(), "<Keyboard>/space");
    assert_eq!(path(&asset, &jump(), 0), "<Keyboard>/space");
    assert!(asset.action(&jump()).unwrap().is_enabled());
    assert_eq!(jump_rebind.state(), RebindState::Idle);
}

#[test]
fn test_modifier_capture_conflict_override() {
    let mut asset = test_asset();
    let context = RebindContext::default();
    let mut dash_rebind = coordinator(&asset, dash(), modifier_layout(), &context);
    let mut sprint_rebind = coordinator(&asset, sprint(), modifier_layout(), &context);
    assert_eq!(sprint_rebind.display_text(), "<Keyboard>/leftShift+<Keyboard>/space");

    let t0 = Instant::now();
    dash_rebind.start(&mut asset, t0).unwrap();
    dash_rebind.record(CapturedControl::button("/Keyboard/leftShift"), t0).unwrap();
    dash_rebind.record(CapturedControl::button("/Keyboard/space"), t0 + ms(100)).unwrap();

    // Still inside the wait-for-another window
    assert_eq!(dash_rebind.tick(&mut asset, t0 + ms(300)).unwrap(), None);

    let outcome = dash_rebind.tick(&mut asset, t0 + ms(600)).unwrap().unwrap();
    let RebindOutcome::Conflicted(duplicate) = outcome else {
        panic!("expected conflict, got {:?}", outcome);
    };
    assert_eq!(duplicate.action, sprint());
    assert_eq!(duplicate.index, 3);
    assert_eq!(dash_rebind.state(), RebindState::Conflicted);

    // Nothing was written while the decision is pending
    assert_eq!(path(&asset, &dash(), 3), "<Keyboard>/d");

    let outcome = dash_rebind.resolve(&mut asset, Resolution::Override).unwrap();
    let RebindOutcome::Committed(combination) = outcome else {
        panic!("expected commit, got {:?}", outcome);
    };
    assert_eq!(combination.display_string(), "<Keyboard>/leftShift+<Keyboard>/space");
    assert_eq!(path(&asset, &dash(), 1), "<Keyboard>/leftShift");
    assert_eq!(path(&asset, &dash(), 2), "");
    assert_eq!(path(&asset, &dash(), 3), "<Keyboard>/space");

    // The duplicate was cleared in the store and its coordinator refreshes
    assert_eq!(path(&asset, &sprint(), 1), "");
    assert_eq!(path(&asset, &sprint(), 3), "");
    sprint_rebind.process_events(&asset).unwrap();
    assert!(sprint_rebind.combination().is_empty());
    assert_eq!(sprint_rebind.display_text(), "-");
    assert!(sprint_rebind.is_interactive());
}

#[test]
fn test_modifier_capture_conflict_revert() {
    let mut asset = test_asset();
    let before = asset.clone();
    let context = RebindContext::default();
    let mut dash_rebind = coordinator(&asset, dash(), modifier_layout(), &context);
    let original = dash_rebind.combination().clone();

    let t0 = Instant::now();
    dash_rebind.start(&mut asset, t0).unwrap();
    dash_rebind.record(CapturedControl::button("/Keyboard/leftShift"), t0).unwrap();
    dash_rebind.record(CapturedControl::button("/Keyboard/space"), t0).unwrap();
    let outcome = dash_rebind.tick(&mut asset, t0 + ms(500)).unwrap().unwrap();
    assert!(matches!(outcome, RebindOutcome::Conflicted(_)));

    let outcome = dash_rebind.resolve(&mut asset, Resolution::Revert).unwrap();
    assert_eq!(outcome, RebindOutcome::Reverted(RevertReason::Declined));

    assert_eq!(dash_rebind.combination(), &original);
    assert_eq!(asset, before);
    assert_eq!(dash_rebind.state(), RebindState::Idle);
}

#[test]
fn test_timeout_reverts() {
    let mut asset = test_asset();
    let context = RebindContext::default();
    let mut jump_rebind = coordinator(&asset, jump(), SlotLayout::single(0), &context);

    let t0 = Instant::now();
    jump_rebind.start(&mut asset, t0).unwrap();
    assert_eq!(jump_rebind.tick(&mut asset, t0 + ms(500)).unwrap(), None);

    let outcome = jump_rebind.tick(&mut asset, t0 + ms(1000)).unwrap();
    assert_eq!(outcome, Some(RebindOutcome::Reverted(RevertReason::TimedOut)));
    assert_eq!(path(&asset, &jump(), 0), "<Keyboard>/j");
    assert!(asset.action(&jump()).unwrap().is_enabled());
}

#[test]
fn test_cancel_is_honoured_before_input() {
    let mut asset = test_asset();
    let context = RebindContext::default();
    let mut jump_rebind = coordinator(&asset, jump(), SlotLayout::single(0), &context);

    let t0 = Instant::now();
    jump_rebind.start(&mut asset, t0).unwrap();
    jump_rebind.record(CapturedControl::button("/Keyboard/k"), t0).unwrap();
    jump_rebind.cancel();

    let outcome = jump_rebind.tick(&mut asset, t0).unwrap();
    assert_eq!(outcome, Some(RebindOutcome::Reverted(RevertReason::Cancelled)));
    assert_eq!(jump_rebind.display_text(), "<Keyboard>/j");
}

#[test]
fn test_cancel_sentinel_from_options() {
    let mut asset = test_asset();
    let context = RebindContext::new(
        ActionMapLinks::default(),
        RebindOptions {
            cancel_sentinel: "<Keyboard>/escape".to_string(),
            ..RebindOptions::default()
        },
    );
    let mut jump_rebind = coordinator(&asset, jump(), SlotLayout::single(0), &context);

    let t0 = Instant::now();
    jump_rebind.start(&mut asset, t0).unwrap();
    jump_rebind.record(CapturedControl::button("/Keyboard/escape"), t0).unwrap();

    let outcome = jump_rebind.tick(&mut asset, t0).unwrap();
    assert_eq!(outcome, Some(RebindOutcome::Reverted(RevertReason::Cancelled)));
}

// ============================================================================
// Broadcasts
// ============================================================================

#[test]
fn test_other_coordinators_are_disabled_during_rebind() {
    let mut asset = test_asset();
    let context = RebindContext::default();
    let mut jump_rebind = coordinator(&asset, jump(), SlotLayout::single(0), &context);
    let mut dash_rebind = coordinator(&asset, dash(), modifier_layout(), &context);

    let t0 = Instant::now();
    dash_rebind.start(&mut asset, t0).unwrap();

    jump_rebind.process_events(&asset).unwrap();
    dash_rebind.process_events(&asset).unwrap();
    assert!(!jump_rebind.is_interactive());
    assert!(dash_rebind.is_interactive());
    assert!(matches!(
        jump_rebind.start(&mut asset, t0),
        Err(RebindError::NotInteractive(_))
    ));

    dash_rebind.cancel();
    dash_rebind.tick(&mut asset, t0).unwrap();

    jump_rebind.process_events(&asset).unwrap();
    assert!(jump_rebind.is_interactive());
    jump_rebind.start(&mut asset, t0).unwrap();
}

#[test]
fn test_second_rebind_is_refused_without_pumping_events() {
    let mut asset = test_asset();
    let context = RebindContext::default();
    let mut jump_rebind = coordinator(&asset, jump(), SlotLayout::single(0), &context);
    let mut dash_rebind = coordinator(&asset, dash(), modifier_layout(), &context);

    let t0 = Instant::now();
    jump_rebind.start(&mut asset, t0).unwrap();

    assert!(matches!(
        dash_rebind.start(&mut asset, t0),
        Err(RebindError::NotInteractive(_))
    ));
    assert!(matches!(dash_rebind.clear(&mut asset), Err(RebindError::NotInteractive(_))));
    assert_eq!(dash_rebind.state(), RebindState::Idle);
    assert!(asset.action(&dash()).unwrap().is_enabled());
    assert_eq!(path(&asset, &dash(), 3), "<Keyboard>/d");

    jump_rebind.cancel();
    jump_rebind.tick(&mut asset, t0).unwrap();

    dash_rebind.start(&mut asset, t0).unwrap();
    assert_eq!(dash_rebind.state(), RebindState::AwaitingInput);
}

#[test]
fn test_origin_is_excluded_by_key() {
    let asset = test_asset();
    let context = RebindContext::default();
    let mut jump_rebind = coordinator(&asset, jump(), SlotLayout::single(0), &context);

    context.bus.publish(RebindEvent {
        kind: RebindEventKind::Started,
        key: RebindKey {
            action: jump(),
            combination: jump_rebind.combination().clone(),
            index: 0,
        },
    });
    jump_rebind.process_events(&asset).unwrap();
    assert!(jump_rebind.is_interactive());
}

#[test]
fn test_deactivate_unsubscribes_and_reverts() {
    let mut asset = test_asset();
    let context = RebindContext::default();
    let mut jump_rebind = coordinator(&asset, jump(), SlotLayout::single(0), &context);
    let _dash_rebind = coordinator(&asset, dash(), modifier_layout(), &context);
    assert_eq!(context.bus.subscriber_count(), 2);

    jump_rebind.start(&mut asset, Instant::now()).unwrap();
    jump_rebind.deactivate(&mut asset).unwrap();

    assert_eq!(context.bus.subscriber_count(), 1);
    assert!(!jump_rebind.is_active());
    assert_eq!(jump_rebind.state(), RebindState::Idle);
    assert!(asset.action(&jump()).unwrap().is_enabled());
}

// ============================================================================
// Clear and Misuse
// ============================================================================

#[test]
fn test_clear_commits_empty_combination() {
    let mut asset = test_asset();
    let context = RebindContext::default();
    let mut sprint_rebind = coordinator(&asset, sprint(), modifier_layout(), &context);

    let cleared = sprint_rebind.clear(&mut asset).unwrap();

    assert_eq!(cleared.display_string(), "");
    assert_eq!(cleared.modifier1().path(), "");
    assert_eq!(cleared.modifier2().path(), "");
    assert_eq!(cleared.button().path(), "");
    assert_eq!(sprint_rebind.display_text(), "-");
    for index in 1..=3 {
        assert_eq!(path(&asset, &sprint(), index), "");
    }
    // Identities survive the clear
    let action = asset.action(&sprint()).unwrap();
    assert_eq!(cleared.button().id(), Some(action.bindings[3].id));
}

#[test]
fn test_misuse_is_reported() {
    let mut asset = test_asset();
    let context = RebindContext::default();

    let mut inactive = RebindCoordinator::new(&asset, jump(), SlotLayout::single(0), context.clone()).unwrap();
    assert!(matches!(
        inactive.start(&mut asset, Instant::now()),
        Err(RebindError::Inactive(_))
    ));

    let mut jump_rebind = coordinator(&asset, jump(), SlotLayout::single(0), &context);
    assert_eq!(
        jump_rebind.resolve(&mut asset, Resolution::Override),
        Err(RebindError::NoPendingConflict)
    );

    jump_rebind.start(&mut asset, Instant::now()).unwrap();
    assert!(matches!(
        jump_rebind.start(&mut asset, Instant::now()),
        Err(RebindError::Busy(_))
    ));
    assert!(matches!(jump_rebind.clear(&mut asset), Err(RebindError::Busy(_))));
}

#[test]
fn test_invalid_layouts_fail_at_construction() {
    let asset = test_asset();
    let context = RebindContext::default();

    let repeated = RebindCoordinator::new(&asset, dash(), SlotLayout::with_modifiers(1, 1, 3), context.clone());
    assert!(matches!(repeated, Err(RebindError::Configuration(_))));

    let out_of_range = RebindCoordinator::new(&asset, jump(), SlotLayout::single(4), context.clone());
    assert!(matches!(out_of_range, Err(RebindError::Lookup(_))));

    let stale = RebindCoordinator::new(&asset, ActionRef::new("Shortcuts", "Gone"), SlotLayout::single(0), context);
    assert!(matches!(stale, Err(RebindError::Lookup(_))));
}
