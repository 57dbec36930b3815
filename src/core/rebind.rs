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

//! src/core/rebind.rs
//!
//! Interactive rebinding
//!
//! A `RebindCoordinator` owns one rebindable slot (a button plus optional
//! modifier slots of one action) and drives it through
//!
//! ```text
//! Idle ──start──▶ AwaitingInput ──capture──▶ commit ──────────▶ Idle
//!                      │                  └─▶ Conflicted ─resolve─▶ Idle
//!                      └──cancel / timeout──────────────────────▶ Idle
//! ```
//!
//! Everything runs on the caller's thread. The capture session is a
//! cooperative timer: the host feeds it pressed controls and calls `tick`
//! with the current time; grace window, timeout and cancel are all checked
//! there.
//!
//! # Broadcasts
//! Coordinators sharing a `RebindBus` tell each other when a rebind starts
//! and ends. Every other coordinator makes itself non-interactive for the
//! duration, so only one rebind runs at a time. The originator is excluded
//! by its (action, combination, slot index) key at publish time.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::core::combination::{BindingCombination, CombinationBuilder};
use crate::core::composite::enclosing_composite;
use crate::core::decomposer::{normalize_capture, CapturedControl};
use crate::core::devices::{binding_index_by_device, format_control_path, ControlSchemes, DeviceType};
use crate::core::duplicate::{Duplicate, DuplicateFinder};
use crate::core::error::{ConfigurationError, LookupError, RebindError};
use crate::core::links::ActionMapLinks;
use crate::core::store::{Action, BindingStore};
use crate::core::types::{ActionRef, CompositeKind, SlotRef};

// ============================================================================
// Bus
// ============================================================================

/// Identifies a rebindable slot in broadcasts
#[derive(Clone, Debug, PartialEq)]
pub struct RebindKey {
    pub action: ActionRef,
    pub combination: BindingCombination,
    /// Button slot index
    pub index: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RebindEventKind {
    Started,
    Ended,
    /// The slot named by the key was cleared by another coordinator
    Cleared,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RebindEvent {
    pub kind: RebindEventKind,
    pub key: RebindKey,
}

type Inbox = Rc<RefCell<VecDeque<RebindEvent>>>;

struct Subscriber {
    key: Rc<RefCell<Option<RebindKey>>>,
    inbox: Inbox,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    subscribers: BTreeMap<u64, Subscriber>,
}

/// Observer registry shared by the coordinators of one rebinding context
#[derive(Clone, Default)]
pub struct RebindBus {
    inner: Rc<RefCell<BusInner>>,
}

impl RebindBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new listener. Dropping the subscription unregisters it.
    pub fn subscribe(&self) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;

        let key = Rc::new(RefCell::new(None));
        let inbox: Inbox = Rc::new(RefCell::new(VecDeque::new()));
        inner.subscribers.insert(
            id,
            Subscriber {
                key: Rc::clone(&key),
                inbox: Rc::clone(&inbox),
            },
        );

        Subscription {
            id,
            bus: Rc::downgrade(&self.inner),
            key,
            inbox,
        }
    }

    /// Queues `event` for every subscriber.
    ///
    /// Start and end events skip the subscriber whose key equals the
    /// event's key.
    pub fn publish(&self, event: RebindEvent) {
        let inner = self.inner.borrow();
        for subscriber in inner.subscribers.values() {
            let is_origin = subscriber.key.borrow().as_ref() == Some(&event.key);
            if is_origin && event.kind != RebindEventKind::Cleared {
                continue;
            }
            subscriber.inbox.borrow_mut().push_back(event.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

/// A live registration on a `RebindBus`
pub struct Subscription {
    id: u64,
    bus: Weak<RefCell<BusInner>>,
    key: Rc<RefCell<Option<RebindKey>>>,
    inbox: Inbox,
}

impl Subscription {
    /// Key used to recognise this subscriber's own broadcasts.
    pub fn set_key(&self, key: RebindKey) {
        *self.key.borrow_mut() = Some(key);
    }

    /// Takes every event queued since the last call.
    pub fn drain(&self) -> Vec<RebindEvent> {
        self.inbox.borrow_mut().drain(..).collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.borrow_mut().subscribers.remove(&self.id);
        }
    }
}

// ============================================================================
// Capture session
// ============================================================================

/// Parameters of one capture
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConfig {
    pub slot: SlotRef,
    /// After a press, how long to wait for another one; zero without modifiers
    pub wait_for_another: Duration,
    /// Give up after this long without input
    pub timeout: Duration,
    /// Pressing this control cancels; an empty sentinel never matches
    pub cancel_sentinel: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CapturePoll {
    Pending,
    Completed(Vec<CapturedControl>),
    Cancelled,
    TimedOut,
}

/// Cooperative capture timer fed by the host's input events
#[derive(Debug)]
pub struct CaptureSession {
    config: CaptureConfig,
    started_at: Instant,
    last_input_at: Option<Instant>,
    candidates: Vec<CapturedControl>,
    cancelled: bool,
}

impl CaptureSession {
    pub fn start(config: CaptureConfig, now: Instant) -> Self {
        Self {
            config,
            started_at: now,
            last_input_at: None,
            candidates: Vec::new(),
            cancelled: false,
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Records a pressed control. Repeated presses of one control count once.
    pub fn record(&mut self, control: CapturedControl, now: Instant) {
        if self.cancelled {
            return;
        }

        let sentinel = &self.config.cancel_sentinel;
        if !sentinel.is_empty() && format_control_path(&control.path) == *sentinel {
            self.cancelled = true;
            return;
        }

        if !self.candidates.iter().any(|c| c.path == control.path) {
            self.candidates.push(control);
        }
        self.last_input_at = Some(now);
    }

    /// Requests cancellation; honoured by the next `poll`.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn poll(&self, now: Instant) -> CapturePoll {
        if self.cancelled {
            return CapturePoll::Cancelled;
        }

        let last_activity = self.last_input_at.unwrap_or(self.started_at);
        let idle = now.saturating_duration_since(last_activity);

        if !self.candidates.is_empty() && idle >= self.config.wait_for_another {
            return CapturePoll::Completed(self.candidates.clone());
        }
        if idle >= self.config.timeout {
            return CapturePoll::TimedOut;
        }
        CapturePoll::Pending
    }
}

// ============================================================================
// Coordinator
// ============================================================================

/// Timing and display options shared by all coordinators
#[derive(Clone, Debug, PartialEq)]
pub struct RebindOptions {
    pub wait_for_another: Duration,
    pub timeout: Duration,
    pub cancel_sentinel: String,
    /// Shown instead of an empty combination
    pub empty_binding_text: String,
}

impl Default for RebindOptions {
    fn default() -> Self {
        Self {
            wait_for_another: Duration::from_millis(500),
            timeout: Duration::from_secs(1),
            cancel_sentinel: String::new(),
            empty_binding_text: "-".to_string(),
        }
    }
}

/// Process-wide rebinding context: bus, link table and options
#[derive(Clone, Default)]
pub struct RebindContext {
    pub bus: RebindBus,
    pub links: Rc<ActionMapLinks>,
    pub options: RebindOptions,
}

impl RebindContext {
    pub fn new(links: ActionMapLinks, options: RebindOptions) -> Self {
        Self {
            bus: RebindBus::new(),
            links: Rc::new(links),
            options,
        }
    }
}

/// Binding indices a coordinator writes to
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SlotLayout {
    button: usize,
    modifier1: Option<usize>,
    modifier2: Option<usize>,
}

impl SlotLayout {
    pub fn single(button: usize) -> Self {
        Self {
            button,
            modifier1: None,
            modifier2: None,
        }
    }

    pub fn with_one_modifier(modifier: usize, button: usize) -> Self {
        Self {
            button,
            modifier1: Some(modifier),
            modifier2: None,
        }
    }

    pub fn with_modifiers(modifier1: usize, modifier2: usize, button: usize) -> Self {
        Self {
            button,
            modifier1: Some(modifier1),
            modifier2: Some(modifier2),
        }
    }

    /// Layout of an action's device binding.
    ///
    /// `index` from `binding_index_by_device` is a composite's first part,
    /// so composites map their leading parts to modifier slots and the last
    /// part to the button. Plain bindings are a single slot.
    pub fn for_device(
        action: &Action,
        device: DeviceType,
        schemes: &ControlSchemes,
        alternate: bool,
    ) -> Result<Self, LookupError> {
        let index = binding_index_by_device(action, device, schemes, alternate).ok_or_else(|| {
            LookupError::NoBindingForDevice {
                action: action.name.clone(),
                device,
            }
        })?;

        let layout = match enclosing_composite(&action.bindings, index) {
            Some(CompositeKind::TwoOptionalModifiers) | Some(CompositeKind::TwoModifiers) => {
                Self::with_modifiers(index, index + 1, index + 2)
            }
            Some(CompositeKind::OneModifier) => Self::with_one_modifier(index, index + 1),
            _ => Self::single(index),
        };
        for index in layout.indices() {
            action.binding(index)?;
        }
        Ok(layout)
    }

    pub fn button(&self) -> usize {
        self.button
    }

    pub fn modifier1(&self) -> Option<usize> {
        self.modifier1
    }

    pub fn modifier2(&self) -> Option<usize> {
        self.modifier2
    }

    /// Number of modifier slots, 0 to 2.
    pub fn modifier_slots(&self) -> usize {
        [self.modifier1, self.modifier2].iter().flatten().count()
    }

    pub fn supports_modifiers(&self) -> bool {
        self.modifier_slots() > 0
    }

    fn indices(&self) -> Vec<usize> {
        [self.modifier1, self.modifier2, Some(self.button)]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Every index exists in `action` and no index is used twice.
    pub fn validate(&self, action: &Action) -> Result<(), RebindError> {
        let indices = self.indices();
        for &index in &indices {
            action.binding(index)?;
        }

        let mut sorted = indices.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != indices.len() {
            return Err(ConfigurationError::InvalidSlotLayout(action.name.clone()).into());
        }
        Ok(())
    }
}

/// Observable coordinator state
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RebindState {
    Idle,
    AwaitingInput,
    Conflicted,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RevertReason {
    Cancelled,
    TimedOut,
    /// Capture ended without a usable button press
    NothingCaptured,
    /// The conflict was resolved by reverting
    Declined,
}

/// Answer to a pending conflict
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// Clear the duplicate, then commit the candidate here
    Override,
    /// Keep the pre-rebind combination, discard the candidate
    Revert,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RebindOutcome {
    Committed(BindingCombination),
    /// Waiting for a `Resolution`
    Conflicted(Duplicate),
    Reverted(RevertReason),
}

#[derive(Debug)]
enum Phase {
    Idle,
    Capturing(CaptureSession),
    Conflicted {
        candidate: BindingCombination,
        duplicate: Duplicate,
    },
}

/// Drives the rebinding of one slot
pub struct RebindCoordinator {
    action: ActionRef,
    layout: SlotLayout,
    combination: BindingCombination,
    context: RebindContext,
    subscription: Option<Subscription>,
    interactive: bool,
    phase: Phase,
}

impl RebindCoordinator {
    /// Creates an inactive coordinator showing the slot's current binding.
    pub fn new<S: BindingStore>(
        store: &S,
        action: ActionRef,
        layout: SlotLayout,
        context: RebindContext,
    ) -> Result<Self, RebindError> {
        let combination = {
            let stored = store.action(&action)?;
            layout.validate(stored)?;
            read_combination(stored, &layout)?
        };

        Ok(Self {
            action,
            layout,
            combination,
            context,
            subscription: None,
            interactive: true,
            phase: Phase::Idle,
        })
    }

    pub fn action(&self) -> &ActionRef {
        &self.action
    }

    pub fn layout(&self) -> SlotLayout {
        self.layout
    }

    /// Last committed combination.
    pub fn combination(&self) -> &BindingCombination {
        &self.combination
    }

    pub fn display_text(&self) -> String {
        if self.combination.is_empty() {
            self.context.options.empty_binding_text.clone()
        } else {
            self.combination.display_string()
        }
    }

    pub fn state(&self) -> RebindState {
        match self.phase {
            Phase::Idle => RebindState::Idle,
            Phase::Capturing(_) => RebindState::AwaitingInput,
            Phase::Conflicted { .. } => RebindState::Conflicted,
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Whether the start control accepts input.
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Starts listening to other coordinators.
    pub fn activate(&mut self) {
        if self.subscription.is_some() {
            return;
        }
        let subscription = self.context.bus.subscribe();
        subscription.set_key(self.key());
        self.subscription = Some(subscription);
        self.interactive = true;
    }

    /// Stops listening; a running capture or pending decision is reverted.
    pub fn deactivate<S: BindingStore>(&mut self, store: &mut S) -> Result<(), RebindError> {
        let reverted = match self.phase {
            Phase::Capturing(_) => Some(RevertReason::Cancelled),
            Phase::Conflicted { .. } => Some(RevertReason::Declined),
            Phase::Idle => None,
        };
        if let Some(reason) = reverted {
            self.revert(store, reason)?;
        }
        self.subscription = None;
        Ok(())
    }

    fn key(&self) -> RebindKey {
        RebindKey {
            action: self.action.clone(),
            combination: self.combination.clone(),
            index: self.layout.button,
        }
    }

    fn publish(&self, kind: RebindEventKind) {
        self.context.bus.publish(RebindEvent {
            kind,
            key: self.key(),
        });
    }

    fn ensure_ready(&self) -> Result<(), RebindError> {
        if self.subscription.is_none() {
            return Err(RebindError::Inactive(self.action.to_string()));
        }
        if !matches!(self.phase, Phase::Idle) {
            return Err(RebindError::Busy(self.action.to_string()));
        }
        if !self.interactive {
            return Err(RebindError::NotInteractive(self.action.to_string()));
        }
        Ok(())
    }

    /// Applies queued broadcasts from other coordinators.
    pub fn process_events<S: BindingStore>(&mut self, store: &S) -> Result<(), RebindError> {
        let events = match &self.subscription {
            Some(subscription) => subscription.drain(),
            None => return Ok(()),
        };

        for event in events {
            match event.kind {
                RebindEventKind::Started => self.interactive = false,
                RebindEventKind::Ended => self.interactive = true,
                RebindEventKind::Cleared => {
                    let targets_me = event.key.action == self.action
                        && event.key.index == self.layout.button
                        && event.key.combination.has_same_inputs(&self.combination);
                    if targets_me {
                        self.refresh(store)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Re-reads the combination from the store.
    pub fn refresh<S: BindingStore>(&mut self, store: &S) -> Result<(), RebindError> {
        self.combination = read_combination(store.action(&self.action)?, &self.layout)?;
        self.sync_key();
        Ok(())
    }

    fn sync_key(&self) {
        if let Some(subscription) = &self.subscription {
            subscription.set_key(self.key());
        }
    }

    /// Opens a capture session for this slot.
    ///
    /// The action is disabled until the rebind ends and every other
    /// coordinator on the bus is told a rebind started. Queued broadcasts
    /// are applied first, so only one rebind runs per bus.
    pub fn start<S: BindingStore>(&mut self, store: &mut S, now: Instant) -> Result<(), RebindError> {
        self.process_events(&*store)?;
        self.ensure_ready()?;
        store.disable(&self.action)?;

        let options = &self.context.options;
        let config = CaptureConfig {
            slot: SlotRef::new(self.action.clone(), self.layout.button),
            wait_for_another: if self.layout.supports_modifiers() {
                options.wait_for_another
            } else {
                Duration::ZERO
            },
            timeout: options.timeout,
            cancel_sentinel: options.cancel_sentinel.clone(),
        };

        debug!(slot = %config.slot, "rebind started");
        self.publish(RebindEventKind::Started);
        self.phase = Phase::Capturing(CaptureSession::start(config, now));
        Ok(())
    }

    /// Feeds a pressed control to the running capture.
    pub fn record(&mut self, control: CapturedControl, now: Instant) -> Result<(), RebindError> {
        match &mut self.phase {
            Phase::Capturing(session) => {
                session.record(control, now);
                Ok(())
            }
            _ => Err(RebindError::Inactive(self.action.to_string())),
        }
    }

    /// Cancels the running capture; takes effect on the next `tick`.
    pub fn cancel(&mut self) {
        if let Phase::Capturing(session) = &mut self.phase {
            session.cancel();
        }
    }

    /// Advances the capture. `None` while still waiting for input.
    pub fn tick<S: BindingStore>(
        &mut self,
        store: &mut S,
        now: Instant,
    ) -> Result<Option<RebindOutcome>, RebindError> {
        let poll = match &self.phase {
            Phase::Capturing(session) => session.poll(now),
            _ => return Ok(None),
        };

        let outcome = match poll {
            CapturePoll::Pending => return Ok(None),
            CapturePoll::Cancelled => self.revert(store, RevertReason::Cancelled)?,
            CapturePoll::TimedOut => self.revert(store, RevertReason::TimedOut)?,
            CapturePoll::Completed(candidates) => {
                match normalize_capture(&self.combination, &candidates, self.layout.modifier_slots()) {
                    Some(candidate) => self.check_and_commit(store, candidate)?,
                    None => self.revert(store, RevertReason::NothingCaptured)?,
                }
            }
        };
        Ok(Some(outcome))
    }

    fn check_and_commit<S: BindingStore>(
        &mut self,
        store: &mut S,
        candidate: BindingCombination,
    ) -> Result<RebindOutcome, RebindError> {
        let duplicate = DuplicateFinder::new(&*store, &self.context.links)
            .find_duplicate(&self.action, &candidate)?;

        match duplicate {
            None => self.commit(store, candidate).map(RebindOutcome::Committed),
            Some(duplicate) => {
                info!(
                    action = %self.action,
                    candidate = %candidate,
                    duplicate = %duplicate.action,
                    "combination already in use, awaiting decision"
                );
                self.phase = Phase::Conflicted {
                    candidate,
                    duplicate: duplicate.clone(),
                };
                Ok(RebindOutcome::Conflicted(duplicate))
            }
        }
    }

    /// Answers a pending conflict.
    pub fn resolve<S: BindingStore>(
        &mut self,
        store: &mut S,
        resolution: Resolution,
    ) -> Result<RebindOutcome, RebindError> {
        let Phase::Conflicted { candidate, duplicate } = &self.phase else {
            return Err(RebindError::NoPendingConflict);
        };

        match resolution {
            Resolution::Revert => self.revert(store, RevertReason::Declined),
            Resolution::Override => {
                let candidate = candidate.clone();
                let duplicate = duplicate.clone();
                clear_duplicate(store, &duplicate)?;
                info!(
                    action = %self.action,
                    cleared = %duplicate.action,
                    combination = %candidate,
                    "overrode duplicate combination"
                );
                self.context.bus.publish(RebindEvent {
                    kind: RebindEventKind::Cleared,
                    key: RebindKey {
                        action: duplicate.action,
                        combination: duplicate.combination,
                        index: duplicate.index,
                    },
                });
                self.commit(store, candidate).map(RebindOutcome::Committed)
            }
        }
    }

    /// Unbinds the slot without capture or duplicate checking.
    ///
    /// Fails like `start` while another coordinator is rebinding.
    pub fn clear<S: BindingStore>(&mut self, store: &mut S) -> Result<BindingCombination, RebindError> {
        self.process_events(&*store)?;
        self.ensure_ready()?;
        let empty = CombinationBuilder::from(&self.combination).as_empty();
        self.commit(store, empty)
    }

    /// Writes `combination` to the store and ends the rebind.
    fn commit<S: BindingStore>(
        &mut self,
        store: &mut S,
        combination: BindingCombination,
    ) -> Result<BindingCombination, RebindError> {
        let writes = [
            (self.layout.modifier1, combination.modifier1().path()),
            (self.layout.modifier2, combination.modifier2().path()),
            (Some(self.layout.button), combination.button().path()),
        ];

        store.disable(&self.action)?;
        for (index, path) in writes {
            if let Some(index) = index {
                store.set_effective_path(&SlotRef::new(self.action.clone(), index), path)?;
            }
        }
        store.enable(&self.action)?;

        info!(action = %self.action, combination = %combination, "rebind committed");
        self.combination = combination;
        self.phase = Phase::Idle;
        self.sync_key();
        self.publish(RebindEventKind::Ended);
        Ok(self.combination.clone())
    }

    /// Ends the rebind keeping the last committed combination.
    fn revert<S: BindingStore>(
        &mut self,
        store: &mut S,
        reason: RevertReason,
    ) -> Result<RebindOutcome, RebindError> {
        self.phase = Phase::Idle;
        store.enable(&self.action)?;

        info!(action = %self.action, ?reason, "rebind reverted");
        self.publish(RebindEventKind::Ended);
        Ok(RebindOutcome::Reverted(reason))
    }
}

fn read_combination(action: &Action, layout: &SlotLayout) -> Result<BindingCombination, LookupError> {
    Ok(CombinationBuilder::new()
        .with_linked_indices(action, layout.button, layout.modifier1, layout.modifier2)?
        .build())
}

/// Unbinds every linked slot of `duplicate` in its action.
fn clear_duplicate<S: BindingStore>(store: &mut S, duplicate: &Duplicate) -> Result<(), RebindError> {
    let combination = &duplicate.combination;
    let indices = {
        let action = store.action(&duplicate.action)?;
        [combination.modifier1(), combination.modifier2(), combination.button()]
            .into_iter()
            .filter_map(|slot| slot.id())
            .filter_map(|id| action.index_of(id))
            .collect::<Vec<_>>()
    };

    for index in indices {
        store.set_effective_path(&SlotRef::new(duplicate.action.clone(), index), "")?;
    }
    Ok(())
}
