use std::collections::VecDeque;
use std::rc::Rc;

use x11rb::protocol::xproto::{ButtonPressEvent, ModMask, Window};

use crate::config::ignore_mods::IgnoreMods;
use crate::error::{Error, Result};
use crate::sequence::{ButtonSequence, Modifier};
use crate::state::bindings::{Binding, BindingHandle, BindingRegistry, Direction};
use crate::state::grabs::{GrabKey, GrabTable, PointerGrabber};
use crate::state::replay::{AllowMode, ReplayCoordinator, ReplayState};

pub mod bindings;
pub mod grabs;
pub mod replay;

/// Called with the event exactly as the server reported it, lock modifiers included.
/// Release events share the press event layout.
pub type Callback<G> = Rc<dyn Fn(&mut MouseBind<G>, &ButtonPressEvent)>;

/// Everything needed to connect a binding.
pub struct Registration<G> {
    pub window: Window,
    pub sequence: String,
    pub direction: Direction,
    /// Issue a passive grab so events are delivered without the window having focus
    pub grab: bool,
    /// Only meaningful with `grab`, the pointer freezes until events are allowed
    pub sync: bool,
    pub callback: Callback<G>,
}

impl<G> Registration<G> {
    pub fn new<F>(direction: Direction, window: Window, sequence: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&mut MouseBind<G>, &ButtonPressEvent) + 'static,
    {
        Self {
            window,
            sequence: sequence.into(),
            direction,
            grab: false,
            sync: false,
            callback: Rc::new(callback),
        }
    }

    pub fn press<F>(window: Window, sequence: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&mut MouseBind<G>, &ButtonPressEvent) + 'static,
    {
        Self::new(Direction::Press, window, sequence, callback)
    }

    pub fn release<F>(window: Window, sequence: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&mut MouseBind<G>, &ButtonPressEvent) + 'static,
    {
        Self::new(Direction::Release, window, sequence, callback)
    }

    #[must_use]
    pub fn with_grab(self, grab: bool, sync: bool) -> Self {
        Self { grab, sync, ..self }
    }
}

/**
Connects button sequences to callbacks and routes button events to them.
All bookkeeping is per instance, one instance should exist per connection.
Bindings may be connected or detached from inside callbacks, a binding detached while an
event is being dispatched is not called for that event, and one connected during it only
sees later events.
 **/
pub struct MouseBind<G> {
    grabber: G,
    ignore_mods: IgnoreMods,
    grabs: GrabTable,
    bindings: BindingRegistry<Callback<G>>,
    replay: ReplayCoordinator,
    deferred: VecDeque<ButtonPressEvent>,
    dispatching: bool,
}

impl<G: PointerGrabber> MouseBind<G> {
    pub fn new(grabber: G, ignore_mods: IgnoreMods) -> Self {
        Self {
            grabber,
            ignore_mods,
            grabs: GrabTable::new(),
            bindings: BindingRegistry::new(),
            replay: ReplayCoordinator::new(),
            deferred: VecDeque::new(),
            dispatching: false,
        }
    }

    pub fn grabber(&self) -> &G {
        &self.grabber
    }

    pub fn ignore_mods(&self) -> &IgnoreMods {
        &self.ignore_mods
    }

    pub fn grabs(&self) -> &GrabTable {
        &self.grabs
    }

    pub fn bindings(&self) -> &BindingRegistry<Callback<G>> {
        &self.bindings
    }

    pub fn replay_state(&self) -> ReplayState {
        self.replay.state()
    }

    pub fn connect(&mut self, registration: Registration<G>) -> Result<BindingHandle> {
        let Registration {
            window,
            sequence,
            direction,
            grab,
            sync,
            callback,
        } = registration;
        let parsed = ButtonSequence::parse(&sequence)?;
        let button = parsed.button();
        // Event state is stripped of ignored modifiers before lookup, so a sequence naming
        // one of them can never match. The grab is still keyed without them.
        let (mods, masks) = if parsed.modifiers().is_any() {
            (
                u16::from(ModMask::ANY),
                self.ignore_mods.any_modifier_states().collect(),
            )
        } else {
            let raw = parsed.modifiers().mask();
            (self.ignore_mods.strip(raw), vec![raw])
        };
        let grab = if grab {
            let key = GrabKey::new(window, mods, button);
            self.grabs
                .acquire(&self.grabber, &self.ignore_mods, key, sync)?;
            Some(key)
        } else {
            None
        };
        let handle = self.bindings.add(Binding {
            window,
            button,
            direction,
            masks,
            grab,
            callback,
        });
        mousebind_utils::debug!("Connected {sequence:?} on window {window} as {handle:?}");
        Ok(handle)
    }

    /// Detaching an unknown or already detached handle is reported and changes nothing.
    pub fn detach(&mut self, handle: BindingHandle) -> Result<()> {
        let binding = self
            .bindings
            .remove(handle)
            .ok_or(Error::UnknownBinding(handle))?;
        if let Some(key) = binding.grab {
            self.grabs.release(&self.grabber, key)?;
        }
        Ok(())
    }

    /// Detaches every press and release binding on `window`, continuing past failures
    /// and returning the first one.
    pub fn detach_window(&mut self, window: Window) -> Result<()> {
        let mut res = Ok(());
        for handle in self.bindings.handles_on_window(window) {
            if let Err(e) = self.detach(handle) {
                if res.is_ok() {
                    res = Err(e);
                }
            }
        }
        res
    }

    /// Routes a button press or release event to the matching bindings.
    /// Events arriving while the pointer is frozen or while callbacks run are
    /// queued and dispatched in order once that is over.
    pub fn dispatch(&mut self, event: ButtonPressEvent) {
        if self.dispatching || self.replay.is_frozen() {
            mousebind_utils::debug!("Deferring button event {}", event.sequence);
            self.deferred.push_back(event);
            return;
        }
        self.dispatch_one(&event);
        self.drain_deferred();
    }

    /// Thaws the pointer after a synchronous grab, replaying the frozen event
    /// to the windows below the grab window.
    pub fn allow_replayed_events(&mut self) -> Result<()> {
        self.allow_events(AllowMode::ReplayPointer)
    }

    pub fn allow_events(&mut self, mode: AllowMode) -> Result<()> {
        self.replay.resume(&self.grabber, mode)?;
        if !self.dispatching {
            self.drain_deferred();
        }
        Ok(())
    }

    /// How to thaw a frozen pointer once the press has been handled.
    /// A release binding on the frozen grab needs the grab kept so its release arrives here,
    /// otherwise the click is replayed to the windows below.
    #[must_use]
    pub fn thaw_mode(&self) -> Option<AllowMode> {
        let key = self.replay.frozen_by()?;
        if self.bindings.uses_grab(&key, Direction::Release) {
            Some(AllowMode::AsyncPointer)
        } else {
            Some(AllowMode::ReplayPointer)
        }
    }

    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    fn drain_deferred(&mut self) {
        while !self.replay.is_frozen() {
            let Some(event) = self.deferred.pop_front() else {
                break;
            };
            self.dispatch_one(&event);
        }
    }

    fn dispatch_one(&mut self, event: &ButtonPressEvent) {
        let Some(direction) = Direction::from_response_type(event.response_type) else {
            mousebind_utils::debug!("Not a button event {event:?}");
            return;
        };
        let mut mods = self.ignore_mods.strip(event.state);
        if direction == Direction::Release {
            // A release reports its own button as held
            if let Some(held) = Modifier::held_button(event.detail) {
                mods &= !held.mask();
            }
        }
        if direction == Direction::Press {
            if let Some(key) = self.grabs.sync_grab(event.event, mods, event.detail) {
                self.replay.freeze(key);
            }
        }
        let handles = self
            .bindings
            .matching(event.event, mods, event.detail, direction);
        self.dispatching = true;
        for handle in handles {
            // Skip anything detached by an earlier callback
            let Some(callback) = self.bindings.get(handle).map(|b| b.callback.clone()) else {
                continue;
            };
            callback(self, event);
        }
        self.dispatching = false;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use x11rb::protocol::xproto::{
        ButtonPressEvent, ModMask, BUTTON_PRESS_EVENT, BUTTON_RELEASE_EVENT,
    };

    use crate::config::ignore_mods::IgnoreMods;
    use crate::error::{Error, GrabError, ParseError};
    use crate::sequence::Modifier;
    use crate::state::grabs::GrabKey;
    use crate::state::replay::{AllowMode, ReplayState};
    use crate::state::{MouseBind, Registration};
    use crate::util::test_grabber::{RecordingGrabber, Request};

    const ROOT: u32 = 1;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn event(response_type: u8, state: u16, button: u8) -> ButtonPressEvent {
        ButtonPressEvent {
            response_type,
            detail: button,
            sequence: 0,
            time: 0,
            root: ROOT,
            event: ROOT,
            child: 0,
            root_x: 0,
            root_y: 0,
            event_x: 0,
            event_y: 0,
            state,
            same_screen: true,
        }
    }

    fn press(state: u16, button: u8) -> ButtonPressEvent {
        event(BUTTON_PRESS_EVENT, state, button)
    }

    fn release(state: u16, button: u8) -> ButtonPressEvent {
        event(BUTTON_RELEASE_EVENT, state, button)
    }

    fn logging(
        log: &Log,
        sequence: &str,
        name: &'static str,
    ) -> Registration<RecordingGrabber> {
        let log = log.clone();
        Registration::press(ROOT, sequence, move |_, _| log.borrow_mut().push(name))
    }

    fn mods(mods: &[ModMask]) -> u16 {
        mods.iter().fold(0, |acc, m| acc | u16::from(*m))
    }

    #[test]
    fn shared_grab_is_issued_and_released_once() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::none());
        let log = Log::default();
        let first = mb.connect(logging(&log, "control-1", "a").with_grab(true, false)).unwrap();
        let second = mb.connect(logging(&log, "control-1", "b").with_grab(true, false)).unwrap();
        let ctrl = u16::from(ModMask::CONTROL);
        let key = GrabKey::new(ROOT, ctrl, 1);
        assert_eq!(2, mb.grabs().refcount(&key));
        assert_eq!(vec![Request::Grab(ROOT, ctrl, 1, false)], mb.grabber().take());
        mb.detach(first).unwrap();
        assert!(mb.grabs().is_grabbed(&key));
        assert!(mb.grabber().take().is_empty());
        mb.detach(second).unwrap();
        assert_eq!(vec![Request::Ungrab(ROOT, ctrl, 1)], mb.grabber().take());
        assert!(mb.grabs().is_empty());
    }

    #[test]
    fn default_ignore_mods_issue_four_grabs() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::default());
        let log = Log::default();
        mb.connect(logging(&log, "mod4-3", "a").with_grab(true, false)).unwrap();
        assert_eq!(4, mb.grabber().take().len());
    }

    #[test]
    fn dispatch_strips_ignored_modifiers() {
        let num_lock = u16::from(ModMask::M2);
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::new(&[num_lock]).unwrap());
        let log = Log::default();
        mb.connect(logging(&log, "control-shift-1", "control-shift")).unwrap();
        mb.connect(logging(&log, "control-shift-mod2-1", "with num lock")).unwrap();
        mb.connect(logging(&log, "shift-1", "shift")).unwrap();
        mb.dispatch(press(
            mods(&[ModMask::CONTROL, ModMask::SHIFT, ModMask::M2]),
            1,
        ));
        assert_eq!(vec!["control-shift"], *log.borrow());
    }

    #[test]
    fn dispatch_requires_exact_modifiers() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::default());
        let log = Log::default();
        mb.connect(logging(&log, "control-shift-1", "control-shift")).unwrap();
        mb.connect(logging(&log, "shift-1", "shift")).unwrap();
        mb.dispatch(press(mods(&[ModMask::SHIFT, ModMask::M1]), 1));
        mb.dispatch(press(mods(&[ModMask::SHIFT]), 2));
        assert!(log.borrow().is_empty());
        mb.dispatch(press(mods(&[ModMask::SHIFT, ModMask::LOCK]), 1));
        assert_eq!(vec!["shift"], *log.borrow());
    }

    #[test]
    fn any_modifier_matches_every_state() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::default());
        let log = Log::default();
        mb.connect(logging(&log, "any-2", "any").with_grab(true, false)).unwrap();
        assert_eq!(
            vec![Request::Grab(ROOT, u16::from(ModMask::ANY), 2, false)],
            mb.grabber().take()
        );
        mb.dispatch(press(0, 2));
        mb.dispatch(press(mods(&[ModMask::CONTROL, ModMask::M4, ModMask::M2]), 2));
        mb.dispatch(press(0, 1));
        assert_eq!(vec!["any", "any"], *log.borrow());
    }

    #[test]
    fn release_ignores_its_own_button_mask() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::default());
        let log = Log::default();
        let inner = log.clone();
        mb.connect(Registration::release(ROOT, "1", move |_, _| {
            inner.borrow_mut().push("release");
        }))
        .unwrap();
        mb.dispatch(press(0, 1));
        assert!(log.borrow().is_empty());
        mb.dispatch(release(Modifier::Button1.mask(), 1));
        assert_eq!(vec!["release"], *log.borrow());
    }

    #[test]
    fn held_button_modifier_matches() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::default());
        let log = Log::default();
        mb.connect(logging(&log, "button1-3", "chord")).unwrap();
        mb.dispatch(press(0, 3));
        mb.dispatch(press(Modifier::Button1.mask(), 3));
        assert_eq!(vec!["chord"], *log.borrow());
    }

    #[test]
    fn sync_grab_freezes_until_allowed() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::none());
        let log = Log::default();
        mb.connect(logging(&log, "1", "sync").with_grab(true, true)).unwrap();
        mb.grabber().take();
        mb.dispatch(press(0, 1));
        assert_eq!(ReplayState::AwaitingReplay, mb.replay_state());
        mb.dispatch(press(0, 1));
        assert_eq!(vec!["sync"], *log.borrow());
        assert_eq!(1, mb.deferred_len());
        mb.allow_replayed_events().unwrap();
        // The deferred event ran and froze again
        assert_eq!(vec!["sync", "sync"], *log.borrow());
        assert_eq!(ReplayState::AwaitingReplay, mb.replay_state());
        assert_eq!(0, mb.deferred_len());
        mb.allow_replayed_events().unwrap();
        assert_eq!(ReplayState::Idle, mb.replay_state());
        assert_eq!(
            vec![
                Request::Allow(AllowMode::ReplayPointer),
                Request::Allow(AllowMode::ReplayPointer)
            ],
            mb.grabber().take()
        );
    }

    #[test]
    fn release_on_sync_grab_keeps_the_grab_when_thawing() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::default());
        let log = Log::default();
        let inner = log.clone();
        mb.connect(
            Registration::release(ROOT, "mod4-2", move |_, _| {
                inner.borrow_mut().push("release");
            })
            .with_grab(true, true),
        )
        .unwrap();
        mb.connect(logging(&log, "mod4-3", "press").with_grab(true, true)).unwrap();
        assert_eq!(None, mb.thaw_mode());
        let mod4 = u16::from(ModMask::M4);
        mb.dispatch(press(mod4 | u16::from(ModMask::M2), 2));
        assert_eq!(Some(AllowMode::AsyncPointer), mb.thaw_mode());
        mb.allow_events(AllowMode::AsyncPointer).unwrap();
        assert_eq!(None, mb.thaw_mode());
        mb.dispatch(release(mod4 | Modifier::Button2.mask(), 2));
        assert_eq!(vec!["release"], *log.borrow());
        assert_eq!(ReplayState::Idle, mb.replay_state());
        mb.dispatch(press(mod4, 3));
        assert_eq!(Some(AllowMode::ReplayPointer), mb.thaw_mode());
    }

    #[test]
    fn failed_allow_keeps_events_deferred() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::none());
        let log = Log::default();
        mb.connect(logging(&log, "1", "sync").with_grab(true, true)).unwrap();
        mb.dispatch(press(0, 1));
        mb.dispatch(press(0, 1));
        mb.grabber().fail_allows();
        assert!(matches!(
            mb.allow_replayed_events(),
            Err(Error::Grab(GrabError::Transport(_)))
        ));
        assert_eq!(ReplayState::AwaitingReplay, mb.replay_state());
        assert_eq!(1, mb.deferred_len());
        assert_eq!(vec!["sync"], *log.borrow());
    }

    #[test]
    fn failed_ungrab_on_detach_still_removes_the_binding() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::none());
        let log = Log::default();
        let handle = mb.connect(logging(&log, "1", "a").with_grab(true, false)).unwrap();
        mb.grabber().fail_ungrabs();
        assert!(matches!(
            mb.detach(handle),
            Err(Error::Grab(GrabError::Transport(_)))
        ));
        assert!(mb.bindings().is_empty());
        assert!(mb.grabs().is_empty());
        assert!(matches!(mb.detach(handle), Err(Error::UnknownBinding(_))));
        mb.dispatch(press(0, 1));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn callback_can_allow_events_itself() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::none());
        let log = Log::default();
        let inner = log.clone();
        mb.connect(
            Registration::press(ROOT, "1", move |mb: &mut MouseBind<RecordingGrabber>, _| {
                inner.borrow_mut().push("sync");
                mb.allow_replayed_events().unwrap();
            })
            .with_grab(true, true),
        )
        .unwrap();
        mb.dispatch(press(0, 1));
        mb.dispatch(press(0, 1));
        assert_eq!(vec!["sync", "sync"], *log.borrow());
        assert_eq!(ReplayState::Idle, mb.replay_state());
    }

    #[test]
    fn async_grab_and_ungrabbed_bindings_do_not_freeze() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::none());
        let log = Log::default();
        mb.connect(logging(&log, "1", "async").with_grab(true, false)).unwrap();
        // Sync without a grab has nothing to freeze
        mb.connect(logging(&log, "2", "no grab").with_grab(false, true)).unwrap();
        mb.dispatch(press(0, 1));
        mb.dispatch(press(0, 2));
        assert_eq!(ReplayState::Idle, mb.replay_state());
        assert!(matches!(mb.allow_replayed_events(), Err(Error::ReplayMisuse)));
        assert_eq!(vec!["async", "no grab"], *log.borrow());
    }

    #[test]
    fn failed_grab_creates_no_binding() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::none());
        mb.grabber().deny(ROOT, 0, 1);
        let log = Log::default();
        let res = mb.connect(logging(&log, "1", "denied").with_grab(true, false));
        assert!(matches!(
            res,
            Err(Error::Grab(GrabError::AlreadyGrabbed { button: 1, .. }))
        ));
        assert!(mb.bindings().is_empty());
        mb.dispatch(press(0, 1));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn parse_errors_are_returned() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::none());
        let log = Log::default();
        assert!(matches!(
            mb.connect(logging(&log, "foo-1", "bad").with_grab(true, false)),
            Err(Error::Parse(ParseError::UnknownModifier(_)))
        ));
        assert!(mb.grabber().take().is_empty());
    }

    #[test]
    fn stale_detach_keeps_shared_grab() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::none());
        let log = Log::default();
        let first = mb.connect(logging(&log, "1", "a").with_grab(true, false)).unwrap();
        mb.connect(logging(&log, "1", "b").with_grab(true, false)).unwrap();
        mb.detach(first).unwrap();
        assert!(matches!(mb.detach(first), Err(Error::UnknownBinding(h)) if h == first));
        let key = GrabKey::new(ROOT, 0, 1);
        assert_eq!(1, mb.grabs().refcount(&key));
        mb.dispatch(press(0, 1));
        assert_eq!(vec!["b"], *log.borrow());
    }

    #[test]
    fn detach_window_removes_every_binding() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::none());
        let log = Log::default();
        mb.connect(logging(&log, "1", "a").with_grab(true, false)).unwrap();
        mb.connect(logging(&log, "shift-2", "b")).unwrap();
        mb.detach_window(ROOT).unwrap();
        assert!(mb.bindings().is_empty());
        assert!(mb.grabs().is_empty());
    }

    #[test]
    fn detach_during_dispatch_skips_later_callbacks() {
        let mut mb = MouseBind::new(RecordingGrabber::default(), IgnoreMods::none());
        let log = Log::default();
        let victim = Rc::new(RefCell::new(None));
        let first_log = log.clone();
        let first_victim = victim.clone();
        mb.connect(Registration::press(
            ROOT,
            "1",
            move |mb: &mut MouseBind<RecordingGrabber>, _| {
                first_log.borrow_mut().push("first");
                if let Some(handle) = first_victim.borrow_mut().take() {
                    mb.detach(handle).unwrap();
                }
                let added_log = first_log.clone();
                mb.connect(Registration::press(ROOT, "1", move |_, _| {
                    added_log.borrow_mut().push("added");
                }))
                .unwrap();
            },
        ))
        .unwrap();
        let second = mb.connect(logging(&log, "1", "second")).unwrap();
        *victim.borrow_mut() = Some(second);
        mb.dispatch(press(0, 1));
        assert_eq!(vec!["first"], *log.borrow());
        log.borrow_mut().clear();
        mb.dispatch(press(0, 1));
        assert_eq!(vec!["first", "added"], *log.borrow());
    }
}
