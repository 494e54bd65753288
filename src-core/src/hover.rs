//! Hover-to-reveal tracking.
//!
//! While monitoring, the pointer is checked against the menu bar strip of
//! every display and against the drawer's last known frame. The monitor is the
//! only writer of [`HoverState`]; the UI layer reacts to the intents it emits.

use crate::platform::{DisplayProvider, PointerSource};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use stowbar_types::{DisplayInfo, Point, Rect};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::AbortHandle;
use tracing::{debug, warn};

/// Extra margin around the drawer frame, per side, so the pointer riding its
/// edge does not flicker in and out.
pub const DRAWER_HIT_SLOP: f64 = 10.0;

const INTENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HoverState {
    pub is_mouse_in_trigger_zone: bool,
    pub is_mouse_in_drawer_area: bool,
    pub last_drawer_frame: Option<Rect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    #[default]
    Idle,
    Monitoring,
}

/// What the UI layer should do with the drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HoverIntent {
    Reveal,
    Hide,
}

/// The pointer is in the menu bar band of `display`.
///
/// The top edge is inclusive: a pointer pinned against the top of the screen
/// reports exactly the display's max y.
fn in_trigger_strip(display: &DisplayInfo, point: Point) -> bool {
    let bar = display.menu_bar_frame();
    point.x >= bar.min_x() && point.x < bar.max_x() && point.y >= bar.min_y() && point.y <= bar.max_y()
}

#[derive(Debug, Default)]
struct Inner {
    monitor: MonitorState,
    drawer_visible: bool,
    state: HoverState,
    hide_sent: bool,
    /// Pointer was in a trigger strip at the last sample. Survives a drawer
    /// dismissal, so only a fresh entry reveals again.
    pointer_in_trigger: bool,
    poll_task: Option<AbortHandle>,
}

pub struct HoverTriggerMonitor {
    weak_self: Weak<HoverTriggerMonitor>,
    pointer: Arc<dyn PointerSource>,
    displays: Arc<dyn DisplayProvider>,
    poll_interval: Duration,
    runtime: Option<Handle>,
    inner: Mutex<Inner>,
    states: watch::Sender<HoverState>,
    intents: broadcast::Sender<HoverIntent>,
}

impl HoverTriggerMonitor {
    pub fn new(
        pointer: Arc<dyn PointerSource>,
        displays: Arc<dyn DisplayProvider>,
        poll_interval: Duration,
    ) -> Arc<Self> {
        let (states, _) = watch::channel(HoverState::default());
        let (intents, _) = broadcast::channel(INTENT_CAPACITY);
        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            warn!("hover monitor: no tokio runtime, pointer polling is disabled");
        }

        Arc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            pointer,
            displays,
            poll_interval,
            runtime,
            inner: Mutex::new(Inner::default()),
            states,
            intents,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn subscribe(&self) -> watch::Receiver<HoverState> {
        self.states.subscribe()
    }

    pub fn intents(&self) -> broadcast::Receiver<HoverIntent> {
        self.intents.subscribe()
    }

    pub fn state(&self) -> HoverState {
        self.lock().state
    }

    pub fn monitor_state(&self) -> MonitorState {
        self.lock().monitor
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor_state() == MonitorState::Monitoring
    }

    /// Begin tracking the pointer. No-op while already monitoring.
    pub fn start(&self) {
        let mut inner = self.lock();
        if inner.monitor == MonitorState::Monitoring {
            return;
        }
        inner.monitor = MonitorState::Monitoring;

        if let Some(runtime) = &self.runtime {
            let weak = self.weak_self.clone();
            let period = self.poll_interval;
            let task = runtime.spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    let Some(monitor) = weak.upgrade() else {
                        break;
                    };
                    if let Some(point) = monitor.pointer.pointer_location() {
                        monitor.pointer_moved(point);
                    }
                }
            });
            inner.poll_task = Some(task.abort_handle());
        }
        debug!("Hover monitoring started");
    }

    /// Stop tracking and reset the hover state. No-op while idle.
    pub fn stop(&self) {
        let mut inner = self.lock();
        if inner.monitor == MonitorState::Idle {
            return;
        }
        inner.monitor = MonitorState::Idle;
        if let Some(task) = inner.poll_task.take() {
            task.abort();
        }
        inner.state = HoverState::default();
        inner.hide_sent = false;
        inner.pointer_in_trigger = false;
        self.publish(&inner);
        debug!("Hover monitoring stopped");
    }

    /// Feed a pointer location (UI space). Ignored while idle.
    pub fn pointer_moved(&self, point: Point) {
        let displays = self.displays.displays();
        let mut inner = self.lock();
        if inner.monitor != MonitorState::Monitoring {
            return;
        }

        let was_in_trigger = inner.pointer_in_trigger;
        let in_trigger = displays.iter().any(|d| in_trigger_strip(d, point));
        let in_drawer = inner.drawer_visible
            && inner
                .state
                .last_drawer_frame
                .is_some_and(|frame| frame.inset(-DRAWER_HIT_SLOP, -DRAWER_HIT_SLOP).contains(point));

        inner.pointer_in_trigger = in_trigger;
        inner.state.is_mouse_in_trigger_zone = in_trigger;
        inner.state.is_mouse_in_drawer_area = in_drawer;

        if in_trigger || in_drawer {
            inner.hide_sent = false;
        }
        if in_trigger && !was_in_trigger && !inner.drawer_visible {
            self.emit(HoverIntent::Reveal);
        } else if inner.drawer_visible && !in_trigger && !in_drawer && !inner.hide_sent {
            inner.hide_sent = true;
            self.emit(HoverIntent::Hide);
        }

        self.publish(&inner);
    }

    /// Record where the drawer is now drawn. UI space.
    pub fn set_drawer_frame(&self, frame: Rect) {
        let mut inner = self.lock();
        inner.state.last_drawer_frame = Some(frame);
        self.publish(&inner);
    }

    /// Tell the monitor whether the drawer is on screen.
    ///
    /// Hiding it resets the hover state at once, whatever the pointer is doing.
    /// A pointer still resting in the menu bar does not reveal again until it
    /// leaves and re-enters.
    pub fn set_drawer_visible(&self, visible: bool) {
        let mut inner = self.lock();
        inner.drawer_visible = visible;
        inner.hide_sent = false;
        if !visible {
            inner.state = HoverState::default();
        }
        self.publish(&inner);
    }

    pub fn is_drawer_visible(&self) -> bool {
        self.lock().drawer_visible
    }

    fn emit(&self, intent: HoverIntent) {
        debug!("Hover intent {:?}", intent);
        // No receivers is fine.
        let _ = self.intents.send(intent);
    }

    fn publish(&self, inner: &Inner) {
        let state = inner.state;
        self.states.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

impl Drop for HoverTriggerMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.lock().poll_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{self, FakeDisplays, FakePointer};
    use tokio::sync::broadcast::error::TryRecvError;

    const IN_BAR: Point = Point::new(700.0, 890.0);
    const BELOW_BAR: Point = Point::new(700.0, 500.0);

    fn drawer_frame() -> Rect {
        Rect::new(600.0, 800.0, 200.0, 60.0)
    }

    fn monitor() -> (Arc<HoverTriggerMonitor>, Arc<FakePointer>) {
        let pointer = Arc::new(FakePointer::default());
        let displays = Arc::new(FakeDisplays::new(vec![
            fake::primary_display(),
            fake::secondary_display(),
        ]));
        let monitor = HoverTriggerMonitor::new(pointer.clone(), displays, Duration::from_millis(50));
        (monitor, pointer)
    }

    #[test]
    fn test_events_ignored_while_idle() {
        let (monitor, _) = monitor();
        monitor.pointer_moved(IN_BAR);
        assert!(!monitor.state().is_mouse_in_trigger_zone);
    }

    #[test]
    fn test_trigger_zone_on_every_display_and_top_edge() {
        let (monitor, _) = monitor();
        monitor.start();

        monitor.pointer_moved(IN_BAR);
        assert!(monitor.state().is_mouse_in_trigger_zone);
        monitor.pointer_moved(Point::new(700.0, 900.0));
        assert!(monitor.state().is_mouse_in_trigger_zone);
        // Secondary display is 1080 tall.
        monitor.pointer_moved(Point::new(2000.0, 1070.0));
        assert!(monitor.state().is_mouse_in_trigger_zone);
        monitor.pointer_moved(BELOW_BAR);
        assert!(!monitor.state().is_mouse_in_trigger_zone);
    }

    #[test]
    fn test_drawer_area_includes_hit_slop() {
        let (monitor, _) = monitor();
        monitor.start();
        monitor.set_drawer_frame(drawer_frame());
        monitor.set_drawer_visible(true);

        monitor.pointer_moved(Point::new(595.0, 790.0));
        assert!(monitor.state().is_mouse_in_drawer_area);
        monitor.pointer_moved(Point::new(585.0, 830.0));
        assert!(!monitor.state().is_mouse_in_drawer_area);
    }

    #[test]
    fn test_hiding_drawer_resets_even_with_pointer_inside() {
        let (monitor, _) = monitor();
        monitor.start();
        monitor.set_drawer_frame(drawer_frame());
        monitor.set_drawer_visible(true);
        monitor.pointer_moved(Point::new(700.0, 830.0));
        assert!(monitor.state().is_mouse_in_drawer_area);

        monitor.set_drawer_visible(false);
        assert_eq!(monitor.state(), HoverState::default());

        monitor.pointer_moved(Point::new(700.0, 830.0));
        assert!(!monitor.state().is_mouse_in_drawer_area);
    }

    #[test]
    fn test_dismissed_drawer_stays_hidden_until_pointer_reenters() {
        let (monitor, _) = monitor();
        let mut intents = monitor.intents();
        monitor.start();

        monitor.pointer_moved(IN_BAR);
        assert_eq!(intents.try_recv(), Ok(HoverIntent::Reveal));
        monitor.set_drawer_frame(drawer_frame());
        monitor.set_drawer_visible(true);
        monitor.pointer_moved(IN_BAR);

        monitor.set_drawer_visible(false);
        assert_eq!(monitor.state(), HoverState::default());
        monitor.pointer_moved(IN_BAR);
        monitor.pointer_moved(Point::new(720.0, 895.0));
        assert_eq!(intents.try_recv(), Err(TryRecvError::Empty));
        assert!(monitor.state().is_mouse_in_trigger_zone);

        monitor.pointer_moved(BELOW_BAR);
        monitor.pointer_moved(IN_BAR);
        assert_eq!(intents.try_recv(), Ok(HoverIntent::Reveal));
    }

    #[test]
    fn test_reveal_then_hide_intents() {
        let (monitor, _) = monitor();
        let mut intents = monitor.intents();
        monitor.start();

        monitor.pointer_moved(IN_BAR);
        assert_eq!(intents.try_recv(), Ok(HoverIntent::Reveal));
        // Staying in the zone does not repeat it.
        monitor.pointer_moved(Point::new(710.0, 890.0));
        assert_eq!(intents.try_recv(), Err(TryRecvError::Empty));

        monitor.set_drawer_frame(drawer_frame());
        monitor.set_drawer_visible(true);
        monitor.pointer_moved(Point::new(700.0, 830.0));
        assert_eq!(intents.try_recv(), Err(TryRecvError::Empty));

        monitor.pointer_moved(BELOW_BAR);
        assert_eq!(intents.try_recv(), Ok(HoverIntent::Hide));
        monitor.pointer_moved(Point::new(100.0, 100.0));
        assert_eq!(intents.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_start_stop_idempotent_and_stop_resets() {
        let (monitor, _) = monitor();
        let mut rx = monitor.subscribe();
        monitor.start();
        monitor.start();
        assert!(monitor.is_monitoring());

        monitor.pointer_moved(IN_BAR);
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        monitor.stop();
        monitor.stop();
        assert_eq!(monitor.monitor_state(), MonitorState::Idle);
        assert_eq!(*rx.borrow_and_update(), HoverState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_feeds_pointer_location() {
        let (monitor, pointer) = monitor();
        let mut intents = monitor.intents();
        monitor.start();

        pointer.move_to(BELOW_BAR);
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!monitor.state().is_mouse_in_trigger_zone);

        pointer.move_to(IN_BAR);
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(monitor.state().is_mouse_in_trigger_zone);
        assert_eq!(intents.try_recv(), Ok(HoverIntent::Reveal));

        monitor.stop();
        pointer.move_to(BELOW_BAR);
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!monitor.state().is_mouse_in_trigger_zone);
    }
}
