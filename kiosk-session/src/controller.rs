use log::{trace, warn};

use crate::bridge::{DeviceBridge, NavWatchToken};
use crate::error::{Result, SessionError};

/// In-memory state of one kiosk session.
///
/// Created when the hosting UI surface initializes and discarded with it;
/// nothing here survives a process restart.
#[derive(Debug)]
pub struct LockSession {
    active: bool,
    saved_volume: Option<i32>,
    gesture_suppressed: NavWatchToken,
}

impl LockSession {
    fn new() -> Self {
        Self {
            active: false,
            saved_volume: None,
            gesture_suppressed: NavWatchToken::new(),
        }
    }

    /// Whether task-lock mode is currently engaged.
    pub fn active(&self) -> bool {
        self.active
    }

    /// The volume captured by the most recent [`force_max_volume`], if any.
    ///
    /// [`force_max_volume`]: LockSessionController::force_max_volume
    pub fn saved_volume(&self) -> Option<i32> {
        self.saved_volume
    }

    pub fn gesture_suppressed(&self) -> bool {
        self.gesture_suppressed.engaged()
    }
}

/// Executes named lock-related commands against a [`LockSession`],
/// translating device-level outcomes into the uniform result contract.
///
/// Every operation is idempotent and order-tolerant: the exam UI may call
/// [`enter_lock`] repeatedly, or [`exit_lock`] without a prior enter, and
/// neither the session state nor the device may be corrupted by it. No
/// operation lets a fault propagate past this boundary other than as a
/// [`SessionError`].
///
/// [`enter_lock`]: LockSessionController::enter_lock
/// [`exit_lock`]: LockSessionController::exit_lock
#[derive(Debug)]
pub struct LockSessionController<B: DeviceBridge> {
    pub(crate) bridge: B,
    session: LockSession,
}

impl<B: DeviceBridge> LockSessionController<B> {
    pub fn new(bridge: B) -> Self {
        Self {
            bridge,
            session: LockSession::new(),
        }
    }

    pub fn session(&self) -> &LockSession {
        &self.session
    }

    /// Suppresses system UI chrome and pins the foreground task.
    pub fn enter_lock(&mut self) -> Result<bool> {
        trace!("enter_lock");
        if !self.bridge.supports_lock_task() {
            return Err(SessionError::Unavailable(
                "Lock task mode not available".to_string(),
            ));
        }
        self.bridge.hide_system_bars()?;
        self.bridge.start_lock_task()?;
        self.session.active = true;
        Ok(true)
    }

    /// Restores system UI chrome and releases the task pin. Safe to call
    /// when no lock is held.
    pub fn exit_lock(&mut self) -> Result<bool> {
        trace!("exit_lock");
        if !self.bridge.supports_lock_task() {
            return Err(SessionError::Unavailable(
                "Lock task mode not available".to_string(),
            ));
        }
        self.bridge.show_system_bars()?;
        self.bridge.stop_lock_task()?;
        self.session.active = false;
        Ok(true)
    }

    /// Marks the display surface as non-capturable.
    pub fn set_capture_block(&mut self) -> Result<bool> {
        trace!("set_capture_block");
        self.bridge.set_secure_surface(true)?;
        Ok(true)
    }

    /// Removes the non-capturable mark.
    pub fn clear_capture_block(&mut self) -> Result<bool> {
        trace!("clear_capture_block");
        self.bridge.set_secure_surface(false)?;
        Ok(true)
    }

    /// Saves the current stream volume and raises it to the platform
    /// maximum.
    pub fn force_max_volume(&mut self) -> Result<bool> {
        trace!("force_max_volume");
        let current = self.bridge.stream_volume()?;
        self.session.saved_volume = Some(current);
        let max = self.bridge.max_stream_volume()?;
        self.bridge.set_stream_volume(max)?;
        Ok(true)
    }

    /// Sets the stream volume back to the value saved by the last
    /// [`force_max_volume`].
    ///
    /// With no prior save this writes 0. That reproduces the shipped
    /// behavior; callers must treat it as a degenerate case rather than an
    /// error, and it is logged because silently muting the device was
    /// plausibly never intended.
    ///
    /// [`force_max_volume`]: LockSessionController::force_max_volume
    pub fn restore_volume(&mut self) -> Result<bool> {
        trace!("restore_volume");
        let level = match self.session.saved_volume {
            Some(level) => level,
            None => {
                warn!("restore_volume without a prior force_max_volume; restoring to 0");
                0
            }
        };
        self.bridge.set_stream_volume(level)?;
        Ok(true)
    }

    /// Hides the navigation affordance and subscribes to visibility changes
    /// so the hide is re-asserted if the OS re-shows it.
    ///
    /// Where the device offers no visibility hook the hide still takes
    /// effect one-shot and the operation succeeds; the OS may then restore
    /// the affordance later without this controller noticing.
    pub fn suppress_gesture_nav(&mut self) -> Result<bool> {
        trace!("suppress_gesture_nav");
        self.bridge.hide_navigation()?;
        self.session.gesture_suppressed.set(true);
        match self
            .bridge
            .watch_navigation(self.session.gesture_suppressed.clone())
        {
            Ok(()) => {}
            Err(SessionError::Unavailable(reason)) => {
                warn!("navigation watch unavailable ({reason}); suppression is one-shot");
            }
            Err(err) => {
                self.session.gesture_suppressed.set(false);
                return Err(err);
            }
        }
        Ok(true)
    }

    /// Unsubscribes the visibility watch and re-shows the navigation
    /// affordance.
    pub fn restore_gesture_nav(&mut self) -> Result<bool> {
        trace!("restore_gesture_nav");
        // Flag first: an in-flight visibility callback on another thread
        // must stand down before the affordance is re-shown.
        self.session.gesture_suppressed.set(false);
        self.bridge.unwatch_navigation();
        self.bridge.show_navigation()?;
        Ok(true)
    }

    /// Entry point for the host surface's visibility-changed callback.
    ///
    /// Re-applies the hide while suppression is engaged; a no-op otherwise.
    /// This is the cooperative re-assertion path for embedders that forward
    /// OS notifications themselves instead of relying on a backend watch.
    pub fn navigation_shown(&mut self) -> Result<()> {
        if !self.session.gesture_suppressed.engaged() {
            return Ok(());
        }
        trace!("navigation re-shown while suppressed; re-asserting hide");
        self.bridge.hide_navigation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::FakeBridge;

    fn controller() -> LockSessionController<FakeBridge> {
        LockSessionController::new(FakeBridge::new())
    }

    #[test]
    fn enter_then_exit_tracks_active() {
        let mut c = controller();
        assert!(!c.session().active());

        assert_eq!(c.enter_lock(), Ok(true));
        assert!(c.session().active());
        assert!(c.bridge.pinned);
        assert!(c.bridge.bars_hidden);

        assert_eq!(c.exit_lock(), Ok(true));
        assert!(!c.session().active());
        assert!(!c.bridge.pinned);
        assert!(!c.bridge.bars_hidden);
    }

    #[test]
    fn active_follows_last_successful_transition() {
        // Any order, any repetition: active iff the most recent successful
        // call was enter_lock.
        let mut c = controller();
        assert_eq!(c.exit_lock(), Ok(true));
        assert!(!c.session().active());

        assert_eq!(c.enter_lock(), Ok(true));
        assert_eq!(c.enter_lock(), Ok(true));
        assert!(c.session().active());

        assert_eq!(c.exit_lock(), Ok(true));
        assert_eq!(c.exit_lock(), Ok(true));
        assert!(!c.session().active());
    }

    #[test]
    fn failed_enter_leaves_active_false() {
        let mut c = controller();
        c.bridge.fail_next = Some("lock task rejected");
        assert_eq!(
            c.enter_lock(),
            Err(SessionError::Native("lock task rejected".to_string()))
        );
        assert!(!c.session().active());
    }

    #[test]
    fn enter_lock_unavailable_below_minimum_version() {
        let mut c = LockSessionController::new(FakeBridge::legacy_device());
        match c.enter_lock() {
            Err(SessionError::Unavailable(_)) => {}
            other => panic!("expected Unavailable, got {other:?}"),
        }
        assert!(!c.session().active());
        assert!(!c.bridge.pinned);
    }

    #[test]
    fn no_operation_but_the_pair_flips_active() {
        let mut c = controller();
        c.enter_lock().unwrap();
        c.set_capture_block().unwrap();
        c.clear_capture_block().unwrap();
        c.force_max_volume().unwrap();
        c.restore_volume().unwrap();
        c.suppress_gesture_nav().unwrap();
        c.restore_gesture_nav().unwrap();
        assert!(c.session().active());
    }

    #[test]
    fn volume_round_trip() {
        let mut c = controller();
        c.bridge.volume = 4;
        c.bridge.max_volume = 15;

        assert_eq!(c.force_max_volume(), Ok(true));
        assert_eq!(c.bridge.volume, 15);
        assert_eq!(c.session().saved_volume(), Some(4));

        assert_eq!(c.restore_volume(), Ok(true));
        assert_eq!(c.bridge.volume, 4);
    }

    #[test]
    fn restore_without_save_is_degenerate_zero() {
        let mut c = controller();
        c.bridge.volume = 7;
        assert_eq!(c.restore_volume(), Ok(true));
        assert_eq!(c.bridge.volume, 0);
        assert_eq!(c.session().saved_volume(), None);
    }

    #[test]
    fn repeated_force_saves_latest_pre_force_volume() {
        let mut c = controller();
        c.bridge.volume = 4;
        c.force_max_volume().unwrap();
        // Second force while already at max: the restore target becomes max.
        c.force_max_volume().unwrap();
        assert_eq!(c.session().saved_volume(), Some(15));
        c.restore_volume().unwrap();
        assert_eq!(c.bridge.volume, 15);
    }

    #[test]
    fn capture_block_round_trip() {
        let mut c = controller();
        assert!(!c.bridge.secure);
        c.set_capture_block().unwrap();
        assert!(c.bridge.secure);
        c.clear_capture_block().unwrap();
        assert!(!c.bridge.secure);
    }

    #[test]
    fn capture_block_failure_surfaces_native_message() {
        let mut c = controller();
        c.bridge.fail_next = Some("surface rejected flag");
        assert_eq!(
            c.set_capture_block(),
            Err(SessionError::Native("surface rejected flag".to_string()))
        );
    }

    #[test]
    fn suppress_installs_watch_and_restore_removes_it() {
        let mut c = controller();
        assert_eq!(c.suppress_gesture_nav(), Ok(true));
        assert!(c.session().gesture_suppressed());
        assert!(c.bridge.nav_hidden);
        assert!(c.bridge.watch.is_some());

        assert_eq!(c.restore_gesture_nav(), Ok(true));
        assert!(!c.session().gesture_suppressed());
        assert!(!c.bridge.nav_hidden);
        assert!(c.bridge.watch.is_none());
    }

    #[test]
    fn watch_reasserts_hide_while_engaged() {
        let mut c = controller();
        c.suppress_gesture_nav().unwrap();

        c.bridge.os_reshows_navigation();
        assert!(c.bridge.nav_hidden, "watch should have re-applied the hide");
    }

    #[test]
    fn stale_watch_stands_down_after_restore() {
        let mut c = controller();
        c.suppress_gesture_nav().unwrap();
        let token = c.bridge.watch.clone().unwrap();
        c.restore_gesture_nav().unwrap();

        // A notification raced with the restore: the token is disengaged so
        // nothing re-hides.
        assert!(!token.engaged());
        c.bridge.watch = Some(token);
        c.bridge.os_reshows_navigation();
        assert!(!c.bridge.nav_hidden);
    }

    #[test]
    fn suppress_without_hook_falls_back_to_one_shot() {
        let mut bridge = FakeBridge::new();
        bridge.nav_watch_supported = false;
        let mut c = LockSessionController::new(bridge);

        assert_eq!(c.suppress_gesture_nav(), Ok(true));
        assert!(c.session().gesture_suppressed());
        assert!(c.bridge.nav_hidden);
        assert!(c.bridge.watch.is_none());

        // One-shot: an OS re-show sticks.
        c.bridge.os_reshows_navigation();
        assert!(!c.bridge.nav_hidden);
    }

    #[test]
    fn navigation_shown_reasserts_only_while_suppressed() {
        let mut c = controller();
        c.suppress_gesture_nav().unwrap();
        c.bridge.nav_hidden = false;
        c.navigation_shown().unwrap();
        assert!(c.bridge.nav_hidden);

        c.restore_gesture_nav().unwrap();
        c.navigation_shown().unwrap();
        assert!(!c.bridge.nav_hidden);
    }
}
