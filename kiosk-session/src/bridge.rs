//! The seam between the portable lock-session state machine and the device.
//!
//! Every OS capability the controller touches goes through [`DeviceBridge`] so
//! that the session contract can be exercised off-device, and so that
//! version-gated platform behavior stays inside a backend selected once at
//! startup instead of leaking `if sdk >= X` branches into every operation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Result;

/// Shared flag pairing the controller's gesture-suppression state with the
/// backend's navigation-visibility watch.
///
/// The token is handed to the backend when suppression is engaged. Whatever
/// thread delivers the platform's visibility-changed notification must check
/// [`engaged()`] before re-applying the hide; a stale notification arriving
/// after [`restore_gesture_nav`] sees `false` and stands down. Plain atomic
/// loads/stores are all the synchronization required since the writes are
/// idempotent and only this one flag is shared.
///
/// [`engaged()`]: NavWatchToken::engaged
/// [`restore_gesture_nav`]: crate::LockSessionController::restore_gesture_nav
#[derive(Debug, Clone, Default)]
pub struct NavWatchToken {
    engaged: Arc<AtomicBool>,
}

impl NavWatchToken {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether gesture suppression is still requested.
    pub fn engaged(&self) -> bool {
        self.engaged.load(Ordering::Acquire)
    }

    pub(crate) fn set(&self, engaged: bool) {
        self.engaged.store(engaged, Ordering::Release);
    }
}

/// Synchronous device operations backing a lock session.
///
/// Implementations translate each call directly into the equivalent OS
/// request and surface rejections as [`SessionError::Native`] with the
/// native message preserved verbatim. None of these calls may panic.
///
/// [`SessionError::Native`]: crate::SessionError::Native
pub trait DeviceBridge {
    /// Whether the platform supports pinning the foreground task at all.
    fn supports_lock_task(&self) -> bool;

    /// Whether [`watch_navigation`] can install a visibility watch, or the
    /// hide is necessarily one-shot.
    ///
    /// [`watch_navigation`]: DeviceBridge::watch_navigation
    fn supports_nav_watch(&self) -> bool;

    fn hide_system_bars(&mut self) -> Result<()>;
    fn show_system_bars(&mut self) -> Result<()>;

    fn start_lock_task(&mut self) -> Result<()>;
    fn stop_lock_task(&mut self) -> Result<()>;

    /// Marks (or unmarks) the display surface as non-capturable, blocking
    /// screenshots and screen recording.
    fn set_secure_surface(&mut self, secure: bool) -> Result<()>;

    fn stream_volume(&self) -> Result<i32>;
    fn max_stream_volume(&self) -> Result<i32>;
    fn set_stream_volume(&mut self, volume: i32) -> Result<()>;

    fn hide_navigation(&mut self) -> Result<()>;
    fn show_navigation(&mut self) -> Result<()>;

    /// Subscribes to navigation-visibility changes so the hide can be
    /// re-applied whenever the OS re-shows the affordance while `token` is
    /// engaged. Returns [`SessionError::Unavailable`] where no such hook
    /// exists; the caller then falls back to the one-shot hide.
    ///
    /// [`SessionError::Unavailable`]: crate::SessionError::Unavailable
    fn watch_navigation(&mut self, token: NavWatchToken) -> Result<()>;

    /// Drops any watch installed by [`watch_navigation`]. Safe to call when
    /// none is installed.
    ///
    /// [`watch_navigation`]: DeviceBridge::watch_navigation
    fn unwatch_navigation(&mut self);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{DeviceBridge, NavWatchToken};
    use crate::error::{Result, SessionError};

    /// Scriptable in-memory device shared by the controller and dispatch
    /// tests. Mirrors the observable surface of a real handset: bar/nav
    /// visibility, task pinning, the secure mark and a single audio stream.
    pub(crate) struct FakeBridge {
        pub lock_task_supported: bool,
        pub nav_watch_supported: bool,
        pub pinned: bool,
        pub bars_hidden: bool,
        pub nav_hidden: bool,
        pub secure: bool,
        pub volume: i32,
        pub max_volume: i32,
        pub watch: Option<NavWatchToken>,
        /// When set, the next fallible call is rejected with this message.
        pub fail_next: Option<&'static str>,
    }

    impl FakeBridge {
        pub fn new() -> Self {
            Self {
                lock_task_supported: true,
                nav_watch_supported: true,
                pinned: false,
                bars_hidden: false,
                nav_hidden: false,
                secure: false,
                volume: 4,
                max_volume: 15,
                watch: None,
                fail_next: None,
            }
        }

        /// A device below the minimum OS version for task lock.
        pub fn legacy_device() -> Self {
            Self {
                lock_task_supported: false,
                nav_watch_supported: false,
                ..Self::new()
            }
        }

        fn gate(&mut self) -> Result<()> {
            match self.fail_next.take() {
                Some(message) => Err(SessionError::Native(message.to_string())),
                None => Ok(()),
            }
        }

        /// Simulates the OS asynchronously re-showing the navigation
        /// affordance, followed by the watch (if installed) reacting to the
        /// visibility change.
        pub fn os_reshows_navigation(&mut self) {
            self.nav_hidden = false;
            if let Some(token) = &self.watch {
                if token.engaged() {
                    self.nav_hidden = true;
                }
            }
        }
    }

    impl DeviceBridge for FakeBridge {
        fn supports_lock_task(&self) -> bool {
            self.lock_task_supported
        }

        fn supports_nav_watch(&self) -> bool {
            self.nav_watch_supported
        }

        fn hide_system_bars(&mut self) -> Result<()> {
            self.gate()?;
            self.bars_hidden = true;
            self.nav_hidden = true;
            Ok(())
        }

        fn show_system_bars(&mut self) -> Result<()> {
            self.gate()?;
            self.bars_hidden = false;
            self.nav_hidden = false;
            Ok(())
        }

        fn start_lock_task(&mut self) -> Result<()> {
            self.gate()?;
            self.pinned = true;
            Ok(())
        }

        fn stop_lock_task(&mut self) -> Result<()> {
            self.gate()?;
            self.pinned = false;
            Ok(())
        }

        fn set_secure_surface(&mut self, secure: bool) -> Result<()> {
            self.gate()?;
            self.secure = secure;
            Ok(())
        }

        fn stream_volume(&self) -> Result<i32> {
            Ok(self.volume)
        }

        fn max_stream_volume(&self) -> Result<i32> {
            Ok(self.max_volume)
        }

        fn set_stream_volume(&mut self, volume: i32) -> Result<()> {
            self.gate()?;
            self.volume = volume;
            Ok(())
        }

        fn hide_navigation(&mut self) -> Result<()> {
            self.gate()?;
            self.nav_hidden = true;
            Ok(())
        }

        fn show_navigation(&mut self) -> Result<()> {
            self.gate()?;
            self.nav_hidden = false;
            Ok(())
        }

        fn watch_navigation(&mut self, token: NavWatchToken) -> Result<()> {
            if !self.nav_watch_supported {
                return Err(SessionError::Unavailable(
                    "no navigation-visibility hook".to_string(),
                ));
            }
            self.watch = Some(token);
            Ok(())
        }

        fn unwatch_navigation(&mut self) {
            self.watch = None;
        }
    }
}
