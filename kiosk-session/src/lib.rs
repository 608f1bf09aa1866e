//! Lock-session control for "locked exam" kiosk apps on Android.
//!
//! A proctored exam surface needs a handful of native capabilities the UI
//! layer cannot reach itself: pinning the foreground task (lock-task mode),
//! hiding system and navigation bars, marking the surface non-capturable so
//! screenshots and recordings are blocked, and forcing the media volume to
//! maximum for audio prompts (restoring it afterwards).
//!
//! The crate splits along that seam:
//!
//! - [`LockSessionController`] owns the portable session state machine: the
//!   `active` lock flag, the saved pre-force volume, and the
//!   gesture-suppression flag with its cooperative re-assertion contract.
//! - [`DeviceBridge`] abstracts the device. The state machine is fully
//!   testable against an in-memory bridge on any host.
//! - [`CommandTable`] maps the named commands arriving from the UI layer's
//!   method channel onto controller operations and shapes results for the
//!   wire.
//! - On Android, [`AndroidBridge`] implements the seam with JNI calls
//!   against the hosting activity, selecting the version-appropriate
//!   system-chrome strategy once at attach time.
//!
//! Every operation is synchronous, idempotent and order-tolerant, and no
//! fault crosses the controller boundary except as a [`SessionError`]:
//! an unhandled native exception would take the whole exam surface down
//! with it.

mod bridge;
mod controller;
mod dispatch;
mod error;

#[cfg(target_os = "android")]
mod android;

pub use bridge::{DeviceBridge, NavWatchToken};
pub use controller::{LockSession, LockSessionController};
pub use dispatch::{CommandTable, Outcome, Reply, ReplyValue, Vocabulary};
pub use error::{Result, SessionError};

#[cfg(target_os = "android")]
pub use android::AndroidBridge;

#[test]
fn test_nav_watch_token_is_send_sync() {
    fn needs_send_sync<T: Send + Sync>() {}
    needs_send_sync::<NavWatchToken>();
}
