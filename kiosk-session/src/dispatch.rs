//! Named-command routing for the UI layer.
//!
//! The hosting surface receives commands by name over its method channel and
//! forwards them here; this module maps each recognized name onto a
//! [`LockSessionController`] operation and shapes the outcome for the wire:
//! `{"ok":true,"value":…}` on success, `{"ok":false,"kind":…,"message":…}` on
//! failure. Unknown names are reported as not-implemented, never as errors.

use log::trace;
use serde::Serialize;

use crate::bridge::DeviceBridge;
use crate::controller::LockSessionController;
use crate::error::SessionError;

const KIND_UNAVAILABLE: &str = "UNAVAILABLE";
const KIND_ERROR: &str = "ERROR";

/// Which command vocabulary the hosting surface speaks.
///
/// Two generations of the exam activity shipped with different spellings of
/// the unlock command; the vocabulary is a configuration choice here rather
/// than two code paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Vocabulary {
    #[default]
    Standard,
    /// Additionally recognizes `exitKiosk`, which unlocks and replies with
    /// the literal string `"unlocked"` instead of a boolean.
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    StartLockTask,
    StopLockTask,
    SetSecureFlag,
    ClearSecureFlag,
    SetMaxVolume,
    RestoreVolume,
    DisableGestureNavigation,
    EnableGestureNavigation,
    ExitKiosk,
}

impl Command {
    fn parse(name: &str, vocabulary: Vocabulary) -> Option<Self> {
        let command = match name {
            "startLockTask" => Command::StartLockTask,
            "stopLockTask" => Command::StopLockTask,
            "setSecureFlag" => Command::SetSecureFlag,
            "clearSecureFlag" => Command::ClearSecureFlag,
            "setMaxVolume" => Command::SetMaxVolume,
            "restoreVolume" => Command::RestoreVolume,
            "disableGestureNavigation" => Command::DisableGestureNavigation,
            "enableGestureNavigation" => Command::EnableGestureNavigation,
            "exitKiosk" if vocabulary == Vocabulary::Legacy => Command::ExitKiosk,
            _ => return None,
        };
        Some(command)
    }
}

/// Success payload of a handled command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyValue {
    Flag(bool),
    Text(&'static str),
}

/// Wire shape of a handled command's result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ReplyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Reply {
    fn success(value: ReplyValue) -> Self {
        Reply {
            ok: true,
            value: Some(value),
            kind: None,
            message: None,
        }
    }

    fn failure(err: SessionError) -> Self {
        let (kind, message) = match err {
            SessionError::Unavailable(message) => (KIND_UNAVAILABLE, message),
            SessionError::Native(message) => (KIND_ERROR, message),
        };
        Reply {
            ok: false,
            value: None,
            kind: Some(kind),
            message: Some(message),
        }
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("Reply serialization cannot fail")
    }
}

/// What became of a dispatched command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Handled(Reply),
    /// The name is not in the configured vocabulary. Signalled to the caller
    /// as not-implemented rather than as a failure.
    NotImplemented,
}

/// Routes command names onto controller operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandTable {
    vocabulary: Vocabulary,
}

impl CommandTable {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn dispatch<B: DeviceBridge>(
        &self,
        controller: &mut LockSessionController<B>,
        name: &str,
    ) -> Outcome {
        let command = match Command::parse(name, self.vocabulary) {
            Some(command) => command,
            None => {
                trace!("command {name:?} not implemented");
                return Outcome::NotImplemented;
            }
        };
        let result = match command {
            Command::StartLockTask => controller.enter_lock().map(ReplyValue::Flag),
            Command::StopLockTask => controller.exit_lock().map(ReplyValue::Flag),
            Command::SetSecureFlag => controller.set_capture_block().map(ReplyValue::Flag),
            Command::ClearSecureFlag => controller.clear_capture_block().map(ReplyValue::Flag),
            Command::SetMaxVolume => controller.force_max_volume().map(ReplyValue::Flag),
            Command::RestoreVolume => controller.restore_volume().map(ReplyValue::Flag),
            Command::DisableGestureNavigation => {
                controller.suppress_gesture_nav().map(ReplyValue::Flag)
            }
            Command::EnableGestureNavigation => {
                controller.restore_gesture_nav().map(ReplyValue::Flag)
            }
            Command::ExitKiosk => controller.exit_lock().map(|_| ReplyValue::Text("unlocked")),
        };
        match result {
            Ok(value) => Outcome::Handled(Reply::success(value)),
            Err(err) => Outcome::Handled(Reply::failure(err)),
        }
    }
}
