//! JNI-backed [`DeviceBridge`] for the activity hosting the current process.
//!
//! All calls go through the Java `Activity`/`Window`/`AudioManager` surface
//! rather than the NDK, since task lock, the secure flag and stream volume
//! have no native-side entry points. The activity reference comes from
//! `ndk-context`, the same publication mechanism the wider rust-mobile
//! ecosystem uses.

mod chrome;
mod jni_glue;

use jni::objects::{GlobalRef, JObject, JValue};
use jni::JNIEnv;
use log::debug;
use num_enum::IntoPrimitive;

use crate::bridge::{DeviceBridge, NavWatchToken};
use crate::error::{InternalResult, Result, SessionError};

use chrome::SystemChrome;
use jni_glue::{clear_and_map_exception, SharedJavaVM};

// Context.AUDIO_SERVICE
const AUDIO_SERVICE: &str = "audio";
// AudioManager.STREAM_MUSIC
const STREAM_MUSIC: i32 = 3;
// WindowManager.LayoutParams.FLAG_SECURE
const FLAG_SECURE: i32 = 0x2000;

/// Android releases at which the capability APIs this backend relies on
/// were introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive)]
#[repr(i32)]
enum ApiLevel {
    /// `Activity.startLockTask` / `stopLockTask`.
    Lollipop = 21,
    /// `WindowInsetsController`.
    R = 30,
}

fn at_least(sdk: i32, level: ApiLevel) -> bool {
    sdk >= i32::from(level)
}

/// The user-visible SDK version of the framework
///
/// Also referred to as [`Build.VERSION_CODES`](https://developer.android.com/reference/android/os/Build.VERSION_CODES)
fn sdk_version() -> i32 {
    let mut prop = android_properties::getprop("ro.build.version.sdk");
    if let Some(val) = prop.value() {
        val.parse()
            .expect("Failed to parse ro.build.version.sdk property")
    } else {
        panic!("Couldn't read ro.build.version.sdk system property");
    }
}

fn audio_manager<'local>(
    env: &mut JNIEnv<'local>,
    activity: &JObject,
) -> jni::errors::Result<JObject<'local>> {
    let service = env.new_string(AUDIO_SERVICE)?;
    env.call_method(
        activity,
        "getSystemService",
        "(Ljava/lang/String;)Ljava/lang/Object;",
        &[JValue::Object(&service)],
    )?
    .l()
}

/// [`DeviceBridge`] over the hosting activity.
#[derive(Debug)]
pub struct AndroidBridge {
    jvm: SharedJavaVM,
    activity: GlobalRef,
    sdk: i32,
    chrome: Box<dyn SystemChrome>,
}

impl AndroidBridge {
    /// Binds to the activity hosting the current process and selects the
    /// system-chrome strategy for the device's OS version.
    pub fn attach() -> Result<Self> {
        Self::attach_internal().map_err(SessionError::from)
    }

    fn attach_internal() -> InternalResult<Self> {
        let ctx = ndk_context::android_context();
        let jvm = unsafe { SharedJavaVM::from_raw(ctx.vm().cast()) }?;
        let activity = {
            let mut env = jvm.attach_current_thread_permanently()?;
            let activity = unsafe { JObject::from_raw(ctx.context() as jni::sys::jobject) };
            env.new_global_ref(activity)?
        };
        let sdk = sdk_version();
        let chrome: Box<dyn SystemChrome> = if at_least(sdk, ApiLevel::R) {
            Box::new(chrome::InsetsChrome)
        } else {
            Box::new(chrome::LegacyChrome)
        };
        debug!("kiosk bridge attached: sdk {sdk}, chrome {chrome:?}");
        Ok(Self {
            jvm,
            activity,
            sdk,
            chrome,
        })
    }

    /// Runs `f` with an attached env and the activity, inside a local frame,
    /// clearing and mapping any Java exception the calls raise.
    fn with_activity<F, R>(&self, f: F) -> InternalResult<R>
    where
        for<'j> F: FnOnce(&mut JNIEnv<'j>, &JObject) -> jni::errors::Result<R>,
    {
        let mut env = self.jvm.attach_current_thread_permanently()?;
        let result = env.with_local_frame::<_, _, jni::errors::Error>(16, |env| {
            f(env, self.activity.as_obj())
        });
        result.map_err(|err| clear_and_map_exception(&mut env, err))
    }
}

impl DeviceBridge for AndroidBridge {
    fn supports_lock_task(&self) -> bool {
        at_least(self.sdk, ApiLevel::Lollipop)
    }

    fn supports_nav_watch(&self) -> bool {
        false
    }

    fn hide_system_bars(&mut self) -> Result<()> {
        let chrome = &self.chrome;
        self.with_activity(|env, activity| chrome.hide_system_bars(env, activity))
            .map_err(SessionError::from)
    }

    fn show_system_bars(&mut self) -> Result<()> {
        let chrome = &self.chrome;
        self.with_activity(|env, activity| chrome.show_system_bars(env, activity))
            .map_err(SessionError::from)
    }

    fn start_lock_task(&mut self) -> Result<()> {
        self.with_activity(|env, activity| {
            env.call_method(activity, "startLockTask", "()V", &[])?.v()
        })
        .map_err(SessionError::from)
    }

    fn stop_lock_task(&mut self) -> Result<()> {
        self.with_activity(|env, activity| {
            env.call_method(activity, "stopLockTask", "()V", &[])?.v()
        })
        .map_err(SessionError::from)
    }

    fn set_secure_surface(&mut self, secure: bool) -> Result<()> {
        self.with_activity(|env, activity| {
            let window = chrome::window(env, activity)?;
            if secure {
                env.call_method(
                    &window,
                    "setFlags",
                    "(II)V",
                    &[JValue::Int(FLAG_SECURE), JValue::Int(FLAG_SECURE)],
                )?
                .v()
            } else {
                env.call_method(&window, "clearFlags", "(I)V", &[JValue::Int(FLAG_SECURE)])?
                    .v()
            }
        })
        .map_err(SessionError::from)
    }

    fn stream_volume(&self) -> Result<i32> {
        self.with_activity(|env, activity| {
            let audio = audio_manager(env, activity)?;
            env.call_method(
                &audio,
                "getStreamVolume",
                "(I)I",
                &[JValue::Int(STREAM_MUSIC)],
            )?
            .i()
        })
        .map_err(SessionError::from)
    }

    fn max_stream_volume(&self) -> Result<i32> {
        self.with_activity(|env, activity| {
            let audio = audio_manager(env, activity)?;
            env.call_method(
                &audio,
                "getStreamMaxVolume",
                "(I)I",
                &[JValue::Int(STREAM_MUSIC)],
            )?
            .i()
        })
        .map_err(SessionError::from)
    }

    fn set_stream_volume(&mut self, volume: i32) -> Result<()> {
        self.with_activity(|env, activity| {
            let audio = audio_manager(env, activity)?;
            env.call_method(
                &audio,
                "setStreamVolume",
                "(III)V",
                &[
                    JValue::Int(STREAM_MUSIC),
                    JValue::Int(volume),
                    JValue::Int(0),
                ],
            )?
            .v()
        })
        .map_err(SessionError::from)
    }

    fn hide_navigation(&mut self) -> Result<()> {
        let chrome = &self.chrome;
        self.with_activity(|env, activity| chrome.hide_navigation(env, activity))
            .map_err(SessionError::from)
    }

    fn show_navigation(&mut self) -> Result<()> {
        let chrome = &self.chrome;
        self.with_activity(|env, activity| chrome.show_navigation(env, activity))
            .map_err(SessionError::from)
    }

    fn watch_navigation(&mut self, _token: NavWatchToken) -> Result<()> {
        // There is no pure-JNI registration point for a visibility listener
        // from here: pre-30 `setOnSystemUiVisibilityChangeListener` needs a
        // Java callback object and 30+ transient-bars behavior re-asserts
        // natively. Embedders that receive visibility callbacks forward them
        // to `LockSessionController::navigation_shown` instead.
        Err(SessionError::Unavailable(
            "no native navigation-visibility hook".to_string(),
        ))
    }

    fn unwatch_navigation(&mut self) {}
}
