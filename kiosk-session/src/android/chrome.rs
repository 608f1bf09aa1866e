//! Version-specific system chrome control.
//!
//! Which API hides the bars depends on the OS release: 30+ has
//! `WindowInsetsController`, everything older goes through the deprecated
//! `View#setSystemUiVisibility` immersive flags. The strategy is selected
//! once when the bridge attaches so the session operations never branch on
//! the SDK level themselves.

use bitflags::bitflags;
use jni::objects::{JObject, JValue};
use jni::JNIEnv;

// WindowInsetsController.BEHAVIOR_SHOW_TRANSIENT_BARS_BY_SWIPE
const BEHAVIOR_SHOW_TRANSIENT_BARS_BY_SWIPE: i32 = 2;

bitflags! {
    /// `View.SYSTEM_UI_FLAG_*` constants driving the pre-30 immersive path.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct SystemUiFlags: i32 {
        const HIDE_NAVIGATION = 0x00000002;
        const FULLSCREEN = 0x00000004;
        const LAYOUT_STABLE = 0x00000100;
        const LAYOUT_HIDE_NAVIGATION = 0x00000200;
        const LAYOUT_FULLSCREEN = 0x00000400;
        const IMMERSIVE_STICKY = 0x00001000;
    }
}

pub(crate) fn window<'local>(
    env: &mut JNIEnv<'local>,
    activity: &JObject,
) -> jni::errors::Result<JObject<'local>> {
    env.call_method(activity, "getWindow", "()Landroid/view/Window;", &[])?
        .l()
}

pub(crate) trait SystemChrome: std::fmt::Debug {
    fn hide_system_bars(&self, env: &mut JNIEnv, activity: &JObject) -> jni::errors::Result<()>;
    fn show_system_bars(&self, env: &mut JNIEnv, activity: &JObject) -> jni::errors::Result<()>;
    fn hide_navigation(&self, env: &mut JNIEnv, activity: &JObject) -> jni::errors::Result<()>;
    fn show_navigation(&self, env: &mut JNIEnv, activity: &JObject) -> jni::errors::Result<()>;
}

/// `WindowInsetsController` chrome for API level 30 and up.
///
/// Hides use the transient-bars-by-swipe behavior so a swipe only reveals
/// the bars briefly and the platform re-hides them itself.
#[derive(Debug)]
pub(crate) struct InsetsChrome;

impl InsetsChrome {
    fn apply(
        &self,
        env: &mut JNIEnv,
        activity: &JObject,
        types_method: &str,
        hide: bool,
    ) -> jni::errors::Result<()> {
        let window = window(env, activity)?;
        let controller = env
            .call_method(
                &window,
                "getInsetsController",
                "()Landroid/view/WindowInsetsController;",
                &[],
            )?
            .l()?;
        if controller.is_null() {
            // The controller is only present once a view is attached to the
            // window; nothing to do until then.
            return Ok(());
        }
        let mask = env
            .call_static_method("android/view/WindowInsets$Type", types_method, "()I", &[])?
            .i()?;
        if hide {
            env.call_method(&controller, "hide", "(I)V", &[JValue::Int(mask)])?
                .v()?;
            env.call_method(
                &controller,
                "setSystemBarsBehavior",
                "(I)V",
                &[JValue::Int(BEHAVIOR_SHOW_TRANSIENT_BARS_BY_SWIPE)],
            )?
            .v()?;
        } else {
            env.call_method(&controller, "show", "(I)V", &[JValue::Int(mask)])?
                .v()?;
        }
        Ok(())
    }
}

impl SystemChrome for InsetsChrome {
    fn hide_system_bars(&self, env: &mut JNIEnv, activity: &JObject) -> jni::errors::Result<()> {
        self.apply(env, activity, "systemBars", true)
    }

    fn show_system_bars(&self, env: &mut JNIEnv, activity: &JObject) -> jni::errors::Result<()> {
        self.apply(env, activity, "systemBars", false)
    }

    fn hide_navigation(&self, env: &mut JNIEnv, activity: &JObject) -> jni::errors::Result<()> {
        self.apply(env, activity, "navigationBars", true)
    }

    fn show_navigation(&self, env: &mut JNIEnv, activity: &JObject) -> jni::errors::Result<()> {
        self.apply(env, activity, "navigationBars", false)
    }
}

/// Immersive-sticky chrome for API levels 21..30.
#[derive(Debug)]
pub(crate) struct LegacyChrome;

impl LegacyChrome {
    fn set_visibility(
        &self,
        env: &mut JNIEnv,
        activity: &JObject,
        flags: SystemUiFlags,
    ) -> jni::errors::Result<()> {
        let window = window(env, activity)?;
        let decor = env
            .call_method(&window, "getDecorView", "()Landroid/view/View;", &[])?
            .l()?;
        env.call_method(
            &decor,
            "setSystemUiVisibility",
            "(I)V",
            &[JValue::Int(flags.bits())],
        )?
        .v()
    }
}

impl SystemChrome for LegacyChrome {
    fn hide_system_bars(&self, env: &mut JNIEnv, activity: &JObject) -> jni::errors::Result<()> {
        self.set_visibility(
            env,
            activity,
            SystemUiFlags::IMMERSIVE_STICKY
                | SystemUiFlags::FULLSCREEN
                | SystemUiFlags::HIDE_NAVIGATION
                | SystemUiFlags::LAYOUT_STABLE
                | SystemUiFlags::LAYOUT_HIDE_NAVIGATION
                | SystemUiFlags::LAYOUT_FULLSCREEN,
        )
    }

    fn show_system_bars(&self, env: &mut JNIEnv, activity: &JObject) -> jni::errors::Result<()> {
        // SYSTEM_UI_FLAG_VISIBLE
        self.set_visibility(env, activity, SystemUiFlags::empty())
    }

    fn hide_navigation(&self, env: &mut JNIEnv, activity: &JObject) -> jni::errors::Result<()> {
        self.set_visibility(
            env,
            activity,
            SystemUiFlags::IMMERSIVE_STICKY
                | SystemUiFlags::HIDE_NAVIGATION
                | SystemUiFlags::LAYOUT_HIDE_NAVIGATION
                | SystemUiFlags::LAYOUT_STABLE,
        )
    }

    fn show_navigation(&self, env: &mut JNIEnv, activity: &JObject) -> jni::errors::Result<()> {
        self.set_visibility(env, activity, SystemUiFlags::empty())
    }
}
