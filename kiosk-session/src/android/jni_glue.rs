//! The JNI calls this backend makes are not part of a Java native method
//! implementation, so there is no local frame that will unwind and free
//! local references for us, and a pending exception can't just be left to
//! get thrown when returning to Java.
//!
//! These helpers wrap the VM handle, push local frames, and check + clear
//! exceptions, mapping them into Rust errors.

use std::ops::Deref;

use jni::objects::{JObject, JString};
use jni::JavaVM;

use crate::error::{InternalResult, InternalSessionError};

// JavaVM doesn't implement Clone, but the underlying pointer is valid for
// the life of the process and can be re-wrapped freely.
#[derive(Debug)]
pub(crate) struct SharedJavaVM {
    jvm: JavaVM,
}

impl SharedJavaVM {
    pub unsafe fn from_raw(jvm: *mut jni_sys::JavaVM) -> InternalResult<Self> {
        Ok(Self {
            jvm: JavaVM::from_raw(jvm)?,
        })
    }
}

impl Clone for SharedJavaVM {
    fn clone(&self) -> Self {
        Self {
            jvm: unsafe {
                JavaVM::from_raw(self.jvm.get_java_vm_pointer())
                    .expect("re-wrapping a live JavaVM pointer cannot fail")
            },
        }
    }
}

unsafe impl Send for SharedJavaVM {}
unsafe impl Sync for SharedJavaVM {}

impl Deref for SharedJavaVM {
    type Target = JavaVM;

    fn deref(&self) -> &Self::Target {
        &self.jvm
    }
}

/// Use with `.map_err()` to turn `jni::errors::Error::JavaException` into an
/// error carrying the throwable's message, clearing the exception in the
/// process.
///
/// (The `jni` crate leaves the exception pending since it's more common to
/// let it get thrown when returning to Java; this backend never returns to
/// Java that way.)
pub(crate) fn clear_and_map_exception(
    env: &mut jni::JNIEnv<'_>,
    err: jni::errors::Error,
) -> InternalSessionError {
    if !matches!(err, jni::errors::Error::JavaException) {
        return err.into();
    }

    let result = env.with_local_frame::<_, _, InternalSessionError>(5, |env| {
        let throwable = env.exception_occurred()?;
        assert!(!throwable.is_null()); // only called after a JavaException Result
        env.exception_clear()?;

        let message = env
            .call_method(&throwable, "getMessage", "()Ljava/lang/String;", &[])?
            .l()?;
        if message.is_null() {
            let class = env.get_object_class(&throwable)?;
            let name = env
                .call_method(&class, "getName", "()Ljava/lang/String;", &[])?
                .l()?;
            let name = unsafe { JString::from_raw(JObject::into_raw(name)) };
            let name: String = env.get_string(&name)?.into();
            return Ok(name);
        }
        let message = unsafe { JString::from_raw(JObject::into_raw(message)) };
        let message: String = env.get_string(&message)?.into();
        Ok(message)
    });

    match result {
        Ok(message) => InternalSessionError::JniException(message),
        Err(err) => InternalSessionError::JniException(format!(
            "UNKNOWN (Failed to query JThrowable: {err:?})"
        )),
    }
}
