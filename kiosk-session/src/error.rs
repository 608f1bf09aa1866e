use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The platform or OS version lacks the capability. Not retryable; the
    /// caller should degrade gracefully.
    #[error("Capability unavailable: {0}")]
    Unavailable(String),

    /// The underlying OS call was rejected or raised. The native message is
    /// carried verbatim for diagnostics.
    #[error("Native call failed: {0}")]
    Native(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;

// XXX: we don't want to expose jni-rs in the public API
// so the Android backend uses an internal error type and the
// JNI details are stripped before crossing the controller
// boundary.
//
// This way we avoid exposing a public trait implementation for
// `From<jni::errors::Error>`
#[cfg(target_os = "android")]
#[derive(Error, Debug)]
pub(crate) enum InternalSessionError {
    #[error("A JNI error")]
    JniError(jni::errors::JniError),
    #[error("A Java Exception was thrown via a JNI method call")]
    JniException(String),
    #[error("A Java VM error")]
    JvmError(jni::errors::Error),
}

#[cfg(target_os = "android")]
pub(crate) type InternalResult<T> = std::result::Result<T, InternalSessionError>;

#[cfg(target_os = "android")]
impl From<jni::errors::Error> for InternalSessionError {
    fn from(value: jni::errors::Error) -> Self {
        InternalSessionError::JvmError(value)
    }
}

#[cfg(target_os = "android")]
impl From<jni::errors::JniError> for InternalSessionError {
    fn from(value: jni::errors::JniError) -> Self {
        InternalSessionError::JniError(value)
    }
}

#[cfg(target_os = "android")]
impl From<InternalSessionError> for SessionError {
    fn from(value: InternalSessionError) -> Self {
        match value {
            InternalSessionError::JniError(err) => SessionError::Native(err.to_string()),
            InternalSessionError::JniException(msg) => SessionError::Native(msg),
            InternalSessionError::JvmError(err) => SessionError::Native(err.to_string()),
        }
    }
}
