use std::fmt;
use std::io;

use thiserror::Error;

/// errno for "device or resource busy" on Linux.
const EBUSY: i32 = 16;

/// Why a capture device could not be acquired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureErrorKind {
    Permission,
    DeviceMissing,
    DeviceBusy,
    Other,
}

impl fmt::Display for CaptureErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureErrorKind::Permission => "permission denied",
            CaptureErrorKind::DeviceMissing => "device not found",
            CaptureErrorKind::DeviceBusy => "device busy",
            CaptureErrorKind::Other => "capture failed",
        };
        f.write_str(name)
    }
}

/// Startup failure acquiring a frame source.
#[derive(Debug, Error)]
#[error("{kind}: {detail}")]
pub struct CaptureError {
    pub kind: CaptureErrorKind,
    pub detail: String,
}

impl CaptureError {
    pub fn new(kind: CaptureErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Categorize an I/O error raised while opening `device`.
    pub fn from_io(err: &io::Error, device: &str) -> Self {
        Self::new(classify_io(err), format!("{}: {}", device, err))
    }

    /// Message suitable for showing to the person at the camera.
    pub fn user_message(&self) -> String {
        let hint = match self.kind {
            CaptureErrorKind::Permission => "Please allow camera access for this user.",
            CaptureErrorKind::DeviceMissing => "No camera found on this device.",
            CaptureErrorKind::DeviceBusy => "Camera is already in use by another application.",
            CaptureErrorKind::Other => "Please check your camera connection and permissions.",
        };
        format!("Unable to access camera. {}", hint)
    }
}

fn classify_io(err: &io::Error) -> CaptureErrorKind {
    if err.raw_os_error() == Some(EBUSY) {
        return CaptureErrorKind::DeviceBusy;
    }
    match err.kind() {
        io::ErrorKind::PermissionDenied => CaptureErrorKind::Permission,
        io::ErrorKind::NotFound => CaptureErrorKind::DeviceMissing,
        _ => CaptureErrorKind::Other,
    }
}

/// Category of a startup error: a `CaptureError` or `io::Error` anywhere in the chain.
pub fn capture_error_kind(err: &anyhow::Error) -> CaptureErrorKind {
    for cause in err.chain() {
        if let Some(capture) = cause.downcast_ref::<CaptureError>() {
            return capture.kind;
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return classify_io(io_err);
        }
    }
    CaptureErrorKind::Other
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn classifies_io_errors() {
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(
            CaptureError::from_io(&denied, "/dev/video0").kind,
            CaptureErrorKind::Permission
        );
        let missing = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(
            CaptureError::from_io(&missing, "/dev/video0").kind,
            CaptureErrorKind::DeviceMissing
        );
        let busy = io::Error::from_raw_os_error(EBUSY);
        assert_eq!(
            CaptureError::from_io(&busy, "/dev/video0").kind,
            CaptureErrorKind::DeviceBusy
        );
    }

    #[test]
    fn finds_kind_through_context_chain() {
        let err = anyhow::Error::new(CaptureError::new(CaptureErrorKind::DeviceBusy, "cam"))
            .context("starting overlay");
        assert_eq!(capture_error_kind(&err), CaptureErrorKind::DeviceBusy);

        let io_err: std::result::Result<(), io::Error> =
            Err(io::Error::from(io::ErrorKind::PermissionDenied));
        let err = io_err.context("open device").unwrap_err();
        assert_eq!(capture_error_kind(&err), CaptureErrorKind::Permission);

        assert_eq!(
            capture_error_kind(&anyhow::anyhow!("model load failed")),
            CaptureErrorKind::Other
        );
    }

    #[test]
    fn user_messages_are_categorized() {
        let msg = CaptureError::new(CaptureErrorKind::DeviceMissing, "x").user_message();
        assert!(msg.contains("No camera found"));
        let msg = CaptureError::new(CaptureErrorKind::DeviceBusy, "x").user_message();
        assert!(msg.contains("already in use"));
    }
}
