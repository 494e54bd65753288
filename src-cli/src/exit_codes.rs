//! Exit codes for the CLI.
//!
//! Scripts can branch on these instead of parsing output.

/// Exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Operation completed successfully
    Success = 0,
    /// General/unspecified error
    GeneralError = 1,
    /// Invalid command-line arguments
    InvalidArguments = 2,
    /// No native backend for this OS
    UnsupportedPlatform = 3,
    /// A required permission is not granted
    PermissionDenied = 4,
    /// The menu bar could not be captured
    CaptureFailed = 5,
    /// The click could not be forwarded
    ClickFailed = 6,
    /// The layout could not be read or written
    LayoutFailed = 7,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitCode::Success => write!(f, "success"),
            ExitCode::GeneralError => write!(f, "general error"),
            ExitCode::InvalidArguments => write!(f, "invalid arguments"),
            ExitCode::UnsupportedPlatform => write!(f, "unsupported platform"),
            ExitCode::PermissionDenied => write!(f, "permission denied"),
            ExitCode::CaptureFailed => write!(f, "capture failed"),
            ExitCode::ClickFailed => write!(f, "click failed"),
            ExitCode::LayoutFailed => write!(f, "layout failed"),
        }
    }
}
