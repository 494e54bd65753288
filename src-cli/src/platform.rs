//! Native backend lookup for commands that talk to the OS.

use crate::colors;
use crate::exit_codes::ExitCode;
use stowbar_lib::PlatformServices;

/// Native services, or an "unsupported platform" report and exit code.
pub fn require_services(quiet: bool) -> Result<PlatformServices, ExitCode> {
    stowbar_lib::platform::native_services().ok_or_else(|| {
        if !quiet {
            eprintln!(
                "{}",
                colors::error(&format!(
                    "unsupported platform: {} has no native menu bar backend",
                    std::env::consts::OS
                ))
            );
        }
        ExitCode::UnsupportedPlatform
    })
}

/// Name of the native backend, for `version`.
pub fn backend_name() -> &'static str {
    stowbar_lib::platform::backend_name()
}
