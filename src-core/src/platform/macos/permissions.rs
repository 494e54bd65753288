//! TCC permission checks.

use crate::error::PermissionError;
use crate::platform::PermissionChecker;
use core_foundation::base::TCFType;
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::string::{CFString, CFStringRef};
use stowbar_types::{PermissionStatus, PermissionType};

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGPreflightScreenCaptureAccess() -> bool;
    fn CGRequestScreenCaptureAccess() -> bool;
}

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> bool;
    fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
    static kAXTrustedCheckOptionPrompt: CFStringRef;
}

fn status_from(granted: bool) -> PermissionStatus {
    if granted {
        PermissionStatus::Granted
    } else {
        PermissionStatus::Denied
    }
}

/// Accessibility and Screen Recording consent through the system APIs.
#[derive(Debug, Default)]
pub struct TccPermissionChecker;

impl PermissionChecker for TccPermissionChecker {
    fn status(&self, permission: PermissionType) -> PermissionStatus {
        match permission {
            PermissionType::Accessibility => status_from(unsafe { AXIsProcessTrusted() }),
            PermissionType::ScreenRecording => {
                status_from(unsafe { CGPreflightScreenCaptureAccess() })
            }
        }
    }

    fn request(&self, permission: PermissionType) -> Result<(), PermissionError> {
        match permission {
            PermissionType::Accessibility => {
                // Shows the system prompt pointing at the Accessibility pane.
                let key = unsafe { CFString::wrap_under_get_rule(kAXTrustedCheckOptionPrompt) };
                let options =
                    CFDictionary::from_CFType_pairs(&[(key, CFBoolean::true_value())]);
                unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef()) };
            }
            PermissionType::ScreenRecording => {
                // Prompts the first time only and adds the app to the
                // Screen Recording list in System Settings.
                unsafe { CGRequestScreenCaptureAccess() };
            }
        }
        Ok(())
    }
}
