//! Cross-platform "current media session" providers
//!
//! Every backend implements [`MediaInfoProvider`] and reports the session the
//! OS considers current:
//! - Linux: MPRIS via D-Bus
//! - Windows: System Media Transport Controls (SMTC)
//! - macOS: AppleScript against Music.app and Spotify

use vrcnp_core::MediaInfoProvider;

#[cfg_attr(target_os = "windows", allow(dead_code))]
mod parse;

// Platform-specific modules
#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "macos")]
mod macos;

/// Create the provider for the platform we were built for
pub fn create_media_session() -> Box<dyn MediaInfoProvider> {
    #[cfg(target_os = "linux")]
    return Box::new(linux::MprisSession::new());

    #[cfg(target_os = "windows")]
    return Box::new(windows::SmtcSession::new());

    #[cfg(target_os = "macos")]
    return Box::new(macos::MacOsSession::new());

    #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
    compile_error!("Unsupported platform - media session detection requires Linux, Windows, or macOS");
}
