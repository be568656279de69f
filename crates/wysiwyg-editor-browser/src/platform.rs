//! Platform detection for keyboard shortcuts.

use std::sync::OnceLock;

/// Cached platform detection results.
#[derive(Debug, Clone, Default)]
pub struct Platform {
    pub ios: bool,
    pub mac: bool,
    pub android: bool,
    pub mobile: bool,
}

impl Platform {
    /// Whether Cmd rather than Ctrl is the primary shortcut modifier.
    pub fn uses_meta_for_shortcuts(&self) -> bool {
        self.mac || self.ios
    }
}

static PLATFORM: OnceLock<Platform> = OnceLock::new();

/// Get cached platform info. Detection runs once on first call.
pub fn platform() -> &'static Platform {
    PLATFORM.get_or_init(detect_platform)
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
fn detect_platform() -> Platform {
    let Some(window) = web_sys::window() else {
        return Platform::default();
    };

    let navigator = window.navigator();
    let user_agent = navigator.user_agent().unwrap_or_default().to_lowercase();
    let platform_str = navigator.platform().unwrap_or_default().to_lowercase();

    // iPadOS reports a Mac platform but has touch points.
    let ios = user_agent.contains("iphone")
        || user_agent.contains("ipad")
        || user_agent.contains("ipod")
        || (platform_str.contains("mac") && navigator.max_touch_points() > 0);
    let mac = platform_str.contains("mac") && !ios;
    let android = user_agent.contains("android");
    let mobile = ios || android || user_agent.contains("mobile");

    Platform {
        ios,
        mac,
        android,
        mobile,
    }
}

#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
fn detect_platform() -> Platform {
    Platform::default()
}
