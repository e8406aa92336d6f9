//! Accessibility modes.
//!
//! Each mode injects one style marker; the screen reader mode also injects a
//! polite live region that scenarios write announcements into. Modes stack
//! freely and [`reset_accessibility`] removes all of them.

use crate::host::Host;

/// Id of the injected live region.
pub const LIVE_REGION_ID: &str = "a11y-live-region";

/// An accessibility mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessibilityMode {
    /// Screen reader announcements through a live region.
    ScreenReader,
    /// Root font size scaled up.
    LargeText,
    /// High-contrast colours.
    HighContrast,
    /// Prominent focus outlines.
    KeyboardNavigation,
    /// Near-zero animation and transition durations.
    ReducedMotion,
}

impl AccessibilityMode {
    /// Every mode.
    pub const ALL: [AccessibilityMode; 5] = [
        Self::ScreenReader,
        Self::LargeText,
        Self::HighContrast,
        Self::KeyboardNavigation,
        Self::ReducedMotion,
    ];

    /// Stable id.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScreenReader => "screen_reader",
            Self::LargeText => "large_text",
            Self::HighContrast => "high_contrast",
            Self::KeyboardNavigation => "keyboard_navigation",
            Self::ReducedMotion => "reduced_motion",
        }
    }

    /// Parse a stable id.
    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == id)
    }

    /// Style marker id for this mode.
    pub fn style_id(&self) -> String {
        format!("a11y:{}", self.as_str())
    }

    fn css(&self) -> &'static str {
        match self {
            Self::ScreenReader => {
                ".a11y-live-region { position: absolute; width: 1px; height: 1px; overflow: hidden; }"
            }
            Self::LargeText => "html { font-size: 125%; }",
            Self::HighContrast => "html { filter: contrast(1.5); background: #000; color: #fff; }",
            Self::KeyboardNavigation => "*:focus { outline: 3px solid #ffbf47; outline-offset: 2px; }",
            Self::ReducedMotion => {
                "*, *::before, *::after { animation-duration: 0.01ms !important; transition-duration: 0.01ms !important; }"
            }
        }
    }
}

impl std::fmt::Display for AccessibilityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enable `modes` on the host. Already-enabled modes are left as they are.
pub fn apply_accessibility(host: &Host, modes: &[AccessibilityMode]) {
    let mut inner = host.lock();
    for mode in modes {
        inner.styles.insert(mode.style_id(), mode.css().into());
        if *mode == AccessibilityMode::ScreenReader {
            inner
                .live_regions
                .entry(LIVE_REGION_ID.into())
                .or_default();
        }
    }
    tracing::debug!(?modes, "Accessibility modes applied");
}

/// True if `mode` is enabled.
pub fn is_enabled(host: &Host, mode: AccessibilityMode) -> bool {
    host.has_style(&mode.style_id())
}

/// Write an announcement to the live region.
///
/// Returns false, and warns, if screen reader mode is not enabled.
pub fn announce(host: &Host, message: impl Into<String>) -> bool {
    let message = message.into();
    let written = {
        let mut inner = host.lock();
        match inner.live_regions.get_mut(LIVE_REGION_ID) {
            Some(region) => {
                region.push(message.clone());
                true
            }
            None => false,
        }
    };
    if !written {
        host.warn(format!("No live region for announcement: {message}"));
    }
    written
}

/// Remove every accessibility style marker and the live region.
pub fn reset_accessibility(host: &Host) {
    let mut inner = host.lock();
    for mode in AccessibilityMode::ALL {
        inner.styles.remove(&mode.style_id());
    }
    inner.live_regions.remove(LIVE_REGION_ID);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::StaticFetcher;
    use std::sync::Arc;

    fn host() -> Host {
        Host::new(Arc::new(StaticFetcher::default()))
    }

    #[test]
    fn modes_stack_and_reset() {
        let host = host();
        let before = host.snapshot();

        apply_accessibility(&host, &[AccessibilityMode::LargeText]);
        apply_accessibility(
            &host,
            &[AccessibilityMode::HighContrast, AccessibilityMode::ReducedMotion],
        );
        assert!(is_enabled(&host, AccessibilityMode::LargeText));
        assert!(is_enabled(&host, AccessibilityMode::HighContrast));
        assert!(is_enabled(&host, AccessibilityMode::ReducedMotion));
        assert!(!is_enabled(&host, AccessibilityMode::ScreenReader));

        reset_accessibility(&host);
        assert_eq!(host.snapshot(), before);
    }

    #[test]
    fn screen_reader_live_region() {
        let host = host();
        apply_accessibility(&host, &[AccessibilityMode::ScreenReader]);
        assert!(announce(&host, "Room loaded"));
        apply_accessibility(&host, &[AccessibilityMode::ScreenReader]);
        assert!(announce(&host, "Entry 1 of 4"));

        assert_eq!(
            host.live_region(LIVE_REGION_ID).unwrap(),
            vec!["Room loaded", "Entry 1 of 4"]
        );

        reset_accessibility(&host);
        assert!(host.live_region(LIVE_REGION_ID).is_none());
    }

    #[test]
    fn announce_without_screen_reader_is_dropped() {
        let host = host();
        assert!(!announce(&host, "nobody hears this"));
        assert!(host.live_region(LIVE_REGION_ID).is_none());
    }

    #[test]
    fn ids_round_trip() {
        for mode in AccessibilityMode::ALL {
            assert_eq!(AccessibilityMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(AccessibilityMode::parse("dark_mode"), None);
    }
}
