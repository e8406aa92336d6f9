//! Device constraints: viewport, input, CPU, cold start and broken storage.

use crate::error::DeviceError;
use crate::host::{Host, ViewportSize};

/// Style marker injected for touch devices.
pub const TOUCH_ONLY_STYLE: &str = "device:touch-only";
/// Style marker injected for devices without a hover-capable pointer.
pub const NO_HOVER_STYLE: &str = "device:no-hover";

/// A fixed bundle of device characteristics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevicePreset {
    /// Stable id.
    pub id: &'static str,
    /// CSS pixel width.
    pub width: u32,
    /// CSS pixel height.
    pub height: u32,
    /// Device pixel ratio.
    pub pixel_ratio: f32,
    /// User agent string.
    pub user_agent: &'static str,
    /// Touch input.
    pub touch: bool,
    /// CPU slowdown multiplier.
    pub cpu_slowdown: Option<u32>,
    /// Network profile the device usually sees.
    pub network_profile: Option<&'static str>,
    /// Description.
    pub description: Option<&'static str>,
}

static PRESETS: [DevicePreset; 7] = [
    DevicePreset {
        id: "iphone_se",
        width: 375,
        height: 667,
        pixel_ratio: 2.0,
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148",
        touch: true,
        cpu_slowdown: Some(2),
        network_profile: None,
        description: Some("Small-screen iPhone"),
    },
    DevicePreset {
        id: "iphone_14",
        width: 390,
        height: 844,
        pixel_ratio: 3.0,
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148",
        touch: true,
        cpu_slowdown: None,
        network_profile: None,
        description: Some("Current-generation iPhone"),
    },
    DevicePreset {
        id: "pixel_7",
        width: 412,
        height: 915,
        pixel_ratio: 2.625,
        user_agent: "Mozilla/5.0 (Linux; Android 14; Pixel 7) AppleWebKit/537.36 Chrome/120.0 Mobile Safari/537.36",
        touch: true,
        cpu_slowdown: None,
        network_profile: Some("4g"),
        description: Some("Mid-range Android"),
    },
    DevicePreset {
        id: "galaxy_a12",
        width: 360,
        height: 800,
        pixel_ratio: 2.0,
        user_agent: "Mozilla/5.0 (Linux; Android 11; SM-A125F) AppleWebKit/537.36 Chrome/110.0 Mobile Safari/537.36",
        touch: true,
        cpu_slowdown: Some(4),
        network_profile: Some("fast_3g"),
        description: Some("Budget Samsung"),
    },
    DevicePreset {
        id: "low_end_android",
        width: 360,
        height: 640,
        pixel_ratio: 1.5,
        user_agent: "Mozilla/5.0 (Linux; Android 8.1; Go Edition) AppleWebKit/537.36 Chrome/90.0 Mobile Safari/537.36",
        touch: true,
        cpu_slowdown: Some(6),
        network_profile: Some("slow_3g"),
        description: Some("Android Go handset on a poor connection"),
    },
    DevicePreset {
        id: "ipad_air",
        width: 820,
        height: 1180,
        pixel_ratio: 2.0,
        user_agent: "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148",
        touch: true,
        cpu_slowdown: None,
        network_profile: None,
        description: None,
    },
    DevicePreset {
        id: "desktop_1080p",
        width: 1920,
        height: 1080,
        pixel_ratio: 1.0,
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36",
        touch: false,
        cpu_slowdown: None,
        network_profile: Some("broadband"),
        description: None,
    },
];

/// Every device preset.
pub fn device_presets() -> &'static [DevicePreset] {
    &PRESETS
}

/// Look up a preset by id.
pub fn device_preset(id: &str) -> Result<&'static DevicePreset, DeviceError> {
    PRESETS
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| DeviceError::UnknownPreset(id.to_string()))
}

/// Emulate `preset` on the host.
///
/// The viewport seen before the first apply is kept, so applying several
/// presets in a row still resets to the real original. A refused resize is
/// reported as a warning and the remaining characteristics are applied; the
/// environment then records the viewport actually in effect.
pub fn apply_device_preset(host: &Host, preset: &DevicePreset) {
    let refused = {
        let mut inner = host.lock();
        if inner.original_viewport.is_none() {
            inner.original_viewport = Some(inner.viewport.clone());
        }

        let refused = Host::resize(&mut inner, preset.width, preset.height).err();
        inner.viewport.pixel_ratio = preset.pixel_ratio;
        inner.viewport.user_agent = preset.user_agent.to_string();
        inner.viewport.touch = preset.touch;
        inner.viewport.hover = !preset.touch;

        if preset.touch {
            inner.styles.insert(
                TOUCH_ONLY_STYLE.into(),
                "@media (pointer: coarse) { :root { --pointer: coarse; } }".into(),
            );
            inner.styles.insert(
                NO_HOVER_STYLE.into(),
                "@media (hover: none) { *:hover { transition: none; } }".into(),
            );
        } else {
            inner.styles.remove(TOUCH_ONLY_STYLE);
            inner.styles.remove(NO_HOVER_STYLE);
        }

        inner.env.device = Some(preset.id.to_string());
        inner.env.viewport = Some(ViewportSize {
            width: inner.viewport.width,
            height: inner.viewport.height,
        });
        inner.env.cpu_slowdown = preset.cpu_slowdown;
        refused
    };

    match refused {
        Some(err) => host.warn(format!("Device {}: {err}; continuing", preset.id)),
        None => tracing::debug!(device = preset.id, "Device preset applied"),
    }
}

/// Wipe storage as if the app launched for the first time.
///
/// The wiped contents are restored by [`reset_device`].
pub fn simulate_cold_start(host: &Host) {
    let mut inner = host.lock();
    if inner.saved_storage.is_none() {
        inner.saved_storage = Some(std::mem::take(&mut inner.storage));
    } else {
        inner.storage.clear();
    }
    inner.env.cold_start = true;
}

/// Make every storage read and write fail.
pub fn simulate_storage_broken(host: &Host) {
    host.lock().env.storage_broken = true;
}

/// Undo every device perturbation.
///
/// Everything except the viewport size is always restored. If the host
/// refuses to resize back, the original is kept so a later reset can retry.
pub fn reset_device(host: &Host) -> Result<(), DeviceError> {
    let mut inner = host.lock();

    inner.styles.remove(TOUCH_ONLY_STYLE);
    inner.styles.remove(NO_HOVER_STYLE);
    if let Some(saved) = inner.saved_storage.take() {
        inner.storage = saved;
    }
    inner.env.device = None;
    inner.env.viewport = None;
    inner.env.cpu_slowdown = None;
    inner.env.cold_start = false;
    inner.env.storage_broken = false;

    let Some(original) = inner.original_viewport.clone() else {
        return Ok(());
    };
    inner.viewport.pixel_ratio = original.pixel_ratio;
    inner.viewport.user_agent = original.user_agent.clone();
    inner.viewport.touch = original.touch;
    inner.viewport.hover = original.hover;

    Host::resize(&mut inner, original.width, original.height)
        .map_err(DeviceError::RestoreRefused)?;
    inner.original_viewport = None;
    Ok(())
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
    fn catalog_lookup() {
        let se = device_preset("iphone_se").unwrap();
        assert_eq!((se.width, se.height, se.pixel_ratio), (375, 667, 2.0));
        assert!(se.touch);
        assert_eq!(
            device_preset("nokia_3310"),
            Err(DeviceError::UnknownPreset("nokia_3310".into()))
        );

        let ids: std::collections::HashSet<_> = device_presets().iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), device_presets().len());
    }

    #[test]
    fn apply_sets_viewport_and_markers() {
        let host = host();
        apply_device_preset(&host, device_preset("low_end_android").unwrap());

        let viewport = host.viewport();
        assert_eq!((viewport.width, viewport.height), (360, 640));
        assert!(viewport.touch);
        assert!(!viewport.hover);
        assert!(host.has_style(TOUCH_ONLY_STYLE));
        assert!(host.has_style(NO_HOVER_STYLE));

        let env = host.environment();
        assert_eq!(env.device.as_deref(), Some("low_end_android"));
        assert_eq!(env.cpu_slowdown, Some(6));
    }

    #[test]
    fn reset_is_idempotent_for_every_preset() {
        for preset in device_presets() {
            let host = host();
            host.storage_set("k", "v").unwrap();
            let before = host.snapshot();

            apply_device_preset(&host, preset);
            reset_device(&host).unwrap();
            assert_eq!(host.snapshot(), before, "{}", preset.id);
        }
    }

    #[test]
    fn repeated_apply_keeps_true_original() {
        let host = host();
        let before = host.snapshot();

        apply_device_preset(&host, device_preset("iphone_se").unwrap());
        apply_device_preset(&host, device_preset("desktop_1080p").unwrap());
        apply_device_preset(&host, device_preset("pixel_7").unwrap());
        reset_device(&host).unwrap();

        assert_eq!(host.snapshot(), before);
    }

    #[test]
    fn refused_resize_is_not_fatal() {
        let host = host();
        host.set_resize_allowed(false);
        apply_device_preset(&host, device_preset("iphone_se").unwrap());

        let viewport = host.viewport();
        assert_eq!(viewport.width, 1280);
        assert!(viewport.touch);
        assert!(host.has_style(TOUCH_ONLY_STYLE));
        assert_eq!(
            host.environment().viewport,
            Some(ViewportSize {
                width: 1280,
                height: 800
            })
        );
    }

    #[test]
    fn refused_restore_is_reported_and_retryable() {
        let host = host();
        let before = host.snapshot();
        apply_device_preset(&host, device_preset("iphone_se").unwrap());

        host.set_resize_allowed(false);
        assert!(matches!(
            reset_device(&host),
            Err(DeviceError::RestoreRefused(_))
        ));
        assert!(!host.has_style(TOUCH_ONLY_STYLE));

        host.set_resize_allowed(true);
        reset_device(&host).unwrap();
        assert_eq!(host.snapshot(), before);
    }

    #[test]
    fn cold_start_wipes_and_reset_restores_storage() {
        let host = host();
        host.storage_set("room:a", "{}").unwrap();

        simulate_cold_start(&host);
        assert_eq!(host.storage_len(), 0);
        assert!(host.environment().cold_start);

        host.storage_set("room:b", "{}").unwrap();
        simulate_cold_start(&host);
        assert_eq!(host.storage_len(), 0);

        reset_device(&host).unwrap();
        assert_eq!(host.storage_get("room:a").unwrap().as_deref(), Some("{}"));
        assert_eq!(host.storage_len(), 1);
    }

    #[test]
    fn broken_storage_until_reset() {
        let host = host();
        simulate_storage_broken(&host);
        assert!(host.storage_set("k", "v").is_err());
        reset_device(&host).unwrap();
        assert!(host.storage_set("k", "v").is_ok());
    }
}
