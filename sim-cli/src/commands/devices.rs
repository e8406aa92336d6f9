//! List device presets and network profiles.

use sim_env::{device_presets, network_profiles};

/// Run the devices command.
pub fn run() {
    println!("=== Device presets ===");
    println!();
    for preset in device_presets() {
        let cpu = preset
            .cpu_slowdown
            .map(|s| format!("{s}x CPU"))
            .unwrap_or_else(|| "native CPU".into());
        println!(
            "  {:<16} {:>4}x{:<4} @{:<5} {:<6} {:<10} {}",
            preset.id,
            preset.width,
            preset.height,
            preset.pixel_ratio,
            if preset.touch { "touch" } else { "mouse" },
            cpu,
            preset.network_profile.unwrap_or("-"),
        );
    }

    println!();
    println!("=== Network profiles ===");
    println!();
    for profile in network_profiles() {
        println!("  {:<10} {}", profile.id, profile.description);
    }
}
