//! Create and inspect ROI settings files.

use std::path::PathBuf;

use fip_rig_model::{CameraSource, RoiSettings};

pub fn init(path: PathBuf, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let settings = RoiSettings::default();
    settings
        .save(&path)
        .map_err(|e| anyhow::anyhow!("Failed to write ROI settings: {e}"))?;

    println!("Wrote default ROI settings to {}", path.display());
    print_settings(&settings);
    Ok(())
}

/// Show `explicit` if given (it must exist), else the configured default
/// file or the built-in defaults.
pub fn show(explicit: Option<PathBuf>, default_path: PathBuf) -> anyhow::Result<()> {
    let (settings, path) = match explicit {
        Some(path) => (RoiSettings::load(&path), path),
        None => (RoiSettings::resolve(None, &default_path), default_path),
    };
    let settings = settings.map_err(|e| anyhow::anyhow!("Failed to load ROI settings: {e}"))?;

    if path.exists() {
        println!("ROI settings from {}", path.display());
    } else {
        println!("ROI settings (defaults, {} not found)", path.display());
    }
    print_settings(&settings);
    Ok(())
}

fn print_settings(settings: &RoiSettings) {
    for (label, source) in [("Green/Iso", CameraSource::Green), ("Red", CameraSource::Red)] {
        println!("{label} camera:");
        for (i, circle) in settings.circles_for(source).iter().enumerate() {
            let name = if i == 0 {
                "Background".to_string()
            } else {
                format!("Region{i}")
            };
            println!(
                "  {:<10} center=({:.1}, {:.1}) radius={:.1}",
                name, circle.center.x, circle.center.y, circle.radius
            );
        }
    }
}
