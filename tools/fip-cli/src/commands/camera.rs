//! Print a camera's acquisition plan.

use fip_rig_model::{CameraValue, FipCamera, Point2f};

pub fn run(serial: String, gain: f64, offset_x: f64, offset_y: f64, json: bool) -> anyhow::Result<()> {
    let camera = FipCamera {
        serial_number: serial,
        gain,
        offset: Point2f::new(offset_x, offset_y),
    };
    let plan = camera
        .acquisition_plan()
        .map_err(|e| anyhow::anyhow!("Invalid camera settings: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Camera {}:", camera.serial_number);
    for setting in &plan {
        let value = match &setting.value {
            CameraValue::Bool(v) => v.to_string(),
            CameraValue::Int(v) => v.to_string(),
            CameraValue::Float(v) => v.to_string(),
            CameraValue::Enum(v) => v.clone(),
            CameraValue::Min => "<min>".to_string(),
            CameraValue::Max => "<max>".to_string(),
        };
        println!("  {:<28} {}", setting.node, value);
    }
    Ok(())
}
