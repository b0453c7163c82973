use fip_rig_model::geometry::Circle;
use fip_rig_model::light_source::PowerLut;
use proptest::prelude::*;

proptest! {
    #[test]
    fn clipped_bounding_box_holds_every_disk_pixel(
        x in -20.0f64..60.0,
        y in -20.0f64..60.0,
        r in 0.0f64..15.0,
        width in 1usize..48,
        height in 1usize..48,
    ) {
        let circle = Circle::new(x, y, r);
        let rect = circle.bounding_box().clip_to(width, height);
        for py in 0..height as i64 {
            for px in 0..width as i64 {
                if circle.contains(px, py) {
                    prop_assert!(px >= rect.x && px < rect.x + rect.width as i64);
                    prop_assert!(py >= rect.y && py < rect.y + rect.height as i64);
                }
            }
        }
    }

    #[test]
    fn calibration_hits_measured_points(steps in prop::collection::vec(0.1f64..5.0, 2..8)) {
        // Strictly increasing powers against evenly spaced duty cycles.
        let mut power = 0.0;
        let points: Vec<(f64, f64)> = steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                power += step;
                (i as f64 * 100.0 / (steps.len() - 1) as f64, power)
            })
            .collect();
        let lut = PowerLut::new(points.clone());

        for (duty, power) in points {
            let solved = lut.duty_cycle_for(power).unwrap();
            prop_assert!((solved - duty).abs() < 1e-9);
        }
    }
}
