// IntSar-3D camera demo: orbit a camera around a unit cube and print where its corners land

use std::process::ExitCode;

use glam::{DVec2, DVec3};
use intsar_camera::{Camera, CameraData, CameraUniform, Property};

const RESOLUTION: DVec2 = DVec2::new(640.0, 480.0);
const ORBIT_STEPS: usize = 8;

fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> intsar_camera::Result<()> {
    let mut camera = Camera::new();
    camera.set_location(DVec3::new(0.0, 1.5, 6.0), false)?;
    camera.set_target_point(DVec3::ZERO, true)?;

    // Optional camera description, e.g. '{"focal": 35.0, "orthographic": true}'
    if let Some(json) = std::env::args().nth(1) {
        let changes = camera.set_from_data(&CameraData::from_json(&json)?)?;
        changes.notify(&camera, &mut |_: &Camera, property: Property| {
            log::info!("camera description set {property}");
        });
    }

    let corners: Vec<DVec3> = (0..8)
        .map(|i| {
            DVec3::new(
                if i & 1 == 0 { -0.5 } else { 0.5 },
                if i & 2 == 0 { -0.5 } else { 0.5 },
                if i & 4 == 0 { -0.5 } else { 0.5 },
            )
        })
        .collect();

    let step = std::f64::consts::TAU / ORBIT_STEPS as f64;
    for frame in 0..ORBIT_STEPS {
        let uniform = CameraUniform::from_camera(&camera, RESOLUTION.x / RESOLUTION.y)?;
        log::info!(
            "frame {frame}: camera at {} looking along {} ({} uniform bytes)",
            camera.location(),
            camera.direction(),
            uniform.as_bytes().len()
        );

        for corner in &corners {
            let pixel = camera.project_point_to_pixel(*corner, RESOLUTION, None);
            println!(
                "{frame} {:5.1} {:5.1} {:5.1} -> {:8.2} {:8.2} {:8.3}",
                corner.x, corner.y, corner.z, pixel.x, pixel.y, pixel.z
            );
        }

        camera.orbit(step, 0.0, None)?;
    }

    Ok(())
}
