use gnc_sim::sim::{
    simulate_with, ApoapsisDetector, EventDetector, EventKind, PeriapsisDetector, SimConfig,
};
use gnc_sim::{Coordinates, Elliptical, GravityModel, OrbitPlane, Planet, PointMassIntegrator};
use nalgebra::Vector3;

fn main() -> Result<(), gnc_sim::GncError> {
    env_logger::init();

    let earth = Planet::earth();
    let mu = earth.gravitational_parameter();

    // 300 x 1200 km, ISS inclination
    let orbit = Elliptical::new(earth.semi_major_axis + 1_200e3, earth.semi_major_axis + 300e3)?;
    let plane = OrbitPlane {
        inclination: 51.6_f64.to_radians(),
        raan: 40_f64.to_radians(),
        arg_periapsis: 90_f64.to_radians(),
    };
    let (pos, vel) = orbit.state_vector(mu, &plane, 0.0);
    let period = orbit.period(mu);

    println!("=== Elliptical LEO (oblate Earth) ===\n");
    println!("Apoapsis:  {:.1} km", (orbit.apoapsis() - earth.semi_major_axis) / 1e3);
    println!("Periapsis: {:.1} km", (orbit.periapsis() - earth.semi_major_axis) / 1e3);
    println!("e = {:.5}, period {:.1} min", orbit.eccentricity(), period / 60.0);
    println!(
        "Apoapsis expected {:.1} s after periapsis",
        orbit.elapsed_since_periapsis(mu, std::f64::consts::PI)
    );
    println!();

    let coords = Coordinates::from_inertial(earth, GravityModel::Oblate, &pos, 0.0);
    let mut integrator = PointMassIntegrator::new(coords, 0.0, pos, vel);
    let config = SimConfig {
        dt: 10.0,
        max_time: 3.0 * period,
        ground_elevation: Some(0.0),
    };
    let mut detectors: Vec<Box<dyn EventDetector>> =
        vec![Box::new(ApoapsisDetector), Box::new(PeriapsisDetector)];
    let (trajectory, events) =
        simulate_with(&mut integrator, &config, &mut |_| Vector3::zeros(), &mut detectors)?;

    for event in &events {
        let (lon, lat) = (event.sample.longitude.to_degrees(), event.sample.latitude.to_degrees());
        let label = match event.kind {
            EventKind::Apoapsis => "APOAPSIS ",
            EventKind::Periapsis => "PERIAPSIS",
            EventKind::Impact => "IMPACT   ",
            EventKind::Elevation { .. } => "ELEVATION",
        };
        println!(
            "  {label} t={:>8.1}s  alt={:>7.1} km  lon={:>7.2}  lat={:>6.2}",
            event.time,
            event.sample.elevation / 1e3,
            lon,
            lat
        );
    }

    // J2 drags the node westwards on prograde orbits.
    let end = integrator.state();
    let (_, end_plane, _) = Elliptical::from_state_vector(mu, &end.position, &end.velocity)?;
    println!();
    println!(
        "RAAN after {} samples: {:.4} deg (start {:.4} deg)",
        trajectory.len(),
        end_plane.raan.to_degrees(),
        plane.raan.to_degrees()
    );
    Ok(())
}
