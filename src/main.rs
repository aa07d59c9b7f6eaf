use gnc_sim::frames::{geographic_from_elevation_bearing, Frame, Orientation};
use gnc_sim::physics::atmosphere::{isa, T0_STANDARD};
use gnc_sim::sim::{simulate, SimConfig};
use gnc_sim::{Coordinates, Elliptical, GncError, GravityModel, OrbitPlane, Planet, PointMassIntegrator};
use nalgebra::Vector3;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), GncError> {
    let earth = Planet::earth();
    parabolic_projectile(&earth)?;
    circular_orbit(&earth)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Projectile from Buenos Aires vs. the flat-earth parabola
// ---------------------------------------------------------------------------

fn parabolic_projectile(earth: &Planet) -> Result<(), GncError> {
    let t0 = 0.0;
    let speed = 60.0; // m/s
    let elevation_angle = 45f64.to_radians();
    let dt = 0.001;

    let buenos_aires = Coordinates::from_degrees(
        *earth,
        GravityModel::Spherical,
        -58.4,
        -34.6,
        earth.hasl_to_elevation(25.0),
    )?;

    // Integrate in inertial coordinates to avoid fictitious forces.
    let (s_i0, tgi) = buenos_aires.inertial_position(t0);
    let v_g0 = geographic_from_elevation_bearing(elevation_angle, 0.0, speed);
    let v_i0 = Frame::Geographic.to_inertial(&Orientation::geographic_only(tgi), &v_g0);

    let g = buenos_aires.gravity_g().norm();
    let want_time = 2.0 * speed * elevation_angle.sin() / g;
    let want_range = speed * speed * (2.0 * elevation_angle).sin() / g;

    let mut integrator = PointMassIntegrator::new(buenos_aires, t0, s_i0, v_i0);
    let mut state = integrator.state();
    let mut apex: f64 = 0.0;
    while integrator.coordinates().elevation() >= buenos_aires.elevation() && state.time - t0 < 2.0 * want_time {
        state = integrator.step(dt, &Vector3::zeros())?;
        apex = apex.max(integrator.coordinates().elevation() - buenos_aires.elevation());
    }

    let apex_air = isa(25.0 + apex, T0_STANDARD); // launch site is 25 m above sea level

    println!();
    println!("====================================================================");
    println!("  PARABOLIC PROJECTILE: Buenos Aires, 45 deg, {speed} m/s");
    println!("====================================================================");
    println!("  Flight time:   {:>10.4} s   expected {:>10.4} s  (+/- {dt} s)", state.time - t0, want_time);
    println!(
        "  Range:         {:>10.3} m   expected {:>10.3} m",
        (state.position - s_i0).norm(),
        want_range
    );
    println!("  Apex:          {:>10.3} m   air density {:.4} kg/m^3", apex, apex_air.density);
    println!("  Impact speed:  {:>10.3} m/s", state.speed());
    Ok(())
}

// ---------------------------------------------------------------------------
// Circular LEO: one analytic period, spherical vs. oblate gravity
// ---------------------------------------------------------------------------

fn circular_orbit(earth: &Planet) -> Result<(), GncError> {
    let mu = earth.gravitational_parameter();
    let orbit = Elliptical::circular(earth.semi_major_axis + 400e3)?;
    let plane = OrbitPlane {
        inclination: 51.6f64.to_radians(),
        ..OrbitPlane::default()
    };
    let (pos, vel) = orbit.state_vector(mu, &plane, 0.0);
    let period = orbit.period(mu);

    println!();
    println!("====================================================================");
    println!("  CIRCULAR LEO: r = {:.0} km, period {:.1} min", orbit.apoapsis() / 1e3, period / 60.0);
    println!("====================================================================");
    println!(
        "  {:>10}  {:>12}  {:>14}  {:>12}  {:>8}",
        "model", "closure (m)", "dE/E", "min elev (km)", "samples"
    );
    println!("  {}", "─".repeat(64));

    for model in [GravityModel::Spherical, GravityModel::Oblate] {
        let coords = Coordinates::from_inertial(*earth, model, &pos, 0.0);
        let mut integrator = PointMassIntegrator::new(coords, 0.0, pos, vel);
        let config = SimConfig {
            dt: period / 20.0,
            max_time: period * (1.0 - 1e-9),
            ground_elevation: None,
        };
        let trajectory = simulate(&mut integrator, &config)?;
        let end = integrator.state();
        let e0 = 0.5 * vel.norm_squared() - mu / pos.norm();
        let min_elevation = trajectory.iter().map(|s| s.elevation).fold(f64::INFINITY, f64::min);
        println!(
            "  {:>10}  {:>12.3}  {:>14.3e}  {:>12.1}  {:>8}",
            format!("{model:?}"),
            (end.position - pos).norm(),
            (end.specific_energy(mu) - e0) / e0,
            min_elevation / 1e3,
            trajectory.len()
        );
    }
    println!();
    Ok(())
}
