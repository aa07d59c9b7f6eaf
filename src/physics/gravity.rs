use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Local geographic gravity (North, East, Down)
// ---------------------------------------------------------------------------

/// Inverse-square gravity along the local vertical.
/// `radius` is the distance from the planet centre, m.
pub fn spherical_gravity_g(mu: f64, radius: f64) -> Vector3<f64> {
    Vector3::new(0.0, 0.0, mu / (radius * radius))
}

/// Inverse-square gravity with the second zonal harmonic correction.
///
/// `c20` is un-normalised (-J2), `equatorial_radius` the planet semi-major
/// axis and `latitude` geocentric. Reduces exactly to
/// [`spherical_gravity_g`] when `c20 == 0`.
pub fn oblate_gravity_g(
    mu: f64,
    radius: f64,
    equatorial_radius: f64,
    c20: f64,
    latitude: f64,
) -> Vector3<f64> {
    let g = mu / (radius * radius);
    let ratio = equatorial_radius / radius;
    let ratio2 = ratio * ratio;
    let (sin_lat, cos_lat) = latitude.sin_cos();

    let north = 3.0 * g * c20 * ratio2 * sin_lat * cos_lat;
    let down = g * (1.0 + 1.5 * c20 * ratio2 * (3.0 * sin_lat * sin_lat - 1.0));
    Vector3::new(north, 0.0, down)
}

// ---------------------------------------------------------------------------
// Cartesian forms (planet-centred, any non-rotating or earth-fixed frame)
// ---------------------------------------------------------------------------

/// Point-mass gravity acceleration at `pos`.
pub fn gravity_pointmass(pos: &Vector3<f64>, mu: f64) -> Vector3<f64> {
    let r = pos.norm();
    if r < 1.0 {
        return Vector3::zeros();
    }
    -mu / (r * r * r) * pos
}

/// J2 gravity acceleration at `pos`. The polar axis is z.
pub fn gravity_j2(pos: &Vector3<f64>, mu: f64, equatorial_radius: f64, j2: f64) -> Vector3<f64> {
    let r = pos.norm();
    if r < 1.0 {
        return Vector3::zeros();
    }
    let r2 = r * r;
    let z2 = pos.z * pos.z;

    let mu_over_r3 = mu / (r2 * r);
    let j2_coeff = 1.5 * j2 * equatorial_radius * equatorial_radius / r2;

    let xy_factor = mu_over_r3 * (1.0 + j2_coeff * (1.0 - 5.0 * z2 / r2));
    let z_factor = mu_over_r3 * (1.0 + j2_coeff * (3.0 - 5.0 * z2 / r2));

    Vector3::new(-xy_factor * pos.x, -xy_factor * pos.y, -z_factor * pos.z)
}
