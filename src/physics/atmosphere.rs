// ---------------------------------------------------------------------------
// Standard atmosphere (sea level to 80 km, vacuum above)
// ---------------------------------------------------------------------------

const G_ATM: f64 = 9.79;            // gravity used by the barometric formula, m/s^2
const R_GAS: f64 = 8.314_472;       // universal gas constant, J/(mol·K)
const M_AIR: f64 = 28.97e-3;        // molar mass of air, kg/mol
const GAMMA: f64 = 1.4;             // ratio of specific heats
const HYDROGEN_MASS: f64 = 1.673_557_5e-27; // kg

/// Standard sea-level temperature, K.
pub const T0_STANDARD: f64 = 288.15;

/// Atmospheric properties at a given geometric altitude.
#[derive(Debug, Clone, Copy)]
pub struct Atmo {
    pub density: f64,      // kg/m^3
    pub pressure: f64,     // Pa
    pub temperature: f64,  // K
    pub sound_speed: f64,  // m/s
}

/// Mesosphere pressure/density table, interpolated between 40 and 80 km.
const TABLE_ALTITUDE: [f64; 5] = [40e3, 50e3, 60e3, 70e3, 80e3];
const TABLE_PRESSURE: [f64; 5] = [2.87e2, 7.978e1, 2.196e1, 5.2, 1.1];
const TABLE_DENSITY: [f64; 5] = [3.996e-3, 1.027e-3, 3.996e-4, 8.283e-5, 1.846e-5];

/// Standard atmosphere lookup.
///
/// Layers: troposphere lapse -6.5 K/km below 11 km, isothermal to 25 km,
/// +3 K/km to 47 km, then a linear 270 K to 200 K profile with tabulated
/// pressure and density up to 80 km. Above 80 km returns interplanetary
/// medium values. Pure function of its inputs.
pub fn isa(altitude_m: f64, sea_level_temperature: f64) -> Atmo {
    let h = altitude_m;
    let exponent = |lapse: f64| -G_ATM * M_AIR / (R_GAS * lapse);

    let (temperature, pressure, density) = if h > 80_000.0 {
        // ~4 hydrogen atoms per cm^3
        (178.0, 1.322e-11, 4.0 * HYDROGEN_MASS * 1e6)
    } else if h < 11_000.0 {
        // Troposphere
        let lapse = -6.5e-3;
        let t = sea_level_temperature + lapse * h;
        let ratio = t / sea_level_temperature;
        (t, 101_325.0 * ratio.powf(exponent(lapse)), 1.225 * ratio.powf(exponent(lapse) - 1.0))
    } else if h < 25_000.0 {
        // Tropopause / lower stratosphere: isothermal
        let t = 216.65;
        let decay = (-G_ATM * M_AIR * (h - 11_000.0) / (R_GAS * t)).exp();
        (t, 22_552.0 * decay, 0.3629 * decay)
    } else if h < 47_000.0 {
        // Upper stratosphere: +3 K/km
        let lapse = 3e-3;
        let t_base = 216.65;
        let t = t_base + lapse * (h - 25_000.0);
        let ratio = t / t_base;
        (t, 2_481.0 * ratio.powf(exponent(lapse)), 0.0399 * ratio.powf(exponent(lapse) - 1.0))
    } else {
        // Mesosphere
        let t_base = 270.0;
        let lapse = (200.0 - t_base) / (80_000.0 - 47_000.0);
        let t = t_base + lapse * (h - 47_000.0);
        let (p, rho) = mesosphere_table(h);
        (t, p, rho)
    };

    Atmo {
        density,
        pressure,
        temperature,
        sound_speed: (GAMMA * R_GAS / M_AIR * temperature).sqrt(),
    }
}

/// Linear interpolation in the mesosphere table.
fn mesosphere_table(h: f64) -> (f64, f64) {
    let last = TABLE_ALTITUDE.len() - 1;
    let upper = TABLE_ALTITUDE.partition_point(|&alt| alt <= h);
    if upper > last {
        return (TABLE_PRESSURE[last], TABLE_DENSITY[last]);
    }
    let i = upper.saturating_sub(1);
    let frac = (h - TABLE_ALTITUDE[i]) / (TABLE_ALTITUDE[i + 1] - TABLE_ALTITUDE[i]);
    (
        lerp(TABLE_PRESSURE[i], TABLE_PRESSURE[i + 1], frac),
        lerp(TABLE_DENSITY[i], TABLE_DENSITY[i + 1], frac),
    )
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sea_level_standard_values() {
        let a = isa(0.0, T0_STANDARD);
        assert!((a.temperature - 288.15).abs() < 0.01);
        assert!((a.pressure - 101_325.0).abs() < 1.0);
        assert!((a.density - 1.225).abs() < 0.001);
        assert!((a.sound_speed - 340.3).abs() < 0.5);
    }

    #[test]
    fn tropopause_is_continuous() {
        let below = isa(10_999.0, T0_STANDARD);
        let above = isa(11_001.0, T0_STANDARD);
        assert!((below.temperature - above.temperature).abs() < 0.1);
        assert!((below.pressure - above.pressure).abs() / above.pressure < 0.02);
    }

    #[test]
    fn density_monotonically_decreases() {
        let rho: Vec<f64> = [0.0, 10e3, 20e3, 30e3, 50e3, 65e3, 79e3, 90e3]
            .iter()
            .map(|&h| isa(h, T0_STANDARD).density)
            .collect();
        for pair in rho.windows(2) {
            assert!(pair[0] > pair[1], "{:?}", rho);
        }
        assert!(rho[rho.len() - 1] > 0.0);
    }

    #[test]
    fn mesosphere_hits_table_nodes() {
        let a = isa(60_000.0, T0_STANDARD);
        assert!((a.pressure - 21.96).abs() < 1e-9);
        assert!((a.density - 3.996e-4).abs() < 1e-12);
        let top = isa(80_000.0, T0_STANDARD);
        assert!((top.pressure - 1.1).abs() < 1e-9);
        assert!((top.temperature - 200.0).abs() < 1e-9);
    }

    #[test]
    fn near_vacuum_above_80km() {
        let a = isa(100_000.0, T0_STANDARD);
        assert!(a.density < 1e-15);
        assert!(a.pressure < 1e-9);
    }

    #[test]
    fn warmer_sea_level_shifts_troposphere() {
        let cold = isa(5_000.0, 280.0);
        let warm = isa(5_000.0, 300.0);
        assert!(warm.temperature > cold.temperature);
    }
}
