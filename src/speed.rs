//! Airspeed conversions.
//!
//! All speeds are whole knots. IAS is treated as equal to CAS. Pressure altitude is
//! taken as the reported altitude.
use crate::weather::WindVector;

/// Sea-level pressure [inHg]
const P0_INHG: f64 = 29.92126;
/// Speed of sound at sea level [kt]
const CS0_KT: f64 = 661.4786;
/// Temperature lapse ratio per foot (T'/T0)
const LAPSE: f64 = 6.8755856e-6;
const PRESSURE_EXPONENT: f64 = 5.2558797;

const KT_PER_MPS: f64 = 1.94384;
const GAMMA: f64 = 1.4;
const GAS_CONSTANT: f64 = 287.05;

fn speed_of_sound_kt(oat_c: i32) -> f64 {
    38.967854 * (oat_c as f64 + 273.15).sqrt()
}

/// Indicated airspeed to true airspeed using the subsonic pitot equation and outside air temperature
pub fn ias_to_tas(ias_kt: i32, pressure_altitude_ft: i32, oat_c: i32) -> i32 {
    let pressure_ratio = 1.0 - LAPSE * pressure_altitude_ft as f64;
    let pressure = P0_INHG * pressure_ratio.powf(PRESSURE_EXPONENT);

    // Impact pressure from IAS
    let impact = P0_INHG * ((1.0 + 0.2 * (ias_kt as f64 / CS0_KT).powi(2)).powf(3.5) - 1.0);

    let mach = (5.0 * ((impact / pressure + 1.0).powf(2.0 / 7.0) - 1.0)).sqrt();

    (mach * speed_of_sound_kt(oat_c)).round() as i32
}

/// True airspeed to indicated airspeed. Supersonic input is clamped to Mach 1.
pub fn tas_to_ias(tas_kt: i32, pressure_altitude_ft: i32, oat_c: i32) -> i32 {
    let mach = (tas_kt as f64 / speed_of_sound_kt(oat_c)).min(1.0);
    let x = (1.0 - LAPSE * pressure_altitude_ft as f64).powf(PRESSURE_EXPONENT);

    let ias = CS0_KT
        * (5.0 * ((1.0 + x * ((1.0 + mach * mach / 5.0).powf(3.5) - 1.0)).powf(2.0 / 7.0) - 1.0))
            .sqrt();
    ias.round() as i32
}

/// Mach number to indicated airspeed at altitude and static air temperature
pub fn mach_to_ias(mach: f64, altitude_ft: i32, sat_c: i32) -> i32 {
    let sat_k = sat_c as f64 + 273.15;
    let speed_of_sound = (GAMMA * GAS_CONSTANT * sat_k).sqrt();
    let tas_kt = mach * speed_of_sound * KT_PER_MPS;
    tas_to_cas(tas_kt, altitude_ft, sat_c).round() as i32
}

/// True airspeed to calibrated airspeed using ISA pressure at altitude
fn tas_to_cas(tas_kt: f64, altitude_ft: i32, sat_c: i32) -> f64 {
    const P0_PA: f64 = 101_325.0;
    const T0_K: f64 = 288.15;
    const LAPSE_K_PER_M: f64 = 0.0065;
    let rho0 = P0_PA / (GAS_CONSTANT * T0_K);

    let tas = tas_kt / KT_PER_MPS;
    let altitude_m = altitude_ft as f64 * 0.3048;
    let temperature_k = sat_c as f64 + 273.15;

    let pressure = P0_PA * (1.0 - (LAPSE_K_PER_M * altitude_m) / T0_K).powf(5.2561);
    let speed_of_sound = (GAMMA * GAS_CONSTANT * temperature_k).sqrt();
    let mach = tas / speed_of_sound;

    let impact = pressure
        * ((1.0 + (GAMMA - 1.0) / 2.0 * mach * mach).powf(GAMMA / (GAMMA - 1.0)) - 1.0);

    let cas = ((2.0 * GAMMA * P0_PA) / ((GAMMA - 1.0) * rho0)
        * ((impact / P0_PA + 1.0).powf((GAMMA - 1.0) / GAMMA) - 1.0))
        .sqrt();

    cas * KT_PER_MPS
}

/// True airspeed to groundspeed along `track_deg` given the wind
pub fn tas_to_gs(tas_kt: i32, wind: WindVector, track_deg: i32) -> i32 {
    let wind_angle = ((wind.direction_deg - track_deg) as f64).to_radians();
    let wind_speed = wind.speed_kts as f64;
    let tas = tas_kt as f64;

    let gs = (tas.powi(2) + wind_speed.powi(2) - 2.0 * tas * wind_speed * wind_angle.cos()).sqrt();
    gs.round() as i32
}

/// Groundspeed along `track_deg` back to true airspeed given the wind.
///
/// Solves `TAS² - 2·TAS·W·cos(θ) + W² - GS² = 0`; without a real root the groundspeed
/// is returned unchanged.
pub fn gs_to_tas(gs_kt: i32, wind: WindVector, track_deg: i32) -> i32 {
    let wind_angle = ((wind.direction_deg - track_deg) as f64).to_radians();
    let wind_speed = wind.speed_kts as f64;
    let gs = gs_kt as f64;

    let b = -2.0 * wind_speed * wind_angle.cos();
    let c = wind_speed.powi(2) - gs.powi(2);
    let discriminant = b * b - 4.0 * c;

    if discriminant < 0.0 {
        return gs_kt;
    }
    ((-b + discriminant.sqrt()) / 2.0).round() as i32
}
