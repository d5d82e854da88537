//! Shared fixtures for integration tests: Oslo Gardermoen runway 19L, its
//! three northern STARs, performance data and recorded arrivals.
#![allow(dead_code)]

use std::collections::HashMap;

use aman::arrivals::ArrivalSnapshot;
use aman::navdata::{Airport, RunwayThreshold, Star, StarFix, Waypoint};
use aman::navigation::{AircraftPosition, LatLng};
use aman::performance::{AircraftPerformance, PerformanceCatalog, WakeCategory};
use chrono::{DateTime, TimeZone, Utc};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn star_fix(id: &str, altitude: Option<i32>, speed: Option<i32>) -> StarFix {
    StarFix {
        id: id.to_string(),
        typical_altitude_ft: altitude,
        typical_speed_ias: speed,
    }
}

fn star(id: &str, entry: &str, second: &str, second_altitude: i32, third: &str) -> Star {
    Star {
        id: id.to_string(),
        runway: "19L".to_string(),
        fixes: vec![
            star_fix(entry, None, Some(250)),
            star_fix(second, Some(second_altitude), Some(220)),
            star_fix(third, Some(5000), Some(200)),
            star_fix("OSPAD", Some(4000), Some(180)),
            star_fix("XIVTA", Some(3500), Some(170)),
            star_fix("ENGM", Some(700), None),
        ],
    }
}

pub fn eseba4m() -> Star {
    star("ESEBA4M", "ESEBA", "GM422", 10_000, "TITLA")
}

pub fn adopi3m() -> Star {
    star("ADOPI3M", "ADOPI", "GM428", 10_000, "BAVAD")
}

pub fn inrex4m() -> Star {
    star("INREX4M", "INREX", "GM418", 11_000, "TITLA")
}

pub fn runway_19l() -> RunwayThreshold {
    RunwayThreshold {
        id: "19L".to_string(),
        position: LatLng::new(60.20116653568569, 11.12244616482607),
        elevation_ft: 681.0,
        true_heading_deg: 194.0,
    }
}

pub fn engm() -> Airport {
    Airport {
        icao: "ENGM".to_string(),
        location: LatLng::new(60.202778, 11.083889),
        runways: vec![runway_19l()],
        stars: vec![inrex4m(), eseba4m(), adopi3m()],
    }
}

pub fn b738() -> AircraftPerformance {
    AircraftPerformance {
        wake_category: WakeCategory::Medium,
        initial_climb_ias: Some(165),
        cruise_tas: 460,
        cruise_mach: Some(0.79),
        initial_descent_mach: Some(0.78),
        initial_descent_rod: Some(800),
        descent_ias: 280,
        descent_rod: Some(3500),
        approach_ias: 250,
        approach_rod: Some(1500),
        landing_vat: 147,
    }
}

pub fn a320() -> AircraftPerformance {
    AircraftPerformance {
        wake_category: WakeCategory::Medium,
        initial_climb_ias: Some(175),
        cruise_tas: 450,
        cruise_mach: Some(0.79),
        initial_descent_mach: Some(0.78),
        initial_descent_rod: Some(1000),
        descent_ias: 290,
        descent_rod: Some(3500),
        approach_ias: 250,
        approach_rod: Some(1500),
        landing_vat: 137,
    }
}

pub fn b77l() -> AircraftPerformance {
    AircraftPerformance {
        wake_category: WakeCategory::Heavy,
        initial_climb_ias: Some(200),
        cruise_tas: 490,
        cruise_mach: Some(0.84),
        initial_descent_mach: Some(0.84),
        initial_descent_rod: Some(1000),
        descent_ias: 290,
        descent_rod: Some(3000),
        approach_ias: 250,
        approach_rod: Some(1500),
        landing_vat: 149,
    }
}

pub fn catalog() -> PerformanceCatalog {
    let mut types = HashMap::new();
    types.insert("B738".to_string(), b738());
    types.insert("A320".to_string(), a320());
    types.insert("A20N".to_string(), a320());
    types.insert("B77L".to_string(), b77l());
    PerformanceCatalog::new(types)
}

fn fix(id: &str, lat: f64, lon: f64, is_passed: bool, is_on_star: bool) -> Waypoint {
    Waypoint {
        id: id.to_string(),
        position: LatLng::new(lat, lon),
        is_passed,
        is_on_star,
    }
}

/// A20N at FL380 north of Trondheim on the INREX4M
pub fn sas4411(timestamp: DateTime<Utc>) -> ArrivalSnapshot {
    ArrivalSnapshot {
        callsign: "SAS4411".to_string(),
        aircraft_type: "A20N".to_string(),
        arrival_airport: "ENGM".to_string(),
        position: AircraftPosition {
            position: LatLng::new(62.09387969970703, 11.931380271911621),
            altitude_ft: 38_195,
            groundspeed_kts: 449,
            track_deg: 180,
        },
        assigned_runway: Some("19L".to_string()),
        assigned_star: Some("INREX4M".to_string()),
        assigned_direct: None,
        tracking_controller: None,
        remaining_route: vec![
            fix("ENTC", 69.681389, 18.917778000000002, true, false),
            fix("TC707", 69.57579388888888, 18.847716944444443, true, false),
            fix("IPTUK", 69.33083277777777, 18.486110833333335, true, false),
            fix("KAMPE", 68.89629694444446, 17.955566944444445, true, false),
            fix("AMIMO", 67.875, 16.441388888888888, true, false),
            fix("GUBAV", 65.773333, 13.944721999999999, true, false),
            fix("TUXOT", 63.977582999999996, 12.321442000000001, true, false),
            fix("SOMUB", 63.349166999999994, 11.805000000000001, true, false),
            fix("ABUNO", 62.0, 11.940256, false, false),
            fix("INREX", 61.01388899999999, 12.216667, false, false),
            fix("IXUMA", 60.819027777777784, 11.989721944444444, false, true),
            fix("GM418", 60.65119388888889, 11.7955, false, true),
            fix("TITLA", 60.42136083333333, 11.402721944444444, false, true),
            fix("OSPAD", 60.40099194444444, 11.238730833333333, false, true),
            fix("XIVTA", 60.34008277777778, 11.203132777777776, false, true),
            fix("GME40", 60.26238277777778, 11.157691944444444, false, true),
            fix("ENGM", 60.20277800000001, 11.083889000000001, false, false),
        ],
        filed_tas: Some(450),
        timestamp,
    }
}

/// A320 at FL310 inbound from Stockholm on the ESEBA4M
pub fn ezy9(timestamp: DateTime<Utc>) -> ArrivalSnapshot {
    ArrivalSnapshot {
        callsign: "EZY9".to_string(),
        aircraft_type: "A320".to_string(),
        arrival_airport: "ENGM".to_string(),
        position: AircraftPosition {
            position: LatLng::new(59.77381134033203, 14.915430068969727),
            altitude_ft: 31_476,
            groundspeed_kts: 407,
            track_deg: 280,
        },
        assigned_runway: Some("19L".to_string()),
        assigned_star: Some("ESEBA4M".to_string()),
        assigned_direct: None,
        tracking_controller: None,
        remaining_route: vec![
            fix("ESSA", 59.65194399999999, 17.918611, true, false),
            fix("ARS", 59.586222, 16.650333, true, false),
            fix("BEDLA", 59.628944000000004, 16.225028, true, false),
            fix("IBGAX", 59.72222200000001, 15.395833000000001, true, false),
            fix("EBURI", 59.8, 14.660556000000001, false, false),
            fix("TEKVA", 59.984722, 12.719444000000001, false, false),
            fix("ESEBA", 60.012778000000004, 12.392222, false, false),
            fix("KEGET", 60.08972194444445, 12.254888888888889, false, true),
            fix("GM422", 60.26261083333333, 11.954832777777778, false, true),
            fix("GM423", 60.36525, 12.033749722222222, false, true),
            fix("TITLA", 60.42136083333333, 11.402721944444444, false, true),
            fix("OSPAD", 60.40099194444444, 11.238730833333333, false, true),
            fix("XIVTA", 60.34008277777778, 11.203132777777776, false, true),
            fix("GME40", 60.26238277777778, 11.157691944444444, false, true),
            fix("ENGM", 60.20277800000001, 11.083889000000001, false, false),
        ],
        filed_tas: Some(450),
        timestamp,
    }
}

/// B77L at FL157 west of the field, cleared direct BAVAD on the ADOPI3M
pub fn srr22x(timestamp: DateTime<Utc>) -> ArrivalSnapshot {
    ArrivalSnapshot {
        callsign: "SRR22X".to_string(),
        aircraft_type: "B77L".to_string(),
        arrival_airport: "ENGM".to_string(),
        position: AircraftPosition {
            position: LatLng::new(60.36001968383789, 9.892060279846191),
            altitude_ft: 15_851,
            groundspeed_kts: 402,
            track_deg: 80,
        },
        assigned_runway: Some("19L".to_string()),
        assigned_star: Some("ADOPI3M".to_string()),
        assigned_direct: Some("BAVAD".to_string()),
        tracking_controller: Some("GWR".to_string()),
        remaining_route: vec![
            fix("ADOPI", 60.323611, 9.383333, true, false),
            fix("EXUDA", 60.39744388888889, 9.926332777777777, false, true),
            fix("GM428", 60.46558277777778, 10.442388888888889, false, true),
            fix("GM429", 60.572943888888894, 10.479721944444444, false, true),
            fix("BAVAD", 60.46611083333334, 11.08444388888889, false, true),
            fix("OSPAD", 60.40099194444444, 11.238730833333333, false, true),
            fix("XIVTA", 60.34008277777778, 11.203132777777776, false, true),
            fix("GME40", 60.26238277777778, 11.157691944444444, false, true),
            fix("ENGM", 60.20277800000001, 11.083889000000001, false, false),
        ],
        filed_tas: None,
        timestamp,
    }
}

/// Aircraft on a straight-in to 19L from due north, `distance_deg` degrees of latitude out
pub fn straight_in(
    callsign: &str,
    aircraft_type: &str,
    distance_deg: f64,
    altitude_ft: i32,
    timestamp: DateTime<Utc>,
) -> ArrivalSnapshot {
    let runway = runway_19l();
    ArrivalSnapshot {
        callsign: callsign.to_string(),
        aircraft_type: aircraft_type.to_string(),
        arrival_airport: "ENGM".to_string(),
        position: AircraftPosition {
            position: LatLng::new(runway.position.lat + distance_deg, runway.position.lon + 0.05),
            altitude_ft,
            groundspeed_kts: 280,
            track_deg: 194,
        },
        assigned_runway: Some("19L".to_string()),
        assigned_star: None,
        assigned_direct: None,
        tracking_controller: None,
        remaining_route: vec![fix(
            "ENGM",
            60.20277800000001,
            11.083889000000001,
            false,
            false,
        )],
        filed_tas: None,
        timestamp,
    }
}
