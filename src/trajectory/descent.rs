//! Backward integration of one route segment in fixed time steps.
//!
//! The stepper starts at the later (lower) point of a segment and flies backwards
//! towards the earlier point, climbing in reverse at the type's descent rate and
//! easing IAS towards the target for that segment.
use crate::navigation::LatLng;
use crate::performance::AircraftPerformance;
use crate::speed;
use crate::weather::{AmbientConditions, VerticalWeatherProfile, WindVector};

/// Integration step length in seconds
pub const STEP_SECS: i64 = 10;

/// Maximum IAS change per second (kt/s)
const SPEED_CHANGE_RATE: f64 = 0.5;

/// Maximum TAS change between consecutive steps (kt)
const MAX_TAS_CHANGE: i32 = 10;

/// Speed limit applied to target speeds below FL100
const LOW_ALTITUDE_SPEED_LIMIT: i32 = 250;
const LOW_ALTITUDE_CEILING_FT: i32 = 10_000;

/// Probe state carried between steps and across segments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeState {
    pub position: LatLng,
    pub altitude_ft: i32,
    pub ias_kts: i32,
    pub tas_kts: i32,
}

/// One emitted integration step
#[derive(Debug, Clone, PartialEq)]
pub struct DescentStep {
    pub position: LatLng,
    pub altitude_ft: i32,
    pub ias_kts: i32,
    pub tas_kts: i32,
    pub groundspeed_kts: i32,
    pub wind: WindVector,
    /// Direction of flight (towards the previous probe position)
    pub heading_deg: i32,
    pub distance_nm: f64,
    pub duration_secs: i64,
    /// Set on the step that reaches the segment's earlier point
    pub reached_target: bool,
}

/// Static inputs shared by every segment of one prediction
#[derive(Debug, Clone, Copy)]
pub struct DescentContext<'a> {
    pub performance: &'a AircraftPerformance,
    pub weather: Option<&'a VerticalWeatherProfile>,
    pub filed_tas: Option<i32>,
}

/// Iterator over the backward steps of a single segment
pub struct DescentStepper<'a> {
    context: DescentContext<'a>,
    target: LatLng,
    target_altitude_ft: i32,
    target_ias: Option<i32>,
    state: ProbeState,
    finished: bool,
}

impl<'a> DescentStepper<'a> {
    pub fn new(
        context: DescentContext<'a>,
        state: ProbeState,
        target: LatLng,
        target_altitude_ft: i32,
        target_ias: Option<i32>,
    ) -> Self {
        Self {
            context,
            target,
            target_altitude_ft,
            target_ias,
            state,
            finished: false,
        }
    }

    /// Probe state after the last emitted step
    pub fn state(&self) -> ProbeState {
        self.state
    }

    fn step_target_ias(&self, temperature_c: i32) -> i32 {
        let altitude = self.state.altitude_ft;
        let target = self.target_ias.unwrap_or_else(|| {
            self.context
                .performance
                .preferred_ias(altitude, Some(temperature_c), self.context.filed_tas)
        });
        if altitude < LOW_ALTITUDE_CEILING_FT {
            target.min(LOW_ALTITUDE_SPEED_LIMIT)
        } else {
            target
        }
    }
}

impl Iterator for DescentStepper<'_> {
    type Item = DescentStep;

    fn next(&mut self) -> Option<DescentStep> {
        if self.finished {
            return None;
        }

        let conditions = AmbientConditions::at(self.context.weather, self.state.altitude_ft);

        let max_change = (STEP_SECS as f64 * SPEED_CHANGE_RATE).round() as i32;
        let target_ias = self.step_target_ias(conditions.temperature_c);
        let mut ias_change = (target_ias - self.state.ias_kts).clamp(-max_change, max_change);
        let mut tas = speed::ias_to_tas(
            self.state.ias_kts + ias_change,
            self.state.altitude_ft,
            conditions.temperature_c,
        );
        // Keep the TAS step within limits at altitude
        while ias_change != 0 && (tas - self.state.tas_kts).abs() > MAX_TAS_CHANGE {
            ias_change -= ias_change.signum();
            tas = speed::ias_to_tas(
                self.state.ias_kts + ias_change,
                self.state.altitude_ft,
                conditions.temperature_c,
            );
        }
        let ias = self.state.ias_kts + ias_change;

        let track = self.target.bearing_to(&self.state.position);
        // Never let a headwind stall the probe
        let groundspeed = speed::tas_to_gs(tas, conditions.wind, track).max(1);

        let step_nm = groundspeed as f64 * STEP_SECS as f64 / 3600.0;
        let remaining_nm = self.state.position.distance_to(&self.target);

        let rate_fpm = self.context.performance.descent_rate_fpm(self.state.altitude_ft);
        let climbed = self.state.altitude_ft + (rate_fpm as f64 / 60.0 * STEP_SECS as f64) as i32;
        // Altitude never decreases going backwards, and stops at the segment target
        let altitude_ft = self
            .state
            .altitude_ft
            .max(climbed.min(self.target_altitude_ft));

        let (position, distance_nm, duration_secs) = if step_nm >= remaining_nm {
            self.finished = true;
            let duration = (remaining_nm / groundspeed as f64 * 3600.0).round() as i64;
            (self.target, remaining_nm, duration)
        } else {
            (
                self.state.position.interpolate_towards(&self.target, step_nm),
                step_nm,
                STEP_SECS,
            )
        };

        let heading_deg = position.bearing_to(&self.state.position);

        self.state = ProbeState {
            position,
            altitude_ft,
            ias_kts: ias,
            tas_kts: tas,
        };

        Some(DescentStep {
            position,
            altitude_ft,
            ias_kts: ias,
            tas_kts: tas,
            groundspeed_kts: groundspeed,
            wind: conditions.wind,
            heading_deg,
            distance_nm,
            duration_secs,
            reached_target: self.finished,
        })
    }
}
