use super::runner::Sample;

// ---------------------------------------------------------------------------
// Simulation events
// ---------------------------------------------------------------------------

/// Kinds of simulation events.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Apoapsis,
    Periapsis,
    Elevation { elevation: f64, ascending: bool },
    Impact,
}

/// A discrete event that occurred during simulation, stamped with the first
/// sample past it.
#[derive(Debug, Clone)]
pub struct SimEvent {
    pub time: f64,
    pub kind: EventKind,
    pub sample: Sample,
}

/// Trait for passive event detectors.
/// Implementations inspect consecutive samples and report events.
pub trait EventDetector {
    fn check(&mut self, prev: &Sample, current: &Sample) -> Option<EventKind>;
}

/// Detects apoapsis passage (radial velocity going from positive to non-positive).
pub struct ApoapsisDetector;

impl EventDetector for ApoapsisDetector {
    fn check(&mut self, prev: &Sample, current: &Sample) -> Option<EventKind> {
        if prev.radial_velocity() > 0.0 && current.radial_velocity() <= 0.0 {
            Some(EventKind::Apoapsis)
        } else {
            None
        }
    }
}

/// Detects periapsis passage (radial velocity going from negative to non-negative).
pub struct PeriapsisDetector;

impl EventDetector for PeriapsisDetector {
    fn check(&mut self, prev: &Sample, current: &Sample) -> Option<EventKind> {
        if prev.radial_velocity() < 0.0 && current.radial_velocity() >= 0.0 {
            Some(EventKind::Periapsis)
        } else {
            None
        }
    }
}

/// Detects when elevation crosses a threshold (ascending or descending).
/// Fires once.
pub struct ElevationDetector {
    pub elevation: f64,
    pub ascending: bool,
    fired: bool,
}

impl ElevationDetector {
    pub fn new(elevation: f64, ascending: bool) -> Self {
        Self { elevation, ascending, fired: false }
    }
}

impl EventDetector for ElevationDetector {
    fn check(&mut self, prev: &Sample, current: &Sample) -> Option<EventKind> {
        if self.fired {
            return None;
        }
        let crossed = if self.ascending {
            prev.elevation < self.elevation && current.elevation >= self.elevation
        } else {
            prev.elevation > self.elevation && current.elevation <= self.elevation
        };
        if crossed {
            self.fired = true;
            Some(EventKind::Elevation {
                elevation: self.elevation,
                ascending: self.ascending,
            })
        } else {
            None
        }
    }
}
