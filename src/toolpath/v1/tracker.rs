//! Kinematic and statistics tracking
//!
//! Derives travel distance, time cost, bounding extents, and filament usage
//! purely by observing the command stream. Observation happens before
//! encoding, so wire payloads carry the caller's raw values while the
//! statistics reflect accumulated effects.

use super::constants::{
    DEFAULT_HOME_X, DEFAULT_HOME_Y, DEFAULT_HOME_Z, FLAG_HAS_E0, FLAG_HAS_E1, FLAG_HAS_E2,
    FLAG_HAS_FEEDRATE, FLAG_HAS_X, FLAG_HAS_Y, FLAG_HAS_Z,
};
use super::encoder::Diagnostic;

/// Machine state and derived job statistics
#[derive(Debug, Clone)]
pub struct KinematicState {
    x: f32,
    y: f32,
    z: f32,
    home_x: f32,
    home_y: f32,
    home_z: f32,
    feedrate: f32,
    traveled: f64,
    time_cost: f64,
    max_x: f32,
    max_y: f32,
    max_z: f32,
    max_r: f32,
    filament: [f32; 3],
}

impl Default for KinematicState {
    fn default() -> Self {
        KinematicState {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            home_x: DEFAULT_HOME_X,
            home_y: DEFAULT_HOME_Y,
            home_z: DEFAULT_HOME_Z,
            feedrate: 0.0,
            traveled: 0.0,
            time_cost: 0.0,
            max_x: 0.0,
            max_y: 0.0,
            max_z: 0.0,
            max_r: 0.0,
            filament: [0.0; 3],
        }
    }
}

impl KinematicState {
    /// Current position
    pub fn position(&self) -> (f32, f32, f32) {
        (self.x, self.y, self.z)
    }

    /// Cumulative 3-D travel distance over positional moves
    pub fn traveled(&self) -> f64 {
        self.traveled
    }

    /// Estimated elapsed time in seconds
    pub fn time_cost(&self) -> f64 {
        self.time_cost
    }

    pub fn max_x(&self) -> f32 {
        self.max_x
    }

    pub fn max_y(&self) -> f32 {
        self.max_y
    }

    pub fn max_z(&self) -> f32 {
        self.max_z
    }

    /// Maximum radial distance from the origin in the XY plane
    pub fn max_r(&self) -> f32 {
        self.max_r
    }

    /// Last supplied value per filament channel
    pub fn filament(&self) -> [f32; 3] {
        self.filament
    }

    /// Observe a move before it is encoded. Returns a warning diagnostic for
    /// a positional move with an unusable feedrate; the move itself is still
    /// encoded by the caller.
    pub(crate) fn observe_move(
        &mut self,
        flags: u8,
        feedrate: f32,
        x: f32,
        y: f32,
        z: f32,
        e0: f32,
        e1: f32,
        e2: f32,
    ) -> Option<Diagnostic> {
        if flags & FLAG_HAS_FEEDRATE != 0 && feedrate > 0.0 {
            self.feedrate = feedrate;
        }

        let mut delta = [0.0f32; 3];
        let mut extruded = [0.0f32; 3];
        let mut positional = false;

        if flags & FLAG_HAS_X != 0 {
            delta[0] = x - self.x;
            self.x = x;
            self.max_x = self.max_x.max(x);
            positional = true;
        }
        if flags & FLAG_HAS_Y != 0 {
            delta[1] = y - self.y;
            self.y = y;
            self.max_y = self.max_y.max(y);
            positional = true;
        }
        if flags & (FLAG_HAS_X | FLAG_HAS_Y) != 0 {
            // Recomputed from current x/y; with only one axis supplied this
            // mixes a fresh value with a stale one.
            let r = (self.x * self.x + self.y * self.y).sqrt();
            self.max_r = self.max_r.max(r);
        }
        if flags & FLAG_HAS_Z != 0 {
            delta[2] = z - self.z;
            self.z = z;
            self.max_z = self.max_z.max(z);
            positional = true;
        }

        // Filament deltas are old - new, so retraction counts positive.
        // Kept as existing v1 producers compute it.
        if flags & FLAG_HAS_E0 != 0 {
            extruded[0] = self.filament[0] - e0;
            self.filament[0] = e0;
        }
        if flags & FLAG_HAS_E1 != 0 {
            extruded[1] = self.filament[1] - e1;
            self.filament[1] = e1;
        }
        if flags & FLAG_HAS_E2 != 0 {
            extruded[2] = self.filament[2] - e2;
            self.filament[2] = e2;
        }

        if positional {
            let dist = (f64::from(delta[0]).powi(2)
                + f64::from(delta[1]).powi(2)
                + f64::from(delta[2]).powi(2))
            .sqrt();
            if !dist.is_nan() {
                self.traveled += dist;
                if self.feedrate > 0.0 {
                    let cost = dist / f64::from(self.feedrate) * 60.0;
                    if !cost.is_nan() {
                        self.time_cost += cost;
                    }
                } else {
                    return Some(Diagnostic::warning("BAD_FEEDRATE"));
                }
            }
        } else {
            // Extrusion-only estimate divides by the raw feedrate argument
            // and only rejects NaN; no warning on a degenerate feedrate.
            let cost =
                f64::from(extruded[0].max(extruded[1]).max(extruded[2])) / f64::from(feedrate)
                    * 60.0;
            if !cost.is_nan() {
                self.time_cost += cost;
            }
        }

        None
    }

    /// Observe a sleep; the tracked unit is raw seconds.
    pub(crate) fn observe_sleep(&mut self, seconds: f32) {
        if !seconds.is_nan() {
            self.time_cost += f64::from(seconds);
        }
    }

    /// Observe a homing command: position snaps to home, statistics and
    /// extents are untouched.
    pub(crate) fn observe_home(&mut self) {
        self.x = self.home_x;
        self.y = self.home_y;
        self.z = self.home_z;
    }
}
