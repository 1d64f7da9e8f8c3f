//! Rate limiter deciding when a visibility pass is due.
//!
//! Passes run at most every `min_interval` while the camera moves and every
//! `idle_interval` while it rests. Motion is measured against the snapshot
//! taken by the last pass, so slow drift accumulates until it crosses a
//! threshold.

use glam::{Quat, Vec3};
use orbis_config::CullingConfig;
use orbis_culling::CameraSnapshot;

/// Camera state captured when a pass last ran.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Snapshot {
    position: Vec3,
    rotation: Quat,
    fov_y_deg: f32,
    time: f64,
}

/// Hysteresis gate over camera motion.
///
/// Two states: quiescent, and forced (the next query returns `true` once).
/// A detector that has never taken a snapshot behaves as forced.
#[derive(Clone, Debug)]
pub struct CameraChangeDetector {
    pos_eps_relative: f32,
    ang_eps_deg: f32,
    fov_eps_deg: f32,
    min_interval: f64,
    idle_interval: f64,
    snapshot: Option<Snapshot>,
    forced: bool,
    dirty: bool,
}

impl CameraChangeDetector {
    /// Build from the culling settings. Intervals are floored at
    /// [`MIN_UPDATE_INTERVAL`](orbis_config::MIN_UPDATE_INTERVAL).
    pub fn new(config: &CullingConfig) -> Self {
        Self {
            pos_eps_relative: config.pos_eps_relative,
            ang_eps_deg: config.ang_eps_deg,
            fov_eps_deg: config.fov_eps_deg,
            min_interval: config.effective_min_interval(),
            idle_interval: config.effective_idle_interval(),
            snapshot: None,
            forced: false,
            dirty: false,
        }
    }

    /// Make the next [`should_update`](Self::should_update) return `true`
    /// regardless of timing.
    pub fn force_once(&mut self) {
        self.forced = true;
    }

    /// Treat the camera as moved on the next query, so the shorter
    /// interval applies.
    pub fn mark_changed(&mut self) {
        self.dirty = true;
    }

    pub fn is_forced(&self) -> bool {
        self.forced || self.snapshot.is_none()
    }

    /// Whether the camera moved beyond any threshold since the last
    /// snapshot.
    pub fn camera_changed(&self, camera: &CameraSnapshot, sphere_radius: f32) -> bool {
        let Some(snap) = &self.snapshot else {
            return true;
        };
        let pos_eps = (sphere_radius * self.pos_eps_relative).max(orbis_config::MIN_POSITION_EPSILON);
        let moved = snap.position.distance(camera.position) > pos_eps;
        let turned = snap.rotation.angle_between(camera.rotation).to_degrees() > self.ang_eps_deg;
        let zoomed = (snap.fov_y_deg - camera.fov_y_deg).abs() > self.fov_eps_deg;
        moved || turned || zoomed
    }

    /// Decide whether a pass is due at time `now` (seconds).
    ///
    /// Returns `true` and takes a new snapshot if forced, or if the time
    /// since the last snapshot reaches the interval selected by whether the
    /// camera changed. Otherwise returns `false` and keeps the snapshot.
    pub fn should_update(&mut self, camera: &CameraSnapshot, sphere_radius: f32, now: f64) -> bool {
        if self.is_forced() {
            self.take_snapshot(camera, now);
            return true;
        }

        let changed = self.dirty || self.camera_changed(camera, sphere_radius);
        let interval = if changed {
            self.min_interval
        } else {
            self.idle_interval
        };
        let elapsed = self.snapshot.map_or(f64::INFINITY, |s| now - s.time);
        if elapsed >= interval {
            self.take_snapshot(camera, now);
            return true;
        }
        false
    }

    fn take_snapshot(&mut self, camera: &CameraSnapshot, now: f64) {
        self.snapshot = Some(Snapshot {
            position: camera.position,
            rotation: camera.rotation,
            fov_y_deg: camera.fov_y_deg,
            time: now,
        });
        self.forced = false;
        self.dirty = false;
    }
}
