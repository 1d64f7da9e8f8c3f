//! Fixed-timestep driver feeding an orbiting camera to the terrain manager.

use glam::{Quat, Vec3};
use orbis_config::Config;
use orbis_culling::{CameraSnapshot, FrustumCullingProvider};
use orbis_streaming::{DynamicTerrainManager, HeightSource, StreamingError, TickReport};
use tracing::info;

use crate::collaborators::{GridBuilder, SimProvider};

/// Camera circling the planet's equator while slowly yawing.
#[derive(Clone, Copy, Debug)]
pub struct OrbitCamera {
    /// Orbit radius in planet radii.
    pub distance: f32,
    /// Orbit angular speed in radians per second.
    pub speed: f32,
    /// Yaw oscillation amplitude in degrees.
    pub yaw_amplitude_deg: f32,
    pub fov_y_deg: f32,
}

impl OrbitCamera {
    /// Snapshot at simulation time `t` around a sphere of `radius`.
    pub fn snapshot(&self, radius: f32, t: f64) -> CameraSnapshot {
        let angle = self.speed * t as f32;
        let position = Vec3::new(angle.cos(), 0.35, angle.sin()) * self.distance * radius;
        let base = CameraSnapshot::looking_at(position, Vec3::ZERO, Vec3::Y, self.fov_y_deg)
            .with_clip(radius * 0.001, radius * self.distance * 4.0);
        let yaw = (self.yaw_amplitude_deg * (t as f32 * 0.5).sin()).to_radians();
        CameraSnapshot {
            rotation: base.rotation * Quat::from_rotation_y(yaw),
            ..base
        }
    }
}

/// Simulation parameters.
#[derive(Clone, Copy, Debug)]
pub struct SimSettings {
    pub ticks: u32,
    pub dt: f64,
    pub camera: OrbitCamera,
    pub alloc_cap: Option<usize>,
    /// Log a summary every this many passes.
    pub report_every: u64,
}

/// Totals over a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimSummary {
    pub ticks: u32,
    pub passes: u64,
    pub created: usize,
    pub failed: usize,
    pub pooled: usize,
    pub peak_cache: usize,
    pub max_created_per_pass: usize,
    pub last: Option<TickReport>,
}

/// Run `settings.ticks` fixed steps and shut the manager down.
pub fn run(
    config: Config,
    height: Option<Box<dyn HeightSource>>,
    settings: &SimSettings,
) -> Result<SimSummary, StreamingError> {
    config.validate()?;
    let radius = config.planet.sphere_radius;
    let culling = FrustumCullingProvider::new(
        config.planet.tiles_per_side,
        config.culling.precompute,
        radius,
        0.0,
    );
    let mut manager = DynamicTerrainManager::new(
        config,
        culling,
        SimProvider::new(settings.alloc_cap),
        GridBuilder::default(),
    )?;
    if height.is_some() {
        manager.set_height_source(height);
    }

    let mut summary = SimSummary {
        ticks: settings.ticks,
        ..Default::default()
    };
    for step in 0..settings.ticks {
        let t = f64::from(step) * settings.dt;
        let camera = settings.camera.snapshot(radius, t);
        let Some(report) = manager.tick(&camera, t)? else {
            continue;
        };

        summary.passes += 1;
        summary.created += report.total_created();
        summary.failed += report.failed;
        summary.pooled += report.pooled;
        summary.peak_cache = summary.peak_cache.max(report.cache_size);
        summary.max_created_per_pass = summary.max_created_per_pass.max(report.total_created());
        summary.last = Some(report);

        if settings.report_every > 0 && summary.passes % settings.report_every == 0 {
            info!(
                t,
                stamp = report.stamp,
                visible = report.visible,
                active = report.active,
                cached = report.cache_size,
                queued = report.queue_len,
                pool = report.pool_len,
                kib = report.total_bytes / 1024,
                "streaming status"
            );
        }
    }

    manager.shutdown();
    let provider = manager.factory().provider();
    info!(
        passes = summary.passes,
        created = summary.created,
        allocated = provider.total_allocated,
        leaked = provider.live(),
        "simulation finished"
    );
    Ok(summary)
}
