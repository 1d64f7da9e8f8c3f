//! Per-tick orchestration of culling, creation, scheduling and eviction.

use orbis_config::{Config, ConfigError};
use orbis_cubesphere::{TileKey, validate_face_axes};
use orbis_culling::{CameraSnapshot, CullingProvider, VisibleSet};
use tracing::{debug, debug_span, error, info, warn};

use crate::cache::{CacheEvent, TileCache};
use crate::change_detector::CameraChangeDetector;
use crate::error::StreamingError;
use crate::factory::{GeometryBuilder, RenderResourceProvider, TileCreateConfig, TileFactory};
use crate::height::HeightSource;
use crate::priority::prioritize;
use crate::scheduler::UpdateScheduler;

/// Counters for one update pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Visibility stamp of this pass.
    pub stamp: u64,
    /// Keys reported visible by culling.
    pub visible: usize,
    /// Cached tiles activated.
    pub activated: usize,
    /// Tiles created directly from the visible list.
    pub created: usize,
    /// Keys deferred to the scheduler.
    pub queued: usize,
    /// Tiles created from the scheduler.
    pub drained: usize,
    /// Creation attempts that failed transiently.
    pub failed: usize,
    /// Tiles deactivated by the staleness sweep.
    pub deactivated: usize,
    /// Tiles evicted into the pool by capacity enforcement.
    pub pooled: usize,
    /// Resources reused from the pool.
    pub rented_from_pool: usize,
    /// Resources allocated through the provider.
    pub newly_allocated: usize,
    /// Cache entries after the pass.
    pub cache_size: usize,
    /// Active cache entries after the pass.
    pub active: usize,
    /// Keys left in the scheduler.
    pub queue_len: usize,
    /// Pooled resources after the pass.
    pub pool_len: usize,
    /// Approximate bytes held by cached tiles.
    pub total_bytes: usize,
}

impl TickReport {
    /// Tiles created this pass, directly and from the scheduler.
    pub fn total_created(&self) -> usize {
        self.created + self.drained
    }
}

/// Streams cube-sphere tiles around a camera under a per-tick creation
/// budget.
///
/// Driven by an external loop calling [`tick`](Self::tick). Each pass that
/// the change detector lets through culls, orders, activates or creates
/// visible tiles, drains deferred creations, deactivates stale tiles and
/// enforces cache capacity. A duplicate insertion halts the manager; every
/// later tick returns [`StreamingError::Halted`].
pub struct DynamicTerrainManager<C, P, G>
where
    C: CullingProvider,
    P: RenderResourceProvider,
    G: GeometryBuilder<P::Resource>,
{
    config: Config,
    culling: C,
    factory: TileFactory<P, G>,
    cache: TileCache<P::Resource>,
    scheduler: UpdateScheduler,
    detector: CameraChangeDetector,
    height: Option<Box<dyn HeightSource>>,
    visible: VisibleSet,
    stamp: u64,
    halted: bool,
    shut_down: bool,
}

impl<C, P, G> DynamicTerrainManager<C, P, G>
where
    C: CullingProvider,
    P: RenderResourceProvider,
    G: GeometryBuilder<P::Resource>,
{
    /// Validate `config` and the face frames of both producers, build the
    /// culling tables and arm the first pass.
    pub fn new(config: Config, culling: C, provider: P, builder: G) -> Result<Self, StreamingError> {
        config.validate()?;
        validate_face_axes(|face| culling.face_axes(face))?;
        let factory = TileFactory::new(provider, builder);
        validate_face_axes(|face| factory.face_axes(face))?;

        let cache = TileCache::new(
            config.streaming.max_cached_tiles,
            config.streaming.cache_all_generated,
        );
        let mut detector = CameraChangeDetector::new(&config.culling);
        detector.force_once();

        let mut manager = Self {
            config,
            culling,
            factory,
            cache,
            scheduler: UpdateScheduler::new(),
            detector,
            height: None,
            visible: VisibleSet::new(),
            stamp: 0,
            halted: false,
            shut_down: false,
        };
        manager.rebuild_culling_precompute();

        info!(
            tiles_per_side = manager.config.planet.tiles_per_side,
            radius = manager.config.planet.sphere_radius,
            max_creates = manager.config.streaming.max_creates_per_frame,
            max_cached = manager.config.streaming.max_cached_tiles,
            priority = manager.config.priority.enabled,
            "terrain manager ready"
        );
        Ok(manager)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &TileCache<P::Resource> {
        &self.cache
    }

    pub fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    pub fn culling(&self) -> &C {
        &self.culling
    }

    pub fn factory(&self) -> &TileFactory<P, G> {
        &self.factory
    }

    /// Keys found visible by the last pass.
    pub fn visible(&self) -> &VisibleSet {
        &self.visible
    }

    /// Stamp of the last pass (0 before the first).
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Forward cache transitions to `listener`.
    pub fn set_cache_listener(&mut self, listener: impl FnMut(CacheEvent) + 'static) {
        self.cache.set_listener(listener);
    }

    /// Install or remove the elevation source. Cached geometry is
    /// invalidated and culling bounds are rebuilt for the new range.
    pub fn set_height_source(&mut self, height: Option<Box<dyn HeightSource>>) {
        self.height = height;
        self.invalidate_tiles("height source changed");
    }

    /// Elevation range covered by culling bounds: `height_scale *
    /// uniform_scale` with a height source, else zero.
    pub fn max_elevation(&self) -> f32 {
        if self.height.is_some() {
            self.config.planet.elevation_range()
        } else {
            0.0
        }
    }

    /// Ask for a pass. `immediate` runs the next tick regardless of
    /// timing; otherwise the next tick treats the camera as moved.
    pub fn request_update(&mut self, immediate: bool) {
        if immediate {
            self.detector.force_once();
        } else {
            self.detector.mark_changed();
        }
    }

    /// Recompute culling tables from the current planet parameters.
    pub fn rebuild_culling_precompute(&mut self) {
        let planet = &self.config.planet;
        if self.height.is_none() && planet.height_scale > 0.0 {
            warn!(
                height_scale = planet.height_scale,
                "no height source installed; culling assumes a smooth sphere"
            );
        }
        let max_elevation = self.max_elevation();
        self.culling.rebuild_precompute(
            self.config.planet.sphere_radius,
            max_elevation,
            self.config.planet.tiles_per_side,
        );
    }

    /// Change the sphere radius; cached geometry is invalidated.
    pub fn set_sphere_radius(&mut self, radius: f32) -> Result<(), StreamingError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ConfigError::SphereRadius(radius).into());
        }
        self.config.planet.sphere_radius = radius;
        self.invalidate_tiles("sphere radius changed");
        Ok(())
    }

    /// Change the tile density; cached geometry is invalidated.
    pub fn set_tiles_per_side(&mut self, tiles_per_side: u16) -> Result<(), StreamingError> {
        if tiles_per_side == 0 {
            return Err(ConfigError::TilesPerSide(tiles_per_side).into());
        }
        self.config.planet.tiles_per_side = tiles_per_side;
        self.invalidate_tiles("tile density changed");
        Ok(())
    }

    /// Change the height exaggeration; cached geometry is invalidated.
    pub fn set_height_scale(&mut self, height_scale: f32) -> Result<(), StreamingError> {
        if !height_scale.is_finite() || height_scale < 0.0 {
            return Err(ConfigError::Scale {
                name: "height_scale",
                value: height_scale,
            }
            .into());
        }
        self.config.planet.height_scale = height_scale;
        self.invalidate_tiles("height scale changed");
        Ok(())
    }

    /// Advance one tick at time `now` (seconds).
    ///
    /// Returns `Ok(None)` when the change detector skips the pass or the
    /// manager was shut down.
    pub fn tick(&mut self, camera: &CameraSnapshot, now: f64) -> Result<Option<TickReport>, StreamingError> {
        if self.halted {
            return Err(StreamingError::Halted);
        }
        if self.shut_down {
            return Ok(None);
        }
        if self.config.culling.on_demand
            && !self
                .detector
                .should_update(camera, self.config.planet.sphere_radius, now)
        {
            return Ok(None);
        }

        self.stamp += 1;
        let stamp = self.stamp;
        let _span = debug_span!("terrain_tick", stamp).entered();

        let frustum = camera.frustum();
        let culled: Vec<TileKey> = self.culling.visible_keys(&frustum).collect();
        self.visible.refill(culled.iter().copied());

        let mut report = TickReport {
            stamp,
            visible: self.visible.len(),
            ..Default::default()
        };

        let ordered: Vec<TileKey> = if self.config.priority.enabled {
            let cache = &self.cache;
            prioritize(
                culled,
                self.culling.tiles_per_side(),
                camera.forward(),
                &self.config.priority,
                |key| cache.contains(key),
            )
            .into_iter()
            .map(|scored| scored.key)
            .collect()
        } else {
            culled
        };

        let budget = self.config.streaming.max_creates_per_frame as usize;
        let mut used = 0;
        for key in ordered {
            if self.cache.activate(key, now, stamp) {
                report.activated += 1;
                continue;
            }
            if self.cache.remove_if_dead(&key) {
                warn!(%key, "cached tile lost its resource; recreating");
            }
            if used < budget {
                // Failed attempts still cost an allocate and build.
                used += 1;
                if self.create_and_activate(key, now, stamp)? {
                    report.created += 1;
                } else {
                    report.failed += 1;
                }
            } else if self.scheduler.enqueue_if_absent(key) {
                report.queued += 1;
            }
        }

        let remaining = budget.saturating_sub(used);
        if remaining > 0 && !self.scheduler.is_empty() {
            let mut scheduler = std::mem::take(&mut self.scheduler);
            let mut fatal = None;
            let mut failed = 0;
            report.drained = scheduler.drain(remaining, |key| {
                if fatal.is_some() || self.cache.contains(&key) {
                    return false;
                }
                match self.create_and_activate(key, now, stamp) {
                    Ok(created) => {
                        if !created {
                            failed += 1;
                        }
                        created
                    }
                    Err(err) => {
                        fatal = Some(err);
                        false
                    }
                }
            });
            self.scheduler = scheduler;
            report.failed += failed;
            if let Some(err) = fatal {
                return Err(err);
            }
        }

        report.deactivated = self.cache.sweep_deactivate_stale(stamp, now);
        report.pooled = self.cache.enforce_capacity();

        let stats = self.factory.take_stats();
        report.rented_from_pool = stats.rented_from_pool;
        report.newly_allocated = stats.newly_allocated;
        report.cache_size = self.cache.len();
        report.active = self.cache.active_count();
        report.queue_len = self.scheduler.len();
        report.pool_len = self.cache.pool_len();
        report.total_bytes = self.cache.total_bytes();

        debug!(
            visible = report.visible,
            activated = report.activated,
            created = report.created,
            drained = report.drained,
            queued = report.queued,
            failed = report.failed,
            pooled = report.pooled,
            cached = report.cache_size,
            "terrain tick complete"
        );
        Ok(Some(report))
    }

    /// Release every cached and pooled resource through the provider and
    /// clear the scheduler. Later ticks do nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        let factory = &mut self.factory;
        let mut released = 0usize;
        self.cache.destroy_all(|resource| {
            released += 1;
            factory.destroy(resource);
        });
        self.scheduler.clear();
        self.visible.clear();
        self.shut_down = true;
        info!(released, "terrain manager shut down");
    }

    fn create_and_activate(&mut self, key: TileKey, now: f64, stamp: u64) -> Result<bool, StreamingError> {
        let cfg = TileCreateConfig::from_planet(key, &self.config.planet);
        let tile = match self
            .factory
            .create(&cfg, self.height.as_deref(), &mut self.cache, now)
        {
            Ok(tile) => tile,
            Err(err) => {
                warn!(%key, error = %err, "tile creation failed; retrying on a later pass");
                return Ok(false);
            }
        };

        if let Err(rejected) = self.cache.put(tile) {
            self.factory.destroy(rejected.resource);
            self.halted = true;
            error!(%key, "duplicate tile insertion; halting terrain streaming");
            return Err(StreamingError::DuplicateTile(key));
        }
        self.cache.activate(key, now, stamp);
        debug!(%key, "tile created");
        Ok(true)
    }

    fn invalidate_tiles(&mut self, reason: &str) {
        self.rebuild_culling_precompute();
        let pooled = self.cache.pool_all();
        self.scheduler.clear();
        self.detector.force_once();
        info!(reason, pooled, "cached tiles invalidated");
    }
}

impl<C, P, G> Drop for DynamicTerrainManager<C, P, G>
where
    C: CullingProvider,
    P: RenderResourceProvider,
    G: GeometryBuilder<P::Resource>,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachedTile;
    use crate::height::FlatHeight;
    use crate::test_support::{CountingBuilder, MockResource, RecordingProvider, ScriptedCulling};
    use glam::Vec3;
    use orbis_culling::FrustumCullingProvider;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Manager = DynamicTerrainManager<ScriptedCulling, RecordingProvider, CountingBuilder>;

    /// Camera below the planet looking along +Y.
    fn camera_up() -> CameraSnapshot {
        CameraSnapshot::looking_at(Vec3::new(0.0, -3.0, 0.0), Vec3::ZERO, Vec3::Z, 60.0)
    }

    fn config(tiles_per_side: u16, max_creates: u32) -> Config {
        let mut config = Config::default();
        config.planet.tiles_per_side = tiles_per_side;
        config.streaming.max_creates_per_frame = max_creates;
        config.culling.on_demand = false;
        config
    }

    fn manager(keys: Vec<TileKey>, config: Config) -> Manager {
        Manager::new(
            config,
            ScriptedCulling::new(keys),
            RecordingProvider::default(),
            CountingBuilder::default(),
        )
        .unwrap()
    }

    fn tick(m: &mut Manager, now: f64) -> TickReport {
        m.tick(&camera_up(), now).unwrap().unwrap()
    }

    fn face(f: u8) -> TileKey {
        TileKey::new(f, 0, 0)
    }

    /// One visible tile, budget one: created and active, nothing queued.
    #[test]
    fn test_single_visible_tile_created_in_one_tick() {
        let mut m = manager(vec![face(0)], config(1, 1));
        let report = tick(&mut m, 0.0);
        assert_eq!(report.created, 1);
        assert_eq!(report.queued, 0);
        assert_eq!(report.active, 1);
        assert!(m.cache().get(&face(0)).unwrap().is_active);
    }

    /// The higher-scored tile is created first; the other follows next tick.
    #[test]
    fn test_higher_priority_first_then_deferred_drain() {
        // Culling order lists the low-score face first.
        let mut m = manager(vec![face(1), face(0)], config(1, 1));

        let first = tick(&mut m, 0.0);
        assert_eq!(first.created, 1);
        assert_eq!(first.queued, 1);
        assert!(m.cache().contains(&face(0)), "higher-priority tile not created");
        assert!(m.scheduler().contains(&face(1)));

        let second = tick(&mut m, 1.0);
        assert_eq!(second.total_created(), 1);
        assert_eq!(second.activated, 1);
        assert!(m.cache().get(&face(1)).unwrap().is_active);
        assert!(m.cache().get(&face(0)).unwrap().is_active);
    }

    /// Queued keys are created even after they leave the view.
    #[test]
    fn test_drain_creates_without_visibility_recheck() {
        let mut m = manager(vec![face(0), face(1)], config(1, 1));
        tick(&mut m, 0.0);
        assert_eq!(m.scheduler().len(), 1);

        m.culling.keys.clear();
        let report = tick(&mut m, 1.0);
        assert_eq!(report.drained, 1);
        assert!(m.cache().contains(&face(1)));
        assert_eq!(report.deactivated, 1, "the previously visible tile must be swept");
        assert!(m.cache().get(&face(1)).unwrap().is_active, "drained tile is active");
        assert!(!m.cache().get(&face(0)).unwrap().is_active);
    }

    /// Direct and drained creations together never exceed the budget.
    #[test]
    fn test_budget_conserved_every_tick() {
        let keys: Vec<TileKey> = orbis_cubesphere::all_keys(4).collect();
        let mut m = manager(keys, config(4, 3));
        let mut total = 0;
        for i in 0..40 {
            let report = tick(&mut m, f64::from(i));
            assert!(report.total_created() <= 3, "tick {i}: {report:?}");
            total += report.total_created();
        }
        assert_eq!(total, 96);
        assert_eq!(m.cache().len(), 96);
        assert_eq!(m.factory().builder().builds, 96);
    }

    #[test]
    fn test_cached_tiles_activate_outside_budget() {
        let keys: Vec<TileKey> = (0..6).map(face).collect();
        let mut m = manager(keys, config(1, 1));
        for i in 0..6 {
            tick(&mut m, f64::from(i));
        }
        let report = tick(&mut m, 10.0);
        assert_eq!(report.activated, 6);
        assert_eq!(report.total_created(), 0);
        assert_eq!(report.active, 6);
    }

    #[test]
    fn test_stale_tiles_deactivated() {
        let mut m = manager(vec![face(0), face(1)], config(1, 2));
        tick(&mut m, 0.0);
        m.culling.keys = vec![face(0)];
        let report = tick(&mut m, 1.0);
        assert_eq!(report.deactivated, 1);
        assert!(m.cache().get(&face(0)).unwrap().is_active);
        assert!(!m.cache().get(&face(1)).unwrap().is_active);
        assert!(!m.cache().get(&face(1)).unwrap().resource.visible);
    }

    /// Evicted resources go to the pool and are rented before allocating.
    #[test]
    fn test_evicted_resources_are_reused() {
        let mut cfg = config(1, 1);
        cfg.streaming.max_cached_tiles = 1;
        let mut m = manager(vec![face(0)], cfg);
        tick(&mut m, 0.0);

        m.culling.keys = vec![face(1)];
        let second = tick(&mut m, 1.0);
        assert_eq!(second.newly_allocated, 1);
        assert_eq!(second.pooled, 1);
        assert!(!m.cache().contains(&face(0)));

        m.culling.keys = vec![face(2)];
        let third = tick(&mut m, 2.0);
        assert_eq!(third.rented_from_pool, 1);
        assert_eq!(third.newly_allocated, 0);
        assert_eq!(m.factory().provider().allocated, 2);
    }

    /// Exhaustion is logged and skipped; the key is neither counted nor queued.
    #[test]
    fn test_resource_exhaustion_is_transient() {
        let mut m = Manager::new(
            config(1, 2),
            ScriptedCulling::new(vec![face(0), face(1)]),
            RecordingProvider::with_cap(1),
            CountingBuilder::default(),
        )
        .unwrap();

        let report = tick(&mut m, 0.0);
        assert_eq!(report.created, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.queued, 0);
        assert!(m.scheduler().is_empty());

        m.factory.provider_mut().cap = None;
        let report = tick(&mut m, 1.0);
        assert_eq!(report.created, 1);
        assert_eq!(m.cache().len(), 2);
    }

    /// Failing direct creations are charged to the budget, so a broken
    /// builder costs at most `max_creates_per_frame` attempts per tick.
    #[test]
    fn test_failed_direct_creations_consume_budget() {
        let keys: Vec<TileKey> = (0..6).map(face).collect();
        let mut builder = CountingBuilder::default();
        builder.fail_keys.extend(keys.iter().copied());
        let mut m = Manager::new(
            config(1, 1),
            ScriptedCulling::new(keys),
            RecordingProvider::default(),
            builder,
        )
        .unwrap();

        let first = tick(&mut m, 0.0);
        assert_eq!(m.factory().provider().allocated, 1, "more than one attempt in one tick");
        assert_eq!(first.failed, 1);
        assert_eq!(first.created, 0);
        assert_eq!(first.queued, 5);

        let second = tick(&mut m, 1.0);
        assert_eq!(m.factory().provider().allocated, 2);
        assert_eq!(second.failed, 1);
        assert_eq!(second.total_created(), 0);
        assert_eq!(m.factory().provider().live(), 0, "failed resources leaked");
        assert!(m.cache().is_empty());
    }

    /// A queued key that was created directly in the meantime is skipped by
    /// the drain, and its budget slot goes to the next queued key.
    #[test]
    fn test_drain_skips_cached_key_without_spending_budget() {
        // Culling order is kept so the queue order is predictable.
        let mut cfg = config(1, 2);
        cfg.priority.enabled = false;
        let mut m = manager(vec![face(0), face(1), face(2), face(3)], cfg);

        let first = tick(&mut m, 0.0);
        assert_eq!(first.created, 2);
        assert_eq!(first.queued, 2);
        assert!(m.scheduler().contains(&face(2)));
        assert!(m.scheduler().contains(&face(3)));

        // face(2) is created directly while it is still queued.
        m.culling.keys = vec![face(2)];
        let second = tick(&mut m, 1.0);
        assert_eq!(second.created, 1);
        assert_eq!(second.queued, 0);
        assert_eq!(second.drained, 1, "the freed slot must go to face(3)");
        assert!(m.cache().contains(&face(3)));
        assert_eq!(second.total_created(), 2);
        assert_eq!(m.factory().builder().builds, 4, "the drain must not rebuild face(2)");
        assert!(m.scheduler().is_empty());
    }

    /// A duplicate insertion releases the resource and halts the manager.
    #[test]
    fn test_duplicate_insertion_halts() {
        let mut m = manager(vec![face(0)], config(1, 1));
        m.cache
            .put(CachedTile::new(face(0), MockResource::new(1), 0, 0.0))
            .unwrap();

        let err = m.create_and_activate(face(0), 0.0, 1).unwrap_err();
        assert_eq!(err, StreamingError::DuplicateTile(face(0)));
        assert!(m.is_halted());
        assert_eq!(m.factory().provider().live(), 0, "rejected resource leaked");
        assert_eq!(m.cache().get(&face(0)).unwrap().resource.id, 1);
        assert_eq!(m.tick(&camera_up(), 1.0), Err(StreamingError::Halted));
    }

    #[test]
    fn test_non_priority_path_keeps_culling_order() {
        let mut cfg = config(1, 1);
        cfg.priority.enabled = false;
        let mut m = manager(vec![face(1), face(0)], cfg);
        tick(&mut m, 0.0);
        assert!(m.cache().contains(&face(1)));
        assert!(m.scheduler().contains(&face(0)));
    }

    #[test]
    fn test_on_demand_gate_skips_and_forces() {
        let mut cfg = config(1, 1);
        cfg.culling.on_demand = true;
        let mut m = manager(vec![face(0)], cfg);
        let cam = camera_up();

        assert!(m.tick(&cam, 0.0).unwrap().is_some(), "first pass must be forced");
        assert!(m.tick(&cam, 0.01).unwrap().is_none());
        assert_eq!(m.stamp(), 1);

        m.request_update(true);
        assert!(m.tick(&cam, 0.02).unwrap().is_some());
        assert_eq!(m.stamp(), 2);

        assert!(m.tick(&cam, 0.6).unwrap().is_some(), "idle interval elapsed");
    }

    #[test]
    fn test_face_axes_mismatch_rejected() {
        let mut culling = ScriptedCulling::new(vec![]);
        culling.skewed_face = Some(2);
        let result = Manager::new(
            config(1, 1),
            culling,
            RecordingProvider::default(),
            CountingBuilder::default(),
        );
        assert!(matches!(result, Err(StreamingError::FaceAxes(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = Manager::new(
            config(0, 1),
            ScriptedCulling::new(vec![]),
            RecordingProvider::default(),
            CountingBuilder::default(),
        );
        assert!(matches!(
            result,
            Err(StreamingError::Config(ConfigError::TilesPerSide(0)))
        ));
    }

    #[test]
    fn test_setters_rebuild_and_invalidate() {
        let mut m = manager(vec![face(0)], config(1, 1));
        tick(&mut m, 0.0);
        let rebuilds = m.culling().rebuilds;

        m.set_tiles_per_side(2).unwrap();
        assert_eq!(m.culling().rebuilds, rebuilds + 1);
        assert_eq!(m.culling().tiles_per_side, 2);
        assert!(m.cache().is_empty());
        assert_eq!(m.cache().pool_len(), 1);

        assert!(m.set_sphere_radius(-1.0).is_err());
        assert!(m.set_height_scale(f32::NAN).is_err());
        assert!(m.set_tiles_per_side(0).is_err());
        m.set_sphere_radius(5.0).unwrap();
        assert_eq!(m.config().planet.sphere_radius, 5.0);

        let report = tick(&mut m, 0.0);
        assert_eq!(report.rented_from_pool, 1);
    }

    #[test]
    fn test_height_source_sets_elevation_range() {
        let mut cfg = config(1, 1);
        cfg.planet.height_scale = 2.0;
        cfg.planet.uniform_scale = 1.5;
        let mut m = manager(vec![face(0)], cfg);
        assert_eq!(m.max_elevation(), 0.0);
        assert_eq!(m.culling().last_max_elevation, 0.0);

        m.set_height_source(Some(Box::new(FlatHeight)));
        assert_eq!(m.max_elevation(), 3.0);
        assert_eq!(m.culling().last_max_elevation, 3.0);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut cfg = config(1, 2);
        cfg.streaming.max_cached_tiles = 1;
        let mut m = manager(vec![face(0), face(1)], cfg);
        tick(&mut m, 0.0);
        m.culling.keys = vec![face(2)];
        tick(&mut m, 1.0);

        m.shutdown();
        let provider = m.factory().provider();
        assert_eq!(provider.live(), 0);
        assert_eq!(provider.destroyed.len(), provider.allocated);
        assert!(m.cache().is_empty());
        assert_eq!(m.cache().pool_len(), 0);
        assert!(m.scheduler().is_empty());

        assert_eq!(m.tick(&camera_up(), 2.0), Ok(None));
        m.shutdown();
        assert_eq!(m.factory().provider().destroyed.len(), m.factory().provider().allocated);
    }

    #[test]
    fn test_cache_listener_receives_events() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let mut m = manager(vec![face(0)], config(1, 1));
        m.set_cache_listener(move |e| sink.borrow_mut().push(e));

        tick(&mut m, 0.0);
        m.culling.keys.clear();
        tick(&mut m, 1.0);
        assert_eq!(
            *events.borrow(),
            vec![CacheEvent::Activated(face(0)), CacheEvent::Deactivated(face(0))]
        );
    }

    /// With real frustum culling the active set converges to the visible set.
    #[test]
    fn test_converges_to_visible_set_with_frustum_culling() {
        let cfg = config(3, 4);
        let culling = FrustumCullingProvider::new(3, true, 1.0, 0.0);
        let mut m = DynamicTerrainManager::new(
            cfg,
            culling,
            RecordingProvider::default(),
            CountingBuilder::default(),
        )
        .unwrap();
        let cam = CameraSnapshot::looking_at(Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO, Vec3::Z, 40.0)
            .with_clip(0.01, 100.0);

        let mut last = TickReport::default();
        for i in 0..60 {
            last = m.tick(&cam, f64::from(i)).unwrap().unwrap();
            assert!(last.total_created() <= 4);
        }
        assert!(last.visible > 0);
        assert_eq!(last.active, last.visible);
        assert_eq!(last.queue_len, 0);
        for key in m.visible().iter() {
            assert!(m.cache().get(key).is_some_and(|t| t.is_active), "{key} not active");
        }
    }
}
