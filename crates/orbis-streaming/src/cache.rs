//! LRU tile cache with a reuse pool for released render resources.
//!
//! The cache exclusively owns every [`CachedTile`] and every pooled
//! resource. Recency is tracked with a monotonically increasing sequence
//! number per entry; the [`BTreeMap`] keyed by that sequence is the LRU
//! list, least-recently-used first.

use std::collections::BTreeMap;

use orbis_cubesphere::TileKey;
use rustc_hash::FxHashMap;
use tracing::debug;

/// A render resource the cache can hide, pool and hand back out.
pub trait TileResource {
    /// Show or hide the resource without destroying it.
    fn set_visible(&mut self, visible: bool);

    /// Whether the underlying handle still refers to a live object.
    fn is_alive(&self) -> bool;
}

/// Cache transition reported to an installed listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheEvent {
    /// An inactive (or new) entry became active.
    Activated(TileKey),
    /// An active entry became inactive.
    Deactivated(TileKey),
    /// An entry was evicted and its resource moved to the pool.
    Pooled(TileKey),
}

/// One cached tile.
#[derive(Debug)]
pub struct CachedTile<R> {
    /// Tile identity.
    pub key: TileKey,
    /// Render resource carrying the tile's geometry.
    pub resource: R,
    /// Approximate resource footprint.
    pub size_bytes: usize,
    /// Whether the tile is currently shown.
    pub is_active: bool,
    /// Time of the last activation or deactivation, in seconds.
    pub last_access_time: f64,
    /// Visibility stamp of the last pass that activated this tile.
    pub last_visible_stamp: u64,
    lru_seq: u64,
}

impl<R> CachedTile<R> {
    /// A fresh, inactive entry.
    pub fn new(key: TileKey, resource: R, size_bytes: usize, now: f64) -> Self {
        Self {
            key,
            resource,
            size_bytes,
            is_active: false,
            last_access_time: now,
            last_visible_stamp: 0,
            lru_seq: 0,
        }
    }
}

type Listener = Box<dyn FnMut(CacheEvent)>;

/// Map from [`TileKey`] to cached tile state, with LRU ordering and a pool.
///
/// Capacity is soft: [`enforce_capacity`](Self::enforce_capacity) only ever
/// evicts inactive entries, so a cache full of active tiles may exceed
/// `max_tiles`.
pub struct TileCache<R: TileResource> {
    max_tiles: usize,
    keep_all: bool,
    entries: FxHashMap<TileKey, CachedTile<R>>,
    lru: BTreeMap<u64, TileKey>,
    next_seq: u64,
    pool: Vec<R>,
    listener: Option<Listener>,
}

impl<R: TileResource> TileCache<R> {
    /// Create an empty cache.
    ///
    /// With `keep_all` set, capacity is never enforced.
    ///
    /// # Panics
    ///
    /// Panics if `max_tiles` is zero.
    pub fn new(max_tiles: usize, keep_all: bool) -> Self {
        assert!(max_tiles > 0, "max_tiles must be at least 1");
        Self {
            max_tiles,
            keep_all,
            entries: FxHashMap::default(),
            lru: BTreeMap::new(),
            next_seq: 0,
            pool: Vec::new(),
            listener: None,
        }
    }

    /// Install a listener notified on every activation, deactivation and
    /// eviction.
    pub fn set_listener(&mut self, listener: impl FnMut(CacheEvent) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Remove the installed listener.
    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    pub fn max_tiles(&self) -> usize {
        self.max_tiles
    }

    pub fn keep_all(&self) -> bool {
        self.keep_all
    }

    /// Number of cached entries (active and inactive).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of active entries.
    pub fn active_count(&self) -> usize {
        self.entries.values().filter(|t| t.is_active).count()
    }

    /// Number of pooled resources waiting for reuse.
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    /// Sum of `size_bytes` over all entries.
    pub fn total_bytes(&self) -> usize {
        self.entries.values().map(|t| t.size_bytes).sum()
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &TileKey) -> Option<&CachedTile<R>> {
        self.entries.get(key)
    }

    /// Keys in LRU order, least-recently-used first.
    pub fn lru_keys(&self) -> impl Iterator<Item = &TileKey> {
        self.lru.values()
    }

    /// Insert `tile` at the most-recently-used end.
    ///
    /// Fails without touching the existing entry if the key is already
    /// cached; the rejected tile is handed back so the caller can release
    /// its resource.
    pub fn put(&mut self, mut tile: CachedTile<R>) -> Result<(), CachedTile<R>> {
        if self.entries.contains_key(&tile.key) {
            return Err(tile);
        }
        let seq = self.bump_seq();
        tile.lru_seq = seq;
        self.lru.insert(seq, tile.key);
        self.entries.insert(tile.key, tile);
        Ok(())
    }

    /// Mark `key` active for visibility pass `stamp` and move it to the
    /// most-recently-used end.
    ///
    /// Returns `false` if the key is absent or its resource is gone.
    pub fn activate(&mut self, key: TileKey, now: f64, stamp: u64) -> bool {
        let Some(tile) = self.entries.get_mut(&key) else {
            return false;
        };
        if !tile.resource.is_alive() {
            return false;
        }
        let was_active = tile.is_active;
        tile.is_active = true;
        tile.last_access_time = now;
        tile.last_visible_stamp = stamp;
        tile.resource.set_visible(true);
        self.touch(key);
        if !was_active {
            self.emit(CacheEvent::Activated(key));
        }
        true
    }

    /// Mark `key` inactive and move it to the most-recently-used end.
    ///
    /// Returns `false` if the key is absent.
    pub fn deactivate(&mut self, key: TileKey, now: f64) -> bool {
        let Some(tile) = self.entries.get_mut(&key) else {
            return false;
        };
        let was_active = tile.is_active;
        tile.is_active = false;
        tile.last_access_time = now;
        if tile.resource.is_alive() {
            tile.resource.set_visible(false);
        }
        self.touch(key);
        if was_active {
            self.emit(CacheEvent::Deactivated(key));
        }
        true
    }

    /// Deactivate every active entry not activated during pass `stamp`.
    ///
    /// Stale entries are visited in LRU order so their relative recency is
    /// preserved. Returns the number of deactivated entries.
    pub fn sweep_deactivate_stale(&mut self, stamp: u64, now: f64) -> usize {
        let stale: Vec<TileKey> = self
            .lru
            .values()
            .filter(|key| {
                self.entries
                    .get(key)
                    .is_some_and(|t| t.is_active && t.last_visible_stamp != stamp)
            })
            .copied()
            .collect();
        for key in &stale {
            self.deactivate(*key, now);
        }
        stale.len()
    }

    /// Evict inactive entries from the least-recently-used end until the
    /// cache fits `max_tiles` or no inactive entry is left. Evicted
    /// resources are hidden and pooled. Returns the number evicted.
    pub fn enforce_capacity(&mut self) -> usize {
        if self.keep_all || self.entries.len() <= self.max_tiles {
            return 0;
        }
        let excess = self.entries.len() - self.max_tiles;
        let victims: Vec<TileKey> = self
            .lru
            .values()
            .filter(|key| self.entries.get(key).is_some_and(|t| !t.is_active))
            .take(excess)
            .copied()
            .collect();
        for key in &victims {
            self.evict_to_pool(*key);
        }
        if self.entries.len() > self.max_tiles {
            debug!(
                cached = self.entries.len(),
                max = self.max_tiles,
                "cache over capacity with active tiles pinned"
            );
        }
        victims.len()
    }

    /// Take a resource from the pool, discarding any that died while
    /// pooled.
    pub fn rent_from_pool(&mut self) -> Option<R> {
        while let Some(resource) = self.pool.pop() {
            if resource.is_alive() {
                return Some(resource);
            }
        }
        None
    }

    /// Hand a resource to the pool.
    pub fn return_to_pool(&mut self, mut resource: R) {
        if resource.is_alive() {
            resource.set_visible(false);
            self.pool.push(resource);
        }
    }

    /// Drop the entry for `key` if its resource is no longer alive.
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove_if_dead(&mut self, key: &TileKey) -> bool {
        let dead = self
            .entries
            .get(key)
            .is_some_and(|t| !t.resource.is_alive());
        if dead && let Some(tile) = self.entries.remove(key) {
            self.lru.remove(&tile.lru_seq);
        }
        dead
    }

    /// Evict every entry, active or not, into the pool. Used when cached
    /// geometry no longer matches the planet parameters.
    pub fn pool_all(&mut self) -> usize {
        let keys: Vec<TileKey> = self.lru.values().copied().collect();
        for key in &keys {
            self.evict_to_pool(*key);
        }
        keys.len()
    }

    /// Release every owned resource, cached or pooled, through `destroy`
    /// and clear all state.
    pub fn destroy_all(&mut self, mut destroy: impl FnMut(R)) {
        self.lru.clear();
        for (_, tile) in self.entries.drain() {
            destroy(tile.resource);
        }
        for resource in self.pool.drain(..) {
            destroy(resource);
        }
    }

    fn evict_to_pool(&mut self, key: TileKey) {
        let Some(tile) = self.entries.remove(&key) else {
            return;
        };
        self.lru.remove(&tile.lru_seq);
        debug!(%key, was_active = tile.is_active, "tile pooled");
        self.return_to_pool(tile.resource);
        self.emit(CacheEvent::Pooled(key));
    }

    fn touch(&mut self, key: TileKey) {
        let seq = self.bump_seq();
        if let Some(tile) = self.entries.get_mut(&key) {
            self.lru.remove(&tile.lru_seq);
            tile.lru_seq = seq;
            self.lru.insert(seq, key);
        }
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn emit(&mut self, event: CacheEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener(event);
        }
    }
}
