//! Tile creation: resource acquisition (pool first) and geometry building.
//!
//! Geometry itself is an external collaborator behind [`GeometryBuilder`];
//! this module owns the resource-reuse contract. A created tile is handed
//! to the caller, which inserts it into the [`TileCache`]. The factory keeps
//! nothing past the call.

use orbis_cubesphere::{FaceAxes, TileKey};
use tracing::{debug, warn};

use crate::cache::{CachedTile, TileCache, TileResource};
use crate::error::{FactoryError, GeometryError, ResourceError};
use crate::height::HeightSource;

/// Allocates and destroys the opaque per-tile render resources.
pub trait RenderResourceProvider {
    /// Resource handle type.
    type Resource: TileResource;

    /// Allocate a fresh, hidden resource for `key`.
    fn allocate(&mut self, key: TileKey) -> Result<Self::Resource, ResourceError>;

    /// Release a resource for good.
    fn destroy(&mut self, resource: Self::Resource);
}

/// Index buffer element width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit indices.
    U16,
    /// 32-bit indices.
    U32,
}

impl IndexFormat {
    /// Bytes per index.
    pub const fn size(self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// Size of a built tile mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeometryStats {
    pub vertex_count: usize,
    pub index_count: usize,
    pub has_tangents: bool,
    pub index_format: IndexFormat,
}

impl GeometryStats {
    /// Bytes per vertex without tangents: position, normal, uv.
    pub const BASE_VERTEX_BYTES: usize = 12 + 12 + 8;
    /// Extra bytes per vertex for a tangent.
    pub const TANGENT_BYTES: usize = 16;

    /// Stats of a regular `resolution × resolution` vertex grid with two
    /// triangles per quad.
    pub fn for_grid(resolution: u32, has_tangents: bool) -> Self {
        let res = resolution.max(2) as usize;
        let vertex_count = res * res;
        let index_count = (res - 1) * (res - 1) * 6;
        let index_format = if vertex_count <= usize::from(u16::MAX) {
            IndexFormat::U16
        } else {
            IndexFormat::U32
        };
        Self {
            vertex_count,
            index_count,
            has_tangents,
            index_format,
        }
    }

    /// Approximate GPU footprint of the mesh.
    pub fn estimated_bytes(&self) -> usize {
        let per_vertex = Self::BASE_VERTEX_BYTES
            + if self.has_tangents {
                Self::TANGENT_BYTES
            } else {
                0
            };
        self.vertex_count * per_vertex + self.index_count * self.index_format.size()
    }
}

/// Everything a geometry builder needs to build one tile.
#[derive(Clone, Copy)]
pub struct GeometryRequest<'a> {
    pub key: TileKey,
    pub mesh_resolution: u32,
    pub tiles_per_side: u16,
    /// Frame of the tile's face, from the shared derivation.
    pub axes: FaceAxes,
    pub sphere_radius: f32,
    pub height_scale: f32,
    pub uniform_scale: f32,
    /// Displacement happens on the GPU; the builder only lays out the grid.
    pub use_gpu_deformation: bool,
    pub height: Option<&'a dyn HeightSource>,
}

/// Builds or rebuilds tile geometry in place.
pub trait GeometryBuilder<R> {
    /// Fill `resource` with the geometry described by `request`.
    ///
    /// `resource` may come from the pool and still hold another tile's
    /// mesh. Return [`GeometryError::IncompatibleResource`] if it cannot be
    /// reused.
    fn build(&mut self, resource: &mut R, request: &GeometryRequest<'_>) -> Result<GeometryStats, GeometryError>;
}

/// Per-tile creation parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileCreateConfig {
    pub key: TileKey,
    pub mesh_resolution: u32,
    pub tiles_per_side: u16,
    pub sphere_radius: f32,
    pub height_scale: f32,
    pub uniform_scale: f32,
    pub use_gpu_deformation: bool,
}

/// Resource acquisition counters since the last [`TileFactory::take_stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FactoryStats {
    /// Resources taken from the cache pool.
    pub rented_from_pool: usize,
    /// Resources allocated through the provider.
    pub newly_allocated: usize,
    /// Pooled resources the builder rejected and that were destroyed.
    pub discarded_incompatible: usize,
}

/// Creates tiles, reusing pooled resources before allocating new ones.
pub struct TileFactory<P, G> {
    provider: P,
    builder: G,
    axes: [FaceAxes; 6],
    stats: FactoryStats,
}

impl<P, G> TileFactory<P, G>
where
    P: RenderResourceProvider,
    G: GeometryBuilder<P::Resource>,
{
    pub fn new(provider: P, builder: G) -> Self {
        Self {
            provider,
            builder,
            axes: FaceAxes::all(),
            stats: FactoryStats::default(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn builder(&self) -> &G {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut G {
        &mut self.builder
    }

    /// Frame the factory hands to the geometry builder for `face`.
    pub fn face_axes(&self, face: u8) -> FaceAxes {
        self.axes[usize::from(face).min(FaceAxes::FACE_COUNT - 1)]
    }

    /// Counters accumulated since the previous call; resets them.
    pub fn take_stats(&mut self) -> FactoryStats {
        std::mem::take(&mut self.stats)
    }

    /// Release a resource through the provider.
    pub fn destroy(&mut self, resource: P::Resource) {
        self.provider.destroy(resource);
    }

    /// Create the tile described by `cfg`.
    ///
    /// A pooled resource from `cache` is used when one is available. If the
    /// builder rejects it as incompatible, it is destroyed and creation is
    /// retried once with a fresh allocation. On failure every resource
    /// acquired by this call has already been released.
    pub fn create(
        &mut self,
        cfg: &TileCreateConfig,
        height: Option<&dyn HeightSource>,
        cache: &mut TileCache<P::Resource>,
        now: f64,
    ) -> Result<CachedTile<P::Resource>, FactoryError> {
        let key = cfg.key;
        let request = GeometryRequest {
            key,
            mesh_resolution: cfg.mesh_resolution,
            tiles_per_side: cfg.tiles_per_side,
            axes: self.face_axes(key.face),
            sphere_radius: cfg.sphere_radius,
            height_scale: cfg.height_scale,
            uniform_scale: cfg.uniform_scale,
            use_gpu_deformation: cfg.use_gpu_deformation,
            height,
        };

        if let Some(mut resource) = cache.rent_from_pool() {
            self.stats.rented_from_pool += 1;
            resource.set_visible(false);
            match self.builder.build(&mut resource, &request) {
                Ok(stats) => return Ok(Self::finish(key, resource, stats, now)),
                Err(GeometryError::IncompatibleResource) => {
                    debug!(%key, "pooled resource incompatible, allocating fresh");
                    self.stats.discarded_incompatible += 1;
                    self.provider.destroy(resource);
                }
                Err(source) => {
                    self.provider.destroy(resource);
                    return Err(FactoryError::Geometry { key, source });
                }
            }
        }

        let mut resource = self
            .provider
            .allocate(key)
            .map_err(|source| FactoryError::ResourceExhausted { key, source })?;
        self.stats.newly_allocated += 1;

        match self.builder.build(&mut resource, &request) {
            Ok(stats) => Ok(Self::finish(key, resource, stats, now)),
            Err(source) => {
                warn!(%key, error = %source, "geometry build failed on a fresh resource");
                self.provider.destroy(resource);
                Err(FactoryError::Geometry { key, source })
            }
        }
    }

    fn finish(
        key: TileKey,
        resource: P::Resource,
        stats: GeometryStats,
        now: f64,
    ) -> CachedTile<P::Resource> {
        debug!(
            %key,
            vertices = stats.vertex_count,
            indices = stats.index_count,
            bytes = stats.estimated_bytes(),
            "tile built"
        );
        CachedTile::new(key, resource, stats.estimated_bytes(), now)
    }
}

impl TileCreateConfig {
    /// Creation parameters for `key` under `planet`.
    pub fn from_planet(key: TileKey, planet: &orbis_config::PlanetConfig) -> Self {
        Self {
            key,
            mesh_resolution: planet.mesh_resolution,
            tiles_per_side: planet.tiles_per_side,
            sphere_radius: planet.sphere_radius,
            height_scale: planet.height_scale,
            uniform_scale: planet.uniform_scale,
            use_gpu_deformation: planet.use_gpu_deformation,
        }
    }
}
