//! In-crate test doubles for the streaming collaborators.

use std::cell::Cell;
use std::rc::Rc;

use orbis_cubesphere::{FaceAxes, TileKey};
use orbis_culling::{CullingProvider, Frustum};
use rustc_hash::FxHashSet;

use crate::cache::TileResource;
use crate::error::{GeometryError, ResourceError};
use crate::factory::{GeometryBuilder, GeometryRequest, GeometryStats, RenderResourceProvider};

/// Resource handle with an externally controllable liveness flag.
#[derive(Debug)]
pub struct MockResource {
    pub id: u32,
    pub visible: bool,
    pub builds: u32,
    alive: Rc<Cell<bool>>,
}

impl MockResource {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            visible: false,
            builds: 0,
            alive: Rc::new(Cell::new(true)),
        }
    }

    /// Shared flag; setting it to `false` kills the handle.
    pub fn alive_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.alive)
    }
}

impl TileResource for MockResource {
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_alive(&self) -> bool {
        self.alive.get()
    }
}

/// Provider recording allocations and destructions, with an optional cap
/// on live resources.
#[derive(Debug, Default)]
pub struct RecordingProvider {
    pub cap: Option<usize>,
    pub allocated: usize,
    pub destroyed: Vec<u32>,
    next_id: u32,
}

impl RecordingProvider {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            cap: Some(cap),
            ..Default::default()
        }
    }

    /// Allocated resources not yet destroyed.
    pub fn live(&self) -> usize {
        self.allocated - self.destroyed.len()
    }
}

impl RenderResourceProvider for RecordingProvider {
    type Resource = MockResource;

    fn allocate(&mut self, _key: TileKey) -> Result<MockResource, ResourceError> {
        if self.cap.is_some_and(|cap| self.live() >= cap) {
            return Err(ResourceError::Exhausted);
        }
        self.next_id += 1;
        self.allocated += 1;
        Ok(MockResource::new(1000 + self.next_id))
    }

    fn destroy(&mut self, resource: MockResource) {
        self.destroyed.push(resource.id);
    }
}

/// Builder counting builds; can reject reused resources or fail given keys.
#[derive(Debug, Default)]
pub struct CountingBuilder {
    pub builds: usize,
    pub reject_reused: bool,
    pub fail_keys: FxHashSet<TileKey>,
    pub built_keys: Vec<TileKey>,
    pub last_axes: Option<FaceAxes>,
}

impl GeometryBuilder<MockResource> for CountingBuilder {
    fn build(
        &mut self,
        resource: &mut MockResource,
        request: &GeometryRequest<'_>,
    ) -> Result<GeometryStats, GeometryError> {
        if self.reject_reused && resource.builds > 0 {
            return Err(GeometryError::IncompatibleResource);
        }
        if self.fail_keys.contains(&request.key) {
            return Err(GeometryError::Failed(format!("scripted failure for {}", request.key)));
        }
        self.builds += 1;
        self.built_keys.push(request.key);
        self.last_axes = Some(request.axes);
        resource.builds += 1;
        Ok(GeometryStats::for_grid(request.mesh_resolution, !request.use_gpu_deformation))
    }
}

/// Culling provider returning a fixed key list in a fixed order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCulling {
    pub keys: Vec<TileKey>,
    pub tiles_per_side: u16,
    pub rebuilds: usize,
    pub last_max_elevation: f32,
    /// Face whose reported frame is deliberately wrong.
    pub skewed_face: Option<u8>,
}

impl ScriptedCulling {
    pub fn new(keys: Vec<TileKey>) -> Self {
        Self {
            keys,
            tiles_per_side: 1,
            ..Default::default()
        }
    }
}

impl CullingProvider for ScriptedCulling {
    fn precompute_enabled(&self) -> bool {
        false
    }

    fn tiles_per_side(&self) -> u16 {
        self.tiles_per_side
    }

    fn rebuild_precompute(&mut self, _sphere_radius: f32, max_elevation: f32, tiles_per_side: u16) {
        self.rebuilds += 1;
        self.tiles_per_side = tiles_per_side;
        self.last_max_elevation = max_elevation;
    }

    fn visible_keys<'a>(&'a self, _frustum: &'a Frustum) -> impl Iterator<Item = TileKey> + 'a {
        self.keys.iter().copied()
    }

    fn face_axes(&self, face: u8) -> FaceAxes {
        let axes = FaceAxes::for_face(face);
        if self.skewed_face == Some(face) {
            FaceAxes {
                axis_a: axes.axis_a + axes.up * 0.1,
                ..axes
            }
        } else {
            axes
        }
    }
}
