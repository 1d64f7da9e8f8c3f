//! Simulated render backend: CPU-side tile meshes and a bounded allocator.

use glam::{Vec2, Vec3};
use noise::{NoiseFn, Simplex};
use orbis_cubesphere::TileKey;
use orbis_streaming::{
    GeometryBuilder, GeometryError, GeometryRequest, GeometryStats, HeightGrid, IndexFormat,
    RenderResourceProvider, ResourceError, TileResource,
};

/// A tile mesh held in memory in place of a GPU object.
#[derive(Debug, Default)]
pub struct SimMesh {
    pub id: u32,
    pub visible: bool,
    /// Vertex grid resolution the buffers were sized for (0 when unused).
    pub resolution: u32,
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl TileResource for SimMesh {
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_alive(&self) -> bool {
        true
    }
}

/// Allocator with an optional limit on live meshes.
#[derive(Debug, Default)]
pub struct SimProvider {
    cap: Option<usize>,
    next_id: u32,
    live: usize,
    pub total_allocated: usize,
}

impl SimProvider {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            cap,
            ..Default::default()
        }
    }

    pub fn live(&self) -> usize {
        self.live
    }
}

impl RenderResourceProvider for SimProvider {
    type Resource = SimMesh;

    fn allocate(&mut self, _key: TileKey) -> Result<SimMesh, ResourceError> {
        if self.cap.is_some_and(|cap| self.live >= cap) {
            return Err(ResourceError::Exhausted);
        }
        self.next_id += 1;
        self.live += 1;
        self.total_allocated += 1;
        Ok(SimMesh {
            id: self.next_id,
            ..Default::default()
        })
    }

    fn destroy(&mut self, _resource: SimMesh) {
        self.live = self.live.saturating_sub(1);
    }
}

/// Builds a `resolution × resolution` vertex grid per tile.
///
/// With GPU deformation the grid stays on the undisplaced sphere;
/// otherwise heights are baked into the positions.
#[derive(Debug, Default)]
pub struct GridBuilder {
    pub builds: usize,
}

impl GeometryBuilder<SimMesh> for GridBuilder {
    fn build(&mut self, mesh: &mut SimMesh, request: &GeometryRequest<'_>) -> Result<GeometryStats, GeometryError> {
        let res = request.mesh_resolution;
        if res < 2 {
            return Err(GeometryError::Failed(format!("mesh resolution {res} below 2")));
        }
        if mesh.resolution != 0 && mesh.resolution != res {
            return Err(GeometryError::IncompatibleResource);
        }

        let n = f32::from(request.tiles_per_side.max(1));
        let step = 2.0 / n;
        let sx0 = -1.0 + f32::from(request.key.x) * step;
        let sy0 = -1.0 + f32::from(request.key.y) * step;
        let inv = 1.0 / (res - 1) as f32;

        mesh.positions.clear();
        mesh.uvs.clear();
        mesh.indices.clear();
        for j in 0..res {
            for i in 0..res {
                let sx = sx0 + i as f32 * inv * step;
                let sy = sy0 + j as f32 * inv * step;
                let uv = Vec2::new((sx + 1.0) * 0.5, (sy + 1.0) * 0.5);
                let dir = request.axes.cube_point(sx, sy).normalize();
                let mut radius = request.sphere_radius;
                if !request.use_gpu_deformation
                    && let Some(height) = request.height
                {
                    radius += height.sample_elevation(
                        uv.x,
                        uv.y,
                        request.height_scale,
                        request.uniform_scale,
                    );
                }
                mesh.positions.push(dir * radius);
                mesh.uvs.push(uv);
            }
        }
        for j in 0..res - 1 {
            for i in 0..res - 1 {
                let a = j * res + i;
                let b = a + 1;
                let c = a + res;
                let d = c + 1;
                mesh.indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }
        mesh.resolution = res;
        self.builds += 1;

        let vertex_count = mesh.positions.len();
        Ok(GeometryStats {
            vertex_count,
            index_count: mesh.indices.len(),
            has_tangents: false,
            index_format: if vertex_count <= usize::from(u16::MAX) {
                IndexFormat::U16
            } else {
                IndexFormat::U32
            },
        })
    }
}

/// Normalized simplex relief sampled into a grid.
pub fn simplex_heights(seed: u32, size: usize, frequency: f64) -> Option<HeightGrid> {
    let noise = Simplex::new(seed);
    HeightGrid::from_fn(size, size, |u, v| {
        let value = noise.get([f64::from(u) * frequency, f64::from(v) * frequency]);
        ((value + 1.0) * 0.5) as f32
    })
}
