//! Elevation sampling consumed by geometry builders.

/// Pure function from face UV to normalized elevation.
pub trait HeightSource {
    /// Normalized elevation in `[0, 1]` at `(u, v)`, each in `[0, 1]`.
    /// `0.5` is the undisplaced surface.
    fn sample01(&self, u: f32, v: f32) -> f32;

    /// Signed displacement at `(u, v)`: `(h - 0.5) * height_scale * uniform_scale`.
    fn sample_elevation(&self, u: f32, v: f32, height_scale: f32, uniform_scale: f32) -> f32 {
        (self.sample01(u, v) - 0.5) * height_scale * uniform_scale
    }
}

/// Height source with no relief.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlatHeight;

impl HeightSource for FlatHeight {
    fn sample01(&self, _u: f32, _v: f32) -> f32 {
        0.5
    }
}

/// Row-major grid of normalized samples, bilinearly interpolated.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightGrid {
    width: usize,
    height: usize,
    samples: Vec<f32>,
}

impl HeightGrid {
    /// Wrap `samples` (row-major, `width * height` long).
    ///
    /// Returns `None` if the dimensions are zero or do not match the sample
    /// count.
    pub fn new(width: usize, height: usize, samples: Vec<f32>) -> Option<Self> {
        if width == 0 || height == 0 || samples.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            samples,
        })
    }

    /// Build a grid by evaluating `f(u, v)` at every sample position.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(f32, f32) -> f32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let du = 1.0 / (width.max(2) - 1) as f32;
        let dv = 1.0 / (height.max(2) - 1) as f32;
        let mut samples = Vec::with_capacity(width * height);
        for j in 0..height {
            for i in 0..width {
                samples.push(f(i as f32 * du, j as f32 * dv).clamp(0.0, 1.0));
            }
        }
        Self::new(width, height, samples)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn at(&self, i: usize, j: usize) -> f32 {
        self.samples[j * self.width + i]
    }
}

impl HeightSource for HeightGrid {
    fn sample01(&self, u: f32, v: f32) -> f32 {
        let fx = u.clamp(0.0, 1.0) * (self.width - 1) as f32;
        let fy = v.clamp(0.0, 1.0) * (self.height - 1) as f32;
        let x0 = fx.floor() as usize;
        let y0 = fy.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let top = self.at(x0, y0) * (1.0 - tx) + self.at(x1, y0) * tx;
        let bottom = self.at(x0, y1) * (1.0 - tx) + self.at(x1, y1) * tx;
        top * (1.0 - ty) + bottom * ty
    }
}
