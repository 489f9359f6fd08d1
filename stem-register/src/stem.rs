use nalgebra::{Matrix4, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A single tree trunk: a homogeneous 3D coordinate plus a radius (DBH / 2).
///
/// Equality is coordinate+radius equality. Coordinates carry a homogeneous `1.0`
/// fourth component so a `Stem` can be transformed in place by a 4x4 matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stem {
    coords: Vector4<f64>,
    radius: f64,
}

impl Stem {
    pub fn new(x: f64, y: f64, z: f64, radius: f64) -> Self {
        Self {
            coords: Vector4::new(x, y, z, 1.0),
            radius,
        }
    }

    /// Homogeneous coordinates `(x, y, z, 1)`.
    pub fn coords(&self) -> Vector4<f64> {
        self.coords
    }

    /// Cartesian position `(x, y, z)`.
    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(self.coords.x, self.coords.y, self.coords.z)
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    fn transform(&self, m: &Matrix4<f64>) -> Self {
        Self {
            coords: m * self.coords,
            radius: self.radius,
        }
    }
}

/// An ordered collection of stems plus the cumulative 4x4 transform applied to it
/// since construction.
///
/// The transform accumulator always records the composition of every transform
/// applied via [`StemMap::apply_transform`]; [`StemMap::restore_original_coords`]
/// undoes it by applying its inverse and resetting the accumulator to identity.
#[derive(Debug, Clone, PartialEq)]
pub struct StemMap {
    stems: Vec<Stem>,
    transform: Matrix4<f64>,
}

impl Default for StemMap {
    fn default() -> Self {
        Self::new()
    }
}

impl StemMap {
    pub fn new() -> Self {
        Self {
            stems: Vec::new(),
            transform: Matrix4::identity(),
        }
    }

    pub fn from_stems(stems: Vec<Stem>) -> Self {
        Self {
            stems,
            transform: Matrix4::identity(),
        }
    }

    pub fn stems(&self) -> &[Stem] {
        &self.stems
    }

    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }

    /// Cumulative transform applied since construction.
    pub fn transform(&self) -> &Matrix4<f64> {
        &self.transform
    }

    pub fn add_stem(&mut self, stem: Stem) {
        self.stems.push(stem);
    }

    /// Remove the stem at `index`, shifting later indices down by one.
    ///
    /// Callers removing more than one index must delete in descending order to
    /// keep the remaining indices stable; [`StemMap::remove_indices`] is the
    /// preferred alternative for bulk removal since it does not have this pitfall.
    pub fn remove_stem(&mut self, index: usize) -> Stem {
        self.stems.remove(index)
    }

    /// Drop every stem whose index is in `indices`, in a single filtering pass.
    ///
    /// Unlike repeated [`StemMap::remove_stem`] calls this is order-independent:
    /// `indices` may be given in any order.
    pub fn remove_indices(&mut self, indices: &[usize]) {
        let drop: std::collections::HashSet<usize> = indices.iter().copied().collect();
        let mut kept = Vec::with_capacity(self.stems.len().saturating_sub(drop.len()));
        for (i, stem) in self.stems.iter().enumerate() {
            if !drop.contains(&i) {
                kept.push(*stem);
            }
        }
        self.stems = kept;
    }

    /// Apply a 4x4 transform to every stem's coordinates and fold it into the
    /// cumulative accumulator.
    pub fn apply_transform(&mut self, m: &Matrix4<f64>) {
        for stem in self.stems.iter_mut() {
            *stem = stem.transform(m);
        }
        self.transform = m * self.transform;
    }

    /// Undo every transform applied since construction and reset the accumulator.
    pub fn restore_original_coords(&mut self) {
        if let Some(inverse) = self.transform.try_inverse() {
            for stem in self.stems.iter_mut() {
                *stem = stem.transform(&inverse);
            }
        }
        self.transform = Matrix4::identity();
    }
}

impl std::fmt::Display for StemMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for stem in &self.stems {
            let p = stem.position();
            writeln!(
                f,
                "Coords : {} {} {}, Radius : {}",
                p.x,
                p.y,
                p.z,
                stem.radius()
            )?;
        }
        Ok(())
    }
}
