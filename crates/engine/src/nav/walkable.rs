use tracing::debug;

use crate::app::Vec2;

use super::polygon::PolygonRegion;
use super::NavError;

/// Axis-aligned rectangle, `min` inclusive and `max` inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_size(width: f32, height: f32) -> Self {
        Self {
            min: Vec2 { x: 0.0, y: 0.0 },
            max: Vec2 {
                x: width,
                y: height,
            },
        }
    }

    pub fn enclosing(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for point in iter {
            bounds.min.x = bounds.min.x.min(point.x);
            bounds.min.y = bounds.min.y.min(point.y);
            bounds.max.x = bounds.max.x.max(point.x);
            bounds.max.y = bounds.max.y.max(point.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    pub fn encloses(&self, other: &Bounds) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    pub fn clamp(&self, point: Vec2) -> Vec2 {
        Vec2 {
            x: point.x.clamp(self.min.x, self.max.x),
            y: point.y.clamp(self.min.y, self.max.y),
        }
    }

    pub fn expanded(&self, amount: f32) -> Self {
        Self {
            min: Vec2 {
                x: self.min.x - amount,
                y: self.min.y - amount,
            },
            max: Vec2 {
                x: self.max.x + amount,
                y: self.max.y + amount,
            },
        }
    }

    pub fn union(&self, other: &Bounds) -> Self {
        Self {
            min: Vec2 {
                x: self.min.x.min(other.min.x),
                y: self.min.y.min(other.min.y),
            },
            max: Vec2 {
                x: self.max.x.max(other.max.x),
                y: self.max.y.max(other.max.y),
            },
        }
    }
}

/// Union of walkable regions minus obstacle regions.
///
/// Region order is kept for iteration and authoring tools, but obstacles
/// always override walkable regions regardless of where they are declared.
/// Every mutation bumps `revision` so cached grids can detect staleness.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkableArea {
    regions: Vec<PolygonRegion>,
    bounds: Option<Bounds>,
    revision: u64,
}

impl WalkableArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_regions(regions: Vec<PolygonRegion>) -> Result<Self, NavError> {
        let mut area = Self::new();
        for region in regions {
            area.add_region(region)?;
        }
        Ok(area)
    }

    pub fn add_region(&mut self, region: PolygonRegion) -> Result<(), NavError> {
        if self.region(region.name()).is_some() {
            return Err(NavError::DuplicateRegionName {
                name: region.name().to_string(),
            });
        }
        debug!(
            region = region.name(),
            walkable = region.walkable(),
            vertex_count = region.vertices().len(),
            "walkable_region_added"
        );
        self.regions.push(region);
        self.touch();
        Ok(())
    }

    pub fn remove_region(&mut self, name: &str) -> Option<PolygonRegion> {
        let index = self.regions.iter().position(|region| region.name() == name)?;
        let removed = self.regions.remove(index);
        debug!(region = name, "walkable_region_removed");
        self.touch();
        Some(removed)
    }

    /// Returns false when no region has that name.
    pub fn set_region_walkable(&mut self, name: &str, walkable: bool) -> bool {
        let Some(region) = self.regions.iter_mut().find(|region| region.name() == name) else {
            return false;
        };
        if region.walkable() != walkable {
            region.set_walkable(walkable);
            self.touch();
        }
        true
    }

    pub fn region(&self, name: &str) -> Option<&PolygonRegion> {
        self.regions.iter().find(|region| region.name() == name)
    }

    pub fn regions(&self) -> &[PolygonRegion] {
        &self.regions
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn update_bounds(&mut self) {
        self.bounds = self
            .regions
            .iter()
            .map(PolygonRegion::bounds)
            .reduce(|acc, next| acc.union(&next));
    }

    pub fn is_walkable(&self, point: Vec2) -> bool {
        let inside_walkable = self
            .regions
            .iter()
            .any(|region| region.walkable() && region.contains_point(point));
        if !inside_walkable {
            return false;
        }
        !self
            .regions
            .iter()
            .any(|region| !region.walkable() && region.contains_point(point))
    }

    fn touch(&mut self) {
        self.update_bounds();
        self.revision = self.revision.saturating_add(1);
    }
}
