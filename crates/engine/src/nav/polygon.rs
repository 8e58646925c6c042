use crate::app::Vec2;

use super::walkable::Bounds;
use super::NavError;

/// Distance in world units within which a point counts as lying on an edge.
pub const EDGE_EPSILON: f32 = 0.001;

const MIN_VERTICES: usize = 3;
const MIN_TWICE_AREA: f64 = 1e-6;

/// A named polygon tagged walkable or obstacle.
///
/// Containment is edge-inclusive: a point within [`EDGE_EPSILON`] of any edge
/// (including the implicit closing edge) is inside. Everything else uses the
/// even-odd rule, so winding order does not matter.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRegion {
    name: String,
    walkable: bool,
    vertices: Vec<Vec2>,
    bounds: Bounds,
}

impl PolygonRegion {
    pub fn new(
        name: impl Into<String>,
        walkable: bool,
        vertices: Vec<Vec2>,
    ) -> Result<Self, NavError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(NavError::EmptyRegionName);
        }
        if vertices.len() < MIN_VERTICES {
            return Err(NavError::TooFewVertices {
                region: name,
                count: vertices.len(),
            });
        }
        if let Some(index) = vertices
            .iter()
            .position(|vertex| !vertex.x.is_finite() || !vertex.y.is_finite())
        {
            return Err(NavError::NonFiniteVertex {
                region: name,
                index,
            });
        }
        if twice_signed_area(&vertices).abs() < MIN_TWICE_AREA {
            return Err(NavError::DegeneratePolygon { region: name });
        }
        if let Some((first, second)) = find_crossing_edges(&vertices) {
            return Err(NavError::SelfIntersecting {
                region: name,
                first,
                second,
            });
        }

        let bounds = Bounds::enclosing(vertices.iter().copied())
            .ok_or_else(|| NavError::DegeneratePolygon {
                region: name.clone(),
            })?;
        Ok(Self {
            name,
            walkable,
            vertices,
            bounds,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn walkable(&self) -> bool {
        self.walkable
    }

    pub(crate) fn set_walkable(&mut self, walkable: bool) {
        self.walkable = walkable;
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        if !point.x.is_finite() || !point.y.is_finite() {
            return false;
        }
        if !self.bounds.expanded(EDGE_EPSILON).contains(point) {
            return false;
        }
        if self.is_on_boundary(point) {
            return true;
        }

        let mut inside = false;
        let mut j = self.vertices.len() - 1;
        for i in 0..self.vertices.len() {
            let a = self.vertices[i];
            let b = self.vertices[j];
            if (a.y > point.y) != (b.y > point.y) {
                let cross_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < cross_x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    fn is_on_boundary(&self, point: Vec2) -> bool {
        self.edges()
            .any(|(a, b)| distance_sq_to_segment(point, a, b) <= EDGE_EPSILON * EDGE_EPSILON)
    }

    fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let count = self.vertices.len();
        (0..count).map(move |i| (self.vertices[i], self.vertices[(i + 1) % count]))
    }
}

fn twice_signed_area(vertices: &[Vec2]) -> f64 {
    let count = vertices.len();
    (0..count)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % count];
            a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64
        })
        .sum()
}

fn distance_sq_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let length_sq = abx * abx + aby * aby;
    let t = if length_sq > 0.0 {
        (((point.x - a.x) * abx + (point.y - a.y) * aby) / length_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let dx = point.x - (a.x + abx * t);
    let dy = point.y - (a.y + aby * t);
    dx * dx + dy * dy
}

/// Returns the first pair of non-adjacent edges that touch or cross.
fn find_crossing_edges(vertices: &[Vec2]) -> Option<(usize, usize)> {
    let count = vertices.len();
    for first in 0..count {
        for second in (first + 1)..count {
            let adjacent = second == first + 1 || (first == 0 && second == count - 1);
            if adjacent {
                continue;
            }
            let (a, b) = (vertices[first], vertices[(first + 1) % count]);
            let (c, d) = (vertices[second], vertices[(second + 1) % count]);
            if segments_intersect(a, b, c, d) {
                return Some((first, second));
            }
        }
    }
    None
}

fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    (b.x as f64 - a.x as f64) * (c.y as f64 - a.y as f64)
        - (b.y as f64 - a.y as f64) * (c.x as f64 - a.x as f64)
}

fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn segments_intersect(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    let d1 = orientation(c, d, a);
    let d2 = orientation(c, d, b);
    let d3 = orientation(a, b, c);
    let d4 = orientation(a, b, d);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(c, d, a))
        || (d2 == 0.0 && on_segment(c, d, b))
        || (d3 == 0.0 && on_segment(a, b, c))
        || (d4 == 0.0 && on_segment(a, b, d))
}
