//! 2-D points, quadrilaterals, regression lines and perspective transforms
//! (spec §3 "Point<T>", "Quadrilateral<Point>", "RegressionLine", "PerspectiveTransform").

use std::ops::{Add, Mul, Sub};

/// A 2-D point over an arbitrary coordinate type.
///
/// `PointI` (integer) is used while walking pixels; `PointF` (double) is used once
/// sub-pixel precision matters (corner fitting, perspective sampling).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<T> {
    /// X coordinate.
    pub x: T,
    /// Y coordinate.
    pub y: T,
}

/// An integer point, used for pixel-grid walks.
pub type PointI = Point<i32>;
/// A floating-point point, used once sub-pixel precision matters.
pub type PointF = Point<f64>;

impl<T> Point<T> {
    /// Construct a point from its coordinates.
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl Point<i32> {
    /// Convert to a floating-point point.
    pub fn to_f64(self) -> PointF {
        PointF::new(self.x as f64, self.y as f64)
    }
}

impl Point<f64> {
    /// Round to the nearest integer point.
    pub fn round(self) -> PointI {
        PointI::new(self.x.round() as i32, self.y.round() as i32)
    }

    /// Euclidean (L2) norm.
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// L1 (taxicab) norm.
    pub fn l1_norm(self) -> f64 {
        self.x.abs() + self.y.abs()
    }

    /// L-infinity (Chebyshev) norm.
    pub fn l_inf_norm(self) -> f64 {
        self.x.abs().max(self.y.abs())
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2-D cross product (the z-component of the 3-D cross product).
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Normalize to unit length; returns the zero vector if length is zero.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            self
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    /// A vector perpendicular to this one (rotated 90 degrees counter-clockwise).
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// The "main direction" of a set of points: the principal axis obtained from the
    /// first point to the last, normalized. Used as a cheap direction estimate before
    /// a full regression-line fit is available.
    pub fn main_direction(points: &[PointF]) -> Self {
        match (points.first(), points.last()) {
            (Some(&first), Some(&last)) if points.len() > 1 => (last - first).normalized(),
            _ => Self::new(1.0, 0.0),
        }
    }

    /// Round to the nearest Bresenham-style 8-direction unit vector (one of
    /// (+-1, 0), (0, +-1), (+-1, +-1)), used to quantize a direction to an axis or
    /// diagonal step before a cursor walk.
    pub fn bresenham_direction(self) -> PointI {
        let d = self.normalized();
        PointI::new(
            round_to_unit(d.x),
            round_to_unit(d.y),
        )
    }
}

fn round_to_unit(v: f64) -> i32 {
    if v > 0.5 {
        1
    } else if v < -0.5 {
        -1
    } else {
        0
    }
}

impl<T: Add<Output = T>> Add for Point<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Sub<Output = T>> Sub for Point<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for PointF {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// An ordered set of four points: top-left, top-right, bottom-right, bottom-left.
///
/// The ordering is a convention, not a guarantee enforced by the type -- callers
/// that care about orientation must check it (see [`Quadrilateral::orientation`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrilateral<P> {
    /// Top-left corner.
    pub top_left: P,
    /// Top-right corner.
    pub top_right: P,
    /// Bottom-right corner.
    pub bottom_right: P,
    /// Bottom-left corner.
    pub bottom_left: P,
}

impl<P: Copy> Quadrilateral<P> {
    /// Construct a quadrilateral from its four corners.
    pub const fn new(top_left: P, top_right: P, bottom_right: P, bottom_left: P) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// The four corners in order, as an array.
    pub fn points(&self) -> [P; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    /// Rotate the corner labels by `n` quarter-turns (n in 0..4) without moving any
    /// point: `rotate(1)` relabels top-right as top-left, and so on.
    #[must_use]
    pub fn rotated_corners(&self, n: u8) -> Self {
        let pts = self.points();
        let n = (n % 4) as usize;
        Self::new(pts[n % 4], pts[(n + 1) % 4], pts[(n + 2) % 4], pts[(n + 3) % 4])
    }
}

impl Quadrilateral<PointF> {
    /// The centroid of the four corners.
    pub fn center(&self) -> PointF {
        let pts = self.points();
        let sum = pts.iter().fold(PointF::new(0.0, 0.0), |acc, &p| acc + p);
        sum * 0.25
    }

    /// The angle (radians) of the top-left -> top-right edge.
    pub fn orientation(&self) -> f64 {
        let d = self.top_right - self.top_left;
        d.y.atan2(d.x)
    }

    /// Axis-aligned bounding box as (min, max).
    pub fn bounding_box(&self) -> (PointF, PointF) {
        let pts = self.points();
        let mut min = pts[0];
        let mut max = pts[0];
        for p in &pts[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        (min, max)
    }

    /// Whether the four corners form a convex quadrilateral with no side
    /// disproportionately shorter than another.
    ///
    /// Spec: "cross-product signs all equal AND max/min cross-product ratio < 4,
    /// to reject near-degenerate quads that cause perspective instability."
    pub fn is_convex(&self) -> bool {
        let pts = self.points();
        let mut crosses = [0.0_f64; 4];
        for i in 0..4 {
            let a = pts[i];
            let b = pts[(i + 1) % 4];
            let c = pts[(i + 2) % 4];
            crosses[i] = (b - a).cross(c - b);
        }

        let all_positive = crosses.iter().all(|&c| c > 0.0);
        let all_negative = crosses.iter().all(|&c| c < 0.0);
        if !all_positive && !all_negative {
            return false;
        }

        let abs: Vec<f64> = crosses.iter().map(|c| c.abs()).collect();
        let max = abs.iter().cloned().fold(f64::MIN, f64::max);
        let min = abs.iter().cloned().fold(f64::MAX, f64::min);
        if min <= 0.0 {
            return false;
        }

        max / min < 4.0
    }

    /// Point-in-quadrilateral test using the winding/cross-product-sign method
    /// (assumes the quad is convex; behavior is undefined otherwise).
    pub fn contains(&self, p: PointF) -> bool {
        let pts = self.points();
        let mut sign = 0.0_f64;
        for i in 0..4 {
            let a = pts[i];
            let b = pts[(i + 1) % 4];
            let cross = (b - a).cross(p - a);
            if cross == 0.0 {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }

    /// Blend two quadrilaterals (e.g. an inner and outer ring corner fit) into one,
    /// after rotation-aligning `other` to `self` by nearest top-left corner.
    pub fn blend(&self, other: &Self) -> Self {
        let pts = self.points();
        let other_pts = other.points();

        let mut best_rotation = 0;
        let mut best_dist = f64::MAX;
        for rot in 0..4 {
            let d = (other_pts[rot] - pts[0]).length();
            if d < best_dist {
                best_dist = d;
                best_rotation = rot;
            }
        }

        let aligned = other.rotated_corners(best_rotation as u8).points();
        let blended: Vec<PointF> = pts
            .iter()
            .zip(aligned.iter())
            .map(|(&a, &b)| (a + b) * 0.5)
            .collect();

        Self::new(blended[0], blended[1], blended[2], blended[3])
    }
}

/// A least-squares line fit to a growing list of points, used for edge-following
/// while tracing finder/bull's-eye rings and alignment patterns.
#[derive(Debug, Clone, Default)]
pub struct RegressionLine {
    points: Vec<PointF>,
    /// Inward-direction hint: after fitting, the line's normal is flipped to match
    /// this hint whenever the angle between them would exceed 60 degrees.
    direction_hint: Option<PointF>,
    // Cached fit: (unit direction, a point on the line).
    fit: Option<(PointF, PointF)>,
}

impl RegressionLine {
    /// An empty regression line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inward-direction hint used to disambiguate the line's normal.
    pub fn set_direction_hint(&mut self, hint: PointF) {
        self.direction_hint = Some(hint);
        self.fit = None;
    }

    /// Number of points collected so far.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no points have been collected.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point and invalidate the cached fit.
    pub fn add(&mut self, p: PointF) {
        self.points.push(p);
        self.fit = None;
    }

    /// The centroid of all collected points.
    pub fn centroid(&self) -> PointF {
        let n = self.points.len().max(1) as f64;
        let sum = self.points.iter().fold(PointF::new(0.0, 0.0), |acc, &p| acc + p);
        sum * (1.0 / n)
    }

    /// Fit (or return the cached fit of) a line through the collected points:
    /// total least squares via the covariance matrix, expressed as (unit direction,
    /// a point on the line). Returns `None` if fewer than 2 points are collected.
    pub fn fit(&mut self) -> Option<(PointF, PointF)> {
        if let Some(fit) = self.fit {
            return Some(fit);
        }
        if self.points.len() < 2 {
            return None;
        }

        let centroid = self.centroid();
        let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
        for &p in &self.points {
            let d = p - centroid;
            sxx += d.x * d.x;
            sxy += d.x * d.y;
            syy += d.y * d.y;
        }

        // Principal axis of the 2x2 covariance matrix via the standard closed form
        // for a symmetric 2x2 eigenproblem.
        let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
        let mut direction = PointF::new(theta.cos(), theta.sin());

        if let Some(hint) = self.direction_hint {
            let normal = direction.perp();
            let angle = (normal.dot(hint) / (normal.length() * hint.length()).max(1e-12))
                .clamp(-1.0, 1.0)
                .acos();
            if angle > 60f64.to_radians() {
                direction = PointF::new(-direction.x, -direction.y);
            }
        }

        let fit = (direction, centroid);
        self.fit = Some(fit);
        Some(fit)
    }

    /// The signed distance of a point from the fitted line (positive on the side
    /// the normal points to). Returns `None` if the line cannot be fit yet.
    pub fn signed_distance(&mut self, p: PointF) -> Option<f64> {
        let (direction, origin) = self.fit()?;
        let normal = direction.perp();
        Some(normal.dot(p - origin))
    }

    /// Project a point onto the fitted line.
    pub fn project(&mut self, p: PointF) -> Option<PointF> {
        let (direction, origin) = self.fit()?;
        let t = direction.dot(p - origin);
        Some(origin + direction * t)
    }

    /// Remove points whose signed distance from the fit exceeds `max_signed_dist`,
    /// then refit; repeats until stable or no points remain.
    pub fn prune(&mut self, max_signed_dist: f64) {
        loop {
            if self.fit().is_none() {
                return;
            }
            let before = self.points.len();
            let pts = std::mem::take(&mut self.points);
            self.fit = None;
            for p in pts {
                let keep = {
                    let (direction, origin) = self.fit().unwrap_or_else(|| {
                        // Only one point left mid-filter; keep everything this round.
                        (PointF::new(1.0, 0.0), PointF::new(0.0, 0.0))
                    });
                    let normal = direction.perp();
                    normal.dot(p - origin).abs() <= max_signed_dist
                };
                if keep {
                    self.points.push(p);
                }
                self.fit = None;
            }
            if self.points.len() == before || self.points.len() < 2 {
                break;
            }
        }
    }

    /// Whether this line is reliable enough for extrapolation: enough points, and
    /// not too close to the extremes of near-axial that small errors blow up.
    pub fn is_high_resolution(&self) -> bool {
        if self.points.len() < 4 {
            return false;
        }
        let (min, max) = self
            .points
            .iter()
            .fold((PointF::new(f64::MAX, f64::MAX), PointF::new(f64::MIN, f64::MIN)), |(min, max), &p| {
                (
                    PointF::new(min.x.min(p.x), min.y.min(p.y)),
                    PointF::new(max.x.max(p.x), max.y.max(p.y)),
                )
            });
        (max - min).length() >= 4.0
    }

    /// Intersection of two fitted regression lines via the standard 2x2 solve.
    /// Returns `None` if either line is unfit or they are (near-)parallel.
    pub fn intersection(a: &mut Self, b: &mut Self) -> Option<PointF> {
        let (d1, o1) = a.fit()?;
        let (d2, o2) = b.fit()?;

        let denom = d1.cross(d2);
        if denom.abs() < 1e-12 {
            return None;
        }

        let diff = o2 - o1;
        let t = diff.cross(d2) / denom;
        Some(o1 + d1 * t)
    }
}

/// A 3x3 projective transform (homography), stored row-major as nine doubles.
///
/// Invalid transforms (built from a non-convex source or destination quad) are
/// represented by a sentinel whose entries are all NaN, rather than an `Option`,
/// so that callers can thread a transform through several stages and only check
/// validity once at the end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveTransform {
    m: [f64; 9],
}

impl PerspectiveTransform {
    /// The invalid sentinel transform.
    pub fn invalid() -> Self {
        Self { m: [f64::NAN; 9] }
    }

    /// Whether this transform is the invalid sentinel.
    pub fn is_valid(&self) -> bool {
        self.m.iter().all(|v| !v.is_nan())
    }

    fn unit_square_to_quad(q: &Quadrilateral<PointF>) -> Self {
        let p = q.points();
        let (p1, p2, p3, p4) = (p[0], p[1], p[2], p[3]);

        let dx3 = p1.x - p2.x + p3.x - p4.x;
        let dy3 = p1.y - p2.y + p3.y - p4.y;

        if dx3 == 0.0 && dy3 == 0.0 {
            // Affine case: no perspective term needed.
            return Self {
                m: [
                    p2.x - p1.x,
                    p2.y - p1.y,
                    0.0,
                    p3.x - p2.x,
                    p3.y - p2.y,
                    0.0,
                    p1.x,
                    p1.y,
                    1.0,
                ],
            };
        }

        let dx1 = p2.x - p3.x;
        let dx2 = p4.x - p3.x;
        let dy1 = p2.y - p3.y;
        let dy2 = p4.y - p3.y;

        let denom = dx1 * dy2 - dx2 * dy1;
        if denom == 0.0 {
            return Self::invalid();
        }

        let a13 = (dx3 * dy2 - dx2 * dy3) / denom;
        let a23 = (dx1 * dy3 - dx3 * dy1) / denom;

        Self {
            m: [
                p2.x - p1.x + a13 * p2.x,
                p2.y - p1.y + a13 * p2.y,
                a13,
                p4.x - p1.x + a23 * p4.x,
                p4.y - p1.y + a23 * p4.y,
                a23,
                p1.x,
                p1.y,
                1.0,
            ],
        }
    }

    fn invert(&self) -> Option<Self> {
        let m = self.m;
        // Cofactor-expansion inverse of the 3x3 matrix (row-major).
        let a = m[4] * m[8] - m[5] * m[7];
        let b = m[2] * m[7] - m[1] * m[8];
        let c = m[1] * m[5] - m[2] * m[4];
        let det = m[0] * a + m[3] * b + m[6] * c;
        if det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;

        let m00 = a * inv_det;
        let m01 = b * inv_det;
        let m02 = c * inv_det;
        let m10 = (m[5] * m[6] - m[3] * m[8]) * inv_det;
        let m11 = (m[0] * m[8] - m[2] * m[6]) * inv_det;
        let m12 = (m[2] * m[3] - m[0] * m[5]) * inv_det;
        let m20 = (m[3] * m[7] - m[4] * m[6]) * inv_det;
        let m21 = (m[1] * m[6] - m[0] * m[7]) * inv_det;
        let m22 = (m[0] * m[4] - m[1] * m[3]) * inv_det;

        Some(Self {
            m: [m00, m01, m02, m10, m11, m12, m20, m21, m22],
        })
    }

    fn compose(a: &Self, b: &Self) -> Self {
        let mut out = [0.0; 9];
        for row in 0..3 {
            for col in 0..3 {
                let mut sum = 0.0;
                for k in 0..3 {
                    sum += a.m[row * 3 + k] * b.m[k * 3 + col];
                }
                out[row * 3 + col] = sum;
            }
        }
        Self { m: out }
    }

    /// Build the homography mapping the unit square `(0,0)-(1,0)-(1,1)-(0,1)` to
    /// `src`, then `dst` to the unit square, and compose
    /// `unitToDst . (unitToSrc)^-1`, i.e. a transform from `src` coordinates to
    /// `dst` coordinates.
    pub fn from_quads(src: &Quadrilateral<PointF>, dst: &Quadrilateral<PointF>) -> Self {
        if !src.is_convex() || !dst.is_convex() {
            return Self::invalid();
        }

        let src_to_unit = match Self::unit_square_to_quad(src).invert() {
            Some(t) => t,
            None => return Self::invalid(),
        };
        let unit_to_dst = Self::unit_square_to_quad(dst);

        Self::compose(&unit_to_dst, &src_to_unit)
    }

    /// Apply the transform to a point, performing the homogeneous divide.
    pub fn apply(&self, p: PointF) -> PointF {
        let m = self.m;
        let x = m[0] * p.x + m[3] * p.y + m[6];
        let y = m[1] * p.x + m[4] * p.y + m[7];
        let w = m[2] * p.x + m[5] * p.y + m[8];
        if w == 0.0 {
            PointF::new(f64::NAN, f64::NAN)
        } else {
            PointF::new(x / w, y / w)
        }
    }

    /// The inverse transform, or the invalid sentinel if not invertible.
    pub fn inverse(&self) -> Self {
        self.invert().unwrap_or_else(Self::invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(tl: (f64, f64), tr: (f64, f64), br: (f64, f64), bl: (f64, f64)) -> Quadrilateral<PointF> {
        Quadrilateral::new(
            PointF::new(tl.0, tl.1),
            PointF::new(tr.0, tr.1),
            PointF::new(br.0, br.1),
            PointF::new(bl.0, bl.1),
        )
    }

    #[test]
    fn convex_square_is_convex() {
        let q = quad((0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0));
        assert!(q.is_convex());
    }

    #[test]
    fn degenerate_quad_is_not_convex() {
        let q = quad((0.0, 0.0), (10.0, 0.0), (5.0, 0.1), (0.0, 10.0));
        assert!(!q.is_convex());
    }

    #[test]
    fn perspective_transform_round_trips_square() {
        let src = quad((0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0));
        let dst = quad((100.0, 50.0), (140.0, 60.0), (135.0, 95.0), (95.0, 90.0));

        let t = PerspectiveTransform::from_quads(&src, &dst);
        assert!(t.is_valid());

        for (s, d) in src.points().iter().zip(dst.points().iter()) {
            let mapped = t.apply(*s);
            assert!((mapped.x - d.x).abs() < 1e-9);
            assert!((mapped.y - d.y).abs() < 1e-9);
        }

        let inv = t.inverse();
        assert!(inv.is_valid());
        for s in src.points() {
            let back = inv.apply(t.apply(s));
            assert!((back.x - s.x).abs() < 1e-6);
            assert!((back.y - s.y).abs() < 1e-6);
        }
    }

    #[test]
    fn invalid_transform_for_non_convex_source() {
        let src = quad((0.0, 0.0), (10.0, 0.0), (5.0, 0.1), (0.0, 10.0));
        let dst = quad((0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0));
        let t = PerspectiveTransform::from_quads(&src, &dst);
        assert!(!t.is_valid());
    }

    #[test]
    fn regression_line_fits_horizontal_points() {
        let mut line = RegressionLine::new();
        for i in 0..10 {
            line.add(PointF::new(i as f64, 5.0));
        }
        let dist = line.signed_distance(PointF::new(3.0, 5.0)).unwrap();
        assert!(dist.abs() < 1e-9);
        let dist_off = line.signed_distance(PointF::new(3.0, 6.0)).unwrap().abs();
        assert!((dist_off - 1.0).abs() < 1e-9);
    }

    #[test]
    fn regression_line_intersection() {
        let mut a = RegressionLine::new();
        a.add(PointF::new(0.0, 0.0));
        a.add(PointF::new(10.0, 0.0));
        let mut b = RegressionLine::new();
        b.add(PointF::new(5.0, -5.0));
        b.add(PointF::new(5.0, 5.0));

        let p = RegressionLine::intersection(&mut a, &mut b).unwrap();
        assert!((p.x - 5.0).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }

    #[test]
    fn quad_blend_averages_nearest_aligned_corners() {
        let a = quad((0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0));
        let b = quad((2.0, 0.0), (12.0, 0.0), (12.0, 10.0), (2.0, 10.0));
        let blended = a.blend(&b);
        assert!((blended.top_left.x - 1.0).abs() < 1e-9);
    }
}
