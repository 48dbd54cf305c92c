use nalgebra as na;

#[inline]
pub fn distance(a: &na::Point2<f32>, b: &na::Point2<f32>) -> f32 {
    na::distance(a, b)
}

/// Integer midpoint of two points, rounded toward negative infinity.
#[inline]
pub fn midpoint_floor(a: &na::Point2<f32>, b: &na::Point2<f32>) -> na::Point2<i32> {
    na::Point2::new(
        ((a.x + b.x) / 2.0).floor() as i32,
        ((a.y + b.y) / 2.0).floor() as i32,
    )
}

/// Zeroth and first order area moments `(m00, m10, m01)` of a closed polygon.
///
/// Computed with Green's theorem over the polygon outline, so collinear
/// vertices do not change the result. `m00` is the unsigned area; the
/// first order moments are oriented to match it.
pub fn polygon_moments(poly: &[na::Point2<f64>]) -> (f64, f64, f64) {
    let n = poly.len();
    if n < 3 {
        return (0.0, 0.0, 0.0);
    }

    let mut a = 0.0;
    let mut mx = 0.0;
    let mut my = 0.0;

    for i in 0..n {
        let p = poly[i];
        let q = poly[(i + 1) % n];
        let cross = p.x * q.y - q.x * p.y;

        a += cross;
        mx += (p.x + q.x) * cross;
        my += (p.y + q.y) * cross;
    }

    let sign = if a < 0.0 { -1.0 } else { 1.0 };

    (sign * a / 2.0, sign * mx / 6.0, sign * my / 6.0)
}
