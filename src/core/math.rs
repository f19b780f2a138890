// Math utilities and 2D geometry helpers

use glam::Vec2;

/// Clamp a value between min and max
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Distance from `x` to the line segment running from `p` to `q`.
///
/// A zero-length segment is treated as the single point `p`.
pub fn point_to_segment_distance(x: Vec2, p: Vec2, q: Vec2) -> f32 {
    let v = q - p;
    let len_sq = v.length_squared();
    if len_sq == 0.0 {
        return x.distance(p);
    }

    // Fraction along the segment of the nearest point
    let t = clamp((x - p).dot(v) / len_sq, 0.0, 1.0);
    x.distance(p + v * t)
}

/// Unit normal of the segment `p -> q`, rotated a quarter turn counter-clockwise
/// from the segment direction. `None` for a zero-length segment.
pub fn segment_normal(p: Vec2, q: Vec2) -> Option<Vec2> {
    (q - p).perp().try_normalize()
}

/// Mirror `v` about the unit normal `n`
pub fn reflect(v: Vec2, n: Vec2) -> Vec2 {
    v - n * (2.0 * v.dot(n))
}

/// Real roots of `a*t^2 + b*t + c = 0`, smallest first.
///
/// Falls back to the linear equation when `a` is zero. Returns `None` when
/// there is no real solution (or infinitely many).
pub fn solve_quadratic(a: f32, b: f32, c: f32) -> Option<(f32, f32)> {
    if a == 0.0 {
        if b == 0.0 {
            return None;
        }
        let t = -c / b;
        return Some((t, t));
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let t0 = (-b - root) / (2.0 * a);
    let t1 = (-b + root) / (2.0 * a);
    if t0 <= t1 {
        Some((t0, t1))
    } else {
        Some((t1, t0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn test_point_to_segment_interior() {
        let d = point_to_segment_distance(
            Vec2::new(0.0, 3.0),
            Vec2::new(-5.0, 0.0),
            Vec2::new(5.0, 0.0),
        );
        assert_relative_eq!(d, 3.0);
    }

    #[test]
    fn test_point_to_segment_past_endpoint() {
        // Nearest point is the endpoint (5, 0)
        let d = point_to_segment_distance(
            Vec2::new(8.0, 4.0),
            Vec2::new(-5.0, 0.0),
            Vec2::new(5.0, 0.0),
        );
        assert_relative_eq!(d, 5.0);
    }

    #[test]
    fn test_point_to_zero_length_segment() {
        let p = Vec2::new(1.0, 1.0);
        let d = point_to_segment_distance(Vec2::new(4.0, 5.0), p, p);
        assert_relative_eq!(d, 5.0);
    }

    #[test]
    fn test_segment_normal_is_left_perpendicular() {
        let n = segment_normal(Vec2::new(-5.0, -1.0), Vec2::new(5.0, -1.0)).unwrap();
        assert_relative_eq!(n.x, 0.0);
        assert_relative_eq!(n.y, 1.0);

        assert!(segment_normal(Vec2::ONE, Vec2::ONE).is_none());
    }

    #[test]
    fn test_reflect_keeps_tangent() {
        let n = segment_normal(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0)).unwrap();
        let v = reflect(Vec2::new(3.0, -2.0), n);
        assert_relative_eq!(v.x, 3.0);
        assert_relative_eq!(v.y, 2.0);

        // Speed is unchanged for a slanted normal too
        let n = Vec2::new(1.0, 1.0).normalize();
        let v = reflect(Vec2::new(-4.0, 1.0), n);
        assert_relative_eq!(v.length(), Vec2::new(-4.0, 1.0).length(), epsilon = 1e-5);
        assert_relative_eq!(v.dot(n), 3.0 / 2f32.sqrt(), epsilon = 1e-5);
    }

    #[test]
    fn test_solve_quadratic_orders_roots() {
        // (t - 2)(t - 4) = t^2 - 6t + 8, scaled by 4
        let (t0, t1) = solve_quadratic(4.0, -24.0, 32.0).unwrap();
        assert_relative_eq!(t0, 2.0);
        assert_relative_eq!(t1, 4.0);

        // Negative leading coefficient flips the raw order
        let (t0, t1) = solve_quadratic(-1.0, 6.0, -8.0).unwrap();
        assert_relative_eq!(t0, 2.0);
        assert_relative_eq!(t1, 4.0);
    }

    #[test]
    fn test_solve_quadratic_degenerate() {
        assert!(solve_quadratic(1.0, 0.0, 1.0).is_none());
        assert!(solve_quadratic(0.0, 0.0, 1.0).is_none());

        let (t0, t1) = solve_quadratic(0.0, 2.0, -4.0).unwrap();
        assert_relative_eq!(t0, 2.0);
        assert_relative_eq!(t1, 2.0);
    }
}
