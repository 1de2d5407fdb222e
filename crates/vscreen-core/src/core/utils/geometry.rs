use nalgebra::{Point3, Vector3};

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Axis-aligned bounding box as `(min, max)` corners.
pub fn bounding_box(points: &[Point3<f64>]) -> Option<(Point3<f64>, Point3<f64>)> {
    let first = points.first()?;
    let (min, max) = points.iter().skip(1).fold((*first, *first), |(lo, hi), p| {
        (
            Point3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
            Point3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
        )
    });
    Some((min, max))
}

/// Unit normal of a (near) planar ring, from the sum of consecutive edge cross products.
pub fn ring_normal(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    let center = centroid(points)?;
    let mut normal = Vector3::zeros();
    for (k, p) in points.iter().enumerate() {
        let q = points[(k + 1) % points.len()];
        normal += (p - center).cross(&(q - center));
    }
    normal.try_normalize(1e-9)
}

/// Angle between two lines in degrees, folded into `[0, 90]`.
pub fn line_angle_degrees(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let cos = (a.dot(b) / (a.norm() * b.norm())).clamp(-1.0, 1.0).abs();
    cos.acos().to_degrees()
}

/// First three moments of a distance distribution: mean, standard deviation and
/// the signed cube root of the third central moment.
pub fn distance_moments(distances: &[f64]) -> [f64; 3] {
    if distances.is_empty() {
        return [0.0; 3];
    }
    let n = distances.len() as f64;
    let mean = distances.iter().sum::<f64>() / n;
    let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    let third = distances.iter().map(|d| (d - mean).powi(3)).sum::<f64>() / n;
    [mean, variance.sqrt(), third.cbrt()]
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn centroid_and_bounding_box_of_points() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, -2.0, 4.0),
            Point3::new(1.0, 5.0, 2.0),
        ];
        let c = centroid(&points).unwrap();
        assert!((c.x - 1.0).abs() < EPS && (c.y - 1.0).abs() < EPS && (c.z - 2.0).abs() < EPS);
        let (lo, hi) = bounding_box(&points).unwrap();
        assert_eq!(lo, Point3::new(0.0, -2.0, 0.0));
        assert_eq!(hi, Point3::new(2.0, 5.0, 4.0));
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn ring_normal_of_planar_hexagon_is_z() {
        let hexagon: Vec<_> = (0..6)
            .map(|k| {
                let t = std::f64::consts::PI / 3.0 * k as f64;
                Point3::new(1.4 * t.cos(), 1.4 * t.sin(), 3.0)
            })
            .collect();
        let normal = ring_normal(&hexagon).unwrap();
        assert!((normal.z.abs() - 1.0).abs() < EPS);
    }

    #[test]
    fn line_angle_is_folded() {
        let x = Vector3::x();
        assert!(line_angle_degrees(&x, &-x).abs() < 1e-6);
        assert!((line_angle_degrees(&x, &Vector3::y()) - 90.0).abs() < 1e-6);
    }

    #[test]
    fn moments_of_symmetric_distribution() {
        let [mean, std, skew] = distance_moments(&[1.0, 2.0, 3.0]);
        assert!((mean - 2.0).abs() < EPS);
        assert!((std - (2.0f64 / 3.0).sqrt()).abs() < EPS);
        assert!(skew.abs() < EPS);
    }

    #[test]
    fn round_to_three_decimals() {
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(-7.0004, 3), -7.0);
    }
}
