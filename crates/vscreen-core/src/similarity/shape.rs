use crate::core::chem::features::Features;
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::{centroid, distance_moments};
use nalgebra::{Point3, Vector3, Vector4};

/// Scale applied to partial charges when they are used as a fourth coordinate.
const CHARGE_SCALE: f64 = 25.0;

pub const USR_LEN: usize = 12;
pub const USR_CAT_LEN: usize = 60;
pub const ELECTROSHAPE_LEN: usize = 15;

/// The four USR reference points: centroid, closest atom to it, farthest atom
/// from it, and the atom farthest from that one.
fn reference_points(points: &[Point3<f64>]) -> Option<[Point3<f64>; 4]> {
    let ctd = centroid(points)?;
    let closest = |from: &Point3<f64>, farthest: bool| {
        points
            .iter()
            .map(|p| (p, (p - from).norm()))
            .reduce(|best, cur| {
                let better = if farthest { cur.1 > best.1 } else { cur.1 < best.1 };
                if better { cur } else { best }
            })
            .map(|(p, _)| *p)
    };
    let cst = closest(&ctd, false)?;
    let fct = closest(&ctd, true)?;
    let ftf = closest(&fct, true)?;
    Some([ctd, cst, fct, ftf])
}

fn moments_from(refs: &[Point3<f64>; 4], points: &[Point3<f64>], out: &mut Vec<f64>) {
    for r in refs {
        let distances: Vec<f64> = points.iter().map(|p| (p - r).norm()).collect();
        out.extend(distance_moments(&distances));
    }
}

/// Ultrafast Shape Recognition descriptor over heavy atoms.
pub fn usr(molecule: &Molecule) -> Vec<f64> {
    let points = molecule.heavy_positions();
    let mut out = Vec::with_capacity(USR_LEN);
    match reference_points(&points) {
        Some(refs) => moments_from(&refs, &points, &mut out),
        None => out.resize(USR_LEN, 0.0),
    }
    out
}

/// USR with CREDO atom types: the plain descriptor followed by hydrophobic,
/// aromatic, acceptor and donor subsets, all measured from the same reference
/// points.
pub fn usr_cat(molecule: &Molecule) -> Vec<f64> {
    let heavy: Vec<usize> = molecule.heavy_atoms().collect();
    let points: Vec<Point3<f64>> = heavy.iter().map(|&i| molecule.atom(i).position).collect();
    let Some(refs) = reference_points(&points) else {
        return vec![0.0; USR_CAT_LEN];
    };
    let features = Features::compute(molecule);
    let subsets: [&dyn Fn(usize) -> bool; 4] = [
        &|i| features.hydrophobic[i],
        &|i| molecule.atom(i).aromatic,
        &|i| features.acceptor[i],
        &|i| features.donor[i],
    ];

    let mut out = Vec::with_capacity(USR_CAT_LEN);
    moments_from(&refs, &points, &mut out);
    for in_subset in subsets {
        let subset: Vec<Point3<f64>> = heavy
            .iter()
            .filter(|&&i| in_subset(i))
            .map(|&i| molecule.atom(i).position)
            .collect();
        if subset.is_empty() {
            out.extend([0.0; USR_LEN]);
        } else {
            moments_from(&refs, &subset, &mut out);
        }
    }
    out
}

/// ElectroShape descriptor: USR generalized to 4D points whose fourth
/// coordinate is the scaled partial charge.
pub fn electroshape(molecule: &Molecule) -> Vec<f64> {
    let points: Vec<Vector4<f64>> = molecule
        .heavy_atoms()
        .map(|i| {
            let a = molecule.atom(i);
            Vector4::new(a.position.x, a.position.y, a.position.z, a.partial_charge * CHARGE_SCALE)
        })
        .collect();
    if points.is_empty() {
        return vec![0.0; ELECTROSHAPE_LEN];
    }

    let c1 = points.iter().sum::<Vector4<f64>>() / points.len() as f64;
    let farthest = |from: &Vector4<f64>| {
        points
            .iter()
            .copied()
            .max_by(|a, b| (a - from).norm().total_cmp(&(b - from).norm()))
            .unwrap_or(*from)
    };
    let c2 = farthest(&c1);
    let c3 = farthest(&c2);

    let xyz = |v: &Vector4<f64>| Vector3::new(v.x, v.y, v.z);
    let a = xyz(&c2) - xyz(&c1);
    let b = xyz(&c3) - xyz(&c1);
    let cross = a.cross(&b);
    let c = if cross.norm() > 1e-9 {
        cross * (a.norm() / (2.0 * cross.norm()))
    } else {
        Vector3::zeros()
    };
    let (min_q, max_q) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.w), hi.max(p.w)));
    let c4 = c1 + Vector4::new(c.x, c.y, c.z, max_q);
    let c5 = c1 + Vector4::new(c.x, c.y, c.z, min_q);

    let mut out = Vec::with_capacity(ELECTROSHAPE_LEN);
    for r in [c1, c2, c3, c4, c5] {
        let distances: Vec<f64> = points.iter().map(|p| (p - r).norm()).collect();
        out.extend(distance_moments(&distances));
    }
    out
}

/// Inverse Manhattan similarity `1 / (1 + mean |a - b|)`, in `(0, 1]`.
pub fn shape_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mean = a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum::<f64>() / a.len() as f64;
    1.0 / (1.0 + mean)
}
