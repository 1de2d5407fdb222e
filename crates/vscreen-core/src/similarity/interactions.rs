//! Protein-ligand interaction detection.
//!
//! Every detected contact is attributed to one receptor residue and one of
//! [`CHANNEL_COUNT`] interaction channels.

use crate::core::chem::features::{AromaticRing, Features};
use crate::core::chem::receptor::PreparedReceptor;
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::line_angle_degrees;

pub const CHANNEL_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Channel {
    Hydrophobic = 0,
    PiStackingFace = 1,
    PiStackingEdge = 2,
    PiCationProteinRing = 3,
    PiCationLigandRing = 4,
    HalogenBond = 5,
    HBondProteinDonor = 6,
    HBondProteinAcceptor = 7,
    SaltBridge = 8,
    Metal = 9,
}

const HYDROPHOBIC_CUTOFF: f64 = 4.0;
const HBOND_CUTOFF: f64 = 3.5;
const HALOGEN_CUTOFF: f64 = 4.0;
const SALT_BRIDGE_CUTOFF: f64 = 4.0;
const METAL_CUTOFF: f64 = 2.8;
const PI_STACKING_CUTOFF: f64 = 5.0;
const PI_CATION_CUTOFF: f64 = 5.0;
const ANGLE_TOLERANCE: f64 = 30.0;

/// A single receptor-residue contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    pub residue: usize,
    pub channel: Channel,
}

/// All contacts between `ligand` and the receptor, in detection order.
pub fn detect(ligand: &Molecule, receptor: &PreparedReceptor) -> Vec<Interaction> {
    let lig = Features::compute(ligand);
    let rec = receptor.features();
    let mut found = Vec::new();
    let mut push = |atom: usize, channel: Channel| {
        if let Some(residue) = receptor.residue_of(atom) {
            found.push(Interaction { residue, channel });
        }
    };

    for i in ligand.heavy_atoms() {
        let position = ligand.atom(i).position;
        for (j, d) in receptor.heavy_atoms_within(&position, HYDROPHOBIC_CUTOFF) {
            if lig.hydrophobic[i] && rec.hydrophobic[j] {
                push(j, Channel::Hydrophobic);
            }
            if d <= HBOND_CUTOFF {
                if rec.donor[j] && lig.acceptor[i] {
                    push(j, Channel::HBondProteinDonor);
                }
                if rec.acceptor[j] && lig.donor[i] {
                    push(j, Channel::HBondProteinAcceptor);
                }
            }
            if d <= HALOGEN_CUTOFF && lig.halogen_donor[i] && rec.acceptor[j] {
                push(j, Channel::HalogenBond);
            }
            if d <= SALT_BRIDGE_CUTOFF && ((lig.cation[i] && rec.anion[j]) || (lig.anion[i] && rec.cation[j])) {
                push(j, Channel::SaltBridge);
            }
            if d <= METAL_CUTOFF && rec.metal[j] && (lig.acceptor[i] || lig.anion[i]) {
                push(j, Channel::Metal);
            }
        }
    }

    for lring in &lig.rings {
        for pring in &rec.rings {
            if (lring.centroid - pring.centroid).norm() > PI_STACKING_CUTOFF {
                continue;
            }
            let angle = line_angle_degrees(&lring.normal, &pring.normal);
            if angle <= ANGLE_TOLERANCE {
                push(pring.atoms[0], Channel::PiStackingFace);
            } else if angle >= 90.0 - ANGLE_TOLERANCE {
                push(pring.atoms[0], Channel::PiStackingEdge);
            }
        }
    }

    for pring in &rec.rings {
        for i in (0..ligand.atom_count()).filter(|&i| lig.cation[i]) {
            if cation_over_ring(pring, &ligand.atom(i).position) {
                push(pring.atoms[0], Channel::PiCationProteinRing);
            }
        }
    }
    let rec_molecule = receptor.molecule();
    for lring in &lig.rings {
        for (j, _) in receptor.heavy_atoms_within(&lring.centroid, PI_CATION_CUTOFF) {
            if rec.cation[j] && cation_over_ring(lring, &rec_molecule.atom(j).position) {
                push(j, Channel::PiCationLigandRing);
            }
        }
    }
    found
}

fn cation_over_ring(ring: &AromaticRing, cation: &nalgebra::Point3<f64>) -> bool {
    let offset = cation - ring.centroid;
    offset.norm() <= PI_CATION_CUTOFF
        && offset.norm() > 1e-6
        && line_angle_degrees(&ring.normal, &offset) <= ANGLE_TOLERANCE
}
