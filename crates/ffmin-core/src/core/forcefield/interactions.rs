use crate::core::models::molecule::Molecule;
use std::collections::VecDeque;

/// A nonbonded atom pair separated by at least three bonds (or disconnected).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonbondedPair {
    pub atoms: [usize; 2],
    /// Exactly three bonds apart.
    pub is_one_four: bool,
}

/// Bonded and nonbonded interaction lists derived from a molecule's topology.
#[derive(Debug, Clone, Default)]
pub struct Interactions {
    pub bonds: Vec<[usize; 2]>,
    /// Outer, center, outer.
    pub angles: Vec<[usize; 3]>,
    pub torsions: Vec<[usize; 4]>,
    pub nonbonded: Vec<NonbondedPair>,
}

impl Interactions {
    pub fn from_molecule(molecule: &Molecule) -> Self {
        let n = molecule.atom_count();
        let neighbors = |i: usize| molecule.bonded_neighbors(i).unwrap_or(&[]);

        let bonds: Vec<[usize; 2]> = molecule
            .bonds()
            .iter()
            .map(|b| [b.atom1, b.atom2])
            .collect();

        let mut angles = Vec::new();
        for center in 0..n {
            let nbrs = neighbors(center);
            for (a, &i) in nbrs.iter().enumerate() {
                for &k in &nbrs[a + 1..] {
                    angles.push([i, center, k]);
                }
            }
        }

        let mut torsions = Vec::new();
        for &[j, k] in &bonds {
            for &i in neighbors(j).iter().filter(|&&i| i != k) {
                for &l in neighbors(k).iter().filter(|&&l| l != j && l != i) {
                    torsions.push([i, j, k, l]);
                }
            }
        }

        let mut nonbonded = Vec::new();
        for i in 0..n {
            let separation = bond_separation(molecule, i, 3);
            for j in i + 1..n {
                match separation[j] {
                    Some(d) if d < 3 => {}
                    Some(3) => nonbonded.push(NonbondedPair {
                        atoms: [i, j],
                        is_one_four: true,
                    }),
                    _ => nonbonded.push(NonbondedPair {
                        atoms: [i, j],
                        is_one_four: false,
                    }),
                }
            }
        }

        Self {
            bonds,
            angles,
            torsions,
            nonbonded,
        }
    }

    /// Number of torsions sharing the central bond `j`–`k` (in either direction).
    pub fn torsions_about(&self, j: usize, k: usize) -> usize {
        self.torsions
            .iter()
            .filter(|t| (t[1] == j && t[2] == k) || (t[1] == k && t[2] == j))
            .count()
    }
}

/// Shortest bond-path length from `start` to every atom, up to `max_depth`.
fn bond_separation(molecule: &Molecule, start: usize, max_depth: usize) -> Vec<Option<usize>> {
    let mut depth = vec![None; molecule.atom_count()];
    depth[start] = Some(0);
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        let d = depth[current].unwrap_or(0);
        if d == max_depth {
            continue;
        }
        for &next in molecule.bonded_neighbors(current).unwrap_or(&[]) {
            if depth[next].is_none() {
                depth[next] = Some(d + 1);
                queue.push_back(next);
            }
        }
    }
    depth
}
