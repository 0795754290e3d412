use super::params::LookupError;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("Atom {0} cannot be bonded to itself")]
    SelfBond(usize),
}

/// Answers whether two atoms of the same molecule share a bond.
pub trait BondedAdjacency {
    fn are_bonded(&self, i: usize, j: usize) -> bool;
}

/// Adjacency for molecules without bonds, e.g. monatomic ions or rigid probes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBonds;

impl BondedAdjacency for NoBonds {
    fn are_bonded(&self, _i: usize, _j: usize) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Connectivity {
    neighbors: Vec<Vec<usize>>,
}

impl Connectivity {
    pub fn new(n_atoms: usize) -> Self {
        Self {
            neighbors: vec![Vec::new(); n_atoms],
        }
    }

    pub fn from_bonds(n_atoms: usize, bonds: &[(usize, usize)]) -> Result<Self, ConnectivityError> {
        let mut connectivity = Self::new(n_atoms);
        for &(i, j) in bonds {
            connectivity.add_bond(i, j)?;
        }
        Ok(connectivity)
    }

    pub fn n_atoms(&self) -> usize {
        self.neighbors.len()
    }

    pub fn n_bonds(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    fn check(&self, index: usize) -> Result<(), LookupError> {
        if index < self.neighbors.len() {
            Ok(())
        } else {
            Err(LookupError::AtomIndex {
                index,
                n_atoms: self.neighbors.len(),
            })
        }
    }

    pub fn add_bond(&mut self, i: usize, j: usize) -> Result<(), ConnectivityError> {
        self.check(i)?;
        self.check(j)?;
        if i == j {
            return Err(ConnectivityError::SelfBond(i));
        }
        if !self.neighbors[i].contains(&j) {
            self.neighbors[i].push(j);
            self.neighbors[j].push(i);
        }
        Ok(())
    }

    pub fn neighbors(&self, i: usize) -> Result<&[usize], LookupError> {
        self.check(i)?;
        Ok(&self.neighbors[i])
    }

    /// Number of bonds on the shortest path from `i` to `j`, if it is at most `max_bonds`.
    pub fn bond_separation(&self, i: usize, j: usize, max_bonds: usize) -> Option<usize> {
        if i >= self.n_atoms() || j >= self.n_atoms() {
            return None;
        }
        if i == j {
            return Some(0);
        }
        self.within(i, max_bonds)
            .into_iter()
            .find_map(|(atom, depth)| (atom == j).then_some(depth))
    }

    /// Every atom reachable from `start` in `1..=max_bonds` bonds, with its separation.
    pub fn within(&self, start: usize, max_bonds: usize) -> Vec<(usize, usize)> {
        let mut depth = vec![usize::MAX; self.n_atoms()];
        let mut found = Vec::new();
        let mut queue = VecDeque::new();
        if start >= self.n_atoms() {
            return found;
        }
        depth[start] = 0;
        queue.push_back(start);

        while let Some(atom) = queue.pop_front() {
            let next = depth[atom] + 1;
            if next > max_bonds {
                continue;
            }
            for &neighbor in &self.neighbors[atom] {
                if depth[neighbor] == usize::MAX {
                    depth[neighbor] = next;
                    found.push((neighbor, next));
                    queue.push_back(neighbor);
                }
            }
        }
        found
    }
}

impl BondedAdjacency for Connectivity {
    fn are_bonded(&self, i: usize, j: usize) -> bool {
        self.neighbors.get(i).is_some_and(|n| n.contains(&j))
    }
}
