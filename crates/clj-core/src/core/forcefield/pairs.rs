use super::connectivity::Connectivity;
use super::params::LookupError;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScaleFactor {
    pub coulomb: f64,
    pub lj: f64,
}

impl ScaleFactor {
    pub const ONE: ScaleFactor = ScaleFactor {
        coulomb: 1.0,
        lj: 1.0,
    };
    pub const ZERO: ScaleFactor = ScaleFactor {
        coulomb: 0.0,
        lj: 0.0,
    };

    pub fn new(coulomb: f64, lj: f64) -> Self {
        Self { coulomb, lj }
    }

    pub fn is_zero(&self) -> bool {
        self.coulomb == 0.0 && self.lj == 0.0
    }
}

/// Sparse, symmetric table of non-bonded scale factors for one molecule.
///
/// Atoms are numbered `0..n` in group order. Each pair of groups owns an optional
/// dense block; a group pair without a block takes the table default for every
/// atom pair, which lets evaluation skip per-pair lookups for it.
#[derive(Debug, Clone, PartialEq)]
pub struct PairScaleTable {
    default: ScaleFactor,
    group_offsets: Vec<usize>,
    atom_groups: Vec<usize>,
    blocks: HashMap<(usize, usize), Vec<ScaleFactor>>,
}

impl PairScaleTable {
    pub fn new(group_sizes: &[usize], default: ScaleFactor) -> Self {
        let mut group_offsets = Vec::with_capacity(group_sizes.len() + 1);
        let mut atom_groups = Vec::with_capacity(group_sizes.iter().sum());
        let mut offset = 0;
        for (group, &size) in group_sizes.iter().enumerate() {
            group_offsets.push(offset);
            atom_groups.extend(std::iter::repeat_n(group, size));
            offset += size;
        }
        group_offsets.push(offset);

        Self {
            default,
            group_offsets,
            atom_groups,
            blocks: HashMap::new(),
        }
    }

    /// Builds the usual exclusion table: 1-2 and 1-3 pairs are switched off and
    /// 1-4 pairs take `scale14`.
    pub fn from_connectivity(
        group_sizes: &[usize],
        connectivity: &Connectivity,
        scale14: ScaleFactor,
    ) -> Result<Self, LookupError> {
        let mut table = Self::new(group_sizes, ScaleFactor::ONE);
        if connectivity.n_atoms() != table.n_atoms() {
            return Err(LookupError::AtomCountMismatch {
                table: table.n_atoms(),
                topology: connectivity.n_atoms(),
            });
        }

        for i in 0..table.n_atoms() {
            for (j, separation) in connectivity.within(i, 3) {
                if j <= i {
                    continue;
                }
                let scale = if separation < 3 {
                    ScaleFactor::ZERO
                } else {
                    scale14
                };
                table.set(i, j, scale)?;
            }
        }
        debug!(
            "Built pair-scale table for {} atoms with {} non-default blocks",
            table.n_atoms(),
            table.blocks.len()
        );
        Ok(table)
    }

    pub fn default_scale(&self) -> ScaleFactor {
        self.default
    }

    pub fn n_atoms(&self) -> usize {
        self.atom_groups.len()
    }

    pub fn n_groups(&self) -> usize {
        self.group_offsets.len() - 1
    }

    pub fn group_size(&self, group: usize) -> Result<usize, LookupError> {
        self.check_group(group)?;
        Ok(self.group_offsets[group + 1] - self.group_offsets[group])
    }

    pub fn group_offset(&self, group: usize) -> Result<usize, LookupError> {
        self.check_group(group)?;
        Ok(self.group_offsets[group])
    }

    pub fn group_of(&self, atom: usize) -> Result<usize, LookupError> {
        self.atom_groups
            .get(atom)
            .copied()
            .ok_or(LookupError::AtomIndex {
                index: atom,
                n_atoms: self.n_atoms(),
            })
    }

    fn check_group(&self, group: usize) -> Result<(), LookupError> {
        if group < self.n_groups() {
            Ok(())
        } else {
            Err(LookupError::GroupIndex {
                index: group,
                n_groups: self.n_groups(),
            })
        }
    }

    /// Orders the pair so the lower group comes first and returns the flat
    /// index inside that block.
    fn locate(&self, i: usize, j: usize) -> Result<((usize, usize), usize), LookupError> {
        let (gi, gj) = (self.group_of(i)?, self.group_of(j)?);
        let ((ga, a), (gb, b)) = if gi <= gj {
            ((gi, i), (gj, j))
        } else {
            ((gj, j), (gi, i))
        };
        let n_cols = self.group_offsets[gb + 1] - self.group_offsets[gb];
        let row = a - self.group_offsets[ga];
        let col = b - self.group_offsets[gb];
        Ok(((ga, gb), row * n_cols + col))
    }

    pub fn get(&self, i: usize, j: usize) -> Result<ScaleFactor, LookupError> {
        let (key, slot) = self.locate(i, j)?;
        Ok(self
            .blocks
            .get(&key)
            .map_or(self.default, |block| block[slot]))
    }

    pub fn set(&mut self, i: usize, j: usize, scale: ScaleFactor) -> Result<(), LookupError> {
        let (key, slot) = self.locate(i, j)?;
        let (ga, gb) = key;
        let rows = self.group_offsets[ga + 1] - self.group_offsets[ga];
        let cols = self.group_offsets[gb + 1] - self.group_offsets[gb];
        let default = self.default;
        let block = self
            .blocks
            .entry(key)
            .or_insert_with(|| vec![default; rows * cols]);
        block[slot] = scale;

        if ga == gb {
            let offset = self.group_offsets[ga];
            block[(j - offset) * cols + (i - offset)] = scale;
        }
        Ok(())
    }

    pub fn block(&self, ga: usize, gb: usize) -> Result<ScaleBlock<'_>, LookupError> {
        self.check_group(ga)?;
        self.check_group(gb)?;
        let swapped = ga > gb;
        let key = if swapped { (gb, ga) } else { (ga, gb) };
        Ok(ScaleBlock {
            default: self.default,
            data: self.blocks.get(&key).map(Vec::as_slice),
            swapped,
            row_offset: self.group_offsets[key.0],
            col_offset: self.group_offsets[key.1],
            n_rows: self.group_offsets[key.0 + 1] - self.group_offsets[key.0],
            n_cols: self.group_offsets[key.1 + 1] - self.group_offsets[key.1],
        })
    }
}

/// Read-only view of the scale factors between two groups.
#[derive(Debug, Clone, Copy)]
pub struct ScaleBlock<'a> {
    default: ScaleFactor,
    data: Option<&'a [ScaleFactor]>,
    swapped: bool,
    row_offset: usize,
    col_offset: usize,
    n_rows: usize,
    n_cols: usize,
}

impl ScaleBlock<'_> {
    /// True when no pair in the block differs from the table default.
    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    pub fn default_scale(&self) -> ScaleFactor {
        self.default
    }

    /// True when every pair in the block is switched off. Within one group
    /// the diagonal is an atom paired with itself and is ignored.
    pub fn is_fully_excluded(&self) -> bool {
        let same_group = self.row_offset == self.col_offset;
        match self.data {
            None => self.default.is_zero(),
            Some(data) => data.iter().enumerate().all(|(k, scale)| {
                scale.is_zero() || (same_group && k / self.n_cols == k % self.n_cols)
            }),
        }
    }

    /// Scale factor for atom `i` of the first group and atom `j` of the second,
    /// both given as molecule-wide atom indices. Indices outside the block
    /// read as the table default.
    pub fn get(&self, i: usize, j: usize) -> ScaleFactor {
        let Some(data) = self.data else {
            return self.default;
        };
        let (a, b) = if self.swapped { (j, i) } else { (i, j) };
        let (Some(row), Some(col)) = (
            a.checked_sub(self.row_offset),
            b.checked_sub(self.col_offset),
        ) else {
            return self.default;
        };
        if row >= self.n_rows || col >= self.n_cols {
            return self.default;
        }
        data.get(row * self.n_cols + col)
            .copied()
            .unwrap_or(self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_pairs_take_the_table_default() {
        let table = PairScaleTable::new(&[2, 3], ScaleFactor::ONE);
        assert_eq!(table.get(0, 4), Ok(ScaleFactor::ONE));
        assert!(table.block(0, 1).unwrap().is_empty());
    }

    #[test]
    fn set_is_symmetric_within_and_across_groups() {
        let mut table = PairScaleTable::new(&[2, 3], ScaleFactor::ONE);
        let half = ScaleFactor::new(0.5, 0.5);
        table.set(0, 1, ScaleFactor::ZERO).unwrap();
        table.set(4, 1, half).unwrap();

        assert_eq!(table.get(0, 1), Ok(ScaleFactor::ZERO));
        assert_eq!(table.get(1, 0), Ok(ScaleFactor::ZERO));
        assert_eq!(table.get(1, 4), Ok(half));
        assert_eq!(table.get(4, 1), Ok(half));
        for i in 0..5 {
            for j in 0..5 {
                assert_eq!(table.get(i, j), table.get(j, i));
            }
        }
    }

    #[test]
    fn block_view_reads_in_either_group_order() {
        let mut table = PairScaleTable::new(&[2, 3], ScaleFactor::ONE);
        let partial = ScaleFactor::new(0.8333, 0.5);
        table.set(1, 3, partial).unwrap();

        let forward = table.block(0, 1).unwrap();
        let backward = table.block(1, 0).unwrap();
        assert!(!forward.is_empty());
        assert_eq!(forward.get(1, 3), partial);
        assert_eq!(backward.get(3, 1), partial);
        assert_eq!(forward.get(0, 2), ScaleFactor::ONE);
        assert!(table.block(1, 1).unwrap().is_empty());
    }

    #[test]
    fn block_get_outside_the_block_reads_the_default() {
        let mut table = PairScaleTable::new(&[2, 3], ScaleFactor::ONE);
        table.set(2, 3, ScaleFactor::ZERO).unwrap();

        let block = table.block(1, 1).unwrap();
        assert_eq!(block.get(2, 3), ScaleFactor::ZERO);
        assert_eq!(block.get(0, 3), ScaleFactor::ONE);
        assert_eq!(block.get(3, 0), ScaleFactor::ONE);
        assert_eq!(block.get(2, 5), ScaleFactor::ONE);
        assert_eq!(block.get(9, 2), ScaleFactor::ONE);
    }

    #[test]
    fn out_of_range_lookups_are_reported() {
        let table = PairScaleTable::new(&[2, 2], ScaleFactor::ONE);
        assert_eq!(
            table.get(0, 4),
            Err(LookupError::AtomIndex {
                index: 4,
                n_atoms: 4
            })
        );
        assert!(matches!(
            table.block(0, 2),
            Err(LookupError::GroupIndex { index: 2, n_groups: 2 })
        ));
    }

    #[test]
    fn zero_default_table_marks_every_block_excluded() {
        let table = PairScaleTable::new(&[3, 1], ScaleFactor::ZERO);
        assert!(table.block(0, 0).unwrap().is_fully_excluded());
        assert!(table.block(0, 1).unwrap().is_fully_excluded());
    }

    #[test]
    fn blocks_of_only_close_bonded_pairs_are_fully_excluded() {
        let conn = Connectivity::from_bonds(4, &[(0, 1), (1, 2), (2, 3)]).unwrap();
        let table =
            PairScaleTable::from_connectivity(&[2, 2], &conn, ScaleFactor::new(0.5, 0.5)).unwrap();

        assert!(table.block(0, 0).unwrap().is_fully_excluded());
        assert!(table.block(1, 1).unwrap().is_fully_excluded());
        assert!(!table.block(0, 1).unwrap().is_fully_excluded());
        assert!(!PairScaleTable::new(&[2], ScaleFactor::ONE)
            .block(0, 0)
            .unwrap()
            .is_fully_excluded());
    }

    #[test]
    fn from_connectivity_excludes_close_pairs_and_scales_one_four() {
        let conn = Connectivity::from_bonds(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap();
        let scale14 = ScaleFactor::new(1.0 / 1.2, 0.5);
        let table = PairScaleTable::from_connectivity(&[3, 2], &conn, scale14).unwrap();

        assert_eq!(table.get(0, 1), Ok(ScaleFactor::ZERO));
        assert_eq!(table.get(0, 2), Ok(ScaleFactor::ZERO));
        assert_eq!(table.get(0, 3), Ok(scale14));
        assert_eq!(table.get(4, 1), Ok(scale14));
        assert_eq!(table.get(0, 4), Ok(ScaleFactor::ONE));
    }

    #[test]
    fn from_connectivity_rejects_mismatched_atom_counts() {
        let conn = Connectivity::new(3);
        assert!(matches!(
            PairScaleTable::from_connectivity(&[2, 2], &conn, ScaleFactor::ONE),
            Err(LookupError::AtomCountMismatch { table: 4, topology: 3 })
        ));
    }
}
