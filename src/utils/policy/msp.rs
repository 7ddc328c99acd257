//! Monotone span programs: access trees over attribute ids and the share
//! generating matrices they compile to.
use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::io::{Cursor, Read, Write};
#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};
use tracing::debug;
use crate::error::{AbeError, Result};
use crate::utils::{
    file::{read_i32, read_len, read_u32, write_i32, write_len, write_u32},
    secretsharing::{reconstruction_coefficients, ReconstructionCoefficients},
};

const ZERO: i32 = 0;
const PLUS: i32 = 1;
const MINUS: i32 = -1;

/// A monotone boolean formula over attribute ids.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AccessTree {
    Leaf(u32),
    And(Box<AccessTree>, Box<AccessTree>),
    Or(Box<AccessTree>, Box<AccessTree>),
}

impl AccessTree {
    pub fn leaf(id: u32) -> AccessTree {
        AccessTree::Leaf(id)
    }

    pub fn and(left: AccessTree, right: AccessTree) -> AccessTree {
        AccessTree::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: AccessTree, right: AccessTree) -> AccessTree {
        AccessTree::Or(Box::new(left), Box::new(right))
    }

    /// Attribute ids in left-to-right leaf order.
    pub fn leaves(&self) -> Vec<u32> {
        match self {
            AccessTree::Leaf(id) => vec![*id],
            AccessTree::And(l, r) | AccessTree::Or(l, r) => {
                let mut ids = l.leaves();
                ids.extend(r.leaves());
                ids
            }
        }
    }

    /// Gate levels above the deepest leaf; a single leaf has depth 0.
    pub fn depth(&self) -> usize {
        match self {
            AccessTree::Leaf(_) => 0,
            AccessTree::And(l, r) | AccessTree::Or(l, r) => 1 + l.depth().max(r.depth()),
        }
    }

    /// Number of AND gates; the compiled matrix has one column more.
    pub fn and_gates(&self) -> usize {
        match self {
            AccessTree::Leaf(_) => 0,
            AccessTree::And(l, r) => 1 + l.and_gates() + r.and_gates(),
            AccessTree::Or(l, r) => l.and_gates() + r.and_gates(),
        }
    }

    /// Evaluates the formula directly against a set of held ids.
    pub fn is_satisfied_by(&self, held: &BTreeSet<u32>) -> bool {
        match self {
            AccessTree::Leaf(id) => held.contains(id),
            AccessTree::And(l, r) => l.is_satisfied_by(held) && r.is_satisfied_by(held),
            AccessTree::Or(l, r) => l.is_satisfied_by(held) || r.is_satisfied_by(held),
        }
    }

    /// Compiles the tree into a share generating matrix.
    ///
    /// Every AND gate claims a fresh column; the column counter is threaded
    /// through the recursion so parallel AND gates never share a column.
    /// The matrix has one row per leaf and exactly `1 + and_gates()` columns,
    /// which is at most `depth() + 1` only when no two AND gates sit in
    /// disjoint subtrees.
    pub fn compile(&self) -> Result<ShareGeneratingMatrix> {
        let (rows, width) = label(self, vec![PLUS], 1);
        let mut builder = MatrixBuilder::new();
        for (id, row) in rows {
            builder.add_row(id, row)?;
        }
        let matrix = builder.finalize()?;
        debug!(rows = matrix.rows(), columns = width, "compiled access tree");
        Ok(matrix)
    }
}

/// Labels `node` with `vector`; returns its rows and the next unused column.
fn label(node: &AccessTree, vector: Vec<i32>, width: usize) -> (Vec<(u32, Vec<i32>)>, usize) {
    match node {
        AccessTree::Leaf(id) => (vec![(*id, vector)], width),
        AccessTree::Or(l, r) => {
            let (mut rows, width) = label(l, vector.clone(), width);
            let (right, width) = label(r, vector, width);
            rows.extend(right);
            (rows, width)
        }
        AccessTree::And(l, r) => {
            let column = width;
            let mut left_vector = vector;
            left_vector.resize(column, ZERO);
            left_vector.push(PLUS);
            let mut right_vector = vec![ZERO; column];
            right_vector.push(MINUS);
            let (mut rows, width) = label(l, left_vector, column + 1);
            let (right, width) = label(r, right_vector, width);
            rows.extend(right);
            (rows, width)
        }
    }
}

impl Display for AccessTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            AccessTree::Leaf(id) => write!(f, "{}", id),
            AccessTree::And(l, r) => write!(f, "({} AND {})", l, r),
            AccessTree::Or(l, r) => write!(f, "({} OR {})", l, r),
        }
    }
}

/// Mutable stage of a share generating matrix.
#[derive(Debug, Default)]
pub struct MatrixBuilder {
    rows: Vec<Vec<i32>>,
    row_to_id: Vec<u32>,
    id_to_row: HashMap<u32, usize>,
    width: usize,
}

impl MatrixBuilder {
    pub fn new() -> MatrixBuilder {
        MatrixBuilder::default()
    }

    /// Appends a row labeled with attribute `id`; returns its index.
    pub fn add_row(&mut self, id: u32, row: Vec<i32>) -> Result<usize> {
        if self.id_to_row.contains_key(&id) {
            return Err(AbeError::DuplicateAttribute { id });
        }
        let index = self.rows.len();
        self.width = self.width.max(row.len());
        self.rows.push(row);
        self.row_to_id.push(id);
        self.id_to_row.insert(id, index);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Zero-extends every row to the common width and freezes the matrix.
    pub fn finalize(self) -> Result<ShareGeneratingMatrix> {
        if self.rows.is_empty() || self.width == 0 {
            return Err(AbeError::EmptyMatrix);
        }
        let width = self.width;
        let matrix = self
            .rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, ZERO);
                row
            })
            .collect();
        Ok(ShareGeneratingMatrix {
            matrix,
            row_to_id: self.row_to_id,
            id_to_row: self.id_to_row,
            reconstruction: None,
        })
    }
}

/// A finalized LSSS matrix with its row labeling.
///
/// Every constructor checks that the matrix is rectangular and that rows and
/// attribute ids are in bijection.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "LabeledRows", into = "LabeledRows"))]
pub struct ShareGeneratingMatrix {
    matrix: Vec<Vec<i32>>,
    row_to_id: Vec<u32>,
    id_to_row: HashMap<u32, usize>,
    reconstruction: Option<ReconstructionCoefficients>,
}

/// Serde form of a [`ShareGeneratingMatrix`]: rows and their ids.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct LabeledRows {
    matrix: Vec<Vec<i32>>,
    attribute_ids: Vec<u32>,
}

#[cfg(feature = "serde")]
impl TryFrom<LabeledRows> for ShareGeneratingMatrix {
    type Error = AbeError;

    fn try_from(rows: LabeledRows) -> Result<Self> {
        ShareGeneratingMatrix::from_parts(rows.matrix, rows.attribute_ids)
    }
}

#[cfg(feature = "serde")]
impl From<ShareGeneratingMatrix> for LabeledRows {
    fn from(matrix: ShareGeneratingMatrix) -> Self {
        LabeledRows {
            matrix: matrix.matrix,
            attribute_ids: matrix.row_to_id,
        }
    }
}

impl PartialEq for ShareGeneratingMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.matrix == other.matrix && self.row_to_id == other.row_to_id
    }
}

impl Eq for ShareGeneratingMatrix {}

impl ShareGeneratingMatrix {
    /// Builds a matrix from rows labeled in order by `row_to_id`.
    pub fn from_parts(matrix: Vec<Vec<i32>>, row_to_id: Vec<u32>) -> Result<ShareGeneratingMatrix> {
        let cols = matrix.first().ok_or(AbeError::EmptyMatrix)?.len();
        if cols == 0 {
            return Err(AbeError::Deserialization("matrix has no columns".to_string()));
        }
        if let Some(row) = matrix.iter().position(|row| row.len() != cols) {
            return Err(AbeError::Deserialization(format!(
                "row {} has width {}, expected {}",
                row,
                matrix[row].len(),
                cols
            )));
        }
        if row_to_id.len() != matrix.len() {
            return Err(AbeError::Deserialization(format!(
                "{} row labels for {} rows",
                row_to_id.len(),
                matrix.len()
            )));
        }
        let mut id_to_row = HashMap::new();
        for (row, id) in row_to_id.iter().enumerate() {
            if id_to_row.insert(*id, row).is_some() {
                return Err(AbeError::Deserialization(format!(
                    "row labeling is not a bijection at attribute {} / row {}",
                    id, row
                )));
            }
        }
        Ok(ShareGeneratingMatrix {
            matrix,
            row_to_id,
            id_to_row,
            reconstruction: None,
        })
    }

    pub fn rows(&self) -> usize {
        self.matrix.len()
    }

    pub fn columns(&self) -> usize {
        self.matrix.first().map_or(0, |row| row.len())
    }

    pub fn matrix(&self) -> &[Vec<i32>] {
        &self.matrix
    }

    pub fn row(&self, index: usize) -> Option<&[i32]> {
        self.matrix.get(index).map(|row| row.as_slice())
    }

    pub fn attribute_id(&self, row: usize) -> Option<u32> {
        self.row_to_id.get(row).copied()
    }

    pub fn row_of(&self, id: u32) -> Option<usize> {
        self.id_to_row.get(&id).copied()
    }

    /// Attribute ids in row order.
    pub fn attribute_ids(&self) -> &[u32] {
        &self.row_to_id
    }

    /// Rows whose attribute is not held according to `holds`.
    pub fn unavailable_rows<F: Fn(u32) -> bool>(&self, holds: F) -> BTreeSet<usize> {
        self.row_to_id
            .iter()
            .enumerate()
            .filter(|(_, id)| !holds(**id))
            .map(|(row, _)| row)
            .collect()
    }

    /// Reconstruction coefficients for all rows except `unavailable`.
    pub fn reconstruction_coefficients(&self, unavailable: &BTreeSet<usize>) -> Result<ReconstructionCoefficients> {
        reconstruction_coefficients(&self.matrix, unavailable)
    }

    /// Like [`Self::reconstruction_coefficients`] but keeps the result,
    /// replacing whatever an earlier call stored.
    pub fn compute_reconstruction_coefficients(
        &mut self,
        unavailable: &BTreeSet<usize>,
    ) -> Result<&ReconstructionCoefficients> {
        let coefficients = reconstruction_coefficients(&self.matrix, unavailable)?;
        Ok(&*self.reconstruction.insert(coefficients))
    }

    pub fn last_reconstruction(&self) -> Option<&ReconstructionCoefficients> {
        self.reconstruction.as_ref()
    }

    /// Writes `rows, cols, entries, cols, rows, count, (id, row)*`, all as
    /// 4 byte big-endian integers.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let (rows, cols) = (self.rows(), self.columns());
        write_len(out, rows)?;
        write_len(out, cols)?;
        for entry in self.matrix.iter().flatten() {
            write_i32(out, *entry)?;
        }
        write_len(out, cols)?;
        write_len(out, rows)?;
        write_len(out, self.row_to_id.len())?;
        for (row, id) in self.row_to_id.iter().enumerate() {
            write_u32(out, *id)?;
            write_len(out, row)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(input: &mut R) -> Result<ShareGeneratingMatrix> {
        let rows = read_len(input)?;
        let cols = read_len(input)?;
        if rows == 0 {
            return Err(AbeError::EmptyMatrix);
        }
        if cols == 0 {
            return Err(AbeError::Deserialization("matrix has no columns".to_string()));
        }
        let mut matrix = Vec::new();
        for _ in 0..rows {
            let mut row = Vec::new();
            for _ in 0..cols {
                row.push(read_i32(input)?);
            }
            matrix.push(row);
        }
        let (restated_cols, restated_rows) = (read_len(input)?, read_len(input)?);
        if restated_cols != cols || restated_rows != rows {
            return Err(AbeError::Deserialization(format!(
                "matrix header {}x{} disagrees with restated {}x{}",
                rows, cols, restated_rows, restated_cols
            )));
        }
        let count = read_len(input)?;
        if count != rows {
            return Err(AbeError::Deserialization(format!(
                "{} row labels for {} rows",
                count, rows
            )));
        }
        let mut row_to_id: Vec<Option<u32>> = vec![None; rows];
        for _ in 0..count {
            let id = read_u32(input)?;
            let row = read_len(input)?;
            if row >= rows {
                return Err(AbeError::Deserialization(format!("row label {} out of range", row)));
            }
            if row_to_id[row].replace(id).is_some() {
                return Err(AbeError::Deserialization(format!("row {} labeled twice", row)));
            }
        }
        // count == rows and no row labeled twice, so every row is labeled
        let row_to_id = row_to_id.into_iter().flatten().collect();
        ShareGeneratingMatrix::from_parts(matrix, row_to_id)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<ShareGeneratingMatrix> {
        ShareGeneratingMatrix::read_from(&mut Cursor::new(bytes))
    }
}

impl Display for ShareGeneratingMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        let m: Vec<String> = self
            .matrix
            .iter()
            .map(|row| {
                let entries: Vec<String> = row.iter().map(|e| e.to_string()).collect();
                format!("({})", entries.join(","))
            })
            .collect();
        let pi: Vec<String> = self.row_to_id.iter().map(|id| id.to_string()).collect();
        write!(f, "{{m: [{}], pi: [{}], c: {}}}", m.join(","), pi.join(","), self.columns())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_tree() -> AccessTree {
        AccessTree::and(
            AccessTree::leaf(0),
            AccessTree::or(
                AccessTree::leaf(3),
                AccessTree::and(AccessTree::leaf(1), AccessTree::leaf(2)),
            ),
        )
    }

    fn unavailable_for(matrix: &ShareGeneratingMatrix, held: &BTreeSet<u32>) -> BTreeSet<usize> {
        matrix.unavailable_rows(|id| held.contains(&id))
    }

    #[test]
    fn test_tree_matrix_shape() {
        let matrix = test_tree().compile().unwrap();
        assert_eq!(matrix.rows(), 4);
        assert_eq!(matrix.columns(), 3);
        assert_eq!(
            matrix.matrix(),
            &[vec![1, 1, 0], vec![0, -1, 0], vec![0, -1, 1], vec![0, 0, -1]]
        );
        assert_eq!(matrix.attribute_ids(), &[0, 3, 1, 2]);
        assert_eq!(matrix.row_of(1), Some(2));
        assert_eq!(matrix.attribute_id(3), Some(2));
        assert_eq!(matrix.to_string(), "{m: [(1,1,0),(0,-1,0),(0,-1,1),(0,0,-1)], pi: [0,3,1,2], c: 3}");
    }

    #[test]
    fn and_subset_reconstructs() {
        let mut matrix = test_tree().compile().unwrap();
        let unavailable = unavailable_for(&matrix, &[0, 1, 2].into_iter().collect());
        let w = matrix.compute_reconstruction_coefficients(&unavailable).unwrap().clone();
        assert_eq!(w.coefficients(), &[1, 0, 1, 1]);
        assert_eq!(matrix.last_reconstruction(), Some(&w));
    }

    #[test]
    fn or_subset_reconstructs() {
        let mut matrix = test_tree().compile().unwrap();
        let unavailable = unavailable_for(&matrix, &[0, 3].into_iter().collect());
        let w = matrix.compute_reconstruction_coefficients(&unavailable).unwrap();
        assert_eq!(w.coefficients(), &[1, 1, 0, 0]);
    }

    #[test]
    fn stored_coefficients_are_replaced() {
        let mut matrix = test_tree().compile().unwrap();
        let first = unavailable_for(&matrix, &[0, 3].into_iter().collect());
        let second = unavailable_for(&matrix, &[1, 2].into_iter().collect());
        matrix.compute_reconstruction_coefficients(&first).unwrap();
        matrix.compute_reconstruction_coefficients(&second).unwrap();
        let w = matrix.last_reconstruction().unwrap();
        assert!(!w.reconstructs_target(matrix.matrix()));
    }

    #[test]
    fn duplicate_leaf_is_rejected() {
        let tree = AccessTree::and(AccessTree::leaf(0), AccessTree::leaf(0));
        assert!(matches!(tree.compile(), Err(AbeError::DuplicateAttribute { id: 0 })));
    }

    #[test]
    fn builder_rejects_duplicates_and_empty() {
        let mut builder = MatrixBuilder::new();
        assert!(builder.is_empty());
        builder.add_row(4, vec![1]).unwrap();
        assert!(matches!(builder.add_row(4, vec![1, 1]), Err(AbeError::DuplicateAttribute { id: 4 })));
        assert_eq!(builder.len(), 1);
        assert!(matches!(MatrixBuilder::new().finalize(), Err(AbeError::EmptyMatrix)));
    }

    #[test]
    fn one_row_per_leaf_and_one_column_per_and_gate() {
        let trees = vec![
            test_tree(),
            AccessTree::and(
                AccessTree::and(AccessTree::leaf(0), AccessTree::leaf(1)),
                AccessTree::and(AccessTree::leaf(2), AccessTree::leaf(3)),
            ),
            AccessTree::or(AccessTree::leaf(0), AccessTree::or(AccessTree::leaf(1), AccessTree::leaf(2))),
        ];
        for tree in trees {
            let matrix = tree.compile().unwrap();
            assert_eq!(matrix.rows(), tree.leaves().len());
            assert_eq!(matrix.columns(), tree.and_gates() + 1);
        }
        // without parallel AND gates the width also stays within depth + 1
        let chains = vec![
            test_tree(),
            AccessTree::and(
                AccessTree::leaf(0),
                AccessTree::and(AccessTree::leaf(1), AccessTree::and(AccessTree::leaf(2), AccessTree::leaf(3))),
            ),
            AccessTree::or(
                AccessTree::and(AccessTree::leaf(0), AccessTree::leaf(1)),
                AccessTree::leaf(2),
            ),
            AccessTree::leaf(5),
        ];
        for chain in chains {
            assert!(chain.compile().unwrap().columns() <= chain.depth() + 1);
        }
    }

    #[test]
    fn ragged_or_mislabeled_parts_are_rejected() {
        assert!(matches!(
            ShareGeneratingMatrix::from_parts(vec![vec![1, 1], vec![0]], vec![0, 1]),
            Err(AbeError::Deserialization(_))
        ));
        assert!(matches!(
            ShareGeneratingMatrix::from_parts(vec![vec![1, 1], vec![0, -1]], vec![4, 4]),
            Err(AbeError::Deserialization(_))
        ));
        assert!(matches!(
            ShareGeneratingMatrix::from_parts(vec![vec![1, 1], vec![0, -1]], vec![4]),
            Err(AbeError::Deserialization(_))
        ));
        assert!(matches!(
            ShareGeneratingMatrix::from_parts(Vec::new(), Vec::new()),
            Err(AbeError::EmptyMatrix)
        ));
        let matrix = test_tree().compile().unwrap();
        let rebuilt =
            ShareGeneratingMatrix::from_parts(matrix.matrix().to_vec(), matrix.attribute_ids().to_vec()).unwrap();
        assert_eq!(rebuilt, matrix);
        assert_eq!(rebuilt.row_of(2), Some(3));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_form_is_validated() {
        fn assert_serde<T: Serialize + serde::de::DeserializeOwned>() {}
        assert_serde::<ShareGeneratingMatrix>();
        assert_serde::<AccessTree>();

        let ragged = LabeledRows {
            matrix: vec![vec![1, 1], vec![0]],
            attribute_ids: vec![0, 1],
        };
        assert!(matches!(
            ShareGeneratingMatrix::try_from(ragged),
            Err(AbeError::Deserialization(_))
        ));
        let matrix = test_tree().compile().unwrap();
        let restored = ShareGeneratingMatrix::try_from(LabeledRows::from(matrix.clone())).unwrap();
        assert_eq!(restored, matrix);
    }

    #[test]
    fn single_leaf() {
        let matrix = AccessTree::leaf(9).compile().unwrap();
        assert_eq!(matrix.matrix(), &[vec![1]]);
    }

    #[test]
    fn matrix_round_trip() {
        let matrix = test_tree().compile().unwrap();
        let bytes = matrix.to_bytes().unwrap();
        // rows, cols, 12 entries, cols, rows, count, 4 labels
        assert_eq!(bytes.len(), 4 * (2 + 12 + 3 + 8));
        let restored = ShareGeneratingMatrix::from_bytes(&bytes).unwrap();
        assert_eq!(restored, matrix);
        assert_eq!(restored.row_of(3), Some(1));
    }

    #[test]
    fn inconsistent_matrix_bytes_are_rejected() {
        let matrix = test_tree().compile().unwrap();
        let mut bytes = matrix.to_bytes().unwrap();
        // restated column count
        bytes[4 * 14 + 3] = 7;
        assert!(matches!(
            ShareGeneratingMatrix::from_bytes(&bytes),
            Err(AbeError::Deserialization(_))
        ));

        let mut bytes = matrix.to_bytes().unwrap();
        // second label points at row 0 again
        let second_label_row = bytes.len() - 4 * 5;
        bytes[second_label_row + 3] = 0;
        assert!(matches!(
            ShareGeneratingMatrix::from_bytes(&bytes),
            Err(AbeError::Deserialization(_))
        ));

        assert!(ShareGeneratingMatrix::from_bytes(&bytes[..10]).is_err());
    }

    fn subsets(ids: &[u32]) -> Vec<BTreeSet<u32>> {
        (0..(1u32 << ids.len()))
            .map(|mask| {
                ids.iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, id)| *id)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn exhaustive_subsets_match_formula() {
        let (a, b, c, d, e) = (
            AccessTree::leaf(0),
            AccessTree::leaf(1),
            AccessTree::leaf(2),
            AccessTree::leaf(3),
            AccessTree::leaf(4),
        );
        let trees = vec![
            test_tree(),
            AccessTree::and(AccessTree::and(a.clone(), b.clone()), AccessTree::and(c.clone(), d.clone())),
            AccessTree::or(AccessTree::and(a.clone(), b.clone()), AccessTree::and(c.clone(), d.clone())),
            AccessTree::and(
                AccessTree::or(AccessTree::and(a.clone(), b.clone()), AccessTree::and(c.clone(), d.clone())),
                e.clone(),
            ),
            AccessTree::and(
                AccessTree::or(a.clone(), b.clone()),
                AccessTree::or(c.clone(), AccessTree::and(d.clone(), e.clone())),
            ),
            AccessTree::or(a, AccessTree::and(b, AccessTree::or(c, AccessTree::and(d, e)))),
        ];
        for tree in trees {
            let matrix = tree.compile().unwrap();
            for held in subsets(&tree.leaves()) {
                let unavailable = unavailable_for(&matrix, &held);
                let w = matrix.reconstruction_coefficients(&unavailable).unwrap();
                let satisfied = tree.is_satisfied_by(&held);
                assert_eq!(w.reconstructs_target(matrix.matrix()), satisfied, "{} with {:?}", tree, held);
                if satisfied {
                    assert_eq!(w.scale(), 1, "{} with {:?}", tree, held);
                }
                for row in &unavailable {
                    assert_eq!(w.coefficient(*row), 0);
                }
            }
        }
    }
}
