//! Sparse matrix formats.
//!
//! Assembly accumulates (row, col, value) triplets in a [`TripletMatrix`];
//! the solver works on a [`CsrMatrix`] built once from those triplets.
//! Duplicate triplets are summed during conversion, which is where shared-node
//! stiffness contributions from neighbouring elements are combined.

use crate::error::{Error, Result};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::coo::CooMatrix;
use nalgebra_sparse::csr::CsrMatrix as NalgebraCsr;
use nalgebra_sparse::ops::serial::spmm_csr_dense;
use nalgebra_sparse::ops::Op;
use nalgebra_sparse::{SparseEntry, SparseEntryMut};

/// Builder for assembling a sparse matrix from triplets (COO format).
///
/// Accumulates (row, col, value) triplets and converts to CSR when complete.
/// Explicit zeros are kept: a zero contribution still reserves its position in
/// the sparsity pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct TripletMatrix {
    n_rows: usize,
    n_cols: usize,
    /// Dimensions follow the largest index seen instead of being fixed.
    inferred: bool,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl TripletMatrix {
    /// Create a triplet matrix with fixed dimensions.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self::with_capacity(n_rows, n_cols, 0)
    }

    /// Create with fixed dimensions and an estimated triplet count.
    pub fn with_capacity(n_rows: usize, n_cols: usize, nnz_estimate: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            inferred: false,
            rows: Vec::with_capacity(nnz_estimate),
            cols: Vec::with_capacity(nnz_estimate),
            values: Vec::with_capacity(nnz_estimate),
        }
    }

    /// Create an empty triplet matrix whose dimensions are inferred as the
    /// maximum row/column index + 1.
    pub fn inferred() -> Self {
        Self {
            inferred: true,
            ..Self::new(0, 0)
        }
    }

    /// Add a value at (row, col). Duplicates are summed during conversion.
    ///
    /// Bounds of fixed-size matrices are validated by [`CsrMatrix::from_triplets`].
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if self.inferred {
            self.n_rows = self.n_rows.max(row + 1);
            self.n_cols = self.n_cols.max(col + 1);
        }
        self.rows.push(row);
        self.cols.push(col);
        self.values.push(value);
    }

    /// Add a dense submatrix at the specified DOF indices.
    ///
    /// This is the core operation for finite element assembly.
    pub fn add_submatrix(&mut self, dof_indices: &[usize], submatrix: &DMatrix<f64>) -> Result<()> {
        let n = dof_indices.len();
        if submatrix.nrows() != n {
            return Err(Error::dimension("local matrix rows", n, submatrix.nrows()));
        }
        if submatrix.ncols() != n {
            return Err(Error::dimension("local matrix columns", n, submatrix.ncols()));
        }

        for (a, &row) in dof_indices.iter().enumerate() {
            for (b, &col) in dof_indices.iter().enumerate() {
                self.add(row, col, submatrix[(a, b)]);
            }
        }
        Ok(())
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored triplets, duplicates included.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate stored triplets in insertion order.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .zip(&self.cols)
            .zip(&self.values)
            .map(|((&r, &c), &v)| (r, c, v))
    }

    /// Convert to CSR format, summing duplicate entries.
    pub fn to_csr(&self) -> Result<CsrMatrix> {
        CsrMatrix::from_triplets(self)
    }
}

impl Default for TripletMatrix {
    fn default() -> Self {
        Self::inferred()
    }
}

/// One triplet per stored CSR entry, in row-major order.
///
/// Used by consumers that want coordinate data, e.g. sparsity plots.
impl From<&CsrMatrix> for TripletMatrix {
    fn from(csr: &CsrMatrix) -> Self {
        let mut triplet = TripletMatrix::with_capacity(csr.nrows(), csr.ncols(), csr.nnz());
        for row in 0..csr.nrows() {
            for (col, value) in csr.row(row) {
                triplet.add(row, col, value);
            }
        }
        triplet
    }
}

/// Compressed Sparse Row matrix.
///
/// Wraps a `nalgebra_sparse` CSR matrix. Columns are strictly increasing
/// within each row. After construction the sparsity pattern is frozen:
/// [`zero_row`](Self::zero_row), [`zero_col`](Self::zero_col) and
/// [`assign`](Self::assign) only touch values.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    inner: NalgebraCsr<f64>,
}

impl CsrMatrix {
    /// Build from triplets through a COO matrix; duplicates are summed and
    /// explicit zeros keep their position.
    pub fn from_triplets(triplets: &TripletMatrix) -> Result<Self> {
        let n_rows = triplets.nrows();
        let n_cols = triplets.ncols();

        if let Some((row, col, _)) = triplets
            .triplets()
            .find(|&(row, col, _)| row >= n_rows || col >= n_cols)
        {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                nrows: n_rows,
                ncols: n_cols,
            });
        }

        let coo = CooMatrix::try_from_triplets(
            n_rows,
            n_cols,
            triplets.rows.clone(),
            triplets.cols.clone(),
            triplets.values.clone(),
        )
        .map_err(|e| Error::Assembly(format!("Invalid triplet data: {}", e)))?;

        Ok(Self {
            inner: NalgebraCsr::from(&coo),
        })
    }

    /// n×n identity matrix.
    pub fn identity(n: usize) -> Self {
        Self {
            inner: NalgebraCsr::identity(n),
        }
    }

    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }

    /// Number of stored entries (explicit zeros included).
    pub fn nnz(&self) -> usize {
        self.inner.nnz()
    }

    pub fn row_offsets(&self) -> &[usize] {
        self.inner.row_offsets()
    }

    pub fn col_indices(&self) -> &[usize] {
        self.inner.col_indices()
    }

    pub fn values(&self) -> &[f64] {
        self.inner.values()
    }

    /// Stored (column, value) pairs of a row.
    ///
    /// # Panics
    ///
    /// Panics if `row >= nrows()`.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let offsets = self.inner.row_offsets();
        let range = offsets[row]..offsets[row + 1];
        self.inner.col_indices()[range.clone()]
            .iter()
            .copied()
            .zip(self.inner.values()[range].iter().copied())
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> Error {
        Error::IndexOutOfBounds {
            row,
            col,
            nrows: self.nrows(),
            ncols: self.ncols(),
        }
    }

    /// Stored value at (row, col); `None` if the position is not stored or
    /// out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        match self.inner.get_entry(row, col)? {
            SparseEntry::NonZero(&value) => Some(value),
            SparseEntry::Zero => None,
        }
    }

    /// Stored diagonal entries, `None` where the diagonal is not allocated.
    pub fn diagonal(&self) -> Vec<Option<f64>> {
        (0..self.nrows().min(self.ncols()))
            .map(|i| self.get(i, i))
            .collect()
    }

    /// Set every stored value in `row` to zero. Idempotent.
    pub fn zero_row(&mut self, row: usize) -> Result<()> {
        let err = self.out_of_bounds(row, 0);
        self.inner
            .get_row_mut(row)
            .ok_or(err)?
            .values_mut()
            .fill(0.0);
        Ok(())
    }

    /// Set every stored value in `col` to zero.
    ///
    /// CSR has no column index, so every row is searched.
    pub fn zero_col(&mut self, col: usize) -> Result<()> {
        if col >= self.ncols() {
            return Err(self.out_of_bounds(0, col));
        }
        for mut row in self.inner.row_iter_mut() {
            if let Some(SparseEntryMut::NonZero(value)) = row.get_entry_mut(col) {
                *value = 0.0;
            }
        }
        Ok(())
    }

    /// Overwrite the value at a stored position.
    ///
    /// # Errors
    ///
    /// [`Error::MissingEntry`] if (row, col) is not in the sparsity pattern.
    pub fn assign(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let err = self.out_of_bounds(row, col);
        match self.inner.get_entry_mut(row, col).ok_or(err)? {
            SparseEntryMut::NonZero(entry) => {
                *entry = value;
                Ok(())
            }
            SparseEntryMut::Zero => Err(Error::MissingEntry { row, col }),
        }
    }

    /// Compute y = A x into a caller-provided vector.
    pub fn mul_vec_into(&self, x: &DVector<f64>, y: &mut DVector<f64>) -> Result<()> {
        if x.len() != self.ncols() {
            return Err(Error::dimension("matrix-vector operand", self.ncols(), x.len()));
        }
        if y.len() != self.nrows() {
            return Err(Error::dimension("matrix-vector output", self.nrows(), y.len()));
        }
        spmm_csr_dense(0.0, y, 1.0, Op::NoOp(&self.inner), Op::NoOp(x));
        Ok(())
    }

    /// Compute A x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        if x.len() != self.ncols() {
            return Err(Error::dimension("matrix-vector operand", self.ncols(), x.len()));
        }
        Ok(&self.inner * x)
    }

    /// Dense copy, for small problems and tests.
    pub fn to_dense(&self) -> DMatrix<f64> {
        DMatrix::from(&self.inner)
    }

    /// Check A = Aᵀ within an absolute tolerance, treating unstored entries as zero.
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        if self.nrows() != self.ncols() {
            return false;
        }
        self.inner.triplet_iter().all(|(row, col, &value)| {
            let mirror = self.get(col, row).unwrap_or(0.0);
            (value - mirror).abs() <= tolerance
        })
    }
}
