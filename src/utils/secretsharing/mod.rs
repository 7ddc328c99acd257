//! Linear secret sharing over share generating matrices.
//!
//! Shares are `lambda_i = M_i · v` in `Fr`. Reconstruction coefficients are
//! computed in the integers by fraction-free Gaussian elimination so that the
//! exponent arithmetic later only needs one inversion (of the common scale).
use std::collections::BTreeSet;
use rabe_bn::Fr;
use tracing::trace;
#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};
use crate::error::{AbeError, Result};
use crate::utils::{secret::Ephemeral, tools::i64_to_fr};

/// Integer weights `w` with `Σ w_i · M_i = scale · (1, 0, …, 0)` over the
/// available rows. Unavailable rows carry a zero weight.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReconstructionCoefficients {
    coefficients: Vec<i64>,
    scale: i64,
}

impl ReconstructionCoefficients {
    pub fn coefficients(&self) -> &[i64] {
        &self.coefficients
    }

    pub fn coefficient(&self, row: usize) -> i64 {
        self.coefficients.get(row).copied().unwrap_or(0)
    }

    /// Common positive divisor of all coefficients. `1` for every satisfying
    /// subset of a compiled access tree.
    pub fn scale(&self) -> i64 {
        self.scale
    }

    /// The vector `Σ w_i · M_i` actually reconstructed by these weights.
    pub fn combine(&self, matrix: &[Vec<i32>]) -> Vec<i64> {
        let width = matrix.first().map_or(0, |row| row.len());
        let mut acc = vec![0i64; width];
        for (row, w) in matrix.iter().zip(&self.coefficients) {
            for (slot, entry) in acc.iter_mut().zip(row) {
                *slot = slot.saturating_add(w.saturating_mul(i64::from(*entry)));
            }
        }
        acc
    }

    /// Whether the weights reconstruct `scale · (1, 0, …, 0)`, i.e. the
    /// available rows satisfy the policy.
    pub fn reconstructs_target(&self, matrix: &[Vec<i32>]) -> bool {
        let combined = self.combine(matrix);
        combined.first() == Some(&self.scale) && combined.iter().skip(1).all(|v| *v == 0)
    }
}

fn mul(a: i64, b: i64) -> Result<i64> {
    a.checked_mul(b).ok_or(AbeError::CoefficientOverflow)
}

fn sub(a: i64, b: i64) -> Result<i64> {
    a.checked_sub(b).ok_or(AbeError::CoefficientOverflow)
}

fn rem(a: i64, b: i64) -> Result<i64> {
    a.checked_rem(b).ok_or(AbeError::CoefficientOverflow)
}

fn div(a: i64, b: i64) -> Result<i64> {
    a.checked_div(b).ok_or(AbeError::CoefficientOverflow)
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Computes integer reconstruction coefficients for the rows of `matrix` not
/// listed in `unavailable`.
///
/// Solves `Mᵀ w = e1` restricted to the available rows. When the available
/// rows do not span the target the result still satisfies the construction
/// but reconstructs a different vector; see
/// [`ReconstructionCoefficients::reconstructs_target`].
pub fn reconstruction_coefficients(
    matrix: &[Vec<i32>],
    unavailable: &BTreeSet<usize>,
) -> Result<ReconstructionCoefficients> {
    let rows = matrix.len();
    if rows == 0 {
        return Err(AbeError::EmptyMatrix);
    }
    let cols = matrix[0].len();
    if let Some(row) = matrix.iter().position(|row| row.len() != cols) {
        return Err(AbeError::InvalidCiphertext(format!(
            "matrix row {} has width {}, expected {}",
            row,
            matrix[row].len(),
            cols
        )));
    }
    let target = rows;

    // one equation per matrix column, one unknown per matrix row
    let mut work: Vec<Vec<i64>> = (0..cols)
        .map(|j| {
            let mut equation: Vec<i64> = matrix
                .iter()
                .enumerate()
                .map(|(i, row)| if unavailable.contains(&i) { 0 } else { i64::from(row[j]) })
                .collect();
            equation.push(if j == 0 { 1 } else { 0 });
            equation
        })
        .collect();

    // forward elimination, pivots recorded as (equation, unknown)
    let mut pivots: Vec<(usize, usize)> = Vec::new();
    let mut r = 0;
    for col in 0..rows {
        if r == cols {
            break;
        }
        let Some(p) = (r..cols).find(|&j| work[j][col] != 0) else {
            continue;
        };
        work.swap(r, p);
        let pivot = work[r][col];
        for j in (r + 1)..cols {
            if work[j][col] == 0 {
                continue;
            }
            if rem(work[j][col], pivot)? != 0 {
                for k in col..=target {
                    work[j][k] = mul(work[j][k], pivot)?;
                }
            }
            let factor = div(work[j][col], pivot)?;
            for k in col..=target {
                let delta = mul(factor, work[r][k])?;
                work[j][k] = sub(work[j][k], delta)?;
            }
        }
        pivots.push((r, col));
        r += 1;
    }

    let pivot_unknowns: BTreeSet<usize> = pivots.iter().map(|&(_, col)| col).collect();
    let mut coefficients: Vec<i64> = (0..rows)
        .map(|i| {
            if unavailable.contains(&i) || pivot_unknowns.contains(&i) {
                0
            } else {
                1
            }
        })
        .collect();
    let mut scale: i64 = 1;

    // back substitution, scaling everything when a division is not exact
    for &(r, col) in pivots.iter().rev() {
        let mut t = mul(scale, work[r][target])?;
        for k in (col + 1)..rows {
            t = sub(t, mul(work[r][k], coefficients[k])?)?;
        }
        let pivot = work[r][col];
        if rem(t, pivot)? != 0 {
            for c in coefficients.iter_mut() {
                *c = mul(*c, pivot)?;
            }
            scale = mul(scale, pivot)?;
            coefficients[col] = t;
        } else {
            coefficients[col] = div(t, pivot)?;
        }
    }

    if scale < 0 {
        scale = scale.checked_neg().ok_or(AbeError::CoefficientOverflow)?;
        for c in coefficients.iter_mut() {
            *c = c.checked_neg().ok_or(AbeError::CoefficientOverflow)?;
        }
    }
    let divisor = coefficients
        .iter()
        .fold(scale.unsigned_abs(), |acc, c| gcd(acc, c.unsigned_abs()));
    if divisor > 1 {
        let divisor = divisor as i64;
        scale /= divisor;
        for c in coefficients.iter_mut() {
            *c /= divisor;
        }
    }
    trace!(rows, cols, unavailable = unavailable.len(), scale, "reconstruction coefficients");
    Ok(ReconstructionCoefficients { coefficients, scale })
}

/// Shares `lambda_i = M_i · v` of the secret `v[0]`.
pub fn gen_shares_msp(matrix: &[Vec<i32>], v: &[Ephemeral<Fr>]) -> Result<Vec<Ephemeral<Fr>>> {
    matrix
        .iter()
        .map(|row| {
            if row.len() != v.len() {
                return Err(AbeError::InvalidCiphertext(format!(
                    "row of width {} cannot share a vector of length {}",
                    row.len(),
                    v.len()
                )));
            }
            let mut share = Ephemeral::new(Fr::zero());
            for (entry, value) in row.iter().zip(v) {
                if *entry != 0 {
                    share = Ephemeral::new(*share.expose() + i64_to_fr(i64::from(*entry))? * *value.expose());
                }
            }
            Ok(share)
        })
        .collect()
}
