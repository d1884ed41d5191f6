//! Dense n-qubit matrix kernel.
//!
//! [`Unitary2x2`](crate::unitary::Unitary2x2) stays the fast path for
//! single-qubit work; this module backs the arbitrary-width unitary
//! synthesizer and the verification helpers that need to reason about
//! blocks larger than 2x2.

use ndarray::Array2;
use num_complex::Complex64;

/// Zero tolerance for matrix-element comparisons.
pub const ZERO_TOL: f64 = 1e-8;
/// Tolerance for whole-matrix equality / unitarity checks.
pub const MATRIX_TOL: f64 = 1e-6;

/// Dimension (`2^n`) for an `n`-qubit matrix.
pub fn dim_for_qubits(n: u32) -> usize {
    1usize << n
}

/// Number of qubits addressed by a `dim x dim` matrix. Panics if `dim` is
/// not a power of two.
pub fn qubits_for_dim(dim: usize) -> u32 {
    assert!(dim.is_power_of_two(), "matrix dimension must be a power of two, got {dim}");
    dim.trailing_zeros()
}

/// Split a `2m x 2m` matrix into four `m x m` blocks `[[a, b], [c, d]]`.
pub fn split_matrix(
    u: &Array2<Complex64>,
) -> (Array2<Complex64>, Array2<Complex64>, Array2<Complex64>, Array2<Complex64>) {
    let n = u.nrows();
    assert_eq!(n, u.ncols(), "matrix must be square");
    assert_eq!(n % 2, 0, "matrix dimension must be even to split");
    let m = n / 2;
    let a = u.slice(ndarray::s![0..m, 0..m]).to_owned();
    let b = u.slice(ndarray::s![0..m, m..n]).to_owned();
    let c = u.slice(ndarray::s![m..n, 0..m]).to_owned();
    let d = u.slice(ndarray::s![m..n, m..n]).to_owned();
    (a, b, c, d)
}

/// Stack four `m x m` blocks into a `2m x 2m` matrix `[[a, b], [c, d]]`.
pub fn stack_matrices(
    a: &Array2<Complex64>,
    b: &Array2<Complex64>,
    c: &Array2<Complex64>,
    d: &Array2<Complex64>,
) -> Array2<Complex64> {
    let m = a.nrows();
    let n = m * 2;
    let mut out = Array2::<Complex64>::zeros((n, n));
    out.slice_mut(ndarray::s![0..m, 0..m]).assign(a);
    out.slice_mut(ndarray::s![0..m, m..n]).assign(b);
    out.slice_mut(ndarray::s![m..n, 0..m]).assign(c);
    out.slice_mut(ndarray::s![m..n, m..n]).assign(d);
    out
}

/// True if every element's magnitude is below [`ZERO_TOL`].
pub fn is_zero(m: &Array2<Complex64>) -> bool {
    m.iter().all(|x| x.norm() < ZERO_TOL)
}

/// True if `a` and `b` agree element-wise within [`MATRIX_TOL`].
pub fn is_approx(a: &Array2<Complex64>, b: &Array2<Complex64>) -> bool {
    if a.dim() != b.dim() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).norm() < MATRIX_TOL)
}

/// True if `m` is unitary within tolerance: `m^dagger * m == I`.
pub fn is_unitary(m: &Array2<Complex64>) -> bool {
    if m.nrows() != m.ncols() {
        return false;
    }
    let md = dagger(m);
    let prod = md.dot(m);
    is_approx(&prod, &identity(m.nrows()))
}

/// True if all off-diagonal entries vanish.
pub fn is_diagonal(m: &Array2<Complex64>) -> bool {
    for ((i, j), v) in m.indexed_iter() {
        if i != j && v.norm() > ZERO_TOL {
            return false;
        }
    }
    true
}

/// Conjugate transpose.
pub fn dagger(m: &Array2<Complex64>) -> Array2<Complex64> {
    m.t().mapv(|x| x.conj())
}

/// The `n x n` identity matrix.
pub fn identity(n: usize) -> Array2<Complex64> {
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            Complex64::new(1.0, 0.0)
        } else {
            Complex64::new(0.0, 0.0)
        }
    })
}

/// Kronecker product `a (x) b` of two plain matrices.
pub(crate) fn kron2(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Array2<Complex64> {
    let (ra, ca) = a.dim();
    let (rb, cb) = b.dim();
    let mut out = Array2::<Complex64>::zeros((ra * rb, ca * cb));
    for i in 0..ra {
        for j in 0..ca {
            let block = b.mapv(|x| x * a[[i, j]]);
            out.slice_mut(ndarray::s![i * rb..(i + 1) * rb, j * cb..(j + 1) * cb])
                .assign(&block);
        }
    }
    out
}

/// `I (x) ... (x) op (x) ... (x) I`: `op` embedded at qubit `index` (0 =
/// leftmost / most significant) within an `nqubits`-qubit space.
pub fn general_kron(op: &Array2<Complex64>, index: usize, nqubits: u32) -> Array2<Complex64> {
    let id2 = identity(2);
    let mut out = Array2::<Complex64>::from_elem((1, 1), Complex64::new(1.0, 0.0));
    for i in 0..nqubits as usize {
        let factor = if i == index { op } else { &id2 };
        out = kron2(&out, factor);
    }
    out
}

/// True if `m` factors as `k (x) id_2` for some `k` (i.e. the matrix acts
/// trivially on the least-significant qubit and can be synthesized on the
/// remaining `n-1` qubits alone).
///
/// In index terms: `m[2i, 2j] == m[2i+1, 2j+1]` and the odd-even
/// cross-entries `m[2i, 2j+1]`, `m[2i+1, 2j]` all vanish.
pub fn is_kron_with_id2(m: &Array2<Complex64>) -> bool {
    let n = m.nrows();
    if n < 4 || n % 2 != 0 {
        return false;
    }
    let half = n / 2;
    for i in 0..half {
        for j in 0..half {
            if m[[2 * i, 2 * j + 1]].norm() > ZERO_TOL
                || m[[2 * i + 1, 2 * j]].norm() > ZERO_TOL
            {
                return false;
            }
            if (m[[2 * i, 2 * j]] - m[[2 * i + 1, 2 * j + 1]]).norm() > MATRIX_TOL {
                return false;
            }
        }
    }
    true
}

/// Full `nqubits`-qubit-space permutation matrix for a CNOT with the given
/// control and target qubit (0 = leftmost / most significant bit of the
/// computational basis index, matching [`general_kron`]'s convention).
pub fn general_cnot(nqubits: u32, control: usize, target: usize) -> Array2<Complex64> {
    let dim = dim_for_qubits(nqubits);
    let n = nqubits as usize;
    let mut m = Array2::<Complex64>::zeros((dim, dim));
    let one = Complex64::new(1.0, 0.0);
    for i in 0..dim {
        let control_bit = (i >> (n - 1 - control)) & 1;
        let j = if control_bit == 0 {
            i
        } else {
            i ^ (1 << (n - 1 - target))
        };
        m[[j, i]] = one;
    }
    m
}

/// Determinant of a square complex matrix via Gaussian elimination with
/// partial pivoting.
pub(crate) fn determinant(m: &Array2<Complex64>) -> Complex64 {
    let n = m.nrows();
    assert_eq!(n, m.ncols(), "matrix must be square");
    let mut a = m.clone();
    let mut det = Complex64::new(1.0, 0.0);

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&r1, &r2| a[[r1, col]].norm().partial_cmp(&a[[r2, col]].norm()).unwrap())
            .unwrap();

        if a[[pivot_row, col]].norm() < 1e-14 {
            return Complex64::new(0.0, 0.0);
        }

        if pivot_row != col {
            for k in 0..n {
                a.swap((col, k), (pivot_row, k));
            }
            det = -det;
        }

        det *= a[[col, col]];

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                let sub = factor * a[[col, k]];
                a[[row, k]] -= sub;
            }
        }
    }

    det
}

/// Extract the global phase of an arbitrary unitary: `phase =
/// -arg(det(U)^(-1/2))`, and the renormalized unitary `U * e^{-i phase}`
/// (determinant `+1`).
pub fn get_global_phase(u: &Array2<Complex64>) -> (f64, Array2<Complex64>) {
    let det = determinant(u);
    let coefficient = det.powf(-0.5);
    let phase = -coefficient.arg();
    let renormalized = u.mapv(|x| x * coefficient);
    (phase, renormalized)
}

/// Phase-insensitive similarity metric: `1 - |<A,B>_F| / N`, where `N` is
/// the matrix dimension and `<A,B>_F = sum_ij A_ij * conj(B_ij)`. Zero
/// when `A` and `B` agree up to a global phase.
pub fn matrix_distance_squared(a: &Array2<Complex64>, b: &Array2<Complex64>) -> f64 {
    let inner: Complex64 = a.iter().zip(b.iter()).map(|(x, y)| x * y.conj()).sum();
    (1.0 - inner.norm() / a.nrows() as f64).abs()
}

/// Convert a [`crate::unitary::Unitary2x2`] into its `Array2` form.
pub fn unitary2x2_to_array(u: &crate::unitary::Unitary2x2) -> Array2<Complex64> {
    Array2::from_shape_vec((2, 2), u.data.to_vec()).expect("2x2 shape")
}
