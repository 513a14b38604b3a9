//! Bit-indexing and operator-enlargement helpers used by local simulators.

use num_complex::Complex64;

/// Inserts bit `b` as the `i`th bit of `k`, shifting bits `>= i` left to
/// make room.
pub fn index1(b: usize, i: usize, k: usize) -> usize {
    let lowbits = k & ((1 << i) - 1);
    let mut retval = k >> i;
    retval <<= 1;
    retval |= b;
    retval <<= i;
    retval | lowbits
}

/// Inserts bit `b1` as the `i1`th bit and `b2` as the `i2`th bit of `k`.
pub fn index2(b1: usize, i1: usize, b2: usize, i2: usize, k: usize) -> usize {
    assert!(i1 != i2);
    if i1 > i2 {
        // Insert as the (i1-1)th bit; the second insertion shifts it left.
        let retval = index1(b1, i1 - 1, k);
        index1(b2, i2, retval)
    } else {
        let retval = index1(b2, i2 - 1, k);
        index1(b1, i1, retval)
    }
}

/// Identity operator on a `dim`-dimensional space.
pub fn identity(dim: usize) -> Vec<Vec<Complex64>> {
    let mut matrix = vec![vec![Complex64::ZERO; dim]; dim];
    for (row, entries) in matrix.iter_mut().enumerate() {
        entries[row] = Complex64::ONE;
    }
    matrix
}

/// Kronecker product of two operator matrices.
pub fn kron(a: &[Vec<Complex64>], b: &[Vec<Complex64>]) -> Vec<Vec<Complex64>> {
    let (a_rows, a_cols) = (a.len(), a.first().map_or(0, Vec::len));
    let (b_rows, b_cols) = (b.len(), b.first().map_or(0, Vec::len));

    let mut out = vec![vec![Complex64::ZERO; a_cols * b_cols]; a_rows * b_rows];
    for (i, a_row) in a.iter().enumerate() {
        for (j, &a_entry) in a_row.iter().enumerate() {
            for (k, b_row) in b.iter().enumerate() {
                for (l, &b_entry) in b_row.iter().enumerate() {
                    out[i * b_rows + k][j * b_cols + l] = a_entry * b_entry;
                }
            }
        }
    }
    out
}

/// Enlarges a single-qubit operator to an operator on `number_of_qubits`
/// qubits, applied at `qubit`.
///
/// Exponential in the number of qubits. Qubit order is
/// `q_{n-1} ⊗ … ⊗ q_1 ⊗ q_0`.
pub fn enlarge_single_opt(
    opt: &[Vec<Complex64>],
    qubit: usize,
    number_of_qubits: usize,
) -> Vec<Vec<Complex64>> {
    let upper = identity(1 << (number_of_qubits - qubit - 1));
    let lower = identity(1 << qubit);
    kron(&upper, &kron(opt, &lower))
}

/// Enlarges a two-qubit operator to an operator on `number_of_qubits`
/// qubits, with `q0` the first (control) and `q1` the second (target)
/// qubit.
///
/// Exponential in the number of qubits.
pub fn enlarge_two_opt(
    opt: &[Vec<Complex64>],
    q0: usize,
    q1: usize,
    number_of_qubits: usize,
) -> Vec<Vec<Complex64>> {
    let dim = 1 << number_of_qubits;
    let mut enlarged = vec![vec![Complex64::ZERO; dim]; dim];
    for i in 0..(1 << (number_of_qubits - 2)) {
        for j in 0..2 {
            for k in 0..2 {
                for jj in 0..2 {
                    for kk in 0..2 {
                        enlarged[index2(j, q0, k, q1, i)][index2(jj, q0, kk, q1, i)] =
                            opt[j + 2 * k][jj + 2 * kk];
                    }
                }
            }
        }
    }
    enlarged
}

#[cfg(test)]
mod tests {
    use num_complex::Complex64;

    use super::{enlarge_single_opt, enlarge_two_opt, identity, index1, index2, kron};

    fn real(value: f64) -> Complex64 {
        Complex64::new(value, 0.0)
    }

    /// Pauli-X gate.
    fn x_gate() -> Vec<Vec<Complex64>> {
        vec![
            vec![Complex64::ZERO, Complex64::ONE],
            vec![Complex64::ONE, Complex64::ZERO],
        ]
    }

    /// CNOT with the low qubit as control, in `q1 ⊗ q0` ordering.
    fn cnot_gate() -> Vec<Vec<Complex64>> {
        vec![
            vec![real(1.0), real(0.0), real(0.0), real(0.0)],
            vec![real(0.0), real(0.0), real(0.0), real(1.0)],
            vec![real(0.0), real(0.0), real(1.0), real(0.0)],
            vec![real(0.0), real(1.0), real(0.0), real(0.0)],
        ]
    }

    #[test]
    fn index1_inserts_and_shifts() {
        // k = 0b101, insert 1 at position 1 -> 0b1011.
        assert_eq!(index1(1, 1, 0b101), 0b1011);
        // Insert 0 at position 0 shifts everything left.
        assert_eq!(index1(0, 0, 0b11), 0b110);
    }

    #[test]
    fn index2_matches_sequential_insertion() {
        // Inserting at distinct positions must agree regardless of order.
        assert_eq!(index2(1, 2, 0, 0, 0b1), index2(0, 0, 1, 2, 0b1));
        assert_eq!(index2(1, 0, 1, 1, 0), 0b11);
    }

    #[test]
    fn identity_has_unit_diagonal() {
        let eye = identity(4);
        for (row, entries) in eye.iter().enumerate() {
            for (col, entry) in entries.iter().enumerate() {
                let expected = if row == col { 1.0 } else { 0.0 };
                assert_eq!(*entry, real(expected));
            }
        }
    }

    #[test]
    fn kron_of_identities_is_identity() {
        assert_eq!(kron(&identity(2), &identity(2)), identity(4));
    }

    #[test]
    fn enlarge_single_places_gate_on_low_qubit() {
        // X on qubit 0 of 2: I ⊗ X, which swaps basis states 0<->1 and
        // 2<->3.
        let enlarged = enlarge_single_opt(&x_gate(), 0, 2);
        assert_eq!(enlarged[0][1], Complex64::ONE);
        assert_eq!(enlarged[1][0], Complex64::ONE);
        assert_eq!(enlarged[2][3], Complex64::ONE);
        assert_eq!(enlarged[3][2], Complex64::ONE);
        assert_eq!(enlarged[0][0], Complex64::ZERO);
    }

    #[test]
    fn enlarge_single_places_gate_on_high_qubit() {
        // X on qubit 1 of 2: X ⊗ I, which swaps basis states 0<->2 and
        // 1<->3.
        let enlarged = enlarge_single_opt(&x_gate(), 1, 2);
        assert_eq!(enlarged[0][2], Complex64::ONE);
        assert_eq!(enlarged[2][0], Complex64::ONE);
        assert_eq!(enlarged[1][3], Complex64::ONE);
        assert_eq!(enlarged[3][1], Complex64::ONE);
    }

    #[test]
    fn enlarge_two_on_two_qubits_reproduces_the_gate() {
        let enlarged = enlarge_two_opt(&cnot_gate(), 0, 1, 2);
        assert_eq!(enlarged, cnot_gate());
    }

    #[test]
    fn enlarge_two_embeds_into_three_qubits() {
        let enlarged = enlarge_two_opt(&cnot_gate(), 0, 1, 3);
        assert_eq!(enlarged.len(), 8);
        // With qubit 2 at |0>, state |001> maps to |011> under CNOT(0->1).
        assert_eq!(enlarged[0b011][0b001], Complex64::ONE);
        assert_eq!(enlarged[0b001][0b011], Complex64::ONE);
        // Control clear: |000> stays put.
        assert_eq!(enlarged[0b000][0b000], Complex64::ONE);
        // The high qubit is untouched: |101> -> |111>.
        assert_eq!(enlarged[0b111][0b101], Complex64::ONE);
    }
}
