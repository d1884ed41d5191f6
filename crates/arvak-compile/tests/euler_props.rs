//! Property-based checks for the single-qubit Euler machinery: every
//! decomposition variant must reconstruct its input exactly (including the
//! returned global phase), across randomly sampled unitaries rather than a
//! handful of named gates.

use proptest::prelude::*;

use arvak_compile::passes::{BasisTranslation, CommutativeCancellation};
use arvak_compile::unitary::Unitary2x2;
use arvak_compile::{BasisGates, Pass, PropertySet};
use arvak_ir::{
    CircuitDag, GateKind, Instruction, InstructionKind, ParameterExpression, QubitId, StandardGate,
};
use num_complex::Complex64;

fn assert_matches(reconstructed: Unitary2x2, phase: f64, expected: &Unitary2x2, label: &str) {
    let global = Complex64::from_polar(1.0, phase);
    for i in 0..4 {
        let got = reconstructed.data[i] * global;
        let want = expected.data[i];
        assert!(
            (got - want).norm() < 1e-6,
            "{label}: entry {i} differs, got {got:?}, want {want:?}"
        );
    }
}

proptest! {
    #[test]
    fn euler_variants_reconstruct_random_unitaries(
        theta in -3.1f64..3.1,
        phi in -3.1f64..3.1,
        lambda in -3.1f64..3.1,
    ) {
        let u = Unitary2x2::u(theta, phi, lambda);

        let (alpha, beta, gamma, phase) = u.zyz_decomposition();
        assert_matches(
            Unitary2x2::rz(alpha) * Unitary2x2::ry(beta) * Unitary2x2::rz(gamma),
            phase,
            &u,
            "zyz",
        );

        let (alpha, beta, gamma, phase) = u.zxz_decomposition();
        assert_matches(
            Unitary2x2::rz(alpha) * Unitary2x2::rx(beta) * Unitary2x2::rz(gamma),
            phase,
            &u,
            "zxz",
        );

        let (alpha, beta, gamma, phase) = u.xyx_decomposition();
        assert_matches(
            Unitary2x2::rx(alpha) * Unitary2x2::ry(beta) * Unitary2x2::rx(gamma),
            phase,
            &u,
            "xyx",
        );

        let (alpha, beta, gamma, phase) = u.xzx_decomposition();
        assert_matches(
            Unitary2x2::rx(alpha) * Unitary2x2::rz(beta) * Unitary2x2::rx(gamma),
            phase,
            &u,
            "xzx",
        );
    }

    /// Translating a generic U gate down to plain rotations must reproduce
    /// the gate's matrix exactly, global phase included.
    #[test]
    fn translated_u_gate_reproduces_its_matrix(
        theta in -3.1f64..3.1,
        phi in -3.1f64..3.1,
        lambda in -3.1f64..3.1,
    ) {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.apply(Instruction::single_qubit_gate(
            StandardGate::U(
                ParameterExpression::constant(theta),
                ParameterExpression::constant(phi),
                ParameterExpression::constant(lambda),
            ),
            QubitId(0),
        ))
        .unwrap();

        let mut props = PropertySet::new();
        props.basis_gates = Some(BasisGates::new(["rx", "ry", "rz", "cx"]));
        BasisTranslation.run(&mut dag, &mut props).unwrap();

        let mut product = Unitary2x2::identity();
        for (_, inst) in dag.topological_ops() {
            let InstructionKind::Gate(gate) = &inst.kind else {
                panic!("non-gate instruction in translated circuit");
            };
            let GateKind::Standard(standard) = &gate.kind else {
                panic!("custom gate in translated circuit");
            };
            let factor = match standard {
                StandardGate::Rx(p) => Unitary2x2::rx(p.as_f64().unwrap()),
                StandardGate::Ry(p) => Unitary2x2::ry(p.as_f64().unwrap()),
                StandardGate::Rz(p) => Unitary2x2::rz(p.as_f64().unwrap()),
                other => panic!("gate '{}' outside the rotation basis", other.name()),
            };
            product = factor * product;
        }

        assert_matches(
            product,
            dag.global_phase(),
            &Unitary2x2::u(theta, phi, lambda),
            "translated u3",
        );
    }

    /// Adjacent same-axis rotations merge into a single rotation carrying
    /// the angle sum (normalized), or vanish when the sum is a full turn.
    #[test]
    fn same_axis_rotations_merge_by_angle_sum(
        a in -3.0f64..3.0,
        b in -3.0f64..3.0,
    ) {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.apply(Instruction::single_qubit_gate(
            StandardGate::Rz(ParameterExpression::constant(a)),
            QubitId(0),
        ))
        .unwrap();
        dag.apply(Instruction::single_qubit_gate(
            StandardGate::Rz(ParameterExpression::constant(b)),
            QubitId(0),
        ))
        .unwrap();

        let mut props = PropertySet::new();
        CommutativeCancellation::new().run(&mut dag, &mut props).unwrap();

        let expected = Unitary2x2::normalize_angle(a + b);
        let ops: Vec<_> = dag.topological_ops().map(|(_, inst)| inst.clone()).collect();
        if expected.abs() < 1e-10 {
            assert!(ops.is_empty(), "full-turn rotations should cancel entirely");
        } else {
            assert_eq!(ops.len(), 1);
            let InstructionKind::Gate(gate) = &ops[0].kind else {
                panic!("expected a gate");
            };
            let GateKind::Standard(StandardGate::Rz(p)) = &gate.kind else {
                panic!("expected a merged rz");
            };
            let got = p.as_f64().unwrap();
            assert!(
                (got - expected).abs() < 1e-9,
                "merged angle {got} differs from {expected}"
            );
        }
    }
}
