//! External-assembly glue: parsing and rewriting the textual wire format the
//! core reads programs from and writes compiled programs back to.
//!
//! The dialect is line-oriented (one statement per line, semicolon
//! terminated) so every function here works by scanning lines rather than
//! parsing a full grammar. This mirrors what a compiler's outer layer
//! actually needs: register bookkeeping, reference rewriting and a handful
//! of post-compilation sanity checks, not a general assembler.

use std::time::Duration;

use rustc_hash::FxHashMap;

use arvak_ir::{CircuitDag, QubitId};

use crate::error::{CompileError, CompileResult};
use crate::property::{CouplingMap, Layout};

/// Canonical register names every program is rewritten to.
const CANONICAL_QREG: &str = "q";
const CANONICAL_CREG: &str = "c";

/// Run the whole wire-format pipeline over one program: standardize its
/// measurement block, parse and cross-check the registers, compact the
/// used wires onto canonical names, materialize the virtual-to-physical
/// layout, and verify the result against the device.
///
/// Each stage is one of this module's §-style utilities, chained in the
/// order the outer compiler drives them; this is the textual counterpart
/// of a `PassManager` run, and its return value pairs the rewritten
/// program with the aggregate [`ProgramCheck`] record. Rewriting failures
/// are fatal; topology problems found by the final check come back as
/// data inside the report, for the caller to judge.
///
/// Virtual qubits the layout does not cover stay on their compacted index
/// (an identity placement), so an empty [`Layout`] materializes the
/// program onto physical qubits `0..n` unchanged.
pub fn compile_program(
    text: &str,
    coupling_map: &CouplingMap,
    layout: &Layout,
) -> CompileResult<(String, ProgramCheck)> {
    let standardized = standardize_circuit(text, CANONICAL_QREG)?;

    let info = parse_registers(&standardized)?;
    let used_qubits = actually_used_qubits(&standardized, &info.qreg_name);
    let used_cbits = match &info.creg_name {
        Some(name) => actually_used_classical_bits(&standardized, name),
        None => Vec::new(),
    };

    let compacted = reset_registers(
        &standardized,
        &info,
        &used_qubits,
        &used_cbits,
        CANONICAL_QREG,
        CANONICAL_CREG,
    );

    let mut v2p = FxHashMap::default();
    for compact_index in 0..used_qubits.len() as u32 {
        let physical = layout
            .get_physical(QubitId(compact_index))
            .unwrap_or(compact_index);
        v2p.insert(compact_index, physical);
    }
    let physical = reset_to_real_qubits(
        &compacted,
        CANONICAL_QREG,
        coupling_map.num_qubits(),
        &v2p,
    );

    let report = check_program(&physical, coupling_map)?;
    Ok((physical, report))
}

/// Register names and declared sizes parsed out of a program's header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterInfo {
    /// Name of the (sole) quantum register.
    pub qreg_name: String,
    /// Name of the classical register, if one is declared.
    pub creg_name: Option<String>,
    /// Declared quantum register size.
    pub num_qubits: u32,
    /// Declared classical register size (0 if no `creg` is present).
    pub num_clbits: u32,
}

/// Extract `(qreg_name, creg_name, num_qubits, num_clbits)` from a program,
/// validating the header and cross-checking that every measurement targets
/// the declared classical register.
pub fn parse_registers(text: &str) -> CompileResult<RegisterInfo> {
    if !text.contains("OPENQASM") {
        return Err(CompileError::InvalidInput(
            "missing dialect version header".to_string(),
        ));
    }
    if !text.lines().any(|l| l.trim_start().starts_with("include")) {
        return Err(CompileError::InvalidInput(
            "missing include of the standard gate library".to_string(),
        ));
    }

    let (qreg_name, num_qubits) = text
        .lines()
        .find_map(|l| parse_register_decl(l, "qreg"))
        .ok_or_else(|| CompileError::InvalidInput("missing qreg declaration".to_string()))?;

    let creg_decl = text.lines().find_map(|l| parse_register_decl(l, "creg"));
    let (creg_name, num_clbits) = match creg_decl {
        Some((name, count)) => (Some(name), count),
        None => (None, 0),
    };

    if let Some(creg_name) = &creg_name {
        for line in text.lines() {
            if let Some(target) = parse_measure_target_register(line, &qreg_name) {
                if &target != creg_name {
                    return Err(CompileError::InvalidInput(format!(
                        "measurement targets register '{target}' but the declared classical \
                         register is '{creg_name}'"
                    )));
                }
            }
        }
    }

    Ok(RegisterInfo { qreg_name, creg_name, num_qubits, num_clbits })
}

/// Indices of `reg_name` actually referenced outside its own declaration
/// and barrier statements, sorted and deduplicated.
pub fn actually_used_qubits(text: &str, qreg_name: &str) -> Vec<u32> {
    used_indices(text, qreg_name)
}

/// Classical-bit counterpart of [`actually_used_qubits`].
pub fn actually_used_classical_bits(text: &str, creg_name: &str) -> Vec<u32> {
    used_indices(text, creg_name)
}

/// Rewrite a program to a canonical register naming, compacting qubit and
/// classical-bit indices down to `0..used.len()` in the order `used_qubits`
/// / `used_cbits` list them.
///
/// Declarations and wire references are rewritten directly from a parsed
/// index rather than via successive substring substitution, so there is no
/// risk of one rewrite's output colliding with the next rewrite's pattern.
pub fn reset_registers(
    text: &str,
    info: &RegisterInfo,
    used_qubits: &[u32],
    used_cbits: &[u32],
    canonical_qreg: &str,
    canonical_creg: &str,
) -> String {
    let qubit_remap: FxHashMap<u32, u32> =
        used_qubits.iter().enumerate().map(|(new, &old)| (old, new as u32)).collect();
    let cbit_remap: FxHashMap<u32, u32> =
        used_cbits.iter().enumerate().map(|(new, &old)| (old, new as u32)).collect();

    let mut needs_creg_insert = info.creg_name.is_none() && !used_cbits.is_empty();
    let mut out_lines = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("qreg") {
            out_lines.push(format!("qreg {canonical_qreg}[{}];", used_qubits.len()));
            if needs_creg_insert {
                out_lines.push(format!("creg {canonical_creg}[{}];", used_cbits.len()));
                needs_creg_insert = false;
            }
            continue;
        }
        if trimmed.starts_with("creg") {
            if used_cbits.is_empty() {
                continue;
            }
            out_lines.push(format!("creg {canonical_creg}[{}];", used_cbits.len()));
            continue;
        }

        let mut rewritten = rewrite_register(trimmed, &info.qreg_name, canonical_qreg, &qubit_remap);
        if let Some(old_creg) = &info.creg_name {
            rewritten = rewrite_register(&rewritten, old_creg, canonical_creg, &cbit_remap);
        }
        out_lines.push(rewritten);
    }

    out_lines.join("\n")
}

/// Apply a virtual-to-physical qubit map to every reference to `qreg_name`,
/// resize its declaration to the device's physical qubit count, and
/// canonicalize `delay(Ndt)` statements to `delay(Nns)`.
pub fn reset_to_real_qubits(
    text: &str,
    qreg_name: &str,
    num_physical_qubits: u32,
    v2p: &FxHashMap<u32, u32>,
) -> String {
    text.lines()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.starts_with("qreg") {
                format!("qreg {qreg_name}[{num_physical_qubits}];")
            } else {
                canonicalize_delay_units(&rewrite_register(trimmed, qreg_name, qreg_name, v2p))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ensure the program has a classical register and a measurement for every
/// qubit, then collapse whatever barriers precede the measurement block
/// into exactly one barrier covering the measured qubit set. Renames the
/// quantum register to `canonical_qreg` along the way.
pub fn standardize_circuit(text: &str, canonical_qreg: &str) -> CompileResult<String> {
    let info = parse_registers(text)?;
    if info.num_qubits == 0 {
        return Err(CompileError::InvalidInput(
            "circuit declares zero qubits".to_string(),
        ));
    }

    let mut lines: Vec<String> = text.trim().lines().map(str::to_string).collect();
    let qreg_name = info.qreg_name.clone();

    let mut creg_name = info.creg_name.clone();
    let mut num_clbits = info.num_clbits;
    if creg_name.is_none() {
        let name = "meas".to_string();
        num_clbits = info.num_qubits;
        if let Some(pos) = lines.iter().position(|l| l.trim_start().starts_with("qreg")) {
            lines.insert(pos + 1, format!("creg {name}[{num_clbits}];"));
        }
        creg_name = Some(name);
    } else if num_clbits == 0 {
        num_clbits = info.num_qubits;
        if let Some(pos) = lines.iter().position(|l| l.trim_start().starts_with("creg")) {
            lines[pos] = format!("creg {}[{num_clbits}];", creg_name.as_ref().unwrap());
        }
    }
    let creg_name = creg_name.unwrap();

    if !lines.iter().any(|l| l.trim_start().starts_with("measure")) {
        for q in 0..info.num_qubits {
            lines.push(format!("measure {qreg_name}[{q}] -> {creg_name}[{q}];"));
        }
    }

    let measured: Vec<u32> = lines
        .iter()
        .filter_map(|l| parse_measure_line(l, &qreg_name, &creg_name))
        .map(|(q, _c)| q)
        .collect();

    // Drop whatever barriers already exist on this register; a single
    // canonical one is reinserted right before the measurement block.
    lines.retain(|l| {
        let t = l.trim_start();
        !(t.starts_with("barrier") && t.contains(qreg_name.as_str()))
    });

    let first_measure = lines
        .iter()
        .position(|l| l.trim_start().starts_with("measure"))
        .expect("measurement statements were inserted above if absent");

    let mut sorted_measured = measured;
    sorted_measured.sort_unstable();
    sorted_measured.dedup();
    let barrier_args = sorted_measured
        .iter()
        .map(|q| format!("{qreg_name}[{q}]"))
        .collect::<Vec<_>>()
        .join(",");
    lines.insert(first_measure, format!("barrier {barrier_args};"));

    let joined = lines.join("\n");
    Ok(if canonical_qreg == qreg_name {
        joined
    } else {
        rename_register(&joined, &qreg_name, canonical_qreg)
    })
}

/// Post-compilation sanity check: every two-qubit gate must connect a
/// coupled physical pair, the declared register must fit the device, and
/// gate counts are tallied for reporting. Unlike the fatal errors raised
/// elsewhere in this module, topology problems are returned as data rather
/// than an `Err` — the caller (typically a verifier pass run right after
/// this one) decides whether they are fatal.
#[derive(Debug, Clone, Default)]
pub struct ProgramCheck {
    /// Number of single-qubit gate statements.
    pub single_qubit_gates: usize,
    /// Number of two-qubit gate statements.
    pub two_qubit_gates: usize,
    /// Two-qubit gates found on non-coupled physical pairs.
    pub topology_violations: Vec<(u32, u32)>,
    /// True if the program contains no gate statements at all.
    pub empty: bool,
}

/// Run [`ProgramCheck`] over `text`, rejecting programs whose declared
/// register is larger than `coupling_map`'s physical qubit count.
pub fn check_program(text: &str, coupling_map: &CouplingMap) -> CompileResult<ProgramCheck> {
    let info = parse_registers(text)?;
    if info.num_qubits > coupling_map.num_qubits() {
        return Err(CompileError::CircuitTooLarge {
            required: info.num_qubits as usize,
            available: coupling_map.num_qubits(),
        });
    }

    let mut single_qubit_gates = 0;
    let mut two_qubit_gates = 0;
    let mut topology_violations = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with("OPENQASM")
            || trimmed.starts_with("include")
            || trimmed.starts_with("qreg")
            || trimmed.starts_with("creg")
            || trimmed.starts_with("barrier")
            || trimmed.starts_with("measure")
            || trimmed.starts_with("delay")
        {
            continue;
        }

        match scan_register_refs(trimmed, &info.qreg_name).as_slice() {
            [] => {}
            [_] => single_qubit_gates += 1,
            [q0, q1] => {
                two_qubit_gates += 1;
                if !coupling_map.is_connected(*q0, *q1) {
                    topology_violations.push((*q0, *q1));
                }
            }
            // Three-or-more-qubit gates (ccx, cswap, mcx, ...) are expected
            // to already be decomposed by the time this check runs.
            _ => {}
        }
    }

    Ok(ProgramCheck {
        empty: single_qubit_gates == 0 && two_qubit_gates == 0,
        single_qubit_gates,
        two_qubit_gates,
        topology_violations,
    })
}

/// Information returned alongside a compiled program: the layout that was
/// applied and a handful of summary statistics a caller needs without
/// re-parsing the output text.
#[derive(Debug, Clone)]
pub struct CompileReport {
    /// Virtual-to-physical qubit assignments in effect at the end of
    /// compilation.
    pub layout: Vec<(QubitId, u32)>,
    /// Number of single-qubit gates in the compiled circuit.
    pub single_qubit_gates: usize,
    /// Number of two-qubit gates in the compiled circuit.
    pub two_qubit_gates: usize,
    /// Circuit depth (longest path through the DAG).
    pub depth: usize,
    /// Wall-clock time spent compiling.
    pub compile_time: Duration,
    /// Name of the backend the circuit was compiled for.
    pub backend_name: String,
}

impl CompileReport {
    /// Build a report from a finished DAG and the layout that was applied
    /// to it, if any.
    pub fn build(
        dag: &CircuitDag,
        layout: Option<&Layout>,
        compile_time: Duration,
        backend_name: impl Into<String>,
    ) -> Self {
        let mut single_qubit_gates = 0;
        let mut two_qubit_gates = 0;
        for (_node_idx, inst) in dag.topological_ops() {
            if !inst.is_gate() {
                continue;
            }
            match inst.qubits.len() {
                1 => single_qubit_gates += 1,
                2 => two_qubit_gates += 1,
                _ => {}
            }
        }

        Self {
            layout: layout.map_or_else(Vec::new, |l| l.iter().collect()),
            single_qubit_gates,
            two_qubit_gates,
            depth: dag.depth(),
            compile_time,
            backend_name: backend_name.into(),
        }
    }
}

fn parse_register_decl(line: &str, keyword: &str) -> Option<(String, u32)> {
    let trimmed = line.trim();
    let rest = trimmed.strip_prefix(keyword)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let open = rest.find('[')?;
    let name = rest[..open].trim();
    if name.is_empty() {
        return None;
    }
    let close = rest.find(']')?;
    if close < open {
        return None;
    }
    let count: u32 = rest[open + 1..close].trim().parse().ok()?;
    Some((name.to_string(), count))
}

fn parse_measure_target_register(line: &str, qreg_name: &str) -> Option<String> {
    let rest = line.trim().strip_prefix("measure")?.trim_start();
    let rest = rest.strip_prefix(&format!("{qreg_name}["))?;
    let close = rest.find(']')?;
    let rest = rest[close + 1..].trim_start().strip_prefix("->")?.trim_start();
    let bracket = rest.find('[')?;
    Some(rest[..bracket].trim().to_string())
}

fn parse_measure_line(line: &str, qreg_name: &str, creg_name: &str) -> Option<(u32, u32)> {
    let rest = line.trim().strip_prefix("measure")?.trim_start();
    let rest = rest.strip_prefix(&format!("{qreg_name}["))?;
    let close = rest.find(']')?;
    let q: u32 = rest[..close].trim().parse().ok()?;
    let rest = rest[close + 1..].trim_start().strip_prefix("->")?.trim_start();
    let rest = rest.strip_prefix(&format!("{creg_name}["))?;
    let close2 = rest.find(']')?;
    let c: u32 = rest[..close2].trim().parse().ok()?;
    Some((q, c))
}

/// All `reg_name[idx]` occurrences on `line`, in the order they appear.
fn scan_register_refs(line: &str, reg_name: &str) -> Vec<u32> {
    let mut out = Vec::new();
    let pattern = format!("{reg_name}[");
    let mut rest = line;
    while let Some(pos) = rest.find(&pattern) {
        rest = &rest[pos + pattern.len()..];
        let Some(close) = rest.find(']') else { break };
        if let Ok(idx) = rest[..close].trim().parse::<u32>() {
            out.push(idx);
        }
        rest = &rest[close + 1..];
    }
    out
}

fn used_indices(text: &str, reg_name: &str) -> Vec<u32> {
    let mut set = std::collections::BTreeSet::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("qreg") || trimmed.starts_with("creg") || trimmed.starts_with("barrier") {
            continue;
        }
        set.extend(scan_register_refs(trimmed, reg_name));
    }
    set.into_iter().collect()
}

/// Replace every `old_name[idx]` on `line` with `new_name[remap(idx)]`,
/// falling back to `idx` unchanged when it has no entry in `remap`.
fn rewrite_register(line: &str, old_name: &str, new_name: &str, remap: &FxHashMap<u32, u32>) -> String {
    let mut out = String::with_capacity(line.len());
    let pattern = format!("{old_name}[");
    let mut rest = line;
    loop {
        match rest.find(&pattern) {
            Some(pos) => {
                out.push_str(&rest[..pos]);
                let after = &rest[pos + pattern.len()..];
                match after.find(']').and_then(|close| {
                    after[..close].trim().parse::<u32>().ok().map(|idx| (close, idx))
                }) {
                    Some((close, idx)) => {
                        let new_idx = remap.get(&idx).copied().unwrap_or(idx);
                        out.push_str(new_name);
                        out.push('[');
                        out.push_str(&new_idx.to_string());
                        out.push(']');
                        rest = &after[close + 1..];
                    }
                    None => {
                        out.push_str(old_name);
                        out.push('[');
                        rest = after;
                    }
                }
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }
    out
}

fn rename_register(text: &str, old_name: &str, new_name: &str) -> String {
    let identity = FxHashMap::default();
    text.lines()
        .map(|l| rewrite_register(l, old_name, new_name, &identity))
        .collect::<Vec<_>>()
        .join("\n")
}

fn canonicalize_delay_units(line: &str) -> String {
    let Some(pos) = line.find("delay(") else { return line.to_string() };
    let after = &line[pos + "delay(".len()..];
    let Some(close) = after.find(')') else { return line.to_string() };
    let Some(stripped) = after[..close].strip_suffix("dt") else { return line.to_string() };

    let mut out = String::with_capacity(line.len() + 1);
    out.push_str(&line[..pos + "delay(".len()]);
    out.push_str(stripped);
    out.push_str("ns");
    out.push_str(&after[close..]);
    out
}
