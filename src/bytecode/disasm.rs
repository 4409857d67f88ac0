use std::fmt::Write;

use crate::bytecode::ir::{Image, LinkedOp};

/// Print disassembly of a linked image
pub fn print_image(image: &Image) {
    print!("{}", format_image(image));
}

/// Render the op listing followed by the slot table.
pub fn format_image(image: &Image) -> String {
    let mut out = String::new();

    section(&mut out, "main", image.ops.len(), "op-lines", 0);
    disassemble_ops(&mut out, &image.ops, 0);
    out.push('\n');

    section(&mut out, "slots", image.slots.len(), "entries", 0);
    for (i, slot) in image.slots.iter().enumerate() {
        let _ = writeln!(out, "${:<5} {:<7} {}", i, slot.ty, slot.value);
    }

    out
}

fn section(out: &mut String, name: &str, count: usize, unit: &str, indent: usize) {
    let prefix = "  ".repeat(indent);

    let _ = writeln!(out, "{}════════════════════════════════════════", prefix);
    let _ = writeln!(out, "{} {}", prefix, name);
    let _ = writeln!(out, "{} {} {}", prefix, count, unit);
    let _ = writeln!(out, "{}════════════════════════════════════════", prefix);
}

/// Disassemble a slice of op-lines with indentation support
fn disassemble_ops(out: &mut String, ops: &[LinkedOp], indent: usize) {
    let jump_targets = collect_jump_targets(ops);
    let prefix = "  ".repeat(indent);

    for (ip, op) in ops.iter().enumerate() {
        let marker = if jump_targets.contains(&ip) {
            "►"
        } else {
            " "
        };
        let _ = write!(out, "{}{:04} {} ", prefix, ip, marker);

        let _ = format_op(out, op, ip, indent);
    }
}

fn collect_jump_targets(ops: &[LinkedOp]) -> Vec<usize> {
    let mut targets = Vec::new();

    for target in ops.iter().filter_map(LinkedOp::target) {
        let target = target as usize;
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    targets
}

fn format_op(out: &mut String, op: &LinkedOp, ip: usize, indent: usize) -> std::fmt::Result {
    match op {
        LinkedOp::Unary { kind, op1, result } => {
            writeln!(out, "{:<14} {} -> {}", kind.mnemonic(), op1, result)
        }
        LinkedOp::Binary {
            kind,
            op1,
            op2,
            result,
        } => writeln!(
            out,
            "{:<14} {}, {} -> {}",
            kind.mnemonic(),
            op1,
            op2,
            result
        ),
        LinkedOp::FunctionDef { name, body, params } => {
            writeln!(out, "{:<14} {} params {}", "FUNC", name, params)?;
            disassemble_ops(out, body, indent + 1);
            Ok(())
        }
        LinkedOp::JumpTo { target } => {
            writeln!(out, "{:<14} {}", "JUMP", arrow(ip, *target))
        }
        LinkedOp::JumpIf { cond, target } => {
            writeln!(out, "{:<14} {} {}", "JUMP_IF", cond, arrow(ip, *target))
        }
        LinkedOp::JumpIfNot { cond, target } => {
            writeln!(out, "{:<14} {} {}", "JUMP_IF_NOT", cond, arrow(ip, *target))
        }
        LinkedOp::NoOp => writeln!(out, "NOP"),
    }
}

fn arrow(ip: usize, target: u32) -> String {
    let direction = if (target as usize) <= ip { "↑" } else { "↓" };
    format!("{} (→ {:04})", direction, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::compile::Compiler;
    use crate::bytecode::link::link;
    use crate::lang::node::{Node, NodeKind};

    fn listing(ast: &[Node]) -> String {
        let ops = Compiler::new().compile(ast, None).unwrap();
        format_image(&link(&ops).unwrap())
    }

    #[test]
    fn test_marks_jump_targets() {
        let node = Node::new(NodeKind::StmtWhile)
            .with("cond", Node::new(NodeKind::ExprVariable).with("name", "go"))
            .with("stmts", Vec::<Node>::new());

        let text = listing(&[node]);

        assert!(text.contains("0000 ► FETCH_VAR"));
        assert!(text.contains(&format!("{:<14} $1 ↓ (→ 0003)", "JUMP_IF_NOT")));
        assert!(text.contains(&format!("0002   {:<14} ↑ (→ 0000)", "JUMP")));
        assert!(text.contains("0003 ► NOP"));
    }

    #[test]
    fn test_lists_slots_with_types() {
        let node = Node::new(NodeKind::StmtInlineHtml).with("value", "<b>");

        let text = listing(&[node]);

        assert!(text.contains("slots"));
        assert!(text.contains(r#"string  "<b>""#));
    }

    #[test]
    fn test_function_body_is_indented() {
        let function = Node::new(NodeKind::StmtFunction)
            .with("name", "f")
            .with(
                "stmts",
                vec![Node::new(NodeKind::StmtReturn).with("expr", 1i64)],
            );

        let text = listing(&[function]);

        assert!(text.contains(&format!("{:<14} $0 params $3", "FUNC")));
        assert!(text.contains("  0000   RETURN"));
    }
}
