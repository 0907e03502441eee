//! Pretty-printing for IR
//!
//! Human-readable output for debugging and for readable test failures.

use super::block::BasicBlock;
use super::function::IrFunction;
use super::instr::IrInstr;
use super::module::IrModule;
use std::fmt::Write;

/// Trait for pretty-printing IR constructs
pub trait PrettyPrint {
    fn pretty_print(&self) -> String;
}

impl PrettyPrint for IrModule {
    fn pretty_print(&self) -> String {
        let mut output = String::new();
        writeln!(output, "; module {}", self.name).unwrap();
        writeln!(output).unwrap();
        for func in &self.functions {
            output.push_str(&func.pretty_print());
            writeln!(output).unwrap();
        }
        output
    }
}

impl PrettyPrint for IrFunction {
    fn pretty_print(&self) -> String {
        let mut output = String::new();

        let params: Vec<String> = self.params.iter().map(|p| format!("{}", p)).collect();
        writeln!(
            output,
            "fn {}({}) -> {} {{",
            self.name,
            params.join(", "),
            self.return_ty
        )
        .unwrap();

        if !self.slots.is_empty() {
            write!(output, "  ; slots: ").unwrap();
            let slots: Vec<String> = self
                .slots
                .iter()
                .enumerate()
                .map(|(i, s)| match &s.name {
                    Some(n) => format!("s{}={}:{}", i, n, s.ty),
                    None => format!("s{}:{}", i, s.ty),
                })
                .collect();
            writeln!(output, "{}", slots.join(", ")).unwrap();
        }

        for table in &self.string_tables {
            let lits: Vec<String> = table
                .literals
                .iter()
                .map(|l| format!("\"{}\"", l.escape_default()))
                .collect();
            writeln!(output, "  ; table[{}] = [{}]", table.len(), lits.join(", ")).unwrap();
        }

        for block in &self.blocks {
            output.push_str(&block.pretty_print_indented(2));
        }

        writeln!(output, "}}").unwrap();
        output
    }
}

impl BasicBlock {
    fn pretty_print_indented(&self, indent: usize) -> String {
        let mut output = String::new();
        let prefix = " ".repeat(indent);

        if let Some(label) = &self.label {
            writeln!(output, "{}{}: ; {}", prefix, self.id, label).unwrap();
        } else {
            writeln!(output, "{}{}:", prefix, self.id).unwrap();
        }

        for instr in &self.instructions {
            writeln!(output, "{}  {}", prefix, format_instr(instr)).unwrap();
        }

        match &self.terminator {
            Some(term) => writeln!(output, "{}  {}", prefix, term).unwrap(),
            None => writeln!(output, "{}  <open>", prefix).unwrap(),
        }

        output
    }
}

fn format_instr(instr: &IrInstr) -> String {
    match instr {
        IrInstr::Const { dest, value } => format!("{} = {}", dest, value),
        IrInstr::BinaryOp {
            dest,
            op,
            left,
            right,
        } => format!("{} = {:?}({}, {})", dest, op, left, right),
        IrInstr::UnaryOp { dest, op, operand } => format!("{} = {:?}({})", dest, op, operand),
        IrInstr::Truthy { dest, operand } => format!("{} = truthy({})", dest, operand),
        IrInstr::IntCast {
            dest,
            kind,
            operand,
        } => format!("{} = {:?}({}) to {}", dest, kind, operand, dest.ty),
        IrInstr::LoadSlot { dest, slot } => format!("{} = load {}", dest, slot),
        IrInstr::StoreSlot { slot, value } => format!("store {} = {}", slot, value),
        IrInstr::ElemAddr { dest, base, index } => {
            format!("{} = elemaddr {}[{}]", dest, base, index)
        }
        IrInstr::LoadPtr { dest, addr } => format!("{} = load *{}", dest, addr),
        IrInstr::StorePtr { addr, value } => format!("store *{} = {}", addr, value),
        IrInstr::ArrayLen { dest, array } => format!("{} = len {}", dest, array),
        IrInstr::ArrayPtr { dest, array } => format!("{} = ptr {}", dest, array),
        IrInstr::Call { dest, callee, args } => {
            let args_str: Vec<String> = args.iter().map(|a| format!("{}", a)).collect();
            match dest {
                Some(d) => format!("{} = call {}({})", d, callee, args_str.join(", ")),
                None => format!("call {}({})", callee, args_str.join(", ")),
            }
        }
        IrInstr::RuntimeCall {
            dest,
            func,
            table,
            args,
        } => {
            let mut args_str: Vec<String> = Vec::new();
            if let Some(t) = table {
                args_str.push(format!("{}", t));
            }
            args_str.extend(args.iter().map(|a| format!("{}", a)));
            match dest {
                Some(d) => format!("{} = call {}({})", d, func, args_str.join(", ")),
                None => format!("call {}({})", func, args_str.join(", ")),
            }
        }
    }
}
