//! Switch Lowering
//!
//! Integral switches dispatch directly on the scrutinee. String-keyed
//! switches have no machine primitive, so the case literals are sorted
//! lexicographically into a constant table, a runtime entry point
//! (picked by element width) searches it and returns the matched
//! ordinal, and an ordinary integral dispatch runs on that ordinal.
//! Duplicate case constants are rejected in both forms.

use super::{LoopTarget, Lowerer, SwitchBlocks, TargetKind};
use crate::error::{CompileError, CompileResult};
use crate::ir::{BlockId, IrConstant, IrInstr, RuntimeFn, StringTable, Terminator};
use rustc_hash::FxHashSet;
use sable_ast::{CharWidth, Span, Stmt, SwitchStmt, Ty};

impl<'a> Lowerer<'a> {
    pub(crate) fn lower_switch(&mut self, stmt: &Stmt, sw: &SwitchStmt) -> CompileResult<()> {
        let old = self.scope;

        // Every case label must reduce to a compile-time constant.
        let mut groups: Vec<Vec<IrConstant>> = Vec::with_capacity(sw.cases.len());
        for case in &sw.cases {
            let consts = case
                .labels
                .iter()
                .map(|e| self.lower_const_expr(e))
                .collect::<CompileResult<Vec<_>>>()?;
            if consts.is_empty() {
                return Err(CompileError::internal("case group with no labels"));
            }
            groups.push(consts);
        }

        let is_string = matches!(
            groups.first().and_then(|g| g.first()),
            Some(IrConstant::Str { .. })
        );

        // One block per case group; chained labels share it.
        let mut case_blocks: Vec<BlockId> = Vec::with_capacity(sw.cases.len());
        for _ in &sw.cases {
            case_blocks.push(self.new_block("case", old.horizon));
        }

        let mut case_values: Vec<(i64, BlockId)> = Vec::new();
        let mut table_id = None;

        if is_string {
            let mut entries: Vec<(String, usize, Span)> = Vec::new();
            let mut width: Option<CharWidth> = None;
            for (gi, (consts, case)) in groups.iter().zip(&sw.cases).enumerate() {
                for c in consts {
                    match c {
                        IrConstant::Str { value, width: w } => {
                            if *width.get_or_insert(*w) != *w {
                                return Err(CompileError::internal(
                                    "mixed string widths in one switch",
                                ));
                            }
                            entries.push((value.clone(), gi, case.span));
                        }
                        _ => return Err(CompileError::NonConstantCase { span: case.span }),
                    }
                }
            }

            // Stable sort, so equal literals keep source order and the
            // duplicate reported is the later case.
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for pair in entries.windows(2) {
                if pair[0].0 == pair[1].0 {
                    return Err(CompileError::DuplicateCase {
                        value: format!("\"{}\"", pair[0].0),
                        span: pair[1].2,
                    });
                }
            }

            // Each sorted position becomes the dispatch ordinal of the
            // case group its literal came from.
            let mut literals = Vec::with_capacity(entries.len());
            for (ordinal, (literal, gi, _)) in entries.iter().enumerate() {
                case_values.push((ordinal as i64, case_blocks[*gi]));
                literals.push(literal.clone());
            }
            let width = width.expect("string switch with no entries");
            table_id = Some(self.func.add_string_table(StringTable { width, literals }));
        } else {
            let mut seen = FxHashSet::default();
            for (gi, (consts, case)) in groups.iter().zip(&sw.cases).enumerate() {
                for c in consts {
                    let v = c
                        .as_int()
                        .ok_or(CompileError::NonConstantCase { span: case.span })?;
                    if !seen.insert(v) {
                        return Err(CompileError::DuplicateCase {
                            value: v.to_string(),
                            span: case.span,
                        });
                    }
                    case_values.push((v, case_blocks[gi]));
                }
            }
        }

        let default_bb = sw
            .default
            .as_ref()
            .map(|_| self.new_block("default", old.horizon));
        let end_bb = self.new_block("switchend", old.horizon);

        // Recorded before bodies are lowered so `goto case` inside them
        // resolves.
        self.switch_blocks.insert(
            stmt.id,
            SwitchBlocks {
                cases: case_blocks.clone(),
                default: default_bb,
            },
        );

        let value = match table_id {
            Some(table) => {
                let scrutinee = self.lower_expr(&sw.scrutinee)?;
                let func = match self.func.string_tables[table.0 as usize].width {
                    CharWidth::Narrow => RuntimeFn::SwitchString,
                    CharWidth::Wide => RuntimeFn::SwitchWstring,
                    CharWidth::Quad => RuntimeFn::SwitchDstring,
                };
                let dest = self.alloc_register(Ty::int(32, true));
                self.emit(IrInstr::RuntimeCall {
                    dest: Some(dest.clone()),
                    func,
                    table: Some(table),
                    args: vec![scrutinee],
                });
                dest
            }
            None => self.lower_expr(&sw.scrutinee)?,
        };

        self.set_terminator(Terminator::Switch {
            value,
            cases: case_values,
            default: default_bb.unwrap_or(end_bb),
        });

        // Bodies in source order. A body that does not exit explicitly
        // falls through to the next case block; the last falls through
        // to default-or-end.
        let switch_region = self.bindings.region_of(stmt.id);
        let n = sw.cases.len();
        for (i, case) in sw.cases.iter().enumerate() {
            let next_bb = if i + 1 < n {
                case_blocks[i + 1]
            } else {
                default_bb.unwrap_or(end_bb)
            };
            self.set_scope(case_blocks[i], Some(next_bb));
            let target = LoopTarget {
                owner: stmt.id,
                region: switch_region,
                kind: TargetKind::Switch,
                reentry: end_bb,
                exit: end_bb,
            };
            self.with_target(target, |l| l.lower_stmt(&case.body))?;
            self.jump_if_open(next_bb);
        }

        if let Some(def) = &sw.default {
            let def_bb = default_bb.expect("default block allocated above");
            self.set_scope(def_bb, Some(end_bb));
            let target = LoopTarget {
                owner: stmt.id,
                region: switch_region,
                kind: TargetKind::Switch,
                reentry: end_bb,
                exit: end_bb,
            };
            self.with_target(target, |l| l.lower_stmt(&def.body))?;
            self.jump_if_open(end_bb);
        }

        self.set_scope(end_bb, old.horizon);
        Ok(())
    }
}
