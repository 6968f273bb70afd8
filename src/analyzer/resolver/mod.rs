use luana_code_info::expression::{ExprId, Expression, ExpressionInfo, LuaType, Operator};
use luana_code_info::ids::RefId;
use luana_code_info::table_info::literal_key;
use luana_code_info::ttype::{
    collapse_booleans, combine, get_boolean, get_false, get_nil, get_number, get_string,
    get_true, narrow_by_mask, table_refs, TypeSet, TypeToken,
};
use rustc_hash::FxHashMap;

use crate::context::AnalysisContext;
use crate::usage::usage_key;

pub mod call_returns;
pub mod literal;

#[cfg(test)]
mod tests;

pub use call_returns::resolve_call_returns;
pub use literal::resolve_to_literal;

/// Memoization of in-flight and completed resolutions, keyed by expression
/// identity and multi-return slot. A back-edge into an expression currently
/// being resolved yields the partial set accumulated so far, which bounds
/// recursion and makes resolution terminate at the fixed point reached
/// before the cycle.
pub type ResolutionCache = FxHashMap<(ExprId, usize), TypeSet>;

pub fn resolve_expression(ctx: &AnalysisContext, info: &ExpressionInfo) -> TypeSet {
    let mut seen = ResolutionCache::default();
    resolve(ctx, info, &mut seen)
}

pub fn resolve(
    ctx: &AnalysisContext,
    info: &ExpressionInfo,
    seen: &mut ResolutionCache,
) -> TypeSet {
    let key = (info.uid, info.index.unwrap_or(1));
    if let Some(partial) = seen.get(&key) {
        return partial.clone();
    }
    seen.insert(key, TypeSet::default());

    let mut types = match &info.expression {
        Expression::Literal(literal) => {
            let mut types = TypeSet::default();
            match literal.lua_type {
                LuaType::Nil => {
                    types.insert(TypeToken::Nil);
                }
                LuaType::Boolean => {
                    types.insert(if literal.literal.as_deref() == Some("true") {
                        TypeToken::True
                    } else {
                        TypeToken::False
                    });
                }
                LuaType::String => {
                    types.insert(TypeToken::String);
                }
                LuaType::Number => {
                    types.insert(TypeToken::Number);
                }
                LuaType::Table => {
                    if let Some(table_id) = literal.table_id {
                        types.insert(TypeToken::TableRef(table_id));
                    } else {
                        types.insert(TypeToken::Table);
                    }
                }
                LuaType::Function => {
                    if let Some(function_id) = literal.function_id {
                        types.insert(TypeToken::FunctionRef(function_id));
                    } else {
                        types.insert(TypeToken::Function);
                    }
                }
            }
            types
        }

        Expression::Reference(id) => resolve_reference(ctx, *id, key, seen),

        Expression::Member { base, member, .. } => {
            let base_types = resolve(ctx, base, seen);
            let member_key = literal_key(ctx.interner.lookup(member), None);
            resolve_table_member(ctx, &base_types, &member_key, seen)
        }

        Expression::Index { base, index } => {
            // Fold the index to a literal; an unfoldable index resolves to
            // nothing.
            match resolve_to_literal(ctx, index, seen) {
                Some(folded) => {
                    let name = folded.literal.clone().unwrap_or_default();
                    let member_key = literal_key(&name, Some(folded.lua_type));
                    let base_types = resolve(ctx, base, seen);
                    resolve_table_member(ctx, &base_types, &member_key, seen)
                }
                None => TypeSet::default(),
            }
        }

        Expression::Operation {
            operator: Operator::Call,
            ..
        } => {
            let slots = resolve_call_returns(ctx, info, seen);
            let slot = info.index.unwrap_or(1);
            slots.get(slot - 1).cloned().unwrap_or_else(get_nil)
        }

        Expression::Operation {
            operator,
            arguments,
        } => resolve_operation(ctx, *operator, arguments, seen),

        Expression::Require { module } => resolve_require(ctx, *module, info.index.unwrap_or(1)),
    };

    // Usage narrowing: only applies when there is something to choose
    // between, and never empties the set.
    if types.len() > 1 {
        if let Some(usage) = usage_key(info) {
            if let Some(mask) = ctx.usage_masks.get(&usage) {
                narrow_by_mask(&mut types, *mask);
            }
        }
    }

    collapse_booleans(&mut types);

    seen.insert(key, types.clone());
    types
}

fn resolve_reference(
    ctx: &AnalysisContext,
    id: RefId,
    cache_key: (ExprId, usize),
    seen: &mut ResolutionCache,
) -> TypeSet {
    let mut types = TypeSet::default();

    match id {
        RefId::Table(table_id) => {
            types.insert(TypeToken::TableRef(table_id));
        }
        RefId::Function(function_id) => {
            types.insert(TypeToken::FunctionRef(function_id));
        }
        RefId::Instance(_) => {
            types.insert(TypeToken::Instance);
        }
        RefId::Param(_) | RefId::SelfOf(_) => {
            if let Some((function_id, slot)) = ctx.param_location(&id) {
                if let Some(param_types) = ctx.function(function_id).parameter_types.get(slot) {
                    combine(&mut types, param_types);
                }
            }
        }
        _ => {}
    }

    if let Some(definitions) = ctx.definitions(&id) {
        for definition in definitions {
            let definition_types = resolve(ctx, definition, seen);
            combine(&mut types, &definition_types);
            seen.insert(cache_key, types.clone());
        }
    }

    types
}

fn resolve_table_member(
    ctx: &AnalysisContext,
    base_types: &TypeSet,
    member_key: &str,
    seen: &mut ResolutionCache,
) -> TypeSet {
    let mut types = TypeSet::default();

    for table_id in table_refs(base_types) {
        let definitions = match ctx.table(table_id).definitions.get(member_key) {
            Some(definitions) => definitions,
            None => continue,
        };

        for definition in definitions {
            let definition_types = resolve(ctx, definition, seen);
            combine(&mut types, &definition_types);
        }
    }

    types
}

fn resolve_operation(
    ctx: &AnalysisContext,
    operator: Operator,
    arguments: &[ExpressionInfo],
    seen: &mut ResolutionCache,
) -> TypeSet {
    if operator.is_arithmetic() || operator.is_bitwise() || operator == Operator::Length {
        return get_number();
    }
    if operator == Operator::Concat {
        return get_string();
    }
    if operator.is_comparison() {
        return get_boolean();
    }

    match operator {
        Operator::Not => match literal_truthiness(ctx, arguments.first(), seen) {
            Some(true) => get_false(),
            Some(false) => get_true(),
            None => get_boolean(),
        },

        Operator::Or => {
            let (Some(lhs), Some(rhs)) = (arguments.first(), arguments.get(1)) else {
                return TypeSet::default();
            };

            // `x and y or z` reads as a ternary: the truthiness decision
            // belongs to `y`.
            let decider = match &lhs.expression {
                Expression::Operation {
                    operator: Operator::And,
                    arguments: and_arguments,
                } => and_arguments.get(1).unwrap_or(lhs),
                _ => lhs,
            };

            match literal_truthiness(ctx, Some(decider), seen) {
                Some(false) => resolve(ctx, rhs, seen),
                _ => {
                    let mut types = resolve(ctx, lhs, seen);
                    combine(&mut types, &resolve(ctx, rhs, seen));
                    types
                }
            }
        }

        Operator::And => {
            let (Some(lhs), Some(rhs)) = (arguments.first(), arguments.get(1)) else {
                return TypeSet::default();
            };

            match literal_truthiness(ctx, Some(lhs), seen) {
                Some(true) => resolve(ctx, rhs, seen),
                Some(false) => resolve(ctx, lhs, seen),
                None => {
                    let mut types = resolve(ctx, lhs, seen);
                    combine(&mut types, &resolve(ctx, rhs, seen));
                    types
                }
            }
        }

        _ => TypeSet::default(),
    }
}

/// Truthiness of a literal-only operand; `None` when the operand cannot be
/// folded, which callers treat as undetermined.
fn literal_truthiness(
    ctx: &AnalysisContext,
    info: Option<&ExpressionInfo>,
    seen: &mut ResolutionCache,
) -> Option<bool> {
    let folded = resolve_to_literal(ctx, info?, seen)?;
    Some(folded.is_truthy())
}

fn resolve_require(ctx: &AnalysisContext, module: luana_str::StrId, slot: usize) -> TypeSet {
    let function_id = match ctx.module_functions.get(&module) {
        Some(function_id) => *function_id,
        None => {
            // Shorter require paths go through the alias map; ambiguous
            // aliases stay unresolved.
            let candidates = match ctx.module_aliases.get(&module) {
                Some(candidates) if candidates.len() == 1 => candidates,
                _ => return TypeSet::default(),
            };
            match ctx.module_functions.get(&candidates[0]) {
                Some(function_id) => *function_id,
                None => return TypeSet::default(),
            }
        }
    };

    ctx.function(function_id)
        .return_types
        .get(slot - 1)
        .cloned()
        .unwrap_or_default()
}
