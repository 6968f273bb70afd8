use luana_code_info::expression::{
    ExprId, Expression, ExpressionInfo, LiteralExpression, Operator,
};
use luana_code_info::table_info::literal_key;
use luana_code_info::ttype::{single_table_ref, TypeToken};
use rustc_hash::FxHashSet;

use crate::context::AnalysisContext;
use crate::resolver::{resolve, ResolutionCache};

/// Fold an expression down to a literal, or `None` when it cannot be
/// determined.
///
/// The walk is iterative: references step into their single definition,
/// member and index accesses step through singleton-table bases, and
/// logical operations fold when the resolver collapses them to a known
/// boolean. Anything else ends the walk.
pub fn resolve_to_literal(
    ctx: &AnalysisContext,
    info: &ExpressionInfo,
    seen: &mut ResolutionCache,
) -> Option<LiteralExpression> {
    let mut visited: FxHashSet<ExprId> = FxHashSet::default();
    let mut current = info.clone();

    loop {
        if !visited.insert(current.uid) {
            return None;
        }

        match &current.expression {
            Expression::Literal(literal) => return Some(literal.clone()),

            Expression::Reference(id) => {
                let definitions = ctx.definitions(id)?;
                if definitions.len() != 1 {
                    return None;
                }
                current = definitions[0].clone();
            }

            Expression::Member { base, member, .. } => {
                let member_key = literal_key(ctx.interner.lookup(member), None);
                current = single_table_definition(ctx, base, &member_key, seen)?;
            }

            Expression::Index { base, index } => {
                let folded = resolve_to_literal(ctx, index, seen)?;
                let name = folded.literal.clone()?;
                let member_key = literal_key(&name, Some(folded.lua_type));
                current = single_table_definition(ctx, base, &member_key, seen)?;
            }

            Expression::Operation {
                operator: Operator::And | Operator::Or | Operator::Not,
                ..
            } => {
                let types = resolve(ctx, &current, seen);
                if types.len() != 1 {
                    return None;
                }
                return match types.first() {
                    Some(TypeToken::True) => Some(LiteralExpression::boolean(true)),
                    Some(TypeToken::False) => Some(LiteralExpression::boolean(false)),
                    _ => None,
                };
            }

            _ => return None,
        }
    }
}

fn single_table_definition(
    ctx: &AnalysisContext,
    base: &ExpressionInfo,
    member_key: &str,
    seen: &mut ResolutionCache,
) -> Option<ExpressionInfo> {
    let base_types = resolve(ctx, base, seen);
    let table_id = single_table_ref(&base_types)?;

    let definitions = ctx.table(table_id).definitions.get(member_key)?;
    if definitions.len() != 1 {
        return None;
    }
    Some(definitions[0].clone())
}
