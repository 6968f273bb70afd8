use luana_ast::Indexer;
use luana_code_info::expression::{Expression, ExpressionInfo, LuaType, Operator};
use luana_code_info::ids::{RefId, TableId};
use luana_code_info::ttype::single_table_ref;
use luana_str::StrId;

use crate::context::AnalysisContext;
use crate::resolver::resolve_expression;

#[derive(Debug, Clone)]
pub struct DeriveCall {
    /// Name of the base class being derived from.
    pub base: StrId,
    pub base_table: Option<TableId>,
    /// The string literal handed to `derive`.
    pub derive_name: String,
}

/// `X:derive("T")` where the single argument is a string literal and `X`
/// is a global name or a local resolving to one classed table.
pub fn detect_derive_call(ctx: &AnalysisContext, info: &ExpressionInfo) -> Option<DeriveCall> {
    let Expression::Operation {
        operator: Operator::Call,
        arguments,
    } = &info.expression
    else {
        return None;
    };

    let [callee, argument] = arguments.as_slice() else {
        return None;
    };

    let Expression::Member {
        base,
        member,
        indexer: Indexer::Colon,
    } = &callee.expression
    else {
        return None;
    };

    if *member != StrId::DERIVE {
        return None;
    }

    let literal = argument.as_literal()?;
    if literal.lua_type != LuaType::String {
        return None;
    }
    let derive_name = literal.literal.clone()?;

    match base.as_reference() {
        Some(RefId::Global(name)) => {
            let base_table = single_table_ref(&resolve_expression(ctx, base));
            Some(DeriveCall {
                base: name,
                base_table,
                derive_name,
            })
        }
        Some(RefId::Local { .. }) => {
            let base_table = single_table_ref(&resolve_expression(ctx, base))?;
            let base = ctx.table(base_table).class_name?;
            Some(DeriveCall {
                base,
                base_table: Some(base_table),
                derive_name,
            })
        }
        _ => None,
    }
}
