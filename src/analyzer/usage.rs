use luana_ast::Indexer;
use luana_code_info::expression::{Expression, ExpressionInfo};
use luana_code_info::ids::RefId;
use luana_code_info::ttype::{
    combine, single_function_ref, TypeToken, MASK_FUNCTION, MASK_NUMBER, MASK_STRING, MASK_TABLE,
};
use luana_str::StrId;

use crate::context::AnalysisContext;
use crate::resolver::resolve_expression;

/// Canonical identity of a narrowable expression. Expressions with no
/// canonical id accumulate no usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageKey {
    Reference(RefId),
    Member(RefId, StrId),
}

pub fn usage_key(info: &ExpressionInfo) -> Option<UsageKey> {
    match &info.expression {
        Expression::Reference(id) => Some(UsageKey::Reference(*id)),
        Expression::Member { base, member, .. } => base
            .as_reference()
            .map(|base_id| UsageKey::Member(base_id, *member)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageKind {
    Concatenand,
    Indexed,
    LengthOperand,
    IndexAssigned,
    Arithmetic,
    LoopCounter,
    Called,
}

impl UsageKind {
    fn mask(&self) -> u8 {
        match self {
            UsageKind::Concatenand => MASK_STRING | MASK_NUMBER,
            UsageKind::Indexed | UsageKind::LengthOperand => MASK_STRING | MASK_TABLE,
            UsageKind::IndexAssigned => MASK_TABLE,
            UsageKind::Arithmetic | UsageKind::LoopCounter => MASK_NUMBER,
            UsageKind::Called => MASK_FUNCTION,
        }
    }
}

/// Record how an expression was used. Masks compose by intersection, so
/// constraints only ever tighten.
pub fn add_usage(ctx: &mut AnalysisContext, info: &ExpressionInfo, kind: UsageKind) {
    let Some(key) = usage_key(info) else {
        return;
    };

    let mask = kind.mask();
    ctx.usage_masks
        .entry(key)
        .and_modify(|existing| *existing &= mask)
        .or_insert(mask);
}

/// A call site: constrain the callee to `function` and feed the argument
/// types into the callee's inferred parameter types. Arguments missing at
/// this site contribute `nil` to the surplus parameters.
pub fn add_call_usage(
    ctx: &mut AnalysisContext,
    callee: &ExpressionInfo,
    arguments: &[ExpressionInfo],
) {
    add_usage(ctx, callee, UsageKind::Called);

    let callee_types = resolve_expression(ctx, callee);
    let Some(function_id) = single_function_ref(&callee_types) else {
        return;
    };

    let is_colon_call = matches!(
        &callee.expression,
        Expression::Member {
            indexer: Indexer::Colon,
            ..
        }
    );
    let has_self = matches!(
        ctx.function(function_id).parameters.first(),
        Some(RefId::SelfOf(_))
    );
    let offset = if is_colon_call && has_self { 1 } else { 0 };

    let argument_types: Vec<_> = arguments
        .iter()
        .map(|argument| resolve_expression(ctx, argument))
        .collect();

    let param_count = ctx.function(function_id).parameters.len();
    let function = ctx.function_mut(function_id);

    for (i, types) in argument_types.iter().enumerate() {
        let slot = i + offset;
        if slot < param_count {
            combine(&mut function.parameter_types[slot], types);
        }
    }

    for slot in (argument_types.len() + offset)..param_count {
        function.parameter_types[slot].insert(TypeToken::Nil);
    }
}
