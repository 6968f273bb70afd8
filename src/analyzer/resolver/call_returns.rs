use luana_code_info::expression::{Expression, ExpressionInfo, Operator};
use luana_code_info::ids::RefId;
use luana_code_info::ttype::{
    combine, get_nil, get_number, get_string, single_function_ref, TypeSet, TypeToken,
};
use luana_str::StrId;

use crate::context::AnalysisContext;
use crate::resolver::{resolve, ResolutionCache};

/// Return slots of a call expression. Well-known builtins are answered by
/// name; everything else resolves the callee to a single function record.
pub fn resolve_call_returns(
    ctx: &AnalysisContext,
    call: &ExpressionInfo,
    seen: &mut ResolutionCache,
) -> Vec<TypeSet> {
    let Expression::Operation {
        operator: Operator::Call,
        arguments,
    } = &call.expression
    else {
        return Vec::new();
    };

    let Some(callee) = arguments.first() else {
        return Vec::new();
    };

    if let Some(builtin) = builtin_returns(callee) {
        return builtin;
    }

    let callee_types = resolve(ctx, callee, seen);
    let Some(function_id) = single_function_ref(&callee_types) else {
        return Vec::new();
    };

    let function = ctx.function(function_id);
    let mut slots = function.return_types.clone();

    // A constructed value carries the instance marker so that member
    // assignments on it attach as instance fields.
    if function.is_constructor {
        if let Some(first) = slots.first_mut() {
            first.insert(TypeToken::Instance);
        }
    }

    slots
}

fn builtin_returns(callee: &ExpressionInfo) -> Option<Vec<TypeSet>> {
    let name = match &callee.expression {
        Expression::Reference(RefId::Global(name)) => *name,
        _ => return None,
    };

    match name {
        StrId::TONUMBER => {
            let mut slot = get_number();
            combine(&mut slot, &get_nil());
            Some(vec![slot])
        }
        StrId::TOSTRING => Some(vec![get_string()]),
        StrId::GET_TEXT => Some(vec![get_string()]),
        StrId::GET_TEXT_OR_NULL => {
            let mut slot = get_string();
            combine(&mut slot, &get_nil());
            Some(vec![slot])
        }
        _ => None,
    }
}
