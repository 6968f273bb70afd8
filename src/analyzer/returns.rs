use luana_code_info::expression::ExpressionInfo;
use luana_code_info::ids::FunctionId;
use luana_code_info::scope::ReturnItem;
use luana_code_info::ttype::{combine, TypeSet, TypeToken};

use crate::context::AnalysisContext;
use crate::resolver::{resolve_call_returns, resolve_expression, ResolutionCache};

/// Ingest one return statement into its function record: track the minimum
/// width, union each slot's types and expressions, and expand a trailing
/// call into contiguous slots.
pub fn resolve_returns(ctx: &mut AnalysisContext, item: &ReturnItem) {
    let function_id = item.function_id;
    let width = item.expressions.len();

    {
        let function = ctx.function_mut(function_id);
        function.min_returns = Some(match function.min_returns {
            Some(existing) => existing.min(width),
            None => width,
        });

        // Constructors already return their class; only the width matters.
        if function.is_constructor {
            return;
        }
    }

    let mut slots: Vec<(ExpressionInfo, TypeSet)> = Vec::with_capacity(width);
    for expression in &item.expressions {
        let types = resolve_expression(ctx, expression);
        slots.push((expression.clone(), types));
    }

    if let Some(last) = item.expressions.last() {
        if last.expression.is_call() {
            let mut seen = ResolutionCache::default();
            let callee_slots = resolve_call_returns(ctx, last, &mut seen);

            for (extra, types) in callee_slots.iter().enumerate().skip(1) {
                let mut picked = last.clone();
                picked.index = Some(extra + 1);
                slots.push((picked, types.clone()));
            }
        }
    }

    let function = ctx.function_mut(function_id);
    for (slot, (expression, types)) in slots.into_iter().enumerate() {
        function.ensure_return_slot(slot);
        function.return_expressions[slot].push(expression);
        combine(&mut function.return_types[slot], &types);
    }
}

/// Slots at or beyond the minimum observed width are implicitly nullable.
/// Runs once per function after all of its returns were ingested.
pub fn apply_min_return_nils(ctx: &mut AnalysisContext, function_id: FunctionId) {
    let function = ctx.function_mut(function_id);
    let Some(min_returns) = function.min_returns else {
        return;
    };

    for slot in min_returns..function.return_types.len() {
        function.return_types[slot].insert(TypeToken::Nil);
    }
}
