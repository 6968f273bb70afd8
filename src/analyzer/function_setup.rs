use luana_ast as ast;
use luana_ast::Indexer;
use luana_code_info::expression::{Expression, ExpressionInfo};
use luana_code_info::ids::{FunctionId, RefId, TableId};
use luana_code_info::ttype::{combine, TypeSet, TypeToken};
use luana_str::StrId;

use crate::assignment::promote_table_to_class;
use crate::config::Config;
use crate::context::AnalysisContext;
use crate::patterns::closure_class::detect_closure_class;
use crate::patterns::name_hints::seed_parameter_types;
use crate::resolver::resolve_expression;

/// What the walker needs to know after a function was set up: the closure
/// binding to install in the function scope, if one was detected.
pub struct FunctionSetup {
    pub closure_class: Option<(StrId, TableId)>,
}

/// Establish a function record from its identifier expression, parameter
/// list, and body: method/constructor detection, the synthetic `self`
/// parameter, the parameter reverse map, and optional name heuristics.
/// The closure-class detector runs first; when it fires, the constructor
/// returns the synthetic class and class-method detection is suppressed.
pub fn set_function_info(
    ctx: &mut AnalysisContext,
    config: &Config,
    function_id: FunctionId,
    identifier: Option<&ExpressionInfo>,
    parameters: &[ast::Parameter],
    body: &[ast::Statement],
) -> FunctionSetup {
    let name = identifier.and_then(|info| identifier_name(info));
    let is_method = matches!(
        identifier.map(|info| &info.expression),
        Some(Expression::Member {
            indexer: Indexer::Colon,
            ..
        })
    );

    {
        let function = ctx.function_mut(function_id);
        function.name = name;
        function.is_method = is_method;
        function.identifier_expression = identifier.cloned();
    }

    let mut closure_class = None;
    let mut method_base: Option<TableId> = None;

    if let Some(shape) = detect_closure_class(body) {
        let class_table = ctx.new_table();
        {
            let table = ctx.table_mut(class_table);
            table.is_closure_class = true;
            table.is_local_class = true;
        }
        if let Some(name) = name {
            promote_table_to_class(ctx, class_table, name, false);
        }

        let function = ctx.function_mut(function_id);
        function.is_constructor = true;
        function.ensure_return_slot(0);
        function.return_types[0].insert(TypeToken::TableRef(class_table));

        let binding = ctx.intern(&shape.binding);
        closure_class = Some((binding, class_table));
    } else if let Some(info) = identifier {
        if let Expression::Member { base, member, .. } = &info.expression {
            let member = *member;
            let base_types = resolve_expression(ctx, base);
            let mut filtered = base_types;
            filtered.shift_remove(&TypeToken::Instance);

            if filtered.len() == 1 {
                if let Some(TypeToken::TableRef(table_id)) = filtered.first().copied() {
                    method_base = Some(table_id);

                    if member == StrId::NEW {
                        if !ctx.table(table_id).is_class() {
                            if let Some(class_name) = implied_class_name(ctx, base, table_id) {
                                promote_table_to_class(ctx, table_id, class_name, true);
                            }
                        }

                        let function = ctx.function_mut(function_id);
                        function.is_constructor = true;
                        function.ensure_return_slot(0);
                        function.return_types[0].insert(TypeToken::TableRef(table_id));
                    }
                }
            }
        }
    }

    if is_method {
        let self_ref = RefId::SelfOf(function_id);

        let mut self_types = TypeSet::default();
        if let Some(table_id) = method_base {
            self_types.insert(TypeToken::TableRef(table_id));
            self_types.insert(TypeToken::Instance);
        }

        let function = ctx.function_mut(function_id);
        function.parameters.push(self_ref);
        function.parameter_names.push(StrId::SELF);
        function.parameter_types.push(self_types);

        if let Some(table_id) = method_base {
            let mut definition = ctx.expr(Expression::Reference(RefId::Table(table_id)));
            definition.instance = true;
            ctx.add_definition(self_ref, definition);
        }
    }

    let slot_offset = if is_method { 1 } else { 0 };
    let mut declared_names: Vec<String> = Vec::new();

    for parameter in parameters {
        let parameter_name = match parameter {
            ast::Parameter::Name(identifier) => identifier.name.clone(),
            ast::Parameter::Varargs => "...".to_string(),
        };
        declared_names.push(parameter_name.clone());

        let name_id = ctx.intern(&parameter_name);
        let param_id = ctx.new_param(function_id);

        let function = ctx.function_mut(function_id);
        function.parameters.push(RefId::Param(param_id));
        function.parameter_names.push(name_id);
        function.parameter_types.push(TypeSet::default());
    }

    if config.use_name_heuristics {
        let name_refs: Vec<&str> = declared_names.iter().map(|n| n.as_str()).collect();
        let seeds = seed_parameter_types(&name_refs);

        let function = ctx.function_mut(function_id);
        for (position, seed) in seeds.into_iter().enumerate() {
            if let Some(types) = seed {
                combine(&mut function.parameter_types[position + slot_offset], &types);
            }
        }
    }

    FunctionSetup { closure_class }
}

fn identifier_name(info: &ExpressionInfo) -> Option<StrId> {
    match &info.expression {
        Expression::Reference(id) => id.name(),
        Expression::Member { member, .. } => Some(*member),
        _ => None,
    }
}

/// Name for promoting a constructor's base table to an implied class: the
/// name it was written under, or failing that the dotted name recorded on
/// the table.
fn implied_class_name(
    ctx: &mut AnalysisContext,
    base: &ExpressionInfo,
    table_id: TableId,
) -> Option<StrId> {
    if let Some(name) = base.as_reference().and_then(|id| id.name()) {
        return Some(name);
    }

    let original = ctx.table(table_id).original_name.clone()?;
    Some(ctx.intern(&original))
}
