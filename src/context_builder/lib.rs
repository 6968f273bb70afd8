//! Walks one module's parse tree in source order and feeds the analysis
//! context: assignments, usages, function setups, and return items.

use luana_analyzer::assignment::add_assignment;
use luana_analyzer::config::Config;
use luana_analyzer::context::AnalysisContext;
use luana_analyzer::function_setup::{set_function_info, FunctionSetup};
use luana_analyzer::items_resolver::resolve_items;
use luana_analyzer::patterns::metatable::handle_set_metatable;
use luana_analyzer::usage::{add_usage, UsageKind};
use luana_ast as ast;
use luana_code_info::expression::{Expression, ExpressionInfo, LiteralExpression, Operator};
use luana_code_info::ids::{FunctionId, RefId};
use luana_code_info::resolved_module::ResolvedModule;
use luana_code_info::scope::{ReturnItem, ScopeKind};
use luana_str::StrId;

mod expression_builder;

pub use expression_builder::build_expression;
use expression_builder::build_target;

/// Ingest a whole module and collapse its scope into the partial result.
/// The module body owns a synthetic function whose return slots are the
/// module's returns.
pub fn walk_module(
    ctx: &mut AnalysisContext,
    config: &Config,
    module_id: StrId,
    chunk: &ast::Chunk,
) -> ResolvedModule {
    ctx.current_module = Some(module_id);

    let module_function = ctx.new_function();
    ctx.push_scope(ScopeKind::Module);

    walk_statements(ctx, config, &chunk.body, module_function);

    let scope = ctx.pop_scope();
    resolve_items(ctx, module_id, scope, module_function)
}

pub(crate) fn walk_statements(
    ctx: &mut AnalysisContext,
    config: &Config,
    statements: &[ast::Statement],
    enclosing: FunctionId,
) {
    for statement in statements {
        walk_statement(ctx, config, statement, enclosing);
    }
}

fn walk_statement(
    ctx: &mut AnalysisContext,
    config: &Config,
    statement: &ast::Statement,
    enclosing: FunctionId,
) {
    match statement {
        ast::Statement::Local(local) => {
            let values: Vec<ExpressionInfo> = local
                .init
                .iter()
                .map(|init| build_expression(ctx, config, init))
                .collect();

            for (position, variable) in local.variables.iter().enumerate() {
                let value = value_for_target(ctx, &values, position);
                let name = ctx.intern(&variable.name);
                let id = ctx.declare_local(name);
                let target = ctx.expr(Expression::Reference(id));
                add_assignment(ctx, config, &target, value);
            }
        }

        ast::Statement::Assignment(assignment) => {
            let values: Vec<ExpressionInfo> = assignment
                .init
                .iter()
                .map(|init| build_expression(ctx, config, init))
                .collect();
            let targets: Vec<ExpressionInfo> = assignment
                .variables
                .iter()
                .map(|variable| build_target(ctx, config, variable))
                .collect();

            for (position, target) in targets.iter().enumerate() {
                let value = value_for_target(ctx, &values, position);
                add_assignment(ctx, config, target, value);
            }
        }

        ast::Statement::FunctionDeclaration(declaration) => {
            walk_function_declaration(ctx, config, declaration);
        }

        ast::Statement::Call(call_statement) => {
            let info = build_expression(ctx, config, &call_statement.expression);

            if let Expression::Operation {
                operator: Operator::Call,
                arguments,
            } = &info.expression
            {
                if let [callee, target, meta] = arguments.as_slice() {
                    if callee.as_reference() == Some(RefId::Global(StrId::SETMETATABLE)) {
                        let target = target.clone();
                        let meta = meta.clone();
                        handle_set_metatable(ctx, &target, &meta);
                    }
                }
            }
        }

        ast::Statement::Return(return_statement) => {
            let expressions: Vec<ExpressionInfo> = return_statement
                .arguments
                .iter()
                .map(|argument| build_expression(ctx, config, argument))
                .collect();

            ctx.pending_returns.push(ReturnItem {
                function_id: enclosing,
                expressions,
            });
        }

        ast::Statement::If(if_statement) => {
            for clause in &if_statement.clauses {
                if let Some(condition) = &clause.condition {
                    build_expression(ctx, config, condition);
                }
                walk_block(ctx, config, &clause.body, enclosing);
            }
        }

        ast::Statement::While(while_statement) => {
            build_expression(ctx, config, &while_statement.condition);
            walk_block(ctx, config, &while_statement.body, enclosing);
        }

        ast::Statement::Repeat(repeat_statement) => {
            walk_block(ctx, config, &repeat_statement.body, enclosing);
            build_expression(ctx, config, &repeat_statement.condition);
        }

        ast::Statement::NumericFor(numeric_for) => {
            let start = build_expression(ctx, config, &numeric_for.start);
            add_usage(ctx, &start, UsageKind::Arithmetic);
            let limit = build_expression(ctx, config, &numeric_for.limit);
            add_usage(ctx, &limit, UsageKind::Arithmetic);
            if let Some(step) = &numeric_for.step {
                let step = build_expression(ctx, config, step);
                add_usage(ctx, &step, UsageKind::Arithmetic);
            }

            ctx.push_scope(ScopeKind::Block);
            let name = ctx.intern(&numeric_for.variable.name);
            let counter = ctx.declare_local(name);
            ctx.add_definition(counter, start);
            let counter_reference = ctx.expr(Expression::Reference(counter));
            add_usage(ctx, &counter_reference, UsageKind::LoopCounter);

            walk_statements(ctx, config, &numeric_for.body, enclosing);
            ctx.pop_scope();
        }

        ast::Statement::GenericFor(generic_for) => {
            for iterator in &generic_for.iterators {
                build_expression(ctx, config, iterator);
            }

            ctx.push_scope(ScopeKind::Block);
            for variable in &generic_for.variables {
                let name = ctx.intern(&variable.name);
                ctx.declare_local(name);
            }
            walk_statements(ctx, config, &generic_for.body, enclosing);
            ctx.pop_scope();
        }

        ast::Statement::Do(do_statement) => {
            walk_block(ctx, config, &do_statement.body, enclosing);
        }

        ast::Statement::Break => {}
    }
}

fn walk_block(
    ctx: &mut AnalysisContext,
    config: &Config,
    body: &[ast::Statement],
    enclosing: FunctionId,
) {
    ctx.push_scope(ScopeKind::Block);
    walk_statements(ctx, config, body, enclosing);
    ctx.pop_scope();
}

fn walk_function_declaration(
    ctx: &mut AnalysisContext,
    config: &Config,
    declaration: &ast::FunctionDeclaration,
) {
    // `local function f` binds the name before the body, so recursive
    // references resolve.
    if declaration.is_local {
        if let Some(ast::Expression::Identifier(identifier)) = &declaration.identifier {
            let name = ctx.intern(&identifier.name);
            ctx.declare_local(name);
        }
    }

    let identifier_info = declaration
        .identifier
        .as_ref()
        .map(|identifier| build_target(ctx, config, identifier));

    let function_id = ctx.new_function();
    let setup = set_function_info(
        ctx,
        config,
        function_id,
        identifier_info.as_ref(),
        &declaration.parameters,
        &declaration.body,
    );

    let literal = ctx.expr(Expression::Literal(LiteralExpression::function(function_id)));
    if let Some(identifier) = &identifier_info {
        add_assignment(ctx, config, identifier, literal);
    }

    enter_function_scope(ctx, function_id, &setup);
    walk_statements(ctx, config, &declaration.body, function_id);
    ctx.pop_scope();
}

pub(crate) fn enter_function_scope(
    ctx: &mut AnalysisContext,
    function_id: FunctionId,
    setup: &FunctionSetup,
) {
    ctx.push_scope(ScopeKind::Function(function_id));

    let bindings: Vec<(StrId, RefId)> = {
        let function = ctx.function(function_id);
        function
            .parameter_names
            .iter()
            .copied()
            .zip(function.parameters.iter().copied())
            .collect()
    };

    let scope = ctx.current_scope_mut();
    for (name, id) in bindings {
        scope.locals.insert(name, id);
    }
    if let Some((binding, table)) = setup.closure_class {
        scope.closure_self = Some((binding, table));
    }
}

/// Distribute right-hand values over assignment targets: values map one to
/// one, a trailing call fans out into indexed picks, and anything past the
/// end is nil.
fn value_for_target(
    ctx: &mut AnalysisContext,
    values: &[ExpressionInfo],
    position: usize,
) -> ExpressionInfo {
    if position < values.len() {
        return values[position].clone();
    }

    if let Some(last) = values.last() {
        if last.expression.is_call() {
            let mut picked = last.clone();
            picked.index = Some(position - (values.len() - 1) + 1);
            return picked;
        }
    }

    ctx.expr(Expression::Literal(LiteralExpression::nil()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(body: Vec<ast::Statement>) -> (AnalysisContext, ResolvedModule) {
        let mut ctx = AnalysisContext::new();
        let config = Config::new(".".to_string());
        let module_id = ctx.intern("mod");
        let resolved = walk_module(&mut ctx, &config, module_id, &ast::Chunk { body });
        (ctx, resolved)
    }

    #[test]
    fn require_bindings_are_recorded() {
        let (ctx, resolved) = walk(vec![ast::Statement::Local(ast::LocalStatement {
            variables: vec![ast::Identifier::new("text")],
            init: vec![ast::Expression::Call(Box::new(ast::CallExpression {
                base: ast::Expression::Identifier(ast::Identifier::new("require")),
                arguments: vec![ast::Expression::StringLiteral(ast::StringLiteral {
                    value: "lib/text".to_string(),
                })],
            }))],
        })]);

        assert_eq!(resolved.requires.len(), 1);
        assert_eq!(
            ctx.interner.lookup(&resolved.requires[0].name),
            "text"
        );
        assert_eq!(
            ctx.interner.lookup(&resolved.requires[0].module),
            "lib/text"
        );
    }

    #[test]
    fn global_table_assignment_declares_a_class() {
        let (ctx, resolved) = walk(vec![ast::Statement::Assignment(
            ast::AssignmentStatement {
                variables: vec![ast::Expression::Identifier(ast::Identifier::new("Window"))],
                init: vec![ast::Expression::TableConstructor(
                    ast::TableConstructorExpression { fields: Vec::new() },
                )],
            },
        )]);

        assert_eq!(resolved.classes.len(), 1);
        assert_eq!(ctx.interner.lookup(&resolved.classes[0].name), "Window");
        assert!(ctx.table(resolved.classes[0].table_id).is_class());
    }

    #[test]
    fn trailing_call_values_pick_their_slot() {
        // local a, b = f()
        let (ctx, resolved) = walk(vec![ast::Statement::Local(ast::LocalStatement {
            variables: vec![ast::Identifier::new("a"), ast::Identifier::new("b")],
            init: vec![ast::Expression::Call(Box::new(ast::CallExpression {
                base: ast::Expression::Identifier(ast::Identifier::new("f")),
                arguments: Vec::new(),
            }))],
        })]);

        let second = module_local(&ctx, &resolved, "b");
        let definitions = ctx.definitions(&second).unwrap();
        assert_eq!(definitions.len(), 1);
        assert!(definitions[0].expression.is_call());
        assert_eq!(definitions[0].index, Some(2));
    }

    fn module_local(ctx: &AnalysisContext, resolved: &ResolvedModule, name: &str) -> RefId {
        let id = ctx.interner.get(name).unwrap();
        resolved.scope.lookup(id).unwrap()
    }
}
