use luana_analyzer::config::Config;
use luana_analyzer::context::AnalysisContext;
use luana_analyzer::function_setup::set_function_info;
use luana_analyzer::usage::{add_call_usage, add_usage, UsageKind};
use luana_ast as ast;
use luana_code_info::expression::{Expression, ExpressionInfo, LiteralExpression, LuaType, Operator};
use luana_code_info::ids::RefId;
use luana_code_info::table_info::{literal_key, LiteralField, TableKey};

use crate::{enter_function_scope, walk_statements};

/// Convert a parsed expression, interning table constructors and function
/// literals as they are met and registering the usages the sub-expressions
/// imply.
pub fn build_expression(
    ctx: &mut AnalysisContext,
    config: &Config,
    expression: &ast::Expression,
) -> ExpressionInfo {
    match expression {
        ast::Expression::Identifier(identifier) => {
            let name = ctx.intern(&identifier.name);
            let id = ctx.lookup_local(name).unwrap_or(RefId::Global(name));
            ctx.expr(Expression::Reference(id))
        }

        ast::Expression::StringLiteral(literal) => ctx.expr(Expression::Literal(
            LiteralExpression::string(literal.value.clone()),
        )),

        ast::Expression::NumericLiteral(literal) => ctx.expr(Expression::Literal(
            LiteralExpression::number(literal.value.clone()),
        )),

        ast::Expression::BooleanLiteral(literal) => ctx.expr(Expression::Literal(
            LiteralExpression::boolean(literal.value),
        )),

        ast::Expression::NilLiteral => ctx.expr(Expression::Literal(LiteralExpression::nil())),

        ast::Expression::VarargLiteral => {
            let name = ctx.intern("...");
            ctx.expr(Expression::Reference(RefId::Generated(name)))
        }

        ast::Expression::Member(member) => {
            let base = build_expression(ctx, config, &member.base);
            add_usage(ctx, &base, UsageKind::Indexed);

            let name = ctx.intern(&member.identifier.name);
            ctx.expr(Expression::Member {
                base: Box::new(base),
                member: name,
                indexer: member.indexer,
            })
        }

        ast::Expression::Index(index_expression) => {
            let base = build_expression(ctx, config, &index_expression.base);
            add_usage(ctx, &base, UsageKind::Indexed);

            let index = build_expression(ctx, config, &index_expression.index);
            ctx.expr(Expression::Index {
                base: Box::new(base),
                index: Box::new(index),
            })
        }

        ast::Expression::Call(call) => {
            if let Some(require) = build_require(ctx, &call.base, &call.arguments) {
                return require;
            }

            let callee = build_expression(ctx, config, &call.base);
            let arguments: Vec<ExpressionInfo> = call
                .arguments
                .iter()
                .map(|argument| build_expression(ctx, config, argument))
                .collect();
            finish_call(ctx, callee, arguments)
        }

        ast::Expression::StringCall(string_call) => {
            if let ast::Expression::Identifier(identifier) = &string_call.base {
                if identifier.name == "require" {
                    let module = ctx.intern(&string_call.argument.value);
                    return ctx.expr(Expression::Require { module });
                }
            }

            let callee = build_expression(ctx, config, &string_call.base);
            let argument = ctx.expr(Expression::Literal(LiteralExpression::string(
                string_call.argument.value.clone(),
            )));
            finish_call(ctx, callee, vec![argument])
        }

        ast::Expression::TableCall(table_call) => {
            let callee = build_expression(ctx, config, &table_call.base);
            let argument = build_table(ctx, config, &table_call.argument);
            finish_call(ctx, callee, vec![argument])
        }

        ast::Expression::TableConstructor(constructor) => build_table(ctx, config, constructor),

        ast::Expression::Function(declaration) => {
            let function_id = ctx.new_function();
            let setup = set_function_info(
                ctx,
                config,
                function_id,
                None,
                &declaration.parameters,
                &declaration.body,
            );

            enter_function_scope(ctx, function_id, &setup);
            walk_statements(ctx, config, &declaration.body, function_id);
            ctx.pop_scope();

            ctx.expr(Expression::Literal(LiteralExpression::function(function_id)))
        }

        ast::Expression::Unary(unary) => {
            let argument = build_expression(ctx, config, &unary.argument);
            match unary.operator {
                ast::UnaryOperator::Length => {
                    add_usage(ctx, &argument, UsageKind::LengthOperand);
                }
                ast::UnaryOperator::Minus | ast::UnaryOperator::BitNot => {
                    add_usage(ctx, &argument, UsageKind::Arithmetic);
                }
                ast::UnaryOperator::Not => {}
            }

            ctx.expr(Expression::Operation {
                operator: map_unary(unary.operator),
                arguments: vec![argument],
            })
        }

        ast::Expression::Binary(binary) => {
            let left = build_expression(ctx, config, &binary.left);
            let right = build_expression(ctx, config, &binary.right);

            let operator = map_binary(binary.operator);
            if operator.is_arithmetic() || operator.is_bitwise() {
                add_usage(ctx, &left, UsageKind::Arithmetic);
                add_usage(ctx, &right, UsageKind::Arithmetic);
            } else if operator == Operator::Concat {
                add_usage(ctx, &left, UsageKind::Concatenand);
                add_usage(ctx, &right, UsageKind::Concatenand);
            }

            ctx.expr(Expression::Operation {
                operator,
                arguments: vec![left, right],
            })
        }
    }
}

/// Left-hand sides read their base too, but the constraint is stronger: an
/// assigned-into base must be a table.
pub(crate) fn build_target(
    ctx: &mut AnalysisContext,
    config: &Config,
    target: &ast::Expression,
) -> ExpressionInfo {
    match target {
        ast::Expression::Identifier(identifier) => {
            let name = ctx.intern(&identifier.name);
            let id = ctx.lookup_local(name).unwrap_or(RefId::Global(name));
            ctx.expr(Expression::Reference(id))
        }

        ast::Expression::Member(member) => {
            let base = build_expression(ctx, config, &member.base);
            add_usage(ctx, &base, UsageKind::IndexAssigned);

            let name = ctx.intern(&member.identifier.name);
            ctx.expr(Expression::Member {
                base: Box::new(base),
                member: name,
                indexer: member.indexer,
            })
        }

        ast::Expression::Index(index_expression) => {
            let base = build_expression(ctx, config, &index_expression.base);
            add_usage(ctx, &base, UsageKind::IndexAssigned);

            let index = build_expression(ctx, config, &index_expression.index);
            ctx.expr(Expression::Index {
                base: Box::new(base),
                index: Box::new(index),
            })
        }

        other => build_expression(ctx, config, other),
    }
}

fn map_unary(operator: ast::UnaryOperator) -> Operator {
    match operator {
        ast::UnaryOperator::Not => Operator::Not,
        ast::UnaryOperator::Minus => Operator::Minus,
        ast::UnaryOperator::Length => Operator::Length,
        ast::UnaryOperator::BitNot => Operator::BitNot,
    }
}

fn map_binary(operator: ast::BinaryOperator) -> Operator {
    match operator {
        ast::BinaryOperator::Add => Operator::Add,
        ast::BinaryOperator::Sub => Operator::Sub,
        ast::BinaryOperator::Mul => Operator::Mul,
        ast::BinaryOperator::Div => Operator::Div,
        ast::BinaryOperator::FloorDiv => Operator::FloorDiv,
        ast::BinaryOperator::Mod => Operator::Mod,
        ast::BinaryOperator::Pow => Operator::Pow,
        ast::BinaryOperator::Concat => Operator::Concat,
        ast::BinaryOperator::Eq => Operator::Eq,
        ast::BinaryOperator::Ne => Operator::Ne,
        ast::BinaryOperator::Lt => Operator::Lt,
        ast::BinaryOperator::Le => Operator::Le,
        ast::BinaryOperator::Gt => Operator::Gt,
        ast::BinaryOperator::Ge => Operator::Ge,
        ast::BinaryOperator::And => Operator::And,
        ast::BinaryOperator::Or => Operator::Or,
        ast::BinaryOperator::BitAnd => Operator::BitAnd,
        ast::BinaryOperator::BitOr => Operator::BitOr,
        ast::BinaryOperator::BitXor => Operator::BitXor,
        ast::BinaryOperator::Shl => Operator::Shl,
        ast::BinaryOperator::Shr => Operator::Shr,
    }
}

fn build_require(
    ctx: &mut AnalysisContext,
    base: &ast::Expression,
    arguments: &[ast::Expression],
) -> Option<ExpressionInfo> {
    let ast::Expression::Identifier(identifier) = base else {
        return None;
    };
    if identifier.name != "require" {
        return None;
    }
    let [ast::Expression::StringLiteral(literal)] = arguments else {
        return None;
    };

    let module = ctx.intern(&literal.value);
    Some(ctx.expr(Expression::Require { module }))
}

fn finish_call(
    ctx: &mut AnalysisContext,
    callee: ExpressionInfo,
    argument_infos: Vec<ExpressionInfo>,
) -> ExpressionInfo {
    add_call_usage(ctx, &callee, &argument_infos);

    let mut arguments = Vec::with_capacity(argument_infos.len() + 1);
    arguments.push(callee);
    arguments.extend(argument_infos);

    ctx.expr(Expression::Operation {
        operator: Operator::Call,
        arguments,
    })
}

fn build_table(
    ctx: &mut AnalysisContext,
    config: &Config,
    constructor: &ast::TableConstructorExpression,
) -> ExpressionInfo {
    let table_id = ctx.new_table();
    let mut auto_index = 0usize;

    for field in &constructor.fields {
        let (key, key_string, value) = match field {
            ast::TableField::KeyString { key, value } => {
                let value_info = build_expression(ctx, config, value);
                let name = ctx.intern(&key.name);
                (
                    Some(TableKey::Name(name)),
                    Some(literal_key(&key.name, None)),
                    value_info,
                )
            }

            ast::TableField::Key { key, value } => {
                let value_info = build_expression(ctx, config, value);
                match key {
                    ast::Expression::StringLiteral(literal) => (
                        Some(TableKey::String(literal.value.clone())),
                        Some(literal_key(&literal.value, Some(LuaType::String))),
                        value_info,
                    ),
                    ast::Expression::NumericLiteral(literal) => (
                        Some(TableKey::Number(literal.value.clone())),
                        Some(literal_key(&literal.value, Some(LuaType::Number))),
                        value_info,
                    ),
                    other => {
                        // Computed keys contribute no definition.
                        build_expression(ctx, config, other);
                        (None, None, value_info)
                    }
                }
            }

            ast::TableField::Value { value } => {
                auto_index += 1;
                let value_info = build_expression(ctx, config, value);
                (None, Some(auto_index.to_string()), value_info)
            }
        };

        if let Some(child) = value.as_literal_table() {
            if ctx.table(child).container_id.is_none() && child != table_id {
                ctx.table_mut(child).container_id = Some(table_id);
            }
        }

        // Only constructor-seeded definitions carry the literal mark; it is
        // what separates literal fields from assigned statics downstream.
        let mut definition = value.clone();
        definition.from_literal = true;

        let table = ctx.table_mut(table_id);
        table.literal_fields.push(LiteralField {
            key,
            value,
            types: None,
        });
        if let Some(key_string) = key_string {
            table.add_definition(key_string, definition);
        }
    }

    ctx.expr(Expression::Literal(LiteralExpression::table(table_id)))
}
