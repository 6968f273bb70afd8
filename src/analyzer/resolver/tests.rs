use luana_ast::Indexer;
use luana_code_info::expression::{Expression, ExpressionInfo, LiteralExpression, Operator};
use luana_code_info::ids::RefId;
use luana_code_info::ttype::{
    get_boolean, get_nil, get_number, get_string, get_true, TypeSet, TypeToken,
};
use luana_str::StrId;

use crate::context::AnalysisContext;
use crate::resolver::resolve_expression;
use crate::usage::{add_usage, UsageKind};

fn literal(ctx: &mut AnalysisContext, literal: LiteralExpression) -> ExpressionInfo {
    ctx.expr(Expression::Literal(literal))
}

fn global(ctx: &mut AnalysisContext, name: &str) -> (RefId, ExpressionInfo) {
    let id = RefId::Global(ctx.intern(name));
    let info = ctx.expr(Expression::Reference(id));
    (id, info)
}

fn set_of(tokens: &[TypeToken]) -> TypeSet {
    tokens.iter().copied().collect()
}

#[test]
fn literals_resolve_to_their_primitive() {
    let mut ctx = AnalysisContext::new();

    let string = literal(&mut ctx, LiteralExpression::string("hi".to_string()));
    let number = literal(&mut ctx, LiteralExpression::number("3".to_string()));
    let truth = literal(&mut ctx, LiteralExpression::boolean(true));
    let nothing = literal(&mut ctx, LiteralExpression::nil());

    assert_eq!(resolve_expression(&ctx, &string), get_string());
    assert_eq!(resolve_expression(&ctx, &number), get_number());
    assert_eq!(resolve_expression(&ctx, &truth), get_true());
    assert_eq!(resolve_expression(&ctx, &nothing), get_nil());
}

#[test]
fn paired_boolean_definitions_collapse() {
    let mut ctx = AnalysisContext::new();
    let (flag, reference) = global(&mut ctx, "flag");

    let truth = literal(&mut ctx, LiteralExpression::boolean(true));
    let falsity = literal(&mut ctx, LiteralExpression::boolean(false));
    ctx.add_definition(flag, truth);
    ctx.add_definition(flag, falsity);

    assert_eq!(resolve_expression(&ctx, &reference), get_boolean());
}

#[test]
fn self_referential_definition_terminates_empty() {
    let mut ctx = AnalysisContext::new();
    let name = ctx.intern("x");
    let local = RefId::Local { name, serial: 0 };

    let reference = ctx.expr(Expression::Reference(local));
    ctx.add_definition(local, reference.clone());

    assert!(resolve_expression(&ctx, &reference).is_empty());
}

#[test]
fn mutually_referential_locals_terminate() {
    let mut ctx = AnalysisContext::new();
    let first = RefId::Local {
        name: ctx.intern("a"),
        serial: 0,
    };
    let second = RefId::Local {
        name: ctx.intern("b"),
        serial: 1,
    };

    let first_reference = ctx.expr(Expression::Reference(first));
    let second_reference = ctx.expr(Expression::Reference(second));
    ctx.add_definition(first, second_reference.clone());
    ctx.add_definition(second, first_reference.clone());

    let number = literal(&mut ctx, LiteralExpression::number("1".to_string()));
    ctx.add_definition(second, number);

    assert_eq!(resolve_expression(&ctx, &first_reference), get_number());
}

#[test]
fn or_with_falsy_lhs_takes_rhs() {
    let mut ctx = AnalysisContext::new();

    let lhs = literal(&mut ctx, LiteralExpression::nil());
    let rhs = literal(&mut ctx, LiteralExpression::string("fallback".to_string()));
    let operation = ctx.expr(Expression::Operation {
        operator: Operator::Or,
        arguments: vec![lhs, rhs],
    });

    assert_eq!(resolve_expression(&ctx, &operation), get_string());
}

#[test]
fn and_short_circuits_on_literal_operands() {
    let mut ctx = AnalysisContext::new();

    let truthy = literal(&mut ctx, LiteralExpression::number("1".to_string()));
    let rhs = literal(&mut ctx, LiteralExpression::string("s".to_string()));
    let taken = ctx.expr(Expression::Operation {
        operator: Operator::And,
        arguments: vec![truthy, rhs],
    });
    assert_eq!(resolve_expression(&ctx, &taken), get_string());

    let falsy = literal(&mut ctx, LiteralExpression::nil());
    let unreached = literal(&mut ctx, LiteralExpression::string("s".to_string()));
    let skipped = ctx.expr(Expression::Operation {
        operator: Operator::And,
        arguments: vec![falsy, unreached],
    });
    assert_eq!(resolve_expression(&ctx, &skipped), get_nil());
}

#[test]
fn undetermined_operands_union_both_branches() {
    let mut ctx = AnalysisContext::new();
    let (opaque, opaque_reference) = global(&mut ctx, "opaque");
    let string = literal(&mut ctx, LiteralExpression::string("s".to_string()));
    ctx.add_definition(opaque, string);

    let rhs = literal(&mut ctx, LiteralExpression::number("2".to_string()));
    let operation = ctx.expr(Expression::Operation {
        operator: Operator::Or,
        arguments: vec![opaque_reference, rhs],
    });

    assert_eq!(
        resolve_expression(&ctx, &operation),
        set_of(&[TypeToken::String, TypeToken::Number])
    );
}

#[test]
fn ternary_shape_substitutes_the_middle_operand() {
    let mut ctx = AnalysisContext::new();

    // cond and "yes" or 0 — the decision reads "yes", which is truthy, so
    // both branches stay.
    let (_, condition) = global(&mut ctx, "cond");
    let middle = literal(&mut ctx, LiteralExpression::string("yes".to_string()));
    let and_part = ctx.expr(Expression::Operation {
        operator: Operator::And,
        arguments: vec![condition, middle],
    });
    let fallback = literal(&mut ctx, LiteralExpression::number("0".to_string()));
    let ternary = ctx.expr(Expression::Operation {
        operator: Operator::Or,
        arguments: vec![and_part, fallback],
    });

    assert_eq!(
        resolve_expression(&ctx, &ternary),
        set_of(&[TypeToken::String, TypeToken::Number])
    );
}

#[test]
fn usage_narrows_ambiguous_references() {
    let mut ctx = AnalysisContext::new();
    let (value, reference) = global(&mut ctx, "value");

    let string = literal(&mut ctx, LiteralExpression::string("s".to_string()));
    let number = literal(&mut ctx, LiteralExpression::number("1".to_string()));
    ctx.add_definition(value, string);
    ctx.add_definition(value, number);

    let unnarrowed = resolve_expression(&ctx, &reference);
    assert_eq!(unnarrowed, set_of(&[TypeToken::String, TypeToken::Number]));

    add_usage(&mut ctx, &reference, UsageKind::Arithmetic);
    let narrowed = resolve_expression(&ctx, &reference);

    assert_eq!(narrowed, get_number());
    assert!(narrowed.iter().all(|token| unnarrowed.contains(token)));
}

#[test]
fn narrowing_that_would_empty_leaves_the_set() {
    let mut ctx = AnalysisContext::new();
    let (value, reference) = global(&mut ctx, "value");

    let nothing = literal(&mut ctx, LiteralExpression::nil());
    let truth = literal(&mut ctx, LiteralExpression::boolean(true));
    ctx.add_definition(value, nothing);
    ctx.add_definition(value, truth);

    add_usage(&mut ctx, &reference, UsageKind::Arithmetic);

    assert_eq!(
        resolve_expression(&ctx, &reference),
        set_of(&[TypeToken::Nil, TypeToken::True])
    );
}

#[test]
fn tonumber_returns_number_or_nil() {
    let mut ctx = AnalysisContext::new();

    let callee = ctx.expr(Expression::Reference(RefId::Global(StrId::TONUMBER)));
    let argument = literal(&mut ctx, LiteralExpression::string("1".to_string()));
    let call = ctx.expr(Expression::Operation {
        operator: Operator::Call,
        arguments: vec![callee, argument],
    });

    assert_eq!(
        resolve_expression(&ctx, &call),
        set_of(&[TypeToken::Number, TypeToken::Nil])
    );
}

#[test]
fn call_slots_follow_the_multi_return_index() {
    let mut ctx = AnalysisContext::new();

    let function_id = ctx.new_function();
    {
        let function = ctx.function_mut(function_id);
        function.ensure_return_slot(1);
        function.return_types[0] = get_string();
        function.return_types[1] = get_number();
    }

    let callee = literal(&mut ctx, LiteralExpression::function(function_id));
    let call = ctx.expr(Expression::Operation {
        operator: Operator::Call,
        arguments: vec![callee],
    });

    assert_eq!(resolve_expression(&ctx, &call), get_string());

    let mut second = call.clone();
    second.index = Some(2);
    assert_eq!(resolve_expression(&ctx, &second), get_number());

    let mut third = call.clone();
    third.index = Some(3);
    assert_eq!(resolve_expression(&ctx, &third), get_nil());
}

#[test]
fn members_resolve_through_table_definitions() {
    let mut ctx = AnalysisContext::new();

    let table_id = ctx.new_table();
    let number = literal(&mut ctx, LiteralExpression::number("5".to_string()));
    ctx.table_mut(table_id)
        .add_definition("x".to_string(), number);

    let base = literal(&mut ctx, LiteralExpression::table(table_id));
    let member = ctx.intern("x");
    let access = ctx.expr(Expression::Member {
        base: Box::new(base),
        member,
        indexer: Indexer::Dot,
    });

    assert_eq!(resolve_expression(&ctx, &access), get_number());
}

#[test]
fn requires_read_the_module_return_slot() {
    let mut ctx = AnalysisContext::new();

    let module_function = ctx.new_function();
    {
        let function = ctx.function_mut(module_function);
        function.ensure_return_slot(0);
        function.return_types[0] = get_string();
    }

    let full_id = ctx.intern("lib/text");
    ctx.module_functions.insert(full_id, module_function);

    let require = ctx.expr(Expression::Require { module: full_id });
    assert_eq!(resolve_expression(&ctx, &require), get_string());

    // Unique alias resolves; an ambiguous one stays empty.
    let alias = ctx.intern("text");
    ctx.module_aliases.insert(alias, vec![full_id]);
    let aliased = ctx.expr(Expression::Require { module: alias });
    assert_eq!(resolve_expression(&ctx, &aliased), get_string());

    let other_id = ctx.intern("other/text");
    ctx.module_aliases.get_mut(&alias).unwrap().push(other_id);
    let ambiguous = ctx.expr(Expression::Require { module: alias });
    assert!(resolve_expression(&ctx, &ambiguous).is_empty());
}
