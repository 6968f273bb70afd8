use luana_analyzer::config::Config;
use luana_analyzer::finalizer::finalize_class_fields;
use luana_ast as ast;
use luana_code_info::analysis_result::AnalysisResult;
use luana_code_info::analyzed_module::{AnalyzedExpression, AnalyzedModule};
use luana_code_info::diagnostic::{DiagnosticKind, ParserError};
use luana_logger::Logger;

use crate::{analyze_modules, ModuleSource};

// -- AST construction helpers, standing in for the external parser --------

fn name(text: &str) -> ast::Expression {
    ast::Expression::Identifier(ast::Identifier::new(text))
}

fn string(text: &str) -> ast::Expression {
    ast::Expression::StringLiteral(ast::StringLiteral {
        value: text.to_string(),
    })
}

fn number(text: &str) -> ast::Expression {
    ast::Expression::NumericLiteral(ast::NumericLiteral {
        value: text.to_string(),
    })
}

fn member(base: ast::Expression, indexer: ast::Indexer, field: &str) -> ast::Expression {
    ast::Expression::Member(Box::new(ast::MemberExpression {
        base,
        indexer,
        identifier: ast::Identifier::new(field),
    }))
}

fn call(base: ast::Expression, arguments: Vec<ast::Expression>) -> ast::Expression {
    ast::Expression::Call(Box::new(ast::CallExpression { base, arguments }))
}

fn empty_table() -> ast::Expression {
    ast::Expression::TableConstructor(ast::TableConstructorExpression { fields: Vec::new() })
}

fn array_table(values: Vec<ast::Expression>) -> ast::Expression {
    ast::Expression::TableConstructor(ast::TableConstructorExpression {
        fields: values
            .into_iter()
            .map(|value| ast::TableField::Value { value })
            .collect(),
    })
}

fn keyed_table(entries: Vec<(&str, ast::Expression)>) -> ast::Expression {
    ast::Expression::TableConstructor(ast::TableConstructorExpression {
        fields: entries
            .into_iter()
            .map(|(key, value)| ast::TableField::KeyString {
                key: ast::Identifier::new(key),
                value,
            })
            .collect(),
    })
}

fn assign(target: ast::Expression, value: ast::Expression) -> ast::Statement {
    ast::Statement::Assignment(ast::AssignmentStatement {
        variables: vec![target],
        init: vec![value],
    })
}

fn local(names: &[&str], init: Vec<ast::Expression>) -> ast::Statement {
    ast::Statement::Local(ast::LocalStatement {
        variables: names.iter().map(|n| ast::Identifier::new(*n)).collect(),
        init,
    })
}

fn declare_function(
    identifier: Option<ast::Expression>,
    parameters: &[&str],
    body: Vec<ast::Statement>,
) -> ast::Statement {
    ast::Statement::FunctionDeclaration(Box::new(ast::FunctionDeclaration {
        identifier,
        is_local: false,
        parameters: parameters
            .iter()
            .map(|p| ast::Parameter::Name(ast::Identifier::new(*p)))
            .collect(),
        body,
    }))
}

fn call_statement(expression: ast::Expression) -> ast::Statement {
    ast::Statement::Call(ast::CallStatement { expression })
}

fn return_statement(arguments: Vec<ast::Expression>) -> ast::Statement {
    ast::Statement::Return(ast::ReturnStatement { arguments })
}

fn module(id: &str, body: Vec<ast::Statement>) -> ModuleSource {
    ModuleSource {
        id: id.to_string(),
        chunk: Ok(ast::Chunk { body }),
    }
}

fn analyze(sources: Vec<ModuleSource>) -> AnalysisResult {
    analyze_modules(sources, &Config::new(".".to_string()), &Logger::DevNull)
}

fn only_module(result: &AnalysisResult) -> &AnalyzedModule {
    assert_eq!(result.analyzed_modules.len(), 1);
    result.analyzed_modules.values().next().unwrap()
}

// -- end-to-end scenarios -------------------------------------------------

#[test]
fn class_with_one_method() {
    // A = {}; function A:foo(x) return x end
    let result = analyze(vec![module(
        "a",
        vec![
            assign(name("A"), empty_table()),
            declare_function(
                Some(member(name("A"), ast::Indexer::Colon, "foo")),
                &["x"],
                vec![return_statement(vec![name("x")])],
            ),
        ],
    )]);

    let analyzed = only_module(&result);
    assert_eq!(analyzed.classes.len(), 1);

    let class = &analyzed.classes[0];
    assert_eq!(class.name, "A");
    assert!(class.fields.is_empty());
    assert!(class.constructors.is_empty());
    assert!(class.function_constructors.is_empty());

    assert_eq!(class.methods.len(), 1);
    let method = &class.methods[0];
    assert_eq!(method.name, "foo");
    assert!(method.is_method);
    assert_eq!(method.parameters.len(), 1);
    assert_eq!(method.parameters[0].name, "x");
    assert_eq!(method.parameters[0].types, vec!["unknown"]);
    assert_eq!(method.return_types, vec![vec!["unknown".to_string()]]);
}

#[test]
fn derive_call_declares_a_subclass() {
    // A = Base:derive("T")
    let result = analyze(vec![module(
        "a",
        vec![assign(
            name("A"),
            call(
                member(name("Base"), ast::Indexer::Colon, "derive"),
                vec![string("T")],
            ),
        )],
    )]);

    let analyzed = only_module(&result);
    assert_eq!(analyzed.classes.len(), 1);

    let class = &analyzed.classes[0];
    assert_eq!(class.name, "A");
    assert_eq!(class.base.as_deref(), Some("Base"));
    assert_eq!(class.derive_name.as_deref(), Some("T"));

    let type_field = class
        .static_fields
        .iter()
        .find(|field| field.name == "Type")
        .expect("derived classes carry a Type static");
    assert_eq!(type_field.types, vec!["string"]);
    assert_eq!(
        type_field.value,
        Some(AnalyzedExpression::Literal {
            lua_type: "string".to_string(),
            value: Some("T".to_string()),
        })
    );
}

#[test]
fn closure_class_with_constructor() {
    // function Make() local self = {}; function self:go() end; return self end
    let result = analyze(vec![module(
        "a",
        vec![declare_function(
            Some(name("Make")),
            &[],
            vec![
                local(&["self"], vec![empty_table()]),
                declare_function(
                    Some(member(name("self"), ast::Indexer::Colon, "go")),
                    &[],
                    vec![],
                ),
                return_statement(vec![name("self")]),
            ],
        )],
    )]);

    let analyzed = only_module(&result);
    assert_eq!(analyzed.classes.len(), 1);

    let class = &analyzed.classes[0];
    assert_eq!(class.name, "Make");
    assert!(class.is_local);
    assert_eq!(class.methods.len(), 1);
    assert_eq!(class.methods[0].name, "go");

    assert_eq!(class.function_constructors.len(), 1);
    let constructor = &class.function_constructors[0];
    assert_eq!(constructor.name, "Make");
    assert_eq!(constructor.return_types, vec![vec!["Make".to_string()]]);

    // The constructor moved onto the class rather than staying a free
    // function.
    assert!(analyzed.functions.is_empty());
}

#[test]
fn setmetatable_promotes_instance_fields() {
    // X = {}
    // function setup()
    //   local inst = {}
    //   inst.a = 1
    //   setmetatable(inst, {__index = X})
    // end
    let result = analyze(vec![module(
        "a",
        vec![
            assign(name("X"), empty_table()),
            declare_function(
                Some(name("setup")),
                &[],
                vec![
                    local(&["inst"], vec![empty_table()]),
                    assign(member(name("inst"), ast::Indexer::Dot, "a"), number("1")),
                    call_statement(call(
                        name("setmetatable"),
                        vec![name("inst"), keyed_table(vec![("__index", name("X"))])],
                    )),
                ],
            ),
        ],
    )]);

    let analyzed = only_module(&result);
    let class = analyzed
        .classes
        .iter()
        .find(|class| class.name == "X")
        .expect("X becomes a class");

    assert_eq!(class.fields.len(), 1);
    assert_eq!(class.fields[0].name, "a");
    assert_eq!(class.fields[0].types, vec!["number"]);
}

#[test]
fn module_returns_a_literal_table() {
    // local t = {1,2,3}; return t
    let result = analyze(vec![module(
        "a",
        vec![
            local(
                &["t"],
                vec![array_table(vec![number("1"), number("2"), number("3")])],
            ),
            return_statement(vec![name("t")]),
        ],
    )]);

    let analyzed = only_module(&result);
    assert_eq!(analyzed.returns.len(), 1);

    let returned = &analyzed.returns[0];
    assert_eq!(returned.types, vec!["table"]);

    let Some(AnalyzedExpression::Table(table)) = &returned.expression else {
        panic!("the single-definition local inlines into the return");
    };
    assert_eq!(table.fields.len(), 3);
    for (position, field) in table.fields.iter().enumerate() {
        assert_eq!(field.key, None);
        assert_eq!(
            field.value,
            AnalyzedExpression::Literal {
                lua_type: "number".to_string(),
                value: Some((position + 1).to_string()),
            }
        );
    }
}

#[test]
fn builtin_returns_flow_into_function_types() {
    // function foo() return tonumber("1") end
    let result = analyze(vec![module(
        "a",
        vec![declare_function(
            Some(name("foo")),
            &[],
            vec![return_statement(vec![call(
                name("tonumber"),
                vec![string("1")],
            )])],
        )],
    )]);

    let analyzed = only_module(&result);
    assert_eq!(analyzed.functions.len(), 1);
    assert_eq!(analyzed.functions[0].name, "foo");
    assert_eq!(
        analyzed.functions[0].return_types,
        vec![vec!["number".to_string(), "nil".to_string()]]
    );
}

// -- cross-module behavior ------------------------------------------------

#[test]
fn requires_resolve_through_module_returns() {
    // lib/text: local t = {}; t.greeting = "hi"; return t
    // main: local text = require("lib/text"); GREETING = text.greeting
    let result = analyze(vec![
        module(
            "lib/text",
            vec![
                local(&["t"], vec![empty_table()]),
                assign(
                    member(name("t"), ast::Indexer::Dot, "greeting"),
                    string("hi"),
                ),
                return_statement(vec![name("t")]),
            ],
        ),
        module(
            "main",
            vec![
                local(&["text"], vec![call(name("require"), vec![string("lib/text")])]),
                assign(
                    name("GREETING"),
                    member(name("text"), ast::Indexer::Dot, "greeting"),
                ),
            ],
        ),
    ]);

    let main = result.analyzed_modules.get("main").unwrap();
    let field = main
        .fields
        .iter()
        .find(|field| field.name == "GREETING")
        .expect("GREETING is a module field");
    assert_eq!(field.types, vec!["string"]);
}

#[test]
fn foreign_method_definitions_stay_with_their_module() {
    // a: A = {}
    // b: function A:helper() end
    let result = analyze(vec![
        module("a", vec![assign(name("A"), empty_table())]),
        module(
            "b",
            vec![declare_function(
                Some(member(name("A"), ast::Indexer::Colon, "helper")),
                &[],
                vec![],
            )],
        ),
    ]);

    let first = result.analyzed_modules.get("a").unwrap();
    let declared = first.classes.iter().find(|class| class.name == "A").unwrap();
    assert!(declared.methods.is_empty());

    let second = result.analyzed_modules.get("b").unwrap();
    let touched = second.classes.iter().find(|class| class.name == "A").unwrap();
    assert_eq!(touched.methods.len(), 1);
    assert_eq!(touched.methods[0].name, "helper");
}

// -- error handling -------------------------------------------------------

#[test]
fn duplicate_module_ids_are_fatal_for_the_duplicate_only() {
    let result = analyze(vec![
        module("a", vec![assign(name("A"), empty_table())]),
        module("a", vec![assign(name("B"), empty_table())]),
        module("b", vec![assign(name("C"), empty_table())]),
    ]);

    assert_eq!(result.analyzed_modules.len(), 2);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, DiagnosticKind::DuplicateModuleId);
    assert_eq!(result.diagnostics[0].module, "a");

    // The first writer won.
    let first = result.analyzed_modules.get("a").unwrap();
    assert_eq!(first.classes[0].name, "A");
}

#[test]
fn parse_failures_skip_the_module_and_continue() {
    let result = analyze(vec![
        ModuleSource {
            id: "broken".to_string(),
            chunk: Err(ParserError::SyntaxError {
                message: "unexpected symbol near ')'".to_string(),
            }),
        },
        module("ok", vec![assign(name("A"), empty_table())]),
    ]);

    assert_eq!(result.analyzed_modules.len(), 1);
    assert!(result.analyzed_modules.contains_key("ok"));
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].kind, DiagnosticKind::ParserError);
}

// -- output guarantees ----------------------------------------------------

fn class_module_sources() -> Vec<ModuleSource> {
    vec![
        module(
            "base",
            vec![
                assign(name("Base"), empty_table()),
                assign(member(name("Base"), ast::Indexer::Dot, "kind"), string("b")),
                declare_function(
                    Some(member(name("Base"), ast::Indexer::Colon, "new")),
                    &[],
                    vec![],
                ),
            ],
        ),
        module(
            "child",
            vec![assign(
                name("Child"),
                call(
                    member(name("Base"), ast::Indexer::Colon, "derive"),
                    vec![string("Child")],
                ),
            )],
        ),
    ]
}

#[test]
fn no_internal_ids_leak_into_the_output() {
    let result = analyze(class_module_sources());

    let rendered = serde_json::to_string(&result).unwrap();
    assert!(
        !rendered.contains("\"@"),
        "internal @-ids leaked: {}",
        rendered
    );
}

#[test]
fn output_is_deterministic_across_runs() {
    let first = serde_json::to_string(&analyze(class_module_sources())).unwrap();
    let second = serde_json::to_string(&analyze(class_module_sources())).unwrap();

    assert_eq!(first, second);
}

#[test]
fn ancestor_field_pruning_is_idempotent() {
    // Base and Derived both end up with the same instance field; Derived's
    // copy is pruned, and pruning again changes nothing.
    let base_setup = vec![
        assign(name("Base"), empty_table()),
        declare_function(
            Some(member(name("Base"), ast::Indexer::Colon, "init")),
            &[],
            vec![assign(
                member(name("self"), ast::Indexer::Dot, "count"),
                number("0"),
            )],
        ),
    ];
    let derived_setup = vec![
        assign(
            name("Derived"),
            call(
                member(name("Base"), ast::Indexer::Colon, "derive"),
                vec![string("Derived")],
            ),
        ),
        declare_function(
            Some(member(name("Derived"), ast::Indexer::Colon, "init")),
            &[],
            vec![assign(
                member(name("self"), ast::Indexer::Dot, "count"),
                number("0"),
            )],
        ),
    ];

    let mut result = analyze(vec![
        module("base", base_setup),
        module("derived", derived_setup),
    ]);

    let derived = result.analyzed_modules.get("derived").unwrap();
    let class = derived
        .classes
        .iter()
        .find(|class| class.name == "Derived")
        .unwrap();
    assert!(
        class.fields.iter().all(|field| field.name != "count"),
        "the ancestor's identical field is pruned"
    );

    let before = serde_json::to_string(&result).unwrap();
    finalize_class_fields(&mut result);
    let after = serde_json::to_string(&result).unwrap();
    assert_eq!(before, after);
}
