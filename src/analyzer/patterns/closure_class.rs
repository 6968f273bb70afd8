use luana_ast as ast;

#[derive(Debug, Clone)]
pub struct ClosureClassShape {
    /// `self` or `publ` — the captured binding members are declared on.
    pub binding: String,
}

/// A constructor function whose body binds `self = {}` (or
/// `self = Base.new(...)`, or `publ = {}`) and later declares at least one
/// function on that binding. A `setmetatable` call on the binding suppresses
/// the detection; that shape belongs to the metatable idiom.
pub fn detect_closure_class(body: &[ast::Statement]) -> Option<ClosureClassShape> {
    let mut binding: Option<(usize, String)> = None;

    for (position, statement) in body.iter().enumerate() {
        let ast::Statement::Local(local) = statement else {
            continue;
        };
        let [variable] = local.variables.as_slice() else {
            continue;
        };
        if variable.name != "self" && variable.name != "publ" {
            continue;
        }
        let [init] = local.init.as_slice() else {
            continue;
        };
        if is_constructing_init(init) {
            binding = Some((position, variable.name.clone()));
            break;
        }
    }

    let (position, name) = binding?;

    let mut has_member_function = false;
    for statement in &body[position + 1..] {
        if let ast::Statement::FunctionDeclaration(declaration) = statement {
            if let Some(ast::Expression::Member(member)) = &declaration.identifier {
                if let ast::Expression::Identifier(base) = &member.base {
                    if base.name == name {
                        has_member_function = true;
                    }
                }
            }
        }
    }

    if !has_member_function {
        return None;
    }

    if has_set_metatable_on(body, &name) {
        return None;
    }

    Some(ClosureClassShape { binding: name })
}

/// `{}` or `Base.new(...)`.
fn is_constructing_init(init: &ast::Expression) -> bool {
    match init {
        ast::Expression::TableConstructor(constructor) => constructor.fields.is_empty(),
        ast::Expression::Call(call) => matches!(
            &call.base,
            ast::Expression::Member(member)
                if member.identifier.name == "new" && member.indexer == ast::Indexer::Dot
        ),
        _ => false,
    }
}

fn has_set_metatable_on(body: &[ast::Statement], binding: &str) -> bool {
    for statement in body {
        let ast::Statement::Call(call_statement) = statement else {
            continue;
        };
        let ast::Expression::Call(call) = &call_statement.expression else {
            continue;
        };
        let ast::Expression::Identifier(callee) = &call.base else {
            continue;
        };
        if callee.name != "setmetatable" {
            continue;
        }
        if let Some(ast::Expression::Identifier(target)) = call.arguments.first() {
            if target.name == binding {
                return true;
            }
        }
    }

    false
}
