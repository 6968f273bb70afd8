use luana_ast::Indexer;
use luana_code_info::expression::{Expression, ExpressionInfo, LiteralExpression, Operator};
use luana_code_info::ids::{RefId, TableId};
use luana_code_info::ttype::table_refs;
use luana_str::StrId;

use crate::context::AnalysisContext;
use crate::resolver::resolve_expression;

/// The two atom-UI construction shapes.
#[derive(Debug, Clone)]
pub enum AtomUiShape {
    /// `A.__call({ _ATOM_UI_CLASS = X, … })`
    Base { payload: TableId },
    /// `Parent({…})` where `Parent` is a UI-tagged table.
    Child { parent: TableId, payload: TableId },
}

pub fn detect_atom_ui(ctx: &AnalysisContext, info: &ExpressionInfo) -> Option<AtomUiShape> {
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

    let payload = argument.as_literal_table()?;

    if let Expression::Member {
        member,
        indexer: Indexer::Dot,
        ..
    } = &callee.expression
    {
        if *member == StrId::CALL_METAMETHOD && has_atom_ui_tag(ctx, payload) {
            return Some(AtomUiShape::Base { payload });
        }
        return None;
    }

    let callee_types = resolve_expression(ctx, callee);
    for table_id in table_refs(&callee_types) {
        let table = ctx.table(table_id);
        if table.is_atom_ui || table.is_atom_ui_base {
            return Some(AtomUiShape::Child {
                parent: table_id,
                payload,
            });
        }
    }

    None
}

fn has_atom_ui_tag(ctx: &AnalysisContext, payload: TableId) -> bool {
    ctx.table(payload).definitions.contains_key("_ATOM_UI_CLASS")
}

/// Build the class table for a detected UI node: the payload's fields carry
/// over, and the framework members `javaObj`, `children` and `super` are
/// injected. The `overload(args: table)` entry is synthesized at emission
/// from the `is_atom_ui` flags.
pub fn make_atom_ui_class(
    ctx: &mut AnalysisContext,
    name: StrId,
    shape: &AtomUiShape,
) -> TableId {
    let class_id = ctx.new_table();

    let (payload, parent) = match shape {
        AtomUiShape::Base { payload } => (*payload, None),
        AtomUiShape::Child { parent, payload } => (*payload, Some(*parent)),
    };

    let payload_definitions = ctx.table(payload).definitions.clone();
    let parent_class = parent.and_then(|parent_id| ctx.table(parent_id).class_name);

    // Framework members first, then the payload's own fields.
    let java_obj = ctx.expr(Expression::Reference(RefId::Generated(StrId::JAVA_OBJ)));
    let children_table = ctx.new_table();
    ctx.table_mut(children_table).emit_as_table = true;
    let children = ctx.expr(Expression::Literal(LiteralExpression::table(children_table)));
    let super_value = match parent {
        Some(parent_id) => ctx.expr(Expression::Reference(RefId::Table(parent_id))),
        None => ctx.expr(Expression::Reference(RefId::Generated(StrId::SUPER))),
    };

    {
        let class = ctx.table_mut(class_id);
        class.class_name = Some(name);
        class.is_atom_ui = true;
        class.is_atom_ui_base = parent.is_none();
        class.base_class = parent_class;

        class.add_definition("javaObj".to_string(), java_obj);
        class.add_definition("children".to_string(), children);
        class.add_definition("super".to_string(), super_value);

        for (key, definitions) in payload_definitions {
            if key == "_ATOM_UI_CLASS" {
                continue;
            }
            for definition in definitions {
                class.add_definition(key.clone(), definition);
            }
        }
    }

    class_id
}
