use luana_code_info::expression::{Expression, ExpressionInfo, LiteralExpression, Operator};
use luana_code_info::ids::{RefId, TableId};
use luana_code_info::scope::{ClassItem, FieldItem, ScopeItem};
use luana_code_info::table_info::{display_key, literal_key};
use luana_code_info::ttype::{single_function_ref, single_table_ref, TypeToken};
use luana_str::StrId;

use crate::config::Config;
use crate::context::AnalysisContext;
use crate::patterns::atom_ui::{detect_atom_ui, make_atom_ui_class, AtomUiShape};
use crate::patterns::derive::detect_derive_call;
use crate::resolver::{resolve_expression, resolve_to_literal, ResolutionCache};

/// Register one assignment. The left-hand side decides the route: plain
/// references may declare classes, functions, requires or fields; index and
/// member targets add fields to the table their base resolves to.
pub fn add_assignment(
    ctx: &mut AnalysisContext,
    config: &Config,
    target: &ExpressionInfo,
    value: ExpressionInfo,
) {
    match &target.expression {
        Expression::Reference(id) => add_reference_assignment(ctx, config, *id, value),
        Expression::Index { .. } => add_index_assignment(ctx, config, target, value),
        Expression::Member { .. } => add_member_assignment(ctx, config, target, value),
        _ => {}
    }
}

fn add_reference_assignment(
    ctx: &mut AnalysisContext,
    config: &Config,
    id: RefId,
    value: ExpressionInfo,
) {
    // Inside a function body only the closure-class binding produces
    // module-visible structure; other assignments just feed resolution.
    if ctx.enclosing_function().is_some() {
        if let Some(name) = id.name() {
            if let Some(class_table) = ctx.closure_self_binding(name) {
                let rewritten = ctx.expr(Expression::Reference(RefId::Table(class_table)));
                ctx.add_definition(id, rewritten);
                return;
            }
        }
        ctx.add_definition(id, value);
        return;
    }

    if let Expression::Require { module } = &value.expression {
        if let Some(name) = id.name() {
            let module = *module;
            ctx.module_scope_mut()
                .items
                .push(ScopeItem::Require { name, module });
        }
        ctx.add_definition(id, value);
        return;
    }

    if let Some(derive) = detect_derive_call(ctx, &value) {
        let table_id = ctx.new_table();
        {
            let table = ctx.table_mut(table_id);
            table.original_base = Some(derive.base);
            table.original_derive_name = Some(derive.derive_name.clone());
        }

        match id {
            RefId::Global(name) => {
                promote_table_to_class(ctx, table_id, name, false);
            }
            _ => {
                // Internal left-hand side: the class stays hidden until a
                // later assignment names it.
                let original_name = id.name().map(|n| ctx.interner.lookup(&n).to_string());
                let table = ctx.table_mut(table_id);
                table.from_hidden_class = true;
                table.original_name = original_name;
            }
        }

        let definition = ctx.expr(Expression::Literal(LiteralExpression::table(table_id)));
        ctx.add_definition(id, definition);
        return;
    }

    if config.atom_ui_support {
        if let Some(shape) = detect_atom_ui(ctx, &value) {
            if let Some(name) = id.name() {
                let class_id = make_atom_ui_class(ctx, name, &shape);
                let base = match &shape {
                    AtomUiShape::Child { parent, .. } => ctx.table(*parent).class_name,
                    AtomUiShape::Base { .. } => None,
                };
                let defining_module = ctx.current_module.unwrap_or(StrId::EMPTY);
                ctx.module_scope_mut().items.push(ScopeItem::Class(ClassItem {
                    name,
                    table_id: class_id,
                    base,
                    derive_name: None,
                    generated: true,
                    defining_module,
                }));

                let definition =
                    ctx.expr(Expression::Literal(LiteralExpression::table(class_id)));
                ctx.add_definition(id, definition);
                return;
            }
        }
    }

    if let RefId::Global(name) = id {
        // `function Foo()` and `Foo = function()` both land here.
        if let Some(function_id) = value.as_literal_function() {
            let function = ctx.function_mut(function_id);
            if function.name.is_none() {
                function.name = Some(name);
            }
            ctx.module_scope_mut()
                .items
                .push(ScopeItem::Function { name, function_id });
            ctx.add_definition(id, value);
            return;
        }

        let effective = unwrap_default_init(&value, name);
        let types = resolve_expression(ctx, effective);

        if let Some(table_id) = single_table_ref(&types) {
            let not_reassignable = !matches!(
                value.expression,
                Expression::Literal(_) | Expression::Operation { .. }
            );
            handle_global_table_assignment(ctx, config, name, table_id, &value, not_reassignable);
            ctx.add_definition(id, value);
            return;
        }

        if let Some(function_id) = single_function_ref(&types) {
            let function = ctx.function_mut(function_id);
            if function.name.is_none() {
                function.name = Some(name);
            }
            ctx.module_scope_mut()
                .items
                .push(ScopeItem::Function { name, function_id });
            ctx.add_definition(id, value);
            return;
        }

        ctx.module_scope_mut().items.push(ScopeItem::Field(FieldItem {
            name,
            expression: value.clone(),
        }));
        ctx.add_definition(id, value);
        return;
    }

    ctx.add_definition(id, value);
}

/// `X = X or {}` initializes-if-missing; class detection looks through the
/// `or` at the fresh table.
fn unwrap_default_init<'a>(value: &'a ExpressionInfo, target: StrId) -> &'a ExpressionInfo {
    if let Expression::Operation {
        operator: Operator::Or,
        arguments,
    } = &value.expression
    {
        if let [lhs, rhs] = arguments.as_slice() {
            if lhs.as_reference().and_then(|id| id.name()) == Some(target) {
                return rhs;
            }
        }
    }
    value
}

fn handle_global_table_assignment(
    ctx: &mut AnalysisContext,
    config: &Config,
    name: StrId,
    table_id: TableId,
    value: &ExpressionInfo,
    not_reassignable: bool,
) {
    let existing = ctx.table(table_id).class_name;

    if let Some(existing) = existing {
        if existing == name {
            ctx.module_scope_mut()
                .items
                .push(ScopeItem::SeenClass(table_id));
            return;
        }

        if not_reassignable {
            // An alias of an already-named class degrades to a field on it.
            let key = literal_key(ctx.interner.lookup(&name), None);
            add_field(ctx, config, table_id, key, value.clone(), false);
            return;
        }

        // Renaming: the declaring module gets the last word, other modules
        // only touch the class.
        if ctx.table(table_id).defining_module == ctx.current_module {
            promote_table_to_class(ctx, table_id, name, false);
        } else {
            ctx.module_scope_mut()
                .items
                .push(ScopeItem::SeenClass(table_id));
        }
        return;
    }

    promote_table_to_class(ctx, table_id, name, false);
}

/// Turn a plain table into a class named `name` and emit the class item.
/// Derive metadata recorded while the table was hidden surfaces here, along
/// with the conventional `Type` static for derived classes.
pub(crate) fn promote_table_to_class(
    ctx: &mut AnalysisContext,
    table_id: TableId,
    name: StrId,
    generated: bool,
) {
    let name_string = ctx.interner.lookup(&name).to_string();
    let defining_module = ctx.current_module.unwrap_or(StrId::EMPTY);

    let (base, derive_name) = {
        let table = ctx.table_mut(table_id);
        table.class_name = Some(name);
        table.is_empty_class = table.definitions.is_empty() && table.literal_fields.is_empty();
        if table.original_name.is_none() {
            table.original_name = Some(name_string);
        }
        if table.base_class.is_none() {
            table.base_class = table.original_base;
        }
        if table.derive_name.is_none() {
            table.derive_name = table.original_derive_name.clone();
        }
        (table.base_class, table.derive_name.clone())
    };

    if let Some(derive_name) = &derive_name {
        if !ctx.table(table_id).definitions.contains_key("Type") {
            let type_value =
                ctx.expr(Expression::Literal(LiteralExpression::string(derive_name.clone())));
            ctx.table_mut(table_id)
                .add_definition("Type".to_string(), type_value);
        }
    }

    ctx.module_scope_mut().items.push(ScopeItem::Class(ClassItem {
        name,
        table_id,
        base,
        derive_name,
        generated,
        defining_module,
    }));
}

fn add_index_assignment(
    ctx: &mut AnalysisContext,
    config: &Config,
    target: &ExpressionInfo,
    value: ExpressionInfo,
) {
    let Expression::Index { base, index } = &target.expression else {
        return;
    };

    let base_types = resolve_expression(ctx, base);
    let Some(table_id) = single_table_ref(&base_types) else {
        return;
    };

    let mut seen = ResolutionCache::default();
    let Some(folded) = resolve_to_literal(ctx, index, &mut seen) else {
        return;
    };
    let Some(name) = folded.literal else {
        return;
    };

    let key = literal_key(&name, Some(folded.lua_type));
    add_field(ctx, config, table_id, key, value, false);
}

fn add_member_assignment(
    ctx: &mut AnalysisContext,
    config: &Config,
    target: &ExpressionInfo,
    value: ExpressionInfo,
) {
    let Expression::Member { base, member, .. } = &target.expression else {
        return;
    };
    let member = *member;

    let base_types = resolve_expression(ctx, base);
    let instance = base_types.contains(&TypeToken::Instance)
        || matches!(base.as_reference(), Some(id) if id.is_self_or_instance());

    let mut filtered = base_types;
    filtered.shift_remove(&TypeToken::Instance);
    if filtered.len() != 1 {
        return;
    }
    let Some(TypeToken::TableRef(table_id)) = filtered.first().copied() else {
        return;
    };

    // `inst.__index = …` belongs to the setmetatable idiom.
    if member == StrId::INDEX_METAMETHOD && instance {
        return;
    }

    if let Some(child) = value.as_literal_table() {
        if let Some(path) = dotted_path(ctx, target) {
            ctx.table_mut(child).original_name = Some(path);
        }
    }

    let key = literal_key(ctx.interner.lookup(&member), None);
    add_field(ctx, config, table_id, key, value, instance);
}

/// The dotted identifier path of a member chain, for `originalName`
/// attribution. Anything other than names and dot-members breaks the chain.
fn dotted_path(ctx: &AnalysisContext, info: &ExpressionInfo) -> Option<String> {
    match &info.expression {
        Expression::Reference(id) => id.name().map(|n| ctx.interner.lookup(&n).to_string()),
        Expression::Member { base, member, .. } => {
            let mut path = dotted_path(ctx, base)?;
            path.push('.');
            path.push_str(ctx.interner.lookup(member));
            Some(path)
        }
        _ => None,
    }
}

/// Add one field definition to a table, running the field-level detectors
/// and bubbling implied-class structure through the container chain.
pub(crate) fn add_field(
    ctx: &mut AnalysisContext,
    config: &Config,
    table_id: TableId,
    key: String,
    mut value: ExpressionInfo,
    instance: bool,
) {
    if let Some(derive) = detect_derive_call(ctx, &value) {
        let class_id = ctx.new_table();
        let class_name = ctx.intern(&display_key(&key));
        {
            let table = ctx.table_mut(class_id);
            table.original_base = Some(derive.base);
            table.original_derive_name = Some(derive.derive_name.clone());
        }
        promote_table_to_class(ctx, class_id, class_name, false);
        value = ctx.expr(Expression::Literal(LiteralExpression::table(class_id)));
    } else if config.atom_ui_support {
        if let Some(shape) = detect_atom_ui(ctx, &value) {
            let class_name = ctx.intern(&display_key(&key));
            let class_id = make_atom_ui_class(ctx, class_name, &shape);
            let base = match &shape {
                AtomUiShape::Child { parent, .. } => ctx.table(*parent).class_name,
                AtomUiShape::Base { .. } => None,
            };
            let defining_module = ctx.current_module.unwrap_or(StrId::EMPTY);
            ctx.module_scope_mut().items.push(ScopeItem::Class(ClassItem {
                name: class_name,
                table_id: class_id,
                base,
                derive_name: None,
                generated: true,
                defining_module,
            }));
            value = ctx.expr(Expression::Literal(LiteralExpression::table(class_id)));
        }
    }

    value.instance = instance;

    if let Some(child) = value.as_literal_table() {
        if ctx.table(child).container_id.is_none() && child != table_id {
            ctx.table_mut(child).container_id = Some(table_id);
        }
    }

    // A function landing in a plain table that lives inside a class implies
    // a nested class.
    if value.as_literal_function().is_some()
        && !ctx.table(table_id).is_class()
        && has_classed_container(ctx, table_id)
    {
        if let Some(original_name) = ctx.table(table_id).original_name.clone() {
            let class_name = ctx.intern(&original_name);
            promote_table_to_class(ctx, table_id, class_name, true);
        }
    }

    let touches_class = ctx.table(table_id).is_class();
    ctx.table_mut(table_id).add_definition(key, value);
    if touches_class {
        ctx.module_scope_mut()
            .items
            .push(ScopeItem::SeenClass(table_id));
    }
}

fn has_classed_container(ctx: &AnalysisContext, table_id: TableId) -> bool {
    let mut visited = vec![table_id];
    let mut current = ctx.table(table_id).container_id;

    while let Some(container) = current {
        if visited.contains(&container) {
            return false;
        }
        if ctx.table(container).is_class() {
            return true;
        }
        visited.push(container);
        current = ctx.table(container).container_id;
    }

    false
}
