use luana_code_info::expression::{Expression, ExpressionInfo};
use luana_code_info::ids::{RefId, TableId};
use luana_code_info::scope::ScopeItem;
use luana_code_info::ttype::{single_table_ref, table_refs, TypeToken};

use crate::context::AnalysisContext;
use crate::resolver::{resolve_expression, ResolutionCache};

/// `setmetatable(x, meta)`: when `meta` leads to a class table and `x` is a
/// plain-table local, fold `x`'s fields into the class as instance fields
/// and promote `x` to an instance of it.
pub fn handle_set_metatable(
    ctx: &mut AnalysisContext,
    target: &ExpressionInfo,
    meta: &ExpressionInfo,
) {
    let Some(class_table) = resolve_meta_class(ctx, meta) else {
        return;
    };

    let Some(RefId::Local { name, .. }) = target.as_reference() else {
        return;
    };

    let target_types = resolve_expression(ctx, target);
    if target_types.is_empty() {
        return;
    }
    let all_plain_tables = target_types.iter().all(|token| match token {
        TypeToken::TableRef(table_id) => !ctx.table(*table_id).is_class(),
        _ => false,
    });
    if !all_plain_tables {
        return;
    }

    // Everything already assigned onto the plain value becomes an instance
    // field of the class.
    for table_id in table_refs(&target_types) {
        copy_fields_as_instance(ctx, table_id, class_table);
    }
    ctx.module_scope_mut()
        .items
        .push(ScopeItem::SeenClass(class_table));

    let instance_ref = ctx.new_instance_ref();
    let mut definition = ctx.expr(Expression::Reference(RefId::Table(class_table)));
    definition.instance = true;
    ctx.add_definition(instance_ref, definition);

    ctx.rebind_local(name, instance_ref);
}

/// The class a metatable argument stands for: either a class table itself,
/// or a table literal carrying `__index = Class`.
fn resolve_meta_class(ctx: &AnalysisContext, meta: &ExpressionInfo) -> Option<TableId> {
    let meta_types = resolve_expression(ctx, meta);

    if let Some(table_id) = single_table_ref(&meta_types) {
        let table = ctx.table(table_id);
        if table.is_class() {
            return Some(table_id);
        }

        let definitions = table.definitions.get("__index")?;
        if definitions.len() != 1 {
            return None;
        }

        let mut seen = ResolutionCache::default();
        let index_types = crate::resolver::resolve(ctx, &definitions[0], &mut seen);
        let index_table = single_table_ref(&index_types)?;
        if ctx.table(index_table).is_class() {
            return Some(index_table);
        }
    }

    None
}

fn copy_fields_as_instance(ctx: &mut AnalysisContext, from: TableId, to: TableId) {
    if from == to {
        return;
    }

    let copied: Vec<(String, Vec<ExpressionInfo>)> = ctx
        .table(from)
        .definitions
        .iter()
        .map(|(key, definitions)| (key.clone(), definitions.clone()))
        .collect();

    let target = ctx.table_mut(to);
    for (key, definitions) in copied {
        for mut definition in definitions {
            definition.instance = true;
            target.definitions.entry(key.clone()).or_default().push(definition);
        }
    }
}
