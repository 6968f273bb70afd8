use luana_code_info::ids::{FunctionId, TableId};
use luana_code_info::resolved_module::{RequireItem, ResolvedFunction, ResolvedModule};
use luana_code_info::scope::{ClassItem, ScopeInfo, ScopeItem};
use luana_str::StrId;
use rustc_hash::FxHashSet;

use crate::context::AnalysisContext;
use crate::returns::{apply_min_return_nils, resolve_returns};

/// Collapse a fully-walked module scope into its partial result: ingest the
/// pending returns, group the scope items, and include skeletons for class
/// tables this module touched without declaring.
pub fn resolve_items(
    ctx: &mut AnalysisContext,
    module_id: StrId,
    scope: ScopeInfo,
    module_function: FunctionId,
) -> ResolvedModule {
    let pending = std::mem::take(&mut ctx.pending_returns);
    let mut touched_functions: Vec<FunctionId> = Vec::new();
    for item in &pending {
        resolve_returns(ctx, item);
        if !touched_functions.contains(&item.function_id) {
            touched_functions.push(item.function_id);
        }
    }
    for function_id in touched_functions {
        apply_min_return_nils(ctx, function_id);
    }

    let mut classes: Vec<ClassItem> = Vec::new();
    let mut declared: FxHashSet<TableId> = FxHashSet::default();
    let mut functions: Vec<ResolvedFunction> = Vec::new();
    let mut declared_functions: FxHashSet<FunctionId> = FxHashSet::default();
    let mut requires: Vec<RequireItem> = Vec::new();
    let mut fields = Vec::new();
    let mut merely_touched: Vec<TableId> = Vec::new();

    for item in &scope.items {
        match item {
            ScopeItem::Class(class) => {
                if declared.insert(class.table_id) {
                    classes.push(class.clone());
                }
            }
            ScopeItem::Function { name, function_id } => {
                if declared_functions.insert(*function_id) {
                    functions.push(ResolvedFunction {
                        name: *name,
                        function_id: *function_id,
                    });
                }
            }
            ScopeItem::Require { name, module } => {
                requires.push(RequireItem {
                    name: *name,
                    module: *module,
                });
            }
            ScopeItem::Field(field) => {
                fields.push(field.clone());
            }
            ScopeItem::SeenClass(table_id) => {
                if !merely_touched.contains(table_id) {
                    merely_touched.push(*table_id);
                }
            }
        }
    }

    // Class names may have moved since the item was pushed; the table is
    // authoritative.
    for class in classes.iter_mut() {
        let table = ctx.table(class.table_id);
        if let Some(name) = table.class_name {
            class.name = name;
        }
        if class.base.is_none() {
            class.base = table.base_class;
        }
        if class.derive_name.is_none() {
            class.derive_name = table.derive_name.clone();
        }
    }

    // Undeclared but non-empty classes still surface, so containers can
    // emit an empty skeleton for them.
    let mut seen_classes: FxHashSet<TableId> = FxHashSet::default();
    for table_id in merely_touched {
        if declared.contains(&table_id) {
            continue;
        }
        let table = ctx.table(table_id);
        let Some(name) = table.class_name else {
            continue;
        };
        if table.definitions.is_empty() {
            continue;
        }

        seen_classes.insert(table_id);
        classes.push(ClassItem {
            name,
            table_id,
            base: table.base_class,
            derive_name: table.derive_name.clone(),
            generated: true,
            defining_module: module_id,
        });
    }

    let returns = ctx.function(module_function).return_expressions.clone();

    ctx.module_functions.insert(module_id, module_function);

    ResolvedModule {
        id: module_id,
        scope,
        classes,
        functions,
        requires,
        fields,
        returns,
        seen_classes,
        module_function,
    }
}
