use luana_code_info::analysis_result::AnalysisResult;
use luana_code_info::analyzed_module::{AnalyzedField, AnalyzedModule, AnalyzedReturn};
use luana_code_info::expression::{Expression, ExpressionInfo, Operator};
use luana_code_info::ids::{FunctionId, RefId, TableId};
use luana_code_info::resolved_module::ResolvedModule;
use luana_code_info::scope::ClassItem;
use luana_code_info::ttype::TypeToken;
use luana_logger::Logger;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::Config;
use crate::context::AnalysisContext;
use crate::resolver::resolve_expression;

mod ancestors;
mod class;
mod expression;
mod table;
mod types;

pub use ancestors::finalize_class_fields;
pub use types::finalize_type_set;

/// Collapse every resolved module into its public form, then prune fields
/// that ancestors already carry.
pub fn finalize(
    ctx: &mut AnalysisContext,
    resolved: &[ResolvedModule],
    config: &Config,
    logger: &Logger,
) -> AnalysisResult {
    let mut result = AnalysisResult::new();

    for module in resolved {
        ctx.current_module = Some(module.id);

        let module_name = ctx.interner.lookup(&module.id).to_string();
        logger.log_debug(&format!("finalizing {}", module_name));

        let analyzed = ModuleFinalizer::new(ctx, module, config).run(module_name.clone());
        result.analyzed_modules.insert(module_name, analyzed);
    }

    finalize_class_fields(&mut result);

    result
}

/// Finalization state for one module: which locals may inline where, and
/// which tables are mid-emission (cycles emit as placeholders instead of
/// recursing forever).
pub(crate) struct ModuleFinalizer<'a> {
    ctx: &'a AnalysisContext,
    module: &'a ResolvedModule,
    config: &'a Config,

    /// Locals referenced from emitted positions: the single definition to
    /// inline, or `None` on a multi-definition collision.
    ref_map: FxHashMap<RefId, Option<ExpressionInfo>>,

    in_progress_tables: FxHashSet<TableId>,
    inlining: FxHashSet<RefId>,

    /// Classed tables found nested under other classes, emitted after the
    /// declared ones.
    extra_classes: Vec<TableId>,
}

impl<'a> ModuleFinalizer<'a> {
    pub(crate) fn new(
        ctx: &'a AnalysisContext,
        module: &'a ResolvedModule,
        config: &'a Config,
    ) -> Self {
        ModuleFinalizer {
            ctx,
            module,
            config,
            ref_map: FxHashMap::default(),
            in_progress_tables: FxHashSet::default(),
            inlining: FxHashSet::default(),
            extra_classes: Vec::new(),
        }
    }

    pub(crate) fn run(mut self, module_name: String) -> AnalyzedModule {
        self.count_references();

        let mut analyzed = AnalyzedModule::new(module_name);

        let mut emitted_tables: FxHashSet<TableId> = FxHashSet::default();
        for item in &self.module.classes {
            if !emitted_tables.insert(item.table_id) {
                continue;
            }
            if self.ctx.table(item.table_id).emit_as_table {
                let name = self.ctx.interner.lookup(&item.name).to_string();
                let table = self.finalize_table_id(item.table_id, Some(name));
                analyzed.tables.push(table);
            } else {
                let class = self.finalize_class(item);
                analyzed.classes.push(class);
            }
        }

        while let Some(table_id) = self.extra_classes.pop() {
            if !emitted_tables.insert(table_id) {
                continue;
            }
            if let Some(item) = self.class_item_for(table_id) {
                let class = self.finalize_class(&item);
                analyzed.classes.push(class);
            }
        }

        for function in &self.module.functions {
            let info = self.ctx.function(function.function_id);
            let name = self.ctx.interner.lookup(&function.name).to_string();

            // A closure-class constructor belongs to its class.
            if info.is_constructor {
                if let Some(class_name) = self.closure_class_name(function.function_id) {
                    let finalized = self.finalize_function(info, &name);
                    if let Some(class) = analyzed
                        .classes
                        .iter_mut()
                        .find(|class| class.name == class_name)
                    {
                        class.function_constructors.push(finalized);
                        continue;
                    }
                }
            }

            let finalized = self.finalize_function(info, &name);
            analyzed.functions.push(finalized);
        }

        for field in &self.module.fields {
            let types = resolve_expression(self.ctx, &field.expression);
            analyzed.fields.push(AnalyzedField {
                name: self.ctx.interner.lookup(&field.name).to_string(),
                types: self.finalize_types(&types),
                value: Some(self.finalize_expression(&field.expression.clone())),
            });
        }

        let module_function = self.ctx.function(self.module.module_function);
        let return_types = module_function.return_types.clone();
        for (slot, expressions) in self.module.returns.iter().enumerate() {
            let types = return_types
                .get(slot)
                .map(|types| self.finalize_types(types))
                .unwrap_or_else(|| vec!["unknown".to_string()]);

            let expression = if expressions.len() == 1 {
                Some(self.finalize_expression(&expressions[0].clone()))
            } else {
                None
            };

            analyzed.returns.push(AnalyzedReturn { types, expression });
        }

        analyzed
    }

    /// Locals reachable from the module's emitted surface. A base that is
    /// indexed or called weighs double; whether a local can inline depends
    /// only on it having exactly one definition.
    fn count_references(&mut self) {
        let mut counts: FxHashMap<RefId, u32> = FxHashMap::default();
        let mut visited_tables: FxHashSet<TableId> = FxHashSet::default();

        for item in &self.module.classes {
            self.count_table(item.table_id, &mut counts, &mut visited_tables);
        }
        for slot in &self.module.returns {
            for info in slot {
                self.count_expression(info, 1, &mut counts, &mut visited_tables);
            }
        }

        for (id, _count) in counts {
            if !matches!(id, RefId::Local { .. }) {
                continue;
            }
            let inline = match self.ctx.definitions(&id) {
                Some(definitions) if definitions.len() == 1 => Some(definitions[0].clone()),
                _ => None,
            };
            self.ref_map.insert(id, inline);
        }
    }

    fn count_table(
        &self,
        table_id: TableId,
        counts: &mut FxHashMap<RefId, u32>,
        visited: &mut FxHashSet<TableId>,
    ) {
        if !visited.insert(table_id) {
            return;
        }
        for definitions in self.ctx.table(table_id).definitions.values() {
            for info in definitions {
                self.count_expression(info, 1, counts, visited);
            }
        }
    }

    fn count_expression(
        &self,
        info: &ExpressionInfo,
        weight: u32,
        counts: &mut FxHashMap<RefId, u32>,
        visited: &mut FxHashSet<TableId>,
    ) {
        match &info.expression {
            Expression::Reference(id) => {
                *counts.entry(*id).or_insert(0) += weight;
            }
            Expression::Literal(literal) => {
                if let Some(table_id) = literal.table_id {
                    self.count_table(table_id, counts, visited);
                }
            }
            Expression::Member { base, .. } => {
                self.count_expression(base, weight, counts, visited);
            }
            Expression::Index { base, index } => {
                self.count_expression(base, 2, counts, visited);
                self.count_expression(index, 1, counts, visited);
            }
            Expression::Operation {
                operator,
                arguments,
            } => {
                for (position, argument) in arguments.iter().enumerate() {
                    let argument_weight = if *operator == Operator::Call && position == 0 {
                        2
                    } else {
                        1
                    };
                    self.count_expression(argument, argument_weight, counts, visited);
                }
            }
            Expression::Require { .. } => {}
        }
    }

    /// The class name a constructor's first return slot points at, when it
    /// is a closure class.
    fn closure_class_name(&self, function_id: FunctionId) -> Option<String> {
        let function = self.ctx.function(function_id);
        let first_slot = function.return_types.first()?;

        for token in first_slot {
            if let TypeToken::TableRef(table_id) = token {
                let table = self.ctx.table(*table_id);
                if table.is_closure_class {
                    let name = table.class_name?;
                    return Some(self.ctx.interner.lookup(&name).to_string());
                }
            }
        }

        None
    }

    /// Rebuild a class item for a deferred nested class from its table.
    fn class_item_for(&self, table_id: TableId) -> Option<ClassItem> {
        let table = self.ctx.table(table_id);
        let name = table.class_name?;

        Some(ClassItem {
            name,
            table_id,
            base: table.base_class,
            derive_name: table.derive_name.clone(),
            generated: true,
            defining_module: self.module.id,
        })
    }
}
