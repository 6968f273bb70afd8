use luana_ast::Indexer;
use luana_code_info::analyzed_module::{
    AnalyzedClass, AnalyzedField, AnalyzedFunction, AnalyzedParameter,
};
use luana_code_info::expression::{Expression, ExpressionInfo};
use luana_code_info::function_info::FunctionInfo;
use luana_code_info::ids::{FunctionId, RefId};
use luana_code_info::scope::ClassItem;
use luana_code_info::table_info::display_key;
use luana_code_info::ttype::{combine, get_nil, single_function_ref, TypeSet};
use rustc_hash::FxHashSet;

use super::ModuleFinalizer;
use crate::resolver::resolve_expression;

impl ModuleFinalizer<'_> {
    /// Collapse one class table into its public form. Definitions partition
    /// by the module that made them: this module's function definitions
    /// become methods/functions/constructors, instance-flagged definitions
    /// become fields, and the rest become statics. Foreign definitions only
    /// contribute types.
    pub(crate) fn finalize_class(&mut self, item: &ClassItem) -> AnalyzedClass {
        let ctx = self.ctx;
        let table = ctx.table(item.table_id);

        let mut class = AnalyzedClass::new(ctx.interner.lookup(&item.name).to_string());
        class.base = item
            .base
            .or(table.base_class)
            .map(|base| ctx.interner.lookup(&base).to_string());
        class.derive_name = item.derive_name.clone().or_else(|| table.derive_name.clone());
        class.is_local = table.is_local_class;

        let mut emitted_functions: FxHashSet<String> = FxHashSet::default();

        for (key, definitions) in &table.definitions {
            let name = display_key(key);

            let module_definitions: Vec<&ExpressionInfo> = definitions
                .iter()
                .filter(|definition| definition.defining_module == Some(self.module.id))
                .collect();

            let mut emitted_function_here = false;
            for definition in &module_definitions {
                let Some(function_id) = self.function_of(definition) else {
                    continue;
                };
                let function = ctx.function(function_id);
                let finalized = self.finalize_function(function, &name);

                let is_colon = self.declared_with_colon(function);
                if function.is_constructor || name == "new" {
                    if is_colon {
                        class.constructors.push(finalized);
                    } else {
                        class.function_constructors.push(finalized);
                    }
                } else if is_colon {
                    class.methods.push(finalized);
                } else {
                    class.functions.push(finalized);
                }

                emitted_functions.insert(name.clone());
                emitted_function_here = true;
            }
            if emitted_function_here {
                continue;
            }
            // A field whose key collides with an already-emitted function
            // stays suppressed.
            if emitted_functions.contains(&name) {
                continue;
            }

            if module_definitions.is_empty() {
                self.walk_nested_table(&name, definitions, &mut class);
            }

            let instance_definitions: Vec<&ExpressionInfo> = definitions
                .iter()
                .filter(|definition| definition.instance)
                .collect();
            if !instance_definitions.is_empty() {
                let types = self.union_types(&instance_definitions);
                class.fields.push(AnalyzedField {
                    name: name.clone(),
                    types: self.finalize_types(&types),
                    value: None,
                });
            }

            let static_definitions: Vec<&ExpressionInfo> = definitions
                .iter()
                .filter(|definition| {
                    !definition.instance && self.function_of(definition).is_none()
                })
                .collect();
            if !static_definitions.is_empty() {
                let field = self.finalize_static_field(&name, &static_definitions);
                if static_definitions.iter().all(|d| d.from_literal) {
                    class.literal_fields.push(field);
                } else {
                    class.static_fields.push(field);
                }
            }
        }

        if table.is_atom_ui || table.is_atom_ui_base {
            class.overloads.push(AnalyzedFunction {
                name: "overload".to_string(),
                parameters: vec![AnalyzedParameter {
                    name: "args".to_string(),
                    types: vec!["table".to_string()],
                }],
                return_types: vec![vec![class.name.clone()]],
                is_method: false,
            });
        }

        class
    }

    /// Static-field emission rules: a single module-level definition may
    /// inline its expression (never a literal class-table); several keep
    /// only a primitive literal; a key never assigned at module level adds
    /// `nil` to its types.
    fn finalize_static_field(
        &mut self,
        name: &str,
        definitions: &[&ExpressionInfo],
    ) -> AnalyzedField {
        let module_definitions: Vec<&ExpressionInfo> = definitions
            .iter()
            .copied()
            .filter(|definition| definition.defining_module == Some(self.module.id))
            .collect();

        let value = match module_definitions.as_slice() {
            [single] => {
                let is_class_literal = single
                    .as_literal_table()
                    .map(|table_id| self.ctx.table(table_id).is_class())
                    .unwrap_or(false);
                if is_class_literal {
                    None
                } else {
                    Some(self.finalize_expression(&(*single).clone()))
                }
            }
            [] => None,
            _ => module_definitions
                .iter()
                .copied()
                .find(|definition| {
                    definition.as_literal().is_some()
                        && definition.as_literal_table().is_none()
                        && definition.as_literal_function().is_none()
                })
                .map(|primitive| self.finalize_expression(&primitive.clone())),
        };

        let mut types = self.union_types(definitions);
        if module_definitions.is_empty() {
            combine(&mut types, &get_nil());
        }

        AnalyzedField {
            name: name.to_string(),
            types: self.finalize_types(&types),
            value,
        }
    }

    /// A nested table this module only reads: plain tables contribute
    /// dotted setter fields for whatever this module assigned through them;
    /// tables with their own class name are deferred as extra classes.
    fn walk_nested_table(
        &mut self,
        name: &str,
        definitions: &[ExpressionInfo],
        class: &mut AnalyzedClass,
    ) {
        let Some(nested_id) = definitions
            .iter()
            .find_map(|definition| definition.as_literal_table())
        else {
            return;
        };

        let nested = self.ctx.table(nested_id);

        let has_module_writes = nested.definitions.values().any(|nested_definitions| {
            nested_definitions
                .iter()
                .any(|definition| definition.defining_module == Some(self.module.id))
        });
        if !has_module_writes {
            return;
        }

        if nested.is_class() {
            self.extra_classes.push(nested_id);
            return;
        }

        if !self.config.infer_setter_fields {
            return;
        }

        for (nested_key, nested_definitions) in &nested.definitions {
            let module_writes: Vec<&ExpressionInfo> = nested_definitions
                .iter()
                .filter(|definition| definition.defining_module == Some(self.module.id))
                .collect();
            if module_writes.is_empty() {
                continue;
            }

            let types = self.union_types(&module_writes);
            class.setter_fields.push(AnalyzedField {
                name: format!("{}.{}", name, display_key(nested_key)),
                types: self.finalize_types(&types),
                value: None,
            });
        }
    }

    pub(crate) fn finalize_function(
        &mut self,
        function: &FunctionInfo,
        name: &str,
    ) -> AnalyzedFunction {
        let mut parameters = Vec::new();

        for (slot, parameter) in function.parameters.iter().enumerate() {
            if matches!(parameter, RefId::SelfOf(_)) {
                continue;
            }

            let parameter_name = function
                .parameter_names
                .get(slot)
                .map(|name| self.ctx.interner.lookup(name).to_string())
                .unwrap_or_default();
            let types = function
                .parameter_types
                .get(slot)
                .map(|types| self.finalize_types(types))
                .unwrap_or_else(|| vec!["unknown".to_string()]);

            parameters.push(AnalyzedParameter {
                name: parameter_name,
                types,
            });
        }

        let return_types = function
            .return_types
            .iter()
            .map(|types| self.finalize_types(types))
            .collect();

        AnalyzedFunction {
            name: name.to_string(),
            parameters,
            return_types,
            is_method: function.is_method,
        }
    }

    fn function_of(&self, definition: &ExpressionInfo) -> Option<FunctionId> {
        if let Some(function_id) = definition.as_literal_function() {
            return Some(function_id);
        }
        if definition.as_literal().is_some() {
            return None;
        }
        single_function_ref(&resolve_expression(self.ctx, definition))
    }

    fn declared_with_colon(&self, function: &FunctionInfo) -> bool {
        match &function.identifier_expression {
            Some(info) => matches!(
                &info.expression,
                Expression::Member {
                    indexer: Indexer::Colon,
                    ..
                }
            ),
            None => function.is_method,
        }
    }

    pub(crate) fn union_types(&self, definitions: &[&ExpressionInfo]) -> TypeSet {
        let mut types = TypeSet::default();
        for definition in definitions {
            combine(&mut types, &resolve_expression(self.ctx, definition));
        }
        types
    }
}
