use luana_code_info::analyzed_module::AnalyzedExpression;
use luana_code_info::expression::{Expression, ExpressionInfo};
use luana_code_info::ids::RefId;
use luana_code_info::table_info::literal_key;
use luana_code_info::ttype::single_table_ref;

use super::ModuleFinalizer;
use crate::resolver::{resolve_expression, resolve_to_literal, ResolutionCache};

impl ModuleFinalizer<'_> {
    /// Collapse an expression into its public form: single-definition locals
    /// inline into their use site, internal ids turn into plain names, and
    /// member reads of known literal tables resolve to the stored value.
    pub(crate) fn finalize_expression(&mut self, info: &ExpressionInfo) -> AnalyzedExpression {
        match &info.expression {
            Expression::Literal(literal) => {
                if let Some(table_id) = literal.table_id {
                    let table = self.ctx.table(table_id);
                    if let Some(class_name) = table.class_name {
                        return AnalyzedExpression::Reference(
                            self.ctx.interner.lookup(&class_name).to_string(),
                        );
                    }
                    return AnalyzedExpression::Table(Box::new(
                        self.finalize_table_id(table_id, None),
                    ));
                }

                if literal.function_id.is_some() {
                    return AnalyzedExpression::Literal {
                        lua_type: "function".to_string(),
                        value: None,
                    };
                }

                AnalyzedExpression::Literal {
                    lua_type: literal.lua_type.name().to_string(),
                    value: literal.literal.clone(),
                }
            }

            Expression::Reference(id) => self.finalize_reference(*id),

            Expression::Member { base, member, .. } => {
                let base_types = resolve_expression(self.ctx, base);
                if let Some(table_id) = single_table_ref(&base_types) {
                    let member_key = literal_key(self.ctx.interner.lookup(member), None);
                    if let Some(definitions) =
                        self.ctx.table(table_id).definitions.get(&member_key)
                    {
                        if definitions.len() == 1 {
                            let definition = definitions[0].clone();
                            return self.finalize_expression(&definition);
                        }
                    }
                }

                match self.dotted_member_path(info) {
                    Some(path) => AnalyzedExpression::Reference(path),
                    None => AnalyzedExpression::Unknown,
                }
            }

            Expression::Operation { .. } | Expression::Index { .. } => {
                let mut seen = ResolutionCache::default();
                match resolve_to_literal(self.ctx, info, &mut seen) {
                    Some(folded) => AnalyzedExpression::Literal {
                        lua_type: folded.lua_type.name().to_string(),
                        value: folded.literal,
                    },
                    None => AnalyzedExpression::Unknown,
                }
            }

            Expression::Require { module } => {
                AnalyzedExpression::Reference(self.ctx.interner.lookup(module).to_string())
            }
        }
    }

    fn finalize_reference(&mut self, id: RefId) -> AnalyzedExpression {
        match id {
            RefId::Local { name, .. } => {
                let plain = self.ctx.interner.lookup(&name).to_string();

                match self.ref_map.get(&id).cloned() {
                    Some(Some(inline)) => {
                        // A local can only inline once per chain; a cycle
                        // falls back to the plain name.
                        if self.inlining.insert(id) {
                            let finalized = self.finalize_expression(&inline);
                            self.inlining.remove(&id);
                            finalized
                        } else {
                            AnalyzedExpression::Reference(plain)
                        }
                    }
                    // Multi-definition collision, or never counted: the
                    // internal suffix is stripped and the bare name stands.
                    _ => AnalyzedExpression::Reference(plain),
                }
            }

            RefId::SelfOf(_) => AnalyzedExpression::Reference("self".to_string()),

            RefId::Global(name) | RefId::Generated(name) => {
                AnalyzedExpression::Reference(self.ctx.interner.lookup(&name).to_string())
            }

            RefId::Table(table_id) => {
                let table = self.ctx.table(table_id);
                match table.class_name {
                    Some(class_name) => AnalyzedExpression::Reference(
                        self.ctx.interner.lookup(&class_name).to_string(),
                    ),
                    None => {
                        AnalyzedExpression::Table(Box::new(self.finalize_table_id(table_id, None)))
                    }
                }
            }

            RefId::Function(_) => AnalyzedExpression::Literal {
                lua_type: "function".to_string(),
                value: None,
            },

            RefId::Param(_) => {
                let Some((function_id, slot)) = self.ctx.param_location(&id) else {
                    return AnalyzedExpression::Unknown;
                };
                match self.ctx.function(function_id).parameter_names.get(slot) {
                    Some(name) => AnalyzedExpression::Reference(
                        self.ctx.interner.lookup(name).to_string(),
                    ),
                    None => AnalyzedExpression::Unknown,
                }
            }

            RefId::Module(path) => {
                AnalyzedExpression::Reference(self.ctx.interner.lookup(&path).to_string())
            }

            RefId::Instance(_) => AnalyzedExpression::Unknown,
        }
    }

    fn dotted_member_path(&self, info: &ExpressionInfo) -> Option<String> {
        match &info.expression {
            Expression::Reference(id) => {
                let name = id.name()?;
                Some(self.ctx.interner.lookup(&name).to_string())
            }
            Expression::Member { base, member, .. } => {
                let mut path = self.dotted_member_path(base)?;
                path.push('.');
                path.push_str(self.ctx.interner.lookup(member));
                Some(path)
            }
            _ => None,
        }
    }
}
