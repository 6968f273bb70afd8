use luana_code_info::ttype::{TypeSet, TypeToken};

use super::ModuleFinalizer;
use crate::context::AnalysisContext;

impl ModuleFinalizer<'_> {
    pub(crate) fn finalize_types(&self, types: &TypeSet) -> Vec<String> {
        finalize_type_set(self.ctx, types)
    }
}

/// Collapse a type set into public type names. The empty set reads as
/// `unknown`; an explicit `unknown` swallows everything except nullability;
/// table references surface as their class name or plain `table`; and a set
/// naming more than two classes is a narrowing failure that widens to
/// `table`.
pub fn finalize_type_set(ctx: &AnalysisContext, types: &TypeSet) -> Vec<String> {
    if types.is_empty() {
        return vec!["unknown".to_string()];
    }

    if types.contains(&TypeToken::Unknown) {
        let mut out = vec!["unknown".to_string()];
        if types.contains(&TypeToken::Nil) {
            out.push("nil".to_string());
        }
        return out;
    }

    let mut out: Vec<String> = Vec::new();
    let mut class_count = 0usize;

    for token in types {
        let name = match token {
            TypeToken::Nil => "nil".to_string(),
            TypeToken::Boolean | TypeToken::True | TypeToken::False => "boolean".to_string(),
            TypeToken::String => "string".to_string(),
            TypeToken::Number => "number".to_string(),
            TypeToken::Table => "table".to_string(),
            TypeToken::Function | TypeToken::FunctionRef(_) => "function".to_string(),
            TypeToken::Unknown | TypeToken::Instance => continue,
            TypeToken::TableRef(table_id) => {
                let table = ctx.table(*table_id);
                match table.class_name {
                    Some(class_name) if !table.emit_as_table => {
                        class_count += 1;
                        ctx.interner.lookup(&class_name).to_string()
                    }
                    _ => "table".to_string(),
                }
            }
            TypeToken::Class(class_name) => {
                class_count += 1;
                ctx.interner.lookup(class_name).to_string()
            }
        };

        if !out.contains(&name) {
            out.push(name);
        }
    }

    if class_count > 2 {
        return vec!["table".to_string()];
    }

    if out.is_empty() {
        vec!["unknown".to_string()]
    } else {
        out
    }
}
