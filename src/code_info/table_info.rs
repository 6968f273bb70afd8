use indexmap::IndexMap;
use luana_str::StrId;
use serde::{Deserialize, Serialize};

use crate::expression::{ExpressionInfo, LuaType};
use crate::ids::TableId;
use crate::ttype::TypeSet;

/// The canonical `definitions` key for a field name: string keys are
/// double-quoted with internal quotes escaped, numeric and identifier keys
/// pass through textually.
pub fn literal_key(name: &str, lua_type: Option<LuaType>) -> String {
    match lua_type {
        Some(LuaType::String) => {
            format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
        }
        _ => name.to_string(),
    }
}

/// The user-visible spelling of a normalized key: quoted string keys lose
/// their quoting, everything else is already plain.
pub fn display_key(key: &str) -> String {
    if key.len() >= 2 && key.starts_with('"') && key.ends_with('"') {
        key[1..key.len() - 1]
            .replace("\\\"", "\"")
            .replace("\\\\", "\\")
    } else {
        key.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableKey {
    Name(StrId),
    String(String),
    Number(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralField {
    /// Absent for auto-indexed entries.
    pub key: Option<TableKey>,
    pub value: ExpressionInfo,
    pub types: Option<TypeSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub id: TableId,

    /// Constructor entries in source order.
    pub literal_fields: Vec<LiteralField>,

    /// Every assignment seen for each normalized key, in source order across
    /// all modules. Downstream emission relies on this order.
    pub definitions: IndexMap<String, Vec<ExpressionInfo>>,

    pub defining_module: Option<StrId>,

    pub class_name: Option<StrId>,

    /// Dotted identifier path of the assignment that produced this table.
    pub original_name: Option<String>,

    /// Base recorded when the table came out of a derive call before a class
    /// name was settled.
    pub original_base: Option<StrId>,
    pub original_derive_name: Option<String>,

    pub base_class: Option<StrId>,
    pub derive_name: Option<String>,

    pub emit_as_table: bool,
    pub is_local_class: bool,
    pub is_empty_class: bool,
    pub is_closure_class: bool,
    pub from_hidden_class: bool,
    pub is_atom_ui: bool,
    pub is_atom_ui_base: bool,

    /// The enclosing table, when this one was built inside another. Implied
    /// class creation bubbles up through this chain.
    pub container_id: Option<TableId>,
}

impl TableInfo {
    pub fn new(id: TableId, defining_module: Option<StrId>) -> Self {
        TableInfo {
            id,
            literal_fields: Vec::new(),
            definitions: IndexMap::new(),
            defining_module,
            class_name: None,
            original_name: None,
            original_base: None,
            original_derive_name: None,
            base_class: None,
            derive_name: None,
            emit_as_table: false,
            is_local_class: false,
            is_empty_class: false,
            is_closure_class: false,
            from_hidden_class: false,
            is_atom_ui: false,
            is_atom_ui_base: false,
            container_id: None,
        }
    }

    #[inline]
    pub fn is_class(&self) -> bool {
        self.class_name.is_some()
    }

    pub fn add_definition(&mut self, key: String, info: ExpressionInfo) {
        self.definitions.entry(key).or_default().push(info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_keys_are_quoted_and_escaped() {
        assert_eq!(
            literal_key("say \"hi\"", Some(LuaType::String)),
            "\"say \\\"hi\\\"\""
        );
    }

    #[test]
    fn identifier_and_numeric_keys_pass_through() {
        assert_eq!(literal_key("onClick", None), "onClick");
        assert_eq!(literal_key("3", Some(LuaType::Number)), "3");
    }
}
