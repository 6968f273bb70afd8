use serde::{Deserialize, Serialize};

/// Public per-module output. All names and type strings are plain text drawn
/// from the reserved primitives (`nil`, `boolean`, `string`, `number`,
/// `table`, `function`, `unknown`) and class names; internal ids never
/// appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedModule {
    pub id: String,
    pub classes: Vec<AnalyzedClass>,
    pub tables: Vec<AnalyzedTable>,
    pub functions: Vec<AnalyzedFunction>,
    pub fields: Vec<AnalyzedField>,
    pub returns: Vec<AnalyzedReturn>,
}

impl AnalyzedModule {
    pub fn new(id: String) -> Self {
        AnalyzedModule {
            id,
            classes: Vec::new(),
            tables: Vec::new(),
            functions: Vec::new(),
            fields: Vec::new(),
            returns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedClass {
    pub name: String,
    pub base: Option<String>,
    pub derive_name: Option<String>,
    pub is_local: bool,

    pub fields: Vec<AnalyzedField>,
    pub literal_fields: Vec<AnalyzedField>,
    pub static_fields: Vec<AnalyzedField>,

    /// Fields assigned through nested plain tables, emitted under their
    /// dotted names.
    pub setter_fields: Vec<AnalyzedField>,

    pub methods: Vec<AnalyzedFunction>,
    pub functions: Vec<AnalyzedFunction>,
    pub constructors: Vec<AnalyzedFunction>,
    pub function_constructors: Vec<AnalyzedFunction>,
    pub overloads: Vec<AnalyzedFunction>,
}

impl AnalyzedClass {
    pub fn new(name: String) -> Self {
        AnalyzedClass {
            name,
            base: None,
            derive_name: None,
            is_local: false,
            fields: Vec::new(),
            literal_fields: Vec::new(),
            static_fields: Vec::new(),
            setter_fields: Vec::new(),
            methods: Vec::new(),
            functions: Vec::new(),
            constructors: Vec::new(),
            function_constructors: Vec::new(),
            overloads: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedFunction {
    pub name: String,
    pub parameters: Vec<AnalyzedParameter>,
    pub return_types: Vec<Vec<String>>,
    pub is_method: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedParameter {
    pub name: String,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedField {
    pub name: String,
    pub types: Vec<String>,
    pub value: Option<AnalyzedExpression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedTable {
    pub name: Option<String>,
    pub fields: Vec<AnalyzedTableField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedTableField {
    /// Absent when the entry continues the implicit sequence from 1.
    pub key: Option<String>,
    pub types: Vec<String>,
    pub value: AnalyzedExpression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalyzedExpression {
    Literal {
        lua_type: String,
        value: Option<String>,
    },
    Table(Box<AnalyzedTable>),
    Reference(String),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedReturn {
    pub types: Vec<String>,
    pub expression: Option<AnalyzedExpression>,
}
