use luana_str::StrId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::expression::ExpressionInfo;
use crate::ids::{FunctionId, RefId, TableId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeKind {
    Module,
    Function(FunctionId),
    Block,
}

/// One lexical scope: its name bindings plus the partial analysis items
/// registered while walking it. Items are grouped into the module's
/// resolved lists once the walk finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeInfo {
    pub kind: ScopeKind,
    pub locals: FxHashMap<StrId, RefId>,
    pub items: Vec<ScopeItem>,

    /// The `self`/`publ` binding of a detected closure class, with the
    /// synthetic class table it stands for.
    pub closure_self: Option<(StrId, TableId)>,
}

impl ScopeInfo {
    pub fn new(kind: ScopeKind) -> Self {
        ScopeInfo {
            kind,
            locals: FxHashMap::default(),
            items: Vec::new(),
            closure_self: None,
        }
    }

    #[inline]
    pub fn lookup(&self, name: StrId) -> Option<RefId> {
        self.locals.get(&name).copied()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScopeItem {
    Class(ClassItem),
    Function { name: StrId, function_id: FunctionId },
    Require { name: StrId, module: StrId },
    Field(FieldItem),
    /// A class table touched, but not declared, by this module.
    SeenClass(TableId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassItem {
    pub name: StrId,
    pub table_id: TableId,
    pub base: Option<StrId>,
    pub derive_name: Option<String>,
    pub generated: bool,
    pub defining_module: StrId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldItem {
    pub name: StrId,
    pub expression: ExpressionInfo,
}

/// A return statement captured during the walk, ingested per function once
/// the module walk completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnItem {
    pub function_id: FunctionId,
    pub expressions: Vec<ExpressionInfo>,
}
