use luana_str::StrId;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::expression::ExpressionInfo;
use crate::ids::{FunctionId, TableId};
use crate::scope::{ClassItem, FieldItem, ScopeInfo};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequireItem {
    pub name: StrId,
    pub module: StrId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedFunction {
    pub name: StrId,
    pub function_id: FunctionId,
}

/// Per-module partial result: everything the scope walk established, before
/// finalization collapses ids into user-visible entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedModule {
    pub id: StrId,
    pub scope: ScopeInfo,
    pub classes: Vec<ClassItem>,
    pub functions: Vec<ResolvedFunction>,
    pub requires: Vec<RequireItem>,
    pub fields: Vec<FieldItem>,

    /// Expressions contributing to each module return slot.
    pub returns: Vec<Vec<ExpressionInfo>>,

    /// Class tables this module touched without declaring, so containers can
    /// emit empty skeletons.
    pub seen_classes: FxHashSet<TableId>,

    /// Synthetic function owning the module-level return slots.
    pub module_function: FunctionId,
}
