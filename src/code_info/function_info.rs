use luana_str::StrId;
use serde::{Deserialize, Serialize};

use crate::expression::ExpressionInfo;
use crate::ids::{FunctionId, RefId};
use crate::ttype::TypeSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub id: FunctionId,

    pub name: Option<StrId>,

    /// Parameter ids, including a leading self entry for colon methods.
    pub parameters: Vec<RefId>,
    pub parameter_names: Vec<StrId>,

    /// Inferred from call-site arguments, assignments, and name heuristics.
    pub parameter_types: Vec<TypeSet>,

    /// Union of computed types per return slot.
    pub return_types: Vec<TypeSet>,

    /// Concrete expressions contributing to each slot.
    pub return_expressions: Vec<Vec<ExpressionInfo>>,

    /// Minimum observed return count; slots at or beyond it are implicitly
    /// nullable. `None` until a return statement is seen.
    pub min_returns: Option<usize>,

    /// Where the function was assigned, kept for method and constructor
    /// detection.
    pub identifier_expression: Option<ExpressionInfo>,

    pub defining_module: Option<StrId>,

    pub is_constructor: bool,
    pub is_method: bool,
}

impl FunctionInfo {
    pub fn new(id: FunctionId, defining_module: Option<StrId>) -> Self {
        FunctionInfo {
            id,
            name: None,
            parameters: Vec::new(),
            parameter_names: Vec::new(),
            parameter_types: Vec::new(),
            return_types: Vec::new(),
            return_expressions: Vec::new(),
            min_returns: None,
            identifier_expression: None,
            defining_module,
            is_constructor: false,
            is_method: false,
        }
    }

    /// Grow the return vectors so slot `index` exists.
    pub fn ensure_return_slot(&mut self, index: usize) {
        while self.return_types.len() <= index {
            self.return_types.push(TypeSet::default());
        }
        while self.return_expressions.len() <= index {
            self.return_expressions.push(Vec::new());
        }
    }

    /// Slot of a parameter id within this function, if it belongs here.
    pub fn parameter_slot(&self, id: &RefId) -> Option<usize> {
        self.parameters.iter().position(|p| p == id)
    }
}
