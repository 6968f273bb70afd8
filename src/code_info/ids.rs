use luana_str::{Interner, StrId};
use serde::{Deserialize, Serialize};

/// Index into the context's table arena.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct TableId(pub u32);

/// Index into the context's function arena.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ParamId(pub u32);

/// The target of a reference expression.
///
/// Every cross-reference in the model is one of these; the rendered `@…`
/// forms exist for diagnostics only and must never reach public output.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RefId {
    Table(TableId),
    Function(FunctionId),
    Param(ParamId),
    /// The implicit `self` of a colon-indexed method.
    SelfOf(FunctionId),
    /// A value promoted to a class instance by `setmetatable`.
    Instance(u32),
    Module(StrId),
    /// A lexical binding; `serial` disambiguates shadowed names.
    Local { name: StrId, serial: u32 },
    Global(StrId),
    Generated(StrId),
}

impl RefId {
    #[inline]
    pub fn as_table(&self) -> Option<TableId> {
        match self {
            RefId::Table(id) => Some(*id),
            _ => None,
        }
    }

    #[inline]
    pub fn as_function(&self) -> Option<FunctionId> {
        match self {
            RefId::Function(id) => Some(*id),
            _ => None,
        }
    }

    #[inline]
    pub fn is_self_or_instance(&self) -> bool {
        matches!(self, RefId::SelfOf(_) | RefId::Instance(_))
    }

    /// The name a reference was written as, where one exists.
    pub fn name(&self) -> Option<StrId> {
        match self {
            RefId::Local { name, .. } => Some(*name),
            RefId::Global(name) => Some(*name),
            RefId::Generated(name) => Some(*name),
            _ => None,
        }
    }

    pub fn render(&self, interner: &Interner) -> String {
        match self {
            RefId::Table(id) => format!("@table({})", id.0),
            RefId::Function(id) => format!("@function({})", id.0),
            RefId::Param(id) => format!("@parameter({})", id.0),
            RefId::SelfOf(_) => "@self".to_string(),
            RefId::Instance(_) => "@instance".to_string(),
            RefId::Module(path) => format!("@module({})", interner.lookup(path)),
            RefId::Local { name, serial } => {
                format!("@local({})[{}]", serial, interner.lookup(name))
            }
            RefId::Global(name) => interner.lookup(name).to_string(),
            RefId::Generated(name) => format!("@generated[{}]", interner.lookup(name)),
        }
    }
}
