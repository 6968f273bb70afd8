use luana_code_info::expression::{ExprId, Expression, ExpressionInfo};
use luana_code_info::function_info::FunctionInfo;
use luana_code_info::ids::{FunctionId, ParamId, RefId, TableId};
use luana_code_info::scope::{ReturnItem, ScopeInfo, ScopeKind};
use luana_code_info::table_info::TableInfo;
use luana_str::{Interner, StrId};
use rustc_hash::FxHashMap;

use crate::usage::UsageKey;

/// Owner of all interned analysis state. One context is threaded through the
/// whole run; every cross-reference into it is an opaque id.
pub struct AnalysisContext {
    pub interner: Interner,

    pub tables: Vec<TableInfo>,
    pub functions: Vec<FunctionInfo>,

    /// Every recorded assignment per reference, in source order.
    pub assignments: FxHashMap<RefId, Vec<ExpressionInfo>>,

    /// Usage constraints, composed by intersection as usages accumulate.
    pub usage_masks: FxHashMap<UsageKey, u8>,

    /// Reverse lookup from a parameter to the function declaring it.
    pub param_functions: FxHashMap<ParamId, FunctionId>,

    /// Module id → the synthetic function owning that module's return slots.
    pub module_functions: FxHashMap<StrId, FunctionId>,

    /// Path suffix → full module ids. Consulted only when a require by a
    /// shorter name is ambiguous; non-unique entries are ignored.
    pub module_aliases: FxHashMap<StrId, Vec<StrId>>,

    /// Lexical scope stack of the module currently being walked.
    pub scopes: Vec<ScopeInfo>,

    /// Return statements captured during the walk, ingested at module end.
    pub pending_returns: Vec<ReturnItem>,

    pub current_module: Option<StrId>,

    next_expr: u32,
    next_local: u32,
    next_instance: u32,
    next_param: u32,
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisContext {
    pub fn new() -> Self {
        AnalysisContext {
            interner: Interner::default(),
            tables: Vec::new(),
            functions: Vec::new(),
            assignments: FxHashMap::default(),
            usage_masks: FxHashMap::default(),
            param_functions: FxHashMap::default(),
            module_functions: FxHashMap::default(),
            module_aliases: FxHashMap::default(),
            scopes: Vec::new(),
            pending_returns: Vec::new(),
            current_module: None,
            next_expr: 0,
            next_local: 0,
            next_instance: 0,
            next_param: 0,
        }
    }

    pub fn intern(&mut self, name: &str) -> StrId {
        self.interner.intern_str(name)
    }

    pub fn new_table(&mut self) -> TableId {
        let id = TableId(self.tables.len() as u32);
        self.tables.push(TableInfo::new(id, self.current_module));
        id
    }

    #[inline]
    pub fn table(&self, id: TableId) -> &TableInfo {
        &self.tables[id.0 as usize]
    }

    #[inline]
    pub fn table_mut(&mut self, id: TableId) -> &mut TableInfo {
        &mut self.tables[id.0 as usize]
    }

    pub fn new_function(&mut self) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(FunctionInfo::new(id, self.current_module));
        id
    }

    #[inline]
    pub fn function(&self, id: FunctionId) -> &FunctionInfo {
        &self.functions[id.0 as usize]
    }

    #[inline]
    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionInfo {
        &mut self.functions[id.0 as usize]
    }

    pub fn new_param(&mut self, function_id: FunctionId) -> ParamId {
        let id = ParamId(self.next_param);
        self.next_param += 1;
        self.param_functions.insert(id, function_id);
        id
    }

    pub fn new_instance_ref(&mut self) -> RefId {
        let serial = self.next_instance;
        self.next_instance += 1;
        RefId::Instance(serial)
    }

    fn new_expr_id(&mut self) -> ExprId {
        let id = ExprId(self.next_expr);
        self.next_expr += 1;
        id
    }

    /// Build an [`ExpressionInfo`] stamped with the current module and
    /// function level.
    pub fn expr(&mut self, expression: Expression) -> ExpressionInfo {
        let mut info = ExpressionInfo::new(self.new_expr_id(), expression);
        info.defining_module = self.current_module;
        info.function_level = self.enclosing_function().is_some();
        info
    }

    // -- scopes ----------------------------------------------------------

    pub fn push_scope(&mut self, kind: ScopeKind) {
        self.scopes.push(ScopeInfo::new(kind));
    }

    pub fn pop_scope(&mut self) -> ScopeInfo {
        self.scopes.pop().expect("scope stack underflow")
    }

    pub fn current_scope_mut(&mut self) -> &mut ScopeInfo {
        self.scopes.last_mut().expect("no active scope")
    }

    /// The module scope sits at the bottom of the stack; partial items that
    /// belong to the module land there.
    pub fn module_scope_mut(&mut self) -> &mut ScopeInfo {
        self.scopes.first_mut().expect("no active scope")
    }

    pub fn lookup_local(&self, name: StrId) -> Option<RefId> {
        self.scopes.iter().rev().find_map(|scope| scope.lookup(name))
    }

    pub fn declare_local(&mut self, name: StrId) -> RefId {
        let serial = self.next_local;
        self.next_local += 1;

        let id = RefId::Local { name, serial };
        self.current_scope_mut().locals.insert(name, id);
        id
    }

    /// Rebind an existing local name wherever it was declared on the stack.
    pub fn rebind_local(&mut self, name: StrId, id: RefId) {
        for scope in self.scopes.iter_mut().rev() {
            if scope.locals.contains_key(&name) {
                scope.locals.insert(name, id);
                return;
            }
        }
    }

    pub fn enclosing_function(&self) -> Option<FunctionId> {
        self.scopes.iter().rev().find_map(|scope| match scope.kind {
            ScopeKind::Function(id) => Some(id),
            _ => None,
        })
    }

    /// The closure-class binding visible for `name`, if any enclosing
    /// function scope registered one.
    pub fn closure_self_binding(&self, name: StrId) -> Option<TableId> {
        self.scopes.iter().rev().find_map(|scope| match scope.closure_self {
            Some((binding, table)) if binding == name => Some(table),
            _ => None,
        })
    }

    // -- definitions -----------------------------------------------------

    pub fn add_definition(&mut self, id: RefId, info: ExpressionInfo) {
        self.assignments.entry(id).or_default().push(info);
    }

    pub fn definitions(&self, id: &RefId) -> Option<&Vec<ExpressionInfo>> {
        self.assignments.get(id)
    }

    /// The declaring function and parameter slot of a parameter-like
    /// reference.
    pub fn param_location(&self, id: &RefId) -> Option<(FunctionId, usize)> {
        let function_id = match id {
            RefId::Param(param) => *self.param_functions.get(param)?,
            RefId::SelfOf(function) => *function,
            _ => return None,
        };

        let slot = self.function(function_id).parameter_slot(id)?;
        Some((function_id, slot))
    }
}
