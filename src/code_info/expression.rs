use luana_ast::Indexer;
use luana_str::StrId;
use serde::{Deserialize, Serialize};

use crate::ids::{FunctionId, RefId, TableId};

/// Identity of an expression node, assigned once when the node is built.
/// Clones share the id; resolver memoization and usage masks key off it.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ExprId(pub u32);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum LuaType {
    Nil,
    Boolean,
    String,
    Number,
    Table,
    Function,
}

impl LuaType {
    pub fn name(&self) -> &'static str {
        match self {
            LuaType::Nil => "nil",
            LuaType::Boolean => "boolean",
            LuaType::String => "string",
            LuaType::Number => "number",
            LuaType::Table => "table",
            LuaType::Function => "function",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Concat,
    Length,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    Minus,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    Shl,
    Shr,
    Call,
}

impl Operator {
    #[inline]
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Operator::Add
                | Operator::Sub
                | Operator::Mul
                | Operator::Div
                | Operator::FloorDiv
                | Operator::Mod
                | Operator::Pow
                | Operator::Minus
        )
    }

    #[inline]
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Operator::Eq | Operator::Ne | Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge
        )
    }

    #[inline]
    pub fn is_bitwise(&self) -> bool {
        matches!(
            self,
            Operator::BitAnd
                | Operator::BitOr
                | Operator::BitXor
                | Operator::BitNot
                | Operator::Shl
                | Operator::Shr
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Reference(RefId),
    Require { module: StrId },
    Literal(LiteralExpression),
    Index {
        base: Box<ExpressionInfo>,
        index: Box<ExpressionInfo>,
    },
    Member {
        base: Box<ExpressionInfo>,
        member: StrId,
        indexer: Indexer,
    },
    Operation {
        operator: Operator,
        arguments: Vec<ExpressionInfo>,
    },
}

impl Expression {
    #[inline]
    pub fn as_reference(&self) -> Option<RefId> {
        match self {
            Expression::Reference(id) => Some(*id),
            _ => None,
        }
    }

    #[inline]
    pub fn is_call(&self) -> bool {
        matches!(
            self,
            Expression::Operation {
                operator: Operator::Call,
                ..
            }
        )
    }
}

/// A literal value. Table and function literals carry the id of their
/// interned record; the record owns the fields and signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralExpression {
    pub lua_type: LuaType,
    pub literal: Option<String>,
    pub table_id: Option<TableId>,
    pub function_id: Option<FunctionId>,
}

impl LiteralExpression {
    pub fn nil() -> Self {
        LiteralExpression {
            lua_type: LuaType::Nil,
            literal: None,
            table_id: None,
            function_id: None,
        }
    }

    pub fn boolean(value: bool) -> Self {
        LiteralExpression {
            lua_type: LuaType::Boolean,
            literal: Some(if value { "true" } else { "false" }.to_string()),
            table_id: None,
            function_id: None,
        }
    }

    pub fn string(value: String) -> Self {
        LiteralExpression {
            lua_type: LuaType::String,
            literal: Some(value),
            table_id: None,
            function_id: None,
        }
    }

    pub fn number(value: String) -> Self {
        LiteralExpression {
            lua_type: LuaType::Number,
            literal: Some(value),
            table_id: None,
            function_id: None,
        }
    }

    pub fn table(table_id: TableId) -> Self {
        LiteralExpression {
            lua_type: LuaType::Table,
            literal: None,
            table_id: Some(table_id),
            function_id: None,
        }
    }

    pub fn function(function_id: FunctionId) -> Self {
        LiteralExpression {
            lua_type: LuaType::Function,
            literal: None,
            table_id: None,
            function_id: Some(function_id),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self.lua_type {
            LuaType::Nil => false,
            LuaType::Boolean => self.literal.as_deref() == Some("true"),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionInfo {
    pub uid: ExprId,
    pub expression: Expression,

    /// 1-based slot when the expression picks one value out of a
    /// multi-return producer.
    pub index: Option<usize>,

    /// Assigned through an instance rather than the class table itself.
    pub instance: bool,

    /// Seeded from a table constructor entry, as opposed to a later
    /// assignment.
    pub from_literal: bool,

    /// Built while walking a function body rather than module-level code.
    pub function_level: bool,

    pub defining_module: Option<StrId>,
}

impl ExpressionInfo {
    pub fn new(uid: ExprId, expression: Expression) -> Self {
        ExpressionInfo {
            uid,
            expression,
            index: None,
            instance: false,
            from_literal: false,
            function_level: false,
            defining_module: None,
        }
    }

    #[inline]
    pub fn as_reference(&self) -> Option<RefId> {
        self.expression.as_reference()
    }

    #[inline]
    pub fn as_literal(&self) -> Option<&LiteralExpression> {
        match &self.expression {
            Expression::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    pub fn as_literal_table(&self) -> Option<TableId> {
        self.as_literal().and_then(|literal| literal.table_id)
    }

    pub fn as_literal_function(&self) -> Option<FunctionId> {
        self.as_literal().and_then(|literal| literal.function_id)
    }
}
