use std::hash::BuildHasherDefault;

use indexmap::IndexSet;
use itertools::Itertools;
use luana_str::StrId;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use crate::ids::{FunctionId, TableId};

/// One possible type of an expression. The closed primitive domain plus
/// opaque references into the arenas; `Unknown` is explicitly unresolved and
/// distinct from the empty set (absent information).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TypeToken {
    Nil,
    Boolean,
    True,
    False,
    String,
    Number,
    Table,
    Function,
    Unknown,
    TableRef(TableId),
    FunctionRef(FunctionId),
    /// Marks a value obtained through a constructor or `setmetatable`, so
    /// that member assignments attach as instance fields.
    Instance,
    Class(StrId),
}

/// Insertion-ordered so downstream emission is deterministic.
pub type TypeSet = IndexSet<TypeToken, BuildHasherDefault<FxHasher>>;

pub const MASK_BOOLEAN: u8 = 1;
pub const MASK_FUNCTION: u8 = 2;
pub const MASK_NUMBER: u8 = 4;
pub const MASK_STRING: u8 = 8;
pub const MASK_TABLE: u8 = 16;
pub const MASK_ALL: u8 =
    MASK_BOOLEAN | MASK_FUNCTION | MASK_NUMBER | MASK_STRING | MASK_TABLE;

impl TypeToken {
    /// Internal key for diagnostics and tests; the rendered arena ids never
    /// reach public output.
    pub fn get_key(&self) -> String {
        match self {
            TypeToken::Nil => "nil".to_string(),
            TypeToken::Boolean => "boolean".to_string(),
            TypeToken::True => "true".to_string(),
            TypeToken::False => "false".to_string(),
            TypeToken::String => "string".to_string(),
            TypeToken::Number => "number".to_string(),
            TypeToken::Table => "table".to_string(),
            TypeToken::Function => "function".to_string(),
            TypeToken::Unknown => "unknown".to_string(),
            TypeToken::TableRef(id) => format!("@table({})", id.0),
            TypeToken::FunctionRef(id) => format!("@function({})", id.0),
            TypeToken::Instance => "@instance".to_string(),
            TypeToken::Class(_) => "@class".to_string(),
        }
    }

    /// The usage-mask bit this token falls under, or 0 when no usage can
    /// vouch for it (`nil` and `unknown` survive no narrowing).
    pub fn usage_bit(&self) -> u8 {
        match self {
            TypeToken::Boolean | TypeToken::True | TypeToken::False => MASK_BOOLEAN,
            TypeToken::Function | TypeToken::FunctionRef(_) => MASK_FUNCTION,
            TypeToken::Number => MASK_NUMBER,
            TypeToken::String => MASK_STRING,
            TypeToken::Table
            | TypeToken::TableRef(_)
            | TypeToken::Instance
            | TypeToken::Class(_) => MASK_TABLE,
            TypeToken::Nil | TypeToken::Unknown => 0,
        }
    }
}

#[inline]
pub fn wrap_token(token: TypeToken) -> TypeSet {
    let mut types = TypeSet::default();
    types.insert(token);
    types
}

#[inline]
pub fn get_nil() -> TypeSet {
    wrap_token(TypeToken::Nil)
}

#[inline]
pub fn get_boolean() -> TypeSet {
    wrap_token(TypeToken::Boolean)
}

#[inline]
pub fn get_true() -> TypeSet {
    wrap_token(TypeToken::True)
}

#[inline]
pub fn get_false() -> TypeSet {
    wrap_token(TypeToken::False)
}

#[inline]
pub fn get_string() -> TypeSet {
    wrap_token(TypeToken::String)
}

#[inline]
pub fn get_number() -> TypeSet {
    wrap_token(TypeToken::Number)
}

#[inline]
pub fn get_table() -> TypeSet {
    wrap_token(TypeToken::Table)
}

#[inline]
pub fn get_function() -> TypeSet {
    wrap_token(TypeToken::Function)
}

#[inline]
pub fn get_unknown() -> TypeSet {
    wrap_token(TypeToken::Unknown)
}

/// `|`-joined internal key of a set, for diagnostics.
pub fn get_key(types: &TypeSet) -> String {
    types.iter().map(|token| token.get_key()).join("|")
}

pub fn combine(target: &mut TypeSet, other: &TypeSet) {
    for token in other {
        target.insert(*token);
    }
}

/// `{true, false}` is just `boolean`.
pub fn collapse_booleans(types: &mut TypeSet) {
    if types.contains(&TypeToken::True) && types.contains(&TypeToken::False) {
        types.shift_remove(&TypeToken::True);
        types.shift_remove(&TypeToken::False);
        types.insert(TypeToken::Boolean);
    }
}

pub fn single_table_ref(types: &TypeSet) -> Option<TableId> {
    if types.len() != 1 {
        return None;
    }

    match types.first() {
        Some(TypeToken::TableRef(id)) => Some(*id),
        _ => None,
    }
}

pub fn single_function_ref(types: &TypeSet) -> Option<FunctionId> {
    if types.len() != 1 {
        return None;
    }

    match types.first() {
        Some(TypeToken::FunctionRef(id)) => Some(*id),
        _ => None,
    }
}

pub fn table_refs(types: &TypeSet) -> Vec<TableId> {
    types
        .iter()
        .filter_map(|token| match token {
            TypeToken::TableRef(id) => Some(*id),
            _ => None,
        })
        .collect()
}

/// Narrow `types` by a usage mask. A mask equal to the full universe carries
/// no information; a mask that would empty the set leaves it unchanged.
pub fn narrow_by_mask(types: &mut TypeSet, mask: u8) {
    if mask == MASK_ALL || types.len() <= 1 {
        return;
    }

    let narrowed: TypeSet = types
        .iter()
        .filter(|token| token.usage_bit() & mask != 0)
        .copied()
        .collect();

    if !narrowed.is_empty() && narrowed.len() < types.len() {
        *types = narrowed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_paired_boolean_literals() {
        let mut types = get_true();
        combine(&mut types, &get_false());
        collapse_booleans(&mut types);

        assert_eq!(types, get_boolean());
    }

    #[test]
    fn collapse_leaves_lone_literals() {
        let mut types = get_true();
        collapse_booleans(&mut types);

        assert_eq!(types, get_true());
    }

    #[test]
    fn narrowing_is_a_subset_or_unchanged() {
        let mut types = get_string();
        combine(&mut types, &get_number());
        combine(&mut types, &get_nil());

        let before = types.clone();
        narrow_by_mask(&mut types, MASK_NUMBER);

        assert!(types.iter().all(|t| before.contains(t)));
        assert_eq!(types, get_number());
    }

    #[test]
    fn narrowing_never_empties() {
        let mut types = get_nil();
        combine(&mut types, &get_unknown());

        let before = types.clone();
        narrow_by_mask(&mut types, MASK_TABLE);

        assert_eq!(types, before);
    }

    #[test]
    fn keys_join_in_insertion_order() {
        let mut types = get_number();
        combine(&mut types, &get_nil());

        assert_eq!(get_key(&types), "number|nil");
    }

    #[test]
    fn full_mask_is_no_information() {
        let mut types = get_string();
        combine(&mut types, &get_nil());

        let before = types.clone();
        narrow_by_mask(&mut types, MASK_ALL);

        assert_eq!(types, before);
    }
}
