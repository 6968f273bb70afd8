use std::hash::BuildHasherDefault;

use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};

mod str_macro;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct StrId(pub u32);

interned_strings! {
    EMPTY, 0 => "",
    SELF, 1 => "self",
    PUBL, 2 => "publ",
    NEW, 3 => "new",
    DERIVE, 4 => "derive",
    REQUIRE, 5 => "require",
    SETMETATABLE, 6 => "setmetatable",
    INDEX_METAMETHOD, 7 => "__index",
    CALL_METAMETHOD, 8 => "__call",
    ATOM_UI_CLASS, 9 => "_ATOM_UI_CLASS",
    TONUMBER, 10 => "tonumber",
    TOSTRING, 11 => "tostring",
    GET_TEXT, 12 => "getText",
    GET_TEXT_OR_NULL, 13 => "getTextOrNull",
    JAVA_OBJ, 14 => "javaObj",
    CHILDREN, 15 => "children",
    SUPER, 16 => "super",
    TYPE_FIELD, 17 => "Type",
    NIL, 18 => "nil",
    BOOLEAN, 19 => "boolean",
    STRING, 20 => "string",
    NUMBER, 21 => "number",
    TABLE, 22 => "table",
    FUNCTION, 23 => "function",
    UNKNOWN, 24 => "unknown",
    TRUE, 25 => "true",
    FALSE, 26 => "false",
    ARGS, 27 => "args",
    OVERLOAD, 28 => "overload",
}

impl StrId {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Interner {
    map: IndexSet<String, BuildHasherDefault<FxHasher>>,
}

impl Interner {
    /// Get the id corresponding to `name`.
    ///
    /// If `name` does not exists in `self`, returns [`None`].
    pub fn get(&self, name: &str) -> Option<StrId> {
        self.map.get_index_of(name).map(|i| StrId(i as u32))
    }

    /// Insert `name` in `self`.
    ///
    /// - If `name` already exists in `self`, returns its associated id;
    /// - Else, returns a newly allocated id.
    pub fn intern(&mut self, name: String) -> StrId {
        let (id, _added) = self.map.insert_full(name);
        assert!(id < u32::MAX as usize);
        StrId(id as u32)
    }

    pub fn intern_str(&mut self, name: &str) -> StrId {
        if let Some(id) = self.get(name) {
            return id;
        }

        self.intern(name.to_string())
    }

    /// Returns the string corresponding to `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not exists in `self`.
    pub fn lookup(&self, id: &StrId) -> &str {
        self.map.get_index(id.0 as usize).unwrap()
    }

    pub fn get_map(&self) -> FxHashMap<String, StrId> {
        self.map
            .iter()
            .enumerate()
            .map(|(k, v)| (v.clone(), StrId(k as u32)))
            .collect()
    }
}
