pub mod analysis_result;
pub mod analyzed_module;
pub mod diagnostic;
pub mod expression;
pub mod function_info;
pub mod ids;
pub mod resolved_module;
pub mod scope;
pub mod table_info;
pub mod ttype;

pub use luana_str::{Interner, StrId};
