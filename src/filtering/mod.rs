//! Dynamic WHERE-clause construction.

pub mod conditions;
pub mod search;

pub use conditions::{ConditionBuilder, Connector, Predicate, WhereClause, is_valid_identifier};
pub use search::smart_keyword_condition;
