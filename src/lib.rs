//! # admincrud
//!
//! Building blocks for admin CMS backends whose dozens of near-identical
//! REST resources (category, workout, exercise, playlist, ...) all need the
//! same things: a dynamic WHERE-clause builder with enum validation, a
//! snake_case⇄camelCase field converter with per-field value processors, a
//! lenient query-parameter parser, and a validated CRUD/pagination engine
//! returning one uniform result envelope.
//!
//! Route wiring, authentication and connection pooling stay outside; every
//! database interaction goes through `sea_orm::ConnectionTrait` and callers
//! keep multi-statement atomicity via `sea_orm::TransactionTrait`.
//!
//! ```rust,ignore
//! use admincrud::{ConditionBuilder, CrudEngine, PaginateOptions, smart_keyword_condition};
//!
//! let mut base = ConditionBuilder::with_enums(engine.enums());
//! base.add_array_condition("status", status_list.as_deref(), Some("StatusEnum"))?;
//!
//! let filter = smart_keyword_condition(&db, "cms_workout", params.keywords.as_deref(),
//!     "id", "name", &base).await?;
//! let outcome = engine
//!     .paginate_with_validation(&db, "cms_workout", &params,
//!         &PaginateOptions::new(filter.build(), &["id", "name", "create_time"]))
//!     .await?;
//! ```

pub mod convert;
pub mod database;
pub mod engine;
pub mod enums;
pub mod errors;
pub mod filtering;
pub mod models;
pub mod params;

pub use convert::{ConvertOptions, to_api_record, to_api_records, to_camel, to_db_record, to_snake};
pub use engine::{CrudEngine, FieldKind, FieldRule, PaginateOptions, RuleSet, TableRules};
pub use enums::{ArrayValidation, EnumDefinition, EnumEntry, EnumRegistry};
pub use errors::CrudError;
pub use filtering::{ConditionBuilder, Connector, WhereClause, smart_keyword_condition};
pub use models::{CrudOutcome, ListParams, PageEnvelope};
pub use params::{Pagination, SortDirection, clamp, parse_array_param, parse_pagination, parse_sort};
