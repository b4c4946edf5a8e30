//! Field-aware search expressions over records.
//!
//! A [`Plan`] declares the searchable fields; [`parse_expression`] turns text such as
//! `status:open AND (age:18-30 OR vip:true)` into a tree that can be matched against any
//! [`Record`].

pub mod config;
pub mod convert;
pub mod dsl;
pub mod error;
pub mod plan;
pub mod record;
pub mod value;

pub use dsl::{LogicalNode, Parser, Scope, parse_expression};
pub use error::{Result, SearchError};
pub use plan::{Field, Plan};
pub use record::{JsonRecord, MapRecord, Record};
pub use value::{FieldType, Value};
