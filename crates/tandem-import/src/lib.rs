#![doc = include_str!("../README.md")]

mod builder;
pub mod config;
pub mod enum_kind;
pub mod error;
pub mod initializer;
pub mod lookup_table;
mod macros;
pub mod name;
pub mod session;
pub mod types;
pub mod words;

pub use config::{CountingRunRule, FlagSetPolicy, ImporterOptions, TargetModel};
pub use enum_kind::EnumKind;
pub use error::{ImportError, ImportResult};
pub use initializer::{InitializerMatch, ResolvedInitializer, SubscriptRole};
pub use lookup_table::LookupTable;
pub use name::{EffectiveContext, ImportNameOptions, ImportedErrorInfo, ImportedName};
pub use session::{ImportSession, VisibleDecls};
pub use types::{ImportTypeKind, MappedCTypeKind, MappedTypeNameKind, MAX_TUPLE_ELEMENTS};
