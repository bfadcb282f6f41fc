//! Importer configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ImportError, ImportResult};

/// Integer and floating-point model of the compilation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetModel {
    pub int_bits: u32,
    pub long_bits: u32,
    pub pointer_bits: u32,
    /// Whether `long double` is the x87 80-bit extended format.
    pub has_x87_float80: bool,
}

impl Default for TargetModel {
    /// LP64 with x87 extended `long double` (x86_64 Darwin).
    fn default() -> Self {
        Self { int_bits: 32, long_bits: 64, pointer_bits: 64, has_x87_float80: true }
    }
}

/// Tunable thresholds for the "looks like a flag set" heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagSetPolicy {
    /// Minimum number of nonzero constants before the heuristic may fire.
    pub min_nonzero_constants: usize,
    /// Accept values that are the bitwise OR of previously seen values.
    pub allow_bitwise_or_combinations: bool,
    /// When consecutive values such as `{0, 1, 2}` disqualify an otherwise
    /// bit-shaped enum.
    pub counting_runs: CountingRunRule,
}

impl Default for FlagSetPolicy {
    fn default() -> Self {
        Self {
            min_nonzero_constants: 2,
            allow_bitwise_or_combinations: true,
            counting_runs: CountingRunRule::FromZero,
        }
    }
}

/// Which runs of consecutive values read as a counter rather than flags.
///
/// `{0, 1, 2}` is almost always an ordinary enumeration that happens to
/// start with two single-bit values. `{1, 2}` is as likely to be two flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountingRunRule {
    /// Consecutive values never disqualify a flag set.
    Never,
    /// Only runs that include zero disqualify.
    FromZero,
    /// Any run of two or more consecutive values disqualifies.
    Always,
}

/// Options controlling one import session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterOptions {
    /// Shorten names by dropping words restated by their types.
    pub omit_needless_words: bool,
    /// Carried for hosts that synthesize default arguments; the engine
    /// itself only records it.
    pub infer_default_arguments: bool,
    /// Import `@class` / `@protocol` forward declarations that never receive
    /// a definition as empty types instead of skipping them.
    pub import_forward_declarations: bool,
    /// Build per-module lookup tables when modules are added.
    pub use_lookup_tables: bool,
    /// Import enums that have no classification evidence as plain integer
    /// constants rather than a distinct wrapper type.
    pub import_unknown_enums_as_constants: bool,
    pub target: TargetModel,
    pub flag_set: FlagSetPolicy,
}

impl Default for ImporterOptions {
    fn default() -> Self {
        Self {
            omit_needless_words: true,
            infer_default_arguments: false,
            import_forward_declarations: false,
            use_lookup_tables: true,
            import_unknown_enums_as_constants: false,
            target: TargetModel::default(),
            flag_set: FlagSetPolicy::default(),
        }
    }
}

impl ImporterOptions {
    /// Parses options from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> ImportResult<Self> {
        toml::from_str(text).map_err(|err| ImportError::ConfigParse { message: err.to_string() })
    }

    /// Reads options from a TOML file.
    pub fn load(path: &Path) -> ImportResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| ImportError::ConfigRead { path: path.to_path_buf(), message: err.to_string() })?;
        Self::from_toml_str(&text)
    }
}
