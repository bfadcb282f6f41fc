//! Classification of foreign enums.

use tandem_foreign::{EnumExtensibility, ForeignContext, ForeignDeclId, ForeignDeclKind};

use crate::config::{CountingRunRule, ImporterOptions};
use crate::words::camel_case_words;

/// How a foreign enum is represented in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumKind {
    /// A closed set of cases.
    Enum,
    /// A flag set wrapping the raw integer.
    Options,
    /// A distinct raw-value wrapper type plus module-level constants.
    Unknown,
    /// Plain integer constants; the enum type is its integer type.
    Constants,
}

const OPTIONS_MACROS: &[&str] = &["NS_OPTIONS", "CF_OPTIONS"];
const ENUM_MACROS: &[&str] = &["NS_ENUM", "CF_ENUM", "NS_CLOSED_ENUM", "CF_CLOSED_ENUM"];

/// Decides how the enum `decl` is imported.
///
/// Annotations are consulted before the flag-set heuristic: a flag-enum
/// attribute or an options macro gives [`EnumKind::Options`], a closed
/// extensibility attribute or an enum macro gives [`EnumKind::Enum`], and an
/// explicit constants request gives [`EnumKind::Constants`]. Unannotated
/// enums whose values look like independent bits are options; the rest are
/// [`EnumKind::Unknown`] unless the session imports those as constants.
pub fn classify_enum(foreign: &ForeignContext, decl: ForeignDeclId, options: &ImporterOptions) -> EnumKind {
    let enum_decl = foreign.decl(decl);
    if enum_decl.is_anonymous() {
        return EnumKind::Constants;
    }
    let attrs = &enum_decl.attrs;
    let macro_name = attrs.enum_macro.as_deref();

    if attrs.flag_enum || macro_name.map_or(false, |name| OPTIONS_MACROS.contains(&name)) {
        return EnumKind::Options;
    }
    if attrs.enum_extensibility.is_some() || macro_name.map_or(false, |name| ENUM_MACROS.contains(&name)) {
        return match attrs.enum_extensibility {
            Some(EnumExtensibility::Open) if macro_name.is_none() => EnumKind::Unknown,
            _ => EnumKind::Enum,
        };
    }
    if attrs.import_as_constants {
        return EnumKind::Constants;
    }

    let values = constant_values(foreign, decl);
    if looks_like_flag_set(&values, options) {
        log::trace!("enum `{}` classified as options by its values", enum_decl.name);
        return EnumKind::Options;
    }
    if options.import_unknown_enums_as_constants {
        EnumKind::Constants
    } else {
        EnumKind::Unknown
    }
}

fn constant_values(foreign: &ForeignContext, decl: ForeignDeclId) -> Vec<i64> {
    foreign
        .decl(decl)
        .members()
        .iter()
        .filter_map(|constant| match foreign.decl(*constant).kind {
            ForeignDeclKind::EnumConstant { value } => Some(value),
            _ => None,
        })
        .collect()
}

/// The flag-set heuristic: enough nonzero values, each a single bit or (when
/// allowed) a union of bits seen before it, and not a counting run that the
/// policy's [`CountingRunRule`] rejects.
fn looks_like_flag_set(values: &[i64], options: &ImporterOptions) -> bool {
    let policy = &options.flag_set;
    let nonzero: Vec<i64> = values.iter().copied().filter(|value| *value != 0).collect();
    if nonzero.len() < policy.min_nonzero_constants.max(1) {
        return false;
    }
    let mut seen_bits: i64 = 0;
    for value in &nonzero {
        if *value < 0 {
            return false;
        }
        let is_single_bit = value & (value - 1) == 0;
        let is_union = policy.allow_bitwise_or_combinations && value & !seen_bits == 0;
        if !is_single_bit && !is_union {
            return false;
        }
        seen_bits |= value;
    }
    match policy.counting_runs {
        CountingRunRule::Never => true,
        CountingRunRule::FromZero => !(values.contains(&0) && is_counting_run(values)),
        CountingRunRule::Always => !is_counting_run(values),
    }
}

/// `true` when the distinct values are consecutive integers, e.g. `{0, 1, 2}`.
fn is_counting_run(values: &[i64]) -> bool {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len() > 1 && sorted.windows(2).all(|pair| pair[1] == pair[0] + 1)
}

/// Longest run of whole leading words shared by every available constant of
/// the enum. A lone constant is compared with the enum's own name.
///
/// Returns the prefix text (possibly empty).
pub fn compute_enum_constant_name_prefix(foreign: &ForeignContext, decl: ForeignDeclId) -> String {
    let enum_decl = foreign.decl(decl);
    let names: Vec<&str> = enum_decl
        .members()
        .iter()
        .map(|constant| foreign.decl(*constant))
        .filter(|constant| !constant.attrs.is_unavailable())
        .map(|constant| constant.name.as_str())
        .collect();

    let mut candidates = names.clone();
    match names.len() {
        0 => return String::new(),
        1 if enum_decl.is_anonymous() => return String::new(),
        1 => candidates.push(enum_decl.name.as_str()),
        _ => {}
    }

    let split: Vec<_> = candidates.iter().map(|name| camel_case_words(name)).collect();
    let first = &split[0];
    let mut common = 0;
    'words: while common < first.len() {
        for words in &split[1..] {
            if words.get(common) != Some(&first[common]) {
                break 'words;
            }
        }
        common += 1;
    }
    first[..common].concat()
}
