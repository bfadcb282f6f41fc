//! Attributes attached to foreign declarations, either written in the header
//! or supplied by API notes.

use serde::{Deserialize, Serialize};

use crate::ty::Nullability;

/// Whether a C enum was declared as a closed set of cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnumExtensibility {
    /// `enum_extensibility(closed)`: the listed cases are exhaustive.
    Closed,
    /// `enum_extensibility(open)`: further cases may appear later.
    Open,
}

/// Explicit instruction on whether a class method should be imported as an
/// initializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactoryAsInit {
    /// Infer from the selector shape.
    Infer,
    /// Always import as an initializer.
    Always,
    /// Never import as an initializer.
    Never,
}

/// The attribute set of one foreign declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignAttrs {
    /// A user-supplied host name (`swift_name`-style rename), e.g.
    /// `"insert(_:at:)"`.
    pub custom_name: Option<String>,
    /// `flag_enum`: the enum is a set of independent bits.
    pub flag_enum: bool,
    /// Explicit closed/open annotation on an enum.
    pub enum_extensibility: Option<EnumExtensibility>,
    /// Name of the declaring macro when the enum was written through one of
    /// the conventional macros (`NS_ENUM`, `NS_OPTIONS`, `CF_ENUM`, ...).
    pub enum_macro: Option<String>,
    /// Request that the enum's constants import as plain integers.
    pub import_as_constants: bool,
    /// The declaration is unavailable; the message explains why.
    pub unavailable: Option<String>,
    /// Factory-method handling for class methods.
    pub factory_as_init: Option<FactoryAsInit>,
    /// `objc_designated_initializer`.
    pub designated_initializer: bool,
    /// The initializer is required of subclasses.
    pub required_initializer: bool,
    /// The function or declaration sits inside a CF-audited region.
    pub cf_audited: bool,
    /// The record or typedef names a CF reference-counted class.
    pub cf_type: bool,
    /// `CF_RETURNS_RETAINED` (`Some(true)`) or `CF_RETURNS_NOT_RETAINED`
    /// (`Some(false)`) on a result or out-parameter.
    pub returns_retained: Option<bool>,
    /// Nullability supplied out-of-line (API notes) for a result or property.
    pub nullability: Option<Nullability>,
}

impl ForeignAttrs {
    /// Returns `true` if the declaration carries an unavailable attribute.
    pub fn is_unavailable(&self) -> bool {
        self.unavailable.is_some()
    }
}
