//! Recognizing initializers, factory methods and subscript accessors among
//! Objective-C methods.

use tandem_foreign::{FactoryAsInit, ForeignContext, ForeignDeclId, ForeignDeclKind, ForeignType, Selector};
use tandem_host::InitKind;

use crate::name::ImportNameOptions;
use crate::words::{camel_case_words, words_match};

/// A method that imports as an initializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializerMatch {
    /// Number of leading words of the first selector piece that the
    /// initializer name consumes (`init`, `initWith`, `personWith`).
    pub prefix_length: usize,
    pub kind: InitKind,
}

/// Kind and requiredness of an imported initializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedInitializer {
    pub kind: InitKind,
    pub is_required: bool,
}

/// Decides whether `method` imports as an initializer.
///
/// Instance methods qualify when their first selector piece starts with the
/// word `init`. Class methods qualify when their first piece restates the
/// owning class name (or a trailing part of it) and they return an instance
/// of the class, unless `options` suppresses factory initializers or the
/// method is annotated otherwise.
pub fn should_import_as_initializer(
    foreign: &ForeignContext,
    method: ForeignDeclId,
    options: ImportNameOptions,
) -> Option<InitializerMatch> {
    let decl = foreign.decl(method);
    let ForeignDeclKind::ObjCMethod { selector, result, is_instance, .. } = &decl.kind else {
        return None;
    };
    let words = camel_case_words(selector.first_piece());

    if *is_instance {
        if words.first() != Some(&"init") {
            return None;
        }
        return Some(InitializerMatch { prefix_length: 1 + with_word_after(&words, 1), kind: InitKind::Designated });
    }

    let factory = decl.attrs.factory_as_init.unwrap_or(FactoryAsInit::Infer);
    if factory == FactoryAsInit::Never {
        return None;
    }
    if factory == FactoryAsInit::Infer && options.contains(ImportNameOptions::SUPPRESS_FACTORY_METHOD_AS_INIT) {
        return None;
    }
    let class = foreign.enclosing_container(method).and_then(|container| foreign.container_class(container))?;
    let restated = restated_class_words(&words, foreign.name_of(class));

    match restated {
        Some(count) if factory == FactoryAsInit::Always || returns_instance_of(foreign, result, class) => {
            Some(InitializerMatch { prefix_length: count + with_word_after(&words, count), kind: InitKind::Designated })
        }
        None if factory == FactoryAsInit::Always => Some(InitializerMatch { prefix_length: 0, kind: InitKind::Designated }),
        _ => None,
    }
}

fn with_word_after(words: &[&str], index: usize) -> usize {
    usize::from(words.get(index) == Some(&"With"))
}

/// Number of leading method words that restate a trailing run of the class
/// name's words, provided the restatement is followed by `With` or nothing.
fn restated_class_words(method_words: &[&str], class_name: &str) -> Option<usize> {
    let class_words = camel_case_words(class_name);
    (1..=class_words.len().min(method_words.len())).rev().find(|count| {
        let class_tail = &class_words[class_words.len() - count..];
        let restates = method_words[..*count].iter().zip(class_tail).all(|(m, c)| words_match(m, c));
        let follower = method_words.get(*count);
        restates && (follower.is_none() || follower == Some(&"With"))
    })
}

fn returns_instance_of(foreign: &ForeignContext, result: &ForeignType, class: ForeignDeclId) -> bool {
    match result.strip_nullability().0 {
        ForeignType::InstanceType => true,
        ForeignType::ObjCObjectPointer { class: Some(returned), .. } => {
            foreign.canonical(*returned) == foreign.canonical(class)
        }
        _ => false,
    }
}

/// Derives the initializer kind of `method` from its attributes and those of
/// its siblings. Factory methods always become convenience factories. When a
/// class marks any initializer designated, the unmarked ones are
/// convenience initializers; otherwise all of them are designated.
pub fn resolve_initializer_kind(foreign: &ForeignContext, method: ForeignDeclId, is_factory: bool) -> ResolvedInitializer {
    let decl = foreign.decl(method);
    let is_required = decl.attrs.required_initializer;
    if is_factory {
        return ResolvedInitializer { kind: InitKind::ConvenienceFactory, is_required };
    }
    if decl.attrs.designated_initializer {
        return ResolvedInitializer { kind: InitKind::Designated, is_required };
    }
    let class_marks_designated = foreign
        .enclosing_container(method)
        .and_then(|container| foreign.container_class(container))
        .and_then(|class| foreign.definition_of(class))
        .map_or(false, |class| {
            foreign.decl(class).members().iter().any(|member| foreign.decl(*member).attrs.designated_initializer)
        });
    let kind = if class_marks_designated { InitKind::Convenience } else { InitKind::Designated };
    ResolvedInitializer { kind, is_required }
}

/// One half of an Objective-C subscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptRole {
    IndexedGetter,
    IndexedSetter,
    KeyedGetter,
    KeyedSetter,
}

impl SubscriptRole {
    pub fn is_getter(self) -> bool {
        matches!(self, SubscriptRole::IndexedGetter | SubscriptRole::KeyedGetter)
    }

    /// The selector of the other half of the subscript.
    pub fn counterpart_selector(self) -> &'static str {
        match self {
            SubscriptRole::IndexedGetter => "setObject:atIndexedSubscript:",
            SubscriptRole::IndexedSetter => "objectAtIndexedSubscript:",
            SubscriptRole::KeyedGetter => "setObject:forKeyedSubscript:",
            SubscriptRole::KeyedSetter => "objectForKeyedSubscript:",
        }
    }
}

/// Recognizes the four canonical subscript selectors.
pub fn subscript_role(selector: &Selector) -> Option<SubscriptRole> {
    match selector.to_string().as_str() {
        "objectAtIndexedSubscript:" => Some(SubscriptRole::IndexedGetter),
        "setObject:atIndexedSubscript:" => Some(SubscriptRole::IndexedSetter),
        "objectForKeyedSubscript:" => Some(SubscriptRole::KeyedGetter),
        "setObject:forKeyedSubscript:" => Some(SubscriptRole::KeyedSetter),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_must_be_a_whole_word() {
        let mut foreign = ForeignContext::new();
        let module = foreign.add_module("Test");
        let class = foreign.add_class(module, "Widget", None);
        let init = foreign.add_method(class, "initWithFrame:", Vec::new(), ForeignType::InstanceType, true);
        let initialize = foreign.add_method(class, "initialize", Vec::new(), ForeignType::void(), true);

        let matched = should_import_as_initializer(&foreign, init, ImportNameOptions::empty()).unwrap();
        assert_eq!(matched.prefix_length, 2);
        assert_eq!(should_import_as_initializer(&foreign, initialize, ImportNameOptions::empty()), None);
    }

    #[test]
    fn abbreviated_class_names_restate() {
        let mut foreign = ForeignContext::new();
        let module = foreign.add_module("Test");
        let class = foreign.add_class(module, "NSColor", None);
        let factory = foreign.add_method(class, "colorWithWhite:", Vec::new(), ForeignType::InstanceType, false);
        let other = foreign.add_method(class, "colorNamed:", Vec::new(), ForeignType::InstanceType, false);

        let matched = should_import_as_initializer(&foreign, factory, ImportNameOptions::empty()).unwrap();
        assert_eq!(matched.prefix_length, 2);
        assert_eq!(should_import_as_initializer(&foreign, other, ImportNameOptions::empty()), None);
        assert_eq!(
            should_import_as_initializer(&foreign, factory, ImportNameOptions::SUPPRESS_FACTORY_METHOD_AS_INIT),
            None
        );
    }

    #[test]
    fn recognizes_subscript_selectors() {
        assert_eq!(
            subscript_role(&Selector::parse("objectForKeyedSubscript:")),
            Some(SubscriptRole::KeyedGetter)
        );
        assert_eq!(subscript_role(&Selector::parse("objectAtIndex:")), None);
    }
}
