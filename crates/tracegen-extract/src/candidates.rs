//! Candidate selection.
//!
//! Two filters sit on top of the tag table:
//! - [`is_candidate`]: methods a test can be synthesized for at all
//! - [`is_instrumentation_candidate`]: candidates with enough behaviour in
//!   their body to be worth recording at runtime

use tracegen_types::Visibility;

use crate::model::{ModelMethod, ProgramModel};
use crate::tagger::{Tag, TagSet, TagTable};

/// Knobs for candidate selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionOptions {
    /// Also accept methods that return no value
    pub include_void: bool,
}

/// Whether a method can be the subject of a trace-based test.
pub fn is_candidate(method: &ModelMethod, options: SelectionOptions) -> bool {
    let d = &method.descriptor;
    d.visibility == Visibility::Public
        && !d.modifiers.is_static
        && !d.modifiers.is_abstract
        && !d.modifiers.is_native
        && method.body.statements > 0
        && d.declaring_type.is_instantiable()
        && (!d.is_void() || options.include_void)
}

const BEHAVIOUR_TAGS: &[Tag] = &[
    Tag::MultipleStatements,
    Tag::Ifs,
    Tag::Conditionals,
    Tag::Parameters,
    Tag::Switches,
    Tag::Loops,
    Tag::LocalVariables,
];

/// Non-static methods showing at least one kind of body behaviour.
pub fn is_instrumentation_candidate(tags: &TagSet) -> bool {
    !tags.get(Tag::Static) && BEHAVIOUR_TAGS.iter().any(|&t| tags.get(t))
}

/// Candidate methods of a model, in signature order.
pub fn select_candidates<'m>(
    model: &'m ProgramModel,
    options: SelectionOptions,
) -> Vec<&'m ModelMethod> {
    let mut selected: Vec<&ModelMethod> = model
        .methods()
        .iter()
        .filter(|m| is_candidate(m, options))
        .collect();
    selected.sort_by_key(|m| m.signature());
    selected
}

/// Candidates that also pass the instrumentation filter.
pub fn select_instrumentation_candidates<'m>(
    model: &'m ProgramModel,
    table: &TagTable,
    options: SelectionOptions,
) -> Vec<&'m ModelMethod> {
    select_candidates(model, options)
        .into_iter()
        .filter(|m| {
            table
                .get(&m.signature())
                .map(|t| is_instrumentation_candidate(&t.tags))
                .unwrap_or(false)
        })
        .collect()
}
