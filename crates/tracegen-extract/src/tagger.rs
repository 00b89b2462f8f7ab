//! Candidate tagging.
//!
//! Every method of the program model gets a complete [`TagSet`]: one boolean
//! per [`Tag`], computed from the method descriptor, its body shape, and the
//! classifier's verdict on its call sites.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use tracing::info;

use crate::classifier::{is_mockable, nested_invocation_map, InvocationKey};
use crate::model::{ModelMethod, ProgramModel};

/// The fixed set of tag properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Returns,
    ReturnsPrimitives,
    Void,
    Parameters,
    PrimitiveParameters,
    Static,
    Abstract,
    Accessor,
    Mutator,
    LocalVariables,
    Conditionals,
    Ifs,
    Loops,
    Switches,
    MultipleStatements,
    Synchronization,
    HasNestedInvocations,
    MockingCandidate,
}

impl Tag {
    pub const ALL: [Tag; 18] = [
        Tag::Returns,
        Tag::ReturnsPrimitives,
        Tag::Void,
        Tag::Parameters,
        Tag::PrimitiveParameters,
        Tag::Static,
        Tag::Abstract,
        Tag::Accessor,
        Tag::Mutator,
        Tag::LocalVariables,
        Tag::Conditionals,
        Tag::Ifs,
        Tag::Loops,
        Tag::Switches,
        Tag::MultipleStatements,
        Tag::Synchronization,
        Tag::HasNestedInvocations,
        Tag::MockingCandidate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Returns => "returns",
            Tag::ReturnsPrimitives => "returns_primitives",
            Tag::Void => "void",
            Tag::Parameters => "parameters",
            Tag::PrimitiveParameters => "primitive_parameters",
            Tag::Static => "static",
            Tag::Abstract => "abstract",
            Tag::Accessor => "accessor",
            Tag::Mutator => "mutator",
            Tag::LocalVariables => "local_variables",
            Tag::Conditionals => "conditionals",
            Tag::Ifs => "ifs",
            Tag::Loops => "loops",
            Tag::Switches => "switches",
            Tag::MultipleStatements => "multiple_statements",
            Tag::Synchronization => "synchronization",
            Tag::HasNestedInvocations => "has_nested_invocations",
            Tag::MockingCandidate => "mocking_candidate",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One boolean per [`Tag`]. Never partial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet {
    values: BTreeMap<Tag, bool>,
}

impl Default for TagSet {
    fn default() -> Self {
        Self {
            values: Tag::ALL.iter().map(|&t| (t, false)).collect(),
        }
    }
}

impl TagSet {
    pub fn get(&self, tag: Tag) -> bool {
        self.values.get(&tag).copied().unwrap_or(false)
    }

    pub fn set(&mut self, tag: Tag, value: bool) {
        self.values.insert(tag, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tag, bool)> + '_ {
        self.values.iter().map(|(&t, &v)| (t, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for TagSet {
    /// `{returns=true, void=false, ...}`, the form the capture tooling reads.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (tag, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", tag, value)?;
        }
        f.write_str("}")
    }
}

/// Tags for one method plus the call sites that made it a mocking candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedMethod {
    pub signature: String,
    pub tags: TagSet,
    pub mockable_invocations: Vec<InvocationKey>,
}

/// Tag sets for a whole program model, keyed by method signature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagTable {
    pub methods: BTreeMap<String, TaggedMethod>,
    /// Model entries that could not be tagged
    pub skipped: usize,
}

impl TagTable {
    pub fn get(&self, signature: &str) -> Option<&TaggedMethod> {
        self.methods.get(signature)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn count(&self, tag: Tag) -> usize {
        self.methods.values().filter(|m| m.tags.get(tag)).count()
    }
}

const ACCESSOR_PREFIXES: &[&str] = &["get", "is"];
const MUTATOR_PREFIX: &str = "set";

/// Compute the tag set of a single method.
pub fn tag_method(method: &ModelMethod) -> TagSet {
    let d = &method.descriptor;
    let body = &method.body;
    let mut tags = TagSet::default();

    tags.set(Tag::Returns, !d.is_void());
    tags.set(Tag::ReturnsPrimitives, d.returns_primitive());
    tags.set(Tag::Void, d.is_void());
    tags.set(Tag::Parameters, d.has_params());
    tags.set(Tag::PrimitiveParameters, d.has_only_primitive_params());
    tags.set(Tag::Static, d.modifiers.is_static);
    tags.set(
        Tag::Abstract,
        d.modifiers.is_abstract || !d.declaring_type.is_instantiable(),
    );

    let simple_body = body.statements <= 1;
    tags.set(
        Tag::Accessor,
        ACCESSOR_PREFIXES.iter().any(|p| has_bean_prefix(&d.name, p))
            && !d.has_params()
            && !d.is_void()
            && simple_body,
    );
    tags.set(
        Tag::Mutator,
        has_bean_prefix(&d.name, MUTATOR_PREFIX)
            && d.parameters.len() == 1
            && d.is_void()
            && simple_body,
    );

    tags.set(Tag::LocalVariables, body.local_variables > 0);
    tags.set(Tag::Conditionals, body.conditionals > 0);
    tags.set(Tag::Ifs, body.ifs > 0);
    tags.set(Tag::Loops, body.loops > 0);
    tags.set(Tag::Switches, body.switches > 0);
    tags.set(Tag::MultipleStatements, body.statements > 1);
    tags.set(
        Tag::Synchronization,
        d.modifiers.is_synchronized || body.synchronized_blocks > 0,
    );

    tags.set(Tag::HasNestedInvocations, !method.invocations.is_empty());
    let any_mockable = method.invocations.iter().any(is_mockable);
    tags.set(
        Tag::MockingCandidate,
        any_mockable && d.declaring_type.is_instantiable(),
    );

    tags
}

/// `getX` / `isX`, but not `getaway` or a bare `get`.
fn has_bean_prefix(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.chars().next())
        .map(|c| c.is_uppercase())
        .unwrap_or(false)
}

/// Tag every method of a program model.
pub fn tag_all(model: &ProgramModel) -> TagTable {
    let start = Instant::now();
    let mut table = TagTable {
        methods: BTreeMap::new(),
        skipped: model.diagnostics().len(),
    };

    for method in model.methods() {
        let tags = tag_method(method);
        let mockable_invocations = if tags.get(Tag::MockingCandidate) {
            nested_invocation_map(method).into_keys().collect()
        } else {
            Vec::new()
        };
        let signature = method.signature();
        table.methods.insert(
            signature.clone(),
            TaggedMethod {
                signature,
                tags,
                mockable_invocations,
            },
        );
    }

    info!(
        methods = table.len(),
        skipped = table.skipped,
        mocking_candidates = table.count(Tag::MockingCandidate),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "tagged program model"
    );
    table
}
