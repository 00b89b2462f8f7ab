//! Program model loading.
//!
//! The syntax/semantic model of the target program is produced by an external
//! front end and handed over as a JSON document. This module turns that
//! document into immutable [`MethodDescriptor`]s with their call sites already
//! resolved, so nothing downstream performs reflective lookups.
//!
//! Problems local to one method or call site are recorded as
//! [`ModelDiagnostic`]s and the offending entry is skipped. Only an unreadable
//! or syntactically invalid document is an error.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use tracegen_types::{
    BodyShape, DeclaringType, InvocationSite, MethodDescriptor, MethodModifiers, TypeKind,
    Visibility,
};

// =============================================================================
// Document schema
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ModelDocument {
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    /// Raw kind as written by the front end; unknown kinds load as classes
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodDecl {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub body: BodyShape,
    #[serde(default)]
    pub invocations: Vec<CallDecl>,
}

/// A call site with its target already resolved by the front end.
#[derive(Debug, Clone, Deserialize)]
pub struct CallDecl {
    #[serde(default)]
    pub declaring_type: String,
    #[serde(default)]
    pub declaring_type_kind: Option<String>,
    #[serde(default)]
    pub declaring_type_modifiers: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
}

// =============================================================================
// Errors and diagnostics
// =============================================================================

/// Failure to construct the model at all. Aborts the run.
#[derive(Debug)]
pub enum ModelError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { origin: String, message: String },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Io { path, source } => {
                write!(f, "failed to read program model {}: {}", path.display(), source)
            }
            ModelError::Parse { origin, message } => {
                write!(f, "invalid program model {}: {}", origin, message)
            }
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Io { source, .. } => Some(source),
            ModelError::Parse { .. } => None,
        }
    }
}

/// A method or call site that could not be resolved and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDiagnostic {
    /// Where the problem was found, e.g. `org.example.Account#<unnamed>`
    pub location: String,
    pub reason: String,
}

impl fmt::Display for ModelDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.reason)
    }
}

// =============================================================================
// Resolved model
// =============================================================================

/// A method together with the facts gathered from its body.
#[derive(Debug, Clone)]
pub struct ModelMethod {
    pub descriptor: MethodDescriptor,
    pub body: BodyShape,
    pub invocations: Vec<InvocationSite>,
}

impl ModelMethod {
    pub fn signature(&self) -> String {
        self.descriptor.signature()
    }
}

/// Immutable, fully resolved view of the target program.
#[derive(Debug, Clone, Default)]
pub struct ProgramModel {
    methods: Vec<ModelMethod>,
    by_signature: BTreeMap<String, usize>,
    diagnostics: Vec<ModelDiagnostic>,
}

impl ProgramModel {
    /// Load a model document from disk.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw, &path.display().to_string())
    }

    /// Parse a model document; `origin` is only used in error messages.
    pub fn from_json_str(raw: &str, origin: &str) -> Result<Self, ModelError> {
        let doc: ModelDocument = serde_json::from_str(raw).map_err(|e| ModelError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_document(doc))
    }

    pub fn from_document(doc: ModelDocument) -> Self {
        let mut model = ProgramModel::default();

        for ty in doc.types {
            if ty.name.trim().is_empty() {
                model.diagnose("<unnamed type>", "type has no qualified name");
                continue;
            }
            let kind = model.type_kind(ty.kind.as_deref(), &ty.name);
            let declaring = declaring_type(&ty.name, kind, &ty.modifiers);

            for decl in ty.methods {
                model.add_method(&declaring, decl);
            }
        }

        debug!(
            methods = model.methods.len(),
            diagnostics = model.diagnostics.len(),
            "program model resolved"
        );
        model
    }

    fn add_method(&mut self, declaring: &DeclaringType, decl: MethodDecl) {
        if decl.name.trim().is_empty() {
            self.diagnose(
                &format!("{}#<unnamed>", declaring.name),
                "method has no name",
            );
            return;
        }

        let descriptor = descriptor_from_parts(
            declaring.clone(),
            &decl.name,
            decl.parameters,
            decl.return_type,
            &decl.modifiers,
        );
        let signature = descriptor.signature();
        if self.by_signature.contains_key(&signature) {
            self.diagnose(&signature, "duplicate method declaration");
            return;
        }

        let mut invocations = Vec::with_capacity(decl.invocations.len());
        for (ordinal, call) in decl.invocations.into_iter().enumerate() {
            if call.name.trim().is_empty() || call.declaring_type.trim().is_empty() {
                self.diagnose(
                    &format!("{} call #{}", signature, ordinal),
                    "call site target is unresolved",
                );
                continue;
            }
            let kind = self.type_kind(
                call.declaring_type_kind.as_deref(),
                &format!("{} call #{}", signature, ordinal),
            );
            let target_type =
                declaring_type(&call.declaring_type, kind, &call.declaring_type_modifiers);
            let target = descriptor_from_parts(
                target_type,
                &call.name,
                call.parameters,
                call.return_type,
                &call.modifiers,
            );
            invocations.push(InvocationSite { ordinal, target });
        }

        self.by_signature.insert(signature, self.methods.len());
        self.methods.push(ModelMethod {
            descriptor,
            body: decl.body,
            invocations,
        });
    }

    /// Absent kinds are classes. Unknown kinds are reported and treated as
    /// classes so the entry still loads.
    fn type_kind(&mut self, raw: Option<&str>, location: &str) -> TypeKind {
        let Some(raw) = raw.map(str::trim).filter(|k| !k.is_empty()) else {
            return TypeKind::Class;
        };
        match raw.to_ascii_lowercase().as_str() {
            "class" => TypeKind::Class,
            "interface" => TypeKind::Interface,
            "enum" => TypeKind::Enum,
            "record" => TypeKind::Record,
            _ => {
                self.diagnose(location, &format!("unknown type kind '{}', treated as class", raw));
                TypeKind::Class
            }
        }
    }

    fn diagnose(&mut self, location: &str, reason: &str) {
        warn!(location, reason, "unresolved model entry");
        self.diagnostics.push(ModelDiagnostic {
            location: location.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn methods(&self) -> &[ModelMethod] {
        &self.methods
    }

    pub fn get(&self, signature: &str) -> Option<&ModelMethod> {
        self.by_signature.get(signature).map(|&i| &self.methods[i])
    }

    pub fn diagnostics(&self) -> &[ModelDiagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

fn declaring_type(name: &str, kind: TypeKind, modifiers: &[String]) -> DeclaringType {
    DeclaringType {
        name: name.trim().to_string(),
        kind,
        is_abstract: has_modifier(modifiers, "abstract"),
        is_final: has_modifier(modifiers, "final"),
        is_static: has_modifier(modifiers, "static"),
    }
}

fn descriptor_from_parts(
    declaring_type: DeclaringType,
    name: &str,
    parameters: Vec<String>,
    return_type: Option<String>,
    modifiers: &[String],
) -> MethodDescriptor {
    let return_type = return_type
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty() && r != "void");

    MethodDescriptor {
        declaring_type,
        name: name.trim().to_string(),
        parameters: parameters.into_iter().map(|p| p.trim().to_string()).collect(),
        return_type,
        visibility: visibility(modifiers),
        modifiers: MethodModifiers {
            is_static: has_modifier(modifiers, "static"),
            is_final: has_modifier(modifiers, "final"),
            is_abstract: has_modifier(modifiers, "abstract"),
            is_native: has_modifier(modifiers, "native"),
            is_synchronized: has_modifier(modifiers, "synchronized"),
        },
    }
}

fn has_modifier(modifiers: &[String], wanted: &str) -> bool {
    modifiers.iter().any(|m| m.trim().eq_ignore_ascii_case(wanted))
}

fn visibility(modifiers: &[String]) -> Visibility {
    if has_modifier(modifiers, "public") {
        Visibility::Public
    } else if has_modifier(modifiers, "protected") {
        Visibility::Protected
    } else if has_modifier(modifiers, "private") {
        Visibility::Private
    } else {
        Visibility::Package
    }
}
