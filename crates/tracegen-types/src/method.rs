//! Method-level data model.
//!
//! A [`MethodDescriptor`] is built once from the program model and never
//! mutated afterwards. Call sites reference their target through an owned
//! copy of the target's descriptor, so the analysis never needs to look
//! anything up reflectively.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Types treated as primitives when computing the `*_primitives` tags.
pub const PRIMITIVE_TYPES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double",
];

const STRING_TYPE: &str = "java.lang.String";

/// Access level of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Package,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Package => "package",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a declaring type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Enum,
    Record,
}

/// Facts about the type that declares a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclaringType {
    /// Fully qualified name, nested types separated by `$` or `.`
    pub name: String,
    pub kind: TypeKind,
    pub is_abstract: bool,
    pub is_final: bool,
    /// Nested type declared `static`
    #[serde(default)]
    pub is_static: bool,
}

impl DeclaringType {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Class,
            is_abstract: false,
            is_final: false,
            is_static: false,
        }
    }

    /// A type a test can hold a concrete receiver of.
    pub fn is_instantiable(&self) -> bool {
        !self.is_abstract && self.kind != TypeKind::Interface
    }

    /// A type that cannot be subtyped or proxied.
    pub fn is_sealed(&self) -> bool {
        self.is_final || matches!(self.kind, TypeKind::Enum | TypeKind::Record)
    }

    /// Last segment of the qualified name, with nested-type markers flattened.
    pub fn simple_name(&self) -> &str {
        let tail = self.name.rsplit('.').next().unwrap_or(&self.name);
        tail.rsplit('$').next().unwrap_or(tail)
    }

    /// Package portion of the qualified name (empty for the default package).
    pub fn package(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[..idx],
            None => "",
        }
    }
}

/// Modifiers carried by the method itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct MethodModifiers {
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    pub is_native: bool,
    pub is_synchronized: bool,
}

/// Statement-level shape of a method body, as counted by the program model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BodyShape {
    pub statements: u32,
    pub local_variables: u32,
    pub conditionals: u32,
    pub ifs: u32,
    pub loops: u32,
    pub switches: u32,
    pub returns: u32,
    pub synchronized_blocks: u32,
}

/// One method of the target program.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub declaring_type: DeclaringType,
    pub name: String,
    /// Ordered parameter type names
    pub parameters: Vec<String>,
    /// `None` for methods that return no value
    pub return_type: Option<String>,
    pub visibility: Visibility,
    pub modifiers: MethodModifiers,
}

impl MethodDescriptor {
    /// Stable identity: `pkg.Type#name(p1,p2)`.
    pub fn signature(&self) -> String {
        method_signature(&self.declaring_type.name, &self.name, &self.parameters)
    }

    pub fn is_void(&self) -> bool {
        self.return_type.is_none()
    }

    pub fn has_params(&self) -> bool {
        !self.parameters.is_empty()
    }

    /// Type-level dispatch (no receiver).
    pub fn is_type_level(&self) -> bool {
        self.modifiers.is_static
    }

    pub fn returns_primitive(&self) -> bool {
        self.return_type
            .as_deref()
            .map(is_primitive_or_string)
            .unwrap_or(false)
    }

    pub fn has_only_primitive_params(&self) -> bool {
        self.has_params() && self.parameters.iter().all(|p| is_primitive_or_string(p))
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature())
    }
}

/// A call expression found inside a method body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationSite {
    /// Position of the call within the enclosing body (0-indexed)
    pub ordinal: usize,
    pub target: MethodDescriptor,
}

/// A method observed at runtime, as recorded in the capture log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrumentedMethod {
    pub declaring_type: String,
    pub name: String,
    pub parameters: Vec<String>,
    /// Return type name; `void` for methods without a value
    pub return_type: String,
    pub invocation_count: u64,
}

impl InstrumentedMethod {
    pub fn has_params(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub fn is_void(&self) -> bool {
        self.return_type == "void"
    }

    pub fn signature(&self) -> String {
        method_signature(&self.declaring_type, &self.name, &self.parameters)
    }

    /// Suffix that encodes the parameter list into dump file names.
    ///
    /// `_int,java.lang.String` for two parameters, empty for none.
    pub fn param_suffix(&self) -> String {
        if self.parameters.is_empty() {
            String::new()
        } else {
            format!("_{}", self.parameters.join(","))
        }
    }

    /// Dump file stem relative to the dump directory: `pkg.Type.method`.
    pub fn dump_stem(&self) -> String {
        format!("{}.{}", self.declaring_type, self.name)
    }
}

/// Split a parameter list as written in capture logs.
///
/// Accepts `[a, b]`, `a,b` and the empty forms `[]` / ``. Commas inside
/// generic arguments do not split.
pub fn parse_param_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    let mut params = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '<' => {
                depth += 1;
                current.push(c);
            }
            '>' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                let p = current.trim();
                if !p.is_empty() {
                    params.push(p.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    let p = current.trim();
    if !p.is_empty() {
        params.push(p.to_string());
    }
    params
}

pub fn method_signature(declaring_type: &str, name: &str, parameters: &[String]) -> String {
    format!("{}#{}({})", declaring_type, name, parameters.join(","))
}

fn is_primitive_or_string(ty: &str) -> bool {
    PRIMITIVE_TYPES.contains(&ty) || ty == STRING_TYPE
}
