//! Statements of a generated test case.
//!
//! Statements are stored structurally and rendered to Java by their
//! `Display` impl. Serializer-specific expressions are filled in when the
//! statement is built, so rendering needs no further context.

use serde::Serialize;
use std::fmt;

use tracegen_types::{OutcomeKind, SerializationFormat};

/// Which captured snapshot a statement works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Receiving,
    Params,
    Returned,
    ReceivingPost,
}

impl Role {
    pub fn outcome(kind: OutcomeKind) -> Self {
        match kind {
            OutcomeKind::Returned => Role::Returned,
            OutcomeKind::ReceivingPost => Role::ReceivingPost,
        }
    }

    /// Name used in resource file names.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Receiving => "receiving",
            Role::Params => "params",
            Role::Returned => "returned",
            Role::ReceivingPost => "receiving-post",
        }
    }

    fn camel(&self) -> &'static str {
        match self {
            Role::Receiving => "receiving",
            Role::Params => "params",
            Role::Returned => "returned",
            Role::ReceivingPost => "receivingPost",
        }
    }

    fn capitalized(&self) -> &'static str {
        match self {
            Role::Receiving => "Receiving",
            Role::Params => "Params",
            Role::Returned => "Returned",
            Role::ReceivingPost => "ReceivingPost",
        }
    }

    /// Local holding the snapshot text.
    pub fn text_variable(&self) -> String {
        format!("{}Text", self.camel())
    }

    /// Local holding the deserialized value.
    pub fn object_variable(&self) -> String {
        match self {
            Role::Params => "paramObjects".to_string(),
            other => format!("{}Object", other.camel()),
        }
    }
}

/// Code shapes a generated test uses for one runtime serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializerIdiom {
    format: SerializationFormat,
}

impl SerializerIdiom {
    pub fn for_format(format: SerializationFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> SerializationFormat {
        self.format
    }

    pub fn imports(&self) -> &'static [&'static str] {
        match self.format {
            SerializationFormat::Xml => &["com.thoughtworks.xstream.XStream"],
            SerializationFormat::Json => &[
                "com.google.gson.Gson",
                "com.google.gson.JsonArray",
                "com.google.gson.JsonParser",
            ],
        }
    }

    /// Field declared once per test class.
    pub fn field_declaration(&self) -> &'static str {
        match self.format {
            SerializationFormat::Xml => "static XStream xStream = new XStream();",
            SerializationFormat::Json => "static Gson gson = new Gson();",
        }
    }

    /// Expression reading an object of `java_type` from the text in `text_var`.
    pub fn from_text(&self, text_var: &str, java_type: &str) -> String {
        match self.format {
            SerializationFormat::Xml => format!("xStream.fromXML({})", text_var),
            SerializationFormat::Json => {
                format!("gson.fromJson({}, {}.class)", text_var, erase_generics(java_type))
            }
        }
    }

    /// Expression serializing the object in `object_var`.
    pub fn to_text(&self, object_var: &str) -> String {
        match self.format {
            SerializationFormat::Xml => format!("xStream.toXML({})", object_var),
            SerializationFormat::Json => format!("gson.toJson({})", object_var),
        }
    }

    /// Type of the local holding the deserialized parameter list.
    pub fn params_type(&self) -> &'static str {
        match self.format {
            SerializationFormat::Xml => "Object[]",
            SerializationFormat::Json => "JsonArray",
        }
    }

    /// Expression reading the parameter list from the text in `text_var`.
    pub fn params_from_text(&self, text_var: &str) -> String {
        match self.format {
            SerializationFormat::Xml => format!("xStream.fromXML({})", text_var),
            SerializationFormat::Json => {
                format!("JsonParser.parseString({}).getAsJsonArray()", text_var)
            }
        }
    }

    /// Expression producing the `index`-th parameter as `java_type`.
    ///
    /// XStream items carry their own type. Gson items are bare JSON and are
    /// read with the declared parameter type.
    pub fn param_at(&self, params_var: &str, index: usize, java_type: &str) -> String {
        match self.format {
            SerializationFormat::Xml => format!("({}) {}[{}]", java_type, params_var, index),
            SerializationFormat::Json => format!(
                "gson.fromJson({}.get({}), {}.class)",
                params_var,
                index,
                erase_generics(java_type)
            ),
        }
    }

    /// Expected side of the outcome assertion.
    ///
    /// XStream fixtures are the captured text itself. Gson fixtures are laid
    /// out from the capture, so the expected text is the fixture read back
    /// and written again by Gson, which fixes field order and number spelling.
    pub fn expected_text(&self, text_var: &str, object_var: &str) -> String {
        match self.format {
            SerializationFormat::Xml => text_var.to_string(),
            SerializationFormat::Json => self.to_text(object_var),
        }
    }
}

/// Java spelling of a type for locals and casts: primitives boxed, nested
/// types dotted.
pub fn java_type_name(ty: &str) -> String {
    let boxed = match ty {
        "boolean" => "Boolean",
        "byte" => "Byte",
        "char" => "Character",
        "short" => "Short",
        "int" => "Integer",
        "long" => "Long",
        "float" => "Float",
        "double" => "Double",
        other => return other.replace('$', "."),
    };
    boxed.to_string()
}

fn erase_generics(ty: &str) -> &str {
    match ty.find('<') {
        Some(idx) => &ty[..idx],
        None => ty,
    }
}

/// One step of a generated test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// Obtain the class loader used to open resources.
    ResourceLoader,
    /// Open a test resource and wrap it in a scanner.
    OpenResource { role: Role, resource: String },
    /// Drain the scanner opened for `role` into its text local.
    ReadResource { role: Role },
    /// Bind a snapshot embedded as a string literal.
    EmbedLiteral { role: Role, literal: String },
    /// Deserialize a snapshot into a typed local.
    Deserialize {
        role: Role,
        java_type: String,
        expression: String,
    },
    /// Take one element out of the deserialized parameter list.
    ExtractParam {
        index: usize,
        java_type: String,
        expression: String,
    },
    /// Call the method under test.
    Invoke {
        receiver: String,
        method: String,
        arguments: Vec<String>,
        /// `(type, local)` the return value is bound to
        result: Option<(String, String)>,
    },
    AssertEquals { expected: String, actual: String },
}

impl Statement {
    /// Local bound by the n-th (0-based) parameter extraction.
    pub fn param_variable(index: usize) -> String {
        format!("paramObject{}", index + 1)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::ResourceLoader => {
                write!(f, "ClassLoader classLoader = getClass().getClassLoader();")
            }
            Statement::OpenResource { role, resource } => {
                let name = role.capitalized();
                writeln!(
                    f,
                    "File file{} = new File(classLoader.getResource(\"{}\").getFile());",
                    name, resource
                )?;
                write!(f, "Scanner scanner{} = new Scanner(file{});", name, name)
            }
            Statement::ReadResource { role } => write!(
                f,
                "String {} = scanner{}.useDelimiter(\"\\\\A\").next();",
                role.text_variable(),
                role.capitalized()
            ),
            Statement::EmbedLiteral { role, literal } => {
                write!(f, "String {} = {};", role.text_variable(), literal)
            }
            Statement::Deserialize {
                role,
                java_type,
                expression,
            } => write!(
                f,
                "{} {} = ({}) {};",
                java_type,
                role.object_variable(),
                java_type,
                expression
            ),
            Statement::ExtractParam {
                index,
                java_type,
                expression,
            } => write!(
                f,
                "{} {} = {};",
                java_type,
                Statement::param_variable(*index),
                expression
            ),
            Statement::Invoke {
                receiver,
                method,
                arguments,
                result,
            } => {
                if let Some((ty, var)) = result {
                    write!(f, "{} {} = ", ty, var)?;
                }
                write!(f, "{}.{}({});", receiver, method, arguments.join(", "))
            }
            Statement::AssertEquals { expected, actual } => {
                write!(f, "assertEquals({}, {});", expected, actual)
            }
        }
    }
}
