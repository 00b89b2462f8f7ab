//! Test case synthesis.
//!
//! One [`GeneratedTestCase`] is produced per snapshot triple. Snapshots are
//! embedded as literals when short and shipped as resource files otherwise.
//! When the runtime serializer differs from the capture format the snapshot
//! text is transcoded first and then laid out the way that serializer reads
//! objects (see [`crate::layout`]).

use std::fmt;

use serde::Serialize;
use tracegen_extract::{Tag, TagSet};
use tracegen_snapshot::{
    FormatTranscoder, JsonSerializer, Serializer, StreamingTranscoder, TranscodeError,
};
use tracegen_types::{MethodDescriptor, OutcomeKind, SerializationFormat, Snapshot, SnapshotTriple};
use tracing::debug;

use crate::layout::gson_value;
use crate::literal::java_string_literal;
use crate::statement::{java_type_name, Role, SerializerIdiom, Statement};

/// Default size above which snapshots go to resource files.
pub const DEFAULT_INLINE_LIMIT: usize = 10_000;

const ACTUAL_VARIABLE: &str = "actualObject";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Serializer the generated tests use at runtime
    pub serializer: SerializationFormat,
    /// Longest snapshot, in bytes, embedded as a literal
    pub inline_limit: usize,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            serializer: SerializationFormat::CAPTURE,
            inline_limit: DEFAULT_INLINE_LIMIT,
        }
    }
}

/// A snapshot shipped next to the generated source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceFile {
    pub name: String,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedTestCase {
    pub method_signature: String,
    /// 1-based position of the triple
    pub index: usize,
    pub outcome_kind: OutcomeKind,
    pub statements: Vec<Statement>,
    pub resources: Vec<ResourceFile>,
    /// Captured outcome was the serializer's "no value" marker
    pub null_outcome: bool,
}

/// Cases for one method, plus the triples that could not be turned into one.
#[derive(Debug, Clone)]
pub struct SynthesizedSuite {
    pub method: MethodDescriptor,
    pub tags: TagSet,
    pub cases: Vec<GeneratedTestCase>,
    pub rejected: Vec<SynthesisError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// Receiving or outcome snapshot is empty
    IncompleteTriple { index: usize },
    /// Method takes parameters but the triple has no params snapshot
    MissingParams { index: usize },
    /// Receiving snapshot is the "no value" marker
    NullReceiver { index: usize },
    /// Method cannot be called on a deserialized receiver
    NotInvocable { signature: String, reason: &'static str },
    Transcode { index: usize, source: TranscodeError },
}

impl fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthesisError::IncompleteTriple { index } => {
                write!(f, "triple #{} has an empty receiving or outcome snapshot", index)
            }
            SynthesisError::MissingParams { index } => {
                write!(f, "triple #{} has no params snapshot", index)
            }
            SynthesisError::NullReceiver { index } => {
                write!(f, "triple #{} has a null receiving object", index)
            }
            SynthesisError::NotInvocable { signature, reason } => {
                write!(f, "{} cannot be invoked: {}", signature, reason)
            }
            SynthesisError::Transcode { index, source } => {
                write!(f, "triple #{}: {}", index, source)
            }
        }
    }
}

impl std::error::Error for SynthesisError {}

/// Builds test cases for tagged candidate methods.
#[derive(Debug, Clone, Default)]
pub struct TestSynthesizer<T = StreamingTranscoder> {
    options: SynthesisOptions,
    transcoder: T,
}

impl TestSynthesizer<StreamingTranscoder> {
    pub fn new(options: SynthesisOptions) -> Self {
        Self {
            options,
            transcoder: StreamingTranscoder,
        }
    }
}

impl<T: FormatTranscoder> TestSynthesizer<T> {
    pub fn with_transcoder(options: SynthesisOptions, transcoder: T) -> Self {
        Self {
            options,
            transcoder,
        }
    }

    pub fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    pub fn idiom(&self) -> SerializerIdiom {
        SerializerIdiom::for_format(self.options.serializer)
    }

    /// Synthesize one case per triple, in triple order.
    pub fn synthesize_suite(
        &self,
        method: &MethodDescriptor,
        tags: &TagSet,
        triples: &[SnapshotTriple],
    ) -> SynthesizedSuite {
        let mut cases = Vec::with_capacity(triples.len());
        let mut rejected = Vec::new();
        for (i, triple) in triples.iter().enumerate() {
            match self.synthesize(method, tags, triple, i + 1) {
                Ok(case) => cases.push(case),
                Err(e) => {
                    debug!(method = %method.signature(), error = %e, "triple rejected");
                    rejected.push(e);
                }
            }
        }
        SynthesizedSuite {
            method: method.clone(),
            tags: tags.clone(),
            cases,
            rejected,
        }
    }

    /// Build the test case for the `index`-th (1-based) triple of a method.
    pub fn synthesize(
        &self,
        method: &MethodDescriptor,
        tags: &TagSet,
        triple: &SnapshotTriple,
        index: usize,
    ) -> Result<GeneratedTestCase, SynthesisError> {
        check_invocable(method, tags)?;
        if !triple.is_complete() {
            return Err(SynthesisError::IncompleteTriple { index });
        }
        if method.has_params() && !triple.has_params() {
            return Err(SynthesisError::MissingParams { index });
        }
        let capture = SerializationFormat::CAPTURE;
        if Snapshot::new(capture, triple.receiving.as_str()).is_null_marker() {
            return Err(SynthesisError::NullReceiver { index });
        }
        let null_outcome = Snapshot::new(capture, triple.outcome.as_str()).is_null_marker();

        let idiom = self.idiom();
        let outcome_role = Role::outcome(triple.outcome_kind);
        let mut texts = vec![(Role::Receiving, self.runtime_text(&triple.receiving, index)?)];
        if method.has_params() {
            texts.push((Role::Params, self.runtime_text(&triple.params, index)?));
        }
        let outcome_text = if null_outcome {
            self.options.serializer.null_marker().to_string()
        } else {
            self.runtime_text(&triple.outcome, index)?
        };
        texts.push((outcome_role, outcome_text));

        let mut statements = Vec::new();
        let mut resources = Vec::new();
        for (role, text) in texts {
            if text.len() <= self.options.inline_limit {
                statements.push(Statement::EmbedLiteral {
                    role,
                    literal: java_string_literal(&text),
                });
            } else {
                if resources.is_empty() {
                    statements.push(Statement::ResourceLoader);
                }
                let name = resource_name(method, index, role, self.options.serializer);
                statements.push(Statement::OpenResource {
                    role,
                    resource: name.clone(),
                });
                statements.push(Statement::ReadResource { role });
                resources.push(ResourceFile {
                    name,
                    contents: text,
                });
            }
        }

        let receiver_type = java_type_name(&method.declaring_type.name);
        statements.push(Statement::Deserialize {
            role: Role::Receiving,
            java_type: receiver_type.clone(),
            expression: idiom.from_text(&Role::Receiving.text_variable(), &receiver_type),
        });

        let mut arguments = Vec::with_capacity(method.parameters.len());
        if method.has_params() {
            statements.push(Statement::Deserialize {
                role: Role::Params,
                java_type: idiom.params_type().to_string(),
                expression: idiom.params_from_text(&Role::Params.text_variable()),
            });
            for (i, param) in method.parameters.iter().enumerate() {
                let java_type = java_type_name(param);
                statements.push(Statement::ExtractParam {
                    index: i,
                    expression: idiom.param_at(&Role::Params.object_variable(), i, &java_type),
                    java_type,
                });
                arguments.push(Statement::param_variable(i));
            }
        }

        if !null_outcome {
            let outcome_type = match &method.return_type {
                Some(ty) if triple.outcome_kind == OutcomeKind::Returned => java_type_name(ty),
                _ => receiver_type.clone(),
            };
            statements.push(Statement::Deserialize {
                role: outcome_role,
                expression: idiom.from_text(&outcome_role.text_variable(), &outcome_type),
                java_type: outcome_type,
            });
        }

        let result = match (&method.return_type, triple.outcome_kind) {
            (Some(ty), OutcomeKind::Returned) => {
                Some((java_type_name(ty), ACTUAL_VARIABLE.to_string()))
            }
            _ => None,
        };
        let observed = match result {
            Some(_) => ACTUAL_VARIABLE.to_string(),
            None => Role::Receiving.object_variable(),
        };
        statements.push(Statement::Invoke {
            receiver: Role::Receiving.object_variable(),
            method: method.name.clone(),
            arguments,
            result,
        });

        let expected = if null_outcome {
            java_string_literal(self.options.serializer.null_marker())
        } else {
            idiom.expected_text(&outcome_role.text_variable(), &outcome_role.object_variable())
        };
        statements.push(Statement::AssertEquals {
            expected,
            actual: idiom.to_text(&observed),
        });

        Ok(GeneratedTestCase {
            method_signature: method.signature(),
            index,
            outcome_kind: triple.outcome_kind,
            statements,
            resources,
            null_outcome,
        })
    }

    /// Fixture text for the runtime serializer.
    fn runtime_text(&self, captured: &str, index: usize) -> Result<String, SynthesisError> {
        let snapshot = Snapshot::new(SerializationFormat::CAPTURE, captured);
        let transcoded = self
            .transcoder
            .transcode(&snapshot, self.options.serializer)
            .map_err(|source| SynthesisError::Transcode { index, source })?;
        match transcoded.format {
            SerializationFormat::Xml => Ok(transcoded.text),
            SerializationFormat::Json => {
                let tree = JsonSerializer
                    .deserialize(&transcoded.text)
                    .map_err(|e| SynthesisError::Transcode {
                        index,
                        source: e.into(),
                    })?;
                Ok(gson_value(&tree).to_string())
            }
        }
    }
}

fn check_invocable(method: &MethodDescriptor, tags: &TagSet) -> Result<(), SynthesisError> {
    let reason = if tags.get(Tag::Static) {
        Some("no receiver for a static method")
    } else if tags.get(Tag::Abstract) {
        Some("abstract method or non-instantiable declaring type")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(SynthesisError::NotInvocable {
            signature: method.signature(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Resource file name for one role of one case, safe on any file system.
pub fn resource_name(
    method: &MethodDescriptor,
    index: usize,
    role: Role,
    format: SerializationFormat,
) -> String {
    let params = if method.parameters.is_empty() {
        String::new()
    } else {
        format!("_{}", method.parameters.join(","))
    };
    let stem: String = format!("{}.{}{}", method.declaring_type.name, method.name, params)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | ',' | '_' | '-' | '$') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}-{}-{}.{}", stem, index, role.label(), format.file_extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracegen_types::{DeclaringType, MethodModifiers, Visibility};

    fn method(params: &[&str], ret: Option<&str>) -> MethodDescriptor {
        MethodDescriptor {
            declaring_type: DeclaringType::class("a.Calc"),
            name: "add".to_string(),
            parameters: params.iter().map(|p| p.to_string()).collect(),
            return_type: ret.map(str::to_string),
            visibility: Visibility::Public,
            modifiers: MethodModifiers::default(),
        }
    }

    fn triple(r: &str, p: &str, o: &str, kind: OutcomeKind) -> SnapshotTriple {
        SnapshotTriple {
            receiving: r.to_string(),
            params: p.to_string(),
            outcome: o.to_string(),
            outcome_kind: kind,
        }
    }

    fn render(case: &GeneratedTestCase) -> Vec<String> {
        case.statements.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_value_method_with_params() {
        let synth = TestSynthesizer::new(SynthesisOptions::default());
        let case = synth
            .synthesize(
                &method(&["int"], Some("int")),
                &TagSet::default(),
                &triple(
                    "<a.Calc/>",
                    "<object-array><int>2</int></object-array>",
                    "<int>3</int>",
                    OutcomeKind::Returned,
                ),
                1,
            )
            .unwrap();

        assert_eq!(
            render(&case),
            vec![
                "String receivingText = \"<a.Calc/>\";",
                "String paramsText = \"<object-array><int>2</int></object-array>\";",
                "String returnedText = \"<int>3</int>\";",
                "a.Calc receivingObject = (a.Calc) xStream.fromXML(receivingText);",
                "Object[] paramObjects = (Object[]) xStream.fromXML(paramsText);",
                "Integer paramObject1 = (Integer) paramObjects[0];",
                "Integer returnedObject = (Integer) xStream.fromXML(returnedText);",
                "Integer actualObject = receivingObject.add(paramObject1);",
                "assertEquals(returnedText, xStream.toXML(actualObject));",
            ]
        );
        assert!(case.resources.is_empty());
        assert_eq!(case.index, 1);
        assert_eq!(case.method_signature, "a.Calc#add(int)");
    }

    #[test]
    fn test_void_method_compares_post_state() {
        let synth = TestSynthesizer::new(SynthesisOptions::default());
        let state = "<a.Calc><total>1</total></a.Calc>";
        let case = synth
            .synthesize(
                &method(&[], None),
                &TagSet::default(),
                &triple(state, "", state, OutcomeKind::ReceivingPost),
                1,
            )
            .unwrap();
        let lines = render(&case);
        assert!(lines.contains(
            &"a.Calc receivingPostObject = (a.Calc) xStream.fromXML(receivingPostText);".to_string()
        ));
        assert!(lines.contains(&"receivingObject.add();".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "assertEquals(receivingPostText, xStream.toXML(receivingObject));"
        );
    }

    #[test]
    fn test_null_outcome_asserts_marker() {
        let synth = TestSynthesizer::new(SynthesisOptions::default());
        let case = synth
            .synthesize(
                &method(&[], Some("java.lang.String")),
                &TagSet::default(),
                &triple("<a.Calc/>", "", "<null/>", OutcomeKind::Returned),
                2,
            )
            .unwrap();
        assert!(case.null_outcome);
        let lines = render(&case);
        assert!(!lines.iter().any(|l| l.contains("returnedObject")));
        assert_eq!(
            lines.last().unwrap(),
            "assertEquals(\"<null/>\", xStream.toXML(actualObject));"
        );
    }

    #[test]
    fn test_large_snapshots_become_resources() {
        let synth = TestSynthesizer::new(SynthesisOptions {
            inline_limit: 8,
            ..Default::default()
        });
        let case = synth
            .synthesize(
                &method(&[], Some("int")),
                &TagSet::default(),
                &triple("<a.Calc><x>1</x></a.Calc>", "", "<int>3</int>", OutcomeKind::Returned),
                3,
            )
            .unwrap();
        let lines = render(&case);
        assert_eq!(lines[0], "ClassLoader classLoader = getClass().getClassLoader();");
        assert_eq!(case.resources.len(), 2);
        assert_eq!(case.resources[0].name, "a.Calc.add-3-receiving.xml");
        assert_eq!(case.resources[0].contents, "<a.Calc><x>1</x></a.Calc>");
        assert_eq!(case.resources[1].name, "a.Calc.add-3-returned.xml");
    }

    fn json_synth(inline_limit: usize) -> TestSynthesizer {
        TestSynthesizer::new(SynthesisOptions {
            serializer: SerializationFormat::Json,
            inline_limit,
        })
    }

    #[test]
    fn test_json_serializer_lays_out_gson_fixtures() {
        let case = json_synth(DEFAULT_INLINE_LIMIT)
            .synthesize(
                &method(&["int"], Some("int")),
                &TagSet::default(),
                &triple(
                    "<a.Calc><x>1</x></a.Calc>",
                    "<object-array><int>2</int></object-array>",
                    "<int>3</int>",
                    OutcomeKind::Returned,
                ),
                1,
            )
            .unwrap();

        assert_eq!(
            render(&case),
            vec![
                r#"String receivingText = "{\"x\":1}";"#,
                r#"String paramsText = "[2]";"#,
                r#"String returnedText = "3";"#,
                "a.Calc receivingObject = (a.Calc) gson.fromJson(receivingText, a.Calc.class);",
                "JsonArray paramObjects = (JsonArray) JsonParser.parseString(paramsText).getAsJsonArray();",
                "Integer paramObject1 = gson.fromJson(paramObjects.get(0), Integer.class);",
                "Integer returnedObject = (Integer) gson.fromJson(returnedText, Integer.class);",
                "Integer actualObject = receivingObject.add(paramObject1);",
                "assertEquals(gson.toJson(returnedObject), gson.toJson(actualObject));",
            ]
        );
    }

    #[test]
    fn test_json_fixtures_match_the_calls_reading_them() {
        let m = method(&["int", "java.lang.String"], Some("a.Calc"));
        let case = json_synth(0)
            .synthesize(
                &m,
                &TagSet::default(),
                &triple(
                    "<a.Calc>\n  <x>1</x>\n  <tags class=\"java.util.ArrayList\">\n    <string>t</string>\n  </tags>\n</a.Calc>",
                    "<object-array>\n  <int>2</int>\n  <string>s</string>\n</object-array>",
                    "<a.Calc>\n  <x>3</x>\n</a.Calc>",
                    OutcomeKind::Returned,
                ),
                1,
            )
            .unwrap();
        let fixture = |suffix: &str| -> serde_json::Value {
            let resource = case
                .resources
                .iter()
                .find(|r| r.name.ends_with(suffix))
                .unwrap();
            serde_json::from_str(&resource.contents).unwrap()
        };

        // Objects read with a class literal are plain JSON objects of fields.
        let receiving = fixture("-receiving.json");
        assert_eq!(receiving, serde_json::json!({"x": 1, "tags": ["t"]}));
        assert_eq!(fixture("-returned.json"), serde_json::json!({"x": 3}));

        // The parameter list is an array read element by element.
        let params = fixture("-params.json");
        assert_eq!(params.as_array().unwrap().len(), m.parameters.len());
        assert_eq!(params, serde_json::json!([2, "s"]));

        let lines = render(&case);
        assert!(lines.contains(
            &"JsonArray paramObjects = (JsonArray) JsonParser.parseString(paramsText).getAsJsonArray();"
                .to_string()
        ));
        assert!(lines.contains(
            &"java.lang.String paramObject2 = gson.fromJson(paramObjects.get(1), java.lang.String.class);"
                .to_string()
        ));
        assert!(!lines.iter().any(|l| l.contains("Object[]") || l.contains("#children")));
    }

    #[test]
    fn test_json_null_outcome_uses_gson_marker() {
        let case = json_synth(DEFAULT_INLINE_LIMIT)
            .synthesize(
                &method(&[], Some("java.lang.String")),
                &TagSet::default(),
                &triple("<a.Calc/>", "", "<null/>", OutcomeKind::Returned),
                1,
            )
            .unwrap();
        let lines = render(&case);
        assert_eq!(lines[0], r#"String receivingText = "{}";"#);
        assert_eq!(lines.last().unwrap(), r#"assertEquals("null", gson.toJson(actualObject));"#);
    }

    #[test]
    fn test_invariant_violations_are_rejected() {
        let synth = TestSynthesizer::new(SynthesisOptions::default());
        let tags = TagSet::default();
        let m = method(&["int"], Some("int"));

        let err = synth
            .synthesize(&m, &tags, &triple("<a/>", "<p/>", " ", OutcomeKind::Returned), 1)
            .unwrap_err();
        assert_eq!(err, SynthesisError::IncompleteTriple { index: 1 });

        let err = synth
            .synthesize(&m, &tags, &triple("<a/>", "", "<int>1</int>", OutcomeKind::Returned), 2)
            .unwrap_err();
        assert_eq!(err, SynthesisError::MissingParams { index: 2 });

        let err = synth
            .synthesize(&m, &tags, &triple("<null/>", "<p/>", "<int>1</int>", OutcomeKind::Returned), 3)
            .unwrap_err();
        assert_eq!(err, SynthesisError::NullReceiver { index: 3 });

        let mut static_tags = TagSet::default();
        static_tags.set(Tag::Static, true);
        let err = synth
            .synthesize(&m, &static_tags, &triple("<a/>", "<p/>", "<int>1</int>", OutcomeKind::Returned), 1)
            .unwrap_err();
        assert!(matches!(err, SynthesisError::NotInvocable { .. }));
    }

    #[test]
    fn test_suite_keeps_triple_order_and_collects_rejections() {
        let synth = TestSynthesizer::new(SynthesisOptions::default());
        let triples = vec![
            triple("<a.Calc/>", "", "<int>1</int>", OutcomeKind::Returned),
            triple("<a.Calc/>", "", "", OutcomeKind::Returned),
            triple("<a.Calc/>", "", "<int>2</int>", OutcomeKind::Returned),
        ];
        let suite = synth.synthesize_suite(&method(&[], Some("int")), &TagSet::default(), &triples);
        assert_eq!(suite.cases.iter().map(|c| c.index).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(suite.rejected, vec![SynthesisError::IncompleteTriple { index: 2 }]);
    }

    #[test]
    fn test_resource_names_are_sanitized() {
        let m = method(&["java.util.List<a.B>", "int[]"], Some("int"));
        assert_eq!(
            resource_name(&m, 1, Role::Params, SerializationFormat::Json),
            "a.Calc.add_java.util.List_a.B_,int__-1-params.json"
        );
    }
}
