//! Invocation classification for test-double substitution.
//!
//! A call site is mockable when a double can intercept it: the target must be
//! dispatched on an instance, must be overridable, and must live on a type
//! that can be subtyped or proxied. Static nested types are rejected as
//! well. Self-calls go through the same rule as
//! any other call.
//!
//! Whether the *enclosing* method sits on an abstract type is not part of
//! this rule; the tagger checks it when it decides `mocking_candidate`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use tracegen_types::{InvocationSite, MethodDescriptor};

use crate::model::ModelMethod;

/// Why a call site cannot be replaced by a double.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Static call, no instance to substitute
    TypeLevel,
    /// Target method cannot be overridden
    SealedMethod,
    /// Target's declaring type cannot be subtyped
    SealedDeclaringType,
    /// Target lives on a static nested type
    StaticDeclaringType,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::TypeLevel => "type-level target",
            Rejection::SealedMethod => "sealed target method",
            Rejection::SealedDeclaringType => "sealed declaring type",
            Rejection::StaticDeclaringType => "static declaring type",
        };
        f.write_str(s)
    }
}

/// Identity of one call site inside its enclosing body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InvocationKey {
    pub ordinal: usize,
    pub target: String,
}

impl InvocationKey {
    pub fn of(site: &InvocationSite) -> Self {
        Self {
            ordinal: site.ordinal,
            target: site.target.signature(),
        }
    }
}

impl fmt::Display for InvocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.ordinal, self.target)
    }
}

/// First rule a target violates, or `None` if it is mockable.
pub fn rejection(target: &MethodDescriptor) -> Option<Rejection> {
    if target.is_type_level() {
        Some(Rejection::TypeLevel)
    } else if target.modifiers.is_final {
        Some(Rejection::SealedMethod)
    } else if target.declaring_type.is_sealed() {
        Some(Rejection::SealedDeclaringType)
    } else if target.declaring_type.is_static {
        Some(Rejection::StaticDeclaringType)
    } else {
        None
    }
}

pub fn is_mockable(site: &InvocationSite) -> bool {
    rejection(&site.target).is_none()
}

/// Every call site of a method with its verdict, in body order.
pub fn classify_invocations(method: &ModelMethod) -> Vec<(InvocationKey, Option<Rejection>)> {
    method
        .invocations
        .iter()
        .map(|site| (InvocationKey::of(site), rejection(&site.target)))
        .collect()
}

/// The mockable call sites of a method.
///
/// A method without call sites yields an empty map.
pub fn nested_invocation_map(method: &ModelMethod) -> BTreeMap<InvocationKey, bool> {
    method
        .invocations
        .iter()
        .filter(|site| is_mockable(site))
        .map(|site| (InvocationKey::of(site), true))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracegen_types::{
        BodyShape, DeclaringType, MethodModifiers, TypeKind, Visibility,
    };

    fn target(ty: DeclaringType, name: &str, modifiers: MethodModifiers) -> MethodDescriptor {
        MethodDescriptor {
            declaring_type: ty,
            name: name.to_string(),
            parameters: vec![],
            return_type: Some("int".to_string()),
            visibility: Visibility::Public,
            modifiers,
        }
    }

    fn method_with(targets: Vec<MethodDescriptor>) -> ModelMethod {
        ModelMethod {
            descriptor: target(
                DeclaringType::class("org.example.Endpoint"),
                "getDebugState",
                MethodModifiers::default(),
            ),
            body: BodyShape {
                statements: 3,
                ..BodyShape::default()
            },
            invocations: targets
                .into_iter()
                .enumerate()
                .map(|(ordinal, target)| InvocationSite { ordinal, target })
                .collect(),
        }
    }

    #[test]
    fn test_scenario_a_no_call_sites_gives_empty_map() {
        let method = method_with(vec![]);
        assert_eq!(nested_invocation_map(&method).len(), 0);
        assert!(classify_invocations(&method).is_empty());
    }

    #[test]
    fn test_scenario_b_two_eligible_calls_give_map_of_two() {
        let conf = DeclaringType::class("org.example.Conference");
        let method = method_with(vec![
            target(conf.clone(), "getId", MethodModifiers::default()),
            target(conf, "getName", MethodModifiers::default()),
        ]);
        assert_eq!(nested_invocation_map(&method).len(), 2);
    }

    #[test]
    fn test_repeated_call_to_same_target_counts_per_site() {
        let conf = DeclaringType::class("org.example.Conference");
        let method = method_with(vec![
            target(conf.clone(), "getId", MethodModifiers::default()),
            target(conf, "getId", MethodModifiers::default()),
        ]);
        assert_eq!(nested_invocation_map(&method).len(), 2);
    }

    #[test]
    fn test_rejections() {
        let open = DeclaringType::class("a.Open");
        let mut sealed = DeclaringType::class("a.Sealed");
        sealed.is_final = true;
        let mut an_enum = DeclaringType::class("a.Color");
        an_enum.kind = TypeKind::Enum;

        let static_call = target(
            open.clone(),
            "of",
            MethodModifiers {
                is_static: true,
                ..MethodModifiers::default()
            },
        );
        let final_call = target(
            open.clone(),
            "fixed",
            MethodModifiers {
                is_final: true,
                ..MethodModifiers::default()
            },
        );
        let sealed_type_call = target(sealed, "x", MethodModifiers::default());
        let enum_call = target(an_enum, "ordinal", MethodModifiers::default());

        assert_eq!(rejection(&static_call), Some(Rejection::TypeLevel));
        assert_eq!(rejection(&final_call), Some(Rejection::SealedMethod));
        assert_eq!(rejection(&sealed_type_call), Some(Rejection::SealedDeclaringType));
        assert_eq!(rejection(&enum_call), Some(Rejection::SealedDeclaringType));

        let method = method_with(vec![static_call, final_call, sealed_type_call, enum_call]);
        assert!(nested_invocation_map(&method).is_empty());
        assert_eq!(classify_invocations(&method).len(), 4);
    }

    #[test]
    fn test_abstract_target_type_is_still_mockable() {
        let mut base = DeclaringType::class("a.Base");
        base.is_abstract = true;
        let mut api = DeclaringType::class("a.Api");
        api.kind = TypeKind::Interface;
        let method = method_with(vec![
            target(base, "hook", MethodModifiers::default()),
            target(api, "call", MethodModifiers::default()),
        ]);
        assert_eq!(nested_invocation_map(&method).len(), 2);
    }

    #[test]
    fn test_target_in_static_nested_type_is_not_mockable() {
        let mut holder = DeclaringType::class("a.Outer$Holder");
        holder.is_static = true;
        let site = target(holder, "value", MethodModifiers::default());
        assert_eq!(rejection(&site), Some(Rejection::StaticDeclaringType));
        assert_eq!(Rejection::StaticDeclaringType.to_string(), "static declaring type");

        let method = method_with(vec![
            site,
            target(DeclaringType::class("a.Outer$Member"), "value", MethodModifiers::default()),
        ]);
        let map = nested_invocation_map(&method);
        assert_eq!(map.len(), 1);
        assert!(map.keys().all(|k| k.target.starts_with("a.Outer$Member#")));
    }

    #[test]
    fn test_self_call_uses_the_same_rule() {
        let own = DeclaringType::class("org.example.Endpoint");
        let method = method_with(vec![target(
            own,
            "getDebugState",
            MethodModifiers::default(),
        )]);
        assert_eq!(nested_invocation_map(&method).len(), 1);
    }

    #[test]
    fn test_mockable_sites_satisfy_every_rule() {
        let mut sealed = DeclaringType::class("a.S");
        sealed.is_final = true;
        let candidates = vec![
            target(DeclaringType::class("a.A"), "m", MethodModifiers::default()),
            target(
                DeclaringType::class("a.A"),
                "s",
                MethodModifiers {
                    is_static: true,
                    ..MethodModifiers::default()
                },
            ),
            target(sealed, "t", MethodModifiers::default()),
        ];
        let method = method_with(candidates);
        for site in &method.invocations {
            if is_mockable(site) {
                assert!(!site.target.is_type_level());
                assert!(!site.target.modifiers.is_final);
                assert!(!site.target.declaring_type.is_sealed());
                assert!(!site.target.declaring_type.is_static);
            }
        }
    }
}
