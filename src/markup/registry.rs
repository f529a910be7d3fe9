use std::collections::BTreeMap;

use crate::markup::params::{TagParams, parse_bool};

/// How a resolved span's range is derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TagArity {
    /// Spans from the open tag to its close tag (or to document end).
    Block,
    /// Point-in-time tag: always covers exactly one index, `[start, start + 1)`.
    Index,
}

/// Value type a parameter must parse as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ParamType {
    /// Finite floating point number.
    Float,
    /// Signed integer.
    Int,
    /// `true`/`false`/`1`/`0`/`yes`/`no`, or a bare flag.
    Bool,
    /// Any text.
    Text,
}

impl ParamType {
    fn accepts(self, value: &str) -> bool {
        match self {
            Self::Float => value.parse::<f64>().is_ok_and(f64::is_finite),
            Self::Int => value.parse::<i64>().is_ok(),
            Self::Bool => parse_bool(value).is_some(),
            Self::Text => true,
        }
    }
}

/// Whether keys not declared in a schema are tolerated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Unknown keys reject the tag.
    #[default]
    Strict,
    /// Unknown keys are ignored.
    Lenient,
}

/// One declared parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    /// Canonical key.
    pub key: String,
    /// Alternative spellings accepted for the same key.
    pub aliases: Vec<String>,
    /// Expected value type.
    pub ty: ParamType,
}

impl ParamSpec {
    /// Declare `key` with type `ty`.
    pub fn new(key: &str, ty: ParamType) -> Self {
        Self {
            key: key.to_owned(),
            aliases: Vec::new(),
            ty,
        }
    }

    /// Add accepted aliases.
    pub fn alias(mut self, names: &[&str]) -> Self {
        self.aliases.extend(names.iter().map(|s| (*s).to_owned()));
        self
    }

    fn matches(&self, key: &str) -> bool {
        self.key == key || self.aliases.iter().any(|a| a == key)
    }
}

/// Declared parameter surface of an effect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamSchema {
    /// Type of the anonymous default value; `None` forbids a default.
    pub default: Option<ParamType>,
    /// Keyed parameters.
    pub params: Vec<ParamSpec>,
    /// Unknown-key policy.
    pub strictness: Strictness,
}

impl ParamSchema {
    /// Schema that accepts no parameters at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Allow an anonymous default of type `ty`.
    pub fn with_default(mut self, ty: ParamType) -> Self {
        self.default = Some(ty);
        self
    }

    /// Declare a keyed parameter.
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Declare the per-instance invocation flags `instant`, `skip` and `repeat`.
    pub fn with_invoke_flags(self) -> Self {
        self.param(ParamSpec::new("instant", ParamType::Bool))
            .param(ParamSpec::new("skip", ParamType::Bool))
            .param(ParamSpec::new("repeat", ParamType::Bool))
    }

    /// Override the unknown-key policy.
    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Check `params` against this schema.
    pub fn validate(&self, params: &TagParams) -> bool {
        if let Some(v) = params.default.as_deref() {
            match self.default {
                Some(ty) if ty.accepts(v) => {}
                _ => return false,
            }
        }

        for (key, value) in &params.values {
            match self.params.iter().find(|p| p.matches(key)) {
                Some(spec) => {
                    if !spec.ty.accepts(value) {
                        return false;
                    }
                }
                None => {
                    if self.strictness == Strictness::Strict {
                        return false;
                    }
                }
            }
        }

        // An alias and its canonical key must not both be given.
        self.params.iter().all(|spec| {
            params.values.keys().filter(|k| spec.matches(k)).count() <= 1
        })
    }
}

/// Invocation timing defaults for event/command effects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InvokePolicy {
    /// Fire as soon as processing starts instead of when the character is reached.
    pub execute_instantly: bool,
    /// Fire even when the writer jumps past the character.
    pub execute_on_skip: bool,
    /// Allow re-triggering after a rewind.
    pub repeatable: bool,
}

impl InvokePolicy {
    /// Apply per-instance `instant`/`skip`/`repeat` overrides.
    pub fn with_overrides(self, params: &TagParams) -> Self {
        Self {
            execute_instantly: params.get_flag("instant").unwrap_or(self.execute_instantly),
            execute_on_skip: params.get_flag("skip").unwrap_or(self.execute_on_skip),
            repeatable: params.get_flag("repeat").unwrap_or(self.repeatable),
        }
    }
}

/// An effect a tag name resolves to.
pub trait TagEffect: Send + Sync + std::fmt::Debug {
    /// How the span range is computed.
    fn arity(&self) -> TagArity {
        TagArity::Block
    }

    /// Whether `params` are acceptable for this effect.
    fn validate_parameters(&self, params: &TagParams) -> bool;

    /// Invocation defaults, used for event and command spans.
    fn invoke_policy(&self) -> InvokePolicy {
        InvokePolicy::default()
    }
}

/// Name-to-effect lookup consulted by a tag processor.
pub trait EffectRegistry: Send + Sync + std::fmt::Debug {
    /// Whether `name` is registered.
    fn contains(&self, name: &str) -> bool;

    /// Effect registered for `name`.
    fn get_effect(&self, name: &str) -> Option<&dyn TagEffect>;
}

/// Schema-validated effect definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectDef {
    /// Span arity.
    pub arity: TagArity,
    /// Accepted parameters.
    pub schema: ParamSchema,
    /// Invocation defaults.
    pub policy: InvokePolicy,
}

impl EffectDef {
    /// Block effect with the given schema.
    pub fn block(schema: ParamSchema) -> Self {
        Self {
            arity: TagArity::Block,
            schema,
            policy: InvokePolicy::default(),
        }
    }

    /// Index effect with the given schema.
    pub fn index(schema: ParamSchema) -> Self {
        Self {
            arity: TagArity::Index,
            schema,
            policy: InvokePolicy::default(),
        }
    }

    /// Replace the invocation defaults.
    pub fn policy(mut self, policy: InvokePolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl TagEffect for EffectDef {
    fn arity(&self) -> TagArity {
        self.arity
    }

    fn validate_parameters(&self, params: &TagParams) -> bool {
        self.schema.validate(params)
    }

    fn invoke_policy(&self) -> InvokePolicy {
        self.policy
    }
}

/// Registry backed by an ordered map.
#[derive(Debug, Default)]
pub struct Registry {
    effects: BTreeMap<String, Box<dyn TagEffect>>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) `name`.
    pub fn register(&mut self, name: &str, effect: impl TagEffect + 'static) -> &mut Self {
        self.effects.insert(name.to_owned(), Box::new(effect));
        self
    }

    /// Registered names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.effects.keys().map(String::as_str)
    }

    /// Number of registered effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Return `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl EffectRegistry for Registry {
    fn contains(&self, name: &str) -> bool {
        self.effects.contains_key(name)
    }

    fn get_effect(&self, name: &str) -> Option<&dyn TagEffect> {
        self.effects.get(name).map(|b| b.as_ref())
    }
}

/// Registry that accepts every name as an index effect with free-form parameters.
///
/// Events are author-defined messages, so any `<?name ...>` is meaningful to the host.
#[derive(Debug, Default)]
pub struct OpenRegistry {
    effect: OpenEffect,
}

impl OpenRegistry {
    /// Open registry whose tags use `policy` as their defaults.
    pub fn with_policy(policy: InvokePolicy) -> Self {
        Self {
            effect: OpenEffect { policy },
        }
    }
}

#[derive(Debug, Default)]
struct OpenEffect {
    policy: InvokePolicy,
}

impl TagEffect for OpenEffect {
    fn arity(&self) -> TagArity {
        TagArity::Index
    }

    fn validate_parameters(&self, params: &TagParams) -> bool {
        ["instant", "skip", "repeat"]
            .iter()
            .all(|k| params.get(k).is_none_or(|v| parse_bool(v).is_some()))
    }

    fn invoke_policy(&self) -> InvokePolicy {
        self.policy
    }
}

impl EffectRegistry for OpenRegistry {
    fn contains(&self, _name: &str) -> bool {
        true
    }

    fn get_effect(&self, _name: &str) -> Option<&dyn TagEffect> {
        Some(&self.effect)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/markup/registry.rs"]
mod tests;
