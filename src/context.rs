use async_graphql::Name;
use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use std::collections::HashMap;

use crate::value::FromConstValue;

/// Per-request data the executor threads into resolver invocations.
#[derive(Debug, Default, Clone)]
pub struct RequestMetadata {
    pub headers: HashMap<String, String>,
    pub vars: HashMap<String, String>,
}

/// The generic resolution context every resolver receives: the parent value
/// the executor is resolving against, the raw argument map, and request
/// metadata. Borrowed for the duration of one invocation.
#[derive(Debug)]
pub struct Ctx<'a> {
    value: Option<&'a ConstValue>,
    args: Option<&'a IndexMap<Name, ConstValue>>,
    metadata: &'a RequestMetadata,
}

impl<'a> Ctx<'a> {
    pub fn new(
        value: Option<&'a ConstValue>,
        args: Option<&'a IndexMap<Name, ConstValue>>,
        metadata: &'a RequestMetadata,
    ) -> Self {
        Self {
            value,
            args,
            metadata,
        }
    }

    pub fn arg(&self, name: &str) -> Option<&ConstValue> {
        self.args?.get(name)
    }

    pub fn arg_as<T: FromConstValue>(&self, name: &str) -> Option<T> {
        self.arg(name).and_then(|v| T::from_const_value(v).ok())
    }

    pub fn parent(&self) -> Option<&ConstValue> {
        self.value
    }

    pub fn parent_as<T: FromConstValue>(&self) -> Option<T> {
        self.value.and_then(|v| T::from_const_value(v).ok())
    }

    pub fn parent_field(&self, name: &str) -> Option<&ConstValue> {
        match self.value? {
            ConstValue::Object(obj) => obj.get(name),
            _ => None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.metadata.headers.get(name).map(|s| s.as_str())
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.metadata.vars.get(name).map(|s| s.as_str())
    }
}
