//! Static registry mapping operation ids to constructors.
//!
//! The registry replaces reflection-style runtime type lookup with a
//! closed table assembled at startup: each entry pairs an id with its
//! static port topology and a plain constructor function.
//! `pixelgraph_ops::builtin_registry()` fills it with the built-in
//! operation set.

use crate::{GraphError, GraphResult, OpError, ParamMap, PixelOp, PortDef};
use std::collections::HashMap;

/// Constructor signature for one operation type.
pub type OpConstructor = fn(&ParamMap) -> Result<Box<dyn PixelOp>, OpError>;

/// Static description of one registered operation type.
#[derive(Clone, Copy)]
pub struct OpSpec {
    /// Input ports, in declaration order. Sources declare none.
    pub input_ports: &'static [PortDef],
    /// Builds an instance from node parameters.
    pub build: OpConstructor,
}

impl OpSpec {
    /// Looks up a port definition by name.
    pub fn port(&self, name: &str) -> Option<&PortDef> {
        self.input_ports.iter().find(|p| p.name == name)
    }
}

impl std::fmt::Debug for OpSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpSpec")
            .field("input_ports", &self.input_ports)
            .finish_non_exhaustive()
    }
}

/// Registry of operation types available to a [`GraphContext`](crate::GraphContext).
#[derive(Debug, Default)]
pub struct OpRegistry {
    ops: HashMap<&'static str, OpSpec>,
}

impl OpRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operation type. Re-registering an id replaces it.
    pub fn register(&mut self, id: &'static str, spec: OpSpec) {
        self.ops.insert(id, spec);
    }

    /// Whether the id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.ops.contains_key(id)
    }

    /// The static spec for an id.
    pub fn spec(&self, id: &str) -> GraphResult<&OpSpec> {
        self.ops
            .get(id)
            .ok_or_else(|| GraphError::UnknownOperation(id.to_owned()))
    }

    /// Builds an operation instance from parameters.
    pub fn instantiate(&self, id: &str, params: &ParamMap) -> GraphResult<Box<dyn PixelOp>> {
        let spec = self.spec(id)?;
        Ok((spec.build)(params)?)
    }

    /// Registered ids, unordered.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ops.keys().copied()
    }

    /// Number of registered operation types.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
