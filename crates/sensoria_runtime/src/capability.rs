//! Capability descriptors: agents declare what they consume and produce,
//! and the orchestrator wires them by capability, not by concrete type.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Declares one agent's contract: named input/output shapes plus the
/// connectors it needs at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Agent name, unique within a registry ("reader", "emotion", ...).
    pub name: String,
    /// Input shape names this agent accepts ("text", "image_bytes", ...).
    pub inputs: Vec<String>,
    /// Output shape names it produces ("segments", "emotion_reading", ...).
    pub outputs: Vec<String>,
    /// Connector names it requires ("http", "sql", "vector").
    pub connectors: Vec<String>,
}

impl CapabilityDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            connectors: Vec::new(),
        }
    }

    pub fn consumes(mut self, shape: &str) -> Self {
        self.inputs.push(shape.to_string());
        self
    }

    pub fn produces(mut self, shape: &str) -> Self {
        self.outputs.push(shape.to_string());
        self
    }

    pub fn requires(mut self, connector: &str) -> Self {
        self.connectors.push(connector.to_string());
        self
    }
}

/// Registry the orchestrator composes against.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    agents: HashMap<String, CapabilityDescriptor>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Re-registering a name replaces it.
    pub fn register(&mut self, descriptor: CapabilityDescriptor) {
        if self
            .agents
            .insert(descriptor.name.clone(), descriptor.clone())
            .is_some()
        {
            tracing::debug!("capability {} re-registered", descriptor.name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityDescriptor> {
        self.agents.get(name)
    }

    /// All agents producing a given output shape, sorted by name so wiring
    /// is deterministic.
    pub fn producers_of(&self, output: &str) -> Vec<&CapabilityDescriptor> {
        let mut found: Vec<&CapabilityDescriptor> = self
            .agents
            .values()
            .filter(|d| d.outputs.iter().any(|o| o == output))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    /// All agents that accept a given input shape, sorted by name.
    pub fn consumers_of(&self, input: &str) -> Vec<&CapabilityDescriptor> {
        let mut found: Vec<&CapabilityDescriptor> = self
            .agents
            .values()
            .filter(|d| d.inputs.iter().any(|i| i == input))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registry() -> CapabilityRegistry {
        let mut reg = CapabilityRegistry::new();
        reg.register(
            CapabilityDescriptor::new("reader")
                .consumes("text")
                .produces("segments"),
        );
        reg.register(
            CapabilityDescriptor::new("emotion")
                .consumes("text")
                .consumes("image_bytes")
                .produces("emotion_reading")
                .requires("http"),
        );
        reg.register(
            CapabilityDescriptor::new("memory")
                .consumes("query")
                .produces("preferences")
                .requires("sql"),
        );
        reg
    }

    #[test]
    fn test_lookup_by_name() {
        let reg = sample_registry();
        assert!(reg.get("reader").is_some());
        assert!(reg.get("missing").is_none());
    }

    #[test]
    fn test_producers_of() {
        let reg = sample_registry();
        let producers = reg.producers_of("emotion_reading");
        assert_eq!(producers.len(), 1);
        assert_eq!(producers[0].name, "emotion");
    }

    #[test]
    fn test_consumers_of_text_sorted() {
        let reg = sample_registry();
        let consumers = reg.consumers_of("text");
        let names: Vec<&str> = consumers.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["emotion", "reader"]);
    }

    #[test]
    fn test_reregister_replaces() {
        let mut reg = sample_registry();
        reg.register(CapabilityDescriptor::new("reader").produces("chunks"));
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.get("reader").unwrap().outputs, vec!["chunks"]);
    }
}
