use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A billing party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub reference: String,
    pub name: String,
}

/// Customer/partner registry, read-only from the billing side.
pub trait PartnerRegistry {
    fn find(&self, reference: &str) -> Option<Partner>;
}

/// In-memory [`PartnerRegistry`].
#[derive(Debug, Clone, Default)]
pub struct MemoryPartnerRegistry {
    partners: HashMap<String, Partner>,
}

impl MemoryPartnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, reference: impl Into<String>, name: impl Into<String>) {
        let reference = reference.into();
        self.partners.insert(
            reference.clone(),
            Partner {
                reference,
                name: name.into(),
            },
        );
    }

    pub fn with(mut self, reference: impl Into<String>, name: impl Into<String>) -> Self {
        self.add(reference, name);
        self
    }
}

impl PartnerRegistry for MemoryPartnerRegistry {
    fn find(&self, reference: &str) -> Option<Partner> {
        self.partners.get(reference).cloned()
    }
}
