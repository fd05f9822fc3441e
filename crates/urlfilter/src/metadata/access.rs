//! Deny-list access control.

use super::{AccessControl, PropertyPath};
use std::collections::HashSet;

/// Hides individual attributes from the current user.
///
/// Hiding a reference also hides every path that goes through it:
/// hiding `Order.customer` hides `Order.customer.name`.
#[derive(Debug, Clone, Default)]
pub struct AttributeAccess {
    hidden: HashSet<(String, String)>,
}

impl AttributeAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hide(mut self, entity: impl Into<String>, path: impl Into<String>) -> Self {
        self.hidden.insert((entity.into(), path.into()));
        self
    }

    pub fn is_hidden(&self, entity: &str, path: &str) -> bool {
        let mut prefix = String::new();
        for segment in path.split('.') {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            if self
                .hidden
                .contains(&(entity.to_string(), prefix.clone()))
            {
                return true;
            }
        }
        false
    }
}

impl AccessControl for AttributeAccess {
    fn can_view(&self, path: &PropertyPath) -> bool {
        !self.is_hidden(&path.entity, &path.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_attribute_and_its_children_are_denied() {
        let access = AttributeAccess::new().hide("Order", "customer");
        assert!(access.is_hidden("Order", "customer"));
        assert!(access.is_hidden("Order", "customer.name"));
        assert!(!access.is_hidden("Order", "number"));
        assert!(!access.is_hidden("Order", "customerNote"));
        assert!(!access.is_hidden("Invoice", "customer"));
    }
}
