// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Editability rules between parameters.
//!
//! Some settings only have an effect while another one holds a particular
//! value. The rules are advisory: the editor greys controls out, the
//! connection manager never refuses a write because of them.

use std::collections::HashMap;

/// `parameter` is editable only while `predicate` holds for `requires`
#[derive(Clone, Copy)]
pub struct DependencyRule {
    pub parameter: u8,
    pub requires: u8,
    pub predicate: fn(u16) -> bool,
}

fn is_on(value: u16) -> bool {
    value != 0
}

/// All known dependency rules
pub static DEPENDENCY_RULES: &[DependencyRule] = &[
    // Update Unison on Note-Off needs Paraphonic Unison
    DependencyRule {
        parameter: 69,
        requires: 56,
        predicate: is_on,
    },
];

/// Whether `parameter` is editable given the current values.
///
/// Rules whose controlling parameter has no known value are ignored.
pub fn is_editable(parameter: u8, values: &HashMap<u8, u16>) -> bool {
    DEPENDENCY_RULES
        .iter()
        .filter(|rule| rule.parameter == parameter)
        .all(|rule| {
            values
                .get(&rule.requires)
                .map_or(true, |value| (rule.predicate)(*value))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unison_gates_note_off_update() {
        let mut values = HashMap::new();
        values.insert(56, 0);
        assert!(!is_editable(69, &values));

        values.insert(56, 1);
        assert!(is_editable(69, &values));
    }

    #[test]
    fn test_unknown_controller_value_is_permissive() {
        assert!(is_editable(69, &HashMap::new()));
    }

    #[test]
    fn test_unconstrained_parameter() {
        let mut values = HashMap::new();
        values.insert(56, 0);
        assert!(is_editable(23, &values));
    }

    #[test]
    fn test_rules_reference_catalog_entries() {
        for rule in DEPENDENCY_RULES {
            assert!(crate::params::get(rule.parameter).is_some());
            assert!(crate::params::get(rule.requires).is_some());
        }
    }
}
