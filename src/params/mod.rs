// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Global parameter catalog.
//!
//! Static definitions of every global setting the instrument exposes over
//! SysEx: id, type, bounds, factory default, and how to render a value.

pub mod catalog;
pub mod dependencies;
pub mod display;

use std::collections::BTreeMap;
use std::fmt;

pub use catalog::PARAMETERS;
pub use dependencies::{is_editable, DependencyRule, DEPENDENCY_RULES};

/// Parameter id of the unit identifier, used as a cheap connectivity probe
pub const UNIT_ID_PARAMETER: u8 = 0;

/// Grouping used by the editor tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    MidiCommunication,
    PerformanceKeyboard,
    ArpSequencer,
    AudioCv,
    Advanced,
}

impl Category {
    /// Tab label
    pub fn label(&self) -> &'static str {
        match self {
            Category::MidiCommunication => "MIDI & Communication",
            Category::PerformanceKeyboard => "Performance & Keyboard",
            Category::ArpSequencer => "Arp/Sequencer",
            Category::AudioCv => "Audio & CV",
            Category::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Value domain of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Off/on, 0 or 1
    Toggle,
    /// Discrete codes with labels, sorted by code
    Choice(&'static [(u16, &'static str)]),
    /// Inclusive range
    Range { min: u16, max: u16 },
    /// Channel index 0-15, shown as 1-16
    MidiChannel,
}

/// Static definition of one global parameter
#[derive(Clone, Copy)]
pub struct ParameterDef {
    pub id: u8,
    pub name: &'static str,
    pub category: Category,
    pub kind: ParameterKind,
    pub default: u16,
    pub description: &'static str,
    pub tooltip: Option<&'static str>,
    pub formatter: Option<fn(u16) -> String>,
}

impl fmt::Debug for ParameterDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterDef")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("default", &self.default)
            .finish()
    }
}

impl ParameterDef {
    const fn new(
        id: u8,
        name: &'static str,
        category: Category,
        kind: ParameterKind,
        default: u16,
        description: &'static str,
    ) -> Self {
        Self {
            id,
            name,
            category,
            kind,
            default,
            description,
            tooltip: None,
            formatter: None,
        }
    }

    pub(crate) const fn toggle(
        id: u8,
        name: &'static str,
        category: Category,
        default: u16,
        description: &'static str,
    ) -> Self {
        Self::new(id, name, category, ParameterKind::Toggle, default, description)
    }

    pub(crate) const fn choice(
        id: u8,
        name: &'static str,
        category: Category,
        default: u16,
        description: &'static str,
        choices: &'static [(u16, &'static str)],
    ) -> Self {
        Self::new(
            id,
            name,
            category,
            ParameterKind::Choice(choices),
            default,
            description,
        )
    }

    pub(crate) const fn range(
        id: u8,
        name: &'static str,
        category: Category,
        default: u16,
        description: &'static str,
        min: u16,
        max: u16,
    ) -> Self {
        Self::new(
            id,
            name,
            category,
            ParameterKind::Range { min, max },
            default,
            description,
        )
    }

    pub(crate) const fn channel(
        id: u8,
        name: &'static str,
        category: Category,
        default: u16,
        description: &'static str,
    ) -> Self {
        Self::new(id, name, category, ParameterKind::MidiChannel, default, description)
    }

    pub(crate) const fn with_tooltip(mut self, tooltip: &'static str) -> Self {
        self.tooltip = Some(tooltip);
        self
    }

    pub(crate) const fn with_formatter(mut self, formatter: fn(u16) -> String) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Tooltip text, falling back to the description
    pub fn tooltip(&self) -> &'static str {
        self.tooltip.unwrap_or(self.description)
    }

    /// Smallest and largest accepted value
    pub fn bounds(&self) -> (u16, u16) {
        match self.kind {
            ParameterKind::Toggle => (0, 1),
            ParameterKind::Choice(choices) => {
                let min = choices.iter().map(|(code, _)| *code).min().unwrap_or(0);
                let max = choices.iter().map(|(code, _)| *code).max().unwrap_or(0);
                (min, max)
            }
            ParameterKind::Range { min, max } => (min, max),
            ParameterKind::MidiChannel => (0, 15),
        }
    }

    /// Normalize an arbitrary value into the parameter's domain.
    ///
    /// Toggles collapse to 0/1, choices snap to the numerically closest code
    /// (lowest code on a tie), ranges and channels clamp.
    pub fn validate(&self, value: i32) -> u16 {
        match self.kind {
            ParameterKind::Toggle => u16::from(value != 0),
            ParameterKind::Choice(choices) => choices
                .iter()
                .map(|(code, _)| *code)
                .min_by_key(|code| (i32::from(*code) - value).abs())
                .unwrap_or(self.default),
            ParameterKind::Range { min, max } => {
                value.clamp(i32::from(min), i32::from(max)) as u16
            }
            ParameterKind::MidiChannel => value.clamp(0, 15) as u16,
        }
    }

    /// Whether `value` is already inside the domain
    pub fn accepts(&self, value: i32) -> bool {
        match self.kind {
            ParameterKind::Toggle => value == 0 || value == 1,
            ParameterKind::Choice(choices) => {
                choices.iter().any(|(code, _)| i32::from(*code) == value)
            }
            ParameterKind::Range { min, max } => {
                (i32::from(min)..=i32::from(max)).contains(&value)
            }
            ParameterKind::MidiChannel => (0..=15).contains(&value),
        }
    }

    /// Human-readable rendering of a value
    pub fn display(&self, value: u16) -> String {
        if let Some(formatter) = self.formatter {
            return formatter(value);
        }
        match self.kind {
            ParameterKind::Toggle if value != 0 => "On".to_string(),
            ParameterKind::Toggle => "Off".to_string(),
            ParameterKind::Choice(choices) => choices
                .iter()
                .find(|(code, _)| *code == value)
                .map(|(_, label)| label.to_string())
                .unwrap_or_else(|| format!("Unknown ({})", value)),
            ParameterKind::MidiChannel => format!("Channel {}", value + 1),
            ParameterKind::Range { .. } => value.to_string(),
        }
    }

    /// Whether `value` differs from the factory default
    pub fn is_customized(&self, value: u16) -> bool {
        value != self.default
    }
}

/// Look up a parameter by id
pub fn get(id: u8) -> Option<&'static ParameterDef> {
    PARAMETERS
        .binary_search_by_key(&id, |p| p.id)
        .ok()
        .map(|index| &PARAMETERS[index])
}

/// All parameter ids in ascending order
pub fn ids() -> Vec<u8> {
    PARAMETERS.iter().map(|p| p.id).collect()
}

/// Factory defaults for every parameter
pub fn defaults() -> BTreeMap<u8, u16> {
    PARAMETERS.iter().map(|p| (p.id, p.default)).collect()
}

/// Parameters grouped by category, each group sorted by name
pub fn by_category() -> BTreeMap<Category, Vec<&'static ParameterDef>> {
    let mut groups: BTreeMap<Category, Vec<&'static ParameterDef>> = BTreeMap::new();
    for param in PARAMETERS {
        groups.entry(param.category).or_default().push(param);
    }
    for params in groups.values_mut() {
        params.sort_by_key(|p| p.name);
    }
    groups
}
