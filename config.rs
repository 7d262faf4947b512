//! Guard sets, groups and the full Candy Guard configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    guards::GuardSettings,
    registry::GuardRegistry,
    types::CandyGuardError,
};

/// Enabled guards keyed by name. A name that is not present is disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardSet<T> {
    guards: BTreeMap<String, T>,
}

impl<T> Default for GuardSet<T> {
    fn default() -> Self {
        Self {
            guards: BTreeMap::new(),
        }
    }
}

impl<T> GuardSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable a guard, builder style
    pub fn with(mut self, name: impl Into<String>, settings: impl Into<T>) -> Self {
        self.guards.insert(name.into(), settings.into());
        self
    }

    /// Enable (`Some`) or disable (`None`) a guard
    pub fn set(&mut self, name: impl Into<String>, settings: Option<T>) {
        let name = name.into();
        match settings {
            Some(settings) => {
                self.guards.insert(name, settings);
            }
            None => {
                self.guards.remove(&name);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.guards.get(name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.guards.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.guards.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.guards.iter().map(|(name, settings)| (name.as_str(), settings))
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl<T, S: Into<String>> FromIterator<(S, T)> for GuardSet<T> {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        Self {
            guards: iter
                .into_iter()
                .map(|(name, settings)| (name.into(), settings))
                .collect(),
        }
    }
}

/// Named alternative guard set selectable at mint time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardGroup<T> {
    pub label: String,
    pub guards: GuardSet<T>,
}

impl<T> GuardGroup<T> {
    pub fn new(label: impl Into<String>, guards: GuardSet<T>) -> Self {
        Self {
            label: label.into(),
            guards,
        }
    }
}

/// Guard names enabled in `guards` followed by those enabled in each group
pub(crate) fn referenced_guards<'a, T>(
    guards: &'a GuardSet<T>,
    groups: &'a [GuardGroup<T>],
) -> impl Iterator<Item = &'a str> {
    guards
        .names()
        .chain(groups.iter().flat_map(|group| group.guards.names()))
}

/// Default guards plus the ordered groups overriding them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandyGuardConfiguration<T = GuardSettings> {
    pub guards: GuardSet<T>,
    pub groups: Vec<GuardGroup<T>>,
}

impl<T> Default for CandyGuardConfiguration<T> {
    fn default() -> Self {
        Self {
            guards: GuardSet::default(),
            groups: Vec::new(),
        }
    }
}

impl<T> CandyGuardConfiguration<T> {
    pub fn new(guards: GuardSet<T>, groups: Vec<GuardGroup<T>>) -> Self {
        Self { guards, groups }
    }

    pub fn group_labels(&self) -> Vec<String> {
        self.groups.iter().map(|group| group.label.clone()).collect()
    }

    /// Every guard name enabled at the default level or in any group
    pub fn referenced_guards(&self) -> impl Iterator<Item = &str> {
        referenced_guards(&self.guards, &self.groups)
    }
}

#[derive(Serialize, Deserialize, Default)]
struct RawGuardGroup {
    label: String,
    #[serde(default)]
    guards: BTreeMap<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize, Default)]
struct RawConfiguration {
    #[serde(default)]
    guards: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    groups: Vec<RawGuardGroup>,
}

fn decode_json_set(
    raw: BTreeMap<String, serde_json::Value>,
    registry: &GuardRegistry,
) -> Result<GuardSet<GuardSettings>, CandyGuardError> {
    let mut set = GuardSet::new();
    for (name, value) in raw {
        if value.is_null() {
            continue;
        }
        let settings = registry.get(&name)?.settings_from_json(value)?;
        set.set(name, Some(settings));
    }
    Ok(set)
}

fn encode_json_set(
    set: &GuardSet<GuardSettings>,
) -> Result<BTreeMap<String, serde_json::Value>, CandyGuardError> {
    set.iter()
        .map(|(name, settings)| {
            serde_json::to_value(settings)
                .map(|value| (name.to_string(), value))
                .map_err(|e| CandyGuardError::InvalidJson(e.to_string()))
        })
        .collect()
}

impl CandyGuardConfiguration<GuardSettings> {
    /// Parse a configuration such as
    /// `{"guards": {"startDate": {"date": 0}}, "groups": [{"label": "vip", "guards": {}}]}`.
    ///
    /// A guard mapped to `null` is disabled. Settings are decoded with the
    /// registered descriptor for each guard name.
    pub fn from_json(json: &str, registry: &GuardRegistry) -> Result<Self, CandyGuardError> {
        let raw: RawConfiguration =
            serde_json::from_str(json).map_err(|e| CandyGuardError::InvalidJson(e.to_string()))?;

        let guards = decode_json_set(raw.guards, registry)?;
        let groups = raw
            .groups
            .into_iter()
            .map(|group| {
                Ok(GuardGroup::new(
                    group.label,
                    decode_json_set(group.guards, registry)?,
                ))
            })
            .collect::<Result<Vec<_>, CandyGuardError>>()?;

        Ok(Self { guards, groups })
    }

    pub fn to_json(&self) -> Result<String, CandyGuardError> {
        let raw = RawConfiguration {
            guards: encode_json_set(&self.guards)?,
            groups: self
                .groups
                .iter()
                .map(|group| {
                    Ok(RawGuardGroup {
                        label: group.label.clone(),
                        guards: encode_json_set(&group.guards)?,
                    })
                })
                .collect::<Result<Vec<_>, CandyGuardError>>()?,
        };
        serde_json::to_string_pretty(&raw).map_err(|e| CandyGuardError::InvalidJson(e.to_string()))
    }
}
