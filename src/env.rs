// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 procpipe contributors

//! Environment policy
//!
//! A pipeline either inherits the ambient process environment or runs with an
//! explicit override mapping. The override does not layer on top of the
//! ambient environment: when present it is the only source for `$NAME`
//! expansion and the only environment the stages see.

use std::collections::BTreeMap;

use crate::errors::ParseError;

/// Where variables come from for expansion and for the spawned stages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnvPolicy {
    /// Resolve against, and pass through, the ambient process environment
    #[default]
    Inherit,
    /// Resolve only against this mapping; stages get exactly these variables
    Override(BTreeMap<String, String>),
}

impl EnvPolicy {
    /// Override policy seeded from the ambient environment, with `overrides`
    /// taking precedence.
    pub fn inherit_with<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut vars: BTreeMap<String, String> = std::env::vars().collect();
        vars.extend(overrides.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self::Override(vars)
    }

    /// Whether this policy replaces the ambient environment
    pub fn is_override(&self) -> bool {
        matches!(self, Self::Override(_))
    }

    /// Look up a variable. Missing variables resolve to the empty string.
    pub fn lookup(&self, name: &str) -> String {
        match self {
            Self::Inherit => std::env::var(name).unwrap_or_default(),
            Self::Override(vars) => vars.get(name).cloned().unwrap_or_default(),
        }
    }

    /// The variable list handed to each stage, or `None` to inherit.
    ///
    /// Values may reference the ambient environment (`PATH=$PATH:/opt/bin`).
    pub fn materialize(&self) -> Option<Vec<(String, String)>> {
        match self {
            Self::Inherit => None,
            Self::Override(vars) => Some(
                vars.iter()
                    .map(|(k, v)| (k.clone(), crate::command::expand(v, &Self::Inherit)))
                    .collect(),
            ),
        }
    }
}

/// Parse `KEY=VALUE` entries into a mapping. Later duplicates win.
pub fn parse_env<I, S>(entries: I) -> Result<BTreeMap<String, String>, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut vars = BTreeMap::new();

    for entry in entries {
        let entry = entry.as_ref();
        match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                vars.insert(key.to_string(), value.to_string());
            }
            _ => {
                return Err(ParseError::InvalidEnvEntry {
                    entry: entry.to_string(),
                })
            }
        }
    }

    Ok(vars)
}
