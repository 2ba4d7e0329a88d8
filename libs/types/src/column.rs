//! Logical column declarations and host column mappings.
//!
//! A widget declares the logical columns it needs at handshake time; the
//! host owns the mapping from those logical names to its own column
//! identifiers. Both shapes travel over the wire as plain JSON: a
//! declaration entry is either a bare string (required column) or an
//! object with an `optional` flag, and a mapping value is a single host
//! column, an ordered list of host columns (a series), or null.

use crate::DeclarationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry in a widget's logical column declaration.
///
/// The bare form marks the column required; the described form carries an
/// explicit `optional` flag. Both forms may appear in one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSpec {
    /// Bare name; the column is required.
    Name(String),
    /// Full descriptor with optionality.
    Described {
        name: String,
        #[serde(default)]
        optional: bool,
    },
}

impl ColumnSpec {
    /// Declare a required column.
    pub fn required(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Declare an optional column.
    pub fn optional(name: impl Into<String>) -> Self {
        Self::Described {
            name: name.into(),
            optional: true,
        }
    }

    /// Logical name of the declared column.
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Described { name, .. } => name,
        }
    }

    /// Whether this entry, on its own, marks the column optional.
    pub fn is_optional(&self) -> bool {
        match self {
            Self::Name(_) => false,
            Self::Described { optional, .. } => *optional,
        }
    }
}

/// Ordered sequence of logical columns a widget requires.
///
/// Supplied once at handshake time and immutable afterwards. A name may
/// appear more than once (bare in one entry, described in another); the
/// first occurrence is authoritative for both order and optionality, and
/// [`ColumnDeclaration::validate`] flags the duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnDeclaration(Vec<ColumnSpec>);

impl ColumnDeclaration {
    pub fn new(specs: Vec<ColumnSpec>) -> Self {
        Self(specs)
    }

    /// Declaration of required columns only, from bare names.
    pub fn required<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(ColumnSpec::required).collect())
    }

    pub fn specs(&self) -> &[ColumnSpec] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in declared order, keeping only the first occurrence of
    /// each name.
    pub fn first_occurrences(&self) -> impl Iterator<Item = &ColumnSpec> {
        let mut seen = std::collections::BTreeSet::new();
        self.0.iter().filter(move |spec| seen.insert(spec.name()))
    }

    /// Whether the named column is optional, judged by its first
    /// occurrence in the declaration.
    pub fn is_optional(&self, name: &str) -> bool {
        self.0
            .iter()
            .find(|spec| spec.name() == name)
            .is_some_and(ColumnSpec::is_optional)
    }

    /// Reject empty names and flag names declared more than once.
    pub fn validate(&self) -> Result<(), DeclarationError> {
        let mut seen = std::collections::BTreeSet::new();
        for (position, spec) in self.0.iter().enumerate() {
            if spec.name().is_empty() {
                return Err(DeclarationError::EmptyName { position });
            }
            if !seen.insert(spec.name()) {
                return Err(DeclarationError::DuplicateColumn {
                    name: spec.name().to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Host columns backing one logical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappedColumns {
    /// A single host column.
    Column(String),
    /// An ordered group of host columns, exposed as one value list per row.
    Series(Vec<String>),
}

/// Active correspondence from logical column names to host columns.
///
/// Owned by the host; widgets hold read-only cached copies. A logical name
/// may map to nothing (JSON null), which the projector treats as unmapped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(BTreeMap<String, Option<MappedColumns>>);

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host columns for a logical name; `None` covers both an absent key
    /// and an explicit null entry.
    pub fn get(&self, name: &str) -> Option<&MappedColumns> {
        self.0.get(name).and_then(Option::as_ref)
    }

    pub fn insert(&mut self, name: impl Into<String>, target: MappedColumns) {
        self.0.insert(name.into(), Some(target));
    }

    /// Record a logical name the host offers nothing for.
    pub fn insert_unmapped(&mut self, name: impl Into<String>) {
        self.0.insert(name.into(), None);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
