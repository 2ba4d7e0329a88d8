//! # Trellis Widget Protocol Types
//!
//! Shared data model for the widget/host protocol: logical column
//! declarations, host column mappings, row and table payloads, and the push
//! notifications the host delivers to attached widgets.
//!
//! ## Design Philosophy
//!
//! - **Schema-free payloads**: the host's records carry arbitrary JSON
//!   values; the widget only names the logical columns it cares about.
//! - **Wire fidelity**: every type here (de)serializes to the exact JSON
//!   shapes exchanged with the host, camelCase field names included.
//! - **Pure model**: no I/O and no async in this crate; transports and the
//!   client build on top of it.
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{ColumnDeclaration, ColumnSpec, ColumnMapping, MappedColumns};
//!
//! let declaration = ColumnDeclaration::new(vec![
//!     ColumnSpec::required("title"),
//!     ColumnSpec::optional("subtitle"),
//! ]);
//! declaration.validate().unwrap();
//!
//! let mut mapping = ColumnMapping::new();
//! mapping.insert("title", MappedColumns::Column("A".to_string()));
//! assert!(mapping.get("title").is_some());
//! ```

pub mod column;
pub mod notification;
pub mod records;
pub mod settings;

pub use column::{ColumnDeclaration, ColumnMapping, ColumnSpec, MappedColumns};
pub use notification::{HostNotification, NotificationClass};
pub use records::{Record, RowId, RowRef, TableRecords};
pub use settings::{AccessLevel, WidgetConfig};

/// Errors raised when validating a widget's column declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeclarationError {
    #[error("column name is empty at position {position}")]
    EmptyName { position: usize },

    #[error("column '{name}' is declared more than once; the first occurrence wins")]
    DuplicateColumn { name: String },
}
