//! Category domain type.

use serde::Serialize;

use orchard_core::CategoryId;

/// A product category.
///
/// Categories are referenced by products but do not own them.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// Icon identifier for the frontend.
    pub icon: Option<String>,
    /// Display color (e.g. `#55879a`).
    pub color: Option<String>,
}
