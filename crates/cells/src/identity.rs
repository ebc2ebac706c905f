use core::borrow::Borrow;
use core::fmt;

use serde::{Deserialize, Serialize};

/// Identity of the cell that owns the page mount point.
pub const ROOT_CELL_ID: &str = "page_root";

/// Prefix of the `id` attribute cells put on their elements.
pub const ELEMENT_ID_PREFIX: &str = "cell-";

/// Opaque, server assigned identity of a cell. Stable for the cell's life.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn root() -> Self {
        Self(ROOT_CELL_ID.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_CELL_ID
    }

    /// Value of the `id` attribute of this cell's element, `cell-<identity>`.
    pub fn element_id(&self) -> String {
        format!("{ELEMENT_ID_PREFIX}{}", self.0)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellId {
    fn from(identity: &str) -> Self {
        Self(identity.to_owned())
    }
}

impl From<String> for CellId {
    fn from(identity: String) -> Self {
        Self(identity)
    }
}

impl Borrow<str> for CellId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Server-side target of focus events and other handler level messages.
pub const MAIN_CELLS_HANDLER: &str = "main_cells_handler";

/// Server-side target of session bookkeeping messages.
pub const MAIN_CELLS_SESSION: &str = "main_cells_session";
