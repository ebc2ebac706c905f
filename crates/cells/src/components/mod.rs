//! Cell types every page can use without a plugin.

mod columns;
mod container;
mod flex;
mod root;
mod span;
mod text;

pub use columns::Columns;
pub use container::Container;
pub use flex::Flex;
pub use root::RootCell;
pub use span::Span;
pub use text::Text;

use crate::behavior::StructuralCell;
use crate::registry::{CellRegistry, Structure};

pub fn register_builtin_cells(registry: &mut CellRegistry) {
    registry.register_cell_type("RootCell", Structure::Composite, |_| Box::new(RootCell));
    registry.register_cell_type("Text", Structure::Leaf, |_| Box::new(Text));
    registry.register_cell_type("Span", Structure::Leaf, |_| Box::new(Span));
    registry.register_cell_type("Container", Structure::Composite, |_| Box::new(Container));
    registry.register_cell_type("Columns", Structure::Composite, |_| Box::new(Columns));
    registry.register_cell_type("Flex", Structure::Composite, |_| Box::new(Flex));
    registry.register_cell_type("Sequence", Structure::Sequence, |_| Box::new(StructuralCell));
    registry.register_cell_type("Subscribed", Structure::Passthrough, |_| Box::new(StructuralCell));
}
