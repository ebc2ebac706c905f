#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]
#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Inlining decisions left to compiler for this crate"
)]

//! Client side of a server driven cell UI.
//!
//! A backend emits *frames*: batches of cell creations, updates, discards and
//! opaque messages. [`CellHandler`] applies each frame to a [`CellTree`],
//! keeping every cell's identity and DOM element stable while only the parts
//! that changed are re-rendered into the [`dom::Dom`].
//!
//! Cells reference each other only through [`CellId`]s; the tree resolves
//! them at the point of use. The behaviour of a concrete cell type lives
//! behind [`CellBehavior`], while the structural algorithms (composite slot
//! caching, pass-through and sequence folding) are chosen per type through
//! [`Structure`] when the type is registered in the [`CellRegistry`].

pub mod behavior;
pub mod children;
pub mod components;
pub mod composite;
pub mod config;
pub mod context;
pub mod error;
pub mod focus;
pub mod frame;
pub mod handler;
pub mod identity;
pub mod packets;
pub mod registry;
pub mod socket;
pub mod structural;
pub mod telemetry;
pub mod tree;

pub use behavior::{CellBehavior, StructuralCell};
pub use children::{ChildRef, NamedChildren};
pub use config::CellsConfig;
pub use context::{BuildContext, CellContext};
pub use error::FrameError;
pub use frame::{CreatedCell, Frame, InboundMessage, Props, TypeDefinition, UpdatedCell};
pub use handler::CellHandler;
pub use identity::{CellId, ROOT_CELL_ID};
pub use packets::{PacketCallback, PacketStore};
pub use registry::{CellInit, CellRegistry, CellType, PluginTable, Structure};
pub use socket::{CellSocket, ChannelTransport, SocketEvent, Transport};
pub use telemetry::FrameStats;
pub use tree::{CellNode, CellTree};
