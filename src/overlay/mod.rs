//! Detail sheet overlays
//!
//! # Architecture
//!
//! ```text
//! caller ──open/close──▶ SheetRegistry ──watch──▶ renderer
//!                            │                       │
//!                        AuthProbe              PanelTable (one fn per kind)
//! ```
//!
//! Opening a sheet is gated by a session check; a failed check drops the
//! request without surfacing an error.

pub mod kind;
pub mod registry;
pub mod render;

pub use kind::{SheetKind, SheetPayload};
pub use registry::{SheetEntry, SheetOpen, SheetRegistry};
pub use render::{dispatch, render, OpenChange, PanelProps, PanelTable, TextPanels};
