//! Embedded viewer adapter: the document side of the bridge.
//!
//! The third-party viewer is a black box reached by URL. The adapter
//! preflights the document, opens the surface, turns the surface's signals
//! into normalized bridge events and applies host commands back to it.

mod adapter;
mod loader;
mod page;
mod signal;
mod surface;

pub use adapter::{AdapterStatus, ViewerAdapter};
pub use loader::{
    DocumentInfo, DocumentLoader, HttpDocumentLoader, LoadFailure, LoadFailureKind, LoadToken,
};
pub use page::{HostPage, render_host_page};
pub use signal::{ViewerSignal, parse_page_indicator};
pub use surface::{StdioSurface, SurfaceCommand, ViewerSurface};
