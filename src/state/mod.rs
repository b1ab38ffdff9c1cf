//! Application state: the selection store and the settings store.

mod selection;
mod settings;

pub use selection::{LoadingFlag, SelectionState, SelectionStore};
pub use settings::{PreviewSurface, Settings};
