//! Selection state: the selected shape, its fills and the images derived from it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::model::{Fills, HostSelection, PixelBuffer};

/// Busy flags shown by the plugin UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingFlag {
    /// Waiting for the host to deliver image bytes
    Loading,
    /// A preview transform or decode is running
    PreviewLoading,
    Pixelizing,
    UploadingFill,
    Transforming,
}

/// Everything the plugin knows about the current selection.
///
/// Image buffers only mean something while `id` and `fills` are set;
/// every reset drops them together with the flags.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionState {
    pub id: String,
    pub name: String,
    pub fills: Fills,
    pub original_image: Option<PixelBuffer>,
    pub preview_image: Option<PixelBuffer>,
    pub exported_image: Option<PixelBuffer>,
    pub is_loading: bool,
    pub is_preview_loading: bool,
    pub is_pixelizing: bool,
    pub is_uploading_fill: bool,
    pub is_transforming: bool,
    /// User-facing error; only set when ingesting exported bytes fails
    pub error: Option<String>,
}

impl SelectionState {
    /// A cleared state carrying the host's identity and fills.
    pub fn from_host(selection: HostSelection) -> Self {
        let expects_image = matches!(&selection.fills, Fills::Uniform(list) if !list.is_empty());
        Self {
            id: selection.id,
            name: selection.name,
            fills: selection.fills,
            is_preview_loading: expects_image,
            ..Default::default()
        }
    }

    /// True while there is a shape with fills to work on.
    pub fn has_selection(&self) -> bool {
        !self.id.is_empty() && !self.fills.is_empty()
    }

    pub fn flag(&self, flag: LoadingFlag) -> bool {
        match flag {
            LoadingFlag::Loading => self.is_loading,
            LoadingFlag::PreviewLoading => self.is_preview_loading,
            LoadingFlag::Pixelizing => self.is_pixelizing,
            LoadingFlag::UploadingFill => self.is_uploading_fill,
            LoadingFlag::Transforming => self.is_transforming,
        }
    }

    fn flag_mut(&mut self, flag: LoadingFlag) -> &mut bool {
        match flag {
            LoadingFlag::Loading => &mut self.is_loading,
            LoadingFlag::PreviewLoading => &mut self.is_preview_loading,
            LoadingFlag::Pixelizing => &mut self.is_pixelizing,
            LoadingFlag::UploadingFill => &mut self.is_uploading_fill,
            LoadingFlag::Transforming => &mut self.is_transforming,
        }
    }

    /// True while any async operation is running.
    pub fn is_busy(&self) -> bool {
        self.is_loading
            || self.is_preview_loading
            || self.is_pixelizing
            || self.is_uploading_fill
            || self.is_transforming
    }
}

/// Shared handle to the single [`SelectionState`].
///
/// Clones share the same state. Every method borrows the state only for
/// its own duration, so async callers can hold a handle across `.await`
/// and re-check the identity afterwards.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    state: Rc<RefCell<SelectionState>>,
    revision: Rc<Cell<u64>>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut SelectionState) -> R) -> R {
        let result = f(&mut self.state.borrow_mut());
        self.revision.set(self.revision.get().wrapping_add(1));
        result
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> SelectionState {
        self.state.borrow().clone()
    }

    /// Read the state without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&SelectionState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    /// True if `id` still names the selected shape.
    pub fn is_current(&self, id: &str) -> bool {
        self.with(|s| !s.id.is_empty() && s.id == id)
    }

    /// Replace the state for a new host selection, or clear it on `None`.
    ///
    /// Buffers from the previous selection are always dropped.
    pub fn reset_or_populate(&self, selection: Option<HostSelection>) {
        let next = match selection {
            Some(selection) => {
                log::debug!("Selection changed to '{}' ({})", selection.name, selection.id);
                SelectionState::from_host(selection)
            }
            None => {
                log::debug!("Selection cleared");
                SelectionState::default()
            }
        };
        self.mutate(|state| *state = next);
    }

    /// Set a busy flag.
    ///
    /// Clearing `Loading`, or touching `UploadingFill`, without a valid
    /// selection resets the whole state so no flag outlives a selection.
    pub fn set_flag(&self, flag: LoadingFlag, value: bool) {
        self.mutate(|state| {
            let resets = match flag {
                LoadingFlag::Loading => !value,
                LoadingFlag::UploadingFill => true,
                _ => false,
            };
            if resets && !state.has_selection() {
                *state = SelectionState::default();
            } else {
                *state.flag_mut(flag) = value;
            }
        });
    }

    /// Store a freshly decoded image as both original and preview.
    pub fn ingest_decoded_image(&self, image: PixelBuffer) {
        self.mutate(|state| {
            state.preview_image = Some(image.clone());
            state.original_image = Some(image);
            state.is_loading = false;
            state.is_preview_loading = false;
        });
    }

    /// Store the preview result if `selection_id` is still selected.
    ///
    /// Returns `false` (and changes nothing) for a stale result.
    pub fn complete_preview(&self, selection_id: &str, image: Option<PixelBuffer>) -> bool {
        if !self.is_current(selection_id) {
            return false;
        }
        self.mutate(|state| {
            state.preview_image = image;
            state.is_preview_loading = false;
        });
        true
    }

    /// Store an exported image if `selection_id` is still selected.
    pub fn set_exported_image(&self, selection_id: &str, image: PixelBuffer) -> bool {
        if !self.is_current(selection_id) {
            return false;
        }
        self.mutate(|state| state.exported_image = Some(image));
        true
    }

    /// Ingest raw RGBA bytes the host sent back after an export.
    ///
    /// Stale calls (another shape selected) are ignored. Bytes that do not
    /// form a valid image set the user-facing `error` and clear loading.
    pub fn ingest_exported_bytes(&self, data: Vec<u8>, width: u32, height: u32, selection_id: &str) {
        if !self.is_current(selection_id) {
            log::debug!("Ignoring exported image for stale selection {}", selection_id);
            return;
        }
        self.mutate(|state| match PixelBuffer::new(data, width, height) {
            Ok(image) => {
                state.exported_image = Some(image);
                state.error = None;
                state.is_loading = false;
            }
            Err(e) => {
                log::error!("Failed to ingest exported image: {}", e);
                state.error = Some(format!("Failed to update image: {}", e));
                state.is_loading = false;
            }
        });
    }
}
