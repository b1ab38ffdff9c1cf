//! The plugin controller: owns the stores and runs the async operations.
//!
//! Everything runs on one thread. Async operations snapshot what they need,
//! suspend on the processor, then re-check that the selection they started
//! with is still current before writing anything back. There is no
//! cancellation; a superseded result is dropped.

use std::cell::{Cell, RefCell};

use fillfx_gpu::{GpuError, Rotation};

use crate::codec;
use crate::config::AppConfig;
use crate::host::{HostBridge, HostEvent, PluginMessage};
use crate::model::{Fill, PixelBuffer};
use crate::processing::{CpuProcessor, ImageProcessor};
use crate::state::{LoadingFlag, PreviewSurface, SelectionState, SelectionStore, Settings};

/// Outcome of an operation. Failures are already logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStatus {
    Applied,
    /// Missing selection or image
    NothingToDo,
    /// The selection changed while the operation was suspended
    Superseded,
    Failed,
}

/// What to do to the image before uploading it.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Commit {
    Transform(Rotation),
    Pixelate(u32),
}

impl Commit {
    fn flag(self) -> LoadingFlag {
        match self {
            Commit::Transform(_) => LoadingFlag::Transforming,
            Commit::Pixelate(_) => LoadingFlag::Pixelizing,
        }
    }
}

/// Inputs captured before an upload starts.
struct UploadJob {
    selection_id: String,
    image: PixelBuffer,
    fill_index: usize,
    fill_count: usize,
    original_fill: Fill,
}

pub struct PluginController<B: HostBridge, P: ImageProcessor = CpuProcessor> {
    store: SelectionStore,
    settings: RefCell<Settings>,
    bridge: B,
    processor: P,
    config: AppConfig,
    /// Rotation already applied to `preview_image`
    preview_rotation: Cell<Rotation>,
    /// Store revision and rotation of the last successful draw
    drawn: Cell<Option<(u64, Rotation)>>,
}

impl<B: HostBridge> PluginController<B, CpuProcessor> {
    /// Controller with the CPU processor using the configured camera.
    pub fn new(bridge: B, config: AppConfig) -> Self {
        let processor = CpuProcessor::new(config.preview.camera());
        Self::with_store(SelectionStore::new(), bridge, processor, config)
    }
}

impl<B: HostBridge, P: ImageProcessor> PluginController<B, P> {
    pub fn with_store(store: SelectionStore, bridge: B, processor: P, config: AppConfig) -> Self {
        Self {
            store,
            settings: RefCell::new(Settings::new()),
            bridge,
            processor,
            config,
            preview_rotation: Cell::new(Rotation::ZERO),
            drawn: Cell::new(None),
        }
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub fn snapshot(&self) -> SelectionState {
        self.store.snapshot()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn rotation(&self) -> Rotation {
        self.settings.borrow().rotation()
    }

    /// Dispatch an inbound host event.
    pub fn handle_host_event(&self, event: HostEvent) -> OpStatus {
        match event {
            HostEvent::SelectionChanged { selection } => {
                self.store.reset_or_populate(selection);
                self.preview_rotation.set(Rotation::ZERO);
                self.sync_preview();
                OpStatus::Applied
            }
            HostEvent::ImageLoaded {
                image_bytes,
                width,
                height,
            } => self.handle_loaded_image(&image_bytes, width, height),
            HostEvent::ExportedImage {
                image_bytes,
                width,
                height,
                selection_id,
            } => self.ingest_exported_bytes(image_bytes, width, height, &selection_id),
        }
    }

    /// Mark that the UI asked the host for the selected fill's bytes.
    ///
    /// Cleared by the decoded image, a failed decode or an exported image.
    pub fn set_loading(&self, loading: bool) {
        self.store.set_flag(LoadingFlag::Loading, loading);
    }

    /// Decode the selected fill's image and make it the original and preview.
    pub fn handle_loaded_image(&self, bytes: &[u8], width: u32, height: u32) -> OpStatus {
        if !self.store.with(SelectionState::has_selection) {
            log::debug!("Ignoring image bytes without a selection");
            return OpStatus::NothingToDo;
        }

        self.store.set_flag(LoadingFlag::PreviewLoading, true);
        match codec::decode(bytes, width, height) {
            Ok(image) => {
                self.store.ingest_decoded_image(image);
                self.preview_rotation.set(Rotation::ZERO);
                self.sync_preview();
                OpStatus::Applied
            }
            Err(e) => {
                log::error!("Failed to load image data: {}", e);
                self.store.set_flag(LoadingFlag::PreviewLoading, false);
                self.store.set_flag(LoadingFlag::Loading, false);
                OpStatus::Failed
            }
        }
    }

    /// Raw RGBA the host sends back after applying an update.
    pub fn ingest_exported_bytes(
        &self,
        data: Vec<u8>,
        width: u32,
        height: u32,
        selection_id: &str,
    ) -> OpStatus {
        if !self.store.is_current(selection_id) {
            log::debug!("Ignoring exported image for stale selection {}", selection_id);
            return OpStatus::Superseded;
        }
        self.store.ingest_exported_bytes(data, width, height, selection_id);
        self.sync_preview();
        if self.store.with(|s| s.error.is_some()) {
            OpStatus::Failed
        } else {
            OpStatus::Applied
        }
    }

    /// Re-render the preview image at `rotation`.
    pub async fn request_preview(&self, rotation: Rotation) -> OpStatus {
        let Some((selection_id, original)) = self.store.with(|s| {
            let original = s.original_image.clone().filter(|_| s.has_selection())?;
            Some((s.id.clone(), original))
        }) else {
            return OpStatus::NothingToDo;
        };

        self.store.set_flag(LoadingFlag::PreviewLoading, true);
        match self.processor.transform(original, rotation).await {
            Ok(preview) => {
                if self.store.complete_preview(&selection_id, Some(preview)) {
                    self.preview_rotation.set(rotation);
                    self.sync_preview();
                    OpStatus::Applied
                } else {
                    log::debug!("Dropping preview for stale selection {}", selection_id);
                    OpStatus::Superseded
                }
            }
            Err(e) => {
                log::error!("Error transforming preview: {}", e);
                if self.store.complete_preview(&selection_id, None) {
                    OpStatus::Failed
                } else {
                    OpStatus::Superseded
                }
            }
        }
    }

    /// Rotate the original image and upload it as a fill.
    pub async fn commit_transform(&self, rotation: Rotation, add_new_layer: bool) -> OpStatus {
        self.commit(Commit::Transform(rotation), add_new_layer).await
    }

    /// Pixelate the original image and upload it as a fill.
    pub async fn commit_pixelation(&self, pixel_size: u32, add_new_layer: bool) -> OpStatus {
        let pixel_size = self.config.pixelate.clamp(pixel_size);
        self.commit(Commit::Pixelate(pixel_size), add_new_layer).await
    }

    fn upload_job(&self) -> Option<UploadJob> {
        self.store.with(|s| {
            if !s.has_selection() {
                return None;
            }
            let image = s.original_image.clone()?;
            let (fill_index, fill) = s.fills.last()?;
            Some(UploadJob {
                selection_id: s.id.clone(),
                image,
                fill_index,
                fill_count: fill_index + 1,
                original_fill: fill.clone(),
            })
        })
    }

    async fn commit(&self, commit: Commit, add_new_layer: bool) -> OpStatus {
        let Some(job) = self.upload_job() else {
            log::debug!("Nothing to upload for {:?}", commit);
            return OpStatus::NothingToDo;
        };

        let flag = commit.flag();
        self.store.set_flag(flag, true);

        let result = match commit {
            Commit::Transform(rotation) => self.processor.transform(job.image.clone(), rotation).await,
            Commit::Pixelate(pixel_size) => self.processor.pixelate(job.image.clone(), pixel_size).await,
        };
        let image = match result {
            Ok(image) => image,
            Err(e) => {
                log::error!("Error processing image for {:?}: {}", commit, e);
                if self.store.is_current(&job.selection_id) {
                    self.store.set_flag(flag, false);
                }
                return OpStatus::Failed;
            }
        };

        if !self.store.is_current(&job.selection_id) {
            log::debug!(
                "Dropping {:?} result for stale selection {}",
                commit,
                job.selection_id
            );
            return OpStatus::Superseded;
        }

        self.store.set_flag(LoadingFlag::UploadingFill, true);
        let status = self.upload(&job, &image, add_new_layer);
        if status == OpStatus::Applied {
            self.store.set_exported_image(&job.selection_id, image);
        }
        self.store.set_flag(LoadingFlag::UploadingFill, false);
        self.store.set_flag(flag, false);
        self.sync_preview();
        status
    }

    fn upload(&self, job: &UploadJob, image: &PixelBuffer, add_new_layer: bool) -> OpStatus {
        let image_data = match codec::encode_png(image) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("Failed to encode image for upload: {}", e);
                return OpStatus::Failed;
            }
        };

        // Replace the previous upload instead of stacking another fill on it.
        let should_delete_first = !add_new_layer && job.fill_count >= 2;
        let message = PluginMessage::UpdateImageFill {
            image_data,
            fill_index: job.fill_index,
            original_fill: job.original_fill.clone(),
            should_delete_first,
            add_new_layer,
        };

        match self.bridge.post(message) {
            Ok(()) => {
                log::info!(
                    "Requested fill update {} on {} (delete first: {}, new layer: {})",
                    job.fill_index,
                    job.selection_id,
                    should_delete_first,
                    add_new_layer
                );
                OpStatus::Applied
            }
            Err(e) => {
                log::error!("Failed to send fill update: {}", e);
                OpStatus::Failed
            }
        }
    }

    pub fn set_rotation(&self, rotation: Rotation) {
        self.settings.borrow_mut().set_rotation(rotation);
        self.sync_preview();
    }

    pub fn rotate_by(&self, delta: Rotation) {
        self.settings.borrow_mut().rotate_by(delta);
        self.sync_preview();
    }

    pub fn reset_rotation(&self) {
        self.settings.borrow_mut().reset_rotation();
        self.sync_preview();
    }

    /// Attach a drawing surface and draw into it right away.
    pub fn set_preview_surface(&self, surface: PreviewSurface) {
        self.settings.borrow_mut().set_surface(surface);
        self.redraw();
    }

    pub fn clear_preview_surface(&self) -> Option<PreviewSurface> {
        self.drawn.set(None);
        self.settings.borrow_mut().clear_surface()
    }

    pub fn resize_surface(&self, width: u32, height: u32) {
        if let Some(surface) = self.settings.borrow_mut().surface_mut() {
            surface.resize(width, height);
        }
        self.redraw();
    }

    /// Draw unconditionally.
    pub fn redraw(&self) {
        self.drawn.set(None);
        self.sync_preview();
    }

    /// Draw if the selection or rotation changed since the last draw.
    ///
    /// A failed draw is logged and retried on the next change.
    pub fn sync_preview(&self) {
        let key = (self.store.revision(), self.rotation());
        if self.drawn.get() == Some(key) || !self.settings.borrow().has_surface() {
            return;
        }
        match self.draw() {
            Ok(()) => self.drawn.set(Some(key)),
            Err(e) => log::error!("Preview draw failed: {}", e),
        }
    }

    fn draw(&self) -> Result<(), GpuError> {
        let mut settings = self.settings.borrow_mut();
        let rotation = settings.rotation();
        let Some(surface) = settings.surface_mut() else {
            return Ok(());
        };

        let baked = self.preview_rotation.get();
        self.store.with(|state| {
            // A preview already rendered at this rotation is shown flat;
            // otherwise the GPU rotates the original live.
            let (image, rotation) = match (&state.preview_image, &state.original_image) {
                (Some(preview), _) if baked == rotation => (Some(preview), Rotation::ZERO),
                (_, Some(original)) => (Some(original), rotation),
                (preview, None) => (preview.as_ref(), rotation),
            };
            surface.draw(image, rotation)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::pin;
    use std::rc::Rc;
    use std::sync::mpsc::Receiver;
    use std::task::{Context, Poll, Waker};

    use super::*;
    use crate::error::ProcessError;
    use crate::host::ChannelBridge;
    use crate::model::{Fills, HostSelection, ImageRef};
    use crate::processing;

    const SOLID_2X2: [u8; 16] = [
        255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 255, 255, 0, 255,
    ];

    fn png_2x2() -> Vec<u8> {
        let buffer = PixelBuffer::new(SOLID_2X2.to_vec(), 2, 2).unwrap();
        codec::encode_png(&buffer).unwrap()
    }

    fn fill(id: &str) -> Fill {
        Fill::image(ImageRef {
            id: id.into(),
            width: 2,
            height: 2,
            ..Default::default()
        })
    }

    fn selection(id: &str, fill_count: usize) -> HostSelection {
        HostSelection {
            id: id.into(),
            name: format!("Shape {}", id),
            fills: Fills::Uniform((0..fill_count).map(|i| fill(&format!("img-{}", i))).collect()),
        }
    }

    fn controller() -> (PluginController<ChannelBridge>, Receiver<PluginMessage>) {
        let (bridge, receiver) = ChannelBridge::new();
        (PluginController::new(bridge, AppConfig::default()), receiver)
    }

    fn select_with_image<P: ImageProcessor>(controller: &PluginController<ChannelBridge, P>, id: &str, fill_count: usize) {
        controller.handle_host_event(HostEvent::SelectionChanged {
            selection: Some(selection(id, fill_count)),
        });
        assert_eq!(controller.handle_loaded_image(&png_2x2(), 2, 2), OpStatus::Applied);
    }

    /// Replaces the selection while the operation is suspended.
    struct SwitchesSelection {
        store: SelectionStore,
        next: Option<HostSelection>,
    }

    impl ImageProcessor for SwitchesSelection {
        async fn transform(&self, image: PixelBuffer, _: Rotation) -> Result<PixelBuffer, ProcessError> {
            self.store.reset_or_populate(self.next.clone());
            Ok(image)
        }

        async fn pixelate(&self, image: PixelBuffer, _: u32) -> Result<PixelBuffer, ProcessError> {
            self.store.reset_or_populate(self.next.clone());
            Ok(image)
        }
    }

    struct Failing;

    impl ImageProcessor for Failing {
        async fn transform(&self, _: PixelBuffer, r: Rotation) -> Result<PixelBuffer, ProcessError> {
            Err(ProcessError::Degenerate { x: r.x, y: r.y, z: r.z })
        }

        async fn pixelate(&self, _: PixelBuffer, _: u32) -> Result<PixelBuffer, ProcessError> {
            Err(ProcessError::Degenerate { x: 0.0, y: 0.0, z: 0.0 })
        }
    }

    /// One transform call held until the test opens it.
    struct Gate {
        open: Cell<bool>,
        output: PixelBuffer,
    }

    impl Gate {
        fn new(fill: u8) -> Rc<Self> {
            Rc::new(Self {
                open: Cell::new(false),
                output: PixelBuffer::new(vec![fill; 16], 2, 2).unwrap(),
            })
        }
    }

    /// Each transform takes the next gate and resolves once it opens.
    struct Gated {
        gates: RefCell<VecDeque<Rc<Gate>>>,
    }

    impl ImageProcessor for Gated {
        async fn transform(&self, _: PixelBuffer, _: Rotation) -> Result<PixelBuffer, ProcessError> {
            let gate = self.gates.borrow_mut().pop_front().expect("no gate left");
            std::future::poll_fn(|_| {
                if gate.open.get() {
                    Poll::Ready(())
                } else {
                    Poll::Pending
                }
            })
            .await;
            Ok(gate.output.clone())
        }

        async fn pixelate(&self, image: PixelBuffer, _: u32) -> Result<PixelBuffer, ProcessError> {
            Ok(image)
        }
    }

    fn switching_controller(
        next: Option<HostSelection>,
    ) -> (PluginController<ChannelBridge, SwitchesSelection>, Receiver<PluginMessage>) {
        let store = SelectionStore::new();
        let processor = SwitchesSelection {
            store: store.clone(),
            next,
        };
        let (bridge, receiver) = ChannelBridge::new();
        let controller = PluginController::with_store(store, bridge, processor, AppConfig::default());
        (controller, receiver)
    }

    #[test]
    fn test_loaded_image_round_trips_pixels() {
        let (controller, _rx) = controller();
        select_with_image(&controller, "a", 1);

        let state = controller.snapshot();
        let original = state.original_image.unwrap();
        assert_eq!(original.data(), &SOLID_2X2);
        assert_eq!(original.data().len(), 2 * 2 * 4);
        assert_eq!(state.preview_image.unwrap(), original);
        assert!(!state.is_preview_loading);
        assert!(!state.is_loading);
    }

    #[test]
    fn test_loaded_image_without_selection_is_ignored() {
        let (controller, _rx) = controller();
        assert_eq!(controller.handle_loaded_image(&png_2x2(), 2, 2), OpStatus::NothingToDo);
        assert_eq!(controller.snapshot(), SelectionState::default());
    }

    #[test]
    fn test_loading_flag_cleared_by_loaded_image() {
        let (controller, _rx) = controller();
        controller.handle_host_event(HostEvent::SelectionChanged {
            selection: Some(selection("a", 1)),
        });
        controller.set_loading(true);
        assert!(controller.snapshot().is_loading);

        let status = controller.handle_host_event(HostEvent::ImageLoaded {
            image_bytes: png_2x2(),
            width: 2,
            height: 2,
        });
        assert_eq!(status, OpStatus::Applied);
        let state = controller.snapshot();
        assert!(!state.is_loading);
        assert!(state.original_image.is_some());
    }

    #[test]
    fn test_loading_flag_cleared_by_failed_decode() {
        let (controller, _rx) = controller();
        controller.handle_host_event(HostEvent::SelectionChanged {
            selection: Some(selection("a", 1)),
        });
        controller.set_loading(true);

        assert_eq!(controller.handle_loaded_image(b"garbage", 2, 2), OpStatus::Failed);
        assert!(!controller.snapshot().is_loading);
    }

    #[test]
    fn test_clearing_loading_without_selection_resets() {
        let (controller, _rx) = controller();
        controller.set_loading(false);
        assert_eq!(controller.snapshot(), SelectionState::default());
    }

    #[test]
    fn test_undecodable_image_clears_preview_loading() {
        let (controller, _rx) = controller();
        controller.handle_host_event(HostEvent::SelectionChanged {
            selection: Some(selection("a", 1)),
        });
        assert!(controller.snapshot().is_preview_loading);

        assert_eq!(controller.handle_loaded_image(b"garbage", 2, 2), OpStatus::Failed);
        let state = controller.snapshot();
        assert!(!state.is_preview_loading);
        assert!(state.original_image.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_preview_dropped_when_selection_resets_mid_transform() {
        let (controller, _rx) = switching_controller(None);
        select_with_image(&controller, "a", 1);

        let status = pollster::block_on(controller.request_preview(Rotation::new(0.0, 0.0, 30.0)));
        assert_eq!(status, OpStatus::Superseded);
        assert_eq!(controller.snapshot(), SelectionState::default());
    }

    #[test]
    fn test_preview_dropped_when_other_shape_selected_mid_transform() {
        let (controller, _rx) = switching_controller(Some(selection("b", 1)));
        select_with_image(&controller, "a", 1);

        let status = pollster::block_on(controller.request_preview(Rotation::ZERO));
        assert_eq!(status, OpStatus::Superseded);
        let state = controller.snapshot();
        assert_eq!(state.id, "b");
        assert!(state.preview_image.is_none());
    }

    #[test]
    fn test_preview_applies_transform_result() {
        let (controller, _rx) = controller();
        select_with_image(&controller, "a", 1);

        let status = pollster::block_on(controller.request_preview(Rotation::new(0.0, 0.0, 180.0)));
        assert_eq!(status, OpStatus::Applied);
        let state = controller.snapshot();
        let preview = state.preview_image.unwrap();
        let original = state.original_image.unwrap();
        assert_eq!(preview.pixel(0, 0), original.pixel(1, 1));
        assert!(!state.is_preview_loading);
    }

    #[test]
    fn test_preview_failure_clears_preview_and_flag() {
        let store = SelectionStore::new();
        let (bridge, _rx) = ChannelBridge::new();
        let controller = PluginController::with_store(store, bridge, Failing, AppConfig::default());
        select_with_image(&controller, "a", 1);

        let status = pollster::block_on(controller.request_preview(Rotation::new(10.0, 0.0, 0.0)));
        assert_eq!(status, OpStatus::Failed);
        let state = controller.snapshot();
        assert!(state.preview_image.is_none());
        assert!(state.original_image.is_some());
        assert!(!state.is_preview_loading);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_preview_race_is_won_by_last_completion() {
        let first = Gate::new(1);
        let second = Gate::new(2);
        let processor = Gated {
            gates: RefCell::new(VecDeque::from([Rc::clone(&first), Rc::clone(&second)])),
        };
        let (bridge, _rx) = ChannelBridge::new();
        let controller =
            PluginController::with_store(SelectionStore::new(), bridge, processor, AppConfig::default());
        select_with_image(&controller, "a", 1);

        let mut cx = Context::from_waker(Waker::noop());
        let mut earlier = pin!(controller.request_preview(Rotation::new(0.0, 0.0, 10.0)));
        let mut later = pin!(controller.request_preview(Rotation::new(0.0, 0.0, 20.0)));
        assert!(earlier.as_mut().poll(&mut cx).is_pending());
        assert!(later.as_mut().poll(&mut cx).is_pending());

        // The later request finishes first.
        second.open.set(true);
        assert_eq!(later.as_mut().poll(&mut cx), Poll::Ready(OpStatus::Applied));
        assert_eq!(controller.snapshot().preview_image.as_ref(), Some(&second.output));

        first.open.set(true);
        assert_eq!(earlier.as_mut().poll(&mut cx), Poll::Ready(OpStatus::Applied));
        let state = controller.snapshot();
        assert_eq!(state.preview_image.as_ref(), Some(&first.output));
        assert!(!state.is_preview_loading);
    }

    #[test]
    fn test_preview_without_image_is_noop() {
        let (controller, _rx) = controller();
        controller.handle_host_event(HostEvent::SelectionChanged {
            selection: Some(selection("a", 1)),
        });
        let before = controller.snapshot();
        let status = pollster::block_on(controller.request_preview(Rotation::ZERO));
        assert_eq!(status, OpStatus::NothingToDo);
        assert_eq!(controller.snapshot(), before);
    }

    #[test]
    fn test_pixelation_replaces_previous_upload_with_two_fills() {
        let (controller, rx) = controller();
        select_with_image(&controller, "a", 2);

        let status = pollster::block_on(controller.commit_pixelation(4, false));
        assert_eq!(status, OpStatus::Applied);

        let PluginMessage::UpdateImageFill {
            image_data,
            fill_index,
            original_fill,
            should_delete_first,
            add_new_layer,
        } = rx.try_recv().unwrap();
        assert!(should_delete_first);
        assert!(!add_new_layer);
        assert_eq!(fill_index, 1);
        assert_eq!(original_fill, fill("img-1"));
        assert_eq!(&image_data[..8], b"\x89PNG\r\n\x1a\n");

        let state = controller.snapshot();
        let expected = processing::pixelate(state.original_image.as_ref().unwrap(), 4).unwrap();
        assert_eq!(state.exported_image, Some(expected));
        assert!(!state.is_pixelizing);
        assert!(!state.is_uploading_fill);
    }

    #[test]
    fn test_pixelation_keeps_single_fill() {
        let (controller, rx) = controller();
        select_with_image(&controller, "a", 1);

        assert_eq!(pollster::block_on(controller.commit_pixelation(4, false)), OpStatus::Applied);
        let PluginMessage::UpdateImageFill {
            should_delete_first,
            fill_index,
            ..
        } = rx.try_recv().unwrap();
        assert!(!should_delete_first);
        assert_eq!(fill_index, 0);
    }

    #[test]
    fn test_new_layer_never_deletes() {
        let (controller, rx) = controller();
        select_with_image(&controller, "a", 3);

        assert_eq!(pollster::block_on(controller.commit_pixelation(4, true)), OpStatus::Applied);
        let PluginMessage::UpdateImageFill {
            should_delete_first,
            add_new_layer,
            fill_index,
            ..
        } = rx.try_recv().unwrap();
        assert!(!should_delete_first);
        assert!(add_new_layer);
        assert_eq!(fill_index, 2);
    }

    #[test]
    fn test_commit_transform_uploads_rotated_image() {
        let (controller, rx) = controller();
        select_with_image(&controller, "a", 1);

        let rotation = Rotation::new(0.0, 0.0, 180.0);
        assert_eq!(
            pollster::block_on(controller.commit_transform(rotation, false)),
            OpStatus::Applied
        );
        assert!(rx.try_recv().is_ok());
        let state = controller.snapshot();
        let exported = state.exported_image.unwrap();
        assert_eq!(exported.pixel(0, 0), state.original_image.unwrap().pixel(1, 1));
        assert!(!state.is_transforming);
    }

    #[test]
    fn test_commit_without_data_is_noop() {
        let (controller, rx) = controller();
        assert_eq!(pollster::block_on(controller.commit_pixelation(4, false)), OpStatus::NothingToDo);

        controller.handle_host_event(HostEvent::SelectionChanged {
            selection: Some(selection("a", 1)),
        });
        assert_eq!(
            pollster::block_on(controller.commit_transform(Rotation::ZERO, false)),
            OpStatus::NothingToDo
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_commit_with_mixed_fills_is_noop() {
        let (controller, rx) = controller();
        controller.handle_host_event(HostEvent::SelectionChanged {
            selection: Some(HostSelection {
                id: "a".into(),
                name: "Group".into(),
                fills: Fills::Mixed,
            }),
        });
        controller.handle_loaded_image(&png_2x2(), 2, 2);
        assert_eq!(pollster::block_on(controller.commit_pixelation(4, false)), OpStatus::NothingToDo);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_commit_superseded_sends_nothing() {
        let (controller, rx) = switching_controller(Some(selection("b", 2)));
        select_with_image(&controller, "a", 2);

        assert_eq!(pollster::block_on(controller.commit_pixelation(4, false)), OpStatus::Superseded);
        assert!(rx.try_recv().is_err());
        let state = controller.snapshot();
        assert_eq!(state.id, "b");
        assert!(state.exported_image.is_none());
        assert!(!state.is_pixelizing);
        assert!(!state.is_uploading_fill);
    }

    #[test]
    fn test_commit_failure_clears_busy_flag() {
        let (bridge, rx) = ChannelBridge::new();
        let controller =
            PluginController::with_store(SelectionStore::new(), bridge, Failing, AppConfig::default());
        select_with_image(&controller, "a", 1);

        assert_eq!(
            pollster::block_on(controller.commit_transform(Rotation::new(0.0, 90.0, 0.0), false)),
            OpStatus::Failed
        );
        assert!(rx.try_recv().is_err());
        assert!(!controller.snapshot().is_busy());
    }

    #[test]
    fn test_closed_bridge_fails_without_exported_image() {
        let (controller, rx) = controller();
        select_with_image(&controller, "a", 1);
        drop(rx);

        assert_eq!(pollster::block_on(controller.commit_pixelation(4, false)), OpStatus::Failed);
        let state = controller.snapshot();
        assert!(state.exported_image.is_none());
        assert!(!state.is_busy());
    }

    #[test]
    fn test_exported_bytes_event() {
        let (controller, _rx) = controller();
        select_with_image(&controller, "a", 1);

        let status = controller.handle_host_event(HostEvent::ExportedImage {
            image_bytes: SOLID_2X2.to_vec(),
            width: 2,
            height: 2,
            selection_id: "other".into(),
        });
        assert_eq!(status, OpStatus::Superseded);
        assert!(controller.snapshot().exported_image.is_none());

        let status = controller.handle_host_event(HostEvent::ExportedImage {
            image_bytes: vec![0; 3],
            width: 2,
            height: 2,
            selection_id: "a".into(),
        });
        assert_eq!(status, OpStatus::Failed);
        assert!(controller.snapshot().error.is_some());

        let status = controller.handle_host_event(HostEvent::ExportedImage {
            image_bytes: SOLID_2X2.to_vec(),
            width: 2,
            height: 2,
            selection_id: "a".into(),
        });
        assert_eq!(status, OpStatus::Applied);
        assert_eq!(controller.snapshot().exported_image.unwrap().data(), &SOLID_2X2);
    }

    #[test]
    fn test_exported_bytes_with_oversized_dimensions_fail() {
        let (controller, _rx) = controller();
        select_with_image(&controller, "a", 1);
        controller.set_loading(true);

        let status = controller.handle_host_event(HostEvent::ExportedImage {
            image_bytes: Vec::new(),
            width: u32::MAX,
            height: u32::MAX,
            selection_id: "a".into(),
        });
        assert_eq!(status, OpStatus::Failed);
        let state = controller.snapshot();
        assert!(state.error.is_some());
        assert!(!state.is_loading);
        assert!(state.exported_image.is_none());
    }

    #[test]
    fn test_selection_change_keeps_rotation() {
        let (controller, _rx) = controller();
        controller.set_rotation(Rotation::new(10.0, 20.0, 30.0));
        select_with_image(&controller, "a", 1);
        controller.handle_host_event(HostEvent::SelectionChanged { selection: None });

        assert_eq!(controller.rotation(), Rotation::new(10.0, 20.0, 30.0));
        assert_eq!(controller.snapshot(), SelectionState::default());
    }
}
