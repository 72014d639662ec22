//! Overlay Session.
//!
//! One session per page context. It owns everything the overlay knows about
//! the page: visibility, edit mode, the live box collection, the active
//! gesture, the selection, the last seen URL and the reconcile schedule.
//! Hosts forward events to it and draw [`OverlaySession::render`].

use std::time::Duration;

use deepoverlay_core::{
    Ack, AnnotationBox, BoxId, ControlMessage, ControlResponse, PageUrl, Point, StatusReport,
};
use deepoverlay_storage::{KeyValueStore, OverlayConfig, PageStore};

use crate::anchor::bind_box;
use crate::collection::{BoxCollection, PointerTarget};
use crate::dom::PageDom;
use crate::interaction::{GestureOutcome, InteractionMachine, InteractionMode};
use crate::reconcile::{reconcile_all, FrameRequest, FrameScheduler, LayoutEvent, ReconcileReport};
use crate::view::{editor_position, BoxView, NoteEditorView, OverlayMode, OverlayView};

/// Element that received a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTarget {
    /// `<textarea>` or `<input>`.
    TextField,
    Other,
}

/// What the host must do with a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Let the page handle it.
    PassThrough,
    /// Stop propagation only, so typing still works.
    StopPropagation,
    /// Stop propagation and prevent the default action.
    Suppress,
}

pub struct OverlaySession<S: KeyValueStore> {
    store: PageStore<S>,
    config: OverlayConfig,
    url: PageUrl,
    visible: bool,
    edit_mode: bool,
    boxes: BoxCollection,
    interaction: InteractionMachine,
    selected: Option<BoxId>,
    scheduler: FrameScheduler,
    layer_size: (f64, f64),
}

impl<S: KeyValueStore> OverlaySession<S> {
    pub fn new(store: PageStore<S>, href: &str, config: OverlayConfig) -> Self {
        let interaction =
            InteractionMachine::new(config.interaction.min_box_size, config.interaction.min_resize);
        Self {
            store,
            url: PageUrl::normalize(href),
            visible: config.session.start_visible,
            edit_mode: config.session.start_in_edit_mode,
            boxes: BoxCollection::new(),
            interaction,
            selected: None,
            scheduler: FrameScheduler::new(),
            layer_size: (0.0, 0.0),
            config,
        }
    }

    /// Loads the current page's boxes and aligns them to the page.
    pub fn activate<D: PageDom>(&mut self, dom: &D) -> ReconcileReport {
        self.update_layer_size(dom);
        self.load_page(dom)
    }

    pub fn url(&self) -> &PageUrl {
        &self.url
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn boxes(&self) -> &BoxCollection {
        &self.boxes
    }

    pub fn get_box(&self, id: BoxId) -> Option<&AnnotationBox> {
        self.boxes.get(id)
    }

    pub fn selected(&self) -> Option<BoxId> {
        self.selected
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.interaction.mode()
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// How often the host should call [`check_url`](Self::check_url).
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.navigation.poll_interval_ms)
    }

    pub fn store(&self) -> &PageStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PageStore<S> {
        &mut self.store
    }

    /// Flips visibility after checking for navigation. Showing the overlay
    /// always starts in view mode. Returns the new visibility.
    pub fn toggle_visibility<D: PageDom>(&mut self, dom: &D, href: &str) -> bool {
        self.check_url(dom, href);
        self.visible = !self.visible;
        if self.visible {
            self.update_layer_size(dom);
            self.set_edit_mode(false);
        }
        tracing::debug!("Overlay visible: {}", self.visible);
        self.visible
    }

    /// Leaving edit mode closes the note editor.
    pub fn set_edit_mode(&mut self, enabled: bool) {
        self.edit_mode = enabled;
        if !enabled {
            self.selected = None;
        }
    }

    /// Opens the note editor for `id`, closing any other. Only possible in
    /// edit mode with no gesture in progress.
    pub fn select_box(&mut self, id: BoxId) -> bool {
        if !self.visible
            || !self.edit_mode
            || self.interaction.is_active()
            || !self.boxes.contains(id)
        {
            return false;
        }
        self.selected = Some(id);
        true
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Stores the note, persists the page and closes the editor.
    pub fn save_note(&mut self, id: BoxId, text: &str) -> bool {
        let Some(b) = self.boxes.get_mut(id) else {
            return false;
        };
        b.note = text.to_string();
        self.close_editor_for(id);
        self.persist();
        true
    }

    /// Removes the box, persists the page and closes the editor.
    pub fn delete_box(&mut self, id: BoxId) -> bool {
        if self.interaction.active_box() == Some(id) {
            self.interaction.reset();
        }
        if self.boxes.remove(id).is_none() {
            return false;
        }
        self.close_editor_for(id);
        self.persist();
        true
    }

    fn close_editor_for(&mut self, id: BoxId) {
        if self.selected == Some(id) {
            self.selected = None;
        }
    }

    /// Pointer pressed on the overlay at a page-space point.
    pub fn pointer_down(&mut self, target: PointerTarget, point: Point) -> InteractionMode {
        if !self.visible || !self.edit_mode {
            return InteractionMode::None;
        }
        self.interaction.pointer_down(&mut self.boxes, target, point)
    }

    /// [`pointer_down`](Self::pointer_down) with the target found by hit
    /// testing the collection.
    pub fn pointer_down_at(&mut self, point: Point) -> InteractionMode {
        let target = self.boxes.hit_test(point);
        self.pointer_down(target, point)
    }

    pub fn pointer_move(&mut self, point: Point) -> bool {
        self.interaction.pointer_move(&mut self.boxes, point)
    }

    /// Ends the gesture. A surviving box is re-bound to the element under it
    /// and the whole page is saved once.
    pub fn pointer_up<D: PageDom>(&mut self, dom: &mut D) -> GestureOutcome {
        let outcome = self.interaction.pointer_up(&mut self.boxes);

        if let GestureOutcome::Committed { id, mode } = outcome {
            if let Some(b) = self.boxes.get_mut(id) {
                // unanchored boxes simply float
                let _ = bind_box(dom, b);
            }
            if mode == InteractionMode::Draw && self.edit_mode {
                self.select_box(id);
            }
            self.persist();
        }

        outcome
    }

    pub fn key_disposition(&self, target: KeyTarget) -> KeyDisposition {
        if !self.visible || !self.edit_mode {
            return KeyDisposition::PassThrough;
        }
        match target {
            KeyTarget::TextField => KeyDisposition::StopPropagation,
            KeyTarget::Other => KeyDisposition::Suppress,
        }
    }

    pub fn blocks_page_clicks(&self) -> bool {
        self.visible && self.edit_mode
    }

    /// Detects SPA navigation. On a change of normalized URL the collection
    /// is rebuilt from the new page's record. Returns whether it changed.
    pub fn check_url<D: PageDom>(&mut self, dom: &D, href: &str) -> bool {
        let next = PageUrl::normalize(href);
        if next == self.url {
            return false;
        }

        tracing::info!("Navigation {} -> {}", self.url, next);
        self.interaction.reset();
        self.selected = None;
        self.scheduler.cancel();
        self.boxes.clear();
        self.url = next;
        self.update_layer_size(dom);
        self.load_page(dom);
        true
    }

    /// Records a layout change; the host schedules a frame on
    /// [`FrameRequest::Schedule`].
    pub fn on_layout_event(&mut self, event: LayoutEvent) -> FrameRequest {
        let request = self.scheduler.request();
        if request == FrameRequest::Schedule {
            tracing::trace!("Reconcile scheduled by {:?}", event);
        }
        request
    }

    /// Runs a pending reconcile. The box under an active gesture follows the
    /// pointer, not its anchor, and is left out until the gesture ends.
    pub fn on_animation_frame<D: PageDom>(&mut self, dom: &D) -> Option<ReconcileReport> {
        let dragged = self.interaction.active_box();
        let boxes = self.boxes.iter_mut().filter(|b| Some(b.id) != dragged);
        let report = self.scheduler.on_animation_frame(dom, boxes)?;
        self.update_layer_size(dom);
        Some(report)
    }

    /// Answers a control message synchronously.
    pub fn handle_message<D: PageDom>(
        &mut self,
        dom: &D,
        href: &str,
        message: ControlMessage,
    ) -> ControlResponse {
        match message {
            ControlMessage::Toggle => {
                self.toggle_visibility(dom, href);
                ControlResponse::None
            }
            ControlMessage::GetStatus => ControlResponse::Status(StatusReport {
                active: self.visible,
                is_edit_mode: self.edit_mode,
            }),
            ControlMessage::SetEditMode { enabled } => {
                self.set_edit_mode(enabled);
                ControlResponse::Ack(Ack { success: true })
            }
        }
    }

    pub fn render(&self) -> OverlayView {
        let boxes = self
            .boxes
            .iter()
            .map(|b| BoxView {
                id: b.id,
                geometry: b.geometry,
                note: b.note.clone(),
                selected: self.selected == Some(b.id),
                anchored: b.is_anchored(),
            })
            .collect();

        let editor = self.selected.and_then(|id| self.boxes.get(id)).map(|b| {
            let (left, top) = editor_position(&b.geometry, self.config.editor.bubble_offset);
            NoteEditorView {
                box_id: b.id,
                left,
                top,
                text: b.note.clone(),
            }
        });

        OverlayView {
            visible: self.visible,
            mode: if self.edit_mode {
                OverlayMode::Edit
            } else {
                OverlayMode::View
            },
            layer_width: self.layer_size.0,
            layer_height: self.layer_size.1,
            blocks_page_clicks: self.blocks_page_clicks(),
            boxes,
            editor,
        }
    }

    fn load_page<D: PageDom>(&mut self, dom: &D) -> ReconcileReport {
        let loaded = self.store.load_all(&self.url);
        self.boxes.replace_all(loaded);
        let report = reconcile_all(dom, self.boxes.iter_mut());
        tracing::info!(
            "Page {} ready: {} anchored, {} floating, {} missing",
            self.url,
            report.updated,
            report.floating,
            report.missing
        );
        report
    }

    fn persist(&mut self) -> bool {
        self.store.save_all(&self.url, self.boxes.as_slice())
    }

    fn update_layer_size<D: PageDom>(&mut self, dom: &D) {
        let (vw, vh) = dom.viewport_size();
        let (dw, dh) = dom.document_size();
        self.layer_size = (vw.max(dw), vh.max(dh));
    }
}
