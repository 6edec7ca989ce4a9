//! The editor controller.
//!
//! One [`Editor`] owns everything a single editable layout needs on the
//! client: the scene projection, hover driven activation, insertion
//! chrome, the component menu, drag sessions, the trash bin and the
//! command/patch exchange with the workspace. Hosts feed it pointer
//! positions, clock ticks and host-measured rectangles; it answers with
//! pure state the host renders.

use std::time::{Duration, Instant};

use uuid::Uuid;

use collage_protocol::{
    keys, Command, CommandRequest, CommandResponse, Fragment, HookEvent, Patch, Placement, Target,
    ACCEPTS,
};

use crate::drag::{default_accepts, DragSession, DropCheck, DropContainer, DropTarget};
use crate::errors::EditorError;
use crate::geometry::{Point, UiRect, Viewport};
use crate::hooks::{HookBus, HookPayload, HookReply};
use crate::menu::{menu_position, ComponentMenu, MenuOrientation};
use crate::overlay::{
    section_menu_position, toggle_position, Controls, InsertOverlay, OverlayKind, TogglePlacement,
};
use crate::scene::{Direction, Scene, SceneId, SceneKind, SpliceAnchor};
use crate::settings::EditorSettings;
use crate::status::{StatusActionKind, StatusMessage};
use crate::timer::RepeatTimer;
use crate::trash::TrashBin;

/// What the pointer currently rests on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveItem {
    Component(Uuid),
    Region { parent: Uuid, region: String },
}

/// An open server-rendered dialog (create or edit form).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub id: String,
    pub title: String,
    pub markup: String,
}

/// Result of asking for a keyboard move.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// No visible sibling on that side; the component stays put.
    NoSibling,
    /// The host should run this animation, then call
    /// [`Editor::finish_move`].
    Animating(MoveAnimation),
}

/// Everything the host needs to animate a keyboard move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveAnimation {
    pub uuid: Uuid,
    pub sibling: Uuid,
    pub duration: Duration,
    /// Signed y displacement for the moved component.
    pub item_shift: f64,
    /// Signed y displacement for the sibling it passes.
    pub sibling_shift: f64,
    /// Scroll the page here when the jump is big enough to lose the
    /// component otherwise.
    pub scroll_to: Option<f64>,
}

#[derive(Debug, Clone)]
struct PendingMove {
    uuid: Uuid,
    sibling: Uuid,
    direction: Direction,
}

#[derive(Debug)]
pub struct Editor {
    layout_id: String,
    settings: EditorSettings,
    scene: Scene,
    bus: HookBus,
    trash: TrashBin,
    hover_timer: RepeatTimer,
    status_timer: RepeatTimer,
    pointer: Point,
    viewport: Viewport,
    empty_rect: UiRect,
    active: Option<ActiveItem>,
    controls: Option<Controls>,
    overlays: Vec<InsertOverlay>,
    menu: Option<ComponentMenu>,
    /// Which overlay anchors the open menu; other chrome hides while
    /// it is set.
    active_toggle: Option<usize>,
    drag: Option<DragSession>,
    status: Option<StatusMessage>,
    status_hovered: bool,
    dialog: Option<Dialog>,
    empty_prompt: Option<InsertOverlay>,
    dirty: bool,
    saving: bool,
    cancelling: bool,
    attached: bool,
    pending_move: Option<PendingMove>,
    revision: u64,
}

impl Editor {
    pub fn new(layout_id: impl Into<String>, settings: EditorSettings) -> Self {
        Self::with_scene(layout_id, settings, Scene::new())
    }

    pub fn with_scene(
        layout_id: impl Into<String>,
        settings: EditorSettings,
        scene: Scene,
    ) -> Self {
        let hover_timer = RepeatTimer::new(settings.hover_interval());
        let status_timer = RepeatTimer::new(settings.status_interval());
        let mut bus = HookBus::new();
        bus.register(ACCEPTS, |payload| match payload {
            HookPayload::Accepts(check) => HookReply::Bool(default_accepts(check)),
            _ => HookReply::None,
        });

        let mut editor = Self {
            layout_id: layout_id.into(),
            settings,
            scene,
            bus,
            trash: TrashBin::new(),
            hover_timer,
            status_timer,
            pointer: Point::default(),
            viewport: Viewport::default(),
            empty_rect: UiRect::default(),
            active: None,
            controls: None,
            overlays: Vec::new(),
            menu: None,
            active_toggle: None,
            drag: None,
            status: None,
            status_hovered: false,
            dialog: None,
            empty_prompt: None,
            dirty: false,
            saving: false,
            cancelling: false,
            attached: true,
            pending_move: None,
            revision: 0,
        };
        editor.refresh_empty();
        editor
    }

    pub fn layout_id(&self) -> &str {
        &self.layout_id
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene access so hosts can report measured rectangles.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn active(&self) -> Option<&ActiveItem> {
        self.active.as_ref()
    }

    pub fn controls(&self) -> Option<&Controls> {
        self.controls.as_ref()
    }

    pub fn overlays(&self) -> &[InsertOverlay] {
        &self.overlays
    }

    pub fn menu(&self) -> Option<&ComponentMenu> {
        self.menu.as_ref()
    }

    /// Index of the overlay whose toggle anchors the open menu.
    pub fn active_toggle(&self) -> Option<usize> {
        self.active_toggle
    }

    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    /// The standing insert prompt shown while the layout has no
    /// components at all.
    pub fn empty_prompt(&self) -> Option<&InsertOverlay> {
        self.empty_prompt.as_ref()
    }

    pub fn trash(&self) -> &TrashBin {
        &self.trash
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_cancelling(&self) -> bool {
        self.cancelling
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether a hover sample is scheduled; hosts use this to decide
    /// if ticks are still needed.
    pub fn hover_sampling_armed(&self) -> bool {
        self.hover_timer.is_running()
    }

    // ---- clock and pointer ------------------------------------------------

    /// Reports pointer movement. Each movement re-arms the hover
    /// sampler unless the component menu keeps the editor modal.
    pub fn pointer_moved(&mut self, point: Point, now: Instant) {
        if !self.attached {
            return;
        }
        self.pointer = point;
        if self.menu.is_none() {
            self.hover_timer.start(now);
        }
    }

    /// Advances both timers. The hover sampler is single shot: it runs
    /// once per rest and waits for the next movement.
    pub fn tick(&mut self, now: Instant) {
        if !self.attached {
            return;
        }
        if self.hover_timer.fire(now) {
            self.hover_timer.stop();
            self.sample_hover();
        }
        if self.status_timer.fire(now) && !self.status_hovered {
            self.clear_status();
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        // scrolling must not flip an open menu back beneath its toggle
        self.reposition_menu(true);
    }

    /// Host-measured rectangle of the empty-state container.
    pub fn set_empty_rect(&mut self, rect: UiRect) {
        self.empty_rect = rect;
        self.refresh_empty();
    }

    fn sample_hover(&mut self) {
        if self.drag.is_some() {
            return;
        }
        let item = self
            .scene
            .hit_test(self.pointer)
            .and_then(|id| self.item_for(id));
        self.set_active(item);
    }

    fn item_for(&self, id: SceneId) -> Option<ActiveItem> {
        let node = self.scene.node(id)?;
        match node.kind() {
            SceneKind::Component { uuid, .. } => Some(ActiveItem::Component(*uuid)),
            SceneKind::Region { name } => Some(ActiveItem::Region {
                parent: self.scene.region_parent(id)?,
                region: name.clone(),
            }),
            SceneKind::Placeholder { .. } => None,
        }
    }

    // ---- active item and chrome -------------------------------------------

    /// Moves activation. No-ops while the menu is open or when the
    /// item has not changed; otherwise tears down the old chrome and
    /// builds the new item's.
    fn set_active(&mut self, item: Option<ActiveItem>) {
        if self.menu.is_some() {
            return;
        }
        if self.active == item {
            return;
        }
        self.remove_controls();
        match &item {
            Some(ActiveItem::Component(uuid)) => self.build_component_chrome(*uuid),
            Some(ActiveItem::Region { parent, region }) => {
                self.build_region_chrome(*parent, region)
            }
            None => {}
        }
        self.active = item;
    }

    /// Activates a component directly, bypassing the hover sampler.
    pub fn focus_component(&mut self, uuid: Uuid) {
        if self.scene.component_node(uuid).is_some() {
            self.set_active(Some(ActiveItem::Component(uuid)));
        }
    }

    /// Rebuilds the active item's chrome from current scene geometry.
    /// Hosts call this after re-measuring.
    pub fn refresh_chrome(&mut self) {
        if self.menu.is_some() {
            return;
        }
        let item = self.active.clone();
        self.remove_controls();
        match &item {
            Some(ActiveItem::Component(uuid)) => self.build_component_chrome(*uuid),
            Some(ActiveItem::Region { parent, region }) => {
                self.build_region_chrome(*parent, region)
            }
            None => {}
        }
    }

    fn build_component_chrome(&mut self, uuid: Uuid) {
        let Some(rect) = self.scene.component_rect(uuid) else {
            return;
        };
        let metrics = self.settings.metrics;
        self.controls = Some(Controls {
            uuid,
            position: rect.origin(),
        });

        let nested = self.scene.parent_component_of(uuid).is_some();
        if !nested && self.settings.require_sections {
            // top level slots must hold sections, so the prompts are
            // section strips instead of plain toggles
            for placement in [TogglePlacement::Before, TogglePlacement::After] {
                self.overlays.push(InsertOverlay {
                    kind: OverlayKind::SectionMenu,
                    placement,
                    container: Some(uuid),
                    region: None,
                    nested: false,
                    position: section_menu_position(rect, metrics.section_menu, placement),
                });
            }
        } else {
            for placement in [TogglePlacement::Before, TogglePlacement::After] {
                self.overlays.push(InsertOverlay {
                    kind: OverlayKind::Toggle,
                    placement,
                    container: Some(uuid),
                    region: None,
                    nested,
                    position: toggle_position(rect, metrics.toggle, placement),
                });
            }
        }
    }

    fn build_region_chrome(&mut self, parent: Uuid, region: &str) {
        let Some(region_id) = self.scene.region_node(parent, region) else {
            return;
        };
        // an occupied region activates without chrome; its components
        // carry their own insertion points
        if !self.scene.region_is_empty(region_id) {
            return;
        }
        let Some(rect) = self.scene.region_rect(parent, region) else {
            return;
        };
        self.overlays.push(InsertOverlay {
            kind: OverlayKind::Toggle,
            placement: TogglePlacement::Insert,
            container: Some(parent),
            region: Some(region.to_string()),
            nested: true,
            position: toggle_position(rect, self.settings.metrics.toggle, TogglePlacement::Insert),
        });
    }

    fn remove_controls(&mut self) {
        self.controls = None;
        self.overlays.clear();
        self.menu = None;
        self.active_toggle = None;
    }

    /// Drops activation when the active item no longer exists in the
    /// scene.
    fn prune_active(&mut self) {
        let stale = match &self.active {
            Some(ActiveItem::Component(uuid)) => self.scene.component_node(*uuid).is_none(),
            Some(ActiveItem::Region { parent, .. }) => {
                self.scene.component_node(*parent).is_none()
            }
            None => false,
        };
        if stale {
            self.active = None;
            self.remove_controls();
        }
    }

    fn refresh_empty(&mut self) {
        if self.scene.has_components() {
            self.empty_prompt = None;
            return;
        }
        let metrics = self.settings.metrics;
        let (kind, position) = if self.settings.require_sections {
            (
                OverlayKind::SectionMenu,
                section_menu_position(self.empty_rect, metrics.section_menu, TogglePlacement::Insert),
            )
        } else {
            (
                OverlayKind::Toggle,
                toggle_position(self.empty_rect, metrics.toggle, TogglePlacement::Insert),
            )
        };
        self.empty_prompt = Some(InsertOverlay {
            kind,
            placement: TogglePlacement::Insert,
            container: None,
            region: None,
            nested: false,
            position,
        });
    }

    // ---- component menu ---------------------------------------------------

    /// Opens the component menu from an insert toggle, or closes an
    /// already open menu (a second click toggles).
    pub fn toggle_clicked(&mut self, index: usize, now: Instant) -> Result<(), EditorError> {
        if self.menu.is_some() {
            self.close_menu(now);
            return Ok(());
        }
        let overlay = self
            .overlays
            .get(index)
            .ok_or(EditorError::UnknownOverlay(index))?;
        if overlay.kind != OverlayKind::Toggle {
            return Err(EditorError::NotAToggle);
        }
        let overlay = overlay.clone();
        self.open_menu(&overlay, Some(index));
        Ok(())
    }

    /// Opens the component menu from the empty-state prompt.
    pub fn empty_prompt_clicked(&mut self, now: Instant) -> Result<(), EditorError> {
        if self.menu.is_some() {
            self.close_menu(now);
            return Ok(());
        }
        let overlay = self
            .empty_prompt
            .clone()
            .ok_or(EditorError::NoEmptyPrompt)?;
        if overlay.kind != OverlayKind::Toggle {
            return Err(EditorError::NotAToggle);
        }
        self.open_menu(&overlay, None);
        Ok(())
    }

    fn open_menu(&mut self, overlay: &InsertOverlay, toggle_index: Option<usize>) {
        let metrics = self.settings.metrics;
        let anchor = UiRect::new(
            overlay.position.x,
            overlay.position.y,
            metrics.toggle.width,
            metrics.toggle.height,
        );
        let (position, orientation) = menu_position(
            anchor,
            metrics.menu,
            metrics.menu_padding_bottom,
            self.viewport,
            false,
        );
        let show_sections = self.settings.nested_sections || !overlay.nested;
        self.menu = Some(ComponentMenu {
            placement: overlay.placement,
            container: overlay.container,
            region: overlay.region.clone(),
            show_sections,
            anchor,
            position,
            orientation,
        });
        self.active_toggle = toggle_index;
        // the menu is modal; hover sampling resumes when it closes
        self.hover_timer.stop();
    }

    pub fn close_menu(&mut self, now: Instant) {
        self.menu = None;
        self.active_toggle = None;
        self.hover_timer.start(now);
    }

    /// Recomputes the open menu's position, keeping an above-the-button
    /// menu above when asked.
    pub fn reposition_menu(&mut self, keep_orientation: bool) {
        let metrics = self.settings.metrics;
        let viewport = self.viewport;
        if let Some(menu) = &mut self.menu {
            let keep_above = keep_orientation && menu.orientation == MenuOrientation::Above;
            let (position, orientation) = menu_position(
                menu.anchor,
                metrics.menu,
                metrics.menu_padding_bottom,
                viewport,
                keep_above,
            );
            menu.position = position;
            menu.orientation = orientation;
        }
    }

    /// Picks a type from the open menu, closing it and producing the
    /// matching insert command.
    pub fn select_component_type(
        &mut self,
        type_id: impl Into<String>,
        now: Instant,
    ) -> Result<CommandRequest, EditorError> {
        let menu = self.menu.clone().ok_or(EditorError::MenuNotOpen)?;
        let type_id = type_id.into();
        let command = match menu.placement {
            TogglePlacement::Insert => match (menu.container, menu.region) {
                (Some(parent), Some(region)) => Command::InsertIntoRegion {
                    parent,
                    region,
                    type_id,
                },
                _ => Command::InsertComponent { type_id },
            },
            TogglePlacement::Before | TogglePlacement::After => {
                let sibling = menu.container.ok_or(EditorError::MenuNotOpen)?;
                let placement = match menu.placement {
                    TogglePlacement::Before => Placement::Before,
                    _ => Placement::After,
                };
                Command::InsertSibling {
                    sibling,
                    placement,
                    type_id,
                }
            }
        };
        self.close_menu(now);
        self.mutating_request(command)
    }

    /// Picks a section type from an inline section strip.
    pub fn select_section_type(
        &mut self,
        index: usize,
        type_id: impl Into<String>,
    ) -> Result<CommandRequest, EditorError> {
        let overlay = self
            .overlays
            .get(index)
            .ok_or(EditorError::UnknownOverlay(index))?;
        if overlay.kind != OverlayKind::SectionMenu {
            return Err(EditorError::NotASectionMenu);
        }
        let type_id = type_id.into();
        let command = match (overlay.container, overlay.placement) {
            (Some(sibling), TogglePlacement::Before) => Command::InsertSibling {
                sibling,
                placement: Placement::Before,
                type_id,
            },
            (Some(sibling), _) => Command::InsertSibling {
                sibling,
                placement: Placement::After,
                type_id,
            },
            (None, _) => Command::InsertComponent { type_id },
        };
        self.mutating_request(command)
    }

    /// Picks a section type from the empty-state section strip.
    pub fn empty_section_select(
        &mut self,
        type_id: impl Into<String>,
    ) -> Result<CommandRequest, EditorError> {
        let prompt = self.empty_prompt.as_ref().ok_or(EditorError::NoEmptyPrompt)?;
        if prompt.kind != OverlayKind::SectionMenu {
            return Err(EditorError::NotASectionMenu);
        }
        self.mutating_request(Command::InsertComponent {
            type_id: type_id.into(),
        })
    }

    // ---- commands ---------------------------------------------------------

    /// Asks for a component's edit form.
    pub fn edit_component(&mut self, uuid: Uuid) -> Result<CommandRequest, EditorError> {
        if self.scene.component_node(uuid).is_none() {
            return Err(EditorError::UnknownComponent(uuid));
        }
        self.mutating_request(Command::EditForm { uuid })
    }

    /// Submits dialog form values for a component.
    pub fn submit_form(
        &mut self,
        uuid: Uuid,
        values: &serde_json::Value,
    ) -> Result<CommandRequest, EditorError> {
        let mut request = self.mutating_request(Command::SubmitForm { uuid })?;
        request.payload.insert_json(keys::COMPONENT_DATA, values)?;
        Ok(request)
    }

    /// Builds the save command: ordering snapshot plus the accumulated
    /// delete set. Deletions only reach the server here.
    pub fn save(&mut self) -> Result<CommandRequest, EditorError> {
        let mut request = self.mutating_request(Command::Save)?;
        request
            .payload
            .insert_json(keys::DELETE_COMPONENTS, &self.trash.collect_uuids())?;
        self.saving = true;
        Ok(request)
    }

    /// Builds the cancel command. The payload stays empty: cancel
    /// never carries an ordering snapshot or a delete set.
    pub fn cancel(&mut self) -> CommandRequest {
        self.cancelling = true;
        CommandRequest::new(&Command::Cancel)
    }

    /// Escape closes the menu when one is open, otherwise it cancels
    /// the whole editing session.
    pub fn press_escape(&mut self, now: Instant) -> Option<CommandRequest> {
        if self.menu.is_some() {
            self.close_menu(now);
            None
        } else {
            Some(self.cancel())
        }
    }

    fn mutating_request(&self, command: Command) -> Result<CommandRequest, EditorError> {
        let mut request = CommandRequest::new(&command);
        request
            .payload
            .insert_json(keys::LAYOUT_STATE, &self.scene.capture_state())?;
        request.payload.insert_json(keys::REVISION, &self.revision)?;
        Ok(request)
    }

    /// Reports a failed transport round trip. The editor stays dirty;
    /// the user keeps their work and sees a dismissable message.
    pub fn command_failed(&mut self, message: impl Into<String>, now: Instant) {
        self.saving = false;
        self.cancelling = false;
        self.show_status(StatusMessage::plain(message), now);
    }

    // ---- delete, undo, status ---------------------------------------------

    /// Detaches a component into the trash and raises the undo message.
    /// Nothing is sent to the server until the next save.
    pub fn delete_component(&mut self, uuid: Uuid, now: Instant) -> bool {
        let Some(detached) = self.scene.detach_component(uuid) else {
            return false;
        };
        self.trash.push(detached);
        self.prune_active();
        self.show_status(
            StatusMessage::with_action(
                "Component deleted.",
                "Undo",
                StatusActionKind::RestoreComponent,
            ),
            now,
        );
        self.edited();
        true
    }

    /// Pops the most recent deletion back into its placeholder. The
    /// editor stays dirty: the restore itself is not an edit, but the
    /// session already was one.
    pub fn restore_deleted(&mut self) -> bool {
        let Some(detached) = self.trash.pop() else {
            return false;
        };
        if !self.scene.restore_detached(detached) {
            return false;
        }
        self.refresh_empty();
        true
    }

    /// Runs a status action by index, then dismisses the message.
    pub fn status_action(&mut self, index: usize) -> bool {
        let Some(kind) = self
            .status
            .as_ref()
            .and_then(|status| status.actions.get(index))
            .map(|action| action.kind)
        else {
            return false;
        };
        let handled = match kind {
            StatusActionKind::RestoreComponent => self.restore_deleted(),
        };
        self.clear_status();
        handled
    }

    pub fn clear_status(&mut self) {
        self.status = None;
        self.status_timer.stop();
    }

    /// A hovered status message does not expire.
    pub fn set_status_hovered(&mut self, hovered: bool) {
        self.status_hovered = hovered;
    }

    fn show_status(&mut self, message: StatusMessage, now: Instant) {
        self.status = Some(message);
        self.status_timer.stop();
        self.status_timer.start(now);
    }

    // ---- keyboard move ----------------------------------------------------

    /// Starts a keyboard move past the nearest visible sibling. The
    /// scene reorders when the host finishes the animation.
    pub fn move_component(&mut self, uuid: Uuid, direction: Direction) -> MoveOutcome {
        let Some(sibling) = self.scene.visible_sibling(uuid, direction) else {
            return MoveOutcome::NoSibling;
        };
        let (Some(item_rect), Some(sibling_rect)) = (
            self.scene.component_rect(uuid),
            self.scene.component_rect(sibling),
        ) else {
            return MoveOutcome::NoSibling;
        };

        self.remove_controls();
        self.hover_timer.stop();

        let sign = match direction {
            Direction::Down => 1.0,
            Direction::Up => -1.0,
        };
        let distance = sibling_rect.height;
        let item_shift = distance * sign;
        let sibling_shift = -item_rect.height * sign;
        // glide time tracks the distance travelled, within taste
        let duration = Duration::from_millis(distance.clamp(100.0, 500.0).round() as u64);
        let scroll_to = (distance > 50.0).then(|| self.viewport.scroll_top + item_shift);

        self.pending_move = Some(PendingMove {
            uuid,
            sibling,
            direction,
        });
        self.edited();
        MoveOutcome::Animating(MoveAnimation {
            uuid,
            sibling,
            duration,
            item_shift,
            sibling_shift,
            scroll_to,
        })
    }

    /// Completes the pending move: reorders the scene and puts the
    /// controls back on the moved component.
    pub fn finish_move(&mut self, now: Instant) -> bool {
        let Some(PendingMove {
            uuid,
            sibling,
            direction,
        }) = self.pending_move.take()
        else {
            return false;
        };
        let placement = match direction {
            Direction::Down => Placement::After,
            Direction::Up => Placement::Before,
        };
        if !self.scene.reorder_adjacent(uuid, sibling, placement) {
            return false;
        }
        self.active = Some(ActiveItem::Component(uuid));
        self.build_component_chrome(uuid);
        self.hover_timer.start(now);
        true
    }

    // ---- drag and drop ----------------------------------------------------

    pub fn drag_start(&mut self, uuid: Uuid) -> bool {
        if !self.attached || self.drag.is_some() {
            return false;
        }
        if self.scene.component_node(uuid).is_none() {
            return false;
        }
        let section = self.scene.is_section_component(uuid);
        let source = self.scene.container_of(uuid);
        self.set_active(None);
        self.drag = Some(DragSession {
            uuid,
            section,
            source,
            over: None,
        });
        true
    }

    /// Reports the drag hovering a container. Runs the `accepts` veto
    /// round and remembers the position only when it passes.
    pub fn drag_over(&mut self, container: DropContainer, before: Option<Uuid>) -> bool {
        let Some(drag) = &self.drag else {
            return false;
        };
        let check = DropCheck {
            uuid: drag.uuid,
            section: drag.section,
            target: container.clone(),
            source: drag.source.clone(),
            sibling: before,
        };
        let permitted = self.bus.permits(ACCEPTS, &HookPayload::Accepts(check));
        if let Some(drag) = &mut self.drag {
            drag.over = permitted.then(|| DropTarget { container, before });
        }
        permitted
    }

    pub fn drag_out(&mut self) {
        if let Some(drag) = &mut self.drag {
            drag.over = None;
        }
    }

    /// Drops at the last accepted position. A drop anywhere else, or
    /// with no accepted position at all, changes nothing.
    pub fn drop_dragged(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let Some(target) = drag.over else {
            return false;
        };
        if !self.scene.move_component(drag.uuid, &target) {
            return false;
        }
        self.edited();
        true
    }

    pub fn drag_end(&mut self) {
        self.drag = None;
    }

    // ---- hooks ------------------------------------------------------------

    pub fn register_hook<F>(&mut self, hook: impl Into<String>, callback: F)
    where
        F: Fn(&HookPayload) -> HookReply + 'static,
    {
        self.bus.register(hook, callback);
    }

    pub fn unregister_hook(&mut self, hook: &str) {
        self.bus.unregister(hook);
    }

    pub fn invoke_hooks(&self, hook: &str, payload: &HookPayload) -> Vec<HookReply> {
        self.bus.invoke(hook, payload)
    }

    // ---- server responses -------------------------------------------------

    /// Applies a full command response: adopts the server's revision
    /// and runs its patches in order.
    pub fn apply_response(&mut self, response: &CommandResponse) {
        self.revision = response.revision;
        self.apply_patches(&response.patches);
    }

    pub fn apply_patches(&mut self, patches: &[Patch]) {
        for patch in patches {
            self.apply_patch(patch);
        }
    }

    fn apply_patch(&mut self, patch: &Patch) {
        match patch {
            Patch::Replace { target, content } => self.apply_replace(target, content),
            Patch::InsertBefore { target, content } => {
                if let Target::Component { uuid } = target {
                    self.scene.splice_fragment(&SpliceAnchor::Before(*uuid), content);
                    self.refresh_empty();
                }
            }
            Patch::InsertAfter { target, content } => {
                if let Target::Component { uuid } = target {
                    self.scene.splice_fragment(&SpliceAnchor::After(*uuid), content);
                    self.refresh_empty();
                }
            }
            Patch::Append { target, content } => {
                let anchor = match target {
                    Target::Region { parent, region } => Some(SpliceAnchor::RegionEnd {
                        parent: *parent,
                        region: region.clone(),
                    }),
                    Target::Editor { layout_id } if *layout_id == self.layout_id => {
                        Some(SpliceAnchor::RootEnd)
                    }
                    _ => None,
                };
                if let Some(anchor) = anchor {
                    self.scene.splice_fragment(&anchor, content);
                    self.refresh_empty();
                }
            }
            Patch::Invoke { target, method } => {
                if method == "focus" {
                    if let Target::Component { uuid } = target {
                        self.focus_component(*uuid);
                    }
                }
            }
            Patch::OpenDialog { id, title, markup } => {
                self.dialog = Some(Dialog {
                    id: id.clone(),
                    title: title.clone(),
                    markup: markup.clone(),
                });
                // chrome comes down while the dialog is up
                self.remove_controls();
            }
            Patch::CloseDialog { id } => {
                if self
                    .dialog
                    .as_ref()
                    .map(|dialog| dialog.id == *id)
                    .unwrap_or(false)
                {
                    self.dialog = None;
                }
            }
            Patch::InvokeHook { event } => self.handle_hook_event(event),
        }
    }

    fn apply_replace(&mut self, target: &Target, content: &Fragment) {
        match target {
            Target::Component { uuid } => {
                if self.scene.replace_component(*uuid, content) {
                    self.prune_active();
                    self.refresh_empty();
                }
            }
            Target::Editor { layout_id } if *layout_id == self.layout_id => {
                self.scene.reset_from_fragment(content);
                self.active = None;
                self.remove_controls();
                self.trash.clear();
                self.drag = None;
                self.refresh_empty();
                if self.cancelling {
                    self.detach();
                }
            }
            _ => {}
        }
    }

    /// The editor reacts to its own hook events first, then fans them
    /// out to registered callbacks.
    fn handle_hook_event(&mut self, event: &HookEvent) {
        match event {
            HookEvent::Save { layout_id } if *layout_id == self.layout_id => self.saved(),
            HookEvent::InsertComponent {
                layout_id,
                component_uuid,
            }
            | HookEvent::UpdateComponent {
                layout_id,
                component_uuid,
            } if *layout_id == self.layout_id => {
                self.component_updated(*component_uuid);
            }
            _ => {}
        }
        self.bus
            .invoke(event.hook(), &HookPayload::Event(event.clone()));
    }

    fn component_updated(&mut self, uuid: Uuid) {
        self.remove_controls();
        self.active = None;
        if self.scene.component_node(uuid).is_some() {
            self.set_active(Some(ActiveItem::Component(uuid)));
        }
        self.edited();
    }

    fn edited(&mut self) {
        self.dirty = true;
        self.refresh_empty();
    }

    fn saved(&mut self) {
        self.dirty = false;
        self.saving = false;
        // confirmed deletions can no longer be undone
        self.trash.clear();
    }

    /// Tears the editor down after a cancel completes. Every timer
    /// stops and all transient state drops.
    pub fn detach(&mut self) {
        self.attached = false;
        self.hover_timer.stop();
        self.status_timer.stop();
        self.remove_controls();
        self.active = None;
        self.status = None;
        self.drag = None;
        self.dialog = None;
        self.empty_prompt = None;
        self.cancelling = false;
    }
}
