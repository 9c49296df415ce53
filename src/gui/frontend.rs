#![allow(clippy::collapsible_if)]
#![allow(clippy::needless_return)]
use std::time::{Duration, Instant};

use eframe::egui::{self, Color32, RichText, Stroke};
use uuid::Uuid;

use crate::board_utils::board::{
    normalize_url, Board, CategoryId, LinkDropTarget, LinkId, PanelId,
};
use crate::persistence::settings::AppSettings;
use crate::persistence::store::{self, BoardSnapshot, DirStore, KvStore, Theme};

// Export all links, joined with their category and panel names
fn export_links_json(board: &Board, path: &std::path::Path) -> std::io::Result<()> {
    use std::fs::File;
    use std::io::Write;
    #[derive(serde::Serialize)]
    struct LinkOut<'a> {
        id: &'a Uuid,
        name: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<&'a str>,
        url: &'a str,
        category: &'a str,
        panel: &'a str,
    }
    let mut out: Vec<LinkOut> = Vec::with_capacity(board.links.len());
    for link in &board.links {
        let category = board.get_category(link.category_id);
        let panel = category
            .and_then(|c| c.panel_id)
            .and_then(|pid| board.get_panel(pid));
        out.push(LinkOut {
            id: &link.id,
            name: &link.name,
            description: link.description.as_deref(),
            url: &link.url,
            category: category.map(|c| c.name.as_str()).unwrap_or(""),
            panel: panel.map(|p| p.name.as_str()).unwrap_or(""),
        });
    }
    if let Some(parent) = path.parent() { std::fs::create_dir_all(parent)?; }
    let f = File::create(path)?;
    serde_json::to_writer_pretty(f, &out).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    // ensure newline at end
    let mut f2 = std::fs::OpenOptions::new().append(true).open(path)?;
    let _ = f2.write_all(b"\n");
    Ok(())
}

fn export_links_csv(board: &Board, path: &std::path::Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() { std::fs::create_dir_all(parent)?; }
    let mut wtr = csv::Writer::from_path(path)?;
    // headers: id,name,url,description,category,panel
    wtr.write_record(["id", "name", "url", "description", "category", "panel"])?;
    for link in &board.links {
        let category = board.get_category(link.category_id);
        let panel = category
            .and_then(|c| c.panel_id)
            .and_then(|pid| board.get_panel(pid));
        wtr.write_record(&[
            link.id.to_string(),
            link.name.clone(),
            link.url.clone(),
            link.description.clone().unwrap_or_default(),
            category.map(|c| c.name.clone()).unwrap_or_default(),
            panel.map(|p| p.name.clone()).unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

// Style for toast notifications
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum NoticeStyle {
    Subtle,
    Prominent,
}

// What is being dragged; egui keeps a single armed payload at a time and a
// drag only starts from the dots handle, never from the whole row
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum DragPayload {
    Category(CategoryId),
    Link(LinkId),
}

// Drop resolved for this frame; applied after the lists are drawn
#[derive(Copy, Clone, Debug)]
enum DropAction {
    ReorderCategory { dragged: CategoryId, target: CategoryId },
    MoveLink { dragged: LinkId, target: LinkDropTarget },
}

#[derive(Clone, Debug)]
struct PanelEditor {
    id: Option<PanelId>,
    name: String,
}

#[derive(Clone, Debug)]
struct CategoryEditor {
    id: Option<CategoryId>,
    name: String,
}

#[derive(Clone, Debug)]
struct LinkEditor {
    id: Option<LinkId>,
    url: String,
    name: String,
    description: String,
    category: Option<CategoryId>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum PendingDelete {
    Panel(PanelId),
    Category(CategoryId),
    Link(LinkId),
}

pub struct BoardApp {
    board: Board,
    // Stored preference; None until the first frame resolves the OS default
    theme: Option<Theme>,
    applied_theme: Option<Theme>,
    store: Box<dyn KvStore>,
    // persistence feedback
    save_error: Option<String>,
    last_save_info: Option<String>,
    last_info_time: Option<Instant>,
    last_info_style: NoticeStyle,
    // Modal editor state; Some = window open
    panel_editor: Option<PanelEditor>,
    category_editor: Option<CategoryEditor>,
    link_editor: Option<LinkEditor>,
    pending_delete: Option<PendingDelete>,
    show_snapshots: bool,
    // App settings and Preferences UI state
    app_settings: AppSettings,
    show_prefs_window: bool,
    prefs_edit: AppSettings,
    prefs_status: Option<String>,
    prefs_state_override_str: String,
    prefs_snapshot_override_str: String,
    prefs_export_override_str: String,
    // Export links modal
    show_export_window: bool,
    export_is_json: bool,
    export_path: String,
    export_status: Option<String>,
}

impl BoardApp {
    pub fn new(store: Box<dyn KvStore>, settings: AppSettings) -> Self {
        let loaded = store::load_state(store.as_ref());
        let mut s = Self {
            board: loaded.board,
            theme: loaded.theme,
            applied_theme: None,
            store,
            save_error: None,
            last_save_info: None,
            last_info_time: None,
            last_info_style: NoticeStyle::Prominent,
            panel_editor: None,
            category_editor: None,
            link_editor: None,
            pending_delete: None,
            show_snapshots: false,
            app_settings: settings,
            show_prefs_window: false,
            prefs_edit: AppSettings::default(),
            prefs_status: None,
            prefs_state_override_str: String::new(),
            prefs_snapshot_override_str: String::new(),
            prefs_export_override_str: String::new(),
            show_export_window: false,
            export_is_json: true,
            export_path: String::new(),
            export_status: None,
        };
        // Seed or migrate, then heal a stale current panel; persist the result
        if s.board.bootstrap() {
            if let Err(e) = store::save_state(s.store.as_mut(), &s.board, s.theme) {
                s.save_error = Some(format!("Save failed: {}", e));
            }
        }
        s
    }

    fn notify(&mut self, msg: impl Into<String>, style: NoticeStyle) {
        self.last_save_info = Some(msg.into());
        self.last_info_time = Some(Instant::now());
        self.last_info_style = style;
    }

    // Full snapshot overwrite of the three collections; runs after every
    // repository mutation
    fn persist_collections(&mut self) {
        match store::save_collections(self.store.as_mut(), &self.board) {
            Ok(()) => self.save_error = None,
            Err(e) => self.save_error = Some(format!("Save failed: {}", e)),
        }
    }

    fn persist_current_panel(&mut self) {
        match store::save_current_panel(self.store.as_mut(), self.board.current_panel) {
            Ok(()) => self.save_error = None,
            Err(e) => self.save_error = Some(format!("Save failed: {}", e)),
        }
    }

    fn persist_theme(&mut self) {
        if let Some(theme) = self.theme {
            match store::save_theme(self.store.as_mut(), theme) {
                Ok(()) => self.save_error = None,
                Err(e) => self.save_error = Some(format!("Save failed: {}", e)),
            }
        }
    }

    fn save_all_now(&mut self) {
        match store::save_state(self.store.as_mut(), &self.board, self.theme) {
            Ok(()) => {
                self.save_error = None;
                self.notify("Saved", NoticeStyle::Prominent);
            }
            Err(e) => self.save_error = Some(format!("Save failed: {}", e)),
        }
    }

    fn save_snapshot_now(&mut self) {
        let snap = BoardSnapshot::from_runtime(&self.board, self.theme);
        match store::save_snapshot(&snap) {
            Ok(path) => {
                self.save_error = None;
                self.notify(format!("Snapshot saved to {}", path.display()), NoticeStyle::Prominent);
            }
            Err(e) => self.save_error = Some(format!("Snapshot failed: {}", e)),
        }
    }

    fn restore_snapshot(&mut self, path: &std::path::Path) {
        match store::load_snapshot(path) {
            Ok(snap) => {
                let (board, theme) = snap.into_runtime();
                self.board = board;
                if theme.is_some() {
                    self.theme = theme;
                }
                self.board.heal_current_panel();
                match store::save_state(self.store.as_mut(), &self.board, self.theme) {
                    Ok(()) => self.save_error = None,
                    Err(e) => self.save_error = Some(format!("Save failed: {}", e)),
                }
                self.notify("Snapshot restored", NoticeStyle::Prominent);
            }
            Err(e) => self.save_error = Some(format!("Restore failed: {}", e)),
        }
    }

    fn open_panel_editor(&mut self, id: Option<PanelId>) {
        let name = id
            .and_then(|pid| self.board.get_panel(pid))
            .map(|p| p.name.clone())
            .unwrap_or_default();
        self.panel_editor = Some(PanelEditor { id, name });
    }

    fn open_category_editor(&mut self, id: Option<CategoryId>) {
        if id.is_none() && self.board.current_panel.is_none() {
            self.notify("Create a panel first", NoticeStyle::Prominent);
            return;
        }
        let name = id
            .and_then(|cid| self.board.get_category(cid))
            .map(|c| c.name.clone())
            .unwrap_or_default();
        self.category_editor = Some(CategoryEditor { id, name });
    }

    fn open_link_editor(&mut self, id: Option<LinkId>) {
        match id {
            Some(lid) => {
                if let Some(link) = self.board.get_link(lid) {
                    self.link_editor = Some(LinkEditor {
                        id: Some(lid),
                        url: link.url.clone(),
                        name: link.name.clone(),
                        description: link.description.clone().unwrap_or_default(),
                        category: Some(link.category_id),
                    });
                }
            }
            None => {
                // Adding needs at least one category under the current panel
                let first_cat = self
                    .board
                    .current_panel
                    .and_then(|pid| self.board.category_ids_for_panel(pid).first().copied());
                if first_cat.is_none() {
                    self.notify("Create a category first", NoticeStyle::Prominent);
                    return;
                }
                self.link_editor = Some(LinkEditor {
                    id: None,
                    url: String::new(),
                    name: String::new(),
                    description: String::new(),
                    category: first_cat,
                });
            }
        }
    }

    fn menu_open_prefs(&mut self) {
        // Prepare editable copy and open the window
        self.prefs_edit = self.app_settings.clone();
        self.prefs_state_override_str = match &self.prefs_edit.state_override {
            Some(p) => p.display().to_string(),
            None => String::new(),
        };
        self.prefs_snapshot_override_str = match &self.prefs_edit.snapshot_override {
            Some(p) => p.display().to_string(),
            None => String::new(),
        };
        self.prefs_export_override_str = match &self.prefs_edit.export_override {
            Some(p) => p.display().to_string(),
            None => String::new(),
        };
        self.prefs_status = None;
        self.show_prefs_window = true;
    }

    fn menu_open_export(&mut self) {
        self.show_export_window = true;
        self.export_status = None;
        // Initialize default path if empty
        if self.export_path.is_empty() {
            let now = time::OffsetDateTime::now_utc();
            let fmt = time::macros::format_description!("[year][month][day]_[hour][minute][second]");
            let stamp = now.format(&fmt).unwrap_or_else(|_| "now".into());
            let ext = if self.export_is_json { "json" } else { "csv" };
            let mut base = self.app_settings.export_dir();
            base.push(format!("links_export_{}.{}", stamp, ext));
            self.export_path = base.display().to_string();
        }
    }

    fn effective_theme(&self, ctx: &egui::Context) -> Theme {
        self.theme.unwrap_or_else(|| {
            // First run: follow whatever the windowing layer handed egui
            if ctx.style().visuals.dark_mode { Theme::Dark } else { Theme::Light }
        })
    }

    // Color-code link glyphs by domain so every site keeps a stable hue
    fn color_for_seed(seed: &str) -> Color32 {
        const PALETTE: [Color32; 12] = [
            Color32::from_rgb(0x7b, 0xa3, 0xff), // blue
            Color32::from_rgb(0xff, 0xa3, 0x7b), // orange
            Color32::from_rgb(0x7b, 0xff, 0xa3), // green
            Color32::from_rgb(0xff, 0x7b, 0xa3), // pink
            Color32::from_rgb(0xa3, 0x7b, 0xff), // violet
            Color32::from_rgb(0xff, 0xe0, 0x7b), // yellow
            Color32::from_rgb(0x7b, 0xff, 0xe0), // teal
            Color32::from_rgb(0xe0, 0x7b, 0xff), // purple
            Color32::from_rgb(0x7b, 0xe0, 0xff), // cyan
            Color32::from_rgb(0xff, 0x7b, 0xe0), // magenta
            Color32::from_rgb(0x9a, 0xcd, 0x32), // yellowgreen
            Color32::from_rgb(0xcd, 0x32, 0x9a), // fuchsia
        ];
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        seed.hash(&mut hasher);
        let h = hasher.finish() as usize;
        PALETTE[h % PALETTE.len()]
    }

    fn panel_tabs(&mut self, ui: &mut egui::Ui) {
        let panels: Vec<(PanelId, String)> = self
            .board
            .panels
            .iter()
            .map(|p| (p.id, p.name.clone()))
            .collect();
        ui.horizontal_wrapped(|ui| {
            for (pid, name) in panels {
                let active = self.board.current_panel == Some(pid);
                if ui.selectable_label(active, RichText::new(&name).strong()).clicked() {
                    if self.board.set_current_panel(pid) {
                        self.persist_current_panel();
                    }
                }
                if ui.small_button("✏").on_hover_text("Edit Panel").clicked() {
                    self.open_panel_editor(Some(pid));
                }
                if ui.small_button("🗑").on_hover_text("Delete Panel").clicked() {
                    self.pending_delete = Some(PendingDelete::Panel(pid));
                }
                ui.separator();
            }
            if ui.button("＋ Panel").on_hover_text("Add Panel").clicked() {
                self.open_panel_editor(None);
            }
        });
    }

    // One bookmark row. Returns the row response so the caller can resolve
    // drops against it (a release on a row beats the enclosing category).
    fn link_row(&mut self, ui: &mut egui::Ui, id: LinkId) -> Option<egui::Response> {
        let link = self.board.get_link(id)?;
        let name = link.name.clone();
        let url = link.url.clone();
        let description = link.description.clone();

        let frame = egui::Frame::group(ui.style())
            .inner_margin(egui::Margin::symmetric(8, 4))
            .corner_radius(egui::CornerRadius::same(6))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let handle = ui
                        .dnd_drag_source(
                            egui::Id::new(("link-drag", id)),
                            DragPayload::Link(id),
                            |ui| {
                                ui.label("⠿");
                            },
                        )
                        .response;
                    handle.on_hover_cursor(egui::CursorIcon::Grab);

                    // Icon glyph: first character on a per-domain color; no
                    // network fetch, so this is also the offline fallback
                    let (rect, _) =
                        ui.allocate_exact_size(egui::vec2(22.0, 22.0), egui::Sense::hover());
                    let seed = domain_of(&url).unwrap_or_else(|| name.clone());
                    ui.painter()
                        .circle_filled(rect.center(), 10.0, Self::color_for_seed(&seed));
                    let letter = name.chars().next().unwrap_or('•').to_uppercase().to_string();
                    ui.painter().text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        letter,
                        egui::FontId::proportional(12.0),
                        Color32::BLACK,
                    );

                    let title = ui.link(RichText::new(&name).strong()).on_hover_text(&url);
                    if title.clicked() {
                        ui.ctx().open_url(egui::OpenUrl::new_tab(&url));
                    }
                    if let Some(desc) = &description {
                        ui.weak(desc);
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("🗑").on_hover_text("Delete Link").clicked() {
                            self.pending_delete = Some(PendingDelete::Link(id));
                        }
                        if ui.small_button("✏").on_hover_text("Edit Link").clicked() {
                            self.open_link_editor(Some(id));
                        }
                    });
                });
            });
        Some(frame.response)
    }

    fn dashboard_contents(&mut self, ui: &mut egui::Ui) -> Option<DropAction> {
        let mut drop_action: Option<DropAction> = None;

        if self.board.panels.is_empty() {
            ui.add_space(48.0);
            ui.vertical_centered(|ui| {
                ui.heading("No Panels");
                ui.weak("Use Add → Panel to create your first panel.");
            });
            return None;
        }
        let Some(current) = self.board.current_panel else {
            return None;
        };

        let panel_cats = self.board.category_ids_for_panel(current);
        if panel_cats.is_empty() {
            ui.add_space(48.0);
            ui.vertical_centered(|ui| {
                ui.heading("Welcome to this Panel");
                ui.weak("Use Add → Category to create a category, then add some links.");
            });
            return None;
        }

        for cat_id in panel_cats {
            let Some(cat) = self.board.get_category(cat_id) else { continue };
            let cat_name = cat.name.clone();

            let frame = egui::Frame::group(ui.style())
                .inner_margin(egui::Margin::symmetric(10, 8))
                .corner_radius(egui::CornerRadius::same(8))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let handle = ui
                            .dnd_drag_source(
                                egui::Id::new(("cat-drag", cat_id)),
                                DragPayload::Category(cat_id),
                                |ui| {
                                    ui.label(RichText::new("⠿").size(16.0));
                                },
                            )
                            .response;
                        handle.on_hover_cursor(egui::CursorIcon::Grab);
                        ui.heading(&cat_name);
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("🗑").on_hover_text("Delete Category").clicked() {
                                self.pending_delete = Some(PendingDelete::Category(cat_id));
                            }
                            if ui.small_button("✏").on_hover_text("Edit Category").clicked() {
                                self.open_category_editor(Some(cat_id));
                            }
                        });
                    });
                    ui.separator();

                    let link_ids = self.board.link_ids_for_category(cat_id);
                    if link_ids.is_empty() {
                        ui.weak("No links in this category. Drag one here, or add a new link.");
                        ui.add_space(12.0);
                    }
                    for link_id in link_ids {
                        let Some(row) = self.link_row(ui, link_id) else { continue };
                        if let Some(payload) = row.dnd_release_payload::<DragPayload>() {
                            if let DragPayload::Link(dragged) = *payload {
                                drop_action = Some(DropAction::MoveLink {
                                    dragged,
                                    target: LinkDropTarget::Link(link_id),
                                });
                            }
                        }
                        if let Some(payload) = row.dnd_hover_payload::<DragPayload>() {
                            if matches!(*payload, DragPayload::Link(_))
                                && *payload != DragPayload::Link(link_id)
                            {
                                ui.painter().rect_stroke(
                                    row.rect,
                                    egui::CornerRadius::same(6),
                                    Stroke::new(1.5, Color32::from_rgb(120, 200, 255)),
                                    egui::StrokeKind::Outside,
                                );
                            }
                        }
                    }
                });

            let frame_resp = frame.response;
            // A release on a link row above already resolved; the category
            // frame (header and empty area included) is the fallback target,
            // mirroring closest() precedence in a DOM
            if let Some(payload) = frame_resp.dnd_release_payload::<DragPayload>() {
                match *payload {
                    DragPayload::Category(dragged) => {
                        drop_action.get_or_insert(DropAction::ReorderCategory {
                            dragged,
                            target: cat_id,
                        });
                    }
                    DragPayload::Link(dragged) => {
                        drop_action.get_or_insert(DropAction::MoveLink {
                            dragged,
                            target: LinkDropTarget::Category(cat_id),
                        });
                    }
                }
            }
            if let Some(payload) = frame_resp.dnd_hover_payload::<DragPayload>() {
                if *payload != DragPayload::Category(cat_id) {
                    ui.painter().rect_stroke(
                        frame_resp.rect,
                        egui::CornerRadius::same(8),
                        Stroke::new(2.0, Color32::from_rgb(120, 200, 255)),
                        egui::StrokeKind::Outside,
                    );
                }
            }
            ui.add_space(10.0);
        }
        drop_action
    }

    fn apply_drop(&mut self, action: DropAction) {
        let mutated = match action {
            DropAction::ReorderCategory { dragged, target } => {
                self.board.reorder_category(dragged, target)
            }
            DropAction::MoveLink { dragged, target } => self.board.move_link(dragged, target),
        };
        if mutated {
            self.persist_collections();
        }
    }

    fn panel_editor_window(&mut self, ctx: &egui::Context) {
        let Some(mut ed) = self.panel_editor.take() else { return };
        let mut open = true;
        let mut done = false;
        let title = if ed.id.is_some() { "Edit Panel" } else { "Add Panel" };
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label("Name");
                let resp = ui.text_edit_singleline(&mut ed.name);
                let submit = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    let can_save = !ed.name.trim().is_empty();
                    if ui.add_enabled(can_save, egui::Button::new("Save")).clicked()
                        || (submit && can_save)
                    {
                        match ed.id {
                            Some(pid) => {
                                if self.board.update_panel_name(pid, ed.name.trim().to_string()) {
                                    self.persist_collections();
                                }
                            }
                            None => {
                                // Switch to the newly created panel
                                let pid = self.board.add_panel(ed.name.trim().to_string());
                                self.board.set_current_panel(pid);
                                self.persist_collections();
                                self.persist_current_panel();
                            }
                        }
                        done = true;
                    }
                    if ui.button("Cancel").clicked() {
                        done = true;
                    }
                });
            });
        if open && !done {
            self.panel_editor = Some(ed);
        }
    }

    fn category_editor_window(&mut self, ctx: &egui::Context) {
        let Some(mut ed) = self.category_editor.take() else { return };
        let mut open = true;
        let mut done = false;
        let title = if ed.id.is_some() { "Edit Category" } else { "Add Category" };
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label("Name");
                let resp = ui.text_edit_singleline(&mut ed.name);
                let submit = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    let can_save = !ed.name.trim().is_empty();
                    if ui.add_enabled(can_save, egui::Button::new("Save")).clicked()
                        || (submit && can_save)
                    {
                        match ed.id {
                            Some(cid) => {
                                if self.board.update_category_name(cid, ed.name.trim().to_string()) {
                                    self.persist_collections();
                                }
                            }
                            None => {
                                if let Some(pid) = self.board.current_panel {
                                    self.board.add_category(ed.name.trim().to_string(), pid);
                                    self.persist_collections();
                                }
                            }
                        }
                        done = true;
                    }
                    if ui.button("Cancel").clicked() {
                        done = true;
                    }
                });
            });
        if open && !done {
            self.category_editor = Some(ed);
        }
    }

    fn link_editor_window(&mut self, ctx: &egui::Context) {
        let Some(mut ed) = self.link_editor.take() else { return };
        let mut open = true;
        let mut done = false;
        let title = if ed.id.is_some() { "Edit Link" } else { "Add Link" };
        // Category choices come from the current panel only
        let cat_choices: Vec<(CategoryId, String)> = self
            .board
            .current_panel
            .map(|pid| {
                self.board
                    .category_ids_for_panel(pid)
                    .into_iter()
                    .filter_map(|cid| {
                        self.board.get_category(cid).map(|c| (cid, c.name.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label("URL");
                let url_resp = ui.text_edit_singleline(&mut ed.url);
                if url_resp.lost_focus() && ed.name.trim().is_empty() {
                    // Auto-fill the name from the URL's domain
                    if let Some(name) = derive_name_from_url(&ed.url) {
                        ed.name = name;
                    }
                }
                ui.label("Name");
                ui.text_edit_singleline(&mut ed.name);
                ui.label("Description (optional)");
                ui.text_edit_singleline(&mut ed.description);
                ui.label("Category");
                let selected_name = ed
                    .category
                    .and_then(|cid| self.board.get_category(cid))
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| "—".to_string());
                egui::ComboBox::from_id_salt("link-category")
                    .selected_text(selected_name)
                    .show_ui(ui, |ui| {
                        for (cid, name) in &cat_choices {
                            ui.selectable_value(&mut ed.category, Some(*cid), name);
                        }
                    });
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    let can_save = !ed.url.trim().is_empty()
                        && !ed.name.trim().is_empty()
                        && ed.category.is_some();
                    if ui.add_enabled(can_save, egui::Button::new("Save")).clicked() {
                        let url = normalize_url(&ed.url);
                        let description = {
                            let d = ed.description.trim();
                            if d.is_empty() { None } else { Some(d.to_string()) }
                        };
                        if let Some(cid) = ed.category {
                            match ed.id {
                                Some(lid) => {
                                    if self.board.update_link(
                                        lid,
                                        ed.name.trim().to_string(),
                                        description,
                                        url,
                                        cid,
                                    ) {
                                        self.persist_collections();
                                    }
                                }
                                None => {
                                    self.board.add_link(
                                        ed.name.trim().to_string(),
                                        description,
                                        url,
                                        cid,
                                    );
                                    self.persist_collections();
                                }
                            }
                        }
                        done = true;
                    }
                    if ui.button("Cancel").clicked() {
                        done = true;
                    }
                });
            });
        if open && !done {
            self.link_editor = Some(ed);
        }
    }

    // Destructive cascade deletes confirm with the dependent-row count
    fn confirm_delete_window(&mut self, ctx: &egui::Context) {
        let Some(pending) = self.pending_delete else { return };
        let message = match pending {
            PendingDelete::Panel(pid) => {
                let (cats, links) = self.board.panel_dependents(pid);
                if cats > 0 {
                    format!(
                        "Are you sure you want to delete this panel?\nIt contains {} category(ies) and {} link(s) which will also be deleted.",
                        cats, links
                    )
                } else {
                    "Are you sure you want to delete this panel?".to_string()
                }
            }
            PendingDelete::Category(cid) => {
                let links = self.board.category_dependents(cid);
                if links > 0 {
                    format!(
                        "Are you sure you want to delete this category?\nIt contains {} link(s) which will also be deleted.",
                        links
                    )
                } else {
                    "Are you sure you want to delete this category?".to_string()
                }
            }
            PendingDelete::Link(_) => "Are you sure you want to delete this link?".to_string(),
        };
        egui::Window::new("Confirm Delete")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(message);
                ui.label("This action cannot be undone.");
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button(RichText::new("Delete").color(Color32::RED)).clicked() {
                        let removed = match pending {
                            PendingDelete::Panel(pid) => {
                                let removed = self.board.remove_panel(pid);
                                if removed {
                                    // Cascade may have reassigned the current panel
                                    self.persist_current_panel();
                                }
                                removed
                            }
                            PendingDelete::Category(cid) => self.board.remove_category(cid),
                            PendingDelete::Link(lid) => self.board.remove_link(lid),
                        };
                        if removed {
                            self.persist_collections();
                            self.notify("Deleted", NoticeStyle::Subtle);
                        }
                        self.pending_delete = None;
                    }
                    if ui.button("Cancel").clicked() {
                        self.pending_delete = None;
                    }
                });
            });
    }

    fn snapshots_window(&mut self, ctx: &egui::Context) {
        if !self.show_snapshots {
            return;
        }
        let mut open = true;
        let mut restore: Option<std::path::PathBuf> = None;
        egui::Window::new("Snapshots")
            .open(&mut open)
            .resizable(true)
            .collapsible(false)
            .show(ctx, |ui| {
                if ui.button("Take snapshot now").clicked() {
                    self.save_snapshot_now();
                }
                ui.separator();
                match store::list_snapshots() {
                    Ok(paths) if paths.is_empty() => {
                        ui.weak("No snapshots yet.");
                    }
                    Ok(paths) => {
                        egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                            for p in paths {
                                let name = p
                                    .file_name()
                                    .and_then(|s| s.to_str())
                                    .unwrap_or("snapshot")
                                    .to_string();
                                ui.horizontal(|ui| {
                                    ui.monospace(&name);
                                    if ui.small_button("Restore").clicked() {
                                        restore = Some(p.clone());
                                    }
                                });
                            }
                        });
                    }
                    Err(e) => {
                        ui.colored_label(Color32::RED, format!("List failed: {}", e));
                    }
                }
            });
        if let Some(path) = restore {
            self.restore_snapshot(&path);
        }
        if !open {
            self.show_snapshots = false;
        }
    }

    fn prefs_window(&mut self, ctx: &egui::Context) {
        if !self.show_prefs_window {
            return;
        }
        let mut open = true;
        egui::Window::new("Preferences")
            .open(&mut open)
            .resizable(true)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.heading("General");
                ui.separator();

                ui.label("State directory (leave empty for OS default):");
                ui.text_edit_singleline(&mut self.prefs_state_override_str);
                if ui.button("Clear to default").clicked() {
                    self.prefs_state_override_str.clear();
                }

                ui.add_space(8.0);
                ui.label("Snapshot directory (leave empty to use the state directory):");
                ui.text_edit_singleline(&mut self.prefs_snapshot_override_str);

                ui.add_space(8.0);
                ui.label("Export directory (leave empty for OS temp):");
                ui.text_edit_singleline(&mut self.prefs_export_override_str);

                ui.add_space(8.0);
                ui.checkbox(&mut self.prefs_edit.clock_24h, "24-hour clock");

                ui.add_space(8.0);
                // Show where the settings file is stored on this system (read-only info)
                ui.label("Settings save directory:");
                ui.monospace(AppSettings::settings_dir().display().to_string());

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save and Apply").clicked() {
                        self.prefs_edit.state_override =
                            if self.prefs_state_override_str.trim().is_empty() {
                                None
                            } else {
                                Some(std::path::PathBuf::from(self.prefs_state_override_str.trim()))
                            };
                        self.prefs_edit.snapshot_override =
                            if self.prefs_snapshot_override_str.trim().is_empty() {
                                None
                            } else {
                                Some(std::path::PathBuf::from(
                                    self.prefs_snapshot_override_str.trim(),
                                ))
                            };
                        self.prefs_edit.export_override =
                            if self.prefs_export_override_str.trim().is_empty() {
                                None
                            } else {
                                Some(std::path::PathBuf::from(
                                    self.prefs_export_override_str.trim(),
                                ))
                            };
                        match self.prefs_edit.save() {
                            Ok(()) => {
                                let state_dir_changed =
                                    self.prefs_edit.state_dir() != self.app_settings.state_dir();
                                self.app_settings = self.prefs_edit.clone();
                                if state_dir_changed {
                                    // Re-root the live store and write a full
                                    // snapshot into the new location
                                    self.store =
                                        Box::new(DirStore::new(self.app_settings.state_dir()));
                                    self.save_all_now();
                                }
                                self.prefs_status = Some("Settings saved".to_string());
                            }
                            Err(e) => {
                                self.prefs_status = Some(format!("Save failed: {}", e));
                            }
                        }
                    }
                    if let Some(msg) = &self.prefs_status {
                        ui.small(msg.clone());
                    }
                });
            });
        if !open {
            self.show_prefs_window = false;
        }
    }

    fn export_window(&mut self, ctx: &egui::Context) {
        if !self.show_export_window {
            return;
        }
        let mut open = true;
        egui::Window::new("Export Links")
            .open(&mut open)
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui.selectable_label(self.export_is_json, "JSON").clicked() {
                        self.export_is_json = true;
                        swap_extension(&mut self.export_path, "json");
                    }
                    if ui.selectable_label(!self.export_is_json, "CSV").clicked() {
                        self.export_is_json = false;
                        swap_extension(&mut self.export_path, "csv");
                    }
                });
                ui.label("Path:");
                ui.text_edit_singleline(&mut self.export_path);
                ui.add_space(6.0);
                if ui.button("Export").clicked() {
                    let path = std::path::PathBuf::from(self.export_path.trim());
                    let res = if self.export_is_json {
                        export_links_json(&self.board, &path)
                    } else {
                        export_links_csv(&self.board, &path)
                    };
                    self.export_status = Some(match res {
                        Ok(()) => format!(
                            "Exported {} link(s) to {}",
                            self.board.links.len(),
                            path.display()
                        ),
                        Err(e) => format!("Export failed: {}", e),
                    });
                }
                if let Some(msg) = &self.export_status {
                    ui.small(msg.clone());
                }
            });
        if !open {
            self.show_export_window = false;
        }
    }

    fn clock_labels(&self, ui: &mut egui::Ui) {
        let now = time::OffsetDateTime::now_local()
            .unwrap_or_else(|_| time::OffsetDateTime::now_utc());
        let time_text = if self.app_settings.clock_24h {
            let fmt = time::macros::format_description!("[hour]:[minute]");
            now.format(&fmt).unwrap_or_default()
        } else {
            let fmt = time::macros::format_description!("[hour repr:12 padding:none]:[minute] [period]");
            now.format(&fmt).unwrap_or_default()
        };
        let date_fmt = time::macros::format_description!(
            "[weekday repr:long], [month repr:long] [day padding:none]"
        );
        let date_text = now.format(&date_fmt).unwrap_or_default();
        ui.label(RichText::new(time_text).strong());
        ui.weak(date_text);
    }
}

impl eframe::App for BoardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Resolve the theme (stored value, else the OS default) and apply
        // it only when it changes
        let theme = self.effective_theme(ctx);
        if self.applied_theme != Some(theme) {
            ctx.set_theme(match theme {
                Theme::Dark => egui::Theme::Dark,
                Theme::Light => egui::Theme::Light,
            });
            self.applied_theme = Some(theme);
        }

        // Check for keyboard shortcuts
        if ctx.input_mut(|i| i.consume_shortcut(&egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::S))) {
            self.save_all_now();
        }
        if ctx.input_mut(|i| i.consume_shortcut(&egui::KeyboardShortcut::new(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::S))) {
            self.save_snapshot_now();
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("LinkDeck");

                // File menu:
                ui.menu_button("File", |ui| {
                    if ui.add(egui::Button::new("Save").shortcut_text(ctx.format_shortcut(&egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::S)))).clicked() {
                        self.save_all_now();
                        ui.close();
                    }
                    if ui.add(egui::Button::new("Save Snapshot").shortcut_text(ctx.format_shortcut(&egui::KeyboardShortcut::new(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::S)))).clicked() {
                        self.save_snapshot_now();
                        ui.close();
                    }
                    if ui.button("Snapshots…").clicked() {
                        self.show_snapshots = true;
                        ui.close();
                    }
                    if ui.button("Export Links…").clicked() {
                        self.menu_open_export();
                        ui.close();
                    }
                    ui.separator();
                    if ui.add(egui::Button::new("Quit").shortcut_text(ctx.format_shortcut(&egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::Q)))).clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        ui.close();
                    }
                });

                ui.menu_button("Add", |ui| {
                    if ui.button("Link…").clicked() {
                        self.open_link_editor(None);
                        ui.close();
                    }
                    if ui.button("Category…").clicked() {
                        self.open_category_editor(None);
                        ui.close();
                    }
                    if ui.button("Panel…").clicked() {
                        self.open_panel_editor(None);
                        ui.close();
                    }
                });

                // Settings/Preferences
                ui.menu_button("Settings", |ui| {
                    if ui.button("Preferences…").clicked() {
                        self.menu_open_prefs();
                        ui.close();
                    }
                });

                // Keep a tiny status label; avoid long texts to prevent hiding on small widths
                ui.small(format!(
                    "P:{} C:{} L:{}",
                    self.board.panels.len(),
                    self.board.categories.len(),
                    self.board.links.len()
                ));
                if let Some(err) = &self.save_error {
                    ui.separator();
                    ui.colored_label(Color32::RED, err);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let icon = match theme {
                        Theme::Light => "🌙",
                        Theme::Dark => "☀",
                    };
                    if ui.small_button(icon).on_hover_text("Toggle theme").clicked() {
                        self.theme = Some(theme.toggled());
                        self.persist_theme();
                    }
                    ui.separator();
                    self.clock_labels(ui);
                });
            });
        });

        egui::TopBottomPanel::top("panel_tabs").show(ctx, |ui| {
            self.panel_tabs(ui);
        });

        // Modal-ish windows
        self.panel_editor_window(ctx);
        self.category_editor_window(ctx);
        self.link_editor_window(ctx);
        self.confirm_delete_window(ctx);
        self.snapshots_window(ctx);
        self.prefs_window(ctx);
        self.export_window(ctx);

        let mut drop_action: Option<DropAction> = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    drop_action = self.dashboard_contents(ui);
                });
        });
        if let Some(action) = drop_action {
            self.apply_drop(action);
        }

        // Bottom-right transient info toast (visible for 3 seconds)
        if let (Some(msg), Some(when)) = (&self.last_save_info, self.last_info_time) {
            if Instant::now().duration_since(when) <= Duration::from_secs(3) {
                let margin = egui::vec2(12.0, 12.0);
                egui::Area::new("bottom_right_toast".into())
                    .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-margin.x, -margin.y))
                    .interactable(false)
                    .show(ctx, |ui| {
                        let (fill, stroke_col, stroke_w, text_col, inner_margin) = match self.last_info_style {
                            NoticeStyle::Subtle => (
                                Color32::from_rgba_premultiplied(20, 20, 20, 170),
                                Color32::from_gray(60),
                                0.5,
                                Color32::from_gray(200),
                                egui::Margin::symmetric(8, 6),
                            ),
                            NoticeStyle::Prominent => (
                                Color32::from_rgba_premultiplied(30, 30, 30, 230),
                                Color32::from_gray(100),
                                1.5,
                                Color32::LIGHT_GREEN,
                                egui::Margin::symmetric(12, 8),
                            ),
                        };
                        egui::Frame::popup(ui.style())
                            .corner_radius(egui::CornerRadius::same(8))
                            .stroke(Stroke { width: stroke_w, color: stroke_col })
                            .fill(fill)
                            .inner_margin(inner_margin)
                            .show(ui, |ui| {
                                match self.last_info_style {
                                    NoticeStyle::Subtle => { ui.small(RichText::new(msg).color(text_col)); }
                                    NoticeStyle::Prominent => { ui.colored_label(text_col, msg); }
                                }
                            });
                    });
            }
        }

        // Keep the clock ticking
        ctx.request_repaint_after(Duration::from_secs(1));
    }
}

// UI helpers
fn domain_of(url_str: &str) -> Option<String> {
    let parsed = url::Url::parse(url_str).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

fn derive_name_from_url(raw: &str) -> Option<String> {
    let domain = domain_of(&normalize_url(raw))?;
    let site = domain.split('.').next()?;
    if site.is_empty() {
        return None;
    }
    let mut chars = site.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

fn swap_extension(path_str: &mut String, ext: &str) {
    let mut p = std::path::PathBuf::from(path_str.trim());
    if p.extension().is_some() {
        p.set_extension(ext);
        *path_str = p.display().to_string();
    }
}
