use std::collections::HashSet;
use uuid::Uuid;
use serde::{Serialize, Deserialize};

// Basic type aliases for clarity
pub type PanelId = Uuid;
pub type CategoryId = Uuid;
pub type LinkId = Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub id: PanelId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    // None only for legacy rows persisted before panels existed; bootstrap
    // adopts them into the synthesized default panel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel_id: Option<PanelId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: LinkId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    pub category_id: CategoryId,
}

/// Where a dragged link was released.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LinkDropTarget {
    /// On another link row: adopt its category, insert immediately before it.
    Link(LinkId),
    /// On a category frame (header or empty area): adopt it, append last.
    Category(CategoryId),
    /// Anywhere else: the move is reverted.
    Outside,
}

#[derive(Clone, Debug)]
pub struct Board {
    pub panels: Vec<Panel>,
    pub categories: Vec<Category>,
    pub links: Vec<Link>,
    pub current_panel: Option<PanelId>,
}

impl Board {
    // Instantiate a new, empty board
    pub fn new() -> Self {
        Board {
            panels: Vec::new(),
            categories: Vec::new(),
            links: Vec::new(),
            current_panel: None,
        }
    }

    /// First-run seeding and legacy migration. Returns true if anything
    /// changed and a save is due.
    ///
    /// - Categories but no panels (pre-panel data): synthesize "Main" and
    ///   adopt every category that has no panel yet.
    /// - Totally empty: seed "Work"/"Personal" with one category each.
    ///
    /// Always ends with a current-panel heal; stale ids never survive a load.
    pub fn bootstrap(&mut self) -> bool {
        let mut changed = false;
        if self.panels.is_empty() {
            if !self.categories.is_empty() {
                let main = Uuid::now_v7();
                self.panels.push(Panel { id: main, name: "Main".to_string() });
                for cat in &mut self.categories {
                    if cat.panel_id.is_none() {
                        cat.panel_id = Some(main);
                    }
                }
                self.current_panel = Some(main);
                changed = true;
            } else {
                let work = Uuid::now_v7();
                let personal = Uuid::now_v7();
                self.panels.push(Panel { id: work, name: "Work".to_string() });
                self.panels.push(Panel { id: personal, name: "Personal".to_string() });
                self.categories.push(Category {
                    id: Uuid::now_v7(),
                    name: "Projects".to_string(),
                    panel_id: Some(work),
                });
                self.categories.push(Category {
                    id: Uuid::now_v7(),
                    name: "Favorites".to_string(),
                    panel_id: Some(personal),
                });
                self.current_panel = Some(work);
                changed = true;
            }
        }
        if self.heal_current_panel() {
            changed = true;
        }
        changed
    }

    /// Ensure the current panel references an existing panel. Falls back to
    /// the first panel, or None when no panels exist. Returns true if the
    /// value changed.
    pub fn heal_current_panel(&mut self) -> bool {
        let valid = self
            .current_panel
            .map(|id| self.panels.iter().any(|p| p.id == id))
            .unwrap_or(false);
        if valid {
            return false;
        }
        let fallback = self.panels.first().map(|p| p.id);
        if self.current_panel == fallback {
            return false;
        }
        self.current_panel = fallback;
        true
    }

    pub fn set_current_panel(&mut self, id: PanelId) -> bool {
        if self.panels.iter().any(|p| p.id == id) {
            self.current_panel = Some(id);
            true
        } else {
            false
        }
    }

    // Create operations: fresh id, appended to the end (display-order-last)
    pub fn add_panel(&mut self, name: String) -> PanelId {
        let id = Uuid::now_v7();
        self.panels.push(Panel { id, name });
        id
    }

    pub fn add_category(&mut self, name: String, panel: PanelId) -> CategoryId {
        let id = Uuid::now_v7();
        self.categories.push(Category { id, name, panel_id: Some(panel) });
        id
    }

    pub fn add_link(
        &mut self,
        name: String,
        description: Option<String>,
        url: String,
        category: CategoryId,
    ) -> LinkId {
        let id = Uuid::now_v7();
        self.links.push(Link { id, name, description, url, category_id: category });
        id
    }

    // Update operations: no-op (false) when the id is unknown; position in
    // the collection is preserved either way
    pub fn update_panel_name(&mut self, id: PanelId, new_name: String) -> bool {
        if let Some(panel) = self.panels.iter_mut().find(|p| p.id == id) {
            panel.name = new_name;
            true
        } else {
            false
        }
    }

    pub fn update_category_name(&mut self, id: CategoryId, new_name: String) -> bool {
        if let Some(cat) = self.categories.iter_mut().find(|c| c.id == id) {
            cat.name = new_name;
            true
        } else {
            false
        }
    }

    pub fn update_link(
        &mut self,
        id: LinkId,
        name: String,
        description: Option<String>,
        url: String,
        category: CategoryId,
    ) -> bool {
        if let Some(link) = self.links.iter_mut().find(|l| l.id == id) {
            link.name = name;
            link.description = description;
            link.url = url;
            link.category_id = category;
            true
        } else {
            false
        }
    }

    // Delete operations
    pub fn remove_link(&mut self, id: LinkId) -> bool {
        let before = self.links.len();
        self.links.retain(|l| l.id != id);
        self.links.len() != before
    }

    pub fn remove_category(&mut self, id: CategoryId) -> bool {
        let before = self.categories.len();
        self.categories.retain(|c| c.id != id);
        if self.categories.len() == before {
            return false;
        }
        // Cascade delete links under this category
        self.links.retain(|l| l.category_id != id);
        true
    }

    pub fn remove_panel(&mut self, id: PanelId) -> bool {
        let before = self.panels.len();
        self.panels.retain(|p| p.id != id);
        if self.panels.len() == before {
            return false;
        }
        // Cascade delete categories under this panel, then every link whose
        // category no longer exists (sweeps already-dangling links too)
        self.categories.retain(|c| c.panel_id != Some(id));
        let remaining: HashSet<CategoryId> = self.categories.iter().map(|c| c.id).collect();
        self.links.retain(|l| remaining.contains(&l.category_id));
        if self.current_panel == Some(id) {
            self.current_panel = self.panels.first().map(|p| p.id);
        }
        true
    }

    /// Reorder a category before another within the flat collection.
    /// Self-drop and unknown ids leave the order untouched. Categories are
    /// never reparented by drag.
    pub fn reorder_category(&mut self, dragged: CategoryId, target: CategoryId) -> bool {
        if dragged == target {
            return false;
        }
        let Some(from_idx) = self.categories.iter().position(|c| c.id == dragged) else {
            return false;
        };
        let removed = self.categories.remove(from_idx);
        // Target index is recomputed after removal
        if let Some(t_idx) = self.categories.iter().position(|c| c.id == target) {
            self.categories.insert(t_idx, removed);
            true
        } else {
            self.categories.insert(from_idx, removed);
            false
        }
    }

    /// Move a dragged link per the drop target. The link is removed from the
    /// flat collection first, unconditionally; the revert branch reinserts it
    /// at its original index so order is unchanged.
    pub fn move_link(&mut self, dragged: LinkId, target: LinkDropTarget) -> bool {
        let Some(from_idx) = self.links.iter().position(|l| l.id == dragged) else {
            return false;
        };
        let mut moved = self.links.remove(from_idx);
        match target {
            LinkDropTarget::Link(t) if t != dragged => {
                if let Some(t_idx) = self.links.iter().position(|l| l.id == t) {
                    moved.category_id = self.links[t_idx].category_id;
                    self.links.insert(t_idx, moved);
                    true
                } else {
                    self.links.insert(from_idx, moved);
                    false
                }
            }
            LinkDropTarget::Category(cat) => {
                moved.category_id = cat;
                // Append to the global end; category membership is
                // filter-based so this still renders last within that
                // category
                self.links.push(moved);
                true
            }
            _ => {
                self.links.insert(from_idx, moved);
                false
            }
        }
    }

    pub fn get_panel(&self, id: PanelId) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == id)
    }
    pub fn get_category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }
    pub fn get_link(&self, id: LinkId) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    // Fetch helpers (display order == collection order):
    pub fn category_ids_for_panel(&self, panel: PanelId) -> Vec<CategoryId> {
        self.categories
            .iter()
            .filter_map(|c| if c.panel_id == Some(panel) { Some(c.id) } else { None })
            .collect()
    }

    pub fn link_ids_for_category(&self, category: CategoryId) -> Vec<LinkId> {
        self.links
            .iter()
            .filter_map(|l| if l.category_id == category { Some(l.id) } else { None })
            .collect()
    }

    // Dependent-row counts shown in delete confirmations
    pub fn panel_dependents(&self, id: PanelId) -> (usize, usize) {
        let cats: HashSet<CategoryId> = self
            .categories
            .iter()
            .filter(|c| c.panel_id == Some(id))
            .map(|c| c.id)
            .collect();
        let links = self
            .links
            .iter()
            .filter(|l| cats.contains(&l.category_id))
            .count();
        (cats.len(), links)
    }

    pub fn category_dependents(&self, id: CategoryId) -> usize {
        self.links.iter().filter(|l| l.category_id == id).count()
    }
}

/// Coerce a scheme-less URL by prefixing https://. Anything that already
/// carries http(s) passes through untouched; deeper validation is not done.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}
