use crate::card::{
    date_slot, Card, Checklist, ChecklistItem, DateField, Label, LabelColor, List,
};
use crate::errors::BoardError;
use crate::sort_index::{allocate, repair, SortKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::{debug, info};

type Result<T> = std::result::Result<T, BoardError>;

/// Lists, cards and labels of one board, plus the cursor the TUI drives.
///
/// Every mutation validates before it writes, so an `Err` leaves the board
/// exactly as it was.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct KanbanBoard {
    #[serde(default)]
    pub lists: Vec<List>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    last_id: u32,
    #[serde(skip)]
    pub selected_list: usize,
    #[serde(skip)]
    pub selected_card: usize,
}

fn clean_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(BoardError::EmptyTitle);
    }
    Ok(title.to_string())
}

fn sorted<T: SortKey>(mut items: Vec<&T>) -> Vec<&T> {
    items.sort_by(|a, b| a.sort_key().total_cmp(&b.sort_key()));
    items
}

impl KanbanBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh board with the given lists in order.
    pub fn with_lists<S: AsRef<str>>(titles: &[S]) -> Result<Self> {
        let mut board = Self::new();
        for title in titles {
            board.add_list(title.as_ref())?;
        }
        Ok(board)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "no board file, starting empty");
            return Ok(Self::new());
        }
        let data = fs::read_to_string(path).map_err(|source| BoardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut board: Self = serde_json::from_str(&data).map_err(|source| BoardError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        board.last_id = board.last_id.max(board.max_id());
        let repaired = board.repair_sort_keys();
        info!(
            path = %path.display(),
            lists = board.lists.len(),
            cards = board.cards.len(),
            repaired,
            "loaded board"
        );
        Ok(board)
    }

    /// Writes pretty JSON next to `path` and renames it into place.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self).map_err(BoardError::Encode)?;
        let tmp = path.with_extension("json.tmp");
        let io_err = |source: std::io::Error| BoardError::Io {
            path: path.to_path_buf(),
            source,
        };
        fs::write(&tmp, data).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        info!(path = %path.display(), "saved board");
        Ok(())
    }

    /// Renumbers every sibling group whose keys collide or are not finite,
    /// returning how many groups were touched.
    fn repair_sort_keys(&mut self) -> usize {
        let mut repaired = 0;
        let mut lists: Vec<&mut List> = self.lists.iter_mut().collect();
        repaired += usize::from(repair(&mut lists));

        let mut list_ids: Vec<u32> = self.cards.iter().map(|c| c.list_id).collect();
        list_ids.sort_unstable();
        list_ids.dedup();
        for list_id in list_ids {
            let mut cards: Vec<&mut Card> = self
                .cards
                .iter_mut()
                .filter(|c| c.list_id == list_id && !c.archived)
                .collect();
            repaired += usize::from(repair(&mut cards));
        }

        for card in &mut self.cards {
            let mut checklists: Vec<&mut Checklist> = card.checklists.iter_mut().collect();
            repaired += usize::from(repair(&mut checklists));
            for checklist in &mut card.checklists {
                let mut items: Vec<&mut ChecklistItem> = checklist.items.iter_mut().collect();
                repaired += usize::from(repair(&mut items));
            }
        }
        repaired
    }

    fn max_id(&self) -> u32 {
        let lists = self.lists.iter().map(|l| l.id);
        let labels = self.labels.iter().map(|l| l.id);
        let cards = self.cards.iter().flat_map(|c| {
            std::iter::once(c.id).chain(c.checklists.iter().flat_map(|cl| {
                std::iter::once(cl.id).chain(cl.items.iter().map(|i| i.id))
            }))
        });
        lists.chain(labels).chain(cards).max().unwrap_or(0)
    }

    fn next_id(&mut self) -> u32 {
        self.last_id += 1;
        self.last_id
    }

    // ----------------------------------------------------------------
    // Queries
    // ----------------------------------------------------------------

    pub fn sorted_lists(&self) -> Vec<&List> {
        sorted(self.lists.iter().collect())
    }

    /// Cards of a list in display order, archived ones left out.
    pub fn cards_in_list(&self, list_id: u32) -> Vec<&Card> {
        sorted(
            self.cards
                .iter()
                .filter(|c| c.list_id == list_id && !c.archived)
                .collect(),
        )
    }

    pub fn list(&self, list_id: u32) -> Option<&List> {
        self.lists.iter().find(|l| l.id == list_id)
    }

    pub fn card(&self, card_id: u32) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub fn label(&self, label_id: u32) -> Option<&Label> {
        self.labels.iter().find(|l| l.id == label_id)
    }

    pub fn label_by_name(&self, name: &str) -> Option<&Label> {
        let name = name.trim();
        self.labels.iter().find(|l| l.name.eq_ignore_ascii_case(name))
    }

    fn ensure_list(&self, list_id: u32) -> Result<()> {
        self.list(list_id)
            .map(|_| ())
            .ok_or(BoardError::ListNotFound(list_id))
    }

    fn card_mut(&mut self, card_id: u32) -> Result<&mut Card> {
        self.cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or(BoardError::CardNotFound(card_id))
    }

    fn checklist_mut(&mut self, card_id: u32, checklist_id: u32) -> Result<&mut Checklist> {
        self.card_mut(card_id)?
            .checklists
            .iter_mut()
            .find(|cl| cl.id == checklist_id)
            .ok_or(BoardError::ChecklistNotFound {
                card_id,
                checklist_id,
            })
    }

    // ----------------------------------------------------------------
    // Lists
    // ----------------------------------------------------------------

    pub fn add_list(&mut self, title: &str) -> Result<u32> {
        let title = clean_title(title)?;
        let mut siblings: Vec<&mut List> = self.lists.iter_mut().collect();
        let end = siblings.len();
        let sort = allocate(&mut siblings, end)?;
        let id = self.next_id();
        debug!(id, %title, sort, "add list");
        self.lists.push(List { id, title, sort });
        Ok(id)
    }

    pub fn rename_list(&mut self, list_id: u32, title: &str) -> Result<()> {
        let title = clean_title(title)?;
        let list = self
            .lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .ok_or(BoardError::ListNotFound(list_id))?;
        list.title = title;
        Ok(())
    }

    /// Puts a list at `index` among the other lists (clamped to the end).
    pub fn move_list(&mut self, list_id: u32, index: usize) -> Result<()> {
        self.ensure_list(list_id)?;
        let mut siblings: Vec<&mut List> =
            self.lists.iter_mut().filter(|l| l.id != list_id).collect();
        let sort = allocate(&mut siblings, index)?;
        if let Some(list) = self.lists.iter_mut().find(|l| l.id == list_id) {
            list.sort = sort;
        }
        debug!(list_id, index, sort, "move list");
        Ok(())
    }

    // ----------------------------------------------------------------
    // Cards
    // ----------------------------------------------------------------

    /// Appends a card at the bottom of a list.
    pub fn add_card(&mut self, list_id: u32, title: &str) -> Result<u32> {
        let title = clean_title(title)?;
        self.ensure_list(list_id)?;
        let mut siblings: Vec<&mut Card> = self
            .cards
            .iter_mut()
            .filter(|c| c.list_id == list_id && !c.archived)
            .collect();
        let end = siblings.len();
        let sort = allocate(&mut siblings, end)?;
        let id = self.next_id();
        debug!(id, list_id, %title, sort, "add card");
        self.cards.push(Card {
            id,
            list_id,
            title,
            description: None,
            sort,
            received_at: None,
            start_at: None,
            due_at: None,
            end_at: None,
            label_ids: Vec::new(),
            checklists: Vec::new(),
            archived: false,
        });
        Ok(id)
    }

    pub fn update_card_title(&mut self, card_id: u32, title: &str) -> Result<()> {
        let title = clean_title(title)?;
        self.card_mut(card_id)?.title = title;
        Ok(())
    }

    /// Sets or clears one of the card's four dates.
    pub fn set_card_date(
        &mut self,
        card_id: u32,
        field: DateField,
        value: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let card = self.card_mut(card_id)?;
        *date_slot(card, field) = value;
        debug!(card_id, field = field.label(), ?value, "set card date");
        Ok(())
    }

    /// Places a card at `index` of `to_list` (clamped to the end).
    pub fn move_card(&mut self, card_id: u32, to_list: u32, index: usize) -> Result<()> {
        self.ensure_list(to_list)?;
        if self.card(card_id).is_none() {
            return Err(BoardError::CardNotFound(card_id));
        }
        let mut siblings: Vec<&mut Card> = self
            .cards
            .iter_mut()
            .filter(|c| c.list_id == to_list && c.id != card_id && !c.archived)
            .collect();
        let sort = allocate(&mut siblings, index)?;
        let card = self.card_mut(card_id)?;
        card.list_id = to_list;
        card.sort = sort;
        debug!(card_id, to_list, index, sort, "move card");
        Ok(())
    }

    pub fn archive_card(&mut self, card_id: u32) -> Result<()> {
        self.card_mut(card_id)?.archived = true;
        debug!(card_id, "archive card");
        Ok(())
    }

    // ----------------------------------------------------------------
    // Labels
    // ----------------------------------------------------------------

    pub fn add_label(&mut self, name: &str, color: LabelColor) -> Result<u32> {
        let name = clean_title(name)?;
        if self.label_by_name(&name).is_some() {
            return Err(BoardError::DuplicateLabel(name));
        }
        let id = self.next_id();
        self.labels.push(Label { id, name, color });
        Ok(id)
    }

    /// Adds the label to the card, or removes it if already there. Returns
    /// whether the card carries the label afterwards.
    pub fn toggle_card_label(&mut self, card_id: u32, label_id: u32) -> Result<bool> {
        if self.label(label_id).is_none() {
            return Err(BoardError::LabelNotFound(label_id));
        }
        let card = self.card_mut(card_id)?;
        if let Some(pos) = card.label_ids.iter().position(|&id| id == label_id) {
            card.label_ids.remove(pos);
            Ok(false)
        } else {
            card.label_ids.push(label_id);
            Ok(true)
        }
    }

    // ----------------------------------------------------------------
    // Checklists
    // ----------------------------------------------------------------

    pub fn add_checklist(&mut self, card_id: u32, title: &str) -> Result<u32> {
        let title = clean_title(title)?;
        let card = self.card_mut(card_id)?;
        let mut siblings: Vec<&mut Checklist> = card.checklists.iter_mut().collect();
        let end = siblings.len();
        let sort = allocate(&mut siblings, end)?;
        let id = self.next_id();
        self.card_mut(card_id)?.checklists.push(Checklist {
            id,
            title,
            sort,
            items: Vec::new(),
        });
        Ok(id)
    }

    pub fn add_checklist_item(
        &mut self,
        card_id: u32,
        checklist_id: u32,
        title: &str,
    ) -> Result<u32> {
        let title = clean_title(title)?;
        let checklist = self.checklist_mut(card_id, checklist_id)?;
        let mut siblings: Vec<&mut ChecklistItem> = checklist.items.iter_mut().collect();
        let end = siblings.len();
        let sort = allocate(&mut siblings, end)?;
        let id = self.next_id();
        self.checklist_mut(card_id, checklist_id)?
            .items
            .push(ChecklistItem {
                id,
                title,
                sort,
                is_finished: false,
            });
        Ok(id)
    }

    /// Flips an item's finished flag and returns the new value.
    pub fn toggle_checklist_item(
        &mut self,
        card_id: u32,
        checklist_id: u32,
        item_id: u32,
    ) -> Result<bool> {
        let item = self
            .checklist_mut(card_id, checklist_id)?
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(BoardError::ChecklistItemNotFound {
                checklist_id,
                item_id,
            })?;
        item.is_finished = !item.is_finished;
        Ok(item.is_finished)
    }

    pub fn move_checklist_item(
        &mut self,
        card_id: u32,
        checklist_id: u32,
        item_id: u32,
        index: usize,
    ) -> Result<()> {
        let checklist = self.checklist_mut(card_id, checklist_id)?;
        if !checklist.items.iter().any(|i| i.id == item_id) {
            return Err(BoardError::ChecklistItemNotFound {
                checklist_id,
                item_id,
            });
        }
        let mut siblings: Vec<&mut ChecklistItem> =
            checklist.items.iter_mut().filter(|i| i.id != item_id).collect();
        let sort = allocate(&mut siblings, index)?;
        if let Some(item) = checklist.items.iter_mut().find(|i| i.id == item_id) {
            item.sort = sort;
        }
        checklist
            .items
            .sort_by(|a, b| a.sort.total_cmp(&b.sort));
        Ok(())
    }

    // ----------------------------------------------------------------
    // Cursor
    // ----------------------------------------------------------------

    pub fn selected_list_id(&self) -> Option<u32> {
        self.sorted_lists().get(self.selected_list).map(|l| l.id)
    }

    pub fn selected_card_id(&self) -> Option<u32> {
        let list_id = self.selected_list_id()?;
        self.cards_in_list(list_id)
            .get(self.selected_card)
            .map(|c| c.id)
    }

    /// Moves the list cursor by `delta`, clamped, and keeps the card cursor
    /// inside the newly selected list.
    pub fn select_list(&mut self, delta: isize) {
        let count = self.lists.len();
        if count == 0 {
            return;
        }
        let last = count as isize - 1;
        self.selected_list = (self.selected_list as isize + delta).clamp(0, last) as usize;
        self.clamp_card_cursor();
    }

    pub fn select_card(&mut self, delta: isize) {
        let count = self
            .selected_list_id()
            .map_or(0, |id| self.cards_in_list(id).len());
        if count == 0 {
            self.selected_card = 0;
            return;
        }
        let last = count as isize - 1;
        self.selected_card = (self.selected_card as isize + delta).clamp(0, last) as usize;
    }

    pub fn select_last_card(&mut self) {
        let count = self
            .selected_list_id()
            .map_or(0, |id| self.cards_in_list(id).len());
        self.selected_card = count.saturating_sub(1);
    }

    pub fn clamp_card_cursor(&mut self) {
        self.select_card(0);
    }

    /// Moves the selected card `direction` lists over, onto the end of the
    /// target list. The cursor follows the card.
    pub fn shift_selected_card(&mut self, direction: isize) -> Result<()> {
        let Some(card_id) = self.selected_card_id() else {
            return Ok(());
        };
        let lists: Vec<u32> = self.sorted_lists().iter().map(|l| l.id).collect();
        let last = lists.len() as isize - 1;
        let target = (self.selected_list as isize + direction).clamp(0, last) as usize;
        if target == self.selected_list {
            return Ok(());
        }
        let to_list = lists[target];
        let end = self.cards_in_list(to_list).len();
        self.move_card(card_id, to_list, end)?;
        self.selected_list = target;
        self.selected_card = end;
        Ok(())
    }

    /// Moves the selected card up (`-1`) or down (`1`) within its list.
    pub fn reorder_selected_card(&mut self, delta: isize) -> Result<()> {
        let (Some(list_id), Some(card_id)) = (self.selected_list_id(), self.selected_card_id())
        else {
            return Ok(());
        };
        let count = self.cards_in_list(list_id).len();
        let target = (self.selected_card as isize + delta).clamp(0, count as isize - 1) as usize;
        if target == self.selected_card {
            return Ok(());
        }
        self.move_card(card_id, list_id, target)?;
        self.selected_card = target;
        Ok(())
    }
}
