use crate::date_status::CardDates;
use crate::sort_index::SortKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: u32,
    pub title: String,
    pub sort: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: u32,
    pub list_id: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sort: f64,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub label_ids: Vec<u32>,
    #[serde(default)]
    pub checklists: Vec<Checklist>,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: u32,
    pub title: String,
    pub sort: f64,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: u32,
    pub title: String,
    pub sort: f64,
    #[serde(default)]
    pub is_finished: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: u32,
    pub name: String,
    pub color: LabelColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelColor {
    Green,
    Yellow,
    Orange,
    Red,
    Purple,
    Blue,
    Sky,
    Lime,
    Pink,
    Black,
}

impl LabelColor {
    pub const ALL: [LabelColor; 10] = [
        LabelColor::Green,
        LabelColor::Yellow,
        LabelColor::Orange,
        LabelColor::Red,
        LabelColor::Purple,
        LabelColor::Blue,
        LabelColor::Sky,
        LabelColor::Lime,
        LabelColor::Pink,
        LabelColor::Black,
    ];

    /// Colour for the `n`th label created on a board.
    pub fn nth(n: usize) -> LabelColor {
        Self::ALL[n % Self::ALL.len()]
    }
}

/// Which of a card's four dates an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Received,
    Start,
    Due,
    End,
}

impl DateField {
    pub fn label(self) -> &'static str {
        match self {
            DateField::Received => "Received",
            DateField::Start => "Start",
            DateField::Due => "Due",
            DateField::End => "End",
        }
    }
}

macro_rules! impl_sort_key {
    ($($ty:ty),*) => {
        $(impl SortKey for $ty {
            fn sort_key(&self) -> f64 {
                self.sort
            }

            fn set_sort_key(&mut self, key: f64) {
                self.sort = key;
            }
        })*
    };
}

impl_sort_key!(List, Card, Checklist, ChecklistItem);

pub fn card_dates(card: &Card) -> CardDates {
    CardDates {
        received_at: card.received_at,
        start_at: card.start_at,
        due_at: card.due_at,
        end_at: card.end_at,
    }
}

pub fn date_slot(card: &mut Card, field: DateField) -> &mut Option<DateTime<Utc>> {
    match field {
        DateField::Received => &mut card.received_at,
        DateField::Start => &mut card.start_at,
        DateField::Due => &mut card.due_at,
        DateField::End => &mut card.end_at,
    }
}

/// `(finished, total)` items of one checklist.
pub fn checklist_progress(checklist: &Checklist) -> (usize, usize) {
    let finished = checklist.items.iter().filter(|i| i.is_finished).count();
    (finished, checklist.items.len())
}

pub fn card_checklist_progress(card: &Card) -> (usize, usize) {
    card.checklists
        .iter()
        .map(checklist_progress)
        .fold((0, 0), |(f, t), (cf, ct)| (f + cf, t + ct))
}

/// An empty checklist is never finished.
pub fn is_checklist_finished(checklist: &Checklist) -> bool {
    let (finished, total) = checklist_progress(checklist);
    total > 0 && finished == total
}
