use std::collections::BTreeSet;

use agent_api_module::PendingItemRecord;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingItem {
    pub id: String,
    pub sender: String,
    pub subject: String,
    pub snippet: String,
    pub raw_time: String,
    /// `None` when the server's timestamp could not be parsed.
    pub received_at: Option<DateTime<Utc>>,
}

impl PendingItem {
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        subject: impl Into<String>,
        snippet: impl Into<String>,
        raw_time: impl Into<String>,
    ) -> Self {
        let raw_time = raw_time.into();
        Self {
            id: id.into(),
            sender: sender.into(),
            subject: subject.into(),
            snippet: snippet.into(),
            received_at: parse_timestamp(&raw_time),
            raw_time,
        }
    }

    pub fn from_record(record: PendingItemRecord) -> Self {
        Self::new(
            record.id,
            record.from,
            record.subject,
            record.body,
            record.time,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemFilter {
    #[default]
    All,
    Today,
    Week,
}

impl ItemFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Some(ItemFilter::All),
            "today" => Some(ItemFilter::Today),
            "week" => Some(ItemFilter::Week),
            _ => None,
        }
    }

    /// Earliest accepted timestamp, evaluated against `now`.
    fn cutoff(&self, now: DateTime<Local>) -> Option<DateTime<Utc>> {
        match self {
            ItemFilter::All => None,
            ItemFilter::Today => {
                let midnight = now
                    .date_naive()
                    .and_hms_opt(0, 0, 0)
                    .and_then(|naive| Local.from_local_datetime(&naive).earliest())
                    .unwrap_or_else(|| now - chrono::Duration::hours(24));
                Some(midnight.with_timezone(&Utc))
            }
            ItemFilter::Week => Some((now - chrono::Duration::days(7)).with_timezone(&Utc)),
        }
    }
}

/// Unresolved inbox items, newest first, plus the filtered view and the
/// locally-read overlay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingItemStore {
    items: Vec<PendingItem>,
    filter: ItemFilter,
    view: Vec<String>,
    locally_read: BTreeSet<String>,
}

impl PendingItemStore {
    pub fn replace_items(&mut self, items: Vec<PendingItem>, now: DateTime<Local>) {
        let mut items = items;
        sort_newest_first(&mut items);
        let mut seen = BTreeSet::new();
        items.retain(|item| seen.insert(item.id.clone()));
        self.items = items;
        self.refresh_view(now);
    }

    /// The view is a snapshot; it does not move as the clock advances.
    pub fn apply_filter(&mut self, filter: ItemFilter, now: DateTime<Local>) {
        self.filter = filter;
        let cutoff = filter.cutoff(now);
        self.view = self
            .items
            .iter()
            .filter(|item| match cutoff {
                None => true,
                Some(cutoff) => item.received_at.is_some_and(|at| at >= cutoff),
            })
            .map(|item| item.id.clone())
            .collect();
    }

    pub fn refresh_view(&mut self, now: DateTime<Local>) {
        self.apply_filter(self.filter, now);
    }

    /// Returns false when `id` was not present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.view.retain(|view_id| view_id != id);
        self.items.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&PendingItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn items(&self) -> &[PendingItem] {
        &self.items
    }

    pub fn visible(&self) -> Vec<&PendingItem> {
        self.view.iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn filter(&self) -> ItemFilter {
        self.filter
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn mark_locally_read(&mut self, id: &str) -> bool {
        self.locally_read.insert(id.to_string())
    }

    pub fn is_locally_read(&self, id: &str) -> bool {
        self.locally_read.contains(id)
    }

    pub fn restore_locally_read(&mut self, ids: impl IntoIterator<Item = String>) {
        self.locally_read.extend(ids);
    }

    pub fn clear_locally_read(&mut self) {
        self.locally_read.clear();
    }
}

fn sort_newest_first(items: &mut [PendingItem]) {
    // `None < Some(_)`, so unparsable timestamps land last. The sort is stable.
    items.sort_by(|a, b| b.received_at.cmp(&a.received_at));
}

/// Parse the timestamp formats the agent backend emits.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(value.with_timezone(&Utc));
    }
    // Gmail's Date header sometimes carries a trailing "(UTC)" comment.
    let without_comment = match trimmed.rfind(" (") {
        Some(index) if trimmed.ends_with(')') => &trimmed[..index],
        _ => trimmed,
    };
    if let Ok(value) = DateTime::parse_from_rfc2822(without_comment) {
        return Some(value.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
