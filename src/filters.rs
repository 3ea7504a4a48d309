//! Filter predicate and sort order for the visible video list.

use std::cmp::Ordering;

use crate::error::FilterError;
use crate::video::VideoEntry;

/// Raw text from the filter form, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterInputs {
    pub name: String,
    pub min_minutes: String,
    pub max_minutes: String,
    pub tags: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub name: String,
    pub min_minutes: Option<u32>,
    pub max_minutes: Option<u32>,
    pub tags: String,
}

impl FilterState {
    /// Validate form input. `min > max` is rejected, never clamped.
    pub fn from_inputs(inputs: &FilterInputs) -> Result<Self, FilterError> {
        let min_minutes = parse_bound(&inputs.min_minutes, FilterError::InvalidMin, FilterError::NegativeMin)?;
        let max_minutes = parse_bound(&inputs.max_minutes, FilterError::InvalidMax, FilterError::NegativeMax)?;
        if let (Some(lo), Some(hi)) = (min_minutes, max_minutes) {
            if lo > hi {
                return Err(FilterError::MinExceedsMax);
            }
        }
        Ok(FilterState {
            name: inputs.name.trim().to_string(),
            min_minutes,
            max_minutes,
            tags: inputs.tags.trim().to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterState::default()
    }

    pub fn matches(&self, v: &VideoEntry) -> bool {
        if !self.name.is_empty() && !v.name.to_lowercase().contains(&self.name.to_lowercase()) {
            return false;
        }
        // Unknown duration never satisfies a bound.
        let known = !v.duration.is_zero();
        let minutes = v.minutes();
        if let Some(lo) = self.min_minutes {
            if !known || minutes < u64::from(lo) {
                return false;
            }
        }
        if let Some(hi) = self.max_minutes {
            if !known || minutes > u64::from(hi) {
                return false;
            }
        }
        if !self.tags.is_empty() {
            let query = self.tags.to_lowercase();
            if !v.tags.iter().any(|t| t.to_lowercase().contains(&query)) {
                return false;
            }
        }
        true
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.name.is_empty() {
            parts.push(format!("name contains {:?}", self.name));
        }
        if !self.tags.is_empty() {
            parts.push(format!("tags contain {:?}", self.tags));
        }
        if let Some(lo) = self.min_minutes {
            parts.push(format!(">={} min", lo));
        }
        if let Some(hi) = self.max_minutes {
            parts.push(format!("<={} min", hi));
        }
        if parts.is_empty() {
            "(none)".to_string()
        } else {
            parts.join(", ")
        }
    }
}

fn parse_bound(
    raw: &str,
    invalid: fn(String) -> FilterError,
    negative: FilterError,
) -> Result<Option<u32>, FilterError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let n: i64 = raw.parse().map_err(|_| invalid(raw.to_string()))?;
    if n < 0 {
        return Err(negative);
    }
    u32::try_from(n).map(Some).map_err(|_| invalid(raw.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Name,
    Duration,
    Age,
}

impl SortField {
    pub fn name(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Duration => "duration",
            SortField::Age => "age",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub ascending: bool,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder {
            field: SortField::Name,
            ascending: true,
        }
    }
}

impl SortOrder {
    /// Same field flips direction; a new field starts ascending.
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.ascending = !self.ascending;
        } else {
            self.field = field;
            self.ascending = true;
        }
    }

    pub fn compare(&self, a: &VideoEntry, b: &VideoEntry) -> Ordering {
        let ord = match self.field {
            SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortField::Duration => a.duration.cmp(&b.duration),
            SortField::Age => a.modified.cmp(&b.modified),
        };
        if self.ascending {
            ord
        } else {
            ord.reverse()
        }
    }
}

/// Filtered copy of `videos`, stably sorted.
pub fn apply_filters_and_sort(
    videos: &[VideoEntry],
    filters: &FilterState,
    order: SortOrder,
) -> Vec<VideoEntry> {
    let mut out: Vec<VideoEntry> = videos.iter().filter(|v| filters.matches(v)).cloned().collect();
    out.sort_by(|a, b| order.compare(a, b));
    out
}
