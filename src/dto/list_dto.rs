use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::entity::EntityType;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// Filters shared by every list endpoint. Unknown filters for an entity type
/// (e.g. `assigned` on companies) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub assigned: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn paginate(rows: Vec<T>, query: &ListQuery) -> Self {
        let page = query.page();
        let per_page = query.per_page();
        let total = rows.len();
        let total_pages = ((total as u64 + u64::from(per_page) - 1) / u64::from(per_page)) as u32;
        let skip = (page as usize - 1).saturating_mul(per_page as usize);
        let items = rows.into_iter().skip(skip).take(per_page as usize).collect();
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuditQuery {
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
