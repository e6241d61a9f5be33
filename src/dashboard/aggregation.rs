//! Derived views over the cached dashboard slices.
//!
//! Everything here is pure: the session hands in snapshots and renders what
//! comes back.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::models::{Coupon, Need, ShowcaseItem};
use crate::reference::ALL_CATEGORIES;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Funding progress in percent, clamped to `[0, 100]`. A non-positive target yields 0.
pub fn progress_percent(current: Decimal, target: Decimal) -> Decimal {
    if target <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (current / target * HUNDRED).clamp(Decimal::ZERO, HUNDRED)
}

/// `max(target - current, 0)`.
pub fn remaining_amount(current: Decimal, target: Decimal) -> Decimal {
    (target - current).max(Decimal::ZERO)
}

/// Free-text search plus category selection shared by the list views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewFilter {
    pub search: String,
    pub category: String,
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: ALL_CATEGORIES.to_string(),
        }
    }
}

impl ViewFilter {
    pub fn new(search: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            category: category.into(),
        }
    }

    pub fn search(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..Default::default()
        }
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            ..Default::default()
        }
    }

    fn needle(&self) -> Option<String> {
        let trimmed = self.search.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
    }

    fn category_matches(&self, category: &str) -> bool {
        let wanted = self.category.trim();
        wanted.is_empty() || wanted == ALL_CATEGORIES || wanted == category
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Coupon types the user already holds a coupon of.
pub fn claimed_coupon_types(my_coupons: &[Coupon]) -> HashSet<i64> {
    my_coupons.iter().map(|c| c.coupon_type_id).collect()
}

/// Showcase rows folded by coupon type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouponTypeGroup {
    /// First row seen for the type
    pub coupon_type: ShowcaseItem,
    /// Sum over all rows
    pub available_coupons: u32,
    /// Maximum over all rows
    pub coupon_count: u32,
}

impl CouponTypeGroup {
    pub fn type_id(&self) -> i64 {
        self.coupon_type.type_key()
    }

    pub fn is_claimable(&self) -> bool {
        self.coupon_type.is_claimable()
    }
}

/// Groups showcase rows by coupon type, ordered by ascending type id.
///
/// Rows are folded before filtering, so a type survives the filter based on
/// its representative row.
pub fn group_coupon_types(items: &[ShowcaseItem], filter: &ViewFilter) -> Vec<CouponTypeGroup> {
    let mut groups: BTreeMap<i64, CouponTypeGroup> = BTreeMap::new();

    for item in items {
        groups
            .entry(item.type_key())
            .and_modify(|group| {
                group.available_coupons =
                    group.available_coupons.saturating_add(item.available_coupons);
                group.coupon_count = group.coupon_count.max(item.coupon_count);
            })
            .or_insert_with(|| CouponTypeGroup {
                coupon_type: item.clone(),
                available_coupons: item.available_coupons,
                coupon_count: item.coupon_count,
            });
    }

    let needle = filter.needle();
    groups
        .into_values()
        .filter(|group| {
            let item = &group.coupon_type;
            let text_ok = needle.as_deref().map_or(true, |needle| {
                contains_ci(&item.title, needle) || contains_ci(&item.company, needle)
            });
            text_ok && filter.category_matches(&item.category)
        })
        .collect()
}

/// Flat showcase filter: title, company or description, plus category.
pub fn filter_items<'a>(items: &'a [ShowcaseItem], filter: &ViewFilter) -> Vec<&'a ShowcaseItem> {
    let needle = filter.needle();
    items
        .iter()
        .filter(|item| {
            let text_ok = needle.as_deref().map_or(true, |needle| {
                contains_ci(&item.title, needle)
                    || contains_ci(&item.company, needle)
                    || item
                        .description
                        .as_deref()
                        .map_or(false, |d| contains_ci(d, needle))
            });
            text_ok && filter.category_matches(&item.category)
        })
        .collect()
}

/// Need filter: title or owner name, plus category.
pub fn filter_needs<'a>(needs: &'a [Need], filter: &ViewFilter) -> Vec<&'a Need> {
    let needle = filter.needle();
    needs
        .iter()
        .filter(|need| {
            let text_ok = needle.as_deref().map_or(true, |needle| {
                contains_ci(&need.title, needle)
                    || need
                        .user_name
                        .as_deref()
                        .map_or(false, |name| contains_ci(name, needle))
            });
            text_ok && filter.category_matches(&need.category)
        })
        .collect()
}
