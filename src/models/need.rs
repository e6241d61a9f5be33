use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

use super::timestamp;
use crate::dashboard::aggregation::{progress_percent, remaining_amount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeedStatus {
    Active,
    Completed,
    Cancelled,
}

impl NeedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NeedStatus::Active => "active",
            NeedStatus::Completed => "completed",
            NeedStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for NeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A funding request posted by a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Need {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub user_name: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    pub target_amount: Decimal,
    #[serde(default)]
    pub current_amount: Decimal,
    pub status: NeedStatus,
    #[serde(default, with = "timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::lenient")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Need {
    /// Funding progress in percent, clamped to `[0, 100]`.
    pub fn progress(&self) -> Decimal {
        progress_percent(self.current_amount, self.target_amount)
    }

    /// Amount still missing, never negative.
    pub fn remaining(&self) -> Decimal {
        remaining_amount(self.current_amount, self.target_amount)
    }
}

/// Body of `POST /needs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewNeed {
    pub user_id: i64,
    #[validate(custom = "validate_title")]
    pub title: String,
    pub description: Option<String>,
    #[validate(custom = "validate_category")]
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[validate(custom = "validate_target_amount")]
    pub target_amount: Decimal,
}

impl NewNeed {
    /// Trims free-text fields and drops an empty description.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.category = self.category.trim().to_string();
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self
    }
}

/// Response of `POST /needs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedNeed {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    pub target_amount: Decimal,
    #[serde(default)]
    pub current_amount: Decimal,
    pub status: NeedStatus,
    #[serde(default, with = "timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: Option<String>,
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        let mut err = ValidationError::new("title");
        err.message = Some("Title is required".into());
        return Err(err);
    }
    Ok(())
}

fn validate_category(category: &str) -> Result<(), ValidationError> {
    let category = category.trim();
    if category.is_empty() || category == crate::reference::ALL_CATEGORIES {
        let mut err = ValidationError::new("category");
        err.message = Some("A category must be selected".into());
        return Err(err);
    }
    Ok(())
}

fn validate_target_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        let mut err = ValidationError::new("target_amount");
        err.message = Some("Enter a valid target amount".into());
        return Err(err);
    }
    Ok(())
}
