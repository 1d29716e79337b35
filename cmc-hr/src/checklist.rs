//! Per-user onboarding checklist
//!
//! Stored as a JSON array of `{key, label, done}` objects. Most items are
//! backed by a profile field and become done when that field is filled in;
//! the rest are ticked manually.

use serde::{Deserialize, Serialize};

use crate::roles::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub key: String,
    pub label: String,
    pub done: bool,
}

/// Ordered checklist items for one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checklist {
    items: Vec<ChecklistItem>,
}

/// Checklist plus derived completion figures, as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistSummary {
    pub items: Vec<ChecklistItem>,
    pub total: usize,
    pub done: usize,
    pub percent_complete: u8,
    pub is_complete: bool,
}

/// Profile values that drive profile-backed items
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub full_name: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub password_changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChecklistError {
    #[error("Checklist item not found: {0}")]
    UnknownItem(String),

    #[error("Checklist item '{0}' is completed by filling in your profile")]
    ProfileBacked(String),
}

const FULL_NAME: (&str, &str) = ("full_name", "Provide your full name");
const CONTACT_NUMBER: (&str, &str) = ("contact_number", "Add a contact number");
const ADDRESS: (&str, &str) = ("address", "Add your home address");
const EMERGENCY_CONTACT: (&str, &str) = ("emergency_contact", "Name an emergency contact");
const CHANGE_PASSWORD: (&str, &str) = ("change_password", "Replace the temporary password");
const ACKNOWLEDGE_HANDBOOK: (&str, &str) =
    ("acknowledge_handbook", "Acknowledge the employee handbook");

fn is_profile_backed(key: &str) -> bool {
    [FULL_NAME, CONTACT_NUMBER, ADDRESS, EMERGENCY_CONTACT, CHANGE_PASSWORD]
        .iter()
        .any(|(k, _)| *k == key)
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl Checklist {
    pub fn new(items: Vec<ChecklistItem>) -> Self {
        Self { items }
    }

    /// Default items for a role, all pending
    pub fn defaults_for(role: Role) -> Self {
        let mut entries = vec![FULL_NAME, CONTACT_NUMBER, ADDRESS, EMERGENCY_CONTACT];
        if role.is_admin() {
            entries.push(CHANGE_PASSWORD);
        } else {
            entries.push(ACKNOWLEDGE_HANDBOOK);
        }

        Self::new(
            entries
                .into_iter()
                .map(|(key, label)| ChecklistItem {
                    key: key.to_string(),
                    label: label.to_string(),
                    done: false,
                })
                .collect(),
        )
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn done_count(&self) -> usize {
        self.items.iter().filter(|item| item.done).count()
    }

    /// Rounded half up; an empty checklist counts as complete
    pub fn percent_complete(&self) -> u8 {
        let total = self.total();
        if total == 0 {
            return 100;
        }
        ((self.done_count() * 200 + total) / (total * 2)) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.items.iter().all(|item| item.done)
    }

    /// Align items with the role's defaults
    ///
    /// Items the role no longer has are dropped, new ones are appended, and
    /// the `done` state of kept items is preserved. Returns whether anything
    /// changed.
    pub fn reconcile_role(&mut self, role: Role) -> bool {
        let defaults = Self::defaults_for(role);
        let reconciled: Vec<ChecklistItem> = defaults
            .items
            .into_iter()
            .map(|default| {
                let done = self
                    .items
                    .iter()
                    .find(|item| item.key == default.key)
                    .is_some_and(|item| item.done);
                ChecklistItem { done, ..default }
            })
            .collect();

        let changed = reconciled != self.items;
        self.items = reconciled;
        changed
    }

    /// Recompute profile-backed items; returns whether anything changed
    pub fn sync_with_profile(&mut self, profile: &ProfileFields) -> bool {
        let mut changed = false;

        for item in &mut self.items {
            let done = match item.key.as_str() {
                "full_name" => filled(&profile.full_name),
                "contact_number" => filled(&profile.contact_number),
                "address" => filled(&profile.address),
                "emergency_contact" => filled(&profile.emergency_contact),
                "change_password" => profile.password_changed,
                _ => continue,
            };
            if item.done != done {
                item.done = done;
                changed = true;
            }
        }

        changed
    }

    /// Tick or untick a manual item; returns whether it changed
    pub fn mark(&mut self, key: &str, done: bool) -> Result<bool, ChecklistError> {
        if is_profile_backed(key) {
            return Err(ChecklistError::ProfileBacked(key.to_string()));
        }

        let item = self
            .items
            .iter_mut()
            .find(|item| item.key == key)
            .ok_or_else(|| ChecklistError::UnknownItem(key.to_string()))?;

        let changed = item.done != done;
        item.done = done;
        Ok(changed)
    }

    pub fn summary(&self) -> ChecklistSummary {
        ChecklistSummary {
            items: self.items.clone(),
            total: self.total(),
            done: self.done_count(),
            percent_complete: self.percent_complete(),
            is_complete: self.is_complete(),
        }
    }
}
