use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventCategory {
    PostCreate,
    PostUpdate,
    PreDelete,
    Notification,
}

impl EventCategory {
    pub const ALL: [EventCategory; 4] = [
        EventCategory::PostCreate,
        EventCategory::PostUpdate,
        EventCategory::PreDelete,
        EventCategory::Notification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::PostCreate => "post_create",
            EventCategory::PostUpdate => "post_update",
            EventCategory::PreDelete => "pre_delete",
            EventCategory::Notification => "notification",
        }
    }
}

/// A lifecycle event the engine is bound to: a category plus whether it is the
/// transactional (`_in_transaction`) variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKind {
    pub category: EventCategory,
    pub in_transaction: bool,
}

impl EventKind {
    pub const fn new(category: EventCategory, in_transaction: bool) -> Self {
        Self {
            category,
            in_transaction,
        }
    }

    pub const fn general(category: EventCategory) -> Self {
        Self::new(category, false)
    }

    pub const fn transactional(category: EventCategory) -> Self {
        Self::new(category, true)
    }

    /// Every supported event, general variant first for each category.
    pub fn all() -> Vec<EventKind> {
        EventCategory::ALL
            .iter()
            .flat_map(|c| [Self::general(*c), Self::transactional(*c)])
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match (self.category, self.in_transaction) {
            (EventCategory::PostCreate, false) => "post_create",
            (EventCategory::PostCreate, true) => "post_create_in_transaction",
            (EventCategory::PostUpdate, false) => "post_update",
            (EventCategory::PostUpdate, true) => "post_update_in_transaction",
            (EventCategory::PreDelete, false) => "pre_delete",
            (EventCategory::PreDelete, true) => "pre_delete_in_transaction",
            (EventCategory::Notification, false) => "notification",
            (EventCategory::Notification, true) => "notification_in_transaction",
        }
    }

    pub fn is_creation(&self) -> bool {
        self.category == EventCategory::PostCreate
    }

    pub fn is_update(&self) -> bool {
        self.category == EventCategory::PostUpdate
    }

    pub fn is_deletion(&self) -> bool {
        self.category == EventCategory::PreDelete
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (base, in_transaction) = match trimmed.strip_suffix("_in_transaction") {
            Some(base) => (base, true),
            None => (trimmed, false),
        };
        let category = EventCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == base)
            .ok_or_else(|| UnknownEventKind(s.to_string()))?;
        Ok(Self::new(category, in_transaction))
    }
}

impl serde::Serialize for EventKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for EventKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transactional_variant() {
        let kind: EventKind = "pre_delete_in_transaction".parse().unwrap();
        assert_eq!(kind.category, EventCategory::PreDelete);
        assert!(kind.in_transaction);
        assert!(kind.is_deletion());
        assert_eq!(kind.to_string(), "pre_delete_in_transaction");
    }

    #[test]
    fn rejects_unknown_event() {
        assert!("post_delete".parse::<EventKind>().is_err());
        assert!("_in_transaction".parse::<EventKind>().is_err());
    }

    #[test]
    fn all_covers_both_variants() {
        let all = EventKind::all();
        assert_eq!(all.len(), 8);
        assert_eq!(all[0].as_str(), "post_create");
        assert_eq!(all[1].as_str(), "post_create_in_transaction");
    }
}
