use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inventory row keyed by its RFID tag. `quantity` is the only field that
/// changes after seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub rfid_tag: String,
    pub quantity: i64,
    pub price: f64,
}

/// Direction of a scan event. Only the two literal strings are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanAction {
    #[default]
    Add,
    Remove,
}

impl ScanAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanAction::Add => "add",
            ScanAction::Remove => "remove",
        }
    }
}

impl fmt::Display for ScanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action must be \"add\" or \"remove\", got {:?}", self.0)
    }
}

impl FromStr for ScanAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(ScanAction::Add),
            "remove" => Ok(ScanAction::Remove),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

// ── Request / response payloads ──────────────────────────────────────────────

/// Body of `POST /api/scan`. Fields stay optional so that a missing `tag_id`
/// surfaces as a validation error instead of a deserializer rejection.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub tag_id: Option<String>,
    pub action: Option<String>,
}

impl ScanRequest {
    pub fn validate(self) -> Result<(String, ScanAction), String> {
        let tag = match self.tag_id {
            Some(tag) if !tag.trim().is_empty() => tag,
            _ => return Err("tag_id is required".to_string()),
        };

        let action = match self.action.as_deref() {
            None => ScanAction::default(),
            Some(raw) => raw.parse::<ScanAction>().map_err(|e| e.to_string())?,
        };

        Ok((tag, action))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ScanResponse {
    pub message: String,
    pub new_quantity: i64,
}

impl ScanResponse {
    pub fn updated(new_quantity: i64) -> Self {
        Self {
            message: "Updated".to_string(),
            new_quantity,
        }
    }
}

/// Body of `PUT /api/items/:tag/quantity`, used for manual stock corrections.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: i64,
}

// ── Query parameters ──────────────────────────────────────────────────────────

pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct LowStockParams {
    pub threshold: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(tag: Option<&str>, action: Option<&str>) -> ScanRequest {
        ScanRequest {
            tag_id: tag.map(str::to_string),
            action: action.map(str::to_string),
        }
    }

    #[test]
    fn action_defaults_to_add() {
        let (tag, action) = request(Some("TAG001"), None).validate().unwrap();
        assert_eq!(tag, "TAG001");
        assert_eq!(action, ScanAction::Add);
    }

    #[test]
    fn remove_is_parsed() {
        let (_, action) = request(Some("TAG002"), Some("remove")).validate().unwrap();
        assert_eq!(action, ScanAction::Remove);
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = request(Some("TAG002"), Some("remvoe")).validate().unwrap_err();
        assert!(err.contains("remvoe"), "error should name the bad value: {err}");
    }

    #[test]
    fn action_match_is_exact() {
        assert!("Add".parse::<ScanAction>().is_err());
        assert!(" add".parse::<ScanAction>().is_err());
    }

    #[test]
    fn missing_or_blank_tag_is_rejected() {
        assert!(request(None, Some("add")).validate().is_err());
        assert!(request(Some("   "), None).validate().is_err());
    }

    #[test]
    fn action_display_round_trips_through_parse() {
        for action in [ScanAction::Add, ScanAction::Remove] {
            assert_eq!(action.to_string().parse::<ScanAction>(), Ok(action));
        }
    }

    #[test]
    fn item_serializes_with_flat_fields() {
        let item = Item {
            id: 2,
            name: "Pen".to_string(),
            rfid_tag: "TAG002".to_string(),
            quantity: 8,
            price: 1.2,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 2,
                "name": "Pen",
                "rfid_tag": "TAG002",
                "quantity": 8,
                "price": 1.2,
            })
        );
    }
}
