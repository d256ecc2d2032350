use crate::domain::model::{Action, WeightEvent};
use crate::utils::error::{Result, ShelfError};
use serde::Deserialize;

/// 秤重板送出的原始 JSON，例如
/// `{"action":"take","product":"I9","grams":-969.4,"shelf":"3"}`
#[derive(Debug, Deserialize)]
struct RawRecord {
    action: Option<Action>,
    product: Option<String>,
    grams: Option<f64>,
    #[serde(default)]
    shelf: Option<String>,
}

/// 解析一行並附上收到的時間。失敗時該行直接丟棄，不影響後續
pub fn parse_event(line: &str, timestamp: &str) -> Result<WeightEvent> {
    let raw: RawRecord = serde_json::from_str(line).map_err(|e| parse_error(line, e.to_string()))?;

    let product = raw
        .product
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| parse_error(line, "missing field `product`"))?;
    let grams = raw
        .grams
        .filter(|g| g.is_finite())
        .ok_or_else(|| parse_error(line, "missing field `grams`"))?;
    let action = raw
        .action
        .ok_or_else(|| parse_error(line, "missing field `action`"))?;

    Ok(WeightEvent {
        timestamp: timestamp.to_string(),
        product,
        grams,
        action,
        shelf: raw.shelf.filter(|s| !s.is_empty()),
    })
}

fn parse_error(line: &str, message: impl Into<String>) -> ShelfError {
    ShelfError::ParseError {
        line: line.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2025-11-11 13:13:36";

    #[test]
    fn test_parse_take_with_shelf() {
        let event = parse_event(
            r#"{"action":"take","product":"I9","grams":-969.4,"shelf":"3"}"#,
            TS,
        )
        .unwrap();

        assert_eq!(event.action, Action::Take);
        assert_eq!(event.product, "I9");
        assert_eq!(event.grams, -969.4);
        assert_eq!(event.shelf.as_deref(), Some("3"));
        assert_eq!(event.timestamp, TS);
    }

    #[test]
    fn test_parse_put_without_shelf() {
        let event = parse_event(r#"{"action":"put","product":"A1","grams":512}"#, TS).unwrap();
        assert_eq!(event.action, Action::Put);
        assert_eq!(event.grams, 512.0);
        assert!(event.shelf.is_none());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = parse_event(r#"{"action":"take","product":"#, TS).unwrap_err();
        assert!(matches!(err, ShelfError::ParseError { .. }));
    }

    #[test]
    fn test_missing_required_fields() {
        assert!(parse_event(r#"{"action":"take","grams":-10}"#, TS).is_err());
        assert!(parse_event(r#"{"action":"take","product":"A1"}"#, TS).is_err());
        assert!(parse_event(r#"{"product":"A1","grams":-10}"#, TS).is_err());
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let err = parse_event(r#"{"action":"Removal","product":"A1","grams":-10}"#, TS);
        assert!(err.is_err());
    }
}
