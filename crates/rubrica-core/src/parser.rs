//! Recovery of the JSON object inside a free-form model reply
//!
//! Small local models reliably emit a JSON object but often wrap it in prose
//! or code fences. The parser trims the reply to the span between the first
//! `{` and the last `}` and decodes that slice strictly. The scan is
//! index-based, so a stray `}` in trailing prose widens the slice and makes
//! the decode fail.

use serde_json::Value;

use crate::GradingError;

/// Slice from the first `{` through the last `}`, if such a span exists
pub fn extract_json_slice(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&reply[start..=end])
}

/// Locate and strictly decode the JSON object in a raw reply
pub fn parse_reply(reply: &str) -> Result<Value, GradingError> {
    let slice = extract_json_slice(reply).ok_or_else(|| GradingError::NoJsonFound {
        raw_reply: reply.to_string(),
    })?;

    serde_json::from_str(slice).map_err(|e| GradingError::MalformedJson {
        raw_reply: reply.to_string(),
        slice: slice.to_string(),
        detail: e.to_string(),
    })
}


#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;
    use serde_json::Map;

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
            ".{0,24}".prop_map(Value::from),
        ]
    }

    fn object() -> impl Strategy<Value = Value> {
        let leaf = prop::collection::btree_map("[a-z_]{1,12}", scalar(), 0..5)
            .prop_map(|map| Value::Object(map.into_iter().collect::<Map<_, _>>()));
        prop::collection::btree_map("[a-z_]{1,12}", prop_oneof![scalar(), leaf], 0..6)
            .prop_map(|map| Value::Object(map.into_iter().collect::<Map<_, _>>()))
    }

    proptest! {
        #[test]
        fn test_text_around_an_object_is_ignored(
            object in object(),
            prefix in "[^{}]{0,40}",
            suffix in "[^{}]{0,40}",
        ) {
            let bare = serde_json::to_string(&object).unwrap();
            let wrapped = format!("{}{}{}", prefix, bare, suffix);

            prop_assert_eq!(parse_reply(&wrapped), parse_reply(&bare));
            prop_assert_eq!(parse_reply(&bare), Ok(object));
        }

        #[test]
        fn test_reply_without_opening_brace_has_no_json(reply in "[^{]{0,80}") {
            prop_assert_eq!(
                parse_reply(&reply),
                Err(GradingError::NoJsonFound { raw_reply: reply.clone() })
            );
        }

        #[test]
        fn test_reply_without_closing_brace_has_no_json(reply in "[^}]{0,80}") {
            prop_assert_eq!(
                parse_reply(&reply),
                Err(GradingError::NoJsonFound { raw_reply: reply.clone() })
            );
        }
    }
}
