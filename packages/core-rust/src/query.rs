//! Parsing of list-valued query parameters (`fields`, `expand`).

/// Query parameter selecting which fields a handler should render.
pub const FIELDS: &str = "fields";
/// Query parameter selecting which relations a handler should expand.
pub const EXPAND: &str = "expand";

/// Parses a comma-separated list parameter.
///
/// Empty entries are dropped and order is preserved. Returns `None` when the
/// parameter is absent or nothing remains after dropping empties: `None`
/// means "no restriction", which callers must keep distinct from an
/// explicit list.
#[must_use]
pub fn parse_list(raw: Option<&str>) -> Option<Vec<String>> {
    let items: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn drops_empty_entries_and_keeps_order() {
        assert_eq!(
            parse_list(Some("a,b,,c")),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn empty_value_is_absent() {
        assert_eq!(parse_list(Some("")), None);
        assert_eq!(parse_list(Some(",,,")), None);
    }

    #[test]
    fn missing_parameter_is_absent() {
        assert_eq!(parse_list(None), None);
    }

    #[test]
    fn whitespace_is_kept() {
        assert_eq!(
            parse_list(Some("name, state")),
            Some(vec!["name".to_string(), " state".to_string()])
        );
    }

    proptest! {
        #[test]
        fn parsed_entries_are_never_empty(raw in "[a-z,]{0,32}") {
            if let Some(items) = parse_list(Some(&raw)) {
                prop_assert!(!items.is_empty());
                prop_assert!(items.iter().all(|item| !item.is_empty()));
                prop_assert_eq!(items.join(","), raw.split(',').filter(|s| !s.is_empty()).collect::<Vec<_>>().join(","));
            }
        }
    }
}
