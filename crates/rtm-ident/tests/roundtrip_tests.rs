use proptest::prelude::*;
use rtm_ident::{ReqId, ReqLevel};

fn arb_level() -> impl Strategy<Value = ReqLevel> {
    prop_oneof![
        Just(ReqLevel::Product),
        Just(ReqLevel::Operational),
        Just(ReqLevel::Development),
    ]
}

fn arb_id() -> impl Strategy<Value = ReqId> {
    (
        arb_level(),
        1u32..=99_999,
        proptest::option::of("[A-Z]{1,4}"),
        proptest::option::of("[A-Z][A-Z0-9]{0,6}"),
    )
        .prop_map(|(level, sequence, labels, namespace)| {
            let mut id = ReqId::new(level, sequence);
            if let Some(ns) = namespace {
                id = id.with_namespace(ns);
            }
            if let Some(labels) = labels {
                for label in labels.chars() {
                    id = id.with_label(label);
                }
            }
            id
        })
}

proptest! {
    // Formatting a parsed identifier reproduces the canonical text, and
    // parsing that text reproduces the identifier.
    #[test]
    fn format_parse_round_trip(id in arb_id()) {
        let text = id.to_string();
        let parsed: ReqId = text.parse().unwrap();
        prop_assert_eq!(&parsed, &id);
        prop_assert_eq!(parsed.to_string(), text);
    }

    // Parsing never panics on arbitrary input.
    #[test]
    fn parse_total_on_arbitrary_input(text in "\\PC{0,24}") {
        let _ = ReqId::parse(&text);
    }

    // A suggestion, when present, always parses cleanly.
    #[test]
    fn suggestions_are_valid_identifiers(id in arb_id(), sep in "[_.]") {
        // Corrupt the canonical text with a wrong separator after the prefix.
        let canonical = id.to_string();
        let corrupted = canonical.replacen("REQ-", &format!("REQ{sep}"), 1);
        if let Err(err) = ReqId::parse(&corrupted) {
            if let Some(suggestion) = err.suggestion() {
                prop_assert!(ReqId::parse(suggestion).is_ok());
            }
        }
    }
}
