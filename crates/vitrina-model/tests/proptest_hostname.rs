use proptest::prelude::*;
use proptest::test_runner::Config;
use vitrina_model::{Hostname, TenantSlug};

proptest! {
    #![proptest_config(Config::with_cases(128))]
    #[test]
    fn hostname_parse_is_idempotent(
        labels in prop::collection::vec("[a-z0-9]{1,10}", 1..5),
        port in prop::option::of(0u16..=65535),
    ) {
        let mut raw = labels.join(".");
        if let Some(p) = port {
            raw.push_str(&format!(":{p}"));
        }
        let first = Hostname::parse(&raw).expect("hostname");
        let second = Hostname::parse(first.as_str()).expect("reparse");
        prop_assert_eq!(first.as_str(), second.as_str());
        prop_assert!(!first.as_str().contains(':'));
    }

    #[test]
    fn hostname_parse_never_panics(raw in "\\PC{0,80}") {
        let _ = Hostname::parse(&raw);
    }

    #[test]
    fn accepted_slugs_round_trip(slug in "[a-z0-9]([a-z0-9]|-[a-z0-9]){0,20}") {
        let parsed = TenantSlug::parse(&slug);
        prop_assume!(parsed.is_ok());
        let parsed = parsed.expect("slug");
        prop_assert_eq!(parsed.as_str(), slug.as_str());
    }
}
