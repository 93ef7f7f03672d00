use vitrina_model::{
    parse_hostname, validate_property, Feature, Plan, PlanTier, Property, Tenant, VisualConfig,
};

#[test]
fn tenant_record_round_trips_through_json() {
    let tenant = Tenant::new("ag-42", "casas-sol", "Casas Sol Imóveis").expect("tenant");
    let raw = serde_json::to_string(&tenant).expect("serialize");
    let back: Tenant = serde_json::from_str(&raw).expect("deserialize");
    assert_eq!(tenant, back);
}

#[test]
fn tenant_json_rejects_unknown_fields() {
    let raw = r#"{"id":"ag-1","slug":"casas","name":"Casas","internal_flag":true}"#;
    assert!(serde_json::from_str::<Tenant>(raw).is_err());
}

#[test]
fn plan_tier_wire_format_is_snake_case() {
    let raw = serde_json::to_string(&PlanTier::Premium).expect("serialize");
    assert_eq!(raw, "\"premium\"");
    let feature: Feature = serde_json::from_str("\"featured_listings\"").expect("feature");
    assert_eq!(feature, Feature::FeaturedListings);
}

#[test]
fn plan_features_default_to_empty_on_the_wire() {
    let raw = r#"{"id":"p1","name":"Free","tier":"free","max_properties":5}"#;
    let plan: Plan = serde_json::from_str(raw).expect("plan");
    assert!(plan.features.is_empty());
    assert!(!plan.allows(Feature::Enterprises));
}

#[test]
fn visual_config_from_backend_is_revalidated() {
    let raw = r##"{"logo_url":"/l.png","primary_color":"not-a-color","secondary_color":"#001122","font_family":"Lato"}"##;
    let cfg: VisualConfig = serde_json::from_str(raw).expect("deserialize");
    assert!(cfg.validate().is_err());
}

#[test]
fn property_validation_reports_every_bad_field() {
    let p = Property {
        id: "prop-1".to_string(),
        agency_id: None,
        title: String::new(),
        price_cents: -5,
        city: String::new(),
        realtor_id: None,
        enterprise_id: None,
        featured: false,
        published: false,
    };
    let report = validate_property(&p);
    let fields: Vec<&str> = report
        .field_errors
        .iter()
        .map(|e| e.field.as_str())
        .collect();
    assert_eq!(fields, vec!["title", "price_cents", "city"]);
}

#[test]
fn hostname_accepts_punycode_labels() {
    let h = parse_hostname("xn--imveis-vwa.example.com").expect("hostname");
    assert_eq!(h.as_str(), "xn--imveis-vwa.example.com");
}
