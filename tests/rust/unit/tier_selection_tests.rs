//! Tier thresholds, viewport validation and postcode bucketing.

#[cfg(test)]
mod tier_selection {
    use chrono::NaiveDate;
    use landmap::aggregation::bucketing::{precision_level, radius_expr, truncation_expr};
    use landmap::aggregation::{
        DisplayData, PostcodeAggregate, Tier, TierThresholds, Viewport, address_tier_query,
    };
    use landmap::query_builder::QueryTemplate;
    use test_case::test_case;
    use validator::Validate;

    #[test_case(0, Tier::Empty)]
    #[test_case(15, Tier::Address)]
    #[test_case(16, Tier::Point)]
    #[test_case(500, Tier::Heatmap)]
    fn test_default_thresholds(count: usize, expected: Tier) {
        assert_eq!(TierThresholds::default().select(count), expected);
    }

    #[test]
    fn test_thresholds_must_be_ordered() {
        assert!(TierThresholds::new(20, 10).is_none());
        assert!(TierThresholds::new(0, 10).is_none());
        assert_eq!(TierThresholds::new(5, 50).unwrap().select(50), Tier::Heatmap);
    }

    #[test]
    fn test_viewport_validation() {
        assert!(Viewport::new(50.9, 0.3, 50.7, -0.4).validate().is_ok());
        assert!(Viewport::new(50.7, 0.3, 50.9, -0.4).validate().is_err());
        assert!(Viewport::new(95.0, 0.3, 50.9, -0.4).validate().is_err());
    }

    #[test]
    fn test_empty_display_data_serializes_tier_only() {
        let json = serde_json::to_value(DisplayData::Empty).unwrap();
        assert_eq!(json, serde_json::json!({"tier": "empty"}));
    }

    #[test]
    fn test_dense_viewport_buckets_coarser() {
        let sparse = precision_level(2_000, 1000, 0.05);
        let dense = precision_level(2_000_000, 1000, 0.05);
        assert_eq!((sparse, dense), (-1, 2));
        assert!(truncation_expr("postcode", dense).ends_with("- (2))))"));
        assert!(truncation_expr("postcode", sparse).ends_with("- (-1))))"));
    }

    #[test]
    fn test_radius_scales_the_coordinate_span() {
        assert!(radius_expr("lat", "lon").ends_with("pow(max(lon) - min(lon), 2)) * 55556.0"));
    }

    #[test]
    fn test_address_tier_query_needs_a_full_postcode() {
        let aggregate = |postcode: &str| PostcodeAggregate {
            postcode: postcode.to_string(),
            latitude: 50.8,
            longitude: -0.3,
            average_price: 200_000.0,
            radius: 30.0,
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let partial = address_tier_query(&[aggregate("BN14 7"), aggregate("BN14")], today, 5);
        assert!(partial.unwrap().is_none());

        let text = address_tier_query(&[aggregate("BN14 7"), aggregate("BN14 7BH")], today, 5)
            .unwrap()
            .unwrap()
            .compose(&QueryTemplate::new(""));
        assert!(text.contains("VALUES ?postcode { \"BN14 7BH\" }"));
        assert!(text.contains("FILTER (?transactionDate >= \"2019-06-01\"^^xsd:date)"));
    }
}
