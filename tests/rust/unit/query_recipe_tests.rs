//! Query recipes as map clients and the refresh job use them.

#[cfg(test)]
mod query_recipes {
    use chrono::NaiveDate;
    use landmap::query_builder::{
        Attribute, ConstraintSet, Query, QueryBuildError, QueryTemplate, SelectSet,
        average_price_for_postcodes, latest_sales_only,
    };

    #[test]
    fn test_latest_sales_for_town_with_default_prologue() {
        let mut constraints = ConstraintSet::new();
        constraints.set_equality(Attribute::Town, "eastbourne").unwrap();
        let text = latest_sales_only(constraints, &[Attribute::PricePaid])
            .compose(&QueryTemplate::default());

        assert!(text.starts_with("prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>"));
        assert!(text.contains("(MAX(?transactionDate) AS ?TransactionDate)"));
        assert!(text.contains("(SAMPLE(?pricePaid) AS ?PricePaid)"));
        assert!(text.contains("?addr lrcommon:town \"EASTBOURNE\"."));
        assert!(text.ends_with("GROUP BY ?paon ?saon ?street ?postcode"));
    }

    #[test]
    fn test_postcode_set_and_date_bound() {
        let mut constraints = ConstraintSet::new();
        constraints
            .set_postcodes(["bn23 7le", "BN23 7LL", "BN23 7LE"])
            .unwrap();
        constraints.set_min_date(NaiveDate::from_ymd_opt(2020, 1, 31).unwrap());
        let text = latest_sales_only(constraints, &[]).compose(&QueryTemplate::new(""));

        assert!(text.contains("VALUES ?postcode { \"BN23 7LE\" \"BN23 7LL\" }"));
        assert!(text.contains("FILTER (?transactionDate >= \"2020-01-31\"^^xsd:date)"));
    }

    #[test]
    fn test_average_price_wraps_latest_sales() {
        let text = average_price_for_postcodes(&["BN23 7LQ"])
            .unwrap()
            .compose(&QueryTemplate::new(""));

        let outer = text.find("SELECT ?postcode (AVG(?PricePaid) AS ?pricePaid)").unwrap();
        let inner = text.find("SELECT ?paon ?saon ?street ?postcode").unwrap();
        assert!(outer < inner);
        assert!(text.ends_with("}\nGROUP BY ?postcode"));
    }

    #[test]
    fn test_average_price_rejects_outward_codes() {
        let err = average_price_for_postcodes(&["BN23"]).unwrap_err();
        assert!(matches!(err, QueryBuildError::InvalidConstraint { .. }));
    }

    #[test]
    fn test_unknown_field_name() {
        assert!(matches!(
            Attribute::from_name("bedrooms"),
            Err(QueryBuildError::UnknownAttribute(_))
        ));
        assert_eq!(Attribute::from_name("PricePaid").unwrap(), Attribute::PricePaid);
    }

    #[test]
    fn test_raw_query_with_custom_prologue() {
        let template = QueryTemplate::new("prefix lrppi: <http://landregistry.data.gov.uk/def/ppi/>\n");
        let text = Query::raw(ConstraintSet::new(), SelectSet::of(&[Attribute::County]))
            .compose(&template);
        assert!(text.starts_with("prefix lrppi: <http://landregistry.data.gov.uk/def/ppi/>\nSELECT"));
    }
}
