//! HTTP routes exercised through the full router stack.

#[cfg(test)]
mod http_api {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{Months, Utc};
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use landmap::aggregation::{PostcodeAggregate, Viewport};
    use landmap::config::ServerConfig;
    use landmap::land_registry::{
        CoordinateStore, GeoPoint, Geocoder, LandRegistryService, QueryEndpoint, TransportError,
    };
    use landmap::query_builder::QueryTemplate;
    use landmap::server::{AppState, build_router};

    struct ScriptedEndpoint {
        response: Value,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl QueryEndpoint for ScriptedEndpoint {
        async fn execute(&self, query: &str) -> Result<Value, TransportError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.response.clone())
        }
    }

    struct UnreachableEndpoint;

    #[async_trait]
    impl QueryEndpoint for UnreachableEndpoint {
        async fn execute(&self, _query: &str) -> Result<Value, TransportError> {
            Err(TransportError::Status {
                status: 503,
                body: "Service Unavailable".to_string(),
            })
        }
    }

    struct FixedGeocoder;

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn resolve(&self, _address: &str) -> Result<GeoPoint, TransportError> {
            Ok(GeoPoint {
                lat: 50.79,
                lng: 0.28,
            })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        aggregates: Vec<PostcodeAggregate>,
        buckets: HashMap<String, Vec<String>>,
        stored: Mutex<HashMap<String, i64>>,
    }

    #[async_trait]
    impl CoordinateStore for MemoryStore {
        async fn query_in_boundaries(
            &self,
            _viewport: &Viewport,
            _sorted: bool,
        ) -> Result<Vec<PostcodeAggregate>, TransportError> {
            Ok(self.aggregates.clone())
        }

        async fn update_average_price(
            &self,
            prices: &HashMap<String, i64>,
        ) -> Result<usize, TransportError> {
            let mut stored = self.stored.lock().unwrap();
            stored.extend(prices.iter().map(|(k, v)| (k.clone(), *v)));
            Ok(prices.len())
        }

        async fn matching_postcodes(
            &self,
            prefix: &str,
            _restrict_to_unset: bool,
            _truncate: usize,
        ) -> Result<HashMap<String, Vec<String>>, TransportError> {
            Ok(self
                .buckets
                .iter()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, postcodes)| (key.clone(), postcodes.clone()))
                .collect())
        }
    }

    fn router(endpoint: Arc<dyn QueryEndpoint>, store: Arc<MemoryStore>) -> Router {
        let config = ServerConfig::default();
        let service = LandRegistryService::new(
            endpoint,
            Arc::new(FixedGeocoder),
            store,
            Arc::new(QueryTemplate::default()),
            config.service_settings(),
        );
        build_router(AppState {
            service: Arc::new(service),
            config,
        })
    }

    fn scripted(response: Value) -> Arc<ScriptedEndpoint> {
        Arc::new(ScriptedEndpoint {
            response,
            queries: Mutex::new(Vec::new()),
        })
    }

    fn aggregates(count: usize) -> Vec<PostcodeAggregate> {
        (0..count)
            .map(|i| PostcodeAggregate {
                postcode: format!("BN{} {}AA", 10 + i / 10, i % 10),
                latitude: 50.8 + i as f64 / 1000.0,
                longitude: -0.1,
                average_price: 100_000.0 + 1_000.0 * i as f64,
                radius: 250.0,
            })
            .collect()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn viewport_body() -> Value {
        json!({"top": 50.9, "right": 0.3, "bottom": 50.7, "left": -0.4})
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = router(scripted(Value::Null), Arc::default());
        let (status, body) = send(app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_transactions_by_postcode_formats_the_path() {
        let endpoint = scripted(json!({"results": {"bindings": [{
            "paon": {"value": "4"},
            "street": {"value": "WILLOWFIELD ROAD"},
            "postcode": {"value": "BN22 8AP"},
            "TransactionDate": {"value": "2022-09-30"},
            "PricePaid": {"value": "265000"}
        }]}}));
        let app = router(endpoint.clone(), Arc::default());

        let (status, body) = send(app, get("/land-registry/transactions/bn228ap")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["transactions"][0]["pricePaid"], 265000);
        assert_eq!(body["transactions"][0]["latitude"], Value::Null);
        let query = endpoint.queries.lock().unwrap()[0].clone();
        assert!(query.contains("?addr lrcommon:postcode \"BN22 8AP\"."));
    }

    fn window_filter(years: u32) -> String {
        let start = Utc::now()
            .date_naive()
            .checked_sub_months(Months::new(years * 12))
            .unwrap();
        format!(
            "FILTER (?transactionDate >= \"{}\"^^xsd:date)",
            start.format("%Y-%m-%d")
        )
    }

    #[tokio::test]
    async fn test_transaction_routes_limit_to_sales_window() {
        let endpoint = scripted(json!({"results": {"bindings": []}}));

        for uri in [
            "/land-registry/transactions/bn228ap",
            "/land-registry/transactions/town/eastbourne",
        ] {
            let app = router(endpoint.clone(), Arc::default());
            let (status, _) = send(app, get(uri)).await;
            assert_eq!(status, StatusCode::OK);
        }

        let queries = endpoint.queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        let filter = window_filter(5);
        assert!(queries[0].contains(&filter), "postcode query: {}", queries[0]);
        assert!(queries[1].contains(&filter), "town query: {}", queries[1]);
        assert!(queries[1].contains("?addr lrcommon:town \"EASTBOURNE\"."));
    }

    #[tokio::test]
    async fn test_invalid_postcode_is_rejected() {
        let endpoint = scripted(Value::Null);
        let app = router(endpoint.clone(), Arc::default());

        let (status, body) = send(app, get("/land-registry/transactions/12345")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "InvalidConstraint");
        assert!(endpoint.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_average_price_without_sales_is_null() {
        let app = router(scripted(json!({"results": {"bindings": []}})), Arc::default());

        let (status, body) = send(app, get("/land-registry/average-prices/BN23%207LT")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["postcode"], "BN23 7LT");
        assert_eq!(body["average_price"], Value::Null);
    }

    #[tokio::test]
    async fn test_upstream_failure_maps_to_bad_gateway() {
        let app = router(Arc::new(UnreachableEndpoint), Arc::default());

        let (status, body) = send(app, get("/land-registry/average-prices/BN237LT")).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error_type"], "TransportError");
    }

    #[tokio::test]
    async fn test_undecodable_upstream_row_maps_to_bad_gateway() {
        let endpoint = scripted(json!({"results": {"bindings": [
            {"bedrooms": {"value": "3"}}
        ]}}));
        let app = router(endpoint, Arc::default());

        let (status, body) = send(app, get("/land-registry/transactions/town/hove")).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error_type"], "MalformedResponse");
    }

    #[tokio::test]
    async fn test_display_data_heatmap_tier() {
        let store = Arc::new(MemoryStore {
            aggregates: aggregates(600),
            ..Default::default()
        });
        let app = router(scripted(Value::Null), store);

        let (status, body) = send(app, post_json("/land-registry/display-data", viewport_body())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tier"], "heatmap");
        let points = body["data"].as_array().unwrap();
        assert_eq!(points.len(), 600);
        assert_eq!(points[0]["radius"], 250.0);
        assert!(points[0]["colour"].as_str().unwrap().starts_with('#'));
    }

    #[tokio::test]
    async fn test_display_data_point_tier() {
        let store = Arc::new(MemoryStore {
            aggregates: aggregates(40),
            ..Default::default()
        });
        let app = router(scripted(Value::Null), store);

        let (status, body) = send(app, post_json("/land-registry/display-data", viewport_body())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tier"], "points");
        let points = body["data"].as_array().unwrap();
        assert_eq!(points.len(), 40);
        assert_eq!(points[0]["postcode"], "BN10 0AA");
        assert_eq!(points[0]["radius"], 250.0);
    }

    #[tokio::test]
    async fn test_display_data_empty_viewport() {
        let app = router(scripted(Value::Null), Arc::default());

        let (status, body) = send(app, post_json("/land-registry/display-data", viewport_body())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tier"], "empty");
    }

    #[tokio::test]
    async fn test_display_data_rejects_inverted_viewport() {
        let app = router(scripted(Value::Null), Arc::default());
        let inverted = json!({"top": 50.7, "right": 0.3, "bottom": 50.9, "left": -0.4});

        let (status, body) = send(app, post_json("/land-registry/display-data", inverted)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_type"], "InvalidViewport");
    }

    #[tokio::test]
    async fn test_refresh_stores_prices() {
        let endpoint = scripted(json!({"results": {"bindings": [
            {"postcode": {"value": "BN23 7LE"}, "pricePaid": {"value": "88650.0"}}
        ]}}));
        let store = Arc::new(MemoryStore {
            buckets: HashMap::from([(
                "BN23 7L".to_string(),
                vec!["BN23 7LE".to_string(), "BN23 7LT".to_string()],
            )]),
            ..Default::default()
        });
        let app = router(endpoint, store.clone());

        let (status, body) = send(
            app,
            Request::builder()
                .method("POST")
                .uri("/land-registry/postcodes/bn23/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prefix"], "BN23");
        assert_eq!(body["updated"], 1);
        assert_eq!(store.stored.lock().unwrap().get("BN23 7LE"), Some(&88_650));
    }
}
