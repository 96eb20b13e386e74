use fleet_structs::{api::*, config::DashboardConfig, core::*};
use fleet_utils::{dejsonify, jsonify};
use serde_json::json;

fn route(cluster_id: u32, distance_km: f64) -> Route {
    Route {
        cluster_id,
        distance_km,
        route: vec![RouteStop {
            customer_id: cluster_id,
            latitude: 13.0,
            longitude: 77.6,
        }],
    }
}

#[test]
fn test_route_set_rejects_duplicate_cluster_ids() {
    assert!(RouteSet::new(vec![route(0, 1.0), route(1, 2.0)]).is_ok());
    assert_eq!(
        RouteSet::new(vec![route(0, 1.0), route(1, 2.0), route(0, 3.0)]),
        Err(ModelError::DuplicateClusterId(0))
    );
}

#[test]
fn test_route_set_deserialize_enforces_unique_cluster_ids() {
    let json = json!([
        { "cluster_id": 2, "distance_km": 4.5, "route": [] },
        { "cluster_id": 2, "distance_km": 1.5, "route": [] }
    ]);
    assert!(serde_json::from_value::<RouteSet>(json).is_err());
}

#[test]
fn test_route_set_find() {
    let set = RouteSet::new(vec![route(3, 1.0), route(7, 2.0)]).unwrap();
    assert_eq!(set.find(7).map(|r| r.distance_km), Some(2.0));
    assert!(set.find(4).is_none());
}

#[test]
fn test_delivery_cluster_id() {
    let delivery: Delivery = dejsonify(
        r#"{"customer_id":4,"latitude":12.95,"longitude":77.61,"cluster":-1,
            "demand":12,"time_window_start":9,"time_window_end":17,"service_time":20}"#,
    )
    .unwrap();
    assert_eq!(delivery.cluster_id(), None);
    assert_eq!(*delivery.service_time(), 20);
    assert_eq!(Delivery { cluster: 6, ..delivery }.cluster_id(), Some(6));
}

#[test]
fn test_optimization_result_validate() {
    let mut result = OptimizationResult {
        deliveries: vec![],
        before_routes: RouteSet::new(vec![route(0, 10.0)]).unwrap(),
        after_routes: RouteSet::new(vec![route(0, 8.0)]).unwrap(),
        before_distance_km: 10.0,
        after_distance_km: 8.0,
        improvement_percent: 20.0,
        num_vehicles: 1,
        optimization_method: "2-Opt Heuristic".to_string(),
        traffic_enabled: false,
    };
    assert_eq!(result.validate(), Ok(()));
    assert_eq!(result.implied_improvement_percent(), Some(20.0));

    result.after_distance_km = -1.0;
    assert!(matches!(
        result.validate(),
        Err(ModelError::NegativeDistance { .. })
    ));

    result.after_distance_km = 8.0;
    result.before_distance_km = 0.0;
    assert_eq!(result.implied_improvement_percent(), None);
}

#[test]
fn test_request_parameters_validate() {
    assert_eq!(RequestParameters::default().validate(), Ok(()));
    let params = RequestParameters {
        num_customers: 201,
        ..Default::default()
    };
    assert_eq!(
        params.validate(),
        Err(ModelError::ParameterOutOfRange {
            name: "num_customers",
            value: 201,
            min: 10,
            max: 200
        })
    );
    let params = RequestParameters {
        num_vehicles: 1,
        ..Default::default()
    };
    assert!(params.validate().is_err());
}

#[test]
fn test_full_optimization_req_wire_format() {
    let params = RequestParameters {
        num_customers: 80,
        num_vehicles: 6,
        method: ClusteringMethod::Dbscan,
        use_genetic: true,
        use_traffic: false,
    };
    assert_eq!(
        jsonify(&FullOptimizationReq::from(&params)),
        r#"{"clustering_method":"dbscan","n_vehicles":6,"num_customers":80,"use_genetic":true,"use_traffic":false}"#
    );
}

#[test]
fn test_full_optimization_resp_keeps_payload() {
    let resp: FullOptimizationResp = dejsonify(
        r#"{"success":false,"error":"clustering failed","deliveries":[]}"#,
    )
    .unwrap();
    assert!(!resp.success);
    assert_eq!(resp.reason(), Some("clustering failed"));
    assert!(resp.payload.contains_key("deliveries"));
    assert!(!resp.payload.contains_key("success"));
}

#[test]
fn test_clustering_method_from_str() {
    assert_eq!("kmeans".parse::<ClusteringMethod>(), Ok(ClusteringMethod::Kmeans));
    assert_eq!("dbscan".parse::<ClusteringMethod>(), Ok(ClusteringMethod::Dbscan));
    assert!("hdbscan".parse::<ClusteringMethod>().is_err());
}

#[test]
fn test_dashboard_config_defaults() {
    let config: DashboardConfig = dejsonify(r#"{"api_url":"http://fleet:8080/api"}"#).unwrap();
    assert_eq!(config.api_url, "http://fleet:8080/api");
    assert_eq!(config.zoom, 12);
    assert_eq!(config.fallback_center.latitude, 13.0);
}

fn clustered(customer_id: u32, cluster: i32) -> serde_json::Value {
    json!({
        "customer_id": customer_id,
        "latitude": 12.9 + customer_id as f64 * 0.01,
        "longitude": 77.5 + customer_id as f64 * 0.01,
        "demand": 20,
        "time_window_start": 9,
        "time_window_end": 16,
        "service_time": 12,
        "cluster": cluster
    })
}

#[test]
fn test_generate_data_resp() {
    let resp: GenerateDataResp = serde_json::from_value(json!({
        "success": true,
        "data": [{
            "customer_id": 0, "latitude": 12.97, "longitude": 77.59, "demand": 31,
            "time_window_start": 8, "time_window_end": 18, "service_time": 25
        }],
        "message": "Generated 1 delivery locations"
    }))
    .unwrap();
    assert!(resp.success);
    assert_eq!(resp.data[0].demand, 31.0);
    assert_eq!(*resp.data[0].service_time(), 25);
    assert_eq!(resp.message(), "Generated 1 delivery locations");
}

#[test]
fn test_cluster_resp_kmeans() {
    let resp: ClusterResp = serde_json::from_value(json!({
        "success": true,
        "result": {
            "clustered_data": [clustered(0, 0), clustered(1, 1)],
            "centers": [[12.95, 77.55], [13.05, 77.65]],
            "method": "K-Means"
        },
        "balanced_data": [clustered(0, 0), clustered(1, 2)]
    }))
    .unwrap();
    assert_eq!(resp.result.method, "K-Means");
    assert_eq!(resp.result.centers(), &vec![[12.95, 77.55], [13.05, 77.65]]);
    assert_eq!(resp.result.n_clusters, None);
    assert_eq!(resp.result.n_outliers, None);
    assert_eq!(resp.balanced_data[1].cluster_id(), Some(2));
}

#[test]
fn test_cluster_resp_dbscan() {
    let resp: ClusterResp = serde_json::from_value(json!({
        "success": true,
        "result": {
            "clustered_data": [clustered(0, 0), clustered(1, -1), clustered(2, 0)],
            "n_clusters": 1,
            "n_outliers": 1,
            "method": "DBSCAN"
        },
        "balanced_data": [clustered(0, 0), clustered(1, -1), clustered(2, 0)]
    }))
    .unwrap();
    assert_eq!(resp.result.centers, None);
    assert_eq!(*resp.result.n_clusters(), 1);
    assert_eq!(*resp.result.n_outliers(), 1);
    assert_eq!(resp.result.clustered_data[1].cluster_id(), None);
}

#[test]
fn test_optimize_routes_resp_ignores_stop_position() {
    let resp: OptimizeRoutesResp = serde_json::from_value(json!({
        "success": true,
        "routes": [{
            "cluster_id": 3,
            "route": [
                {"customer_id": 7, "latitude": 12.98, "longitude": 77.6, "position": 0},
                {"customer_id": 2, "latitude": 13.01, "longitude": 77.62, "position": 2}
            ],
            "distance_km": 6.4,
            "improvement": 12.33
        }],
        "total_distance_before_km": 7.3,
        "total_distance_after_km": 6.4,
        "improvement_percent": 12.33
    }))
    .unwrap();
    let route = &resp.routes[0];
    assert_eq!(route.cluster_id, 3);
    assert_eq!(route.improvement, 12.33);
    assert_eq!(
        route.route.iter().map(|s| s.customer_id).collect::<Vec<_>>(),
        vec![7, 2]
    );
    assert_eq!(resp.total_distance_before_km, 7.3);
}

#[test]
fn test_optimize_genetic_resp() {
    let resp: OptimizeGeneticResp = serde_json::from_value(json!({
        "success": true,
        "routes": [
            {"cluster_id": 0, "route": [{"customer_id": 1, "latitude": 12.9, "longitude": 77.5, "position": 0}], "distance_km": 3.1},
            {"cluster_id": 1, "route": [], "distance_km": 0.0}
        ],
        "total_distance_km": 3.1,
        "method": "Genetic Algorithm",
        "traffic_enabled": true
    }))
    .unwrap();
    assert_eq!(resp.routes.len(), 2);
    assert_eq!(resp.routes.find(0).map(|r| r.num_stops()), Some(1));
    assert_eq!(resp.method, "Genetic Algorithm");
    assert!(resp.traffic_enabled);

    let duplicate = json!({
        "success": true,
        "routes": [
            {"cluster_id": 1, "route": [], "distance_km": 1.0},
            {"cluster_id": 1, "route": [], "distance_km": 2.0}
        ],
        "total_distance_km": 3.0,
        "method": "Genetic Algorithm",
        "traffic_enabled": false
    });
    assert!(serde_json::from_value::<OptimizeGeneticResp>(duplicate).is_err());
}

#[test]
fn test_traffic_analysis_resp() {
    let patterns: Vec<serde_json::Value> = (0..24)
        .map(|hour| {
            let multiplier = if hour == 9 { 1.8 } else { 1.0 };
            json!({"hour": hour, "multiplier": multiplier})
        })
        .collect();
    let resp: TrafficAnalysisResp = serde_json::from_value(json!({
        "success": true,
        "traffic_patterns": patterns
    }))
    .unwrap();
    assert_eq!(resp.traffic_patterns.len(), 24);
    assert_eq!(resp.traffic_patterns[9].hour, 9);
    assert_eq!(resp.traffic_patterns[9].multiplier, 1.8);
}
