use fleet_api::{FullOptimizationReq, FullOptimizationResp};
use fleet_dashboard::{
    dashboard::Mutex, render::Layer, Dashboard, Failure, OptimizationService, SubmitError,
};
use fleet_structs::{
    config::DashboardConfig,
    core::{DisplayPreferences, ModelError, RequestParameters},
};
use fleet_utils::RequestError;
use futures::channel::oneshot;
use serde_json::{json, Value};
use std::{collections::VecDeque, sync::Arc};

#[derive(Default)]
struct MockService {
    responses: Mutex<VecDeque<anyhow::Result<FullOptimizationResp>>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl MockService {
    fn with(responses: Vec<anyhow::Result<FullOptimizationResp>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            ..Default::default()
        }
    }

    fn gated(
        responses: Vec<anyhow::Result<FullOptimizationResp>>,
        gate: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            gate: Mutex::new(Some(gate)),
            ..Default::default()
        }
    }
}

impl OptimizationService for MockService {
    async fn full_optimization(
        &self,
        _req: FullOptimizationReq,
    ) -> anyhow::Result<FullOptimizationResp> {
        let gate = self.gate.lock().await.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no more responses")))
    }
}

fn route(cluster_id: u32, distance_km: f64) -> Value {
    json!({
        "cluster_id": cluster_id,
        "distance_km": distance_km,
        "route": [
            {"customer_id": 0, "latitude": 12.97, "longitude": 77.59},
            {"customer_id": cluster_id + 1, "latitude": 12.99, "longitude": 77.61},
            {"customer_id": 0, "latitude": 12.97, "longitude": 77.59}
        ]
    })
}

fn success_json(method: &str) -> Value {
    json!({
        "success": true,
        "deliveries": [
            {
                "customer_id": 1, "latitude": 12.99, "longitude": 77.61, "cluster": 0,
                "demand": 12.5, "time_window_start": 9, "time_window_end": 17, "service_time": 15
            },
            {
                "customer_id": 2, "latitude": 12.95, "longitude": 77.55, "cluster": 1,
                "demand": 8.0, "time_window_start": 10, "time_window_end": 14
            }
        ],
        "before_routes": [route(0, 100.0), route(1, 50.0)],
        "after_routes": [route(0, 80.0), route(1, 45.0)],
        "before_distance_km": 150.0,
        "after_distance_km": 125.0,
        "improvement_percent": 16.67,
        "num_vehicles": 2,
        "optimization_method": method,
        "traffic_enabled": false
    })
}

fn resp(value: Value) -> anyhow::Result<FullOptimizationResp> {
    Ok(serde_json::from_value(value).unwrap())
}

fn dashboard(service: MockService) -> Dashboard<MockService> {
    Dashboard::new(service, DashboardConfig::default())
}

#[tokio::test]
async fn test_success_replaces_result() {
    let dashboard = dashboard(MockService::with(vec![
        resp(success_json("2-Opt Heuristic")),
        resp(success_json("2-Opt Heuristic")),
    ]));
    assert!(dashboard.result().await.is_none());

    let first = dashboard.submit(RequestParameters::default()).await.unwrap();
    assert_eq!(first.after_routes.len(), 2);
    assert_eq!(first.deliveries[0].service_time, Some(15));
    assert_eq!(first.deliveries[1].service_time, None);

    let second = dashboard.submit(RequestParameters::default()).await.unwrap();
    let state = dashboard.state().await;
    assert!(!state.loading);
    assert_eq!(state.store.generation(), 2);
    assert_eq!(*first, *second);
    assert!(Arc::ptr_eq(&second, &dashboard.result().await.unwrap()));
}

#[tokio::test]
async fn test_view_after_success() {
    let dashboard = dashboard(MockService::with(vec![resp(success_json("Genetic Algorithm"))]));
    let params = RequestParameters {
        num_customers: 120,
        num_vehicles: 8,
        method: "dbscan".parse().unwrap(),
        use_genetic: true,
        use_traffic: true,
    };
    dashboard.submit(params).await.unwrap();

    let view = dashboard.view(&RequestParameters::default()).await;
    let statistics = view.statistics.unwrap();
    assert_eq!(statistics.cards[5].value, "Genetic Algorithm");
    assert_eq!(statistics.route_details[0].improvement_percent, Some(20.0));
    assert_eq!(statistics.route_details[1].improvement_percent, Some(10.0));
}

#[tokio::test]
async fn test_service_failure_keeps_previous_result() {
    let dashboard = dashboard(MockService::with(vec![
        resp(success_json("2-Opt Heuristic")),
        resp(json!({"success": false, "error": "clustering failed"})),
    ]));
    let first = dashboard.submit(RequestParameters::default()).await.unwrap();

    let err = dashboard.submit(RequestParameters::default()).await.unwrap_err();
    assert_eq!(
        err,
        SubmitError::Failed(Failure::Service("clustering failed".to_string()))
    );

    let state = dashboard.state().await;
    assert!(!state.loading);
    assert_eq!(state.store.generation(), 1);
    assert!(Arc::ptr_eq(&first, &state.store.get().unwrap()));
    let notification = state.notification.unwrap();
    assert_eq!(notification.category, "ServiceFailure");
    assert!(notification.message.contains("clustering failed"));

    dashboard.dismiss_notification().await;
    assert!(dashboard.state().await.notification.is_none());
}

#[tokio::test]
async fn test_transport_failure() {
    let dashboard = dashboard(MockService::with(vec![Err(anyhow::Error::new(
        RequestError::Transport("connection refused".to_string()),
    ))]));
    let err = dashboard.submit(RequestParameters::default()).await.unwrap_err();
    match err {
        SubmitError::Failed(failure) => assert_eq!(failure.category(), "TransportFailure"),
        e => panic!("expected transport failure, got {:?}", e),
    }
    let state = dashboard.state().await;
    assert!(!state.loading);
    assert!(state.store.is_empty());
    assert_eq!(
        state.notification.map(|n| n.category),
        Some("TransportFailure".to_string())
    );
}

#[tokio::test]
async fn test_malformed_results_are_rejected() {
    let mut duplicate = success_json("2-Opt Heuristic");
    duplicate["after_routes"] = json!([route(0, 80.0), route(0, 45.0)]);
    let mut missing = success_json("2-Opt Heuristic");
    missing.as_object_mut().unwrap().remove("after_distance_km");
    let mut negative = success_json("2-Opt Heuristic");
    negative["before_distance_km"] = json!(-1.0);

    let dashboard = dashboard(MockService::with(vec![
        resp(duplicate),
        resp(missing),
        resp(negative),
    ]));
    for _ in 0..3 {
        match dashboard.submit(RequestParameters::default()).await {
            Err(SubmitError::Failed(Failure::MalformedResult(_))) => {}
            other => panic!("expected malformed result, got {:?}", other),
        }
    }
    let state = dashboard.state().await;
    assert!(!state.loading);
    assert!(state.store.is_empty());
}

#[tokio::test]
async fn test_inconsistent_improvement_is_accepted() {
    let mut value = success_json("2-Opt Heuristic");
    value["improvement_percent"] = json!(40.0);
    let dashboard = dashboard(MockService::with(vec![resp(value)]));
    let result = dashboard.submit(RequestParameters::default()).await.unwrap();
    assert_eq!(result.improvement_percent, 40.0);
}

#[tokio::test]
async fn test_submit_while_loading_is_busy() {
    let (tx, rx) = oneshot::channel();
    let dashboard = dashboard(MockService::gated(
        vec![resp(success_json("2-Opt Heuristic"))],
        rx,
    ));

    let (first, second) = futures::join!(dashboard.submit(RequestParameters::default()), async {
        assert!(dashboard.is_loading().await);
        let second = dashboard.submit(RequestParameters::default()).await;

        let preferences = dashboard.toggle_before().await;
        assert!(!preferences.show_before);
        assert!(dashboard.is_loading().await);
        let view = dashboard.view(&RequestParameters::default()).await;
        assert!(!view.controls.submit_enabled);
        assert_eq!(view.controls.button_label, "Optimizing...");

        tx.send(()).unwrap();
        second
    });

    assert!(first.is_ok());
    assert_eq!(second.unwrap_err(), SubmitError::Busy);
    let state = dashboard.state().await;
    assert!(!state.loading);
    assert!(!state.preferences.show_before);
    assert_eq!(state.store.generation(), 1);
}

#[tokio::test]
async fn test_invalid_parameters_never_reach_service() {
    let dashboard = dashboard(MockService::default());
    let params = RequestParameters {
        num_vehicles: 1,
        ..Default::default()
    };
    match dashboard.submit(params).await {
        Err(SubmitError::InvalidParameters(ModelError::ParameterOutOfRange { name, .. })) => {
            assert_eq!(name, "num_vehicles")
        }
        other => panic!("expected invalid parameters, got {:?}", other),
    }
    assert!(!dashboard.is_loading().await);
}

#[tokio::test]
async fn test_toggles_do_not_touch_result() {
    let dashboard = dashboard(MockService::with(vec![resp(success_json(
        "2-Opt Heuristic",
    ))]));
    let result = dashboard.submit(RequestParameters::default()).await.unwrap();
    let copy = (*result).clone();

    dashboard.toggle_before().await;
    let plan = dashboard.map_plan().await;
    assert_eq!(plan.ops.len(), 4);
    assert_eq!(plan.legend.len(), 1);

    dashboard.toggle_after().await;
    let plan = dashboard.map_plan().await;
    assert_eq!(plan.markers().count(), 2);
    assert!(plan.legend.is_empty());

    let stored = dashboard.result().await.unwrap();
    assert!(Arc::ptr_eq(&result, &stored));
    assert_eq!(*stored, copy);
}

#[tokio::test]
async fn test_set_preferences_applies_both_layers() {
    let dashboard = dashboard(MockService::with(vec![resp(success_json(
        "2-Opt Heuristic",
    ))]));
    dashboard.submit(RequestParameters::default()).await.unwrap();

    let wanted = DisplayPreferences {
        show_before: true,
        show_after: false,
    };
    dashboard.toggle_before().await;
    assert_eq!(dashboard.set_preferences(wanted).await, wanted);

    let plan = dashboard.map_plan().await;
    assert_eq!(plan.polylines(Layer::Before).count(), 2);
    assert_eq!(plan.polylines(Layer::After).count(), 0);
    assert_eq!(plan.legend.len(), 1);
    assert_eq!(dashboard.state().await.store.generation(), 1);
}
