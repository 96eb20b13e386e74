use crate::{
    metrics::{compare, RouteComparison, Summary},
    render::MapPlan,
    state::{DashboardState, Notification},
};
use fleet_structs::{
    config::DashboardConfig,
    core::{DisplayPreferences, OptimizationResult, RequestParameters, Route},
};
use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Good,
    Bad,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Card {
    pub label: &'static str,
    pub value: String,
    pub tone: Tone,
}

fn card(label: &'static str, value: String, tone: Tone) -> Card {
    Card { label, value, tone }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RouteDetail {
    pub vehicle: String,
    /// Baseline distance, shown struck through.
    pub before_distance_km: Option<f64>,
    pub after_distance_km: f64,
    /// Only present when the route actually got shorter.
    pub improvement_percent: Option<f64>,
    pub stops: String,
}

impl From<&RouteComparison> for RouteDetail {
    fn from(comparison: &RouteComparison) -> Self {
        Self {
            vehicle: vehicle_label(comparison.cluster_id),
            before_distance_km: comparison.before_distance_km,
            after_distance_km: comparison.after_distance_km,
            improvement_percent: comparison.improvement_percent.filter(|p| *p > 0.0),
            stops: format!("{} stops", comparison.num_stops),
        }
    }
}

/// One-based vehicle label. Widened so the largest `cluster_id` still gets a label.
pub fn vehicle_label(cluster_id: u32) -> String {
    format!("Vehicle {}", u64::from(cluster_id) + 1)
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatisticsPanel {
    pub cards: Vec<Card>,
    pub traffic_banner: bool,
    pub route_details: Vec<RouteDetail>,
}

impl From<&OptimizationResult> for StatisticsPanel {
    fn from(result: &OptimizationResult) -> Self {
        let summary = Summary::from(result);
        let improvement_tone = if summary.improvement_percent > 0.0 {
            Tone::Good
        } else {
            Tone::Bad
        };
        let cards = vec![
            card(
                "Before Optimization",
                format!("{} km", summary.before_distance_km),
                Tone::Bad,
            ),
            card(
                "After Optimization",
                format!("{} km", summary.after_distance_km),
                Tone::Good,
            ),
            card(
                "Improvement",
                format!("↓ {}%", summary.improvement_percent),
                improvement_tone,
            ),
            card(
                "Vehicles Used",
                summary.num_vehicles.to_string(),
                Tone::Neutral,
            ),
            card(
                "Total Deliveries",
                summary.num_deliveries.to_string(),
                Tone::Neutral,
            ),
            card("Method", summary.optimization_method, Tone::Neutral),
        ];
        Self {
            cards,
            traffic_banner: summary.traffic_enabled,
            route_details: compare(&result.before_routes, &result.after_routes)
                .iter()
                .map(RouteDetail::from)
                .collect(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RouteListItem {
    pub header: String,
    pub stops: String,
}

impl From<&Route> for RouteListItem {
    fn from(route: &Route) -> Self {
        Self {
            header: format!("{} - {} km", vehicle_label(route.cluster_id), route.distance_km),
            stops: route
                .route
                .iter()
                .map(|stop| format!("Customer {}", stop.customer_id))
                .collect::<Vec<_>>()
                .join(" → "),
        }
    }
}

/// Optimized routes listed under the map.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RouteListPanel {
    pub routes: Vec<RouteListItem>,
}

impl RouteListPanel {
    pub fn new(result: &OptimizationResult) -> Option<Self> {
        if result.after_routes.is_empty() {
            return None;
        }
        Some(Self {
            routes: result.after_routes.iter().map(RouteListItem::from).collect(),
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ControlsPanel {
    pub parameters: RequestParameters,
    pub submit_enabled: bool,
    pub button_label: &'static str,
    pub loading_hints: Vec<&'static str>,
    /// Traffic-aware routing needs a maps key on the service side.
    pub traffic_key_hint: bool,
}

impl ControlsPanel {
    pub fn new(state: &DashboardState, parameters: &RequestParameters) -> Self {
        let mut loading_hints = Vec::new();
        if let Some(pending) = state.pending.as_ref() {
            if pending.use_genetic {
                loading_hints.push("Running Genetic Algorithm...");
            }
            if pending.use_traffic {
                loading_hints.push("Fetching Traffic Data...");
            }
        }
        Self {
            parameters: parameters.clone(),
            submit_enabled: state.can_submit(),
            button_label: if state.loading {
                "Optimizing..."
            } else {
                "Optimize Routes"
            },
            loading_hints,
            traffic_key_hint: parameters.use_traffic,
        }
    }
}

/// Everything the page shows for one state.
///
/// Without deliveries the map area shows the welcome placeholder.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct View {
    pub controls: ControlsPanel,
    pub notification: Option<Notification>,
    /// Layer toggles, offered once there is a result to toggle.
    pub preferences: Option<DisplayPreferences>,
    pub statistics: Option<StatisticsPanel>,
    pub map: Option<MapPlan>,
    pub route_list: Option<RouteListPanel>,
}

impl View {
    pub fn new(
        state: &DashboardState,
        parameters: &RequestParameters,
        config: &DashboardConfig,
    ) -> Self {
        let result = state.store.current();
        let has_deliveries = result.is_some_and(|r| !r.deliveries.is_empty());
        Self {
            controls: ControlsPanel::new(state, parameters),
            notification: state.notification.clone(),
            preferences: result.map(|_| state.preferences),
            statistics: result.map(StatisticsPanel::from),
            map: has_deliveries.then(|| MapPlan::new(result, state.preferences, config)),
            route_list: result.filter(|_| has_deliveries).and_then(RouteListPanel::new),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.map.is_none()
    }
}
