use fleet_structs::core::{OptimizationResult, Route, RouteSet};
use fleet_utils::round_to;
use serde::Serialize;

/// Pairs every after-route with the before-route of the same vehicle.
///
/// Vehicle counts can differ between the two phases, so an after-route
/// without a baseline yields `None`.
pub fn match_routes<'a>(
    before: &'a RouteSet,
    after: &'a RouteSet,
) -> impl Iterator<Item = (&'a Route, Option<&'a Route>)> + 'a {
    after
        .iter()
        .map(move |route| (route, before.find(route.cluster_id)))
}

/// Percentage distance saved, to one decimal. A zero-length baseline saves nothing.
pub fn improvement_percent(before_km: f64, after_km: f64) -> f64 {
    if before_km <= 0.0 {
        return 0.0;
    }
    round_to((before_km - after_km) / before_km * 100.0, 1)
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RouteComparison {
    pub cluster_id: u32,
    pub after_distance_km: f64,
    pub before_distance_km: Option<f64>,
    pub improvement_percent: Option<f64>,
    pub num_stops: usize,
}

impl RouteComparison {
    pub fn has_baseline(&self) -> bool {
        self.before_distance_km.is_some()
    }
}

pub fn compare(before: &RouteSet, after: &RouteSet) -> Vec<RouteComparison> {
    match_routes(before, after)
        .map(|(route, baseline)| RouteComparison {
            cluster_id: route.cluster_id,
            after_distance_km: route.distance_km,
            before_distance_km: baseline.map(|b| b.distance_km),
            improvement_percent: baseline
                .map(|b| improvement_percent(b.distance_km, route.distance_km)),
            num_stops: route.num_stops(),
        })
        .collect()
}

/// Fleet-wide figures exactly as the optimization service reported them.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Summary {
    pub before_distance_km: f64,
    pub after_distance_km: f64,
    pub improvement_percent: f64,
    pub num_vehicles: u32,
    pub num_deliveries: usize,
    pub optimization_method: String,
    pub traffic_enabled: bool,
}

impl From<&OptimizationResult> for Summary {
    fn from(result: &OptimizationResult) -> Self {
        Self {
            before_distance_km: result.before_distance_km,
            after_distance_km: result.after_distance_km,
            improvement_percent: result.improvement_percent,
            num_vehicles: result.num_vehicles,
            num_deliveries: result.deliveries.len(),
            optimization_method: result.optimization_method.clone(),
            traffic_enabled: result.traffic_enabled,
        }
    }
}
