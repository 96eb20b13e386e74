use crate::serializable_struct_with_getters;
use serde::{Deserialize, Serialize};
use serde_json::{from_value, Map, Value};
use std::{collections::HashSet, fmt, ops::RangeInclusive, str::FromStr};
use thiserror::Error;

/// Label the density clustering method gives to points it could not place.
pub const UNASSIGNED_CLUSTER: i32 = -1;

pub const NUM_CUSTOMERS_RANGE: RangeInclusive<u32> = 10..=200;
pub const NUM_VEHICLES_RANGE: RangeInclusive<u32> = 2..=20;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("duplicate cluster_id {0} in route set")]
    DuplicateClusterId(u32),
    #[error("{field} must be a non-negative number, got {value}")]
    NegativeDistance { field: String, value: f64 },
    #[error("customer {customer_id} has invalid cluster label {cluster}")]
    InvalidClusterLabel { customer_id: u32, cluster: i32 },
    #[error("{name} must be within {min}..={max}, got {value}")]
    ParameterOutOfRange {
        name: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

// Records received from the optimization service
serializable_struct_with_getters! {
    CustomerRecord {
        customer_id: u32,
        latitude: f64,
        longitude: f64,
        demand: f64,
        time_window_start: u32,
        time_window_end: u32,
        service_time: Option<u32>,
    }
}
serializable_struct_with_getters! {
    Delivery {
        customer_id: u32,
        latitude: f64,
        longitude: f64,
        cluster: i32,
        demand: f64,
        time_window_start: u32,
        time_window_end: u32,
        service_time: Option<u32>,
    }
}
impl Delivery {
    /// Vehicle cluster this delivery belongs to, `None` for density-clustering noise.
    pub fn cluster_id(&self) -> Option<u32> {
        u32::try_from(self.cluster).ok()
    }
}
serializable_struct_with_getters! {
    RouteStop {
        customer_id: u32,
        latitude: f64,
        longitude: f64,
    }
}
serializable_struct_with_getters! {
    Route {
        cluster_id: u32,
        distance_km: f64,
        route: Vec<RouteStop>,
    }
}
impl Route {
    pub fn num_stops(&self) -> usize {
        self.route.len()
    }
}

/// Routes of one optimization phase. No two routes share a `cluster_id`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(try_from = "Vec<Route>", into = "Vec<Route>")]
pub struct RouteSet(Vec<Route>);

impl RouteSet {
    pub fn new(routes: Vec<Route>) -> Result<Self, ModelError> {
        let mut seen = HashSet::new();
        for route in routes.iter() {
            if !seen.insert(route.cluster_id) {
                return Err(ModelError::DuplicateClusterId(route.cluster_id));
            }
        }
        Ok(Self(routes))
    }
    pub fn routes(&self) -> &[Route] {
        &self.0
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.0.iter()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn find(&self, cluster_id: u32) -> Option<&Route> {
        self.0.iter().find(|r| r.cluster_id == cluster_id)
    }
}

impl TryFrom<Vec<Route>> for RouteSet {
    type Error = ModelError;

    fn try_from(routes: Vec<Route>) -> Result<Self, Self::Error> {
        RouteSet::new(routes)
    }
}

impl From<RouteSet> for Vec<Route> {
    fn from(set: RouteSet) -> Self {
        set.0
    }
}

impl<'a> IntoIterator for &'a RouteSet {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

serializable_struct_with_getters! {
    OptimizationResult {
        deliveries: Vec<Delivery>,
        before_routes: RouteSet,
        after_routes: RouteSet,
        before_distance_km: f64,
        after_distance_km: f64,
        improvement_percent: f64,
        num_vehicles: u32,
        optimization_method: String,
        traffic_enabled: bool,
    }
}

impl TryFrom<Map<String, Value>> for OptimizationResult {
    type Error = serde_json::Error;

    fn try_from(v: Map<String, Value>) -> Result<Self, Self::Error> {
        from_value(Value::Object(v))
    }
}

impl OptimizationResult {
    /// Checks the parts of the data model serde cannot express.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_distance("before_distance_km", self.before_distance_km)?;
        check_distance("after_distance_km", self.after_distance_km)?;
        for (name, set) in [
            ("before_routes", &self.before_routes),
            ("after_routes", &self.after_routes),
        ] {
            for route in set {
                check_distance(&format!("{}[{}].distance_km", name, route.cluster_id), route.distance_km)?;
            }
        }
        for delivery in self.deliveries.iter() {
            if delivery.cluster < UNASSIGNED_CLUSTER {
                return Err(ModelError::InvalidClusterLabel {
                    customer_id: delivery.customer_id,
                    cluster: delivery.cluster,
                });
            }
        }
        Ok(())
    }

    /// Improvement implied by the reported totals, `None` when there is no baseline.
    pub fn implied_improvement_percent(&self) -> Option<f64> {
        (self.before_distance_km > 0.0).then(|| {
            (self.before_distance_km - self.after_distance_km) / self.before_distance_km * 100.0
        })
    }
}

fn check_distance(field: &str, value: f64) -> Result<(), ModelError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ModelError::NegativeDistance {
            field: field.to_string(),
            value,
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClusteringMethod {
    #[default]
    Kmeans,
    Dbscan,
}

impl ClusteringMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusteringMethod::Kmeans => "kmeans",
            ClusteringMethod::Dbscan => "dbscan",
        }
    }
}

impl fmt::Display for ClusteringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClusteringMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kmeans" => Ok(ClusteringMethod::Kmeans),
            "dbscan" => Ok(ClusteringMethod::Dbscan),
            _ => Err(format!("Invalid ClusteringMethod: {}", s)),
        }
    }
}

serializable_struct_with_getters! {
    RequestParameters {
        num_customers: u32,
        num_vehicles: u32,
        method: ClusteringMethod,
        use_genetic: bool,
        use_traffic: bool,
    }
}

impl Default for RequestParameters {
    fn default() -> Self {
        Self {
            num_customers: 50,
            num_vehicles: 5,
            method: ClusteringMethod::Kmeans,
            use_genetic: false,
            use_traffic: false,
        }
    }
}

impl RequestParameters {
    pub fn validate(&self) -> Result<(), ModelError> {
        check_range("num_customers", self.num_customers, NUM_CUSTOMERS_RANGE)?;
        check_range("num_vehicles", self.num_vehicles, NUM_VEHICLES_RANGE)
    }
}

fn check_range(name: &'static str, value: u32, range: RangeInclusive<u32>) -> Result<(), ModelError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ModelError::ParameterOutOfRange {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Which route layers the map shows.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayPreferences {
    pub show_before: bool,
    pub show_after: bool,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            show_before: true,
            show_after: true,
        }
    }
}
