use crate::{core::*, serializable_struct_with_getters};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

serializable_struct_with_getters! {
    FullOptimizationReq {
        num_customers: u32,
        n_vehicles: u32,
        clustering_method: ClusteringMethod,
        use_genetic: bool,
        use_traffic: bool,
    }
}

impl From<&RequestParameters> for FullOptimizationReq {
    fn from(params: &RequestParameters) -> Self {
        Self {
            num_customers: params.num_customers,
            n_vehicles: params.num_vehicles,
            clustering_method: params.method,
            use_genetic: params.use_genetic,
            use_traffic: params.use_traffic,
        }
    }
}

// The result fields are only trusted once `success` is known to be true, so
// they are kept as raw json until then.
serializable_struct_with_getters! {
    FullOptimizationResp {
        success: bool,
        error: Option<String>,
        message: Option<String>,
        #[serde(flatten)]
        payload: Map<String, Value>,
    }
}

impl FullOptimizationResp {
    /// Explanation the service gave for a failed run, if any.
    pub fn reason(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

serializable_struct_with_getters! {
    GenerateDataReq {
        num_customers: u32,
    }
}

serializable_struct_with_getters! {
    GenerateDataResp {
        success: bool,
        data: Vec<CustomerRecord>,
        message: Option<String>,
    }
}

serializable_struct_with_getters! {
    ClusterReq {
        deliveries: Vec<CustomerRecord>,
        method: ClusteringMethod,
        n_vehicles: u32,
    }
}

serializable_struct_with_getters! {
    ClusteringSummary {
        clustered_data: Vec<Delivery>,
        method: String,
        centers: Option<Vec<[f64; 2]>>,
        n_clusters: Option<u32>,
        n_outliers: Option<u32>,
    }
}

serializable_struct_with_getters! {
    ClusterResp {
        success: bool,
        result: ClusteringSummary,
        balanced_data: Vec<Delivery>,
    }
}

serializable_struct_with_getters! {
    OptimizeRoutesReq {
        deliveries: Vec<Delivery>,
    }
}

serializable_struct_with_getters! {
    ImprovedRoute {
        cluster_id: u32,
        distance_km: f64,
        route: Vec<RouteStop>,
        improvement: f64,
    }
}

serializable_struct_with_getters! {
    OptimizeRoutesResp {
        success: bool,
        routes: Vec<ImprovedRoute>,
        total_distance_before_km: f64,
        total_distance_after_km: f64,
        improvement_percent: f64,
    }
}

serializable_struct_with_getters! {
    OptimizeGeneticReq {
        deliveries: Vec<Delivery>,
        use_traffic: bool,
    }
}

serializable_struct_with_getters! {
    OptimizeGeneticResp {
        success: bool,
        routes: RouteSet,
        total_distance_km: f64,
        method: String,
        traffic_enabled: bool,
    }
}

serializable_struct_with_getters! {
    TrafficPattern {
        hour: u32,
        multiplier: f64,
    }
}

serializable_struct_with_getters! {
    TrafficAnalysisResp {
        success: bool,
        traffic_patterns: Vec<TrafficPattern>,
    }
}
