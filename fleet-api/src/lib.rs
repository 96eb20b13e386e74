#[cfg(not(any(feature = "request", feature = "request-js")))]
compile_error!("Either feature `request` or `request-js` must be enabled");
#[cfg(all(feature = "request", feature = "request-js"))]
compile_error!("features `request` and `request-js` are mutually exclusive");

use anyhow::Result;
pub use fleet_structs::api::*;
use fleet_utils::{dejsonify, json_headers, jsonify, post};
use serde::{de::DeserializeOwned, Serialize};

/// Client for the route optimization service.
pub struct Api {
    api_url: String,
}

impl Api {
    pub fn new(api_url: String) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    async fn post<T>(&self, path: &str, body: String) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        log::debug!("POST {}", url);
        let resp = post::<String>(url.as_str(), body.as_str(), Some(json_headers())).await?;
        dejsonify::<T>(&resp).map_err(|e| {
            anyhow::Error::new(e).context(format!("Failed to dejsonify response from {}", url))
        })
    }

    async fn post_json<Req, T>(&self, path: &str, req: &Req) -> Result<T>
    where
        Req: Serialize,
        T: DeserializeOwned,
    {
        self.post(path, jsonify(req)).await
    }

    /// Runs generation, clustering, baseline routing and optimization in one call.
    pub async fn full_optimization(&self, req: FullOptimizationReq) -> Result<FullOptimizationResp> {
        self.post_json("full-optimization", &req).await
    }

    pub async fn generate_data(&self, req: GenerateDataReq) -> Result<GenerateDataResp> {
        self.post_json("generate-data", &req).await
    }

    pub async fn cluster(&self, req: ClusterReq) -> Result<ClusterResp> {
        self.post_json("cluster", &req).await
    }

    pub async fn optimize_routes(&self, req: OptimizeRoutesReq) -> Result<OptimizeRoutesResp> {
        self.post_json("optimize-routes", &req).await
    }

    pub async fn optimize_genetic(&self, req: OptimizeGeneticReq) -> Result<OptimizeGeneticResp> {
        self.post_json("optimize-genetic", &req).await
    }

    pub async fn traffic_analysis(&self) -> Result<TrafficAnalysisResp> {
        self.post("traffic-analysis", "{}".to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let api = Api::new("http://localhost:5000/api/".to_string());
        assert_eq!(api.api_url(), "http://localhost:5000/api");
        assert_eq!(
            api.url("full-optimization"),
            "http://localhost:5000/api/full-optimization"
        );
    }
}
