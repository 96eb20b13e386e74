pub mod dashboard;
pub mod error;
pub mod metrics;
pub mod panels;
pub mod render;
pub mod state;

pub use dashboard::{decode_result, Dashboard, OptimizationService};
pub use error::{Failure, SubmitError};

#[cfg(feature = "browser")]
mod exports {
    use super::*;
    use fleet_api::Api;
    use fleet_structs::{
        config::DashboardConfig,
        core::{ClusteringMethod, DisplayPreferences, RequestParameters},
    };
    use fleet_utils::dejsonify;
    use once_cell::sync::OnceCell;
    use serde::Serialize;
    use serde_wasm_bindgen::{from_value, to_value};
    use wasm_bindgen::prelude::*;

    static DASHBOARD: OnceCell<Dashboard<Api>> = OnceCell::new();

    fn dashboard() -> Result<&'static Dashboard<Api>, JsValue> {
        DASHBOARD
            .get()
            .ok_or_else(|| JsValue::from_str("Dashboard not set up, call setup() first"))
    }

    fn js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
        Ok(to_value(value)?)
    }

    /// `config` is an optional json object overriding any `DashboardConfig` field.
    #[wasm_bindgen]
    pub fn setup(config: Option<String>) -> Result<(), JsValue> {
        let config = match config {
            Some(json) => dejsonify::<DashboardConfig>(&json)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?,
            None => DashboardConfig::default(),
        };
        DASHBOARD.get_or_init(|| Dashboard::new(Api::new(config.api_url.clone()), config));
        Ok(())
    }

    #[wasm_bindgen]
    pub async fn state() -> Result<JsValue, JsValue> {
        js(&dashboard()?.state().await)
    }

    #[wasm_bindgen]
    pub async fn view(parameters: JsValue) -> Result<JsValue, JsValue> {
        let parameters: RequestParameters = if parameters.is_undefined() || parameters.is_null() {
            RequestParameters::default()
        } else {
            from_value(parameters)?
        };
        js(&dashboard()?.view(&parameters).await)
    }

    #[wasm_bindgen]
    pub async fn map_plan() -> Result<JsValue, JsValue> {
        js(&dashboard()?.map_plan().await)
    }

    /// Resolves to the new result, or rejects with the notification text.
    #[wasm_bindgen]
    pub async fn submit(
        num_customers: u32,
        num_vehicles: u32,
        method: String,
        use_genetic: bool,
        use_traffic: bool,
    ) -> Result<JsValue, JsValue> {
        let method = method.parse::<ClusteringMethod>().map_err(|e| JsValue::from_str(&e))?;
        let params = RequestParameters {
            num_customers,
            num_vehicles,
            method,
            use_genetic,
            use_traffic,
        };
        match dashboard()?.submit(params).await {
            Ok(result) => js(&*result),
            Err(SubmitError::Failed(failure)) => Err(JsValue::from_str(&failure.notification())),
            Err(e) => Err(JsValue::from_str(&e.to_string())),
        }
    }

    #[wasm_bindgen]
    pub async fn toggle_before() -> Result<JsValue, JsValue> {
        js(&dashboard()?.toggle_before().await)
    }

    #[wasm_bindgen]
    pub async fn toggle_after() -> Result<JsValue, JsValue> {
        js(&dashboard()?.toggle_after().await)
    }

    #[wasm_bindgen]
    pub async fn set_preferences(show_before: bool, show_after: bool) -> Result<JsValue, JsValue> {
        let preferences = DisplayPreferences {
            show_before,
            show_after,
        };
        js(&dashboard()?.set_preferences(preferences).await)
    }

    #[wasm_bindgen]
    pub async fn dismiss_notification() -> Result<(), JsValue> {
        dashboard()?.dismiss_notification().await;
        Ok(())
    }
}
