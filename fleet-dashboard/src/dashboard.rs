use crate::{
    error::{Failure, SubmitError},
    panels::View,
    render::MapPlan,
    state::{apply, DashboardState, Event},
};
use fleet_api::{Api, FullOptimizationReq, FullOptimizationResp};
use fleet_structs::{
    config::DashboardConfig,
    core::{DisplayPreferences, OptimizationResult, RequestParameters},
};
pub use futures::lock::Mutex;
use std::sync::Arc;

/// Largest gap tolerated between the reported improvement and the one implied
/// by the reported totals, in percentage points.
const IMPROVEMENT_TOLERANCE: f64 = 0.5;

/// The service that turns request parameters into before/after route sets.
#[allow(async_fn_in_trait)]
pub trait OptimizationService {
    async fn full_optimization(&self, req: FullOptimizationReq)
        -> anyhow::Result<FullOptimizationResp>;
}

impl OptimizationService for Api {
    async fn full_optimization(
        &self,
        req: FullOptimizationReq,
    ) -> anyhow::Result<FullOptimizationResp> {
        Api::full_optimization(self, req).await
    }
}

fn update_status(status: &str) {
    log::info!("{}", status);
    #[cfg(feature = "browser")]
    web_sys::console::log_1(&status.to_string().into());
}

/// Turns a service response into a result, trusting none of it unless the
/// service reported success and the payload is a valid result.
pub fn decode_result(resp: FullOptimizationResp) -> Result<OptimizationResult, Failure> {
    if !resp.success {
        let reason = resp.reason().unwrap_or("service reported success: false");
        return Err(Failure::Service(reason.to_string()));
    }
    let result = OptimizationResult::try_from(resp.payload)
        .map_err(|e| Failure::MalformedResult(e.to_string()))?;
    result.validate()?;
    if let Some(implied) = result.implied_improvement_percent() {
        if (implied - result.improvement_percent).abs() > IMPROVEMENT_TOLERANCE {
            log::warn!(
                "Reported improvement {}% differs from totals ({} km -> {} km, {:.2}%)",
                result.improvement_percent,
                result.before_distance_km,
                result.after_distance_km,
                implied
            );
        }
    }
    Ok(result)
}

/// Dashboard runtime: owns the state container and drives the request lifecycle.
///
/// The state lock is released while a request is in flight, so display
/// preferences can change in the meantime.
pub struct Dashboard<S> {
    service: S,
    config: DashboardConfig,
    state: Mutex<DashboardState>,
}

impl<S: OptimizationService> Dashboard<S> {
    pub fn new(service: S, config: DashboardConfig) -> Self {
        Self {
            service,
            config,
            state: Mutex::new(DashboardState::default()),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub async fn state(&self) -> DashboardState {
        self.state.lock().await.clone()
    }

    pub async fn result(&self) -> Option<Arc<OptimizationResult>> {
        self.state.lock().await.store.get()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }

    async fn dispatch(&self, event: Event) -> DashboardState {
        let mut state = self.state.lock().await;
        *state = apply(std::mem::take(&mut *state), event);
        state.clone()
    }

    /// Runs one optimization request and publishes its result.
    ///
    /// Rejected with [`SubmitError::Busy`] while another request is in flight.
    /// On failure the stored result is left as it was.
    pub async fn submit(
        &self,
        params: RequestParameters,
    ) -> Result<Arc<OptimizationResult>, SubmitError> {
        params.validate().map_err(SubmitError::InvalidParameters)?;
        {
            let mut state = self.state.lock().await;
            if !state.can_submit() {
                log::warn!("Rejected submission: a request is already in flight");
                return Err(SubmitError::Busy);
            }
            *state = apply(
                std::mem::take(&mut *state),
                Event::SubmitStarted(params.clone()),
            );
        }
        update_status(&format!(
            "Optimizing {} customers with {} vehicles ({}, genetic: {}, traffic: {})",
            params.num_customers,
            params.num_vehicles,
            params.method,
            params.use_genetic,
            params.use_traffic
        ));

        match self.request(&params).await {
            Ok(result) => {
                let result = Arc::new(result);
                let state = self.dispatch(Event::SubmitSucceeded(result.clone())).await;
                update_status(&format!(
                    "Success. Result {} with {} deliveries and {} routes",
                    state.store.generation(),
                    result.deliveries.len(),
                    result.after_routes.len()
                ));
                Ok(result)
            }
            Err(failure) => {
                log::error!("{}: {}", failure.category(), failure);
                self.dispatch(Event::SubmitFailed(failure.clone())).await;
                update_status(&failure.notification());
                Err(SubmitError::Failed(failure))
            }
        }
    }

    async fn request(&self, params: &RequestParameters) -> Result<OptimizationResult, Failure> {
        let resp = self
            .service
            .full_optimization(FullOptimizationReq::from(params))
            .await
            .map_err(Failure::from_error)?;
        decode_result(resp)
    }

    pub async fn toggle_before(&self) -> DisplayPreferences {
        self.dispatch(Event::ToggleBefore).await.preferences
    }

    pub async fn toggle_after(&self) -> DisplayPreferences {
        self.dispatch(Event::ToggleAfter).await.preferences
    }

    pub async fn set_preferences(&self, preferences: DisplayPreferences) -> DisplayPreferences {
        self.dispatch(Event::SetPreferences(preferences))
            .await
            .preferences
    }

    pub async fn dismiss_notification(&self) {
        self.dispatch(Event::DismissNotification).await;
    }

    pub async fn map_plan(&self) -> MapPlan {
        let state = self.state.lock().await;
        MapPlan::new(state.store.current(), state.preferences, &self.config)
    }

    pub async fn view(&self, parameters: &RequestParameters) -> View {
        let state = self.state.lock().await;
        View::new(&state, parameters, &self.config)
    }
}
