use clap::{value_parser, Arg, ArgAction, Command};
use fleet_api::Api;
use fleet_dashboard::{panels::View, Dashboard, SubmitError};
use fleet_structs::{
    config::DashboardConfig,
    core::{ClusteringMethod, DisplayPreferences, RequestParameters},
};
use fleet_utils::dejsonify;
use std::{process, sync::Arc};
use warp::Filter;

fn cli() -> Command {
    Command::new("Fleet Dashboard")
        .about("Runs a route optimization and compares the before and after routes")
        .arg(
            Arg::new("customers")
                .long("customers")
                .help("(Optional) Number of customers to generate (10-200)")
                .default_value("50")
                .value_parser(value_parser!(u32).range(10..=200)),
        )
        .arg(
            Arg::new("vehicles")
                .long("vehicles")
                .help("(Optional) Number of vehicles (2-20)")
                .default_value("5")
                .value_parser(value_parser!(u32).range(2..=20)),
        )
        .arg(
            Arg::new("method")
                .long("method")
                .help("(Optional) Clustering method")
                .default_value("kmeans")
                .value_parser(["kmeans", "dbscan"]),
        )
        .arg(
            Arg::new("genetic")
                .long("genetic")
                .help("(Optional) Optimize routes with the genetic algorithm")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("traffic")
                .long("traffic")
                .help("(Optional) Use real-time traffic data")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("api")
                .long("api")
                .help("(Optional) Set api_url")
                .value_parser(value_parser!(String)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("(Optional) Json string with dashboard config overrides")
                .value_parser(value_parser!(String)),
        )
        .arg(
            Arg::new("hide-before")
                .long("hide-before")
                .help("(Optional) Hide the before routes layer")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("hide-after")
                .long("hide-after")
                .help("(Optional) Hide the after routes layer")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .help("(Optional) Serve the dashboard view as json on this port")
                .value_parser(value_parser!(u16)),
        )
}

#[tokio::main]
async fn main() {
    simple_logger::init_with_level(log::Level::Info).unwrap_or_else(|e| eprintln!("{}", e));
    let matches = cli().get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(json) => dejsonify::<DashboardConfig>(json).unwrap_or_else(|err| {
            log::error!("Failed to parse config {:?}: {}", json, err);
            process::exit(2);
        }),
        None => DashboardConfig::default(),
    };
    if let Some(api_url) = matches.get_one::<String>("api") {
        config.api_url = api_url.clone();
    }
    let method = matches
        .get_one::<String>("method")
        .and_then(|m| m.parse::<ClusteringMethod>().ok())
        .unwrap_or_default();
    let params = RequestParameters {
        num_customers: matches.get_one::<u32>("customers").copied().unwrap_or(50),
        num_vehicles: matches.get_one::<u32>("vehicles").copied().unwrap_or(5),
        method,
        use_genetic: matches.get_flag("genetic"),
        use_traffic: matches.get_flag("traffic"),
    };
    let preferences = DisplayPreferences {
        show_before: !matches.get_flag("hide-before"),
        show_after: !matches.get_flag("hide-after"),
    };
    let port = matches.get_one::<u16>("port").copied();

    log::info!("Using optimization service at {}", config.api_url);
    let dashboard = Arc::new(Dashboard::new(Api::new(config.api_url.clone()), config));
    dashboard.set_preferences(preferences).await;

    let ok = match dashboard.submit(params.clone()).await {
        Ok(_) => {
            report(&dashboard.view(&params).await);
            true
        }
        Err(SubmitError::Failed(failure)) => {
            log::error!("{}", failure.notification());
            false
        }
        Err(e) => {
            log::error!("{}", e);
            false
        }
    };

    match port {
        Some(port) => serve(dashboard, params, port).await,
        None if !ok => process::exit(1),
        None => {}
    }
}

fn report(view: &View) {
    if let Some(statistics) = view.statistics.as_ref() {
        for card in statistics.cards.iter() {
            log::info!("{}: {}", card.label, card.value);
        }
        if statistics.traffic_banner {
            log::info!("Real-time traffic data used in calculations");
        }
        for detail in statistics.route_details.iter() {
            let before = detail
                .before_distance_km
                .map(|km| format!("{} km -> ", km))
                .unwrap_or_default();
            let improvement = detail
                .improvement_percent
                .map(|p| format!(" (↓{}%)", p))
                .unwrap_or_default();
            log::info!(
                "{}: {}{} km{}, {}",
                detail.vehicle,
                before,
                detail.after_distance_km,
                improvement,
                detail.stops
            );
        }
    }
    if let Some(map) = view.map.as_ref() {
        log::info!(
            "Map centred on ({}, {}) at zoom {} with {} draw operations",
            map.viewport.center.latitude,
            map.viewport.center.longitude,
            map.viewport.zoom,
            map.ops.len()
        );
    }
}

async fn serve(dashboard: Arc<Dashboard<Api>>, params: RequestParameters, port: u16) {
    let with_dashboard = {
        let dashboard = dashboard.clone();
        warp::any().map(move || dashboard.clone())
    };
    let get_view = warp::path("view")
        .and(warp::get())
        .and(with_dashboard.clone())
        .and_then(move |dashboard: Arc<Dashboard<Api>>| {
            let params = params.clone();
            async move {
                let view = dashboard.view(&params).await;
                Ok::<_, warp::Rejection>(warp::reply::json(&view))
            }
        });
    let get_state = warp::path("state")
        .and(warp::get())
        .and(with_dashboard.clone())
        .and_then(|dashboard: Arc<Dashboard<Api>>| async move {
            let state = dashboard.state().await;
            Ok::<_, warp::Rejection>(warp::reply::json(&state))
        });
    let post_toggle = warp::path!("toggle" / String)
        .and(warp::post())
        .and(with_dashboard)
        .and_then(|layer: String, dashboard: Arc<Dashboard<Api>>| async move {
            let preferences = match layer.as_str() {
                "before" => dashboard.toggle_before().await,
                "after" => dashboard.toggle_after().await,
                _ => return Err(warp::reject::not_found()),
            };
            log::info!("Layer {} toggled: {:?}", layer, preferences);
            Ok(warp::reply::json(&preferences))
        });
    log::info!("Serving dashboard view on port {}", port);
    warp::serve(get_view.or(get_state).or(post_toggle))
        .run(([0, 0, 0, 0], port))
        .await;
}
