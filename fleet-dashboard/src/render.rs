//! Projection of deliveries and route sets onto map draw operations.
//!
//! Nothing here touches the inputs; the same state always yields the same
//! sequence of operations.

use fleet_structs::{
    config::{DashboardConfig, GeoPoint},
    core::{Delivery, DisplayPreferences, OptimizationResult, Route, RouteSet},
};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub const COLORS: [Color; 10] = [
    Color::rgb(0xFF, 0x6B, 0x6B),
    Color::rgb(0x4E, 0xCD, 0xC4),
    Color::rgb(0x45, 0xB7, 0xD1),
    Color::rgb(0xFF, 0xA0, 0x7A),
    Color::rgb(0x98, 0xD8, 0xC8),
    Color::rgb(0xF7, 0xDC, 0x6F),
    Color::rgb(0xBB, 0x8F, 0xCE),
    Color::rgb(0x85, 0xC1, 0xE2),
    Color::rgb(0xF3, 0x9C, 0x12),
    Color::rgb(0xE7, 0x4C, 0x3C),
];
pub const BASELINE_COLOR: Color = Color::rgb(0xFF, 0x00, 0x00);
pub const MARKER_OUTLINE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
/// Fill for deliveries the clustering left unassigned.
pub const UNASSIGNED_COLOR: Color = Color::rgb(0x99, 0x99, 0x99);
/// Swatch for the after layer in the legend; the layer itself uses the palette.
pub const AFTER_LEGEND_COLOR: Color = COLORS[1];

/// Palette entry for a cluster. Clusters beyond the palette size wrap around.
///
/// An empty palette is rejected at compile time.
pub fn color<const N: usize>(cluster_id: u32, palette: &[Color; N]) -> Color {
    const { assert!(N > 0, "palette must not be empty") };
    palette[cluster_id as usize % N]
}

pub fn marker_color(delivery: &Delivery) -> Color {
    match delivery.cluster_id() {
        Some(cluster_id) => color(cluster_id, &COLORS),
        None => UNASSIGNED_COLOR,
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Before,
    After,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Color,
    pub weight: f64,
    pub opacity: f64,
    pub dash_array: Option<&'static str>,
}

impl LineStyle {
    pub fn before() -> Self {
        Self {
            color: BASELINE_COLOR,
            weight: 3.0,
            opacity: 0.5,
            dash_array: Some("10, 10"),
        }
    }

    pub fn after(cluster_id: u32) -> Self {
        Self {
            color: color(cluster_id, &COLORS),
            weight: 4.0,
            opacity: 0.8,
            dash_array: None,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Marker {
    pub customer_id: u32,
    pub cluster: i32,
    pub center: [f64; 2],
    pub radius: f64,
    pub fill_color: Color,
    pub fill_opacity: f64,
    pub stroke_color: Color,
    pub stroke_weight: f64,
    pub popup: String,
}

impl From<&Delivery> for Marker {
    fn from(delivery: &Delivery) -> Self {
        Self {
            customer_id: delivery.customer_id,
            cluster: delivery.cluster,
            center: [delivery.latitude, delivery.longitude],
            radius: 8.0,
            fill_color: marker_color(delivery),
            fill_opacity: 0.8,
            stroke_color: MARKER_OUTLINE,
            stroke_weight: 2.0,
            popup: popup(delivery),
        }
    }
}

fn popup(delivery: &Delivery) -> String {
    let cluster = match delivery.cluster_id() {
        Some(cluster_id) => cluster_id.to_string(),
        None => "unassigned".to_string(),
    };
    format!(
        "Customer {}\nCluster: {}\nDemand: {}\nTime Window: {}:00 - {}:00",
        delivery.customer_id,
        cluster,
        delivery.demand,
        delivery.time_window_start,
        delivery.time_window_end
    )
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Polyline {
    pub layer: Layer,
    pub cluster_id: u32,
    pub positions: Vec<[f64; 2]>,
    pub style: LineStyle,
}

impl Polyline {
    fn new(layer: Layer, route: &Route) -> Self {
        let style = match layer {
            Layer::Before => LineStyle::before(),
            Layer::After => LineStyle::after(route.cluster_id),
        };
        Self {
            layer,
            cluster_id: route.cluster_id,
            positions: route
                .route
                .iter()
                .map(|stop| [stop.latitude, stop.longitude])
                .collect(),
            style,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawOp {
    Marker(Marker),
    Polyline(Polyline),
}

/// Draw operations for one frame: a marker per delivery, then the before
/// layer, then the after layer, each layer only when enabled.
pub fn render<'a>(
    deliveries: &'a [Delivery],
    before_routes: &'a RouteSet,
    after_routes: &'a RouteSet,
    preferences: DisplayPreferences,
) -> impl Iterator<Item = DrawOp> + 'a {
    let markers = deliveries.iter().map(|d| DrawOp::Marker(Marker::from(d)));
    let before = preferences
        .show_before
        .then(|| before_routes.iter())
        .into_iter()
        .flatten()
        .map(|r| DrawOp::Polyline(Polyline::new(Layer::Before, r)));
    let after = preferences
        .show_after
        .then(|| after_routes.iter())
        .into_iter()
        .flatten()
        .map(|r| DrawOp::Polyline(Polyline::new(Layer::After, r)));
    markers.chain(before).chain(after)
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: GeoPoint,
    pub zoom: u8,
    /// False when `center` is the placeholder location rather than a delivery.
    pub from_deliveries: bool,
}

/// Centres on the first delivery, or on the configured placeholder location.
pub fn viewport(deliveries: &[Delivery], config: &DashboardConfig) -> Viewport {
    match deliveries.first() {
        Some(first) => Viewport {
            center: GeoPoint {
                latitude: first.latitude,
                longitude: first.longitude,
            },
            zoom: config.zoom,
            from_deliveries: true,
        },
        None => Viewport {
            center: config.fallback_center,
            zoom: config.zoom,
            from_deliveries: false,
        },
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub layer: Layer,
    pub label: &'static str,
    pub color: Color,
    pub dashed: bool,
}

pub fn legend(preferences: DisplayPreferences) -> Vec<LegendEntry> {
    let mut entries = Vec::new();
    if preferences.show_before {
        entries.push(LegendEntry {
            layer: Layer::Before,
            label: "Before Optimization",
            color: BASELINE_COLOR,
            dashed: true,
        });
    }
    if preferences.show_after {
        entries.push(LegendEntry {
            layer: Layer::After,
            label: "After Optimization",
            color: AFTER_LEGEND_COLOR,
            dashed: false,
        });
    }
    entries
}

/// Background imagery. A tile that fails to load is left blank.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
}

impl From<&DashboardConfig> for TileLayer {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            url_template: config.tile_url.clone(),
            attribution: config.tile_attribution.clone(),
        }
    }
}

/// Everything the map surface needs for one render pass.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MapPlan {
    pub viewport: Viewport,
    pub tiles: TileLayer,
    pub ops: Vec<DrawOp>,
    pub legend: Vec<LegendEntry>,
}

impl MapPlan {
    pub fn new(
        result: Option<&OptimizationResult>,
        preferences: DisplayPreferences,
        config: &DashboardConfig,
    ) -> Self {
        let (viewport, ops) = match result {
            Some(result) => (
                viewport(&result.deliveries, config),
                render(
                    &result.deliveries,
                    &result.before_routes,
                    &result.after_routes,
                    preferences,
                )
                .collect(),
            ),
            None => (viewport(&[], config), Vec::new()),
        };
        Self {
            viewport,
            tiles: TileLayer::from(config),
            ops,
            legend: legend(preferences),
        }
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Marker(marker) => Some(marker),
            _ => None,
        })
    }

    pub fn polylines(&self, layer: Layer) -> impl Iterator<Item = &Polyline> {
        self.ops.iter().filter_map(move |op| match op {
            DrawOp::Polyline(line) if line.layer == layer => Some(line),
            _ => None,
        })
    }
}
