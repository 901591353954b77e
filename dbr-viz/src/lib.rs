//! Highcharts chart configurations for dashboardr.
//!
//! Each chart builder reads a [`dbr_data::DataFrame`], validates the columns
//! it needs and returns a [`Chart`]: the Highcharts options tree plus any JS
//! functions (tooltip formatters) it references. Pages embed the chart with
//! [`Chart::to_js_object`].
//!
//! # Example
//!
//! ```
//! use dbr_data::DataFrame;
//! use dbr_viz::{ChartSpec, PieParams};
//!
//! let df = DataFrame::from_csv_str("party\nA\nB\nA\n").unwrap();
//! let chart = ChartSpec::Pie(PieParams::new("party")).build(&df).unwrap();
//! assert_eq!(chart.options["chart"]["type"], "pie");
//! ```

pub mod chart;
pub mod charts;
pub mod error;
pub mod palette;
pub mod tooltip;

pub use chart::{Chart, CommonOptions, JsFunction};
pub use charts::{
    create_heatmap, create_stackedbar, create_timeline, viz_density, viz_pie, viz_sankey,
    viz_treemap, viz_waffle, waffle_counts, ChartSpec, DensityParams, HeatmapAgg, HeatmapParams,
    PieParams, SankeyParams, StackedBarParams, StackedType, TimelineChartType, TimelineParams,
    TreemapParams, WaffleParams, YMode,
};
pub use error::{Result, VizError};
pub use palette::{Palette, DEFAULT_PALETTE};
pub use tooltip::{TooltipContext, TooltipFormat};
