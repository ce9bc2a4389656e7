//! Charts over survey results.
//!
//! A chart is an admin-authored SQL aggregation attached to one survey.
//! This crate materializes chart tables, builds geometry-joined map views,
//! serves the scoped read paths, and caches rendered map tiles on disk.

pub mod builder;
pub mod chart;
pub mod error;
pub mod reader;
pub mod tiles;

pub use builder::{update_data, update_table};
pub use chart::{Chart, ChartKind, ChartStatus, SqlFilter};
pub use error::{ChartError, Result};
pub use reader::{
    ChartData, MapCenter, load_colors, load_data, load_zip_coords, map_click_info, map_frame,
    template_rows,
};
pub use tiles::{
    ColorRule, MapStyle, TileBounds, TileCache, TileRenderer, TileScope, get_map_tile,
    tile_bounds,
};
