pub mod chart;
pub mod export;
pub mod report;
pub mod tiles;

pub use chart::BarChart;
pub use export::{ExportKind, ExportRow, export_file_name, read_export, write_export};
pub use report::{Report, render_report};
pub use tiles::{Tile, TileValue, build_tiles};
