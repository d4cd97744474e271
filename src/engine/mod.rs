pub mod achievements;
pub mod heatmap;
pub mod mischief;
pub mod progress;
pub mod progress_map;
pub mod report;
pub mod selector;

pub use heatmap::HeatmapLevels;
pub use progress::WordProgress;
pub use progress_map::ProgressMap;
pub use selector::SelectionMode;
