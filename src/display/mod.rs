//! Terminal output: colours and the yearly summary table

pub mod colours;
pub mod table;

pub use colours::ColourManager;
pub use table::render_stats_table;
