pub use breakdown_bars::BreakdownBars;
pub use mean_table::MeanTable;

/// Touches every plot so that its `typetag` registration is linked in
pub fn init_plots() {
    serde_json::to_string(&BreakdownBars::default()).unwrap();
    serde_json::to_string(&MeanTable::default()).unwrap();
}
