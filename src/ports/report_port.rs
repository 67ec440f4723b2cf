//! Report generation port trait.

use std::path::{Path, PathBuf};

use crate::domain::error::ShinneError;
use crate::domain::new_price::NewPriceChart;

/// Port for writing a symbol's new price bars and reversal events.
pub trait ReportPort {
    /// Writes the chart under `output_dir` and returns the files created.
    fn write(
        &self,
        symbol: &str,
        chart: &NewPriceChart,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, ShinneError>;
}
