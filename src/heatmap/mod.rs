pub mod colour;
pub mod errors;
pub mod normalize;

use serde::{Deserialize, Serialize};

pub use colour::{to_colour, Colour, ColourScale};
pub use errors::NormalizeError;
pub use normalize::{normalize, normalize_with, NormalizeParams};

/// One weighted point on the heatmap layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatMapDataPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres.
    pub radius: f64,
    pub colour: Colour,
}

/// Colour each magnitude relative to the rest of the batch.
pub fn colour_magnitudes(
    magnitudes: &[f64],
    scale: &ColourScale,
    params: NormalizeParams,
) -> Result<Vec<Colour>, NormalizeError> {
    Ok(normalize_with(magnitudes, params)?
        .into_iter()
        .map(|v| scale.to_colour(v))
        .collect())
}
