//! Reference vectors for the normalization and colour pipeline.

#[cfg(test)]
mod colour_scale {
    use landmap::heatmap::{
        Colour, ColourScale, NormalizeError, NormalizeParams, colour_magnitudes, normalize,
        to_colour,
    };

    #[test]
    fn test_three_prices_span_green_to_red() {
        let colours =
            colour_magnitudes(&[5.0, 10.0, 15.0], &ColourScale::default(), NormalizeParams::default())
                .unwrap();
        let hex: Vec<String> = colours.iter().map(Colour::to_hex).collect();
        assert_eq!(hex, vec!["#00a500", "#dada00", "#ff0000"]);
    }

    #[test]
    fn test_identical_prices_are_mid_scale() {
        let normalized = normalize(&[250_000.0; 4]).unwrap();
        assert!(normalized.iter().all(|v| *v == 0.5));
        assert_eq!(to_colour(0.5).to_hex(), "#9c9c00");
    }

    #[test]
    fn test_normalized_values_stay_in_unit_range() {
        let prices = [45_000.0, 120_000.0, 180_000.0, 265_000.0, 1_450_000.0];
        let normalized = normalize(&prices).unwrap();
        assert_eq!(normalized.len(), prices.len());
        assert!(normalized.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(normalized.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_empty_and_non_positive_input() {
        assert_eq!(normalize(&[]), Err(NormalizeError::EmptyInput));
        assert!(matches!(
            normalize(&[100.0, 0.0]),
            Err(NormalizeError::InvalidMagnitude(_))
        ));
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(to_colour(0.0), Colour::new(0, 165, 0));
        assert_eq!(to_colour(0.49), Colour::new(0, 165, 0));
        assert_eq!(to_colour(1.0), Colour::new(255, 0, 0));
        assert_eq!(to_colour(f64::NAN), Colour::new(0, 165, 0));
    }
}
