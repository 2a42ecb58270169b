//! Gauge rendering.
//!
//! Turns one [`Measurement`] into a [`Gauge`]: a resolution-independent
//! description holding the label, the formatted value and a fill level in
//! `[0, 1]`. Rendering is a pure function with no shared state, so it can be
//! called from any context.

mod svg;

use deckgauge_types::Measurement;

/// The visual artifact produced for one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    /// Type name shown above the bar.
    pub label: String,
    /// Formatted value without unit.
    pub value_text: String,
    /// Unit shown next to the value.
    pub unit: String,
    /// Bar fill, always within `[0, 1]`.
    pub level: f64,
}

impl Gauge {
    /// Value and unit as displayed, e.g. `"55%"`.
    pub fn display_text(&self) -> String {
        format!("{}{}", self.value_text, self.unit)
    }
}

/// Render a measurement into a gauge.
pub fn render(measurement: &Measurement) -> Gauge {
    let kind = &measurement.kind;
    Gauge {
        label: kind.name.clone(),
        value_text: format_value(measurement.value, kind.format.as_deref()),
        unit: kind.unit.clone(),
        level: level(measurement.value, kind.min, kind.max),
    }
}

/// Normalised position of `value` within `[min, max]`.
///
/// Returns 0 for a degenerate range (`max <= min` or `max == 0`).
pub fn level(value: f64, min: f64, max: f64) -> f64 {
    if max == 0.0 || max <= min {
        return 0.0;
    }

    // f64::max discards NaN, so a NaN ratio lands on 0.
    ((value - min) / (max - min)).max(0.0).min(1.0)
}

/// Display text for a value: three decimals when the type carries a format,
/// otherwise the nearest integer (halves round up).
pub fn format_value(value: f64, format: Option<&str>) -> String {
    match format {
        Some(_) => format!("{:.3}", value),
        None => format!("{}", (value + 0.5).floor() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckgauge_types::MeasurementType;

    #[test]
    fn integer_display_rounds() {
        assert_eq!(format_value(72.6, None), "73");
        assert_eq!(format_value(72.4, None), "72");
        assert_eq!(format_value(2.5, None), "3");
        assert_eq!(format_value(-0.2, None), "0");
    }

    #[test]
    fn formatted_display_uses_three_decimals() {
        assert_eq!(format_value(72.567, Some("0.000")), "72.567");
        assert_eq!(format_value(1.0, Some("%.1f")), "1.000");
    }

    #[test]
    fn level_is_proportional() {
        assert_eq!(level(55.0, 0.0, 100.0), 0.55);
        assert_eq!(level(1500.0, 1000.0, 2000.0), 0.5);
    }

    #[test]
    fn level_is_clamped() {
        assert_eq!(level(-10.0, 0.0, 100.0), 0.0);
        assert_eq!(level(250.0, 0.0, 100.0), 1.0);
    }

    #[test]
    fn level_is_monotonic_within_range() {
        let mut previous = level(0.0, 0.0, 80.0);
        for step in 1..=160 {
            let current = level(step as f64 * 0.5, 0.0, 80.0);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn degenerate_ranges_yield_zero() {
        for value in [-1e9, -1.0, 0.0, 0.5, 1.0, 1e9, f64::INFINITY, f64::NAN] {
            assert_eq!(level(value, 0.0, 0.0), 0.0);
            assert_eq!(level(value, 50.0, 10.0), 0.0);
            assert_eq!(level(value, 10.0, 10.0), 0.0);
            assert_eq!(level(value, -100.0, 0.0), 0.0);
        }
    }

    #[test]
    fn nan_value_yields_zero() {
        assert_eq!(level(f64::NAN, 0.0, 100.0), 0.0);
    }

    #[test]
    fn render_gpu_usage() {
        let kind = MeasurementType::new("GPU usage", "%", 0.0, 100.0);
        let gauge = render(&Measurement::new(kind, 55.0));

        assert_eq!(gauge.label, "GPU usage");
        assert_eq!(gauge.level, 0.55);
        assert_eq!(gauge.display_text(), "55%");
    }

    #[test]
    fn render_formatted_type() {
        let kind = MeasurementType::new("CPU power", "W", 0.0, 200.0).with_format("%.3f");
        let gauge = render(&Measurement::new(kind, 72.567));

        assert_eq!(gauge.display_text(), "72.567W");
    }
}
