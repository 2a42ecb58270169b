//! SVG serialisation of a gauge.
//!
//! The image is a 100x100 tile: type label on top, value with unit below it,
//! and a vertical bar filled from the bottom by a green-orange-red gradient.

use std::fmt::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::Gauge;

const BAR_X: f64 = 30.0;
const BAR_Y: f64 = 45.0;
const BAR_W: f64 = 100.0 - BAR_X * 2.0;
const BAR_H: f64 = 100.0 - BAR_Y;
const STROKE: f64 = 0.618;

impl Gauge {
    /// Render the gauge as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        let remaining = BAR_H - self.level * BAR_H;
        let mut svg = String::with_capacity(2048);

        // Writing into a String cannot fail.
        let _ = write!(
            svg,
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">"#,
                r#"<defs>"#,
                r#"<linearGradient id="gradient" x1="0%" y1="100%" x2="0%" y2="0%">"#,
                r#"<stop offset="34%" stop-color="green"/>"#,
                r#"<stop offset="61.8%" stop-color="orange"/>"#,
                r#"<stop offset="100%" stop-color="darkred"/>"#,
                r#"</linearGradient>"#,
                r#"<mask id="border-bg">"#,
                r#"<rect x="0" y="0" width="100%" height="100%" fill="white"/>"#,
                r#"<rect x="{bx}" y="{by}" width="{bw}" height="{bh}" fill="black"/>"#,
                r#"</mask>"#,
                r#"<mask id="bar-cutout-remaining">"#,
                r#"<rect x="0" y="0" width="100%" height="100%" fill="white"/>"#,
                r#"<rect x="{bx}" y="{by}" width="{bw}" height="{rem}" fill="black"/>"#,
                r#"</mask>"#,
                r#"</defs>"#,
                r#"<rect x="0" y="0" width="100%" height="100%" fill="black"/>"#,
                r#"<rect fill="none" stroke="lightgray" mask="url(#border-bg)" stroke-width="{sw}" x="{ox}" y="{oy}" width="{ow}" height="{oh}"/>"#,
                r#"<rect fill="url(#gradient)" mask="url(#bar-cutout-remaining)" x="{bx}" y="{by}" width="{bw}" height="{bh}"/>"#,
                r#"<text x="50" y="15" text-anchor="middle" font-size="10" fill="lightgray">{label}</text>"#,
                r#"<text x="56" y="35" text-anchor="middle" font-size="19" fill="white" font-weight="bold">{value}"#,
                r#"<tspan font-size="8" font-weight="lighter" fill="lightgray" alignment-baseline="middle">{unit}</tspan>"#,
                r#"</text>"#,
                r#"</svg>"#,
            ),
            bx = BAR_X,
            by = BAR_Y,
            bw = BAR_W,
            bh = BAR_H,
            rem = remaining,
            sw = STROKE,
            ox = BAR_X - STROKE / 2.0,
            oy = BAR_Y - STROKE / 2.0,
            ow = BAR_W + STROKE,
            oh = BAR_H + STROKE,
            label = escape_xml(&self.label),
            value = escape_xml(&self.value_text),
            unit = escape_xml(&self.unit),
        );

        svg
    }

    /// The SVG wrapped in a base64 `data:` URL, for hosts that take image URLs.
    pub fn to_data_url(&self) -> String {
        format!("data:image/svg+xml;base64,{}", STANDARD.encode(self.to_svg()))
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gauge(level: f64) -> Gauge {
        Gauge {
            label: "GPU usage".to_string(),
            value_text: "55".to_string(),
            unit: "%".to_string(),
            level,
        }
    }

    #[test]
    fn svg_contains_label_and_value() {
        let svg = gauge(0.55).to_svg();

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(">GPU usage</text>"));
        assert!(svg.contains(">55<tspan"));
        assert!(svg.contains(">%</tspan>"));
    }

    fn cutout_mask(svg: &str) -> &str {
        let start = svg.find(r#"<mask id="bar-cutout-remaining">"#).unwrap();
        let end = start + svg[start..].find("</mask>").unwrap();
        &svg[start..end]
    }

    #[test]
    fn cutout_shrinks_with_level() {
        let empty = gauge(0.0).to_svg();
        let full = gauge(1.0).to_svg();

        assert!(cutout_mask(&empty).contains(r#"width="40" height="55" fill="black""#));
        assert!(cutout_mask(&full).contains(r#"width="40" height="0" fill="black""#));
    }

    #[test]
    fn text_is_escaped() {
        let mut g = gauge(0.5);
        g.label = "R&D <temp>".to_string();

        let svg = g.to_svg();
        assert!(svg.contains("R&amp;D &lt;temp&gt;"));
        assert!(!svg.contains("<temp>"));
    }

    #[test]
    fn data_url_round_trips_the_svg() {
        let g = gauge(0.25);
        let url = g.to_data_url();

        let encoded = url.strip_prefix("data:image/svg+xml;base64,").unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), g.to_svg());
    }
}
