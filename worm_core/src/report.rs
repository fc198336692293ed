//! # Fatigue Summary
//!
//! A human-readable digest of a [`CycleResult`]: one key/value table per
//! member and a short text report of damage, safety factors and the
//! geometry they were computed for.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calculations::cycle::peak;
use crate::calculations::CycleResult;

/// One labelled row of a summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: String,
    pub value: String,
}

impl SummaryRow {
    fn new(label: &str, value: String) -> Self {
        SummaryRow {
            label: label.to_string(),
            value,
        }
    }
}

/// Tabular and textual summary of one computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueSummary {
    pub worm: Vec<SummaryRow>,
    pub wheel: Vec<SummaryRow>,
    pub damage_root: f64,
    pub sf_root: Option<f64>,
    pub sf_contact: Option<f64>,
    /// D < 1. Advisory; nothing is rejected on it.
    pub life_target_met: bool,
    pub generated: DateTime<Utc>,
    lines: Vec<String>,
}

fn or_dash(value: Option<f64>, render: impl Fn(f64) -> String) -> String {
    value.map_or_else(|| "-".to_string(), render)
}

impl FatigueSummary {
    pub fn from_result(result: &CycleResult) -> Self {
        let m = &result.meta;
        let sigma_peak = peak(&result.sigma_root_mpa).unwrap_or(0.0);
        let p_peak = peak(&result.p_contact_mpa).unwrap_or(0.0);

        let worm = vec![
            SummaryRow::new("Threads z1", format!("{}", m.z1)),
            SummaryRow::new("Pitch diameter d1", format!("{:.2} mm", m.d1_mm)),
            SummaryRow::new("Profile shift x1", format!("{:.3}", m.x1)),
            SummaryRow::new("Lead angle γ", format!("{:.2} deg", m.gamma_deg)),
            SummaryRow::new("Efficiency η0", format!("{:.3}", m.eta0)),
            SummaryRow::new("Peak root stress", format!("{:.2} MPa", sigma_peak)),
            SummaryRow::new("Root safety factor", or_dash(m.SF_root, |v| format!("{:.2}", v))),
        ];
        let wheel = vec![
            SummaryRow::new("Teeth z2", format!("{}", m.z2)),
            SummaryRow::new("Pitch diameter d2", format!("{:.2} mm", m.d2_mm)),
            SummaryRow::new("Profile shift x2", format!("{:.3}", m.x2)),
            SummaryRow::new("Centre distance a", format!("{:.2} mm", m.a_mm)),
            SummaryRow::new("Peak contact stress", format!("{:.2} MPa", p_peak)),
            SummaryRow::new("Contact safety factor", or_dash(m.SF_contact, |v| format!("{:.2}", v))),
            SummaryRow::new(
                "Centre distance deviation Δa",
                or_dash(m.delta_a_mm, |v| format!("{:.2} mm", v)),
            ),
        ];

        let mut lines = vec![
            "[Miner damage, root stress proxy]".to_string(),
            format!(
                "- Cumulative damage D ≈ {:.3e} (D < 1 reads as life target met)",
                m.damage_root
            ),
        ];
        lines.push(match m.SF_root {
            Some(sf) => format!("- Root safety factor SF_root (peak vs S-N) ≈ {:.2}", sf),
            None => "- Root safety factor: no wheel root S-N data supplied".to_string(),
        });
        lines.push(match m.SF_contact {
            Some(sf) => format!("- Contact safety factor SF_contact (peak vs S-N) ≈ {:.2}", sf),
            None => "- Contact safety factor: no wheel contact S-N data supplied".to_string(),
        });
        lines.push(String::new());
        lines.push("[Geometry and material]".to_string());
        lines.push(format!("- z2 = {}", m.z2));
        lines.push(format!(
            "- d1 ≈ {:.2} mm, d2 ≈ {:.2} mm, a ≈ {:.2} mm",
            m.d1_mm, m.d2_mm, m.a_mm
        ));
        if let (Some(target), Some(delta)) = (m.a_target_mm, m.delta_a_mm) {
            lines.push(format!(
                "- Target centre distance ≈ {:.2} mm, deviation Δa ≈ {:.2} mm",
                target, delta
            ));
        }
        lines.push(format!("- Profile shifts x1 = {:.3}, x2 = {:.3}", m.x1, m.x2));
        lines.push(format!("- Lead angle γ ≈ {:.2} deg", m.gamma_deg));
        lines.push(format!("- E' ≈ {:.2} GPa", m.Eprime_GPa));
        lines.push(format!("- Nominal efficiency η0 ≈ {:.3}", m.eta0));
        lines.push(format!(
            "- Load factors KA = {:.3}, KV = {:.3}, KHβ = {:.3}, KFβ = {:.3}",
            m.KA, m.KV, m.KHb, m.KFb
        ));

        FatigueSummary {
            worm,
            wheel,
            damage_root: m.damage_root,
            sf_root: m.SF_root,
            sf_contact: m.SF_contact,
            life_target_met: m.damage_root < 1.0,
            generated: Utc::now(),
            lines,
        }
    }

    /// The text report, one finding per line
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Both tables followed by the text report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let width = self
            .worm
            .iter()
            .chain(&self.wheel)
            .map(|r| r.label.chars().count())
            .max()
            .unwrap_or(0);

        for (title, rows) in [("Worm", &self.worm), ("Wheel", &self.wheel)] {
            let _ = writeln!(out, "{}", title);
            for row in rows {
                let pad = width - row.label.chars().count();
                let _ = writeln!(out, "  {}{}  {}", row.label, " ".repeat(pad), row.value);
            }
            out.push('\n');
        }

        for line in &self.lines {
            let _ = writeln!(out, "{}", line);
        }
        let _ = writeln!(
            out,
            "\nGenerated {}",
            self.generated.format("%Y-%m-%d %H:%M:%S UTC")
        );
        out
    }
}
