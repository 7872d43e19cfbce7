//! Drinking-water quality assessment for the history view.
//!
//! This is a coarser grading than the alert thresholds: each of pH,
//! turbidity and TDS is graded optimal, acceptable or critical, and the
//! worst grade decides the overall assessment. Temperature is not graded.

use std::fmt;

use serde::Serialize;

use aquawatch_types::Reading;

/// Grade of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    Optimal,
    Acceptable,
    Critical,
}

/// Overall quality of one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Assessment {
    Safe,
    Monitor,
    ActionRequired,
}

impl Assessment {
    /// Short explanation shown next to the assessment.
    pub fn message(&self) -> &'static str {
        match self {
            Assessment::Safe => "All water quality parameters are within optimal ranges.",
            Assessment::Monitor => {
                "Water quality is acceptable but should be monitored for changes."
            }
            Assessment::ActionRequired => {
                "Water quality parameters indicate potential health risks. Check filtration system."
            }
        }
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Assessment::Safe => "Safe",
            Assessment::Monitor => "Monitor",
            Assessment::ActionRequired => "Action Required",
        })
    }
}

/// Grade pH: optimal 6.5-8.5, acceptable 6.0-9.0.
pub fn grade_ph(ph: f64) -> Grade {
    if (6.5..=8.5).contains(&ph) {
        Grade::Optimal
    } else if (6.0..=9.0).contains(&ph) {
        Grade::Acceptable
    } else {
        Grade::Critical
    }
}

/// Grade turbidity: optimal below 1 NTU, acceptable below 5 NTU.
pub fn grade_turbidity(turbidity: f64) -> Grade {
    if turbidity < 1.0 {
        Grade::Optimal
    } else if turbidity < 5.0 {
        Grade::Acceptable
    } else {
        Grade::Critical
    }
}

/// Grade TDS: optimal 100-500 ppm, acceptable 50-1000 ppm.
pub fn grade_tds(tds: f64) -> Grade {
    if (100.0..=500.0).contains(&tds) {
        Grade::Optimal
    } else if (50.0..=1000.0).contains(&tds) {
        Grade::Acceptable
    } else {
        Grade::Critical
    }
}

/// Assess a reading from its worst graded parameter.
pub fn assess(reading: &Reading) -> Assessment {
    let worst = [
        grade_ph(reading.ph),
        grade_turbidity(reading.turbidity),
        grade_tds(reading.tds),
    ]
    .into_iter()
    .max()
    .unwrap_or(Grade::Optimal);

    match worst {
        Grade::Optimal => Assessment::Safe,
        Grade::Acceptable => Assessment::Monitor,
        Grade::Critical => Assessment::ActionRequired,
    }
}

/// Suggested actions for a reading. Never empty.
pub fn recommendations(reading: &Reading) -> Vec<&'static str> {
    let mut out = Vec::new();

    if reading.ph < 6.5 {
        out.push("Consider alkalinity adjustment to raise pH levels.");
    }
    if reading.ph > 8.5 {
        out.push("Adjust pH levels downward with appropriate treatment.");
    }

    if reading.turbidity >= 1.0 {
        out.push("Check filtration system for proper operation.");
    }
    if reading.turbidity >= 5.0 {
        out.push("Immediate filtration maintenance recommended.");
    }

    if reading.tds < 100.0 {
        out.push("Water might be too soft, consider mineral addition.");
    }
    if reading.tds > 500.0 {
        out.push("High mineral content detected, check water source and treatment system.");
    }
    if reading.tds > 1000.0 {
        out.push(
            "Critical: TDS levels indicate possible contamination or excessive mineral content.",
        );
    }

    if out.is_empty() {
        out.push("Water quality parameters are optimal. Continue regular monitoring.");
    }
    out
}

/// Gauge fill (0-100) for pH on the 0-14 scale.
pub fn ph_gauge(ph: f64) -> u16 {
    percent(ph / 14.0 * 100.0)
}

/// Gauge fill (0-100) for turbidity; clearer water fills more, 10 NTU is empty.
pub fn turbidity_gauge(turbidity: f64) -> u16 {
    percent(100.0 - turbidity / 10.0 * 100.0)
}

/// Gauge fill (0-100) for TDS on a 0-2000 ppm scale.
pub fn tds_gauge(tds: f64) -> u16 {
    percent(tds / 2000.0 * 100.0)
}

fn percent(v: f64) -> u16 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, 100.0).round() as u16
}
