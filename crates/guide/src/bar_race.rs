//! Ranking time series for the bar-chart-race overlay.

use std::collections::BTreeSet;

use foundation::math::stable_total_cmp_f64;
use serde::{Deserialize, Serialize};

use crate::error::GuideError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceEntry {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceFrame {
    pub period: String,
    pub entries: Vec<RaceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceDataset {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub frames: Vec<RaceFrame>,
}

impl RaceDataset {
    /// Parses the JSON object embedded in a model reply.
    ///
    /// Anything before the first `{` and after the last `}` is ignored, which
    /// covers Markdown code fences and a sentence of preamble.
    pub fn from_model_output(text: &str) -> Result<Self, GuideError> {
        let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
            return Err(GuideError::InvalidDataset(
                "no JSON object in model output".to_string(),
            ));
        };
        if end < start {
            return Err(GuideError::InvalidDataset(
                "no JSON object in model output".to_string(),
            ));
        }
        let dataset: RaceDataset = serde_json::from_str(&text[start..=end])
            .map_err(|e| GuideError::InvalidDataset(e.to_string()))?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn validate(&self) -> Result<(), GuideError> {
        if self.frames.is_empty() {
            return Err(GuideError::InvalidDataset("dataset has no frames".to_string()));
        }
        for frame in &self.frames {
            let mut seen = BTreeSet::new();
            for entry in &frame.entries {
                if entry.label.trim().is_empty() {
                    return Err(GuideError::InvalidDataset(format!(
                        "empty label in period {}",
                        frame.period
                    )));
                }
                if !entry.value.is_finite() || entry.value < 0.0 {
                    return Err(GuideError::InvalidDataset(format!(
                        "{} has invalid value {} in period {}",
                        entry.label, entry.value, frame.period
                    )));
                }
                if !seen.insert(entry.label.as_str()) {
                    return Err(GuideError::InvalidDataset(format!(
                        "duplicate label {} in period {}",
                        entry.label, frame.period
                    )));
                }
            }
        }
        Ok(())
    }

    /// Top `top_n` entries of one frame, largest first. Empty for an unknown frame.
    pub fn ranked(&self, frame: usize, top_n: usize) -> Vec<RaceEntry> {
        let Some(frame) = self.frames.get(frame) else {
            return Vec::new();
        };
        let mut entries = frame.entries.clone();
        sort_ranked(&mut entries);
        entries.truncate(top_n);
        entries
    }

    /// Animation frame at continuous time `t`, clamped to `[0, frames - 1]`.
    ///
    /// Values move linearly between neighbouring frames; a label absent from
    /// one side counts as zero there. The period is the one of the frame at or
    /// before `t`.
    pub fn interpolate(&self, t: f64) -> RaceFrame {
        let Some(last_index) = self.frames.len().checked_sub(1) else {
            return RaceFrame {
                period: String::new(),
                entries: Vec::new(),
            };
        };
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, last_index as f64) };
        let lo = t.floor() as usize;
        let hi = (lo + 1).min(last_index);
        let frac = t - lo as f64;
        let (a, b) = (&self.frames[lo], &self.frames[hi]);

        let mut labels: Vec<&str> = Vec::new();
        for entry in a.entries.iter().chain(&b.entries) {
            if !labels.contains(&entry.label.as_str()) {
                labels.push(&entry.label);
            }
        }

        let mut entries: Vec<RaceEntry> = labels
            .into_iter()
            .map(|label| {
                let from = value_of(a, label);
                let to = value_of(b, label);
                RaceEntry {
                    label: label.to_string(),
                    value: from + (to - from) * frac,
                }
            })
            .collect();
        sort_ranked(&mut entries);

        RaceFrame {
            period: a.period.clone(),
            entries,
        }
    }
}

fn value_of(frame: &RaceFrame, label: &str) -> f64 {
    frame
        .entries
        .iter()
        .find(|e| e.label == label)
        .map_or(0.0, |e| e.value)
}

fn sort_ranked(entries: &mut [RaceEntry]) {
    entries.sort_by(|a, b| stable_total_cmp_f64(b.value, a.value).then_with(|| a.label.cmp(&b.label)));
}
