//! Core of the "Doping in Professional Bicycle Racing" scatter plot.
//!
//! The crate is backend neutral: it turns the cyclist dataset into scales,
//! axis ticks, a legend, keyed point elements and a tooltip overlay, and
//! exposes the result as a [`Scene`] that a drawing backend (plotters in the
//! CLI, inline SVG in the web front end) paints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod axis;
pub mod chart;
pub mod config;
pub mod join;
pub mod legend;
pub mod scale;
pub mod tooltip;

pub use axis::{
    format_minutes_seconds, format_minutes_seconds_with, Axis, AxisOrient, SecondsPadding, Tick,
    TickFormat, TickSpec,
};
pub use chart::{Chart, Primitive, Scene, ScenePoint, TextAnchor};
pub use config::{ChartConfig, Margins};
pub use join::{
    reconcile, ElementId, JoinPlan, Label, Marker, PointElement, PointLayer, PointStyle, PointerEvent,
};
pub use legend::{Legend, LegendRow};
pub use scale::{color_of, ColorToken, LinearScale, Scales};
pub use tooltip::{Tooltip, TooltipBox, TooltipLine, TooltipState};

/// Source of the reference dataset.
pub const DATA_URL: &str =
    "https://raw.githubusercontent.com/FreeCodeCamp/ProjectReferenceData/master/cyclist-data.json";

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("failed to parse dataset: {0}")]
    Parse(String),
    #[error("dataset is empty; the leader anchor needs at least one record")]
    EmptyDataset,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// One rider result as published in the cyclist dataset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Record {
    #[serde(rename = "Place")]
    pub rank: u32,
    #[serde(rename = "Seconds")]
    pub seconds_behind_leader: f64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Nationality")]
    pub nationality: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Time")]
    pub time_display: String,
    #[serde(rename = "Doping")]
    pub doping_allegation: String,
    #[serde(rename = "URL", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Record {
    pub fn has_allegation(&self) -> bool {
        !self.doping_allegation.is_empty()
    }

    pub fn place_display(&self) -> String {
        self.rank.to_string()
    }
}

/// Parse the JSON array served at [`DATA_URL`].
pub fn parse_records(input: &[u8]) -> Result<Vec<Record>, ChartError> {
    serde_json::from_slice(input).map_err(|e| ChartError::Parse(e.to_string()))
}

/// Quick facts about a loaded dataset, reported by `inspect`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DatasetSummary {
    pub records: usize,
    pub with_allegations: usize,
    pub leader_seconds: f64,
    pub min_seconds: f64,
    pub first_is_fastest: bool,
    pub rank_range: (u32, u32),
    pub year_range: (i32, i32),
    pub duplicate_ranks: Vec<u32>,
}

pub fn summarize(records: &[Record]) -> Result<DatasetSummary, ChartError> {
    let first = records.first().ok_or(ChartError::EmptyDataset)?;
    let min_seconds = records
        .iter()
        .map(|r| r.seconds_behind_leader)
        .fold(f64::INFINITY, f64::min);

    let mut ranks: Vec<u32> = records.iter().map(|r| r.rank).collect();
    ranks.sort_unstable();
    let mut duplicate_ranks: Vec<u32> = ranks
        .windows(2)
        .filter(|w| w[0] == w[1])
        .map(|w| w[0])
        .collect();
    duplicate_ranks.dedup();

    let years = records.iter().map(|r| r.year);
    let year_range = (
        years.clone().min().unwrap_or(first.year),
        years.max().unwrap_or(first.year),
    );

    Ok(DatasetSummary {
        records: records.len(),
        with_allegations: records.iter().filter(|r| r.has_allegation()).count(),
        leader_seconds: first.seconds_behind_leader,
        min_seconds,
        first_is_fastest: first.seconds_behind_leader <= min_seconds,
        rank_range: (ranks[0], ranks[ranks.len() - 1]),
        year_range,
        duplicate_ranks,
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "Time": "36:50",
            "Place": 1,
            "Seconds": 2210,
            "Name": "Marco Pantani",
            "Year": 1995,
            "Nationality": "ITA",
            "Doping": "Alleged drug use during 1995 due to high hermatocrit levels",
            "URL": "https://en.wikipedia.org/wiki/Marco_Pantani#Alleged_drug_use"
        },
        {
            "Time": "37:15",
            "Place": 3,
            "Seconds": 2235,
            "Name": "Bjarne Riis",
            "Year": 1996,
            "Nationality": "DEN",
            "Doping": ""
        }
    ]"#;

    #[test]
    fn parses_wire_field_names() {
        let records = parse_records(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rank, 1);
        assert_eq!(records[0].seconds_behind_leader, 2210.0);
        assert_eq!(records[0].name, "Marco Pantani");
        assert!(records[0].has_allegation());
        assert_eq!(records[1].nationality, "DEN");
        assert!(!records[1].has_allegation());
        assert_eq!(records[1].url, None);
        assert_eq!(records[1].place_display(), "3");
    }

    #[test]
    fn rejects_records_missing_fields() {
        let err = parse_records(br#"[{"Place": 1, "Name": "x"}]"#).unwrap_err();
        assert!(matches!(err, ChartError::Parse(_)));

        // A rider without a Doping field must not be drawn as clean.
        let err = parse_records(
            br#"[{"Time":"36:50","Place":1,"Seconds":2210,"Name":"x","Year":1995,"Nationality":"ITA"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::Parse(msg) if msg.contains("Doping")));
    }

    #[test]
    fn summary_flags_unsorted_leader() {
        let records = vec![
            testdata::record(2, 2250.0, "suspended"),
            testdata::record(1, 2210.0, ""),
            testdata::record(2, 2260.0, ""),
        ];
        let summary = summarize(&records).unwrap();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.with_allegations, 1);
        assert_eq!(summary.leader_seconds, 2250.0);
        assert_eq!(summary.min_seconds, 2210.0);
        assert!(!summary.first_is_fastest);
        assert_eq!(summary.rank_range, (1, 2));
        assert_eq!(summary.duplicate_ranks, vec![2]);
    }

    #[test]
    fn summary_of_empty_dataset_fails() {
        assert!(matches!(summarize(&[]), Err(ChartError::EmptyDataset)));
    }
}
