//! Keyed data join between records and rendered point elements.
//!
//! Every record is drawn as a marker plus a name label. Elements are keyed by
//! the record's rank: a record whose rank was already rendered reuses its
//! element (update), a new rank creates one (enter), and ranks that disappear
//! from the data are dropped (exit).

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::config::ChartConfig;
use crate::scale::{color_of, ColorToken, Scales};
use crate::{ChartError, Record};

pub type ElementId = u64;

/// Outcome of reconciling a new key set against the rendered one. The three
/// groups are disjoint; `enter` and `update` follow input order, `exit`
/// follows key order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinPlan<K> {
    pub enter: Vec<K>,
    pub update: Vec<K>,
    pub exit: Vec<K>,
}

impl<K> JoinPlan<K> {
    /// True when nothing was created or removed.
    pub fn is_stable(&self) -> bool {
        self.enter.is_empty() && self.exit.is_empty()
    }
}

pub fn reconcile<K, V, I>(previous: &BTreeMap<K, V>, next: I) -> JoinPlan<K>
where
    K: Ord + Clone,
    I: IntoIterator<Item = K>,
{
    let mut seen = BTreeSet::new();
    let mut enter = Vec::new();
    let mut update = Vec::new();
    for key in next {
        if !seen.insert(key.clone()) {
            continue;
        }
        if previous.contains_key(&key) {
            update.push(key);
        } else {
            enter.push(key);
        }
    }
    let exit = previous
        .keys()
        .filter(|key| !seen.contains(*key))
        .cloned()
        .collect();
    JoinPlan {
        enter,
        update,
        exit,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointStyle {
    pub radius: f64,
    /// Label displacement from the marker center.
    pub label_offset: (f64, f64),
}

impl PointStyle {
    pub fn from_config(config: &ChartConfig) -> Self {
        Self {
            radius: config.marker_radius,
            label_offset: config.label_offset,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
    pub fill: ColorToken,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub fill: ColorToken,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEvent {
    Over,
    Out,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointElement {
    pub id: ElementId,
    pub rank: u32,
    pub marker: Marker,
    pub label: Label,
    pub record: Record,
    listeners: Vec<PointerEvent>,
}

impl PointElement {
    fn enter(
        id: ElementId,
        record: &Record,
        leader_seconds: f64,
        scales: &Scales,
        style: &PointStyle,
    ) -> Self {
        let (marker, label) = encode(record, leader_seconds, scales, style);
        Self {
            id,
            rank: record.rank,
            marker,
            label,
            record: record.clone(),
            listeners: vec![PointerEvent::Over, PointerEvent::Out],
        }
    }

    fn apply(&mut self, record: &Record, leader_seconds: f64, scales: &Scales, style: &PointStyle) {
        let (marker, label) = encode(record, leader_seconds, scales, style);
        self.marker = marker;
        self.label = label;
        self.record = record.clone();
    }

    pub fn listens_to(&self, event: PointerEvent) -> bool {
        self.listeners.contains(&event)
    }

    /// Top of the marker, where the tooltip attaches.
    pub fn north(&self) -> (f64, f64) {
        (self.marker.cx, self.marker.cy - self.marker.r)
    }
}

fn encode(
    record: &Record,
    leader_seconds: f64,
    scales: &Scales,
    style: &PointStyle,
) -> (Marker, Label) {
    let fill = color_of(record.has_allegation());
    let cx = scales.x.map(record.seconds_behind_leader - leader_seconds);
    let cy = scales.y.map(record.rank as f64);
    let marker = Marker {
        cx,
        cy,
        r: style.radius,
        fill,
    };
    let label = Label {
        x: cx + style.label_offset.0,
        y: cy + style.label_offset.1,
        text: record.name.clone(),
        fill,
    };
    (marker, label)
}

/// Rendered point elements keyed by rank.
#[derive(Clone, Debug, Default)]
pub struct PointLayer {
    elements: BTreeMap<u32, PointElement>,
    next_id: ElementId,
}

impl PointLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, rank: u32) -> Option<&PointElement> {
        self.elements.get(&rank)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PointElement> {
        self.elements.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.elements.keys().copied()
    }

    /// Bind `records` to elements. Markers are placed relative to the first
    /// record's seconds, whatever its rank. When two records share a rank the
    /// later one wins.
    pub fn bind(
        &mut self,
        records: &[Record],
        scales: &Scales,
        style: &PointStyle,
    ) -> Result<JoinPlan<u32>, ChartError> {
        let leader_seconds = records
            .first()
            .ok_or(ChartError::EmptyDataset)?
            .seconds_behind_leader;
        if records
            .iter()
            .any(|r| r.seconds_behind_leader < leader_seconds)
        {
            debug!(
                leader_seconds,
                "first record is not the fastest; markers left of the leader will extrapolate"
            );
        }

        let plan = reconcile(&self.elements, records.iter().map(|r| r.rank));

        for rank in &plan.exit {
            self.elements.remove(rank);
        }

        let mut latest: BTreeMap<u32, &Record> = BTreeMap::new();
        for record in records {
            latest.insert(record.rank, record);
        }

        for rank in &plan.enter {
            if let Some(record) = latest.get(rank) {
                let id = self.next_id;
                self.next_id += 1;
                let element = PointElement::enter(id, record, leader_seconds, scales, style);
                self.elements.insert(*rank, element);
            }
        }
        for rank in &plan.update {
            if let (Some(element), Some(record)) = (self.elements.get_mut(rank), latest.get(rank)) {
                element.apply(record, leader_seconds, scales, style);
            }
        }

        debug!(
            entered = plan.enter.len(),
            updated = plan.update.len(),
            exited = plan.exit.len(),
            "bound points"
        );
        Ok(plan)
    }
}
