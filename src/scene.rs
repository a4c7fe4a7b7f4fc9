use std::collections::BTreeMap;

use crate::models::{Issue, IssueKey, PriorityBand};

/// One map pin, described as data.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub key: IssueKey,
    pub coordinates: [f64; 2],
    pub band: PriorityBand,
    pub title: String,
    pub score: f64,
}

impl Marker {
    pub fn from_issue(issue: &Issue) -> Self {
        Self {
            key: issue.key.clone(),
            coordinates: issue.coordinates,
            band: issue.priority(),
            title: issue.title.clone(),
            score: issue.score,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapScene {
    markers: BTreeMap<IssueKey, Marker>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDiff {
    pub added: Vec<Marker>,
    pub removed: Vec<IssueKey>,
    pub updated: Vec<Marker>,
}

impl SceneDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

impl MapScene {
    /// Later issues win when two share a key.
    pub fn from_issues(issues: &[Issue]) -> Self {
        let markers = issues
            .iter()
            .map(|issue| (issue.key.clone(), Marker::from_issue(issue)))
            .collect();
        Self { markers }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    pub fn count_by_band(&self, band: PriorityBand) -> usize {
        self.markers().filter(|marker| marker.band == band).count()
    }

    /// South-west and north-east corners enclosing every marker.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut markers = self.markers();
        let first = markers.next()?.coordinates;
        let (mut south_west, mut north_east) = (first, first);
        for marker in markers {
            let [lat, lon] = marker.coordinates;
            south_west = [south_west[0].min(lat), south_west[1].min(lon)];
            north_east = [north_east[0].max(lat), north_east[1].max(lon)];
        }
        Some((south_west, north_east))
    }

    /// Changes needed to turn `self` into `next`.
    pub fn diff(&self, next: &MapScene) -> SceneDiff {
        let mut diff = SceneDiff::default();

        for (key, marker) in &next.markers {
            match self.markers.get(key) {
                None => diff.added.push(marker.clone()),
                Some(previous) if previous != marker => diff.updated.push(marker.clone()),
                Some(_) => {}
            }
        }

        diff.removed = self
            .markers
            .keys()
            .filter(|key| !next.markers.contains_key(*key))
            .cloned()
            .collect();

        diff
    }
}
