//! Piecewise-linear curves defined by a small number of control nodes.
//!
//! Curves are used for the yearly savings rate and the monthly expense. The user places nodes at
//! particular years and the value for every other year is found by linear interpolation, holding
//! the first value before the first node and the last value after the last node.
use crate::input::{deserialise_lenient_integer, deserialise_lenient_number};
use serde::{Deserialize, Serialize};

/// A user-placed control point on a curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveNode {
    /// Year offset from the start of the projection
    #[serde(deserialize_with = "deserialise_lenient_integer")]
    pub year: u32,
    /// The value of the curve at this year
    #[serde(deserialize_with = "deserialise_lenient_number")]
    pub value: f64,
}

/// A set of control nodes, kept sorted by year with no two nodes sharing a year
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<CurveNode>", into = "Vec<CurveNode>")]
pub struct Curve {
    nodes: Vec<CurveNode>,
}

impl From<Vec<CurveNode>> for Curve {
    /// Build a curve from nodes in any order. If two nodes share a year, the later one wins.
    fn from(nodes: Vec<CurveNode>) -> Self {
        let mut curve = Curve::default();
        for node in nodes {
            curve.insert(node.year, node.value);
        }

        curve
    }
}

impl From<Curve> for Vec<CurveNode> {
    fn from(curve: Curve) -> Self {
        curve.nodes
    }
}

impl Curve {
    /// A flat curve with one node at year 0 and one at `horizon`
    pub fn flat(horizon: u32, value: f64) -> Self {
        vec![
            CurveNode { year: 0, value },
            CurveNode {
                year: horizon,
                value,
            },
        ]
        .into()
    }

    /// The control nodes, sorted by year
    pub fn nodes(&self) -> &[CurveNode] {
        &self.nodes
    }

    /// Whether the curve has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a node, overwriting any node at the same year. Returns the node's index.
    fn insert(&mut self, year: u32, value: f64) -> usize {
        match self.nodes.binary_search_by_key(&year, |node| node.year) {
            Ok(idx) => {
                self.nodes[idx].value = value;
                idx
            }
            Err(idx) => {
                self.nodes.insert(idx, CurveNode { year, value });
                idx
            }
        }
    }

    /// Set the value of the curve at `year`, then carry that value forward to every later node.
    ///
    /// This moves the whole plateau after the edited point, so later years never jump back to an
    /// old value.
    pub fn set_node(&mut self, year: u32, value: f64) {
        let idx = self.insert(year, value);
        for node in &mut self.nodes[idx + 1..] {
            node.value = value;
        }
    }

    /// Make sure the curve ends exactly at `horizon`.
    ///
    /// If the curve is empty or its last node is at a different year, it is replaced with a flat
    /// curve. The value of the flat curve is taken from the first node, or `fallback` if there
    /// are none.
    pub fn fit_to_horizon(&mut self, horizon: u32, fallback: f64) {
        if self.nodes.last().is_some_and(|node| node.year == horizon) {
            return;
        }

        let base = self.nodes.first().map_or(fallback, |node| node.value);
        *self = Curve::flat(horizon, base);
    }

    /// Evaluate the curve for every year from 0 to `horizon` inclusive
    pub fn evaluate(&self, horizon: u32, fallback: f64) -> Vec<f64> {
        evaluate(&self.nodes, horizon, fallback)
    }
}

/// Evaluate a piecewise-linear curve for every year from 0 to `horizon` inclusive.
///
/// # Arguments
///
/// * `nodes` - Control nodes, sorted by year with unique years
/// * `horizon` - The last year to evaluate
/// * `fallback` - The value used when there are no nodes at all
///
/// # Returns
///
/// A `Vec` of length `horizon + 1`.
pub fn evaluate(nodes: &[CurveNode], horizon: u32, fallback: f64) -> Vec<f64> {
    (0..=horizon)
        .map(|year| {
            // Index of the first node with node.year > year
            let after = nodes.partition_point(|node| node.year <= year);
            let left = after.checked_sub(1).map(|idx| &nodes[idx]);
            let right = if left.is_some_and(|node| node.year == year) {
                left
            } else {
                nodes.get(after).or(left)
            };

            match (left, right) {
                (None, None) => fallback,
                (None, Some(right)) => right.value,
                (Some(left), None) => left.value,
                (Some(left), Some(right)) if left.year == right.year => left.value,
                (Some(left), Some(right)) => {
                    let t = f64::from(year - left.year) / f64::from(right.year - left.year);
                    left.value + t * (right.value - left.value)
                }
            }
        })
        .collect()
}
