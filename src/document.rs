//! The JSON document a model is saved to.
//!
//! The document is standard JSON.
//! [`write_pretty`] lays it out with one object member per line,
//! indented by tabs, with the values of an object aligned
//! after the longest key; arrays stay on one line.
use serde::{Serialize, Deserialize};
use serde_json::Value;

use crate::Result;
use crate::weak_learner::NodeRecord;

use std::io::{Read, Write};


/// The saved form of an [`AdaBoost`](crate::AdaBoost) model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaBoostDocument {
    /// Always `"AdaBoost"`.
    pub name: String,
    /// Number of rounds of a training call.
    pub nb_rounds: usize,
    /// Number of features sampled per heuristic and round.
    pub nb_features_per_heuristic: usize,
    /// Maximal depth of the weak learners.
    pub max_depth: usize,
    /// Exponential loss after the last committed round.
    #[serde(default)]
    pub loss: f64,
    /// Training error after the last committed round.
    #[serde(default)]
    pub train_error: f64,
    /// Heuristics the reported features belong to.
    #[serde(default)]
    pub heuristics: Vec<usize>,
    /// The weak learners.
    pub weak_learners: Vec<WeakTreeDocument>,
    /// Weights of the weak learners.
    pub alphas: Vec<f64>,
    /// Dataset features the weak learners use.
    pub reported: Vec<usize>,
    /// Scores of the training samples, `n_samples x n_labels`.
    pub hypotheses: Vec<Vec<f64>>,
}


/// The saved form of a [`WeakTree`](crate::weak_learner::WeakTree).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeakTreeDocument {
    /// Always `"WeakTree"`.
    pub name: String,
    /// Maximal depth of the tree.
    pub max_depth: usize,
    /// Nodes, root first.
    pub nodes: Vec<NodeRecord>,
}


/// Writes `value` to `writer` in the pretty layout.
pub fn write_pretty<W: Write>(value: &Value, mut writer: W) -> Result<()> {
    let text = to_pretty_string(value);
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}


/// Returns `value` in the pretty layout.
pub fn to_pretty_string(value: &Value) -> String {
    let mut out = String::new();
    pretty(value, 0, &mut out);
    out
}


/// Parses a JSON document.
pub fn read<R: Read>(reader: R) -> Result<Value> {
    Ok(serde_json::from_reader(reader)?)
}


fn pretty(value: &Value, depth: usize, out: &mut String) {
    match value {
        Value::Object(members) => {
            out.push_str("{\n");
            let longest = members.keys()
                .map(|key| key.chars().count())
                .max()
                .unwrap_or(0);

            let n_member = members.len();
            for (i, (key, member)) in members.iter().enumerate() {
                push_tabs(depth + 1, out);
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                let pad = longest - key.chars().count() + 1;
                out.extend(std::iter::repeat(' ').take(pad));
                pretty(member, depth + 1, out);
                out.push_str(if i + 1 < n_member { ",\n" } else { "\n" });
            }
            push_tabs(depth, out);
            out.push('}');
        },
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                pretty(item, depth, out);
            }
            out.push(']');
        },
        scalar => out.push_str(&scalar.to_string()),
    }
}


#[inline]
fn push_tabs(depth: usize, out: &mut String) {
    out.extend(std::iter::repeat('\t').take(depth));
}
