use tabled::{settings::Style, Table, Tabled};

use crate::storage::FeatureStats;
use crate::types::Keypoint;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct KeypointRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "x")]
    x: String,
    #[tabled(rename = "y")]
    y: String,
    #[tabled(rename = "size")]
    size: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &FeatureStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Images", &stats.images.to_string());
    builder.add_row("Keypoints", &stats.keypoints.to_string());
    builder.add_row("Max keypoints / image", &stats.max_keypoints.to_string());
    builder.add_row("Descriptors", &stats.descriptors.to_string());
    builder.add_row("Max descriptors / image", &stats.max_descriptors.to_string());
    builder.build()
}

pub fn keypoint_table(keypoints: &[Keypoint]) -> String {
    if keypoints.is_empty() {
        return String::new();
    }

    let rows: Vec<KeypointRow> = keypoints
        .iter()
        .enumerate()
        .map(|(index, kp)| KeypointRow {
            index,
            x: format!("{:.2}", kp.x),
            y: format!("{:.2}", kp.y),
            size: format!("{:.1}", kp.size),
        })
        .collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}
