//! Expense analytics types

use serde::{Deserialize, Serialize};

/// How a chart should be drawn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Bar,
    Line,
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartKind::Pie => write!(f, "pie"),
            ChartKind::Bar => write!(f, "bar"),
            ChartKind::Line => write!(f, "line"),
        }
    }
}

/// Time granularity a chart covers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChartPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl std::fmt::Display for ChartPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartPeriod::Daily => write!(f, "daily"),
            ChartPeriod::Weekly => write!(f, "weekly"),
            ChartPeriod::Monthly => write!(f, "monthly"),
            ChartPeriod::Yearly => write!(f, "yearly"),
        }
    }
}

/// One labelled value of a chart series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartDatum {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ChartDatum {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            color: None,
        }
    }

    /// Builder method: set the display color
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// A chart of expenses, immutable once fetched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseChart {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub title: String,
    pub period: ChartPeriod,
    pub data: Vec<ChartDatum>,
}

impl ExpenseChart {
    /// Sum of all values in the series
    pub fn total(&self) -> f64 {
        self.data.iter().map(|d| d.value).sum()
    }
}

/// A single recorded expense
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseItem {
    pub id: String,
    pub category: String,
    pub amount: f64,
    /// Calendar date as sent by the API (`YYYY-MM-DD`)
    pub date: String,
    pub description: String,
}
