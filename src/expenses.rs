//! Expense Coordinator
//!
//! Dashboard data: the chart collection (refresh + LLM chart generation)
//! and the list of recorded expenses.

use std::sync::Arc;

use crate::backend::Backend;
use crate::models::{ExpenseChart, ExpenseItem};
use crate::resource::{RequestState, ResourceFetcher};

const CHARTS_FAILED: &str = "Failed to fetch expense charts";
const EXPENSES_FAILED: &str = "Failed to fetch expenses";
const GENERATE_FAILED: &str = "Failed to generate chart";

/// Charts and expenses for the dashboard
pub struct ExpenseCoordinator {
    backend: Arc<dyn Backend>,
    charts: ResourceFetcher<ExpenseChart>,
    expenses: ResourceFetcher<ExpenseItem>,
}

impl ExpenseCoordinator {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            charts: ResourceFetcher::new("expense_charts", CHARTS_FAILED),
            expenses: ResourceFetcher::new("expenses", EXPENSES_FAILED),
        }
    }

    /// Chart collection state
    pub fn charts(&self) -> RequestState<Vec<ExpenseChart>> {
        self.charts.snapshot()
    }

    /// Expense list state
    pub fn expenses(&self) -> RequestState<Vec<ExpenseItem>> {
        self.expenses.snapshot()
    }

    /// Reload all charts, replacing the current ones
    pub async fn refresh_charts(&self) -> Result<(), String> {
        self.charts.refresh(self.backend.list_charts()).await
    }

    /// Reload the expense list
    pub async fn refresh_expenses(&self) -> Result<(), String> {
        self.expenses.refresh(self.backend.list_expenses()).await
    }

    /// Ask the backend to build a chart from a natural-language prompt
    ///
    /// The new chart is appended to the collection. Blank prompts do nothing.
    pub async fn generate_chart(&self, prompt: &str) -> Option<ExpenseChart> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return None;
        }

        tracing::debug!(prompt = %prompt, "Generating chart");
        self.charts
            .append(self.backend.generate_chart(prompt), GENERATE_FAILED)
            .await
            .ok()
    }

    /// Dismiss chart and expense errors
    pub fn clear_error(&self) {
        self.charts.clear_error();
        self.expenses.clear_error();
    }
}
