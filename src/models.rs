use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::delta::Delta;
use crate::metrics::{MetricField, Plan};
use crate::operational::{AdChannel, IndicatorCard};

// API response DTOs (shared by services and api modules)

#[derive(Debug, Clone, Serialize)]
pub struct MonthList {
    pub months: Vec<String>,
    pub default_selection: Vec<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// One dashboard card: summed value for the selection plus its delta
#[derive(Debug, Clone, Serialize)]
pub struct MetricCard {
    pub field: MetricField,
    pub label: String,
    pub value: f64,
    pub display: String,
    pub previous: f64,
    pub delta: Delta,
    pub delta_display: String,
    /// A decrease is good news (differences against budget)
    pub inverse_delta: bool,
}

/// Value-only card, no comparison
#[derive(Debug, Clone, Serialize)]
pub struct TotalCard {
    pub field: MetricField,
    pub label: String,
    pub value: f64,
    pub display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccumulatedRevenue {
    pub actual: f64,
    pub budgeted: f64,
    pub actual_display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub plan: Plan,
    pub name: String,
    pub cards: Vec<MetricCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanShare {
    pub plan: Plan,
    pub name: String,
    pub value: f64,
    pub display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub loaded_at: Option<DateTime<Utc>>,
    pub selected_months: Vec<String>,
    pub previous_months: Vec<String>,
    pub accumulated: AccumulatedRevenue,
    pub revenue: Vec<MetricCard>,
    pub plans: Vec<PlanSummary>,
    pub revenue_distribution: Vec<PlanShare>,
    pub churn: Vec<TotalCard>,
    pub total_clients: Vec<TotalCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelSummary {
    pub channel: AdChannel,
    pub name: String,
    pub ctr: IndicatorCard,
    pub cpr: IndicatorCard,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationalSummary {
    pub loaded_at: Option<DateTime<Utc>>,
    pub channels: Vec<ChannelSummary>,
}
