use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::cache::TtlCache;
use crate::delta::DeltaFlavor;
use crate::formatting::{format_clients, format_currency};
use crate::metrics::{MetricField, MetricTable, Plan};
use crate::models::{
    AccumulatedRevenue, ChannelSummary, DashboardSummary, MetricCard, MonthList,
    OperationalSummary, PlanShare, PlanSummary, TotalCard,
};
use crate::month::MonthVocabulary;
use crate::operational::{AdChannel, OperationalSnapshot};
use crate::period::{PeriodAggregate, PeriodAggregator};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DashboardError {
    #[error("No dashboard data available")]
    NoData,
    #[error("No month selected")]
    NoSelection,
}

#[derive(Clone)]
pub struct DashboardService {
    table_cache: Arc<TtlCache<MetricTable>>,
    operational_cache: Arc<TtlCache<OperationalSnapshot>>,
    vocab: Arc<MonthVocabulary>,
}

impl DashboardService {
    pub fn new(
        table_cache: Arc<TtlCache<MetricTable>>,
        operational_cache: Arc<TtlCache<OperationalSnapshot>>,
        vocab: MonthVocabulary,
    ) -> Self {
        Self {
            table_cache,
            operational_cache,
            vocab: Arc::new(vocab),
        }
    }

    /// Known months, oldest first, with the latest month as default selection
    pub async fn months(&self) -> MonthList {
        let table = self.table_cache.get_or_refresh().await;
        let aggregator = PeriodAggregator::new(&table, &self.vocab);

        MonthList {
            months: aggregator.ordering().to_vec(),
            default_selection: aggregator
                .latest_month()
                .map(|m| vec![m.to_string()])
                .unwrap_or_default(),
            loaded_at: self.table_cache.loaded_at().await,
        }
    }

    /// Build every dashboard card for a selection.
    ///
    /// `None` selects the latest month; an explicit empty selection is an error.
    #[instrument(skip(self))]
    pub async fn summary(
        &self,
        selection: Option<Vec<String>>,
    ) -> Result<DashboardSummary, DashboardError> {
        let table = self.table_cache.get_or_refresh().await;
        if table.is_empty() {
            return Err(DashboardError::NoData);
        }

        let aggregator = PeriodAggregator::new(&table, &self.vocab);
        let selection = match selection {
            Some(months) => months,
            None => aggregator
                .latest_month()
                .map(|m| vec![m.to_string()])
                .unwrap_or_default(),
        };
        if selection.is_empty() {
            return Err(DashboardError::NoSelection);
        }

        let aggregate = aggregator.aggregate(selection.as_slice());
        debug!(
            "Aggregated {} selected and {} previous months",
            aggregate.current_months.len(),
            aggregate.previous_months.len()
        );

        let accumulated_actual = table.total(MetricField::RevenueActual);
        let summary = DashboardSummary {
            loaded_at: self.table_cache.loaded_at().await,
            accumulated: AccumulatedRevenue {
                actual: accumulated_actual,
                budgeted: table.total(MetricField::RevenueBudgeted),
                actual_display: format_currency(accumulated_actual),
            },
            revenue: vec![
                card(&aggregate, MetricField::RevenueBudgeted, "Orçado", DeltaFlavor::Currency),
                card(&aggregate, MetricField::RevenueActual, "Realizado", DeltaFlavor::Currency),
                card(&aggregate, MetricField::RevenueDifference, "Diferença", DeltaFlavor::Currency),
            ],
            plans: Plan::ALL
                .into_iter()
                .map(|plan| plan_summary(&aggregate, plan))
                .collect(),
            revenue_distribution: Plan::ALL
                .into_iter()
                .map(|plan| {
                    let value = aggregate.current(plan.revenue_field());
                    PlanShare {
                        plan,
                        name: plan.display_name().to_string(),
                        value,
                        display: format_currency(value),
                    }
                })
                .collect(),
            churn: vec![
                total_card(&aggregate, MetricField::ChurnBudgeted, "Churn Orçado"),
                total_card(&aggregate, MetricField::ChurnActual, "Churn Realizado"),
                total_card(&aggregate, MetricField::ChurnDifference, "Churn Diferença"),
            ],
            total_clients: vec![
                total_card(&aggregate, MetricField::TotalClientsBudgeted, "Clientes Orçados"),
                total_card(&aggregate, MetricField::TotalClientsActual, "Clientes Realizados"),
            ],
            selected_months: aggregate.current_months,
            previous_months: aggregate.previous_months,
        };

        info!(
            "Built dashboard for {:?}: realized revenue {}",
            summary.selected_months,
            summary.revenue[1].display
        );
        Ok(summary)
    }

    pub async fn operational(&self) -> OperationalSummary {
        let snapshot = self.operational_cache.get_or_refresh().await;

        let channels = [AdChannel::Google, AdChannel::Meta]
            .into_iter()
            .map(|channel| {
                let indicators = snapshot.channel(channel);
                ChannelSummary {
                    channel,
                    name: channel.display_name().to_string(),
                    ctr: indicators.ctr_card(),
                    cpr: indicators.cpr_card(),
                }
            })
            .collect();

        OperationalSummary {
            loaded_at: self.operational_cache.loaded_at().await,
            channels,
        }
    }

    /// Drop cached sheets so the next request refetches them
    pub async fn refresh(&self) {
        info!("Invalidating cached sheets");
        self.table_cache.invalidate().await;
        self.operational_cache.invalidate().await;
    }
}

fn card(aggregate: &PeriodAggregate, field: MetricField, label: &str, flavor: DeltaFlavor) -> MetricCard {
    let value = aggregate.current(field);
    let delta = aggregate.delta(field);
    MetricCard {
        field,
        label: label.to_string(),
        value,
        display: match flavor {
            DeltaFlavor::Currency => format_currency(value),
            DeltaFlavor::Count => format_clients(value),
        },
        previous: aggregate.previous(field),
        delta_display: delta.format(flavor),
        delta,
        inverse_delta: is_difference(field),
    }
}

fn total_card(aggregate: &PeriodAggregate, field: MetricField, label: &str) -> TotalCard {
    let value = aggregate.current(field);
    TotalCard {
        field,
        label: label.to_string(),
        value,
        display: format_clients(value),
    }
}

fn plan_summary(aggregate: &PeriodAggregate, plan: Plan) -> PlanSummary {
    let (budgeted, actual, difference) = plan.client_fields();
    PlanSummary {
        plan,
        name: plan.display_name().to_string(),
        cards: vec![
            card(aggregate, budgeted, "Orçado", DeltaFlavor::Count),
            card(aggregate, actual, "Realizado", DeltaFlavor::Count),
            card(aggregate, difference, "Diferença", DeltaFlavor::Count),
        ],
    }
}

fn is_difference(field: MetricField) -> bool {
    matches!(
        field,
        MetricField::RevenueDifference
            | MetricField::EssencialDifference
            | MetricField::ControleDifference
            | MetricField::AvancadoDifference
            | MetricField::ChurnDifference
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DataSource;
    use crate::fetch_error::FetchError;
    use crate::metrics::MetricRow;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::time::Duration;

    struct FixedSource<T>(T);

    impl<T: Clone + Send + Sync> DataSource<T> for FixedSource<T> {
        fn name(&self) -> String {
            "fixed".to_string()
        }

        fn fetch(&self) -> BoxFuture<'_, Result<T, FetchError>> {
            let value = self.0.clone();
            async move { Ok(value) }.boxed()
        }
    }

    fn service(table: MetricTable) -> DashboardService {
        let ttl = Duration::from_secs(600);
        let tables: Arc<dyn DataSource<MetricTable>> = Arc::new(FixedSource(table));
        let snapshots: Arc<dyn DataSource<OperationalSnapshot>> =
            Arc::new(FixedSource(OperationalSnapshot::default()));
        DashboardService::new(
            Arc::new(TtlCache::new(tables, ttl)),
            Arc::new(TtlCache::new(snapshots, ttl)),
            MonthVocabulary::default(),
        )
    }

    fn table() -> MetricTable {
        MetricTable::new(vec![
            MetricRow::new("agosto/2025")
                .with(MetricField::RevenueActual, 1200.0)
                .with(MetricField::RevenueBudgeted, 1000.0)
                .with(MetricField::EssencialActual, 12.0)
                .with(MetricField::EssencialRevenue, 600.0)
                .with(MetricField::ChurnActual, 2.0),
            MetricRow::new("julho/2025")
                .with(MetricField::RevenueActual, 1000.0)
                .with(MetricField::RevenueBudgeted, 1000.0)
                .with(MetricField::EssencialActual, 10.0),
        ])
    }

    #[tokio::test]
    async fn test_months_default_to_latest() {
        let months = service(table()).months().await;
        assert_eq!(months.months, vec!["julho/2025", "agosto/2025"]);
        assert_eq!(months.default_selection, vec!["agosto/2025"]);
        assert!(months.loaded_at.is_some());
    }

    #[tokio::test]
    async fn test_summary_for_latest_month() {
        let summary = service(table()).summary(None).await.unwrap();

        assert_eq!(summary.selected_months, vec!["agosto/2025"]);
        assert_eq!(summary.previous_months, vec!["julho/2025"]);
        assert_eq!(summary.accumulated.actual, 2200.0);
        assert_eq!(summary.accumulated.actual_display, "R$ 2.200,00");

        let realized = &summary.revenue[1];
        assert_eq!(realized.field, MetricField::RevenueActual);
        assert_eq!(realized.display, "R$ 1.200,00");
        assert_eq!(realized.delta_display, "R$ +200,00 (+20.0%) vs Mês Anterior");
        assert!(summary.revenue[2].inverse_delta);

        let essencial = &summary.plans[0];
        assert_eq!(essencial.name, "Essencial");
        assert_eq!(essencial.cards[1].display, "12 clientes");
        assert_eq!(essencial.cards[1].delta_display, "+2 (+20.0%) vs Mês Anterior");

        assert_eq!(summary.revenue_distribution[0].value, 600.0);
        assert_eq!(summary.churn[1].display, "2 clientes");
    }

    #[tokio::test]
    async fn test_summary_errors() {
        assert_eq!(
            service(MetricTable::default()).summary(None).await.unwrap_err(),
            DashboardError::NoData
        );
        assert_eq!(
            service(table()).summary(Some(vec![])).await.unwrap_err(),
            DashboardError::NoSelection
        );
    }

    #[tokio::test]
    async fn test_operational_defaults() {
        let summary = service(table()).operational().await;
        assert_eq!(summary.channels.len(), 2);
        assert_eq!(summary.channels[0].ctr.value, "0,00%");
        assert_eq!(summary.channels[1].cpr.delta, "R$ 0,00 (0.0%)");
    }
}
