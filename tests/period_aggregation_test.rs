// End-to-end tests: formatted sheet cells through normalization to period deltas

use mrr_dashboard_service::delta::{Delta, DeltaFlavor};
use mrr_dashboard_service::fetcher::SheetGrid;
use mrr_dashboard_service::metrics::{MetricField, MetricTable};
use mrr_dashboard_service::month::MonthVocabulary;
use mrr_dashboard_service::normalizer::CellValue;
use mrr_dashboard_service::period::{chronological_order, previous_period, PeriodAggregator};

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

/// Rows arrive out of order with the sheet's own formatting and error cells
fn sheet_table() -> MetricTable {
    let grid = SheetGrid::from_cells(vec![
        vec![
            text("Mes"),
            text("Receita Realizada"),
            text("Essencial Realizado"),
            text("Churn Realizado"),
        ],
        vec![text("março/2025"), text("R$ 1.234,56"), text("12"), text("#N/A")],
        vec![text("janeiro/2025"), text("R$ 1.000,00"), text("10"), text("1")],
        vec![text("abril/2025"), text("R$ 1.500,00"), text("#REF!"), text("2")],
        vec![text("fevereiro/2025"), text("R$ 1.100,00"), text(""), text("0")],
        vec![CellValue::Empty, CellValue::Empty, CellValue::Empty, CellValue::Empty],
    ])
    .unwrap();
    grid.to_metric_table()
}

#[test]
fn test_table_normalizes_formatted_cells() {
    let table = sheet_table();

    assert_eq!(table.len(), 4);
    assert_eq!(table.rows()[0].get(MetricField::RevenueActual), Some(1234.56));
    assert_eq!(table.rows()[0].get(MetricField::ChurnActual), None);
    assert_eq!(table.rows()[2].get(MetricField::EssencialActual), None);
    assert_eq!(table.rows()[3].get(MetricField::EssencialActual), None);
    assert_eq!(table.total(MetricField::ChurnActual), 3.0);
    // Column absent from the sheet
    assert_eq!(table.total(MetricField::AvancadoActual), 0.0);
}

#[test]
fn test_chronological_ordering_of_sheet_months() {
    let table = sheet_table();
    let vocab = MonthVocabulary::default();

    let ordering = chronological_order(table.month_labels().as_slice(), &vocab);

    assert_eq!(
        ordering,
        vec!["janeiro/2025", "fevereiro/2025", "março/2025", "abril/2025"]
    );
}

#[test]
fn test_previous_window_slides_with_selection_size() {
    let ordering: Vec<String> = ["janeiro/2025", "fevereiro/2025", "março/2025", "abril/2025"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    assert_eq!(previous_period(&ordering, &["março/2025"]), vec!["fevereiro/2025"]);
    assert_eq!(
        previous_period(&ordering, &["fevereiro/2025", "março/2025"]),
        vec!["janeiro/2025"]
    );
    assert_eq!(
        previous_period(&ordering, &["abril/2025", "março/2025"]),
        vec!["janeiro/2025", "fevereiro/2025"]
    );
    assert!(previous_period(&ordering, &["janeiro/2025"]).is_empty());
}

#[test]
fn test_aggregate_two_months_against_preceding_two() {
    let table = sheet_table();
    let vocab = MonthVocabulary::default();
    let aggregator = PeriodAggregator::new(&table, &vocab);

    let aggregate = aggregator.aggregate(&["abril/2025", "março/2025"]);

    assert_eq!(aggregate.current_months, vec!["março/2025", "abril/2025"]);
    assert_eq!(aggregate.previous_months, vec!["janeiro/2025", "fevereiro/2025"]);
    assert!((aggregate.current(MetricField::RevenueActual) - 2734.56).abs() < 1e-9);
    assert_eq!(aggregate.previous(MetricField::RevenueActual), 2100.0);
    assert_eq!(
        aggregate.formatted_delta(MetricField::RevenueActual, DeltaFlavor::Currency),
        "R$ +634,56 (+30.2%) vs Mês Anterior"
    );
    assert_eq!(
        aggregate.formatted_delta(MetricField::EssencialActual, DeltaFlavor::Count),
        "+2 (+20.0%) vs Mês Anterior"
    );
}

#[test]
fn test_first_month_has_no_comparison() {
    let table = sheet_table();
    let vocab = MonthVocabulary::default();
    let aggregator = PeriodAggregator::new(&table, &vocab);

    let aggregate = aggregator.aggregate(&["janeiro/2025"]);

    assert!(aggregate.previous_months.is_empty());
    assert_eq!(aggregate.previous(MetricField::RevenueActual), 0.0);
    assert_eq!(
        aggregate.delta(MetricField::RevenueActual),
        Delta::New { current: 1000.0 }
    );
    assert_eq!(
        aggregate.formatted_delta(MetricField::EssencialActual, DeltaFlavor::Count),
        "+10 (Novo)"
    );
    assert_eq!(aggregate.delta(MetricField::AvancadoActual), Delta::Zero);
}

#[test]
fn test_unknown_selection_labels_are_ignored() {
    let table = sheet_table();
    let vocab = MonthVocabulary::default();
    let aggregator = PeriodAggregator::new(&table, &vocab);

    let aggregate = aggregator.aggregate(&["março/2025", "dezembro/2030"]);

    assert_eq!(aggregate.current_months, vec!["março/2025"]);
    assert_eq!(aggregate.previous_months, vec!["fevereiro/2025"]);
}

#[test]
fn test_malformed_label_sorts_first() {
    let table = MetricTable::from_grid(
        &["Mes".to_string(), "Receita Realizada".to_string()],
        &[
            vec![text("janeiro/2025"), text("R$ 10,00")],
            vec![text("Total"), text("R$ 99,00")],
        ],
    );
    let vocab = MonthVocabulary::default();
    let aggregator = PeriodAggregator::new(&table, &vocab);

    assert_eq!(aggregator.ordering(), ["Total", "janeiro/2025"]);

    let aggregate = aggregator.aggregate(&["janeiro/2025"]);
    assert_eq!(aggregate.previous_months, vec!["Total"]);
}
