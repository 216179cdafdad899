use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::normalizer::{normalize, CellValue};

/// Header of the column holding the month label
pub const MONTH_COLUMN: &str = "Mes";

const FIELD_COUNT: usize = 25;

/// Numeric columns of the dashboard sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    RevenueBudgeted,
    RevenueActual,
    RevenueDifference,
    EssencialBudgeted,
    EssencialActual,
    EssencialDifference,
    ControleBudgeted,
    ControleActual,
    ControleDifference,
    AvancadoBudgeted,
    AvancadoActual,
    AvancadoDifference,
    EssencialRevenue,
    ControleRevenue,
    AvancadoRevenue,
    EssencialMonthlyRevenue,
    ControleMonthlyRevenue,
    AvancadoMonthlyRevenue,
    ChurnBudgeted,
    ChurnActual,
    ChurnDifference,
    TotalClientsBudgeted,
    TotalClientsActual,
    ChurnMonthlyBudgeted,
    ChurnMonthlyActual,
}

impl MetricField {
    pub const ALL: [MetricField; FIELD_COUNT] = [
        MetricField::RevenueBudgeted,
        MetricField::RevenueActual,
        MetricField::RevenueDifference,
        MetricField::EssencialBudgeted,
        MetricField::EssencialActual,
        MetricField::EssencialDifference,
        MetricField::ControleBudgeted,
        MetricField::ControleActual,
        MetricField::ControleDifference,
        MetricField::AvancadoBudgeted,
        MetricField::AvancadoActual,
        MetricField::AvancadoDifference,
        MetricField::EssencialRevenue,
        MetricField::ControleRevenue,
        MetricField::AvancadoRevenue,
        MetricField::EssencialMonthlyRevenue,
        MetricField::ControleMonthlyRevenue,
        MetricField::AvancadoMonthlyRevenue,
        MetricField::ChurnBudgeted,
        MetricField::ChurnActual,
        MetricField::ChurnDifference,
        MetricField::TotalClientsBudgeted,
        MetricField::TotalClientsActual,
        MetricField::ChurnMonthlyBudgeted,
        MetricField::ChurnMonthlyActual,
    ];

    /// Header text used by the spreadsheet.
    ///
    /// The Controle plan is still called "Vender" in the sheet.
    pub fn column_name(self) -> &'static str {
        match self {
            MetricField::RevenueBudgeted => "Receita Orcada",
            MetricField::RevenueActual => "Receita Realizada",
            MetricField::RevenueDifference => "Receita Diferenca",
            MetricField::EssencialBudgeted => "Essencial Orcado",
            MetricField::EssencialActual => "Essencial Realizado",
            MetricField::EssencialDifference => "Essencial Diferenca",
            MetricField::ControleBudgeted => "Vender Orcado",
            MetricField::ControleActual => "Vender Realizado",
            MetricField::ControleDifference => "Vender Diferenca",
            MetricField::AvancadoBudgeted => "Avancado Orcado",
            MetricField::AvancadoActual => "Avancado Realizado",
            MetricField::AvancadoDifference => "Avancado Diferenca",
            MetricField::EssencialRevenue => "Receita Essencial",
            MetricField::ControleRevenue => "Receita Vender",
            MetricField::AvancadoRevenue => "Receita Avancado",
            MetricField::EssencialMonthlyRevenue => "Receita Essencial Mensal",
            MetricField::ControleMonthlyRevenue => "Receita Vender Mensal",
            MetricField::AvancadoMonthlyRevenue => "Receita Avancado Mensal",
            MetricField::ChurnBudgeted => "Churn Orcado",
            MetricField::ChurnActual => "Churn Realizado",
            MetricField::ChurnDifference => "Churn Diferenca",
            MetricField::TotalClientsBudgeted => "Total de Clientes Orcados",
            MetricField::TotalClientsActual => "Total de Clientes Realizados",
            MetricField::ChurnMonthlyBudgeted => "Churn Orcado Mensal",
            MetricField::ChurnMonthlyActual => "Churn Realizado Mensal",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|f| f.column_name() == name)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Subscription tiers tracked by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Essencial,
    Controle,
    Avancado,
}

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Essencial, Plan::Controle, Plan::Avancado];

    pub fn display_name(self) -> &'static str {
        match self {
            Plan::Essencial => "Essencial",
            Plan::Controle => "Controle",
            Plan::Avancado => "Avançado",
        }
    }

    /// Client counts as (budgeted, actual, difference)
    pub fn client_fields(self) -> (MetricField, MetricField, MetricField) {
        match self {
            Plan::Essencial => (
                MetricField::EssencialBudgeted,
                MetricField::EssencialActual,
                MetricField::EssencialDifference,
            ),
            Plan::Controle => (
                MetricField::ControleBudgeted,
                MetricField::ControleActual,
                MetricField::ControleDifference,
            ),
            Plan::Avancado => (
                MetricField::AvancadoBudgeted,
                MetricField::AvancadoActual,
                MetricField::AvancadoDifference,
            ),
        }
    }

    pub fn revenue_field(self) -> MetricField {
        match self {
            Plan::Essencial => MetricField::EssencialRevenue,
            Plan::Controle => MetricField::ControleRevenue,
            Plan::Avancado => MetricField::AvancadoRevenue,
        }
    }

    pub fn monthly_revenue_field(self) -> MetricField {
        match self {
            Plan::Essencial => MetricField::EssencialMonthlyRevenue,
            Plan::Controle => MetricField::ControleMonthlyRevenue,
            Plan::Avancado => MetricField::AvancadoMonthlyRevenue,
        }
    }
}

/// One sheet row: a month label plus every numeric field, each optional
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub month: String,
    values: [Option<f64>; FIELD_COUNT],
}

impl MetricRow {
    pub fn new(month: impl Into<String>) -> Self {
        Self {
            month: month.into(),
            values: [None; FIELD_COUNT],
        }
    }

    pub fn get(&self, field: MetricField) -> Option<f64> {
        self.values[field.slot()]
    }

    pub fn set(&mut self, field: MetricField, value: Option<f64>) {
        self.values[field.slot()] = value;
    }

    pub fn with(mut self, field: MetricField, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }
}

/// All rows of one load cycle. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricTable {
    rows: Vec<MetricRow>,
}

impl MetricTable {
    pub fn new(rows: Vec<MetricRow>) -> Self {
        Self { rows }
    }

    /// Build a table from a header row and raw cell rows.
    ///
    /// Fully empty rows and rows without a month label are dropped. Columns
    /// not in [`MetricField`] are ignored; known columns missing from the
    /// header leave the field empty on every row.
    pub fn from_grid(header: &[String], rows: &[Vec<CellValue>]) -> Self {
        let header: Vec<&str> = header.iter().map(|h| h.trim()).collect();

        let month_col = header.iter().position(|h| *h == MONTH_COLUMN);
        let field_cols: Vec<(usize, MetricField)> = header
            .iter()
            .enumerate()
            .filter_map(|(i, h)| MetricField::from_column_name(h).map(|f| (i, f)))
            .collect();

        for field in MetricField::ALL {
            if !field_cols.iter().any(|(_, f)| *f == field) {
                debug!("Numeric column '{}' not found in sheet", field.column_name());
            }
        }

        let Some(month_col) = month_col else {
            warn!("Sheet has no '{}' column, no rows loaded", MONTH_COLUMN);
            return Self::default();
        };

        let mut table_rows = Vec::with_capacity(rows.len());
        let mut skipped_rows = 0;

        for (row_idx, cells) in rows.iter().enumerate() {
            if cells.iter().all(CellValue::is_empty) {
                continue;
            }

            let Some(month) = cells.get(month_col).and_then(CellValue::as_text) else {
                warn!("Row {} has no '{}' value, skipping", row_idx + 2, MONTH_COLUMN);
                skipped_rows += 1;
                continue;
            };

            let mut row = MetricRow::new(month);
            for (col, field) in &field_cols {
                let value = cells.get(*col).and_then(normalize);
                row.set(*field, value);
            }
            table_rows.push(row);
        }

        if skipped_rows > 0 {
            warn!("Skipped {} rows without a month label", skipped_rows);
        }
        debug!("Built metric table with {} rows", table_rows.len());

        Self::new(table_rows)
    }

    pub fn rows(&self) -> &[MetricRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Distinct month labels in encounter order
    pub fn month_labels(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|r| seen.insert(r.month.as_str()))
            .map(|r| r.month.clone())
            .collect()
    }

    /// Sum a field over the rows whose label is in `months`; missing values count as zero
    pub fn sum<S: AsRef<str>>(&self, field: MetricField, months: &[S]) -> f64 {
        let wanted: HashSet<&str> = months.iter().map(|m| m.as_ref()).collect();
        self.rows
            .iter()
            .filter(|r| wanted.contains(r.month.as_str()))
            .map(|r| r.get(field).unwrap_or(0.0))
            .sum()
    }

    /// Sum a field over every row
    pub fn total(&self, field: MetricField) -> f64 {
        self.rows.iter().map(|r| r.get(field).unwrap_or(0.0)).sum()
    }
}
