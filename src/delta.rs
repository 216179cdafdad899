use serde::Serialize;

use crate::formatting::{format_currency, format_grouped, format_signed_ratio, truncate};

pub const NEW_MARKER: &str = "Novo";
pub const VS_PREVIOUS: &str = "vs Mês Anterior";

/// Period-over-period change of one summed field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Delta {
    /// Nothing to compare against and the current value is positive
    New { current: f64 },
    /// Nothing to compare against and nothing to report
    Zero,
    Change { value: f64, ratio: f64 },
}

/// How the magnitude of a delta is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaFlavor {
    Currency,
    Count,
}

impl Delta {
    /// A zero or absent previous value has no percentage base
    pub fn compute(current: f64, previous: Option<f64>) -> Self {
        match previous {
            Some(prev) if prev != 0.0 => {
                let value = current - prev;
                Delta::Change {
                    value,
                    ratio: value / prev,
                }
            }
            _ if current > 0.0 => Delta::New { current },
            _ => Delta::Zero,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Delta::New { .. })
    }

    pub fn format(&self, flavor: DeltaFlavor) -> String {
        match flavor {
            DeltaFlavor::Currency => self.to_currency_string(),
            DeltaFlavor::Count => self.to_count_string(),
        }
    }

    /// `R$ +20,00 (+20.0%) vs Mês Anterior`
    pub fn to_currency_string(&self) -> String {
        match *self {
            Delta::New { current } => format!("{} ({NEW_MARKER})", format_currency(current)),
            Delta::Zero => "R$ 0,00 (0.0%)".to_string(),
            Delta::Change { value, ratio } => {
                let mut magnitude = format_grouped(value, 2);
                if value > 0.0 {
                    magnitude.insert(0, '+');
                }
                format!(
                    "R$ {magnitude} ({}) {VS_PREVIOUS}",
                    format_signed_ratio(ratio)
                )
            }
        }
    }

    /// `+3 (+20.0%) vs Mês Anterior`
    pub fn to_count_string(&self) -> String {
        match *self {
            Delta::New { current } => format!("+{} ({NEW_MARKER})", truncate(current)),
            Delta::Zero => "0 (0.0%)".to_string(),
            Delta::Change { value, ratio } => format!(
                "{:+} ({}) {VS_PREVIOUS}",
                truncate(value),
                format_signed_ratio(ratio)
            ),
        }
    }
}
