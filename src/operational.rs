//! Ad-channel indicators from the operational sheet
//!
//! The sheet holds a single row with current and previous month CTR/CPR
//! for each channel, as raw (unformatted) numbers. CTR is a fraction
//! (0.054 means 5,40%), CPR is a currency amount.

use serde::Serialize;
use tracing::{debug, warn};

use crate::delta::NEW_MARKER;
use crate::formatting::{format_currency, format_grouped, format_percentage};
use crate::normalizer::{normalize, CellValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdChannel {
    Google,
    Meta,
}

impl AdChannel {
    pub fn display_name(self) -> &'static str {
        match self {
            AdChannel::Google => "Google Ads",
            AdChannel::Meta => "Meta Ads",
        }
    }

    fn column_key(self) -> &'static str {
        match self {
            AdChannel::Google => "google",
            AdChannel::Meta => "meta",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ChannelIndicators {
    pub ctr_current: Option<f64>,
    pub ctr_previous: Option<f64>,
    pub cpr_current: Option<f64>,
    pub cpr_previous: Option<f64>,
}

/// Value and delta text for one indicator card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorCard {
    pub label: String,
    pub value: String,
    pub delta: String,
}

impl ChannelIndicators {
    pub fn ctr_card(&self) -> IndicatorCard {
        let current = self.ctr_current.unwrap_or(0.0);
        IndicatorCard {
            label: "CTR Atual".to_string(),
            value: format_percentage(current, 2),
            delta: ctr_delta(current, self.ctr_previous.unwrap_or(0.0)),
        }
    }

    pub fn cpr_card(&self) -> IndicatorCard {
        let current = self.cpr_current.unwrap_or(0.0);
        IndicatorCard {
            label: "CPR Atual".to_string(),
            value: format_currency(current),
            delta: cpr_delta(current, self.cpr_previous),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationalSnapshot {
    pub google: ChannelIndicators,
    pub meta: ChannelIndicators,
}

impl OperationalSnapshot {
    /// Read the first data row; headers are matched case-insensitively
    pub fn from_grid(header: &[String], rows: &[Vec<CellValue>]) -> Self {
        let header: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();

        let Some(row) = rows.iter().find(|r| !r.iter().all(CellValue::is_empty)) else {
            warn!("Operational sheet has no data rows");
            return Self::default();
        };

        let lookup = |name: String| -> Option<f64> {
            let col = header.iter().position(|h| *h == name);
            if col.is_none() {
                debug!("Operational column '{}' not found", name);
            }
            col.and_then(|c| row.get(c)).and_then(normalize)
        };

        let channel = |channel: AdChannel| {
            let key = channel.column_key();
            ChannelIndicators {
                ctr_current: lookup(format!("ctr {key} mes atual")),
                ctr_previous: lookup(format!("ctr {key} mes anterior")),
                cpr_current: lookup(format!("cpr {key} mes atual")),
                cpr_previous: lookup(format!("cpr {key} mes anterior")),
            }
        };

        Self {
            google: channel(AdChannel::Google),
            meta: channel(AdChannel::Meta),
        }
    }

    pub fn channel(&self, channel: AdChannel) -> &ChannelIndicators {
        match channel {
            AdChannel::Google => &self.google,
            AdChannel::Meta => &self.meta,
        }
    }
}

/// CTR change in percentage points, e.g. `+1,20 p.p.`
pub fn ctr_delta(current: f64, previous: f64) -> String {
    if previous == 0.0 {
        return if current != 0.0 {
            format!("{} ({NEW_MARKER})", format_percentage(current, 2))
        } else {
            "0,00% (0.0%)".to_string()
        };
    }

    let points = current * 100.0 - previous * 100.0;
    let mut formatted = format_grouped(points, 2);
    if points > 0.0 {
        formatted.insert(0, '+');
    }
    format!("{formatted} p.p.")
}

/// CPR change as amount and percentage, e.g. `R$ -2,50 (-10,0%)`
pub fn cpr_delta(current: f64, previous: Option<f64>) -> String {
    let previous = match previous {
        Some(p) if p != 0.0 => p,
        _ => {
            return if current > 0.0 {
                format!("{} ({NEW_MARKER})", format_currency(current))
            } else {
                "R$ 0,00 (0.0%)".to_string()
            };
        }
    };

    let value = current - previous;
    let pct = value / previous * 100.0;
    let mut formatted = format_grouped(value, 2);
    if value > 0.0 {
        formatted.insert(0, '+');
    }
    let pct = format!("{pct:+.1}").replace('.', ",");
    format!("R$ {formatted} ({pct}%)")
}
