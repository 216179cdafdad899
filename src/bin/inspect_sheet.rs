use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use mrr_dashboard_service::cache::DataSource;
use mrr_dashboard_service::delta::DeltaFlavor;
use mrr_dashboard_service::fetcher::{
    SheetsFetcher, ValueRender, DEFAULT_FETCH_TIMEOUT, DEFAULT_SHEETS_BASE_URL,
};
use mrr_dashboard_service::formatting::{format_clients, format_currency};
use mrr_dashboard_service::importers::WorkbookImporter;
use mrr_dashboard_service::metrics::{MetricField, MetricTable};
use mrr_dashboard_service::month::MonthVocabulary;
use mrr_dashboard_service::period::PeriodAggregator;
use mrr_dashboard_service::utils::extract_spreadsheet_id;

#[derive(Parser)]
#[command(name = "inspect-sheet")]
#[command(about = "Load the dashboard sheet and print the month ordering and an aggregate", long_about = None)]
struct Cli {
    /// Spreadsheet id or share URL
    #[arg(long, env = "SPREADSHEET")]
    spreadsheet: Option<String>,

    /// Local .xlsx/.ods export to read instead of the Sheets API
    #[arg(long, env = "WORKBOOK_PATH")]
    workbook: Option<PathBuf>,

    /// Sheet (tab) name
    #[arg(long, env = "DASHBOARD_SHEET", default_value = "DADOS STREAMLIT")]
    sheet: String,

    #[arg(long, env = "SHEETS_API_KEY")]
    api_key: Option<String>,

    /// OAuth bearer token, sent instead of the API key when both are set
    #[arg(long, env = "SHEETS_ACCESS_TOKEN")]
    access_token: Option<String>,

    #[arg(long, env = "SHEETS_BASE_URL", default_value = DEFAULT_SHEETS_BASE_URL)]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECONDS", default_value_t = DEFAULT_FETCH_TIMEOUT.as_secs())]
    timeout: u64,

    /// Comma separated month names, January first
    #[arg(long, env = "MONTH_NAMES")]
    month_names: Option<String>,

    /// Comma separated month labels; defaults to the latest month
    #[arg(long, value_delimiter = ',')]
    months: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let table: MetricTable = match (&cli.workbook, &cli.spreadsheet) {
        (Some(path), _) => {
            println!("Reading '{}' from {}", cli.sheet, path.display());
            let importer = WorkbookImporter::new(path, &cli.sheet);
            DataSource::<MetricTable>::fetch(&importer).await?
        }
        (None, Some(spreadsheet)) => {
            let id = extract_spreadsheet_id(spreadsheet)?;
            println!("Reading '{}' from spreadsheet {}", cli.sheet, id);
            let fetcher = SheetsFetcher::new(id, &cli.sheet, ValueRender::Formatted)
                .with_base_url(&cli.base_url)
                .with_api_key(cli.api_key.clone())
                .with_access_token(cli.access_token.clone())
                .with_timeout(Duration::from_secs(cli.timeout.max(1)));
            DataSource::<MetricTable>::fetch(&fetcher).await?
        }
        (None, None) => return Err("Pass --spreadsheet or --workbook".into()),
    };

    println!("Loaded {} rows\n", table.len());

    let vocab = MonthVocabulary::from_optional_csv(cli.month_names.as_deref())?;
    let aggregator = PeriodAggregator::new(&table, &vocab);

    println!("Months (oldest first):");
    for month in aggregator.ordering() {
        let marker = if vocab.parse_label(month).is_none() { "  (unrecognized)" } else { "" };
        println!("  {}{}", month, marker);
    }

    let selection = if cli.months.is_empty() {
        aggregator.latest_month().map(|m| vec![m.to_string()]).unwrap_or_default()
    } else {
        cli.months.iter().map(|m| m.trim().to_string()).collect()
    };
    if selection.is_empty() {
        println!("\nNo months to aggregate");
        return Ok(());
    }

    let aggregate = aggregator.aggregate(selection.as_slice());
    println!("\nSelected: {}", aggregate.current_months.join(", "));
    println!("Previous: {}", aggregate.previous_months.join(", "));
    println!(
        "Accumulated realized revenue: {}\n",
        format_currency(table.total(MetricField::RevenueActual))
    );

    for field in MetricField::ALL {
        let flavor = if is_currency(field) { DeltaFlavor::Currency } else { DeltaFlavor::Count };
        let value = aggregate.current(field);
        let display = match flavor {
            DeltaFlavor::Currency => format_currency(value),
            DeltaFlavor::Count => format_clients(value),
        };
        println!(
            "  {:<32} {:>18}   {}",
            field.column_name(),
            display,
            aggregate.formatted_delta(field, flavor)
        );
    }

    Ok(())
}

fn is_currency(field: MetricField) -> bool {
    matches!(
        field,
        MetricField::RevenueBudgeted
            | MetricField::RevenueActual
            | MetricField::RevenueDifference
            | MetricField::EssencialRevenue
            | MetricField::ControleRevenue
            | MetricField::AvancadoRevenue
            | MetricField::EssencialMonthlyRevenue
            | MetricField::ControleMonthlyRevenue
            | MetricField::AvancadoMonthlyRevenue
    )
}
