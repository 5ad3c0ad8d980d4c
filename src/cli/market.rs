use super::ui;
use crate::core::asset::AssetCategory;
use crate::core::catalog::Catalog;
use crate::core::chart::{ChartSeries, sparkline};
use crate::core::config::AppConfig;
use crate::core::currency::CurrencyConverter;
use crate::core::engine::{EngineConfig, EngineHandle};
use crate::core::income::IncomeCalculator;
use crate::core::market::{MarketSnapshot, MarketState};
use crate::providers::build_adapters;
use anyhow::{Result, anyhow, bail};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

const CHART_ROWS: usize = 12;

fn start_engine(config: &AppConfig, converter: Arc<dyn CurrencyConverter>) -> EngineHandle {
    let catalog = Arc::new(Catalog::builtin());
    let adapters = build_adapters(&config.providers, &catalog);
    let state = MarketState::new(catalog).with_converter(converter);
    EngineHandle::start(state, adapters, EngineConfig::from(&config.schedule))
}

/// Waits until the engine has published its first populated snapshot.
async fn first_snapshot(
    rx: &mut watch::Receiver<Arc<MarketSnapshot>>,
) -> Result<Arc<MarketSnapshot>> {
    let pb = ui::new_spinner("Fetching market data");
    let result = rx
        .wait_for(|snapshot| !snapshot.is_empty())
        .await
        .map(|snapshot| Arc::clone(&*snapshot))
        .map_err(|_| anyhow!("Market engine stopped before the first refresh"));
    pb.finish_and_clear();
    result
}

fn categories(filter: Option<AssetCategory>) -> Vec<AssetCategory> {
    match filter {
        Some(category) => vec![category],
        None => AssetCategory::ALL.to_vec(),
    }
}

fn print_header(snapshot: &MarketSnapshot) {
    let updated = snapshot.last_update.map_or_else(
        || "never (showing fallback prices)".to_string(),
        |at| at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    );
    println!(
        "{}",
        ui::style_text(
            &format!(
                "Last update: {updated} | Currency: {} | Ticks: {}",
                snapshot.currency, snapshot.ticks
            ),
            ui::StyleType::Subtle
        )
    );
}

fn print_market(snapshot: &MarketSnapshot, filter: Option<AssetCategory>, with_history: bool) {
    print_header(snapshot);
    let history_of = |id: &str| sparkline(snapshot.history(id).unwrap_or(&[]));
    for category in categories(filter) {
        let assets = snapshot.category(category);
        if assets.is_empty() {
            continue;
        }
        let (title, description) = category.display_info();
        println!(
            "\n{} {}",
            ui::style_text(title, ui::StyleType::Title),
            ui::style_text(description, ui::StyleType::Subtle)
        );
        let sparklines: Option<&dyn Fn(&str) -> String> = if with_history {
            Some(&history_of)
        } else {
            None
        };
        println!("{}", ui::asset_table(assets, &snapshot.currency, sparklines));
    }
}

/// Plots a price series on a character grid, one column per sample.
pub fn render_chart(history: &[f64], series: &ChartSeries, rows: usize) -> Vec<String> {
    if rows == 0 {
        return Vec::new();
    }
    let columns = history.len().max(1);
    let mut grid = vec![vec![' '; columns]; rows];
    let row_of = |y: f64| (y.round().max(0.0) as usize).min(rows.saturating_sub(1));
    let column_of = |x: f64| (x.round().max(0.0) as usize).min(columns - 1);

    for (from, to) in series.segments() {
        let (top, bottom) = {
            let (a, b) = (row_of(from.y), row_of(to.y));
            (a.min(b), a.max(b))
        };
        let column = column_of(to.x);
        for row in grid.iter_mut().take(bottom).skip(top + 1) {
            row[column] = '│';
        }
    }
    for point in &series.points {
        grid[row_of(point.y)][column_of(point.x)] = '•';
    }
    if let Some(current) = series.current() {
        grid[row_of(current.y)][column_of(current.x)] = '◆';
    }

    grid.into_iter()
        .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
        .collect()
}

fn print_asset_detail(
    snapshot: &MarketSnapshot,
    asset_id: &str,
    amount: Option<f64>,
    calculator: &mut IncomeCalculator,
) -> Result<()> {
    let asset = snapshot
        .asset(asset_id)
        .ok_or_else(|| anyhow!("Unknown asset: {}", asset_id))?;
    let history = snapshot.history(asset_id).unwrap_or(&[]);

    ui::print_separator();
    println!(
        "{} {} {}",
        ui::style_text(&asset.name, ui::StyleType::Title),
        asset.trend.arrow(),
        ui::format_price(asset.category, asset.current_price)
    );
    let width = history.len().saturating_sub(1) as f64;
    if let Some(series) =
        ChartSeries::from_history(history, asset.trend, width, (CHART_ROWS - 1) as f64)
    {
        println!(
            "{}",
            ui::style_text(
                &format!(
                    "high {}  low {}  samples {}",
                    ui::format_price(asset.category, series.max),
                    ui::format_price(asset.category, series.min),
                    history.len()
                ),
                ui::StyleType::Subtle
            )
        );
        for line in render_chart(history, &series, CHART_ROWS) {
            println!("  {line}");
        }
    }
    println!("{}", ui::style_text(&asset.chart_url, ui::StyleType::Subtle));

    if let Some(amount) = amount {
        let projection = calculator.project(asset, amount);
        println!(
            "{} {} -> {} per hour, {} over {}h",
            ui::style_text("Projected income for", ui::StyleType::TotalLabel),
            ui::format_money(projection.invested, &snapshot.currency),
            ui::format_money(projection.hourly, &snapshot.currency),
            ui::style_text(
                &ui::format_money(projection.total, &snapshot.currency),
                ui::StyleType::TotalValue
            ),
            asset.duration_hours
        );
    }
    Ok(())
}

/// Runs one refresh pass and prints the resulting market.
pub async fn snapshot(
    config: &AppConfig,
    converter: Arc<dyn CurrencyConverter>,
    filter: Option<AssetCategory>,
) -> Result<()> {
    let engine = start_engine(config, converter);
    let mut rx = engine.subscribe();
    let result = first_snapshot(&mut rx).await;
    engine.shutdown().await;

    let snapshot = result?;
    print_market(&snapshot, filter, false);
    Ok(())
}

/// Live view; redraws on every published snapshot until Ctrl-C.
pub async fn watch(
    config: &AppConfig,
    converter: Arc<dyn CurrencyConverter>,
    filter: Option<AssetCategory>,
    asset: Option<&str>,
    amount: Option<f64>,
) -> Result<()> {
    if let Some(id) = asset
        && Catalog::builtin().get(id).is_none()
    {
        bail!("Unknown asset: {}", id);
    }

    let engine = start_engine(config, converter);
    let mut rx = engine.subscribe();
    let token = engine.child_token();
    let term = console::Term::stdout();
    let mut calculator = IncomeCalculator::new();

    let first = first_snapshot(&mut rx).await;
    let mut result = first.map(|_| ());
    info!("Watching market, press Ctrl-C to stop");

    while result.is_ok() && !token.is_cancelled() {
        let snapshot = Arc::clone(&*rx.borrow_and_update());
        if let Err(e) = term.clear_screen() {
            debug!(error = %e, "Could not clear the terminal");
        }
        print_market(&snapshot, filter, true);
        if let Some(id) = asset {
            result = print_asset_detail(&snapshot, id, amount, &mut calculator);
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted");
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    engine.shutdown().await;
    result
}
