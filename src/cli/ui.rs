use crate::core::asset::{AssetCategory, AssetState, Trend};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn number_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Creates a cell for displaying percentage change with color coding.
pub fn change_cell(change: f64) -> Cell {
    let text = format!("{change:+.2}%");
    let color = if change >= 0.0 { Color::Green } else { Color::Red };
    Cell::new(text).fg(color).set_alignment(CellAlignment::Right)
}

pub fn trend_cell(trend: Trend) -> Cell {
    let color = match trend {
        Trend::Up => Color::Green,
        Trend::Down => Color::Red,
    };
    Cell::new(trend.arrow())
        .fg(color)
        .add_attribute(Attribute::Bold)
        .set_alignment(CellAlignment::Center)
}

/// Price with the category's number of decimals.
pub fn format_price(category: AssetCategory, price: f64) -> String {
    format!("{:.*}", category.price_precision() as usize, price)
}

pub fn format_money(amount: f64, currency: &str) -> String {
    format!("{amount:.2} {currency}")
}

/// One row per asset of a category.
pub fn asset_table(
    assets: &[AssetState],
    currency: &str,
    sparklines: Option<&dyn Fn(&str) -> String>,
) -> Table {
    let mut table = new_styled_table();
    let mut header = vec![
        header_cell("Asset"),
        header_cell("Symbol"),
        header_cell("Price (USD)"),
        header_cell("Change"),
        header_cell(""),
        header_cell("MA"),
        header_cell(&format!("Min ({currency})")),
        header_cell(&format!("Income/h ({currency})")),
        header_cell("Hours"),
    ];
    if sparklines.is_some() {
        header.push(header_cell("History"));
    }
    table.set_header(header);

    for asset in assets {
        let mut row = vec![
            Cell::new(&asset.name),
            Cell::new(&asset.symbol).fg(Color::DarkGrey),
            number_cell(format_price(asset.category, asset.current_price)),
            change_cell(asset.change_percent),
            trend_cell(asset.trend),
            number_cell(format_price(asset.category, asset.moving_average)),
            number_cell(format!("{:.2}", asset.min_investment)),
            number_cell(format!("{:.4}", asset.hourly_income)),
            number_cell(format!("{}", asset.duration_hours)),
        ];
        if let Some(sparkline) = sparklines {
            row.push(Cell::new(sparkline(&asset.instrument_id)).fg(match asset.trend {
                Trend::Up => Color::Green,
                Trend::Down => Color::Red,
            }));
        }
        table.add_row(row);
    }
    table
}

/// Creates a spinner shown while waiting on the network.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) =
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}
