use super::currencies::as_of_label;
use super::ui;
use crate::core::CurrencyConverter;
use anyhow::Result;

/// Renders a conversion result for the terminal.
pub fn format_conversion(from: &str, to: &str, amount: i64, converted: i64, as_of: &str) -> String {
    format!(
        "{} {} = {} {}\n{}",
        amount,
        ui::style_text(from, ui::StyleType::TotalLabel),
        ui::style_text(&converted.to_string(), ui::StyleType::TotalValue),
        ui::style_text(to, ui::StyleType::TotalLabel),
        ui::style_text(&format!("Rates as of {as_of}"), ui::StyleType::Subtle)
    )
}

pub async fn run(converter: &CurrencyConverter, from: &str, to: &str, amount: i64) -> Result<()> {
    let spinner = ui::new_spinner("Fetching exchange rates...");
    let result = converter.convert_with_table(from, to, amount).await;
    spinner.finish_and_clear();

    let (converted, table) = result?;

    println!(
        "{}",
        format_conversion(from, to, amount, converted, &as_of_label(&table))
    );
    Ok(())
}
