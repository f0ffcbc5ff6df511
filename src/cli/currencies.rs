use super::ui;
use crate::core::{BASE_CURRENCY, CurrencyConverter, RateTable, list_currencies};
use anyhow::Result;
use comfy_table::Cell;

/// Formats the as-of line shared by the listing and conversion output.
pub fn as_of_label(table: &RateTable) -> String {
    table.as_of_date().map_or_else(
        || table.time.clone(),
        |date| date.format("%d %b %Y").to_string(),
    )
}

impl RateTable {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Currency"),
            ui::header_cell(&format!("Units per 1 {BASE_CURRENCY}")),
        ]);

        for code in list_currencies(self) {
            let rate = self
                .rate_of(&code)
                .map_or("N/A".to_string(), |r| format!("{r}"));
            table.add_row(vec![Cell::new(&code), ui::number_cell(rate)]);
        }

        let mut output = format!(
            "Exchange rates as of {}\n\n",
            ui::style_text(&as_of_label(self), ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(
                &format!("{} currencies available", self.rates.len()),
                ui::StyleType::Subtle
            )
        ));
        output
    }
}

pub async fn run(converter: &CurrencyConverter) -> Result<()> {
    let spinner = ui::new_spinner("Fetching exchange rates...");
    let result = converter.rate_table().await;
    spinner.finish_and_clear();

    println!("{}", result?.display_as_table());
    Ok(())
}
