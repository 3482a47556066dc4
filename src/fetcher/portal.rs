use super::MarketSource;
use crate::models::PriceRecord;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

/// Keywords that identify a price report table's header row.
const HEADER_KEYWORDS: [&str; 6] = ["mandi", "market", "price", "min", "max", "modal"];

/// HTML mandi report portal, used as the mid-chain fallback when the live API
/// yields nothing. The original relied on browser automation here; an HTTP GET
/// plus HTML table parsing covers the same report pages without embedding a
/// browser, and deployments without a portal URL simply omit this source.
pub struct PortalFetcher {
    portal_url: String,
    client: Client,
}

impl PortalFetcher {
    pub fn new(portal_url: String) -> Self {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .timeout(Duration::from_secs(45))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { portal_url, client }
    }

    /// Finds the first table whose header row mentions a price keyword and
    /// parses its data rows. Any row that fails column access or numeric
    /// parsing is skipped on its own; a row survives only with modal > 0.
    fn parse_report(
        html: &str,
        commodity: &str,
        state: &str,
        date: NaiveDate,
    ) -> Result<Vec<PriceRecord>> {
        let document = Html::parse_document(html);
        let table_sel = Selector::parse("table").unwrap();
        let row_sel = Selector::parse("tr").unwrap();
        let cell_sel = Selector::parse("th, td").unwrap();

        for table in document.select(&table_sel) {
            let mut rows = table.select(&row_sel);

            let header = match rows.next() {
                Some(h) => h,
                None => continue,
            };
            let header_cells: Vec<String> = header
                .select(&cell_sel)
                .map(|c| c.text().collect::<String>().trim().to_lowercase())
                .collect();

            let is_report = header_cells
                .iter()
                .any(|h| HEADER_KEYWORDS.iter().any(|k| h.contains(k)));
            if !is_report {
                continue;
            }

            // Column positions come from the header text, not fixed offsets —
            // portals shuffle their layouts.
            let col = |names: &[&str]| -> Option<usize> {
                header_cells
                    .iter()
                    .position(|h| names.iter().any(|n| h.contains(n)))
            };

            let modal_idx = match col(&["modal"]) {
                Some(i) => i,
                None => continue, // price-ish table but no modal column
            };
            let market_idx = col(&["mandi", "market"]);
            let district_idx = col(&["district"]);
            let variety_idx = col(&["variety"]);
            let min_idx = col(&["min"]);
            let max_idx = col(&["max"]);

            let mut prices = Vec::new();

            for row in rows {
                let cells: Vec<String> = row
                    .select(&cell_sel)
                    .map(|c| c.text().collect::<String>().trim().to_string())
                    .collect();

                let modal = match cells.get(modal_idx).and_then(|c| parse_number(c)) {
                    Some(v) if v > 0.0 => v,
                    _ => continue, // zero/unparseable modal means no usable record
                };

                let market = match market_idx.and_then(|i| cells.get(i)) {
                    Some(m) if !m.is_empty() => m.clone(),
                    _ => continue,
                };

                let min = min_idx
                    .and_then(|i| cells.get(i))
                    .and_then(|c| parse_number(c))
                    .unwrap_or(modal);
                let max = max_idx
                    .and_then(|i| cells.get(i))
                    .and_then(|c| parse_number(c))
                    .unwrap_or(modal);
                let district = district_idx
                    .and_then(|i| cells.get(i))
                    .cloned()
                    .unwrap_or_else(|| state.to_string());
                let variety = variety_idx
                    .and_then(|i| cells.get(i))
                    .cloned()
                    .unwrap_or_else(|| "Common".to_string());

                prices.push(PriceRecord::new(
                    market, state, district, commodity, variety, date, min, max, modal,
                ));
            }

            return Ok(prices);
        }

        Err(anyhow!("No price report table found in portal response"))
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.replace(',', "").trim().parse::<f64>().ok()
}

#[async_trait]
impl MarketSource for PortalFetcher {
    fn name(&self) -> &str {
        "portal"
    }

    async fn fetch_prices(
        &self,
        commodity: &str,
        state: &str,
        date: NaiveDate,
    ) -> Result<Vec<PriceRecord>> {
        // The portal wants DD/MM/YYYY in its query string
        let url = format!(
            "{}?commodity={}&state={}&date={}",
            self.portal_url,
            commodity,
            state,
            date.format("%d/%m/%Y"),
        );

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!("Portal error: {}", resp.status()));
        }

        let body = resp.text().await?;
        Self::parse_report(&body, commodity, state, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    const REPORT: &str = r#"
        <html><body>
        <table>
            <tr><th>Sl No</th><th>Notice</th></tr>
            <tr><td>1</td><td>Holiday list</td></tr>
        </table>
        <table>
            <tr>
                <th>Mandi Name</th><th>District</th><th>Variety</th>
                <th>Min Price</th><th>Max Price</th><th>Modal Price</th>
            </tr>
            <tr>
                <td>Khanna</td><td>Ludhiana</td><td>Dara</td>
                <td>1,900</td><td>2,100</td><td>2,000</td>
            </tr>
            <tr>
                <td>Amritsar</td><td>Amritsar</td><td>Dara</td>
                <td>1950</td><td>2150</td><td>0</td>
            </tr>
            <tr>
                <td>Patiala</td><td>Patiala</td><td>Dara</td>
                <td>n/a</td><td>2200</td><td>2080</td>
            </tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn test_skips_non_report_table() {
        let prices =
            PortalFetcher::parse_report(REPORT, "Wheat", "Punjab", date("2024-01-15")).unwrap();
        // First table has no price keywords; second one is parsed
        assert!(prices.iter().all(|p| p.commodity == "Wheat"));
        assert!(prices.iter().any(|p| p.market == "Khanna"));
    }

    #[test]
    fn test_zero_modal_row_dropped() {
        let prices =
            PortalFetcher::parse_report(REPORT, "Wheat", "Punjab", date("2024-01-15")).unwrap();
        assert!(prices.iter().all(|p| p.market != "Amritsar"));
    }

    #[test]
    fn test_unparseable_min_falls_back_to_modal() {
        let prices =
            PortalFetcher::parse_report(REPORT, "Wheat", "Punjab", date("2024-01-15")).unwrap();
        let patiala = prices.iter().find(|p| p.market == "Patiala").unwrap();
        // "n/a" min collapses to the modal price
        assert_eq!(patiala.min_price, 2080.0);
        assert_eq!(patiala.modal_price, 2080.0);
        assert_eq!(patiala.max_price, 2200.0);
    }

    #[test]
    fn test_thousands_separator_parsed() {
        let prices =
            PortalFetcher::parse_report(REPORT, "Wheat", "Punjab", date("2024-01-15")).unwrap();
        let khanna = prices.iter().find(|p| p.market == "Khanna").unwrap();
        assert_eq!(khanna.min_price, 1900.0);
        assert_eq!(khanna.modal_price, 2000.0);
    }

    #[test]
    fn test_no_report_table_is_error() {
        let html = "<html><body><p>Maintenance window</p></body></html>";
        let result = PortalFetcher::parse_report(html, "Wheat", "Punjab", date("2024-01-15"));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_modal_column_is_error() {
        let html = r#"
            <table>
                <tr><th>Market</th><th>Min Price</th><th>Max Price</th></tr>
                <tr><td>Khanna</td><td>1900</td><td>2100</td></tr>
            </table>
        "#;
        let result = PortalFetcher::parse_report(html, "Wheat", "Punjab", date("2024-01-15"));
        assert!(result.is_err());
    }
}
