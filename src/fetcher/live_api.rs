use super::MarketSource;
use crate::models::PriceRecord;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Government open-data mandi price API (data.gov.in style).
pub struct LiveApiFetcher {
    api_key: String,
    base_url: String,
    client: Client,
}

impl LiveApiFetcher {
    pub fn new(api_key: String, base_url: String) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("MandiMarketService/1.0"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { api_key, base_url, client }
    }

    /// Parses the top-level `records` array. Upstream data is inconsistently
    /// populated, so any record missing a required field or carrying a
    /// non-numeric price is skipped row-wise — only a missing `records` array
    /// is a hard error.
    fn parse_records(json: &Value) -> Result<Vec<PriceRecord>> {
        let records = json["records"]
            .as_array()
            .ok_or_else(|| anyhow!("No records array in API response"))?;

        let mut prices = Vec::new();

        for rec in records {
            let market = rec["market"].as_str();
            let state = rec["state"].as_str();
            let district = rec["district"].as_str();
            let commodity = rec["commodity"].as_str();
            let variety = rec["variety"].as_str();
            let arrival = rec["arrival_date"].as_str();

            let (market, state, district, commodity, variety, arrival) =
                match (market, state, district, commodity, variety, arrival) {
                    (Some(m), Some(s), Some(d), Some(c), Some(v), Some(a)) => (m, s, d, c, v, a),
                    _ => continue,
                };

            let min = parse_price(&rec["min_price"]);
            let max = parse_price(&rec["max_price"]);
            let modal = parse_price(&rec["modal_price"]);

            let (min, max, modal) = match (min, max, modal) {
                (Some(a), Some(b), Some(c)) => (a, b, c),
                _ => continue,
            };

            let date = match parse_arrival_date(arrival) {
                Some(d) => d,
                None => continue,
            };

            prices.push(PriceRecord::new(
                market, state, district, commodity, variety, date, min, max, modal,
            ));
        }

        Ok(prices)
    }
}

/// Prices come back as strings ("2250") or occasionally bare numbers.
fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// The API mixes DD/MM/YYYY and ISO dates across resources.
fn parse_arrival_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

#[async_trait]
impl MarketSource for LiveApiFetcher {
    fn name(&self) -> &str {
        "live_api"
    }

    async fn fetch_prices(
        &self,
        commodity: &str,
        state: &str,
        date: NaiveDate,
    ) -> Result<Vec<PriceRecord>> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(anyhow!("Live API key is empty or missing"));
        }

        let url = format!(
            "{}?api-key={}&format=json&limit=100&filters[state]={}&filters[commodity]={}&filters[arrival_date]={}",
            self.base_url,
            key,
            state,
            commodity,
            date.format("%d/%m/%Y"),
        );

        let resp = self.client.get(&url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Live API error: {} - body: {}", status, error_text));
        }

        let json: Value = resp.json().await?;
        Self::parse_records(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_records() {
        let json_data = json!({
            "records": [
                {
                    "market": "Warangal", "state": "Telangana", "district": "Warangal",
                    "commodity": "Rice", "variety": "Common", "arrival_date": "2024-01-01",
                    "min_price": "2000", "max_price": "2500", "modal_price": "2250"
                }
            ]
        });

        let prices = LiveApiFetcher::parse_records(&json_data).unwrap();
        assert_eq!(prices.len(), 1);
        let r = &prices[0];
        assert_eq!(r.market, "Warangal");
        assert_eq!(r.min_price, 2000.0);
        assert_eq!(r.max_price, 2500.0);
        assert_eq!(r.modal_price, 2250.0);
        assert_eq!(r.unit, "Quintal");
    }

    #[test]
    fn test_malformed_row_is_skipped_not_fatal() {
        // 3 records, one with a non-numeric min_price: exactly 2 survive
        let json_data = json!({
            "records": [
                {
                    "market": "Khanna", "state": "Punjab", "district": "Ludhiana",
                    "commodity": "Wheat", "variety": "Dara", "arrival_date": "15/01/2024",
                    "min_price": "1900", "max_price": "2100", "modal_price": "2000"
                },
                {
                    "market": "Amritsar", "state": "Punjab", "district": "Amritsar",
                    "commodity": "Wheat", "variety": "Dara", "arrival_date": "15/01/2024",
                    "min_price": "NR", "max_price": "2150", "modal_price": "2050"
                },
                {
                    "market": "Patiala", "state": "Punjab", "district": "Patiala",
                    "commodity": "Wheat", "variety": "Dara", "arrival_date": "15/01/2024",
                    "min_price": "1950", "max_price": "2200", "modal_price": "2080"
                }
            ]
        });

        let prices = LiveApiFetcher::parse_records(&json_data).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].market, "Khanna");
        assert_eq!(prices[1].market, "Patiala");
    }

    #[test]
    fn test_missing_field_skips_row() {
        let json_data = json!({
            "records": [
                {
                    // no district
                    "market": "Kota", "state": "Rajasthan",
                    "commodity": "Soybean", "variety": "Yellow", "arrival_date": "2024-02-10",
                    "min_price": "4300", "max_price": "4600", "modal_price": "4450"
                }
            ]
        });

        let prices = LiveApiFetcher::parse_records(&json_data).unwrap();
        assert!(prices.is_empty());
    }

    #[test]
    fn test_missing_records_array_is_error() {
        let json_data = json!({ "error": "invalid api key" });
        assert!(LiveApiFetcher::parse_records(&json_data).is_err());
    }

    #[test]
    fn test_numeric_prices_accepted() {
        let json_data = json!({
            "records": [
                {
                    "market": "Indore", "state": "Madhya Pradesh", "district": "Indore",
                    "commodity": "Gram", "variety": "Desi", "arrival_date": "01/03/2024",
                    "min_price": 4800, "max_price": 5200, "modal_price": 5000
                }
            ]
        });

        let prices = LiveApiFetcher::parse_records(&json_data).unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].modal_price, 5000.0);
    }

    #[test]
    fn test_price_with_thousands_separator() {
        assert_eq!(parse_price(&json!("2,250")), Some(2250.0));
        assert_eq!(parse_price(&json!("bad")), None);
    }

    #[test]
    fn test_both_date_formats() {
        assert!(parse_arrival_date("15/01/2024").is_some());
        assert!(parse_arrival_date("2024-01-15").is_some());
        assert!(parse_arrival_date("Jan 15 2024").is_none());
    }
}
