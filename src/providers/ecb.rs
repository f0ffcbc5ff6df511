use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, instrument};

use crate::core::error::{ConverterError, ConverterResult};
use crate::core::rates::{CurrencyRate, RateSource, RateTable};

/// Daily reference rates published by the European Central Bank.
pub const ECB_DAILY_URL: &str = "https://www.ecb.europa.eu/stats/eurofxref/eurofxref-daily.xml";

// <gesmes:Envelope><Cube><Cube time=".."><Cube currency=".." rate=".."/>..
#[derive(Debug, Deserialize)]
struct EcbEnvelope {
    #[serde(rename = "Cube")]
    cube: Option<EcbCubeWrapper>,
}

#[derive(Debug, Deserialize)]
struct EcbCubeWrapper {
    #[serde(rename = "Cube")]
    cube: Option<EcbDailyCube>,
}

// Every child element lands in `entries`, so elements other than rate cubes
// may sit anywhere in the list without splitting it.
#[derive(Debug, Deserialize)]
struct EcbDailyCube {
    time: String,
    #[serde(rename = "$value", default)]
    entries: Vec<EcbEntry>,
}

#[derive(Debug, Deserialize)]
struct EcbEntry {
    currency: Option<String>,
    rate: Option<String>,
}

/// Parses an ECB daily document and appends the base currency.
pub fn parse_rates(body: &[u8]) -> ConverterResult<RateTable> {
    let envelope: EcbEnvelope = serde_xml_rs::from_reader(body).map_err(|e| {
        error!(
            error = %e,
            body = %String::from_utf8_lossy(&body[..body.len().min(512)]),
            "Failed to parse rate document"
        );
        ConverterError::Parse(e.to_string())
    })?;

    let daily = envelope
        .cube
        .and_then(|wrapper| wrapper.cube)
        .ok_or_else(|| ConverterError::Parse("Missing daily rate cube".to_string()))?;

    let mut rates = Vec::with_capacity(daily.entries.len() + 1);
    for entry in daily.entries {
        let Some(currency) = entry.currency else {
            continue;
        };
        let raw_rate = entry.rate.ok_or_else(|| {
            ConverterError::Parse(format!("Missing rate for currency {currency}"))
        })?;
        let rate = raw_rate
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .ok_or_else(|| {
                ConverterError::Parse(format!("Invalid rate {raw_rate} for currency {currency}"))
            })?;
        rates.push(CurrencyRate::new(&currency, rate));
    }

    debug!(count = rates.len(), time = %daily.time, "Parsed rate document");
    Ok(RateTable::new(&daily.time, rates).with_base_currency())
}

/// Fetches the ECB daily document on every call.
pub struct EcbRateSource {
    url: String,
}

impl EcbRateSource {
    pub fn new(url: &str) -> Self {
        EcbRateSource {
            url: url.to_string(),
        }
    }

    fn fetch_error(&self, reason: String) -> ConverterError {
        ConverterError::Fetch {
            url: self.url.clone(),
            reason,
        }
    }
}

#[async_trait]
impl RateSource for EcbRateSource {
    #[instrument(name = "EcbRateFetch", skip(self), fields(url = %self.url))]
    async fn fetch_rates(&self) -> ConverterResult<RateTable> {
        debug!("Requesting exchange rates from {}", self.url);

        let client = reqwest::Client::builder()
            .user_agent("fxconv/1.0")
            .build()
            .map_err(|e| self.fetch_error(format!("Client error: {e}")))?;

        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.fetch_error(format!("Request error: {e}")))?;

        if !response.status().is_success() {
            return Err(self.fetch_error(format!("HTTP error: {}", response.status())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.fetch_error(format!("Failed to read response body: {e}")))?;

        parse_rates(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DAILY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gesmes:Envelope xmlns:gesmes="http://www.gesmes.org/xml/2002-08-01" xmlns="http://www.ecb.int/vocabulary/2002-08-01/eurofxref">
	<gesmes:subject>Reference rates</gesmes:subject>
	<gesmes:Sender>
		<gesmes:name>European Central Bank</gesmes:name>
	</gesmes:Sender>
	<Cube>
		<Cube time='2025-03-20'>
			<Cube currency='USD' rate='1.0852'/>
			<Cube currency='JPY' rate='161.53'/>
			<Cube currency='PLN' rate='4.1923'/>
		</Cube>
	</Cube>
</gesmes:Envelope>"#;

    pub async fn create_mock_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/stats/eurofxref/eurofxref-daily.xml"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn feed_url(server: &MockServer) -> String {
        format!("{}/stats/eurofxref/eurofxref-daily.xml", server.uri())
    }

    #[test]
    fn test_parse_daily_document() {
        let table = parse_rates(DAILY_XML.as_bytes()).unwrap();

        assert_eq!(table.time, "2025-03-20");
        assert_eq!(
            table.rates,
            vec![
                CurrencyRate::new("USD", 1.0852),
                CurrencyRate::new("JPY", 161.53),
                CurrencyRate::new("PLN", 4.1923),
                CurrencyRate::new("EUR", 1.0),
            ]
        );
    }

    #[test]
    fn test_parse_ignores_unknown_attributes_and_elements() {
        let xml = r#"<Envelope>
            <Extra>ignored</Extra>
            <Cube source="ecb">
                <Cube time="2025-03-21" revision="2">
                    <Cube currency="USD" rate="1.09" flag="x"/>
                </Cube>
            </Cube>
        </Envelope>"#;

        let table = parse_rates(xml.as_bytes()).unwrap();
        assert_eq!(table.time, "2025-03-21");
        assert_eq!(table.rate_of("USD"), Some(1.09));
        assert_eq!(table.rate_of("EUR"), Some(1.0));
    }

    #[test]
    fn test_parse_skips_unknown_elements_between_rates() {
        let xml = r#"<Envelope><Cube><Cube time="2025-03-21">
            <Cube currency="USD" rate="1.1"/>
            <Note/>
            <Cube currency="JPY" rate="161.5"/>
            <Note>published late</Note>
            <Cube currency="PLN" rate="4.2"/>
        </Cube></Cube></Envelope>"#;

        let table = parse_rates(xml.as_bytes()).unwrap();
        let codes: Vec<&str> = table.currencies().collect();
        assert_eq!(codes, vec!["USD", "JPY", "PLN", "EUR"]);
        assert_eq!(table.rate_of("PLN"), Some(4.2));
    }

    #[test]
    fn test_parse_rejects_rate_entry_without_rate() {
        let xml = r#"<Envelope><Cube><Cube time="2025-03-21">
            <Cube currency="USD"/>
        </Cube></Cube></Envelope>"#;

        let err = parse_rates(xml.as_bytes()).unwrap_err();
        assert_eq!(
            err,
            ConverterError::Parse("Missing rate for currency USD".to_string())
        );
    }

    #[test]
    fn test_parse_with_base_currency_already_present() {
        let xml = r#"<Envelope><Cube><Cube time="2025-03-21">
            <Cube currency="EUR" rate="1.0"/>
            <Cube currency="USD" rate="1.09"/>
        </Cube></Cube></Envelope>"#;

        let table = parse_rates(xml.as_bytes()).unwrap();
        let codes: Vec<&str> = table.currencies().collect();
        assert_eq!(codes, vec!["EUR", "USD", "EUR"]);
    }

    #[test]
    fn test_parse_missing_daily_cube() {
        let xml = r#"<Envelope><Cube></Cube></Envelope>"#;
        let err = parse_rates(xml.as_bytes()).unwrap_err();
        assert_eq!(
            err,
            ConverterError::Parse("Missing daily rate cube".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_non_positive_rate() {
        let xml = r#"<Envelope><Cube><Cube time="2025-03-21">
            <Cube currency="USD" rate="0"/>
        </Cube></Cube></Envelope>"#;

        let err = parse_rates(xml.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Invalid rate 0 for currency USD"));
    }

    #[test]
    fn test_parse_rejects_non_xml() {
        let result = parse_rates(b"{\"rates\": []}");
        assert!(matches!(result, Err(ConverterError::Parse(_))));
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let mock_server = create_mock_server(200, DAILY_XML).await;
        let source = EcbRateSource::new(&feed_url(&mock_server));

        let table = source.fetch_rates().await.expect("Failed to fetch rates");
        assert_eq!(table.time, "2025-03-20");
        assert_eq!(table.rates.len(), 4);
        assert_eq!(table.rate_of("JPY"), Some(161.53));
        assert_eq!(table.rates.last(), Some(&CurrencyRate::new("EUR", 1.0)));
    }

    #[tokio::test]
    async fn test_rate_fetch_http_error() {
        let mock_server = create_mock_server(500, "").await;
        let url = feed_url(&mock_server);
        let source = EcbRateSource::new(&url);

        let err = source.fetch_rates().await.unwrap_err();
        assert_eq!(
            err,
            ConverterError::Fetch {
                url,
                reason: "HTTP error: 500 Internal Server Error".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_rate_fetch_unreachable() {
        let source = EcbRateSource::new("http://127.0.0.1:9/eurofxref-daily.xml");
        let err = source.fetch_rates().await.unwrap_err();
        assert!(matches!(err, ConverterError::Fetch { .. }));
        assert!(err.to_string().contains("Request error"));
    }

    #[tokio::test]
    async fn test_rate_fetch_malformed_document() {
        let mock_server = create_mock_server(200, "<html><body>Maintenance</body>").await;
        let source = EcbRateSource::new(&feed_url(&mock_server));

        let err = source.fetch_rates().await.unwrap_err();
        assert!(matches!(err, ConverterError::Parse(_)));
    }

    #[tokio::test]
    async fn test_every_call_hits_the_feed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stats/eurofxref/eurofxref-daily.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DAILY_XML))
            .expect(2)
            .mount(&mock_server)
            .await;

        let source = EcbRateSource::new(&feed_url(&mock_server));
        source.fetch_rates().await.unwrap();
        source.fetch_rates().await.unwrap();
    }
}
