//! EIA API v2 client for daily/periodic energy price series.
//!
//! The client resolves a logical series name through the static registry,
//! builds one `GET {base}/{route}/data/` request, retries transient failures
//! with exponential backoff, and normalizes the reply into a [`SeriesResult`].

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::data::config::ClientConfig;
use crate::data::normalize::decode_page;
use crate::data::registry;
use crate::data::retry::{self, Attempt, Sleeper, ThreadSleeper};
use crate::data::transport::{HttpReply, HttpTransport, Transport};
use crate::domain::{FrequencyParam, SeriesBatch, SeriesDefinition, SeriesResult};
use crate::error::{SeriesError, TransientFailure};

/// One upstream query for a single series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub route: String,
    pub series_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub frequency: FrequencyParam,
    pub length: usize,
}

impl SeriesRequest {
    pub fn for_series(
        def: &SeriesDefinition,
        start: NaiveDate,
        end: NaiveDate,
        frequency: Option<&FrequencyParam>,
        length: usize,
    ) -> Self {
        Self {
            route: def.route.to_string(),
            series_id: def.series_id.to_string(),
            start,
            end,
            frequency: frequency.cloned().unwrap_or_else(|| def.frequency.into()),
            length,
        }
    }

    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/{}/data/",
            base_url.trim_end_matches('/'),
            self.route.trim_matches('/')
        )
    }

    /// Query parameters, including the credential.
    pub fn query(&self, api_key: &str) -> Vec<(String, String)> {
        let pairs = [
            ("api_key", api_key.to_string()),
            ("frequency", self.frequency.as_str().to_string()),
            ("data[0]", "value".to_string()),
            ("facets[series][]", self.series_id.clone()),
            ("start", self.start.format("%Y-%m-%d").to_string()),
            ("end", self.end.format("%Y-%m-%d").to_string()),
            ("sort[0][column]", "period".to_string()),
            ("sort[0][direction]", "asc".to_string()),
            ("offset", "0".to_string()),
            ("length", self.length.to_string()),
        ];
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}

/// Client for the EIA series registry.
///
/// `T` performs HTTP; `S` sleeps between retries. Both are swapped out in tests.
pub struct SeriesClient<T = HttpTransport, S = ThreadSleeper> {
    config: ClientConfig,
    transport: T,
    sleeper: S,
}

impl SeriesClient {
    /// Build a client with the blocking HTTP transport.
    pub fn new(config: ClientConfig) -> Result<Self, SeriesError> {
        config.validate()?;
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self {
            config,
            transport,
            sleeper: ThreadSleeper,
        })
    }

    pub fn from_env() -> Result<Self, SeriesError> {
        Self::new(ClientConfig::from_env()?)
    }
}

impl<T: Transport, S: Sleeper> SeriesClient<T, S> {
    pub fn with_parts(config: ClientConfig, transport: T, sleeper: S) -> Result<Self, SeriesError> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            sleeper,
        })
    }

    /// Every series this client can fetch.
    pub fn list_available(&self) -> &'static [SeriesDefinition] {
        registry::all()
    }

    /// Fetch one series over `[start, end]`.
    ///
    /// `frequency` overrides the series default. `start > end` is sent upstream as-is.
    pub fn fetch(
        &self,
        series_name: &str,
        start: NaiveDate,
        end: NaiveDate,
        frequency: Option<&FrequencyParam>,
    ) -> Result<SeriesResult, SeriesError> {
        let def = registry::lookup(series_name)
            .ok_or_else(|| SeriesError::UnknownSeries(series_name.to_string()))?;
        let request = SeriesRequest::for_series(def, start, end, frequency, self.config.page_length);
        self.execute(def.name, &request)
    }

    /// Fetch several series one after another.
    ///
    /// The first error aborts the whole batch; no partial results are returned.
    pub fn fetch_many<I, N>(
        &self,
        series_names: I,
        start: NaiveDate,
        end: NaiveDate,
        frequency: Option<&FrequencyParam>,
    ) -> Result<SeriesBatch, SeriesError>
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let mut batch = SeriesBatch::new();
        for name in series_names {
            let name = name.as_ref();
            if batch.contains(name) {
                continue;
            }
            let result = self.fetch(name, start, end, frequency)?;
            batch.insert(name, result);
        }
        Ok(batch)
    }

    fn execute(&self, label: &str, request: &SeriesRequest) -> Result<SeriesResult, SeriesError> {
        let url = request.url(&self.config.base_url);
        let query = request.query(&self.config.api_key);

        retry::run(&self.config.retry, &self.sleeper, label, |attempt| {
            debug!(
                series = label,
                attempt,
                route = %request.route,
                frequency = %request.frequency,
                start = %request.start,
                end = %request.end,
                "requesting EIA series"
            );
            match self.transport.get(&url, &query) {
                Ok(reply) => self.classify(label, request, reply),
                Err(failure) => Attempt::Retry(failure),
            }
        })
    }

    fn classify(&self, label: &str, request: &SeriesRequest, reply: HttpReply) -> Attempt<SeriesResult> {
        match reply.status {
            200..=299 => match decode_page(&reply.body) {
                Ok(page) => {
                    if let Some(total) = page.total {
                        let returned = page.result.len() + page.skipped;
                        if total > returned as u64 {
                            warn!(
                                series = label,
                                total,
                                returned,
                                "EIA returned one page of {} rows; later observations in the window were not fetched",
                                request.length
                            );
                        }
                    }
                    Attempt::Done(page.result)
                }
                // A 2xx body that is not JSON is usually an HTML page from a proxy
                // or gateway in front of the API; the next attempt tends to reach
                // the real service, so treat it like a transient network failure.
                Err(failure) => Attempt::Retry(failure),
            },
            400..=499 => {
                let message = decode_error_message(&reply.body);
                warn!(series = label, status = reply.status, "bad request to EIA API: {message}");
                Attempt::Abort(SeriesError::InvalidRequest {
                    status: reply.status,
                    message,
                    body: reply.body,
                })
            }
            // 5xx (and anything else unexpected) is the upstream's problem, not ours.
            status => Attempt::Retry(TransientFailure::ServerStatus {
                status,
                body: reply.body,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Pull the human-readable message out of an upstream error body.
fn decode_error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(msg) = parsed.error.or(parsed.message) {
            return msg;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "(empty response body)".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::data::testing::{RecordingSleeper, ScriptedTransport, data_body};
    use crate::domain::Frequency;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const WTI: &str = "WTI Crude Oil Spot Price";
    const BRENT: &str = "Brent Crude Oil Spot Price";

    fn client<'a>(
        transport: &'a ScriptedTransport,
        sleeper: &'a RecordingSleeper,
    ) -> SeriesClient<&'a ScriptedTransport, &'a RecordingSleeper> {
        SeriesClient::with_parts(ClientConfig::new("test_key"), transport, sleeper).unwrap()
    }

    fn timeout() -> Result<HttpReply, TransientFailure> {
        Err(TransientFailure::Timeout("operation timed out".into()))
    }

    #[test]
    fn builds_the_documented_query() {
        let transport = ScriptedTransport::new(vec![Ok(HttpReply::new(200, data_body(&[])))]);
        let sleeper = RecordingSleeper::default();
        client(&transport, &sleeper)
            .fetch(WTI, d(2024, 1, 1), d(2024, 3, 31), None)
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        let (url, query) = &calls[0];
        assert_eq!(url, "https://api.eia.gov/v2/petroleum/pri/spt/data/");

        fn values<'a>(query: &'a [(String, String)], key: &str) -> Vec<&'a str> {
            query.iter().filter(|(k, _)| k == key).map(|(_, v)| v.as_str()).collect()
        }
        let get = |key: &str| values(query, key);
        assert_eq!(get("api_key"), vec!["test_key"]);
        assert_eq!(get("frequency"), vec!["daily"]);
        assert_eq!(get("data[0]"), vec!["value"]);
        assert_eq!(get("facets[series][]"), vec!["RWTC"]);
        assert_eq!(get("start"), vec!["2024-01-01"]);
        assert_eq!(get("end"), vec!["2024-03-31"]);
        assert_eq!(get("sort[0][column]"), vec!["period"]);
        assert_eq!(get("sort[0][direction]"), vec!["asc"]);
        assert_eq!(get("offset"), vec!["0"]);
        assert_eq!(get("length"), vec!["5000"]);
    }

    #[test]
    fn frequency_override_and_passthrough() {
        let transport = ScriptedTransport::new(vec![
            Ok(HttpReply::new(200, data_body(&[]))),
            Ok(HttpReply::new(200, data_body(&[]))),
        ]);
        let sleeper = RecordingSleeper::default();
        let c = client(&transport, &sleeper);

        c.fetch(WTI, d(2024, 1, 1), d(2024, 2, 1), Some(&Frequency::Monthly.into()))
            .unwrap();
        let raw: FrequencyParam = "hourly".parse().unwrap();
        c.fetch(WTI, d(2024, 1, 1), d(2024, 2, 1), Some(&raw)).unwrap();

        let freqs: Vec<String> = transport
            .calls()
            .iter()
            .map(|(_, q)| q.iter().find(|(k, _)| k == "frequency").unwrap().1.clone())
            .collect();
        assert_eq!(freqs, vec!["monthly", "hourly"]);
    }

    #[test]
    fn unknown_series_makes_no_network_call() {
        let transport = ScriptedTransport::new(vec![]);
        let sleeper = RecordingSleeper::default();
        let err = client(&transport, &sleeper)
            .fetch("Invalid Series Name", d(2024, 1, 1), d(2024, 1, 2), None)
            .unwrap_err();
        assert_eq!(err, SeriesError::UnknownSeries("Invalid Series Name".into()));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn successful_fetch_is_normalized() {
        let body = data_body(&[("2024-01-02", "76.25"), ("2024-01-01", "75.50")]);
        let transport = ScriptedTransport::new(vec![Ok(HttpReply::new(200, body))]);
        let sleeper = RecordingSleeper::default();
        let result = client(&transport, &sleeper)
            .fetch(WTI, d(2024, 1, 1), d(2024, 1, 2), None)
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.points()[0].date, d(2024, 1, 1));
        assert_eq!(result.points()[0].value, 75.50);
    }

    #[test]
    fn two_timeouts_then_success() {
        let body = data_body(&[("2024-01-01", "75.0")]);
        let transport = ScriptedTransport::new(vec![timeout(), timeout(), Ok(HttpReply::new(200, body))]);
        let sleeper = RecordingSleeper::default();
        let result = client(&transport, &sleeper)
            .fetch(WTI, d(2024, 1, 1), d(2024, 1, 1), None)
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(transport.calls().len(), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[test]
    fn three_timeouts_exhaust_the_budget() {
        let transport = ScriptedTransport::new(vec![timeout(), timeout(), timeout(), timeout()]);
        let sleeper = RecordingSleeper::default();
        let err = client(&transport, &sleeper)
            .fetch(WTI, d(2024, 1, 1), d(2024, 1, 31), None)
            .unwrap_err();

        match err {
            SeriesError::RetryableTransport { attempts, failure } => {
                assert_eq!(attempts, 3);
                assert!(failure.is_timeout());
            }
            other => panic!("expected transport error, got {other:?}"),
        }
        assert_eq!(transport.calls().len(), 3);
        assert_eq!(sleeper.delays().len(), 2);
    }

    #[test]
    fn client_error_is_not_retried() {
        let body = r#"{"error":"Invalid frequency 'weekly' for route petroleum/pri/spt.","code":400}"#;
        let transport = ScriptedTransport::new(vec![
            Ok(HttpReply::new(400, body)),
            Ok(HttpReply::new(200, data_body(&[]))),
        ]);
        let sleeper = RecordingSleeper::default();
        let err = client(&transport, &sleeper)
            .fetch(WTI, d(2024, 1, 1), d(2024, 1, 31), Some(&Frequency::Weekly.into()))
            .unwrap_err();

        match &err {
            SeriesError::InvalidRequest { status, message, body: raw } => {
                assert_eq!(*status, 400);
                assert!(message.starts_with("Invalid frequency"));
                assert_eq!(raw, body);
            }
            other => panic!("expected invalid request, got {other:?}"),
        }
        assert_eq!(transport.calls().len(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[test]
    fn server_errors_and_garbage_bodies_are_retried() {
        let transport = ScriptedTransport::new(vec![
            Ok(HttpReply::new(503, "unavailable")),
            Ok(HttpReply::new(200, "<html>proxy error</html>")),
            Ok(HttpReply::new(200, data_body(&[("2024-01-01", "1")]))),
        ]);
        let sleeper = RecordingSleeper::default();
        let result = client(&transport, &sleeper)
            .fetch(WTI, d(2024, 1, 1), d(2024, 1, 1), None)
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(transport.calls().len(), 3);
    }

    #[test]
    fn empty_response_is_success_not_error() {
        let transport = ScriptedTransport::new(vec![Ok(HttpReply::new(200, r#"{"response":{"data":[]}}"#))]);
        let sleeper = RecordingSleeper::default();
        let result = client(&transport, &sleeper)
            .fetch(WTI, d(2030, 1, 1), d(2030, 1, 2), None)
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.columns(), ["date", "value"]);
    }

    #[test]
    fn wrongly_shaped_json_is_empty_without_retrying() {
        let transport = ScriptedTransport::new(vec![Ok(HttpReply::new(200, r#"{"response":{"data":{}}}"#))]);
        let sleeper = RecordingSleeper::default();
        let result = client(&transport, &sleeper)
            .fetch(WTI, d(2024, 1, 1), d(2024, 1, 2), None)
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(transport.calls().len(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[test]
    fn fetch_many_is_sequential_and_aborts_on_first_failure() {
        let transport = ScriptedTransport::new(vec![
            Ok(HttpReply::new(200, data_body(&[("2024-01-01", "75")]))),
            Ok(HttpReply::new(200, data_body(&[("2024-01-01", "78")]))),
        ]);
        let sleeper = RecordingSleeper::default();
        let c = client(&transport, &sleeper);
        let batch = c
            .fetch_many([WTI, BRENT, WTI], d(2024, 1, 1), d(2024, 1, 1), None)
            .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.iter().map(|(n, _)| n).collect::<Vec<_>>(), vec![WTI, BRENT]);
        assert_eq!(transport.calls().len(), 2);

        let transport = ScriptedTransport::new(vec![
            Ok(HttpReply::new(400, r#"{"error":"bad"}"#)),
            Ok(HttpReply::new(200, data_body(&[]))),
        ]);
        let c = client(&transport, &sleeper);
        let err = c
            .fetch_many([WTI, BRENT], d(2024, 1, 1), d(2024, 1, 1), None)
            .unwrap_err();
        assert!(err.is_invalid_request());
        assert_eq!(transport.calls().len(), 1);
    }

    #[test]
    fn list_available_is_the_registry() {
        let transport = ScriptedTransport::new(vec![]);
        let sleeper = RecordingSleeper::default();
        let c = client(&transport, &sleeper);
        let names: Vec<&str> = c.list_available().iter().map(|d| d.name).collect();
        assert!(names.contains(&WTI));
        assert!(names.contains(&BRENT));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn construction_requires_a_key() {
        let transport = ScriptedTransport::new(vec![]);
        let sleeper = RecordingSleeper::default();
        let res = SeriesClient::with_parts(ClientConfig::new(""), &transport, &sleeper);
        assert!(matches!(res, Err(SeriesError::Configuration(_))));
    }

    #[test]
    fn error_message_decoding() {
        assert_eq!(decode_error_message(r#"{"error":"nope"}"#), "nope");
        assert_eq!(decode_error_message(r#"{"message":"also nope"}"#), "also nope");
        assert_eq!(decode_error_message("plain text\n"), "plain text");
        assert_eq!(decode_error_message(""), "(empty response body)");
    }
}
