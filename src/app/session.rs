//! Per-process state shared by interactive fetches.
//!
//! - a response cache keyed by `(selection, range, frequency)`
//! - frequencies the upstream rejected for a given set of series

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};

use crate::data::{SeriesClient, Sleeper, Transport};
use crate::domain::{DateRange, Frequency, FrequencyParam, SeriesBatch};
use crate::error::SeriesError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub series: Vec<String>,
    pub range: DateRange,
    pub frequency: Frequency,
}

#[derive(Debug, Default)]
pub struct Session {
    cache: HashMap<Query, SeriesBatch>,
    rejected: HashMap<Vec<String>, BTreeSet<Frequency>>,
}

/// Order-insensitive identity of a series selection.
fn selection_key<S: AsRef<str>>(series: &[S]) -> Vec<String> {
    let key: BTreeSet<String> = series.iter().map(|s| s.as_ref().to_string()).collect();
    key.into_iter().collect()
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frequencies that may still be offered for `series`.
    ///
    /// When every frequency has been rejected the memory for the selection is
    /// cleared and all frequencies are offered again.
    pub fn available_frequencies<S: AsRef<str>>(&mut self, series: &[S]) -> Vec<Frequency> {
        let key = selection_key(series);
        let remaining: Vec<Frequency> = match self.rejected.get(&key) {
            Some(bad) => Frequency::ALL.into_iter().filter(|f| !bad.contains(f)).collect(),
            None => return Frequency::ALL.to_vec(),
        };
        if remaining.is_empty() {
            info!(selection = ?key, "every frequency was rejected; resetting frequency memory");
            self.rejected.remove(&key);
            return Frequency::ALL.to_vec();
        }
        remaining
    }

    pub fn is_rejected<S: AsRef<str>>(&self, series: &[S], frequency: Frequency) -> bool {
        self.rejected
            .get(&selection_key(series))
            .is_some_and(|bad| bad.contains(&frequency))
    }

    /// Fetch through the cache.
    ///
    /// An `InvalidRequest` marks the frequency as rejected for the selection.
    pub fn load<T: Transport, S: Sleeper>(
        &mut self,
        client: &SeriesClient<T, S>,
        query: &Query,
    ) -> Result<SeriesBatch, SeriesError> {
        if let Some(hit) = self.cache.get(query) {
            debug!(series = ?query.series, frequency = %query.frequency, "session cache hit");
            return Ok(hit.clone());
        }

        let frequency = FrequencyParam::from(query.frequency);
        match client.fetch_many(&query.series, query.range.start, query.range.end, Some(&frequency)) {
            Ok(batch) => {
                self.cache.insert(query.clone(), batch.clone());
                Ok(batch)
            }
            Err(err) => {
                if err.is_invalid_request() {
                    self.rejected
                        .entry(selection_key(&query.series))
                        .or_default()
                        .insert(query.frequency);
                }
                Err(err)
            }
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::ClientConfig;
    use crate::data::testing::{RecordingSleeper, ScriptedTransport, data_body};
    use crate::data::HttpReply;

    const WTI: &str = "WTI Crude Oil Spot Price";
    const BRENT: &str = "Brent Crude Oil Spot Price";

    fn query(series: &[&str], frequency: Frequency) -> Query {
        Query {
            series: series.iter().map(|s| s.to_string()).collect(),
            range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            ),
            frequency,
        }
    }

    fn client<'a>(
        transport: &'a ScriptedTransport,
        sleeper: &'a RecordingSleeper,
    ) -> SeriesClient<&'a ScriptedTransport, &'a RecordingSleeper> {
        SeriesClient::with_parts(ClientConfig::new("k"), transport, sleeper).unwrap()
    }

    fn scripted(replies: Vec<HttpReply>) -> ScriptedTransport {
        ScriptedTransport::new(replies.into_iter().map(Ok).collect())
    }

    #[test]
    fn rejected_frequency_is_remembered_order_insensitively() {
        let transport = scripted(vec![HttpReply::new(400, r#"{"error":"invalid frequency"}"#)]);
        let sleeper = RecordingSleeper::default();
        let client = client(&transport, &sleeper);
        let mut session = Session::new();

        let err = session
            .load(&client, &query(&[WTI, BRENT], Frequency::Weekly))
            .unwrap_err();
        assert!(err.is_invalid_request());
        assert_eq!(transport.calls().len(), 1);
        assert!(sleeper.delays().is_empty());

        assert!(session.is_rejected(&[BRENT, WTI], Frequency::Weekly));
        assert!(!session.is_rejected(&[WTI], Frequency::Weekly));
        assert_eq!(
            session.available_frequencies(&[BRENT, WTI]),
            vec![Frequency::Daily, Frequency::Monthly, Frequency::Annual]
        );
    }

    #[test]
    fn memory_resets_when_every_frequency_is_rejected() {
        let transport = scripted(Frequency::ALL.iter().map(|_| HttpReply::new(400, "bad")).collect());
        let sleeper = RecordingSleeper::default();
        let client = client(&transport, &sleeper);
        let mut session = Session::new();

        let (last, rest) = Frequency::ALL.split_last().unwrap();
        for f in rest {
            let err = session.load(&client, &query(&[WTI], *f)).unwrap_err();
            assert!(err.is_invalid_request());
        }
        assert_eq!(session.available_frequencies(&[WTI]), vec![*last]);

        let err = session.load(&client, &query(&[WTI], *last)).unwrap_err();
        assert!(err.is_invalid_request());
        for f in Frequency::ALL {
            assert!(session.is_rejected(&[WTI], f));
        }

        assert_eq!(session.available_frequencies(&[WTI]), Frequency::ALL.to_vec());
        assert!(!session.is_rejected(&[WTI], Frequency::Daily));
        assert_eq!(transport.calls().len(), Frequency::ALL.len());
    }

    #[test]
    fn cached_query_is_not_fetched_twice() {
        let transport = scripted(vec![HttpReply::new(200, data_body(&[("2024-01-02", "72.70")]))]);
        let sleeper = RecordingSleeper::default();
        let client = client(&transport, &sleeper);
        let mut session = Session::new();
        let q = query(&[WTI], Frequency::Daily);

        let first = session.load(&client, &q).unwrap();
        let second = session.load(&client, &q).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.get(WTI).map(|r| r.len()), Some(1));
        assert_eq!(transport.calls().len(), 1);

        session.clear_cache();
        // nothing scripted is left, so a refetch surfaces a transport error
        let err = session.load(&client, &q).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
