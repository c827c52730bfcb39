//! Scripted fakes for the transport and sleeper seams.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use serde_json::json;

use crate::data::retry::Sleeper;
use crate::data::transport::{HttpReply, Transport};
use crate::error::TransientFailure;

type Call = (String, Vec<(String, String)>);

/// Replays a fixed list of replies and records every request.
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Result<HttpReply, TransientFailure>>>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<HttpReply, TransientFailure>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpReply, TransientFailure> {
        self.calls.borrow_mut().push((url.to_string(), query.to_vec()));
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransientFailure::Connection("no scripted reply left".into())))
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    delays: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) {
        self.delays.borrow_mut().push(delay);
    }
}

/// EIA-shaped body with string values, as the live API sends them.
pub fn data_body(rows: &[(&str, &str)]) -> String {
    let data: Vec<_> = rows
        .iter()
        .map(|(period, value)| json!({ "period": period, "value": value, "units": "$/BBL" }))
        .collect();
    json!({ "response": { "total": rows.len(), "data": data } }).to_string()
}
