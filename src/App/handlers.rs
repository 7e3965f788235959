// Example transforms served by a guest. They only see decoded views and
// return owned messages; nothing here knows about memory or ownership.

use crate::Exchange::guest::Handler;
use crate::Wire::message::{
    DataRequest, DataRequestViewer, DataResponse, Record, RecordViewer,
};

/// Keeps the numbers strictly greater than `k`, in input order.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilterGreaterThan;

impl Handler for FilterGreaterThan {
    type Request = DataRequest;
    type Response = DataResponse;

    fn handle(&mut self, request: DataRequestViewer<'_>) -> DataResponse {
        let k = request.k();
        DataResponse {
            numbers_greater_k: request.numbers().iter().filter(|&n| n > k).collect(),
        }
    }
}

/// Appends a suffix to the text, replaces the values wholesale and
/// increments the number.
#[derive(Debug, Clone)]
pub struct RecordTransform {
    pub suffix: String,
    pub values: Vec<i32>,
}

impl Default for RecordTransform {
    fn default() -> Self {
        Self {
            suffix: "bar".to_string(),
            values: vec![-1, -2, -3, -5],
        }
    }
}

impl Handler for RecordTransform {
    type Request = Record;
    type Response = Record;

    fn handle(&mut self, request: RecordViewer<'_>) -> Record {
        let mut text = String::with_capacity(request.text().len() + self.suffix.len());
        text.push_str(request.text());
        text.push_str(&self.suffix);
        Record {
            text,
            values: self.values.clone(),
            number: request.number().wrapping_add(1),
        }
    }
}
