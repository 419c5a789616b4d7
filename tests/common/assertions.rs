//! CSV readers and event helpers for integration assertions

use channel_harvest::Event;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::broadcast::Receiver;

/// One CSV row keyed by column name
pub type Row = HashMap<String, String>;

/// Read a harvested CSV back as header plus rows
pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Row>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|record| {
            let record = record.unwrap();
            headers
                .iter()
                .cloned()
                .zip(record.iter().map(String::from))
                .collect()
        })
        .collect();
    (headers, rows)
}

/// Value of `column` in every row, in file order
pub fn column(rows: &[Row], column: &str) -> Vec<String> {
    rows.iter().map(|row| row[column].clone()).collect()
}

/// Drain every event already buffered on `events`
pub fn drain_events(events: &mut Receiver<Event>) -> Vec<Event> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
