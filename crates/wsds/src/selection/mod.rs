//! Selection reconciliation for the workspace data source panel.

pub mod expand;
mod model;

pub use model::{SelectionModel, SelectionState, Toggle};

use tokio::sync::mpsc;

use crate::source::Connection;

/// Receives the full assigned set after every commit or removal.
pub trait ChangeSink {
    fn on_change(&mut self, assigned: &[Connection]);
}

impl<F> ChangeSink for F
where
    F: FnMut(&[Connection]),
{
    fn on_change(&mut self, assigned: &[Connection]) {
        self(assigned)
    }
}

/// Sink that records every notification (useful for hosts that poll).
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub calls: Vec<Vec<Connection>>,
}

impl RecordingSink {
    pub fn last(&self) -> Option<&[Connection]> {
        self.calls.last().map(Vec::as_slice)
    }
}

impl ChangeSink for RecordingSink {
    fn on_change(&mut self, assigned: &[Connection]) {
        self.calls.push(assigned.to_vec());
    }
}

/// Forwards every notification over a channel to the host's event loop.
#[derive(Debug, Clone)]
pub struct ChannelSink(pub mpsc::UnboundedSender<Vec<Connection>>);

impl ChangeSink for ChannelSink {
    fn on_change(&mut self, assigned: &[Connection]) {
        if self.0.send(assigned.to_vec()).is_err() {
            tracing::debug!("change receiver dropped, {} connection(s) lost", assigned.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |assigned: &[Connection]| seen.push(assigned.len());
            sink.on_change(&[Connection::open_search("ds1", "Data Source 1")]);
            sink.on_change(&[]);
        }
        assert_eq!(seen, vec![1, 0]);
    }

    #[test]
    fn test_channel_sink_forwards() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sink = ChannelSink(tx);
        sink.on_change(&[Connection::open_search("ds1", "Data Source 1")]);

        let received = rx.try_recv().unwrap();
        assert_eq!(received[0].id, "ds1");
        assert!(rx.try_recv().is_err());
    }
}
