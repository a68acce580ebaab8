use std::path::Path;

use anyhow::{Context, Result};
use reelgen_core::{
    events::{EnrichedEvent, Event},
    routes::ANY_EVENT,
    subscribers::{Inbox, SubscriptionSpec},
};
use serde::Serialize;
use tokio::{
    fs::File,
    io::{AsyncWriteExt, BufWriter},
};
use uuid::Uuid;

#[derive(Serialize)]
struct JournalLine<'a> {
    session_id: Uuid,
    seq: u64,
    event_type: &'static str,
    event: &'a dyn Event,
}

fn to_line(enriched: &EnrichedEvent) -> Result<String> {
    let line = JournalLine {
        session_id: enriched.session_id,
        seq: enriched.ingest_seq,
        event_type: enriched.event.event_type(),
        event: &*enriched.event,
    };
    let mut json = serde_json::to_string(&line)?;
    json.push('\n');
    Ok(json)
}

/// Appends every bus event to a file as one JSON object per line.
pub struct JournalSink {
    writer: BufWriter<File>,
}

impl JournalSink {
    pub const SUBSCRIBER_ID: &'static str = "cli.journal";

    pub fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            event_types: vec![ANY_EVENT],
            capacity: 256,
        }
    }

    pub async fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .await
            .with_context(|| format!("cannot create events file {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Write events until the bus is closed.
    pub async fn run(mut self, inbox: Inbox) -> Result<()> {
        while let Some(enriched) = inbox.recv().await {
            self.writer.write_all(to_line(&enriched)?.as_bytes()).await?;
        }
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reelgen_core::{
        events::bus_builder, provider::Provider, stages::events::RunStarted,
    };

    use super::*;

    #[tokio::test]
    async fn writes_one_json_line_per_event() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("events.jsonl");

        let (bus, mut wiring) = bus_builder()
            .subscribe(JournalSink::subscription())
            .build()
            .unwrap();
        let sink = JournalSink::create(&path).await.unwrap();
        let task = tokio::spawn(sink.run(wiring.take(JournalSink::SUBSCRIBER_ID).unwrap()));

        for topic in ["first", "second"] {
            bus.publish(Arc::new(RunStarted::new(
                Uuid::new_v4(),
                topic,
                Provider::Groq,
                "out.mp4".into(),
            )));
        }
        bus.close();
        task.await.unwrap().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event_type"], "run.started");
        assert_eq!(lines[1]["seq"], 1);
        assert_eq!(lines[1]["event"]["topic"], "second");
        assert_eq!(lines[0]["event"]["provider"], "groq");
        assert_eq!(lines[0]["session_id"], bus.session_id().to_string());
    }
}
