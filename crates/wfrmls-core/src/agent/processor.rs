// Handles each page pulled by the data sync loop.
//
// Records are only inspected and logged here; this is the seam where a
// downstream store or queue would be plugged in.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use wfrmls_api::{ODataPage, Record};

use super::webhook::{Delivery, WebhookNotifier};
use crate::error::CoreError;

/// Records handled between cooperative yields.
const YIELD_EVERY: usize = 10;

/// Record families the sync loop feeds in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Property,
    Member,
    Office,
    OpenHouse,
    Deletion,
}

impl RecordKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::Member => "member",
            Self::Office => "office",
            Self::OpenHouse => "open house",
            Self::Deletion => "deletion",
        }
    }

    /// Identifying key, or `None` if the record lacks it.
    fn key(self, record: &Record) -> Option<String> {
        match self {
            Self::Property => text(record, "ListingKey").or_else(|| text(record, "ListingId")),
            Self::Member => text(record, "MemberKey"),
            Self::Office => text(record, "OfficeKey"),
            Self::OpenHouse => text(record, "OpenHouseKey"),
            Self::Deletion => {
                let resource = text(record, "ResourceName")?;
                let key = text(record, "ResourceRecordKey")?;
                Some(format!("{resource}:{key}"))
            }
        }
    }

    fn log(self, key: &str, record: &Record) {
        match self {
            Self::Property => debug!(
                key,
                status = ?record.get("StandardStatus"),
                price = ?record.get("ListPrice"),
                city = ?record.get("City"),
                "property"
            ),
            Self::Member => debug!(
                key,
                name = ?record.get("MemberFullName"),
                status = ?record.get("MemberStatus"),
                "member"
            ),
            Self::Office => debug!(
                key,
                name = ?record.get("OfficeName"),
                status = ?record.get("OfficeStatus"),
                "office"
            ),
            Self::OpenHouse => debug!(
                key,
                listing = ?record.get("ListingId"),
                start = ?record.get("OpenHouseStartTime"),
                end = ?record.get("OpenHouseEndTime"),
                "open house"
            ),
            Self::Deletion => debug!(key, "deleted record"),
        }
    }
}

/// String or numeric field rendered as text; empty strings count as missing.
fn text(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    event_type: &'a str,
    timestamp: String,
    data: &'a Value,
}

#[derive(Debug, Clone)]
pub struct DataProcessor {
    data_dir: PathBuf,
    webhook: Option<WebhookNotifier>,
}

impl DataProcessor {
    pub fn new(data_dir: impl Into<PathBuf>, webhook: Option<WebhookNotifier>) -> Self {
        Self {
            data_dir: data_dir.into(),
            webhook,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub async fn process_properties(&self, page: &ODataPage) -> usize {
        self.process(RecordKind::Property, &page.value).await
    }

    pub async fn process_members(&self, page: &ODataPage) -> usize {
        self.process(RecordKind::Member, &page.value).await
    }

    pub async fn process_offices(&self, page: &ODataPage) -> usize {
        self.process(RecordKind::Office, &page.value).await
    }

    pub async fn process_open_houses(&self, page: &ODataPage) -> usize {
        self.process(RecordKind::OpenHouse, &page.value).await
    }

    pub async fn process_deletions(&self, page: &ODataPage) -> usize {
        self.process(RecordKind::Deletion, &page.value).await
    }

    /// Walk `records`, returning how many were handled.
    ///
    /// Records missing their key are still counted, with a warning.
    pub async fn process(&self, kind: RecordKind, records: &[Record]) -> usize {
        let mut processed = 0;
        for record in records {
            match kind.key(record) {
                Some(key) => kind.log(&key, record),
                None => warn!(kind = kind.label(), "record missing key fields"),
            }
            processed += 1;
            if processed % YIELD_EVERY == 0 {
                tokio::task::yield_now().await;
            }
        }
        processed
    }

    /// POST `{event_type, timestamp, data}` to the webhook, if one is configured.
    pub async fn send_webhook(&self, event_type: &str, data: &Value) -> Option<Delivery> {
        let webhook = self.webhook.as_ref()?;
        let envelope = Envelope {
            event_type,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            data,
        };
        Some(webhook.post(&envelope).await)
    }

    /// Write `data` as pretty JSON to `data_dir/name`.
    pub async fn save_to_file<T: Serialize + Sync>(
        &self,
        name: &str,
        data: &T,
    ) -> Result<PathBuf, CoreError> {
        write_json(&self.data_dir, name, data).await
    }
}

/// Pretty-print `data` into `dir/name`, creating `dir` if needed.
pub(crate) async fn write_json<T: Serialize + Sync>(
    dir: &Path,
    name: &str,
    data: &T,
) -> Result<PathBuf, CoreError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| CoreError::io(dir, e))?;
    let path = dir.join(name);
    let body = serde_json::to_vec_pretty(data)?;
    tokio::fs::write(&path, body)
        .await
        .map_err(|e| CoreError::io(&path, e))?;
    debug!(path = %path.display(), "saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    fn page(records: Value) -> ODataPage {
        serde_json::from_value(json!({ "value": records })).unwrap()
    }

    #[tokio::test]
    async fn counts_every_record_including_keyless() {
        let processor = DataProcessor::new("unused", None);
        let properties = page(json!([
            {"ListingKey": "1", "StandardStatus": "Active"},
            {"ListingId": 2},
            {"StandardStatus": "Active"},
        ]));
        assert_eq!(processor.process_properties(&properties).await, 3);

        let many: Vec<Value> = (0..25).map(|i| json!({"MemberKey": i.to_string()})).collect();
        assert_eq!(processor.process_members(&page(Value::Array(many))).await, 25);
    }

    #[test]
    fn deletion_key_needs_both_fields() {
        let full = json!({"ResourceName": "Property", "ResourceRecordKey": "K1"});
        let partial = json!({"ResourceName": "Property"});
        assert_eq!(
            RecordKind::Deletion.key(full.as_object().unwrap()).as_deref(),
            Some("Property:K1")
        );
        assert_eq!(RecordKind::Deletion.key(partial.as_object().unwrap()), None);
        assert_eq!(
            RecordKind::Office.key(json!({"OfficeKey": ""}).as_object().unwrap()),
            None
        );
    }

    #[tokio::test]
    async fn save_to_file_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let processor = DataProcessor::new(dir.path().join("nested"), None);

        let path = processor
            .save_to_file("snapshot.json", &json!({"a": 1}))
            .await
            .unwrap();

        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, "{\n  \"a\": 1\n}");
    }

    #[tokio::test]
    async fn webhook_is_skipped_when_unconfigured() {
        let processor = DataProcessor::new("unused", None);
        assert_eq!(processor.send_webhook("sync", &json!({})).await, None);
    }
}
