use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of an Airtable table. Only `fields` is read when rendering.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Record {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// String value of `field`. Absent, empty and non-string values all read as `None`.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    /// First entry of an attachment field, if it parses as one.
    pub fn first_attachment(&self, field: &str) -> Option<Attachment> {
        let first = self.fields.get(field)?.as_array()?.first()?;
        Attachment::deserialize(first).ok()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachment {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl Attachment {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref().filter(|f| !f.is_empty())
    }
}

/// One page of a list-records response.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct RecordPage {
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub offset: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_list_response() {
        let page: RecordPage = serde_json::from_value(json!({
            "records": [
                {
                    "id": "rec1",
                    "createdTime": "2024-01-01T00:00:00.000Z",
                    "fields": {
                        "Title author": "Dune",
                        "Cover image": [{ "url": "https://x/y.jpg", "filename": "dune.png", "size": 10 }]
                    }
                },
                { "id": "rec2" }
            ],
            "offset": "itrA/rec2"
        }))
        .unwrap();

        assert_eq!(page.records.len(), 2);
        assert_eq!(page.offset.as_deref(), Some("itrA/rec2"));
        assert_eq!(page.records[0].text("Title author"), Some("Dune"));
        let cover = page.records[0].first_attachment("Cover image").unwrap();
        assert_eq!(cover.url(), Some("https://x/y.jpg"));
        assert_eq!(cover.filename(), Some("dune.png"));
        assert!(page.records[1].fields.is_empty());
    }

    #[test]
    fn missing_offset_and_records() {
        let page: RecordPage = serde_json::from_str("{}").unwrap();
        assert!(page.records.is_empty());
        assert!(page.offset.is_none());
    }

    #[test]
    fn empty_and_non_string_fields_read_as_missing() {
        let record: Record = serde_json::from_value(json!({
            "fields": { "Notes": "", "Title author": 42, "Link URL": null }
        }))
        .unwrap();
        assert_eq!(record.text("Notes"), None);
        assert_eq!(record.text("Title author"), None);
        assert_eq!(record.text("Link URL"), None);
        assert_eq!(record.text("Absent"), None);
    }

    #[test]
    fn malformed_attachments_read_as_missing() {
        let record: Record = serde_json::from_value(json!({
            "fields": {
                "Empty": [],
                "NotList": "https://x/y.jpg",
                "NoUrl": [{ "filename": "a.jpg" }],
                "BlankUrl": [{ "url": "" }]
            }
        }))
        .unwrap();
        assert!(record.first_attachment("Empty").is_none());
        assert!(record.first_attachment("NotList").is_none());
        assert!(record.first_attachment("Absent").is_none());
        assert_eq!(record.first_attachment("NoUrl").unwrap().url(), None);
        assert_eq!(record.first_attachment("BlankUrl").unwrap().url(), None);
    }
}
