//! Typed Trac client
//!
//! Wraps an [`RpcTransport`] and turns the loosely typed XML-RPC results of
//! the Trac XmlRpcPlugin into domain records. Description, comment, milestone
//! and wiki text is converted to Markdown on the way in.

use super::transport::{RpcTransport, XmlRpcTransport};
use super::value::RpcValue;
use crate::config::TracConfig;
use crate::core::transform::{convert, normalize_int, normalize_time, to_attribute_value};
use crate::domain::ticket::{COMMENT_FIELD, DESCRIPTION_FIELD};
use crate::domain::{
    Attachment, AttributeValue, Attributes, ChangeLogEntry, Milestone, MigrationError, Result,
    SearchFilter, SearchResult, Ticket, TicketField, TicketHistory, TracError, WikiPageInfo,
};
use std::fmt;
use std::sync::Arc;

/// Methods the migration cannot work without
pub const EXPECTED_METHODS: [&str; 3] = ["ticket.get", "ticket.query", "wiki.getPage"];

/// Oldest XML-RPC plugin API version known to work
pub const MIN_PLUGIN_VERSION: PluginVersion = PluginVersion {
    epoch: 1,
    major: 1,
    minor: 9,
};

/// XmlRpcPlugin API version as reported by `system.getAPIVersion`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PluginVersion {
    pub epoch: i64,
    pub major: i64,
    pub minor: i64,
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.epoch, self.major, self.minor)
    }
}

/// Owner of an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentParent<'a> {
    Ticket(i64),
    WikiPage(&'a str),
}

/// Trac client
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct TracClient {
    transport: Arc<dyn RpcTransport>,
}

impl TracClient {
    /// Create a client talking XML-RPC over HTTP
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &TracConfig) -> Result<Self> {
        tracing::debug!(endpoint = %config.rpc_url(), "Creating Trac client");
        Ok(Self::with_transport(Arc::new(XmlRpcTransport::new(config)?)))
    }

    /// Create a client over an existing transport
    pub fn with_transport(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    async fn call(&self, method: &str, params: Vec<RpcValue>) -> Result<RpcValue> {
        self.transport.call(method, params).await
    }

    // ---- system ----

    /// `system.getAPIVersion`
    pub async fn api_version(&self) -> Result<PluginVersion> {
        let value = self.call("system.getAPIVersion", vec![]).await?;
        let parts = expect_array(&value, "system.getAPIVersion")?;
        let part = |i: usize| parts.get(i).and_then(normalize_int).unwrap_or(0);
        Ok(PluginVersion {
            epoch: part(0),
            major: part(1),
            minor: part(2),
        })
    }

    /// `system.listMethods`
    pub async fn list_methods(&self) -> Result<Vec<String>> {
        let value = self.call("system.listMethods", vec![]).await?;
        string_list(&value, "system.listMethods")
    }

    /// Fails if the plugin is older than [`MIN_PLUGIN_VERSION`]
    pub async fn validate_plugin_version(&self) -> Result<PluginVersion> {
        let version = self.api_version().await?;
        if version < MIN_PLUGIN_VERSION {
            return Err(TracError::UnsupportedPluginVersion(format!(
                "{version} (minimum {MIN_PLUGIN_VERSION})"
            ))
            .into());
        }
        tracing::debug!(%version, "XML-RPC plugin version accepted");
        Ok(version)
    }

    /// Fails if any of [`EXPECTED_METHODS`] is missing
    pub async fn validate_expected_methods(&self) -> Result<()> {
        let methods = self.list_methods().await?;
        let missing: Vec<&str> = EXPECTED_METHODS
            .iter()
            .copied()
            .filter(|m| !methods.iter().any(|have| have == m))
            .collect();
        if !missing.is_empty() {
            return Err(TracError::MissingMethod(missing.join(", ")).into());
        }
        Ok(())
    }

    // ---- tickets ----

    /// `ticket.query`, returning ticket numbers
    pub async fn query_ticket_ids(&self, query: &str) -> Result<Vec<i64>> {
        let value = self.call("ticket.query", vec![query.into()]).await?;
        expect_array(&value, "ticket.query")?
            .iter()
            .map(|v| {
                normalize_int(v).ok_or_else(|| {
                    decode_error("ticket.query", format!("non-integer id {v}"))
                })
            })
            .collect()
    }

    /// Fetches one ticket with its change log and attachment list
    pub async fn get_ticket(&self, id: i64) -> Result<Ticket> {
        let value = self.call("ticket.get", vec![id.into()]).await?;
        let parts = expect_array(&value, "ticket.get")?;
        if parts.len() < 4 {
            return Err(decode_error(
                "ticket.get",
                format!("expected 4 elements, got {}", parts.len()),
            ));
        }

        let ticket_id = normalize_int(&parts[0])
            .ok_or_else(|| decode_error("ticket.get", "ticket id is not an integer"))?;
        let raw_attrs = parts[3]
            .as_struct()
            .ok_or_else(|| decode_error("ticket.get", "attributes are not a struct"))?;

        let mut attributes = Attributes::new();
        for (name, raw) in raw_attrs {
            match to_attribute_value(raw) {
                Some(value) => {
                    attributes.insert(name.clone(), value);
                }
                None => tracing::debug!(
                    ticket_id,
                    attribute = %name,
                    kind = raw.type_name(),
                    "Ignoring structured ticket attribute"
                ),
            }
        }
        if let Some(AttributeValue::Text(description)) = attributes.get_mut(DESCRIPTION_FIELD) {
            *description = convert(description);
        }

        let mut ticket = Ticket::new(ticket_id, attributes);
        ticket.time_created = normalize_time(&parts[1])?;
        ticket.time_changed = normalize_time(&parts[2])?;

        let history = self.ticket_changelog(id).await?;
        ticket.description_history = history.description_history;
        ticket.comments = history.comments;
        ticket.attachments = self.list_ticket_attachments(id).await?;

        Ok(ticket)
    }

    /// `ticket.changeLog`, keeping description revisions and comments
    pub async fn ticket_changelog(&self, id: i64) -> Result<TicketHistory> {
        let value = self.call("ticket.changeLog", vec![id.into()]).await?;
        let mut entries = Vec::new();
        for raw in expect_array(&value, "ticket.changeLog")? {
            let fields = expect_array(raw, "ticket.changeLog entry")?;
            if fields.len() < 6 {
                return Err(decode_error(
                    "ticket.changeLog",
                    format!("expected 6 elements, got {}", fields.len()),
                ));
            }

            let field = text_of(&fields[2]);
            let mut old_value = non_empty(text_of(&fields[3]));
            let mut new_value = non_empty(text_of(&fields[4]));
            match field.as_str() {
                DESCRIPTION_FIELD => {
                    old_value = old_value.map(|v| convert(&v));
                    new_value = new_value.map(|v| convert(&v));
                }
                COMMENT_FIELD => new_value = new_value.map(|v| convert(&v)),
                _ => {}
            }

            entries.push(ChangeLogEntry {
                time: normalize_time(&fields[0])?,
                author: text_of(&fields[1]),
                field,
                old_value,
                new_value,
                permanent: fields[5].as_bool().unwrap_or(false),
            });
        }
        Ok(TicketHistory::partition(entries))
    }

    /// `ticket.listAttachments`
    pub async fn list_ticket_attachments(&self, id: i64) -> Result<Vec<Attachment>> {
        let value = self.call("ticket.listAttachments", vec![id.into()]).await?;
        expect_array(&value, "ticket.listAttachments")?
            .iter()
            .map(attachment_from_tuple)
            .collect()
    }

    /// Downloads attachment content
    pub async fn get_attachment(
        &self,
        parent: AttachmentParent<'_>,
        filename: &str,
    ) -> Result<Vec<u8>> {
        let (method, params) = match parent {
            AttachmentParent::Ticket(id) => ("ticket.getAttachment", vec![id.into(), filename.into()]),
            AttachmentParent::WikiPage(page) => {
                ("wiki.getAttachment", vec![format!("{page}/{filename}").into()])
            }
        };
        let value = self.call(method, params).await?;
        match value {
            RpcValue::Base64(bytes) => Ok(bytes),
            other => Err(decode_error(
                method,
                format!("expected base64, got {}", other.type_name()),
            )),
        }
    }

    /// `ticket.getTicketFields`
    pub async fn ticket_fields(&self) -> Result<Vec<TicketField>> {
        let value = self.call("ticket.getTicketFields", vec![]).await?;
        expect_array(&value, "ticket.getTicketFields")?
            .iter()
            .map(|raw| {
                let members = raw
                    .as_struct()
                    .ok_or_else(|| decode_error("ticket.getTicketFields", "field is not a struct"))?;
                let member = |key: &str| members.get(key).map(text_of).unwrap_or_default();
                let options = match members.get("options") {
                    Some(list) => string_list(list, "ticket.getTicketFields options")?,
                    None => Vec::new(),
                };
                Ok(TicketField {
                    name: member("name"),
                    label: member("label"),
                    field_type: member("type"),
                    options,
                })
            })
            .collect()
    }

    // ---- milestones ----

    /// `ticket.milestone.getAll`
    pub async fn milestone_names(&self) -> Result<Vec<String>> {
        let value = self.call("ticket.milestone.getAll", vec![]).await?;
        string_list(&value, "ticket.milestone.getAll")
    }

    /// `ticket.milestone.get`
    pub async fn milestone(&self, name: &str) -> Result<Milestone> {
        let value = self.call("ticket.milestone.get", vec![name.into()]).await?;
        let members = value
            .as_struct()
            .ok_or_else(|| decode_error("ticket.milestone.get", "result is not a struct"))?;

        let mut milestone = Milestone::new(
            members
                .get("name")
                .map(text_of)
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| name.to_string()),
        );
        milestone.description = members
            .get("description")
            .map(text_of)
            .and_then(non_empty)
            .map(|d| convert(&d));
        if let Some(due) = members.get("due") {
            milestone.due_date = normalize_time(due)?;
        }
        if let Some(completed) = members.get("completed") {
            milestone.completed_date = normalize_time(completed)?;
        }
        Ok(milestone)
    }

    // ---- wiki ----

    /// `wiki.getAllPages`
    pub async fn wiki_page_names(&self) -> Result<Vec<String>> {
        let value = self.call("wiki.getAllPages", vec![]).await?;
        string_list(&value, "wiki.getAllPages")
    }

    /// `wiki.getPageInfo`, describing the current version
    pub async fn wiki_page_info(&self, name: &str) -> Result<WikiPageInfo> {
        let value = self.call("wiki.getPageInfo", vec![name.into()]).await?;
        page_info_from(&value, name, "wiki.getPageInfo")
    }

    /// `wiki.getPageInfoVersion`
    pub async fn wiki_page_info_version(&self, name: &str, version: i64) -> Result<WikiPageInfo> {
        let value = self
            .call("wiki.getPageInfoVersion", vec![name.into(), version.into()])
            .await?;
        page_info_from(&value, name, "wiki.getPageInfoVersion")
    }

    /// `wiki.getPageVersion`, converted to Markdown
    ///
    /// Returns `None` when the server reports no text for the version.
    pub async fn wiki_page_version(&self, name: &str, version: i64) -> Result<Option<String>> {
        let value = self
            .call("wiki.getPageVersion", vec![name.into(), version.into()])
            .await?;
        Ok(value.as_str().map(convert))
    }

    /// `wiki.listAttachments`, returning file names relative to the page
    pub async fn list_wiki_attachments(&self, name: &str) -> Result<Vec<String>> {
        let value = self.call("wiki.listAttachments", vec![name.into()]).await?;
        let prefix = format!("{name}/");
        expect_array(&value, "wiki.listAttachments")?
            .iter()
            .map(|raw| {
                let path = match raw {
                    RpcValue::String(path) => path.clone(),
                    RpcValue::Array(_) => attachment_from_tuple(raw)?.filename,
                    other => {
                        return Err(decode_error(
                            "wiki.listAttachments",
                            format!("unexpected {}", other.type_name()),
                        ))
                    }
                };
                Ok(path.strip_prefix(&prefix).unwrap_or(&path).to_string())
            })
            .collect()
    }

    // ---- search ----

    /// `search.getSearchFilters`
    pub async fn search_filters(&self) -> Result<Vec<SearchFilter>> {
        let value = self.call("search.getSearchFilters", vec![]).await?;
        expect_array(&value, "search.getSearchFilters")?
            .iter()
            .map(|raw| {
                let pair = expect_array(raw, "search filter")?;
                Ok(SearchFilter {
                    name: pair.first().map(text_of).unwrap_or_default(),
                    description: pair.get(1).map(text_of).unwrap_or_default(),
                })
            })
            .collect()
    }

    /// `search.performSearch`; an empty filter list searches everything
    pub async fn search(&self, query: &str, filters: &[String]) -> Result<Vec<SearchResult>> {
        let mut params = vec![RpcValue::from(query)];
        if !filters.is_empty() {
            params.push(RpcValue::Array(
                filters.iter().map(|f| RpcValue::from(f.as_str())).collect(),
            ));
        }
        let value = self.call("search.performSearch", params).await?;
        expect_array(&value, "search.performSearch")?
            .iter()
            .map(|raw| {
                let hit = expect_array(raw, "search result")?;
                if hit.len() < 5 {
                    return Err(decode_error(
                        "search.performSearch",
                        format!("expected 5 elements, got {}", hit.len()),
                    ));
                }
                Ok(SearchResult {
                    href: text_of(&hit[0]),
                    title: text_of(&hit[1]),
                    date: normalize_time(&hit[2])?,
                    author: text_of(&hit[3]),
                    excerpt: text_of(&hit[4]),
                })
            })
            .collect()
    }
}

fn decode_error(context: &str, detail: impl fmt::Display) -> MigrationError {
    MigrationError::Decode(format!("{context}: {detail}"))
}

fn expect_array<'v>(value: &'v RpcValue, context: &str) -> Result<&'v [RpcValue]> {
    value
        .as_array()
        .ok_or_else(|| decode_error(context, format!("expected array, got {}", value.type_name())))
}

fn string_list(value: &RpcValue, context: &str) -> Result<Vec<String>> {
    Ok(expect_array(value, context)?.iter().map(text_of).collect())
}

/// Text form of a scalar; structured values become `""`
fn text_of(value: &RpcValue) -> String {
    match value {
        RpcValue::String(s) => s.clone(),
        RpcValue::Int(i) => i.to_string(),
        RpcValue::Double(d) => d.to_string(),
        RpcValue::Boolean(b) => b.to_string(),
        RpcValue::DateTime(ts) => ts.to_rfc3339(),
        _ => String::new(),
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

/// `[filename, description, size, time, author]`
fn attachment_from_tuple(raw: &RpcValue) -> Result<Attachment> {
    let fields = expect_array(raw, "attachment")?;
    if fields.len() < 5 {
        return Err(decode_error(
            "attachment",
            format!("expected 5 elements, got {}", fields.len()),
        ));
    }
    Ok(Attachment {
        filename: text_of(&fields[0]),
        description: text_of(&fields[1]),
        size: normalize_int(&fields[2]).unwrap_or(0),
        time: normalize_time(&fields[3])?,
        author: text_of(&fields[4]),
    })
}

fn page_info_from(value: &RpcValue, name: &str, context: &str) -> Result<WikiPageInfo> {
    let members = value
        .as_struct()
        .ok_or_else(|| decode_error(context, format!("page {name:?}: result is not a struct")))?;
    let version = members
        .get("version")
        .and_then(normalize_int)
        .ok_or_else(|| decode_error(context, format!("page {name:?}: missing version")))?;
    Ok(WikiPageInfo {
        name: members
            .get("name")
            .map(text_of)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| name.to_string()),
        version,
        author: members.get("author").map(text_of).unwrap_or_default(),
        last_modified: match members.get("lastModified") {
            Some(raw) => normalize_time(raw)?,
            None => None,
        },
        comment: members.get("comment").map(text_of).and_then(non_empty),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTransport {
        responses: HashMap<String, RpcValue>,
        calls: Mutex<Vec<(String, Vec<RpcValue>)>>,
    }

    impl FakeTransport {
        fn respond(mut self, method: &str, value: RpcValue) -> Self {
            self.responses.insert(method.to_string(), value);
            self
        }
    }

    #[async_trait]
    impl RpcTransport for FakeTransport {
        async fn call(&self, method: &str, params: Vec<RpcValue>) -> Result<RpcValue> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), params));
            self.responses.get(method).cloned().ok_or_else(|| {
                TracError::Fault {
                    code: 1,
                    message: format!("no such method {method}"),
                }
                .into()
            })
        }
    }

    fn strukt(members: &[(&str, RpcValue)]) -> RpcValue {
        RpcValue::Struct(
            members
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn client(transport: FakeTransport) -> TracClient {
        TracClient::with_transport(Arc::new(transport))
    }

    #[tokio::test]
    async fn test_get_ticket_assembles_history_and_attachments() {
        let transport = FakeTransport::default()
            .respond(
                "ticket.get",
                RpcValue::Array(vec![
                    RpcValue::Int(42),
                    RpcValue::Int(1_600_000_000),
                    RpcValue::from("2020-09-14T12:00:00"),
                    strukt(&[
                        ("summary", RpcValue::from("Crash on save")),
                        ("status", RpcValue::from("closed")),
                        ("description", RpcValue::from("'''bold'''")),
                        ("milestone", RpcValue::from("v1")),
                    ]),
                ]),
            )
            .respond(
                "ticket.changeLog",
                RpcValue::Array(vec![
                    RpcValue::Array(vec![
                        RpcValue::Int(1_600_000_100),
                        RpcValue::from("alice"),
                        RpcValue::from("comment"),
                        RpcValue::from("1"),
                        RpcValue::from("''looks'' fixed"),
                        RpcValue::Boolean(true),
                    ]),
                    RpcValue::Array(vec![
                        RpcValue::Int(1_600_000_200),
                        RpcValue::from("bob"),
                        RpcValue::from("status"),
                        RpcValue::from("new"),
                        RpcValue::from("closed"),
                        RpcValue::Int(1),
                    ]),
                ]),
            )
            .respond(
                "ticket.listAttachments",
                RpcValue::Array(vec![RpcValue::Array(vec![
                    RpcValue::from("trace.log"),
                    RpcValue::from("stack trace"),
                    RpcValue::Int(512),
                    RpcValue::Int(1_600_000_050),
                    RpcValue::from("alice"),
                ])]),
            );

        let ticket = client(transport).get_ticket(42).await.unwrap();

        assert_eq!(ticket.id, 42);
        assert_eq!(ticket.summary(), "Crash on save");
        assert_eq!(ticket.description(), "**bold**");
        assert!(ticket.is_closed());
        assert_eq!(ticket.milestone(), Some("v1"));
        assert_eq!(
            ticket.time_changed,
            Some(Utc.with_ymd_and_hms(2020, 9, 14, 12, 0, 0).unwrap())
        );
        assert_eq!(ticket.comments.len(), 1);
        assert_eq!(ticket.comments[0].new_value.as_deref(), Some("*looks* fixed"));
        assert!(ticket.description_history.is_empty());
        assert_eq!(ticket.attachments.len(), 1);
        assert_eq!(ticket.attachments[0].size, 512);
    }

    #[tokio::test]
    async fn test_get_ticket_rejects_short_tuple() {
        let transport =
            FakeTransport::default().respond("ticket.get", RpcValue::Array(vec![RpcValue::Int(1)]));
        let err = client(transport).get_ticket(1).await.unwrap_err();
        assert!(matches!(err, MigrationError::Decode(_)));
    }

    #[tokio::test]
    async fn test_milestone_zero_due_is_absent() {
        let transport = FakeTransport::default().respond(
            "ticket.milestone.get",
            strukt(&[
                ("name", RpcValue::from("v1")),
                ("description", RpcValue::from("")),
                ("due", RpcValue::Int(0)),
                ("completed", RpcValue::Int(1_721_836_800)),
            ]),
        );

        let milestone = client(transport).milestone("v1").await.unwrap();
        assert_eq!(milestone.name, "v1");
        assert_eq!(milestone.description, None);
        assert_eq!(milestone.due_date, None);
        assert!(milestone.is_completed());
    }

    #[tokio::test]
    async fn test_wiki_page_version_without_text() {
        let transport = FakeTransport::default().respond("wiki.getPageVersion", RpcValue::Int(0));
        let content = client(transport)
            .wiki_page_version("WikiStart", 3)
            .await
            .unwrap();
        assert_eq!(content, None);
    }

    #[tokio::test]
    async fn test_wiki_attachment_names_are_relative() {
        let transport = FakeTransport::default().respond(
            "wiki.listAttachments",
            RpcValue::Array(vec![
                RpcValue::from("Guide/Setup/diagram.png"),
                RpcValue::from("notes.txt"),
            ]),
        );
        let names = client(transport)
            .list_wiki_attachments("Guide/Setup")
            .await
            .unwrap();
        assert_eq!(names, vec!["diagram.png", "notes.txt"]);
    }

    #[tokio::test]
    async fn test_wiki_attachment_download_uses_page_path() {
        let transport = Arc::new(
            FakeTransport::default().respond("wiki.getAttachment", RpcValue::Base64(b"png".to_vec())),
        );
        let client = TracClient::with_transport(transport.clone());
        let bytes = client
            .get_attachment(AttachmentParent::WikiPage("Guide"), "diagram.png")
            .await
            .unwrap();
        assert_eq!(bytes, b"png");

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[0].1, vec![RpcValue::from("Guide/diagram.png")]);
    }

    #[tokio::test]
    async fn test_plugin_version_gate() {
        let old = FakeTransport::default().respond(
            "system.getAPIVersion",
            RpcValue::Array(vec![RpcValue::Int(1), RpcValue::Int(1), RpcValue::Int(2)]),
        );
        let err = client(old).validate_plugin_version().await.unwrap_err();
        assert!(matches!(
            err,
            MigrationError::Trac(TracError::UnsupportedPluginVersion(_))
        ));

        let current = FakeTransport::default().respond(
            "system.getAPIVersion",
            RpcValue::Array(vec![RpcValue::Int(1), RpcValue::Int(2), RpcValue::Int(0)]),
        );
        let version = client(current).validate_plugin_version().await.unwrap();
        assert_eq!(version.to_string(), "1.2.0");
    }

    #[tokio::test]
    async fn test_missing_methods_are_listed() {
        let transport = FakeTransport::default().respond(
            "system.listMethods",
            RpcValue::Array(vec![RpcValue::from("ticket.get")]),
        );
        let err = client(transport).validate_expected_methods().await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("ticket.query"));
        assert!(message.contains("wiki.getPage"));
    }

    #[tokio::test]
    async fn test_query_ticket_ids() {
        let transport = FakeTransport::default().respond(
            "ticket.query",
            RpcValue::Array(vec![RpcValue::Int(3), RpcValue::Int(1)]),
        );
        assert_eq!(
            client(transport).query_ticket_ids("max=0").await.unwrap(),
            vec![3, 1]
        );
    }
}
