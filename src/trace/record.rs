//! Hop record and hop chain wire types.
//!
//! A responder's success body is a bare JSON array of hop records, which is
//! exactly what a caller decodes from its own downstream. Keeping a single
//! type for both directions is what lets any instance terminate or extend a
//! chain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Header name → ordered values, as captured by one responder.
pub type HeaderSnapshot = BTreeMap<String, Vec<String>>;

/// One responder's view of a request as it passed through.
///
/// Records are values: once built (or decoded) nothing ties them to the
/// connection they came from, and fields are only readable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopRecord {
    node_name: String,
    pod_name: String,
    hostname: String,
    #[serde(alias = "request_source_addr")]
    request_source_ip: String,
    #[serde(alias = "request_destination_addr")]
    request_destination_ip: String,
    request_url: String,
    incoming_headers: HeaderSnapshot,
    /// Kept as text so downstream timestamps pass through byte-for-byte.
    ts: String,
}

impl HopRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        node_name: String,
        pod_name: String,
        hostname: String,
        request_source_ip: String,
        request_destination_ip: String,
        request_url: String,
        incoming_headers: HeaderSnapshot,
        ts: String,
    ) -> Self {
        Self {
            node_name,
            pod_name,
            hostname,
            request_source_ip,
            request_destination_ip,
            request_url,
            incoming_headers,
            ts,
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn pod_name(&self) -> &str {
        &self.pod_name
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Apparent origin of the request (forwarded-for entry or peer IP).
    pub fn request_source(&self) -> &str {
        &self.request_source_ip
    }

    /// Local `ip:port` the connection was accepted on, empty if unknown.
    pub fn request_destination(&self) -> &str {
        &self.request_destination_ip
    }

    pub fn request_url(&self) -> &str {
        &self.request_url
    }

    pub fn incoming_headers(&self) -> &HeaderSnapshot {
        &self.incoming_headers
    }

    /// All values captured for `name` (lowercase), if any.
    pub fn header_values(&self, name: &str) -> Option<&[String]> {
        self.incoming_headers.get(name).map(Vec::as_slice)
    }

    pub fn timestamp(&self) -> &str {
        &self.ts
    }
}

/// Ordered hops, farthest downstream first and the local hop last.
///
/// The only way to grow a chain is [`HopChain::append`], so entries decoded
/// from a downstream keep their order end-to-end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HopChain(Vec<HopRecord>);

impl HopChain {
    /// Chain for a terminus: just the local hop.
    pub fn terminus(record: HopRecord) -> Self {
        Self(vec![record])
    }

    /// Add the nearest hop at the end.
    pub fn append(&mut self, record: HopRecord) {
        self.0.push(record);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn records(&self) -> &[HopRecord] {
        &self.0
    }

    /// The most recently appended hop.
    pub fn nearest(&self) -> Option<&HopRecord> {
        self.0.last()
    }

    /// The hop farthest downstream.
    pub fn farthest(&self) -> Option<&HopRecord> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HopRecord> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a HopChain {
    type Item = &'a HopRecord;
    type IntoIter = std::slice::Iter<'a, HopRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(pod: &str) -> HopRecord {
        let mut headers = HeaderSnapshot::new();
        headers.insert("accept".into(), vec!["*/*".into()]);
        HopRecord::new(
            "node-a".into(),
            pod.into(),
            "host-a".into(),
            "10.0.0.1".into(),
            "10.0.0.2:8080".into(),
            "http://svc/".into(),
            headers,
            "2024-05-01T10:00:00.000000001Z".into(),
        )
    }

    #[test]
    fn record_serializes_every_field() {
        let value = serde_json::to_value(sample("pod-1")).unwrap();
        let obj = value.as_object().unwrap();
        for field in [
            "node_name",
            "pod_name",
            "hostname",
            "request_source_ip",
            "request_destination_ip",
            "request_url",
            "incoming_headers",
            "ts",
        ] {
            assert!(obj.contains_key(field), "missing {field}");
        }
        assert_eq!(obj.len(), 8);
        assert_eq!(value["incoming_headers"]["accept"], json!(["*/*"]));
    }

    #[test]
    fn empty_fields_are_still_present() {
        let record = HopRecord::new(
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            "http:///".into(),
            HeaderSnapshot::new(),
            "2024-05-01T10:00:00.000000000Z".into(),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["node_name"], "");
        assert_eq!(value["request_destination_ip"], "");
        assert_eq!(value["incoming_headers"], json!({}));
    }

    #[test]
    fn decodes_address_field_aliases() {
        let body = json!([{
            "node_name": "n",
            "pod_name": "p",
            "hostname": "h",
            "request_source_addr": "1.2.3.4:5555",
            "request_destination_addr": "10.0.0.9:8080",
            "request_url": "http://x/",
            "incoming_headers": {"User-Agent": ["curl/8"]},
            "ts": "2024-05-01T10:00:00.5Z"
        }]);
        let chain: HopChain = serde_json::from_value(body).unwrap();
        let hop = chain.farthest().unwrap();
        assert_eq!(hop.request_source(), "1.2.3.4:5555");
        assert_eq!(hop.request_destination(), "10.0.0.9:8080");
        // Timestamp text is not normalized.
        assert_eq!(hop.timestamp(), "2024-05-01T10:00:00.5Z");
    }

    #[test]
    fn rejects_records_with_missing_fields() {
        let body = json!([{ "node_name": "n" }]);
        assert!(serde_json::from_value::<HopChain>(body).is_err());
    }

    #[test]
    fn rejects_non_array_bodies() {
        assert!(serde_json::from_str::<HopChain>(r#"{"status":"ok"}"#).is_err());
        assert!(serde_json::from_str::<HopChain>("null").is_err());
    }

    #[test]
    fn append_keeps_existing_order() {
        let mut chain: HopChain =
            serde_json::from_value(json!([sample("far"), sample("mid")])).unwrap();
        chain.append(sample("self"));

        let pods: Vec<_> = chain.iter().map(HopRecord::pod_name).collect();
        assert_eq!(pods, ["far", "mid", "self"]);
        assert_eq!(chain.nearest().unwrap().pod_name(), "self");
        assert_eq!(chain.farthest().unwrap().pod_name(), "far");
    }
}
