use std::collections::{HashMap, HashSet};

use otelcheck_core::protocol::line;

use crate::cmdb::payload::{CiItem, CiRelation, IrePayload, DEPENDS_ON};

/// Batch-scoped builder. Items are unique by service name, relations by the
/// ordered (client, server) pair.
#[derive(Debug, Default)]
pub struct Projection {
    payload: IrePayload,
    item_index: HashMap<String, usize>,
    seen_relations: HashSet<(String, String)>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one check output into the batch. Lines without the line protocol
    /// shape are skipped; value and timestamp tokens are not interpreted.
    pub fn add_output(&mut self, output: &str) {
        for sample in line::parse_series_output(output) {
            let client = sample.labels.get("client");
            let server = sample.labels.get("server");

            if let Some(c) = client {
                self.ensure_item(c, &sample.name);
            }
            if let Some(s) = server {
                self.ensure_item(s, &sample.name);
            }
            if let (Some(c), Some(s)) = (client, server) {
                self.ensure_relation(c, s);
            }
        }
    }

    fn ensure_item(&mut self, service: &str, metric: &str) {
        if self.item_index.contains_key(service) {
            return;
        }
        self.item_index
            .insert(service.to_string(), self.payload.items.len());
        self.payload.items.push(CiItem::service(service, metric));
    }

    fn ensure_relation(&mut self, client: &str, server: &str) {
        if client == server {
            return;
        }
        let key = (client.to_string(), server.to_string());
        if self.seen_relations.contains(&key) {
            return;
        }
        let (Some(&parent), Some(&child)) =
            (self.item_index.get(client), self.item_index.get(server))
        else {
            return;
        };

        self.payload.relations.push(CiRelation {
            parent,
            child,
            rel_type: DEPENDS_ON.to_string(),
        });
        self.seen_relations.insert(key);
    }

    pub fn finish(self) -> IrePayload {
        self.payload
    }
}

/// Project a whole batch of check outputs into one payload.
pub fn project<I, S>(outputs: I) -> IrePayload
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut projection = Projection::new();
    for output in outputs {
        projection.add_output(output.as_ref());
    }
    projection.finish()
}
