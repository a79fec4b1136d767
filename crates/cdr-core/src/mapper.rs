//! Call record to document mapping
//!
//! Builds the BSON document stored for one call. Field names and their order
//! are part of the stored schema that downstream reports query against.

use crate::channel::ChannelAddress;
use crate::config::ConnectionConfig;
use crate::models::CallRecord;
use bson::oid::ObjectId;
use bson::{Bson, DateTime, Document};
use tracing::{debug, warn};

/// Builds documents from call records
pub struct RecordMapper;

impl RecordMapper {
    /// Build the document for one call
    ///
    /// Every document gets a fresh `_id`. Verbatim fields are written even
    /// when empty; channel subfields are written only when the channel name
    /// yields them. Custom fields listed in `config` follow the fixed fields
    /// when the record has a non-empty value for them. A custom name that is
    /// already in the document is skipped, so `_id` and the fixed fields are
    /// never replaced.
    pub fn build_document(record: &CallRecord, config: &ConnectionConfig) -> Document {
        let mut doc = Document::new();

        doc.insert("_id", ObjectId::new());

        doc.insert("accountcode", record.account_code.as_str());
        doc.insert("src", record.src.as_str());
        doc.insert("dst", record.dst.as_str());
        doc.insert("dcontext", record.dcontext.as_str());
        doc.insert("clid", record.clid.as_str());

        doc.insert("channel", record.channel.as_str());
        insert_channel(&mut doc, &record.channel, "channeltype", "channelentity");

        doc.insert("dstchannel", record.dst_channel.as_str());
        insert_channel(
            &mut doc,
            &record.dst_channel,
            "dstchanneltype",
            "dstchannelentity",
        );

        doc.insert("lastapp", record.last_app.as_str());
        doc.insert("lastdata", record.last_data.as_str());

        doc.insert("calldate", epoch_millis(record.start.timestamp()));
        doc.insert("answer", epoch_millis(record.answer.timestamp()));
        doc.insert("end", epoch_millis(record.end.timestamp()));

        doc.insert("duration", Bson::Int64(record.duration));
        doc.insert("billsec", Bson::Int64(record.billsec));

        doc.insert("disposition", record.disposition.as_str());
        doc.insert("amaflags", record.ama_flags.as_str());

        doc.insert("uniqueid", record.unique_id.as_str());
        doc.insert("userfield", record.user_field.as_str());

        debug!("mongodb: looking customfields: {:?}", config.custom_fields);
        for name in &config.custom_fields {
            if doc.contains_key(name) {
                warn!("mongodb: Custom field {} clashes with a stored field, skipping", name);
                continue;
            }
            match record.variable(name) {
                Some(value) if !value.is_empty() => {
                    debug!("mongodb: Custom CDR entry {} for {}", name, value);
                    doc.insert(name.as_str(), value);
                }
                _ => {}
            }
        }

        doc
    }
}

/// Whole seconds as a BSON date
fn epoch_millis(seconds: i64) -> DateTime {
    DateTime::from_millis(seconds * 1000)
}

fn insert_channel(doc: &mut Document, channel: &str, kind_field: &str, entity_field: &str) {
    let address = ChannelAddress::parse(channel);

    if let Some(kind) = address.kind {
        debug!("mongodb: {}.", kind_field);
        doc.insert(kind_field, kind);
    }
    if let Some(entity) = address.entity {
        debug!("mongodb: {}.", entity_field);
        doc.insert(entity_field, entity);
    }
}
