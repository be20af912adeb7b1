//! Topic namespace and inbound topic routing for openWB 2.x
//!
//! openWB publishes charge point telemetry below
//! `<prefix>/chargepoint/<id>/get/<key>` and the global charge mode at
//! `<prefix>/global/ChargeMode`. Commands go back to
//! `<prefix>/chargepoint/<id>/set/<command>`.

use super::fields::FieldId;

/// Topic namespace of one openWB charge point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicNamespace {
    prefix: String,
    chargepoint_id: u32,
}

impl TopicNamespace {
    /// Build a namespace from the configured topic.
    ///
    /// Trailing `#` wildcards and slashes are stripped, so `openWB/#`,
    /// `openWB/` and `openWB` all yield the prefix `openWB`.
    pub fn new(topic: &str, chargepoint_id: u32) -> Self {
        Self {
            prefix: normalize_prefix(topic).to_string(),
            chargepoint_id,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn chargepoint_id(&self) -> u32 {
        self.chargepoint_id
    }

    /// Base of all telemetry topics, including the trailing slash
    pub fn get_base(&self) -> String {
        format!("{}/chargepoint/{}/get/", self.prefix, self.chargepoint_id)
    }

    /// Global charge mode topic: `<prefix>/global/ChargeMode`
    pub fn charge_mode_topic(&self) -> String {
        format!("{}/global/ChargeMode", self.prefix)
    }

    /// Command topic: `<prefix>/chargepoint/<id>/set/<command>`
    pub fn set_topic(&self, command: &str) -> String {
        format!(
            "{}/chargepoint/{}/set/{}",
            self.prefix, self.chargepoint_id, command
        )
    }

    /// Topics to subscribe to on every successful connect
    pub fn subscription_topics(&self) -> Vec<String> {
        vec![format!("{}#", self.get_base()), self.charge_mode_topic()]
    }
}

/// Strip trailing `#` characters, then trailing slashes
pub fn normalize_prefix(topic: &str) -> &str {
    topic.trim_end_matches('#').trim_end_matches('/')
}

/// Routing decision for one inbound topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicRoute {
    /// The global charge mode topic
    ChargeMode,
    /// Telemetry below the charge point `get/` base
    Telemetry {
        /// Known field, or `None` if the key is not mapped
        field: Option<FieldId>,
        key: String,
    },
    /// Anything else
    Unrelated,
}

impl TopicRoute {
    /// Whether the topic belongs to the bridged namespace.
    ///
    /// Matched topics count as proof of life even when the key is unknown
    /// or the payload later fails to parse.
    pub fn is_match(&self) -> bool {
        !matches!(self, TopicRoute::Unrelated)
    }

    /// Field to coerce the payload for, if any
    pub fn field(&self) -> Option<FieldId> {
        match self {
            TopicRoute::ChargeMode => Some(FieldId::ChargeMode),
            TopicRoute::Telemetry { field, .. } => *field,
            TopicRoute::Unrelated => None,
        }
    }
}

/// Maps inbound topics onto field identifiers by prefix and suffix matching
pub struct TopicRouter;

impl TopicRouter {
    /// Classify `topic` within `namespace` (pure function)
    pub fn route(namespace: &TopicNamespace, topic: &str) -> TopicRoute {
        if topic == namespace.charge_mode_topic() {
            return TopicRoute::ChargeMode;
        }

        match topic.strip_prefix(&namespace.get_base()) {
            Some(key) => TopicRoute::Telemetry {
                field: FieldId::from_key(key),
                key: key.to_string(),
            },
            None => TopicRoute::Unrelated,
        }
    }
}
