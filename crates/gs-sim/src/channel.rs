//! Out-of-band write channel between models.
//!
//! Lets a model (typically a controller) write straight into another model's
//! input, bypassing the static dataflow graph. Writes are buffered per
//! `(dest, attr)` with a last-write-wins policy and drained by the scheduler
//! in one single-threaded phase at the end of each tick.

use gs_core::{AttrMap, Value};
use gs_graph::AsyncRequest;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("'{source_model}' has no async registration for {dest}.{attr}")]
    Unregistered {
        source_model: String,
        dest: String,
        attr: String,
    },
}

/// Last-write-wins buffer of pending async writes.
#[derive(Debug, Clone, Default)]
pub struct AsyncChannel {
    /// `(source, dest)` -> `(source_attr, dest_attr)` pairs.
    routes: BTreeMap<(String, String), Vec<(String, String)>>,
    /// `(dest, attr)` -> pending value.
    pending: BTreeMap<(String, String), Value>,
}

impl AsyncChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a channel from a frozen scenario's registrations.
    pub fn from_requests(requests: &[AsyncRequest]) -> Self {
        let mut channel = Self::new();
        for r in requests {
            channel.register(&r.source, &r.dest, r.pairs.iter().cloned());
        }
        channel
    }

    /// Register `source -> dest` attribute pairs.
    ///
    /// Idempotent; repeated calls merge their pairs.
    pub fn register<I>(&mut self, source: &str, dest: &str, pairs: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let entry = self
            .routes
            .entry((source.to_string(), dest.to_string()))
            .or_default();
        for pair in pairs {
            if !entry.contains(&pair) {
                entry.push(pair);
            }
        }
    }

    /// Whether `source` may write `dest.attr`.
    pub fn is_registered(&self, source: &str, dest: &str, attr: &str) -> bool {
        self.routes
            .get(&(source.to_string(), dest.to_string()))
            .is_some_and(|pairs| pairs.iter().any(|(_, d)| d == attr))
    }

    /// Buffer a write. A later publish to the same `(dest, attr)` overwrites it.
    pub fn publish(
        &mut self,
        source: &str,
        dest: &str,
        attr: &str,
        value: Value,
    ) -> Result<(), ChannelError> {
        if !self.is_registered(source, dest, attr) {
            return Err(ChannelError::Unregistered {
                source_model: source.to_string(),
                dest: dest.to_string(),
                attr: attr.to_string(),
            });
        }
        self.pending
            .insert((dest.to_string(), attr.to_string()), value);
        Ok(())
    }

    /// Publish every registered `source_attr` present (and non-null) in
    /// `outputs` to its mapped destination input.
    pub fn forward_outputs(&mut self, source: &str, outputs: &AttrMap) {
        for ((src, dest), pairs) in &self.routes {
            if src != source {
                continue;
            }
            for (src_attr, dest_attr) in pairs {
                if let Some(value) = outputs.get(src_attr).filter(|v| !v.is_null()) {
                    self.pending
                        .insert((dest.clone(), dest_attr.clone()), value.clone());
                }
            }
        }
    }

    /// Current pending value for `(dest, attr)`, if any.
    pub fn pending(&self, dest: &str, attr: &str) -> Option<&Value> {
        self.pending.get(&(dest.to_string(), attr.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take all pending writes in `(dest, attr)` order, clearing the buffer.
    pub fn drain(&mut self) -> Vec<(String, String, Value)> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|((dest, attr), value)| (dest, attr, value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> AsyncChannel {
        let mut ch = AsyncChannel::new();
        ch.register(
            "ctrl",
            "battery",
            [("flow".to_string(), "p_set".to_string())],
        );
        ch
    }

    #[test]
    fn last_write_wins() {
        let mut ch = channel();
        ch.publish("ctrl", "battery", "p_set", Value::Float(1.0))
            .unwrap();
        ch.publish("ctrl", "battery", "p_set", Value::Float(2.0))
            .unwrap();
        let drained = ch.drain();
        assert_eq!(
            drained,
            vec![("battery".to_string(), "p_set".to_string(), Value::Float(2.0))]
        );
        assert!(ch.is_empty());
    }

    #[test]
    fn unregistered_publish_rejected() {
        let mut ch = channel();
        let err = ch
            .publish("ctrl", "battery", "soc", Value::Float(1.0))
            .unwrap_err();
        assert!(matches!(err, ChannelError::Unregistered { .. }));
        assert!(
            ch.publish("pv", "battery", "p_set", Value::Float(1.0))
                .is_err()
        );
    }

    #[test]
    fn register_is_idempotent() {
        let mut ch = channel();
        ch.register(
            "ctrl",
            "battery",
            [("flow".to_string(), "p_set".to_string())],
        );
        ch.register(
            "ctrl",
            "battery",
            [("mode".to_string(), "mode".to_string())],
        );
        assert_eq!(ch.routes.len(), 1);
        assert_eq!(ch.routes.values().next().unwrap().len(), 2);
        assert!(ch.is_registered("ctrl", "battery", "mode"));
    }

    #[test]
    fn forward_outputs_maps_attrs() {
        let mut ch = channel();
        let mut outputs = AttrMap::new();
        outputs.insert("flow".into(), Value::Float(-3.0));
        outputs.insert("other".into(), Value::Float(9.0));
        ch.forward_outputs("ctrl", &outputs);
        assert_eq!(ch.pending("battery", "p_set"), Some(&Value::Float(-3.0)));
        ch.forward_outputs("battery", &outputs);
        assert_eq!(ch.drain().len(), 1);
    }
}
