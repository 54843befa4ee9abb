use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, watch};

use super::{DocumentStore, Patch, StoreResult, Subscription, segments};

/// In-process document tree with the same semantics as the remote store:
/// null deletes, empty objects are pruned, and a [`Patch`] applies atomically.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    root: Value,
    watchers: HashMap<String, watch::Sender<Option<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: Value) -> Self {
        Self {
            inner: Mutex::new(Inner {
                root: prune(root).unwrap_or(Value::Null),
                watchers: HashMap::new(),
            }),
        }
    }

    pub async fn watcher_count(&self) -> usize {
        self.inner.lock().await.watchers.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, path: &str) -> StoreResult<Option<Value>> {
        let segs = segments(path)?;
        let inner = self.inner.lock().await;
        Ok(lookup(&inner.root, &segs).cloned())
    }

    async fn write(&self, path: &str, value: Value) -> StoreResult<()> {
        let segs = segments(path)?;
        let mut inner = self.inner.lock().await;
        assign(&mut inner.root, &segs, prune(value));
        inner.notify(&[path]);
        Ok(())
    }

    async fn update(&self, patch: Patch) -> StoreResult<()> {
        let mut parsed = Vec::with_capacity(patch.len());
        for (path, value) in patch.iter() {
            parsed.push((path, segments(path)?, value.cloned()));
        }

        let mut inner = self.inner.lock().await;
        for (_, segs, value) in &parsed {
            assign(&mut inner.root, segs, value.clone().and_then(prune));
        }
        let changed: Vec<&str> = parsed.iter().map(|(p, _, _)| *p).collect();
        inner.notify(&changed);
        Ok(())
    }

    async fn subscribe(&self, path: &str) -> StoreResult<Subscription> {
        let segs = segments(path)?;
        let key = segs.join("/");
        let mut inner = self.inner.lock().await;
        let current = lookup(&inner.root, &segs).cloned();
        let rx = match inner.watchers.get(&key) {
            Some(tx) if !tx.is_closed() => tx.subscribe(),
            _ => {
                let (tx, rx) = watch::channel(current);
                inner.watchers.insert(key.clone(), tx);
                rx
            }
        };
        Ok(Subscription::new(key, rx))
    }
}

impl Inner {
    fn notify(&mut self, changed: &[&str]) {
        self.watchers.retain(|_, tx| !tx.is_closed());
        let root = &self.root;
        for (path, tx) in &self.watchers {
            if !changed.iter().any(|c| related(path, c)) {
                continue;
            }
            let segs: Vec<&str> = if path.is_empty() {
                Vec::new()
            } else {
                path.split('/').collect()
            };
            let next = lookup(root, &segs).cloned();
            tx.send_if_modified(|current| {
                if *current == next {
                    false
                } else {
                    *current = next;
                    true
                }
            });
        }
    }
}

fn related(watched: &str, changed: &str) -> bool {
    let changed = changed.trim_matches('/');
    fn under(child: &str, parent: &str) -> bool {
        parent.is_empty()
            || child == parent
            || (child.starts_with(parent) && child.as_bytes().get(parent.len()) == Some(&b'/'))
    }
    under(watched, changed) || under(changed, watched)
}

fn lookup<'a>(node: &'a Value, segs: &[&str]) -> Option<&'a Value> {
    let mut current = node;
    for seg in segs {
        current = match current {
            Value::Object(map) => map.get(*seg)?,
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if current.is_null() { None } else { Some(current) }
}

fn assign(node: &mut Value, segs: &[&str], value: Option<Value>) {
    let Some((head, rest)) = segs.split_first() else {
        *node = value.unwrap_or(Value::Null);
        return;
    };
    if !node.is_object() {
        if value.is_none() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };
    if rest.is_empty() {
        match value {
            Some(v) => {
                map.insert((*head).to_string(), v);
            }
            None => {
                map.remove(*head);
            }
        }
        return;
    }
    if value.is_none() && !map.contains_key(*head) {
        return;
    }
    let child = map.entry((*head).to_string()).or_insert(Value::Null);
    assign(child, rest, value);
    let empty = match child {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        _ => false,
    };
    if empty {
        map.remove(*head);
    }
}

/// Drop nulls and empty objects the way the backend does on write.
fn prune(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let kept: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| prune(v).map(|v| (k, v)))
                .collect();
            if kept.is_empty() { None } else { Some(Value::Object(kept)) }
        }
        Value::Array(items) => Some(Value::Array(
            items.into_iter().map(|v| prune(v).unwrap_or(Value::Null)).collect(),
        )),
        other => Some(other),
    }
}
