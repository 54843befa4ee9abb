//! Observable store paths.
//!
//! A [`Subscription`] yields full snapshots of one path: the current value
//! first, then every later change. Dropping it unsubscribes.

use std::marker::PhantomData;

use serde_json::Value;
use tokio::sync::watch;

use super::StoreResult;

pub struct Subscription {
    path: String,
    rx: watch::Receiver<Option<Value>>,
    primed: bool,
}

impl Subscription {
    pub fn new(path: impl Into<String>, rx: watch::Receiver<Option<Value>>) -> Self {
        Self {
            path: path.into(),
            rx,
            primed: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Next snapshot, or `None` once the store side has gone away.
    pub async fn next(&mut self) -> Option<Option<Value>> {
        if self.primed {
            self.rx.changed().await.ok()?;
        }
        self.primed = true;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Replay the current snapshot on the next call to [`Subscription::next`].
    pub fn restart(&mut self) {
        self.primed = false;
    }

    pub fn typed<T: FromSnapshot>(self) -> Watch<T> {
        Watch {
            inner: self,
            _marker: PhantomData,
        }
    }
}

pub trait FromSnapshot: Sized {
    fn from_snapshot(path: &str, value: Option<Value>) -> StoreResult<Self>;
}

pub struct Watch<T> {
    inner: Subscription,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FromSnapshot> Watch<T> {
    pub fn path(&self) -> &str {
        self.inner.path()
    }

    pub async fn next(&mut self) -> Option<StoreResult<T>> {
        let snapshot = self.inner.next().await?;
        Some(T::from_snapshot(self.inner.path(), snapshot))
    }

    pub fn restart(&mut self) {
        self.inner.restart();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn first_snapshot_is_immediate_then_waits_for_change() {
        let (tx, rx) = watch::channel(Some(json!(1)));
        let mut sub = Subscription::new("a", rx);

        assert_eq!(sub.next().await, Some(Some(json!(1))));

        tx.send_replace(Some(json!(2)));
        assert_eq!(sub.next().await, Some(Some(json!(2))));

        sub.restart();
        assert_eq!(sub.next().await, Some(Some(json!(2))));

        drop(tx);
        assert_eq!(sub.next().await, None);
    }
}
