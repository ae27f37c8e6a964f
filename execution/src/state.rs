use gambit_types::execution::{Key, Value};
use std::{collections::HashMap, future::Future};

/// Key/value storage for escrow records. Records are never removed: a
/// finished escrow keeps its terminal record and custody history.
pub trait State {
    fn get(&self, key: &Key) -> impl Future<Output = Option<Value>>;
    fn insert(&mut self, key: Key, value: Value) -> impl Future<Output = ()>;

    fn apply(&mut self, changes: Vec<(Key, Value)>) -> impl Future<Output = ()> {
        async {
            for (key, value) in changes {
                self.insert(key, value).await;
            }
        }
    }
}

#[derive(Default)]
pub struct Memory {
    state: HashMap<Key, Value>,
}

impl State for Memory {
    async fn get(&self, key: &Key) -> Option<Value> {
        self.state.get(key).cloned()
    }

    async fn insert(&mut self, key: Key, value: Value) {
        self.state.insert(key, value);
    }
}
