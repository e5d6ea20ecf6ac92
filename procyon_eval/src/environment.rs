use std::{cell::RefCell, collections::HashMap, rc::Rc};

use log::debug;

use crate::{stdlib, types::Value};

/// One scope frame. Frames form a chain through `parent`; the frame
/// without a parent is the global scope.
#[derive(Debug, Default)]
pub struct Env {
    values: HashMap<String, Value>,
    pub parent: Option<Rc<RefCell<Env>>>,
}

impl Env {
    /// A fresh global scope, seeded with the built-in constants.
    pub fn new() -> Rc<RefCell<Self>> {
        let mut env = Self::default();
        stdlib::init_constants(&mut env);
        Rc::new(RefCell::new(env))
    }

    pub fn with_parent(parent: Rc<RefCell<Env>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            parent: Some(parent),
            ..Default::default()
        }))
    }

    pub fn set(&mut self, name: &str, value: Value) {
        debug!("Set {name} -> {value:?}");
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up in this frame, then in each ancestor in turn.
    pub fn get(&self, name: &str) -> Option<Value> {
        debug!("Get {name}");
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        if let Some(parent) = &self.parent {
            debug!("Get {name} from parent");
            return parent.borrow().get(name);
        }
        None
    }

    /// Bindings held directly by this frame, in no particular order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
