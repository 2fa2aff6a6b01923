//! # Method Registry
//!
//! Maps exposed class names to factories producing fresh dispatchable
//! instances. Types become dispatchable by implementing [`RpcObject`],
//! usually through the `#[rpc_class]` attribute macro, and registrable by
//! implementing [`RpcClass`].

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::InvokeError;

/// Dynamic dispatch surface of one object
pub trait RpcObject {
    /// Declared parameter count of `method`, or `None` if there is no such method
    fn method_arity(&self, method: &str) -> Option<usize>;

    /// Invoke `method` with positional parameters.
    ///
    /// Callers check the arity first; `params.len()` equals
    /// `method_arity(method)`. `Ok(None)` means the method produced no value.
    fn invoke(&mut self, method: &str, params: Vec<Value>) -> Result<Option<Value>, InvokeError>;

    /// Names of all exposed methods
    fn method_names(&self) -> &'static [&'static str] {
        &[]
    }
}

/// A type that can be registered with a server.
///
/// Every call is made on a freshly constructed `Default` instance.
pub trait RpcClass: RpcObject + Default + 'static {
    /// Name under which the class is exposed, the `Class` in `Class.Method`
    fn class_name() -> &'static str;
}

/// Type-erased descriptor stored in the registry
pub trait ClassFactory: Send + Sync {
    fn class_name(&self) -> &'static str;

    /// Construct a fresh instance to dispatch a single call on
    fn instantiate(&self) -> Box<dyn RpcObject>;
}

struct DefaultFactory<C>(PhantomData<fn() -> C>);

impl<C: RpcClass> ClassFactory for DefaultFactory<C> {
    fn class_name(&self) -> &'static str {
        C::class_name()
    }

    fn instantiate(&self) -> Box<dyn RpcObject> {
        Box::new(C::default())
    }
}

/// Read-only view of the registry handed to connection handlers
pub type RegistrySnapshot = Arc<HashMap<String, Arc<dyn ClassFactory>>>;

/// Class name to factory mapping.
///
/// Copy-on-write: `register` swaps in a new map under the write lock, and
/// `snapshot` hands out the current map so lookups never take a lock.
#[derive(Default)]
pub struct MethodRegistry {
    classes: RwLock<RegistrySnapshot>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `C` under its class name, replacing any previous entry
    pub fn register<C: RpcClass>(&self) {
        self.insert(Arc::new(DefaultFactory::<C>(PhantomData)));
    }

    /// Register a hand-built factory, replacing any previous entry of the same name
    pub fn insert(&self, factory: Arc<dyn ClassFactory>) {
        let name = factory.class_name().to_string();
        let mut classes = self.classes.write();
        let mut next = HashMap::clone(&classes);
        if next.insert(name.clone(), factory).is_some() {
            debug!("Replaced registered class: {}", name);
        } else {
            debug!("Registered class: {}", name);
        }
        *classes = Arc::new(next);
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        Arc::clone(&self.classes.read())
    }

    /// Registered class names, sorted
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("classes", &self.class_names())
            .finish()
    }
}

/// Deserialize the positional parameter at `index` into its declared type
pub fn bind_param<T: DeserializeOwned>(
    method: &str,
    index: usize,
    value: Value,
) -> Result<T, InvokeError> {
    serde_json::from_value(value).map_err(|e| InvokeError::InvalidParam {
        method: method.to_string(),
        index,
        reason: e.to_string(),
    })
}

/// Serialize a method's return value; JSON `null` counts as no value
pub fn encode_result<T: Serialize>(value: T) -> Result<Option<Value>, InvokeError> {
    match serde_json::to_value(value).map_err(InvokeError::Encode)? {
        Value::Null => Ok(None),
        value => Ok(Some(value)),
    }
}
