use std::sync::{Arc, Mutex};

type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A named reactive value cell: the only notification mechanism in the engine.
///
/// Subscribing fires the callback once with the current value, then once per
/// write, in registration order. Writes always notify — there is no equality
/// check, no batching and no coalescing.
pub struct Parameter<T> {
    name: String,
    value: Mutex<T>,
    subscribers: Mutex<Vec<Subscriber<T>>>,
}

impl<T: Clone> Parameter<T> {
    pub fn new(name: &str, value: T) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            value: Mutex::new(value),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> T {
        self.value.lock().unwrap().clone()
    }

    /// Store the value, then invoke every subscriber with it, synchronously,
    /// on the writing thread.
    pub fn set(&self, value: T) {
        *self.value.lock().unwrap() = value.clone();
        // Snapshot outside the loop so a callback may subscribe or write
        // without holding the list lock
        let subscribers = self.subscribers.lock().unwrap().clone();
        for subscriber in &subscribers {
            subscriber(&value);
        }
    }

    /// Register a callback. It fires immediately with the current value.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) {
        let callback: Subscriber<T> = Arc::new(callback);
        let current = self.value.lock().unwrap().clone();
        callback(&current);
        self.subscribers.lock().unwrap().push(callback);
    }
}

/// A one-shot boolean flag: the requester sets it, the servicing component
/// clears it once acted upon.
pub type Trigger = Arc<Parameter<bool>>;

pub fn trigger(name: &str, initial: bool) -> Trigger {
    Parameter::new(name, initial)
}

/// A float parameter with an advisory `[min, max]` bound pair. Nothing clamps
/// writes here; consumers that care (the wanderers) enforce their own limits.
#[derive(Clone)]
pub struct NumericParameter {
    param: Arc<Parameter<f32>>,
    min: f32,
    max: f32,
}

impl NumericParameter {
    pub fn new(name: &str, bounds: (f32, f32), value: f32) -> Self {
        Self {
            param: Parameter::new(name, value),
            min: bounds.0,
            max: bounds.1,
        }
    }

    pub fn name(&self) -> &str {
        self.param.name()
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    pub fn get(&self) -> f32 {
        self.param.get()
    }

    pub fn set(&self, value: f32) {
        self.param.set(value);
    }

    pub fn subscribe(&self, callback: impl Fn(&f32) + Send + Sync + 'static) {
        self.param.subscribe(callback);
    }
}
