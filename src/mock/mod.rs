//! Call-recording mocks
//!
//! A [`CallLog`] is shared by all [`MockMethod`]s of one mock object. Each
//! call records the method name and its arguments rendered with `Display`,
//! so tests can verify interactions by comparing strings.

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::fmt::{self, Display};
use std::sync::Arc;

/// One recorded invocation
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CallInfo {
    pub method: String,
    pub args: Vec<String>,
}

impl fmt::Display for CallInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.method, self.args.join(", "))
    }
}

/// Thread-safe, append-only invocation log
#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<Vec<CallInfo>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_call(&self, method: impl Into<String>, args: Vec<String>) {
        let call = CallInfo {
            method: method.into(),
            args,
        };
        tracing::trace!(%call, "mock call recorded");
        self.calls.lock().push(call);
    }

    /// Whether any recorded call matches `method` with exactly `expected_args`
    pub fn verify_call(&self, method: &str, expected_args: &[&str]) -> bool {
        self.calls
            .lock()
            .iter()
            .any(|call| call.method == method && call.args == expected_args)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method)
            .count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Snapshot of every call so far, in order
    pub fn calls(&self) -> Vec<CallInfo> {
        self.calls.lock().clone()
    }
}

/// Argument tuples that can be rendered for the call log
pub trait MockArgs {
    fn to_strings(&self) -> Vec<String>;
}

impl MockArgs for () {
    fn to_strings(&self) -> Vec<String> {
        Vec::new()
    }
}

macro_rules! impl_mock_args {
    ($($ty:ident $idx:tt),+) => {
        impl<$($ty: Display),+> MockArgs for ($($ty,)+) {
            fn to_strings(&self) -> Vec<String> {
                vec![$(self.$idx.to_string()),+]
            }
        }
    };
}

impl_mock_args!(A 0);
impl_mock_args!(A 0, B 1);
impl_mock_args!(A 0, B 1, C 2);
impl_mock_args!(A 0, B 1, C 2, D 3);

type Behavior<A, R> = Box<dyn Fn(&A) -> R + Send + Sync>;

/// Recording stand-in for one method
pub struct MockMethod<A, R> {
    name: String,
    log: Arc<CallLog>,
    behavior: RwLock<Option<Behavior<A, R>>>,
}

impl<A: MockArgs, R: Default> MockMethod<A, R> {
    pub fn new(name: impl Into<String>, log: Arc<CallLog>) -> Self {
        Self {
            name: name.into(),
            log,
            behavior: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Install the implementation used by subsequent calls
    pub fn returns(&self, f: impl Fn(&A) -> R + Send + Sync + 'static) -> &Self {
        *self.behavior.write() = Some(Box::new(f));
        self
    }

    /// Record the call, then answer with the installed behavior or `R::default()`
    pub fn call(&self, args: A) -> R {
        self.log.record_call(self.name.as_str(), args.to_strings());
        match self.behavior.read().as_ref() {
            Some(f) => f(&args),
            None => R::default(),
        }
    }

    pub fn reset(&self) {
        *self.behavior.write() = None;
    }

    pub fn call_count(&self) -> usize {
        self.log.call_count(&self.name)
    }
}

impl<A, R> fmt::Debug for MockMethod<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockMethod")
            .field("name", &self.name)
            .field("has_behavior", &self.behavior.read().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_args_render_with_display() {
        assert!(().to_strings().is_empty());
        assert_eq!((1, 2, 3).to_strings(), vec!["1", "2", "3"]);
        assert_eq!((2.0, 3.5).to_strings(), vec!["2", "3.5"]);
        assert_eq!(("Hello", String::from("World")).to_strings(), vec!["Hello", "World"]);
    }

    #[test]
    fn test_call_log_verify() {
        let log = CallLog::new();
        log.record_call("add3", vec!["1".into(), "2".into(), "3".into()]);
        log.record_call("add3", vec!["4".into(), "5".into(), "6".into()]);

        assert!(log.verify_call("add3", &["1", "2", "3"]));
        assert!(log.verify_call("add3", &["4", "5", "6"]));
        assert!(!log.verify_call("add3", &["1", "2"]));
        assert!(!log.verify_call("sub", &[]));
        assert_eq!(log.call_count("add3"), 2);

        log.clear();
        assert!(log.calls().is_empty());
    }

    #[test]
    fn test_mock_method_uses_behavior() {
        let log = Arc::new(CallLog::new());
        let add3: MockMethod<(i32, i32, i32), i32> = MockMethod::new("add3", Arc::clone(&log));
        add3.returns(|(a, b, c)| a + b + c + 10);

        assert_eq!(add3.call((1, 2, 3)), 16);
        assert!(log.verify_call("add3", &["1", "2", "3"]));
        assert_eq!(add3.call_count(), 1);
    }

    #[test]
    fn test_mock_method_defaults_without_behavior() {
        let log = Arc::new(CallLog::new());
        let concat: MockMethod<(&str, &str), String> = MockMethod::new("concat", Arc::clone(&log));

        assert_eq!(concat.call(("a", "b")), "");
        concat.returns(|(a, b)| format!("{a}{b}"));
        assert_eq!(concat.call(("a", "b")), "ab");
        concat.reset();
        assert_eq!(concat.call(("a", "b")), "");
        assert_eq!(log.calls().len(), 3);
        assert_eq!(log.calls()[0].to_string(), "concat(a, b)");
    }

    #[test]
    fn test_no_args_method() {
        let log = Arc::new(CallLog::new());
        let called = Arc::new(AtomicBool::new(false));
        let ping: MockMethod<(), ()> = MockMethod::new("ping", Arc::clone(&log));
        let flag = Arc::clone(&called);
        ping.returns(move |_| flag.store(true, Ordering::SeqCst));

        ping.call(());
        assert!(called.load(Ordering::SeqCst));
        assert!(log.verify_call("ping", &[]));
    }

    #[test]
    fn test_call_log_shared_across_threads() {
        let log = Arc::new(CallLog::new());
        let method = Arc::new(MockMethod::<(usize,), ()>::new("work", Arc::clone(&log)));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let method = Arc::clone(&method);
                std::thread::spawn(move || method.call((i,)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(log.call_count("work"), 4);
        assert!(log.verify_call("work", &["3"]));
    }
}
