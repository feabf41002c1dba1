use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    RegionChange,
    Extract,
    Route,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestToken {
    operation: Operation,
    value: u64,
}

/// One counter per operation. A response is applied only if its token is still
/// the newest one issued for that operation.
#[derive(Debug, Default)]
pub struct RequestTokens {
    region_change: AtomicU64,
    extract: AtomicU64,
    route: AtomicU64,
}

impl RequestTokens {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, operation: Operation) -> &AtomicU64 {
        match operation {
            Operation::RegionChange => &self.region_change,
            Operation::Extract => &self.extract,
            Operation::Route => &self.route,
        }
    }

    pub fn issue(&self, operation: Operation) -> RequestToken {
        let value = self.counter(operation).fetch_add(1, Ordering::SeqCst) + 1;

        RequestToken { operation, value }
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        self.counter(token.operation).load(Ordering::SeqCst) == token.value
    }
}

#[test]
fn only_the_newest_token_is_latest() {
    let tokens = RequestTokens::new();

    let first = tokens.issue(Operation::Extract);
    assert!(tokens.is_latest(first));

    let second = tokens.issue(Operation::Extract);
    assert!(!tokens.is_latest(first));
    assert!(tokens.is_latest(second));
}

#[test]
fn operations_are_independent() {
    let tokens = RequestTokens::new();

    let route = tokens.issue(Operation::Route);
    tokens.issue(Operation::RegionChange);
    tokens.issue(Operation::Extract);

    assert!(tokens.is_latest(route));
}
