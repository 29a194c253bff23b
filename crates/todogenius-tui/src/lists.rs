use todogenius_service::ServiceError;
use tracing::debug;

/// A fetch the caller must perform. `seq` comes back with the result.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket<P> {
    pub seq: u64,
    pub params: P,
}

/// Parameters plus the last collection fetched for them.
///
/// Every fetch gets a new sequence number; only the answer to the newest
/// one is kept, so a slow response can never overwrite a fresher list.
#[derive(Debug)]
pub struct RemoteList<P, T> {
    params: P,
    items: Vec<T>,
    loading: bool,
    error: Option<String>,
    seq: u64,
    fallback_error: &'static str,
}

impl<P: Clone + PartialEq, T> RemoteList<P, T> {
    pub fn new(params: P, fallback_error: &'static str) -> Self {
        Self {
            params,
            items: Vec::new(),
            loading: false,
            error: None,
            seq: 0,
            fallback_error,
        }
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Replace the parameters. Returns `None` when nothing changed.
    pub fn set_params(&mut self, params: P) -> Option<FetchTicket<P>> {
        if params == self.params {
            return None;
        }
        self.params = params;
        Some(self.reload())
    }

    /// Edit the parameters in place; refetches only if they changed.
    pub fn update(&mut self, f: impl FnOnce(&mut P)) -> Option<FetchTicket<P>> {
        let mut next = self.params.clone();
        f(&mut next);
        self.set_params(next)
    }

    pub fn reload(&mut self) -> FetchTicket<P> {
        self.seq += 1;
        self.loading = true;
        self.error = None;
        FetchTicket {
            seq: self.seq,
            params: self.params.clone(),
        }
    }

    /// Apply a fetch result. Returns false when the result was superseded.
    pub fn resolve(&mut self, seq: u64, result: Result<Vec<T>, ServiceError>) -> bool {
        if seq != self.seq {
            debug!(seq, latest = self.seq, "dropping superseded list response");
            return false;
        }
        self.loading = false;
        match result {
            Ok(items) => {
                self.items = items;
                self.error = None;
            }
            Err(e) => self.error = Some(e.user_message(self.fallback_error)),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_params_do_not_refetch() {
        let mut list: RemoteList<String, u32> = RemoteList::new("a".into(), "Error fetching");
        assert!(list.set_params("a".into()).is_none());
        let ticket = list.set_params("b".into()).unwrap();
        assert_eq!(ticket.params, "b");
        assert!(list.is_loading());
    }

    #[test]
    fn reload_always_fetches() {
        let mut list: RemoteList<String, u32> = RemoteList::new("a".into(), "Error fetching");
        let first = list.reload();
        let second = list.reload();
        assert!(second.seq > first.seq);
    }

    #[test]
    fn superseded_response_is_dropped() {
        let mut list: RemoteList<String, u32> = RemoteList::new("a".into(), "Error fetching");
        let old = list.reload();
        let new = list.update(|p| p.push('x')).unwrap();

        assert!(list.resolve(new.seq, Ok(vec![2])));
        assert!(!list.resolve(old.seq, Ok(vec![1, 1])));
        assert_eq!(list.items(), &[2]);
        assert!(!list.is_loading());
    }

    #[test]
    fn error_keeps_previous_items() {
        let mut list: RemoteList<(), u32> = RemoteList::new((), "Error fetching tasks");
        let t = list.reload();
        list.resolve(t.seq, Ok(vec![1]));
        let t = list.reload();
        list.resolve(t.seq, Err(ServiceError::Unavailable("down".into())));
        assert_eq!(list.error(), Some("Error fetching tasks"));
        assert_eq!(list.items(), &[1]);
        list.dismiss_error();
        assert!(list.error().is_none());
    }
}
