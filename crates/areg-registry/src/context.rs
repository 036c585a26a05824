use areg_types::{Principal, Sequence};

/// Who is calling, and at what logical time.
///
/// The host authenticates the caller and supplies the sequence; the registry
/// trusts both. A host without its own clock builds an
/// [`unsequenced`](CallContext::unsequenced) context and the registry
/// stamps the operation with the sequence after the highest one observed,
/// while it holds its lock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Principal,
    /// Ignored while the context is unsequenced.
    pub now: Sequence,
    unsequenced: bool,
}

impl CallContext {
    pub fn new(caller: Principal, now: Sequence) -> Self {
        Self {
            caller,
            now,
            unsequenced: false,
        }
    }

    /// A context whose sequence the registry assigns when the operation runs.
    pub fn unsequenced(caller: Principal) -> Self {
        Self {
            caller,
            now: Sequence::zero(),
            unsequenced: true,
        }
    }

    /// Shorthand for a named caller at a raw sequence value.
    pub fn named(handle: &str, now: u64) -> Self {
        Self::new(Principal::named(handle), Sequence::new(now))
    }

    /// The caller-supplied sequence, if there is one.
    pub fn sequence(&self) -> Option<Sequence> {
        (!self.unsequenced).then_some(self.now)
    }

    pub(crate) fn stamped(&self, last: Sequence) -> Self {
        match self.sequence() {
            Some(_) => self.clone(),
            None => Self::new(self.caller.clone(), last.next()),
        }
    }
}
