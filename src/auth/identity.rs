use uuid::Uuid;

/// Who a verified token speaks for.
///
/// Self-issued tokens name an internal user id; externally issued tokens name
/// an opaque subject. The two spaces are never reconciled, so data saved under
/// one is invisible to the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    Local(Uuid),
    Federated(String),
}

impl Identity {
    /// Key for this identity's favorites and setlist documents
    pub fn storage_key(&self) -> String {
        match self {
            Identity::Local(id) => id.to_string(),
            Identity::Federated(subject) => subject.clone(),
        }
    }

    /// Internal user id, if this identity has a credential record
    pub fn local_id(&self) -> Option<Uuid> {
        match self {
            Identity::Local(id) => Some(*id),
            Identity::Federated(_) => None,
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identity::Local(id) => write!(f, "local:{}", id),
            Identity::Federated(subject) => write!(f, "federated:{}", subject),
        }
    }
}
