use {
    crate::{Output, Strings},
    serde::Serialize,
    std::collections::{btree_map::Iter, BTreeMap},
};

/// The Principal or NotPrincipal element of a statement: principal types (`AWS`, `CanonicalUser`, `Federated`,
/// `Service`, ...) mapped to the identifiers of that type.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Principal(BTreeMap<String, Strings>);

impl Principal {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `ids` to the identifiers already present for `principal_type`.
    pub fn add<T, S>(&mut self, principal_type: T, ids: S)
    where
        T: Into<String>,
        S: Into<Strings>,
    {
        self.0.entry(principal_type.into()).or_default().extend(ids);
    }

    #[inline]
    pub fn get(&self, principal_type: &str) -> Option<&Strings> {
        self.0.get(principal_type)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn iter(&self) -> Iter<'_, String, Strings> {
        self.0.iter()
    }

    /// Wait for every deferred identifier.
    pub fn resolve(&self) -> Output<Principal> {
        let types = self.0.keys().cloned().collect::<Vec<_>>();
        Output::all(self.0.values().map(Strings::resolve))
            .apply(move |ids| Principal(types.into_iter().zip(ids).collect()))
    }
}

display_json!(Principal);
