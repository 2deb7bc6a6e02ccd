use {
    crate::{Condition, DeferError, Effect, Output, Principal, Strings},
    serde::Serialize,
};

/// A single policy statement.
///
/// Statements are created through [StatementBuilder]. Fields left empty are omitted when the statement is
/// serialized.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(skip_serializing_if = "Option::is_none")]
    sid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    effect: Option<Effect>,

    #[serde(skip_serializing_if = "Principal::is_empty")]
    principal: Principal,

    #[serde(skip_serializing_if = "Principal::is_empty")]
    not_principal: Principal,

    #[serde(skip_serializing_if = "Strings::is_empty")]
    action: Strings,

    #[serde(skip_serializing_if = "Strings::is_empty")]
    not_action: Strings,

    #[serde(skip_serializing_if = "Strings::is_empty")]
    resource: Strings,

    #[serde(skip_serializing_if = "Strings::is_empty")]
    not_resource: Strings,

    #[serde(skip_serializing_if = "Condition::is_empty")]
    condition: Condition,
}

impl Statement {
    /// Start a statement with the given statement id. An empty sid is omitted from the output.
    pub fn builder<S: Into<String>>(sid: S) -> StatementBuilder {
        let sid = sid.into();
        StatementBuilder {
            statement: Statement {
                sid: if sid.is_empty() {
                    None
                } else {
                    Some(sid)
                },
                ..Default::default()
            },
        }
    }

    #[inline]
    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    #[inline]
    pub fn effect(&self) -> Option<Effect> {
        self.effect
    }

    #[inline]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    #[inline]
    pub fn not_principal(&self) -> &Principal {
        &self.not_principal
    }

    #[inline]
    pub fn action(&self) -> &Strings {
        &self.action
    }

    #[inline]
    pub fn not_action(&self) -> &Strings {
        &self.not_action
    }

    #[inline]
    pub fn resource(&self) -> &Strings {
        &self.resource
    }

    #[inline]
    pub fn not_resource(&self) -> &Strings {
        &self.not_resource
    }

    #[inline]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Check that the required elements are present and that no exclusive pair is set on both sides.
    pub fn validate(&self) -> Result<(), DeferError> {
        let mut errors = Vec::with_capacity(5);
        if self.effect.is_none() {
            errors.push("Effect must be set.");
        }

        if !self.principal.is_empty() && !self.not_principal.is_empty() {
            errors.push("Principal and NotPrincipal cannot both be set.");
        }

        match (self.action.is_empty(), self.not_action.is_empty()) {
            (false, false) => errors.push("Action and NotAction cannot both be set."),
            (true, true) => errors.push("Either Action or NotAction must be set."),
            _ => (),
        }

        if !self.resource.is_empty() && !self.not_resource.is_empty() {
            errors.push("Resource and NotResource cannot both be set.");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            let sid = self.sid().unwrap_or_default();
            log::debug!("Statement {:?} failed validation: {:?}", sid, errors);
            Err(DeferError::InvalidStatement(format!("statement {:?}: {}", sid, errors.join(" "))))
        }
    }

    /// Wait for every deferred principal, action, resource and condition value.
    pub fn resolve(&self) -> Output<Statement> {
        let sid = self.sid.clone();
        let effect = self.effect;
        let principal = self.principal.resolve();
        let not_principal = self.not_principal.resolve();
        let action = self.action.resolve();
        let not_action = self.not_action.resolve();
        let resource = self.resource.resolve();
        let not_resource = self.not_resource.resolve();
        let condition = self.condition.resolve();

        Output::new(async move {
            let (principal, not_principal, action, not_action, resource, not_resource, condition) = futures::try_join!(
                principal,
                not_principal,
                action,
                not_action,
                resource,
                not_resource,
                condition
            )?;

            Ok(Statement {
                sid,
                effect,
                principal,
                not_principal,
                action,
                not_action,
                resource,
                not_resource,
                condition,
            })
        })
    }
}

display_json!(Statement);

/// Builder for [Statement].
///
/// Every setter other than [condition][StatementBuilder::condition] adds to what earlier calls set.
#[derive(Clone, Debug)]
pub struct StatementBuilder {
    statement: Statement,
}

impl StatementBuilder {
    pub fn effect(mut self, effect: Effect) -> Self {
        self.statement.effect = Some(effect);
        self
    }

    /// Add principals of `principal_type` (`AWS`, `CanonicalUser`, ...) to the Principal element.
    pub fn principal<T: Into<String>, S: Into<Strings>>(mut self, principal_type: T, ids: S) -> Self {
        self.statement.principal.add(principal_type, ids);
        self
    }

    /// Add principals of `principal_type` to the NotPrincipal element.
    pub fn not_principal<T: Into<String>, S: Into<Strings>>(mut self, principal_type: T, ids: S) -> Self {
        self.statement.not_principal.add(principal_type, ids);
        self
    }

    pub fn action<S: Into<Strings>>(mut self, actions: S) -> Self {
        self.statement.action.extend(actions);
        self
    }

    pub fn not_action<S: Into<Strings>>(mut self, actions: S) -> Self {
        self.statement.not_action.extend(actions);
        self
    }

    pub fn resource<S: Into<Strings>>(mut self, resources: S) -> Self {
        self.statement.resource.extend(resources);
        self
    }

    pub fn not_resource<S: Into<Strings>>(mut self, resources: S) -> Self {
        self.statement.not_resource.extend(resources);
        self
    }

    /// Set the values for condition `key` under operator `op`. Calling this again for the same operator and key
    /// replaces the earlier values.
    pub fn condition<O, K, S>(mut self, op: O, key: K, values: S) -> Self
    where
        O: Into<String>,
        K: Into<String>,
        S: Into<Strings>,
    {
        self.statement.condition.set(op, key, values);
        self
    }

    /// Finish the statement. Validation is deferred until the enclosing policy is rendered.
    pub fn build(self) -> Statement {
        self.statement
    }
}

impl From<StatementBuilder> for Statement {
    fn from(builder: StatementBuilder) -> Self {
        builder.build()
    }
}
