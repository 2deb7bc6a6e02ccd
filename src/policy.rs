use {
    crate::{serutil::to_json_pretty, DeferError, Output, Statement},
    serde::{
        ser::{SerializeMap, Serializer},
        Serialize,
    },
    std::{
        fmt::{Display, Formatter, Result as FmtResult},
        str::FromStr,
    },
};

/// Policy versions.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PolicyVersion {
    None,
    V2008_10_17,
    V2012_10_17,
}

impl PolicyVersion {
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    #[inline]
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }
}

/// New policies use `2012-10-17`, the version that supports policy variables.
impl Default for PolicyVersion {
    fn default() -> Self {
        Self::V2012_10_17
    }
}

impl Display for PolicyVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::None => Ok(()),
            Self::V2008_10_17 => f.write_str("2008-10-17"),
            Self::V2012_10_17 => f.write_str("2012-10-17"),
        }
    }
}

impl FromStr for PolicyVersion {
    type Err = DeferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::None),
            "2008-10-17" => Ok(Self::V2008_10_17),
            "2012-10-17" => Ok(Self::V2012_10_17),
            _ => Err(DeferError::InvalidPolicy {
                id: String::new(),
                detail: format!("invalid policy version {:?}", s),
                statement: None,
            }),
        }
    }
}

impl Serialize for PolicyVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// An IAM policy document that can be rendered to JSON once every deferred value it holds has resolved.
///
/// ```
/// use deferkit::{Effect, Output, Policy, Statement};
///
/// let bucket_arn = Output::known("arn:aws:s3:::my-bucket".to_string());
/// let policy = Policy::builder("my-bucket-policy")
///     .statement(
///         Statement::builder("cross-account-access")
///             .effect(Effect::Allow)
///             .action(["s3:GetObject", "s3:PutObject"])
///             .principal("AWS", "arn:aws:iam::123456789012:root")
///             .resource(bucket_arn.apply(|arn| format!("{}/*", arn))),
///     )
///     .build();
///
/// let json = futures::executor::block_on(policy.render()).unwrap();
/// assert!(json.contains(r#""Resource": "arn:aws:s3:::my-bucket/*""#));
/// ```
#[derive(Clone, Debug)]
pub struct Policy {
    version: PolicyVersion,
    id: String,
    statement: Vec<Statement>,
}

impl Policy {
    #[inline]
    pub fn builder<S: Into<String>>(id: S) -> PolicyBuilder {
        PolicyBuilder {
            policy: Policy {
                version: PolicyVersion::default(),
                id: id.into(),
                statement: Vec::new(),
            },
        }
    }

    #[inline]
    pub fn version(&self) -> PolicyVersion {
        self.version
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn statement(&self) -> &[Statement] {
        &self.statement
    }

    /// Check that the policy has a version and id, and that every statement is valid.
    pub fn validate(&self) -> Result<(), DeferError> {
        if self.version.is_none() || self.id.is_empty() {
            return Err(DeferError::InvalidPolicy {
                id: self.id.clone(),
                detail: "no version or id set".to_string(),
                statement: None,
            });
        }

        for statement in &self.statement {
            if let Err(e) = statement.validate() {
                return Err(DeferError::InvalidPolicy {
                    id: self.id.clone(),
                    detail: e.to_string(),
                    statement: Some(Box::new(e)),
                });
            }
        }

        Ok(())
    }

    /// Wait for every deferred value held by the policy's statements.
    pub fn resolve(&self) -> Output<Policy> {
        let version = self.version;
        let id = self.id.clone();
        Output::all(self.statement.iter().map(Statement::resolve)).apply(move |statement| Policy {
            version,
            id,
            statement,
        })
    }

    /// Validate the policy, wait for its deferred values, and render it as indented JSON.
    ///
    /// An invalid policy yields an output that has already failed; no deferred value is waited on.
    pub fn render(&self) -> Output<String> {
        if let Err(e) = self.validate() {
            log::debug!("Policy {:?} failed validation: {}", self.id, e);
            return Output::failed(e);
        }

        let id = self.id.clone();
        self.resolve().try_apply(move |policy| {
            log::trace!("Policy {:?} resolved; rendering", id);
            policy.to_json()
        })
    }

    /// Serialize an already resolved policy as indented JSON.
    pub fn to_json(&self) -> Result<String, DeferError> {
        to_json_pretty(self)
    }
}

display_json!(Policy);

/// A single statement is written as a bare object; any other number as an array.
impl Serialize for Policy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_map(None)?;
        if self.version.is_some() {
            state.serialize_entry("Version", &self.version)?;
        }
        if !self.id.is_empty() {
            state.serialize_entry("Id", &self.id)?;
        }
        match self.statement.as_slice() {
            [single] => state.serialize_entry("Statement", single)?,
            statements => state.serialize_entry("Statement", statements)?,
        }
        state.end()
    }
}

/// Builder for [Policy].
#[derive(Clone, Debug)]
pub struct PolicyBuilder {
    policy: Policy,
}

impl PolicyBuilder {
    pub fn version(mut self, version: PolicyVersion) -> Self {
        self.policy.version = version;
        self
    }

    /// Append a statement. Statements are rendered in the order they are added.
    pub fn statement<S: Into<Statement>>(mut self, statement: S) -> Self {
        self.policy.statement.push(statement.into());
        self
    }

    pub fn build(self) -> Policy {
        self.policy
    }
}
