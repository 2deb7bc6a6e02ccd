use {
    crate::{Output, Strings},
    serde::Serialize,
    std::collections::BTreeMap,
};

/// Values for each condition key, as used under a single condition operator.
pub type ConditionMap = BTreeMap<String, Strings>;

/// The Condition element of a statement: condition operators (`StringEquals`, `ArnLike`, `Bool`, ...) mapped to
/// condition keys and the values they are compared against.
///
/// See <https://docs.aws.amazon.com/IAM/latest/UserGuide/reference_policies_elements_condition.html>.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Condition(BTreeMap<String, ConditionMap>);

impl Condition {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the values for `key` under `op`, replacing any values previously set for that pair.
    pub fn set<O, K, S>(&mut self, op: O, key: K, values: S)
    where
        O: Into<String>,
        K: Into<String>,
        S: Into<Strings>,
    {
        self.0.entry(op.into()).or_default().insert(key.into(), values.into());
    }

    #[inline]
    pub fn get(&self, op: &str) -> Option<&ConditionMap> {
        self.0.get(op)
    }

    #[inline]
    pub fn get_values(&self, op: &str, key: &str) -> Option<&Strings> {
        self.0.get(op).and_then(|keys| keys.get(key))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wait for every deferred condition value.
    pub fn resolve(&self) -> Output<Condition> {
        let mut pairs = Vec::new();
        let mut values = Vec::new();
        for (op, keys) in &self.0 {
            for (key, strings) in keys {
                pairs.push((op.clone(), key.clone()));
                values.push(strings.resolve());
            }
        }

        Output::all(values).apply(move |values| {
            let mut result = Condition::new();
            for ((op, key), strings) in pairs.into_iter().zip(values) {
                result.set(op, key, strings);
            }
            result
        })
    }
}

display_json!(Condition);

#[cfg(test)]
mod tests {
    use {
        crate::{Condition, Output},
        futures::executor::block_on,
        indoc::indoc,
        pretty_assertions::assert_eq,
    };

    #[test_log::test]
    fn test_last_write_wins_per_key() {
        let mut c = Condition::new();
        assert!(c.is_empty());
        c.set("StringEquals", "aws:username", "alice");
        c.set("StringEquals", "aws:PrincipalTag/team", ["red", "blue"]);
        c.set("StringEquals", "aws:username", ["bob", "carol"]);
        c.set("Bool", "aws:SecureTransport", "true");

        assert_eq!(c.get("StringEquals").unwrap().len(), 2);
        assert_eq!(c.get_values("StringEquals", "aws:username").unwrap().flatten().unwrap(), vec!["bob", "carol"]);
        assert_eq!(c.get_values("Bool", "aws:SecureTransport").unwrap().flatten().unwrap(), vec!["true"]);
        assert!(c.get_values("Bool", "aws:username").is_none());
        assert!(c.get("NumericLessThan").is_none());

        assert_eq!(
            c.to_string(),
            indoc! { r#"
            {
                "Bool": {
                    "aws:SecureTransport": "true"
                },
                "StringEquals": {
                    "aws:PrincipalTag/team": [
                        "red",
                        "blue"
                    ],
                    "aws:username": [
                        "bob",
                        "carol"
                    ]
                }
            }"# }
        );
    }

    #[test_log::test]
    fn test_resolve() {
        let mut c = Condition::new();
        c.set("ArnLike", "aws:SourceArn", Output::known("arn:aws:sns:us-east-1:123456789012:topic".to_string()));
        c.set("StringEquals", "aws:SourceAccount", "123456789012");

        let resolved = block_on(c.resolve()).unwrap();
        assert_eq!(
            serde_json::to_string(&resolved).unwrap(),
            r#"{"ArnLike":{"aws:SourceArn":"arn:aws:sns:us-east-1:123456789012:topic"},"StringEquals":{"aws:SourceAccount":"123456789012"}}"#
        );
    }
}
