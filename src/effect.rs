use {
    crate::DeferError,
    serde::Serialize,
    std::{
        fmt::{Display, Formatter, Result as FmtResult},
        str::FromStr,
    },
};

/// Whether a statement grants or refuses access.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl Display for Effect {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Allow => f.write_str("Allow"),
            Self::Deny => f.write_str("Deny"),
        }
    }
}

impl FromStr for Effect {
    type Err = DeferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Allow" => Ok(Self::Allow),
            "Deny" => Ok(Self::Deny),
            _ => Err(DeferError::InvalidStatement(format!("invalid Effect element: {:?}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::{DeferError, Effect},
        pretty_assertions::assert_eq,
        std::str::FromStr,
    };

    #[test_log::test]
    fn test_display() {
        assert_eq!(format!("{}", Effect::Allow), "Allow");
        assert_eq!(format!("{}", Effect::Deny), "Deny");
        assert_eq!(serde_json::to_string(&Effect::Deny).unwrap(), r#""Deny""#);
    }

    #[test_log::test]
    fn test_from_str() {
        assert_eq!(Effect::from_str("Allow").unwrap(), Effect::Allow);
        assert_eq!(Effect::from_str("Deny").unwrap(), Effect::Deny);
        assert_eq!(
            Effect::from_str("allow").unwrap_err(),
            DeferError::InvalidStatement(r#"invalid Effect element: "allow""#.to_string())
        );
    }
}
