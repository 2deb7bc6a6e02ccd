use {
    crate::{DeferError, Output},
    serde::{
        ser::{self, Serializer},
        Serialize,
    },
    serde_json::ser::PrettyFormatter,
    std::fmt::{Debug, Formatter, Result as FmtResult},
};

/// Implement Display for a given class by formatting it as pretty-printed JSON.
macro_rules! display_json {
    ($cls:ident) => {
        impl ::std::fmt::Display for $cls {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                match $crate::serutil::to_json_pretty(self) {
                    Ok(s) => f.write_str(&s),
                    Err(e) => {
                        ::log::error!("Failed to serialize: {}", e);
                        Err(::std::fmt::Error {})
                    }
                }
            }
        }
    };
}

/// Serialize `value` as JSON indented with four spaces.
pub(crate) fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, DeferError> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(Vec::new(), formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(ser.into_inner()).map_err(|e| DeferError::Serialization(e.to_string()))
}

/// One input to a [Strings] list: a string or list of strings, either known now or deferred.
#[derive(Clone)]
pub enum StringInput {
    Literal(String),
    List(Vec<String>),
    Deferred(Output<String>),
    DeferredList(Output<Vec<String>>),
}

impl StringInput {
    #[inline]
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_) | Self::DeferredList(_))
    }

    /// The strings this input contributes, once known.
    pub fn resolve(&self) -> Output<Vec<String>> {
        match self {
            Self::Literal(s) => Output::known(vec![s.clone()]),
            Self::List(l) => Output::known(l.clone()),
            Self::Deferred(o) => o.apply(|s| vec![s]),
            Self::DeferredList(o) => o.clone(),
        }
    }
}

impl Debug for StringInput {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::Literal(s) => write!(f, "{:?}", s),
            Self::List(l) => write!(f, "{:?}", l),
            Self::Deferred(o) => write!(f, "{:?}", o),
            Self::DeferredList(o) => write!(f, "{:?}", o),
        }
    }
}

impl From<&str> for StringInput {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_string())
    }
}

impl From<String> for StringInput {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

impl From<Vec<String>> for StringInput {
    fn from(l: Vec<String>) -> Self {
        Self::List(l)
    }
}

impl From<Vec<&str>> for StringInput {
    fn from(l: Vec<&str>) -> Self {
        Self::List(l.into_iter().map(String::from).collect())
    }
}

impl From<Output<String>> for StringInput {
    fn from(o: Output<String>) -> Self {
        Self::Deferred(o)
    }
}

impl From<Output<Vec<String>>> for StringInput {
    fn from(o: Output<Vec<String>>) -> Self {
        Self::DeferredList(o)
    }
}

/// An ordered list of string inputs that flattens into a single list of strings.
///
/// Once every input is known, this serializes as a bare JSON string if it holds exactly one string, and as a JSON
/// array otherwise.
#[derive(Clone, Debug, Default)]
pub struct Strings(Vec<StringInput>);

impl Strings {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<I: Into<StringInput>>(&mut self, input: I) {
        self.0.push(input.into());
    }

    /// Append every input of `other` after the inputs already present.
    pub fn extend<S: Into<Strings>>(&mut self, other: S) {
        self.0.extend(other.into().0);
    }

    /// True if no inputs have been added. An input holding an empty list still counts as an input.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn inputs(&self) -> &[StringInput] {
        &self.0
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        !self.0.iter().any(StringInput::is_deferred)
    }

    /// The flattened strings. Fails if any input is still deferred.
    pub fn flatten(&self) -> Result<Vec<&str>, DeferError> {
        let mut result = Vec::with_capacity(self.0.len());
        for input in &self.0 {
            match input {
                StringInput::Literal(s) => result.push(s.as_str()),
                StringInput::List(l) => result.extend(l.iter().map(String::as_str)),
                StringInput::Deferred(_) | StringInput::DeferredList(_) => {
                    return Err(DeferError::Serialization("string list contains an unresolved output".to_string()))
                }
            }
        }
        Ok(result)
    }

    /// Wait for every deferred input and flatten the result into a list of known strings.
    pub fn resolve(&self) -> Output<Strings> {
        if self.is_empty() {
            return Output::known(Strings::new());
        }

        Output::all(self.0.iter().map(StringInput::resolve))
            .apply(|lists| Strings::from(lists.into_iter().flatten().collect::<Vec<String>>()))
    }
}

impl From<StringInput> for Strings {
    fn from(input: StringInput) -> Self {
        Self(vec![input])
    }
}

impl From<Vec<StringInput>> for Strings {
    fn from(inputs: Vec<StringInput>) -> Self {
        Self(inputs)
    }
}

impl From<&str> for Strings {
    fn from(s: &str) -> Self {
        StringInput::from(s).into()
    }
}

impl From<String> for Strings {
    fn from(s: String) -> Self {
        StringInput::from(s).into()
    }
}

impl From<Vec<String>> for Strings {
    fn from(l: Vec<String>) -> Self {
        StringInput::from(l).into()
    }
}

impl From<Vec<&str>> for Strings {
    fn from(l: Vec<&str>) -> Self {
        StringInput::from(l).into()
    }
}

impl<const N: usize> From<[&str; N]> for Strings {
    fn from(l: [&str; N]) -> Self {
        StringInput::from(l.to_vec()).into()
    }
}

impl From<Output<String>> for Strings {
    fn from(o: Output<String>) -> Self {
        StringInput::from(o).into()
    }
}

impl From<Output<Vec<String>>> for Strings {
    fn from(o: Output<Vec<String>>) -> Self {
        StringInput::from(o).into()
    }
}

impl Serialize for Strings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self
            .flatten()
            .map_err(|_| ser::Error::custom("string list contains an unresolved output"))?;
        if entries.len() == 1 {
            serializer.serialize_str(entries[0])
        } else {
            entries.serialize(serializer)
        }
    }
}
