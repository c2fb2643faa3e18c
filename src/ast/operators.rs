use std::fmt;

/// FIQL comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,
    /// Greater than (`=gt=`)
    GreaterThan,
    /// Greater than or equal (`=ge=`)
    GreaterEqual,
    /// Less than (`=lt=`)
    LessThan,
    /// Less than or equal (`=le=`)
    LessEqual,
    /// Set membership (`=in=`)
    In,
    /// Negated set membership (`=out=`)
    Out,
    /// Regular expression match (`=like=`)
    Like,
    /// Field presence (`=exists=`)
    Exists,
    /// List contains every literal (`=all=`)
    All,
    /// Some list element satisfies a nested query (`=matches=`)
    Matches,
}

impl ComparisonOperator {
    /// Look up a named operator by the text between its `=` delimiters.
    pub fn from_name(name: &str) -> Option<Self> {
        use ComparisonOperator::*;
        Some(match name {
            "gt" => GreaterThan,
            "ge" => GreaterEqual,
            "lt" => LessThan,
            "le" => LessEqual,
            "in" => In,
            "out" => Out,
            "like" => Like,
            "exists" => Exists,
            "all" => All,
            "matches" => Matches,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        use ComparisonOperator::*;
        match self {
            Equal => "==",
            NotEqual => "!=",
            GreaterThan => "=gt=",
            GreaterEqual => "=ge=",
            LessThan => "=lt=",
            LessEqual => "=le=",
            In => "=in=",
            Out => "=out=",
            Like => "=like=",
            Exists => "=exists=",
            All => "=all=",
            Matches => "=matches=",
        }
    }

    /// Operators whose argument is a list of literals.
    pub fn takes_list(&self) -> bool {
        matches!(
            self,
            ComparisonOperator::In | ComparisonOperator::Out | ComparisonOperator::All
        )
    }

    /// Ordering comparisons (`gt`, `ge`, `lt`, `le`).
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            ComparisonOperator::GreaterThan
                | ComparisonOperator::GreaterEqual
                | ComparisonOperator::LessThan
                | ComparisonOperator::LessEqual
        )
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
