use thiserror::Error;

/// Depth of an indicator in the catalog hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Class,
    Group,
    Variable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("invalid id format {id:?}: {reason}")]
    InvalidIdFormat { id: String, reason: &'static str },
}

/// Optional companion flags from the metadata row that disambiguate 3-segment ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelHint {
    pub group: bool,
    pub element: bool,
}

impl LevelHint {
    pub fn none() -> Self {
        Self::default()
    }

    /// Both flags set: the row claims to be a group and an element at once.
    pub fn is_ambiguous(&self) -> bool {
        self.group && self.element
    }
}

/// A parsed dotted identifier such as `3.1.2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DottedId {
    raw: String,
    segments: Vec<String>,
}

impl DottedId {
    pub fn parse(id: &str) -> Result<Self, IdError> {
        let raw = id.trim();
        let invalid = |reason| IdError::InvalidIdFormat {
            id: id.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Err(invalid("empty id"));
        }
        if raw.ends_with('.') {
            return Err(invalid("trailing dot"));
        }

        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid("empty segment"));
        }
        if segments[0].parse::<u32>().is_err() {
            return Err(invalid("first segment is not numeric"));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn class_id(&self) -> &str {
        &self.segments[0]
    }

    /// Numeric value of the class segment; always present after a successful parse.
    pub fn class_number(&self) -> u32 {
        self.segments[0].parse().unwrap_or(0)
    }

    pub fn group_id(&self) -> Option<String> {
        (self.segments.len() >= 2).then(|| self.segments[..2].join("."))
    }

    /// Positional level, ignoring metadata flags.
    pub fn positional_level(&self) -> Level {
        match self.segments.len() {
            1 => Level::Class,
            2 => Level::Group,
            _ => Level::Variable,
        }
    }

    /// Level with the metadata flags applied to 3-segment ids.
    ///
    /// `Grupo` wins over `Elemento` when both are present; with neither present the id keeps
    /// its positional level.
    pub fn level(&self, hint: LevelHint) -> Level {
        if self.segments.len() == 3 && hint.group {
            return Level::Group;
        }
        self.positional_level()
    }
}

impl std::fmt::Display for DottedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
