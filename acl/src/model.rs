use std::{fmt, str::FromStr};

use crate::Error;

/// Longest object class or access type the schema can hold (`VARCHAR(30)`).
pub const MAX_NAME_LEN: usize = 30;

// Ids are `INT` columns in the schema, and the host application's `users.id` is one too.
pub type UserId = i32;
pub type ObjectId = i32;
/// Primary key of a row in `accessControlObjects`.
pub type AccessCtlObjectId = i32;

fn validate(kind: &'static str, value: &str) -> Result<(), Error> {
    if value.is_empty() || value.chars().count() > MAX_NAME_LEN {
        return Err(Error::InvalidName {
            kind,
            value: value.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// The kind of application object being protected, e.g. `document`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct ObjectClass(String);

impl FromStr for ObjectClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate("object class", s)?;

        Ok(Self(s.to_string()))
    }
}

impl AsRef<str> for ObjectClass {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What a rule allows its grantee to do. Owners always get [AccessType::read]
/// and [AccessType::edit]; applications may define any other type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct AccessType(String);

impl AccessType {
    pub fn read() -> Self {
        Self("read".to_string())
    }

    pub fn edit() -> Self {
        Self("edit".to_string())
    }
}

impl FromStr for AccessType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate("access type", s)?;

        Ok(Self(s.to_string()))
    }
}

impl AsRef<str> for AccessType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
