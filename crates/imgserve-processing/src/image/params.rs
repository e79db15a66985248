//! Operation parameters parsed from request query strings.
//!
//! Only `width`, `height`, `top`, `left` and `quality` are recognized; any other key is
//! ignored. A recognized key must carry a non-negative integer.

use crate::error::OperationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationParameters {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub top: Option<u32>,
    pub left: Option<u32>,
    pub quality: Option<u32>,
}

impl OperationParameters {
    /// Parse key/value pairs. Later duplicates overwrite earlier ones.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, OperationError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key {
                "width" => &mut params.width,
                "height" => &mut params.height,
                "top" => &mut params.top,
                "left" => &mut params.left,
                "quality" => &mut params.quality,
                _ => continue,
            };
            *slot = Some(parse_value(key, value)?);
        }
        Ok(params)
    }

    pub fn get(&self, key: &str) -> Option<u32> {
        match key {
            "width" => self.width,
            "height" => self.height,
            "top" => self.top,
            "left" => self.left,
            "quality" => self.quality,
            _ => None,
        }
    }

    /// Value for a required key, or `InvalidParameter` naming the operation.
    pub fn require(&self, key: &str, operation: &str) -> Result<u32, OperationError> {
        self.get(key).ok_or_else(|| {
            OperationError::InvalidParameter(format!("{} requires the '{}' parameter", operation, key))
        })
    }

    /// Value for a key that must be strictly positive when supplied.
    pub fn positive(&self, key: &str) -> Result<Option<u32>, OperationError> {
        match self.get(key) {
            Some(0) => Err(OperationError::InvalidParameter(format!(
                "'{}' must be greater than 0",
                key
            ))),
            other => Ok(other),
        }
    }

    /// Encoder quality: the supplied value when in 1..=100, otherwise `default`.
    pub fn quality_or(&self, default: u8) -> Result<u8, OperationError> {
        match self.quality {
            None => Ok(default),
            Some(q @ 1..=100) => Ok(q as u8),
            Some(q) => Err(OperationError::InvalidParameter(format!(
                "'quality' must be between 1 and 100, got {}",
                q
            ))),
        }
    }
}

fn parse_value(key: &str, raw: &str) -> Result<u32, OperationError> {
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(v) if v < 0 => Err(OperationError::InvalidParameter(format!(
            "'{}' must be non-negative, got {}",
            key, v
        ))),
        Ok(v) => u32::try_from(v).map_err(|_| {
            OperationError::InvalidParameter(format!("'{}' is too large: {}", key, v))
        }),
        Err(_) => Err(OperationError::InvalidParameter(format!(
            "'{}' must be an integer, got '{}'",
            key, raw
        ))),
    }
}
