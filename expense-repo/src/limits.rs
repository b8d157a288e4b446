use thiserror::Error;

/// Longest value of the `VARCHAR(255)` text columns
pub const MAX_TEXT_LENGTH: usize = 255;
/// Longest product code
pub const MAX_CODE_LENGTH: usize = 64;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("{field} is longer than {max} characters")]
pub struct TooLong {
    pub field: &'static str,
    pub max: usize,
}

/// Lengths are counted in characters, the way PostgreSQL counts them for `VARCHAR(n)`.
pub fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), TooLong> {
    if value.chars().count() > max {
        Err(TooLong { field, max })
    } else {
        Ok(())
    }
}
