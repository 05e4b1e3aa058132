use const_format::formatcp;
use validator::ValidationError;

use crate::constants::{COMMENT_PREFIX, MAX_APEX_NAME_LENGTH, POST_PREFIX};
use crate::errors::AppError;

/// Reference to a post or comment through its prefixed identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentName {
    Post(String),
    Comment(String),
}

impl ContentName {
    pub fn id(&self) -> &str {
        match self {
            ContentName::Post(id) | ContentName::Comment(id) => id,
        }
    }
}

/// # Parses a `t3_` post or `t1_` comment identifier given in the input field `field`
///
/// ```
/// use apex_utils::checks::{check_content_name, ContentName};
///
/// assert_eq!(check_content_name("t3_12", "name"), Ok(ContentName::Post(String::from("t3_12"))));
/// assert_eq!(check_content_name("t1_4", "name"), Ok(ContentName::Comment(String::from("t1_4"))));
/// assert!(check_content_name("t5_1", "name").is_err());
/// assert!(check_content_name("t3_", "name").is_err());
/// ```
pub fn check_content_name(name: &str, field: &str) -> Result<ContentName, AppError> {
    let name = name.trim();
    match (name.strip_prefix(POST_PREFIX), name.strip_prefix(COMMENT_PREFIX)) {
        (Some(suffix), _) if !suffix.is_empty() => Ok(ContentName::Post(name.to_string())),
        (_, Some(suffix)) if !suffix.is_empty() => Ok(ContentName::Comment(name.to_string())),
        _ => Err(AppError::invalid_field(field, format!("The {field} must be a post or comment identifier."))),
    }
}

/// # Returns whether the given string contains something else than whitespace
///
/// ```
/// use apex_utils::checks::check_not_blank;
///
/// assert!(check_not_blank("report").is_ok());
/// assert!(check_not_blank("").is_err());
/// assert!(check_not_blank(" \n\t").is_err());
/// ```
pub fn check_not_blank(input: &str) -> Result<(), ValidationError> {
    match input.trim().is_empty() {
        true => Err(ValidationError::new("blank").with_message("This field cannot be empty.".into())),
        false => Ok(()),
    }
}

/// # Returns whether an apex name is valid.
///
/// # Valid apex names contain only ascii alphanumeric characters, '-', '_' and have a maximum length of `MAX_APEX_NAME_LENGTH`
///
/// ```
/// use apex_utils::checks::check_apex_name;
/// use apex_utils::constants::MAX_APEX_NAME_LENGTH;
///
/// assert!(check_apex_name("-Abc123_").is_ok());
/// assert!(check_apex_name("").is_err());
/// assert!(check_apex_name(" name").is_err());
/// assert!(check_apex_name("name%").is_err());
/// assert!(check_apex_name(&"a".repeat(MAX_APEX_NAME_LENGTH as usize)).is_ok());
/// assert!(check_apex_name(&"a".repeat(MAX_APEX_NAME_LENGTH as usize + 1)).is_err());
/// ```
pub fn check_apex_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        Err(ValidationError::new("empty").with_message("Apex name cannot be empty.".into()))
    } else if !name.chars().all(move |c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        Err(ValidationError::new("charset").with_message("Apex name can only contain alphanumeric characters, dashes and underscores.".into()))
    } else if name.len() > MAX_APEX_NAME_LENGTH as usize {
        Err(ValidationError::new("length").with_message(formatcp!("Apex name cannot exceed {MAX_APEX_NAME_LENGTH} characters.").into()))
    } else {
        Ok(())
    }
}

/// # Maps an absent, empty or whitespace-only optional input to `None`
///
/// ```
/// use apex_utils::checks::non_empty;
///
/// assert_eq!(non_empty(None), None);
/// assert_eq!(non_empty(Some(String::from(""))), None);
/// assert_eq!(non_empty(Some(String::from("  "))), None);
/// assert_eq!(non_empty(Some(String::from(" t5_1 "))), Some(String::from("t5_1")));
/// ```
pub fn non_empty(input: Option<String>) -> Option<String> {
    input
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// # Returns the value of a required input or a validation error naming the field
///
/// ```
/// use apex_utils::checks::require_field;
///
/// assert_eq!(require_field(Some(String::from("t5_1")), "ApexCommID"), Ok(String::from("t5_1")));
/// assert!(require_field(Some(String::new()), "ApexCommID").is_err());
/// assert!(require_field(None, "ApexCommID").is_err());
/// ```
pub fn require_field(input: Option<String>, field: &str) -> Result<String, AppError> {
    non_empty(input).ok_or_else(|| AppError::invalid_field(field, format!("The {field} field is required.")))
}
