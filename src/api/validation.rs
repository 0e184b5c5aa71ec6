use super::ApiError;
use crate::constants::limits;

pub fn validate_id(id: i32, resource: &str) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {} ID: {}. ID must be a positive integer",
            resource, id
        )));
    }
    Ok(id)
}

pub fn validate_page(page: u64) -> Result<u64, ApiError> {
    if page == 0 {
        return Err(ApiError::validation("Page numbers start at 1"));
    }
    Ok(page)
}

pub fn validate_limit(limit: u64) -> Result<u64, ApiError> {
    if !(1..=limits::MAX_PAGE_SIZE).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {}. Limit must be between 1 and {}",
            limit,
            limits::MAX_PAGE_SIZE
        )));
    }
    Ok(limit)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Email cannot be empty"));
    }
    if trimmed.len() > limits::MAX_EMAIL_LEN {
        return Err(ApiError::validation(format!(
            "Email must be {} characters or less",
            limits::MAX_EMAIL_LEN
        )));
    }
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ApiError::validation("Email must contain an @"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ApiError::validation("Enter a valid email address"));
    }
    Ok(trimmed)
}

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    if username.is_empty() {
        return Err(ApiError::validation("Username cannot be empty"));
    }
    if username.len() > limits::MAX_USER_FIELD_LEN {
        return Err(ApiError::validation(format!(
            "Username must be {} characters or less",
            limits::MAX_USER_FIELD_LEN
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ApiError::validation(
            "Username may contain only letters, digits and @.+-_ characters",
        ));
    }
    Ok(username)
}

pub fn validate_name_field<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} cannot be empty")));
    }
    if value.len() > limits::MAX_USER_FIELD_LEN {
        return Err(ApiError::validation(format!(
            "{field} must be {} characters or less",
            limits::MAX_USER_FIELD_LEN
        )));
    }
    Ok(value)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < limits::MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            limits::MIN_PASSWORD_LEN
        )));
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id(1, "recipe").is_ok());
        assert!(validate_id(12345, "recipe").is_ok());
        assert!(validate_id(0, "recipe").is_err());
        assert!(validate_id(-1, "recipe").is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(100).is_ok());
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(101).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("cook@example.com").is_ok());
        assert!(validate_email("  padded@example.com ").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@domain").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("chef_anna").is_ok());
        assert!(validate_username("user.name+tag").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("bad space").is_err());
        assert!(validate_username("a".repeat(151).as_str()).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
    }
}
