use crate::domain::error::DomainError;

pub fn require_non_blank(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// Shape check only: something before `@` and a dot somewhere after it.
pub fn validate_email(email: &str) -> Result<(), DomainError> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(DomainError::validation("email", "invalid email format"));
    }
    Ok(())
}

pub fn validate_password(password: &str, min_len: usize) -> Result<(), DomainError> {
    if password.chars().count() < min_len {
        return Err(DomainError::validation(
            "password",
            format!("must be at least {min_len} characters"),
        ));
    }
    Ok(())
}

pub fn validate_units(units: u32, max: u32) -> Result<(), DomainError> {
    if units == 0 {
        return Err(DomainError::validation("units", "must be at least 1"));
    }
    if units > max {
        return Err(DomainError::validation(
            "units",
            format!("must not exceed {max}"),
        ));
    }
    Ok(())
}
