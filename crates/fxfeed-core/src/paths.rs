//! Store paths for every entity.

pub const NEWS: &str = "news";

pub fn news(id: &str) -> String {
    format!("{NEWS}/{id}")
}

pub fn user(uid: &str) -> String {
    format!("users/{uid}")
}

pub fn kyc(uid: &str) -> String {
    format!("users/{uid}/kyc")
}

pub fn settings(uid: &str) -> String {
    format!("users/{uid}/settings")
}

pub fn stats(uid: &str) -> String {
    format!("users/{uid}/stats")
}

pub fn trading_history(uid: &str) -> String {
    format!("users/{uid}/tradingHistory")
}

pub fn audit_log(uid: &str) -> String {
    format!("users/{uid}/auditLog")
}

pub fn notification_preferences(uid: &str) -> String {
    format!("users/{uid}/notificationPreferences")
}

pub fn notifications(uid: &str) -> String {
    format!("notifications/{uid}")
}

pub fn notification(uid: &str, id: &str) -> String {
    format!("notifications/{uid}/{id}")
}

/// Reject client-supplied ids that would address some other path.
pub fn check_key<'a>(field: &'static str, id: &'a str) -> Result<&'a str, crate::DomainError> {
    let valid = !id.is_empty()
        && id.len() <= 768
        && !id.contains(['/', '.', '#', '$', '[', ']'])
        && !id.chars().any(char::is_control);
    if valid {
        Ok(id)
    } else {
        Err(crate::DomainError::invalid(field, "is not a valid key"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_key() {
        assert!(check_key("id", "-NxY12abc").is_ok());
        assert!(check_key("id", "").is_err());
        assert!(check_key("id", "abc/comments").is_err());
        assert!(check_key("id", "a.b").is_err());
    }
}
