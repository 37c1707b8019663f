/// User-facing text for an identity provider error code.
pub fn auth_error_message(code: &str) -> &'static str {
    match code {
        "auth/wrong-password" | "auth/invalid-credential" => "Incorrect email or password.",
        "auth/user-not-found" => "No account found with this email.",
        "auth/invalid-email" => "Please enter a valid email address.",
        "auth/email-already-in-use" => "An account with this email already exists.",
        "auth/weak-password" => "Password should be at least 6 characters.",
        "auth/too-many-requests" => "Too many attempts. Please try again later.",
        "auth/network-request-failed" => "Network error. Check your connection and try again.",
        _ => "Something went wrong. Please try again.",
    }
}
