use copilot_core::error::AppError;

pub const GUARDRAIL_FAILED: &str = "AI_GUARDRAIL_FAILED";

/// Interpret a guardrail reply: `Y...` allows, `N...` rejects, anything else is an error.
pub fn parse_verdict(reply: &str) -> Result<bool, AppError> {
    match reply.trim().chars().next() {
        Some('Y') | Some('y') => Ok(true),
        Some('N') | Some('n') => Ok(false),
        _ => Err(
            AppError::new(GUARDRAIL_FAILED, "Guardrail reply was not Y or N")
                .with_details(format!("reply={}", reply.trim())),
        ),
    }
}
