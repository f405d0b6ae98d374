use utoipa::OpenApi;

use super::handlers::{complete, email_code, health, login, person, reset, token};

#[derive(OpenApi)]
#[openapi(
    info(description = "Donor identity and access API"),
    paths(
        health::health,
        login::login,
        token::verify,
        email_code::request_code,
        email_code::check_code,
        complete::set_first_password,
        reset::request_reset,
        reset::confirm_reset,
        person::person,
        person::delete_person,
    ),
    components(schemas(
        login::LoginRequest,
        login::LoginResponse,
        token::VerifyRequest,
        email_code::RequestCodeRequest,
        email_code::CheckCodeRequest,
        complete::CompleteRequest,
        reset::RequestResetRequest,
        reset::ConfirmResetRequest,
        person::PersonResponse,
    )),
    tags(
        (name = "auth", description = "Login, token verdicts, email codes and password resets"),
        (name = "people", description = "Person records"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_all_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/health",
            "/v1/auth/login",
            "/v1/auth/verify",
            "/v1/auth/email-codes",
            "/v1/auth/email-codes/check",
            "/v1/auth/password-resets",
            "/v1/auth/password-resets/confirm",
            "/v1/people/{id}",
            "/v1/people/{id}/password",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }
}
