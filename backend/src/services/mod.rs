//! HTTP surface. One module per resource scope, each exposing
//! `configure_routes()` for `main` to mount.

pub mod configs;
pub mod data_sources;
pub mod files;
pub mod folders;
pub mod merge;
pub mod outbox;
pub mod templates;

use crate::error::Error;
use actix_web::HttpResponse;

/// Map an engine error to a response with a plain-text body.
pub(crate) fn error_response(err: &Error) -> HttpResponse {
    let mut builder = match err {
        Error::ConfigNotFound(_)
        | Error::DataSourceNotFound(_)
        | Error::TemplateNotFound(_)
        | Error::ContainerNotFound(_)
        | Error::DocumentNotFound(_) => HttpResponse::NotFound(),
        Error::ConfigurationMissing
        | Error::ReferenceResolution { .. }
        | Error::EmptyDataSource(_)
        | Error::MissingRecipient { .. }
        | Error::UnsupportedExport(_)
        | Error::Csv(_)
        | Error::Json(_) => HttpResponse::BadRequest(),
        _ => HttpResponse::InternalServerError(),
    };
    builder.body(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn lookup_failures_are_not_found() {
        let resp = error_response(&Error::ConfigNotFound("Badges".to_string()));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = error_response(&Error::ConfigurationMissing);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = error_response(&Error::Backend("disk full".to_string()));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
