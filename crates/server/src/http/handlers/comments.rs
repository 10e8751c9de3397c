use axum::{
    extract::{multipart::MultipartError, ConnectInfo, Multipart, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use domain::{FormValue, RawForm, RequestContext, ValidationError};
use std::net::SocketAddr;
use tracing::{error, warn};

use crate::pipeline::Outcome;
use crate::state::AppState;

pub const FAILURE_NOTICE: &str = "Sorry, there was an error";

pub async fn submit_comment(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(e) => {
            warn!("Failed to read form data: {}", e);
            return rejected(ValidationError::MalformedForm);
        }
    };

    let submission = match domain::normalize(&form) {
        Ok(submission) => submission,
        Err(e) => return rejected(e),
    };

    let ctx = request_context(&headers, peer.map(|ConnectInfo(addr)| addr));

    match state.pipeline.run(submission, &ctx).await {
        Outcome::Redirected(target) => found(&target),
        Outcome::Rejected { message } => (StatusCode::OK, spam_notice(&message)).into_response(),
        Outcome::Failed => (StatusCode::OK, FAILURE_NOTICE).into_response(),
    }
}

async fn read_form(mut multipart: Multipart) -> Result<RawForm, MultipartError> {
    let mut form = RawForm::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if field.file_name().is_some() {
            form.insert(name, FormValue::Upload);
            continue;
        }
        let text = field.text().await?;
        form.insert(name, FormValue::Text(text));
    }
    Ok(form)
}

fn request_context(headers: &HeaderMap, peer: Option<SocketAddr>) -> RequestContext {
    let user_ip = header_str(headers, "cf-connecting-ip")
        .or_else(|| {
            header_str(headers, "x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| RequestContext::UNKNOWN_IP.to_string());

    RequestContext {
        user_agent: header_str(headers, "user-agent").unwrap_or_default().to_string(),
        user_ip,
        referrer: header_str(headers, "referer").unwrap_or_default().to_string(),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn rejected(e: ValidationError) -> Response {
    warn!("Rejected submission: {}", e);
    (StatusCode::BAD_REQUEST, e.to_string()).into_response()
}

fn spam_notice(message: &str) -> String {
    format!(
        "SPAM detected!\n\n\
         Comment detected as SPAM and not submitted.\n\
         Apologies if your message is not spam. Your message was:\n\n\
         {}",
        message
    )
}

/// 302 rather than axum's `Redirect::to` (303).
fn found(target: &str) -> Response {
    match HeaderValue::from_str(target) {
        Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Err(e) => {
            error!("Cannot redirect to '{}': {}", target, e);
            (StatusCode::OK, FAILURE_NOTICE).into_response()
        }
    }
}
