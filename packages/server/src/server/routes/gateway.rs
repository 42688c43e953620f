use axum::{
    body::Body,
    extract::Extension,
    http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::common::{AppJson, AppResult};
use crate::domains::gateway::{
    begin_switch, build_chat_request, current_model, list_models, refine_summary, stream_chat,
    EndpointRequest, EventStream, RefineRequest, RefineResponse, StreamChatRequest,
    SwitchModelRequest,
};
use crate::server::app::AxumAppState;

/// Wrap pre-framed event bytes in an unbuffered `text/event-stream` response.
fn sse_response(events: EventStream) -> Response {
    (
        [
            (CONTENT_TYPE, "text/event-stream"),
            (CACHE_CONTROL, "no-cache"),
            (CONNECTION, "keep-alive"),
        ],
        Body::from_stream(events),
    )
        .into_response()
}

/// `POST /api/chat`: stream a summary of `input_text` with the current model.
///
/// Parameter errors are answered with 400 before the stream starts; anything
/// later arrives as an in-band error event.
pub async fn chat_stream_handler(
    Extension(state): Extension<AxumAppState>,
    AppJson(request): AppJson<StreamChatRequest>,
) -> AppResult<Response> {
    let sampling = request.sampling()?;
    let prefix = request.prefix();

    let deps = &state.server_deps;
    let provider = deps.provider_for(request.api_endpoint.as_deref());
    let chat = build_chat_request(
        deps.model_state.current(),
        &prefix,
        &request.input_text,
        sampling,
    );

    Ok(sse_response(stream_chat(provider, chat)))
}

/// `POST /switch_model`: relay the provider's switch progress.
///
/// 409 when another switch is still streaming.
pub async fn switch_model_handler(
    Extension(state): Extension<AxumAppState>,
    AppJson(request): AppJson<SwitchModelRequest>,
) -> AppResult<Response> {
    let events = begin_switch(&state.server_deps, request)?;
    Ok(sse_response(events))
}

pub async fn list_models_handler(
    Extension(state): Extension<AxumAppState>,
    AppJson(request): AppJson<EndpointRequest>,
) -> AppResult<Json<Value>> {
    let models = list_models(&state.server_deps.provider, &request.api_endpoint).await?;
    Ok(Json(models))
}

pub async fn current_model_handler(
    Extension(state): Extension<AxumAppState>,
    AppJson(request): AppJson<EndpointRequest>,
) -> AppResult<Json<Value>> {
    let model = current_model(&state.server_deps.provider, &request.api_endpoint).await?;
    Ok(Json(model))
}

/// `POST /chat`: refine a summary with the current model.
pub async fn refine_summary_handler(
    Extension(state): Extension<AxumAppState>,
    AppJson(request): AppJson<RefineRequest>,
) -> AppResult<Json<RefineResponse>> {
    let deps = &state.server_deps;
    let updated_summary =
        refine_summary(&deps.provider, deps.model_state.current(), request).await?;

    Ok(Json(RefineResponse { updated_summary }))
}
