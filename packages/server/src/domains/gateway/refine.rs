//! Conversational summary refinement.

use std::time::Instant;

use provider_client::{ChatRequest, Message, ProviderClient};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::common::{AppError, AppResult};

const SYSTEM_MESSAGE: &str = "Si pomočnik za urejanje in izboljševanje povzetkov. \
Imaš dostop do izvirnega besedila in trenutnega povzetka. \
Zagotovi, da so tvoje spremembe točne glede na izvirno besedilo.";

/// Body of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefineRequest {
    pub message: String,
    pub current_summary: String,
    pub original_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineResponse {
    pub updated_summary: String,
}

fn user_prompt(request: &RefineRequest) -> String {
    format!(
        "Izvirno besedilo: {}\n\n\
         Trenutni povzetek: {}\n\n\
         Navodilo uporabnika: {}\n\n\
         Prosim, spremeni povzetek v skladu z zgornjim navodilom in ostani zvest izvirnemu besedilu. \
         Vrni samo spremenjeni povzetek brez dodatnih pojasnil.",
        request.original_text, request.current_summary, request.message
    )
}

/// Rewrite `current_summary` following the user's instruction.
pub async fn refine_summary(
    provider: &ProviderClient,
    model: String,
    request: RefineRequest,
) -> AppResult<String> {
    if request.message.trim().is_empty() {
        return Err(AppError::Input("message is required".into()));
    }

    let start = Instant::now();
    debug!(
        message_len = request.message.len(),
        summary_len = request.current_summary.len(),
        original_len = request.original_text.len(),
        "refining summary"
    );

    let chat = ChatRequest::new(model)
        .message(Message::system(SYSTEM_MESSAGE))
        .message(Message::user(user_prompt(&request)))
        .temperature(0.7)
        .max_tokens(1000);

    let response = provider.chat_completion(chat).await?;
    let updated_summary = response.content.trim().to_string();

    info!(
        duration_ms = start.elapsed().as_millis() as u64,
        summary_len = updated_summary.len(),
        "summary refinement completed"
    );

    Ok(updated_summary)
}
