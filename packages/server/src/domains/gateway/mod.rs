//! Gateway domain - relays summary generation, model switches and catalog
//! lookups to an OpenAI-compatible provider.

pub mod catalog;
pub mod chat;
pub mod prompts;
pub mod refine;
pub mod relay;
pub mod switch;

pub use catalog::{current_model, list_models, EndpointRequest};
pub use chat::{build_chat_request, stream_chat, SamplingParams, StreamChatRequest};
pub use prompts::{instruction_prefix, SummaryCategory};
pub use refine::{refine_summary, RefineRequest, RefineResponse};
pub use relay::EventStream;
pub use switch::{begin_switch, SwitchModelRequest};
