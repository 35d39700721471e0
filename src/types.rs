use crate::inbox::{Inbox, Profile};
use crate::telegram::TelegramClient;
use crate::utils::format_call_result;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::{debug, error, warn};

/// Contact details attached to a call result. Values are rendered as given, so a phone number
/// sent as a JSON number is still accepted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallProfile {
    pub first_name: Option<Value>,
    pub last_name: Option<Value>,
    pub company: Option<Value>,
    pub phone_number: Option<Value>,
}

/// Sentiment counts gathered during the call.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStats {
    pub positive: Option<Number>,
    pub negative: Option<Number>,
    pub neutral: Option<Number>,
    pub sentiment_score: Option<Number>,
}

/// Outcome of a single call as submitted by the web app. Lives only for the duration of the
/// request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResult {
    pub outcome: Option<String>,
    pub profile: Option<CallProfile>,
    pub stats: Option<CallStats>,
    /// Call length in seconds.
    pub duration: Option<i64>,
    pub script_name: Option<String>,
    pub notes: Option<String>,
    #[serde(rename = "submitted_at")]
    pub submitted_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CallResultReceipt {
    pub success: bool,
    pub message: &'static str,
    pub telegram_posted: bool,
}

#[derive(Debug, Serialize)]
pub struct InboxListing {
    pub profiles: Vec<Profile>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct InboxReceipt {
    pub success: bool,
    pub message: &'static str,
    pub profile: Profile,
    pub inbox_count: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub profiles: usize,
    pub telegram: bool,
}

pub struct AppState {
    pub telegram: TelegramClient,
    /// Chat that receives call result notifications
    pub results_chat_id: Option<String>,
    pub inbox: Inbox,
}

impl AppState {
    /// Post a formatted call result to the results chat. Returns whether the provider accepted
    /// it; failures are logged and never propagated.
    pub async fn post_call_result(&self, call_result: &CallResult) -> bool {
        let Some(chat_id) = self.results_chat_id.as_deref() else {
            warn!("TELEGRAM_GROUP_ID not set; skipping call result delivery");
            return false;
        };
        let text = format_call_result(call_result);
        match self.telegram.send_message(chat_id, &text).await {
            Ok(()) => {
                debug!(chat_id, "posted call result");
                true
            }
            Err(e) => {
                error!(error=%e, "failed to post call result to telegram");
                false
            }
        }
    }
}
