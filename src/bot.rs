//! Chat commands and profile uploads arriving through the Telegram webhook.

use crate::error::{handle_error, AppError};
use crate::inbox::{Profile, TELEGRAM_SOURCE};
use crate::telegram_types::{Document, Update};
use crate::types::AppState;
use crate::utils::parse_object;

use tracing::{debug, info};

const WELCOME: &str = "👋 *Welcome to the Cold Call Manager Bot!*

🎯 *Available Commands:*
• `/upload` - Ready to upload a profile
• `/profiles` - View all profiles in inbox
• `/help` - Show profile format

💡 Start by typing `/upload` to add a profile!";

const UPLOAD: &str = "📤 *Ready to Upload!*

📋 Send me a JSON file with the profile information.

✅ I'll confirm when it's uploaded successfully!";

const HELP: &str = "📋 *Profile JSON Format:*

```json
{
  \"firstName\": \"John\",
  \"lastName\": \"Doe\",
  \"company\": \"Acme Corp\",
  \"position\": \"Senior Developer\",
  \"phoneNumber\": \"+1 (555) 123-4567\",
  \"city\": \"San Francisco\",
  \"state\": \"CA\"
}
```

📝 *Required fields:* firstName, lastName
📝 *Optional fields:* company, position, phoneNumber, city, state

💾 Save this as a .json file and send it to me!";

const EMPTY_INBOX: &str = "📭 *Inbox is Empty*

No profiles uploaded yet.

💡 Type `/upload` to add a profile!";

const INVALID_FILE_TYPE: &str = "❌ *Error: Invalid File Type*

Please send a JSON file (.json extension)

💡 Tip: Type `/help` to see the correct format";

const PROCESSING: &str = "⏳ Processing your profile...";

const MISSING_FIELDS: &str = "❌ *Error: Missing Required Fields*

Your profile must include:
• firstName
• lastName

💡 Type `/help` to see the correct format";

/// React to a single webhook update. Reply failures are logged and otherwise ignored.
pub async fn handle_update(app_state: &AppState, update: Update) {
    let Some(message) = update.message else {
        debug!(update_id = update.update_id, "ignoring update without message");
        return;
    };
    let chat_id = message.chat.id.to_string();

    if let Some(text) = message.text.as_deref() {
        let reply = match text.trim() {
            "/start" => Some(WELCOME.to_string()),
            "/upload" => Some(UPLOAD.to_string()),
            "/help" => Some(HELP.to_string()),
            "/profiles" => Some(list_profiles(&app_state.inbox.profiles())),
            _ => None,
        };
        if let Some(reply) = reply {
            send_reply(app_state, &chat_id, &reply).await;
        }
    }

    if let Some(document) = message.document {
        let reply = import_document(app_state, &chat_id, &document).await;
        send_reply(app_state, &chat_id, &reply).await;
    }
}

async fn send_reply(app_state: &AppState, chat_id: &str, text: &str) {
    if !app_state.telegram.is_configured() {
        debug!(chat_id, "no bot token; dropping reply");
        return;
    }
    if let Err(e) = app_state.telegram.send_message(chat_id, text).await {
        handle_error(e);
    }
}

fn list_profiles(profiles: &[Profile]) -> String {
    if profiles.is_empty() {
        return EMPTY_INBOX.to_string();
    }
    let mut message = format!("📋 *Current Profiles ({}):*\n\n", profiles.len());
    for (idx, profile) in profiles.iter().enumerate() {
        let name = |key| profile.display(key).unwrap_or_default();
        message.push_str(&format!(
            "{}. *{} {}*\n   🏢 {}\n   📞 {}\n\n",
            idx + 1,
            name("firstName"),
            name("lastName"),
            profile
                .display("company")
                .unwrap_or_else(|| "No company".to_string()),
            profile
                .display("phoneNumber")
                .unwrap_or_else(|| "No phone".to_string()),
        ));
    }
    message
}

/// Pull an uploaded `.json` document into the inbox and build the reply describing the result.
async fn import_document(app_state: &AppState, chat_id: &str, document: &Document) -> String {
    let is_json = document
        .file_name
        .as_deref()
        .map_or(false, |name| name.ends_with(".json"));
    if !is_json {
        return INVALID_FILE_TYPE.to_string();
    }

    let processing = send_processing(app_state, chat_id).await;
    let reply = describe_import(store_document(app_state, document).await);
    if let Some(message_id) = processing {
        if let Err(e) = app_state.telegram.delete_message(chat_id, message_id).await {
            handle_error(e);
        }
    }
    reply
}

/// Post the in-progress notice; its id is kept so it can be removed once the import finishes.
async fn send_processing(app_state: &AppState, chat_id: &str) -> Option<i64> {
    if !app_state.telegram.is_configured() {
        return None;
    }
    app_state
        .telegram
        .send_status_message(chat_id, PROCESSING)
        .await
        .map_err(handle_error)
        .ok()
}

fn describe_import(received: Result<(Profile, usize), AppError>) -> String {
    match received {
        Ok((profile, count)) => {
            info!(inbox_count = count, "profile uploaded via telegram");
            upload_summary(&profile, count)
        }
        Err(AppError::Validation(_)) => MISSING_FIELDS.to_string(),
        Err(e) => {
            handle_error(&e);
            format!(
                "❌ *Error Processing File*\n\nMake sure your file is valid JSON format.\n\n\
                 Error: {e}\n\n💡 Type `/help` to see the correct format"
            )
        }
    }
}

async fn store_document(
    app_state: &AppState,
    document: &Document,
) -> Result<(Profile, usize), AppError> {
    let contents = app_state.telegram.download_file(&document.file_id).await?;
    let fields = parse_object(contents.as_bytes())?;
    app_state.inbox.receive(fields, TELEGRAM_SOURCE)
}

fn upload_summary(profile: &Profile, count: usize) -> String {
    let field = |key| {
        profile
            .display(key)
            .unwrap_or_else(|| "Not provided".to_string())
    };
    let location = match (profile.display("city"), profile.display("state")) {
        (Some(city), Some(state)) => format!("{city}, {state}"),
        _ => "Not provided".to_string(),
    };
    format!(
        "✅ *Profile Uploaded Successfully!*

👤 *Name:* {} {}
🏢 *Company:* {}
💼 *Position:* {}
📞 *Phone:* {}
📍 *Location:* {location}

📥 Open the app's Inbox tab to load it.

🎯 Total profiles in inbox: {count}",
        field("firstName"),
        field("lastName"),
        field("company"),
        field("position"),
        field("phoneNumber"),
    )
}
