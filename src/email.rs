use crate::config::Config;

/// Best-effort email notifications. Fire-and-forget over `tokio::spawn`, in
/// the same spirit as the teacher's webhook dispatcher: the caller never
/// awaits delivery, and delivery failure never unwinds into the HTTP
/// response or rolls back the DB write that triggered it (SPEC_FULL.md §5's
/// ordering guarantee — authoritative write first, side effect after).
#[derive(Clone)]
pub struct EmailNotifier {
    client: reqwest::Client,
    enabled: bool,
    api_url: String,
    api_key: String,
    from: String,
}

impl EmailNotifier {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");
        let enabled = config.email_enabled
            && config.email_api_url.is_some()
            && config.email_api_key.is_some();
        Self {
            client,
            enabled,
            api_url: config.email_api_url.clone().unwrap_or_default(),
            api_key: config.email_api_key.clone().unwrap_or_default(),
            from: config.email_from.clone(),
        }
    }

    /// Both participants accepted a match.
    pub fn notify_match_accepted(&self, user1_id: &str, user2_id: &str, match_id: &str) {
        self.dispatch(
            user1_id,
            "Your wingman match was accepted",
            &format!("You and {user2_id} are matched (id: {match_id}). Open the app to schedule a session."),
        );
        self.dispatch(
            user2_id,
            "Your wingman match was accepted",
            &format!("You and {user1_id} are matched (id: {match_id}). Open the app to schedule a session."),
        );
    }

    /// A session was scheduled between two participants.
    pub fn notify_session_scheduled(
        &self,
        user1_id: &str,
        user2_id: &str,
        venue_name: &str,
        scheduled_time: &str,
    ) {
        let body = format!("Session scheduled at {venue_name} on {scheduled_time}.");
        self.dispatch(user1_id, "Wingman session scheduled", &body);
        self.dispatch(user2_id, "Wingman session scheduled", &body);
    }

    fn dispatch(&self, recipient_user_id: &str, subject: &str, body: &str) {
        if !self.enabled {
            return;
        }

        let client = self.client.clone();
        let api_url = self.api_url.clone();
        let api_key = self.api_key.clone();
        let from = self.from.clone();
        let recipient_user_id = recipient_user_id.to_string();
        let subject = subject.to_string();
        let body = body.to_string();

        tokio::spawn(async move {
            let payload = serde_json::json!({
                "from": from,
                "to_user_id": recipient_user_id,
                "subject": subject,
                "body": body,
            });

            let result = client
                .post(&api_url)
                .bearer_auth(&api_key)
                .json(&payload)
                .send()
                .await;

            match result {
                Ok(resp) if resp.status().is_success() => {
                    log::debug!("email: delivered '{subject}' to {recipient_user_id}");
                }
                Ok(resp) => {
                    log::warn!(
                        "email: delivery to {recipient_user_id} failed with status {}",
                        resp.status()
                    );
                }
                Err(e) => {
                    log::warn!("email: delivery to {recipient_user_id} failed: {e}");
                }
            }
        });
    }
}
