use serde::{Deserialize, Serialize};

// --- Entities (§3) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub bio: String,
    pub experience_level: Option<String>,
    pub confidence_archetype: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLocation {
    pub user_id: String,
    pub lat: f64,
    pub lng: f64,
    pub city: Option<String>,
    pub travel_radius_miles: i32,
    pub privacy_mode: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WingmanMatch {
    pub id: String,
    pub user1_id: String,
    pub user2_id: String,
    pub status: String,
    pub created_at: String,
    pub user1_reputation: i64,
    pub user2_reputation: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WingmanSession {
    pub id: String,
    pub match_id: String,
    pub user1_challenge_id: String,
    pub user2_challenge_id: String,
    pub venue_name: String,
    pub scheduled_time: String,
    pub status: String,
    pub notes: String,
    pub user1_completed_confirmed_by_user2: bool,
    pub user2_completed_confirmed_by_user1: bool,
    pub completed_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproachChallenge {
    pub id: String,
    pub difficulty: String,
    pub title: String,
    pub description: String,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub match_id: String,
    pub sender_id: String,
    pub message: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReadCursor {
    pub match_id: String,
    pub user_id: String,
    pub last_read_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationView {
    pub user_id: String,
    pub score: i64,
    pub completed_sessions: i64,
    pub no_shows: i64,
    pub badge_color: String,
    pub cache_timestamp: String,
}

/// A geo candidate returned by §4.3's radius search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuddyCandidate {
    pub user_id: String,
    pub city: Option<String>,
    pub distance_miles: f64,
    pub experience_level: String,
    pub confidence_archetype: String,
}

// --- Request / response DTOs, per §6 ---

#[derive(Debug, Clone, Deserialize)]
pub struct LocationInput {
    pub lat: f64,
    pub lng: f64,
    pub city: Option<String>,
    pub privacy_mode: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteProfile {
    pub user_id: String,
    pub bio: String,
    pub location: LocationInput,
    pub travel_radius: i32,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompleteProfileResponse {
    pub success: bool,
    pub ready_for_matching: bool,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidatesResponse {
    pub candidates: Vec<BuddyCandidate>,
    pub total_found: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistanceResponse {
    pub distance_miles: Option<f64>,
    pub within_20_miles: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoMatchResponse {
    pub success: bool,
    pub message: String,
    pub match_id: Option<String>,
    pub buddy_user_id: Option<String>,
    pub buddy_profile: Option<BuddyCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuddyRespond {
    pub user_id: String,
    pub match_id: String,
    pub action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuddyRespondResponse {
    pub success: bool,
    pub match_status: String,
    pub next_match: Option<AutoMatchResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSession {
    pub match_id: String,
    pub venue_name: String,
    pub time: String,
    pub user1_challenge_id: String,
    pub user2_challenge_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionResponse {
    pub success: bool,
    pub session_id: String,
    pub scheduled_time: String,
    pub venue_name: String,
    pub notifications_sent: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReputationPreview {
    pub user1_delta: i64,
    pub user2_delta: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionData {
    pub session: WingmanSession,
    pub user1_id: String,
    pub user2_id: String,
    pub user1_display_name: Option<String>,
    pub user2_display_name: Option<String>,
    pub user1_challenge: ApproachChallenge,
    pub user2_challenge: ApproachChallenge,
    pub reputation_preview: ReputationPreview,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmBuddyCompletion {
    pub buddy_user_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmResponse {
    pub success: bool,
    pub session_status: String,
    pub both_confirmed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmSessionCompletion {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmCompletionResponse {
    pub success: bool,
    pub both_confirmed: bool,
    pub reputation_updated: bool,
    pub session_status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSessionNotes {
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateSessionNotesResponse {
    pub success: bool,
    pub updated_notes: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<ChatMessage>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendChatMessage {
    pub match_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendChatMessageResponse {
    pub success: bool,
    pub message_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationResponse {
    pub score: i64,
    pub completed_sessions: i64,
    pub no_shows: i64,
    pub badge_color: String,
    pub cache_timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengesResponse {
    pub challenges: Vec<ApproachChallenge>,
    pub count: usize,
    pub difficulty_filter: Option<String>,
    pub cached: bool,
    pub timestamp: String,
}
