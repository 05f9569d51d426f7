//! Shared API types, crypto, and SQL builders for the PGL backend.
//!
//! This crate is the **single source of truth** for all API request/response types.
//! TypeScript types are generated via `ts-rs` and consumed by the web client.
//!
//! To regenerate TypeScript types:
//!   cargo test -p pgl-api --features ts -- export_typescript --nocapture

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(feature = "backend")]
pub mod crypto;
#[cfg(feature = "backend")]
pub mod db;
pub mod deploy;
#[cfg(feature = "backend")]
pub mod service;

pub use pgl_core::PitchStatus;
pub use pgl_core::generate::PitchAngle;

// ─── Shared Enums ────────────────────────────────────────────────────────────

/// `as_str`, `parse` and `Display` for a snake_case string enum.
macro_rules! string_enum {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            pub fn parse(raw: &str) -> Option<Self> {
                match raw {
                    $($name => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Who a user is to the agency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum UserRole {
    Admin,
    Staff,
    Client,
}

string_enum!(UserRole {
    Admin => "admin",
    Staff => "staff",
    Client => "client",
});

impl UserRole {
    /// Admins and staff run campaigns on behalf of clients.
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Admin | Self::Staff)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum CampaignStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
}

string_enum!(CampaignStatus {
    Draft => "draft",
    Active => "active",
    Paused => "paused",
    Completed => "completed",
});

/// Review state of a match suggestion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum MatchStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

string_enum!(MatchStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

/// Placement state of a booking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

string_enum!(BookingStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
});

// ─── Utilities ───────────────────────────────────────────────────────────────

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    20
}

/// Clamp pagination input: `page >= 1`, `per_page` in `1..=100`.
pub fn clamp_page(page: u32, per_page: u32) -> (u32, u32) {
    (page.max(1), per_page.clamp(1, 100))
}

/// Campaign keywords as posted by a form (comma-separated) or an API client (array).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum KeywordsInput {
    Text(String),
    List(Vec<String>),
}

impl KeywordsInput {
    pub fn into_keywords(self) -> Vec<String> {
        match self {
            Self::Text(raw) => pgl_core::keywords::parse_keywords(&raw),
            Self::List(items) => pgl_core::keywords::normalize_keywords(items),
        }
    }
}

// ─── Auth ────────────────────────────────────────────────────────────────────

/// Email + password registration.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct AuthRegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Email + password login.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned on successful login / register / refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct AuthTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user_id: String,
    pub full_name: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Logout request. The refresh token is optional so cookie-only clients can log out.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// A user profile (never includes credentials).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub created_at: String,
}

/// A freshly issued API key. Only returned once.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ApiKeyResponse {
    pub api_key: String,
}

/// Generic success response for operations that don't return data.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct OkResponse {
    pub ok: bool,
}

// ─── Podcasts ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct PodcastResponse {
    pub id: String,
    pub title: String,
    pub host_name: Option<String>,
    pub host_email: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub website_url: Option<String>,
    pub rss_url: Option<String>,
    pub audience_size: Option<i64>,
    pub language: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for `POST /api/podcasts`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct CreatePodcastRequest {
    pub title: String,
    pub host_name: Option<String>,
    pub host_email: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub website_url: Option<String>,
    pub rss_url: Option<String>,
    pub audience_size: Option<i64>,
    pub language: Option<String>,
}

/// Request body for `PUT /api/podcasts/:id`. Absent fields are left alone;
/// an empty string clears an optional field.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UpdatePodcastRequest {
    pub title: Option<String>,
    pub host_name: Option<String>,
    pub host_email: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub website_url: Option<String>,
    pub rss_url: Option<String>,
    pub audience_size: Option<i64>,
    pub language: Option<String>,
}

/// Query parameters for `GET /api/podcasts`.
#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct PodcastListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Matches title, host name, or description.
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct PodcastListResponse {
    pub podcasts: Vec<PodcastResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

// ─── Campaigns ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct CampaignResponse {
    pub id: String,
    pub user_id: String,
    pub client_name: String,
    pub name: String,
    pub status: CampaignStatus,
    pub goals: Option<String>,
    pub target_audience: Option<String>,
    pub keywords: Vec<String>,
    pub bio: Option<String>,
    pub angles: Vec<PitchAngle>,
    pub links: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for `POST /api/campaigns`.
///
/// `user_id` is honoured for staff only; clients always create for themselves.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct CreateCampaignRequest {
    pub user_id: Option<String>,
    pub name: String,
    pub status: Option<CampaignStatus>,
    pub goals: Option<String>,
    pub target_audience: Option<String>,
    pub keywords: Option<KeywordsInput>,
    pub links: Option<Vec<String>>,
}

/// Request body for `PATCH /api/campaigns/:id`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UpdateCampaignRequest {
    pub name: Option<String>,
    pub status: Option<CampaignStatus>,
    pub goals: Option<String>,
    pub target_audience: Option<String>,
    pub keywords: Option<KeywordsInput>,
    pub links: Option<Vec<String>>,
    pub bio: Option<String>,
    pub angles: Option<Vec<PitchAngle>>,
}

/// Query parameters for `GET /api/campaigns`.
#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct CampaignListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub status: Option<CampaignStatus>,
    /// Staff only: restrict to one client.
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct CampaignListResponse {
    pub campaigns: Vec<CampaignResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

/// Returned by `POST /api/campaigns/:id/generate-bio`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct GenerateBioResponse {
    pub campaign_id: String,
    pub bio: String,
    /// `template` or the model name that produced the text.
    pub generator: String,
}

/// Returned by `POST /api/campaigns/:id/generate-angles`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct GenerateAnglesResponse {
    pub campaign_id: String,
    pub angles: Vec<PitchAngle>,
    pub generator: String,
}

// ─── Questionnaires ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct QuestionnaireResponse {
    pub id: String,
    pub campaign_id: String,
    pub user_id: String,
    pub answers: BTreeMap<String, String>,
    pub submitted_at: String,
}

/// Request body for `PUT /api/campaigns/:id/questionnaire`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct SubmitQuestionnaireRequest {
    pub answers: BTreeMap<String, String>,
}

// ─── Media kits ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct MediaKitResponse {
    pub id: String,
    pub campaign_id: String,
    pub slug: String,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub talking_points: Vec<String>,
    pub achievements: Vec<String>,
    pub headshot_url: Option<String>,
    pub is_public: bool,
    pub updated_at: String,
}

/// Request body for `PUT /api/campaigns/:id/media-kit` (upsert).
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UpsertMediaKitRequest {
    pub slug: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub talking_points: Option<Vec<String>>,
    pub achievements: Option<Vec<String>>,
    pub headshot_url: Option<String>,
    pub is_public: Option<bool>,
}

/// Returned by `GET /api/public/media-kits/:slug`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct PublicMediaKitResponse {
    pub slug: String,
    pub client_name: String,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub talking_points: Vec<String>,
    pub achievements: Vec<String>,
    pub headshot_url: Option<String>,
    pub links: Vec<String>,
}

// ─── Match suggestions ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct MatchSuggestionResponse {
    pub id: String,
    pub campaign_id: String,
    pub podcast_id: String,
    pub podcast_title: String,
    pub score: i64,
    pub matched_keywords: Vec<String>,
    pub status: MatchStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
    pub created_at: String,
}

/// Query parameters for `GET /api/campaigns/:id/matches`.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct MatchListQuery {
    pub status: Option<MatchStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct MatchListResponse {
    pub matches: Vec<MatchSuggestionResponse>,
}

/// Query parameters for `POST /api/campaigns/:id/discover`.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct DiscoverQuery {
    /// Scoring plugin id (default: server configured).
    pub plugin: Option<String>,
    /// Minimum score for a suggestion (default: server configured).
    pub threshold: Option<i64>,
}

/// Returned by `POST /api/campaigns/:id/discover`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct DiscoverResponse {
    pub campaign_id: String,
    pub plugin: String,
    pub threshold: i64,
    /// Number of podcasts scored.
    pub scanned: i64,
    /// Suggestions created by this run (existing pairs are never duplicated).
    pub created: Vec<MatchSuggestionResponse>,
}

/// Request body for `PATCH /api/matches/:id`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ReviewMatchRequest {
    pub status: MatchStatus,
}

// ─── Pitches ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct PitchTemplateResponse {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub body: String,
    /// Placeholders that must have a value, e.g. `angle`.
    pub requires: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ListPitchTemplatesResponse {
    pub templates: Vec<PitchTemplateResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct PitchResponse {
    pub id: String,
    pub campaign_id: String,
    pub podcast_id: String,
    pub podcast_title: String,
    pub match_id: Option<String>,
    pub template_id: Option<String>,
    pub subject: String,
    pub body: String,
    pub status: PitchStatus,
    pub message_id: Option<String>,
    pub sent_at: Option<String>,
    pub replied_at: Option<String>,
    pub reply_snippet: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for `POST /api/pitches`.
///
/// Target: either `match_id` (must be approved) or `campaign_id` + `podcast_id`.
/// Content: explicit `subject` + `body`, else `template_id`, else generated.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct CreatePitchRequest {
    pub match_id: Option<String>,
    pub campaign_id: Option<String>,
    pub podcast_id: Option<String>,
    pub template_id: Option<String>,
    pub angle: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// Request body for `PATCH /api/pitches/:id` (draft/ready only).
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UpdatePitchRequest {
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// Request body for `POST /api/pitches/:id/status`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct PitchStatusRequest {
    pub status: PitchStatus,
}

/// Returned by `POST /api/pitches/:id/status`. `booking` is set when the
/// transition to `accepted` created a placement.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct PitchStatusResponse {
    pub pitch: PitchResponse,
    pub booking: Option<BookingResponse>,
}

/// Returned by `POST /api/pitches/:id/send`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct SendPitchResponse {
    pub pitch: PitchResponse,
    /// `relay` or `log`.
    pub delivered_via: String,
}

/// Query parameters for `GET /api/pitches`.
#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct PitchListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub campaign_id: Option<String>,
    pub status: Option<PitchStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct PitchListResponse {
    pub pitches: Vec<PitchResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

// ─── Webhooks ────────────────────────────────────────────────────────────────

/// Inbound reply notification from the mail provider.
///
/// The pitch is located by `pitch_id`, falling back to `in_reply_to`
/// (the `Message-ID` assigned when the pitch was sent).
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ReplyWebhookRequest {
    pub pitch_id: Option<String>,
    pub in_reply_to: Option<String>,
    pub from: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ReplyWebhookResponse {
    pub pitch_id: String,
    pub status: PitchStatus,
}

// ─── Bookings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BookingResponse {
    pub id: String,
    pub user_id: String,
    pub podcast_id: String,
    pub podcast_title: String,
    pub campaign_id: Option<String>,
    pub pitch_id: Option<String>,
    pub status: BookingStatus,
    pub scheduled_at: Option<String>,
    pub episode_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for `POST /api/bookings`.
///
/// The booked client is `user_id`, or the owner of `campaign_id` when omitted.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct CreateBookingRequest {
    pub podcast_id: String,
    pub user_id: Option<String>,
    pub campaign_id: Option<String>,
    pub status: Option<BookingStatus>,
    pub scheduled_at: Option<String>,
    pub notes: Option<String>,
}

/// Request body for `PATCH /api/bookings/:id`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UpdateBookingRequest {
    pub status: Option<BookingStatus>,
    pub scheduled_at: Option<String>,
    pub episode_url: Option<String>,
    pub notes: Option<String>,
}

/// Query parameters for `GET /api/bookings`.
#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BookingListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub status: Option<BookingStatus>,
    pub campaign_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BookingListResponse {
    pub bookings: Vec<BookingResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

// ─── Admin ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ClientSummary {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub created_at: String,
    pub campaign_count: i64,
    pub active_campaign_count: i64,
}

/// Returned by `GET /api/admin/clients`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ListClientsResponse {
    pub clients: Vec<ClientSummary>,
}

/// Request body for `POST /api/admin/clients`.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct CreateClientRequest {
    pub email: String,
    pub full_name: String,
    /// Lets the client log in with email + password; API key only when absent.
    pub password: Option<String>,
}

/// Request body for `PATCH /api/admin/users/:id/role` (admin only).
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UpdateUserRoleRequest {
    pub role: UserRole,
}

/// Returned by `POST /api/admin/clients`. `api_key` is only shown once.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct CreateClientResponse {
    pub client: UserResponse,
    pub api_key: String,
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BookingCounts {
    pub pending: i64,
    pub confirmed: i64,
    pub completed: i64,
    pub cancelled: i64,
}

/// Returned by `GET /api/dashboard/stats`. Scoped to the caller's own
/// campaigns for client users.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct DashboardStatsResponse {
    pub clients: i64,
    pub campaigns: i64,
    pub active_campaigns: i64,
    pub podcasts: i64,
    pub pending_matches: i64,
    pub pitches_sent: i64,
    pub replies: i64,
    /// `replies * 100 / pitches_sent`, 0 when nothing was sent.
    pub reply_rate_percent: i64,
    pub bookings: BookingCounts,
}

/// Integer percentage, 0 when the denominator is 0.
pub fn percent(numerator: i64, denominator: i64) -> i64 {
    if denominator <= 0 {
        0
    } else {
        numerator * 100 / denominator
    }
}

// ─── Health ──────────────────────────────────────────────────────────────────

/// Returned by `GET /api/health` — server liveness check.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ─── Service Error ───────────────────────────────────────────────────────────

/// Framework-agnostic service error.
///
/// Each variant maps to an HTTP status code; the server converts it into
/// a JSON response.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ServiceError {
    BadRequest(String),
    /// Every problem found in a submitted payload.
    Validation(Vec<String>),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ServiceError {
    /// HTTP status code as a `u16`.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(_) => "validation failed",
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Internal(m) => m,
        }
    }

}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(details) => write!(f, "validation failed: {}", details.join("; ")),
            other => f.write_str(other.message()),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<pgl_core::PitchTransitionError> for ServiceError {
    fn from(e: pgl_core::PitchTransitionError) -> Self {
        match &e {
            pgl_core::PitchTransitionError::NotAllowed { .. } => Self::Conflict(e.to_string()),
            pgl_core::PitchTransitionError::UnknownStatus(_) => Self::BadRequest(e.to_string()),
        }
    }
}

// ─── Error (JSON shape) ──────────────────────────────────────────────────────

/// JSON error shape `{ "error": "...", "details": [...] }` returned by all
/// error responses. `details` is only present for validation failures.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct ApiError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl From<&ServiceError> for ApiError {
    fn from(e: &ServiceError) -> Self {
        Self {
            error: e.message().to_string(),
            details: match e {
                ServiceError::Validation(details) => details.clone(),
                _ => Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_accept_string_or_array() {
        let text: KeywordsInput = serde_json::from_str(r#""ai, Ethics ,ai""#).unwrap();
        assert_eq!(text.into_keywords(), vec!["ai", "Ethics"]);

        let list: KeywordsInput = serde_json::from_str(r#"["ai", " ", "AI", "law"]"#).unwrap();
        assert_eq!(list.into_keywords(), vec!["ai", "law"]);
    }

    #[test]
    fn string_enums_round_trip_names() {
        for role in [UserRole::Admin, UserRole::Staff, UserRole::Client] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
            assert_eq!(
                serde_json::to_string(&role).unwrap(),
                format!("\"{role}\"")
            );
        }
        assert_eq!(MatchStatus::parse("approved"), Some(MatchStatus::Approved));
        assert_eq!(BookingStatus::parse("nope"), None);
        assert_eq!(CampaignStatus::default(), CampaignStatus::Draft);
    }

    #[test]
    fn staff_roles() {
        assert!(UserRole::Admin.is_staff());
        assert!(UserRole::Staff.is_staff());
        assert!(!UserRole::Client.is_staff());
    }

    #[test]
    fn clamp_page_bounds() {
        assert_eq!(clamp_page(0, 0), (1, 1));
        assert_eq!(clamp_page(3, 500), (3, 100));
    }

    #[test]
    fn validation_errors_carry_details() {
        let err = ServiceError::Validation(vec!["name is required".into()]);
        assert_eq!(err.status_code(), 400);
        let body = serde_json::to_value(ApiError::from(&err)).unwrap();
        assert_eq!(body["error"], "validation failed");
        assert_eq!(body["details"][0], "name is required");

        let body = serde_json::to_value(ApiError::from(&ServiceError::NotFound("x".into())))
            .unwrap();
        assert!(body.get("details").is_none());
    }

    #[test]
    fn pitch_transition_errors_map_to_status_codes() {
        let not_allowed = PitchStatus::Accepted
            .transition(PitchStatus::Draft)
            .unwrap_err();
        assert_eq!(ServiceError::from(not_allowed).status_code(), 409);

        let unknown = PitchStatus::parse("shipped").unwrap_err();
        let err = ServiceError::from(unknown);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "unknown pitch status: shipped");
    }

    #[test]
    fn percent_handles_zero() {
        assert_eq!(percent(3, 0), 0);
        assert_eq!(percent(1, 3), 33);
    }
}

// ─── TypeScript generation ───────────────────────────────────────────────────

#[cfg(all(test, feature = "ts"))]
mod ts_export {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use ts_rs::TS;

    /// Run with: cargo test -p pgl-api --features ts -- export_typescript --nocapture
    #[test]
    fn export_typescript() {
        let out_dir =
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../web/src/api-types.generated.ts");

        let cfg = ts_rs::Config::new().with_large_int("number");
        let mut parts: Vec<String> = Vec::new();
        parts.push("// AUTO-GENERATED by pgl-api — DO NOT EDIT".to_string());
        parts.push("// Regenerate with: cargo test -p pgl-api --features ts -- export_typescript".to_string());
        parts.push(String::new());

        // Structs: `type X = {...}` → `export interface X {...}`
        // Enums/unions: `type X = "a" | "b"` → `export type X = "a" | "b"`
        macro_rules! collect_ts {
            ($($t:ty),+ $(,)?) => {
                $(
                    let decl = <$t>::decl(&cfg);
                    let decl = if decl.contains(" = {") {
                        decl
                            .replacen("type ", "export interface ", 1)
                            .replace(" = {", " {")
                            .trim_end_matches(';')
                            .to_string()
                    } else {
                        decl
                            .replacen("type ", "export type ", 1)
                            .trim_end_matches(';')
                            .to_string()
                    };
                    parts.push(decl);
                    parts.push(String::new());
                )+
            };
        }

        collect_ts!(
            // Shared enums
            UserRole,
            CampaignStatus,
            MatchStatus,
            BookingStatus,
            PitchStatus,
            KeywordsInput,
            // Auth
            AuthRegisterRequest,
            LoginRequest,
            AuthTokenResponse,
            RefreshRequest,
            LogoutRequest,
            ChangePasswordRequest,
            UserResponse,
            ApiKeyResponse,
            OkResponse,
            // Podcasts
            PodcastResponse,
            CreatePodcastRequest,
            UpdatePodcastRequest,
            PodcastListQuery,
            PodcastListResponse,
            // Campaigns
            PitchAngle,
            CampaignResponse,
            CreateCampaignRequest,
            UpdateCampaignRequest,
            CampaignListQuery,
            CampaignListResponse,
            GenerateBioResponse,
            GenerateAnglesResponse,
            QuestionnaireResponse,
            SubmitQuestionnaireRequest,
            MediaKitResponse,
            UpsertMediaKitRequest,
            PublicMediaKitResponse,
            // Matches
            MatchSuggestionResponse,
            MatchListQuery,
            MatchListResponse,
            DiscoverQuery,
            DiscoverResponse,
            ReviewMatchRequest,
            // Pitches
            PitchTemplateResponse,
            ListPitchTemplatesResponse,
            PitchResponse,
            CreatePitchRequest,
            UpdatePitchRequest,
            PitchStatusRequest,
            PitchStatusResponse,
            SendPitchResponse,
            PitchListQuery,
            PitchListResponse,
            ReplyWebhookRequest,
            ReplyWebhookResponse,
            // Bookings
            BookingResponse,
            CreateBookingRequest,
            UpdateBookingRequest,
            BookingListQuery,
            BookingListResponse,
            // Admin + dashboard
            ClientSummary,
            ListClientsResponse,
            CreateClientRequest,
            UpdateUserRoleRequest,
            CreateClientResponse,
            BookingCounts,
            DashboardStatsResponse,
            // Health
            HealthResponse,
            ApiError,
        );

        let content = parts.join("\n");

        if let Some(parent) = out_dir.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let mut file = std::fs::File::create(&out_dir)
            .unwrap_or_else(|e| panic!("Failed to create {}: {}", out_dir.display(), e));
        file.write_all(content.as_bytes())
            .unwrap_or_else(|e| panic!("Failed to write {}: {}", out_dir.display(), e));

        println!("Generated TypeScript types at: {}", out_dir.display());
    }
}
